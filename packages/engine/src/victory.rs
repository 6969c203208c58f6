use crate::models::game::GameState;
use crate::models::player::PlayerState;
use crate::models::role::Faction;

/// Villagers win once no werewolf is alive; werewolves win once they match the rest.
pub fn check_victory(state: &GameState) -> Option<Faction> {
    victory_over(&state.players)
}

pub(crate) fn victory_over(players: &[PlayerState]) -> Option<Faction> {
    let (wolves, others) = players
        .iter()
        .filter(|p| p.alive)
        .fold((0usize, 0usize), |(w, o), p| {
            if p.role.faction() == Faction::Werewolves {
                (w + 1, o)
            } else {
                (w, o + 1)
            }
        });

    if wolves == 0 {
        Some(Faction::Villagers)
    } else if wolves >= others {
        Some(Faction::Werewolves)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::player::PlayerSeed;
    use crate::models::role::Role;

    fn table(roles: &[(Role, bool)]) -> Vec<PlayerState> {
        roles
            .iter()
            .enumerate()
            .map(|(i, &(role, alive))| {
                let mut p = PlayerState::new(PlayerSeed::new(format!("p{i}"), "n"), i as u8 + 1, role);
                p.alive = alive;
                p
            })
            .collect()
    }

    #[test]
    fn no_wolves_means_villagers_win() {
        let players = table(&[(Role::Werewolf, false), (Role::Villager, true)]);
        assert_eq!(victory_over(&players), Some(Faction::Villagers));
    }

    #[test]
    fn parity_means_werewolves_win() {
        let players = table(&[
            (Role::Werewolf, true),
            (Role::Werewolf, true),
            (Role::Seer, true),
            (Role::Villager, true),
            (Role::Villager, false),
        ]);
        assert_eq!(victory_over(&players), Some(Faction::Werewolves));
    }

    #[test]
    fn game_continues_while_villagers_outnumber() {
        let players = table(&[
            (Role::Werewolf, true),
            (Role::Witch, true),
            (Role::Villager, true),
        ]);
        assert_eq!(victory_over(&players), None);
    }
}
