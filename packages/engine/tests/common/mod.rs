#![allow(dead_code)]

use rand::rngs::StdRng;
use rand::SeedableRng;
use werewolf_engine::{
    apply_action, apply_action_with_rng, initialize_game_with_rng, ActionError, ActionKind,
    GameAction, GameState, PlayerSeed, Role, StepId,
};

/// First joiner; the dispatcher treats them as the room host.
pub const HOST: &str = "p1";

pub fn seeds() -> Vec<PlayerSeed> {
    (1..=10)
        .map(|i| PlayerSeed::new(format!("p{i}"), format!("Player {i}")))
        .collect()
}

/// A dealt table whose roles have been revealed and acknowledged, sitting at
/// the start of the first night.
pub fn new_game(seed: u64) -> GameState {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut state = initialize_game_with_rng("room-1", seeds(), &mut rng).unwrap();
    state = auto_advance(state);
    for id in alive(&state) {
        state = act(&state, &id, ActionKind::Ready);
    }
    assert_eq!(state.step(), Some(StepId::NightWolvesAttack));
    state
}

pub fn try_act(state: &GameState, player_id: &str, kind: ActionKind) -> Result<GameState, ActionError> {
    let action = GameAction::new(player_id, kind, 1_700_000_000_000);
    let mut rng = StdRng::seed_from_u64(99);
    let next = apply_action_with_rng(state, &action, player_id == HOST, &mut rng)?;
    Ok(auto_advance(next))
}

/// Applies an action that must succeed, then runs any pending system steps.
pub fn act(state: &GameState, player_id: &str, kind: ActionKind) -> GameState {
    match try_act(state, player_id, kind.clone()) {
        Ok(next) => next,
        Err(err) => panic!("{player_id} could not play {kind:?}: {err}"),
    }
}

pub fn auto_advance(mut state: GameState) -> GameState {
    while let Some(kind) = state.pending_system_action() {
        state = apply_action(&state, &GameAction::system(kind, 0), false).unwrap();
    }
    state
}

pub fn alive(state: &GameState) -> Vec<String> {
    state
        .players
        .iter()
        .filter(|p| p.alive)
        .map(|p| p.player_id.clone())
        .collect()
}

pub fn alive_with(state: &GameState, role: Role) -> Vec<String> {
    state
        .players
        .iter()
        .filter(|p| p.alive && p.role == role)
        .map(|p| p.player_id.clone())
        .collect()
}

pub fn holder(state: &GameState, role: Role) -> String {
    state
        .players
        .iter()
        .find(|p| p.role == role)
        .map(|p| p.player_id.clone())
        .unwrap()
}

pub fn is_alive(state: &GameState, player_id: &str) -> bool {
    state.player(player_id).unwrap().alive
}

pub enum WitchMove {
    Skip,
    Save,
    Poison(String),
}

/// Plays one night: the pack kills `target`, the witch follows `witch`, the
/// seer checks the first other living player and the hunter looks at their
/// gesture. Steps whose role holder is dead are already skipped by the engine.
pub fn play_night(state: &GameState, target: &str, witch: WitchMove) -> GameState {
    let mut state = state.clone();
    for wolf in alive_with(&state, Role::Werewolf) {
        state = act(
            &state,
            &wolf,
            ActionKind::WolfKill {
                target_id: target.to_string(),
            },
        );
    }
    for wolf in alive_with(&state, Role::Werewolf) {
        state = act(&state, &wolf, ActionKind::WolfConfirm);
    }

    if state.step() == Some(StepId::NightWitchDecide) {
        let id = holder(&state, Role::Witch);
        let kind = match witch {
            WitchMove::Skip => ActionKind::WitchSkip,
            WitchMove::Save => ActionKind::WitchSave,
            WitchMove::Poison(target_id) => ActionKind::WitchPoison { target_id },
        };
        state = act(&state, &id, kind);
        if state.step() == Some(StepId::NightWitchDecide) {
            state = act(&state, &id, ActionKind::WitchSkip);
        }
    }

    if state.step() == Some(StepId::NightSeerCheck) {
        let seer = holder(&state, Role::Seer);
        let target_id = alive(&state).into_iter().find(|id| *id != seer).unwrap();
        state = act(&state, &seer, ActionKind::SeerCheck { target_id });
    }

    if state.step() == Some(StepId::NightHunterCheckGesture) {
        let hunter = holder(&state, Role::Hunter);
        state = act(&state, &hunter, ActionKind::HunterCheckGesture);
        state = act(&state, &hunter, ActionKind::HunterConfirmGesture);
    }
    state
}

/// Everybody declines to run and the host closes the candidate list.
pub fn skip_election(state: &GameState) -> GameState {
    let mut state = state.clone();
    for id in alive(&state) {
        state = act(&state, &id, ActionKind::SheriffSkip);
    }
    act(&state, HOST, ActionKind::SheriffConfirmCollect)
}

/// Every living player casts a day vote chosen by `ballot`.
pub fn vote_all(state: &GameState, ballot: impl Fn(&str) -> String) -> GameState {
    let mut state = state.clone();
    for id in alive(&state) {
        state = act(
            &state,
            &id,
            ActionKind::DayVote {
                target_id: ballot(&id),
            },
        );
    }
    state
}
