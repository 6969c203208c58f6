use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Werewolf,
    Seer,
    Witch,
    Hunter,
    Villager,
}

/// Role counts for the fixed ten-seat table.
pub const ROLE_DISTRIBUTION: [(Role, usize); 5] = [
    (Role::Werewolf, 3),
    (Role::Seer, 1),
    (Role::Witch, 1),
    (Role::Hunter, 1),
    (Role::Villager, 4),
];

impl Role {
    pub fn faction(self) -> Faction {
        match self {
            Role::Werewolf => Faction::Werewolves,
            _ => Faction::Villagers,
        }
    }

    /// The unshuffled pool, one entry per seat.
    pub fn pool() -> Vec<Role> {
        ROLE_DISTRIBUTION
            .iter()
            .flat_map(|&(role, count)| std::iter::repeat(role).take(count))
            .collect()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Werewolf => write!(f, "werewolf"),
            Role::Seer => write!(f, "seer"),
            Role::Witch => write!(f, "witch"),
            Role::Hunter => write!(f, "hunter"),
            Role::Villager => write!(f, "villager"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Faction {
    Werewolves,
    Villagers,
}

impl fmt::Display for Faction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Faction::Werewolves => write!(f, "werewolves"),
            Faction::Villagers => write!(f, "villagers"),
        }
    }
}

/// What a seer learns about a target: only the side, never the exact role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckResult {
    Werewolf,
    Villager,
}

impl From<Role> for CheckResult {
    fn from(role: Role) -> Self {
        match role {
            Role::Werewolf => CheckResult::Werewolf,
            _ => CheckResult::Villager,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Gesture {
    Good,
    Bad,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_matches_distribution() {
        let pool = Role::pool();
        assert_eq!(pool.len(), 10);
        for (role, count) in ROLE_DISTRIBUTION {
            assert_eq!(pool.iter().filter(|r| **r == role).count(), count);
        }
    }

    #[test]
    fn only_werewolves_check_as_werewolf() {
        assert_eq!(CheckResult::from(Role::Werewolf), CheckResult::Werewolf);
        assert_eq!(CheckResult::from(Role::Hunter), CheckResult::Villager);
        assert_eq!(Role::Witch.faction(), Faction::Villagers);
    }
}
