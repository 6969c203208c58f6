use serde::{Deserialize, Serialize};

/// Ruleset fixed for the lifetime of a game.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleOptions {
    pub sheriff: SheriffRules,
    pub witch: WitchRules,
    pub hunter: HunterRules,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheriffRules {
    /// Weight of the sheriff's ballot in day votes.
    pub vote_weight: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WitchRules {
    pub can_self_save: bool,
    pub can_use_both_in_same_night: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HunterRules {
    pub can_shoot_when_voted: bool,
    pub can_shoot_when_killed_at_night: bool,
    pub can_shoot_when_poisoned: bool,
}

impl Default for RuleOptions {
    fn default() -> Self {
        Self {
            sheriff: SheriffRules { vote_weight: 1.5 },
            witch: WitchRules {
                can_self_save: false,
                can_use_both_in_same_night: false,
            },
            hunter: HunterRules {
                can_shoot_when_voted: true,
                can_shoot_when_killed_at_night: true,
                can_shoot_when_poisoned: false,
            },
        }
    }
}
