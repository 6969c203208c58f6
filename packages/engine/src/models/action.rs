use serde::{Deserialize, Serialize};
use std::fmt;

use super::player::PlayerId;
use crate::error::ActionError;

/// Wire names of every action the engine understands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionType {
    #[serde(rename = "setup:reveal_roles")]
    RevealRoles,
    #[serde(rename = "ready")]
    Ready,
    #[serde(rename = "wolf:kill")]
    WolfKill,
    #[serde(rename = "wolf:confirm")]
    WolfConfirm,
    #[serde(rename = "witch:save")]
    WitchSave,
    #[serde(rename = "witch:poison")]
    WitchPoison,
    #[serde(rename = "witch:skip")]
    WitchSkip,
    #[serde(rename = "seer:check")]
    SeerCheck,
    #[serde(rename = "hunter:check_gesture")]
    HunterCheckGesture,
    #[serde(rename = "hunter:confirm_gesture")]
    HunterConfirmGesture,
    #[serde(rename = "sheriff:run")]
    SheriffRun,
    #[serde(rename = "sheriff:skip")]
    SheriffSkip,
    #[serde(rename = "sheriff:confirm_collect")]
    SheriffConfirmCollect,
    #[serde(rename = "sheriff:finish_speech")]
    SheriffFinishSpeech,
    #[serde(rename = "sheriff:withdraw")]
    SheriffWithdraw,
    #[serde(rename = "sheriff:confirm_withdraw")]
    SheriffConfirmWithdraw,
    #[serde(rename = "sheriff:vote")]
    SheriffVote,
    #[serde(rename = "day:apply_night_deaths")]
    ApplyNightDeaths,
    #[serde(rename = "day:announce_deaths")]
    AnnounceDeaths,
    #[serde(rename = "day:end_speeches")]
    EndSpeeches,
    #[serde(rename = "hunter:shoot")]
    HunterShoot,
    #[serde(rename = "hunter:skip")]
    HunterSkip,
    #[serde(rename = "day:vote")]
    DayVote,
}

impl ActionType {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionType::RevealRoles => "setup:reveal_roles",
            ActionType::Ready => "ready",
            ActionType::WolfKill => "wolf:kill",
            ActionType::WolfConfirm => "wolf:confirm",
            ActionType::WitchSave => "witch:save",
            ActionType::WitchPoison => "witch:poison",
            ActionType::WitchSkip => "witch:skip",
            ActionType::SeerCheck => "seer:check",
            ActionType::HunterCheckGesture => "hunter:check_gesture",
            ActionType::HunterConfirmGesture => "hunter:confirm_gesture",
            ActionType::SheriffRun => "sheriff:run",
            ActionType::SheriffSkip => "sheriff:skip",
            ActionType::SheriffConfirmCollect => "sheriff:confirm_collect",
            ActionType::SheriffFinishSpeech => "sheriff:finish_speech",
            ActionType::SheriffWithdraw => "sheriff:withdraw",
            ActionType::SheriffConfirmWithdraw => "sheriff:confirm_withdraw",
            ActionType::SheriffVote => "sheriff:vote",
            ActionType::ApplyNightDeaths => "day:apply_night_deaths",
            ActionType::AnnounceDeaths => "day:announce_deaths",
            ActionType::EndSpeeches => "day:end_speeches",
            ActionType::HunterShoot => "hunter:shoot",
            ActionType::HunterSkip => "hunter:skip",
            ActionType::DayVote => "day:vote",
        }
    }

    /// Actions only the reserved system actor may issue.
    pub fn is_system(self) -> bool {
        matches!(
            self,
            ActionType::RevealRoles
                | ActionType::ApplyNightDeaths
                | ActionType::AnnounceDeaths
                | ActionType::EndSpeeches
        )
    }

    fn label(self) -> &'static str {
        match self {
            ActionType::RevealRoles => "Reveal roles",
            ActionType::Ready => "Ready",
            ActionType::WolfKill => "Choose a kill target",
            ActionType::WolfConfirm => "Confirm the kill",
            ActionType::WitchSave => "Use the antidote",
            ActionType::WitchPoison => "Use the poison",
            ActionType::WitchSkip => "Do nothing tonight",
            ActionType::SeerCheck => "Check a player",
            ActionType::HunterCheckGesture => "Look at your gesture",
            ActionType::HunterConfirmGesture => "Confirm",
            ActionType::SheriffRun => "Run for sheriff",
            ActionType::SheriffSkip => "Do not run",
            ActionType::SheriffConfirmCollect => "Close candidacy",
            ActionType::SheriffFinishSpeech => "Finish speech",
            ActionType::SheriffWithdraw => "Withdraw",
            ActionType::SheriffConfirmWithdraw => "Open the sheriff vote",
            ActionType::SheriffVote => "Vote for sheriff",
            ActionType::ApplyNightDeaths => "Apply night deaths",
            ActionType::AnnounceDeaths => "Announce deaths",
            ActionType::EndSpeeches => "End speeches",
            ActionType::HunterShoot => "Shoot",
            ActionType::HunterSkip => "Hold fire",
            ActionType::DayVote => "Vote to execute",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Free-form payload as it arrives on the wire.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_id: Option<PlayerId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub candidate_id: Option<PlayerId>,
}

impl ActionPayload {
    pub fn target(target_id: impl Into<String>) -> Self {
        Self {
            target_id: Some(target_id.into()),
            candidate_id: None,
        }
    }

    pub fn candidate(candidate_id: impl Into<String>) -> Self {
        Self {
            target_id: None,
            candidate_id: Some(candidate_id.into()),
        }
    }
}

/// A typed action: the action type together with the payload it needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionKind {
    RevealRoles,
    Ready,
    WolfKill { target_id: PlayerId },
    WolfConfirm,
    WitchSave,
    WitchPoison { target_id: PlayerId },
    WitchSkip,
    SeerCheck { target_id: PlayerId },
    HunterCheckGesture,
    HunterConfirmGesture,
    SheriffRun,
    SheriffSkip,
    SheriffConfirmCollect,
    SheriffFinishSpeech,
    SheriffWithdraw,
    SheriffConfirmWithdraw,
    SheriffVote { candidate_id: PlayerId },
    ApplyNightDeaths,
    AnnounceDeaths,
    EndSpeeches,
    HunterShoot { target_id: PlayerId },
    HunterSkip,
    DayVote { target_id: PlayerId },
}

impl ActionKind {
    pub fn action_type(&self) -> ActionType {
        match self {
            ActionKind::RevealRoles => ActionType::RevealRoles,
            ActionKind::Ready => ActionType::Ready,
            ActionKind::WolfKill { .. } => ActionType::WolfKill,
            ActionKind::WolfConfirm => ActionType::WolfConfirm,
            ActionKind::WitchSave => ActionType::WitchSave,
            ActionKind::WitchPoison { .. } => ActionType::WitchPoison,
            ActionKind::WitchSkip => ActionType::WitchSkip,
            ActionKind::SeerCheck { .. } => ActionType::SeerCheck,
            ActionKind::HunterCheckGesture => ActionType::HunterCheckGesture,
            ActionKind::HunterConfirmGesture => ActionType::HunterConfirmGesture,
            ActionKind::SheriffRun => ActionType::SheriffRun,
            ActionKind::SheriffSkip => ActionType::SheriffSkip,
            ActionKind::SheriffConfirmCollect => ActionType::SheriffConfirmCollect,
            ActionKind::SheriffFinishSpeech => ActionType::SheriffFinishSpeech,
            ActionKind::SheriffWithdraw => ActionType::SheriffWithdraw,
            ActionKind::SheriffConfirmWithdraw => ActionType::SheriffConfirmWithdraw,
            ActionKind::SheriffVote { .. } => ActionType::SheriffVote,
            ActionKind::ApplyNightDeaths => ActionType::ApplyNightDeaths,
            ActionKind::AnnounceDeaths => ActionType::AnnounceDeaths,
            ActionKind::EndSpeeches => ActionType::EndSpeeches,
            ActionKind::HunterShoot { .. } => ActionType::HunterShoot,
            ActionKind::HunterSkip => ActionType::HunterSkip,
            ActionKind::DayVote { .. } => ActionType::DayVote,
        }
    }

    /// The player this action points at, if it selects one.
    pub fn target(&self) -> Option<&str> {
        match self {
            ActionKind::WolfKill { target_id }
            | ActionKind::WitchPoison { target_id }
            | ActionKind::SeerCheck { target_id }
            | ActionKind::HunterShoot { target_id }
            | ActionKind::DayVote { target_id } => Some(target_id),
            ActionKind::SheriffVote { candidate_id } => Some(candidate_id),
            _ => None,
        }
    }

    pub fn from_parts(action_type: ActionType, payload: ActionPayload) -> Result<Self, ActionError> {
        let target = |field: &'static str, value: Option<PlayerId>| {
            value.ok_or(ActionError::MissingPayload {
                action: action_type,
                field,
            })
        };

        Ok(match action_type {
            ActionType::RevealRoles => ActionKind::RevealRoles,
            ActionType::Ready => ActionKind::Ready,
            ActionType::WolfKill => ActionKind::WolfKill {
                target_id: target("targetId", payload.target_id)?,
            },
            ActionType::WolfConfirm => ActionKind::WolfConfirm,
            ActionType::WitchSave => ActionKind::WitchSave,
            ActionType::WitchPoison => ActionKind::WitchPoison {
                target_id: target("targetId", payload.target_id)?,
            },
            ActionType::WitchSkip => ActionKind::WitchSkip,
            ActionType::SeerCheck => ActionKind::SeerCheck {
                target_id: target("targetId", payload.target_id)?,
            },
            ActionType::HunterCheckGesture => ActionKind::HunterCheckGesture,
            ActionType::HunterConfirmGesture => ActionKind::HunterConfirmGesture,
            ActionType::SheriffRun => ActionKind::SheriffRun,
            ActionType::SheriffSkip => ActionKind::SheriffSkip,
            ActionType::SheriffConfirmCollect => ActionKind::SheriffConfirmCollect,
            ActionType::SheriffFinishSpeech => ActionKind::SheriffFinishSpeech,
            ActionType::SheriffWithdraw => ActionKind::SheriffWithdraw,
            ActionType::SheriffConfirmWithdraw => ActionKind::SheriffConfirmWithdraw,
            ActionType::SheriffVote => ActionKind::SheriffVote {
                candidate_id: target("candidateId", payload.candidate_id)?,
            },
            ActionType::ApplyNightDeaths => ActionKind::ApplyNightDeaths,
            ActionType::AnnounceDeaths => ActionKind::AnnounceDeaths,
            ActionType::EndSpeeches => ActionKind::EndSpeeches,
            ActionType::HunterShoot => ActionKind::HunterShoot {
                target_id: target("targetId", payload.target_id)?,
            },
            ActionType::HunterSkip => ActionKind::HunterSkip,
            ActionType::DayVote => ActionKind::DayVote {
                target_id: target("targetId", payload.target_id)?,
            },
        })
    }

    pub fn payload(&self) -> ActionPayload {
        match self {
            ActionKind::SheriffVote { candidate_id } => ActionPayload::candidate(candidate_id.clone()),
            other => ActionPayload {
                target_id: other.target().map(str::to_string),
                candidate_id: None,
            },
        }
    }
}

/// An action as submitted to the reducer and recorded in history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "RawAction", try_from = "RawAction")]
pub struct GameAction {
    pub player_id: PlayerId,
    pub kind: ActionKind,
    /// Milliseconds since the Unix epoch, stamped by the dispatcher.
    pub timestamp: i64,
}

impl GameAction {
    pub fn new(player_id: impl Into<String>, kind: ActionKind, timestamp: i64) -> Self {
        Self {
            player_id: player_id.into(),
            kind,
            timestamp,
        }
    }

    pub fn system(kind: ActionKind, timestamp: i64) -> Self {
        Self::new(super::player::SYSTEM_ACTOR, kind, timestamp)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawAction {
    #[serde(rename = "type")]
    action_type: ActionType,
    player_id: PlayerId,
    #[serde(default)]
    payload: ActionPayload,
    #[serde(default)]
    timestamp: i64,
}

impl From<GameAction> for RawAction {
    fn from(action: GameAction) -> Self {
        RawAction {
            action_type: action.kind.action_type(),
            payload: action.kind.payload(),
            player_id: action.player_id,
            timestamp: action.timestamp,
        }
    }
}

impl TryFrom<RawAction> for GameAction {
    type Error = ActionError;

    fn try_from(raw: RawAction) -> Result<Self, Self::Error> {
        Ok(GameAction {
            kind: ActionKind::from_parts(raw.action_type, raw.payload)?,
            player_id: raw.player_id,
            timestamp: raw.timestamp,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TargetInfo {
    pub player_id: PlayerId,
    pub nickname: String,
    pub seat_number: u8,
}

/// One entry of a player's current menu, with its eligible targets.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActionDescriptor {
    #[serde(rename = "type")]
    pub action_type: ActionType,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub targets: Option<Vec<TargetInfo>>,
}

impl ActionDescriptor {
    pub fn new(action_type: ActionType) -> Self {
        Self {
            action_type,
            label: action_type.label().to_string(),
            targets: None,
        }
    }

    pub fn with_targets(action_type: ActionType, targets: Vec<TargetInfo>) -> Self {
        Self {
            targets: Some(targets),
            ..Self::new(action_type)
        }
    }

    pub fn allows_target(&self, target_id: &str) -> bool {
        self.targets
            .as_ref()
            .map_or(true, |targets| targets.iter().any(|t| t.player_id == target_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn action_parses_from_wire_shape() {
        let json = r#"{"type":"wolf:kill","playerId":"p1","payload":{"targetId":"p4"},"timestamp":42}"#;
        let action: GameAction = serde_json::from_str(json).unwrap();
        assert_eq!(action.player_id, "p1");
        assert_eq!(
            action.kind,
            ActionKind::WolfKill {
                target_id: "p4".to_string()
            }
        );
        assert_eq!(action.timestamp, 42);
    }

    #[test]
    fn payload_may_be_omitted_for_plain_actions() {
        let json = r#"{"type":"witch:skip","playerId":"p2"}"#;
        let action: GameAction = serde_json::from_str(json).unwrap();
        assert_eq!(action.kind, ActionKind::WitchSkip);
    }

    #[test]
    fn missing_target_is_rejected() {
        let err = ActionKind::from_parts(ActionType::SeerCheck, ActionPayload::default()).unwrap_err();
        assert_eq!(
            err,
            ActionError::MissingPayload {
                action: ActionType::SeerCheck,
                field: "targetId"
            }
        );
    }

    #[test]
    fn sheriff_vote_serializes_candidate() {
        let action = GameAction::new(
            "p3",
            ActionKind::SheriffVote {
                candidate_id: "p7".to_string(),
            },
            0,
        );
        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(value["type"], "sheriff:vote");
        assert_eq!(value["payload"]["candidateId"], "p7");
    }
}
