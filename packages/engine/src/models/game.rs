use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use super::action::{ActionKind, GameAction};
use super::player::{self, PlayerId, PlayerState};
use super::role::{CheckResult, Faction, Gesture};
use super::rule::RuleOptions;

pub const PLAYER_COUNT: usize = 10;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PhaseId {
    Setup,
    NightFirst,
    NightRegular,
    SheriffElection,
    Day,
    Finished,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum StepId {
    #[serde(rename = "setup:assign_roles")]
    SetupAssignRoles,
    #[serde(rename = "setup:reveal_roles")]
    SetupRevealRoles,
    #[serde(rename = "night:wolves_attack")]
    NightWolvesAttack,
    #[serde(rename = "night:wolves_confirm")]
    NightWolvesConfirm,
    #[serde(rename = "night:witch_decide")]
    NightWitchDecide,
    #[serde(rename = "night:seer_check")]
    NightSeerCheck,
    #[serde(rename = "night:hunter_check_gesture")]
    NightHunterCheckGesture,
    #[serde(rename = "sheriff:collect_candidates")]
    SheriffCollectCandidates,
    #[serde(rename = "sheriff:speeches")]
    SheriffSpeeches,
    #[serde(rename = "sheriff:withdraw_after_speeches")]
    SheriffWithdrawAfterSpeeches,
    #[serde(rename = "sheriff:voting")]
    SheriffVoting,
    #[serde(rename = "day:apply_night_deaths")]
    DayApplyNightDeaths,
    #[serde(rename = "day:announce_deaths")]
    DayAnnounceDeaths,
    #[serde(rename = "day:hunter_night_shot")]
    DayHunterNightShot,
    #[serde(rename = "day:speeches")]
    DaySpeeches,
    #[serde(rename = "day:voting")]
    DayVoting,
    #[serde(rename = "day:hunter_day_shot")]
    DayHunterDayShot,
}

impl StepId {
    pub fn as_str(self) -> &'static str {
        match self {
            StepId::SetupAssignRoles => "setup:assign_roles",
            StepId::SetupRevealRoles => "setup:reveal_roles",
            StepId::NightWolvesAttack => "night:wolves_attack",
            StepId::NightWolvesConfirm => "night:wolves_confirm",
            StepId::NightWitchDecide => "night:witch_decide",
            StepId::NightSeerCheck => "night:seer_check",
            StepId::NightHunterCheckGesture => "night:hunter_check_gesture",
            StepId::SheriffCollectCandidates => "sheriff:collect_candidates",
            StepId::SheriffSpeeches => "sheriff:speeches",
            StepId::SheriffWithdrawAfterSpeeches => "sheriff:withdraw_after_speeches",
            StepId::SheriffVoting => "sheriff:voting",
            StepId::DayApplyNightDeaths => "day:apply_night_deaths",
            StepId::DayAnnounceDeaths => "day:announce_deaths",
            StepId::DayHunterNightShot => "day:hunter_night_shot",
            StepId::DaySpeeches => "day:speeches",
            StepId::DayVoting => "day:voting",
            StepId::DayHunterDayShot => "day:hunter_day_shot",
        }
    }
}

impl fmt::Display for StepId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NightSeerCheck {
    pub player_id: PlayerId,
    pub target_id: PlayerId,
    pub result: CheckResult,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NightGesture {
    pub player_id: PlayerId,
    pub gesture: Gesture,
}

/// One night's record. A fresh value is built when every night begins.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NightResult {
    pub wolf_votes: BTreeMap<PlayerId, PlayerId>,
    pub wolf_confirmations: BTreeSet<PlayerId>,
    pub killed_by_wolves: Option<PlayerId>,
    pub killed_by_poison: Option<PlayerId>,
    pub saved_by_witch: bool,
    pub saved_target: Option<PlayerId>,
    pub seer_check: Option<NightSeerCheck>,
    pub hunter_gesture: Option<NightGesture>,
}

impl NightResult {
    /// The player the wolves settled on, whether or not the witch saved them.
    pub fn wolf_target(&self) -> Option<&PlayerId> {
        self.killed_by_wolves.as_ref().or(self.saved_target.as_ref())
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NightRound {
    First,
    Regular,
}

/// Night steps in the order they are played.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NightStep {
    WolvesAttack,
    WolvesConfirm,
    WitchDecide,
    SeerCheck,
    HunterCheckGesture,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SheriffChoice {
    Run,
    Skip,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SheriffElection {
    pub candidates: Vec<PlayerId>,
    pub choices: BTreeMap<PlayerId, SheriffChoice>,
    pub speech_order: Vec<PlayerId>,
    pub current_speech_index: usize,
    pub withdrawn: Vec<PlayerId>,
    pub votes: BTreeMap<PlayerId, PlayerId>,
}

impl SheriffElection {
    pub fn current_speaker(&self) -> Option<&PlayerId> {
        self.speech_order.get(self.current_speech_index)
    }

    pub fn is_candidate(&self, player_id: &str) -> bool {
        self.candidates.iter().any(|c| c == player_id)
    }

    pub fn has_withdrawn(&self, player_id: &str) -> bool {
        self.withdrawn.iter().any(|w| w == player_id)
    }

    /// Alive players who sit below the stage: neither running nor withdrawn.
    pub fn eligible_voters<'a>(&'a self, players: &'a [PlayerState]) -> impl Iterator<Item = &'a PlayerState> {
        players
            .iter()
            .filter(move |p| p.alive && !self.is_candidate(&p.player_id) && !self.has_withdrawn(&p.player_id))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ElectionStep {
    CollectCandidates,
    Speeches,
    WithdrawAfterSpeeches,
    Voting,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayVoting {
    pub votes: BTreeMap<PlayerId, PlayerId>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HunterShot {
    pub player_id: PlayerId,
    pub target_id: Option<PlayerId>,
}

impl HunterShot {
    pub fn pending(player_id: impl Into<String>) -> Self {
        Self {
            player_id: player_id.into(),
            target_id: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DayStep {
    ApplyNightDeaths,
    AnnounceDeaths,
    HunterNightShot(HunterShot),
    Speeches,
    Voting(DayVoting),
    HunterDayShot(HunterShot),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SetupStep {
    AssignRoles,
    RevealRoles { ready: BTreeSet<PlayerId> },
}

/// Where the game is. Each variant carries only the sub-state that exists during it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "data")]
pub enum Stage {
    Setup(SetupStep),
    Night {
        round: NightRound,
        step: NightStep,
        result: NightResult,
    },
    SheriffElection {
        step: ElectionStep,
        election: SheriffElection,
        night: NightResult,
    },
    Day {
        step: DayStep,
        night: NightResult,
    },
    Finished {
        winner: Faction,
    },
}

impl Stage {
    pub fn phase(&self) -> PhaseId {
        match self {
            Stage::Setup(_) => PhaseId::Setup,
            Stage::Night {
                round: NightRound::First,
                ..
            } => PhaseId::NightFirst,
            Stage::Night { .. } => PhaseId::NightRegular,
            Stage::SheriffElection { .. } => PhaseId::SheriffElection,
            Stage::Day { .. } => PhaseId::Day,
            Stage::Finished { .. } => PhaseId::Finished,
        }
    }

    pub fn step(&self) -> Option<StepId> {
        Some(match self {
            Stage::Setup(SetupStep::AssignRoles) => StepId::SetupAssignRoles,
            Stage::Setup(SetupStep::RevealRoles { .. }) => StepId::SetupRevealRoles,
            Stage::Night { step, .. } => match step {
                NightStep::WolvesAttack => StepId::NightWolvesAttack,
                NightStep::WolvesConfirm => StepId::NightWolvesConfirm,
                NightStep::WitchDecide => StepId::NightWitchDecide,
                NightStep::SeerCheck => StepId::NightSeerCheck,
                NightStep::HunterCheckGesture => StepId::NightHunterCheckGesture,
            },
            Stage::SheriffElection { step, .. } => match step {
                ElectionStep::CollectCandidates => StepId::SheriffCollectCandidates,
                ElectionStep::Speeches => StepId::SheriffSpeeches,
                ElectionStep::WithdrawAfterSpeeches => StepId::SheriffWithdrawAfterSpeeches,
                ElectionStep::Voting => StepId::SheriffVoting,
            },
            Stage::Day { step, .. } => match step {
                DayStep::ApplyNightDeaths => StepId::DayApplyNightDeaths,
                DayStep::AnnounceDeaths => StepId::DayAnnounceDeaths,
                DayStep::HunterNightShot(_) => StepId::DayHunterNightShot,
                DayStep::Speeches => StepId::DaySpeeches,
                DayStep::Voting(_) => StepId::DayVoting,
                DayStep::HunterDayShot(_) => StepId::DayHunterDayShot,
            },
            Stage::Finished { .. } => return None,
        })
    }

    /// The record of the night in progress or the one just played.
    pub fn night_result(&self) -> Option<&NightResult> {
        match self {
            Stage::Night { result, .. } => Some(result),
            Stage::SheriffElection { night, .. } | Stage::Day { night, .. } => Some(night),
            Stage::Setup(_) | Stage::Finished { .. } => None,
        }
    }

    pub fn hunter_shot(&self) -> Option<&HunterShot> {
        match self {
            Stage::Day {
                step: DayStep::HunterNightShot(shot) | DayStep::HunterDayShot(shot),
                ..
            } => Some(shot),
            _ => None,
        }
    }
}

/// Authoritative state of one room's game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameState {
    pub room_id: String,
    pub players: Vec<PlayerState>,
    pub options: RuleOptions,
    pub stage: Stage,
    pub history: Vec<GameAction>,
}

impl GameState {
    /// Replaces the ruleset. Meant for the dispatcher right after initialization.
    pub fn with_options(mut self, options: RuleOptions) -> Self {
        self.options = options;
        self
    }

    pub fn phase(&self) -> PhaseId {
        self.stage.phase()
    }

    pub fn step(&self) -> Option<StepId> {
        self.stage.step()
    }

    pub fn winner(&self) -> Option<Faction> {
        match self.stage {
            Stage::Finished { winner } => Some(winner),
            _ => None,
        }
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.stage, Stage::Finished { .. })
    }

    pub fn player(&self, player_id: &str) -> Option<&PlayerState> {
        player::find(&self.players, player_id)
    }

    pub fn sheriff(&self) -> Option<&PlayerState> {
        self.players.iter().find(|p| p.is_sheriff)
    }

    /// A dead hunter still acts while their shot is pending.
    pub fn is_pending_shooter(&self, player_id: &str) -> bool {
        self.stage
            .hunter_shot()
            .is_some_and(|shot| shot.player_id == player_id)
    }

    /// The system step the dispatcher must apply before broadcasting, if any.
    pub fn pending_system_action(&self) -> Option<ActionKind> {
        match &self.stage {
            Stage::Setup(SetupStep::AssignRoles) => Some(ActionKind::RevealRoles),
            Stage::Day { step, .. } => match step {
                DayStep::ApplyNightDeaths => Some(ActionKind::ApplyNightDeaths),
                DayStep::AnnounceDeaths => Some(ActionKind::AnnounceDeaths),
                DayStep::Speeches => Some(ActionKind::EndSpeeches),
                _ => None,
            },
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finished_stage_has_no_step() {
        let stage = Stage::Finished {
            winner: Faction::Villagers,
        };
        assert_eq!(stage.phase(), PhaseId::Finished);
        assert_eq!(stage.step(), None);
    }

    #[test]
    fn night_round_selects_phase() {
        let first = Stage::Night {
            round: NightRound::First,
            step: NightStep::SeerCheck,
            result: NightResult::default(),
        };
        let regular = Stage::Night {
            round: NightRound::Regular,
            step: NightStep::SeerCheck,
            result: NightResult::default(),
        };
        assert_eq!(first.phase(), PhaseId::NightFirst);
        assert_eq!(regular.phase(), PhaseId::NightRegular);
        assert_eq!(first.step(), Some(StepId::NightSeerCheck));
    }

    #[test]
    fn step_ids_serialize_to_wire_names() {
        let value = serde_json::to_value(StepId::SheriffWithdrawAfterSpeeches).unwrap();
        assert_eq!(value, "sheriff:withdraw_after_speeches");
        assert_eq!(
            serde_json::to_value(PhaseId::NightRegular).unwrap(),
            "night_regular"
        );
    }

    #[test]
    fn wolf_target_survives_a_save() {
        let night = NightResult {
            saved_by_witch: true,
            saved_target: Some("p5".to_string()),
            ..NightResult::default()
        };
        assert_eq!(night.killed_by_wolves, None);
        assert_eq!(night.wolf_target().map(String::as_str), Some("p5"));
    }
}
