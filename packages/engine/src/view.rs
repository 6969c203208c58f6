//! Per-player projection of a [`GameState`].
//!
//! The public slice is identical for every requester. The private slice only
//! ever holds the requester's own data plus what their role is entitled to see.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ViewError;
use crate::legal::available_actions;
use crate::models::action::ActionDescriptor;
use crate::models::game::{
    DayStep, DayVoting, GameState, NightResult, NightStep, PhaseId, SetupStep, SheriffChoice,
    SheriffElection, Stage, StepId,
};
use crate::models::player::{self, PlayerId, PlayerState, SeerCheck};
use crate::models::role::{Faction, Gesture, Role};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatInfo {
    pub player_id: PlayerId,
    pub seat_number: u8,
    pub nickname: String,
    pub is_sheriff: bool,
}

impl From<&PlayerState> for SeatInfo {
    fn from(p: &PlayerState) -> Self {
        Self {
            player_id: p.player_id.clone(),
            seat_number: p.seat_number,
            nickname: p.nickname.clone(),
            is_sheriff: p.is_sheriff,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    Wolf,
    Poison,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NightDeath {
    pub player_id: PlayerId,
    pub seat_number: u8,
    pub nickname: String,
    pub cause: DeathCause,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElectionView {
    pub candidates: Vec<PlayerId>,
    pub speech_order: Vec<PlayerId>,
    pub current_speaker: Option<PlayerId>,
    pub withdrawn: Vec<PlayerId>,
    pub votes: BTreeMap<PlayerId, PlayerId>,
}

impl From<&SheriffElection> for ElectionView {
    fn from(election: &SheriffElection) -> Self {
        Self {
            candidates: election.candidates.clone(),
            speech_order: election.speech_order.clone(),
            current_speaker: election.current_speaker().cloned(),
            withdrawn: election.withdrawn.clone(),
            votes: election.votes.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicView {
    pub phase: PhaseId,
    pub step: Option<StepId>,
    pub alive_players: Vec<SeatInfo>,
    pub dead_players: Vec<SeatInfo>,
    /// Last night's deaths, published once the day begins.
    pub night_deaths: Vec<NightDeath>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ready_players: Option<Vec<PlayerId>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheriff_election: Option<ElectionView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub day_voting: Option<DayVoting>,
    pub winner: Option<Faction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WitchNightInfo {
    pub killed_by_wolves: Option<PlayerId>,
    pub killed_by_poison: Option<PlayerId>,
    pub saved_target: Option<PlayerId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WolfVote {
    pub player_id: PlayerId,
    pub seat_number: u8,
    pub nickname: String,
    pub target_id: PlayerId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WolfConfirmation {
    pub player_id: PlayerId,
    pub seat_number: u8,
    pub confirmed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WolfNightInfo {
    pub votes: Vec<WolfVote>,
    pub target: Option<PlayerId>,
    pub confirmations: Vec<WolfConfirmation>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivateView {
    pub player_id: PlayerId,
    pub seat_number: u8,
    pub nickname: String,
    pub role: Role,
    pub alive: bool,
    pub is_sheriff: bool,
    pub seer_checks: Vec<SeerCheck>,
    pub hunter_gesture: Option<Gesture>,
    pub witch_save_used: bool,
    pub witch_poison_used: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub witch_night_info: Option<WitchNightInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub wolf_night_info: Option<WolfNightInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sheriff_choice: Option<SheriffChoice>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerView {
    pub room_id: String,
    pub public: PublicView,
    pub private: PrivateView,
    pub available_actions: Vec<ActionDescriptor>,
}

/// Builds the view `player_id` is allowed to see. `privileged_actor` names the
/// room host, whose menu also carries the host-only actions.
pub fn player_view(
    state: &GameState,
    player_id: &str,
    privileged_actor: Option<&str>,
) -> Result<PlayerView, ViewError> {
    let me = state
        .player(player_id)
        .ok_or_else(|| ViewError::UnknownPlayer(player_id.to_string()))?;
    let privileged = privileged_actor == Some(player_id);

    Ok(PlayerView {
        room_id: state.room_id.clone(),
        public: public_view(state),
        private: private_view(state, me),
        available_actions: available_actions(state, player_id, privileged),
    })
}

fn public_view(state: &GameState) -> PublicView {
    let (alive, dead): (Vec<&PlayerState>, Vec<&PlayerState>) =
        state.players.iter().partition(|p| p.alive);

    let night_deaths = match &state.stage {
        Stage::Day { night, .. } => night_deaths(&state.players, night),
        _ => Vec::new(),
    };
    let ready_players = match &state.stage {
        Stage::Setup(SetupStep::RevealRoles { ready }) => Some(ready.iter().cloned().collect()),
        _ => None,
    };
    let sheriff_election = match &state.stage {
        Stage::SheriffElection { election, .. } => Some(ElectionView::from(election)),
        _ => None,
    };
    let day_voting = match &state.stage {
        Stage::Day {
            step: DayStep::Voting(voting),
            ..
        } => Some(voting.clone()),
        _ => None,
    };

    PublicView {
        phase: state.phase(),
        step: state.step(),
        alive_players: alive.into_iter().map(SeatInfo::from).collect(),
        dead_players: dead.into_iter().map(SeatInfo::from).collect(),
        night_deaths,
        ready_players,
        sheriff_election,
        day_voting,
        winner: state.winner(),
    }
}

fn night_deaths(players: &[PlayerState], night: &NightResult) -> Vec<NightDeath> {
    [
        (night.killed_by_wolves.as_deref(), DeathCause::Wolf),
        (night.killed_by_poison.as_deref(), DeathCause::Poison),
    ]
    .into_iter()
    .filter_map(|(id, cause)| {
        let victim = player::find(players, id?)?;
        Some(NightDeath {
            player_id: victim.player_id.clone(),
            seat_number: victim.seat_number,
            nickname: victim.nickname.clone(),
            cause,
        })
    })
    .collect()
}

fn private_view(state: &GameState, me: &PlayerState) -> PrivateView {
    let sheriff_choice = match &state.stage {
        Stage::SheriffElection { election, .. } => election.choices.get(&me.player_id).copied(),
        _ => None,
    };

    PrivateView {
        player_id: me.player_id.clone(),
        seat_number: me.seat_number,
        nickname: me.nickname.clone(),
        role: me.role,
        alive: me.alive,
        is_sheriff: me.is_sheriff,
        seer_checks: me.seer_checks.clone(),
        hunter_gesture: me.hunter_gesture,
        witch_save_used: me.witch_save_used,
        witch_poison_used: me.witch_poison_used,
        witch_night_info: (me.role == Role::Witch)
            .then(|| witch_night_info(&state.stage))
            .flatten(),
        wolf_night_info: (me.role == Role::Werewolf)
            .then(|| wolf_night_info(state))
            .flatten(),
        sheriff_choice,
    }
}

/// Tonight's outcome as the witch knows it, from her own turn onwards.
fn witch_night_info(stage: &Stage) -> Option<WitchNightInfo> {
    let night = match stage {
        Stage::Night { step, result, .. } if *step >= NightStep::WitchDecide => result,
        Stage::SheriffElection { night, .. } | Stage::Day { night, .. } => night,
        _ => return None,
    };
    Some(WitchNightInfo {
        killed_by_wolves: night.killed_by_wolves.clone(),
        killed_by_poison: night.killed_by_poison.clone(),
        saved_target: night.saved_target.clone(),
    })
}

fn wolf_night_info(state: &GameState) -> Option<WolfNightInfo> {
    let Stage::Night { result, .. } = &state.stage else {
        return None;
    };

    let votes = result
        .wolf_votes
        .iter()
        .filter_map(|(voter, target)| {
            let wolf = player::find(&state.players, voter)?;
            Some(WolfVote {
                player_id: wolf.player_id.clone(),
                seat_number: wolf.seat_number,
                nickname: wolf.nickname.clone(),
                target_id: target.clone(),
            })
        })
        .collect();
    let confirmations = state
        .players
        .iter()
        .filter(|p| p.is_alive_as(Role::Werewolf))
        .map(|p| WolfConfirmation {
            player_id: p.player_id.clone(),
            seat_number: p.seat_number,
            confirmed: result.wolf_confirmations.contains(&p.player_id),
        })
        .collect();

    Some(WolfNightInfo {
        votes,
        target: result.wolf_target().cloned(),
        confirmations,
    })
}
