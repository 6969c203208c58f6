//! Legality oracle: what a given player may do in the current step.
//!
//! The reducer accepts exactly what this module advertises, and views embed
//! the same list, so the two never disagree.

use crate::models::action::{ActionDescriptor, ActionType, TargetInfo};
use crate::models::game::{
    DayStep, ElectionStep, GameState, NightResult, NightStep, SetupStep, SheriffElection, Stage,
};
use crate::models::player::PlayerState;
use crate::models::role::Role;

/// Actions `player_id` may issue now. `privileged` marks the room host.
pub fn available_actions(state: &GameState, player_id: &str, privileged: bool) -> Vec<ActionDescriptor> {
    let Some(player) = state.player(player_id) else {
        return Vec::new();
    };
    if !player.alive && !state.is_pending_shooter(player_id) {
        return Vec::new();
    }

    match &state.stage {
        Stage::Setup(step) => setup_actions(step, player),
        Stage::Night { step, result, .. } => night_actions(state, *step, result, player),
        Stage::SheriffElection { step, election, .. } => {
            election_actions(state, *step, election, player, privileged)
        }
        Stage::Day { step, .. } => day_actions(state, step, player),
        Stage::Finished { .. } => Vec::new(),
    }
}

fn setup_actions(step: &SetupStep, player: &PlayerState) -> Vec<ActionDescriptor> {
    match step {
        SetupStep::RevealRoles { ready } if !ready.contains(&player.player_id) => {
            vec![ActionDescriptor::new(ActionType::Ready)]
        }
        _ => Vec::new(),
    }
}

fn night_actions(
    state: &GameState,
    step: NightStep,
    result: &NightResult,
    player: &PlayerState,
) -> Vec<ActionDescriptor> {
    let mut actions = Vec::new();
    match (step, player.role) {
        (NightStep::WolvesAttack, Role::Werewolf) => {
            actions.push(ActionDescriptor::with_targets(
                ActionType::WolfKill,
                targets(state, |_| true),
            ));
        }
        (NightStep::WolvesConfirm, Role::Werewolf) => {
            actions.push(ActionDescriptor::with_targets(
                ActionType::WolfKill,
                targets(state, |_| true),
            ));
            if !result.wolf_confirmations.contains(&player.player_id) {
                actions.push(ActionDescriptor::new(ActionType::WolfConfirm));
            }
        }
        (NightStep::WitchDecide, Role::Witch) => {
            let witch = &state.options.witch;
            let one_potion = !witch.can_use_both_in_same_night;
            if let Some(victim) = result.killed_by_wolves.as_deref() {
                let self_save = victim == player.player_id;
                let poisoned_tonight = one_potion && result.killed_by_poison.is_some();
                if !player.witch_save_used && !poisoned_tonight && (!self_save || witch.can_self_save) {
                    actions.push(ActionDescriptor::with_targets(
                        ActionType::WitchSave,
                        targets(state, |p| p.player_id == victim),
                    ));
                }
            }
            if !player.witch_poison_used && !(one_potion && result.saved_by_witch) {
                let victim = result.killed_by_wolves.as_deref();
                actions.push(ActionDescriptor::with_targets(
                    ActionType::WitchPoison,
                    targets(state, |p| Some(p.player_id.as_str()) != victim),
                ));
            }
            actions.push(ActionDescriptor::new(ActionType::WitchSkip));
        }
        (NightStep::SeerCheck, Role::Seer) if result.seer_check.is_none() => {
            actions.push(ActionDescriptor::with_targets(
                ActionType::SeerCheck,
                targets(state, |p| p.player_id != player.player_id),
            ));
        }
        (NightStep::HunterCheckGesture, Role::Hunter) => {
            if result.hunter_gesture.is_some() {
                actions.push(ActionDescriptor::new(ActionType::HunterConfirmGesture));
            } else {
                actions.push(ActionDescriptor::new(ActionType::HunterCheckGesture));
            }
        }
        _ => {}
    }
    actions
}

fn election_actions(
    state: &GameState,
    step: ElectionStep,
    election: &SheriffElection,
    player: &PlayerState,
    privileged: bool,
) -> Vec<ActionDescriptor> {
    let mut actions = Vec::new();
    match step {
        ElectionStep::CollectCandidates => {
            actions.push(ActionDescriptor::new(ActionType::SheriffRun));
            actions.push(ActionDescriptor::new(ActionType::SheriffSkip));
            if privileged && pending_choices(state, election) == 0 {
                actions.push(ActionDescriptor::new(ActionType::SheriffConfirmCollect));
            }
        }
        ElectionStep::Speeches => {
            if election.current_speaker() == Some(&player.player_id) {
                actions.push(ActionDescriptor::new(ActionType::SheriffFinishSpeech));
            }
            if election.is_candidate(&player.player_id)
                && election.current_speech_index < election.speech_order.len()
            {
                actions.push(ActionDescriptor::new(ActionType::SheriffWithdraw));
            }
        }
        ElectionStep::WithdrawAfterSpeeches => {
            if election.is_candidate(&player.player_id) {
                actions.push(ActionDescriptor::new(ActionType::SheriffWithdraw));
            }
            if privileged {
                actions.push(ActionDescriptor::new(ActionType::SheriffConfirmWithdraw));
            }
        }
        ElectionStep::Voting => {
            if !election.is_candidate(&player.player_id) && !election.has_withdrawn(&player.player_id) {
                actions.push(ActionDescriptor::with_targets(
                    ActionType::SheriffVote,
                    targets(state, |p| election.is_candidate(&p.player_id)),
                ));
            }
        }
    }
    actions
}

fn day_actions(state: &GameState, step: &DayStep, player: &PlayerState) -> Vec<ActionDescriptor> {
    match step {
        DayStep::HunterNightShot(shot) | DayStep::HunterDayShot(shot)
            if shot.player_id == player.player_id =>
        {
            vec![
                ActionDescriptor::with_targets(
                    ActionType::HunterShoot,
                    targets(state, |p| p.player_id != player.player_id),
                ),
                ActionDescriptor::new(ActionType::HunterSkip),
            ]
        }
        DayStep::Voting(_) => vec![ActionDescriptor::with_targets(
            ActionType::DayVote,
            targets(state, |p| p.player_id != player.player_id),
        )],
        _ => Vec::new(),
    }
}

/// Alive players who have not yet said whether they run.
pub(crate) fn pending_choices(state: &GameState, election: &SheriffElection) -> usize {
    state
        .players
        .iter()
        .filter(|p| p.alive && !election.choices.contains_key(&p.player_id))
        .count()
}

/// Alive players passing `keep`, in seat order.
fn targets(state: &GameState, keep: impl Fn(&PlayerState) -> bool) -> Vec<TargetInfo> {
    state
        .players
        .iter()
        .filter(|p| p.alive && keep(p))
        .map(|p| TargetInfo {
            player_id: p.player_id.clone(),
            nickname: p.nickname.clone(),
            seat_number: p.seat_number,
        })
        .collect()
}

/// The living holder of `role`, if any.
pub(crate) fn alive_holder(players: &[PlayerState], role: Role) -> Option<&PlayerState> {
    players.iter().find(|p| p.is_alive_as(role))
}
