//! The authoritative reducer: `(state, action) -> state`.
//!
//! Validation runs against the borrowed input; only once it passes is a
//! clone taken and transformed, so a rejected action leaves the caller's
//! state exactly as it was.

use rand::seq::SliceRandom;
use rand::Rng;
use std::collections::BTreeSet;
use tracing::{debug, info};

use crate::error::ActionError;
use crate::legal::{alive_holder, available_actions, pending_choices};
use crate::models::action::{ActionKind, ActionType, GameAction};
use crate::models::game::{
    DayStep, DayVoting, ElectionStep, GameState, HunterShot, NightGesture, NightResult, NightRound,
    NightSeerCheck, NightStep, SetupStep, SheriffChoice, SheriffElection, Stage, StepId,
};
use crate::models::player::{self, PlayerId, PlayerState, SeerCheck, SYSTEM_ACTOR};
use crate::models::role::{CheckResult, Gesture, Role};
use crate::models::rule::RuleOptions;
use crate::tally::Tally;
use crate::victory::victory_over;

/// Night steps after the wolves', each played only while its role holder lives.
const ROLE_STEPS: [(NightStep, Role); 3] = [
    (NightStep::WitchDecide, Role::Witch),
    (NightStep::SeerCheck, Role::Seer),
    (NightStep::HunterCheckGesture, Role::Hunter),
];

/// Applies `action` using the thread-local generator.
pub fn apply_action(
    state: &GameState,
    action: &GameAction,
    privileged: bool,
) -> Result<GameState, ActionError> {
    apply_action_with_rng(state, action, privileged, &mut rand::thread_rng())
}

/// Applies `action`, drawing the sheriff speech order from `rng`.
///
/// `privileged` is the dispatcher's word that the actor hosts the room.
pub fn apply_action_with_rng<R: Rng + ?Sized>(
    state: &GameState,
    action: &GameAction,
    privileged: bool,
    rng: &mut R,
) -> Result<GameState, ActionError> {
    validate(state, action, privileged)?;

    let mut next = state.clone();
    let stage = std::mem::replace(&mut next.stage, Stage::Setup(SetupStep::AssignRoles));
    let mut transition = Transition {
        room_id: &state.room_id,
        players: &mut next.players,
        options: &state.options,
        rng,
    };
    next.stage = transition.apply(stage, action)?;
    next.history.push(action.clone());

    debug!(
        room_id = %state.room_id,
        player_id = %action.player_id,
        action = %action.kind.action_type(),
        step = next.step().map_or("finished", StepId::as_str),
        "action applied"
    );
    Ok(next)
}

fn validate(state: &GameState, action: &GameAction, privileged: bool) -> Result<(), ActionError> {
    let action_type = action.kind.action_type();
    if state.is_finished() {
        return Err(ActionError::GameFinished);
    }

    if action.player_id == SYSTEM_ACTOR {
        return if state.pending_system_action().as_ref() == Some(&action.kind) {
            Ok(())
        } else {
            Err(ActionError::NotPermitted {
                action: action_type,
                step: state.step(),
            })
        };
    }

    let player = state
        .player(&action.player_id)
        .ok_or_else(|| ActionError::UnknownActor(action.player_id.clone()))?;
    if !player.alive && !state.is_pending_shooter(&player.player_id) {
        return Err(ActionError::DeadActor(player.player_id.clone()));
    }

    if action_type.is_system() {
        return Err(ActionError::NotPermitted {
            action: action_type,
            step: state.step(),
        });
    }

    let menu = available_actions(state, &player.player_id, privileged);
    let Some(descriptor) = menu.iter().find(|d| d.action_type == action_type) else {
        return Err(rejection(state, player, action_type, privileged));
    };
    match action.kind.target() {
        Some(target) if !descriptor.allows_target(target) => Err(ActionError::InvalidTarget {
            action: action_type,
            target_id: target.to_string(),
        }),
        _ => Ok(()),
    }
}

/// True when tonight's other potion is already spent and the rules forbid using both.
fn potion_conflict(state: &GameState, action_type: ActionType) -> bool {
    let Stage::Night { result, .. } = &state.stage else {
        return false;
    };
    if state.options.witch.can_use_both_in_same_night {
        return false;
    }
    match action_type {
        ActionType::WitchPoison => result.saved_by_witch,
        ActionType::WitchSave => result.killed_by_poison.is_some(),
        _ => false,
    }
}

/// Picks the most specific reason an action is missing from the actor's menu.
fn rejection(
    state: &GameState,
    player: &PlayerState,
    action_type: ActionType,
    privileged: bool,
) -> ActionError {
    let already_used = match (action_type, player.role) {
        (ActionType::WitchSave, Role::Witch) => player.witch_save_used,
        (ActionType::WitchPoison, Role::Witch) => player.witch_poison_used,
        (ActionType::SeerCheck, Role::Seer) => match &state.stage {
            Stage::Night { result, .. } => result
                .seer_check
                .as_ref()
                .is_some_and(|check| check.player_id == player.player_id),
            _ => false,
        },
        _ => false,
    };
    if already_used {
        return ActionError::AbilityAlreadyUsed(action_type);
    }
    if player.role == Role::Witch && potion_conflict(state, action_type) {
        return ActionError::RuleConflict("antidote and poison cannot be used on the same night");
    }

    match (&state.stage, action_type) {
        (
            Stage::SheriffElection {
                step: ElectionStep::CollectCandidates,
                ..
            },
            ActionType::SheriffConfirmCollect,
        )
        | (
            Stage::SheriffElection {
                step: ElectionStep::WithdrawAfterSpeeches,
                ..
            },
            ActionType::SheriffConfirmWithdraw,
        ) if !privileged => ActionError::NotPrivileged(action_type),
        (
            Stage::SheriffElection {
                step: ElectionStep::CollectCandidates,
                election,
                ..
            },
            ActionType::SheriffConfirmCollect,
        ) => ActionError::CandidatesPending {
            pending: pending_choices(state, election),
        },
        _ => ActionError::NotPermitted {
            action: action_type,
            step: state.step(),
        },
    }
}

struct Transition<'a, R: ?Sized> {
    room_id: &'a str,
    players: &'a mut Vec<PlayerState>,
    options: &'a RuleOptions,
    rng: &'a mut R,
}

impl<R: Rng + ?Sized> Transition<'_, R> {
    fn apply(&mut self, stage: Stage, action: &GameAction) -> Result<Stage, ActionError> {
        let actor = action.player_id.as_str();
        match (stage, &action.kind) {
            (Stage::Setup(SetupStep::AssignRoles), ActionKind::RevealRoles) => {
                Ok(Stage::Setup(SetupStep::RevealRoles {
                    ready: BTreeSet::new(),
                }))
            }
            (Stage::Setup(SetupStep::RevealRoles { mut ready }), ActionKind::Ready) => {
                ready.insert(actor.to_string());
                let everyone_ready = self
                    .roster()
                    .iter()
                    .filter(|p| p.alive)
                    .all(|p| ready.contains(&p.player_id));
                if everyone_ready {
                    info!(room_id = %self.room_id, "all players ready, first night falls");
                    Ok(begin_night(NightRound::First))
                } else {
                    Ok(Stage::Setup(SetupStep::RevealRoles { ready }))
                }
            }
            (Stage::Night { round, step, result }, kind) => self.night(round, step, result, actor, kind),
            (
                Stage::SheriffElection {
                    step,
                    election,
                    night,
                },
                kind,
            ) => self.election(step, election, night, actor, kind),
            (Stage::Day { step, night }, kind) => self.day(step, night, actor, kind),
            (stage, kind) => Err(ActionError::NotPermitted {
                action: kind.action_type(),
                step: stage.step(),
            }),
        }
    }

    fn night(
        &mut self,
        round: NightRound,
        step: NightStep,
        mut result: NightResult,
        actor: &str,
        kind: &ActionKind,
    ) -> Result<Stage, ActionError> {
        match kind {
            ActionKind::WolfKill { target_id } => {
                result.wolf_votes.insert(actor.to_string(), target_id.clone());
                result.wolf_confirmations.remove(actor);

                let wolves = player::alive_ids_with_role(self.roster(), Role::Werewolf);
                if !wolves.iter().all(|w| result.wolf_votes.contains_key(*w)) {
                    return Ok(Stage::Night { round, step, result });
                }
                let ballots = result
                    .wolf_votes
                    .iter()
                    .filter(|(voter, _)| wolves.contains(&voter.as_str()));
                let target = Tally::count(self.roster(), ballots, |_| 1.0).winner(self.roster());
                debug!(room_id = %self.room_id, target = ?target, "wolves settled on a target");
                result.killed_by_wolves = target;
                Ok(Stage::Night {
                    round,
                    step: NightStep::WolvesConfirm,
                    result,
                })
            }
            ActionKind::WolfConfirm => {
                result.wolf_confirmations.insert(actor.to_string());
                let wolves = player::alive_ids_with_role(self.roster(), Role::Werewolf);
                if wolves.iter().all(|w| result.wolf_confirmations.contains(*w)) {
                    Ok(self.advance_night(round, NightStep::WolvesConfirm, result))
                } else {
                    Ok(Stage::Night { round, step, result })
                }
            }
            ActionKind::WitchSave => {
                self.actor_mut(actor)?.witch_save_used = true;
                result.saved_target = result.killed_by_wolves.take();
                result.saved_by_witch = true;
                info!(room_id = %self.room_id, "witch used the antidote");
                self.after_witch(round, result, actor)
            }
            ActionKind::WitchPoison { target_id } => {
                self.actor_mut(actor)?.witch_poison_used = true;
                result.killed_by_poison = Some(target_id.clone());
                info!(room_id = %self.room_id, "witch used the poison");
                self.after_witch(round, result, actor)
            }
            ActionKind::WitchSkip => Ok(self.advance_night(round, NightStep::WitchDecide, result)),
            ActionKind::SeerCheck { target_id } => {
                let role = player::find(self.roster(), target_id)
                    .map(|p| p.role)
                    .ok_or_else(|| ActionError::UnknownActor(target_id.clone()))?;
                let outcome = CheckResult::from(role);
                self.actor_mut(actor)?.seer_checks.push(SeerCheck {
                    target_id: target_id.clone(),
                    result: outcome,
                });
                result.seer_check = Some(NightSeerCheck {
                    player_id: actor.to_string(),
                    target_id: target_id.clone(),
                    result: outcome,
                });
                Ok(self.advance_night(round, NightStep::SeerCheck, result))
            }
            ActionKind::HunterCheckGesture => {
                let gesture = if result.killed_by_poison.as_deref() == Some(actor) {
                    Gesture::Bad
                } else {
                    Gesture::Good
                };
                self.actor_mut(actor)?.hunter_gesture = Some(gesture);
                result.hunter_gesture = Some(NightGesture {
                    player_id: actor.to_string(),
                    gesture,
                });
                Ok(Stage::Night { round, step, result })
            }
            ActionKind::HunterConfirmGesture => {
                Ok(self.advance_night(round, NightStep::HunterCheckGesture, result))
            }
            other => Err(ActionError::NotPermitted {
                action: other.action_type(),
                step: Stage::Night { round, step, result }.step(),
            }),
        }
    }

    /// A potion ends the witch's turn unless the rules let her use both tonight.
    fn after_witch(
        &mut self,
        round: NightRound,
        result: NightResult,
        actor: &str,
    ) -> Result<Stage, ActionError> {
        let witch = self.actor_mut(actor)?;
        let spent = witch.witch_save_used && witch.witch_poison_used;
        if !self.options.witch.can_use_both_in_same_night || spent {
            Ok(self.advance_night(round, NightStep::WitchDecide, result))
        } else {
            Ok(Stage::Night {
                round,
                step: NightStep::WitchDecide,
                result,
            })
        }
    }

    fn advance_night(&self, round: NightRound, from: NightStep, result: NightResult) -> Stage {
        let next = ROLE_STEPS
            .iter()
            .find(|(step, role)| *step > from && alive_holder(self.roster(), *role).is_some());
        match next {
            Some(&(step, _)) => Stage::Night { round, step, result },
            None => self.end_night(round, result),
        }
    }

    fn end_night(&self, round: NightRound, night: NightResult) -> Stage {
        match round {
            NightRound::First => {
                info!(room_id = %self.room_id, "first night over, sheriff election opens");
                Stage::SheriffElection {
                    step: ElectionStep::CollectCandidates,
                    election: SheriffElection::default(),
                    night,
                }
            }
            NightRound::Regular => Stage::Day {
                step: DayStep::ApplyNightDeaths,
                night,
            },
        }
    }

    fn election(
        &mut self,
        step: ElectionStep,
        mut election: SheriffElection,
        night: NightResult,
        actor: &str,
        kind: &ActionKind,
    ) -> Result<Stage, ActionError> {
        match kind {
            ActionKind::SheriffRun => {
                election.choices.insert(actor.to_string(), SheriffChoice::Run);
                if !election.is_candidate(actor) {
                    election.candidates.push(actor.to_string());
                }
            }
            ActionKind::SheriffSkip => {
                election.choices.insert(actor.to_string(), SheriffChoice::Skip);
                election.candidates.retain(|c| c != actor);
            }
            ActionKind::SheriffConfirmCollect => {
                if election.candidates.is_empty() {
                    info!(room_id = %self.room_id, "nobody runs for sheriff");
                    return Ok(close_election(night));
                }
                let mut order = election.candidates.clone();
                order.shuffle(&mut *self.rng);
                election.speech_order = order;
                election.current_speech_index = 0;
                return Ok(Stage::SheriffElection {
                    step: ElectionStep::Speeches,
                    election,
                    night,
                });
            }
            ActionKind::SheriffFinishSpeech => {
                election.current_speech_index += 1;
                if election.current_speech_index >= election.speech_order.len() {
                    return Ok(Stage::SheriffElection {
                        step: ElectionStep::WithdrawAfterSpeeches,
                        election,
                        night,
                    });
                }
            }
            ActionKind::SheriffWithdraw => {
                if !election.has_withdrawn(actor) {
                    election.withdrawn.push(actor.to_string());
                }
                election.candidates.retain(|c| c != actor);
                if let Some(pos) = election.speech_order.iter().position(|c| c == actor) {
                    election.speech_order.remove(pos);
                    if pos < election.current_speech_index {
                        election.current_speech_index -= 1;
                    }
                }
                if election.candidates.is_empty() {
                    info!(room_id = %self.room_id, "every sheriff candidate withdrew");
                    return Ok(close_election(night));
                }
                if step == ElectionStep::Speeches
                    && election.current_speech_index >= election.speech_order.len()
                {
                    return Ok(Stage::SheriffElection {
                        step: ElectionStep::WithdrawAfterSpeeches,
                        election,
                        night,
                    });
                }
            }
            ActionKind::SheriffConfirmWithdraw => return Ok(self.open_sheriff_vote(election, night)),
            ActionKind::SheriffVote { candidate_id } => {
                election.votes.insert(actor.to_string(), candidate_id.clone());
                let everyone_voted = election
                    .eligible_voters(self.roster())
                    .all(|p| election.votes.contains_key(&p.player_id));
                if everyone_voted {
                    return Ok(self.resolve_election(election, night));
                }
            }
            other => {
                return Err(ActionError::NotPermitted {
                    action: other.action_type(),
                    step: Stage::SheriffElection {
                        step,
                        election,
                        night,
                    }
                    .step(),
                })
            }
        }
        Ok(Stage::SheriffElection {
            step,
            election,
            night,
        })
    }

    fn open_sheriff_vote(&mut self, election: SheriffElection, night: NightResult) -> Stage {
        if election.eligible_voters(self.roster()).next().is_none() {
            return self.resolve_election(election, night);
        }
        Stage::SheriffElection {
            step: ElectionStep::Voting,
            election,
            night,
        }
    }

    fn resolve_election(&mut self, election: SheriffElection, night: NightResult) -> Stage {
        let winner = match election.candidates.as_slice() {
            [only] if election.votes.is_empty() => Some(only.clone()),
            _ => Tally::count(self.roster(), &election.votes, |_| 1.0).winner(self.roster()),
        };
        if let Some(id) = winner {
            if let Some(sheriff) = player::find_mut(self.players, &id) {
                sheriff.is_sheriff = true;
                info!(room_id = %self.room_id, player_id = %id, "sheriff elected");
            }
        }
        close_election(night)
    }

    fn day(
        &mut self,
        step: DayStep,
        night: NightResult,
        actor: &str,
        kind: &ActionKind,
    ) -> Result<Stage, ActionError> {
        match (step, kind) {
            (DayStep::ApplyNightDeaths, ActionKind::ApplyNightDeaths) => {
                let victims = [night.killed_by_wolves.clone(), night.killed_by_poison.clone()];
                for victim in victims.iter().flatten() {
                    self.kill(victim);
                }
                let next = Stage::Day {
                    step: DayStep::AnnounceDeaths,
                    night,
                };
                Ok(self.settle(next))
            }
            (DayStep::AnnounceDeaths, ActionKind::AnnounceDeaths) => {
                let step = match self.night_shooter(&night) {
                    Some(hunter) => DayStep::HunterNightShot(HunterShot::pending(hunter)),
                    None => DayStep::Speeches,
                };
                Ok(Stage::Day { step, night })
            }
            (DayStep::Speeches, ActionKind::EndSpeeches) => Ok(Stage::Day {
                step: DayStep::Voting(DayVoting::default()),
                night,
            }),
            (DayStep::HunterNightShot(_), ActionKind::HunterShoot { target_id }) => {
                self.kill(target_id);
                info!(room_id = %self.room_id, target = %target_id, "hunter fired at dawn");
                Ok(self.settle(Stage::Day {
                    step: DayStep::Speeches,
                    night,
                }))
            }
            (DayStep::HunterNightShot(_), ActionKind::HunterSkip) => Ok(self.settle(Stage::Day {
                step: DayStep::Speeches,
                night,
            })),
            (DayStep::HunterDayShot(_), ActionKind::HunterShoot { target_id }) => {
                self.kill(target_id);
                info!(room_id = %self.room_id, target = %target_id, "hunter fired after the vote");
                Ok(self.settle(Stage::Day {
                    step: DayStep::Speeches,
                    night,
                }))
            }
            (DayStep::HunterDayShot(_), ActionKind::HunterSkip) => Ok(self.settle(Stage::Day {
                step: DayStep::Speeches,
                night,
            })),
            (DayStep::Voting(mut voting), ActionKind::DayVote { target_id }) => {
                voting.votes.insert(actor.to_string(), target_id.clone());
                let everyone_voted = self
                    .roster()
                    .iter()
                    .filter(|p| p.alive)
                    .all(|p| voting.votes.contains_key(&p.player_id));
                if !everyone_voted {
                    return Ok(Stage::Day {
                        step: DayStep::Voting(voting),
                        night,
                    });
                }
                self.resolve_day_vote(&voting, night)
            }
            (step, kind) => Err(ActionError::NotPermitted {
                action: kind.action_type(),
                step: Stage::Day { step, night }.step(),
            }),
        }
    }

    fn resolve_day_vote(&mut self, voting: &DayVoting, night: NightResult) -> Result<Stage, ActionError> {
        let weight = self.options.sheriff.vote_weight;
        let executed = Tally::count(self.roster(), &voting.votes, |p| {
            if p.is_sheriff {
                weight
            } else {
                1.0
            }
        })
        .outright_winner(self.roster());

        let Some(executed) = executed else {
            info!(room_id = %self.room_id, "day vote tied, nobody is executed");
            return Ok(begin_night(NightRound::Regular));
        };

        let can_shoot = self.options.hunter.can_shoot_when_voted;
        let hunter_fires = self.kill(&executed).is_some_and(|p| {
            p.role == Role::Hunter && p.hunter_gesture == Some(Gesture::Good) && can_shoot
        });
        info!(room_id = %self.room_id, player_id = %executed, "player executed by vote");
        if hunter_fires {
            return Ok(Stage::Day {
                step: DayStep::HunterDayShot(HunterShot::pending(executed)),
                night,
            });
        }
        Ok(self.settle(begin_night(NightRound::Regular)))
    }

    /// The hunter who died tonight and may still fire, if any.
    /// A poisoned hunter always holds a bad gesture, so only the rule decides.
    fn night_shooter(&self, night: &NightResult) -> Option<PlayerId> {
        let hunter = self
            .roster()
            .iter()
            .find(|p| p.role == Role::Hunter && !p.alive)?;
        let id = hunter.player_id.as_str();
        let allowed = if night.killed_by_poison.as_deref() == Some(id) {
            self.options.hunter.can_shoot_when_poisoned
        } else if night.killed_by_wolves.as_deref() == Some(id) {
            self.options.hunter.can_shoot_when_killed_at_night
                && hunter.hunter_gesture == Some(Gesture::Good)
        } else {
            false
        };
        allowed.then(|| id.to_string())
    }

    /// Ends the game if a faction has won, otherwise moves on to `next`.
    fn settle(&self, next: Stage) -> Stage {
        match victory_over(self.roster()) {
            Some(winner) => {
                info!(room_id = %self.room_id, %winner, "game over");
                Stage::Finished { winner }
            }
            None => next,
        }
    }

    fn kill(&mut self, player_id: &str) -> Option<&PlayerState> {
        let victim = player::find_mut(self.players, player_id)?;
        victim.alive = false;
        info!(room_id = %self.room_id, player_id, "player died");
        Some(&*victim)
    }

    fn actor_mut(&mut self, actor: &str) -> Result<&mut PlayerState, ActionError> {
        player::find_mut(self.players, actor).ok_or_else(|| ActionError::UnknownActor(actor.to_string()))
    }

    fn roster(&self) -> &[PlayerState] {
        self.players
    }
}

fn begin_night(round: NightRound) -> Stage {
    Stage::Night {
        round,
        step: NightStep::WolvesAttack,
        result: NightResult::default(),
    }
}

fn close_election(night: NightResult) -> Stage {
    Stage::Day {
        step: DayStep::ApplyNightDeaths,
        night,
    }
}
