use thiserror::Error;

use crate::models::action::ActionType;
use crate::models::game::StepId;
use crate::models::player::PlayerId;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InitError {
    #[error("werewolf needs exactly {expected} players, got {actual}")]
    InvalidPlayerCount { expected: usize, actual: usize },
    #[error("player {0} appears twice in the roster")]
    DuplicatePlayer(PlayerId),
    #[error("player id {0} is reserved")]
    ReservedPlayerId(PlayerId),
}

/// Why the reducer refused an action. The caller's state is untouched in every case.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    #[error("player {0} is not in this game")]
    UnknownActor(PlayerId),
    #[error("player {0} is dead")]
    DeadActor(PlayerId),
    #[error("{action} is not permitted during {}", step_label(.step))]
    NotPermitted {
        action: ActionType,
        step: Option<StepId>,
    },
    #[error("{0} has already been used")]
    AbilityAlreadyUsed(ActionType),
    #[error("rule conflict: {0}")]
    RuleConflict(&'static str),
    #[error("{pending} players have not chosen whether to run for sheriff")]
    CandidatesPending { pending: usize },
    #[error("only the host may issue {0}")]
    NotPrivileged(ActionType),
    #[error("{target_id} is not a valid target for {action}")]
    InvalidTarget {
        action: ActionType,
        target_id: PlayerId,
    },
    #[error("{action} requires payload field {field}")]
    MissingPayload {
        action: ActionType,
        field: &'static str,
    },
    #[error("the game is already finished")]
    GameFinished,
}

fn step_label(step: &Option<StepId>) -> &'static str {
    step.map_or("finished", StepId::as_str)
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ViewError {
    #[error("player {0} is not in this game")]
    UnknownPlayer(PlayerId),
}
