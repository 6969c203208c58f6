//! Rule engine for a ten-seat werewolf game.
//!
//! Everything here is synchronous and pure: callers hand in a [`GameState`]
//! and an action and get back a new state or an [`ActionError`].

pub mod error;
pub mod legal;
pub mod models;
pub mod reducer;
pub mod setup;
mod tally;
pub mod victory;
pub mod view;

pub use error::{ActionError, InitError, ViewError};
pub use legal::available_actions;
pub use models::action::{ActionDescriptor, ActionKind, ActionPayload, ActionType, GameAction, TargetInfo};
pub use models::game::{GameState, PhaseId, Stage, StepId, PLAYER_COUNT};
pub use models::player::{PlayerId, PlayerSeed, PlayerState, SYSTEM_ACTOR};
pub use models::role::{CheckResult, Faction, Gesture, Role};
pub use models::rule::{HunterRules, RuleOptions, SheriffRules, WitchRules};
pub use reducer::{apply_action, apply_action_with_rng};
pub use setup::{initialize_game, initialize_game_with_rng};
pub use victory::check_victory;
pub use view::{player_view, PlayerView};
