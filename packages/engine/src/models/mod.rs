pub mod action;
pub mod game;
pub mod player;
pub mod role;
pub mod rule;
