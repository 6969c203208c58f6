pub mod config;
pub mod message;
pub mod player;
pub mod room;
pub mod session;
