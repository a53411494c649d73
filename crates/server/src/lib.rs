//! Nebula game server library.

pub mod ai;
pub mod collision;
pub mod config;
pub mod delta;
pub mod entity;
pub mod error;
pub mod hazards;
pub mod level;
pub mod movement;
pub mod scheduler;
pub mod server;
pub mod special_event;
pub mod world;

// Re-export commonly used types
pub use config::Config;
pub use server::{GameHandle, run, start};
