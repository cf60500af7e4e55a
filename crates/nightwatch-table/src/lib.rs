//! Running games for Nightwatch.
//!
//! Each game runs as an isolated Tokio task (actor model) that owns its
//! [`GameMachine`](nightwatch_engine::GameMachine) and its phase timer.
//!
//! # Key types
//!
//! - [`TableManager`]: creates and destroys tables
//! - [`GameHandle`]: send commands to a running table and subscribe to it
//! - [`TableUpdate`]: narration and phase changes pushed to subscribers
//! - [`TableConfig`]: timings, channel size, seed and autopilot

mod config;
mod error;
mod manager;
mod table;

pub use config::{TableConfig, TableUpdate};
pub use error::TableError;
pub use manager::TableManager;
pub use table::{GameHandle, UpdateSender};
