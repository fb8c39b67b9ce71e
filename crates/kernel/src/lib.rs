//! Wayfinder Kernel Library
//!
//! Site navigation menus: the menu store, its validation rules, and the
//! HTTP routes that serve and administer it. The `wayfinder` binary wires
//! these together into a server.

pub mod config;
pub mod db;
pub mod error;
pub mod menu;
pub mod models;
pub mod routes;
pub mod state;

pub use config::Config;
pub use error::{AppError, AppResult};
pub use menu::{MemoryMenuStore, MenuError, MenuFilter, MenuStore, PgMenuStore};
pub use state::AppState;
