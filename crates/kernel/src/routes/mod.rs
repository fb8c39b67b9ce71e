//! HTTP route handlers.

use axum::Router;

use crate::state::AppState;

pub mod health;
pub mod helpers;
pub mod menu;
pub mod menu_admin;

/// All kernel routes, without middleware layers or state.
pub fn router() -> Router<AppState> {
    Router::new()
        .merge(health::router())
        .merge(menu::router())
        .merge(menu_admin::router())
}
