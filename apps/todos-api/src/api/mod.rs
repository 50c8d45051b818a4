//! API routes module
//!
//! This module defines all HTTP API routes for the Todos API.

pub mod health;
pub mod todos;

use axum::Router;

use crate::state::AppState;

/// Create all API routes
/// Note: These are mounted at the application root by axum_helpers::create_router
pub fn routes(state: &AppState) -> Router {
    Router::new()
        .nest("/todos", todos::router(state))
        .merge(health::router(state.clone()))
}
