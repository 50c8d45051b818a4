//! Todos API routes
//!
//! This module wires up the todos domain to HTTP routes.

use axum::Router;
use domain_todos::{MongoTodoRepository, TodoResult, TodoService, handlers};
use mongodb::Database;

use crate::state::AppState;

/// Create todos router
pub fn router(state: &AppState) -> Router {
    // Create the MongoDB repository
    let repository = MongoTodoRepository::new(&state.db);

    // Create the service
    let service = TodoService::new(repository);

    // Return the domain's router
    handlers::router(service)
}

/// Create the indexes the todos collection relies on
pub async fn init_indexes(db: &Database) -> TodoResult<()> {
    MongoTodoRepository::new(db).init_indexes().await
}
