use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use thiserror::Error;
use uuid::Uuid;

#[derive(Debug, Error)]
pub enum TodoError {
    #[error("Todo not found: {0}")]
    NotFound(Uuid),

    #[error("Order {0} is already taken")]
    OrderTaken(i32),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Database error: {0}")]
    Database(String),
}

pub type TodoResult<T> = Result<T, TodoError>;

/// Convert TodoError to AppError for standardized error responses
impl From<TodoError> for AppError {
    fn from(err: TodoError) -> Self {
        match err {
            TodoError::NotFound(id) => AppError::NotFound(format!("Todo {} not found", id)),
            TodoError::OrderTaken(order) => {
                AppError::Conflict(format!("A todo with order {} already exists", order))
            }
            TodoError::Validation(msg) => AppError::BadRequest(msg),
            TodoError::Database(msg) => AppError::Database(msg),
        }
    }
}

impl IntoResponse for TodoError {
    fn into_response(self) -> Response {
        // Convert to AppError for the standardized error response format
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

impl From<mongodb::error::Error> for TodoError {
    fn from(err: mongodb::error::Error) -> Self {
        TodoError::Database(err.to_string())
    }
}
