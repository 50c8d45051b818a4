use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;
use validator::Validate;

/// Todo entity - represents a todo stored in MongoDB
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    /// Unique identifier (stored as _id in MongoDB)
    #[serde(rename = "_id", alias = "id")]
    pub id: Uuid,
    /// Todo title
    pub title: String,
    /// Completion flag
    pub completed: bool,
    /// Display position, unique across all todos
    pub order: i32,
}

impl Todo {
    /// Apply a partial update, leaving absent fields untouched
    pub fn apply_patch(&mut self, patch: PatchTodo) {
        if let Some(title) = patch.title {
            self.title = title;
        }
        if let Some(completed) = patch.completed {
            self.completed = completed;
        }
        if let Some(order) = patch.order {
            self.order = order;
        }
    }
}

/// Wire representation of a todo, including its canonical URL
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TodoResponse {
    pub id: Uuid,
    pub title: String,
    pub completed: bool,
    pub order: i32,
    /// Absolute URL of this todo
    pub url: String,
}

impl TodoResponse {
    /// Build the wire representation for a todo under the given base URL
    pub fn from_todo(todo: Todo, base_url: &str) -> Self {
        let url = format!("{}/todos/{}", base_url, todo.id);
        Self {
            id: todo.id,
            title: todo.title,
            completed: todo.completed,
            order: todo.order,
            url,
        }
    }
}

/// DTO for creating a new todo
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateTodo {
    #[validate(length(min = 1, message = "title must not be blank"))]
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    /// Desired position; generated when omitted
    #[validate(range(min = 0, message = "order must not be negative"))]
    pub order: Option<i32>,
}

/// DTO for replacing a todo wholesale
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ReplaceTodo {
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[validate(range(min = 0, message = "order must not be negative"))]
    pub order: i32,
}

/// DTO for partially updating a todo
///
/// Field rules are enforced by the service so that order conflicts take
/// precedence over validation failures.
#[derive(Debug, Clone, Default, Deserialize, Validate, ToSchema)]
pub struct PatchTodo {
    pub title: Option<String>,
    pub completed: Option<bool>,
    pub order: Option<i32>,
}

/// Query filter for bulk deletion
#[derive(Debug, Clone, Default, Deserialize, ToSchema, IntoParams)]
pub struct DeleteFilter {
    /// When true, delete only completed todos
    pub completed: Option<bool>,
}
