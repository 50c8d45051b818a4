use async_trait::async_trait;
use uuid::Uuid;

use crate::error::TodoResult;
use crate::models::Todo;

/// Repository trait for Todo persistence
///
/// This trait defines the data access interface for todos.
/// Implementations can use different storage backends (MongoDB, in-memory).
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TodoRepository: Send + Sync {
    /// Insert a new todo, failing if its order is already taken
    async fn insert(&self, todo: &Todo) -> TodoResult<()>;

    /// Replace a stored todo, failing if its order collides with another todo
    async fn replace(&self, todo: &Todo) -> TodoResult<()>;

    /// Get a todo by ID
    async fn find_by_id(&self, id: Uuid) -> TodoResult<Option<Todo>>;

    /// List all todos sorted by ascending order
    async fn find_all_ordered(&self) -> TodoResult<Vec<Todo>>;

    /// Check whether a todo with the given ID exists
    async fn exists(&self, id: Uuid) -> TodoResult<bool>;

    /// Delete a todo by ID, returning whether a document was removed
    async fn delete_by_id(&self, id: Uuid) -> TodoResult<bool>;

    /// Delete every todo, returning the number removed
    async fn delete_all(&self) -> TodoResult<u64>;

    /// Delete completed todos only, returning the number removed
    async fn delete_completed(&self) -> TodoResult<u64>;

    /// Highest order currently in use, if any todos exist
    async fn max_order(&self) -> TodoResult<Option<i32>>;

    /// Find a todo occupying the given order, ignoring the excluded ID
    async fn find_by_order_excluding(&self, order: i32, excluded: Uuid)
    -> TodoResult<Option<Todo>>;
}
