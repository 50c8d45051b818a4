//! In-memory implementation of TodoRepository for tests and local development

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{TodoError, TodoResult};
use crate::models::Todo;
use crate::repository::TodoRepository;

/// Repository keeping todos in a shared map
///
/// Enforces the same order-uniqueness rule as the MongoDB index so handler
/// tests exercise the full conflict path without a database.
#[derive(Clone, Default)]
pub struct InMemoryTodoRepository {
    todos: Arc<RwLock<HashMap<Uuid, Todo>>>,
}

impl InMemoryTodoRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TodoRepository for InMemoryTodoRepository {
    async fn insert(&self, todo: &Todo) -> TodoResult<()> {
        let mut todos = self.todos.write().await;
        if todos.values().any(|t| t.order == todo.order) {
            return Err(TodoError::OrderTaken(todo.order));
        }
        todos.insert(todo.id, todo.clone());
        Ok(())
    }

    async fn replace(&self, todo: &Todo) -> TodoResult<()> {
        let mut todos = self.todos.write().await;
        if todos
            .values()
            .any(|t| t.order == todo.order && t.id != todo.id)
        {
            return Err(TodoError::OrderTaken(todo.order));
        }
        todos.insert(todo.id, todo.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> TodoResult<Option<Todo>> {
        Ok(self.todos.read().await.get(&id).cloned())
    }

    async fn find_all_ordered(&self) -> TodoResult<Vec<Todo>> {
        let mut todos: Vec<Todo> = self.todos.read().await.values().cloned().collect();
        todos.sort_by_key(|t| t.order);
        Ok(todos)
    }

    async fn exists(&self, id: Uuid) -> TodoResult<bool> {
        Ok(self.todos.read().await.contains_key(&id))
    }

    async fn delete_by_id(&self, id: Uuid) -> TodoResult<bool> {
        Ok(self.todos.write().await.remove(&id).is_some())
    }

    async fn delete_all(&self) -> TodoResult<u64> {
        let mut todos = self.todos.write().await;
        let deleted = todos.len() as u64;
        todos.clear();
        Ok(deleted)
    }

    async fn delete_completed(&self) -> TodoResult<u64> {
        let mut todos = self.todos.write().await;
        let before = todos.len();
        todos.retain(|_, t| !t.completed);
        Ok((before - todos.len()) as u64)
    }

    async fn max_order(&self) -> TodoResult<Option<i32>> {
        Ok(self.todos.read().await.values().map(|t| t.order).max())
    }

    async fn find_by_order_excluding(
        &self,
        order: i32,
        excluded: Uuid,
    ) -> TodoResult<Option<Todo>> {
        Ok(self
            .todos
            .read()
            .await
            .values()
            .find(|t| t.order == order && t.id != excluded)
            .cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn todo(title: &str, order: i32) -> Todo {
        Todo {
            id: Uuid::now_v7(),
            title: title.to_string(),
            completed: false,
            order,
        }
    }

    #[tokio::test]
    async fn test_insert_rejects_duplicate_order() {
        let repository = InMemoryTodoRepository::new();

        repository.insert(&todo("original", 1)).await.unwrap();
        let err = repository.insert(&todo("imitator", 1)).await.unwrap_err();

        assert!(matches!(err, TodoError::OrderTaken(1)));
    }

    #[tokio::test]
    async fn test_replace_ignores_own_order() {
        let repository = InMemoryTodoRepository::new();

        let mut kept = todo("kept", 1);
        repository.insert(&kept).await.unwrap();

        kept.title = "renamed".to_string();
        repository.replace(&kept).await.unwrap();

        let found = repository.find_by_id(kept.id).await.unwrap().unwrap();
        assert_eq!(found.title, "renamed");
    }

    #[tokio::test]
    async fn test_find_all_ordered_sorts_ascending() {
        let repository = InMemoryTodoRepository::new();

        repository.insert(&todo("third", 3)).await.unwrap();
        repository.insert(&todo("first", 1)).await.unwrap();
        repository.insert(&todo("second", 2)).await.unwrap();

        let todos = repository.find_all_ordered().await.unwrap();
        let orders: Vec<i32> = todos.iter().map(|t| t.order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
    }
}
