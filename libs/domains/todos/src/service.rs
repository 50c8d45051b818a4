//! Todo Service - Business logic layer

use std::sync::Arc;
use tracing::instrument;
use uuid::Uuid;
use validator::Validate;

use crate::error::{TodoError, TodoResult};
use crate::models::{CreateTodo, DeleteFilter, PatchTodo, ReplaceTodo, Todo};
use crate::repository::TodoRepository;

/// How many times a create with a generated order retries after losing a
/// race for that order.
const GENERATED_ORDER_ATTEMPTS: u32 = 3;

/// Todo service providing business logic operations
///
/// The service layer handles validation, order generation, and conflict
/// checks, and orchestrates repository operations.
pub struct TodoService<R: TodoRepository> {
    repository: Arc<R>,
}

impl<R: TodoRepository> TodoService<R> {
    /// Create a new TodoService with the given repository
    pub fn new(repository: R) -> Self {
        Self {
            repository: Arc::new(repository),
        }
    }

    /// Create a new todo
    ///
    /// When the input carries an order, that order is used as-is and a
    /// collision is a conflict. When it does not, the next free order is
    /// generated (highest existing order plus one, or 1 for an empty store);
    /// losing a concurrent race for a generated order is retried a few times
    /// before giving up.
    #[instrument(skip(self, input), fields(todo_title = %input.title))]
    pub async fn create_todo(&self, input: CreateTodo) -> TodoResult<Todo> {
        input
            .validate()
            .map_err(|e| TodoError::Validation(e.to_string()))?;

        if input.title.trim().is_empty() {
            return Err(TodoError::Validation("title must not be blank".to_string()));
        }

        let id = Uuid::now_v7();

        if let Some(order) = input.order {
            if self
                .repository
                .find_by_order_excluding(order, id)
                .await?
                .is_some()
            {
                return Err(TodoError::OrderTaken(order));
            }

            let todo = Todo {
                id,
                title: input.title,
                completed: input.completed,
                order,
            };
            self.repository.insert(&todo).await?;
            tracing::info!(todo_id = %todo.id, order, "Todo created");
            return Ok(todo);
        }

        let mut attempts = 0;
        loop {
            let order = self.next_order().await?;
            let todo = Todo {
                id,
                title: input.title.clone(),
                completed: input.completed,
                order,
            };

            match self.repository.insert(&todo).await {
                Ok(()) => {
                    tracing::info!(todo_id = %todo.id, order, "Todo created");
                    return Ok(todo);
                }
                Err(TodoError::OrderTaken(_)) => {
                    attempts += 1;
                    if attempts >= GENERATED_ORDER_ATTEMPTS {
                        return Err(TodoError::OrderTaken(order));
                    }
                    tracing::debug!(order, attempts, "Generated order lost a race, retrying");
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// List all todos sorted by ascending order
    #[instrument(skip(self))]
    pub async fn list_todos(&self) -> TodoResult<Vec<Todo>> {
        self.repository.find_all_ordered().await
    }

    /// Get a todo by ID
    #[instrument(skip(self))]
    pub async fn get_todo(&self, id: Uuid) -> TodoResult<Todo> {
        self.repository
            .find_by_id(id)
            .await?
            .ok_or(TodoError::NotFound(id))
    }

    /// Replace a todo wholesale
    ///
    /// Every field is overwritten from the input. The ID never changes.
    #[instrument(skip(self, input))]
    pub async fn replace_todo(&self, id: Uuid, input: ReplaceTodo) -> TodoResult<Todo> {
        input
            .validate()
            .map_err(|e| TodoError::Validation(e.to_string()))?;

        let mut todo = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(TodoError::NotFound(id))?;

        if self
            .repository
            .find_by_order_excluding(input.order, id)
            .await?
            .is_some()
        {
            return Err(TodoError::OrderTaken(input.order));
        }

        todo.title = input.title;
        todo.completed = input.completed;
        todo.order = input.order;

        self.repository.replace(&todo).await?;
        tracing::info!(todo_id = %id, "Todo replaced");
        Ok(todo)
    }

    /// Partially update a todo
    ///
    /// Absent fields keep their stored values. An order collision is
    /// reported before any field-level validation failure.
    #[instrument(skip(self, patch))]
    pub async fn patch_todo(&self, id: Uuid, patch: PatchTodo) -> TodoResult<Todo> {
        let mut todo = self
            .repository
            .find_by_id(id)
            .await?
            .ok_or(TodoError::NotFound(id))?;

        if let Some(order) = patch.order {
            if self
                .repository
                .find_by_order_excluding(order, id)
                .await?
                .is_some()
            {
                return Err(TodoError::OrderTaken(order));
            }
        }

        if let Some(ref title) = patch.title {
            if title.trim().is_empty() {
                return Err(TodoError::Validation("title must not be blank".to_string()));
            }
        }

        if let Some(order) = patch.order {
            if order < 0 {
                return Err(TodoError::Validation(
                    "order must not be negative".to_string(),
                ));
            }
        }

        todo.apply_patch(patch);

        self.repository.replace(&todo).await?;
        tracing::info!(todo_id = %id, "Todo patched");
        Ok(todo)
    }

    /// Delete a todo by ID
    #[instrument(skip(self))]
    pub async fn delete_todo(&self, id: Uuid) -> TodoResult<()> {
        if !self.repository.exists(id).await? {
            return Err(TodoError::NotFound(id));
        }

        self.repository.delete_by_id(id).await?;
        tracing::info!(todo_id = %id, "Todo deleted");
        Ok(())
    }

    /// Bulk-delete todos
    ///
    /// With `completed=true` only completed todos are removed; otherwise the
    /// whole collection is cleared.
    #[instrument(skip(self))]
    pub async fn delete_todos(&self, filter: DeleteFilter) -> TodoResult<u64> {
        let deleted = if filter.completed.unwrap_or(false) {
            self.repository.delete_completed().await?
        } else {
            self.repository.delete_all().await?
        };

        tracing::info!(deleted, "Todos deleted");
        Ok(deleted)
    }

    async fn next_order(&self) -> TodoResult<i32> {
        let order = match self.repository.max_order().await? {
            Some(max) => max.saturating_add(1),
            None => 1,
        };
        Ok(order)
    }
}

impl<R: TodoRepository> Clone for TodoService<R> {
    fn clone(&self) -> Self {
        Self {
            repository: Arc::clone(&self.repository),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::MockTodoRepository;
    use mockall::Sequence;
    use mockall::predicate::eq;

    fn stored_todo(order: i32) -> Todo {
        Todo {
            id: Uuid::now_v7(),
            title: "buy milk".to_string(),
            completed: false,
            order,
        }
    }

    fn create_input(title: &str, order: Option<i32>) -> CreateTodo {
        CreateTodo {
            title: title.to_string(),
            completed: false,
            order,
        }
    }

    #[tokio::test]
    async fn test_create_generates_order_one_for_empty_store() {
        let mut mock_repo = MockTodoRepository::new();
        mock_repo.expect_max_order().returning(|| Ok(None));
        mock_repo
            .expect_insert()
            .withf(|todo: &Todo| todo.order == 1 && !todo.completed)
            .returning(|_| Ok(()));

        let service = TodoService::new(mock_repo);
        let todo = service
            .create_todo(create_input("walk the dog", None))
            .await
            .unwrap();

        assert_eq!(todo.order, 1);
        assert_eq!(todo.title, "walk the dog");
    }

    #[tokio::test]
    async fn test_create_generates_order_after_current_max() {
        let mut mock_repo = MockTodoRepository::new();
        mock_repo.expect_max_order().returning(|| Ok(Some(5)));
        mock_repo
            .expect_insert()
            .withf(|todo: &Todo| todo.order == 6)
            .returning(|_| Ok(()));

        let service = TodoService::new(mock_repo);
        let todo = service
            .create_todo(create_input("walk the dog", None))
            .await
            .unwrap();

        assert_eq!(todo.order, 6);
    }

    #[tokio::test]
    async fn test_create_keeps_explicit_free_order() {
        let mut mock_repo = MockTodoRepository::new();
        // max_order must not be consulted for explicit orders
        mock_repo
            .expect_find_by_order_excluding()
            .withf(|order: &i32, _: &Uuid| *order == 42)
            .returning(|_, _| Ok(None));
        mock_repo
            .expect_insert()
            .withf(|todo: &Todo| todo.order == 42)
            .returning(|_| Ok(()));

        let service = TodoService::new(mock_repo);
        let todo = service
            .create_todo(create_input("walk the dog", Some(42)))
            .await
            .unwrap();

        assert_eq!(todo.order, 42);
    }

    #[tokio::test]
    async fn test_create_rejects_taken_order() {
        let mut mock_repo = MockTodoRepository::new();
        mock_repo
            .expect_find_by_order_excluding()
            .returning(|_, _| Ok(Some(stored_todo(7))));

        let service = TodoService::new(mock_repo);
        let err = service
            .create_todo(create_input("walk the dog", Some(7)))
            .await
            .unwrap_err();

        assert!(matches!(err, TodoError::OrderTaken(7)));
    }

    #[tokio::test]
    async fn test_create_rejects_blank_title_without_touching_repo() {
        let mock_repo = MockTodoRepository::new();

        let service = TodoService::new(mock_repo);
        let err = service
            .create_todo(create_input("   ", None))
            .await
            .unwrap_err();

        assert!(matches!(err, TodoError::Validation(_)));
    }

    #[tokio::test]
    async fn test_create_retries_generated_order_after_losing_race() {
        let mut mock_repo = MockTodoRepository::new();
        let mut seq = Sequence::new();

        mock_repo
            .expect_max_order()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(Some(3)));
        mock_repo
            .expect_insert()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(TodoError::OrderTaken(4)));
        mock_repo
            .expect_max_order()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|| Ok(Some(4)));
        mock_repo
            .expect_insert()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(()));

        let service = TodoService::new(mock_repo);
        let todo = service
            .create_todo(create_input("walk the dog", None))
            .await
            .unwrap();

        assert_eq!(todo.order, 5);
    }

    #[tokio::test]
    async fn test_create_gives_up_after_repeated_order_races() {
        let mut mock_repo = MockTodoRepository::new();
        mock_repo
            .expect_max_order()
            .times(3)
            .returning(|| Ok(Some(1)));
        mock_repo
            .expect_insert()
            .times(3)
            .returning(|_| Err(TodoError::OrderTaken(2)));

        let service = TodoService::new(mock_repo);
        let err = service
            .create_todo(create_input("walk the dog", None))
            .await
            .unwrap_err();

        assert!(matches!(err, TodoError::OrderTaken(2)));
    }

    #[tokio::test]
    async fn test_get_todo_found() {
        let todo = stored_todo(1);
        let id = todo.id;
        let expected = todo.clone();

        let mut mock_repo = MockTodoRepository::new();
        mock_repo
            .expect_find_by_id()
            .with(eq(id))
            .returning(move |_| Ok(Some(todo.clone())));

        let service = TodoService::new(mock_repo);
        let found = service.get_todo(id).await.unwrap();

        assert_eq!(found, expected);
    }

    #[tokio::test]
    async fn test_get_todo_not_found() {
        let mut mock_repo = MockTodoRepository::new();
        mock_repo.expect_find_by_id().returning(|_| Ok(None));

        let service = TodoService::new(mock_repo);
        let err = service.get_todo(Uuid::now_v7()).await.unwrap_err();

        assert!(matches!(err, TodoError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_replace_missing_todo_returns_not_found() {
        let mut mock_repo = MockTodoRepository::new();
        mock_repo.expect_find_by_id().returning(|_| Ok(None));

        let service = TodoService::new(mock_repo);
        let input = ReplaceTodo {
            title: "rewritten".to_string(),
            completed: true,
            order: 9,
        };
        let err = service.replace_todo(Uuid::now_v7(), input).await.unwrap_err();

        assert!(matches!(err, TodoError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_replace_rejects_taken_order() {
        let todo = stored_todo(1);
        let id = todo.id;

        let mut mock_repo = MockTodoRepository::new();
        mock_repo
            .expect_find_by_id()
            .returning(move |_| Ok(Some(todo.clone())));
        mock_repo
            .expect_find_by_order_excluding()
            .withf(move |order: &i32, excluded: &Uuid| *order == 9 && *excluded == id)
            .returning(|_, _| Ok(Some(stored_todo(9))));

        let service = TodoService::new(mock_repo);
        let input = ReplaceTodo {
            title: "rewritten".to_string(),
            completed: true,
            order: 9,
        };
        let err = service.replace_todo(id, input).await.unwrap_err();

        assert!(matches!(err, TodoError::OrderTaken(9)));
    }

    #[tokio::test]
    async fn test_replace_overwrites_all_fields_and_keeps_id() {
        let todo = stored_todo(1);
        let id = todo.id;

        let mut mock_repo = MockTodoRepository::new();
        mock_repo
            .expect_find_by_id()
            .returning(move |_| Ok(Some(todo.clone())));
        mock_repo
            .expect_find_by_order_excluding()
            .returning(|_, _| Ok(None));
        mock_repo
            .expect_replace()
            .withf(move |todo: &Todo| {
                todo.id == id && todo.title == "rewritten" && todo.completed && todo.order == 9
            })
            .returning(|_| Ok(()));

        let service = TodoService::new(mock_repo);
        let input = ReplaceTodo {
            title: "rewritten".to_string(),
            completed: true,
            order: 9,
        };
        let replaced = service.replace_todo(id, input).await.unwrap();

        assert_eq!(replaced.id, id);
        assert_eq!(replaced.title, "rewritten");
        assert!(replaced.completed);
        assert_eq!(replaced.order, 9);
    }

    #[tokio::test]
    async fn test_patch_conflict_wins_over_blank_title() {
        let todo = stored_todo(1);
        let id = todo.id;

        let mut mock_repo = MockTodoRepository::new();
        mock_repo
            .expect_find_by_id()
            .returning(move |_| Ok(Some(todo.clone())));
        mock_repo
            .expect_find_by_order_excluding()
            .withf(|order: &i32, _: &Uuid| *order == 2)
            .returning(|_, _| Ok(Some(stored_todo(2))));

        let service = TodoService::new(mock_repo);
        let patch = PatchTodo {
            title: Some(String::new()),
            completed: None,
            order: Some(2),
        };
        let err = service.patch_todo(id, patch).await.unwrap_err();

        assert!(matches!(err, TodoError::OrderTaken(2)));
    }

    #[tokio::test]
    async fn test_patch_rejects_blank_title() {
        let todo = stored_todo(1);
        let id = todo.id;

        let mut mock_repo = MockTodoRepository::new();
        mock_repo
            .expect_find_by_id()
            .returning(move |_| Ok(Some(todo.clone())));

        let service = TodoService::new(mock_repo);
        let patch = PatchTodo {
            title: Some("   ".to_string()),
            completed: None,
            order: None,
        };
        let err = service.patch_todo(id, patch).await.unwrap_err();

        assert!(matches!(err, TodoError::Validation(_)));
    }

    #[tokio::test]
    async fn test_patch_rejects_negative_order() {
        let todo = stored_todo(1);
        let id = todo.id;

        let mut mock_repo = MockTodoRepository::new();
        mock_repo
            .expect_find_by_id()
            .returning(move |_| Ok(Some(todo.clone())));
        // The conflict check still runs first, finding nothing at -1
        mock_repo
            .expect_find_by_order_excluding()
            .withf(|order: &i32, _: &Uuid| *order == -1)
            .returning(|_, _| Ok(None));

        let service = TodoService::new(mock_repo);
        let patch = PatchTodo {
            title: None,
            completed: None,
            order: Some(-1),
        };
        let err = service.patch_todo(id, patch).await.unwrap_err();

        assert!(matches!(err, TodoError::Validation(_)));
    }

    #[tokio::test]
    async fn test_patch_merges_only_provided_fields() {
        let todo = stored_todo(2);
        let id = todo.id;

        let mut mock_repo = MockTodoRepository::new();
        mock_repo
            .expect_find_by_id()
            .returning(move |_| Ok(Some(todo.clone())));
        mock_repo
            .expect_replace()
            .withf(move |todo: &Todo| {
                todo.id == id && todo.title == "buy milk" && todo.completed && todo.order == 2
            })
            .returning(|_| Ok(()));

        let service = TodoService::new(mock_repo);
        let patch = PatchTodo {
            title: None,
            completed: Some(true),
            order: None,
        };
        let patched = service.patch_todo(id, patch).await.unwrap();

        assert_eq!(patched.title, "buy milk");
        assert!(patched.completed);
        assert_eq!(patched.order, 2);
    }

    #[tokio::test]
    async fn test_delete_missing_todo_returns_not_found() {
        let mut mock_repo = MockTodoRepository::new();
        mock_repo.expect_exists().returning(|_| Ok(false));

        let service = TodoService::new(mock_repo);
        let err = service.delete_todo(Uuid::now_v7()).await.unwrap_err();

        assert!(matches!(err, TodoError::NotFound(_)));
    }

    #[tokio::test]
    async fn test_delete_existing_todo() {
        let id = Uuid::now_v7();

        let mut mock_repo = MockTodoRepository::new();
        mock_repo.expect_exists().with(eq(id)).returning(|_| Ok(true));
        mock_repo
            .expect_delete_by_id()
            .with(eq(id))
            .returning(|_| Ok(true));

        let service = TodoService::new(mock_repo);
        service.delete_todo(id).await.unwrap();
    }

    #[tokio::test]
    async fn test_delete_todos_completed_only() {
        let mut mock_repo = MockTodoRepository::new();
        mock_repo.expect_delete_completed().returning(|| Ok(2));

        let service = TodoService::new(mock_repo);
        let deleted = service
            .delete_todos(DeleteFilter {
                completed: Some(true),
            })
            .await
            .unwrap();

        assert_eq!(deleted, 2);
    }

    #[tokio::test]
    async fn test_delete_todos_clears_all_without_filter() {
        let mut mock_repo = MockTodoRepository::new();
        mock_repo.expect_delete_all().returning(|| Ok(3));

        let service = TodoService::new(mock_repo);
        let deleted = service.delete_todos(DeleteFilter::default()).await.unwrap();

        assert_eq!(deleted, 3);
    }

    #[tokio::test]
    async fn test_delete_todos_completed_false_clears_all() {
        let mut mock_repo = MockTodoRepository::new();
        mock_repo.expect_delete_all().returning(|| Ok(1));

        let service = TodoService::new(mock_repo);
        let deleted = service
            .delete_todos(DeleteFilter {
                completed: Some(false),
            })
            .await
            .unwrap();

        assert_eq!(deleted, 1);
    }
}
