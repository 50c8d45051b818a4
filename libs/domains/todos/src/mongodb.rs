//! MongoDB implementation of TodoRepository

use async_trait::async_trait;
use futures_util::TryStreamExt;
use mongodb::bson::{Bson, doc, to_bson};
use mongodb::error::{ErrorKind, WriteFailure};
use mongodb::options::{FindOneOptions, FindOptions, IndexOptions};
use mongodb::{Collection, Database, IndexModel};
use tracing::instrument;
use uuid::Uuid;

use crate::error::{TodoError, TodoResult};
use crate::models::Todo;
use crate::repository::TodoRepository;

/// Server-side error code for a unique index violation.
const DUPLICATE_KEY_CODE: i32 = 11000;

/// MongoDB-backed todo repository
pub struct MongoTodoRepository {
    collection: Collection<Todo>,
}

impl MongoTodoRepository {
    /// Create a new repository over the default `todos` collection
    pub fn new(db: &Database) -> Self {
        Self::with_collection(db, "todos")
    }

    /// Create a new repository over a named collection
    pub fn with_collection(db: &Database, name: &str) -> Self {
        Self {
            collection: db.collection::<Todo>(name),
        }
    }

    /// Create the indexes backing the order-uniqueness guarantee
    ///
    /// Call once at startup. The unique index makes concurrent inserts of
    /// the same order fail server-side instead of racing.
    pub async fn init_indexes(&self) -> TodoResult<()> {
        let indexes = vec![
            IndexModel::builder()
                .keys(doc! { "order": 1 })
                .options(
                    IndexOptions::builder()
                        .unique(true)
                        .name("idx_order_unique".to_string())
                        .build(),
                )
                .build(),
        ];

        self.collection.create_indexes(indexes).await?;
        tracing::info!("Todo indexes created successfully");
        Ok(())
    }

    /// Access to the underlying collection, mainly for tests
    pub fn collection(&self) -> &Collection<Todo> {
        &self.collection
    }

    fn is_duplicate_key(err: &mongodb::error::Error) -> bool {
        matches!(
            *err.kind,
            ErrorKind::Write(WriteFailure::WriteError(ref e)) if e.code == DUPLICATE_KEY_CODE
        )
    }

    fn write_error(err: mongodb::error::Error, order: i32) -> TodoError {
        if Self::is_duplicate_key(&err) {
            TodoError::OrderTaken(order)
        } else {
            TodoError::Database(err.to_string())
        }
    }

    fn id_filter(id: &Uuid) -> mongodb::bson::Document {
        doc! { "_id": to_bson(id).unwrap_or(Bson::Null) }
    }
}

#[async_trait]
impl TodoRepository for MongoTodoRepository {
    #[instrument(skip(self, todo), fields(todo_id = %todo.id))]
    async fn insert(&self, todo: &Todo) -> TodoResult<()> {
        self.collection
            .insert_one(todo)
            .await
            .map_err(|e| Self::write_error(e, todo.order))?;

        tracing::info!(order = todo.order, "Todo inserted");
        Ok(())
    }

    #[instrument(skip(self, todo), fields(todo_id = %todo.id))]
    async fn replace(&self, todo: &Todo) -> TodoResult<()> {
        self.collection
            .replace_one(Self::id_filter(&todo.id), todo)
            .await
            .map_err(|e| Self::write_error(e, todo.order))?;

        Ok(())
    }

    #[instrument(skip(self))]
    async fn find_by_id(&self, id: Uuid) -> TodoResult<Option<Todo>> {
        let todo = self.collection.find_one(Self::id_filter(&id)).await?;
        Ok(todo)
    }

    #[instrument(skip(self))]
    async fn find_all_ordered(&self) -> TodoResult<Vec<Todo>> {
        let options = FindOptions::builder().sort(doc! { "order": 1 }).build();
        let cursor = self.collection.find(doc! {}).with_options(options).await?;
        let todos = cursor.try_collect().await?;
        Ok(todos)
    }

    #[instrument(skip(self))]
    async fn exists(&self, id: Uuid) -> TodoResult<bool> {
        let count = self
            .collection
            .count_documents(Self::id_filter(&id))
            .await?;
        Ok(count > 0)
    }

    #[instrument(skip(self))]
    async fn delete_by_id(&self, id: Uuid) -> TodoResult<bool> {
        let result = self.collection.delete_one(Self::id_filter(&id)).await?;
        Ok(result.deleted_count > 0)
    }

    #[instrument(skip(self))]
    async fn delete_all(&self) -> TodoResult<u64> {
        let result = self.collection.delete_many(doc! {}).await?;
        Ok(result.deleted_count)
    }

    #[instrument(skip(self))]
    async fn delete_completed(&self) -> TodoResult<u64> {
        let result = self
            .collection
            .delete_many(doc! { "completed": true })
            .await?;
        Ok(result.deleted_count)
    }

    #[instrument(skip(self))]
    async fn max_order(&self) -> TodoResult<Option<i32>> {
        let options = FindOneOptions::builder()
            .sort(doc! { "order": -1 })
            .build();
        let todo = self.collection.find_one(doc! {}).with_options(options).await?;
        Ok(todo.map(|t| t.order))
    }

    #[instrument(skip(self))]
    async fn find_by_order_excluding(
        &self,
        order: i32,
        excluded: Uuid,
    ) -> TodoResult<Option<Todo>> {
        let filter = doc! {
            "order": order,
            "_id": { "$ne": to_bson(&excluded).unwrap_or(Bson::Null) },
        };
        let todo = self.collection.find_one(filter).await?;
        Ok(todo)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_repository(collection: &str) -> MongoTodoRepository {
        let url = std::env::var("MONGODB_URL")
            .unwrap_or_else(|_| "mongodb://localhost:27017".to_string());
        let client = mongodb::Client::with_uri_str(&url)
            .await
            .expect("Failed to connect to MongoDB");
        let db = client.database("todos_test");

        let repository = MongoTodoRepository::with_collection(&db, collection);
        repository.collection().drop().await.ok();
        repository
            .init_indexes()
            .await
            .expect("Failed to create indexes");
        repository
    }

    fn todo(title: &str, order: i32) -> Todo {
        Todo {
            id: Uuid::now_v7(),
            title: title.to_string(),
            completed: false,
            order,
        }
    }

    #[tokio::test]
    #[ignore] // Requires actual MongoDB
    async fn test_insert_and_find_sorted() {
        let repository = test_repository("todos_sorted").await;

        repository.insert(&todo("third", 3)).await.unwrap();
        repository.insert(&todo("first", 1)).await.unwrap();
        repository.insert(&todo("second", 2)).await.unwrap();

        let todos = repository.find_all_ordered().await.unwrap();
        let orders: Vec<i32> = todos.iter().map(|t| t.order).collect();
        assert_eq!(orders, vec![1, 2, 3]);
    }

    #[tokio::test]
    #[ignore] // Requires actual MongoDB
    async fn test_duplicate_order_is_rejected_by_index() {
        let repository = test_repository("todos_duplicate").await;

        repository.insert(&todo("original", 5)).await.unwrap();
        let err = repository.insert(&todo("imitator", 5)).await.unwrap_err();

        assert!(matches!(err, TodoError::OrderTaken(5)));
    }

    #[tokio::test]
    #[ignore] // Requires actual MongoDB
    async fn test_max_order_and_exclusion_filter() {
        let repository = test_repository("todos_max_order").await;

        assert_eq!(repository.max_order().await.unwrap(), None);

        let kept = todo("kept", 4);
        repository.insert(&kept).await.unwrap();
        repository.insert(&todo("other", 9)).await.unwrap();

        assert_eq!(repository.max_order().await.unwrap(), Some(9));
        // A todo never conflicts with its own order
        assert!(
            repository
                .find_by_order_excluding(4, kept.id)
                .await
                .unwrap()
                .is_none()
        );
        assert!(
            repository
                .find_by_order_excluding(9, kept.id)
                .await
                .unwrap()
                .is_some()
        );
    }
}
