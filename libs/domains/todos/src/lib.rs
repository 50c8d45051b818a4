//! Todos Domain
//!
//! This module provides a complete domain implementation for managing todos using MongoDB.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐
//! │  Handlers   │  ← HTTP endpoints
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Service   │  ← Business logic, order generation, conflict checks
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │ Repository  │  ← Data access (trait + MongoDB and in-memory implementations)
//! └──────┬──────┘
//!        │
//! ┌──────▼──────┐
//! │   Models    │  ← Entities, DTOs
//! └─────────────┘
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_todos::{
//!     handlers,
//!     mongodb::MongoTodoRepository,
//!     service::TodoService,
//! };
//! use mongodb::Client;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! // Create a MongoDB client
//! let client = Client::with_uri_str("mongodb://localhost:27017").await?;
//! let db = client.database("mydb");
//!
//! // Create a repository and service
//! let repository = MongoTodoRepository::new(&db);
//! repository.init_indexes().await?;
//! let service = TodoService::new(repository);
//!
//! // Create Axum router
//! let router = handlers::router(service);
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod handlers;
pub mod memory;
pub mod models;
pub mod mongodb;
pub mod repository;
pub mod service;

// Re-export commonly used types
pub use error::{TodoError, TodoResult};
pub use handlers::ApiDoc;
pub use memory::InMemoryTodoRepository;
pub use models::{CreateTodo, DeleteFilter, PatchTodo, ReplaceTodo, Todo, TodoResponse};
pub use mongodb::MongoTodoRepository;
pub use repository::TodoRepository;
pub use service::TodoService;
