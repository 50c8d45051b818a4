use axum::{
    Json, Router,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use axum_helpers::{
    BaseUrl, UuidPath, ValidatedJson,
    errors::responses::{
        BadRequestUuidResponse, BadRequestValidationResponse, ConflictResponse,
        InternalServerErrorResponse, NotFoundResponse,
    },
};
use std::sync::Arc;
use utoipa::OpenApi;

use crate::error::TodoResult;
use crate::models::{CreateTodo, DeleteFilter, PatchTodo, ReplaceTodo, TodoResponse};
use crate::repository::TodoRepository;
use crate::service::TodoService;

/// OpenAPI documentation for Todos API
#[derive(OpenApi)]
#[openapi(
    paths(
        list_todos,
        create_todo,
        delete_todos,
        get_todo,
        replace_todo,
        patch_todo,
        delete_todo,
    ),
    components(
        schemas(TodoResponse, CreateTodo, ReplaceTodo, PatchTodo, DeleteFilter),
        responses(
            NotFoundResponse,
            BadRequestValidationResponse,
            BadRequestUuidResponse,
            ConflictResponse,
            InternalServerErrorResponse
        )
    ),
    tags(
        (name = "Todos", description = "Todo management endpoints (MongoDB)")
    )
)]
pub struct ApiDoc;

/// Create the todos router with all HTTP endpoints
pub fn router<R: TodoRepository + 'static>(service: TodoService<R>) -> Router {
    let shared_service = Arc::new(service);

    Router::new()
        .route(
            "/",
            get(list_todos).post(create_todo).delete(delete_todos),
        )
        .route(
            "/{id}",
            get(get_todo)
                .put(replace_todo)
                .patch(patch_todo)
                .delete(delete_todo),
        )
        .with_state(shared_service)
}

/// List all todos sorted by order
#[utoipa::path(
    get,
    path = "",
    tag = "Todos",
    responses(
        (status = 200, description = "List of todos in ascending order", body = Vec<TodoResponse>),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn list_todos<R: TodoRepository>(
    State(service): State<Arc<TodoService<R>>>,
    BaseUrl(base_url): BaseUrl,
) -> TodoResult<Json<Vec<TodoResponse>>> {
    let todos = service.list_todos().await?;
    let todos = todos
        .into_iter()
        .map(|todo| TodoResponse::from_todo(todo, &base_url))
        .collect();
    Ok(Json(todos))
}

/// Create a new todo
#[utoipa::path(
    post,
    path = "",
    tag = "Todos",
    request_body = CreateTodo,
    responses(
        (status = 201, description = "Todo created successfully", body = TodoResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn create_todo<R: TodoRepository>(
    State(service): State<Arc<TodoService<R>>>,
    BaseUrl(base_url): BaseUrl,
    ValidatedJson(input): ValidatedJson<CreateTodo>,
) -> TodoResult<impl IntoResponse> {
    let todo = service.create_todo(input).await?;
    Ok((
        StatusCode::CREATED,
        Json(TodoResponse::from_todo(todo, &base_url)),
    ))
}

/// Bulk-delete todos, optionally only completed ones
#[utoipa::path(
    delete,
    path = "",
    tag = "Todos",
    params(DeleteFilter),
    responses(
        (status = 204, description = "Todos deleted successfully"),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_todos<R: TodoRepository>(
    State(service): State<Arc<TodoService<R>>>,
    Query(filter): Query<DeleteFilter>,
) -> TodoResult<impl IntoResponse> {
    service.delete_todos(filter).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Get a todo by ID
#[utoipa::path(
    get,
    path = "/{id}",
    tag = "Todos",
    params(
        ("id" = Uuid, Path, description = "Todo ID")
    ),
    responses(
        (status = 200, description = "Todo found", body = TodoResponse),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn get_todo<R: TodoRepository>(
    State(service): State<Arc<TodoService<R>>>,
    BaseUrl(base_url): BaseUrl,
    UuidPath(id): UuidPath,
) -> TodoResult<Json<TodoResponse>> {
    let todo = service.get_todo(id).await?;
    Ok(Json(TodoResponse::from_todo(todo, &base_url)))
}

/// Replace a todo wholesale
#[utoipa::path(
    put,
    path = "/{id}",
    tag = "Todos",
    params(
        ("id" = Uuid, Path, description = "Todo ID")
    ),
    request_body = ReplaceTodo,
    responses(
        (status = 200, description = "Todo replaced successfully", body = TodoResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn replace_todo<R: TodoRepository>(
    State(service): State<Arc<TodoService<R>>>,
    BaseUrl(base_url): BaseUrl,
    UuidPath(id): UuidPath,
    ValidatedJson(input): ValidatedJson<ReplaceTodo>,
) -> TodoResult<Json<TodoResponse>> {
    let todo = service.replace_todo(id, input).await?;
    Ok(Json(TodoResponse::from_todo(todo, &base_url)))
}

/// Partially update a todo
#[utoipa::path(
    patch,
    path = "/{id}",
    tag = "Todos",
    params(
        ("id" = Uuid, Path, description = "Todo ID")
    ),
    request_body = PatchTodo,
    responses(
        (status = 200, description = "Todo updated successfully", body = TodoResponse),
        (status = 400, response = BadRequestValidationResponse),
        (status = 404, response = NotFoundResponse),
        (status = 409, response = ConflictResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn patch_todo<R: TodoRepository>(
    State(service): State<Arc<TodoService<R>>>,
    BaseUrl(base_url): BaseUrl,
    UuidPath(id): UuidPath,
    ValidatedJson(patch): ValidatedJson<PatchTodo>,
) -> TodoResult<Json<TodoResponse>> {
    let todo = service.patch_todo(id, patch).await?;
    Ok(Json(TodoResponse::from_todo(todo, &base_url)))
}

/// Delete a todo
#[utoipa::path(
    delete,
    path = "/{id}",
    tag = "Todos",
    params(
        ("id" = Uuid, Path, description = "Todo ID")
    ),
    responses(
        (status = 204, description = "Todo deleted successfully"),
        (status = 400, response = BadRequestUuidResponse),
        (status = 404, response = NotFoundResponse),
        (status = 500, response = InternalServerErrorResponse)
    )
)]
async fn delete_todo<R: TodoRepository>(
    State(service): State<Arc<TodoService<R>>>,
    UuidPath(id): UuidPath,
) -> TodoResult<impl IntoResponse> {
    service.delete_todo(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
