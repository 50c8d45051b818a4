//! OpenAPI documentation configuration

use utoipa::OpenApi;

/// Combined OpenAPI documentation for all APIs
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Todos API",
        version = "0.1.0",
        description = "MongoDB-based REST API for managing todos",
        license(name = "MIT")
    ),
    servers(
        (url = "http://localhost:8080", description = "Local development server")
    ),
    nest(
        (path = "/todos", api = domain_todos::ApiDoc)
    ),
    tags(
        (name = "Todos", description = "Todo management endpoints (MongoDB)")
    )
)]
pub struct ApiDoc;
