use tower_http::cors::CorsLayer;

/// Creates a permissive CORS layer.
///
/// Allows any origin, method, and header. Suitable for public APIs that are
/// consumed by arbitrary browser clients.
pub fn create_permissive_cors_layer() -> CorsLayer {
    CorsLayer::permissive()
}
