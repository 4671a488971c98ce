pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod todos;

use axum::{
    extract::FromRef,
    middleware,
    response::Json,
    routing::{get, post, put},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi, ToSchema,
};
use utoipa_swagger_ui::SwaggerUi;

use auth::{AuthService, PasswordService, TokenService, UserRepository};
use todos::{TodoRepository, TodoService};

/// OpenAPI documentation structure
#[derive(OpenApi)]
#[openapi(
    paths(
        auth::handlers::register_handler,
        auth::handlers::login_handler,
        todos::handlers::list_todos_handler,
        todos::handlers::create_todo_handler,
        todos::handlers::mark_done_handler,
        todos::handlers::mark_undone_handler,
        health_handler,
    ),
    components(
        schemas(
            auth::RegisterRequest,
            auth::LoginRequest,
            auth::TokenResponse,
            auth::MessageResponse,
            todos::Todo,
            todos::CreateTodoRequest,
            error::ErrorResponse,
            error::FieldError,
            HealthResponse,
        )
    ),
    modifiers(&BearerSecurity),
    tags(
        (name = "auth", description = "Registration and login"),
        (name = "todos", description = "Per-user todo items"),
        (name = "health", description = "Liveness")
    ),
    info(
        title = "Todo API",
        version = "0.1.0",
        description = "Multi-user todo list with bearer token authentication"
    )
)]
pub struct ApiDoc;

struct BearerSecurity;

impl Modify for BearerSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub auth_service: Arc<AuthService>,
    pub todo_service: Arc<TodoService>,
    pub tokens: Arc<TokenService>,
}

impl AppState {
    /// Wire services over the given stores
    pub fn new(
        users: Arc<dyn UserRepository>,
        todos: Arc<dyn TodoRepository>,
        passwords: PasswordService,
        tokens: Arc<TokenService>,
    ) -> Self {
        Self {
            auth_service: Arc::new(AuthService::new(users, passwords, tokens.clone())),
            todo_service: Arc::new(TodoService::new(todos)),
            tokens,
        }
    }
}

impl FromRef<AppState> for Arc<TokenService> {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    #[schema(example = "ok")]
    pub status: String,
}

/// Liveness probe
/// GET /health
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = HealthResponse)),
    tag = "health"
)]
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// API routes without documentation or cross-cutting layers
pub fn api_router(state: AppState) -> Router {
    let protected = Router::new()
        .route(
            "/todos",
            get(todos::list_todos_handler).post(todos::create_todo_handler),
        )
        .route(
            "/todos/:id/done",
            put(todos::mark_done_handler).delete(todos::mark_undone_handler),
        )
        .route_layer(middleware::from_fn_with_state(
            state.tokens.clone(),
            auth::require_auth,
        ));

    Router::new()
        .route("/auth/register", post(auth::register_handler))
        .route("/auth/login", post(auth::login_handler))
        .route("/health", get(health_handler))
        .merge(protected)
        .with_state(state)
}

/// Creates and configures the application router
/// Adds Swagger UI and CORS around the API routes
pub fn create_router(state: AppState) -> Router {
    // Configure CORS to allow all origins, methods, and headers
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(api_router(state))
        .layer(cors)
}
