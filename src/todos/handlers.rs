// HTTP handlers for todo endpoints

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    http::StatusCode,
    Json,
};

use crate::auth::middleware::AuthenticatedUser;
use crate::error::ApiError;
use crate::todos::models::{CreateTodoRequest, Todo};
use crate::AppState;

/// List the caller's todos
/// GET /todos
#[utoipa::path(
    get,
    path = "/todos",
    responses(
        (status = 200, description = "Todos owned by the caller, oldest first", body = Vec<Todo>),
        (status = 401, description = "Missing bearer token", body = crate::error::ErrorResponse),
        (status = 403, description = "Invalid or expired token", body = crate::error::ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "todos"
)]
pub async fn list_todos_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
) -> Result<Json<Vec<Todo>>, ApiError> {
    let todos = state.todo_service.list(user.user_id).await?;
    tracing::debug!("Retrieved {} todos for user_id={}", todos.len(), user.user_id);
    Ok(Json(todos))
}

/// Create a todo
/// POST /todos
#[utoipa::path(
    post,
    path = "/todos",
    request_body = CreateTodoRequest,
    responses(
        (status = 201, description = "Todo created", body = Todo),
        (status = 400, description = "Invalid or malformed name", body = crate::error::ErrorResponse),
        (status = 401, description = "Missing bearer token", body = crate::error::ErrorResponse),
        (status = 403, description = "Invalid or expired token", body = crate::error::ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "todos"
)]
pub async fn create_todo_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    body: Result<Json<CreateTodoRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<Todo>), ApiError> {
    let Json(request) = body?;
    let todo = state.todo_service.create(user.user_id, request).await?;
    Ok((StatusCode::CREATED, Json(todo)))
}

/// Mark a todo as done
/// PUT /todos/{id}/done
#[utoipa::path(
    put,
    path = "/todos/{id}/done",
    params(("id" = i32, Path, description = "Todo ID")),
    responses(
        (status = 200, description = "Todo with completion date set", body = Todo),
        (status = 400, description = "Non-numeric id", body = crate::error::ErrorResponse),
        (status = 404, description = "No such todo owned by the caller", body = crate::error::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::error::ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "todos"
)]
pub async fn mark_done_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<Todo>, ApiError> {
    let Path(id) = id?;
    let todo = state.todo_service.mark_done(id, user.user_id).await?;
    Ok(Json(todo))
}

/// Mark a todo as not done
/// DELETE /todos/{id}/done
#[utoipa::path(
    delete,
    path = "/todos/{id}/done",
    params(("id" = i32, Path, description = "Todo ID")),
    responses(
        (status = 200, description = "Todo with completion date cleared", body = Todo),
        (status = 400, description = "Non-numeric id", body = crate::error::ErrorResponse),
        (status = 404, description = "No such todo owned by the caller", body = crate::error::ErrorResponse),
        (status = 500, description = "Internal server error", body = crate::error::ErrorResponse)
    ),
    security(("bearer" = [])),
    tag = "todos"
)]
pub async fn mark_undone_handler(
    State(state): State<AppState>,
    user: AuthenticatedUser,
    id: Result<Path<i32>, PathRejection>,
) -> Result<Json<Todo>, ApiError> {
    let Path(id) = id?;
    let todo = state.todo_service.mark_undone(id, user.user_id).await?;
    Ok(Json(todo))
}
