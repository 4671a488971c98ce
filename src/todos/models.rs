use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Longest allowed todo name, in characters
pub const MAX_NAME_LEN: u64 = 255;

/// A todo item as stored
///
/// `done_date` is set exactly when the item is done.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Todo {
    #[schema(example = 1)]
    pub id: i32,
    #[schema(example = 1)]
    pub user_id: i32,
    #[schema(example = "buy milk")]
    pub name: String,
    pub done_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for creating a todo
///
/// A missing `name` deserializes as empty and fails validation.
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct CreateTodoRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 255, message = "Name must be between 1 and 255 characters"))]
    #[schema(example = "buy milk")]
    pub name: String,
}

/// Values for a new row; the store assigns id and timestamps
#[derive(Debug, Clone)]
pub struct NewTodo {
    pub user_id: i32,
    pub name: String,
}

/// Row selector. Ownership is part of every lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TodoCriteria {
    pub id: i32,
    pub user_id: i32,
}

/// Change applied by `update`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TodoPatch {
    pub done_date: Option<DateTime<Utc>>,
}

impl TodoPatch {
    pub fn mark_done(at: DateTime<Utc>) -> Self {
        Self { done_date: Some(at) }
    }

    pub fn mark_undone() -> Self {
        Self { done_date: None }
    }
}
