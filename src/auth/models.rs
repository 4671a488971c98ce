// Authentication data models and DTOs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// User database model
///
/// Not `Serialize`: the hash never leaves the server.
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

/// Registration request DTO
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 255, message = "Username must be between 1 and 255 characters"))]
    #[serde(default)]
    #[schema(example = "alice")]
    pub username: String,
    #[validate(length(min = 1, message = "Password must not be empty"))]
    #[serde(default)]
    #[schema(example = "pw1")]
    pub password: String,
}

/// Login request DTO
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct LoginRequest {
    #[serde(default)]
    #[schema(example = "alice")]
    pub username: String,
    #[serde(default)]
    #[schema(example = "pw1")]
    pub password: String,
}

/// Successful login response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TokenResponse {
    #[schema(example = "eyJhbGciOiJIUzI1NiJ9...")]
    pub token: String,
}

/// Plain message response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct MessageResponse {
    #[schema(example = "User created")]
    pub message: String,
}
