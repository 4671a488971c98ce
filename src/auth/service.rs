// Authentication service - business logic layer

use std::sync::Arc;
use tracing::{debug, info};

use crate::auth::{
    models::User, password::PasswordService, repository::UserRepository, token::TokenService,
};
use crate::db::StoreError;
use crate::error::ApiError;

/// Authentication service coordinating registration and login
pub struct AuthService {
    user_repo: Arc<dyn UserRepository>,
    password_service: PasswordService,
    token_service: Arc<TokenService>,
}

impl AuthService {
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        password_service: PasswordService,
        token_service: Arc<TokenService>,
    ) -> Self {
        Self {
            user_repo,
            password_service,
            token_service,
        }
    }

    /// Register a new user
    ///
    /// No token is issued; the caller logs in separately.
    pub async fn register(&self, username: &str, password: &str) -> Result<User, ApiError> {
        let password_hash = self
            .password_service
            .hash_password_async(password.to_string())
            .await?;

        match self.user_repo.create_user(username, &password_hash).await {
            Ok(user) => {
                info!("Registered user id={}", user.id);
                Ok(user)
            }
            Err(StoreError::UniqueViolation) => Err(ApiError::Conflict {
                message: "Username is already taken".to_string(),
            }),
            Err(e) => Err(e.into()),
        }
    }

    /// Check credentials and issue a bearer token
    ///
    /// An unknown username and a wrong password produce the same error, and
    /// both run one hash verification.
    pub async fn login(&self, username: &str, password: &str) -> Result<String, ApiError> {
        let user = self.user_repo.find_by_username(username).await?;

        let (user_id, stored_hash) = match user {
            Some(user) => (Some(user.id), Some(user.password_hash)),
            None => (None, None),
        };

        let matched = self
            .password_service
            .verify_password_async(password.to_string(), stored_hash)
            .await;

        match (user_id, matched) {
            (Some(user_id), true) => {
                let token = self.token_service.issue(user_id)?;
                info!("User id={} logged in", user_id);
                Ok(token)
            }
            _ => {
                debug!("Invalid credentials for login attempt");
                Err(ApiError::InvalidCredentials)
            }
        }
    }
}
