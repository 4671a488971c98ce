// Authentication middleware for protected routes

use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts, Request, State},
    http::{header, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::debug;

use crate::auth::token::TokenService;
use crate::error::ApiError;

/// Identity of the caller, present only after the token checked out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub user_id: i32,
}

/// Pull the token out of `Authorization: Bearer <token>`
///
/// Anything else (no header, other scheme, empty token) counts as no token.
pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.trim().split_once(' ')?;
    if !scheme.eq_ignore_ascii_case("bearer") {
        return None;
    }
    let token = token.trim();
    if token.is_empty() {
        None
    } else {
        Some(token)
    }
}

/// Run the gate on a set of request headers
pub fn authenticate(
    headers: &HeaderMap,
    tokens: &TokenService,
) -> Result<AuthenticatedUser, ApiError> {
    let token = bearer_token(headers).ok_or(ApiError::Unauthenticated)?;
    let user_id = tokens.verify(token)?;
    Ok(AuthenticatedUser { user_id })
}

/// Route layer guarding every protected route
///
/// On rejection the inner service never runs, so neither body extractors nor
/// handler bodies execute.
pub async fn require_auth(
    State(tokens): State<Arc<TokenService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let endpoint = request.uri().path().to_string();

    let user = authenticate(request.headers(), &tokens).map_err(|e| {
        debug!("Rejected request to protected endpoint {}: {}", endpoint, e);
        e
    })?;

    debug!("Authenticated user_id={} for {}", user.user_id, endpoint);
    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthenticatedUser
where
    Arc<TokenService>: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        if let Some(user) = parts.extensions.get::<AuthenticatedUser>() {
            return Ok(*user);
        }

        let tokens = Arc::<TokenService>::from_ref(state);
        authenticate(&parts.headers, &tokens)
    }
}
