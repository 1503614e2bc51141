use std::sync::Arc;

use axum::{
    async_trait,
    extract::{FromRequestParts, State},
    http::{self, request::Parts, Request},
    middleware::Next,
    response::Response,
};

use crate::{error::AppError, model::CurrentUser, AppState};

// Rejects the request unless it carries `Authorization: Bearer <valid token>`,
// then hands the caller's identity to the handlers through the extensions.
pub async fn mw_require_auth<B>(
    State(data): State<Arc<AppState>>,
    mut request: Request<B>,
    next: Next<B>,
) -> Result<Response, AppError> {
    let auth_header = request
        .headers()
        .get(http::header::AUTHORIZATION)
        .and_then(|header| header.to_str().ok())
        .ok_or_else(|| AppError::Auth("missing authorization header".to_string()))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| AppError::Auth("malformed authorization header".to_string()))?;

    let user_id = data.tokens.verify(token).map_err(|e| {
        tracing::warn!("token verification failed: {}", e);
        AppError::Auth("invalid or expired token".to_string())
    })?;

    request.extensions_mut().insert(CurrentUser { id: user_id });

    Ok(next.run(request).await)
}

#[async_trait]
impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<CurrentUser>()
            .copied()
            .ok_or_else(|| AppError::Auth("not authenticated".to_string()))
    }
}
