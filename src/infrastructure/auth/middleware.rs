use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::infrastructure::config::Config;
use crate::{
    domain::auth::JwtManager, error::AppError, infrastructure::repositories::UserRepository,
};
use uuid::Uuid;

/// User context injected into request extensions after authentication
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
}

/// Identity-resolution result on routes that admit guests. Absent
/// credential means guest; a present credential is still fully verified.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

/// Authentication middleware for routes that require an identity
pub async fn auth_middleware(
    State((user_repo, config)): State<(Arc<UserRepository>, Arc<Config>)>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_user = resolve_identity(&user_repo, &config, request.headers())
        .await?
        .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

    request.extensions_mut().insert(auth_user);

    Ok(next.run(request).await)
}

/// Authentication middleware for routes that also serve guests. Identity
/// resolution happens here, strictly before the usage gate; downstream
/// handlers read the result and never attempt their own authentication.
pub async fn optional_auth_middleware(
    State((user_repo, config)): State<(Arc<UserRepository>, Arc<Config>)>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let identity = resolve_identity(&user_repo, &config, request.headers()).await?;

    request.extensions_mut().insert(MaybeAuthUser(identity));

    Ok(next.run(request).await)
}

/// Resolve a Bearer credential to a verified user.
///
/// Returns Ok(None) when no Authorization header is present; a header that
/// is present but malformed, invalid, or expired is an error on both the
/// required and the guest-admitting track.
async fn resolve_identity(
    user_repo: &UserRepository,
    config: &Config,
    headers: &HeaderMap,
) -> Result<Option<AuthUser>, AppError> {
    let Some(auth_header) = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
    else {
        return Ok(None);
    };

    // Check Bearer token format
    if !auth_header.starts_with("Bearer ") {
        return Err(AppError::Unauthorized(
            "Invalid authorization format".to_string(),
        ));
    }

    let token = &auth_header[7..]; // Skip "Bearer "

    // Validate JWT token
    let jwt_manager = JwtManager::new(config.jwt_secret.clone());

    let claims = jwt_manager.validate_token(token)?;
    let user_id = Uuid::parse_str(&claims.sub)
        .map_err(|_| AppError::Unauthorized("Invalid user ID in token".to_string()))?;

    // Verify user still exists in database
    let user = user_repo
        .find_by_id(user_id)
        .await?
        .ok_or_else(|| AppError::Unauthorized("User not found".to_string()))?;

    Ok(Some(AuthUser {
        user_id: user.id,
        email: user.email,
    }))
}
