use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};

use crate::error::{AppError, AppResult};
use crate::realtime::registry::ActorKind;
use crate::utils::jwt::{verify_token, Claims};
use crate::AppState;

/// Extract and validate JWT token from Authorization header
pub async fn auth_middleware(
    State(state): State<AppState>,
    TypedHeader(auth): TypedHeader<Authorization<Bearer>>,
    mut request: Request,
    next: Next,
) -> AppResult<Response> {
    let claims = verify_token(auth.token(), &state.config.jwt_secret)?;
    request.extensions_mut().insert(claims);
    Ok(next.run(request).await)
}

fn require_role(request: &Request, role: ActorKind, denied: &str) -> AppResult<()> {
    let claims = request
        .extensions()
        .get::<Claims>()
        .ok_or_else(|| AppError::Unauthorized("No authentication found".to_string()))?;

    if claims.role != role {
        return Err(AppError::Forbidden(denied.to_string()));
    }

    Ok(())
}

/// Require rider role
pub async fn require_rider(request: Request, next: Next) -> AppResult<Response> {
    require_role(&request, ActorKind::Rider, "Rider access required")?;
    Ok(next.run(request).await)
}

/// Require captain role
pub async fn require_captain(request: Request, next: Next) -> AppResult<Response> {
    require_role(&request, ActorKind::Captain, "Captain access required")?;
    Ok(next.run(request).await)
}
