//! Identity middleware
//!
//! Attaches a [`Session`] to every request. A missing Authorization header
//! yields an anonymous session; a present but invalid one is rejected.

use crate::auth::{decode_token, Session};
use crate::error::AppError;
use crate::state::SharedState;
use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use tracing::debug;

pub async fn identity_middleware(
    State(state): State<SharedState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let session = if !state.auth.enabled {
        Session::anonymous()
    } else {
        match request.headers().get(AUTHORIZATION) {
            None => Session::anonymous(),
            Some(value) => {
                let header = value
                    .to_str()
                    .map_err(|_| AppError::Unauthorized("Invalid authorization header".to_string()))?;
                let token = header
                    .strip_prefix("Bearer ")
                    .ok_or_else(|| AppError::Unauthorized("Invalid authorization format".to_string()))?;

                let claims = decode_token(token, &state.auth.jwt_secret)?;
                debug!(
                    "Request authenticated as user {} ({})",
                    claims.sub,
                    claims.email.as_deref().unwrap_or("no email")
                );
                Session::authenticated(claims)
            }
        }
    };

    // Insert session into request extensions for handlers to use
    request.extensions_mut().insert(session);

    Ok(next.run(request).await)
}
