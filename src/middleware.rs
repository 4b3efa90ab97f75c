// middleware.rs
use axum::{
    extract::Request,
    http::header,
    middleware::Next,
    response::IntoResponse,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::HttpError;

/// The authenticated caller's identity, resolved once at the HTTP boundary
/// and passed explicitly into every core operation. The upstream identity
/// provider is out of scope here; the bearer token carries the opaque user id.
#[derive(Debug, Serialize, Deserialize, Clone, Copy)]
pub struct AuthUser {
    pub id: Uuid,
}

pub async fn auth(mut req: Request, next: Next) -> Result<impl IntoResponse, HttpError> {
    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|auth_header| auth_header.to_str().ok())
        .and_then(|auth_value| auth_value.strip_prefix("Bearer "))
        .ok_or_else(|| HttpError::unauthorized("Authentication token not provided"))?;

    let user_id = Uuid::parse_str(token)
        .map_err(|_| HttpError::unauthorized("Invalid authentication token"))?;

    req.extensions_mut().insert(AuthUser { id: user_id });
    Ok(next.run(req).await)
}
