use std::{
    sync::Arc,
    time::{SystemTime, UNIX_EPOCH},
};

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{StatusCode, header},
    middleware::Next,
    response::{IntoResponse, Response},
};
use jsonwebtoken::{Algorithm, DecodingKey, Validation, decode};

use super::Claims;
use crate::{
    error::AppError,
    permissions::{PermissionRegistry, PermissionSet},
    state::AppState,
};

pub fn now_unix() -> usize {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs() as usize
}

/// Identity resolved from a request credential. Everything downstream of the
/// middleware authorizes against `permissions` only.
#[derive(Debug, Clone)]
pub struct Caller {
    pub subject: String,
    pub permissions: PermissionSet,
}

/// Turns a bearer credential into a [`Caller`]. The server never issues
/// tokens itself, so this is the only place a credential is interpreted.
#[async_trait::async_trait]
pub trait IdentityResolver: Send + Sync {
    async fn resolve(&self, token: &str) -> Result<Caller, AppError>;
}

pub struct JwtIdentityResolver {
    dec: DecodingKey,
    registry: Arc<PermissionRegistry>,
}

impl JwtIdentityResolver {
    pub fn new(secret: &str, registry: Arc<PermissionRegistry>) -> Self {
        Self {
            dec: DecodingKey::from_secret(secret.as_bytes()),
            registry,
        }
    }
}

#[async_trait::async_trait]
impl IdentityResolver for JwtIdentityResolver {
    async fn resolve(&self, token: &str) -> Result<Caller, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;

        let data = decode::<Claims>(token, &self.dec, &validation)
            .map_err(|_| AppError::unauthorized("Invalid or expired token"))?;

        let permissions = self
            .registry
            .resolve_set(data.claims.caps.iter().map(String::as_str));

        Ok(Caller {
            subject: data.claims.sub,
            permissions,
        })
    }
}

pub async fn resolve_identity(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, Response> {
    let auth = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").ok_or_else(|| {
        AppError::unauthorized("Missing/invalid Authorization header").into_response()
    })?;

    let caller = state
        .identity
        .resolve(token)
        .await
        .map_err(|err| err.into_response())?;

    req.extensions_mut().insert(caller);

    Ok(next.run(req).await)
}

// Helper extractor: pull the resolved caller from request extensions.
impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<Caller>()
            .cloned()
            .ok_or((StatusCode::UNAUTHORIZED, "No resolved identity"))
    }
}
