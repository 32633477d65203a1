use std::sync::Arc;
use std::task::{Context, Poll};

use axum::{
    body::Body,
    http::{Request, StatusCode},
    response::{IntoResponse, Response},
};
use futures_util::future::BoxFuture;
use tower::{Layer, Service};

use crate::permissions::PermissionRegistry;

use super::resolver::Caller;

#[derive(Clone)]
pub struct RequireCapabilityLayer {
    registry: Arc<PermissionRegistry>,
    required: String,
}

impl RequireCapabilityLayer {
    pub fn new(registry: Arc<PermissionRegistry>, required: impl Into<String>) -> Self {
        Self {
            registry,
            required: required.into(),
        }
    }
}

#[derive(Clone)]
pub struct RequireCapability<S> {
    inner: S,
    registry: Arc<PermissionRegistry>,
    required: String,
}

impl<S> Layer<S> for RequireCapabilityLayer {
    type Service = RequireCapability<S>;

    fn layer(&self, inner: S) -> Self::Service {
        RequireCapability {
            inner,
            registry: Arc::clone(&self.registry),
            required: self.required.clone(),
        }
    }
}

impl<S> Service<Request<Body>> for RequireCapability<S>
where
    S: Service<Request<Body>, Response = Response> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: Send + 'static,
{
    type Response = Response;
    type Error = S::Error;
    type Future = BoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let registry = Arc::clone(&self.registry);
        let required = self.required.clone();

        // tower Services are allowed to be called concurrently, so clone inner
        let mut inner = self.inner.clone();

        Box::pin(async move {
            let caller = match req.extensions().get::<Caller>() {
                Some(c) => c,
                None => {
                    return Ok((StatusCode::UNAUTHORIZED, "No resolved identity").into_response());
                }
            };

            if !registry.has_capability(&caller.permissions, &required) {
                return Ok((StatusCode::FORBIDDEN, "Missing required capability").into_response());
            }

            inner.call(req).await
        })
    }
}
