/// Authentication Middleware
///
/// Applies the Authenticator to protected routes: resolves identity from
/// the bearer header or the refresh cookie, injects the resolved
/// `AuthenticatedUser` into request extensions, and surfaces a reissued
/// access token to the client via the `X-Access-Token` response header.

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    http::header::{HeaderName, HeaderValue},
    Error, HttpMessage,
};
use futures::future::LocalBoxFuture;
use std::rc::Rc;

use crate::auth::Authenticator;
use crate::routes::REFRESH_COOKIE;

/// Response header carrying a rotated access token. Set only when the
/// bearer was missing/expired and the refresh cookie re-established the
/// identity.
pub const ACCESS_TOKEN_HEADER: &str = "x-access-token";

pub struct AuthMiddleware {
    authenticator: Authenticator,
}

impl AuthMiddleware {
    pub fn new(authenticator: Authenticator) -> Self {
        Self { authenticator }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AuthMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = AuthMiddlewareService<S>;
    type Future = std::future::Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        std::future::ready(Ok(AuthMiddlewareService {
            service: Rc::new(service),
            authenticator: self.authenticator.clone(),
        }))
    }
}

pub struct AuthMiddlewareService<S> {
    service: Rc<S>,
    authenticator: Authenticator,
}

impl<S, B> Service<ServiceRequest> for AuthMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = self.service.clone();
        let authenticator = self.authenticator.clone();

        Box::pin(async move {
            let bearer = req
                .headers()
                .get("Authorization")
                .and_then(|h| h.to_str().ok())
                .and_then(|h| h.strip_prefix("Bearer "))
                .map(str::to_string);
            let refresh_cookie = req.cookie(REFRESH_COOKIE).map(|c| c.value().to_string());

            // Rejections surface through the AppError response mapping:
            // a uniform 401 regardless of which check failed.
            let resolved = authenticator
                .authenticate(bearer.as_deref(), refresh_cookie.as_deref())
                .await?;

            let new_access_token = resolved.new_access_token.clone();
            tracing::debug!(user_id = %resolved.user_id, "Request authenticated");
            req.extensions_mut().insert(resolved);

            let mut res = service.call(req).await?;

            if let Some(token) = new_access_token {
                if let Ok(value) = HeaderValue::from_str(&token) {
                    res.headers_mut()
                        .insert(HeaderName::from_static(ACCESS_TOKEN_HEADER), value);
                }
            }

            Ok(res)
        })
    }
}
