/// Middleware module
///
/// Request authentication for protected route scopes.

mod auth_middleware;

pub use auth_middleware::{AuthMiddleware, ACCESS_TOKEN_HEADER};
