/// Authentication Routes
///
/// Registration, login, access-token refresh, and logout. The access
/// token travels in the response body; the refresh token only ever
/// travels in an HttpOnly cookie, out of reach of script execution.

use actix_web::cookie::{time::Duration as CookieDuration, Cookie, SameSite};
use actix_web::{web, HttpRequest, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::SessionManager;
use crate::error::AppError;
use crate::validators::{is_valid_email, is_valid_name, is_valid_password};

/// Name of the refresh-token cookie.
pub const REFRESH_COOKIE: &str = "refresh_token";

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Authentication response. The refresh token is deliberately absent:
/// it is delivered via the cookie only.
#[derive(Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

fn refresh_cookie(value: String, max_age_seconds: i64) -> Cookie<'static> {
    Cookie::build(REFRESH_COOKIE, value)
        .http_only(true)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(CookieDuration::seconds(max_age_seconds))
        .finish()
}

fn clear_refresh_cookie() -> Cookie<'static> {
    Cookie::build(REFRESH_COOKIE, "")
        .http_only(true)
        .same_site(SameSite::Strict)
        .path("/")
        .max_age(CookieDuration::ZERO)
        .finish()
}

/// POST /auth/register
///
/// Register a new user. Returns the access token and sets the refresh
/// cookie.
///
/// # Errors
/// - 400: invalid email/name/password format
/// - 409: email already registered
pub async fn register(
    form: web::Json<RegisterRequest>,
    manager: web::Data<SessionManager>,
) -> Result<HttpResponse, AppError> {
    let email = is_valid_email(&form.email)?;
    let name = is_valid_name(&form.name)?;
    is_valid_password(&form.password)?;

    let pair = manager.register(&name, &email, &form.password).await?;

    Ok(HttpResponse::Created()
        .cookie(refresh_cookie(
            pair.refresh_token,
            manager.refresh_token_expiry_seconds(),
        ))
        .json(AuthResponse {
            access_token: pair.access_token,
            token_type: "Bearer".to_string(),
            expires_in: manager.access_token_expiry_seconds(),
        }))
}

/// POST /auth/login
///
/// Authenticate with email and password. The failure response is the
/// same for an unknown email and a wrong password.
///
/// # Errors
/// - 400: invalid email format
/// - 401: invalid credentials
pub async fn login(
    form: web::Json<LoginRequest>,
    manager: web::Data<SessionManager>,
) -> Result<HttpResponse, AppError> {
    let email = is_valid_email(&form.email)?;

    let pair = manager.login(&email, &form.password).await?;

    Ok(HttpResponse::Ok()
        .cookie(refresh_cookie(
            pair.refresh_token,
            manager.refresh_token_expiry_seconds(),
        ))
        .json(AuthResponse {
            access_token: pair.access_token,
            token_type: "Bearer".to_string(),
            expires_in: manager.access_token_expiry_seconds(),
        }))
}

/// POST /auth/refresh
///
/// Mint a new access token from the refresh cookie. The session row and
/// the refresh token itself are reused; only the access token rotates.
///
/// # Errors
/// - 401: missing cookie, invalid/expired token, or revoked session
pub async fn refresh(
    req: HttpRequest,
    manager: web::Data<SessionManager>,
) -> Result<HttpResponse, AppError> {
    let cookie = req.cookie(REFRESH_COOKIE).ok_or(AppError::Unauthenticated)?;

    let access_token = manager.refresh_access(cookie.value()).await?;

    Ok(HttpResponse::Ok().json(AuthResponse {
        access_token,
        token_type: "Bearer".to_string(),
        expires_in: manager.access_token_expiry_seconds(),
    }))
}

/// POST /auth/logout
///
/// Revoke the session behind the refresh cookie and clear the cookie.
/// Succeeds whether or not the cookie was present or its session live,
/// and never reveals which.
pub async fn logout(
    req: HttpRequest,
    manager: web::Data<SessionManager>,
) -> Result<HttpResponse, AppError> {
    if let Some(cookie) = req.cookie(REFRESH_COOKIE) {
        manager.logout(cookie.value()).await?;
    }

    Ok(HttpResponse::Ok()
        .cookie(clear_refresh_cookie())
        .json(serde_json::json!({ "success": true })))
}
