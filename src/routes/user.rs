/// User Profile Routes
///
/// Protected by the authentication middleware, which resolves the
/// identity (bearer fast path or refresh-cookie fallback) and injects
/// `AuthenticatedUser` into request extensions.

use actix_web::{web, HttpResponse};
use serde::{Deserialize, Serialize};

use crate::auth::{AuthenticatedUser, SessionManager};
use crate::error::AppError;
use crate::routes::auth::REFRESH_COOKIE;
use crate::store::SharedStore;
use crate::validators::is_valid_name;

#[derive(Serialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub name: String,
}

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub name: String,
}

/// GET /api/me
///
/// Current user's profile.
///
/// # Errors
/// - 401: the authenticated user no longer exists (account deleted
///   between token issuance and this request)
pub async fn me(
    auth: web::ReqData<AuthenticatedUser>,
    store: web::Data<SharedStore>,
) -> Result<HttpResponse, AppError> {
    let user = store
        .find_user_by_id(auth.user_id)
        .await?
        .ok_or(AppError::Unauthenticated)?;

    Ok(HttpResponse::Ok().json(UserResponse {
        id: user.id.to_string(),
        email: user.email,
        name: user.name,
    }))
}

/// PUT /api/me
///
/// Update the current user's display name.
///
/// # Errors
/// - 400: invalid name
/// - 401: the authenticated user no longer exists
pub async fn update_me(
    auth: web::ReqData<AuthenticatedUser>,
    form: web::Json<UpdateUserRequest>,
    store: web::Data<SharedStore>,
) -> Result<HttpResponse, AppError> {
    let name = is_valid_name(&form.name)?;

    let user = store
        .update_user_name(auth.user_id, &name)
        .await?
        .ok_or(AppError::Unauthenticated)?;

    tracing::info!(user_id = %user.id, "Profile updated");

    Ok(HttpResponse::Ok().json(UserResponse {
        id: user.id.to_string(),
        email: user.email,
        name: user.name,
    }))
}

/// DELETE /api/me
///
/// Delete the current user's account. Sessions cascade, so every
/// outstanding refresh grant is revoked with it; the refresh cookie is
/// cleared on the way out.
pub async fn delete_me(
    auth: web::ReqData<AuthenticatedUser>,
    manager: web::Data<SessionManager>,
) -> Result<HttpResponse, AppError> {
    manager.delete_account(auth.user_id).await?;

    let cookie = actix_web::cookie::Cookie::build(REFRESH_COOKIE, "")
        .http_only(true)
        .path("/")
        .max_age(actix_web::cookie::time::Duration::ZERO)
        .finish();

    Ok(HttpResponse::Ok()
        .cookie(cookie)
        .json(serde_json::json!({ "success": true })))
}
