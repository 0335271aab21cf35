use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Extension, Json,
};
use serde_json::json;
use validator::Validate;

use crate::{
    dto::auth_dto::{LoginPayload, LoginResponse},
    error::Result,
    middleware::auth::{clear_session_cookie, issue_session_token, session_cookie},
    models::user::SessionUser,
    AppState,
};

#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginPayload,
    responses(
        (status = 200, description = "Session established"),
        (status = 401, description = "Invalid credentials or deactivated account")
    )
)]
#[axum::debug_handler]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginPayload>,
) -> Result<impl IntoResponse> {
    payload.validate()?;
    let user = state
        .user_service
        .authenticate(&payload.email, &payload.password)
        .await?;
    let session = user.to_session();
    let token = issue_session_token(&session)?;
    let cookie = session_cookie(&token);
    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, cookie)],
        Json(LoginResponse {
            token,
            user: session,
        }),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 200, description = "Session cleared"))
)]
#[axum::debug_handler]
pub async fn logout() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::SET_COOKIE, clear_session_cookie())],
        Json(json!({"success": true})),
    )
}

#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses((status = 200, description = "Current session user"))
)]
#[axum::debug_handler]
pub async fn me(Extension(user): Extension<SessionUser>) -> impl IntoResponse {
    Json(user)
}
