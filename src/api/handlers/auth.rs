use crate::AppState;
use crate::api::error::AppError;
use crate::api::middleware::auth::AUTH_COOKIE;
use crate::models::{
    AuthSession, LoginCredentials, RegisterUser, ResetPassword, SuccessfulRequest, User,
};
use axum::{
    Json,
    extract::State,
    http::{HeaderMap, HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Deserialize;
use utoipa::ToSchema;
use validator::Validate;

#[derive(Deserialize, ToSchema, Validate)]
pub struct PasswordRecoveryRequest {
    /// Email or personal document
    #[validate(length(min = 1, max = 254, message = "Login cannot be empty"))]
    pub login: String,
}

fn session_cookie(token: &str, max_age_secs: i64, secure: bool) -> String {
    let mut cookie = format!(
        "{}={}; HttpOnly; Path=/; SameSite=Lax; Max-Age={}",
        AUTH_COOKIE, token, max_age_secs
    );
    if secure {
        cookie.push_str("; Secure");
    }
    cookie
}

/// First hop of `x-forwarded-for`, falling back to `x-real-ip`.
fn client_ip(headers: &HeaderMap) -> Option<String> {
    headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .or_else(|| headers.get("x-real-ip").and_then(|v| v.to_str().ok()))
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
}

#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginCredentials,
    responses(
        (status = 200, description = "Login successful", body = AuthSession),
        (status = 400, description = "Empty login or password"),
        (status = 403, description = "Invalid credentials")
    ),
    tag = "auth"
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginCredentials>,
) -> Result<Response, AppError> {
    let session: AuthSession = state.auth.login(payload).await?;

    let cookie = session_cookie(
        &session.token,
        state.settings.jwt_expiration_hours * 3600,
        state.settings.cookie_secure,
    );
    let cookie = HeaderValue::from_str(&cookie).map_err(|_| AppError::unexpected())?;

    Ok(([(header::SET_COOKIE, cookie)], Json(session)).into_response())
}

#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterUser,
    responses(
        (status = 201, description = "User registered successfully", body = User),
        (status = 400, description = "Invalid or duplicated registration data")
    ),
    tag = "auth"
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterUser>,
) -> Result<(StatusCode, Json<User>), AppError> {
    let user = state.auth.register(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    post,
    path = "/password/recovery",
    request_body = PasswordRecoveryRequest,
    responses(
        (status = 200, description = "Recovery mail sent when the login is known", body = SuccessfulRequest),
        (status = 400, description = "Empty login")
    ),
    tag = "auth"
)]
pub async fn request_password_recovery(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(payload): Json<PasswordRecoveryRequest>,
) -> Result<Json<SuccessfulRequest>, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    let ip = client_ip(&headers);
    state
        .auth
        .request_password_recovery(&payload.login, ip.as_deref())
        .await?;

    Ok(Json(SuccessfulRequest::new()))
}

#[utoipa::path(
    post,
    path = "/password/reset",
    request_body = ResetPassword,
    responses(
        (status = 200, description = "Password changed", body = SuccessfulRequest),
        (status = 400, description = "Invalid password or expired token"),
        (status = 404, description = "Unknown token")
    ),
    tag = "auth"
)]
pub async fn reset_password(
    State(state): State<AppState>,
    Json(payload): Json<ResetPassword>,
) -> Result<Json<SuccessfulRequest>, AppError> {
    state.auth.reset_password(payload).await?;
    Ok(Json(SuccessfulRequest::new()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_cookie() {
        assert_eq!(
            session_cookie("abc", 60, false),
            "auth_token=abc; HttpOnly; Path=/; SameSite=Lax; Max-Age=60"
        );
        assert!(session_cookie("abc", 60, true).ends_with("; Secure"));
    }

    #[test]
    fn test_client_ip() {
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers), None);

        headers.insert("x-real-ip", HeaderValue::from_static("10.0.0.2"));
        assert_eq!(client_ip(&headers).as_deref(), Some("10.0.0.2"));

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.7, 10.0.0.1"),
        );
        assert_eq!(client_ip(&headers).as_deref(), Some("203.0.113.7"));
    }
}
