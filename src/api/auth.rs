use axum::{extract::State, http::StatusCode, response::Json};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::{AppState, JsonBody};
use crate::auth::{
    check_password_strength, hash_password, verify_password, AuthUser, AUTH_COOKIE,
};
use crate::error::FormFlowError;
use crate::mail::is_valid_email;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct ProfileUpdate {
    #[serde(default)]
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct PasswordChange {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub new_password: String,
}

pub async fn register(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>), FormFlowError> {
    let email = req.email.trim();
    if email.is_empty() || req.password.is_empty() {
        return Err(FormFlowError::validation("email and password are required"));
    }
    if !is_valid_email(email) {
        return Err(FormFlowError::validation("invalid email address"));
    }
    check_password_strength(&req.password)?;

    let name = req.name.as_deref().map(str::trim).filter(|n| !n.is_empty());
    let password_hash = hash_password(&req.password)?;
    let user = state.database.create_user(email, &password_hash, name).await?;

    info!("Registered user {} ({})", user.id, user.email);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "registration complete", "user": user })),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    JsonBody(req): JsonBody<LoginRequest>,
) -> Result<(CookieJar, Json<Value>), FormFlowError> {
    let invalid = || FormFlowError::Unauthorized("invalid email or password".to_string());

    let credentials = state
        .database
        .find_credentials_by_email(req.email.trim())
        .await?
        .ok_or_else(invalid)?;
    if !verify_password(&req.password, &credentials.password_hash)? {
        return Err(invalid());
    }

    let user = credentials.into_user();
    let token = state.tokens.issue(&user)?;
    let max_age = time::Duration::seconds(state.tokens.ttl().num_seconds());

    let cookie = Cookie::build((AUTH_COOKIE, token.clone()))
        .http_only(true)
        .secure(state.config.auth.secure_cookies)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(max_age);

    info!("User {} logged in", user.id);
    Ok((jar.add(cookie), Json(json!({ "user": user, "token": token }))))
}

/// Overwrites the session cookie with an expired one, whether or not the
/// request carried it.
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<Value>) {
    let expired = Cookie::build((AUTH_COOKIE, ""))
        .http_only(true)
        .path("/")
        .max_age(time::Duration::ZERO);
    (jar.add(expired), Json(json!({ "message": "logged out" })))
}

pub async fn me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Value>, FormFlowError> {
    let user = state
        .database
        .find_user_by_id(user.id)
        .await?
        .ok_or_else(|| FormFlowError::Unauthorized("account no longer exists".to_string()))?;
    Ok(Json(json!({ "user": user })))
}

pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(req): JsonBody<ProfileUpdate>,
) -> Result<Json<Value>, FormFlowError> {
    let name = req.name.trim();
    if name.is_empty() {
        return Err(FormFlowError::validation("name is required"));
    }

    state.database.update_user_name(user.id, name).await?;
    let user = state
        .database
        .find_user_by_id(user.id)
        .await?
        .ok_or_else(|| FormFlowError::not_found("user"))?;
    Ok(Json(json!({ "message": "profile updated", "user": user })))
}

pub async fn change_password(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(req): JsonBody<PasswordChange>,
) -> Result<Json<Value>, FormFlowError> {
    if req.current_password.is_empty() || req.new_password.is_empty() {
        return Err(FormFlowError::validation(
            "current and new password are required",
        ));
    }
    check_password_strength(&req.new_password)?;

    let credentials = state
        .database
        .find_credentials_by_id(user.id)
        .await?
        .ok_or_else(|| FormFlowError::not_found("user"))?;
    if !verify_password(&req.current_password, &credentials.password_hash)? {
        return Err(FormFlowError::validation("current password is incorrect"));
    }

    let password_hash = hash_password(&req.new_password)?;
    state
        .database
        .update_user_password(user.id, &password_hash)
        .await?;

    info!("User {} changed password", user.id);
    Ok(Json(json!({ "message": "password changed" })))
}
