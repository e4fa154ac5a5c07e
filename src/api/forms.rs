use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::{AppState, JsonBody};
use crate::auth::{AuthUser, MaybeAuthUser};
use crate::database::models::{FormUpdate, NewForm};
use crate::error::FormFlowError;
use crate::survey::{numbered_questions, validate_drafts, Answers};

#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub my: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct VisibilityRequest {
    #[serde(default)]
    pub answers: Answers,
}

pub async fn list_forms(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
    user: MaybeAuthUser,
) -> Result<Json<Value>, FormFlowError> {
    let forms = if query.my.unwrap_or(false) {
        let user = user
            .0
            .ok_or_else(|| FormFlowError::Unauthorized("login required".to_string()))?;
        state.database.list_user_forms(user.id).await?
    } else {
        state.database.list_open_forms().await?
    };

    Ok(Json(json!({ "forms": forms })))
}

pub async fn create_form(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(input): JsonBody<NewForm>,
) -> Result<(StatusCode, Json<Value>), FormFlowError> {
    if input.title.trim().is_empty() {
        return Err(FormFlowError::validation("title is required"));
    }
    validate_drafts(&input.questions)?;

    let form = state.database.create_form(user.id, &input).await?;
    info!("User {} created form {}", user.id, form.id);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "form created", "form": form })),
    ))
}

pub async fn get_form(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    user: MaybeAuthUser,
) -> Result<Json<Value>, FormFlowError> {
    let detail = state
        .database
        .get_form_detail(id)
        .await?
        .ok_or_else(|| FormFlowError::not_found("form"))?;

    let is_owner = user.id().map_or(false, |uid| detail.form.is_owned_by(uid));
    let mut body = json!({ "form": detail });
    body["form"]["is_owner"] = json!(is_owner);
    Ok(Json(body))
}

pub async fn update_form(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    user: AuthUser,
    JsonBody(update): JsonBody<FormUpdate>,
) -> Result<Json<Value>, FormFlowError> {
    state.owned_form(id, &user).await?;

    if let Some(title) = &update.title {
        if title.trim().is_empty() {
            return Err(FormFlowError::validation("title is required"));
        }
    }
    if let Some(questions) = &update.questions {
        validate_drafts(questions)?;
    }

    let form = state.database.update_form(id, &update).await?;
    info!("User {} updated form {}", user.id, id);
    Ok(Json(json!({ "message": "form updated", "form": form })))
}

pub async fn delete_form(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    user: AuthUser,
) -> Result<Json<Value>, FormFlowError> {
    state.owned_form(id, &user).await?;
    state.database.delete_form(id).await?;

    info!("User {} deleted form {}", user.id, id);
    Ok(Json(json!({ "message": "form deleted" })))
}

pub async fn duplicate_form(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    user: AuthUser,
) -> Result<(StatusCode, Json<Value>), FormFlowError> {
    let source = state.owned_form(id, &user).await?;
    let copy = state.database.duplicate_form(&source).await?;

    info!("User {} duplicated form {} as {}", user.id, id, copy.id);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "form duplicated", "form": copy })),
    ))
}

/// Questions visible for a partial set of answers, numbered in display
/// order.
pub async fn preview_visibility(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    JsonBody(req): JsonBody<VisibilityRequest>,
) -> Result<Json<Value>, FormFlowError> {
    state.database.require_form(id).await?;
    let questions = state.database.get_questions(id).await?;
    let visible = numbered_questions(&questions, &req.answers);

    Ok(Json(json!({
        "total": questions.len(),
        "visible": visible
    })))
}
