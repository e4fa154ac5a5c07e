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
use crate::database::models::NewTemplate;
use crate::error::FormFlowError;
use crate::survey::validate_drafts;

#[derive(Debug, Default, Deserialize)]
pub struct TemplateQuery {
    #[serde(default)]
    pub category: Option<String>,
}

pub async fn list_templates(
    State(state): State<AppState>,
    Query(query): Query<TemplateQuery>,
    user: MaybeAuthUser,
) -> Result<Json<Value>, FormFlowError> {
    let category = query
        .category
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty() && *c != "all");
    let templates = state.database.list_templates(user.id(), category).await?;
    Ok(Json(json!({ "templates": templates })))
}

pub async fn create_template(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(input): JsonBody<NewTemplate>,
) -> Result<(StatusCode, Json<Value>), FormFlowError> {
    if input.name.trim().is_empty() {
        return Err(FormFlowError::validation("template name is required"));
    }
    if input.questions.is_empty() {
        return Err(FormFlowError::validation("a template needs at least one question"));
    }
    validate_drafts(&input.questions)?;

    let template = state
        .database
        .create_template(Some(user.id), &input, false)
        .await?;

    info!("User {} created template {}", user.id, template.id);
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": "template saved", "template": template })),
    ))
}

pub async fn get_template(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Value>, FormFlowError> {
    let template = state
        .database
        .get_template(id)
        .await?
        .ok_or_else(|| FormFlowError::not_found("template"))?;
    Ok(Json(json!({ "template": template })))
}

pub async fn delete_template(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    user: AuthUser,
) -> Result<Json<Value>, FormFlowError> {
    let template = state
        .database
        .get_template(id)
        .await?
        .ok_or_else(|| FormFlowError::not_found("template"))?;

    if template.is_preset {
        return Err(FormFlowError::Forbidden(
            "preset templates cannot be deleted".to_string(),
        ));
    }
    if template.user_id != Some(user.id) {
        return Err(FormFlowError::Forbidden(
            "you can only delete your own templates".to_string(),
        ));
    }

    state.database.delete_template(id).await?;
    info!("User {} deleted template {}", user.id, id);
    Ok(Json(json!({ "message": "template deleted" })))
}
