use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use super::{AppState, JsonBody};
use crate::auth::AuthUser;
use crate::error::FormFlowError;
use crate::export::{self, ExportFormat, ExportTable};
use crate::survey::{summarize, validate_submission, Answers};

#[derive(Debug, Deserialize)]
pub struct SubmitRequest {
    #[serde(default)]
    pub answers: Answers,
    /// Respondent email; marks a matching pending invitation as responded.
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExportQuery {
    #[serde(default)]
    pub format: Option<String>,
}

pub async fn submit_response(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    JsonBody(req): JsonBody<SubmitRequest>,
) -> Result<(StatusCode, Json<Value>), FormFlowError> {
    let form = state.database.require_form(id).await?;

    let now = Utc::now();
    if !form.is_open {
        return Err(FormFlowError::validation("this survey is closed"));
    }
    if form.deadline_passed(now) {
        return Err(FormFlowError::validation(
            "the deadline for this survey has passed",
        ));
    }

    let questions = state.database.get_questions(id).await?;
    let accepted = validate_submission(&questions, &req.answers)?;

    let email = req
        .email
        .as_deref()
        .map(str::trim)
        .filter(|e| !e.is_empty());
    let response_id = state
        .database
        .create_response(id, &accepted, email)
        .await?;

    info!("Stored response {} for form {}", response_id, id);
    Ok((
        StatusCode::CREATED,
        Json(json!({
            "message": "response submitted",
            "response_id": response_id
        })),
    ))
}

pub async fn list_responses(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    user: AuthUser,
) -> Result<Json<Value>, FormFlowError> {
    state.owned_form(id, &user).await?;
    let responses = state.database.list_responses(id).await?;
    Ok(Json(json!({ "responses": responses })))
}

pub async fn form_results(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    user: AuthUser,
) -> Result<Json<Value>, FormFlowError> {
    let form = state.owned_form(id, &user).await?;
    let questions = state.database.get_questions(id).await?;
    let answers: Vec<Answers> = state
        .database
        .list_responses(id)
        .await?
        .iter()
        .map(|response| response.answer_map())
        .collect();

    let results = summarize(&questions, &answers);
    Ok(Json(json!({ "form": form, "results": results })))
}

pub async fn export_responses(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<ExportQuery>,
    user: AuthUser,
) -> Result<Response, FormFlowError> {
    let format = match query.format.as_deref() {
        None => ExportFormat::default(),
        Some(raw) => ExportFormat::parse(raw).ok_or_else(|| {
            FormFlowError::validation(format!("unsupported export format \"{}\"", raw))
        })?,
    };

    let form = state.owned_form(id, &user).await?;
    let questions = state.database.get_questions(id).await?;
    let responses = state.database.list_responses(id).await?;

    let table = ExportTable::build(&questions, &responses);
    let body = export::render(format, &table)?;

    info!(
        "Exported {} responses of form {} as {}",
        responses.len(),
        id,
        format.extension()
    );

    let disposition = format!(
        "attachment; filename=\"{}\"",
        export::file_name(&form.title, format)
    );
    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response())
}
