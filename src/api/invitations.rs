use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tracing::{info, warn};

use super::{AppState, JsonBody};
use crate::auth::AuthUser;
use crate::database::models::InvitationStatus;
use crate::error::FormFlowError;
use crate::mail::{invitation_email, is_valid_email, reminder_email};

#[derive(Debug, Deserialize)]
pub struct Recipient {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct InviteRequest {
    #[serde(default)]
    pub emails: Vec<Recipient>,
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ReminderRequest {
    #[serde(default, alias = "invitationIds")]
    pub invitation_ids: Option<Vec<i64>>,
    #[serde(default, alias = "allPending")]
    pub all_pending: bool,
}

#[derive(Debug, Deserialize)]
pub struct DeleteQuery {
    #[serde(default, alias = "invitationId")]
    pub invitation_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub struct Delivered {
    pub id: i64,
    pub email: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reminder_count: Option<i64>,
}

/// Per-recipient failure; collected, never aborts the batch.
#[derive(Debug, Serialize)]
pub struct DeliveryError {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub invitation_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

impl DeliveryError {
    fn for_email(email: &str, error: &str) -> Self {
        Self {
            invitation_id: None,
            email: Some(email.to_string()),
            error: error.to_string(),
            details: None,
        }
    }
}

fn batch_report(results: Vec<Delivered>, errors: Vec<DeliveryError>) -> Json<Value> {
    Json(json!({
        "success": true,
        "sent": results.len(),
        "failed": errors.len(),
        "results": results,
        "errors": errors
    }))
}

pub async fn list_invitations(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    user: AuthUser,
) -> Result<Json<Value>, FormFlowError> {
    state.owned_form(id, &user).await?;
    let invitations = state.database.list_invitations(id).await?;
    let stats = state.database.invitation_stats(id).await?;
    Ok(Json(json!({ "invitations": invitations, "stats": stats })))
}

pub async fn send_invitations(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    user: AuthUser,
    JsonBody(req): JsonBody<InviteRequest>,
) -> Result<Json<Value>, FormFlowError> {
    let form = state.owned_form(id, &user).await?;
    if req.emails.is_empty() {
        return Err(FormFlowError::validation("at least one email address is required"));
    }

    let survey_url = state.config.survey_url(form.id);
    let mut results = Vec::new();
    let mut errors = Vec::new();

    for recipient in &req.emails {
        let email = recipient.email.trim();
        if !is_valid_email(email) {
            errors.push(DeliveryError::for_email(email, "invalid email address"));
            continue;
        }

        if let Some(existing) = state.database.find_invitation_by_email(id, email).await? {
            let error = match existing.status {
                InvitationStatus::Pending => "an invitation is already pending",
                InvitationStatus::Responded => "this recipient has already responded",
            };
            errors.push(DeliveryError::for_email(email, error));
            continue;
        }

        let name = recipient
            .name
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());
        let invitation = state.database.create_invitation(id, email, name).await?;

        let message = invitation_email(email, &form.title, &survey_url, name, req.message.as_deref());
        match state.mailer.send(&message).await {
            Ok(()) => results.push(Delivered {
                id: invitation.id,
                email: invitation.email,
                name: invitation.name,
                reminder_count: None,
            }),
            Err(e) => {
                warn!("Failed to send invitation {} to {}: {}", invitation.id, email, e);
                errors.push(DeliveryError {
                    invitation_id: Some(invitation.id),
                    email: Some(email.to_string()),
                    error: "failed to send email".to_string(),
                    details: Some(e.to_string()),
                });
            }
        }
    }

    info!(
        "Form {}: {} invitations sent, {} failed",
        id,
        results.len(),
        errors.len()
    );
    Ok(batch_report(results, errors))
}

pub async fn send_reminders(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    user: AuthUser,
    JsonBody(req): JsonBody<ReminderRequest>,
) -> Result<Json<Value>, FormFlowError> {
    let form = state.owned_form(id, &user).await?;

    let targets = if req.all_pending {
        state.database.pending_invitation_ids(id).await?
    } else {
        req.invitation_ids.unwrap_or_default()
    };
    if targets.is_empty() {
        return Err(FormFlowError::validation("no invitations to remind"));
    }

    let survey_url = state.config.survey_url(form.id);
    let days_left = form.days_until_deadline(Utc::now());
    let mut results = Vec::new();
    let mut errors = Vec::new();

    for invitation_id in targets {
        let invitation = match state.database.find_invitation(invitation_id, id).await? {
            Some(inv) if inv.status == InvitationStatus::Pending => inv,
            _ => {
                errors.push(DeliveryError {
                    invitation_id: Some(invitation_id),
                    email: None,
                    error: "invitation not found or already responded".to_string(),
                    details: None,
                });
                continue;
            }
        };

        let message = reminder_email(
            &invitation.email,
            &form.title,
            &survey_url,
            invitation.name.as_deref(),
            days_left,
        );
        match state.mailer.send(&message).await {
            Ok(()) => {
                let reminder_count = state.database.record_reminder(invitation.id).await?;
                results.push(Delivered {
                    id: invitation.id,
                    email: invitation.email,
                    name: None,
                    reminder_count: Some(reminder_count),
                });
            }
            Err(e) => {
                warn!("Failed to send reminder for invitation {}: {}", invitation.id, e);
                errors.push(DeliveryError {
                    invitation_id: Some(invitation.id),
                    email: Some(invitation.email),
                    error: "failed to send email".to_string(),
                    details: Some(e.to_string()),
                });
            }
        }
    }

    info!(
        "Form {}: {} reminders sent, {} failed",
        id,
        results.len(),
        errors.len()
    );
    Ok(batch_report(results, errors))
}

pub async fn delete_invitation(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<DeleteQuery>,
    user: AuthUser,
) -> Result<Json<Value>, FormFlowError> {
    state.owned_form(id, &user).await?;
    let invitation_id = query
        .invitation_id
        .ok_or_else(|| FormFlowError::validation("invitation_id is required"))?;

    if !state.database.delete_invitation(invitation_id, id).await? {
        return Err(FormFlowError::not_found("invitation"));
    }

    info!("Deleted invitation {} of form {}", invitation_id, id);
    Ok(Json(json!({ "message": "invitation deleted" })))
}
