use chrono::Utc;

use super::models::{Invitation, InvitationStats, InvitationStatus};
use super::Database;
use crate::error::FormFlowError;

impl Database {
    pub async fn list_invitations(&self, form_id: i64) -> Result<Vec<Invitation>, FormFlowError> {
        let invitations = sqlx::query_as::<_, Invitation>(
            "SELECT * FROM survey_invitations WHERE form_id = ? ORDER BY created_at DESC, id DESC",
        )
        .bind(form_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(invitations)
    }

    pub async fn invitation_stats(&self, form_id: i64) -> Result<InvitationStats, FormFlowError> {
        let rows: Vec<(String, i64)> = sqlx::query_as(
            "SELECT status, COUNT(*) FROM survey_invitations WHERE form_id = ? GROUP BY status",
        )
        .bind(form_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(rows.into_iter().collect())
    }

    pub async fn find_invitation_by_email(
        &self,
        form_id: i64,
        email: &str,
    ) -> Result<Option<Invitation>, FormFlowError> {
        let invitation = sqlx::query_as::<_, Invitation>(
            "SELECT * FROM survey_invitations WHERE form_id = ? AND email = ?",
        )
        .bind(form_id)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(invitation)
    }

    pub async fn create_invitation(
        &self,
        form_id: i64,
        email: &str,
        name: Option<&str>,
    ) -> Result<Invitation, FormFlowError> {
        let now = Utc::now();
        let id = sqlx::query(
            r#"
            INSERT INTO survey_invitations (form_id, email, name, status, sent_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(form_id)
        .bind(email)
        .bind(name)
        .bind(InvitationStatus::Pending)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        self.find_invitation(id, form_id)
            .await?
            .ok_or_else(|| FormFlowError::not_found("invitation"))
    }

    pub async fn find_invitation(
        &self,
        id: i64,
        form_id: i64,
    ) -> Result<Option<Invitation>, FormFlowError> {
        let invitation = sqlx::query_as::<_, Invitation>(
            "SELECT * FROM survey_invitations WHERE id = ? AND form_id = ?",
        )
        .bind(id)
        .bind(form_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(invitation)
    }

    pub async fn pending_invitation_ids(&self, form_id: i64) -> Result<Vec<i64>, FormFlowError> {
        let ids = sqlx::query_scalar(
            "SELECT id FROM survey_invitations WHERE form_id = ? AND status = ? ORDER BY id",
        )
        .bind(form_id)
        .bind(InvitationStatus::Pending)
        .fetch_all(&self.pool)
        .await?;
        Ok(ids)
    }

    /// Bump the reminder counter; returns the new count.
    pub async fn record_reminder(&self, id: i64) -> Result<i64, FormFlowError> {
        let count = sqlx::query_scalar(
            r#"
            UPDATE survey_invitations
            SET reminder_count = reminder_count + 1, last_reminder_at = ?
            WHERE id = ?
            RETURNING reminder_count
            "#,
        )
        .bind(Utc::now())
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count)
    }

    pub async fn delete_invitation(&self, id: i64, form_id: i64) -> Result<bool, FormFlowError> {
        let result = sqlx::query("DELETE FROM survey_invitations WHERE id = ? AND form_id = ?")
            .bind(id)
            .bind(form_id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
