use chrono::{DateTime, Utc};
use std::collections::HashMap;

use super::models::{AnswerDetail, AnswerRow, InvitationStatus, ResponseRecord};
use super::Database;
use crate::error::FormFlowError;
use crate::survey::AnswerValue;

impl Database {
    /// Store one submission and its answers atomically. When the respondent
    /// identifies with an invited email, that invitation is marked responded.
    pub async fn create_response(
        &self,
        form_id: i64,
        answers: &[(i64, AnswerValue)],
        respondent_email: Option<&str>,
    ) -> Result<i64, FormFlowError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let response_id = sqlx::query("INSERT INTO responses (form_id, submitted_at) VALUES (?, ?)")
            .bind(form_id)
            .bind(now)
            .execute(&mut *tx)
            .await?
            .last_insert_rowid();

        for (question_id, value) in answers {
            sqlx::query("INSERT INTO answers (response_id, question_id, answer) VALUES (?, ?, ?)")
                .bind(response_id)
                .bind(question_id)
                .bind(value.to_storage())
                .execute(&mut *tx)
                .await?;
        }

        if let Some(email) = respondent_email {
            sqlx::query(
                r#"
                UPDATE survey_invitations
                SET status = ?, responded_at = ?
                WHERE form_id = ? AND email = ? AND status = ?
                "#,
            )
            .bind(InvitationStatus::Responded)
            .bind(now)
            .bind(form_id)
            .bind(email.trim())
            .bind(InvitationStatus::Pending)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(response_id)
    }

    pub async fn count_responses(&self, form_id: i64) -> Result<i64, FormFlowError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM responses WHERE form_id = ?")
            .bind(form_id)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// All responses of a form, newest first, each with its answers in
    /// question order.
    pub async fn list_responses(&self, form_id: i64) -> Result<Vec<ResponseRecord>, FormFlowError> {
        let responses: Vec<(i64, DateTime<Utc>)> = sqlx::query_as(
            "SELECT id, submitted_at FROM responses WHERE form_id = ? ORDER BY submitted_at DESC, id DESC",
        )
        .bind(form_id)
        .fetch_all(&self.pool)
        .await?;

        let rows = sqlx::query_as::<_, AnswerRow>(
            r#"
            SELECT a.response_id, a.question_id, a.answer,
                   q.title AS question_title, q.question_type, q.options AS question_options
            FROM answers a
            JOIN questions q ON a.question_id = q.id
            JOIN responses r ON a.response_id = r.id
            WHERE r.form_id = ?
            ORDER BY a.response_id, q.order_index
            "#,
        )
        .bind(form_id)
        .fetch_all(&self.pool)
        .await?;

        let mut by_response: HashMap<i64, Vec<AnswerDetail>> = HashMap::new();
        for row in rows {
            let response_id = row.response_id;
            by_response
                .entry(response_id)
                .or_default()
                .push(AnswerDetail::try_from(row)?);
        }

        Ok(responses
            .into_iter()
            .map(|(id, submitted_at)| ResponseRecord {
                id,
                form_id,
                submitted_at,
                answers: by_response.remove(&id).unwrap_or_default(),
            })
            .collect())
    }
}
