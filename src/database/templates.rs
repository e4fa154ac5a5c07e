use chrono::Utc;
use sqlx::types::Json;

use super::models::{NewTemplate, Template};
use super::Database;
use crate::error::FormFlowError;

pub const DEFAULT_CATEGORY: &str = "custom";

impl Database {
    /// Presets plus, when `user_id` is given, that user's own templates.
    /// Presets come first, then newest first.
    pub async fn list_templates(
        &self,
        user_id: Option<i64>,
        category: Option<&str>,
    ) -> Result<Vec<Template>, FormFlowError> {
        let templates = sqlx::query_as::<_, Template>(
            r#"
            SELECT * FROM templates
            WHERE (is_preset = 1 OR (? IS NOT NULL AND user_id = ?))
              AND (? IS NULL OR category = ?)
            ORDER BY is_preset DESC, created_at DESC, id DESC
            "#,
        )
        .bind(user_id)
        .bind(user_id)
        .bind(category)
        .bind(category)
        .fetch_all(&self.pool)
        .await?;
        Ok(templates)
    }

    pub async fn get_template(&self, id: i64) -> Result<Option<Template>, FormFlowError> {
        let template = sqlx::query_as::<_, Template>("SELECT * FROM templates WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(template)
    }

    pub async fn create_template(
        &self,
        user_id: Option<i64>,
        input: &NewTemplate,
        is_preset: bool,
    ) -> Result<Template, FormFlowError> {
        let category = input
            .category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty())
            .unwrap_or(DEFAULT_CATEGORY);

        let id = sqlx::query(
            r#"
            INSERT INTO templates (user_id, name, description, category, questions, is_preset, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(input.name.trim())
        .bind(input.description.as_deref())
        .bind(category)
        .bind(Json(&input.questions))
        .bind(is_preset)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?
        .last_insert_rowid();

        self.get_template(id)
            .await?
            .ok_or_else(|| FormFlowError::not_found("template"))
    }

    pub async fn count_preset_templates(&self) -> Result<i64, FormFlowError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM templates WHERE is_preset = 1")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    pub async fn delete_template(&self, id: i64) -> Result<bool, FormFlowError> {
        let result = sqlx::query("DELETE FROM templates WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
