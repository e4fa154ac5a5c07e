use chrono::Utc;

use super::models::{User, UserCredentials};
use super::Database;
use crate::error::FormFlowError;

impl Database {
    pub async fn create_user(
        &self,
        email: &str,
        password_hash: &str,
        name: Option<&str>,
    ) -> Result<User, FormFlowError> {
        let result = sqlx::query(
            r#"
            INSERT INTO users (email, password_hash, name, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(email)
        .bind(password_hash)
        .bind(name)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                FormFlowError::validation("an account with this email already exists")
            }
            other => other.into(),
        })?;

        self.find_user_by_id(result.last_insert_rowid())
            .await?
            .ok_or_else(|| FormFlowError::not_found("user"))
    }

    pub async fn find_user_by_id(&self, id: i64) -> Result<Option<User>, FormFlowError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, email, name, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn find_credentials_by_email(
        &self,
        email: &str,
    ) -> Result<Option<UserCredentials>, FormFlowError> {
        let user = sqlx::query_as::<_, UserCredentials>(
            "SELECT id, email, name, password_hash, created_at FROM users WHERE email = ?",
        )
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn find_credentials_by_id(
        &self,
        id: i64,
    ) -> Result<Option<UserCredentials>, FormFlowError> {
        let user = sqlx::query_as::<_, UserCredentials>(
            "SELECT id, email, name, password_hash, created_at FROM users WHERE id = ?",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(user)
    }

    pub async fn update_user_name(&self, id: i64, name: &str) -> Result<bool, FormFlowError> {
        let result = sqlx::query("UPDATE users SET name = ? WHERE id = ?")
            .bind(name)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn update_user_password(
        &self,
        id: i64,
        password_hash: &str,
    ) -> Result<bool, FormFlowError> {
        let result = sqlx::query("UPDATE users SET password_hash = ? WHERE id = ?")
            .bind(password_hash)
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
