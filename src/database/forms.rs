use chrono::Utc;
use sqlx::SqliteConnection;
use std::collections::{HashMap, HashSet};
use tracing::debug;

use super::models::{Form, FormDetail, FormSummary, FormUpdate, NewForm, QuestionRow};
use super::Database;
use crate::error::FormFlowError;
use crate::survey::{DraftResolver, Question, QuestionDraft, QuestionType};

const SUMMARY_SELECT: &str = r#"
    SELECT f.id, f.user_id, f.title, f.description, f.is_open, f.deadline,
           f.created_at, f.updated_at,
           u.name AS author_name,
           (SELECT COUNT(*) FROM responses r WHERE r.form_id = f.id) AS response_count
    FROM forms f
    LEFT JOIN users u ON f.user_id = u.id
"#;

impl Database {
    pub async fn create_form(&self, user_id: i64, input: &NewForm) -> Result<Form, FormFlowError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO forms (user_id, title, description, is_open, deadline, created_at, updated_at)
            VALUES (?, ?, ?, 1, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(input.title.trim())
        .bind(input.description.as_deref())
        .bind(input.deadline)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let form_id = result.last_insert_rowid();
        save_questions(&mut tx, form_id, &input.questions, &HashMap::new()).await?;
        tx.commit().await?;

        debug!("Created form {} with {} questions", form_id, input.questions.len());
        self.require_form(form_id).await
    }

    pub async fn get_form(&self, id: i64) -> Result<Option<Form>, FormFlowError> {
        let form = sqlx::query_as::<_, Form>("SELECT * FROM forms WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(form)
    }

    pub async fn require_form(&self, id: i64) -> Result<Form, FormFlowError> {
        self.get_form(id)
            .await?
            .ok_or_else(|| FormFlowError::not_found("form"))
    }

    pub async fn get_form_detail(&self, id: i64) -> Result<Option<FormDetail>, FormFlowError> {
        let summary = sqlx::query_as::<_, FormSummary>(&format!("{} WHERE f.id = ?", SUMMARY_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        let Some(summary) = summary else {
            return Ok(None);
        };

        let questions = self.get_questions(id).await?;
        Ok(Some(FormDetail {
            form: summary.form,
            author_name: summary.author_name,
            questions,
        }))
    }

    pub async fn list_open_forms(&self) -> Result<Vec<FormSummary>, FormFlowError> {
        let forms = sqlx::query_as::<_, FormSummary>(&format!(
            "{} WHERE f.is_open = 1 ORDER BY f.created_at DESC, f.id DESC",
            SUMMARY_SELECT
        ))
        .fetch_all(&self.pool)
        .await?;
        Ok(forms)
    }

    pub async fn list_user_forms(&self, user_id: i64) -> Result<Vec<FormSummary>, FormFlowError> {
        let forms = sqlx::query_as::<_, FormSummary>(&format!(
            "{} WHERE f.user_id = ? ORDER BY f.created_at DESC, f.id DESC",
            SUMMARY_SELECT
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(forms)
    }

    pub async fn get_questions(&self, form_id: i64) -> Result<Vec<Question>, FormFlowError> {
        let rows = sqlx::query_as::<_, QuestionRow>(
            "SELECT * FROM questions WHERE form_id = ? ORDER BY order_index, id",
        )
        .bind(form_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Question::try_from).collect()
    }

    pub async fn update_form(&self, id: i64, update: &FormUpdate) -> Result<Form, FormFlowError> {
        let existing: HashMap<i64, QuestionType> = if update.questions.is_some() {
            self.get_questions(id)
                .await?
                .iter()
                .map(|q| (q.id, q.question_type))
                .collect()
        } else {
            HashMap::new()
        };

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        if let Some(title) = &update.title {
            sqlx::query(
                r#"
                UPDATE forms SET title = ?, description = ?, deadline = ?, updated_at = ?
                WHERE id = ?
                "#,
            )
            .bind(title.trim())
            .bind(update.description.as_deref())
            .bind(update.deadline)
            .bind(now)
            .bind(id)
            .execute(&mut *tx)
            .await?;
        }

        if let Some(is_open) = update.is_open {
            sqlx::query("UPDATE forms SET is_open = ?, updated_at = ? WHERE id = ?")
                .bind(is_open)
                .bind(now)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        if let Some(questions) = &update.questions {
            save_questions(&mut tx, id, questions, &existing).await?;
            sqlx::query("UPDATE forms SET updated_at = ? WHERE id = ?")
                .bind(now)
                .bind(id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;
        self.require_form(id).await
    }

    pub async fn delete_form(&self, id: i64) -> Result<bool, FormFlowError> {
        let result = sqlx::query("DELETE FROM forms WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Copy a form and its questions. The copy starts closed and its
    /// conditions point at the copied questions.
    pub async fn duplicate_form(&self, source: &Form) -> Result<Form, FormFlowError> {
        let drafts: Vec<QuestionDraft> = self
            .get_questions(source.id)
            .await?
            .iter()
            .map(Question::to_draft)
            .collect();

        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            INSERT INTO forms (user_id, title, description, is_open, deadline, created_at, updated_at)
            VALUES (?, ?, ?, 0, ?, ?, ?)
            "#,
        )
        .bind(source.user_id)
        .bind(format!("{} (Copy)", source.title))
        .bind(source.description.as_deref())
        .bind(source.deadline)
        .bind(now)
        .bind(now)
        .execute(&mut *tx)
        .await?;

        let form_id = result.last_insert_rowid();
        save_questions(&mut tx, form_id, &drafts, &HashMap::new()).await?;
        tx.commit().await?;

        debug!("Duplicated form {} as {}", source.id, form_id);
        self.require_form(form_id).await
    }
}

/// Store a draft list as the form's question set.
///
/// Drafts whose key is the id of one of the form's `existing` questions
/// and keep its type update that row in place, so its collected answers
/// survive the edit. Other drafts are inserted, and existing questions no
/// longer listed are deleted along with their answers.
async fn save_questions(
    conn: &mut SqliteConnection,
    form_id: i64,
    drafts: &[QuestionDraft],
    existing: &HashMap<i64, QuestionType>,
) -> Result<(), FormFlowError> {
    let mut resolver = DraftResolver::new();
    let mut kept = HashSet::new();

    for (index, draft) in drafts.iter().enumerate() {
        let condition = resolver.resolve(draft)?;
        let options = if draft.options.is_empty() {
            None
        } else {
            Some(serde_json::to_string(&draft.options)?)
        };
        let condition_value = condition
            .as_ref()
            .map(|c| serde_json::to_string(&c.value))
            .transpose()?;

        let reuse = draft
            .key
            .as_deref()
            .and_then(|key| key.parse::<i64>().ok())
            .filter(|id| {
                existing.get(id) == Some(&draft.question_type) && !kept.contains(id)
            });

        let question_id = match reuse {
            Some(question_id) => {
                sqlx::query(
                    r#"
                    UPDATE questions
                    SET question_type = ?, title = ?, description = ?, options = ?, required = ?,
                        order_index = ?, condition_question_id = ?, condition_operator = ?,
                        condition_value = ?
                    WHERE id = ? AND form_id = ?
                    "#,
                )
                .bind(draft.question_type.as_str())
                .bind(draft.title.trim())
                .bind(draft.description.as_deref())
                .bind(options.as_deref())
                .bind(draft.required)
                .bind(index as i64)
                .bind(condition.as_ref().map(|c| c.question_id))
                .bind(condition.as_ref().map(|c| c.operator.as_str()))
                .bind(condition_value.as_deref())
                .bind(question_id)
                .bind(form_id)
                .execute(&mut *conn)
                .await?;
                question_id
            }
            None => sqlx::query(
                r#"
                INSERT INTO questions
                    (form_id, question_type, title, description, options, required,
                     order_index, condition_question_id, condition_operator, condition_value)
                VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(form_id)
            .bind(draft.question_type.as_str())
            .bind(draft.title.trim())
            .bind(draft.description.as_deref())
            .bind(options.as_deref())
            .bind(draft.required)
            .bind(index as i64)
            .bind(condition.as_ref().map(|c| c.question_id))
            .bind(condition.as_ref().map(|c| c.operator.as_str()))
            .bind(condition_value.as_deref())
            .execute(&mut *conn)
            .await?
            .last_insert_rowid(),
        };

        kept.insert(question_id);
        resolver.record(draft, question_id);
    }

    for stale in existing.keys().filter(|id| !kept.contains(*id)) {
        sqlx::query("DELETE FROM questions WHERE id = ? AND form_id = ?")
            .bind(stale)
            .bind(form_id)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}
