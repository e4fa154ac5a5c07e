use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use crate::error::FormFlowError;
use crate::survey::{
    AnswerValue, Answers, ConditionOperator, ConditionValue, Question, QuestionCondition,
    QuestionDraft, QuestionType,
};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// User row including the password hash; never serialized.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct UserCredentials {
    pub id: i64,
    pub email: String,
    pub name: Option<String>,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl UserCredentials {
    pub fn into_user(self) -> User {
        User {
            id: self.id,
            email: self.email,
            name: self.name,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Form {
    pub id: i64,
    pub user_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub is_open: bool,
    pub deadline: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Form {
    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.user_id == user_id
    }

    pub fn deadline_passed(&self, now: DateTime<Utc>) -> bool {
        self.deadline.map_or(false, |deadline| deadline < now)
    }

    pub fn is_accepting_responses(&self, now: DateTime<Utc>) -> bool {
        self.is_open && !self.deadline_passed(now)
    }

    /// Whole days left until the deadline, rounded up. `None` when there is
    /// no deadline or it has already passed.
    pub fn days_until_deadline(&self, now: DateTime<Utc>) -> Option<i64> {
        let remaining = (self.deadline? - now).num_seconds();
        if remaining <= 0 {
            return None;
        }
        Some((remaining + 86_399) / 86_400)
    }
}

/// Listing row: a form with its author's name and response count.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct FormSummary {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub form: Form,
    pub author_name: Option<String>,
    pub response_count: i64,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormDetail {
    #[serde(flatten)]
    pub form: Form,
    pub author_name: Option<String>,
    pub questions: Vec<Question>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewForm {
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_deadline")]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub questions: Vec<QuestionDraft>,
}

/// Parse a client deadline: an RFC 3339 timestamp, a `YYYY-MM-DDTHH:MM`
/// local time taken as UTC, or a bare date, which stays open until the end
/// of that day.
pub fn parse_deadline(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Some(at.with_timezone(&Utc));
    }
    if let Ok(at) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M") {
        return Some(at.and_utc());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(23, 59, 59))
        .map(|at| at.and_utc())
}

fn deserialize_deadline<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => parse_deadline(raw)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("invalid deadline \"{}\"", raw))),
    }
}

/// Form edit. When `title` is present the title, description and deadline
/// are all replaced (an absent description or deadline clears it); `is_open`
/// and `questions` are applied independently when present.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormUpdate {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_deadline")]
    pub deadline: Option<DateTime<Utc>>,
    #[serde(default)]
    pub is_open: Option<bool>,
    #[serde(default)]
    pub questions: Option<Vec<QuestionDraft>>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct QuestionRow {
    pub id: i64,
    pub form_id: i64,
    pub question_type: String,
    pub title: String,
    pub description: Option<String>,
    pub options: Option<String>,
    pub required: bool,
    pub order_index: i64,
    pub condition_question_id: Option<i64>,
    pub condition_operator: Option<String>,
    pub condition_value: Option<String>,
}

impl TryFrom<QuestionRow> for Question {
    type Error = FormFlowError;

    fn try_from(row: QuestionRow) -> Result<Self, Self::Error> {
        let question_type = QuestionType::parse(&row.question_type).ok_or_else(|| {
            FormFlowError::DatabaseError(format!(
                "question {} has unknown type {}",
                row.id, row.question_type
            ))
        })?;

        let options = match row.options.as_deref() {
            Some(raw) if !raw.is_empty() => serde_json::from_str(raw)?,
            _ => Vec::new(),
        };

        let condition = match (row.condition_question_id, row.condition_value.as_deref()) {
            (Some(question_id), Some(raw)) => {
                let value: ConditionValue = serde_json::from_str(raw)?;
                Some(QuestionCondition {
                    question_id,
                    operator: ConditionOperator::parse_or_default(row.condition_operator.as_deref()),
                    value,
                })
            }
            _ => None,
        };

        Ok(Question {
            id: row.id,
            form_id: row.form_id,
            question_type,
            title: row.title,
            description: row.description,
            options,
            required: row.required,
            order_index: row.order_index,
            condition,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ResponseRecord {
    pub id: i64,
    pub form_id: i64,
    pub submitted_at: DateTime<Utc>,
    pub answers: Vec<AnswerDetail>,
}

impl ResponseRecord {
    pub fn answer_map(&self) -> Answers {
        self.answers
            .iter()
            .filter_map(|a| a.value.clone().map(|value| (a.question_id, value)))
            .collect()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerDetail {
    pub question_id: i64,
    pub question_title: String,
    pub question_type: QuestionType,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    pub value: Option<AnswerValue>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AnswerRow {
    pub response_id: i64,
    pub question_id: i64,
    pub answer: Option<String>,
    pub question_title: String,
    pub question_type: String,
    pub question_options: Option<String>,
}

impl TryFrom<AnswerRow> for AnswerDetail {
    type Error = FormFlowError;

    fn try_from(row: AnswerRow) -> Result<Self, Self::Error> {
        let question_type = QuestionType::parse(&row.question_type).ok_or_else(|| {
            FormFlowError::DatabaseError(format!("unknown question type {}", row.question_type))
        })?;
        let options = match row.question_options.as_deref() {
            Some(raw) if !raw.is_empty() => serde_json::from_str(raw)?,
            _ => Vec::new(),
        };

        Ok(AnswerDetail {
            question_id: row.question_id,
            question_title: row.question_title,
            question_type,
            options,
            value: row
                .answer
                .as_deref()
                .map(|raw| AnswerValue::from_storage(raw, question_type)),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[serde(rename_all = "lowercase")]
#[sqlx(rename_all = "lowercase")]
pub enum InvitationStatus {
    Pending,
    Responded,
}

impl InvitationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvitationStatus::Pending => "pending",
            InvitationStatus::Responded => "responded",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Invitation {
    pub id: i64,
    pub form_id: i64,
    pub email: String,
    pub name: Option<String>,
    pub status: InvitationStatus,
    pub sent_at: Option<DateTime<Utc>>,
    pub responded_at: Option<DateTime<Utc>>,
    pub reminder_count: i64,
    pub last_reminder_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Invitation counts keyed by status.
pub type InvitationStats = BTreeMap<String, i64>;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct Template {
    pub id: i64,
    pub user_id: Option<i64>,
    pub name: String,
    pub description: Option<String>,
    pub category: String,
    #[sqlx(json)]
    pub questions: Vec<QuestionDraft>,
    pub is_preset: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewTemplate {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    pub questions: Vec<QuestionDraft>,
}
