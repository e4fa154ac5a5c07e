//! Question, condition and answer types shared by the visibility and
//! aggregation engines.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

/// Answers keyed by question id.
pub type Answers = HashMap<i64, AnswerValue>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    ShortText,
    LongText,
    Single,
    Multiple,
    Rating,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::ShortText => "short_text",
            QuestionType::LongText => "long_text",
            QuestionType::Single => "single",
            QuestionType::Multiple => "multiple",
            QuestionType::Rating => "rating",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "short_text" => Some(QuestionType::ShortText),
            "long_text" => Some(QuestionType::LongText),
            "single" => Some(QuestionType::Single),
            "multiple" => Some(QuestionType::Multiple),
            "rating" => Some(QuestionType::Rating),
            _ => None,
        }
    }

    pub fn is_choice(&self) -> bool {
        matches!(self, QuestionType::Single | QuestionType::Multiple)
    }

    pub fn is_text(&self) -> bool {
        matches!(self, QuestionType::ShortText | QuestionType::LongText)
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConditionOperator {
    #[default]
    Equals,
    Contains,
    GreaterThan,
    LessThan,
}

impl ConditionOperator {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConditionOperator::Equals => "equals",
            ConditionOperator::Contains => "contains",
            ConditionOperator::GreaterThan => "greater_than",
            ConditionOperator::LessThan => "less_than",
        }
    }

    /// Unknown operators fall back to `equals`.
    pub fn parse_or_default(s: Option<&str>) -> Self {
        match s {
            Some("contains") => ConditionOperator::Contains,
            Some("greater_than") => ConditionOperator::GreaterThan,
            Some("less_than") => ConditionOperator::LessThan,
            _ => ConditionOperator::Equals,
        }
    }
}

/// Target value of a condition: a single value, or a list for conditions on
/// multiple-choice questions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
#[serde(try_from = "Value")]
pub enum ConditionValue {
    One(String),
    Many(Vec<String>),
}

impl ConditionValue {
    pub fn targets(&self) -> Vec<&str> {
        match self {
            ConditionValue::One(v) => vec![v.as_str()],
            ConditionValue::Many(vs) => vs.iter().map(String::as_str).collect(),
        }
    }

    pub fn is_blank(&self) -> bool {
        self.targets().iter().all(|t| t.trim().is_empty())
    }
}

impl TryFrom<Value> for ConditionValue {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Array(items) => items
                .into_iter()
                .map(scalar_to_string)
                .collect::<Result<Vec<_>, _>>()
                .map(ConditionValue::Many),
            other => scalar_to_string(other).map(ConditionValue::One),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionCondition {
    pub question_id: i64,
    #[serde(default)]
    pub operator: ConditionOperator,
    pub value: ConditionValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub form_id: i64,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub title: String,
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    pub required: bool,
    pub order_index: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<QuestionCondition>,
}

/// A submitted answer: free text (also used for single choice and rating)
/// or a list of selected options.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
#[serde(try_from = "Value")]
pub enum AnswerValue {
    Text(String),
    Choices(Vec<String>),
}

impl AnswerValue {
    pub fn is_empty(&self) -> bool {
        match self {
            AnswerValue::Text(t) => t.trim().is_empty(),
            AnswerValue::Choices(c) => c.is_empty(),
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            AnswerValue::Text(t) => Some(t),
            AnswerValue::Choices(_) => None,
        }
    }

    /// All selected values; a text answer is a single value.
    pub fn values(&self) -> Vec<&str> {
        match self {
            AnswerValue::Text(t) => vec![t.as_str()],
            AnswerValue::Choices(c) => c.iter().map(String::as_str).collect(),
        }
    }

    /// Encode for the `answers.answer` column: choice lists become a JSON
    /// array, everything else is stored verbatim.
    pub fn to_storage(&self) -> String {
        match self {
            AnswerValue::Text(t) => t.clone(),
            AnswerValue::Choices(c) => {
                serde_json::to_string(c).unwrap_or_else(|_| String::from("[]"))
            }
        }
    }

    /// Decode a stored answer. Multiple-choice answers that are not a JSON
    /// array are treated as a single selection.
    pub fn from_storage(raw: &str, question_type: QuestionType) -> Self {
        if question_type == QuestionType::Multiple {
            match serde_json::from_str::<Vec<String>>(raw) {
                Ok(values) => AnswerValue::Choices(values),
                Err(_) if raw.is_empty() => AnswerValue::Choices(Vec::new()),
                Err(_) => AnswerValue::Choices(vec![raw.to_string()]),
            }
        } else {
            AnswerValue::Text(raw.to_string())
        }
    }

    /// Human readable rendering used by exports.
    pub fn display(&self) -> String {
        match self {
            AnswerValue::Text(t) => t.clone(),
            AnswerValue::Choices(c) => c.join(", "),
        }
    }
}

impl TryFrom<Value> for AnswerValue {
    type Error = String;

    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Null => Ok(AnswerValue::Text(String::new())),
            Value::Array(items) => items
                .into_iter()
                .map(scalar_to_string)
                .collect::<Result<Vec<_>, _>>()
                .map(AnswerValue::Choices),
            other => scalar_to_string(other).map(AnswerValue::Text),
        }
    }
}

fn scalar_to_string(value: Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(format!("expected a string or number, found {}", other)),
    }
}
