//! Question drafts: the question shape clients send when saving a form or a
//! template, before database ids exist.
//!
//! Drafts carry an optional client-side `id` so that a condition can point at
//! an earlier draft in the same list. When the drafts are stored, those keys
//! are resolved to the newly assigned question ids.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use std::collections::{HashMap, HashSet};

use super::question::{ConditionOperator, ConditionValue, Question, QuestionCondition, QuestionType};
use crate::error::FormFlowError;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionDraft {
    #[serde(
        default,
        rename = "id",
        deserialize_with = "opt_string_or_number",
        skip_serializing_if = "Option::is_none"
    )]
    pub key: Option<String>,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub condition: Option<ConditionDraft>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConditionDraft {
    #[serde(alias = "questionId", deserialize_with = "string_or_number")]
    pub question_id: String,
    #[serde(default)]
    pub operator: ConditionOperator,
    pub value: ConditionValue,
}

/// Check a draft list before it is stored.
pub fn validate_drafts(drafts: &[QuestionDraft]) -> Result<(), FormFlowError> {
    let mut earlier: HashSet<&str> = HashSet::new();

    for (index, draft) in drafts.iter().enumerate() {
        let position = index + 1;

        if draft.title.trim().is_empty() {
            return Err(FormFlowError::validation(format!(
                "question {} needs a title",
                position
            )));
        }

        if draft.question_type.is_choice()
            && !draft.options.iter().any(|option| !option.trim().is_empty())
        {
            return Err(FormFlowError::validation(format!(
                "question {} needs at least one option",
                position
            )));
        }

        if let Some(condition) = &draft.condition {
            if !earlier.contains(condition.question_id.as_str()) {
                return Err(FormFlowError::validation(format!(
                    "question {} has a condition that does not reference an earlier question",
                    position
                )));
            }
            if condition.value.is_blank() {
                return Err(FormFlowError::validation(format!(
                    "question {} has a condition without a value",
                    position
                )));
            }
        }

        if let Some(key) = &draft.key {
            if !earlier.insert(key.as_str()) {
                return Err(FormFlowError::validation(format!(
                    "question id \"{}\" is used more than once",
                    key
                )));
            }
        }
    }

    Ok(())
}

/// Maps draft keys to stored question ids while a draft list is inserted.
#[derive(Debug, Default)]
pub struct DraftResolver {
    ids: HashMap<String, i64>,
}

impl DraftResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, draft: &QuestionDraft, question_id: i64) {
        if let Some(key) = &draft.key {
            self.ids.insert(key.clone(), question_id);
        }
    }

    pub fn resolve(&self, draft: &QuestionDraft) -> Result<Option<QuestionCondition>, FormFlowError> {
        let Some(condition) = &draft.condition else {
            return Ok(None);
        };

        let question_id = self.ids.get(&condition.question_id).copied().ok_or_else(|| {
            FormFlowError::validation(format!(
                "condition references unknown question \"{}\"",
                condition.question_id
            ))
        })?;

        Ok(Some(QuestionCondition {
            question_id,
            operator: condition.operator,
            value: condition.value.clone(),
        }))
    }
}

impl Question {
    /// Draft form of a stored question, keyed by its current id.
    pub fn to_draft(&self) -> QuestionDraft {
        QuestionDraft {
            key: Some(self.id.to_string()),
            question_type: self.question_type,
            title: self.title.clone(),
            description: self.description.clone(),
            options: self.options.clone(),
            required: self.required,
            condition: self.condition.as_ref().map(|c| ConditionDraft {
                question_id: c.question_id.to_string(),
                operator: c.operator,
                value: c.value.clone(),
            }),
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(s) => Ok(s),
        Value::Number(n) => Ok(n.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number id, found {}",
            other
        ))),
    }
}

fn opt_string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        Value::String(s) => Ok(Some(s)),
        Value::Number(n) => Ok(Some(n.to_string())),
        other => Err(serde::de::Error::custom(format!(
            "expected a string or number id, found {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn drafts(value: serde_json::Value) -> Vec<QuestionDraft> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_accepts_numeric_and_string_ids() {
        let list = drafts(json!([
            {"id": 1, "type": "single", "title": "Coming?", "options": ["Yes", "No"], "required": true},
            {"id": "q2", "type": "short_text", "title": "Diet",
             "condition": {"questionId": 1, "operator": "equals", "value": "Yes"}}
        ]));
        assert_eq!(list[0].key.as_deref(), Some("1"));
        assert_eq!(list[1].key.as_deref(), Some("q2"));
        assert_eq!(list[1].condition.as_ref().unwrap().question_id, "1");
        assert!(validate_drafts(&list).is_ok());
    }

    #[test]
    fn test_condition_must_reference_earlier_question() {
        let forward = drafts(json!([
            {"id": "a", "type": "short_text", "title": "First",
             "condition": {"question_id": "b", "value": "x"}},
            {"id": "b", "type": "short_text", "title": "Second"}
        ]));
        assert!(validate_drafts(&forward).is_err());

        let self_ref = drafts(json!([
            {"id": "a", "type": "short_text", "title": "Only",
             "condition": {"question_id": "a", "value": "x"}}
        ]));
        assert!(validate_drafts(&self_ref).is_err());
    }

    #[test]
    fn test_rejects_blank_title_missing_options_and_duplicate_ids() {
        let blank = drafts(json!([{"type": "short_text", "title": "  "}]));
        assert!(validate_drafts(&blank).is_err());

        let no_options = drafts(json!([{"type": "single", "title": "Pick", "options": ["", " "]}]));
        assert!(validate_drafts(&no_options).is_err());

        let dup = drafts(json!([
            {"id": 1, "type": "short_text", "title": "A"},
            {"id": 1, "type": "short_text", "title": "B"}
        ]));
        assert!(validate_drafts(&dup).is_err());
    }

    #[test]
    fn test_resolver_maps_keys_to_new_ids() {
        let list = drafts(json!([
            {"id": "7", "type": "rating", "title": "Score"},
            {"type": "long_text", "title": "Why so low?",
             "condition": {"question_id": "7", "operator": "less_than", "value": 3}}
        ]));

        let mut resolver = DraftResolver::new();
        assert_eq!(resolver.resolve(&list[0]).unwrap(), None);
        resolver.record(&list[0], 120);

        let condition = resolver.resolve(&list[1]).unwrap().unwrap();
        assert_eq!(condition.question_id, 120);
        assert_eq!(condition.operator, ConditionOperator::LessThan);
        assert_eq!(condition.value.targets(), vec!["3"]);
    }

    #[test]
    fn test_question_round_trips_through_draft() {
        let question = Question {
            id: 15,
            form_id: 2,
            question_type: QuestionType::Multiple,
            title: "Toppings".into(),
            description: Some("Pick any".into()),
            options: vec!["Cheese".into(), "Olives".into()],
            required: false,
            order_index: 1,
            condition: Some(QuestionCondition {
                question_id: 14,
                operator: ConditionOperator::Equals,
                value: ConditionValue::One("Pizza".into()),
            }),
        };

        let draft = question.to_draft();
        assert_eq!(draft.key.as_deref(), Some("15"));
        assert_eq!(draft.condition.as_ref().unwrap().question_id, "14");
        assert_eq!(draft.options, question.options);
    }
}
