//! Visible-question computation and submission validation.
//!
//! Questions are evaluated in form order. A question whose condition points
//! at a hidden question is itself hidden, so hiding cascades down a chain of
//! dependent questions.

use serde::Serialize;
use std::collections::HashSet;
use thiserror::Error;

use super::question::{AnswerValue, Answers, Question, QuestionType};
use crate::error::FormFlowError;

pub const RATING_MIN: i64 = 1;
pub const RATING_MAX: i64 = 5;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubmissionError {
    #[error("question {0} does not belong to this form")]
    UnknownQuestion(i64),

    #[error("required questions are unanswered: {0:?}")]
    MissingRequired(Vec<i64>),

    #[error("\"{value}\" is not an option of question {question_id}")]
    InvalidChoice { question_id: i64, value: String },

    #[error("question {question_id} expects a single value")]
    UnexpectedList { question_id: i64 },

    #[error("rating for question {question_id} must be a whole number from 1 to 5, got \"{value}\"")]
    InvalidRating { question_id: i64, value: String },
}

impl From<SubmissionError> for FormFlowError {
    fn from(err: SubmissionError) -> Self {
        match err {
            SubmissionError::MissingRequired(ids) => FormFlowError::IncompleteSubmission(ids),
            other => FormFlowError::ValidationError(other.to_string()),
        }
    }
}

/// A visible question together with its 1-based display number.
#[derive(Debug, Clone, Serialize)]
pub struct NumberedQuestion<'a> {
    pub number: usize,
    #[serde(flatten)]
    pub question: &'a Question,
}

pub fn should_show(question: &Question, answers: &Answers, visible: &HashSet<i64>) -> bool {
    match &question.condition {
        None => true,
        Some(condition) => {
            visible.contains(&condition.question_id)
                && condition.is_met(answers.get(&condition.question_id))
        }
    }
}

/// Questions shown for the given answers, in form order.
pub fn visible_questions<'a>(questions: &'a [Question], answers: &Answers) -> Vec<&'a Question> {
    let mut visible_ids = HashSet::new();
    let mut visible = Vec::new();

    for question in questions {
        if should_show(question, answers, &visible_ids) {
            visible_ids.insert(question.id);
            visible.push(question);
        }
    }

    visible
}

pub fn numbered_questions<'a>(
    questions: &'a [Question],
    answers: &Answers,
) -> Vec<NumberedQuestion<'a>> {
    visible_questions(questions, answers)
        .into_iter()
        .enumerate()
        .map(|(index, question)| NumberedQuestion {
            number: index + 1,
            question,
        })
        .collect()
}

/// 1-based position of a question among the visible ones, `None` when hidden.
pub fn question_number(questions: &[Question], answers: &Answers, question_id: i64) -> Option<usize> {
    visible_questions(questions, answers)
        .iter()
        .position(|q| q.id == question_id)
        .map(|index| index + 1)
}

/// Validate a submission against the form's questions.
///
/// Returns the answers to store, in form order: answers to hidden questions
/// and empty answers are dropped.
pub fn validate_submission(
    questions: &[Question],
    answers: &Answers,
) -> Result<Vec<(i64, AnswerValue)>, SubmissionError> {
    let known: HashSet<i64> = questions.iter().map(|q| q.id).collect();
    let mut unknown: Vec<i64> = answers.keys().filter(|id| !known.contains(*id)).copied().collect();
    unknown.sort_unstable();
    if let Some(id) = unknown.first() {
        return Err(SubmissionError::UnknownQuestion(*id));
    }

    let mut missing = Vec::new();
    let mut accepted = Vec::new();

    for question in visible_questions(questions, answers) {
        match answers.get(&question.id) {
            Some(answer) if !answer.is_empty() => {
                check_answer(question, answer)?;
                accepted.push((question.id, answer.clone()));
            }
            _ => {
                if question.required {
                    missing.push(question.id);
                }
            }
        }
    }

    if !missing.is_empty() {
        return Err(SubmissionError::MissingRequired(missing));
    }

    Ok(accepted)
}

fn check_answer(question: &Question, answer: &AnswerValue) -> Result<(), SubmissionError> {
    match question.question_type {
        QuestionType::Single => {
            let value = answer.as_text().ok_or(SubmissionError::UnexpectedList {
                question_id: question.id,
            })?;
            check_option(question, value)
        }
        QuestionType::Multiple => answer
            .values()
            .into_iter()
            .try_for_each(|value| check_option(question, value)),
        QuestionType::Rating => {
            let value = answer.as_text().ok_or(SubmissionError::UnexpectedList {
                question_id: question.id,
            })?;
            match value.trim().parse::<i64>() {
                Ok(rating) if (RATING_MIN..=RATING_MAX).contains(&rating) => Ok(()),
                _ => Err(SubmissionError::InvalidRating {
                    question_id: question.id,
                    value: value.to_string(),
                }),
            }
        }
        QuestionType::ShortText | QuestionType::LongText => match answer {
            AnswerValue::Text(_) => Ok(()),
            AnswerValue::Choices(_) => Err(SubmissionError::UnexpectedList {
                question_id: question.id,
            }),
        },
    }
}

fn check_option(question: &Question, value: &str) -> Result<(), SubmissionError> {
    if question.options.iter().any(|option| option == value) {
        Ok(())
    } else {
        Err(SubmissionError::InvalidChoice {
            question_id: question.id,
            value: value.to_string(),
        })
    }
}
