//! Per-question statistics over a form's responses.

use serde::Serialize;
use std::collections::BTreeMap;

use super::question::{Answers, Question, QuestionType};
use super::visibility::{RATING_MAX, RATING_MIN};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionStats {
    pub id: i64,
    pub title: String,
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    /// Respondents who answered this question.
    pub total_responses: usize,
    /// `total_responses` as a percentage of all responses.
    pub response_rate: f64,
    pub answer_count: BTreeMap<String, usize>,
    pub answer_percentage: BTreeMap<String, f64>,
    pub text_answers: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub average: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FormResults {
    pub response_count: usize,
    pub question_count: usize,
    /// Answered cells over all (question, response) cells, rounded percent.
    pub completion_rate: u32,
    pub questions: Vec<QuestionStats>,
}

pub fn summarize(questions: &[Question], responses: &[Answers]) -> FormResults {
    let stats: Vec<QuestionStats> = questions
        .iter()
        .map(|question| question_stats(question, responses))
        .collect();

    let answered: usize = stats.iter().map(|s| s.total_responses).sum();
    let cells = questions.len() * responses.len();
    let completion_rate = if cells == 0 {
        0
    } else {
        (answered as f64 / cells as f64 * 100.0).round() as u32
    };

    FormResults {
        response_count: responses.len(),
        question_count: questions.len(),
        completion_rate,
        questions: stats,
    }
}

pub fn question_stats(question: &Question, responses: &[Answers]) -> QuestionStats {
    let answers: Vec<_> = responses
        .iter()
        .filter_map(|response| response.get(&question.id))
        .filter(|answer| !answer.is_empty())
        .collect();

    let total = answers.len();
    let mut answer_count: BTreeMap<String, usize> = BTreeMap::new();
    let mut text_answers = Vec::new();
    let mut average = None;

    match question.question_type {
        QuestionType::Single | QuestionType::Multiple => {
            for option in &question.options {
                answer_count.insert(option.clone(), 0);
            }
            for answer in &answers {
                for value in answer.values() {
                    *answer_count.entry(value.to_string()).or_insert(0) += 1;
                }
            }
        }
        QuestionType::Rating => {
            for rating in RATING_MIN..=RATING_MAX {
                answer_count.insert(rating.to_string(), 0);
            }
            let mut sum = 0.0;
            let mut numeric = 0usize;
            for answer in &answers {
                for value in answer.values() {
                    let value = value.trim();
                    *answer_count.entry(value.to_string()).or_insert(0) += 1;
                    if let Ok(n) = value.parse::<f64>() {
                        sum += n;
                        numeric += 1;
                    }
                }
            }
            if numeric > 0 {
                average = Some(sum / numeric as f64);
            }
        }
        QuestionType::ShortText | QuestionType::LongText => {
            text_answers = answers.iter().map(|answer| answer.display()).collect();
        }
    }

    let answer_percentage = answer_count
        .iter()
        .map(|(value, count)| (value.clone(), percentage(*count, total)))
        .collect();

    QuestionStats {
        id: question.id,
        title: question.title.clone(),
        question_type: question.question_type,
        options: question.options.clone(),
        total_responses: total,
        response_rate: percentage(total, responses.len()),
        answer_count,
        answer_percentage,
        text_answers,
        average,
    }
}

fn percentage(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}
