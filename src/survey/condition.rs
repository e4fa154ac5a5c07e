//! Display-condition evaluation.

use super::question::{AnswerValue, ConditionOperator, QuestionCondition};

impl QuestionCondition {
    /// Whether the condition holds for the answer given to the referenced
    /// question. A missing or empty answer never satisfies a condition.
    pub fn is_met(&self, answer: Option<&AnswerValue>) -> bool {
        let answer = match answer {
            Some(answer) if !answer.is_empty() => answer,
            _ => return false,
        };

        let targets = self.value.targets();
        if targets.is_empty() {
            return false;
        }

        match self.operator {
            ConditionOperator::Equals => match answer {
                AnswerValue::Text(text) => targets.iter().any(|t| text == t),
                AnswerValue::Choices(selected) => targets
                    .iter()
                    .all(|t| selected.iter().any(|s| s == t)),
            },
            ConditionOperator::Contains => match answer {
                AnswerValue::Text(text) => targets.iter().any(|t| text.contains(t)),
                AnswerValue::Choices(selected) => targets
                    .iter()
                    .any(|t| selected.iter().any(|s| s == t)),
            },
            ConditionOperator::GreaterThan => {
                compare_numbers(answer, targets[0]).map_or(false, |(a, b)| a > b)
            }
            ConditionOperator::LessThan => {
                compare_numbers(answer, targets[0]).map_or(false, |(a, b)| a < b)
            }
        }
    }
}

fn compare_numbers(answer: &AnswerValue, target: &str) -> Option<(f64, f64)> {
    let lhs = answer.as_text()?.trim().parse::<f64>().ok()?;
    let rhs = target.trim().parse::<f64>().ok()?;
    Some((lhs, rhs))
}
