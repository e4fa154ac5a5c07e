//! Survey engine: question model, display conditions, visibility and
//! submission validation, and results aggregation.

pub mod condition;
pub mod draft;
pub mod question;
pub mod results;
pub mod visibility;

pub use draft::{validate_drafts, ConditionDraft, DraftResolver, QuestionDraft};
pub use question::{
    AnswerValue, Answers, ConditionOperator, ConditionValue, Question, QuestionCondition,
    QuestionType,
};
pub use results::{summarize, FormResults, QuestionStats};
pub use visibility::{
    numbered_questions, question_number, validate_submission, visible_questions,
    NumberedQuestion, SubmissionError,
};
