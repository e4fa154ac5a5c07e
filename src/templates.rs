//! Preset template catalogue, seeded into an empty database at startup.

use tracing::{debug, info};

use crate::database::models::NewTemplate;
use crate::database::Database;
use crate::error::FormFlowError;
use crate::survey::{
    validate_drafts, ConditionDraft, ConditionOperator, ConditionValue, QuestionDraft,
    QuestionType,
};

fn question(
    key: &str,
    question_type: QuestionType,
    title: &str,
    options: &[&str],
    required: bool,
) -> QuestionDraft {
    QuestionDraft {
        key: Some(key.to_string()),
        question_type,
        title: title.to_string(),
        description: None,
        options: options.iter().map(|o| o.to_string()).collect(),
        required,
        condition: None,
    }
}

/// Show `draft` only when question `key` was answered with `value`.
fn shown_when(mut draft: QuestionDraft, key: &str, value: &str) -> QuestionDraft {
    draft.condition = Some(ConditionDraft {
        question_id: key.to_string(),
        operator: ConditionOperator::Equals,
        value: ConditionValue::One(value.to_string()),
    });
    draft
}

fn template(name: &str, description: &str, category: &str, questions: Vec<QuestionDraft>) -> NewTemplate {
    NewTemplate {
        name: name.to_string(),
        description: Some(description.to_string()),
        category: Some(category.to_string()),
        questions,
    }
}

pub fn preset_templates() -> Vec<NewTemplate> {
    use QuestionType::*;

    const PARTY_SIZES: &[&str] = &["1 person", "2 people", "3 people", "4 or more"];

    vec![
        template(
            "Customer Satisfaction Survey",
            "Measure how satisfied customers are with a product or service.",
            "customer_satisfaction",
            vec![
                question("1", Rating, "Overall, how satisfied are you with our service?", &[], true),
                question(
                    "2",
                    Single,
                    "How did you hear about us?",
                    &["Friend or colleague", "Search engine", "Social media", "Advertisement", "Other"],
                    true,
                ),
                question(
                    "3",
                    Multiple,
                    "What did you like most? Select all that apply.",
                    &["Friendly staff", "Fast turnaround", "Fair pricing", "Range of services", "Ease of use"],
                    false,
                ),
                question("4", ShortText, "Is there anything we should improve?", &[], false),
                question("5", LongText, "Tell us about your experience in your own words.", &[], false),
            ],
        ),
        template(
            "Event Attendance",
            "Confirm who will attend an event.",
            "event_attendance",
            vec![
                question("1", Single, "Will you attend this event?", &["Attending", "Not attending", "Not sure"], true),
                shown_when(
                    question(
                        "2",
                        Single,
                        "Which time slot do you prefer?",
                        &["Morning (9-12)", "Afternoon (12-6)", "Evening (6-9)"],
                        false,
                    ),
                    "1",
                    "Attending",
                ),
                shown_when(
                    question("3", Multiple, "How many people are coming with you?", PARTY_SIZES, false),
                    "1",
                    "Attending",
                ),
                shown_when(
                    question("4", ShortText, "Any dietary restrictions?", &[], false),
                    "1",
                    "Attending",
                ),
            ],
        ),
        template(
            "Employee Satisfaction Survey",
            "Collect employee feedback on work and workplace.",
            "employee_satisfaction",
            vec![
                question("1", Rating, "How satisfied are you with your work environment?", &[], true),
                question("2", Rating, "How satisfied are you with pay and benefits?", &[], true),
                question("3", Rating, "How satisfied are you with your work-life balance?", &[], true),
                question("4", Rating, "How satisfied are you with leadership?", &[], true),
                question(
                    "5",
                    Multiple,
                    "Which areas need the most improvement? Select all that apply.",
                    &["Communication", "Processes", "Benefits", "Career development", "Work-life balance", "Salary"],
                    false,
                ),
                question("6", LongText, "Any suggestions for improving the company?", &[], false),
            ],
        ),
        template(
            "Product Feedback",
            "Gather feedback on how a product is used and perceived.",
            "product_feedback",
            vec![
                question(
                    "1",
                    Single,
                    "How often do you use this product?",
                    &["Daily", "Once or twice a week", "Once or twice a month", "Rarely"],
                    true,
                ),
                question("2", Rating, "How satisfied are you with the product's quality?", &[], true),
                question(
                    "3",
                    Multiple,
                    "Which features do you like? Select all that apply.",
                    &["Ease of use", "Design", "Performance", "Price", "Support", "Durability"],
                    false,
                ),
                question(
                    "4",
                    Single,
                    "Would you recommend this product to others?",
                    &["Definitely", "Probably", "Neutral", "Probably not", "Definitely not"],
                    true,
                ),
                question("5", ShortText, "Which feature would you most like improved?", &[], false),
            ],
        ),
        template(
            "Course Evaluation",
            "Evaluate student satisfaction with a class or lecture.",
            "course_evaluation",
            vec![
                question("1", Rating, "How satisfied are you with the course content?", &[], true),
                question("2", Rating, "How satisfied are you with the instructor's explanations?", &[], true),
                question("3", Rating, "How satisfied are you with the course materials?", &[], true),
                question("4", Rating, "Was the difficulty level appropriate?", &[], true),
                question(
                    "5",
                    Multiple,
                    "What helped you most? Select all that apply.",
                    &["Lectures", "Hands-on examples", "Q&A sessions", "Assignments", "Extra materials"],
                    false,
                ),
                question("6", LongText, "How could this course be improved?", &[], false),
            ],
        ),
        template(
            "Wedding RSVP",
            "Collect RSVPs for a wedding invitation.",
            "wedding_rsvp",
            vec![
                question("1", Single, "Will you attend the wedding?", &["Joyfully accepts", "Regretfully declines"], true),
                question("2", ShortText, "Your name", &[], true),
                question("3", ShortText, "Your phone number", &[], true),
                shown_when(
                    question("4", Multiple, "How many people will attend?", PARTY_SIZES, true),
                    "1",
                    "Joyfully accepts",
                ),
                shown_when(
                    question(
                        "5",
                        Multiple,
                        "Any dietary restrictions?",
                        &["None", "Vegetarian", "Gluten free", "Nut allergy", "Seafood allergy", "Other"],
                        false,
                    ),
                    "1",
                    "Joyfully accepts",
                ),
                shown_when(
                    question("6", LongText, "A message for the couple", &[], false),
                    "1",
                    "Joyfully accepts",
                ),
            ],
        ),
    ]
}

/// Insert the preset catalogue unless presets already exist. Returns the
/// number of templates inserted.
pub async fn seed_preset_templates(database: &Database) -> Result<usize, FormFlowError> {
    if database.count_preset_templates().await? > 0 {
        debug!("Preset templates already present");
        return Ok(0);
    }

    let presets = preset_templates();
    for preset in &presets {
        validate_drafts(&preset.questions)?;
        database.create_template(None, preset, true).await?;
    }

    info!("Seeded {} preset templates", presets.len());
    Ok(presets.len())
}
