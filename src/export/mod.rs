//! Response export as CSV or Excel workbook.

pub mod csv;
pub mod xlsx;

use serde::Deserialize;

use crate::database::models::ResponseRecord;
use crate::error::FormFlowError;
use crate::survey::Question;

pub const SUBMITTED_AT_HEADER: &str = "Submitted At";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Xlsx,
}

impl ExportFormat {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "csv" => Some(ExportFormat::Csv),
            "xlsx" | "excel" => Some(ExportFormat::Xlsx),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "csv",
            ExportFormat::Xlsx => "xlsx",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Csv => "text/csv; charset=utf-8",
            ExportFormat::Xlsx => {
                "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"
            }
        }
    }
}

/// One header row plus one row per response. Columns follow question order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl ExportTable {
    pub fn build(questions: &[Question], responses: &[ResponseRecord]) -> Self {
        let mut headers = Vec::with_capacity(questions.len() + 1);
        headers.push(SUBMITTED_AT_HEADER.to_string());
        headers.extend(questions.iter().map(|q| q.title.clone()));

        let rows = responses
            .iter()
            .map(|response| {
                let answers = response.answer_map();
                let mut row = Vec::with_capacity(headers.len());
                row.push(response.submitted_at.format("%Y-%m-%d %H:%M:%S").to_string());
                row.extend(questions.iter().map(|q| {
                    answers.get(&q.id).map(|a| a.display()).unwrap_or_default()
                }));
                row
            })
            .collect();

        Self { headers, rows }
    }
}

pub fn render(format: ExportFormat, table: &ExportTable) -> Result<Vec<u8>, FormFlowError> {
    match format {
        ExportFormat::Csv => Ok(csv::to_csv(table).into_bytes()),
        ExportFormat::Xlsx => xlsx::to_xlsx(table),
    }
}

/// Download name for a form export, reduced to characters safe in a
/// `Content-Disposition` header.
pub fn file_name(form_title: &str, format: ExportFormat) -> String {
    let stem: String = form_title
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    let stem = stem.trim_matches('_');
    let stem = if stem.is_empty() { "responses" } else { stem };
    format!("{}_responses.{}", stem, format.extension())
}
