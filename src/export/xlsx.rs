use rust_xlsxwriter::{Format, Workbook, XlsxError};

use super::ExportTable;
use crate::error::FormFlowError;

const SHEET_NAME: &str = "Responses";

impl From<XlsxError> for FormFlowError {
    fn from(err: XlsxError) -> Self {
        FormFlowError::ExportError(err.to_string())
    }
}

pub fn to_xlsx(table: &ExportTable) -> Result<Vec<u8>, FormFlowError> {
    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();

    let worksheet = workbook.add_worksheet();
    worksheet.set_name(SHEET_NAME)?;

    for (col, header) in table.headers.iter().enumerate() {
        let col = col as u16;
        worksheet.write_string_with_format(0, col, header, &header_format)?;
        worksheet.set_column_width(col, column_width(table, col as usize))?;
    }

    for (r, row) in table.rows.iter().enumerate() {
        for (col, value) in row.iter().enumerate() {
            worksheet.write_string(r as u32 + 1, col as u16, value)?;
        }
    }

    Ok(workbook.save_to_buffer()?)
}

fn column_width(table: &ExportTable, col: usize) -> f64 {
    let longest = std::iter::once(&table.headers[col])
        .chain(table.rows.iter().filter_map(|row| row.get(col)))
        .map(|value| value.chars().count())
        .max()
        .unwrap_or(0);
    (longest.clamp(10, 60) + 2) as f64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_to_xlsx_produces_zip() {
        let table = ExportTable {
            headers: vec!["Submitted At".into(), "Name".into()],
            rows: vec![vec!["2024-05-01 09:30:00".into(), "Kim".into()]],
        };
        let bytes = to_xlsx(&table).unwrap();
        // xlsx files are zip archives
        assert_eq!(&bytes[..2], b"PK");
    }
}
