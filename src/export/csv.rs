use super::ExportTable;

/// UTF-8 byte order mark so spreadsheet applications detect the encoding.
const BOM: &str = "\u{feff}";

pub fn to_csv(table: &ExportTable) -> String {
    let mut out = String::from(BOM);
    push_row(&mut out, &table.headers);
    for row in &table.rows {
        push_row(&mut out, row);
    }
    out
}

fn push_row(out: &mut String, fields: &[String]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        out.push_str(&escape_field(field));
    }
    out.push_str("\r\n");
}

/// Every field is quoted; embedded quotes are doubled.
fn escape_field(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}
