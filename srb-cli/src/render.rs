//! Output formats for shaped result tables.

use std::io::Write;

use srb_core::ShapedTable;

use crate::CliError;

/// How a [`ShapedTable`] is written to the output stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum OutputFormat {
    /// Aligned plain-text columns.
    Text,
    /// Pretty-printed JSON object.
    Json,
}

pub(crate) fn write_table(
    writer: &mut dyn Write,
    table: &ShapedTable,
    format: OutputFormat,
) -> Result<(), CliError> {
    let payload = match format {
        OutputFormat::Text => text_table(table),
        OutputFormat::Json => {
            let mut json =
                serde_json::to_string_pretty(table).map_err(CliError::SerialiseOutput)?;
            json.push('\n');
            json
        }
    };
    writer
        .write_all(payload.as_bytes())
        .map_err(CliError::WriteOutput)
}

fn column_widths(table: &ShapedTable) -> Vec<usize> {
    let mut widths: Vec<usize> = table
        .columns
        .iter()
        .map(|column| column.chars().count())
        .collect();
    for row in &table.rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }
    widths
}

fn push_line(out: &mut String, cells: &[String], widths: &[usize]) {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths)
        .map(|(cell, &width)| format!("{cell:<width$}"))
        .collect();
    out.push_str(padded.join("  ").trim_end());
    out.push('\n');
}

/// Render `table` as a caption, header, rule and aligned rows.
fn text_table(table: &ShapedTable) -> String {
    let widths = column_widths(table);
    let mut out = format!("{}\n", table.title);
    push_line(&mut out, &table.columns, &widths);
    let rule: Vec<String> = widths.iter().map(|&width| "-".repeat(width)).collect();
    push_line(&mut out, &rule, &widths);
    if table.is_empty() {
        out.push_str("(no rows)\n");
    }
    for row in &table.rows {
        push_line(&mut out, row, &widths);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn table() -> ShapedTable {
        ShapedTable {
            title: "Top".into(),
            columns: vec!["#".into(), "Country".into(), "SRB".into()],
            rows: vec![
                vec!["1".into(), "Azuria".into(), "1.130".into()],
                vec!["2".into(), "Borealia".into(), "1.090".into()],
            ],
        }
    }

    #[rstest]
    fn text_output_aligns_columns() {
        assert_eq!(
            text_table(&table()),
            "Top\n\
             #  Country   SRB\n\
             -  --------  -----\n\
             1  Azuria    1.130\n\
             2  Borealia  1.090\n"
        );
    }

    #[rstest]
    fn empty_tables_say_so() {
        let empty = ShapedTable {
            rows: Vec::new(),
            ..table()
        };
        assert!(text_table(&empty).ends_with("(no rows)\n"));
    }

    #[rstest]
    fn json_output_keeps_row_order() {
        let mut buffer = Vec::new();
        write_table(&mut buffer, &table(), OutputFormat::Json).expect("write json");
        let value: serde_json::Value = serde_json::from_slice(&buffer).expect("parse json");
        assert_eq!(value["rows"][0][1], "Azuria");
        assert_eq!(value["rows"][1][1], "Borealia");
        assert_eq!(value["columns"][0], "#");
    }
}
