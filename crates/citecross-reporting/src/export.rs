use std::path::Path;

use rust_xlsxwriter::{Format, Workbook};
use thiserror::Error;

use crate::types::{ExportFormat, Report, SHEET_NAME};

/// Excel's per-cell character limit.
const XLSX_MAX_CELL_CHARS: usize = 32_767;
/// Excel's maximum column width, in characters.
const XLSX_MAX_COLUMN_WIDTH: usize = 255;
const XLSX_MAX_COLUMNS: usize = 16_384;

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
    #[error("spreadsheet error: {0}")]
    Xlsx(#[from] rust_xlsxwriter::XlsxError),
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("report has {0} columns, more than a worksheet can hold")]
    TooManyColumns(usize),
}

/// Write `report` to `path` in the given format.
pub fn export_report(report: &Report, format: ExportFormat, path: &Path) -> Result<(), ExportError> {
    match format {
        ExportFormat::Xlsx => export_xlsx(report, path)?,
        ExportFormat::Csv => std::fs::write(path, export_csv(report))?,
        ExportFormat::Json => std::fs::write(path, export_json(report)?)?,
        ExportFormat::Markdown => std::fs::write(path, export_markdown(report))?,
    }
    tracing::info!(path = %path.display(), format = format.extension(), rows = report.rows.len(), "report written");
    Ok(())
}

/// Column widths sized to the longest value in each column (header
/// included) plus two, capped at Excel's limit.
pub fn column_widths(report: &Report) -> Vec<usize> {
    let mut widths: Vec<usize> = report
        .headers()
        .iter()
        .map(|h| h.chars().count())
        .collect();
    for row in report.table() {
        for (col, cell) in row.iter().enumerate() {
            let len = cell.chars().count();
            if let Some(w) = widths.get_mut(col) {
                *w = (*w).max(len);
            }
        }
    }
    widths
        .into_iter()
        .map(|w| (w + 2).min(XLSX_MAX_COLUMN_WIDTH))
        .collect()
}

fn clamp_cell(cell: &str) -> &str {
    match cell.char_indices().nth(XLSX_MAX_CELL_CHARS) {
        Some((idx, _)) => &cell[..idx],
        None => cell,
    }
}

pub fn export_xlsx(report: &Report, path: &Path) -> Result<(), ExportError> {
    let headers = report.headers();
    if headers.len() > XLSX_MAX_COLUMNS {
        return Err(ExportError::TooManyColumns(headers.len()));
    }

    let mut workbook = Workbook::new();
    let header_format = Format::new().set_bold();
    {
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SHEET_NAME)?;

        for (col, header) in headers.iter().enumerate() {
            worksheet.write_string_with_format(0, col as u16, clamp_cell(header), &header_format)?;
        }
        for (r, row) in report.table().iter().enumerate() {
            let row_num = (r + 1) as u32;
            for (col, cell) in row.iter().enumerate() {
                if !cell.is_empty() {
                    worksheet.write_string(row_num, col as u16, clamp_cell(cell))?;
                }
            }
        }
        for (col, width) in column_widths(report).into_iter().enumerate() {
            worksheet.set_column_width(col as u16, width as f64)?;
        }
    }
    workbook.save(path)?;
    Ok(())
}

fn csv_escape(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') || s.contains('\r') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

pub fn export_csv(report: &Report) -> String {
    let mut out = String::new();
    let line = |cells: &[String]| {
        cells
            .iter()
            .map(|c| csv_escape(c))
            .collect::<Vec<_>>()
            .join(",")
    };
    out.push_str(&line(&report.headers()));
    out.push('\n');
    for row in report.table() {
        out.push_str(&line(&row));
        out.push('\n');
    }
    out
}

pub fn export_json(report: &Report) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(report)?)
}

fn md_escape(s: &str) -> String {
    s.replace('|', "\\|").replace('\n', " ")
}

pub fn export_markdown(report: &Report) -> String {
    let headers = report.headers();
    let mut out = String::from("# Resultados\n\n");
    out.push_str(&format!(
        "| {} |\n",
        headers.iter().map(|h| md_escape(h)).collect::<Vec<_>>().join(" | ")
    ));
    out.push_str(&format!(
        "|{}\n",
        headers.iter().map(|_| "---|").collect::<String>()
    ));
    for row in report.table() {
        out.push_str(&format!(
            "| {} |\n",
            row.iter().map(|c| md_escape(c)).collect::<Vec<_>>().join(" | ")
        ));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ReportRow;

    fn sample() -> Report {
        Report {
            candidate_columns: vec!["tese.pdf".into()],
            rows: vec![
                ReportRow {
                    subject_name: "Ana Costa".into(),
                    status: "Ok".into(),
                    total_matches: 0,
                    cells: vec![String::new()],
                },
                ReportRow {
                    subject_name: "João Silva".into(),
                    status: "1 citação(ões)".into(),
                    total_matches: 1,
                    cells: vec!["SILVA, J.: 1. SILVA, J. \"Estudo\", 2020.".into()],
                },
            ],
        }
    }

    #[test]
    fn test_csv_escape() {
        assert_eq!(csv_escape("hello"), "hello");
        assert_eq!(csv_escape("a,b"), "\"a,b\"");
        assert_eq!(csv_escape(r#"He said "hi""#), r#""He said ""hi""""#);
        assert_eq!(csv_escape("a\nb"), "\"a\nb\"");
    }

    #[test]
    fn test_md_escape_pipe() {
        assert_eq!(md_escape("A | B"), "A \\| B");
    }

    #[test]
    fn test_column_widths_use_longest_value() {
        let widths = column_widths(&sample());
        assert_eq!(widths[0], "João Silva".chars().count() + 2);
        assert_eq!(widths[1], "1 citação(ões)".chars().count() + 2);
        assert_eq!(
            widths[2],
            "SILVA, J.: 1. SILVA, J. \"Estudo\", 2020.".chars().count() + 2
        );
    }

    #[test]
    fn test_column_width_is_capped() {
        let mut report = sample();
        report.rows[0].cells[0] = "x".repeat(1000);
        assert_eq!(column_widths(&report)[2], XLSX_MAX_COLUMN_WIDTH);
    }

    #[test]
    fn test_clamp_cell() {
        let long = "é".repeat(XLSX_MAX_CELL_CHARS + 10);
        assert_eq!(clamp_cell(&long).chars().count(), XLSX_MAX_CELL_CHARS);
        assert_eq!(clamp_cell("curto"), "curto");
    }

    #[test]
    fn test_csv_export() {
        let csv = export_csv(&sample());
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], "Docente,Situação,tese.pdf");
        assert_eq!(lines[1], "Ana Costa,Ok,");
        assert_eq!(
            lines[2],
            "João Silva,1 citação(ões),\"SILVA, J.: 1. SILVA, J. \"\"Estudo\"\", 2020.\""
        );
    }

    #[test]
    fn test_markdown_export() {
        let md = export_markdown(&sample());
        assert!(md.contains("| Docente | Situação | tese.pdf |"));
        assert!(md.contains("|---|---|---|"));
        assert!(md.contains("| Ana Costa | Ok |  |"));
    }

    #[test]
    fn test_json_export() {
        let json = export_json(&sample()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["candidate_columns"][0], "tese.pdf");
        assert_eq!(value["rows"][1]["status"], "1 citação(ões)");
        assert_eq!(value["rows"][1]["total_matches"], 1);
    }
}
