use std::path::Path;
use std::str::FromStr;

use serde::Serialize;

pub const SUBJECT_HEADER: &str = "Docente";
pub const STATUS_HEADER: &str = "Situação";
pub const SHEET_NAME: &str = "Resultados";
pub const DEFAULT_OUTPUT_FILE: &str = "resultados_comparacao_docentes.xlsx";

/// Output format for [`export_report`](crate::export_report).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    Xlsx,
    Csv,
    Json,
    Markdown,
}

impl ExportFormat {
    pub fn all() -> &'static [ExportFormat] {
        &[
            ExportFormat::Xlsx,
            ExportFormat::Csv,
            ExportFormat::Json,
            ExportFormat::Markdown,
        ]
    }

    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Xlsx => "xlsx",
            ExportFormat::Csv => "csv",
            ExportFormat::Json => "json",
            ExportFormat::Markdown => "md",
        }
    }

    /// Infer the format from a file extension, if it is a known one.
    pub fn from_path(path: &Path) -> Option<ExportFormat> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(|e| e.parse().ok())
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "xlsx" | "excel" => Ok(ExportFormat::Xlsx),
            "csv" => Ok(ExportFormat::Csv),
            "json" => Ok(ExportFormat::Json),
            "md" | "markdown" => Ok(ExportFormat::Markdown),
            other => Err(format!(
                "unknown export format '{other}' (expected xlsx, csv, json or md)"
            )),
        }
    }
}

/// One row per subject.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub subject_name: String,
    pub status: String,
    pub total_matches: usize,
    /// One summary per candidate column; empty when nothing matched there.
    pub cells: Vec<String>,
}

/// The full table handed to an export sink.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report {
    pub candidate_columns: Vec<String>,
    pub rows: Vec<ReportRow>,
}

impl Report {
    pub fn headers(&self) -> Vec<String> {
        let mut headers = vec![SUBJECT_HEADER.to_string(), STATUS_HEADER.to_string()];
        headers.extend(self.candidate_columns.iter().cloned());
        headers
    }

    /// Body rows as plain cell strings, aligned with [`headers`](Self::headers).
    pub fn table(&self) -> Vec<Vec<String>> {
        self.rows
            .iter()
            .map(|row| {
                let mut cells = vec![row.subject_name.clone(), row.status.clone()];
                cells.extend(row.cells.iter().cloned());
                cells
            })
            .collect()
    }
}
