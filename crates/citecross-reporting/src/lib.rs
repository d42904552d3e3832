pub mod builder;
pub mod export;
pub mod types;

pub use builder::{build_report, candidate_cell, status_label};
pub use export::{ExportError, column_widths, export_report};
pub use types::{DEFAULT_OUTPUT_FILE, ExportFormat, Report, ReportRow};
