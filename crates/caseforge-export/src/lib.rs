//! Caseforge Export
//!
//! Presentation of test-case records outside the service:
//!
//! - File writers: CSV, XLSX, paginated PDF table, plain text
//! - Issue-tracker export: Jira issues, optionally with linked Zephyr Scale test cases
//!
//! # Examples
//!
//! ```
//! use caseforge_domain::TestCaseRecord;
//! use caseforge_export::{export, ExportFormat};
//!
//! let records = vec![TestCaseRecord::new("Verify login succeeds")];
//! let format = ExportFormat::from_name("csv").unwrap();
//! let bytes = export(&records, format).unwrap();
//! assert!(String::from_utf8(bytes).unwrap().starts_with("test_case_id,"));
//! ```

#![warn(missing_docs)]

mod error;
mod pdf;
mod text;
mod tracker;
mod xlsx;

use caseforge_domain::TestCaseRecord;

pub use error::ExportError;
pub use tracker::{
    export_to_tracker, issue_description, JiraClient, ZephyrClient, ZEPHYR_API_BASE,
};

/// Columns of every tabular export, in order
pub const EXPORT_HEADERS: [&str; 8] = [
    "test_case_id",
    "requirement_id",
    "description",
    "test_type",
    "priority",
    "rtm_compliance_mapping",
    "steps",
    "expected_result",
];

/// Downloadable file formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    /// Comma-separated values
    Csv,
    /// Office Open XML spreadsheet
    Xlsx,
    /// Landscape PDF table
    Pdf,
    /// Plain text
    Txt,
}

impl ExportFormat {
    /// Parse a format name as used in `?format=`
    pub fn from_name(name: &str) -> Result<Self, ExportError> {
        match name.trim().to_ascii_lowercase().as_str() {
            "csv" => Ok(Self::Csv),
            "xlsx" => Ok(Self::Xlsx),
            "pdf" => Ok(Self::Pdf),
            "txt" => Ok(Self::Txt),
            other => Err(ExportError::UnknownFormat(other.to_string())),
        }
    }

    /// File extension without the dot
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Csv => "csv",
            Self::Xlsx => "xlsx",
            Self::Pdf => "pdf",
            Self::Txt => "txt",
        }
    }

    /// MIME type of the produced bytes
    pub fn content_type(&self) -> &'static str {
        match self {
            Self::Csv => "text/csv; charset=utf-8",
            Self::Xlsx => "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
            Self::Pdf => "application/pdf",
            Self::Txt => "text/plain; charset=utf-8",
        }
    }

    /// Download file name
    pub fn file_name(&self) -> String {
        format!("test-cases.{}", self.extension())
    }
}

/// Render records in the given format
pub fn export(records: &[TestCaseRecord], format: ExportFormat) -> Result<Vec<u8>, ExportError> {
    match format {
        ExportFormat::Csv => text::write_csv(records),
        ExportFormat::Xlsx => xlsx::write_xlsx(records),
        ExportFormat::Pdf => pdf::write_pdf(records),
        ExportFormat::Txt => Ok(text::write_txt(records)),
    }
}

/// Cell text for one column; steps are newline-joined and blanks become "N/A"
pub fn cell_value(record: &TestCaseRecord, header: &str) -> String {
    let value = if header == "steps" {
        record.steps.join("\n")
    } else {
        record.scalar_field(header).unwrap_or_default().to_string()
    };

    if value.trim().is_empty() {
        "N/A".to_string()
    } else {
        value
    }
}

/// "test_case_id" → "Test Case Id"
pub fn header_title(header: &str) -> String {
    header
        .split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_names() {
        assert_eq!(ExportFormat::from_name("CSV").unwrap(), ExportFormat::Csv);
        assert_eq!(ExportFormat::from_name("pdf").unwrap().file_name(), "test-cases.pdf");
        assert!(matches!(
            ExportFormat::from_name("docx"),
            Err(ExportError::UnknownFormat(_))
        ));
    }

    #[test]
    fn test_cell_values() {
        let record = TestCaseRecord::new("Verify login")
            .with_steps(vec!["Open page".to_string(), "Submit".to_string()]);

        assert_eq!(cell_value(&record, "description"), "Verify login");
        assert_eq!(cell_value(&record, "steps"), "Open page\nSubmit");
        assert_eq!(cell_value(&record, "rtm_compliance_mapping"), "N/A");
        assert_eq!(cell_value(&TestCaseRecord::default(), "steps"), "N/A");
    }

    #[test]
    fn test_header_title() {
        assert_eq!(header_title("test_case_id"), "Test Case Id");
        assert_eq!(header_title("rtm_compliance_mapping"), "Rtm Compliance Mapping");
    }

    #[test]
    fn test_every_format_exports() {
        let records = vec![TestCaseRecord::new("Verify login")];
        for name in ["csv", "xlsx", "pdf", "txt"] {
            let format = ExportFormat::from_name(name).unwrap();
            assert!(!export(&records, format).unwrap().is_empty(), "{} export empty", name);
        }
    }
}
