//! CSV and plain-text writers

use crate::{cell_value, header_title, ExportError, EXPORT_HEADERS};
use caseforge_domain::TestCaseRecord;
use std::fmt::Write as _;

pub(crate) fn write_csv(records: &[TestCaseRecord]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    writer.write_record(EXPORT_HEADERS)?;
    for record in records {
        writer.write_record(EXPORT_HEADERS.iter().map(|header| cell_value(record, header)))?;
    }

    writer.into_inner().map_err(|e| ExportError::Io(e.into_error()))
}

/// One `Title: value` line per column, numbered steps, a dashed rule between records
pub(crate) fn write_txt(records: &[TestCaseRecord]) -> Vec<u8> {
    let mut out = String::new();

    for record in records {
        for header in EXPORT_HEADERS {
            match header {
                "steps" => {
                    out.push_str("Steps:\n");
                    for (i, step) in record.steps.iter().enumerate() {
                        let _ = writeln!(out, "  {}. {}", i + 1, step);
                    }
                }
                "rtm_compliance_mapping" => {
                    let _ = writeln!(out, "RTM Compliance Mapping: {}", cell_value(record, header));
                }
                _ => {
                    let _ = writeln!(out, "{}: {}", header_title(header), cell_value(record, header));
                }
            }
        }
        out.push_str(&"-".repeat(30));
        out.push('\n');
    }

    out.into_bytes()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> TestCaseRecord {
        TestCaseRecord {
            test_case_id: "TC-001".to_string(),
            priority: "High".to_string(),
            rtm_compliance_mapping: "ISO, A.9".to_string(),
            ..TestCaseRecord::new("Verify \"quoted\" login")
                .with_steps(vec!["Open page".to_string(), "Enter credentials".to_string()])
        }
    }

    #[test]
    fn test_csv_quotes_and_multiline_steps() {
        let csv = String::from_utf8(write_csv(&[record()]).unwrap()).unwrap();
        let mut lines = csv.lines();

        assert_eq!(
            lines.next().unwrap(),
            "test_case_id,requirement_id,description,test_type,priority,rtm_compliance_mapping,steps,expected_result"
        );
        assert!(csv.contains(r#""Verify ""quoted"" login""#));
        assert!(csv.contains("\"ISO, A.9\""));
        assert!(csv.contains("\"Open page\nEnter credentials\""));
    }

    #[test]
    fn test_csv_reads_back() {
        let bytes = write_csv(&[record(), TestCaseRecord::new("Second")]).unwrap();
        let mut reader = csv::Reader::from_reader(bytes.as_slice());
        let rows: Vec<csv::StringRecord> = reader.records().map(Result::unwrap).collect();

        assert_eq!(rows.len(), 2);
        assert_eq!(&rows[0][6], "Open page\nEnter credentials");
        assert_eq!(&rows[1][0], "N/A");
    }

    #[test]
    fn test_txt_layout() {
        let txt = String::from_utf8(write_txt(&[record()])).unwrap();
        assert!(txt.starts_with("Test Case Id: TC-001\nRequirement Id: N/A\n"));
        assert!(txt.contains("RTM Compliance Mapping: ISO, A.9\n"));
        assert!(txt.contains("Steps:\n  1. Open page\n  2. Enter credentials\n"));
        assert!(txt.ends_with(&format!("{}\n", "-".repeat(30))));
    }
}
