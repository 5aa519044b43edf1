//! CSV export of selected result sets
//!
//! Files are UTF-8 with a BOM so spreadsheet tools pick the right encoding.
//! Missing numbers are written as empty cells.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::core::error::ValidationError;
use crate::entities::{ResultRecord, TestMetadata};

/// Column order of every export
pub const CSV_HEADER: [&str; 8] = [
    "test_num", "test_txt", "site_num", "head_num", "result", "units", "lo_limit", "hi_limit",
];

/// Extra leading column for multi-file merged exports
pub const FILE_NAME_COLUMN: &str = "file_name";

const UTF8_BOM: &str = "\u{feff}";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("CSV encoding failed: {0}")]
    Csv(#[from] csv::Error),

    #[error("Could not write {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

fn number_cell(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Render records as CSV text (no BOM)
///
/// `include_file_name` prepends the `file_name` column; use it only for
/// merged multi-file selections. An empty record set is rejected.
pub fn records_to_csv<'a, I>(
    records: I,
    catalog: &[TestMetadata],
    include_file_name: bool,
) -> Result<String, ExportError>
where
    I: IntoIterator<Item = &'a ResultRecord>,
{
    let names: HashMap<u32, &str> = catalog
        .iter()
        .map(|t| (t.test_num, t.test_txt.as_str()))
        .collect();

    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());

    let mut header: Vec<&str> = Vec::with_capacity(CSV_HEADER.len() + 1);
    if include_file_name {
        header.push(FILE_NAME_COLUMN);
    }
    header.extend(CSV_HEADER);
    writer.write_record(&header)?;

    let mut rows = 0usize;
    for record in records {
        let test_txt = if record.test_txt.is_empty() {
            names.get(&record.test_num).copied().unwrap_or_default()
        } else {
            record.test_txt.as_str()
        };

        let mut row: Vec<String> = Vec::with_capacity(header.len());
        if include_file_name {
            row.push(record.source_file.clone());
        }
        row.push(record.test_num.to_string());
        row.push(test_txt.to_string());
        row.push(record.site_num.to_string());
        row.push(record.head_num.to_string());
        row.push(number_cell(record.result));
        row.push(record.units.clone());
        row.push(number_cell(record.lo_limit));
        row.push(number_cell(record.hi_limit));
        writer.write_record(&row)?;
        rows += 1;
    }

    if rows == 0 {
        return Err(ValidationError::EmptyExport.into());
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| ExportError::Csv(csv::Error::from(e.into_error())))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// Reduce a scope label to characters safe in a file name
pub fn sanitize_scope(scope: &str) -> String {
    let cleaned: String = scope
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('_');
    if cleaned.is_empty() {
        "export".to_string()
    } else {
        cleaned.to_string()
    }
}

/// `{scope}_{timestamp}.csv`
pub fn export_file_name(scope: &str, timestamp: chrono::DateTime<chrono::Local>) -> String {
    format!(
        "{}_{}.csv",
        sanitize_scope(scope),
        timestamp.format("%Y%m%d_%H%M%S")
    )
}

/// Write CSV text with a BOM into `dir`, returning the created path
pub fn write_csv_file(dir: &Path, scope: &str, csv_text: &str) -> Result<PathBuf, ExportError> {
    let path = dir.join(export_file_name(scope, chrono::Local::now()));
    fs::write(&path, format!("{}{}", UTF8_BOM, csv_text)).map_err(|source| ExportError::Io {
        path: path.display().to_string(),
        source,
    })?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn record(test_num: u32, result: Option<f64>, lo: Option<f64>) -> ResultRecord {
        ResultRecord {
            test_num,
            site_num: 1,
            head_num: 1,
            result,
            test_txt: String::new(),
            units: "mV".to_string(),
            lo_limit: lo,
            hi_limit: Some(5.5),
            source_file: "lot7.stdf".to_string(),
            row_key: "lot7.stdf:0".to_string(),
        }
    }

    #[test]
    fn test_empty_selection_rejected() {
        let err = records_to_csv(Vec::<&ResultRecord>::new(), &[], false).unwrap_err();
        assert!(matches!(
            err,
            ExportError::Validation(ValidationError::EmptyExport)
        ));
    }

    #[test]
    fn test_missing_limit_is_empty_cell() {
        let rec = record(10, Some(1.25), None);
        let csv = records_to_csv([&rec], &[], false).unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("test_num,test_txt,site_num,head_num,result,units,lo_limit,hi_limit")
        );
        assert_eq!(lines.next(), Some("10,,1,1,1.25,mV,,5.5"));
        assert!(!csv.contains("null"));
        assert!(!csv.contains("None"));
    }

    #[test]
    fn test_file_name_column_for_merged() {
        let rec = record(10, None, Some(0.5));
        let csv = records_to_csv([&rec], &[], true).unwrap();
        let mut lines = csv.lines();
        assert!(lines.next().unwrap().starts_with("file_name,test_num,"));
        assert_eq!(lines.next(), Some("lot7.stdf,10,,1,1,,mV,0.5,5.5"));
    }

    #[test]
    fn test_test_txt_falls_back_to_catalog() {
        let rec = record(10, Some(1.0), None);
        let mut meta = TestMetadata::new(10);
        meta.test_txt = "VREF, trimmed".to_string();
        let csv = records_to_csv([&rec], &[meta], false).unwrap();
        assert!(csv.contains("10,\"VREF, trimmed\",1,1,1,mV,,5.5"));
    }

    #[test]
    fn test_export_file_name() {
        let ts = chrono::Local
            .with_ymd_and_hms(2024, 3, 5, 14, 7, 9)
            .single()
            .unwrap();
        assert_eq!(
            export_file_name("lot7.stdf test 10", ts),
            "lot7.stdf_test_10_20240305_140709.csv"
        );
        assert_eq!(export_file_name("///", ts), "export_20240305_140709.csv");
    }

    #[test]
    fn test_written_file_has_bom() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_csv_file(dir.path(), "merged", "a,b\n").unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(&bytes[..3], &[0xEF, 0xBB, 0xBF]);
        assert!(path.file_name().unwrap().to_string_lossy().starts_with("merged_"));
    }
}
