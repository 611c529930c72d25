//! Loading records from JSON or YAML files
//!
//! The data layer normally hands records to the engine directly; files are
//! how the CLI gets them. A file holds either a list of records or a single
//! record object.

use serde::Deserialize;
use std::fs;
use std::path::Path;

use crate::error::{FormulaError, FormulaResult};
use crate::types::Record;

/// Record file formats, chosen by file extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
    Json,
    Yaml,
}

impl RecordFormat {
    pub fn from_path(path: &Path) -> FormulaResult<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase());

        match ext.as_deref() {
            Some("json") => Ok(RecordFormat::Json),
            Some("yaml") | Some("yml") => Ok(RecordFormat::Yaml),
            _ => Err(FormulaError::Parse(format!(
                "Unsupported record file '{}': expected .json, .yaml or .yml",
                path.display()
            ))),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RecordSet {
    Many(Vec<Record>),
    One(Record),
}

impl From<RecordSet> for Vec<Record> {
    fn from(set: RecordSet) -> Self {
        match set {
            RecordSet::Many(records) => records,
            RecordSet::One(record) => vec![record],
        }
    }
}

/// Parse records from a string in the given format
pub fn parse_records(content: &str, format: RecordFormat) -> FormulaResult<Vec<Record>> {
    let set: RecordSet = match format {
        RecordFormat::Json => serde_json::from_str(content)?,
        RecordFormat::Yaml => serde_yaml::from_str(content)?,
    };
    Ok(set.into())
}

/// Load every record in a file
pub fn load_records(path: &Path) -> FormulaResult<Vec<Record>> {
    let format = RecordFormat::from_path(path)?;
    let content = fs::read_to_string(path)?;
    parse_records(&content, format)
}

/// Load a file expected to hold exactly one record
pub fn load_record(path: &Path) -> FormulaResult<Record> {
    let mut records = load_records(path)?;
    match records.len() {
        1 => Ok(records.remove(0)),
        n => Err(FormulaError::Parse(format!(
            "Expected one record in '{}', found {}",
            path.display(),
            n
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::Builder;

    #[test]
    fn test_parse_json_list() {
        let records = parse_records(
            r#"[{"amount": 10, "probability": 50}, {"amount": 20}]"#,
            RecordFormat::Json,
        )
        .unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].number("amount"), Some(20.0));
    }

    #[test]
    fn test_parse_yaml_single_record() {
        let records = parse_records(
            "amount: 1500\nstage: Closed Won\nclose_date: 2024-06-30\n",
            RecordFormat::Yaml,
        )
        .unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].number("amount"), Some(1500.0));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            RecordFormat::from_path(Path::new("deals.JSON")).unwrap(),
            RecordFormat::Json
        );
        assert_eq!(
            RecordFormat::from_path(Path::new("deals.yml")).unwrap(),
            RecordFormat::Yaml
        );
        assert!(RecordFormat::from_path(Path::new("deals.csv")).is_err());
        assert!(RecordFormat::from_path(Path::new("deals")).is_err());
    }

    #[test]
    fn test_load_record_requires_exactly_one() {
        let mut file = Builder::new().suffix(".json").tempfile().unwrap();
        file.write_all(br#"[{"amount": 1}, {"amount": 2}]"#).unwrap();

        let err = load_record(file.path()).unwrap_err();
        assert!(err.to_string().contains("found 2"));
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(matches!(
            parse_records("{not json", RecordFormat::Json),
            Err(FormulaError::Json(_))
        ));
    }
}
