//! Filing history description table.
//!
//! Loaded once from YAML with a top-level `description:` mapping of code to
//! display text. Lookups never fail: an unknown code, or a table that could
//! not be loaded, yields an empty string.

use std::collections::HashMap;
use std::path::Path;

use tracing::{error, info, warn};

use crate::constants::FILING_HISTORY_DESCRIPTION_KEY;

#[derive(Debug, Clone, Default)]
pub struct FilingHistoryDescriptions {
    descriptions: HashMap<String, String>,
}

impl FilingHistoryDescriptions {
    /// Load the table from `path`, falling back to an empty table on any error
    pub fn load(path: &Path) -> Self {
        let contents = match std::fs::read_to_string(path) {
            Ok(contents) => contents,
            Err(e) => {
                error!(
                    path = %path.display(),
                    error = %e,
                    "Failed to load filing_history_descriptions from file"
                );
                return Self::default();
            }
        };

        match Self::from_yaml_str(&contents) {
            Ok(table) => {
                info!(
                    path = %path.display(),
                    entries = table.len(),
                    "Loaded filing history descriptions"
                );
                table
            }
            Err(e) => {
                error!(
                    path = %path.display(),
                    error = %e,
                    "Failed to parse filing_history_descriptions"
                );
                Self::default()
            }
        }
    }

    pub fn from_yaml_str(contents: &str) -> Result<Self, serde_yaml::Error> {
        let document: serde_yaml::Value = serde_yaml::from_str(contents)?;
        let Some(mapping) = document
            .get(FILING_HISTORY_DESCRIPTION_KEY)
            .and_then(serde_yaml::Value::as_mapping)
        else {
            warn!("Description table has no '{FILING_HISTORY_DESCRIPTION_KEY}' mapping");
            return Ok(Self::default());
        };

        let descriptions = mapping
            .iter()
            .filter_map(|(code, text)| Some((code.as_str()?.to_string(), text.as_str()?.to_string())))
            .collect();
        Ok(Self { descriptions })
    }

    pub fn from_map(descriptions: HashMap<String, String>) -> Self {
        Self { descriptions }
    }

    /// Display text for `code`, or `""` when unknown
    pub fn lookup(&self, code: &str) -> String {
        self.descriptions.get(code).cloned().unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.descriptions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptions.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const TABLE: &str = r#"
description:
  appoint-person-director-company-with-name-date: "**Appointment** of {officer_name} as a director on {appointment_date}"
  change-registered-office-address-company-with-date-old-address-new-address: "**Registered office address changed** from {old_address} to {new_address} on {change_date}"
statement:
  unrelated: "ignored"
"#;

    #[test]
    fn test_lookup_known_and_unknown_codes() {
        let table = FilingHistoryDescriptions::from_yaml_str(TABLE).expect("parse");
        assert_eq!(table.len(), 2);
        assert_eq!(
            table.lookup("appoint-person-director-company-with-name-date"),
            "**Appointment** of {officer_name} as a director on {appointment_date}"
        );
        assert_eq!(table.lookup("unrelated"), "");
        assert_eq!(table.lookup("no-such-code"), "");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(TABLE.as_bytes()).expect("write");

        let table = FilingHistoryDescriptions::load(file.path());
        assert!(!table.is_empty());
    }

    #[test]
    fn test_shipped_table_loads_from_default_path() {
        let table = FilingHistoryDescriptions::load(Path::new(
            crate::constants::DEFAULT_FILING_HISTORY_DESCRIPTIONS_PATH,
        ));
        assert!(!table.is_empty());
        assert_eq!(
            table.lookup("appoint-person-director-company-with-name-date"),
            "**Appointment** of {officer_name} as a director on {appointment_date}"
        );
    }

    #[test]
    fn test_missing_file_yields_empty_table() {
        let table = FilingHistoryDescriptions::load(Path::new("/nonexistent/descriptions.yml"));
        assert!(table.is_empty());
        assert_eq!(table.lookup("appoint-person-director-company-with-name-date"), "");
    }

    #[test]
    fn test_unparseable_file_yields_empty_table() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(b"description: [unclosed").expect("write");

        let table = FilingHistoryDescriptions::load(file.path());
        assert!(table.is_empty());
    }

    #[test]
    fn test_table_without_description_key_is_empty() {
        let table = FilingHistoryDescriptions::from_yaml_str("other: {}").expect("parse");
        assert!(table.is_empty());
    }
}
