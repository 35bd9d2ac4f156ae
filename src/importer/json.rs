use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::Value;

use super::{collect_records, ImportOutcome, Importer, RawRecord, Source};

/// Imports a JSON dependency report, either `{"dependencies": [...]}` or a
/// bare array. Each record carries `group`, `name`, optional `version`, and
/// `licenses` (strings or `{"name": ...}` objects) or a single `license`.
pub struct JsonImporter {
    source: Source,
}

impl JsonImporter {
    pub fn new(name: &str, path: &Path) -> Self {
        JsonImporter {
            source: Source::new(name, path),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ImportFile {
    List(Vec<Value>),
    Wrapped {
        #[serde(default)]
        dependencies: Vec<Value>,
    },
}

#[derive(Debug, Deserialize)]
struct JsonRecord {
    #[serde(default)]
    group: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    version: Option<String>,
    #[serde(default)]
    licenses: Vec<JsonLicense>,
    #[serde(default)]
    license: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum JsonLicense {
    Text(String),
    Named { name: String },
}

impl Importer for JsonImporter {
    fn name(&self) -> &str {
        &self.source.name
    }

    fn path(&self) -> &Path {
        &self.source.path
    }

    fn import(&self) -> Result<ImportOutcome> {
        let content = std::fs::read_to_string(&self.source.path)
            .with_context(|| format!("Failed to read import file {}", self.source.path.display()))?;
        let file: ImportFile = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse import file {}", self.source.path.display()))?;
        let values = match file {
            ImportFile::Wrapped { dependencies } => dependencies,
            ImportFile::List(values) => values,
        };

        // A record of the wrong shape is malformed, not fatal: it becomes an
        // empty record and is counted as skipped.
        let records = values
            .into_iter()
            .map(|value| {
                serde_json::from_value::<JsonRecord>(value)
                    .map(into_raw)
                    .unwrap_or_default()
            })
            .collect();

        Ok(collect_records(records, &self.source.name, &self.source.path))
    }
}

fn into_raw(record: JsonRecord) -> RawRecord {
    let mut licenses: Vec<String> = record
        .licenses
        .into_iter()
        .map(|l| match l {
            JsonLicense::Text(text) => text,
            JsonLicense::Named { name } => name,
        })
        .collect();
    licenses.extend(record.license);

    RawRecord {
        group: record.group,
        name: record.name,
        version: record.version,
        licenses,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn import(json: &str) -> Result<ImportOutcome> {
        let mut f = NamedTempFile::new().unwrap();
        write!(f, "{}", json).unwrap();
        JsonImporter::new("Front End", f.path()).import()
    }

    #[test]
    fn test_wrapped_report() {
        let outcome = import(
            r#"{
  "dependencies": [
    { "group": "npm", "name": "react", "version": "18.2.0", "licenses": ["MIT"] },
    { "group": "npm", "name": "dompurify", "licenses": [{ "name": "MPL 2.0" }, "Apache-2.0"] },
    { "group": "npm", "name": "left-pad", "license": "WTFPL" }
  ]
}"#,
        )
        .unwrap();
        assert_eq!(outcome.skipped, 0);
        assert_eq!(outcome.dependencies.len(), 3);
        assert_eq!(outcome.dependencies[1].licenses, vec!["MPL 2.0", "Apache-2.0"]);
        assert_eq!(outcome.dependencies[2].licenses, vec!["WTFPL"]);
        assert_eq!(outcome.dependencies[0].scope, "Front End");
    }

    #[test]
    fn test_bare_array_and_malformed_records() {
        let outcome = import(
            r#"[
  { "group": "npm", "name": "react", "licenses": ["MIT"] },
  { "name": "no-group", "licenses": ["MIT"] },
  { "group": "npm", "name": "no-license" },
  { "group": 42, "name": "wrong-type", "licenses": ["MIT"] },
  "not even an object"
]"#,
        )
        .unwrap();
        assert_eq!(outcome.dependencies.len(), 1);
        assert_eq!(outcome.skipped, 4);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        let err = import("{ not json").unwrap_err();
        assert!(err.to_string().contains("Failed to parse import file"));
    }
}
