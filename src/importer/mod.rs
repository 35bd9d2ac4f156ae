//! Externally-produced dependency/license records (e.g. a frontend build's report).
//!
//! Each [`Importer`] reads one file and yields dependencies whose scope is the
//! importer's display name. [`merge`] folds them into the locally-resolved set.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::config::ImporterConfig;
use crate::models::{Dependency, Origin};

pub mod json;
pub mod xml;

pub trait Importer: Send + Sync {
    /// Display name, used as the scope of imported-only dependencies.
    fn name(&self) -> &str;
    fn path(&self) -> &Path;
    fn import(&self) -> Result<ImportOutcome>;
}

/// Valid records plus the number of malformed ones that were skipped.
#[derive(Debug, Default)]
pub struct ImportOutcome {
    pub dependencies: Vec<Dependency>,
    pub skipped: usize,
}

pub fn from_config(configs: &[ImporterConfig]) -> Vec<Box<dyn Importer>> {
    configs
        .iter()
        .map(|config| -> Box<dyn Importer> {
            match config {
                ImporterConfig::Xml { name, path } => Box::new(xml::XmlImporter::new(name, path)),
                ImporterConfig::Json { name, path } => Box::new(json::JsonImporter::new(name, path)),
            }
        })
        .collect()
}

/// An imported record before identity validation.
#[derive(Debug, Default)]
pub(crate) struct RawRecord {
    pub group: Option<String>,
    pub name: Option<String>,
    pub version: Option<String>,
    pub licenses: Vec<String>,
}

impl RawRecord {
    /// `None` unless the record has a group, a name and at least one license string.
    pub fn into_dependency(self, scope: &str) -> Option<Dependency> {
        let group = non_blank(self.group)?;
        let name = non_blank(self.name)?;
        let licenses: Vec<String> = self
            .licenses
            .into_iter()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        if licenses.is_empty() {
            return None;
        }
        let version = non_blank(self.version).unwrap_or_default();

        let mut dep = Dependency::new(&group, &name, &version, scope).with_licenses(licenses);
        dep.origin = Origin::ImportedOnly;
        Some(dep)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Collect validated records into an [`ImportOutcome`], counting rejects.
pub(crate) fn collect_records(records: Vec<RawRecord>, scope: &str, path: &Path) -> ImportOutcome {
    let mut outcome = ImportOutcome::default();
    for record in records {
        match record.into_dependency(scope) {
            Some(dep) => outcome.dependencies.push(dep),
            None => {
                outcome.skipped += 1;
                tracing::debug!(file = %path.display(), "skipping imported record without group, name or license");
            }
        }
    }
    outcome
}

/// Merge imported records into the local set, keyed by `(group, name)`.
///
/// - Imported records sharing a key are collapsed first.
/// - A local dependency whose key was imported keeps its own fields and gets
///   the union of both license lists (local strings first); its origin becomes
///   [`Origin::Merged`].
/// - Imported records matching no local dependency are appended with
///   [`Origin::ImportedOnly`].
pub fn merge(local: Vec<Dependency>, imported: Vec<Dependency>) -> Vec<Dependency> {
    let mut order: Vec<(String, String)> = Vec::new();
    let mut by_key: HashMap<(String, String), Dependency> = HashMap::new();
    for dep in imported {
        let key = dep.module_key();
        match by_key.get_mut(&key) {
            Some(existing) => union_licenses(&mut existing.licenses, &dep.licenses),
            None => {
                order.push(key.clone());
                by_key.insert(key, dep);
            }
        }
    }

    let mut matched: std::collections::HashSet<(String, String)> = std::collections::HashSet::new();
    let mut result: Vec<Dependency> = local
        .into_iter()
        .map(|dep| match by_key.get(&dep.module_key()) {
            Some(import) => {
                matched.insert(dep.module_key());
                let mut licenses = dep.licenses.clone();
                union_licenses(&mut licenses, &import.licenses);
                Dependency {
                    licenses,
                    origin: Origin::Merged,
                    ..dep
                }
            }
            None => dep,
        })
        .collect();

    for key in order {
        if matched.contains(&key) {
            continue;
        }
        if let Some(dep) = by_key.remove(&key) {
            result.push(Dependency {
                origin: Origin::ImportedOnly,
                ..dep
            });
        }
    }

    result
}

fn union_licenses(target: &mut Vec<String>, extra: &[String]) {
    for license in extra {
        if !target.contains(license) {
            target.push(license.clone());
        }
    }
}

/// Shared constructor data for file-backed importers.
#[derive(Debug, Clone)]
pub(crate) struct Source {
    pub name: String,
    pub path: PathBuf,
}

impl Source {
    pub fn new(name: &str, path: &Path) -> Self {
        Source {
            name: name.to_string(),
            path: path.to_path_buf(),
        }
    }
}
