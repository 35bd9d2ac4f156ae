use std::collections::{BTreeSet, HashMap};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::config::PolicyConfig;
use crate::error::FatalError;
use crate::license::alias::AliasTable;
use crate::models::{Dependency, NormalizedLicense, Outcome, Verdict};

/// Licenses allowed when no policy file is available.
const BUILTIN_ALLOWED: &[&str] = &["MIT", "Apache-2.0", "BSD-2-Clause", "BSD-3-Clause", "ISC"];

/// Explicit decision for one `(group, name)` module, regardless of its licenses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Decision {
    Allow,
    Deny,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Override {
    pub decision: Decision,
    pub reason: Option<String>,
}

/// Allow-set of canonical license IDs plus per-module overrides.
///
/// Read-only once loaded.
#[derive(Debug, Clone, Default)]
pub struct Policy {
    allowed: BTreeSet<String>,
    /// Licenses allowed only for one `(group, name)` module.
    module_licenses: HashMap<(String, String), BTreeSet<String>>,
    overrides: HashMap<(String, String), Override>,
}

impl Policy {
    pub fn allowing<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Policy {
            allowed: ids.into_iter().map(Into::into).collect(),
            ..Policy::default()
        }
    }

    /// The fallback allow-list: common permissive licenses only.
    pub fn builtin() -> Self {
        Policy::allowing(BUILTIN_ALLOWED.iter().copied())
    }

    pub fn with_override(mut self, group: &str, name: &str, decision: Decision, reason: Option<&str>) -> Self {
        self.overrides.insert(
            (group.to_string(), name.to_string()),
            Override {
                decision,
                reason: reason.map(str::to_string),
            },
        );
        self
    }

    pub fn with_module_license(mut self, group: &str, name: &str, license: &str) -> Self {
        self.module_licenses
            .entry((group.to_string(), name.to_string()))
            .or_default()
            .insert(license.to_string());
        self
    }

    pub fn is_allowed(&self, id: &str) -> bool {
        self.allowed.contains(id)
    }

    /// `id` is allowed globally or by a rule scoped to `dep`'s module.
    pub fn allows(&self, dep: &Dependency, id: &str) -> bool {
        self.is_allowed(id)
            || self
                .module_licenses
                .get(&dep.module_key())
                .is_some_and(|ids| ids.contains(id))
    }

    pub fn allowed(&self) -> impl Iterator<Item = &str> {
        self.allowed.iter().map(String::as_str)
    }

    fn override_for(&self, dep: &Dependency) -> Option<&Override> {
        self.overrides.get(&dep.module_key())
    }
}

// ---------------------------------------------------------------------------
// Policy file
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PolicyFile {
    #[serde(default)]
    allowed_licenses: Vec<AllowedEntry>,
    #[serde(default)]
    overrides: Vec<OverrideEntry>,
}

/// `"MIT"`, `{"moduleLicense": "MIT"}`, or `{"moduleName": "group:name"}`
/// (the latter allows that module outright). Both keys together allow that
/// license for that module only.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AllowedEntry {
    Id(String),
    Module {
        #[serde(rename = "moduleLicense", default)]
        module_license: Option<String>,
        #[serde(rename = "moduleName", default)]
        module_name: Option<String>,
    },
}

#[derive(Debug, Deserialize)]
struct OverrideEntry {
    group: String,
    name: String,
    decision: Decision,
    #[serde(default)]
    reason: Option<String>,
}

impl Policy {
    /// Load an allow-list file (JSON, or TOML when the extension is `.toml`).
    ///
    /// Allowed entries are canonicalized through `table`, so a file listing
    /// `"The MIT License"` allows `MIT`. Entries that resolve to no registered
    /// license are kept verbatim and reported in the returned warnings.
    pub fn load(path: &Path, table: &AliasTable) -> Result<(Policy, Vec<String>)> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read policy file {}", path.display()))?;
        let is_toml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("toml"));
        let file: PolicyFile = if is_toml {
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse policy file {}", path.display()))?
        } else {
            serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse policy file {}", path.display()))?
        };
        Ok(Policy::from_file(file, table))
    }

    fn from_file(file: PolicyFile, table: &AliasTable) -> (Policy, Vec<String>) {
        let mut policy = Policy::default();
        let mut warnings = Vec::new();

        for entry in file.allowed_licenses {
            let (license, module) = match entry {
                AllowedEntry::Id(id) => (Some(id), None),
                AllowedEntry::Module {
                    module_license,
                    module_name,
                } => (module_license, module_name),
            };

            match (license, module) {
                (Some(license), Some(module)) => match module.split_once(':') {
                    Some((group, name)) => {
                        let id = canonical_or_verbatim(&license, table, &mut warnings);
                        policy = policy.with_module_license(group, name, &id);
                    }
                    None => warnings.push(format!(
                        "allowed module '{}' is not in group:name form; ignored",
                        module
                    )),
                },
                (Some(license), None) => {
                    let id = canonical_or_verbatim(&license, table, &mut warnings);
                    policy.allowed.insert(id);
                }
                (None, Some(module)) => match module.split_once(':') {
                    Some((group, name)) => {
                        policy = policy.with_override(group, name, Decision::Allow, Some("allowed by module entry"));
                    }
                    None => warnings.push(format!(
                        "allowed module '{}' is not in group:name form; ignored",
                        module
                    )),
                },
                (None, None) => warnings.push("empty allowed-licenses entry ignored".to_string()),
            }
        }

        for entry in file.overrides {
            policy = policy.with_override(&entry.group, &entry.name, entry.decision, entry.reason.as_deref());
        }

        (policy, warnings)
    }
}

/// The canonical ID for an allowed-license entry, or the entry itself with a warning.
fn canonical_or_verbatim(license: &str, table: &AliasTable, warnings: &mut Vec<String>) -> String {
    match table.lookup(license) {
        Some(canonical) => canonical.id.clone(),
        None => {
            warnings.push(format!(
                "allowed license '{}' is not a registered license; matched verbatim only",
                license
            ));
            license.to_string()
        }
    }
}

/// Resolve the policy for this run.
///
/// A configured but missing file, or no file at all, falls back to
/// [`Policy::builtin`] with a warning, unless `config.required` is set, in
/// which case the run must abort.
pub fn resolve_policy(config: &PolicyConfig, table: &AliasTable) -> Result<(Policy, Vec<String>)> {
    match &config.allowed_licenses_file {
        Some(path) if path.exists() => Policy::load(path, table),
        Some(path) if config.required => Err(FatalError::MissingPolicy(path.clone()).into()),
        Some(path) => Ok((
            Policy::builtin(),
            vec![format!(
                "policy file {} not found; using built-in allow-list",
                path.display()
            )],
        )),
        None if config.required => Err(FatalError::PolicyNotConfigured.into()),
        None => Ok((
            Policy::builtin(),
            vec!["no allowed-licenses file configured; using built-in allow-list".to_string()],
        )),
    }
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Evaluate one dependency's normalized licenses against `policy`.
///
/// 1. A per-module override wins outright.
/// 2. No licenses → [`Outcome::Unknown`].
/// 3. Every resolved license must be allowed (AND semantics); the first one
///    that is not yields a [`Outcome::Violation`] naming it.
/// 4. Any unresolved string left → [`Outcome::Unknown`], since it cannot be
///    confirmed either way.
/// 5. Otherwise [`Outcome::Allowed`].
pub fn evaluate(dep: &Dependency, licenses: &[NormalizedLicense], policy: &Policy) -> Verdict {
    Verdict {
        dependency: dep.clone(),
        licenses: licenses.to_vec(),
        outcome: outcome(dep, licenses, policy),
    }
}

fn outcome(dep: &Dependency, licenses: &[NormalizedLicense], policy: &Policy) -> Outcome {
    if let Some(rule) = policy.override_for(dep) {
        return match rule.decision {
            Decision::Allow => Outcome::Allowed,
            Decision::Deny => Outcome::Violation {
                license: None,
                reason: rule
                    .reason
                    .clone()
                    .unwrap_or_else(|| "denied by policy override".to_string()),
            },
        };
    }

    if licenses.is_empty() {
        return Outcome::Unknown;
    }

    let disallowed = licenses
        .iter()
        .filter_map(NormalizedLicense::canonical)
        .find(|license| !policy.allows(dep, &license.id));
    if let Some(license) = disallowed {
        return Outcome::Violation {
            license: Some(license.id.clone()),
            reason: format!("license {} is not in the allow-list", license.id),
        };
    }

    let has_unresolved = licenses.iter().any(|l| l.canonical().is_none());
    if has_unresolved {
        // Unresolved strings may still match a verbatim allow-list entry.
        let all_verbatim = licenses
            .iter()
            .all(|l| l.canonical().is_some() || policy.allows(dep, l.label()));
        if !all_verbatim {
            return Outcome::Unknown;
        }
    }

    Outcome::Allowed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::license::normalizer::normalize;
    use tempfile::tempdir;

    fn dep(name: &str, licenses: &[&str]) -> Dependency {
        Dependency::new("org.example", name, "1.0", "runtime").with_licenses(licenses.iter().copied())
    }

    fn run(dep: &Dependency, policy: &Policy) -> Outcome {
        let table = AliasTable::bundled();
        evaluate(dep, &normalize(dep, &table), policy).outcome
    }

    #[test]
    fn test_mit_alias_is_allowed() {
        let foo = dep("foo", &["The MIT License"]);
        assert_eq!(run(&foo, &Policy::allowing(["MIT"])), Outcome::Allowed);
    }

    #[test]
    fn test_no_license_is_unknown() {
        let bar = Dependency::new("org.example", "bar", "2.0", "runtime");
        assert_eq!(run(&bar, &Policy::allowing(["MIT"])), Outcome::Unknown);
        assert_eq!(run(&bar, &Policy::builtin()), Outcome::Unknown);
        assert_eq!(run(&bar, &Policy::default()), Outcome::Unknown);
    }

    #[test]
    fn test_multi_license_and_semantics() {
        let dual = dep("dual", &["MIT", "GPL-3.0"]);
        assert_eq!(
            run(&dual, &Policy::allowing(["MIT"])),
            Outcome::Violation {
                license: Some("GPL-3.0".to_string()),
                reason: "license GPL-3.0 is not in the allow-list".to_string(),
            }
        );
        assert_eq!(run(&dual, &Policy::allowing(["MIT", "GPL-3.0"])), Outcome::Allowed);
    }

    #[test]
    fn test_violation_names_first_disallowed() {
        let many = dep("many", &["LGPL-2.1", "MIT", "GPL-3.0"]);
        match run(&many, &Policy::allowing(["MIT"])) {
            Outcome::Violation { license, .. } => assert_eq!(license.as_deref(), Some("LGPL-2.1")),
            other => panic!("expected violation, got {:?}", other),
        }
    }

    #[test]
    fn test_override_wins() {
        let gpl = dep("gpl-thing", &["GPL-3.0"]);
        let policy = Policy::allowing(["MIT"]).with_override("org.example", "gpl-thing", Decision::Allow, None);
        assert_eq!(run(&gpl, &policy), Outcome::Allowed);

        let mit = dep("banned", &["MIT"]);
        let policy = Policy::allowing(["MIT"]).with_override(
            "org.example",
            "banned",
            Decision::Deny,
            Some("vendored fork required"),
        );
        assert_eq!(
            run(&mit, &policy),
            Outcome::Violation {
                license: None,
                reason: "vendored fork required".to_string(),
            }
        );
    }

    #[test]
    fn test_override_applies_even_without_licenses() {
        let bare = Dependency::new("org.example", "bare", "1.0", "runtime");
        let policy = Policy::default().with_override("org.example", "bare", Decision::Allow, None);
        assert_eq!(run(&bare, &policy), Outcome::Allowed);
    }

    #[test]
    fn test_unresolved_license_is_unknown() {
        let custom = dep("custom", &["MIT", "Acme EULA"]);
        assert_eq!(run(&custom, &Policy::allowing(["MIT"])), Outcome::Unknown);
        assert_eq!(run(&custom, &Policy::allowing(["MIT", "Acme EULA"])), Outcome::Allowed);
    }

    #[test]
    fn test_evaluation_is_deterministic() {
        let d = dep("x", &["MIT OR GPL-2.0"]);
        let policy = Policy::allowing(["MIT"]);
        let first = run(&d, &policy);
        for _ in 0..10 {
            assert_eq!(run(&d, &policy), first);
        }
    }

    #[test]
    fn test_load_json_policy_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("allowed.json");
        std::fs::write(
            &path,
            r#"{
  "allowedLicenses": [
    "The MIT License",
    { "moduleLicense": "Apache License, Version 2.0" },
    { "moduleName": "org.example:blessed" },
    "Acme EULA"
  ],
  "overrides": [
    { "group": "org.example", "name": "legacy", "decision": "deny", "reason": "legal review" }
  ]
}"#,
        )
        .unwrap();

        let (policy, warnings) = Policy::load(&path, &AliasTable::bundled()).unwrap();
        assert!(policy.is_allowed("MIT"));
        assert!(policy.is_allowed("Apache-2.0"));
        assert!(policy.is_allowed("Acme EULA"));
        assert_eq!(warnings.len(), 1);

        let blessed = dep("blessed", &["GPL-3.0"]);
        assert_eq!(run(&blessed, &policy), Outcome::Allowed);
        let legacy = dep("legacy", &["MIT"]);
        assert!(run(&legacy, &policy).is_violation());
    }

    #[test]
    fn test_load_toml_policy_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("allowed.toml");
        std::fs::write(
            &path,
            "allowedLicenses = [\"MIT\", \"ISC\"]\n\n[[overrides]]\ngroup = \"g\"\nname = \"n\"\ndecision = \"allow\"\n",
        )
        .unwrap();
        let (policy, warnings) = Policy::load(&path, &AliasTable::bundled()).unwrap();
        assert!(warnings.is_empty());
        assert_eq!(policy.allowed().collect::<Vec<_>>(), vec!["ISC", "MIT"]);
    }

    #[test]
    fn test_resolve_policy_fallbacks() {
        let table = AliasTable::bundled();
        let dir = tempdir().unwrap();
        let missing = dir.path().join("missing.json");

        let (policy, warnings) = resolve_policy(
            &PolicyConfig {
                allowed_licenses_file: Some(missing.clone()),
                required: false,
            },
            &table,
        )
        .unwrap();
        assert!(policy.is_allowed("MIT"));
        assert_eq!(warnings.len(), 1);

        let err = resolve_policy(
            &PolicyConfig {
                allowed_licenses_file: Some(missing),
                required: true,
            },
            &table,
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FatalError>(),
            Some(FatalError::MissingPolicy(_))
        ));

        let err = resolve_policy(
            &PolicyConfig {
                allowed_licenses_file: None,
                required: true,
            },
            &table,
        )
        .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FatalError>(),
            Some(FatalError::PolicyNotConfigured)
        ));
    }

    #[test]
    fn test_module_scoped_license_entry() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("allowed.json");
        std::fs::write(
            &path,
            r#"{ "allowedLicenses": [
  "MIT",
  { "moduleName": "org.example:only-this", "moduleLicense": "GPL-3.0" }
] }"#,
        )
        .unwrap();
        let (policy, warnings) = Policy::load(&path, &AliasTable::bundled()).unwrap();
        assert!(warnings.is_empty());
        assert!(!policy.is_allowed("GPL-3.0"));

        let scoped = dep("only-this", &["GPL-3.0"]);
        assert_eq!(run(&scoped, &policy), Outcome::Allowed);

        let unrelated = Dependency::new("org.other", "unrelated", "1.0", "runtime").with_licenses(["GPL-3.0"]);
        assert!(run(&unrelated, &policy).is_violation());

        // The module rule grants the named license only.
        let other_license = dep("only-this", &["AGPL-3.0"]);
        assert!(run(&other_license, &policy).is_violation());
    }

    #[test]
    fn test_slash_license_allowed_verbatim() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("allowed.json");
        std::fs::write(&path, r#"{ "allowedLicenses": ["CDDL/GPLv2+CE"] }"#).unwrap();
        let (policy, warnings) = Policy::load(&path, &AliasTable::bundled()).unwrap();
        assert_eq!(warnings.len(), 1);

        let mail = Dependency::new("javax.mail", "mail", "1.4.7", "runtime").with_licenses(["CDDL/GPLv2+CE"]);
        assert_eq!(run(&mail, &policy), Outcome::Allowed);
    }
}
