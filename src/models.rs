use serde::{Deserialize, Serialize};

/// A resolved dependency as handed over by the dependency resolver or an importer.
///
/// Values are never mutated in place once resolved; pipeline stages build new
/// ones (see [`Dependency::with_licenses`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dependency {
    pub group: String,
    pub name: String,
    pub version: String,
    pub scope: String,
    /// Declared license strings, in the order they were found.
    pub licenses: Vec<String>,
    pub origin: Origin,
    /// `false` for platform/BOM entries that resolve to no artifact.
    pub has_artifact: bool,
}

impl Dependency {
    pub fn new(group: &str, name: &str, version: &str, scope: &str) -> Self {
        Dependency {
            group: group.to_string(),
            name: name.to_string(),
            version: version.to_string(),
            scope: scope.to_string(),
            licenses: Vec::new(),
            origin: Origin::Local,
            has_artifact: true,
        }
    }

    /// Builder-style helper replacing the declared license strings.
    pub fn with_licenses<I, S>(mut self, licenses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.licenses = licenses.into_iter().map(Into::into).collect();
        self
    }

    pub fn key(&self) -> DependencyKey {
        DependencyKey {
            group: self.group.clone(),
            name: self.name.clone(),
            version: self.version.clone(),
            scope: self.scope.clone(),
        }
    }

    /// Identity used when merging imported records: `(group, name)`.
    pub fn module_key(&self) -> (String, String) {
        (self.group.clone(), self.name.clone())
    }

    /// `group:name`, the form filter patterns are matched against.
    pub fn coordinates(&self) -> String {
        if self.group.is_empty() {
            self.name.clone()
        } else {
            format!("{}:{}", self.group, self.name)
        }
    }
}

impl std::fmt::Display for Dependency {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.version.is_empty() {
            write!(f, "{}", self.coordinates())
        } else {
            write!(f, "{}:{}", self.coordinates(), self.version)
        }
    }
}

/// Unique identity of a dependency within one run.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DependencyKey {
    pub group: String,
    pub name: String,
    pub version: String,
    pub scope: String,
}

/// Provenance of a dependency's license evidence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Origin {
    #[default]
    Local,
    Merged,
    ImportedOnly,
}

impl std::fmt::Display for Origin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Origin::Local => write!(f, "local"),
            Origin::Merged => write!(f, "merged"),
            Origin::ImportedOnly => write!(f, "imported-only"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LicenseRisk {
    Permissive,
    WeakCopyleft,
    StrongCopyleft,
    Proprietary,
    Unknown,
}

impl std::fmt::Display for LicenseRisk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LicenseRisk::Permissive => write!(f, "Permissive"),
            LicenseRisk::WeakCopyleft => write!(f, "Weak Copyleft"),
            LicenseRisk::StrongCopyleft => write!(f, "Strong Copyleft"),
            LicenseRisk::Proprietary => write!(f, "Proprietary"),
            LicenseRisk::Unknown => write!(f, "Unknown"),
        }
    }
}

/// A registry-backed license identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CanonicalLicense {
    pub id: String,
    pub name: String,
    pub url: String,
    pub risk: LicenseRisk,
}

/// Result of normalizing one raw license string (or one operand of an expression).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum NormalizedLicense {
    Resolved(CanonicalLicense),
    Unresolved { raw: String },
}

impl NormalizedLicense {
    /// Canonical ID when resolved, otherwise the raw string.
    pub fn label(&self) -> &str {
        match self {
            NormalizedLicense::Resolved(license) => &license.id,
            NormalizedLicense::Unresolved { raw } => raw,
        }
    }

    pub fn canonical(&self) -> Option<&CanonicalLicense> {
        match self {
            NormalizedLicense::Resolved(license) => Some(license),
            NormalizedLicense::Unresolved { .. } => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum Outcome {
    Allowed,
    /// `license` is `None` when a policy override denied the dependency.
    Violation {
        license: Option<String>,
        reason: String,
    },
    Unknown,
}

impl Outcome {
    pub fn is_violation(&self) -> bool {
        matches!(self, Outcome::Violation { .. })
    }
}

impl std::fmt::Display for Outcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Outcome::Allowed => write!(f, "allowed"),
            Outcome::Violation { .. } => write!(f, "violation"),
            Outcome::Unknown => write!(f, "unknown"),
        }
    }
}

/// One dependency evaluated against the policy.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Verdict {
    pub dependency: Dependency,
    pub licenses: Vec<NormalizedLicense>,
    #[serde(flatten)]
    pub outcome: Outcome,
}

impl Verdict {
    /// Licenses joined with ` AND `, or `unknown` when none were declared.
    pub fn license_label(&self) -> String {
        if self.licenses.is_empty() {
            return "unknown".to_string();
        }
        self.licenses
            .iter()
            .map(NormalizedLicense::label)
            .collect::<Vec<_>>()
            .join(" AND ")
    }
}
