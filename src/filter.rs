use anyhow::{Context, Result};
use regex::Regex;

use crate::config::FilterConfig;
use crate::models::Dependency;

/// A side-effect-free predicate deciding whether a dependency stays in the report.
pub trait DependencyFilter: Send + Sync {
    fn name(&self) -> &str;
    fn accept(&self, dep: &Dependency) -> bool;
}

/// Drops platform/BOM entries that resolve to no artifact.
pub struct ExcludeWithoutArtifacts;

impl DependencyFilter for ExcludeWithoutArtifacts {
    fn name(&self) -> &str {
        "exclude-without-artifacts"
    }

    fn accept(&self, dep: &Dependency) -> bool {
        dep.has_artifact
    }
}

/// Drops every dependency whose `group:name` matches one of the patterns.
pub struct ExcludeMatching {
    patterns: Vec<Regex>,
}

impl DependencyFilter for ExcludeMatching {
    fn name(&self) -> &str {
        "exclude"
    }

    fn accept(&self, dep: &Dependency) -> bool {
        let coordinates = dep.coordinates();
        !self.patterns.iter().any(|re| re.is_match(&coordinates))
    }
}

/// Keeps only dependencies whose `group:name` matches at least one pattern.
pub struct IncludeMatching {
    patterns: Vec<Regex>,
}

impl DependencyFilter for IncludeMatching {
    fn name(&self) -> &str {
        "include"
    }

    fn accept(&self, dep: &Dependency) -> bool {
        let coordinates = dep.coordinates();
        self.patterns.iter().any(|re| re.is_match(&coordinates))
    }
}

/// Keeps only dependencies resolved for one of the named scopes (case-insensitive).
pub struct ScopeFilter {
    scopes: Vec<String>,
}

impl DependencyFilter for ScopeFilter {
    fn name(&self) -> &str {
        "scope"
    }

    fn accept(&self, dep: &Dependency) -> bool {
        self.scopes.iter().any(|s| s.eq_ignore_ascii_case(&dep.scope))
    }
}

/// Build the filter chain from configuration, preserving declared order.
pub fn from_config(configs: &[FilterConfig]) -> Result<Vec<Box<dyn DependencyFilter>>> {
    configs
        .iter()
        .map(|config| -> Result<Box<dyn DependencyFilter>> {
            Ok(match config {
                FilterConfig::ExcludeWithoutArtifacts => Box::new(ExcludeWithoutArtifacts),
                FilterConfig::Exclude { patterns } => Box::new(ExcludeMatching {
                    patterns: compile(patterns)?,
                }),
                FilterConfig::Include { patterns } => Box::new(IncludeMatching {
                    patterns: compile(patterns)?,
                }),
                FilterConfig::Scope { scopes } => Box::new(ScopeFilter {
                    scopes: scopes.clone(),
                }),
            })
        })
        .collect()
}

fn compile(patterns: &[String]) -> Result<Vec<Regex>> {
    patterns
        .iter()
        .map(|p| Regex::new(p).with_context(|| format!("Invalid filter pattern '{}'", p)))
        .collect()
}

/// Run `deps` through `filters` in order. Survivors are returned unchanged;
/// an empty chain is the identity.
pub fn apply(deps: Vec<Dependency>, filters: &[Box<dyn DependencyFilter>]) -> Vec<Dependency> {
    deps.into_iter()
        .filter(|dep| {
            filters.iter().all(|filter| {
                let keep = filter.accept(dep);
                if !keep {
                    tracing::debug!(filter = filter.name(), dependency = %dep, "filtered out");
                }
                keep
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Dependency> {
        let mut bom = Dependency::new("org.springframework", "spring-framework-bom", "5.3.23", "runtime");
        bom.has_artifact = false;
        vec![
            Dependency::new("org.springframework", "spring-tx", "3.2.3.RELEASE", "runtime")
                .with_licenses(["Apache License, Version 2.0"]),
            Dependency::new("com.sun.mail", "javax.mail", "1.5.4", "compile"),
            Dependency::new("org.example", "internal-utils", "1.0", "runtime"),
            bom,
        ]
    }

    #[test]
    fn test_empty_chain_is_identity() {
        let deps = sample();
        assert_eq!(apply(deps.clone(), &[]), deps);
    }

    #[test]
    fn test_exclude_without_artifacts() {
        let filters = from_config(&[FilterConfig::ExcludeWithoutArtifacts]).unwrap();
        let result = apply(sample(), &filters);
        assert_eq!(result.len(), 3);
        assert!(result.iter().all(|d| d.has_artifact));
    }

    #[test]
    fn test_exclude_and_include_patterns() {
        let filters = from_config(&[
            FilterConfig::Include {
                patterns: vec![r"^org\.".to_string()],
            },
            FilterConfig::Exclude {
                patterns: vec![r"^org\.example:internal-".to_string()],
            },
        ])
        .unwrap();
        let names: Vec<_> = apply(sample(), &filters).into_iter().map(|d| d.name).collect();
        assert_eq!(names, vec!["spring-tx", "spring-framework-bom"]);
    }

    #[test]
    fn test_scope_filter() {
        let filters = from_config(&[FilterConfig::Scope {
            scopes: vec!["COMPILE".to_string()],
        }])
        .unwrap();
        let result = apply(sample(), &filters);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "javax.mail");
    }

    #[test]
    fn test_survivors_are_unchanged() {
        let filters = from_config(&[FilterConfig::ExcludeWithoutArtifacts]).unwrap();
        let before = sample();
        let after = apply(before.clone(), &filters);
        for dep in &after {
            assert!(before.contains(dep));
        }
    }

    #[test]
    fn test_invalid_pattern_is_an_error() {
        let err = from_config(&[FilterConfig::Exclude {
            patterns: vec!["(".to_string()],
        }])
        .err()
        .unwrap();
        assert!(err.to_string().contains("Invalid filter pattern"));
    }
}
