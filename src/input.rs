use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result};
use regex::Regex;
use serde::Deserialize;

use crate::error::FatalError;
use crate::models::{Dependency, DependencyKey};

/// The resolved dependency list handed over by the build tool.
#[derive(Debug, Default)]
pub struct ResolvedInput {
    pub project: Option<String>,
    pub dependencies: Vec<Dependency>,
    /// Rows collapsed because their `(group, name, version, scope)` key repeated.
    pub duplicates: usize,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InputFile {
    #[serde(default)]
    project: Option<String>,
    dependencies: Vec<InputRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InputRecord {
    #[serde(default)]
    group: String,
    name: String,
    #[serde(default)]
    version: String,
    #[serde(default = "default_scope")]
    scope: String,
    #[serde(default)]
    licenses: Vec<String>,
    #[serde(default = "default_has_artifact")]
    has_artifact: bool,
}

fn default_scope() -> String {
    "default".to_string()
}

fn default_has_artifact() -> bool {
    true
}

/// Read a dependency list: a Gradle lockfile (`*.lockfile`) or the JSON format.
pub fn load_dependencies(path: &Path) -> Result<ResolvedInput> {
    if !path.exists() {
        return Err(FatalError::MissingInput(path.to_path_buf()).into());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read dependency list {}", path.display()))?;

    let is_lockfile = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e == "lockfile");

    let (project, deps) = if is_lockfile {
        let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("default");
        let scope = if stem == "gradle" { "default" } else { stem };
        (None, parse_gradle_lockfile(&content, scope)?)
    } else {
        parse_json(&content).with_context(|| format!("Failed to parse dependency list {}", path.display()))?
    };

    let (dependencies, duplicates) = dedupe(deps);
    Ok(ResolvedInput {
        project,
        dependencies,
        duplicates,
    })
}

fn parse_json(content: &str) -> Result<(Option<String>, Vec<Dependency>)> {
    let file: InputFile = serde_json::from_str(content)?;
    let deps = file
        .dependencies
        .into_iter()
        .map(|r| {
            let mut dep = Dependency::new(&r.group, &r.name, &r.version, &r.scope).with_licenses(r.licenses);
            dep.has_artifact = r.has_artifact;
            dep
        })
        .collect();
    Ok((file.project, deps))
}

/// Parse a Gradle lockfile — `group:artifact:version=conf1,conf2`.
///
/// One dependency is produced per listed configuration. Lines without `=`
/// (per-configuration lockfiles) use `fallback_scope`; `empty=` lines and
/// comments are skipped.
fn parse_gradle_lockfile(content: &str, fallback_scope: &str) -> Result<Vec<Dependency>> {
    let re = Regex::new(r"^([^:=\s]+):([^:=\s]+):([^=\s]+)(?:=(.*))?$")?;
    let mut deps = Vec::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some(caps) = re.captures(line) else {
            continue;
        };

        let configurations: Vec<&str> = caps
            .get(4)
            .map(|m| m.as_str().split(',').map(str::trim).filter(|s| !s.is_empty()).collect())
            .unwrap_or_default();

        if configurations.is_empty() {
            deps.push(Dependency::new(&caps[1], &caps[2], &caps[3], fallback_scope));
        } else {
            for scope in configurations {
                deps.push(Dependency::new(&caps[1], &caps[2], &caps[3], scope));
            }
        }
    }

    Ok(deps)
}

/// Collapse rows sharing a [`DependencyKey`], unioning their licenses.
/// Returns the unique dependencies in first-seen order and the number collapsed.
pub fn dedupe(deps: Vec<Dependency>) -> (Vec<Dependency>, usize) {
    let mut index: HashMap<DependencyKey, usize> = HashMap::new();
    let mut unique: Vec<Dependency> = Vec::new();
    let mut duplicates = 0;

    for dep in deps {
        match index.get(&dep.key()) {
            Some(&i) => {
                duplicates += 1;
                let existing = &mut unique[i];
                for license in dep.licenses {
                    if !existing.licenses.contains(&license) {
                        existing.licenses.push(license);
                    }
                }
                existing.has_artifact |= dep.has_artifact;
            }
            None => {
                index.insert(dep.key(), unique.len());
                unique.push(dep);
            }
        }
    }

    (unique, duplicates)
}
