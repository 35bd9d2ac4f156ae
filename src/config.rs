use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

/// Directory (relative to the project) holding the default config file.
pub const CONFIG_DIR: &str = ".dep-license-report";

/// Where renderers write when nothing else is configured.
pub const DEFAULT_OUTPUT_DIR: &str = "build/reports/dependency-license";

/// Root configuration structure, deserialized from `.dep-license-report/config.toml`.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Project name shown in report headings. Defaults to the input's
    /// `project` field, then the project directory name.
    pub project: Option<String>,
    /// Scopes (build configurations) to report. Empty means all scopes.
    pub scopes: Vec<String>,
    /// Look up missing licenses on Maven Central.
    pub online: bool,
    pub renderers: Vec<RendererConfig>,
    /// Applied in declared order.
    pub filters: Vec<FilterConfig>,
    pub importers: Vec<ImporterConfig>,
    pub policy: PolicyConfig,
    pub fail_on: FailOn,
    /// Extra `"free-text license" = "SPDX-ID"` aliases; these win over the bundled ones.
    pub aliases: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum RendererConfig {
    /// Human-readable inventory document.
    InventoryHtml {
        output: PathBuf,
        #[serde(default)]
        title: Option<String>,
    },
    /// Machine-readable report.
    Json {
        output: PathBuf,
        #[serde(default)]
        pretty: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum FilterConfig {
    ExcludeWithoutArtifacts,
    /// Regex patterns matched against `group:name`.
    Exclude { patterns: Vec<String> },
    /// Regex patterns matched against `group:name`.
    Include { patterns: Vec<String> },
    Scope { scopes: Vec<String> },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum ImporterConfig {
    Xml { name: String, path: PathBuf },
    Json { name: String, path: PathBuf },
}

impl ImporterConfig {
    /// Pick the importer kind from the file extension (`.xml`, otherwise JSON);
    /// the importer is named after the file stem.
    pub fn from_path(path: &Path) -> Self {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("imported")
            .to_string();
        let is_xml = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("xml"));
        if is_xml {
            ImporterConfig::Xml {
                name,
                path: path.to_path_buf(),
            }
        } else {
            ImporterConfig::Json {
                name,
                path: path.to_path_buf(),
            }
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PolicyConfig {
    /// JSON or TOML allow-list file.
    pub allowed_licenses_file: Option<PathBuf>,
    /// A missing policy file aborts the run instead of falling back to the
    /// built-in allow-list.
    pub required: bool,
}

/// Which verdicts make the run exit with code 1.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FailOn {
    pub violation: bool,
    pub unknown: bool,
}

impl Default for FailOn {
    fn default() -> Self {
        FailOn {
            violation: true,
            unknown: false,
        }
    }
}

impl Default for Config {
    /// Report every scope, render HTML and JSON into [`DEFAULT_OUTPUT_DIR`],
    /// and fail on violations only.
    fn default() -> Self {
        Config {
            project: None,
            scopes: Vec::new(),
            online: false,
            renderers: default_renderers(Path::new(DEFAULT_OUTPUT_DIR), None),
            filters: Vec::new(),
            importers: Vec::new(),
            policy: PolicyConfig::default(),
            fail_on: FailOn::default(),
            aliases: BTreeMap::new(),
        }
    }
}

/// The standard pair of renderers writing `index.html` and `report.json` into `dir`.
pub fn default_renderers(dir: &Path, title: Option<String>) -> Vec<RendererConfig> {
    vec![
        RendererConfig::InventoryHtml {
            output: dir.join("index.html"),
            title,
        },
        RendererConfig::Json {
            output: dir.join("report.json"),
            pretty: true,
        },
    ]
}

impl Config {
    /// Make every relative path in the config absolute against `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        for renderer in &mut self.renderers {
            match renderer {
                RendererConfig::InventoryHtml { output, .. } | RendererConfig::Json { output, .. } => {
                    *output = resolve(base, output);
                }
            }
        }
        for importer in &mut self.importers {
            match importer {
                ImporterConfig::Xml { path, .. } | ImporterConfig::Json { path, .. } => {
                    *path = resolve(base, path);
                }
            }
        }
        if let Some(file) = self.policy.allowed_licenses_file.as_mut() {
            *file = resolve(base, file);
        }
    }
}

fn resolve(base: &Path, path: &Path) -> PathBuf {
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        base.join(path)
    }
}

/// Load the configuration, searching in order:
///
/// 1. `config_override` — path passed via `--config`
/// 2. `<project_path>/.dep-license-report/config.toml`
/// 3. `~/.config/dep-license-report/config.toml`
/// 4. Built-in [`Config::default`]
///
/// Relative paths are resolved against `project_path` in every case.
pub fn load_config(project_path: &Path, config_override: Option<&Path>) -> Result<Config> {
    let mut config = match find_config_file(project_path, config_override) {
        Some(path) => {
            tracing::debug!(path = %path.display(), "loading config");
            let content = std::fs::read_to_string(&path)
                .with_context(|| format!("Failed to read config {}", path.display()))?;
            toml::from_str(&content)
                .with_context(|| format!("Failed to parse config {}", path.display()))?
        }
        None => Config::default(),
    };
    config.resolve_paths(project_path);
    Ok(config)
}

fn find_config_file(project_path: &Path, config_override: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = config_override {
        return Some(path.to_path_buf());
    }

    let project_config = project_path.join(CONFIG_DIR).join("config.toml");
    if project_config.exists() {
        return Some(project_config);
    }

    let home_config = dirs::home_dir()?
        .join(".config")
        .join("dep-license-report")
        .join("config.toml");
    home_config.exists().then_some(home_config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    const SAMPLE: &str = r#"
project = "Backend"
scopes = ["runtimeClasspath"]

[[renderers]]
kind = "inventory-html"
output = "reports/index.html"
title = "Backend"

[[renderers]]
kind = "json"
output = "/tmp/report.json"
pretty = true

[[filters]]
kind = "exclude-without-artifacts"

[[filters]]
kind = "exclude"
patterns = ["^org\\.example:internal-.*"]

[[importers]]
kind = "xml"
name = "Front End"
path = "../configs/externalDependencies.xml"

[policy]
allowed_licenses_file = "../configs/allow-mit-sample.json"
required = true

[fail_on]
unknown = true

[aliases]
"The Acme License" = "MIT"
"#;

    #[test]
    fn test_parse_full_config() {
        let config: Config = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.project.as_deref(), Some("Backend"));
        assert_eq!(config.scopes, vec!["runtimeClasspath"]);
        assert_eq!(config.renderers.len(), 2);
        assert_eq!(
            config.filters,
            vec![
                FilterConfig::ExcludeWithoutArtifacts,
                FilterConfig::Exclude {
                    patterns: vec![r"^org\.example:internal-.*".to_string()]
                }
            ]
        );
        assert!(config.policy.required);
        assert!(config.fail_on.violation);
        assert!(config.fail_on.unknown);
        assert_eq!(config.aliases.get("The Acme License").map(String::as_str), Some("MIT"));
    }

    #[test]
    fn test_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.renderers.len(), 2);
        assert!(config.fail_on.violation);
        assert!(!config.fail_on.unknown);
        assert!(config.policy.allowed_licenses_file.is_none());
    }

    #[test]
    fn test_unknown_renderer_kind_is_rejected() {
        let err = toml::from_str::<Config>("[[renderers]]\nkind = \"pdf\"\noutput = \"x.pdf\"\n");
        assert!(err.is_err());
    }

    #[test]
    fn test_load_from_project_dir_resolves_relative_paths() {
        let dir = tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join(CONFIG_DIR)).unwrap();
        std::fs::write(dir.path().join(CONFIG_DIR).join("config.toml"), SAMPLE).unwrap();

        let config = load_config(dir.path(), None).unwrap();
        assert_eq!(
            config.renderers[0],
            RendererConfig::InventoryHtml {
                output: dir.path().join("reports/index.html"),
                title: Some("Backend".to_string()),
            }
        );
        assert_eq!(
            config.renderers[1],
            RendererConfig::Json {
                output: PathBuf::from("/tmp/report.json"),
                pretty: true,
            }
        );
        assert_eq!(
            config.policy.allowed_licenses_file,
            Some(dir.path().join("../configs/allow-mit-sample.json"))
        );
    }

    #[test]
    fn test_override_path_wins() {
        let dir = tempdir().unwrap();
        let custom = dir.path().join("custom.toml");
        std::fs::write(&custom, "project = \"Custom\"\n").unwrap();
        let config = load_config(dir.path(), Some(&custom)).unwrap();
        assert_eq!(config.project.as_deref(), Some("Custom"));
    }

    #[test]
    fn test_missing_override_is_an_error() {
        let dir = tempdir().unwrap();
        let err = load_config(dir.path(), Some(&dir.path().join("nope.toml"))).unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }

    #[test]
    fn test_importer_from_path() {
        assert_eq!(
            ImporterConfig::from_path(Path::new("configs/frontend.xml")),
            ImporterConfig::Xml {
                name: "frontend".to_string(),
                path: PathBuf::from("configs/frontend.xml"),
            }
        );
        assert!(matches!(
            ImporterConfig::from_path(Path::new("web.json")),
            ImporterConfig::Json { .. }
        ));
    }
}
