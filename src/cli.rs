use std::path::{Path, PathBuf};

use clap::Parser;

use crate::config::{default_renderers, Config, ImporterConfig, RendererConfig, DEFAULT_OUTPUT_DIR};

/// Input files tried in the project directory when none is given.
const DEFAULT_INPUTS: &[&str] = &["gradle.lockfile", "build/dependencies.json", "dependencies.json"];

#[derive(Parser, Debug)]
#[command(
    name = "dep-license-report",
    about = "Normalize dependency licenses, check them against an allow-list, and render reports",
    version
)]
pub struct Cli {
    /// Resolved dependency list (gradle.lockfile or JSON) [default: first of gradle.lockfile, build/dependencies.json, dependencies.json in the project]
    pub input: Option<PathBuf>,

    /// Config file [default: <project>/.dep-license-report/config.toml, fallback ~/.config/dep-license-report/config.toml]
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Project directory; relative config paths resolve against it
    #[arg(long, default_value = ".")]
    pub project: PathBuf,

    /// Only report this scope (repeatable)
    #[arg(long = "scope", value_name = "SCOPE")]
    pub scopes: Vec<String>,

    /// Merge an external report, XML or JSON by extension (repeatable)
    #[arg(long = "import", value_name = "FILE")]
    pub imports: Vec<PathBuf>,

    /// Allow-list policy file (JSON or TOML)
    #[arg(long, value_name = "FILE")]
    pub allowed_licenses: Option<PathBuf>,

    /// Abort when the policy file is missing instead of using the built-in allow-list
    #[arg(long)]
    pub require_policy: bool,

    /// Report format (repeatable); replaces the configured renderers
    #[arg(long = "report", value_name = "FORMAT")]
    pub reports: Vec<ReportFormat>,

    /// Directory for --report artifacts [default: build/reports/dependency-license]
    #[arg(long, value_name = "DIR")]
    pub output_dir: Option<PathBuf>,

    /// Exit 1 when any dependency has an unknown license
    #[arg(long)]
    pub fail_on_unknown: bool,

    /// Look up missing licenses on Maven Central
    #[arg(long)]
    pub online: bool,

    /// Show all dependencies (not just violations/unknowns)
    #[arg(short, long)]
    pub verbose: bool,

    /// Only print summary line
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ReportFormat {
    Html,
    Json,
}

impl Cli {
    /// Layer command-line options over the loaded config.
    ///
    /// `project` is the canonical project directory used for relative paths.
    pub fn apply_overrides(&self, config: &mut Config, project: &Path) {
        if !self.scopes.is_empty() {
            config.scopes = self.scopes.clone();
        }
        config
            .importers
            .extend(self.imports.iter().map(|p| ImporterConfig::from_path(p)));
        if let Some(file) = &self.allowed_licenses {
            config.policy.allowed_licenses_file = Some(file.clone());
        }
        config.policy.required |= self.require_policy;
        config.fail_on.unknown |= self.fail_on_unknown;
        config.online |= self.online;

        if !self.reports.is_empty() || self.output_dir.is_some() {
            let dir = self
                .output_dir
                .clone()
                .unwrap_or_else(|| project.join(DEFAULT_OUTPUT_DIR));
            let title = config.project.clone();
            config.renderers = if self.reports.is_empty() {
                default_renderers(&dir, title)
            } else {
                self.renderers_for(&dir, title)
            };
        }
    }

    fn renderers_for(&self, dir: &Path, title: Option<String>) -> Vec<RendererConfig> {
        let mut renderers = Vec::new();
        for format in &self.reports {
            let renderer = match format {
                ReportFormat::Html => RendererConfig::InventoryHtml {
                    output: dir.join("index.html"),
                    title: title.clone(),
                },
                ReportFormat::Json => RendererConfig::Json {
                    output: dir.join("report.json"),
                    pretty: true,
                },
            };
            if !renderers.contains(&renderer) {
                renderers.push(renderer);
            }
        }
        renderers
    }

    /// The input path as given, or the first default input present in `project`.
    pub fn input_path(&self, project: &Path) -> PathBuf {
        if let Some(input) = &self.input {
            return input.clone();
        }
        DEFAULT_INPUTS
            .iter()
            .map(|name| project.join(name))
            .find(|path| path.exists())
            .unwrap_or_else(|| project.join(DEFAULT_INPUTS[0]))
    }
}
