//! One report run: scope selection, filtering, optional online enrichment,
//! importer merge, normalization and policy evaluation.
//!
//! Everything is built once in [`Pipeline::from_config`] and read-only
//! afterwards. [`Pipeline::run`] consumes the resolved input and yields the
//! immutable [`Report`] handed to the renderers.

use anyhow::Result;
use colored::Colorize;

use crate::config::{Config, FailOn};
use crate::error::FatalError;
use crate::filter::{self, DependencyFilter};
use crate::importer::{self, Importer};
use crate::input::ResolvedInput;
use crate::license::alias::AliasTable;
use crate::license::normalizer::normalize;
use crate::models::{Dependency, NormalizedLicense, Origin};
use crate::policy::{evaluate, resolve_policy, Policy};
use crate::registry;
use crate::report::{DispatchOutcome, Report, ReportMetadata, RunStats};

pub struct Pipeline {
    pub project: String,
    /// Requested scopes; empty means every scope.
    pub scopes: Vec<String>,
    pub online: bool,
    pub quiet: bool,
    pub aliases: AliasTable,
    pub policy: Policy,
    pub filters: Vec<Box<dyn DependencyFilter>>,
    pub importers: Vec<Box<dyn Importer>>,
    /// Warnings raised while building the pipeline itself.
    pub warnings: Vec<String>,
    pub rejected_aliases: usize,
}

impl Pipeline {
    /// Build the alias table, policy, filter chain and importers from `config`.
    ///
    /// Fails on a fatal policy error or an invalid filter pattern.
    pub fn from_config(config: &Config, project: &str, quiet: bool) -> Result<Pipeline> {
        let (aliases, alias_warnings) = AliasTable::bundled().with_overrides(&config.aliases);
        let (policy, policy_warnings) = resolve_policy(&config.policy, &aliases)?;
        let filters = filter::from_config(&config.filters)?;
        let importers = importer::from_config(&config.importers);

        for warning in alias_warnings.iter().chain(&policy_warnings) {
            tracing::warn!("{warning}");
        }
        tracing::debug!(
            allowed = ?policy.allowed().collect::<Vec<_>>(),
            filters = filters.len(),
            importers = importers.len(),
            "pipeline ready"
        );

        let rejected_aliases = alias_warnings.len();
        let mut warnings = alias_warnings;
        warnings.extend(policy_warnings);

        Ok(Pipeline {
            project: project.to_string(),
            scopes: config.scopes.clone(),
            online: config.online,
            quiet,
            aliases,
            policy,
            filters,
            importers,
            warnings,
            rejected_aliases,
        })
    }

    pub async fn run(self, input: ResolvedInput) -> Result<Report> {
        let mut stats = RunStats {
            input_dependencies: input.dependencies.len(),
            duplicates_collapsed: input.duplicates,
            rejected_aliases: self.rejected_aliases,
            ..RunStats::default()
        };
        let mut warnings = self.warnings.clone();
        if input.duplicates > 0 {
            warnings.push(format!("{} duplicate dependency row(s) collapsed", input.duplicates));
        }
        self.progress(format!("read {} dependencies", input.dependencies.len()));

        let selected = select_scopes(input.dependencies, &self.scopes)?;

        let before = selected.len();
        let mut local = filter::apply(selected, &self.filters);
        stats.filtered_out = before - local.len();
        if stats.filtered_out > 0 {
            self.progress(format!("filtered out {} dependencies", stats.filtered_out));
        }

        if self.online {
            let enriched = registry::enrich(local, self.quiet).await?;
            stats.online_lookups = enriched.looked_up;
            stats.online_lookup_failures = enriched.failed;
            if enriched.failed > 0 {
                warnings.push(format!("{} online license lookup(s) failed", enriched.failed));
            }
            self.progress(format!(
                "found licenses for {}/{} dependencies online",
                enriched.found, enriched.looked_up
            ));
            local = enriched.dependencies;
        }

        let imported = self.import_all(&mut stats, &mut warnings);
        let merged = importer::merge(local, imported);
        stats.merged = merged.iter().filter(|d| d.origin == Origin::Merged).count();
        stats.imported_only = merged.iter().filter(|d| d.origin == Origin::ImportedOnly).count();

        let report = self.evaluate_all(merged, stats, warnings);
        self.progress(format!("evaluated {} dependencies", report.summary.total));
        Ok(report)
    }

    /// Run every importer. An unreadable file becomes a warning and the run
    /// continues without it.
    fn import_all(&self, stats: &mut RunStats, warnings: &mut Vec<String>) -> Vec<Dependency> {
        let mut imported = Vec::new();
        for importer in &self.importers {
            match importer.import() {
                Ok(outcome) => {
                    stats.imported_records += outcome.dependencies.len();
                    stats.imported_records_skipped += outcome.skipped;
                    if outcome.skipped > 0 {
                        warnings.push(format!(
                            "importer '{}': skipped {} record(s) without group, name or license",
                            importer.name(),
                            outcome.skipped
                        ));
                    }
                    self.progress(format!(
                        "imported {} records from {}",
                        outcome.dependencies.len(),
                        importer.name()
                    ));
                    imported.extend(outcome.dependencies);
                }
                Err(err) => {
                    stats.import_files_failed += 1;
                    tracing::warn!(importer = importer.name(), file = %importer.path().display(), "import failed: {err:#}");
                    warnings.push(format!("importer '{}' ignored: {err:#}", importer.name()));
                }
            }
        }
        imported
    }

    fn evaluate_all(&self, deps: Vec<Dependency>, mut stats: RunStats, warnings: Vec<String>) -> Report {
        let verdicts = deps
            .iter()
            .map(|dep| {
                let licenses = normalize(dep, &self.aliases);
                stats.unresolved_licenses += licenses
                    .iter()
                    .filter(|l| matches!(l, NormalizedLicense::Unresolved { .. }))
                    .count();
                evaluate(dep, &licenses, &self.policy)
            })
            .collect();

        let mut metadata = ReportMetadata::new(&self.project, chrono::Utc::now());
        metadata.warnings = warnings;
        metadata.stats = stats;
        Report::build(metadata, verdicts)
    }

    fn progress(&self, message: String) {
        if !self.quiet {
            eprintln!("  {} {}", "→".cyan(), message);
        }
    }
}

/// Keep dependencies of the requested scopes (case-insensitive).
///
/// An empty request keeps everything. A non-empty request that matches
/// nothing is fatal: the build asked for scopes that do not exist.
pub fn select_scopes(deps: Vec<Dependency>, requested: &[String]) -> Result<Vec<Dependency>> {
    if requested.is_empty() {
        return Ok(deps);
    }
    let selected: Vec<Dependency> = deps
        .into_iter()
        .filter(|d| requested.iter().any(|s| s.eq_ignore_ascii_case(&d.scope)))
        .collect();
    if selected.is_empty() {
        return Err(FatalError::NoDependencies(requested.to_vec()).into());
    }
    Ok(selected)
}

pub fn should_fail(report: &Report, fail_on: &FailOn) -> bool {
    (fail_on.violation && report.summary.violations > 0) || (fail_on.unknown && report.summary.unknown > 0)
}

/// `1` when the fail-on threshold is met, `2` when only a renderer failed, else `0`.
pub fn exit_code(report: &Report, fail_on: &FailOn, dispatch: &DispatchOutcome) -> i32 {
    if should_fail(report, fail_on) {
        1
    } else if !dispatch.failures.is_empty() {
        2
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ImporterConfig, PolicyConfig};
    use crate::error::RenderError;
    use crate::models::Outcome;
    use crate::policy::Decision;
    use crate::report::RenderFailure;
    use std::path::Path;
    use tempfile::tempdir;

    fn pipeline(allowed: &[&str]) -> Pipeline {
        Pipeline {
            project: "Backend".to_string(),
            scopes: Vec::new(),
            online: false,
            quiet: true,
            aliases: AliasTable::bundled(),
            policy: Policy::allowing(allowed.iter().copied()),
            filters: Vec::new(),
            importers: Vec::new(),
            warnings: Vec::new(),
            rejected_aliases: 0,
        }
    }

    fn input(deps: Vec<Dependency>) -> ResolvedInput {
        ResolvedInput {
            project: None,
            dependencies: deps,
            duplicates: 0,
        }
    }

    fn foo() -> Dependency {
        Dependency::new("org.example", "foo", "1.0", "runtimeClasspath").with_licenses(["The MIT License"])
    }

    fn bar() -> Dependency {
        Dependency::new("org.example", "bar", "2.0", "runtimeClasspath")
    }

    #[tokio::test]
    async fn test_alias_resolves_to_allowed() {
        let report = pipeline(&["MIT"]).run(input(vec![foo()])).await.unwrap();
        let verdict = report.verdicts().next().unwrap();
        assert_eq!(verdict.outcome, Outcome::Allowed);
        assert_eq!(verdict.license_label(), "MIT");
    }

    #[tokio::test]
    async fn test_no_license_is_unknown_and_fails_when_configured() {
        let report = pipeline(&["MIT"]).run(input(vec![bar()])).await.unwrap();
        assert_eq!(report.summary.unknown, 1);

        let default = FailOn::default();
        assert!(!should_fail(&report, &default));
        let strict = FailOn {
            violation: true,
            unknown: true,
        };
        assert!(should_fail(&report, &strict));
        assert_eq!(exit_code(&report, &strict, &DispatchOutcome::default()), 1);
    }

    #[tokio::test]
    async fn test_dual_license_with_disallowed_member_is_violation() {
        let dep = Dependency::new("org.example", "dual", "1.0", "runtime").with_licenses(["MIT", "GPL-3.0"]);
        let report = pipeline(&["MIT"]).run(input(vec![dep])).await.unwrap();
        assert_eq!(report.summary.violations, 1);
        assert!(should_fail(&report, &FailOn::default()));
    }

    #[tokio::test]
    async fn test_renderer_failure_alone_exits_two() {
        let report = pipeline(&["MIT"]).run(input(vec![foo()])).await.unwrap();
        let dispatch = DispatchOutcome {
            artifacts: Vec::new(),
            failures: vec![RenderFailure {
                renderer: "inventory-html".to_string(),
                error: RenderError::Panicked("boom".to_string()),
            }],
        };
        assert_eq!(exit_code(&report, &FailOn::default(), &dispatch), 2);
        assert_eq!(exit_code(&report, &FailOn::default(), &DispatchOutcome::default()), 0);
    }

    #[test]
    fn test_requested_scope_without_match_is_fatal() {
        let err = select_scopes(vec![foo()], &["testRuntimeClasspath".to_string()]).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<FatalError>(),
            Some(FatalError::NoDependencies(_))
        ));
    }

    #[test]
    fn test_scope_selection() {
        let compile = Dependency::new("g", "c", "1", "compileClasspath");
        let selected = select_scopes(vec![foo(), compile], &["RuntimeClasspath".to_string()]).unwrap();
        assert_eq!(selected, vec![foo()]);
        assert_eq!(select_scopes(vec![foo()], &[]).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_imported_records_are_merged_and_normalized() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("frontend.json");
        std::fs::write(
            &path,
            r#"{"dependencies": [
                {"group": "org.example", "name": "bar", "licenses": ["Apache 2.0"]},
                {"group": "npm", "name": "react", "version": "18.2.0", "licenses": ["MIT"]},
                {"group": "npm", "name": "broken"}
            ]}"#,
        )
        .unwrap();

        let mut pipeline = pipeline(&["MIT", "Apache-2.0"]);
        pipeline.importers = importer::from_config(&[ImporterConfig::Json {
            name: "Front End".to_string(),
            path,
        }]);
        let report = pipeline.run(input(vec![foo(), bar()])).await.unwrap();

        assert_eq!(report.summary.allowed, 3);
        assert_eq!(report.metadata.stats.merged, 1);
        assert_eq!(report.metadata.stats.imported_only, 1);
        assert_eq!(report.metadata.stats.imported_records_skipped, 1);
        assert_eq!(report.sections.last().unwrap().scope, "Front End");
        assert_eq!(report.metadata.warnings.len(), 1);
    }

    #[tokio::test]
    async fn test_unreadable_import_file_is_a_warning() {
        let mut pipeline = pipeline(&["MIT"]);
        pipeline.importers = importer::from_config(&[ImporterConfig::Xml {
            name: "Front End".to_string(),
            path: Path::new("/nonexistent/frontend.xml").to_path_buf(),
        }]);
        let report = pipeline.run(input(vec![foo()])).await.unwrap();
        assert_eq!(report.metadata.stats.import_files_failed, 1);
        assert!(report.metadata.warnings[0].contains("Front End"));
        assert_eq!(report.summary.allowed, 1);
    }

    #[tokio::test]
    async fn test_override_beats_license() {
        let mut pipeline = pipeline(&["MIT"]);
        pipeline.policy = pipeline
            .policy
            .with_override("org.example", "foo", Decision::Deny, Some("legal hold"));
        let report = pipeline.run(input(vec![foo()])).await.unwrap();
        let verdict = report.verdicts().next().unwrap();
        assert_eq!(
            verdict.outcome,
            Outcome::Violation {
                license: None,
                reason: "legal hold".to_string()
            }
        );
    }

    #[test]
    fn test_from_config_collects_setup_warnings() {
        let mut config = Config::default();
        config.aliases.insert("Foo License".to_string(), "NOT-A-LICENSE".to_string());
        config.policy = PolicyConfig::default();
        let pipeline = Pipeline::from_config(&config, "Backend", true).unwrap();
        assert_eq!(pipeline.rejected_aliases, 1);
        // Rejected alias plus the built-in policy fallback.
        assert_eq!(pipeline.warnings.len(), 2);
    }

    #[test]
    fn test_required_policy_without_file_is_fatal() {
        let mut config = Config::default();
        config.policy.required = true;
        let err = Pipeline::from_config(&config, "Backend", true).err().unwrap();
        assert!(matches!(
            err.downcast_ref::<FatalError>(),
            Some(FatalError::PolicyNotConfigured)
        ));
    }
}
