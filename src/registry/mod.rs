//! Online license enrichment from upstream package registries.
//!
//! Only dependencies that resolved locally and declare no license are looked
//! up. A failed lookup leaves the dependency as it was and is counted.

pub mod maven;

use anyhow::Result;
use futures::future::join_all;
use indicatif::{ProgressBar, ProgressStyle};

use crate::models::{Dependency, Origin};

const BATCH_SIZE: usize = 75;

#[derive(Debug, Default)]
pub struct EnrichOutcome {
    pub dependencies: Vec<Dependency>,
    pub looked_up: usize,
    pub found: usize,
    pub failed: usize,
}

fn needs_lookup(dep: &Dependency) -> bool {
    dep.origin == Origin::Local && dep.licenses.is_empty() && !dep.group.is_empty()
}

/// Fill in missing licenses from Maven Central, in batches of concurrent requests.
pub async fn enrich(deps: Vec<Dependency>, quiet: bool) -> Result<EnrichOutcome> {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(10))
        .build()?;

    let pending = deps.iter().filter(|d| needs_lookup(d)).count();
    let pb = if !quiet && pending > 0 {
        let pb = ProgressBar::new(pending as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
                .progress_chars("#>-"),
        );
        Some(pb)
    } else {
        None
    };

    let mut outcome = EnrichOutcome::default();
    let mut remaining = deps.into_iter().peekable();

    while remaining.peek().is_some() {
        let batch: Vec<Dependency> = remaining.by_ref().take(BATCH_SIZE).collect();

        let lookups = batch.iter().map(|dep| {
            let client = client.clone();
            let lookup = needs_lookup(dep);
            let (group, name, version) = (dep.group.clone(), dep.name.clone(), dep.version.clone());
            async move {
                if lookup {
                    Some(maven::fetch_licenses(&client, &group, &name, &version).await)
                } else {
                    None
                }
            }
        });
        let results = join_all(lookups).await;

        for (dep, result) in batch.into_iter().zip(results) {
            let dep = match result {
                None => dep,
                Some(result) => {
                    outcome.looked_up += 1;
                    if let Some(pb) = &pb {
                        pb.inc(1);
                    }
                    match result {
                        Ok(licenses) if !licenses.is_empty() => {
                            outcome.found += 1;
                            dep.with_licenses(licenses)
                        }
                        Ok(_) => dep,
                        Err(err) => {
                            outcome.failed += 1;
                            tracing::warn!(dependency = %dep, "license lookup failed: {err}");
                            dep
                        }
                    }
                }
            };
            outcome.dependencies.push(dep);
        }
    }

    if let Some(pb) = pb {
        pb.finish_with_message("Done");
    }

    Ok(outcome)
}
