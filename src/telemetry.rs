use tracing::metadata::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry};

/// Overrides the level chosen from `-v` / `-q`, e.g. `DEP_LICENSE_REPORT_LOG=debug`.
pub const LOG_ENV_VAR: &str = "DEP_LICENSE_REPORT_LOG";

/// Install the global stderr subscriber. Safe to call once per process.
pub fn init(verbose: bool, quiet: bool) {
    let filter = EnvFilter::builder()
        .with_default_directive(default_level(verbose, quiet).into())
        .with_env_var(LOG_ENV_VAR)
        .from_env_lossy();

    let layer = tracing_subscriber::fmt::layer()
        .compact()
        .with_writer(std::io::stderr)
        .with_target(false);

    // A subscriber may already be installed (tests); keep the existing one.
    let _ = Registry::default().with(filter).with(layer).try_init();
}

fn default_level(verbose: bool, quiet: bool) -> LevelFilter {
    match (verbose, quiet) {
        (_, true) => LevelFilter::ERROR,
        (true, false) => LevelFilter::DEBUG,
        (false, false) => LevelFilter::WARN,
    }
}
