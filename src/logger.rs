use crate::constants::{ENV_LOG, ENV_LOG_VERBOSE};
use std::sync::OnceLock;
use tracing_subscriber::EnvFilter;

const DEFAULT_DIRECTIVE: &str = "info";
const VERBOSE_DIRECTIVE: &str = "mixer_resilience=debug";

static LOGGER: OnceLock<()> = OnceLock::new();

/// Filter directive from `MIXER_LOG`, then `RUST_LOG`, then `info`.
/// `MIXER_LOG_VERBOSE=1` additionally raises this crate to `debug`.
fn filter_directive<F>(lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let base = lookup(ENV_LOG)
        .or_else(|| lookup("RUST_LOG"))
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| DEFAULT_DIRECTIVE.to_string());

    let verbose = lookup(ENV_LOG_VERBOSE)
        .map(|v| v.trim() == "1")
        .unwrap_or(false);

    if verbose {
        format!("{},{}", base, VERBOSE_DIRECTIVE)
    } else {
        base
    }
}

/// Install the global fmt subscriber. Safe to call more than once; only the
/// first call has any effect.
pub fn init_logger() {
    LOGGER.get_or_init(|| {
        let directive = filter_directive(|key| std::env::var(key).ok());
        let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new(DEFAULT_DIRECTIVE));

        // Another subscriber may already be installed (e.g. by a test harness)
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    });
}
