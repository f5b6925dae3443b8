//! Logging utilities.
//!
//! Provides structured JSON or human-readable logging with run IDs so the
//! events of one valuation run can be correlated.
//!
//! # Noise Filtering
//!
//! Thread-pool internals (rayon) are set to `warn` so per-chunk scheduling
//! chatter does not drown engine events at `debug`.

use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

/// Default noisy modules that should be filtered to warn level.
pub const NOISY_MODULES: &[&str] = &["rayon", "rayon_core"];

/// Build the default EnvFilter with noise suppression.
///
/// `RUST_LOG` wins when set; otherwise the base level applies with noisy
/// modules lowered to `warn`.
fn build_filter(log_level: &str) -> EnvFilter {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return filter;
    }

    EnvFilter::new(filter_directives(log_level))
}

fn filter_directives(log_level: &str) -> String {
    let mut directives = String::from(log_level);

    for module in NOISY_MODULES {
        directives.push_str(&format!(",{}=warn", module));
    }

    directives
}

/// Initialize logging with the given configuration.
///
/// # Arguments
///
/// * `log_level` - Base log level (trace, debug, info, warn, error)
/// * `log_format` - Output format: "json" for structured JSON, "pretty" for human-readable
///
/// Safe to call more than once; only the first call installs a subscriber.
pub fn init_logging(log_level: &str, log_format: &str) {
    let filter = build_filter(log_level);

    let subscriber = tracing_subscriber::registry().with(filter);

    if log_format == "json" {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .json()
            .with_span_events(FmtSpan::CLOSE)
            .with_current_span(true)
            .with_target(true)
            .with_file(true)
            .with_line_number(true);
        let _ = subscriber.with(fmt_layer).try_init();
    } else {
        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_ansi(true)
            .with_target(true)
            .with_file(false)
            .with_line_number(false);
        let _ = subscriber.with(fmt_layer).try_init();
    }

    tracing::info!(
        log_level = %log_level,
        log_format = %log_format,
        noise_filtered = NOISY_MODULES.len(),
        "Logging initialized"
    );
}

/// Generate a new run ID for correlating the events of one valuation.
pub fn generate_run_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// Create the tracing span that wraps one engine run.
///
/// # Example
///
/// ```ignore
/// let span = run_span!("valuation_run", run_id, locations = 3);
/// let _enter = span.enter();
/// ```
#[macro_export]
macro_rules! run_span {
    ($name:expr, $run_id:expr) => {
        tracing::info_span!($name, run_id = %$run_id)
    };
    ($name:expr, $run_id:expr, $($field:tt)*) => {
        tracing::info_span!($name, run_id = %$run_id, $($field)*)
    };
}
