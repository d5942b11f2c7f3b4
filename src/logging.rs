//! Diagnostics for `tira-textnorm` runs.
//!
//! Every pipeline stage emits an `info!` event with `stage`, `rows_in`,
//! `remaining` and `affected` fields; per-record detail (dropped rows,
//! offending characters, unstable substitutions) is at `debug!`/`warn!`.
//! These go to stderr. The Preprocessing Log is separate: it is printed to
//! stdout by the binary and written into the dataset README.
//!
//! `RUST_LOG` overrides the filter. `RUST_LOG_FORMAT=json` switches to JSON
//! lines, which keeps the stage fields machine readable.

use tracing_subscriber::EnvFilter;

/// Filter used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_FILTER: &str = "tira_textnorm=info";

/// Selects the output format.
pub const LOG_FORMAT_ENV: &str = "RUST_LOG_FORMAT";

fn json_requested(format: Option<&str>) -> bool {
    format.is_some_and(|v| v.trim().eq_ignore_ascii_case("json"))
}

/// Install the global subscriber. Later calls are no-ops, so tests and
/// embedding callers can call it freely.
pub fn init() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));
    let format = std::env::var(LOG_FORMAT_ENV).ok();

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false);

    if json_requested(format.as_deref()) {
        let _ = subscriber.json().try_init();
    } else {
        let _ = subscriber.try_init();
    }
}
