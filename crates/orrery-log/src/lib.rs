//! Structured logging for the Orrery core.
//!
//! Installs a `tracing` subscriber with console output (uptime timestamps and
//! module paths) and, in debug builds, a JSON log file for post-mortem
//! analysis. The level comes from `RUST_LOG` when set, otherwise from
//! [`Settings::debug`](orrery_config::Settings).

use std::path::Path;

use orrery_config::Settings;
use tracing::Subscriber;
use tracing_subscriber::{
    EnvFilter, Layer, fmt, layer::SubscriberExt, registry::LookupSpan, util::SubscriberInitExt,
};

const DEFAULT_FILTER: &str = "info";
const LOG_FILE: &str = "orrery.log";

/// Filter string derived from the settings, falling back to [`DEFAULT_FILTER`].
fn filter_string(settings: Option<&Settings>) -> String {
    match settings {
        Some(settings) if !settings.debug.log_level.is_empty() => {
            settings.debug.log_level.clone()
        }
        _ => DEFAULT_FILTER.to_string(),
    }
}

/// Initialize the global tracing subscriber.
///
/// * `log_dir` - directory for the JSON log file (debug builds only)
/// * `debug_build` - enables the JSON file layer
/// * `settings` - optional settings providing the log level
///
/// Calling this twice is harmless: the second installation attempt is ignored.
///
/// ```no_run
/// use orrery_log::init_logging;
/// use orrery_config::Settings;
///
/// init_logging(None, false, Some(&Settings::default()));
/// ```
pub fn init_logging(log_dir: Option<&Path>, debug_build: bool, settings: Option<&Settings>) {
    let filter_str = filter_string(settings);
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&filter_str));

    let console_layer = fmt::layer()
        .with_target(true)
        .with_thread_names(true)
        .with_level(true)
        .with_timer(fmt::time::uptime());

    let subscriber = tracing_subscriber::registry()
        .with(env_filter)
        .with(console_layer);

    if debug_build
        && let Some(log_dir) = log_dir
        && std::fs::create_dir_all(log_dir).is_ok()
        && let Ok(log_file) = std::fs::File::create(log_dir.join(LOG_FILE))
    {
        let _ = subscriber.with(json_file_layer(log_file)).try_init();
        return;
    }

    let _ = subscriber.try_init();
}

/// One JSON object per event, for post-mortem tooling.
fn json_file_layer<S>(log_file: std::fs::File) -> impl Layer<S>
where
    S: Subscriber + for<'a> LookupSpan<'a>,
{
    fmt::layer()
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_timer(fmt::time::uptime())
        .json()
}

/// The default `EnvFilter`, used when neither `RUST_LOG` nor settings give a level.
pub fn default_env_filter() -> EnvFilter {
    EnvFilter::new(DEFAULT_FILTER)
}
