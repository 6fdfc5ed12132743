//! # Logging
//!
//! Console tracing setup. `RUST_LOG` takes precedence over the configured level.

use std::io::IsTerminal;
use std::sync::OnceLock;

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::config::{LogFormat, LoggingSettings};

static TRACING_INITIALIZED: OnceLock<()> = OnceLock::new();

/// Build the filter: `RUST_LOG` if set and valid, the configured level otherwise.
fn build_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"))
}

/// Initialize the global tracing subscriber.
///
/// Safe to call more than once; only the first call installs a subscriber, and
/// an already-installed subscriber (e.g. from a test harness) is left in place.
pub fn init_tracing(settings: &LoggingSettings) {
    TRACING_INITIALIZED.get_or_init(|| {
        let filter = build_filter(&settings.level);
        let use_ansi = std::io::stdout().is_terminal();

        let result = match settings.format {
            LogFormat::Json => tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .json()
                        .with_target(true)
                        .with_current_span(true)
                        .with_filter(filter),
                )
                .try_init(),
            LogFormat::Pretty => tracing_subscriber::registry()
                .with(
                    fmt::layer()
                        .with_target(true)
                        .with_thread_ids(true)
                        .with_level(true)
                        .with_ansi(use_ansi)
                        .with_filter(filter),
                )
                .try_init(),
        };

        if result.is_err() {
            tracing::debug!(
                "Global tracing subscriber already initialized - continuing with existing subscriber"
            );
        } else {
            tracing::info!(
                level = %settings.level,
                format = ?settings.format,
                ansi = use_ansi,
                "Console logging initialized"
            );
        }
    });
}
