use std::io::{self, IsTerminal};

use tracing::Level;
use tracing_subscriber::filter::{Directive, filter_fn};
use tracing_subscriber::fmt::{self, format::Writer, time::FormatTime};
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt};

/// Log target shared by every adapter event (gateway, breaker, provider).
const ADAPTER_TARGET: &str = "scm_gitlab";

/// `2025-09-12T10:20:30Z`
#[derive(Clone, Copy)]
struct UtcSeconds;

impl FormatTime for UtcSeconds {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        w.write_str(&chrono::Utc::now().to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
    }
}

fn adapter_directive(level: Level) -> Option<Directive> {
    format!("{ADAPTER_TARGET}={}", level.as_str().to_lowercase())
        .parse()
        .ok()
}

/// Installs the global subscriber for a process embedding the adapter.
///
/// `RUST_LOG` (or `default`) drives the filter, with adapter events forced to
/// `adapter_level`. Adapter events carry timestamps and `file:line` so upstream
/// calls and breaker transitions can be traced; everything else (the HTTP
/// facade, hyper) is logged in the plain format.
pub fn init(default: &str, adapter_level: Level) -> Result<(), TryInitError> {
    let mut filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    if let Some(directive) = adapter_directive(adapter_level) {
        filter = filter.add_directive(directive);
    }

    let adapter = fmt::layer()
        .with_timer(UtcSeconds)
        .with_ansi(io::stdout().is_terminal())
        .event_format(fmt::format().compact().with_source_location(true))
        .with_filter(filter_fn(|meta| meta.target().starts_with(ADAPTER_TARGET)));
    let rest = fmt::layer()
        .with_target(false)
        .with_filter(filter_fn(|meta| !meta.target().starts_with(ADAPTER_TARGET)));

    tracing_subscriber::registry()
        .with(filter)
        .with(adapter)
        .with(rest)
        .try_init()
}
