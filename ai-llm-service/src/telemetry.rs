//! Logging setup shared by the binary: env filter plus a compact, crate-scoped fmt layer.

use std::io::{self, IsTerminal};
use std::str::FromStr;

use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, filter, fmt};

/// Target prefixes of the workspace crates. Events from other crates are not rendered.
pub const TARGET_PREFIXES: &[&str] = &[
    "ai_llm_service",
    "legis_store",
    "legis_corpus",
    "fiscal_analyst",
    "nfe_legis_rag",
];

/// RFC3339 UTC timer implemented via `chrono`.
/// Example output: `2025-10-27T23:00:32Z`
#[derive(Clone, Debug, Default)]
struct ChronoRfc3339Utc;

impl FormatTime for ChronoRfc3339Utc {
    fn format_time(&self, w: &mut Writer<'_>) -> std::fmt::Result {
        let now = chrono::Utc::now();
        w.write_str(&now.to_rfc3339_opts(chrono::SecondsFormat::Secs, true))
    }
}

/// `true` when an event target belongs to one of [`TARGET_PREFIXES`].
pub fn is_workspace_target(target: &str) -> bool {
    TARGET_PREFIXES.iter().any(|p| target.starts_with(p))
}

/// Formatting layer that renders only events emitted by the workspace crates.
///
/// - RFC3339 UTC timestamps
/// - Compact single-line format with target
/// - Span close events (durations of instrumented calls)
/// - ANSI colors only when stderr is a terminal
///
/// Output goes to stderr so stdout stays clean for command results.
pub fn layer<S>() -> impl Layer<S> + Send + Sync
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
{
    let use_ansi = io::stderr().is_terminal();
    let only_workspace = filter::filter_fn(|meta| is_workspace_target(meta.target()));

    fmt::layer()
        .with_writer(io::stderr)
        .with_ansi(use_ansi)
        .with_span_events(fmt::format::FmtSpan::CLOSE)
        .event_format(
            fmt::format()
                .compact()
                .with_timer(ChronoRfc3339Utc)
                .with_level(true)
                .with_target(true),
        )
        .with_filter(only_workspace)
}

/// Level directive for every workspace crate, e.g. `legis_store=debug`.
pub fn level_directives(level: Level) -> Vec<Directive> {
    let lvl = level.as_str().to_lowercase();
    TARGET_PREFIXES
        .iter()
        .filter_map(|p| Directive::from_str(&format!("{p}={lvl}")).ok())
        .collect()
}

/// `RUST_LOG` when set, otherwise `default`, with workspace crates raised to `level`.
pub fn env_filter_with_level(default: &str, level: Level) -> EnvFilter {
    match EnvFilter::try_from_default_env() {
        Ok(from_env) => from_env,
        Err(_) => level_directives(level)
            .into_iter()
            .fold(EnvFilter::new(default), |f, d| f.add_directive(d)),
    }
}

/// Installs the global subscriber. Safe to call more than once; later calls are no-ops.
pub fn init(level: Level) {
    let _ = tracing_subscriber::registry()
        .with(env_filter_with_level("warn", level))
        .with(layer())
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn filters_foreign_targets() {
        assert!(is_workspace_target("legis_store::index"));
        assert!(is_workspace_target("nfe_legis_rag"));
        assert!(!is_workspace_target("reqwest::connect"));
    }

    #[test]
    fn builds_one_directive_per_crate() {
        assert_eq!(level_directives(Level::DEBUG).len(), TARGET_PREFIXES.len());
    }
}
