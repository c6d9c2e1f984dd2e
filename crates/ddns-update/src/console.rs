// # Console output
//
// The engine reports through tracing; this module turns events into the
// four console channels:
//
// - success: INFO events with target `ddns::success`, green
// - warning: WARN events, yellow
// - info: other INFO events, plain
// - error: ERROR events, red, written to stderr
//
// DEBUG and TRACE events (only visible with `--debug` or `RUST_LOG`) are
// dimmed and prefixed with their target.

use colored::Colorize;
use ddns_core::SUCCESS_TARGET;
use std::fmt;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;

/// Dependencies that are too chatty at DEBUG
const QUIET_DEPENDENCIES: &str = "hyper=warn,hyper_util=warn,reqwest=warn,h2=warn,rustls=warn";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Channel {
    Success,
    Warning,
    Info,
    Error,
    Debug,
}

impl Channel {
    fn of(level: &Level, target: &str) -> Self {
        match *level {
            Level::ERROR => Channel::Error,
            Level::WARN => Channel::Warning,
            Level::INFO if target == SUCCESS_TARGET => Channel::Success,
            Level::INFO => Channel::Info,
            _ => Channel::Debug,
        }
    }
}

/// Event formatter for the console channels
pub struct ConsoleFormat;

impl<S, N> FormatEvent<S, N> for ConsoleFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let mut message = String::new();
        ctx.format_fields(Writer::new(&mut message), event)?;

        let metadata = event.metadata();
        match Channel::of(metadata.level(), metadata.target()) {
            Channel::Success => writeln!(writer, "{}", message.green()),
            Channel::Warning => writeln!(writer, "{}", message.yellow()),
            Channel::Info => writeln!(writer, "{}", message),
            Channel::Error => writeln!(writer, "{}", message.red()),
            Channel::Debug => writeln!(
                writer,
                "{}",
                format!("[{}] {}", metadata.target(), message).dimmed()
            ),
        }
    }
}

/// Install the global subscriber
///
/// `RUST_LOG` takes precedence; otherwise the level is INFO, or DEBUG with
/// `debug`.
pub fn init(debug: bool) -> anyhow::Result<()> {
    let filter = if std::env::var("RUST_LOG").is_ok() {
        EnvFilter::try_from_default_env()?
    } else {
        let level = if debug { "debug" } else { "info" };
        EnvFilter::new(format!("{},{}", level, QUIET_DEPENDENCIES))
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(
            std::io::stderr
                .with_max_level(Level::ERROR)
                .or_else(std::io::stdout),
        )
        .event_format(ConsoleFormat)
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to set tracing subscriber: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channels() {
        assert_eq!(Channel::of(&Level::INFO, SUCCESS_TARGET), Channel::Success);
        assert_eq!(Channel::of(&Level::INFO, "ddns_core::engine"), Channel::Info);
        assert_eq!(Channel::of(&Level::WARN, SUCCESS_TARGET), Channel::Warning);
        assert_eq!(Channel::of(&Level::ERROR, "ddns_core::engine"), Channel::Error);
        assert_eq!(Channel::of(&Level::DEBUG, "ddns_provider_cloudflare"), Channel::Debug);
        assert_eq!(Channel::of(&Level::TRACE, "hyper"), Channel::Debug);
    }
}
