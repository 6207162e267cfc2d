//! Logging setup
//!
//! One line per event on stderr: `time | level | target | message`.
//! Stdout is reserved for command output.

use std::fmt;

use chrono::Local;
use tracing::{Event, Subscriber};
use tracing_subscriber::{
    EnvFilter,
    fmt::{FmtContext, FormatEvent, FormatFields, format::Writer},
    prelude::*,
    registry::LookupSpan,
    util::TryInitError,
};

/// Pipe-separated event formatter
#[derive(Debug, Clone)]
pub struct PipeFormat {
    time_format: &'static str,
}

impl Default for PipeFormat {
    fn default() -> Self {
        Self {
            time_format: "%H:%M:%S",
        }
    }
}

impl<S, N> FormatEvent<S, N> for PipeFormat
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
        let meta = event.metadata();
        write!(
            writer,
            "{} | {} | {} | ",
            Local::now().format(self.time_format),
            meta.level(),
            meta.target()
        )?;
        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

/// Install the global subscriber; `verbose` lowers the level to debug
pub fn init(verbose: bool) -> Result<(), TryInitError> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .event_format(PipeFormat::default())
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .try_init()
}
