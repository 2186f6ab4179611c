use core::fmt as core_fmt;

use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    fmt::{
        self, FmtContext,
        format::{FormatEvent, FormatFields},
    },
    registry::LookupSpan,
};

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";

/// Single-line event format: `[time] LEVEL target:line > message`.
pub struct SessionFormatter {
    use_ansi: bool,
}

impl SessionFormatter {
    pub fn new(use_ansi: bool) -> Self {
        Self { use_ansi }
    }

    fn level_color(level: &Level) -> &'static str {
        match *level {
            Level::ERROR => "\x1b[31m",
            Level::WARN => "\x1b[33m",
            Level::INFO => "\x1b[32m",
            Level::DEBUG => "\x1b[34m",
            Level::TRACE => "\x1b[35m",
        }
    }
}

fn timestamp() -> String {
    let format = time::macros::format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second].[subsecond digits:3]"
    );
    time::OffsetDateTime::now_local()
        .unwrap_or_else(|_| time::OffsetDateTime::now_utc())
        .format(&format)
        .unwrap_or_else(|_| "unknown time".to_string())
}

impl<S, N> FormatEvent<S, N> for SessionFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: fmt::format::Writer<'_>,
        event: &Event<'_>,
    ) -> core_fmt::Result {
        let metadata = event.metadata();
        let level = metadata.level();
        let level_str = format!("{: <5}", level.to_string());
        let line = metadata
            .line()
            .map(|l| l.to_string())
            .unwrap_or_else(|| "??".to_string());

        if self.use_ansi {
            write!(writer, "{}[{}]{} ", DIM, timestamp(), RESET)?;
            write!(
                writer,
                "{}{}{}{} ",
                Self::level_color(level),
                BOLD,
                level_str,
                RESET
            )?;
            write!(writer, "{}{}:{}{} > ", DIM, metadata.target(), line, RESET)?;
        } else {
            write!(
                writer,
                "[{}] {} {}:{} > ",
                timestamp(),
                level_str,
                metadata.target(),
                line
            )?;
        }

        // Span fields ahead of the message.
        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                write!(writer, "{}", span.name())?;
                let ext = span.extensions();
                if let Some(fields) = ext.get::<fmt::FormattedFields<N>>() {
                    if !fields.is_empty() {
                        write!(writer, "{{{}}}", fields)?;
                    }
                }
                write!(writer, ": ")?;
            }
        }

        ctx.format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}
