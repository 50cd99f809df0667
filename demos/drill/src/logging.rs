use std::backtrace::Backtrace;
use std::env;
use std::panic::PanicHookInfo;

use tracing::Event;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_appender::rolling::Rotation;
use tracing_subscriber::fmt;
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::fmt::time::SystemTime;
use tracing_subscriber::fmt::FmtContext;
use tracing_subscriber::fmt::FormatEvent;
use tracing_subscriber::fmt::FormatFields;
use tracing_subscriber::prelude::*;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::Registry;

/// Log to an hourly rolling file under `dir`, and print `info` and above to
/// stderr.
///
/// The returned guard flushes the file writer when dropped; keep it alive
/// for the whole run.
pub fn init_logging(
    app_name: &str,
    dir: &str,
    level: &str,
) -> anyhow::Result<WorkerGuard> {
    set_panic_hook();

    let f = RollingFileAppender::new(Rotation::HOURLY, dir, app_name);
    let (writer, writer_guard) = tracing_appender::non_blocking(f);

    let file_layer = fmt::Layer::new()
        .with_span_events(fmt::format::FmtSpan::NONE)
        .with_writer(writer)
        .with_ansi(false)
        .event_format(EventFormatter { with_target: true });

    let stderr_layer = fmt::Layer::new()
        .with_writer(std::io::stderr)
        .event_format(EventFormatter { with_target: false })
        .with_filter(tracing_subscriber::filter::LevelFilter::INFO);

    // RUST_LOG overrides `level`.
    let directives =
        env::var(EnvFilter::DEFAULT_ENV).unwrap_or_else(|_x| level.to_string());
    let env_filter = EnvFilter::new(directives);

    let subscriber = Registry::default()
        .with(env_filter)
        .with(file_layer)
        .with(stderr_layer);

    tracing::subscriber::set_global_default(subscriber)?;

    tracing::info!(
        "initialized global tracing: in {}/{} at {}",
        dir,
        app_name,
        level
    );
    Ok(writer_guard)
}

fn set_panic_hook() {
    let prev_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic| {
        log_panic(panic);
        prev_hook(panic);
    }));
}

fn log_panic(panic: &PanicHookInfo) {
    let backtrace = format!("{:?}", Backtrace::force_capture());
    let message = panic.to_string().replace('\n', " ");

    match panic.location() {
        Some(location) => tracing::error!(
            message = %message,
            backtrace = %backtrace,
            panic.file = location.file(),
            panic.line = location.line(),
        ),
        None => tracing::error!(message = %message, backtrace = %backtrace),
    }
}

struct EventFormatter {
    with_target: bool,
}

impl<S, N> FormatEvent<S, N> for EventFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'writer> FormatFields<'writer> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();

        SystemTime {}.format_time(&mut writer)?;
        write!(writer, " {:>5} ", meta.level().as_str())?;

        if self.with_target {
            write!(writer, "{}: ", meta.target())?;
        }

        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                write!(writer, "{}:", span.name())?;
            }
            writer.write_char(' ')?;
        }

        ctx.format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}
