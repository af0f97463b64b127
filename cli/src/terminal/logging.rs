use colored::*;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::fmt::FormatEvent;
use tracing_subscriber::fmt::format::{self, Writer};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;

/// Renders events as `[+] message`, tagging events raised by the routing core
/// with the component that decided them: `[*] (affinity) Workers message: ...`.
pub struct ScanrouteFormatter;

impl<S, N> FormatEvent<S, N> for ScanrouteFormatter
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> format::FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &tracing_subscriber::fmt::FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let meta = event.metadata();

        let symbol: ColoredString = match *meta.level() {
            Level::ERROR => "[-]".red().bold(),
            Level::WARN => "[*]".yellow().bold(),
            Level::INFO => "[+]".green().bold(),
            Level::DEBUG | Level::TRACE => "[?]".blue(),
        };
        write!(writer, "{symbol} ")?;

        if let Some(component) = core_component(meta.target()) {
            write!(writer, "{} ", format!("({component})").bright_black())?;
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

/// Module of `scanroute_core` an event came from, e.g. `fleet` or `dispatch`.
fn core_component(target: &str) -> Option<&str> {
    target
        .strip_prefix("scanroute_core::")
        .map(|module| module.split("::").next().unwrap_or(module))
}

/// `RUST_LOG` wins over the verbosity flag.
fn default_directive(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Installs the global subscriber. Events go to stderr so command output on
/// stdout stays machine readable.
pub fn init_logging(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(verbosity)));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .event_format(ScanrouteFormatter)
                .with_writer(std::io::stderr),
        )
        .init();
}
