use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::LogFormat;

/// Installs the global subscriber.
///
/// Logs go to stderr so stdout carries nothing but ids. `RUST_LOG` filters,
/// defaulting to `info`.
pub fn init_telemetry(format: LogFormat) -> anyhow::Result<()> {
    let pretty = (format == LogFormat::Pretty).then(|| {
        tracing_subscriber::fmt::layer()
            .with_writer(std::io::stderr)
            .with_thread_ids(true)
            .with_line_number(true)
            .with_target(false)
            .with_file(true)
    });
    let json = (format == LogFormat::Json).then(|| {
        tracing_subscriber::fmt::layer()
            .json()
            .with_writer(std::io::stderr)
            .with_current_span(false)
    });

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(pretty)
        .with(json)
        .try_init()?;
    Ok(())
}
