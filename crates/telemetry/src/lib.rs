//! Tracing subscriber bootstrap.

use tracing_subscriber::EnvFilter;

use bookshelf_kernel::settings::{LogFormat, TelemetrySettings};

/// Install the global `tracing` subscriber.
///
/// `RUST_LOG` takes precedence over `telemetry.log_level`. Calling this more
/// than once keeps the first subscriber.
pub fn init(settings: &TelemetrySettings) -> anyhow::Result<()> {
    let filter = env_filter(settings)?;

    let installed = match settings.log_format {
        LogFormat::Pretty => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .try_init()
            .is_ok(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .try_init()
            .is_ok(),
    };

    if installed {
        tracing::info!(
            target: "bookshelf-telemetry",
            format = ?settings.log_format,
            "tracing initialized"
        );
    }

    Ok(())
}

fn env_filter(settings: &TelemetrySettings) -> anyhow::Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&settings.log_level).map_err(|e| {
            anyhow::anyhow!("invalid telemetry.log_level '{}': {}", settings.log_level, e)
        }),
    }
}
