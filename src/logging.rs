use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Install the stderr subscriber.
///
/// `RUST_LOG` or `RUBRICON_LOG` override the level chosen from `verbose`.
pub fn init_tracing(verbose: bool) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let level = if verbose { "rubricon=debug" } else { "rubricon=warn" };
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_from_env("RUBRICON_LOG"))
        .unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .without_time()
                .with_target(false)
                .with_writer(std::io::stderr),
        )
        .try_init()?;

    Ok(())
}
