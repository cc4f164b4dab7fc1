use tracing_subscriber::EnvFilter;

/// Install the global `fmt` subscriber on stderr.
///
/// `RUST_LOG` wins over `default_level`. Stdout belongs to the shell, so log
/// lines never mix with rendered tables.
pub fn init_tracing(default_level: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_level(true)
        .with_timer(tracing_subscriber::fmt::time::UtcTime::rfc_3339())
        .try_init();
}
