use tracing_subscriber::EnvFilter;

/// Send log output to stderr, keeping stdout for results.
///
/// `RUST_LOG` wins over the verbosity flag.
pub fn init(verbose: bool) {
    let default = if verbose { "seedkit=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    // A subscriber may already be installed, e.g. by a test harness.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
