use tracing_subscriber::EnvFilter;

/// Installs the global `tracing` subscriber. Logs go to stderr so stdout
/// stays reserved for the checkout screens.
///
/// `RUST_LOG` wins over `verbose` when set.
pub fn init(verbose: bool) {
    let default_directive = if verbose {
        "checkout=debug,checkout_flow=debug"
    } else {
        "warn"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directive));

    // A second call (e.g. from tests) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
