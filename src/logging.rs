use tracing_subscriber::EnvFilter;

/// Initialize terminal logging on stderr.
///
/// `RUST_LOG` overrides the default level; `--verbose` bumps the default
/// from info to debug.
pub fn init_terminal(verbose: bool) {
    let default = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
