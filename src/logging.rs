use tracing_subscriber::EnvFilter;

/// Initialize logging to stderr so stdout only carries command output.
///
/// `RUST_LOG` wins when set; otherwise `--verbose` selects debug output.
pub fn init(verbose: bool) {
    let default = if verbose { "jobclient=debug,info" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
