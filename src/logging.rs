use tracing_subscriber::EnvFilter;

/// Installs a stderr `tracing` subscriber for the crate's logs.
///
/// `RUST_LOG` takes precedence; otherwise `debug` selects between debug and
/// info level. Does nothing if a global subscriber is already set.
pub fn init(debug: bool) {
    let default = if debug { "twirc=debug" } else { "twirc=info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
