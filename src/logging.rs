use tracing_subscriber::EnvFilter;

/// Initialise logging. Debug mode defaults to `debug` level and honours
/// `RUST_LOG` overrides; otherwise the level is pinned to `info` so a stray
/// environment variable cannot make the editor chatty.
pub fn init(debug: bool) {
    let level = if debug { "debug" } else { "info" };

    let filter = if debug {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level))
    } else {
        EnvFilter::new(level)
    };

    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
