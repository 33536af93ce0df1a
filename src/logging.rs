use tracing_subscriber::{fmt, EnvFilter};

/// Installs the stderr subscriber. `BEECHAIN_LOG_JSON=1` switches to JSON lines.
pub fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let use_json = std::env::var("BEECHAIN_LOG_JSON")
        .map(|value| value == "1")
        .unwrap_or(false);

    let builder = fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr);
    if use_json {
        let _ = builder.json().try_init();
    } else {
        let _ = builder.pretty().try_init();
    }
}
