use tracing_subscriber::{
    fmt::{format, time::ChronoLocal},
    EnvFilter,
};

/// Compact log lines on stderr, `info` unless `RUST_LOG` says otherwise.
pub fn init_log() {
    let format = format::format()
        .with_level(true)
        .with_target(false)
        .with_timer(ChronoLocal::new("[%m-%d %H:%M:%S%.3f]".to_string()))
        .compact();

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .event_format(format)
        .init();
}
