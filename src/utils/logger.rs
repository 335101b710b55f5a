use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const DEFAULT_FILTER: &str = "uniconv=info";
const VERBOSE_FILTER: &str = "uniconv=debug,info";

fn env_filter(fallback: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback))
}

pub fn init_cli_logger(verbose: bool) {
    init_compact_logger(if verbose { VERBOSE_FILTER } else { DEFAULT_FILTER });
}

/// Compact output with an explicit filter such as `"uniconv=debug"`; `RUST_LOG` still wins.
pub fn init_cli_logger_with_level(level: &str) {
    init_compact_logger(level);
}

fn init_compact_logger(fallback: &str) {
    let filter = env_filter(fallback);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .compact(),
        )
        .init();
}

/// JSON lines for batch runs; `level` overrides the default filter (e.g. `"uniconv=debug"`).
pub fn init_json_logger(level: Option<&str>) {
    let filter = env_filter(level.unwrap_or(DEFAULT_FILTER));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .json(),
        )
        .init();
}
