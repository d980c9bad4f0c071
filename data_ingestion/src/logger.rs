use env_logger::{Builder, Env};

/// Initialise the process-wide logger. `RUST_LOG` overrides the default
/// `info` filter. Safe to call more than once.
pub fn init_logger() {
    let _ = Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init();
}
