//! Logging setup using env_logger
//!
//! Logs go to stderr so they never mix with the rendered dashboard on stdout.
//! The level comes from `RUST_LOG` and defaults to `info`.

use env_logger::{Builder, Env};

/// Initialize logging for the binary
pub fn init() {
    Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_secs()
        .init();
}
