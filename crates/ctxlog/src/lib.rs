//! Public surface for ctxlog.
//!
//! This crate re-exports the engine and configuration crates and hosts the
//! `ctxlog` command-line caller.

pub mod cli;

/// Re-export for convenience.
pub use ctxlog_config as config;
/// Re-export for convenience.
pub use ctxlog_core as core;

#[inline]
/// Initialize logging using env_logger if the "logging" feature is enabled.
///
/// Output goes to stderr with millisecond timestamps; `RUST_LOG` selects the
/// level. Calling this more than once is harmless.
pub fn init_logging() {
    #[cfg(feature = "logging")]
    {
        let _ = env_logger::builder()
            .format_timestamp_millis()
            .parse_default_env()
            .try_init();
    }
}
