//! Error types for the demo host binary.

/// Top-level error for the demo host.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Configuration loading failed.
    #[error("config error: {source}")]
    Config {
        /// The underlying config error.
        #[from]
        source: warden_core::ConfigError,
    },

    /// The tick driver refused to start.
    #[error("driver error: {source}")]
    Driver {
        /// The underlying driver error.
        #[from]
        source: warden_core::DriverError,
    },

    /// The `demo` section could not be loaded.
    #[error("demo config error: {message}")]
    Demo {
        /// Description of the failure.
        message: String,
    },
}
