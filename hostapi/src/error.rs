//! Registry error types.

/// Failure to build a tracer through the [`LiveDirectory`](crate::LiveDirectory).
#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    /// No constructor registered under this name.
    #[error("unknown tracer '{0}'")]
    UnknownTracer(String),

    /// The constructor rejected its configuration or failed to set up.
    #[error("tracer '{name}' failed to initialize: {source:#}")]
    Constructor {
        name: String,
        #[source]
        source: anyhow::Error,
    },
}
