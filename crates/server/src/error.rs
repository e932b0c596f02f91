use thiserror::Error;

/// Errors that can occur when starting or running the actroute server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration error (unreadable or malformed TOML, bad service
    /// wiring).
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error (e.g. binding the listener).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The dispatch table could not be built.
    #[error("routing error: {0}")]
    Router(#[from] actroute_router::RouterError),

    /// The tracing subscriber could not be installed.
    #[error("telemetry error: {0}")]
    Telemetry(String),
}
