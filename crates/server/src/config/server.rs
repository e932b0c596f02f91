use serde::Deserialize;

/// HTTP server bind and request-handling configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Address to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Prefix every action route is mounted under (e.g. `"/api"`). Empty
    /// mounts actions at the root.
    #[serde(default)]
    pub api_prefix: String,
    /// Graceful shutdown timeout in seconds.
    ///
    /// The maximum time in-flight requests get to finish once a shutdown
    /// signal arrives.
    #[serde(default = "default_shutdown_timeout")]
    pub shutdown_timeout_seconds: u64,
    /// Per-request timeout in seconds. A request that exceeds it receives
    /// `408` and its lifecycle is dropped between steps.
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    /// Maximum accepted request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
    /// Answer CORS preflights permissively. While enabled, every `OPTIONS`
    /// request is treated as a preflight and never reaches an action.
    #[serde(default)]
    pub cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            api_prefix: String::new(),
            shutdown_timeout_seconds: default_shutdown_timeout(),
            request_timeout_seconds: default_request_timeout(),
            max_body_bytes: default_max_body_bytes(),
            cors: false,
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_owned()
}

fn default_port() -> u16 {
    8080
}

fn default_shutdown_timeout() -> u64 {
    30
}

fn default_request_timeout() -> u64 {
    30
}

fn default_max_body_bytes() -> usize {
    1024 * 1024
}
