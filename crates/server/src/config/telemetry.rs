use std::collections::HashMap;
use std::fmt;

use serde::Deserialize;

/// OTLP transport used by the span exporter.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OtlpProtocol {
    #[default]
    Grpc,
    Http,
}

impl fmt::Display for OtlpProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Grpc => "grpc",
            Self::Http => "http",
        })
    }
}

/// Configuration for `OpenTelemetry` distributed tracing.
///
/// When enabled, actroute exports trace spans via OTLP to a collector
/// (Jaeger, Grafana Tempo, etc.). The `dispatch` and `lifecycle` spans show
/// each request's route match, permission gate, validation, and lifecycle
/// steps.
///
/// # Example
///
/// ```toml
/// [telemetry]
/// enabled = true
/// endpoint = "http://localhost:4317"
/// service_name = "actroute"
/// sample_ratio = 0.25
/// protocol = "grpc"
/// ```
#[derive(Debug, Clone, Deserialize)]
pub struct TelemetryConfig {
    /// Whether `OpenTelemetry` export is enabled. The `fmt` layer is always
    /// installed.
    #[serde(default)]
    pub enabled: bool,
    /// OTLP exporter endpoint.
    #[serde(default = "default_otel_endpoint")]
    pub endpoint: String,
    /// Service name reported in traces.
    #[serde(default = "default_otel_service_name")]
    pub service_name: String,
    /// Sampling ratio (0.0 to 1.0). `1.0` traces every request.
    #[serde(default = "default_otel_sample_ratio")]
    pub sample_ratio: f64,
    #[serde(default)]
    pub protocol: OtlpProtocol,
    /// Exporter timeout in seconds.
    #[serde(default = "default_otel_timeout")]
    pub timeout_seconds: u64,
    /// Extra resource attributes attached to every span.
    #[serde(default)]
    pub resource_attributes: HashMap<String, String>,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            endpoint: default_otel_endpoint(),
            service_name: default_otel_service_name(),
            sample_ratio: default_otel_sample_ratio(),
            protocol: OtlpProtocol::default(),
            timeout_seconds: default_otel_timeout(),
            resource_attributes: HashMap::new(),
        }
    }
}

fn default_otel_endpoint() -> String {
    "http://localhost:4317".to_owned()
}

fn default_otel_service_name() -> String {
    "actroute".to_owned()
}

fn default_otel_sample_ratio() -> f64 {
    1.0
}

fn default_otel_timeout() -> u64 {
    10
}
