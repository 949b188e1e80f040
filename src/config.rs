//! Metric bundle configuration.
//!
//! A [`MetricsConfig`] can be built in code with the builder methods or,
//! with the `config-file` feature, loaded from TOML:
//!
//! ```toml
//! namespace = "myapp"
//! subsystem = "rpc_server"
//! buckets = [0.001, 0.01, 0.1, 1.0]
//!
//! [const_labels]
//! region = "eu-west-1"
//!
//! [histograms]
//! handling_time = true
//! msg_size_received = true
//! ```
//!
//! Empty strings behave like unset values, so `namespace = ""` keeps the
//! default `grpc` prefix.

use std::collections::HashMap;
#[cfg(feature = "config-file")]
use std::path::Path;

use serde::Deserialize;

use crate::metrics::Role;
use crate::telemetry;
use crate::{Result, RpcmonError};

/// Options applied uniformly to every series of one bundle.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct MetricsConfig {
    /// Metric name prefix (default: `grpc`).
    #[serde(default)]
    pub namespace: Option<String>,
    /// Middle name segment (default: `client` or `server`).
    #[serde(default)]
    pub subsystem: Option<String>,
    /// Fixed labels merged into every series.
    #[serde(default)]
    pub const_labels: HashMap<String, String>,
    /// Handling-time histogram buckets, in seconds.
    #[serde(default)]
    pub buckets: Option<Vec<f64>>,
    /// Histograms to enable at construction.
    #[serde(default)]
    pub histograms: HistogramsConfig,
}

/// Histograms enabled when the bundle is constructed.
///
/// Histograms can also be enabled later through the `enable_*` methods on
/// [`RpcMetrics`](crate::RpcMetrics); either way each one is enabled at most
/// once.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct HistogramsConfig {
    #[serde(default)]
    pub handling_time: bool,
    #[serde(default)]
    pub msg_size_sent: bool,
    #[serde(default)]
    pub msg_size_received: bool,
    /// Size histogram buckets, in bytes.
    #[serde(default)]
    pub size_buckets: Option<Vec<f64>>,
}

impl MetricsConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the metric name prefix.
    pub fn namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Override the `client` / `server` name segment.
    pub fn subsystem(mut self, subsystem: impl Into<String>) -> Self {
        self.subsystem = Some(subsystem.into());
        self
    }

    /// Add one constant label.
    pub fn const_label(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.const_labels.insert(name.into(), value.into());
        self
    }

    /// Replace all constant labels.
    pub fn const_labels(mut self, labels: HashMap<String, String>) -> Self {
        self.const_labels = labels;
        self
    }

    /// Set the handling-time histogram buckets.
    pub fn buckets(mut self, buckets: Vec<f64>) -> Self {
        self.buckets = Some(buckets);
        self
    }

    /// Enable the handling-time histogram at construction.
    pub fn with_handling_time_histogram(mut self) -> Self {
        self.histograms.handling_time = true;
        self
    }

    /// Enable the sent-size histogram at construction.
    pub fn with_sent_size_histogram(mut self) -> Self {
        self.histograms.msg_size_sent = true;
        self
    }

    /// Enable the received-size histogram at construction.
    pub fn with_received_size_histogram(mut self) -> Self {
        self.histograms.msg_size_received = true;
        self
    }

    /// Set the size histogram buckets.
    pub fn size_buckets(mut self, buckets: Vec<f64>) -> Self {
        self.histograms.size_buckets = Some(buckets);
        self
    }

    pub(crate) fn resolved_namespace(&self) -> &str {
        non_empty(self.namespace.as_deref()).unwrap_or(telemetry::DEFAULT_NAMESPACE)
    }

    pub(crate) fn resolved_subsystem(&self, role: Role) -> &str {
        non_empty(self.subsystem.as_deref()).unwrap_or(role.as_str())
    }

    /// Check bucket lists before any metric is built.
    pub fn validate(&self) -> Result<()> {
        if let Some(buckets) = &self.buckets {
            validate_buckets(buckets)?;
        }
        if let Some(buckets) = &self.histograms.size_buckets {
            validate_buckets(buckets)?;
        }
        Ok(())
    }

    /// Parse a TOML document.
    #[cfg(feature = "config-file")]
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: Self = toml::from_str(content).map_err(|e| {
            RpcmonError::Configuration(format!("Failed to parse metrics config: {e}"))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML config file.
    #[cfg(feature = "config-file")]
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RpcmonError::Configuration(format!(
                "Config file not found: {path:?}"
            )));
        }
        let content = std::fs::read_to_string(path).map_err(|e| {
            RpcmonError::Configuration(format!("Failed to read config file {path:?}: {e}"))
        })?;
        Self::from_toml_str(&content)
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.is_empty())
}

/// Buckets must be non-empty, free of NaN and strictly increasing.
pub(crate) fn validate_buckets(buckets: &[f64]) -> Result<()> {
    if buckets.is_empty() {
        return Err(RpcmonError::InvalidBuckets("empty bucket list".into()));
    }
    if buckets.iter().any(|b| b.is_nan()) {
        return Err(RpcmonError::InvalidBuckets("buckets contain NaN".into()));
    }
    if let Some(pair) = buckets.windows(2).find(|w| w[0] >= w[1]) {
        return Err(RpcmonError::InvalidBuckets(format!(
            "buckets must be strictly increasing: {} >= {}",
            pair[0], pair[1]
        )));
    }
    Ok(())
}
