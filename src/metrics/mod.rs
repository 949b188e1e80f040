//! The per-role metric bundle.
//!
//! [`RpcMetrics`] owns every series one side of a connection emits and is the
//! production [`RpcEventSink`]. It is a cheap `Clone` handle: clone it into
//! each adapter and register one clone with a [`prometheus::Registry`].
//!
//! ```rust
//! use prometheus::Registry;
//! use rpcmon::RpcMetrics;
//!
//! let registry = Registry::new();
//! let metrics = RpcMetrics::server();
//! metrics.register(&registry).unwrap();
//! metrics.enable_handling_time_histogram(None).unwrap();
//! ```

mod histogram;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use prometheus::core::{Collector, Desc};
use prometheus::proto::MetricFamily;
use prometheus::{HistogramOpts, IntCounterVec, Opts, Registry};
use tonic::Code;
use tracing::debug;

use crate::config::MetricsConfig;
use crate::sink::RpcEventSink;
use crate::telemetry::{
    DEFAULT_DURATION_BUCKETS, DEFAULT_SIZE_BUCKETS, HANDLED_TOTAL, HANDLING_SECONDS, LABEL_CODE,
    LABEL_METHOD, LABEL_PART, LABEL_SERVICE, LABEL_TYPE, MSG_RECEIVED_TOTAL, MSG_SENT_TOTAL,
    MSG_SIZE_RECEIVED_BYTES, MSG_SIZE_SENT_BYTES, STARTED_TOTAL,
};
use crate::types::{Direction, MessagePart, RpcLabels, code_label};
use crate::{Result, RpcmonError};

use histogram::LazyHistogram;

const RPC_LABELS: &[&str] = &[LABEL_TYPE, LABEL_SERVICE, LABEL_METHOD];
const HANDLED_LABELS: &[&str] = &[LABEL_TYPE, LABEL_SERVICE, LABEL_METHOD, LABEL_CODE];
const SIZE_LABELS: &[&str] = &[LABEL_SERVICE, LABEL_METHOD, LABEL_PART];

/// Help strings for one role's series.
struct HelpText {
    started: &'static str,
    handled: &'static str,
    received: &'static str,
    sent: &'static str,
    handling: &'static str,
    size_sent: &'static str,
    size_received: &'static str,
}

const CLIENT_HELP: HelpText = HelpText {
    started: "Total number of RPCs started on the client.",
    handled: "Total number of RPCs completed by the client, regardless of success or failure.",
    received: "Total number of RPC stream messages received by the client.",
    sent: "Total number of RPC stream messages sent by the client.",
    handling: concat!(
        "Histogram of response latency (seconds) of the RPC ",
        "until it is finished by the application."
    ),
    size_sent: "Histogram of message sizes (bytes) sent by the client.",
    size_received: "Histogram of message sizes (bytes) received by the client.",
};

const SERVER_HELP: HelpText = HelpText {
    started: "Total number of RPCs started on the server.",
    handled: "Total number of RPCs completed on the server, regardless of success or failure.",
    received: "Total number of RPC stream messages received on the server.",
    sent: "Total number of RPC stream messages sent by the server.",
    handling: concat!(
        "Histogram of response latency (seconds) of RPCs ",
        "that had been application-level handled by the server."
    ),
    size_sent: "Histogram of message sizes (bytes) sent by the server.",
    size_received: "Histogram of message sizes (bytes) received by the server.",
};

/// Which side of the connection a bundle instruments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    Client,
    Server,
}

impl Role {
    /// Default subsystem segment of metric names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Client => "client",
            Role::Server => "server",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

struct Inner {
    role: Role,
    started: IntCounterVec,
    handled: IntCounterVec,
    msg_received: IntCounterVec,
    msg_sent: IntCounterVec,
    handling_seconds: LazyHistogram,
    msg_size_sent: LazyHistogram,
    msg_size_received: LazyHistogram,
}

impl Inner {
    fn counters(&self) -> [&IntCounterVec; 4] {
        [
            &self.started,
            &self.handled,
            &self.msg_received,
            &self.msg_sent,
        ]
    }

    fn histograms(&self) -> [&LazyHistogram; 3] {
        [
            &self.handling_seconds,
            &self.msg_size_sent,
            &self.msg_size_received,
        ]
    }
}

/// Counters and optional histograms for one role.
#[derive(Clone)]
pub struct RpcMetrics {
    inner: Arc<Inner>,
}

impl RpcMetrics {
    /// Build a bundle from explicit options.
    ///
    /// Fails if the config produces invalid metric names or bucket lists.
    /// Histograms requested in `config.histograms` are enabled before this
    /// returns.
    pub fn new(role: Role, config: &MetricsConfig) -> Result<Self> {
        config.validate()?;

        let namespace = config.resolved_namespace();
        let subsystem = config.resolved_subsystem(role);
        let help = match role {
            Role::Client => &CLIENT_HELP,
            Role::Server => &SERVER_HELP,
        };
        let opts = |name: &str, text: &str| {
            Opts::new(name, text)
                .namespace(namespace)
                .subsystem(subsystem)
                .const_labels(config.const_labels.clone())
        };

        let started = IntCounterVec::new(opts(STARTED_TOTAL, help.started), RPC_LABELS)?;
        let handled = IntCounterVec::new(opts(HANDLED_TOTAL, help.handled), HANDLED_LABELS)?;
        let msg_received = IntCounterVec::new(opts(MSG_RECEIVED_TOTAL, help.received), RPC_LABELS)?;
        let msg_sent = IntCounterVec::new(opts(MSG_SENT_TOTAL, help.sent), RPC_LABELS)?;

        let handling_seconds = LazyHistogram::new(
            HistogramOpts::from(opts(HANDLING_SECONDS, help.handling)),
            RPC_LABELS,
            config
                .buckets
                .clone()
                .unwrap_or_else(|| DEFAULT_DURATION_BUCKETS.to_vec()),
        );
        let size_buckets = config
            .histograms
            .size_buckets
            .clone()
            .unwrap_or_else(|| DEFAULT_SIZE_BUCKETS.to_vec());
        let msg_size_sent = LazyHistogram::new(
            HistogramOpts::from(opts(MSG_SIZE_SENT_BYTES, help.size_sent)),
            SIZE_LABELS,
            size_buckets.clone(),
        );
        let msg_size_received = LazyHistogram::new(
            HistogramOpts::from(opts(MSG_SIZE_RECEIVED_BYTES, help.size_received)),
            SIZE_LABELS,
            size_buckets,
        );

        let metrics = Self {
            inner: Arc::new(Inner {
                role,
                started,
                handled,
                msg_received,
                msg_sent,
                handling_seconds,
                msg_size_sent,
                msg_size_received,
            }),
        };

        if config.histograms.handling_time {
            metrics.enable_handling_time_histogram(None)?;
        }
        if config.histograms.msg_size_sent {
            metrics.enable_sent_size_histogram(None)?;
        }
        if config.histograms.msg_size_received {
            metrics.enable_received_size_histogram(None)?;
        }

        Ok(metrics)
    }

    /// Client bundle with default options.
    pub fn client() -> Self {
        Self::new(Role::Client, &MetricsConfig::default())
            .expect("default client metric options are valid")
    }

    /// Server bundle with default options.
    pub fn server() -> Self {
        Self::new(Role::Server, &MetricsConfig::default())
            .expect("default server metric options are valid")
    }

    pub fn role(&self) -> Role {
        self.inner.role
    }

    /// Enable the handling-time histogram.
    ///
    /// `None` uses the configured (or default) buckets. Only the first call
    /// has an effect; RPCs finished before it are not backfilled.
    pub fn enable_handling_time_histogram(&self, buckets: Option<Vec<f64>>) -> Result<()> {
        self.inner.handling_seconds.enable(buckets)
    }

    /// Enable the sent message size histogram. Same rules as
    /// [`enable_handling_time_histogram`](Self::enable_handling_time_histogram).
    pub fn enable_sent_size_histogram(&self, buckets: Option<Vec<f64>>) -> Result<()> {
        self.inner.msg_size_sent.enable(buckets)
    }

    /// Enable the received message size histogram.
    pub fn enable_received_size_histogram(&self, buckets: Option<Vec<f64>>) -> Result<()> {
        self.inner.msg_size_received.enable(buckets)
    }

    pub fn is_handling_time_histogram_enabled(&self) -> bool {
        self.inner.handling_seconds.is_enabled()
    }

    /// Register this bundle as a single collector.
    ///
    /// Registering the same bundle (or a clone of it) twice with one
    /// registry returns [`RpcmonError::AlreadyRegistered`].
    pub fn register(&self, registry: &Registry) -> Result<()> {
        registry
            .register(Box::new(self.clone()))
            .map_err(RpcmonError::from_registration)?;
        debug!(role = %self.inner.role, "RPC metrics registered");
        Ok(())
    }

    /// Register or panic.
    pub fn must_register(&self, registry: &Registry) {
        if let Err(e) = self.register(registry) {
            panic!("failed to register {} RPC metrics: {e}", self.inner.role);
        }
    }

    /// Build a default bundle and register it with the process-wide
    /// `prometheus` registry.
    ///
    /// # Panics
    ///
    /// Panics when a bundle for `role` was already installed.
    pub fn install_default(role: Role) -> Self {
        let metrics = match role {
            Role::Client => Self::client(),
            Role::Server => Self::server(),
        };
        metrics.must_register(prometheus::default_registry());
        metrics
    }

    pub(crate) fn started(&self) -> &IntCounterVec {
        &self.inner.started
    }

    pub(crate) fn handled(&self) -> &IntCounterVec {
        &self.inner.handled
    }

    pub(crate) fn msg_sent(&self) -> &IntCounterVec {
        &self.inner.msg_sent
    }

    pub(crate) fn msg_received(&self) -> &IntCounterVec {
        &self.inner.msg_received
    }

    pub(crate) fn handling_seconds(&self) -> Option<&prometheus::HistogramVec> {
        self.inner.handling_seconds.get()
    }
}

impl fmt::Debug for RpcMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = &*self.inner;
        f.debug_struct("RpcMetrics")
            .field("role", &inner.role)
            .field("handling_seconds", &inner.handling_seconds.is_enabled())
            .field("size_sent", &inner.msg_size_sent.is_enabled())
            .field("size_received", &inner.msg_size_received.is_enabled())
            .finish()
    }
}

impl RpcEventSink for RpcMetrics {
    fn record_started(&self, labels: &RpcLabels) {
        increment(&self.inner.started, labels);
    }

    fn record_message_sent(&self, labels: &RpcLabels) {
        increment(&self.inner.msg_sent, labels);
    }

    fn record_message_received(&self, labels: &RpcLabels) {
        increment(&self.inner.msg_received, labels);
    }

    fn record_message_size(
        &self,
        direction: Direction,
        part: MessagePart,
        labels: &RpcLabels,
        size: usize,
    ) {
        let histogram = match direction {
            Direction::Sent => &self.inner.msg_size_sent,
            Direction::Received => &self.inner.msg_size_received,
        };
        if let Some(vec) = histogram.get() {
            let values = [&*labels.service, &*labels.method, part.as_str()];
            vec.with_label_values(&values).observe(size as f64);
        }
        if part == MessagePart::Payload {
            match direction {
                Direction::Sent => self.record_message_sent(labels),
                Direction::Received => self.record_message_received(labels),
            }
        }
    }

    fn record_handled(&self, labels: &RpcLabels, code: Code, elapsed: Duration) {
        let [shape, service, method] = labels.values();
        self.inner
            .handled
            .with_label_values(&[shape, service, method, code_label(code)])
            .inc();
        if let Some(vec) = self.inner.handling_seconds.get() {
            vec.with_label_values(&labels.values())
                .observe(elapsed.as_secs_f64());
        }
    }
}

fn increment(vec: &IntCounterVec, labels: &RpcLabels) {
    vec.with_label_values(&labels.values()).inc();
}

impl Collector for RpcMetrics {
    fn desc(&self) -> Vec<&Desc> {
        let inner = &*self.inner;
        let mut descs = Vec::new();
        for counter in inner.counters() {
            descs.extend(counter.desc());
        }
        for histogram in inner.histograms() {
            if let Some(vec) = histogram.get() {
                descs.extend(vec.desc());
            }
        }
        descs
    }

    fn collect(&self) -> Vec<MetricFamily> {
        let inner = &*self.inner;
        let mut families = Vec::new();
        for counter in inner.counters() {
            families.extend(counter.collect());
        }
        for histogram in inner.histograms() {
            if let Some(vec) = histogram.get() {
                families.extend(vec.collect());
            }
        }
        families
    }
}
