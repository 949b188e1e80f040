//! Metric name and label constants.
//!
//! Every series is named `<namespace>_<subsystem>_<suffix>`. The namespace
//! defaults to [`DEFAULT_NAMESPACE`]; the subsystem defaults to `client` or
//! `server` depending on the bundle's role.
//!
//! # Metric naming conventions
//!
//! Counters end in `_total`, histograms carry their unit (`_seconds`,
//! `_bytes`).
//!
//! # Labels
//!
//! - `grpc_type`: RPC shape ("unary", "client_stream", "server_stream", "bidi_stream")
//! - `grpc_service`: fully qualified service name (e.g. "pkg.Greeter")
//! - `grpc_method`: method name (e.g. "SayHello")
//! - `grpc_code`: outcome code (e.g. "OK", "FailedPrecondition")
//! - `grpc_stats`: message part for size histograms ("header", "payload", "trailer")

/// Default metric namespace.
pub const DEFAULT_NAMESPACE: &str = "grpc";

/// Total RPCs started.
///
/// Labels: `grpc_type`, `grpc_service`, `grpc_method`.
pub const STARTED_TOTAL: &str = "started_total";

/// Total RPCs completed, regardless of outcome.
///
/// Labels: `grpc_type`, `grpc_service`, `grpc_method`, `grpc_code`.
pub const HANDLED_TOTAL: &str = "handled_total";

/// Total stream messages received.
///
/// Labels: `grpc_type`, `grpc_service`, `grpc_method`.
pub const MSG_RECEIVED_TOTAL: &str = "msg_received_total";

/// Total stream messages sent.
///
/// Labels: `grpc_type`, `grpc_service`, `grpc_method`.
pub const MSG_SENT_TOTAL: &str = "msg_sent_total";

/// RPC handling latency in seconds (optional).
///
/// Labels: `grpc_type`, `grpc_service`, `grpc_method`.
pub const HANDLING_SECONDS: &str = "handling_seconds";

/// Size of received message parts in bytes (optional).
///
/// Labels: `grpc_service`, `grpc_method`, `grpc_stats`.
pub const MSG_SIZE_RECEIVED_BYTES: &str = "msg_size_received_bytes";

/// Size of sent message parts in bytes (optional).
///
/// Labels: `grpc_service`, `grpc_method`, `grpc_stats`.
pub const MSG_SIZE_SENT_BYTES: &str = "msg_size_sent_bytes";

pub const LABEL_TYPE: &str = "grpc_type";
pub const LABEL_SERVICE: &str = "grpc_service";
pub const LABEL_METHOD: &str = "grpc_method";
pub const LABEL_CODE: &str = "grpc_code";
pub const LABEL_PART: &str = "grpc_stats";

/// Default bucket boundaries for the handling-time histogram, in seconds.
pub const DEFAULT_DURATION_BUCKETS: &[f64] = &[
    0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0,
];

/// Default bucket boundaries for message-size histograms, in bytes.
pub const DEFAULT_SIZE_BUCKETS: &[f64] = &[
    0.0, 32.0, 64.0, 128.0, 256.0, 512.0, 1024.0, 2048.0, 8192.0, 32768.0, 131072.0, 524288.0,
];
