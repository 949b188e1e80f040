//! rpcmon - Prometheus metrics for gRPC clients and servers
//!
//! This crate records per-service, per-method counters and optional
//! latency/size histograms for RPC traffic. Events reach the metrics through
//! one of two adapters:
//!
//! - [`ClientInterceptor`] / [`ServerInterceptor`] wrap the call (and its
//!   streams) directly.
//! - [`MetricsStatsHandler`] consumes runtime stats callbacks
//!   ([`StatsHandler`]).
//!
//! Both drive the same [`Reporter`] and produce the same series.
//!
//! # Example
//!
//! ```rust,no_run
//! use prometheus::Registry;
//! use rpcmon::types::ServiceInfo;
//! use rpcmon::{RpcMetrics, ServerInterceptor};
//!
//! #[tokio::main]
//! async fn main() -> rpcmon::Result<()> {
//!     let registry = Registry::new();
//!     let metrics = RpcMetrics::server();
//!     metrics.register(&registry)?;
//!     metrics.enable_handling_time_histogram(None)?;
//!     metrics.initialize_for_methods(&[ServiceInfo::new("pkg.Greeter").unary("SayHello")]);
//!
//!     let interceptor = ServerInterceptor::new(metrics.clone());
//!     let reply = interceptor
//!         .unary("/pkg.Greeter/SayHello", || async { Ok::<_, tonic::Status>("hello") })
//!         .await;
//!     assert!(reply.is_ok());
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
mod init;
pub mod interceptor;
pub mod metrics;
pub mod reporter;
pub mod sink;
pub mod stats;
pub mod telemetry;
pub mod types;

// Re-export main types at crate root
pub use config::{HistogramsConfig, MetricsConfig};
pub use error::{Result, RpcmonError};
pub use interceptor::{
    ClientInterceptor, InboundStream, MonitoredStream, OutboundStream, ServerInterceptor,
};
pub use metrics::{Role, RpcMetrics};
pub use reporter::{MessageRecorder, Reporter};
pub use sink::RpcEventSink;
pub use stats::{MetricsStatsHandler, RpcInfo, RpcStats, RpcTagInfo, StatsHandler};
