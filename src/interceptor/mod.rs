//! Call-wrapping adapter.
//!
//! [`ClientInterceptor`] and [`ServerInterceptor`] wrap the future (and, for
//! streaming shapes, the stream) of one RPC and drive a
//! [`Reporter`](crate::Reporter) from what they observe. Results and items
//! pass through unchanged.

mod client;
mod server;
mod stream;

pub use client::ClientInterceptor;
pub use server::ServerInterceptor;
pub use stream::{InboundStream, MonitoredStream, OutboundStream};
