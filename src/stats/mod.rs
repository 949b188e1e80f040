//! Stats-callback adapter.
//!
//! Runtimes that report RPC progress through callbacks instead of wrapping
//! calls drive a [`StatsHandler`]. Each RPC carries an [`http::Extensions`]
//! map as its context: [`StatsHandler::tag_rpc`] stores an [`RpcInfo`] there
//! and every later callback for the same RPC reads it back, so concurrent
//! RPCs never share state.
//!
//! Callback order for one RPC is `tag_rpc`, then `Begin`, then any number of
//! `Header` / `Payload` / `Trailer` events, then `End`.

mod context;
mod handler;

use std::net::SocketAddr;
use std::time::Instant;

use http::Extensions;
use tonic::Status;

use crate::types::{Direction, RpcShape, StreamDesc};

pub use context::RpcInfo;
pub use handler::MetricsStatsHandler;

/// What the runtime knows about an RPC when it is tagged.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RpcTagInfo<'a> {
    /// Full method name, `/pkg.Service/Method`.
    pub full_method_name: &'a str,
    pub client_streams: bool,
    pub server_streams: bool,
}

impl<'a> RpcTagInfo<'a> {
    pub fn new(full_method_name: &'a str, desc: StreamDesc) -> Self {
        Self {
            full_method_name,
            client_streams: desc.client_streams,
            server_streams: desc.server_streams,
        }
    }

    pub fn shape(&self) -> RpcShape {
        RpcShape::from_flags(self.client_streams, self.server_streams)
    }
}

/// Connection details passed to [`StatsHandler::tag_conn`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConnTagInfo {
    pub remote_addr: Option<SocketAddr>,
    pub local_addr: Option<SocketAddr>,
}

/// Connection lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnStats {
    Begin,
    End,
}

/// Per-RPC events, as reported by the runtime.
///
/// `wire_length` is whatever byte count the runtime reports for the part,
/// recorded as-is.
#[derive(Debug, Clone)]
pub enum RpcStats {
    Begin { begin_time: Instant },
    Header {
        direction: Direction,
        wire_length: usize,
    },
    Payload {
        direction: Direction,
        wire_length: usize,
    },
    Trailer {
        direction: Direction,
        wire_length: usize,
    },
    /// `error` is `None` for a successful RPC.
    End { error: Option<Status> },
}

/// Receiver of runtime stats callbacks.
pub trait StatsHandler: Send + Sync {
    /// Called first for every RPC. May attach state to `ctx`.
    fn tag_rpc(&self, ctx: &mut Extensions, info: &RpcTagInfo<'_>);

    fn handle_rpc(&self, ctx: &mut Extensions, stats: &RpcStats);

    fn tag_conn(&self, _ctx: &mut Extensions, _info: &ConnTagInfo) {}

    fn handle_conn(&self, _ctx: &mut Extensions, _stats: &ConnStats) {}
}
