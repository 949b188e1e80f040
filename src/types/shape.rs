//! RPC shapes.
//!
//! A shape says which directions of an RPC may carry more than one message.
//! It is derived from two independent flags on the method or stream
//! descriptor.

use std::fmt;

/// The four RPC shapes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RpcShape {
    /// One request, one response.
    Unary,
    /// Many requests, one response.
    ClientStream,
    /// One request, many responses.
    ServerStream,
    /// Many requests, many responses.
    BidiStream,
}

impl RpcShape {
    /// All shapes, in label order.
    pub const ALL: [RpcShape; 4] = [
        RpcShape::Unary,
        RpcShape::ClientStream,
        RpcShape::ServerStream,
        RpcShape::BidiStream,
    ];

    /// Derive the shape from the stream flags of a descriptor.
    pub fn from_flags(client_streams: bool, server_streams: bool) -> Self {
        match (client_streams, server_streams) {
            (false, false) => RpcShape::Unary,
            (true, false) => RpcShape::ClientStream,
            (false, true) => RpcShape::ServerStream,
            (true, true) => RpcShape::BidiStream,
        }
    }

    /// The `grpc_type` label value.
    pub fn as_str(&self) -> &'static str {
        match self {
            RpcShape::Unary => "unary",
            RpcShape::ClientStream => "client_stream",
            RpcShape::ServerStream => "server_stream",
            RpcShape::BidiStream => "bidi_stream",
        }
    }

    /// Whether the initiating side may send more than one message.
    pub fn client_streams(&self) -> bool {
        matches!(self, RpcShape::ClientStream | RpcShape::BidiStream)
    }

    /// Whether the receiving side may send more than one message.
    pub fn server_streams(&self) -> bool {
        matches!(self, RpcShape::ServerStream | RpcShape::BidiStream)
    }
}

impl fmt::Display for RpcShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Descriptor handed to the stream-open hooks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StreamDesc {
    /// The initiator may send many messages.
    pub client_streams: bool,
    /// The receiver may send many messages.
    pub server_streams: bool,
}

impl StreamDesc {
    /// Many requests, one response.
    pub fn client_streaming() -> Self {
        Self {
            client_streams: true,
            server_streams: false,
        }
    }

    /// One request, many responses.
    pub fn server_streaming() -> Self {
        Self {
            client_streams: false,
            server_streams: true,
        }
    }

    /// Many requests, many responses.
    pub fn bidi_streaming() -> Self {
        Self {
            client_streams: true,
            server_streams: true,
        }
    }

    pub fn shape(&self) -> RpcShape {
        RpcShape::from_flags(self.client_streams, self.server_streams)
    }
}
