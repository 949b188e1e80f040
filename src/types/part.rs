//! Message parts and directions used for size accounting.

use std::fmt;

/// A distinguishable segment of message traffic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessagePart {
    Header,
    /// A logical message. Observing one also counts a message.
    Payload,
    Trailer,
}

impl MessagePart {
    pub const ALL: [MessagePart; 3] = [
        MessagePart::Header,
        MessagePart::Payload,
        MessagePart::Trailer,
    ];

    /// The `grpc_stats` label value.
    pub fn as_str(&self) -> &'static str {
        match self {
            MessagePart::Header => "header",
            MessagePart::Payload => "payload",
            MessagePart::Trailer => "trailer",
        }
    }
}

impl fmt::Display for MessagePart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which way a message travelled, from the point of view of the
/// instrumented side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Sent,
    Received,
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Direction::Sent => "sent",
            Direction::Received => "received",
        })
    }
}
