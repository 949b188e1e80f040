//! The recording capability shared by both adapters.

use std::time::Duration;

use tonic::Code;

use crate::types::{Direction, MessagePart, RpcLabels};

/// Receiver of per-RPC lifecycle events.
///
/// Both the interceptor adapter and the stats adapter drive a
/// [`Reporter`](crate::Reporter), which forwards every event here. The
/// production implementation is [`RpcMetrics`](crate::RpcMetrics); tests and
/// embedders may supply their own.
///
/// Implementations must not block and must not fail: a recording call happens
/// on the RPC's hot path.
pub trait RpcEventSink: Clone + Send + Sync + 'static {
    fn record_started(&self, labels: &RpcLabels);

    fn record_message_sent(&self, labels: &RpcLabels);

    fn record_message_received(&self, labels: &RpcLabels);

    /// Record the size of one message part.
    ///
    /// A [`MessagePart::Payload`] is a logical message and also counts toward
    /// the message counter of `direction`.
    fn record_message_size(
        &self,
        direction: Direction,
        part: MessagePart,
        labels: &RpcLabels,
        size: usize,
    );

    fn record_handled(&self, labels: &RpcLabels, code: Code, elapsed: Duration);
}
