//! Per-RPC event recording.
//!
//! A [`Reporter`] is created when an RPC starts and records the terminal
//! status exactly once: through [`Reporter::handled`], or as `Cancelled` when
//! it is dropped first. Stream decorators that only see messages hold a
//! [`MessageRecorder`] instead.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use futures_util::Stream;
use tonic::Code;
use tracing::trace;

use crate::interceptor::{InboundStream, OutboundStream};
use crate::metrics::RpcMetrics;
use crate::sink::RpcEventSink;
use crate::types::{Direction, MessagePart, RpcLabels, RpcShape};

/// Message-level half of a [`Reporter`].
#[derive(Debug, Clone)]
pub struct MessageRecorder<S = RpcMetrics> {
    sink: S,
    labels: Arc<RpcLabels>,
}

impl<S: RpcEventSink> MessageRecorder<S> {
    fn new(sink: S, labels: RpcLabels) -> Self {
        Self {
            sink,
            labels: Arc::new(labels),
        }
    }

    pub fn labels(&self) -> &RpcLabels {
        &self.labels
    }

    /// Count one message sent by the instrumented side.
    pub fn outgoing_message(&self) {
        self.sink.record_message_sent(&self.labels);
    }

    /// Count one message received by the instrumented side.
    pub fn incoming_message(&self) {
        self.sink.record_message_received(&self.labels);
    }

    pub fn sent_message_size(&self, part: MessagePart, size: usize) {
        self.sink
            .record_message_size(Direction::Sent, part, &self.labels, size);
    }

    pub fn received_message_size(&self, part: MessagePart, size: usize) {
        self.sink
            .record_message_size(Direction::Received, part, &self.labels, size);
    }

    /// Wrap a stream whose `Ok` items are messages received from the peer.
    pub fn inbound<St>(&self, stream: St) -> InboundStream<St, S> {
        InboundStream::new(stream, self.clone())
    }

    /// Wrap a stream whose items are messages sent to the peer.
    pub fn outbound<St: Stream>(&self, stream: St) -> OutboundStream<St, S> {
        OutboundStream::new(stream, self.clone())
    }
}

/// Lifecycle recorder for one RPC.
///
/// Not `Clone`: one reporter stands for one RPC and owns its terminal event.
///
/// ```rust,compile_fail
/// use rpcmon::types::RpcShape;
/// use rpcmon::{Reporter, RpcMetrics};
///
/// let reporter = Reporter::new(RpcMetrics::server(), RpcShape::Unary, "/Svc/Ping");
/// let copy = reporter.clone();
/// ```
#[derive(Debug)]
pub struct Reporter<S: RpcEventSink = RpcMetrics> {
    recorder: MessageRecorder<S>,
    start: Instant,
    finished: AtomicBool,
}

impl<S: RpcEventSink> Reporter<S> {
    /// Start an RPC now. Records `started`.
    pub fn new(sink: S, shape: RpcShape, full_method: &str) -> Self {
        Self::with_start(sink, shape, full_method, Instant::now())
    }

    /// Start an RPC whose begin instant was observed elsewhere. Records
    /// `started`; handling time is measured from `start`.
    pub fn with_start(sink: S, shape: RpcShape, full_method: &str, start: Instant) -> Self {
        let recorder = MessageRecorder::new(sink, RpcLabels::new(shape, full_method));
        recorder.sink.record_started(&recorder.labels);
        Self {
            recorder,
            start,
            finished: AtomicBool::new(false),
        }
    }

    pub fn labels(&self) -> &RpcLabels {
        self.recorder.labels()
    }

    pub fn start(&self) -> Instant {
        self.start
    }

    /// A message-only handle sharing this RPC's labels.
    pub fn recorder(&self) -> MessageRecorder<S> {
        self.recorder.clone()
    }

    pub fn outgoing_message(&self) {
        self.recorder.outgoing_message();
    }

    pub fn incoming_message(&self) {
        self.recorder.incoming_message();
    }

    pub fn sent_message_size(&self, part: MessagePart, size: usize) {
        self.recorder.sent_message_size(part, size);
    }

    pub fn received_message_size(&self, part: MessagePart, size: usize) {
        self.recorder.received_message_size(part, size);
    }

    /// Record the terminal status and the elapsed handling time.
    pub fn handled(self, code: Code) {
        self.finish(code);
    }

    /// `true` once the terminal status has been recorded.
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Record the terminal status unless it already was. Returns whether
    /// this call recorded it.
    pub(crate) fn finish(&self, code: Code) -> bool {
        if self.finished.swap(true, Ordering::AcqRel) {
            return false;
        }
        self.recorder
            .sink
            .record_handled(&self.recorder.labels, code, self.start.elapsed());
        true
    }
}

impl<S: RpcEventSink> Drop for Reporter<S> {
    fn drop(&mut self) {
        if !*self.finished.get_mut() {
            trace!(
                service = %self.recorder.labels.service,
                method = %self.recorder.labels.method,
                "RPC dropped before completion, recording Cancelled"
            );
            self.finish(Code::Cancelled);
        }
    }
}
