//! Stream decorators.
//!
//! Each decorator forwards items and `size_hint` unchanged and records one
//! event per item. None of them add errors or waits.

use std::fmt;
use std::pin::Pin;
use std::task::{Context, Poll, ready};

use futures_util::Stream;
use pin_project_lite::pin_project;
use tonic::Code;
use tracing::trace;

use crate::reporter::{MessageRecorder, Reporter};
use crate::sink::RpcEventSink;
use crate::types::{Direction, OutcomeCode};

/// The pending terminal event of a stream-backed RPC.
///
/// The closure owns the [`Reporter`], so dropping it unfinished records
/// `Cancelled`: a caller that abandons a stream has cancelled the call.
struct Terminal(Option<Box<dyn FnOnce(Code) + Send + Sync>>);

impl Terminal {
    fn new<S: RpcEventSink>(reporter: Reporter<S>) -> Self {
        Self(Some(Box::new(move |code| reporter.handled(code))))
    }

    fn is_pending(&self) -> bool {
        self.0.is_some()
    }

    fn finish(&mut self, code: Code) {
        if let Some(handled) = self.0.take() {
            trace!(code = ?code, "Stream finished");
            handled(code);
        }
    }
}

pin_project! {
    /// A response stream that owns its RPC's [`Reporter`].
    ///
    /// Every `Ok` item counts as one message in the stream's direction. End of
    /// stream records `OK`; an `Err` item records its code. Items polled after
    /// the terminal event are forwarded without being counted.
    pub struct MonitoredStream<St, S> {
        #[pin]
        inner: St,
        direction: Direction,
        recorder: MessageRecorder<S>,
        terminal: Terminal,
    }
}

impl<St, S: RpcEventSink> MonitoredStream<St, S> {
    pub(crate) fn new(inner: St, reporter: Reporter<S>, direction: Direction) -> Self {
        Self {
            inner,
            direction,
            recorder: reporter.recorder(),
            terminal: Terminal::new(reporter),
        }
    }
}

impl<St, S> MonitoredStream<St, S> {
    /// `true` once the RPC's terminal status has been recorded.
    pub fn is_finished(&self) -> bool {
        !self.terminal.is_pending()
    }

    pub fn get_ref(&self) -> &St {
        &self.inner
    }
}

impl<St, S> fmt::Debug for MonitoredStream<St, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MonitoredStream")
            .field("direction", &self.direction)
            .field("finished", &self.is_finished())
            .finish_non_exhaustive()
    }
}

impl<St, T, E, S> Stream for MonitoredStream<St, S>
where
    St: Stream<Item = Result<T, E>>,
    E: OutcomeCode,
    S: RpcEventSink,
{
    type Item = Result<T, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        let item = ready!(this.inner.poll_next(cx));
        if this.terminal.is_pending() {
            match &item {
                Some(Ok(_)) => match this.direction {
                    Direction::Sent => this.recorder.outgoing_message(),
                    Direction::Received => this.recorder.incoming_message(),
                },
                Some(Err(e)) => this.terminal.finish(e.outcome_code()),
                None => this.terminal.finish(Code::Ok),
            }
        }
        Poll::Ready(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

pin_project! {
    /// Counts each `Ok` item as a received message.
    #[derive(Debug)]
    pub struct InboundStream<St, S> {
        #[pin]
        inner: St,
        recorder: MessageRecorder<S>,
    }
}

impl<St, S> InboundStream<St, S> {
    pub(crate) fn new(inner: St, recorder: MessageRecorder<S>) -> Self {
        Self { inner, recorder }
    }

    pub fn into_inner(self) -> St {
        self.inner
    }
}

impl<St, T, E, S> Stream for InboundStream<St, S>
where
    St: Stream<Item = Result<T, E>>,
    S: RpcEventSink,
{
    type Item = Result<T, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        let item = ready!(this.inner.poll_next(cx));
        if let Some(Ok(_)) = &item {
            this.recorder.incoming_message();
        }
        Poll::Ready(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

pin_project! {
    /// Counts each item as a sent message.
    #[derive(Debug)]
    pub struct OutboundStream<St, S> {
        #[pin]
        inner: St,
        recorder: MessageRecorder<S>,
    }
}

impl<St, S> OutboundStream<St, S> {
    pub(crate) fn new(inner: St, recorder: MessageRecorder<S>) -> Self {
        Self { inner, recorder }
    }

    pub fn into_inner(self) -> St {
        self.inner
    }
}

impl<St, S> Stream for OutboundStream<St, S>
where
    St: Stream,
    S: RpcEventSink,
{
    type Item = St::Item;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.project();
        let item = ready!(this.inner.poll_next(cx));
        if item.is_some() {
            this.recorder.outgoing_message();
        }
        Poll::Ready(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}
