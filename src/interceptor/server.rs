use std::future::Future;

use crate::metrics::RpcMetrics;
use crate::reporter::{MessageRecorder, Reporter};
use crate::sink::RpcEventSink;
use crate::types::{Direction, OutcomeCode, RpcShape, StreamDesc};

use super::MonitoredStream;

/// Wraps handlers on the receiving side.
///
/// Each method takes the handler as a closure so the wrapped call reads the
/// same as the unwrapped one inside a tonic service implementation:
///
/// ```rust,no_run
/// # use tonic::{Request, Response, Status};
/// # async fn demo(request: Request<String>) -> Result<Response<String>, Status> {
/// use rpcmon::{RpcMetrics, ServerInterceptor};
///
/// let interceptor = ServerInterceptor::new(RpcMetrics::server());
/// interceptor
///     .unary("/pkg.Greeter/SayHello", || async move {
///         Ok(Response::new(format!("hello {}", request.into_inner())))
///     })
///     .await
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ServerInterceptor<S = RpcMetrics> {
    sink: S,
}

impl<S: RpcEventSink> ServerInterceptor<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// Instrument a unary handler.
    ///
    /// A handler future dropped before it completes, as on client
    /// disconnect or deadline, records `Cancelled`.
    pub async fn unary<F, Fut, T, E>(&self, method: &str, handler: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: OutcomeCode,
    {
        let reporter = Reporter::new(self.sink.clone(), RpcShape::Unary, method);
        reporter.incoming_message();

        let result = handler().await;
        if result.is_ok() {
            reporter.outgoing_message();
        }
        reporter.handled(result.outcome_code());
        result
    }

    /// Instrument a client-streaming handler.
    ///
    /// The handler wraps its request stream with
    /// [`MessageRecorder::inbound`]. A successful reply counts as one sent
    /// message.
    pub async fn client_streaming<F, Fut, T, E>(&self, method: &str, handler: F) -> Result<T, E>
    where
        F: FnOnce(MessageRecorder<S>) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: OutcomeCode,
    {
        let reporter = Reporter::new(self.sink.clone(), RpcShape::ClientStream, method);

        let result = handler(reporter.recorder()).await;
        if result.is_ok() {
            reporter.outgoing_message();
        }
        reporter.handled(result.outcome_code());
        result
    }

    /// Instrument a handler that returns a response stream.
    ///
    /// For server-streaming methods the single request is counted here; bidi
    /// handlers wrap their request stream with the recorder they are given.
    /// The returned stream counts each `Ok` item as a sent message and
    /// records the terminal status when it ends, fails or is dropped.
    pub async fn streaming<F, Fut, St, E>(
        &self,
        desc: StreamDesc,
        method: &str,
        handler: F,
    ) -> Result<MonitoredStream<St, S>, E>
    where
        F: FnOnce(MessageRecorder<S>) -> Fut,
        Fut: Future<Output = Result<St, E>>,
        E: OutcomeCode,
    {
        let reporter = Reporter::new(self.sink.clone(), desc.shape(), method);
        if !desc.client_streams {
            reporter.incoming_message();
        }

        match handler(reporter.recorder()).await {
            Ok(stream) => Ok(MonitoredStream::new(stream, reporter, Direction::Sent)),
            Err(e) => {
                reporter.handled(e.outcome_code());
                Err(e)
            }
        }
    }
}
