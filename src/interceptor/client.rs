use std::future::Future;

use crate::metrics::RpcMetrics;
use crate::reporter::{MessageRecorder, Reporter};
use crate::sink::RpcEventSink;
use crate::types::{Direction, OutcomeCode, RpcShape, StreamDesc};

use super::MonitoredStream;

/// Wraps outgoing calls.
///
/// ```rust,no_run
/// # async fn demo() -> Result<(), tonic::Status> {
/// use rpcmon::{ClientInterceptor, RpcMetrics};
///
/// let interceptor = ClientInterceptor::new(RpcMetrics::client());
/// let reply = interceptor
///     .unary("/pkg.Greeter/SayHello", || async { Ok::<_, tonic::Status>("hi") })
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ClientInterceptor<S = RpcMetrics> {
    sink: S,
}

impl<S: RpcEventSink> ClientInterceptor<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }

    /// Instrument a unary call.
    ///
    /// Records started and one sent message before `invoke` runs. A failed
    /// call also counts one received message. The outcome code is always
    /// recorded and the call's result is returned unchanged. Dropping the
    /// returned future before it completes records `Cancelled`.
    pub async fn unary<F, Fut, T, E>(&self, method: &str, invoke: F) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: OutcomeCode,
    {
        let reporter = Reporter::new(self.sink.clone(), RpcShape::Unary, method);
        reporter.outgoing_message();

        let result = invoke().await;
        if result.is_err() {
            reporter.incoming_message();
        }
        reporter.handled(result.outcome_code());
        result
    }

    /// Instrument a call with a streamed response.
    ///
    /// `open` receives a [`MessageRecorder`] to wrap the outbound request
    /// stream with [`MessageRecorder::outbound`]. When the descriptor says the
    /// client sends a single message, that message is counted here. A failed
    /// open records its code and returns the error; otherwise the response
    /// stream is returned wrapped in a [`MonitoredStream`] that records the
    /// terminal status.
    pub async fn streaming<F, Fut, St, E>(
        &self,
        desc: StreamDesc,
        method: &str,
        open: F,
    ) -> Result<MonitoredStream<St, S>, E>
    where
        F: FnOnce(MessageRecorder<S>) -> Fut,
        Fut: Future<Output = Result<St, E>>,
        E: OutcomeCode,
    {
        let reporter = Reporter::new(self.sink.clone(), desc.shape(), method);
        if !desc.client_streams {
            reporter.outgoing_message();
        }

        match open(reporter.recorder()).await {
            Ok(stream) => Ok(MonitoredStream::new(stream, reporter, Direction::Received)),
            Err(e) => {
                reporter.handled(e.outcome_code());
                Err(e)
            }
        }
    }

    /// Instrument a client-streaming call (many requests, one response).
    ///
    /// `open` wraps its request stream with the recorder it is given. The
    /// single response counts as one received message.
    pub async fn client_streaming<F, Fut, T, E>(&self, method: &str, open: F) -> Result<T, E>
    where
        F: FnOnce(MessageRecorder<S>) -> Fut,
        Fut: Future<Output = Result<T, E>>,
        E: OutcomeCode,
    {
        let reporter = Reporter::new(self.sink.clone(), RpcShape::ClientStream, method);

        let result = open(reporter.recorder()).await;
        if result.is_ok() {
            reporter.incoming_message();
        }
        reporter.handled(result.outcome_code());
        result
    }
}
