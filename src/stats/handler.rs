use std::sync::Arc;

use http::Extensions;
use tonic::Code;
use tracing::trace;

use crate::metrics::RpcMetrics;
use crate::reporter::Reporter;
use crate::sink::RpcEventSink;
use crate::types::{Direction, MessagePart};

use super::{RpcInfo, RpcStats, RpcTagInfo, StatsHandler};

/// [`StatsHandler`] that records into an [`RpcEventSink`].
///
/// For the same RPC it produces the same counters as the interceptors, plus
/// header/payload/trailer sizes when the size histograms are enabled.
#[derive(Debug, Clone)]
pub struct MetricsStatsHandler<S = RpcMetrics> {
    sink: S,
}

impl<S: RpcEventSink> MetricsStatsHandler<S> {
    pub fn new(sink: S) -> Self {
        Self { sink }
    }
}

impl<S: RpcEventSink> StatsHandler for MetricsStatsHandler<S> {
    fn tag_rpc(&self, ctx: &mut Extensions, info: &RpcTagInfo<'_>) {
        trace!(method = %info.full_method_name, shape = %info.shape(), "Tagging RPC");
        ctx.insert(RpcInfo::<S>::new(info));
    }

    fn handle_rpc(&self, ctx: &mut Extensions, stats: &RpcStats) {
        let Some(info) = RpcInfo::<S>::get_mut(ctx) else {
            trace!("Stats event for untagged RPC, ignoring");
            return;
        };

        match stats {
            RpcStats::Begin { begin_time } => {
                if info.begin_time().is_some() {
                    trace!(method = %info.full_method_name(), "Repeated Begin, ignoring");
                    return;
                }
                info.set_begin_time(*begin_time);
                info.reporter = Some(Arc::new(Reporter::with_start(
                    self.sink.clone(),
                    info.shape(),
                    info.full_method_name(),
                    *begin_time,
                )));
            }
            RpcStats::Header {
                direction,
                wire_length,
            } => record_size(info, *direction, MessagePart::Header, *wire_length),
            RpcStats::Payload {
                direction,
                wire_length,
            } => record_size(info, *direction, MessagePart::Payload, *wire_length),
            RpcStats::Trailer {
                direction,
                wire_length,
            } => record_size(info, *direction, MessagePart::Trailer, *wire_length),
            RpcStats::End { error } => {
                let code = error.as_ref().map_or(Code::Ok, |status| status.code());
                let recorded = info
                    .reporter
                    .take()
                    .is_some_and(|reporter| reporter.finish(code));
                if !recorded {
                    trace!(method = %info.full_method_name(), "End without pending RPC, ignoring");
                }
            }
        }
    }
}

fn record_size<S: RpcEventSink>(
    info: &RpcInfo<S>,
    direction: Direction,
    part: MessagePart,
    size: usize,
) {
    let Some(reporter) = &info.reporter else {
        return;
    };
    if reporter.is_finished() {
        return;
    }
    match direction {
        Direction::Sent => reporter.sent_message_size(part, size),
        Direction::Received => reporter.received_message_size(part, size),
    }
}

#[cfg(test)]
mod tests {
    use std::time::Instant;

    use tonic::Status;

    use super::*;
    use crate::reporter::tests::EventLog;
    use crate::types::StreamDesc;

    fn tagged(handler: &MetricsStatsHandler<EventLog>) -> Extensions {
        let mut ctx = Extensions::new();
        handler.tag_rpc(
            &mut ctx,
            &RpcTagInfo::new("/Svc/Ping", StreamDesc::default()),
        );
        ctx
    }

    fn begin() -> RpcStats {
        RpcStats::Begin {
            begin_time: Instant::now(),
        }
    }

    #[test]
    fn untagged_context_is_ignored() {
        let log = EventLog::default();
        let handler = MetricsStatsHandler::new(log.clone());
        let mut ctx = Extensions::new();
        handler.handle_rpc(&mut ctx, &begin());
        handler.handle_rpc(&mut ctx, &RpcStats::End { error: None });
        assert!(log.events().is_empty());
    }

    #[test]
    fn full_lifecycle() {
        let log = EventLog::default();
        let handler = MetricsStatsHandler::new(log.clone());
        let mut ctx = tagged(&handler);

        handler.handle_rpc(&mut ctx, &begin());
        assert!(RpcInfo::<EventLog>::get(&ctx).unwrap().is_in_flight());
        handler.handle_rpc(
            &mut ctx,
            &RpcStats::Payload {
                direction: Direction::Received,
                wire_length: 9,
            },
        );
        handler.handle_rpc(
            &mut ctx,
            &RpcStats::Trailer {
                direction: Direction::Sent,
                wire_length: 4,
            },
        );
        handler.handle_rpc(
            &mut ctx,
            &RpcStats::End {
                error: Some(Status::not_found("gone")),
            },
        );

        assert_eq!(
            log.events(),
            vec![
                "started Svc/Ping",
                "size received payload 9",
                "size sent trailer 4",
                "handled NotFound"
            ]
        );
        assert!(!RpcInfo::<EventLog>::get(&ctx).unwrap().is_in_flight());
    }

    #[test]
    fn sizes_before_begin_are_dropped() {
        let log = EventLog::default();
        let handler = MetricsStatsHandler::new(log.clone());
        let mut ctx = tagged(&handler);
        handler.handle_rpc(
            &mut ctx,
            &RpcStats::Header {
                direction: Direction::Received,
                wire_length: 20,
            },
        );
        assert!(log.events().is_empty());
    }

    #[test]
    fn repeated_begin_and_end_record_once() {
        let log = EventLog::default();
        let handler = MetricsStatsHandler::new(log.clone());
        let mut ctx = tagged(&handler);
        let begin = begin();
        handler.handle_rpc(&mut ctx, &begin);
        handler.handle_rpc(&mut ctx, &begin);
        handler.handle_rpc(&mut ctx, &RpcStats::End { error: None });
        handler.handle_rpc(&mut ctx, &RpcStats::End { error: None });
        handler.handle_rpc(&mut ctx, &begin);
        assert_eq!(log.events(), vec!["started Svc/Ping", "handled Ok"]);
    }

    #[test]
    fn cloned_context_shares_the_terminal_event() {
        let log = EventLog::default();
        let handler = MetricsStatsHandler::new(log.clone());
        let mut ctx = tagged(&handler);
        handler.handle_rpc(&mut ctx, &begin());
        let mut copy = ctx.clone();

        handler.handle_rpc(&mut ctx, &RpcStats::End { error: None });
        assert!(!RpcInfo::<EventLog>::get(&copy).unwrap().is_in_flight());
        handler.handle_rpc(
            &mut copy,
            &RpcStats::Payload {
                direction: Direction::Sent,
                wire_length: 7,
            },
        );
        handler.handle_rpc(
            &mut copy,
            &RpcStats::End {
                error: Some(Status::internal("late")),
            },
        );
        drop(copy);
        drop(ctx);

        assert_eq!(log.events(), vec!["started Svc/Ping", "handled Ok"]);
    }

    #[test]
    fn context_dropped_before_end_records_cancelled() {
        let log = EventLog::default();
        let handler = MetricsStatsHandler::new(log.clone());
        let mut ctx = tagged(&handler);
        handler.handle_rpc(&mut ctx, &begin());
        let copy = ctx.clone();

        drop(ctx);
        assert_eq!(log.events(), vec!["started Svc/Ping"]);
        drop(copy);
        assert_eq!(log.events(), vec!["started Svc/Ping", "handled Cancelled"]);
    }

    #[test]
    fn retagging_replaces_the_entry() {
        let handler = MetricsStatsHandler::new(EventLog::default());
        let mut ctx = tagged(&handler);
        handler.tag_rpc(
            &mut ctx,
            &RpcTagInfo::new(
                "/Svc/Chat",
                StreamDesc {
                    client_streams: true,
                    server_streams: true,
                },
            ),
        );
        let info = RpcInfo::<EventLog>::get(&ctx).unwrap();
        assert_eq!(info.full_method_name(), "/Svc/Chat");
        assert_eq!(info.shape(), crate::types::RpcShape::BidiStream);
    }
}
