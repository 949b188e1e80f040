//! Tests for the stats-callback adapter against a private registry.

mod common;

use std::sync::Arc;
use std::time::{Duration, Instant};

use http::Extensions;
use prometheus::Registry;
use rpcmon::stats::ConnTagInfo;
use rpcmon::types::{Direction, StreamDesc};
use rpcmon::{MetricsStatsHandler, RpcInfo, RpcMetrics, RpcStats, RpcTagInfo, StatsHandler};
use tonic::Status;

use common::{MethodSeries, SVC, sample_sum, scrape};

fn setup() -> (Registry, RpcMetrics, MetricsStatsHandler) {
    let registry = Registry::new();
    let metrics = RpcMetrics::server();
    metrics.register(&registry).unwrap();
    let handler = MetricsStatsHandler::new(metrics.clone());
    (registry, metrics, handler)
}

fn begin_at(begin_time: Instant) -> RpcStats {
    RpcStats::Begin { begin_time }
}

fn payload(direction: Direction, wire_length: usize) -> RpcStats {
    RpcStats::Payload {
        direction,
        wire_length,
    }
}

fn end(error: Option<Status>) -> RpcStats {
    RpcStats::End { error }
}

/// A fresh context tagged for one method of the test service.
fn tagged(handler: &MetricsStatsHandler, method: &str, desc: StreamDesc) -> Extensions {
    let mut ctx = Extensions::new();
    let method = format!("/{SVC}/{method}");
    handler.tag_rpc(&mut ctx, &RpcTagInfo::new(&method, desc));
    ctx
}

/// Drive one server-streaming RPC through the callback contract.
fn run_list(handler: &MetricsStatsHandler, messages: usize, error: Option<Status>) {
    let mut ctx = tagged(handler, "PingList", StreamDesc::server_streaming());
    handler.handle_rpc(&mut ctx, &begin_at(Instant::now()));
    handler.handle_rpc(&mut ctx, &payload(Direction::Received, 5));
    for _ in 0..messages {
        handler.handle_rpc(&mut ctx, &payload(Direction::Sent, 11));
    }
    handler.handle_rpc(&mut ctx, &end(error));
}

#[test]
fn unary_lifecycle() {
    let (registry, metrics, handler) = setup();
    metrics.enable_received_size_histogram(None).unwrap();
    metrics.enable_sent_size_histogram(None).unwrap();

    let mut ctx = tagged(&handler, "PingEmpty", StreamDesc::default());
    handler.tag_conn(&mut ctx, &ConnTagInfo::default());
    handler.handle_rpc(&mut ctx, &begin_at(Instant::now()));
    handler.handle_rpc(
        &mut ctx,
        &RpcStats::Header {
            direction: Direction::Received,
            wire_length: 64,
        },
    );
    handler.handle_rpc(&mut ctx, &payload(Direction::Received, 5));
    handler.handle_rpc(&mut ctx, &payload(Direction::Sent, 5));
    handler.handle_rpc(
        &mut ctx,
        &RpcStats::Trailer {
            direction: Direction::Sent,
            wire_length: 16,
        },
    );
    handler.handle_rpc(&mut ctx, &end(None));

    let text = scrape(&registry);
    let ping = MethodSeries::server(&text, "unary", "PingEmpty");
    assert_eq!(ping.value("started_total"), 1.0);
    assert_eq!(ping.value("msg_received_total"), 1.0);
    assert_eq!(ping.value("msg_sent_total"), 1.0);
    assert_eq!(ping.handled("OK"), 1.0);

    let header = [("grpc_method", "PingEmpty"), ("grpc_stats", "header")];
    let received = "grpc_server_msg_size_received_bytes_sum";
    assert_eq!(sample_sum(&text, received, &header), 64.0);
    let trailer = [("grpc_method", "PingEmpty"), ("grpc_stats", "trailer")];
    let sent = "grpc_server_msg_size_sent_bytes_sum";
    assert_eq!(sample_sum(&text, sent, &trailer), 16.0);
}

#[test]
fn server_stream_counts_messages() {
    for k in [0, 1, 20] {
        let (registry, _metrics, handler) = setup();
        run_list(&handler, k, None);

        let text = scrape(&registry);
        let list = MethodSeries::server(&text, "server_stream", "PingList");
        assert_eq!(list.value("msg_sent_total"), k as f64);
        assert_eq!(list.handled("OK"), 1.0);
    }
}

#[test]
fn end_with_error_records_its_code() {
    let (registry, _metrics, handler) = setup();
    run_list(&handler, 20, None);
    run_list(&handler, 0, Some(Status::failed_precondition("stop")));

    let text = scrape(&registry);
    let list = MethodSeries::server(&text, "server_stream", "PingList");
    assert_eq!(list.value("msg_sent_total"), 20.0);
    assert_eq!(list.handled("FailedPrecondition"), 1.0);
    assert_eq!(list.handled("OK"), 1.0);
}

#[test]
fn begin_time_drives_handling_latency() {
    let (registry, metrics, handler) = setup();
    metrics
        .enable_handling_time_histogram(Some(vec![0.5, 5.0]))
        .unwrap();

    let mut ctx = tagged(&handler, "PingEmpty", StreamDesc::default());
    let begin_time = Instant::now() - Duration::from_secs(1);
    handler.handle_rpc(&mut ctx, &begin_at(begin_time));
    let info = RpcInfo::<RpcMetrics>::get(&ctx).unwrap();
    assert_eq!(info.begin_time(), Some(begin_time));
    handler.handle_rpc(&mut ctx, &end(None));

    let text = scrape(&registry);
    let metric = "grpc_server_handling_seconds_bucket";
    let fast = [("grpc_method", "PingEmpty"), ("le", "0.5")];
    assert_eq!(sample_sum(&text, metric, &fast), 0.0);
    let slow = [("grpc_method", "PingEmpty"), ("le", "5")];
    assert_eq!(sample_sum(&text, metric, &slow), 1.0);
}

#[test]
fn untagged_rpc_records_nothing() {
    let (registry, _metrics, handler) = setup();
    let mut ctx = Extensions::new();
    handler.handle_rpc(&mut ctx, &begin_at(Instant::now()));
    handler.handle_rpc(&mut ctx, &payload(Direction::Received, 5));
    handler.handle_rpc(&mut ctx, &end(None));

    let text = scrape(&registry);
    assert_eq!(sample_sum(&text, "grpc_server_started_total", &[]), 0.0);
    assert_eq!(sample_sum(&text, "grpc_server_handled_total", &[]), 0.0);
}

#[test]
fn cloned_context_records_end_once() {
    let (registry, _metrics, handler) = setup();
    let mut ctx = tagged(&handler, "PingEmpty", StreamDesc::default());
    handler.handle_rpc(&mut ctx, &begin_at(Instant::now()));
    let mut copy = ctx.clone();

    handler.handle_rpc(&mut ctx, &end(None));
    handler.handle_rpc(&mut copy, &end(Some(Status::internal("late"))));
    handler.handle_rpc(&mut copy, &end(None));
    drop(ctx);
    drop(copy);

    let text = scrape(&registry);
    let ping = MethodSeries::server(&text, "unary", "PingEmpty");
    assert_eq!(ping.value("started_total"), 1.0);
    assert_eq!(ping.value("handled_total"), 1.0);
    assert_eq!(ping.handled("OK"), 1.0);
}

#[test]
fn context_dropped_without_end_is_cancelled() {
    let (registry, _metrics, handler) = setup();
    let mut ctx = tagged(&handler, "PingEmpty", StreamDesc::default());
    handler.handle_rpc(&mut ctx, &begin_at(Instant::now()));
    drop(ctx);

    let text = scrape(&registry);
    let ping = MethodSeries::server(&text, "unary", "PingEmpty");
    assert_eq!(ping.handled("Canceled"), 1.0);
}

#[tokio::test]
async fn interleaved_rpcs_keep_their_own_context() {
    let (registry, _metrics, handler) = setup();
    let handler = Arc::new(handler);
    let rpcs = 32usize;

    let mut tasks = Vec::new();
    for i in 0..rpcs {
        let handler = handler.clone();
        tasks.push(tokio::spawn(async move {
            let method = if i % 2 == 0 { "PingEmpty" } else { "PingError" };
            let mut ctx = tagged(&handler, method, StreamDesc::default());
            tokio::task::yield_now().await;
            handler.handle_rpc(&mut ctx, &begin_at(Instant::now()));
            tokio::task::yield_now().await;
            handler.handle_rpc(&mut ctx, &payload(Direction::Received, 3));
            tokio::task::yield_now().await;
            let error = (i % 2 == 1).then(|| Status::failed_precondition("odd"));
            if error.is_none() {
                handler.handle_rpc(&mut ctx, &payload(Direction::Sent, 3));
            }
            handler.handle_rpc(&mut ctx, &end(error));
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let half = (rpcs / 2) as f64;
    let text = scrape(&registry);
    let empty = MethodSeries::server(&text, "unary", "PingEmpty");
    let error = MethodSeries::server(&text, "unary", "PingError");
    assert_eq!(empty.handled("OK"), half);
    assert_eq!(error.handled("FailedPrecondition"), half);
    assert_eq!(error.handled("OK"), 0.0);
    assert_eq!(error.value("msg_sent_total"), 0.0);
    assert_eq!(error.value("msg_received_total"), half);
}
