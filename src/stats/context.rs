use std::sync::Arc;
use std::time::Instant;

use http::Extensions;

use crate::metrics::RpcMetrics;
use crate::reporter::Reporter;
use crate::sink::RpcEventSink;
use crate::types::RpcShape;

use super::RpcTagInfo;

/// Correlation entry stored in an RPC's context by
/// [`MetricsStatsHandler`](super::MetricsStatsHandler).
///
/// The reporter is created by the `Begin` event and taken by `End`. Clones of
/// the entry share the reporter, so the terminal status is recorded once no
/// matter which copy sees `End`.
#[derive(Debug, Clone)]
pub struct RpcInfo<S: RpcEventSink = RpcMetrics> {
    full_method_name: String,
    shape: RpcShape,
    begin_time: Option<Instant>,
    pub(super) reporter: Option<Arc<Reporter<S>>>,
}

impl<S: RpcEventSink> RpcInfo<S> {
    pub(super) fn new(tag: &RpcTagInfo<'_>) -> Self {
        Self {
            full_method_name: tag.full_method_name.to_owned(),
            shape: tag.shape(),
            begin_time: None,
            reporter: None,
        }
    }

    /// The entry attached to `ctx`, if the RPC was tagged.
    pub fn get(ctx: &Extensions) -> Option<&Self> {
        ctx.get::<Self>()
    }

    pub(super) fn get_mut(ctx: &mut Extensions) -> Option<&mut Self> {
        ctx.get_mut::<Self>()
    }

    pub fn full_method_name(&self) -> &str {
        &self.full_method_name
    }

    pub fn shape(&self) -> RpcShape {
        self.shape
    }

    pub fn begin_time(&self) -> Option<Instant> {
        self.begin_time
    }

    pub(super) fn set_begin_time(&mut self, begin_time: Instant) {
        self.begin_time = Some(begin_time);
    }

    /// `true` between `Begin` and the first `End` seen by any copy of this
    /// entry.
    pub fn is_in_flight(&self) -> bool {
        self.reporter
            .as_ref()
            .is_some_and(|reporter| !reporter.is_finished())
    }
}
