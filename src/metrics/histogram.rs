//! Histograms that are allocated on first enable.

use std::sync::OnceLock;

use prometheus::{HistogramOpts, HistogramVec};
use tracing::{debug, warn};

use crate::Result;
use crate::config::validate_buckets;

struct Enabled {
    vec: HistogramVec,
    buckets: Vec<f64>,
}

/// A histogram vector that does not exist until it is enabled.
///
/// Enabling is first-write-wins: the bucket layout chosen by the first
/// successful call stays for the lifetime of the slot. Observations made
/// before the slot is set are dropped, never backfilled.
pub(crate) struct LazyHistogram {
    opts: HistogramOpts,
    label_names: &'static [&'static str],
    default_buckets: Vec<f64>,
    slot: OnceLock<Enabled>,
}

impl LazyHistogram {
    /// `opts` carries names and const labels; buckets come from [`enable`].
    ///
    /// [`enable`]: LazyHistogram::enable
    pub(crate) fn new(
        opts: HistogramOpts,
        label_names: &'static [&'static str],
        default_buckets: Vec<f64>,
    ) -> Self {
        Self {
            opts,
            label_names,
            default_buckets,
            slot: OnceLock::new(),
        }
    }

    pub(crate) fn enable(&self, buckets: Option<Vec<f64>>) -> Result<()> {
        let buckets = buckets.unwrap_or_else(|| self.default_buckets.clone());
        validate_buckets(&buckets)?;

        if let Some(existing) = self.slot.get() {
            self.warn_if_changed(existing, &buckets);
            return Ok(());
        }

        let opts = self.opts.clone().buckets(buckets.clone());
        let vec = HistogramVec::new(opts, self.label_names)?;
        match self.slot.set(Enabled { vec, buckets }) {
            Ok(()) => debug!(histogram = %self.opts.common_opts.fq_name(), "Histogram enabled"),
            Err(lost) => {
                if let Some(existing) = self.slot.get() {
                    self.warn_if_changed(existing, &lost.buckets);
                }
            }
        }
        Ok(())
    }

    fn warn_if_changed(&self, existing: &Enabled, requested: &[f64]) {
        if existing.buckets != requested {
            warn!(
                histogram = %self.opts.common_opts.fq_name(),
                active = ?existing.buckets,
                requested = ?requested,
                "Histogram already enabled, ignoring new buckets"
            );
        }
    }

    pub(crate) fn get(&self) -> Option<&HistogramVec> {
        self.slot.get().map(|enabled| &enabled.vec)
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.slot.get().is_some()
    }
}
