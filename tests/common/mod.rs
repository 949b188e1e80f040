//! Shared helpers for scraping a private registry.

#![allow(dead_code)]

use prometheus::{Encoder, Registry, TextEncoder};

/// Service name used by every integration test.
pub const SVC: &str = "pkg.TestService";

/// Render the registry in the text exposition format.
pub fn scrape(registry: &Registry) -> String {
    let mut buf = Vec::new();
    TextEncoder::new()
        .encode(&registry.gather(), &mut buf)
        .expect("encode metrics");
    String::from_utf8(buf).expect("utf-8 exposition")
}

fn matching<'t>(
    text: &'t str,
    metric: &'t str,
    labels: &'t [(&str, &str)],
) -> impl Iterator<Item = &'t str> {
    text.lines()
        .filter(|line| !line.starts_with('#'))
        .filter(move |line| {
            line.strip_prefix(metric)
                .is_some_and(|rest| rest.starts_with('{') || rest.starts_with(' '))
        })
        .filter(move |line| {
            labels
                .iter()
                .all(|(k, v)| line.contains(&format!("{k}=\"{v}\"")))
        })
}

/// Sum every sample of `metric` whose labels contain all of `labels`.
pub fn sample_sum(text: &str, metric: &str, labels: &[(&str, &str)]) -> f64 {
    matching(text, metric, labels)
        .filter_map(|line| line.rsplit(' ').next()?.parse::<f64>().ok())
        .sum()
}

/// Number of distinct samples of `metric` matching `labels`.
pub fn sample_count(text: &str, metric: &str, labels: &[(&str, &str)]) -> usize {
    matching(text, metric, labels).count()
}

/// The scraped series of one method of [`SVC`].
pub struct MethodSeries<'a> {
    text: &'a str,
    prefix: &'static str,
    labels: [(&'static str, &'a str); 3],
}

impl<'a> MethodSeries<'a> {
    fn new(text: &'a str, prefix: &'static str, shape: &'a str, method: &'a str) -> Self {
        Self {
            text,
            prefix,
            labels: [
                ("grpc_type", shape),
                ("grpc_service", SVC),
                ("grpc_method", method),
            ],
        }
    }

    /// Series under the default `grpc_server` prefix.
    pub fn server(text: &'a str, shape: &'a str, method: &'a str) -> Self {
        Self::new(text, "grpc_server", shape, method)
    }

    /// Series under the default `grpc_client` prefix.
    pub fn client(text: &'a str, shape: &'a str, method: &'a str) -> Self {
        Self::new(text, "grpc_client", shape, method)
    }

    /// Sum of `<prefix>_<suffix>` for this method.
    pub fn value(&self, suffix: &str) -> f64 {
        let metric = format!("{}_{suffix}", self.prefix);
        sample_sum(self.text, &metric, &self.labels)
    }

    /// Number of `<prefix>_<suffix>` samples for this method.
    pub fn count(&self, suffix: &str) -> usize {
        let metric = format!("{}_{suffix}", self.prefix);
        sample_count(self.text, &metric, &self.labels)
    }

    /// Value of `<prefix>_handled_total` for one code.
    pub fn handled(&self, code: &str) -> f64 {
        let metric = format!("{}_handled_total", self.prefix);
        let [shape, service, method] = self.labels;
        let labels = [shape, service, method, ("grpc_code", code)];
        sample_sum(self.text, &metric, &labels)
    }
}
