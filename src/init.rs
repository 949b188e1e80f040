//! Series pre-registration.

use tracing::{debug, instrument};

use crate::metrics::RpcMetrics;
use crate::types::{ALL_CODES, RpcShape, ServiceInfo, code_label};

impl RpcMetrics {
    /// Create zero-valued series for every method of `services`.
    ///
    /// Touches started, sent, received and every handled code, plus the
    /// handling-time histogram when it is already enabled, so dashboards see
    /// each method before its first call. Run once at setup, after the
    /// services are known.
    #[instrument(skip_all, fields(role = %self.role(), services = services.len()))]
    pub fn initialize_for_methods(&self, services: &[ServiceInfo]) {
        let mut methods = 0usize;
        for service in services {
            for method in &service.methods {
                self.preregister(method.shape(), &service.name, &method.name);
                methods += 1;
            }
        }
        debug!(methods, "Pre-registered RPC series");
    }

    fn preregister(&self, shape: RpcShape, service: &str, method: &str) {
        let labels = [shape.as_str(), service, method];
        self.started().with_label_values(&labels);
        self.msg_sent().with_label_values(&labels);
        self.msg_received().with_label_values(&labels);
        if let Some(histogram) = self.handling_seconds() {
            histogram.with_label_values(&labels);
        }
        for code in ALL_CODES {
            self.handled()
                .with_label_values(&[shape.as_str(), service, method, code_label(code)]);
        }
    }
}
