use prometheus::{CounterVec, HistogramOpts, HistogramVec, Opts, Registry};
use std::sync::Arc;
use std::time::Duration;

/// Prometheus collectors for request routing.
#[derive(Clone)]
pub struct RouterMetrics {
    /// Time spent from mount resolution to the backend's answer
    pub route_duration: HistogramVec,
    /// Routed requests by outcome
    pub route_requests: CounterVec,
}

impl RouterMetrics {
    pub fn new(registry: Arc<Registry>) -> Result<Self, prometheus::Error> {
        let route_duration = HistogramVec::new(
            HistogramOpts::new(
                "vault_route_duration_seconds",
                "Duration of requests routed to a mount in seconds",
            ),
            &["operation", "mount"],
        )?;

        let route_requests = CounterVec::new(
            Opts::new("vault_route_requests_total", "Requests routed to a mount"),
            &["operation", "mount", "outcome"],
        )?;

        registry.register(Box::new(route_duration.clone()))?;
        registry.register(Box::new(route_requests.clone()))?;

        Ok(Self { route_duration, route_requests })
    }

    /// Record one dispatch against `mount`.
    pub fn record_route(&self, operation: &str, mount: &str, elapsed: Duration, success: bool) {
        let label = mount_label(mount);
        let mount = label.as_str();
        let outcome = if success { "ok" } else { "error" };

        self.route_duration.with_label_values(&[operation, mount]).observe(elapsed.as_secs_f64());
        self.route_requests.with_label_values(&[operation, mount, outcome]).inc();
    }
}

/// Mount paths with separators swapped for `-` so they read well as labels.
pub fn mount_label(mount: &str) -> String {
    mount.replace('/', "-")
}
