use std::time::Duration;

use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGaugeVec, Opts, Registry,
    TextEncoder,
};

use super::settings::Environment;

/// Prometheus registry for the HTTP surface. Each instance owns its registry,
/// so independent routers never share series.
pub(crate) struct HttpMetrics {
    registry: Registry,
    requests_total: IntCounterVec,
    request_duration: HistogramVec,
    build_info: IntGaugeVec,
}

impl HttpMetrics {
    pub(crate) fn new() -> Result<Self, prometheus::Error> {
        let requests_total = IntCounterVec::new(
            Opts::new("http_requests_total", "Total number of HTTP requests"),
            &["method", "path", "status"],
        )?;
        let request_duration = HistogramVec::new(
            HistogramOpts::new("http_request_duration_seconds", "Request duration"),
            &["method", "path"],
        )?;
        let build_info = IntGaugeVec::new(
            Opts::new("build_info", "Build information for the blog API"),
            &["version", "env"],
        )?;

        let registry = Registry::new();
        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(request_duration.clone()))?;
        registry.register(Box::new(build_info.clone()))?;

        Ok(Self {
            registry,
            requests_total,
            request_duration,
            build_info,
        })
    }

    pub(crate) fn set_build_info(&self, version: &str, environment: Environment) {
        self.build_info
            .with_label_values(&[version, environment.as_str()])
            .set(1);
    }

    /// `path` is the route template, never the raw URI, to keep label
    /// cardinality bounded.
    pub(crate) fn observe(&self, method: &str, path: &str, status: u16, elapsed: Duration) {
        let status = status.to_string();
        self.requests_total
            .with_label_values(&[method, path, status.as_str()])
            .inc();
        self.request_duration
            .with_label_values(&[method, path])
            .observe(elapsed.as_secs_f64());
    }

    /// Text exposition format.
    pub(crate) fn render(&self) -> Result<String, prometheus::Error> {
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|err| prometheus::Error::Msg(err.to_string()))
    }
}
