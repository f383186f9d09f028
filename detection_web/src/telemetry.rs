use opentelemetry::{
    global,
    metrics::{Counter, Gauge, Histogram, MeterProvider},
    KeyValue,
};
use opentelemetry_sdk::metrics::SdkMeterProvider;
use prometheus::Registry;

pub struct Metrics {
    // the provider shuts its readers down once the last handle is dropped
    _provider: SdkMeterProvider,
    view_requests: Counter<u64>,
    detection_duration: Histogram<u64>,
    backend_online: Gauge<u64>,
    pub registry: Registry,
}

impl Metrics {
    pub fn new() -> anyhow::Result<Self> {
        let registry = Registry::new();
        let exporter = opentelemetry_prometheus::exporter()
            .with_registry(registry.clone())
            .build()?;

        let provider = SdkMeterProvider::builder().with_reader(exporter).build();

        let meter = provider.meter("detection_web");
        global::set_meter_provider(provider.clone());

        let view_requests = meter
            .u64_counter("view_requests_total")
            .with_description("Total number of view requests")
            .build();

        let detection_duration = meter
            .u64_histogram("detection_duration_ms")
            .with_boundaries(detection_boundaries(50, 30_000))
            .with_description("Round trip of detection requests in milliseconds")
            .build();

        let backend_online = meter
            .u64_gauge("backend_online")
            .with_description("1 when the last health check reached the backend")
            .build();

        Ok(Metrics {
            _provider: provider,
            view_requests,
            detection_duration,
            backend_online,
            registry,
        })
    }

    pub fn record_view(&self, route: &str) {
        let attributes = vec![KeyValue::new("route", route.to_string())];
        self.view_requests.add(1, &attributes);
    }

    pub fn record_detection_duration(&self, duration_ms: u64, images: usize) {
        let attributes = vec![KeyValue::new("images", images as i64)];
        self.detection_duration.record(duration_ms, &attributes);
    }

    pub fn record_backend_online(&self, online: bool) {
        self.backend_online.record(u64::from(online), &[]);
    }
}

/// Doubling bucket boundaries from `start` up to and including `max`.
fn detection_boundaries(start: u64, max: u64) -> Vec<f64> {
    let mut boundaries: Vec<f64> = std::iter::successors(Some(start.max(1)), |b| Some(b * 2))
        .take_while(|&b| b < max)
        .map(|b| b as f64)
        .collect();
    boundaries.push(max as f64);
    boundaries
}
