use shared::metrics_defs::{MetricDef, MetricType};

pub const REQUESTS: MetricDef = MetricDef {
    name: "gateway.requests",
    metric_type: MetricType::Counter,
    description: "Requests handled by a gateway route. Tagged with route, status.",
};

pub const REQUEST_DURATION: MetricDef = MetricDef {
    name: "gateway.request.duration",
    metric_type: MetricType::Histogram,
    description: "Request duration in seconds. Tagged with route, status.",
};

pub const REQUEST_FAILURES: MetricDef = MetricDef {
    name: "gateway.request.failures",
    metric_type: MetricType::Counter,
    description: "Requests that did not reach a 2xx downstream answer. Tagged with route, kind.",
};

pub const ALL_METRICS: &[MetricDef] = &[REQUESTS, REQUEST_DURATION, REQUEST_FAILURES];
