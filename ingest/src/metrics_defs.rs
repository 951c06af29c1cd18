use shared::metrics_defs::{MetricDef, MetricType};

pub const REQUEST_DURATION: MetricDef = MetricDef {
    name: "request.duration",
    metric_type: MetricType::Histogram,
    description: "Request duration in seconds",
};

pub const ROWS_WRITTEN: MetricDef = MetricDef {
    name: "rows.written",
    metric_type: MetricType::Counter,
    description: "Rows successfully written to the document store",
};

pub const ROWS_SKIPPED: MetricDef = MetricDef {
    name: "rows.skipped",
    metric_type: MetricType::Counter,
    description: "Rows left untouched because the document already existed",
};

pub const ROWS_FAILED: MetricDef = MetricDef {
    name: "rows.failed",
    metric_type: MetricType::Counter,
    description: "Rows whose document write was rejected by the store",
};

pub const ALL_METRICS: &[MetricDef] =
    &[REQUEST_DURATION, ROWS_WRITTEN, ROWS_SKIPPED, ROWS_FAILED];
