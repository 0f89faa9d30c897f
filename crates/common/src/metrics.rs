use std::sync::{Arc, OnceLock};

use prometheus::{
    CounterVec, Encoder, GaugeVec, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder,
};

/// Per-operator counters reported once an operator produces its final page.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OperatorStats {
    pub rows_in: u64,
    pub rows_out: u64,
    pub blocks_in: u64,
    pub blocks_out: u64,
}

#[derive(Clone, Debug)]
pub struct MetricsRegistry {
    inner: Arc<MetricsInner>,
}

#[derive(Debug)]
struct MetricsInner {
    registry: Registry,
    operator_rows_in: CounterVec,
    operator_rows_out: CounterVec,
    operator_blocks_in: CounterVec,
    operator_blocks_out: CounterVec,
    operator_time_seconds: HistogramVec,
    opchain_noop_yields: CounterVec,
    opchain_running: GaugeVec,
    opchain_finished: CounterVec,
}

impl MetricsRegistry {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(MetricsInner::new()),
        }
    }

    pub fn record_operator(
        &self,
        query_id: &str,
        stage_id: u64,
        operator: &str,
        stats: OperatorStats,
        secs: f64,
    ) {
        let labels = [query_id, &stage_id.to_string(), operator];
        self.inner
            .operator_rows_in
            .with_label_values(&labels)
            .inc_by(stats.rows_in as f64);
        self.inner
            .operator_rows_out
            .with_label_values(&labels)
            .inc_by(stats.rows_out as f64);
        self.inner
            .operator_blocks_in
            .with_label_values(&labels)
            .inc_by(stats.blocks_in as f64);
        self.inner
            .operator_blocks_out
            .with_label_values(&labels)
            .inc_by(stats.blocks_out as f64);
        self.inner
            .operator_time_seconds
            .with_label_values(&labels)
            .observe(secs.max(0.0));
    }

    pub fn inc_opchain_noop_yields(&self, query_id: &str, stage_id: u64) {
        let labels = [query_id, &stage_id.to_string()];
        self.inner
            .opchain_noop_yields
            .with_label_values(&labels)
            .inc();
    }

    pub fn set_opchain_running(&self, query_id: &str, stage_id: u64, running: u64) {
        let labels = [query_id, &stage_id.to_string()];
        self.inner
            .opchain_running
            .with_label_values(&labels)
            .set(running as f64);
    }

    pub fn inc_opchain_finished(&self, query_id: &str, stage_id: u64, outcome: &str) {
        let labels = [query_id, &stage_id.to_string(), outcome];
        self.inner
            .opchain_finished
            .with_label_values(&labels)
            .inc();
    }

    pub fn render_prometheus(&self) -> String {
        let metric_families = self.inner.registry.gather();
        let mut out = Vec::new();
        let enc = TextEncoder::new();
        if enc.encode(&metric_families, &mut out).is_err() {
            return String::new();
        }
        String::from_utf8_lossy(&out).to_string()
    }
}

impl Default for MetricsRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MetricsInner {
    fn new() -> Self {
        let registry = Registry::new();
        let operator_labels = &["query_id", "stage_id", "operator"];

        let operator_rows_in = counter_vec(
            &registry,
            "kestrel_operator_rows_in_total",
            "Input rows admitted per operator",
            operator_labels,
        );
        let operator_rows_out = counter_vec(
            &registry,
            "kestrel_operator_rows_out_total",
            "Output rows produced per operator",
            operator_labels,
        );
        let operator_blocks_in = counter_vec(
            &registry,
            "kestrel_operator_blocks_in_total",
            "Input data blocks consumed per operator",
            operator_labels,
        );
        let operator_blocks_out = counter_vec(
            &registry,
            "kestrel_operator_blocks_out_total",
            "Output data blocks produced per operator",
            operator_labels,
        );
        let operator_time_seconds = histogram_vec(
            &registry,
            "kestrel_operator_time_seconds",
            "Time spent inside next_block per operator, summed over all pulls",
            operator_labels,
        );

        let opchain_noop_yields = counter_vec(
            &registry,
            "kestrel_opchain_noop_yields_total",
            "Times an op-chain yielded its slot on a no-op block",
            &["query_id", "stage_id"],
        );
        let opchain_running = gauge_vec(
            &registry,
            "kestrel_opchain_running",
            "Currently polled op-chains",
            &["query_id", "stage_id"],
        );
        let opchain_finished = counter_vec(
            &registry,
            "kestrel_opchain_finished_total",
            "Finished op-chains by outcome",
            &["query_id", "stage_id", "outcome"],
        );

        Self {
            registry,
            operator_rows_in,
            operator_rows_out,
            operator_blocks_in,
            operator_blocks_out,
            operator_time_seconds,
            opchain_noop_yields,
            opchain_running,
            opchain_finished,
        }
    }
}

fn counter_vec(registry: &Registry, name: &str, help: &str, labels: &[&str]) -> CounterVec {
    let c = CounterVec::new(Opts::new(name, help), labels).expect("counter vec");
    registry
        .register(Box::new(c.clone()))
        .expect("register counter");
    c
}

fn gauge_vec(registry: &Registry, name: &str, help: &str, labels: &[&str]) -> GaugeVec {
    let g = GaugeVec::new(Opts::new(name, help), labels).expect("gauge vec");
    registry
        .register(Box::new(g.clone()))
        .expect("register gauge");
    g
}

fn histogram_vec(registry: &Registry, name: &str, help: &str, labels: &[&str]) -> HistogramVec {
    let h = HistogramVec::new(HistogramOpts::new(name, help), labels).expect("histogram vec");
    registry
        .register(Box::new(h.clone()))
        .expect("register histogram");
    h
}

static GLOBAL_METRICS: OnceLock<MetricsRegistry> = OnceLock::new();

pub fn global_metrics() -> &'static MetricsRegistry {
    GLOBAL_METRICS.get_or_init(MetricsRegistry::new)
}
