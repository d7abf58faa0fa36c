use prometheus::{Encoder, IntCounter, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub orders_created_total: IntCounter,
    pub bids_total: IntCounterVec,
    pub transitions_total: IntCounterVec,
    pub settlements_total: IntCounterVec,
    pub timers_armed_total: IntCounterVec,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let orders_created_total =
            IntCounter::new("orders_created_total", "Total orders created")
                .expect("valid orders_created_total metric");

        let bids_total = IntCounterVec::new(
            Opts::new("bids_total", "Bid admissions by outcome"),
            &["outcome"],
        )
        .expect("valid bids_total metric");

        let transitions_total = IntCounterVec::new(
            Opts::new("transitions_total", "Order state transitions by kind"),
            &["transition"],
        )
        .expect("valid transitions_total metric");

        let settlements_total = IntCounterVec::new(
            Opts::new("settlements_total", "Payment settlements by outcome"),
            &["outcome"],
        )
        .expect("valid settlements_total metric");

        let timers_armed_total = IntCounterVec::new(
            Opts::new("timers_armed_total", "One-shot timers armed by kind"),
            &["kind"],
        )
        .expect("valid timers_armed_total metric");

        registry
            .register(Box::new(orders_created_total.clone()))
            .expect("register orders_created_total");
        registry
            .register(Box::new(bids_total.clone()))
            .expect("register bids_total");
        registry
            .register(Box::new(transitions_total.clone()))
            .expect("register transitions_total");
        registry
            .register(Box::new(settlements_total.clone()))
            .expect("register settlements_total");
        registry
            .register(Box::new(timers_armed_total.clone()))
            .expect("register timers_armed_total");

        Self {
            registry,
            orders_created_total,
            bids_total,
            transitions_total,
            settlements_total,
            timers_armed_total,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
