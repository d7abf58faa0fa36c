use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{broadcast, Mutex};
use uuid::Uuid;

use crate::clock::{Clock, SystemClock};
use crate::config::Config;
use crate::gateways::mail::{LogMailer, MailGateway};
use crate::gateways::payment::{PaymentGateway, SandboxPaymentGateway};
use crate::gateways::push::{ChannelPush, PushGateway, PushMessage};
use crate::observability::metrics::Metrics;
use crate::store::Store;

/// Per-order mutual exclusion. The store's calls are individually atomic
/// but do not compose; every guarded read-modify-write sequence for an
/// order must hold that order's lock.
pub struct OrderLocks {
    locks: DashMap<Uuid, Arc<Mutex<()>>>,
}

impl OrderLocks {
    pub fn new() -> Self {
        Self { locks: DashMap::new() }
    }

    pub fn lock_for(&self, order_id: Uuid) -> Arc<Mutex<()>> {
        self.locks
            .entry(order_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone()
    }
}

impl Default for OrderLocks {
    fn default() -> Self {
        Self::new()
    }
}

pub struct AppState {
    pub config: Config,
    pub store: Store,
    pub clock: Arc<dyn Clock>,
    pub push: Arc<dyn PushGateway>,
    pub mailer: Arc<dyn MailGateway>,
    pub payment_gateway: Arc<dyn PaymentGateway>,
    pub events_tx: broadcast::Sender<PushMessage>,
    pub order_locks: OrderLocks,
    pub metrics: Metrics,
}

impl AppState {
    pub fn new(
        config: Config,
        clock: Arc<dyn Clock>,
        push: Arc<dyn PushGateway>,
        mailer: Arc<dyn MailGateway>,
        payment_gateway: Arc<dyn PaymentGateway>,
        events_tx: broadcast::Sender<PushMessage>,
    ) -> Self {
        Self {
            config,
            store: Store::new(),
            clock,
            push,
            mailer,
            payment_gateway,
            events_tx,
            order_locks: OrderLocks::new(),
            metrics: Metrics::new(),
        }
    }

    /// Production wiring: system clock, channel-backed push, logging
    /// mailer, sandbox payment gateway.
    pub fn with_defaults(config: Config) -> Self {
        let (events_tx, _unused_rx) = broadcast::channel(config.event_buffer_size);
        let push = Arc::new(ChannelPush::new(events_tx.clone()));

        Self::new(
            config,
            Arc::new(SystemClock),
            push,
            Arc::new(LogMailer),
            Arc::new(SandboxPaymentGateway::new()),
            events_tx,
        )
    }
}
