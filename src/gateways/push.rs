use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::models::user::DelivererProfile;

/// One push notification per lifecycle event, carrying only the minimal
/// projection needed to build a client payload.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type")]
pub enum PushKind {
    NewOrder { order_id: Uuid },
    OrderReceivedBid { order_id: Uuid, bid_id: Uuid, deliverer: DelivererProfile },
    OrderWon { order_id: Uuid, bid_id: Uuid },
    OrderLost { order_id: Uuid },
    OrderCancelled { order_id: Uuid },
    OrderCancelledAutomatically { order_id: Uuid },
    OrderStarted { order_id: Uuid },
    OrderPickedUp { order_id: Uuid },
    OrderDelivered { order_id: Uuid },
    OrderDeliveredReminder { order_id: Uuid },
    OrderReceived { order_id: Uuid, bid_id: Uuid },
}

impl PushKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::NewOrder { .. } => "NewOrder",
            Self::OrderReceivedBid { .. } => "OrderReceivedBid",
            Self::OrderWon { .. } => "OrderWon",
            Self::OrderLost { .. } => "OrderLost",
            Self::OrderCancelled { .. } => "OrderCancelled",
            Self::OrderCancelledAutomatically { .. } => "OrderCancelledAutomatically",
            Self::OrderStarted { .. } => "OrderStarted",
            Self::OrderPickedUp { .. } => "OrderPickedUp",
            Self::OrderDelivered { .. } => "OrderDelivered",
            Self::OrderDeliveredReminder { .. } => "OrderDeliveredReminder",
            Self::OrderReceived { .. } => "OrderReceived",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PushMessage {
    pub recipient: Uuid,
    #[serde(flatten)]
    pub kind: PushKind,
}

/// Fire-and-continue delivery of lifecycle events. Implementations handle
/// their own failures; a lost notification never reverts order state.
pub trait PushGateway: Send + Sync {
    fn push(&self, message: PushMessage);
}

/// Default gateway: logs each event and publishes it on the broadcast
/// channel backing the websocket stream.
pub struct ChannelPush {
    events_tx: broadcast::Sender<PushMessage>,
}

impl ChannelPush {
    pub fn new(events_tx: broadcast::Sender<PushMessage>) -> Self {
        Self { events_tx }
    }
}

impl PushGateway for ChannelPush {
    fn push(&self, message: PushMessage) {
        debug!(
            recipient = %message.recipient,
            event = message.kind.name(),
            "push notification"
        );

        // A send error only means nobody is subscribed right now.
        if let Err(err) = self.events_tx.send(message) {
            warn!(error = %err, "push event dropped: no subscribers");
        }
    }
}
