use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The settlement idempotency record: one per order, keyed by order id in
/// the store. `gateway_ref` is the payment gateway's own identifier and is
/// reused instead of creating a second authorization.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub order_id: Uuid,
    pub gateway_ref: String,
}
