use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::user::DelivererProfile;

/// A courier's proposal to fulfil an order at a price and time.
/// At most one bid exists per (order, user) pair.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bid {
    pub id: Uuid,
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub delivery_price: f64,
    pub delivery_time: DateTime<Utc>,
}

impl Bid {
    /// A bid is active while its proposed delivery time has not yet elapsed.
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        now <= self.delivery_time
    }
}

/// What order owners get to see about a bid: the bid terms plus the
/// deliverer-safe projection of the bidder, never the bidder's id.
#[derive(Debug, Clone, Serialize)]
pub struct BidView {
    pub id: Uuid,
    pub order_id: Uuid,
    pub delivery_price: f64,
    pub delivery_time: DateTime<Utc>,
    pub deliverer: DelivererProfile,
}
