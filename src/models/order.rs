use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub fn in_range(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lng)
    }
}

/// A named place with coordinates. Coordinates are validated at order
/// creation, so every stored address can be geofenced against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Address {
    pub name: String,
    pub coordinate: GeoPoint,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct DeliveryWindow {
    pub earliest: DateTime<Utc>,
    pub latest: DateTime<Utc>,
}

impl DeliveryWindow {
    pub fn contains(&self, time: DateTime<Utc>) -> bool {
        self.earliest <= time && time <= self.latest
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub enum PaymentType {
    Cash,
    MobilePay,
}

/// The six lifecycle states. `PickedUp` and `Delivered` are reachable only
/// through the geofence detector, never through a direct user action.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum OrderState {
    Pending,
    Accepted,
    Started,
    PickedUp,
    Delivered,
    Received,
}

impl OrderState {
    /// States from which Receive is legal.
    pub fn is_receivable(&self) -> bool {
        matches!(self, Self::Started | Self::PickedUp | Self::Delivered)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Received)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub id: Uuid,
    pub description: String,
    pub pickup_address: Address,
    pub delivery_address: Address,
    pub cost: Option<f64>,
    pub delivery_price: f64,
    pub delivery_window: Option<DeliveryWindow>,
    pub payment_type: PaymentType,
    pub expensive: bool,
    pub state: OrderState,
    pub bids: Vec<Uuid>,
    pub accepted_bid: Option<Uuid>,
    pub scheduled_delivery_time: Option<DateTime<Utc>>,
    pub location: Option<GeoPoint>,
    pub created_at: DateTime<Utc>,
}

impl Order {
    /// Invariant: `accepted_bid`, when present, is a member of `bids`.
    pub fn accepted_bid_is_consistent(&self) -> bool {
        match self.accepted_bid {
            Some(bid_id) => self.bids.contains(&bid_id),
            None => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::{DeliveryWindow, GeoPoint, OrderState};

    #[test]
    fn receivable_states() {
        assert!(!OrderState::Pending.is_receivable());
        assert!(!OrderState::Accepted.is_receivable());
        assert!(OrderState::Started.is_receivable());
        assert!(OrderState::PickedUp.is_receivable());
        assert!(OrderState::Delivered.is_receivable());
        assert!(!OrderState::Received.is_receivable());
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let earliest = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let latest = Utc.with_ymd_and_hms(2024, 5, 1, 14, 0, 0).unwrap();
        let window = DeliveryWindow { earliest, latest };

        assert!(window.contains(earliest));
        assert!(window.contains(latest));
        assert!(!window.contains(latest + chrono::Duration::seconds(1)));
    }

    #[test]
    fn coordinate_range_check() {
        assert!(GeoPoint { lat: 55.67, lng: 12.56 }.in_range());
        assert!(!GeoPoint { lat: 91.0, lng: 0.0 }.in_range());
        assert!(!GeoPoint { lat: 0.0, lng: -180.5 }.in_range());
    }
}
