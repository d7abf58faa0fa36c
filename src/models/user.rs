use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A user acts as a receiver for the orders it owns and as a deliverer for
/// orders whose accepted bid is one of its bids.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub description: Option<String>,
    pub avatar: Option<String>,
    pub orders: Vec<Uuid>,
    pub bids: Vec<Uuid>,
    pub credit_card: Option<String>,
    pub active_deliverer: bool,
    pub ratings: Vec<f64>,
}

/// What receivers get to see about a bidding courier. No ids, no
/// credentials, no card reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelivererProfile {
    pub name: String,
    pub mobile: String,
    pub avatar: Option<String>,
    pub description: Option<String>,
    pub ratings: Vec<f64>,
}

impl From<&User> for DelivererProfile {
    fn from(user: &User) -> Self {
        Self {
            name: user.name.clone(),
            mobile: user.mobile.clone(),
            avatar: user.avatar.clone(),
            description: user.description.clone(),
            ratings: user.ratings.clone(),
        }
    }
}

/// What deliverers get to see about the order's owner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReceiverProfile {
    pub name: String,
    pub mobile: String,
}

impl From<&User> for ReceiverProfile {
    fn from(user: &User) -> Self {
        Self { name: user.name.clone(), mobile: user.mobile.clone() }
    }
}

/// Raw card details as submitted for upload. Never stored; only the
/// gateway reference returned by the upload is kept on the user.
#[derive(Debug, Clone, Deserialize)]
pub struct CreditCard {
    pub number: String,
    pub month: String,
    pub year: String,
    pub cvd: String,
}

/// Ratings run from 0.5 to 6.0 in half-point steps.
pub fn is_valid_rating(rating: f64) -> bool {
    let doubled = rating * 2.0;
    doubled.fract() == 0.0 && (1.0..=12.0).contains(&doubled)
}

pub fn first_name(name: &str) -> &str {
    name.split_whitespace().next().unwrap_or(name)
}
