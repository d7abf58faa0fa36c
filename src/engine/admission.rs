use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::info;
use uuid::Uuid;

use crate::error::AppError;
use crate::gateways::push::{PushKind, PushMessage};
use crate::models::bid::Bid;
use crate::models::order::OrderState;
use crate::models::user::DelivererProfile;
use crate::state::AppState;

/// A user may hold at most this many bids whose delivery time has not yet
/// elapsed.
pub const MAX_ACTIVE_BIDS: usize = 2;

#[derive(Debug, Clone)]
pub struct BidProposal {
    pub order_id: Uuid,
    pub user_id: Uuid,
    pub delivery_price: f64,
    pub delivery_time: DateTime<Utc>,
}

/// Admits or rejects a bid proposal. The rules run in a fixed order: the
/// order must exist and be pending, the user must not have bid on it
/// before, the user must hold fewer than two active bids, self-bids are
/// forbidden, and a delivery window on the order bounds the proposed time.
pub async fn place_bid(state: &Arc<AppState>, proposal: BidProposal) -> Result<Bid, AppError> {
    if proposal.delivery_price < 0.0 {
        return Err(AppError::BadRequest("delivery price cannot be negative".to_string()));
    }

    let lock = state.order_locks.lock_for(proposal.order_id);
    let _guard = lock.lock().await;

    let result = admit(state, &proposal);
    let outcome = if result.is_ok() { "admitted" } else { "rejected" };
    state.metrics.bids_total.with_label_values(&[outcome]).inc();
    result?;

    let bid = Bid {
        id: Uuid::new_v4(),
        order_id: proposal.order_id,
        user_id: proposal.user_id,
        delivery_price: proposal.delivery_price,
        delivery_time: proposal.delivery_time,
    };

    state.store.bids.insert(bid.id, bid.clone());
    state
        .store
        .orders
        .update(&proposal.order_id, |order| order.bids.push(bid.id));
    state
        .store
        .users
        .update(&proposal.user_id, |user| user.bids.push(bid.id));

    let bidder = state
        .store
        .users
        .find_one(&proposal.user_id)
        .ok_or_else(|| AppError::NotFound("user could not be found".to_string()))?;

    if let Some(receiver) = state.store.receiver_of(&proposal.order_id) {
        state.push.push(PushMessage {
            recipient: receiver.id,
            kind: PushKind::OrderReceivedBid {
                order_id: proposal.order_id,
                bid_id: bid.id,
                deliverer: DelivererProfile::from(&bidder),
            },
        });
    }

    info!(order_id = %proposal.order_id, bid_id = %bid.id, "bid admitted");
    Ok(bid)
}

fn admit(state: &AppState, proposal: &BidProposal) -> Result<(), AppError> {
    let order = state
        .store
        .orders
        .find_one(&proposal.order_id)
        .ok_or_else(|| AppError::NotFound("order could not be found".to_string()))?;

    if order.state != OrderState::Pending {
        return Err(AppError::AdmissionRejected(
            "order is not in a pending state".to_string(),
        ));
    }

    let already_bid = state
        .store
        .bids
        .find_one_where(|bid| bid.order_id == proposal.order_id && bid.user_id == proposal.user_id)
        .is_some();
    if already_bid {
        return Err(AppError::AdmissionRejected(
            "user has already bid on this order".to_string(),
        ));
    }

    let now = state.clock.now();
    let active_bids = state
        .store
        .bids
        .find_where(|bid| bid.user_id == proposal.user_id && bid.is_active(now))
        .len();
    if active_bids >= MAX_ACTIVE_BIDS {
        return Err(AppError::AdmissionRejected(
            "user already holds two active bids".to_string(),
        ));
    }

    let user = state
        .store
        .users
        .find_one(&proposal.user_id)
        .ok_or_else(|| AppError::NotFound("user could not be found".to_string()))?;
    if user.orders.contains(&proposal.order_id) {
        return Err(AppError::AdmissionRejected(
            "users cannot bid on their own orders".to_string(),
        ));
    }

    if let Some(window) = order.delivery_window {
        if proposal.delivery_time < window.earliest {
            return Err(AppError::AdmissionRejected(
                "proposed delivery time is too early".to_string(),
            ));
        }
        if proposal.delivery_time > window.latest {
            return Err(AppError::AdmissionRejected(
                "proposed delivery time is too late".to_string(),
            ));
        }
    }

    Ok(())
}
