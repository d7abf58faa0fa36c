//! The order state machine: Accept, Cancel, Start and Receive. Geofenced
//! transitions live in `geofence`, timer-driven ones in `scheduler`. Every
//! operation holds the order's lock across its read-modify-write sequence.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::engine::{scheduler, settlement};
use crate::error::AppError;
use crate::gateways::mail;
use crate::gateways::push::{PushKind, PushMessage};
use crate::models::order::{Order, OrderState};
use crate::models::user::{is_valid_rating, User};
use crate::state::AppState;

/// Accept (Pending → Accepted). Caller must own the order; the bid must be
/// one of the order's bids. Sets the accepted bid and the scheduled
/// delivery time, notifies the winner and arms the automatic-cancellation
/// timer.
pub async fn accept_bid(
    state: &Arc<AppState>,
    order_id: Uuid,
    caller_id: Uuid,
    bid_id: Uuid,
) -> Result<Order, AppError> {
    let lock = state.order_locks.lock_for(order_id);
    let _guard = lock.lock().await;

    let order = state
        .store
        .orders
        .find_one(&order_id)
        .ok_or_else(|| AppError::NotFound("order could not be found".to_string()))?;

    let caller = state
        .store
        .users
        .find_one(&caller_id)
        .ok_or_else(|| AppError::NotFound("user could not be found".to_string()))?;
    if !caller.orders.contains(&order_id) {
        return Err(AppError::InvalidTransition(
            "caller is not the owner of the order".to_string(),
        ));
    }

    if order.state != OrderState::Pending {
        return Err(AppError::InvalidTransition(
            "order is not in the pending state".to_string(),
        ));
    }
    if !order.bids.contains(&bid_id) {
        return Err(AppError::InvalidTransition(
            "order does not contain the bid".to_string(),
        ));
    }

    let bid = state
        .store
        .bids
        .find_one(&bid_id)
        .ok_or_else(|| AppError::NotFound("bid could not be found".to_string()))?;
    let deliverer = state
        .store
        .deliverer_of(&bid_id)
        .ok_or_else(|| AppError::NotFound("deliverer could not be found".to_string()))?;

    let updated = state
        .store
        .orders
        .update(&order_id, |order| {
            order.state = OrderState::Accepted;
            order.accepted_bid = Some(bid_id);
            order.scheduled_delivery_time = Some(bid.delivery_time);
        })
        .ok_or_else(|| AppError::Internal("order vanished during accept".to_string()))?;

    state.push.push(PushMessage {
        recipient: deliverer.id,
        kind: PushKind::OrderWon { order_id, bid_id },
    });

    scheduler::arm_automatic_cancellation(state.clone(), order_id, bid_id, deliverer.id);

    state
        .metrics
        .transitions_total
        .with_label_values(&["accept"])
        .inc();
    info!(order_id = %order_id, bid_id = %bid_id, "order accepted");
    Ok(updated)
}

/// Cancel (Accepted → Pending). Caller must be the winning deliverer. The
/// accepted bid is deleted, pulled from the deliverer and from the order,
/// and the receiver is notified. Returns the updated order and deliverer.
pub async fn cancel_accepted_order(
    state: &Arc<AppState>,
    order_id: Uuid,
    caller_id: Uuid,
) -> Result<(Order, User), AppError> {
    let lock = state.order_locks.lock_for(order_id);
    let _guard = lock.lock().await;

    let order = state
        .store
        .orders
        .find_one(&order_id)
        .ok_or_else(|| AppError::NotFound("order could not be found".to_string()))?;

    if order.state != OrderState::Accepted {
        return Err(AppError::InvalidTransition(
            "order is not in the accepted state".to_string(),
        ));
    }
    let bid_id = order
        .accepted_bid
        .ok_or_else(|| AppError::Internal("accepted order has no accepted bid".to_string()))?;

    let caller = state
        .store
        .users
        .find_one(&caller_id)
        .ok_or_else(|| AppError::NotFound("user could not be found".to_string()))?;
    if !caller.bids.contains(&bid_id) {
        return Err(AppError::InvalidTransition(
            "caller is not the winning deliverer".to_string(),
        ));
    }

    let bid = state
        .store
        .bids
        .find_one(&bid_id)
        .ok_or_else(|| AppError::NotFound("bid could not be found".to_string()))?;

    state
        .store
        .users
        .update(&bid.user_id, |user| user.bids.retain(|id| *id != bid_id));
    let updated_order = state
        .store
        .orders
        .update(&order_id, |order| {
            order.state = OrderState::Pending;
            order.accepted_bid = None;
            order.scheduled_delivery_time = None;
            order.bids.retain(|id| *id != bid_id);
        })
        .ok_or_else(|| AppError::Internal("order vanished during cancel".to_string()))?;
    state.store.bids.remove(&bid_id);

    let deliverer = state
        .store
        .users
        .find_one(&bid.user_id)
        .ok_or_else(|| AppError::NotFound("deliverer could not be found".to_string()))?;

    if let Some(receiver) = state.store.receiver_of(&order_id) {
        state.push.push(PushMessage {
            recipient: receiver.id,
            kind: PushKind::OrderCancelled { order_id },
        });
    }

    state
        .metrics
        .transitions_total
        .with_label_values(&["cancel"])
        .inc();
    info!(order_id = %order_id, bid_id = %bid_id, "accepted order cancelled");
    Ok((updated_order, deliverer))
}

/// Start (Accepted → Started). Caller must be the winning deliverer. Every
/// losing bid is deleted, pulled from its owner, and its owner notified;
/// the receiver is notified that delivery has begun.
pub async fn start_order(
    state: &Arc<AppState>,
    order_id: Uuid,
    caller_id: Uuid,
) -> Result<Order, AppError> {
    let lock = state.order_locks.lock_for(order_id);
    let _guard = lock.lock().await;

    let order = state
        .store
        .orders
        .find_one(&order_id)
        .ok_or_else(|| AppError::NotFound("order could not be found".to_string()))?;

    if order.state != OrderState::Accepted {
        return Err(AppError::InvalidTransition(
            "order is not in the accepted state".to_string(),
        ));
    }
    let accepted_bid = order
        .accepted_bid
        .ok_or_else(|| AppError::Internal("accepted order has no accepted bid".to_string()))?;

    let caller = state
        .store
        .users
        .find_one(&caller_id)
        .ok_or_else(|| AppError::NotFound("user could not be found".to_string()))?;
    if !caller.bids.contains(&accepted_bid) {
        return Err(AppError::InvalidTransition(
            "caller is not the winning deliverer".to_string(),
        ));
    }

    let receiver = state
        .store
        .receiver_of(&order_id)
        .ok_or_else(|| AppError::NotFound("receiver could not be found".to_string()))?;

    let losing_bids: Vec<Uuid> = order
        .bids
        .iter()
        .copied()
        .filter(|id| *id != accepted_bid)
        .collect();

    let updated = state
        .store
        .orders
        .update(&order_id, |order| {
            order.state = OrderState::Started;
            order.bids.retain(|id| *id == accepted_bid);
        })
        .ok_or_else(|| AppError::Internal("order vanished during start".to_string()))?;

    for bid_id in losing_bids {
        let Some(bid) = state.store.bids.remove(&bid_id) else {
            warn!(order_id = %order_id, bid_id = %bid_id, "losing bid already gone");
            continue;
        };
        state
            .store
            .users
            .update(&bid.user_id, |user| user.bids.retain(|id| *id != bid_id));
        state.push.push(PushMessage {
            recipient: bid.user_id,
            kind: PushKind::OrderLost { order_id },
        });
    }

    state.push.push(PushMessage {
        recipient: receiver.id,
        kind: PushKind::OrderStarted { order_id },
    });

    state
        .metrics
        .transitions_total
        .with_label_values(&["start"])
        .inc();
    info!(order_id = %order_id, "order started");
    Ok(updated)
}

/// Receive (Started|PickedUp|Delivered → Received). Caller must be the
/// order's receiver. Settlement runs exactly once per order; if it fails,
/// the state change is reverted and the gateway's message propagated. On
/// success the optional rating is appended, receipt mails go out to the
/// receiver, the deliverer and the operator, and the deliverer is
/// notified. Mail failures surface without undoing the committed state.
pub async fn receive_order(
    state: &Arc<AppState>,
    order_id: Uuid,
    caller_id: Uuid,
    rating: Option<f64>,
) -> Result<Order, AppError> {
    let lock = state.order_locks.lock_for(order_id);
    let _guard = lock.lock().await;

    let order = state
        .store
        .orders
        .find_one(&order_id)
        .ok_or_else(|| AppError::NotFound("order could not be found".to_string()))?;

    if !order.state.is_receivable() {
        return Err(AppError::InvalidTransition(
            "order is in neither the started, picked up, nor delivered state".to_string(),
        ));
    }

    let receiver = state
        .store
        .receiver_of(&order_id)
        .ok_or_else(|| AppError::NotFound("receiver could not be found".to_string()))?;
    if receiver.id != caller_id {
        return Err(AppError::InvalidTransition(
            "caller is not the order's receiver".to_string(),
        ));
    }

    if let Some(rating) = rating {
        if !is_valid_rating(rating) {
            return Err(AppError::BadRequest(
                "rating must be between 0.5 and 6.0 in half-point steps".to_string(),
            ));
        }
    }

    let bid_id = order
        .accepted_bid
        .ok_or_else(|| AppError::Internal("active order has no accepted bid".to_string()))?;
    let bid = state
        .store
        .bids
        .find_one(&bid_id)
        .ok_or_else(|| AppError::NotFound("bid could not be found".to_string()))?;
    let deliverer = state
        .store
        .deliverer_of(&bid_id)
        .ok_or_else(|| AppError::NotFound("deliverer could not be found".to_string()))?;

    let prior_state = order.state;
    state
        .store
        .orders
        .update(&order_id, |order| order.state = OrderState::Received);

    if let Err(err) = settlement::settle(state, &order, &bid, &deliverer).await {
        // Compensating write: no partial commit on payment failure.
        state
            .store
            .orders
            .update(&order_id, |order| order.state = prior_state);
        warn!(order_id = %order_id, error = %err, "settlement failed, state reverted");
        return Err(err);
    }

    if let Some(rating) = rating {
        state
            .store
            .users
            .update(&deliverer.id, |user| user.ratings.push(rating));
    }

    let updated = state
        .store
        .orders
        .find_one(&order_id)
        .ok_or_else(|| AppError::Internal("order vanished during receive".to_string()))?;
    let deliverer = state
        .store
        .users
        .find_one(&deliverer.id)
        .ok_or_else(|| AppError::NotFound("deliverer could not be found".to_string()))?;

    let receipts = [
        mail::receipt_for_receiver(&receiver, &deliverer, &updated, &bid),
        mail::receipt_for_deliverer(&receiver, &deliverer, &updated, &bid),
        mail::receipt_for_operator(
            &state.config.operator_email,
            &receiver,
            &deliverer,
            &updated,
            &bid,
        ),
    ];

    let mut mail_error = None;
    for receipt in receipts {
        if let Err(err) = state.mailer.send(receipt).await {
            warn!(order_id = %order_id, error = %err, "receipt mail failed");
            mail_error.get_or_insert(err);
        }
    }
    if let Some(err) = mail_error {
        return Err(AppError::Mail(err.0));
    }

    state.push.push(PushMessage {
        recipient: deliverer.id,
        kind: PushKind::OrderReceived { order_id, bid_id },
    });

    state
        .metrics
        .transitions_total
        .with_label_values(&["receive"])
        .inc();
    info!(order_id = %order_id, "order received");
    Ok(updated)
}
