//! One-shot timers. Each timer is a spawned task sleeping a fixed delay
//! and then running its job once; jobs re-check current state when they
//! fire, so a timer that outlived its trigger is a harmless no-op. Timers
//! are never cancelled early.

use std::sync::Arc;

use tokio::time::sleep;
use tracing::{debug, error, info};
use uuid::Uuid;

use crate::error::AppError;
use crate::gateways::push::{PushKind, PushMessage};
use crate::models::order::OrderState;
use crate::state::AppState;

/// Armed on Accept. If the winning courier has not started the order when
/// the timer fires, the acceptance is rolled back and the bid slot freed.
pub fn arm_automatic_cancellation(
    state: Arc<AppState>,
    order_id: Uuid,
    bid_id: Uuid,
    deliverer_id: Uuid,
) {
    let delay = state.config.auto_cancel_delay();
    state
        .metrics
        .timers_armed_total
        .with_label_values(&["auto_cancel"])
        .inc();

    tokio::spawn(async move {
        sleep(delay).await;
        if let Err(err) = run_automatic_cancellation(&state, order_id, bid_id, deliverer_id).await
        {
            error!(order_id = %order_id, error = %err, "automatic cancellation failed");
        }
    });
}

/// The automatic-cancellation job. No-ops when the order has moved on from
/// Accepted, or when the accepted bid is no longer the one this timer was
/// armed for (a cancel and re-accept happened in between).
pub async fn run_automatic_cancellation(
    state: &Arc<AppState>,
    order_id: Uuid,
    bid_id: Uuid,
    deliverer_id: Uuid,
) -> Result<(), AppError> {
    let lock = state.order_locks.lock_for(order_id);
    let _guard = lock.lock().await;

    let order = state
        .store
        .orders
        .find_one(&order_id)
        .ok_or_else(|| AppError::NotFound("order could not be found".to_string()))?;
    state
        .store
        .users
        .find_one(&deliverer_id)
        .ok_or_else(|| AppError::NotFound("deliverer could not be found".to_string()))?;

    if order.state != OrderState::Accepted || order.accepted_bid != Some(bid_id) {
        debug!(order_id = %order_id, "cancellation timer fired but order has moved on");
        return Ok(());
    }

    state
        .store
        .users
        .update(&deliverer_id, |user| user.bids.retain(|id| *id != bid_id));
    state.store.orders.update(&order_id, |order| {
        order.state = OrderState::Pending;
        order.accepted_bid = None;
        order.scheduled_delivery_time = None;
        order.bids.retain(|id| *id != bid_id);
    });
    state.store.bids.remove(&bid_id);

    state.push.push(PushMessage {
        recipient: deliverer_id,
        kind: PushKind::OrderCancelledAutomatically { order_id },
    });

    state
        .metrics
        .transitions_total
        .with_label_values(&["auto_cancel"])
        .inc();
    info!(order_id = %order_id, bid_id = %bid_id, "order cancelled automatically");
    Ok(())
}

/// Armed on a geofenced delivery. Reminds the receiver to confirm receipt
/// unless the order reached Received in the meantime.
pub fn arm_delivery_reminder(state: Arc<AppState>, order_id: Uuid, receiver_id: Uuid) {
    let delay = state.config.delivery_reminder_delay();
    state
        .metrics
        .timers_armed_total
        .with_label_values(&["delivery_reminder"])
        .inc();

    tokio::spawn(async move {
        sleep(delay).await;
        if let Err(err) = run_delivery_reminder(&state, order_id, receiver_id).await {
            error!(order_id = %order_id, error = %err, "delivery reminder failed");
        }
    });
}

pub async fn run_delivery_reminder(
    state: &Arc<AppState>,
    order_id: Uuid,
    receiver_id: Uuid,
) -> Result<(), AppError> {
    let order = state
        .store
        .orders
        .find_one(&order_id)
        .ok_or_else(|| AppError::NotFound("order could not be found".to_string()))?;
    let receiver = state
        .store
        .users
        .find_one(&receiver_id)
        .ok_or_else(|| AppError::NotFound("receiver could not be found".to_string()))?;

    if order.state != OrderState::Received {
        state.push.push(PushMessage {
            recipient: receiver.id,
            kind: PushKind::OrderDeliveredReminder { order_id },
        });
    }

    Ok(())
}
