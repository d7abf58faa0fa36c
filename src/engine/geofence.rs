//! Location-driven transitions. A courier location report persists the
//! position and may advance the order: Started → PickedUp near the pickup
//! address, PickedUp → Delivered near the delivery address. Both checks
//! run against the same snapshot, so one report fires at most one
//! transition.

use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use crate::engine::scheduler;
use crate::error::AppError;
use crate::gateways::push::{PushKind, PushMessage};
use crate::geo::within_radius;
use crate::models::order::{GeoPoint, Order, OrderState};
use crate::state::AppState;

pub async fn report_location(
    state: &Arc<AppState>,
    order_id: Uuid,
    position: GeoPoint,
) -> Result<Order, AppError> {
    if !position.in_range() {
        return Err(AppError::BadRequest("coordinate out of range".to_string()));
    }

    let lock = state.order_locks.lock_for(order_id);
    let _guard = lock.lock().await;

    let snapshot = state
        .store
        .orders
        .update(&order_id, |order| order.location = Some(position))
        .ok_or_else(|| AppError::NotFound("order could not be found".to_string()))?;

    let radius = state.config.geofence_radius_m;

    if snapshot.state == OrderState::Started
        && within_radius(&position, &snapshot.pickup_address.coordinate, radius)
    {
        return pick_up(state, &snapshot).await;
    }

    if snapshot.state == OrderState::PickedUp
        && within_radius(&position, &snapshot.delivery_address.coordinate, radius)
    {
        return deliver(state, &snapshot).await;
    }

    Ok(snapshot)
}

async fn pick_up(state: &Arc<AppState>, order: &Order) -> Result<Order, AppError> {
    let receiver = state
        .store
        .receiver_of(&order.id)
        .ok_or_else(|| AppError::NotFound("receiver could not be found".to_string()))?;

    let updated = state
        .store
        .orders
        .update(&order.id, |order| order.state = OrderState::PickedUp)
        .ok_or_else(|| AppError::Internal("order vanished during pickup".to_string()))?;

    state.push.push(PushMessage {
        recipient: receiver.id,
        kind: PushKind::OrderPickedUp { order_id: order.id },
    });

    state
        .metrics
        .transitions_total
        .with_label_values(&["pickup"])
        .inc();
    info!(order_id = %order.id, "order picked up inside geofence");
    Ok(updated)
}

async fn deliver(state: &Arc<AppState>, order: &Order) -> Result<Order, AppError> {
    let receiver = state
        .store
        .receiver_of(&order.id)
        .ok_or_else(|| AppError::NotFound("receiver could not be found".to_string()))?;

    let updated = state
        .store
        .orders
        .update(&order.id, |order| order.state = OrderState::Delivered)
        .ok_or_else(|| AppError::Internal("order vanished during delivery".to_string()))?;

    state.push.push(PushMessage {
        recipient: receiver.id,
        kind: PushKind::OrderDelivered { order_id: order.id },
    });

    scheduler::arm_delivery_reminder(state.clone(), order.id, receiver.id);

    state
        .metrics
        .transitions_total
        .with_label_values(&["deliver"])
        .inc();
    info!(order_id = %order.id, "order delivered inside geofence");
    Ok(updated)
}
