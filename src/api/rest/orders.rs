use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Json;
use axum::Router;
use chrono::Duration;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::engine::{geofence, lifecycle};
use crate::error::AppError;
use crate::gateways::push::{PushKind, PushMessage};
use crate::models::order::{Address, DeliveryWindow, GeoPoint, Order, OrderState, PaymentType};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders", get(list_orders).post(create_order))
        .route("/orders/:id", get(get_order).put(change_order))
        .route(
            "/orders/:id/location",
            get(get_location).put(report_location),
        )
}

#[derive(Deserialize)]
pub struct CreateOrderRequest {
    pub user_id: Uuid,
    pub description: String,
    pub pickup_address: Address,
    pub delivery_address: Address,
    pub cost: Option<f64>,
    pub delivery_price: f64,
    pub delivery_window: Option<DeliveryWindow>,
    pub payment_type: PaymentType,
    pub expensive: bool,
}

impl CreateOrderRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.description.is_empty() {
            return Err(AppError::BadRequest("description cannot be empty".to_string()));
        }
        if self.description.len() > 500 {
            return Err(AppError::BadRequest("description is too long".to_string()));
        }
        if self.delivery_price < 0.0 {
            return Err(AppError::BadRequest("delivery price cannot be negative".to_string()));
        }
        if let Some(cost) = self.cost {
            if cost < 0.0 {
                return Err(AppError::BadRequest("cost cannot be negative".to_string()));
            }
        }

        validate_address(&self.pickup_address, "pickup address")?;
        validate_address(&self.delivery_address, "delivery address")?;

        if let Some(window) = &self.delivery_window {
            if window.earliest > window.latest {
                return Err(AppError::BadRequest(
                    "delivery window opens after it closes".to_string(),
                ));
            }
            if window.latest - window.earliest < Duration::minutes(15) {
                return Err(AppError::BadRequest(
                    "delivery window must span at least 15 minutes".to_string(),
                ));
            }
        }

        Ok(())
    }
}

fn validate_address(address: &Address, label: &str) -> Result<(), AppError> {
    if address.name.is_empty() {
        return Err(AppError::BadRequest(format!("{label} name cannot be empty")));
    }
    if !address.coordinate.in_range() {
        return Err(AppError::BadRequest(format!("{label} coordinate out of range")));
    }
    Ok(())
}

async fn create_order(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateOrderRequest>,
) -> Result<Json<Order>, AppError> {
    payload.validate()?;

    let creator = state
        .store
        .users
        .find_one(&payload.user_id)
        .ok_or_else(|| AppError::NotFound("user could not be found".to_string()))?;

    let order = Order {
        id: Uuid::new_v4(),
        description: payload.description,
        pickup_address: payload.pickup_address,
        delivery_address: payload.delivery_address,
        cost: payload.cost,
        delivery_price: payload.delivery_price,
        delivery_window: payload.delivery_window,
        payment_type: payload.payment_type,
        expensive: payload.expensive,
        state: OrderState::Pending,
        bids: Vec::new(),
        accepted_bid: None,
        scheduled_delivery_time: None,
        location: None,
        created_at: state.clock.now(),
    };

    state.store.orders.insert(order.id, order.clone());
    state
        .store
        .users
        .update(&creator.id, |user| user.orders.push(order.id));

    // Fan out to every other courier currently taking jobs.
    let couriers = state
        .store
        .users
        .find_where(|user| user.active_deliverer && user.id != creator.id);
    for courier in couriers {
        state.push.push(PushMessage {
            recipient: courier.id,
            kind: PushKind::NewOrder { order_id: order.id },
        });
    }

    state.metrics.orders_created_total.inc();
    Ok(Json(order))
}

async fn list_orders(State(state): State<Arc<AppState>>) -> Json<Vec<Order>> {
    Json(state.store.orders.find_where(|_| true))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Order>, AppError> {
    let order = state
        .store
        .orders
        .find_one(&id)
        .ok_or_else(|| AppError::NotFound(format!("order {id} not found")))?;

    Ok(Json(order))
}

#[derive(Deserialize)]
#[serde(tag = "action")]
pub enum OrderActionRequest {
    Accept { user_id: Uuid, bid_id: Uuid },
    Cancel { user_id: Uuid },
    Start { user_id: Uuid },
    Receive { user_id: Uuid, rating: Option<f64> },
}

async fn change_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(payload): Json<OrderActionRequest>,
) -> Result<Response, AppError> {
    match payload {
        OrderActionRequest::Accept { user_id, bid_id } => {
            let order = lifecycle::accept_bid(&state, id, user_id, bid_id).await?;
            Ok(Json(order).into_response())
        }
        OrderActionRequest::Cancel { user_id } => {
            let (order, user) = lifecycle::cancel_accepted_order(&state, id, user_id).await?;
            Ok(Json(json!({ "order": order, "user": user })).into_response())
        }
        OrderActionRequest::Start { user_id } => {
            let order = lifecycle::start_order(&state, id, user_id).await?;
            Ok(Json(order).into_response())
        }
        OrderActionRequest::Receive { user_id, rating } => {
            let order = lifecycle::receive_order(&state, id, user_id, rating).await?;
            Ok(Json(order).into_response())
        }
    }
}

async fn get_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Option<GeoPoint>>, AppError> {
    let order = state
        .store
        .orders
        .find_one(&id)
        .ok_or_else(|| AppError::NotFound(format!("order {id} not found")))?;

    Ok(Json(order.location))
}

async fn report_location(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(position): Json<GeoPoint>,
) -> Result<Json<Order>, AppError> {
    let order = geofence::report_location(&state, id, position).await?;
    Ok(Json(order))
}
