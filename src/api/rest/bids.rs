use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::routing::{get, post};
use axum::Json;
use axum::Router;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::engine::admission::{self, BidProposal};
use crate::error::AppError;
use crate::models::bid::{Bid, BidView};
use crate::models::user::DelivererProfile;
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/orders/:id/bids", post(place_bid).get(list_bids))
        .route("/bids/:id", get(get_bid))
}

#[derive(Deserialize)]
pub struct PlaceBidRequest {
    pub user_id: Uuid,
    pub delivery_price: f64,
    pub delivery_time: DateTime<Utc>,
}

async fn place_bid(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<Uuid>,
    Json(payload): Json<PlaceBidRequest>,
) -> Result<(StatusCode, Json<Bid>), AppError> {
    let bid = admission::place_bid(
        &state,
        BidProposal {
            order_id,
            user_id: payload.user_id,
            delivery_price: payload.delivery_price,
            delivery_time: payload.delivery_time,
        },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(bid)))
}

#[derive(Deserialize)]
pub struct ListBidsQuery {
    pub user_id: Uuid,
}

/// Lists an order's bids with deliverer-safe bidder projections. Only the
/// order's owner may see them.
async fn list_bids(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<Uuid>,
    Query(query): Query<ListBidsQuery>,
) -> Result<Json<Vec<BidView>>, AppError> {
    let caller = state
        .store
        .users
        .find_one(&query.user_id)
        .ok_or_else(|| AppError::NotFound("user could not be found".to_string()))?;
    if !caller.orders.contains(&order_id) {
        return Err(AppError::InvalidTransition(
            "caller does not own the order".to_string(),
        ));
    }

    let order = state
        .store
        .orders
        .find_one(&order_id)
        .ok_or_else(|| AppError::NotFound("order could not be found".to_string()))?;

    let mut views = Vec::with_capacity(order.bids.len());
    for bid_id in &order.bids {
        let Some(bid) = state.store.bids.find_one(bid_id) else {
            continue;
        };
        let Some(bidder) = state.store.users.find_one(&bid.user_id) else {
            continue;
        };
        views.push(BidView {
            id: bid.id,
            order_id: bid.order_id,
            delivery_price: bid.delivery_price,
            delivery_time: bid.delivery_time,
            deliverer: DelivererProfile::from(&bidder),
        });
    }

    Ok(Json(views))
}

async fn get_bid(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Bid>, AppError> {
    let bid = state
        .store
        .bids
        .find_one(&id)
        .ok_or_else(|| AppError::NotFound(format!("bid {id} not found")))?;

    Ok(Json(bid))
}
