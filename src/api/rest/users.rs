use std::sync::Arc;

use axum::extract::{Path, State};
use axum::routing::get;
use axum::Json;
use axum::Router;
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::user::{CreditCard, User};
use crate::state::AppState;

pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/users", get(list_users).post(create_user))
        .route("/users/:id", get(get_user))
        .route(
            "/users/:id/credit-card",
            get(get_credit_card).put(store_credit_card),
        )
}

#[derive(Deserialize)]
pub struct CreateUserRequest {
    pub name: String,
    pub email: String,
    pub mobile: String,
    pub description: Option<String>,
    #[serde(default = "default_active_deliverer")]
    pub active_deliverer: bool,
}

fn default_active_deliverer() -> bool {
    true
}

impl CreateUserRequest {
    fn validate(&self) -> Result<(), AppError> {
        if self.name.trim().is_empty() {
            return Err(AppError::BadRequest("name cannot be empty".to_string()));
        }
        if !self.email.contains('@') {
            return Err(AppError::BadRequest("email is not valid".to_string()));
        }
        if self.mobile.len() != 8 || self.mobile.chars().any(|c| !c.is_ascii_digit()) {
            return Err(AppError::BadRequest(
                "mobile must be eight digits".to_string(),
            ));
        }
        Ok(())
    }
}

async fn create_user(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<Json<User>, AppError> {
    payload.validate()?;

    let user = User {
        id: Uuid::new_v4(),
        name: payload.name,
        email: payload.email,
        mobile: payload.mobile,
        description: payload.description,
        avatar: None,
        orders: Vec::new(),
        bids: Vec::new(),
        credit_card: None,
        active_deliverer: payload.active_deliverer,
        ratings: Vec::new(),
    };

    state.store.users.insert(user.id, user.clone());
    Ok(Json(user))
}

async fn list_users(State(state): State<Arc<AppState>>) -> Json<Vec<User>> {
    Json(state.store.users.find_where(|_| true))
}

async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<User>, AppError> {
    let user = state
        .store
        .users
        .find_one(&id)
        .ok_or_else(|| AppError::NotFound(format!("user {id} not found")))?;

    Ok(Json(user))
}

/// Uploads the card to the payment gateway and stores only the returned
/// reference on the user.
async fn store_credit_card(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
    Json(card): Json<CreditCard>,
) -> Result<Json<User>, AppError> {
    state
        .store
        .users
        .find_one(&id)
        .ok_or_else(|| AppError::NotFound(format!("user {id} not found")))?;

    let card_ref = state
        .payment_gateway
        .upload_credit_card(&card)
        .await
        .map_err(|err| AppError::Payment(err.0))?;

    let user = state
        .store
        .users
        .update(&id, |user| user.credit_card = Some(card_ref.clone()))
        .ok_or_else(|| AppError::NotFound(format!("user {id} not found")))?;

    Ok(Json(user))
}

async fn get_credit_card(
    State(state): State<Arc<AppState>>,
    Path(id): Path<Uuid>,
) -> Result<Json<Value>, AppError> {
    let user = state
        .store
        .users
        .find_one(&id)
        .ok_or_else(|| AppError::NotFound(format!("user {id} not found")))?;

    let card_ref = user
        .credit_card
        .ok_or_else(|| AppError::NotFound("user has no stored credit card".to_string()))?;

    let suffix = state
        .payment_gateway
        .load_credit_card(&card_ref)
        .await
        .map_err(|err| AppError::Payment(err.0))?;

    Ok(Json(json!({ "suffix": suffix })))
}
