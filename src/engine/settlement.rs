//! Payment settlement: invoked only from Receive. Computes the platform's
//! cut, reuses any existing payment record for the order (the keyed
//! payments collection is the idempotency guard), then tokenizes the
//! deliverer's card and authorizes the amount.

use tracing::{debug, info};

use crate::error::AppError;
use crate::models::bid::Bid;
use crate::models::order::Order;
use crate::models::payment::PaymentRecord;
use crate::models::user::User;
use crate::state::AppState;

pub async fn settle(
    state: &AppState,
    order: &Order,
    bid: &Bid,
    deliverer: &User,
) -> Result<(), AppError> {
    let result = authorise_cut(state, order, bid, deliverer).await;
    let outcome = if result.is_ok() { "success" } else { "failure" };
    state
        .metrics
        .settlements_total
        .with_label_values(&[outcome])
        .inc();
    result
}

async fn authorise_cut(
    state: &AppState,
    order: &Order,
    bid: &Bid,
    deliverer: &User,
) -> Result<(), AppError> {
    let cut = bid.delivery_price * state.config.payment_cut;

    let card_ref = deliverer
        .credit_card
        .clone()
        .ok_or_else(|| AppError::Payment("deliverer has no stored credit card".to_string()))?;

    let gateway_ref = match state.store.payments.find_one(&order.id) {
        Some(existing) => {
            debug!(order_id = %order.id, "reusing existing payment record");
            existing.gateway_ref
        }
        None => {
            let gateway_ref = state
                .payment_gateway
                .create_payment(order.id, cut)
                .await
                .map_err(|err| AppError::Payment(err.0))?;
            state.store.payments.insert(
                order.id,
                PaymentRecord { order_id: order.id, gateway_ref: gateway_ref.clone() },
            );
            gateway_ref
        }
    };

    let token = state
        .payment_gateway
        .create_card_token(&card_ref)
        .await
        .map_err(|err| AppError::Payment(err.0))?;

    state
        .payment_gateway
        .authorise(&gateway_ref, &token, cut)
        .await
        .map_err(|err| AppError::Payment(err.0))?;

    info!(order_id = %order.id, cut, "settlement authorised");
    Ok(())
}
