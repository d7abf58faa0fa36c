use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::info;

use crate::gateways::GatewayError;
use crate::models::bid::Bid;
use crate::models::order::Order;
use crate::models::user::{first_name, User};

#[derive(Debug, Clone)]
pub struct Mail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

/// Outbound mail seam. Rendering happens here; transport is the
/// implementation's problem.
#[async_trait]
pub trait MailGateway: Send + Sync {
    async fn send(&self, mail: Mail) -> Result<(), GatewayError>;
}

/// Default gateway: logs the mail instead of delivering it.
pub struct LogMailer;

#[async_trait]
impl MailGateway for LogMailer {
    async fn send(&self, mail: Mail) -> Result<(), GatewayError> {
        info!(to = %mail.to, subject = %mail.subject, "mail sent");
        Ok(())
    }
}

fn format_money(amount: f64) -> String {
    format!("{amount:.2} kr.")
}

fn format_time(time: Option<DateTime<Utc>>) -> String {
    match time {
        Some(time) => time.format("%Y-%m-%d %H:%M").to_string(),
        None => "-".to_string(),
    }
}

pub fn receipt_for_receiver(receiver: &User, deliverer: &User, order: &Order, bid: &Bid) -> Mail {
    Mail {
        to: receiver.email.clone(),
        subject: "Receipt for your delivery".to_string(),
        body: format!(
            "Hi {},\n\n{} delivered \"{}\" to {} at {}.\nDelivery price: {}.\n",
            first_name(&receiver.name),
            deliverer.name,
            order.description,
            order.delivery_address.name,
            format_time(order.scheduled_delivery_time),
            format_money(bid.delivery_price),
        ),
    }
}

pub fn receipt_for_deliverer(receiver: &User, deliverer: &User, order: &Order, bid: &Bid) -> Mail {
    Mail {
        to: deliverer.email.clone(),
        subject: "Receipt for your completed delivery".to_string(),
        body: format!(
            "Hi {},\n\nYou delivered \"{}\" for {} to {} at {}.\nYour delivery price: {}.\n",
            first_name(&deliverer.name),
            order.description,
            receiver.name,
            order.delivery_address.name,
            format_time(order.scheduled_delivery_time),
            format_money(bid.delivery_price),
        ),
    }
}

pub fn receipt_for_operator(
    operator_email: &str,
    receiver: &User,
    deliverer: &User,
    order: &Order,
    bid: &Bid,
) -> Mail {
    Mail {
        to: operator_email.to_string(),
        subject: format!("Delivery completed: {}", order.id),
        body: format!(
            "Order {} (\"{}\") delivered by {} to {}.\nDelivery price: {}, scheduled {}.\n",
            order.id,
            order.description,
            deliverer.name,
            receiver.name,
            format_money(bid.delivery_price),
            format_time(order.scheduled_delivery_time),
        ),
    }
}
