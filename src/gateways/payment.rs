use async_trait::async_trait;
use dashmap::DashMap;
use tracing::info;
use uuid::Uuid;

use crate::gateways::GatewayError;
use crate::models::user::CreditCard;

/// The slice of the payment gateway's protocol this core depends on.
/// Authorization is create-payment, tokenize-card, authorize-amount; the
/// settlement coordinator treats the three as one logical operation.
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Registers a card and returns the gateway's reference for it.
    async fn upload_credit_card(&self, card: &CreditCard) -> Result<String, GatewayError>;

    /// Returns the displayable suffix (last four digits) of a stored card.
    async fn load_credit_card(&self, card_ref: &str) -> Result<String, GatewayError>;

    /// Creates a payment for the order and returns its gateway reference.
    async fn create_payment(&self, order_id: Uuid, amount: f64) -> Result<String, GatewayError>;

    /// Creates a single-use token for a stored card.
    async fn create_card_token(&self, card_ref: &str) -> Result<String, GatewayError>;

    /// Authorizes `amount` against the payment using the card token.
    async fn authorise(
        &self,
        payment_ref: &str,
        token: &str,
        amount: f64,
    ) -> Result<(), GatewayError>;
}

/// In-process stand-in for the real gateway: mints references locally and
/// accepts every authorization. The wire protocol itself is out of scope;
/// this keeps the binary runnable end to end.
pub struct SandboxPaymentGateway {
    card_suffixes: DashMap<String, String>,
}

impl SandboxPaymentGateway {
    pub fn new() -> Self {
        Self { card_suffixes: DashMap::new() }
    }
}

impl Default for SandboxPaymentGateway {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PaymentGateway for SandboxPaymentGateway {
    async fn upload_credit_card(&self, card: &CreditCard) -> Result<String, GatewayError> {
        if card.number.len() < 4 {
            return Err(GatewayError::new("card number too short"));
        }

        let card_ref = format!("card-{}", Uuid::new_v4());
        let suffix = card.number[card.number.len() - 4..].to_string();
        self.card_suffixes.insert(card_ref.clone(), suffix);
        info!(card_ref = %card_ref, "card registered");
        Ok(card_ref)
    }

    async fn load_credit_card(&self, card_ref: &str) -> Result<String, GatewayError> {
        self.card_suffixes
            .get(card_ref)
            .map(|entry| entry.value().clone())
            .ok_or_else(|| GatewayError::new(format!("unknown card reference {card_ref}")))
    }

    async fn create_payment(&self, order_id: Uuid, amount: f64) -> Result<String, GatewayError> {
        let payment_ref = format!("payment-{}", Uuid::new_v4());
        info!(order_id = %order_id, amount, payment_ref = %payment_ref, "payment created");
        Ok(payment_ref)
    }

    async fn create_card_token(&self, card_ref: &str) -> Result<String, GatewayError> {
        if !self.card_suffixes.contains_key(card_ref) {
            return Err(GatewayError::new(format!("unknown card reference {card_ref}")));
        }
        Ok(format!("token-{}", Uuid::new_v4()))
    }

    async fn authorise(
        &self,
        payment_ref: &str,
        _token: &str,
        amount: f64,
    ) -> Result<(), GatewayError> {
        info!(payment_ref = %payment_ref, amount, "payment authorised");
        Ok(())
    }
}
