pub mod mail;
pub mod payment;
pub mod push;

use thiserror::Error;

/// Failure reported by an external gateway. The message is propagated to
/// callers unchanged.
#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct GatewayError(pub String);

impl GatewayError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}
