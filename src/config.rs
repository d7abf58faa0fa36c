use std::env;
use std::time::Duration;

use crate::error::AppError;

#[derive(Debug, Clone)]
pub struct Config {
    pub http_port: u16,
    pub log_level: String,
    pub event_buffer_size: usize,
    /// Fraction of the bid's delivery price withheld at settlement.
    pub payment_cut: f64,
    /// Proximity threshold for automatic pickup/delivery transitions.
    pub geofence_radius_m: f64,
    /// Delay before an unstarted accepted order reverts to pending.
    pub auto_cancel_minutes: u64,
    /// Delay after a geofenced delivery before the receiver is reminded.
    pub delivery_reminder_minutes: u64,
    /// Recipient of the operator copy of every receipt mail.
    pub operator_email: String,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let _ = dotenvy::dotenv();

        Ok(Self {
            http_port: parse_or_default("HTTP_PORT", 3000)?,
            log_level: env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()),
            event_buffer_size: parse_or_default("EVENT_BUFFER_SIZE", 1024)?,
            payment_cut: parse_or_default("PAYMENT_CUT", 0.1)?,
            geofence_radius_m: parse_or_default("GEOFENCE_RADIUS_M", 250.0)?,
            auto_cancel_minutes: parse_or_default("AUTO_CANCEL_MINUTES", 15)?,
            delivery_reminder_minutes: parse_or_default("DELIVERY_REMINDER_MINUTES", 60)?,
            operator_email: env::var("OPERATOR_EMAIL")
                .unwrap_or_else(|_| "receipts@delivery-broker.invalid".to_string()),
        })
    }

    pub fn auto_cancel_delay(&self) -> Duration {
        Duration::from_secs(self.auto_cancel_minutes * 60)
    }

    pub fn delivery_reminder_delay(&self) -> Duration {
        Duration::from_secs(self.delivery_reminder_minutes * 60)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_port: 3000,
            log_level: "info".to_string(),
            event_buffer_size: 1024,
            payment_cut: 0.1,
            geofence_radius_m: 250.0,
            auto_cancel_minutes: 15,
            delivery_reminder_minutes: 60,
            operator_email: "receipts@delivery-broker.invalid".to_string(),
        }
    }
}

fn parse_or_default<T>(key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(key) {
        Ok(raw) => raw
            .parse::<T>()
            .map_err(|err| AppError::Internal(format!("invalid {key}: {err}"))),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::Config;

    #[test]
    fn default_delays_match_business_rules() {
        let config = Config::default();
        assert_eq!(config.auto_cancel_delay().as_secs(), 15 * 60);
        assert_eq!(config.delivery_reminder_delay().as_secs(), 60 * 60);
        assert_eq!(config.geofence_radius_m, 250.0);
    }
}
