//! # Saman Configuration
//!
//! Settings for both Saman integration flavors. The classic web service
//! requests tokens over SOAP; OnlinePG requests them over REST. Both verify
//! through the same reference-payment SOAP service.

use multipay_core::{PaymentError, PaymentResult};
use std::env;

const API_PURCHASE_URL: &str = "https://sep.shaparak.ir/payments/initpayment.asmx";
const API_PAYMENT_URL: &str = "https://sep.shaparak.ir/payment.aspx";
const API_VERIFICATION_URL: &str = "https://verify.sep.ir/payments/referencepayment.asmx";

const ONLINE_PG_PURCHASE_URL: &str = "https://sep.shaparak.ir/onlinepg/onlinepg";
const ONLINE_PG_PAYMENT_URL: &str = "https://sep.shaparak.ir/OnlinePG/OnlinePG";

fn require_non_empty(value: String, what: &str) -> PaymentResult<String> {
    if value.is_empty() {
        return Err(PaymentError::Configuration(format!(
            "Saman {what} must not be empty"
        )));
    }
    Ok(value)
}

/// Settings for the classic Saman token web service.
#[derive(Debug, Clone)]
pub struct SamanConfig {
    /// Merchant/terminal id (MID)
    pub merchant_id: String,

    /// URL the gateway sends the user back to after payment
    pub callback_url: String,

    /// Token request SOAP endpoint
    pub api_purchase_url: String,

    /// Payment page the token is POSTed to
    pub api_payment_url: String,

    /// Reference-payment verification SOAP endpoint
    pub api_verification_url: String,
}

impl SamanConfig {
    pub fn new(
        merchant_id: impl Into<String>,
        callback_url: impl Into<String>,
    ) -> PaymentResult<Self> {
        Ok(Self {
            merchant_id: require_non_empty(merchant_id.into(), "merchant id")?,
            callback_url: require_non_empty(callback_url.into(), "callback url")?,
            api_purchase_url: API_PURCHASE_URL.to_string(),
            api_payment_url: API_PAYMENT_URL.to_string(),
            api_verification_url: API_VERIFICATION_URL.to_string(),
        })
    }

    /// Load configuration from `SAMAN_MERCHANT_ID` / `SAMAN_CALLBACK_URL`.
    pub fn from_env() -> PaymentResult<Self> {
        dotenvy::dotenv().ok();

        let merchant_id = env::var("SAMAN_MERCHANT_ID")
            .map_err(|_| PaymentError::Configuration("SAMAN_MERCHANT_ID not set".to_string()))?;
        let callback_url = env::var("SAMAN_CALLBACK_URL")
            .map_err(|_| PaymentError::Configuration("SAMAN_CALLBACK_URL not set".to_string()))?;

        Self::new(merchant_id, callback_url)
    }

    /// Builder: override the token endpoint (for testing).
    pub fn with_purchase_url(mut self, url: impl Into<String>) -> Self {
        self.api_purchase_url = url.into();
        self
    }

    /// Builder: override the payment page URL (for testing).
    pub fn with_payment_url(mut self, url: impl Into<String>) -> Self {
        self.api_payment_url = url.into();
        self
    }

    /// Builder: override the verification endpoint (for testing).
    pub fn with_verification_url(mut self, url: impl Into<String>) -> Self {
        self.api_verification_url = url.into();
        self
    }
}

/// Settings for the Saman OnlinePG token flow.
#[derive(Debug, Clone)]
pub struct SamanOnlinePgConfig {
    /// Terminal id
    pub merchant_id: String,

    /// URL the gateway sends the user back to after payment
    pub callback_url: String,

    /// Token request REST endpoint
    pub api_purchase_url: String,

    /// Payment page the token is POSTed to
    pub api_payment_url: String,

    /// Reference-payment verification SOAP endpoint
    pub api_verification_url: String,
}

impl SamanOnlinePgConfig {
    pub fn new(
        merchant_id: impl Into<String>,
        callback_url: impl Into<String>,
    ) -> PaymentResult<Self> {
        Ok(Self {
            merchant_id: require_non_empty(merchant_id.into(), "terminal id")?,
            callback_url: require_non_empty(callback_url.into(), "callback url")?,
            api_purchase_url: ONLINE_PG_PURCHASE_URL.to_string(),
            api_payment_url: ONLINE_PG_PAYMENT_URL.to_string(),
            api_verification_url: API_VERIFICATION_URL.to_string(),
        })
    }

    /// Load configuration from `SAMAN_TERMINAL_ID` / `SAMAN_CALLBACK_URL`.
    pub fn from_env() -> PaymentResult<Self> {
        dotenvy::dotenv().ok();

        let merchant_id = env::var("SAMAN_TERMINAL_ID")
            .map_err(|_| PaymentError::Configuration("SAMAN_TERMINAL_ID not set".to_string()))?;
        let callback_url = env::var("SAMAN_CALLBACK_URL")
            .map_err(|_| PaymentError::Configuration("SAMAN_CALLBACK_URL not set".to_string()))?;

        Self::new(merchant_id, callback_url)
    }

    /// Builder: override the token endpoint (for testing).
    pub fn with_purchase_url(mut self, url: impl Into<String>) -> Self {
        self.api_purchase_url = url.into();
        self
    }

    /// Builder: override the payment page URL (for testing).
    pub fn with_payment_url(mut self, url: impl Into<String>) -> Self {
        self.api_payment_url = url.into();
        self
    }

    /// Builder: override the verification endpoint (for testing).
    pub fn with_verification_url(mut self, url: impl Into<String>) -> Self {
        self.api_verification_url = url.into();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_point_at_shaparak() {
        let config = SamanConfig::new("MID-1", "https://shop.example/cb").unwrap();
        assert!(config.api_purchase_url.contains("sep.shaparak.ir"));
        assert!(config.api_verification_url.contains("referencepayment"));
    }

    #[test]
    fn test_empty_fields_rejected() {
        assert!(SamanConfig::new("", "https://shop.example/cb").is_err());
        assert!(SamanOnlinePgConfig::new("T-1", "").is_err());
    }
}
