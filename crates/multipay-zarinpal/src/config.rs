//! # Zarinpal Configuration
//!
//! Settings for the sandbox strategy: all endpoints default to the
//! gateway's test environment.

use multipay_core::{PaymentError, PaymentResult};
use std::env;

const SANDBOX_API_PURCHASE_URL: &str = "https://sandbox.zarinpal.com/pg/services/WebGate/wsdl";
const SANDBOX_API_PAYMENT_URL: &str = "https://sandbox.zarinpal.com/pg/StartPay/";
const SANDBOX_API_VERIFICATION_URL: &str = "https://sandbox.zarinpal.com/pg/services/WebGate/wsdl";

/// Zarinpal sandbox settings.
#[derive(Debug, Clone)]
pub struct ZarinpalConfig {
    /// Merchant id (any well-formed UUID is accepted by the sandbox)
    pub merchant_id: String,

    /// URL the gateway sends the user back to after payment
    pub callback_url: String,

    /// PaymentRequest SOAP endpoint
    pub api_purchase_url: String,

    /// StartPay page base URL (authority is appended)
    pub api_payment_url: String,

    /// PaymentVerification SOAP endpoint
    pub api_verification_url: String,

    /// Description sent when the invoice carries none; the gateway rejects
    /// empty descriptions
    pub description: String,
}

impl ZarinpalConfig {
    /// Create a config with sandbox endpoints.
    pub fn new(
        merchant_id: impl Into<String>,
        callback_url: impl Into<String>,
    ) -> PaymentResult<Self> {
        let merchant_id = merchant_id.into();
        let callback_url = callback_url.into();

        if merchant_id.is_empty() {
            return Err(PaymentError::Configuration(
                "Zarinpal merchant id must not be empty".to_string(),
            ));
        }
        if callback_url.is_empty() {
            return Err(PaymentError::Configuration(
                "Zarinpal callback url must not be empty".to_string(),
            ));
        }

        Ok(Self {
            merchant_id,
            callback_url,
            api_purchase_url: SANDBOX_API_PURCHASE_URL.to_string(),
            api_payment_url: SANDBOX_API_PAYMENT_URL.to_string(),
            api_verification_url: SANDBOX_API_VERIFICATION_URL.to_string(),
            description: "Online payment".to_string(),
        })
    }

    /// Load configuration from `ZARINPAL_MERCHANT_ID` / `ZARINPAL_CALLBACK_URL`.
    pub fn from_env() -> PaymentResult<Self> {
        dotenvy::dotenv().ok();

        let merchant_id = env::var("ZARINPAL_MERCHANT_ID")
            .map_err(|_| PaymentError::Configuration("ZARINPAL_MERCHANT_ID not set".to_string()))?;
        let callback_url = env::var("ZARINPAL_CALLBACK_URL")
            .map_err(|_| PaymentError::Configuration("ZARINPAL_CALLBACK_URL not set".to_string()))?;

        Self::new(merchant_id, callback_url)
    }

    /// Builder: set the default description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Builder: override the purchase endpoint (for testing).
    pub fn with_purchase_url(mut self, url: impl Into<String>) -> Self {
        self.api_purchase_url = url.into();
        self
    }

    /// Builder: override the StartPay base URL (for testing).
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
    fn test_defaults_point_at_sandbox() {
        let config = ZarinpalConfig::new("m-uuid", "https://shop.example/cb").unwrap();
        assert!(config.api_purchase_url.contains("sandbox.zarinpal.com"));
        assert!(config.api_payment_url.ends_with("/StartPay/"));
    }

    #[test]
    fn test_empty_callback_rejected() {
        assert!(ZarinpalConfig::new("m-uuid", "").is_err());
    }
}
