//! # Idpay Configuration
//!
//! Per-merchant settings for the Idpay gateway. Endpoints default to the
//! production API; the sandbox flag switches the payment page and is also
//! forwarded on every API call via the `X-SANDBOX` header.

use multipay_core::{PaymentError, PaymentResult};
use std::env;

const API_PURCHASE_URL: &str = "https://api.idpay.ir/v1.1/payment";
const API_PAYMENT_URL: &str = "https://idpay.ir/p/ws/";
const API_SANDBOX_PAYMENT_URL: &str = "https://idpay.ir/p/ws-sandbox/";
const API_VERIFICATION_URL: &str = "https://api.idpay.ir/v1.1/payment/verify";

/// Idpay gateway settings.
#[derive(Debug, Clone)]
pub struct IdpayConfig {
    /// API key issued by Idpay
    pub merchant_id: String,

    /// URL the gateway sends the user back to after payment
    pub callback_url: String,

    /// Invoice registration endpoint
    pub api_purchase_url: String,

    /// Payment page base URL (transaction id is appended)
    pub api_payment_url: String,

    /// Sandbox payment page base URL
    pub api_sandbox_payment_url: String,

    /// Verification endpoint
    pub api_verification_url: String,

    /// Use the gateway's test environment
    pub sandbox: bool,

    /// Description sent when the invoice carries none
    pub description: String,
}

impl IdpayConfig {
    /// Create a config with production endpoints.
    pub fn new(
        merchant_id: impl Into<String>,
        callback_url: impl Into<String>,
    ) -> PaymentResult<Self> {
        let merchant_id = merchant_id.into();
        let callback_url = callback_url.into();

        if merchant_id.is_empty() {
            return Err(PaymentError::Configuration(
                "Idpay merchant id must not be empty".to_string(),
            ));
        }
        if callback_url.is_empty() {
            return Err(PaymentError::Configuration(
                "Idpay callback url must not be empty".to_string(),
            ));
        }

        Ok(Self {
            merchant_id,
            callback_url,
            api_purchase_url: API_PURCHASE_URL.to_string(),
            api_payment_url: API_PAYMENT_URL.to_string(),
            api_sandbox_payment_url: API_SANDBOX_PAYMENT_URL.to_string(),
            api_verification_url: API_VERIFICATION_URL.to_string(),
            sandbox: false,
            description: "Online payment".to_string(),
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Required env vars:
    /// - `IDPAY_MERCHANT_ID`
    /// - `IDPAY_CALLBACK_URL`
    ///
    /// Optional: `IDPAY_SANDBOX` (truthy values: `1`, `true`).
    pub fn from_env() -> PaymentResult<Self> {
        dotenvy::dotenv().ok();

        let merchant_id = env::var("IDPAY_MERCHANT_ID")
            .map_err(|_| PaymentError::Configuration("IDPAY_MERCHANT_ID not set".to_string()))?;
        let callback_url = env::var("IDPAY_CALLBACK_URL")
            .map_err(|_| PaymentError::Configuration("IDPAY_CALLBACK_URL not set".to_string()))?;

        let sandbox = matches!(
            env::var("IDPAY_SANDBOX").as_deref(),
            Ok("1") | Ok("true")
        );

        Ok(Self::new(merchant_id, callback_url)?.with_sandbox(sandbox))
    }

    /// Builder: toggle sandbox mode.
    pub fn with_sandbox(mut self, sandbox: bool) -> Self {
        self.sandbox = sandbox;
        self
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

    /// Builder: override the payment page base URL (for testing).
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
