//! # Sepordeh Configuration

use multipay_core::{PaymentError, PaymentResult};
use serde::{Deserialize, Serialize};
use std::env;

const API_PURCHASE_URL: &str = "https://sepordeh.com/merchant/invoices/add";
const API_PAYMENT_URL: &str = "https://sepordeh.com/merchant/invoices/pay/";
const API_DIRECT_PAYMENT_URL: &str = "https://sepordeh.com/api/directPay/";
const API_VERIFICATION_URL: &str = "https://sepordeh.com/merchant/invoices/verify";

/// Which payment page the user is sent to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentMode {
    /// The hosted invoice page
    Normal,
    /// The direct-pay page
    Direct,
}

impl Default for PaymentMode {
    fn default() -> Self {
        PaymentMode::Normal
    }
}

/// Sepordeh gateway settings.
#[derive(Debug, Clone)]
pub struct SepordehConfig {
    /// Merchant id
    pub merchant_id: String,

    /// URL the gateway sends the user back to after payment
    pub callback_url: String,

    /// Invoice registration endpoint
    pub api_purchase_url: String,

    /// Hosted invoice payment page (invoice id is appended)
    pub api_payment_url: String,

    /// Direct-pay page (invoice id is appended)
    pub api_direct_payment_url: String,

    /// Verification endpoint
    pub api_verification_url: String,

    /// Payment page selection
    pub mode: PaymentMode,

    /// Description sent when the invoice carries none
    pub description: String,
}

impl SepordehConfig {
    /// Create a config with production endpoints and normal mode.
    pub fn new(
        merchant_id: impl Into<String>,
        callback_url: impl Into<String>,
    ) -> PaymentResult<Self> {
        let merchant_id = merchant_id.into();
        let callback_url = callback_url.into();

        if merchant_id.is_empty() {
            return Err(PaymentError::Configuration(
                "Sepordeh merchant id must not be empty".to_string(),
            ));
        }
        if callback_url.is_empty() {
            return Err(PaymentError::Configuration(
                "Sepordeh callback url must not be empty".to_string(),
            ));
        }

        Ok(Self {
            merchant_id,
            callback_url,
            api_purchase_url: API_PURCHASE_URL.to_string(),
            api_payment_url: API_PAYMENT_URL.to_string(),
            api_direct_payment_url: API_DIRECT_PAYMENT_URL.to_string(),
            api_verification_url: API_VERIFICATION_URL.to_string(),
            mode: PaymentMode::Normal,
            description: "Online payment".to_string(),
        })
    }

    /// Load configuration from `SEPORDEH_MERCHANT_ID` / `SEPORDEH_CALLBACK_URL`.
    pub fn from_env() -> PaymentResult<Self> {
        dotenvy::dotenv().ok();

        let merchant_id = env::var("SEPORDEH_MERCHANT_ID")
            .map_err(|_| PaymentError::Configuration("SEPORDEH_MERCHANT_ID not set".to_string()))?;
        let callback_url = env::var("SEPORDEH_CALLBACK_URL")
            .map_err(|_| PaymentError::Configuration("SEPORDEH_CALLBACK_URL not set".to_string()))?;

        Self::new(merchant_id, callback_url)
    }

    /// Builder: select the payment page.
    pub fn with_mode(mut self, mode: PaymentMode) -> Self {
        self.mode = mode;
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

    /// Builder: override the verification endpoint (for testing).
    pub fn with_verification_url(mut self, url: impl Into<String>) -> Self {
        self.api_verification_url = url.into();
        self
    }
}
