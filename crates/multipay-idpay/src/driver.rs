//! # Idpay Driver
//!
//! REST/JSON driver for the Idpay gateway. The reference adapter: every
//! other REST gateway follows the same purchase/pay/verify shape with
//! different field names and a different status vocabulary.

use crate::config::IdpayConfig;
use async_trait::async_trait;
use multipay_core::{
    CallbackParams, Driver, Invoice, PaymentError, PaymentResult, Receipt, RedirectionForm,
    StatusMap,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, error, info, instrument};

/// Fixed message for status codes the gateway never documented.
const UNKNOWN_ERROR: &str = "Unknown error reported by the gateway.";

/// Verification status vocabulary. Purchase failures carry the gateway's
/// own `error_message` instead of a table lookup.
const VERIFY_STATUS: StatusMap = StatusMap::new(
    &[
        (1, "Payment has not been made."),
        (2, "Payment has failed."),
        (3, "An error has occurred."),
        (4, "Blocked."),
        (5, "Refunded to the payer."),
        (6, "Reversed by the system."),
        (10, "Awaiting payment confirmation."),
        (100, "Payment has been confirmed."),
        (101, "Payment was already confirmed."),
        (200, "Deposited to the recipient."),
        (11, "User is blocked."),
        (12, "API key not found."),
        (13, "Request originated from an untrusted IP."),
        (14, "Web service is awaiting approval or has been suspended."),
        (21, "The bank account linked to the web service is not approved."),
        (31, "Transaction id must not be empty."),
        (32, "Order number must not be empty."),
        (33, "Amount must not be empty."),
        (34, "Amount is less than the minimum allowed."),
        (35, "Amount is more than the maximum allowed."),
        (36, "Amount exceeds the permitted limit."),
        (37, "Callback address must not be empty."),
        (38, "Request originated from an untrusted domain for the callback address."),
        (51, "Transaction was not created."),
        (52, "Inquiry produced no result."),
        (53, "Verification of the payment is not possible."),
        (54, "The verification window for this transaction has elapsed."),
    ],
    UNKNOWN_ERROR,
);

/// Idpay gateway driver.
pub struct Idpay {
    invoice: Invoice,
    config: IdpayConfig,
    client: Client,
}

impl Idpay {
    /// Bind an invoice and settings to a new driver instance.
    pub fn new(invoice: Invoice, config: IdpayConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            invoice,
            config,
            client,
        }
    }

    fn sandbox_header(&self) -> &'static str {
        if self.config.sandbox {
            "1"
        } else {
            "0"
        }
    }
}

#[async_trait]
impl Driver for Idpay {
    fn invoice(&self) -> &Invoice {
        &self.invoice
    }

    fn invoice_mut(&mut self) -> &mut Invoice {
        &mut self.invoice
    }

    fn gateway_name(&self) -> &'static str {
        "idpay"
    }

    #[instrument(skip(self), fields(invoice = %self.invoice.uuid()))]
    async fn purchase(&mut self) -> PaymentResult<String> {
        let amount = self.invoice.amount();
        if amount <= 0 {
            return Err(PaymentError::InvalidAmount(amount));
        }

        // First non-empty detail wins, in a fixed preference order per field.
        let request = PurchaseRequest {
            order_id: self.invoice.uuid().to_string(),
            amount,
            name: self.invoice.first_detail(&["name"]),
            phone: self.invoice.first_detail(&["phone", "mobile"]),
            mail: self.invoice.first_detail(&["mail", "email"]),
            desc: self
                .invoice
                .first_detail(&["desc", "description"])
                .unwrap_or(&self.config.description),
            callback: &self.config.callback_url,
            reseller: self.invoice.first_detail(&["reseller"]),
        };

        debug!("registering invoice with Idpay");

        let response = self
            .client
            .post(&self.config.api_purchase_url)
            .header("X-API-KEY", &self.config.merchant_id)
            .header("X-SANDBOX", self.sandbox_header())
            .json(&request)
            .send()
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?;

        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?;

        // Idpay encodes errors in the body; absence of `id` is the failure
        // signal regardless of HTTP status.
        let body: PurchaseResponse = serde_json::from_str(&body).unwrap_or_default();

        match body.id {
            Some(id) if !id.is_empty() => {
                info!("Idpay accepted invoice: transaction id={}", id);
                self.invoice.set_transaction_id(&id);
                Ok(id)
            }
            _ => {
                let message = body
                    .error_message
                    .unwrap_or_else(|| UNKNOWN_ERROR.to_string());
                error!("Idpay rejected invoice: {}", message);
                Err(PaymentError::PurchaseFailed {
                    message,
                    status: body.error_code,
                })
            }
        }
    }

    fn pay(&self) -> PaymentResult<RedirectionForm> {
        let transaction_id = self
            .invoice
            .transaction_id()
            .ok_or(PaymentError::MissingTransactionId)?;

        let base = if self.config.sandbox {
            &self.config.api_sandbox_payment_url
        } else {
            &self.config.api_payment_url
        };

        Ok(RedirectionForm::get(format!("{base}{transaction_id}")))
    }

    #[instrument(skip(self, callback), fields(invoice = %self.invoice.uuid()))]
    async fn verify(&self, callback: &CallbackParams) -> PaymentResult<Receipt> {
        // Purchase and verify run in different requests; the id can come
        // from either the stored invoice or the gateway's callback.
        let id = self
            .invoice
            .transaction_id()
            .or_else(|| callback.input("id"))
            .ok_or_else(|| PaymentError::MissingCallbackParam("id".to_string()))?;

        let request = VerifyRequest {
            id,
            order_id: callback.input("order_id"),
        };

        let response = self
            .client
            .post(&self.config.api_verification_url)
            .header("X-API-KEY", &self.config.merchant_id)
            .header("X-SANDBOX", self.sandbox_header())
            .json(&request)
            .send()
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?;

        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?;
        let body: VerifyResponse = serde_json::from_str(&body).unwrap_or_default();

        if body.error_code.is_some() || body.status != Some(100) {
            let code = body.status.or(body.error_code);
            let message = code.map(|c| VERIFY_STATUS.message(c)).unwrap_or(UNKNOWN_ERROR);
            error!("Idpay verification rejected: status={:?}", code);
            return Err(PaymentError::InvalidPayment {
                message: message.to_string(),
                status: code,
            });
        }

        let track_id = body
            .track_id
            .as_ref()
            .and_then(stringify)
            .ok_or_else(|| {
                PaymentError::UnexpectedResponse("missing track_id in verification body".to_string())
            })?;

        info!("Idpay verification confirmed: track id={}", track_id);
        Ok(Receipt::new("idpay", track_id))
    }
}

/// Idpay returns numeric ids for some merchants and strings for others.
fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// =============================================================================
// Idpay API Types
// =============================================================================

#[derive(Debug, Serialize)]
struct PurchaseRequest<'a> {
    order_id: String,
    amount: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    phone: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    mail: Option<&'a str>,
    desc: &'a str,
    callback: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    reseller: Option<&'a str>,
}

#[derive(Debug, Default, Deserialize)]
struct PurchaseResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    error_code: Option<i64>,
}

#[derive(Debug, Serialize)]
struct VerifyRequest<'a> {
    id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    order_id: Option<&'a str>,
}

#[derive(Debug, Default, Deserialize)]
struct VerifyResponse {
    #[serde(default)]
    status: Option<i64>,
    #[serde(default)]
    track_id: Option<Value>,
    #[serde(default)]
    error_code: Option<i64>,
}
