//! # Sepordeh Driver
//!
//! Form-encoded REST driver for the Sepordeh gateway. Success is an
//! HTTP-style `status` of 200 in the JSON body; error wording comes from
//! the body's own `message` when present, with a small status table as the
//! fallback.

use crate::config::{PaymentMode, SepordehConfig};
use async_trait::async_trait;
use multipay_core::{
    CallbackParams, Driver, Invoice, PaymentError, PaymentResult, Receipt, RedirectionForm,
    StatusMap,
};
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info, instrument};

const UNKNOWN_ERROR: &str = "Unknown error reported by the gateway.";

/// One table serves both phases; the gateway reuses its HTTP-style codes.
const STATUS: StatusMap = StatusMap::new(
    &[
        (400, "Request is missing required parameters."),
        (401, "Merchant id is invalid."),
        (403, "Access denied."),
        (404, "The requested invoice was not found."),
        (500, "Gateway-side error while processing the request."),
        (503, "Gateway is under maintenance; retry later."),
    ],
    UNKNOWN_ERROR,
);

/// Sepordeh gateway driver.
pub struct Sepordeh {
    invoice: Invoice,
    config: SepordehConfig,
    client: Client,
}

impl Sepordeh {
    /// Bind an invoice and settings to a new driver instance.
    pub fn new(invoice: Invoice, config: SepordehConfig) -> Self {
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

    fn failure_message(body: &GatewayResponse) -> String {
        body.message
            .clone()
            .unwrap_or_else(|| STATUS.message(body.status).to_string())
    }
}

#[async_trait]
impl Driver for Sepordeh {
    fn invoice(&self) -> &Invoice {
        &self.invoice
    }

    fn invoice_mut(&mut self) -> &mut Invoice {
        &mut self.invoice
    }

    fn gateway_name(&self) -> &'static str {
        "sepordeh"
    }

    #[instrument(skip(self), fields(invoice = %self.invoice.uuid()))]
    async fn purchase(&mut self) -> PaymentResult<String> {
        let amount = self.invoice.amount();
        if amount <= 0 {
            return Err(PaymentError::InvalidAmount(amount));
        }

        let amount_str = amount.to_string();
        let order_id = self.invoice.first_detail(&["orderId"]).unwrap_or_default();
        let phone = self.invoice.first_detail(&["phone", "mobile"]).unwrap_or_default();
        let description = self
            .invoice
            .first_detail(&["description"])
            .unwrap_or(&self.config.description);

        let params = [
            ("merchant", self.config.merchant_id.as_str()),
            ("amount", amount_str.as_str()),
            ("phone", phone),
            ("orderId", order_id),
            ("callback", self.config.callback_url.as_str()),
            ("description", description),
        ];

        debug!("registering invoice with Sepordeh");
        let response = self
            .client
            .post(&self.config.api_purchase_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?;

        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?;
        let body: GatewayResponse = serde_json::from_str(&body).unwrap_or_default();

        if body.status != 200 {
            let message = Self::failure_message(&body);
            error!("Sepordeh rejected invoice: status={}, {}", body.status, message);
            return Err(PaymentError::PurchaseFailed {
                message,
                status: Some(body.status),
            });
        }

        let invoice_id = body
            .information
            .as_ref()
            .and_then(|info| info.invoice_id.as_ref())
            .and_then(stringify)
            .ok_or_else(|| {
                PaymentError::UnexpectedResponse(
                    "missing information.invoice_id in purchase body".to_string(),
                )
            })?;

        info!("Sepordeh accepted invoice: id={}", invoice_id);
        self.invoice.set_transaction_id(&invoice_id);
        Ok(invoice_id)
    }

    fn pay(&self) -> PaymentResult<RedirectionForm> {
        let invoice_id = self
            .invoice
            .transaction_id()
            .ok_or(PaymentError::MissingTransactionId)?;

        let base = match self.config.mode {
            PaymentMode::Normal => &self.config.api_payment_url,
            PaymentMode::Direct => &self.config.api_direct_payment_url,
        };

        Ok(RedirectionForm::get(format!("{base}{invoice_id}")))
    }

    #[instrument(skip(self, callback), fields(invoice = %self.invoice.uuid()))]
    async fn verify(&self, callback: &CallbackParams) -> PaymentResult<Receipt> {
        let authority = self
            .invoice
            .transaction_id()
            .or_else(|| callback.input("authority"))
            .ok_or_else(|| PaymentError::MissingCallbackParam("authority".to_string()))?;

        let params = [
            ("merchant", self.config.merchant_id.as_str()),
            ("authority", authority),
        ];

        let response = self
            .client
            .post(&self.config.api_verification_url)
            .form(&params)
            .send()
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?;

        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?;
        let body: GatewayResponse = serde_json::from_str(&body).unwrap_or_default();

        if body.status != 200 {
            let message = Self::failure_message(&body);
            error!("Sepordeh verification rejected: status={}", body.status);
            return Err(PaymentError::InvalidPayment {
                message,
                status: Some(body.status),
            });
        }

        let information = body.information.as_ref();
        let reference_id = information
            .and_then(|info| info.invoice_id.as_ref())
            .and_then(stringify)
            .ok_or_else(|| {
                PaymentError::UnexpectedResponse(
                    "missing information.invoice_id in verification body".to_string(),
                )
            })?;

        info!("Sepordeh verification confirmed: id={}", reference_id);

        let mut receipt = Receipt::new("sepordeh", reference_id);
        if let Some(card) = information.and_then(|info| info.card.as_deref()) {
            receipt = receipt.with_detail("card", card);
        }
        if let Some(order_id) = callback.input("orderId") {
            receipt = receipt.with_detail("orderId", order_id);
        }
        Ok(receipt)
    }
}

/// The gateway returns invoice ids as numbers or strings depending on age
/// of the merchant account.
fn stringify(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

// =============================================================================
// Sepordeh API Types
// =============================================================================

#[derive(Debug, Default, Deserialize)]
struct GatewayResponse {
    #[serde(default)]
    status: i64,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    information: Option<Information>,
}

#[derive(Debug, Default, Deserialize)]
struct Information {
    #[serde(default)]
    invoice_id: Option<Value>,
    #[serde(default)]
    card: Option<String>,
}
