//! # Saman OnlinePG
//!
//! The newer Saman flow: token request over REST (`action=token`),
//! verification over the same SOAP reference-payment service as the classic
//! web service.

use crate::config::SamanOnlinePgConfig;
use crate::verify::{verify_transaction, with_callback_details, UNKNOWN_ERROR};
use async_trait::async_trait;
use multipay_core::{
    CallbackParams, Driver, Invoice, PaymentError, PaymentResult, Receipt, RedirectionForm,
    StatusMap,
};
use multipay_soap::SoapClient;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, error, info, instrument};

/// Token request status vocabulary. The first block is the OnlinePG token
/// service's own codes; the rest are switch/issuer codes passed through.
/// Upstream documentation repeats `-1` with amended wording; the later
/// entry is the one kept.
const PURCHASE_STATUS: StatusMap = StatusMap::new(
    &[
        (1, "Cancelled by the user."),
        (2, "Payment was completed successfully."),
        (3, "Payment did not complete."),
        (4, "The user did not respond within the allotted time."),
        (5, "Request parameters are invalid."),
        (8, "Merchant server address is invalid."),
        (10, "Token was not found."),
        (11, "Only token-based transactions are allowed for this terminal."),
        (12, "Terminal number was not found."),
        (-1, "Processing error while performing the transaction."),
        (-3, "Input is not in the valid format."),
        (-4, "Merchant authentication failed."),
        (-6, "Reversed transaction is older than thirty minutes."),
        (-7, "Reference number is empty."),
        (-8, "Input is longer than allowed."),
        (-9, "Input contains invalid characters."),
        (-10, "Input is not valid Base64."),
        (-11, "Input is shorter than allowed."),
        (-12, "Amount is negative."),
        (-13, "Amount of the reversal request exceeds the original transaction."),
        (-14, "The transaction does not exist."),
        (-15, "Amount is not numeric."),
        (-16, "Internal bank error."),
        (-17, "Reversal rejected for a transaction from another terminal."),
        (-18, "Merchant IP address is invalid, or reversal is not enabled."),
        (0, "Transaction was declined by the switch."),
        (14, "Card number is invalid."),
        (15, "The issuing bank for this card is unavailable."),
        (16, "Transaction approved; card balance will update with delay."),
        (19, "Transaction amount was settled partially."),
        (23, "Security violation detected by the acquirer."),
        (30, "Message format is invalid."),
        (31, "Merchant is unknown to the switch."),
        (33, "Card has expired."),
        (34, "CVV2 or expiry date was entered incorrectly."),
        (38, "PIN retry limit exceeded; the card has been suspended."),
        (39, "Card has no linked current account."),
        (40, "Requested operation is not supported."),
        (41, "Card has been reported lost."),
        (42, "Card has no linked savings account."),
        (43, "Card has been reported stolen."),
        (44, "Card has no linked foreign-currency account."),
        (51, "Insufficient funds."),
        (52, "Card has no linked current account."),
        (53, "Card has no linked savings account."),
        (54, "Card has expired."),
        (55, "Card PIN is invalid."),
        (56, "Card is invalid."),
        (57, "The card holder is not permitted to perform this transaction."),
        (58, "The terminal is not permitted to perform this transaction."),
        (61, "Amount exceeds the card's withdrawal ceiling."),
        (62, "Card is restricted."),
        (63, "Security violation on the card."),
        (65, "Number of daily withdrawals exceeded."),
        (68, "Transaction timed out at the switch."),
        (75, "PIN retry limit exceeded."),
        (79, "Amount exceeds the maximum allowed per transaction."),
        (84, "The issuing bank is temporarily out of service."),
        (90, "The issuing bank is in end-of-day processing."),
        (93, "Transaction was authorized but could not complete."),
        (96, "Internal switch error while executing the transaction."),
    ],
    UNKNOWN_ERROR,
);

/// Saman OnlinePG gateway driver.
pub struct SamanOnlinePg {
    invoice: Invoice,
    config: SamanOnlinePgConfig,
    client: Client,
    soap: SoapClient,
}

impl SamanOnlinePg {
    /// Bind an invoice and settings to a new driver instance.
    pub fn new(invoice: Invoice, config: SamanOnlinePgConfig) -> Self {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self {
            invoice,
            config,
            client,
            soap: SoapClient::new(),
        }
    }
}

#[async_trait]
impl Driver for SamanOnlinePg {
    fn invoice(&self) -> &Invoice {
        &self.invoice
    }

    fn invoice_mut(&mut self) -> &mut Invoice {
        &mut self.invoice
    }

    fn gateway_name(&self) -> &'static str {
        "saman"
    }

    #[instrument(skip(self), fields(invoice = %self.invoice.uuid()))]
    async fn purchase(&mut self) -> PaymentResult<String> {
        let amount = self.invoice.amount();
        if amount <= 0 {
            return Err(PaymentError::InvalidAmount(amount));
        }

        let amount_rial = (amount * 10).to_string();
        let res_num = self.invoice.uuid().to_string();
        let cell_number = self.invoice.detail_str("mobile").unwrap_or("");

        let params = [
            ("action", "token"),
            ("TerminalId", self.config.merchant_id.as_str()),
            ("Amount", amount_rial.as_str()),
            ("ResNum", res_num.as_str()),
            ("RedirectUrl", self.config.callback_url.as_str()),
            ("CellNumber", cell_number),
        ];

        debug!("requesting OnlinePG token");
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
        let body: TokenResponse = serde_json::from_str(&body).unwrap_or_default();

        if body.status < 0 {
            error!(
                "OnlinePG rejected token request: status={}, errorCode={:?}",
                body.status, body.error_code
            );
            let message = body
                .error_code
                .map(|code| PURCHASE_STATUS.message(code))
                .unwrap_or(UNKNOWN_ERROR);
            return Err(PaymentError::PurchaseFailed {
                message: message.to_string(),
                status: body.error_code,
            });
        }

        match body.token {
            Some(token) if !token.is_empty() => {
                info!("OnlinePG issued token");
                self.invoice.set_transaction_id(&token);
                Ok(token)
            }
            _ => Err(PaymentError::PurchaseFailed {
                message: UNKNOWN_ERROR.to_string(),
                status: None,
            }),
        }
    }

    fn pay(&self) -> PaymentResult<RedirectionForm> {
        let token = self
            .invoice
            .transaction_id()
            .ok_or(PaymentError::MissingTransactionId)?;

        Ok(RedirectionForm::post(
            &self.config.api_payment_url,
            vec![
                ("Token".to_string(), token.to_string()),
                ("RedirectUrl".to_string(), self.config.callback_url.clone()),
            ],
        ))
    }

    #[instrument(skip(self, callback), fields(invoice = %self.invoice.uuid()))]
    async fn verify(&self, callback: &CallbackParams) -> PaymentResult<Receipt> {
        let ref_num = callback.require("RefNum")?;
        let trace_no = callback.require("TraceNo")?;

        let settled = verify_transaction(
            &self.soap,
            &self.config.api_verification_url,
            ref_num,
            &self.config.merchant_id,
        )
        .await?;

        info!("OnlinePG verification confirmed: settled amount={}", settled);
        Ok(with_callback_details(
            Receipt::new("saman", trace_no),
            callback,
        ))
    }
}

// =============================================================================
// OnlinePG API Types
// =============================================================================

#[derive(Debug, Default, Deserialize)]
struct TokenResponse {
    #[serde(default)]
    status: i64,
    #[serde(default, rename = "errorCode")]
    error_code: Option<i64>,
    #[serde(default)]
    token: Option<String>,
}
