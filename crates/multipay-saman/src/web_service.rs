//! # Saman Token Web Service
//!
//! The classic Saman flow: request a token over SOAP, POST it to the
//! payment page, verify the reference number over SOAP once the gateway
//! calls back.

use crate::config::SamanConfig;
use crate::verify::{verify_transaction, with_callback_details, UNKNOWN_ERROR};
use async_trait::async_trait;
use multipay_core::{
    CallbackParams, Driver, Invoice, PaymentError, PaymentResult, Receipt, RedirectionForm,
    StatusMap,
};
use multipay_soap::{escape, SoapClient};
use tracing::{debug, error, info, instrument};

/// Purchase (token request) status vocabulary.
const PURCHASE_STATUS: StatusMap = StatusMap::new(
    &[
        (-1, "Processing error while performing the transaction."),
        (-6, "Reversed transaction is older than thirty minutes."),
        (-18, "Merchant IP address is invalid."),
        (79, "Amount exceeds the maximum allowed per transaction."),
        (12, "Declined by the card issuer; the card holder should contact the issuing bank."),
        (14, "Card number is invalid."),
        (15, "The issuing bank for this card is unavailable."),
        (33, "Card has expired; a new card is required."),
        (38, "PIN retry limit exceeded; the card has been suspended."),
        (55, "Card PIN is invalid."),
        (61, "Amount exceeds the card's withdrawal ceiling."),
        (93, "Transaction was authorized but could not complete; retry after a while."),
        (68, "Transaction timed out at the switch."),
        (34, "CVV2 or expiry date was entered incorrectly."),
        (51, "Insufficient funds."),
        (84, "The issuing bank is temporarily out of service."),
        (96, "Internal switch error while executing the transaction."),
    ],
    UNKNOWN_ERROR,
);

/// Saman gateway driver (SOAP token web service).
pub struct Saman {
    invoice: Invoice,
    config: SamanConfig,
    soap: SoapClient,
}

impl Saman {
    /// Bind an invoice and settings to a new driver instance.
    pub fn new(invoice: Invoice, config: SamanConfig) -> Self {
        Self {
            invoice,
            config,
            soap: SoapClient::new(),
        }
    }
}

#[async_trait]
impl Driver for Saman {
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

        // The gateway wants rial; the invoice carries toman.
        let amount_rial = amount * 10;

        // CellNumber lets the gateway offer the user their saved cards.
        let cell_number = self.invoice.detail_str("mobile").unwrap_or("");

        let body = format!(
            "<RequestToken><TermID>{}</TermID><ResNum>{}</ResNum>\
             <TotalAmount>{}</TotalAmount><CellNumber>{}</CellNumber></RequestToken>",
            escape(&self.config.merchant_id),
            self.invoice.uuid(),
            amount_rial,
            escape(cell_number),
        );

        debug!("requesting Saman token");
        let response = self
            .soap
            .call(&self.config.api_purchase_url, "RequestToken", &body)
            .await?;
        let result = response.require("RequestTokenResult")?;

        // A numeric negative result is a rejection; anything else is the token.
        if let Ok(code) = result.parse::<i64>() {
            if code < 0 {
                error!("Saman rejected token request: status={}", code);
                return Err(PaymentError::PurchaseFailed {
                    message: PURCHASE_STATUS.message(code).to_string(),
                    status: Some(code),
                });
            }
        }

        info!("Saman issued token");
        self.invoice.set_transaction_id(result);
        Ok(result.to_string())
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

        let settled = verify_transaction(
            &self.soap,
            &self.config.api_verification_url,
            ref_num,
            &self.config.merchant_id,
        )
        .await?;

        info!("Saman verification confirmed: settled amount={}", settled);
        Ok(with_callback_details(
            Receipt::new("saman", ref_num),
            callback,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn soap_result(operation: &str, value: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    <{operation}Response xmlns="urn:Foo">
      <{operation}Result>{value}</{operation}Result>
    </{operation}Response>
  </soap:Body>
</soap:Envelope>"#
        )
    }

    fn invoice_with_amount(amount: i64) -> Invoice {
        let mut invoice = Invoice::new();
        invoice.set_amount(amount).unwrap();
        invoice
    }

    fn config_for(server: &MockServer) -> SamanConfig {
        SamanConfig::new("MID-1", "https://shop.example/callback")
            .unwrap()
            .with_purchase_url(format!("{}/payments/initpayment.asmx", server.uri()))
            .with_verification_url(format!("{}/payments/referencepayment.asmx", server.uri()))
    }

    #[tokio::test]
    async fn test_purchase_converts_toman_to_rial_and_stores_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("SOAPAction", "RequestToken"))
            .and(body_string_contains("<TotalAmount>150000</TotalAmount>"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(soap_result("RequestToken", "TOK-abc-123")),
            )
            .mount(&server)
            .await;

        let mut driver = Saman::new(invoice_with_amount(15_000), config_for(&server));
        let token = driver.purchase().await.unwrap();

        assert_eq!(token, "TOK-abc-123");
        assert_eq!(driver.invoice().transaction_id(), Some("TOK-abc-123"));
    }

    #[tokio::test]
    async fn test_purchase_negative_status_translates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(soap_result("RequestToken", "-18")),
            )
            .mount(&server)
            .await;

        let mut driver = Saman::new(invoice_with_amount(1000), config_for(&server));
        let err = driver.purchase().await.unwrap_err();

        assert!(matches!(
            &err,
            PaymentError::PurchaseFailed { message, status: Some(-18) }
                if message == "Merchant IP address is invalid."
        ));
        assert!(driver.invoice().transaction_id().is_none());
    }

    #[test]
    fn test_pay_posts_token_and_redirect_url() {
        let mut invoice = invoice_with_amount(1000);
        invoice.set_transaction_id("TOK-abc-123");

        let config = SamanConfig::new("MID-1", "https://shop.example/callback").unwrap();
        let driver = Saman::new(invoice, config);

        let form = driver.pay().unwrap();
        assert_eq!(form, driver.pay().unwrap());
        assert_eq!(form.action(), "https://sep.shaparak.ir/payment.aspx");
        assert_eq!(
            form.inputs(),
            &[
                ("Token".to_string(), "TOK-abc-123".to_string()),
                (
                    "RedirectUrl".to_string(),
                    "https://shop.example/callback".to_string()
                ),
            ]
        );
    }

    #[tokio::test]
    async fn test_verify_builds_receipt_from_callback() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("SOAPAction", "VerifyTransaction"))
            .and(body_string_contains("<RefNum>REF-77</RefNum>"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(soap_result("VerifyTransaction", "150000")),
            )
            .mount(&server)
            .await;

        let driver = Saman::new(Invoice::new(), config_for(&server));
        let callback: CallbackParams = [
            ("RefNum", "REF-77"),
            ("TraceNo", "998877"),
            ("RRN", "112233"),
            ("SecurePan", "6219-86**-****-1234"),
        ]
        .into_iter()
        .collect();

        let receipt = driver.verify(&callback).await.unwrap();
        assert_eq!(receipt.gateway(), "saman");
        assert_eq!(receipt.reference_id(), "REF-77");
        assert_eq!(receipt.detail_str("traceNo"), Some("998877"));
        assert_eq!(receipt.detail_str("referenceNo"), Some("112233"));
        assert_eq!(receipt.detail_str("cardNo"), Some("6219-86**-****-1234"));
    }

    #[tokio::test]
    async fn test_verify_negative_status_translates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(soap_result("VerifyTransaction", "-4")),
            )
            .mount(&server)
            .await;

        let driver = Saman::new(Invoice::new(), config_for(&server));
        let callback: CallbackParams = [("RefNum", "REF-77")].into_iter().collect();
        let err = driver.verify(&callback).await.unwrap_err();

        assert!(matches!(
            &err,
            PaymentError::InvalidPayment { message, status: Some(-4) }
                if message == "Merchant authentication failed."
        ));
    }

    #[tokio::test]
    async fn test_verify_without_ref_num_never_calls_the_gateway() {
        let server = MockServer::start().await;
        let driver = Saman::new(Invoice::new(), config_for(&server));
        let err = driver.verify(&CallbackParams::new()).await.unwrap_err();
        assert!(matches!(
            err,
            PaymentError::MissingCallbackParam(name) if name == "RefNum"
        ));
    }
}
