//! # Zarinpal Sandbox Strategy
//!
//! SOAP driver against the WebGate test environment. `PaymentRequest`
//! yields an authority token, `StartPay` hosts the payment page, and
//! `PaymentVerification` confirms the callback.

use crate::config::ZarinpalConfig;
use async_trait::async_trait;
use multipay_core::{
    CallbackParams, Driver, Invoice, PaymentError, PaymentResult, Receipt, RedirectionForm,
    StatusMap,
};
use multipay_soap::{escape, SoapClient};
use tracing::{debug, error, info, instrument};

/// One vocabulary serves both phases; the gateway reuses its codes across
/// PaymentRequest and PaymentVerification.
const STATUS: StatusMap = StatusMap::new(
    &[
        (100, "Transaction completed successfully."),
        (101, "Transaction succeeded and was verified once before."),
        (-9, "Validation error; input parameters are invalid."),
        (-10, "Terminal is not valid; check the merchant id and IP."),
        (-11, "Terminal is not active; contact support."),
        (-12, "Too many attempts; try again later."),
        (-15, "Terminal has been suspended; contact support."),
        (-16, "Merchant level does not permit this operation."),
        (-30, "Terminal is not allowed to use floating settlement."),
        (-31, "Settlement account is not set; add a bank account in the panel."),
        (-32, "Wage is out of the permitted range."),
        (-33, "Wage percentage is out of the permitted range."),
        (-34, "Wage exceeds the transaction amount cap."),
        (-35, "Number of wage recipients exceeds the allowed maximum."),
        (-40, "The expire_in parameter is invalid."),
        (-50, "Session amount does not match the verified amount."),
        (-51, "Payment session failed."),
        (-52, "Unexpected error; contact support."),
        (-53, "The payment session does not belong to this merchant."),
        (-54, "Authority is invalid."),
    ],
    "An unknown error occurred; a withdrawn amount is returned to the card within 72 hours.",
);

/// Zarinpal driver bound to the sandbox endpoints.
pub struct ZarinpalSandbox {
    invoice: Invoice,
    config: ZarinpalConfig,
    soap: SoapClient,
}

impl ZarinpalSandbox {
    /// Bind an invoice and settings to a new driver instance.
    pub fn new(invoice: Invoice, config: ZarinpalConfig) -> Self {
        Self {
            invoice,
            config,
            soap: SoapClient::new(),
        }
    }
}

#[async_trait]
impl Driver for ZarinpalSandbox {
    fn invoice(&self) -> &Invoice {
        &self.invoice
    }

    fn invoice_mut(&mut self) -> &mut Invoice {
        &mut self.invoice
    }

    fn gateway_name(&self) -> &'static str {
        "zarinpal"
    }

    #[instrument(skip(self), fields(invoice = %self.invoice.uuid()))]
    async fn purchase(&mut self) -> PaymentResult<String> {
        let amount = self.invoice.amount();
        if amount <= 0 {
            return Err(PaymentError::InvalidAmount(amount));
        }

        let description = self
            .invoice
            .first_detail(&["description"])
            .unwrap_or(&self.config.description);
        let mobile = self.invoice.first_detail(&["mobile"]).unwrap_or("");
        let email = self.invoice.first_detail(&["email"]).unwrap_or("");

        let body = format!(
            "<PaymentRequest><MerchantID>{}</MerchantID><Amount>{}</Amount>\
             <Description>{}</Description><Email>{}</Email><Mobile>{}</Mobile>\
             <CallbackURL>{}</CallbackURL></PaymentRequest>",
            escape(&self.config.merchant_id),
            amount,
            escape(description),
            escape(email),
            escape(mobile),
            escape(&self.config.callback_url),
        );

        debug!("requesting Zarinpal authority");
        let response = self
            .soap
            .call(&self.config.api_purchase_url, "PaymentRequest", &body)
            .await?;

        let status = response.int("Status").ok_or_else(|| {
            PaymentError::UnexpectedResponse("missing Status in PaymentRequest response".to_string())
        })?;
        let authority = response.text("Authority").unwrap_or_default();

        // The authority is the success indicator as much as the status is.
        if status != 100 || authority.is_empty() {
            error!("Zarinpal rejected payment request: status={}", status);
            return Err(PaymentError::PurchaseFailed {
                message: STATUS.message(status).to_string(),
                status: Some(status),
            });
        }

        info!("Zarinpal issued authority");
        self.invoice.set_transaction_id(authority);
        Ok(authority.to_string())
    }

    fn pay(&self) -> PaymentResult<RedirectionForm> {
        let authority = self
            .invoice
            .transaction_id()
            .ok_or(PaymentError::MissingTransactionId)?;

        Ok(RedirectionForm::get(format!(
            "{}{}",
            self.config.api_payment_url, authority
        )))
    }

    #[instrument(skip(self, callback), fields(invoice = %self.invoice.uuid()))]
    async fn verify(&self, callback: &CallbackParams) -> PaymentResult<Receipt> {
        let authority = self
            .invoice
            .transaction_id()
            .or_else(|| callback.input("Authority"))
            .ok_or_else(|| PaymentError::MissingCallbackParam("Authority".to_string()))?;

        let body = format!(
            "<PaymentVerification><MerchantID>{}</MerchantID><Authority>{}</Authority>\
             <Amount>{}</Amount></PaymentVerification>",
            escape(&self.config.merchant_id),
            escape(authority),
            self.invoice.amount(),
        );

        let response = self
            .soap
            .call(&self.config.api_verification_url, "PaymentVerification", &body)
            .await?;

        let status = response.int("Status").ok_or_else(|| {
            PaymentError::UnexpectedResponse(
                "missing Status in PaymentVerification response".to_string(),
            )
        })?;

        if status != 100 {
            error!("Zarinpal verification rejected: status={}", status);
            return Err(PaymentError::InvalidPayment {
                message: STATUS.message(status).to_string(),
                status: Some(status),
            });
        }

        let ref_id = response.require("RefID")?;
        info!("Zarinpal verification confirmed: ref id={}", ref_id);
        Ok(Receipt::new("zarinpal", ref_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn payment_request_response(status: i64, authority: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    <PaymentRequestResponse xmlns="http://zarinpal.com/">
      <Status>{status}</Status>
      <Authority>{authority}</Authority>
    </PaymentRequestResponse>
  </soap:Body>
</soap:Envelope>"#
        )
    }

    fn verification_response(status: i64, ref_id: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    <PaymentVerificationResponse xmlns="http://zarinpal.com/">
      <Status>{status}</Status>
      <RefID>{ref_id}</RefID>
    </PaymentVerificationResponse>
  </soap:Body>
</soap:Envelope>"#
        )
    }

    fn invoice_with_amount(amount: i64) -> Invoice {
        let mut invoice = Invoice::new();
        invoice.set_amount(amount).unwrap();
        invoice
    }

    fn config_for(server: &MockServer) -> ZarinpalConfig {
        ZarinpalConfig::new("m-uuid", "https://shop.example/callback")
            .unwrap()
            .with_purchase_url(format!("{}/pg/services/WebGate", server.uri()))
            .with_verification_url(format!("{}/pg/services/WebGate", server.uri()))
    }

    #[tokio::test]
    async fn test_purchase_stores_authority() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("SOAPAction", "PaymentRequest"))
            .and(body_string_contains("<Amount>45000</Amount>"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(payment_request_response(100, "A00000123")),
            )
            .mount(&server)
            .await;

        let mut driver = ZarinpalSandbox::new(invoice_with_amount(45_000), config_for(&server));
        let authority = driver.purchase().await.unwrap();

        assert_eq!(authority, "A00000123");
        assert_eq!(driver.invoice().transaction_id(), Some("A00000123"));
    }

    #[tokio::test]
    async fn test_purchase_failure_carries_translated_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(payment_request_response(-11, "")),
            )
            .mount(&server)
            .await;

        let mut driver = ZarinpalSandbox::new(invoice_with_amount(1000), config_for(&server));
        let err = driver.purchase().await.unwrap_err();

        assert!(matches!(
            &err,
            PaymentError::PurchaseFailed { message, status: Some(-11) }
                if message == "Terminal is not active; contact support."
        ));
        assert!(driver.invoice().transaction_id().is_none());
    }

    #[tokio::test]
    async fn test_purchase_status_100_without_authority_still_fails() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(payment_request_response(100, "")),
            )
            .mount(&server)
            .await;

        let mut driver = ZarinpalSandbox::new(invoice_with_amount(1000), config_for(&server));
        assert!(matches!(
            driver.purchase().await,
            Err(PaymentError::PurchaseFailed { .. })
        ));
    }

    #[test]
    fn test_pay_appends_authority_to_start_pay() {
        let mut invoice = invoice_with_amount(1000);
        invoice.set_transaction_id("A00000123");

        let config = ZarinpalConfig::new("m-uuid", "https://shop.example/callback").unwrap();
        let driver = ZarinpalSandbox::new(invoice, config);

        let form = driver.pay().unwrap();
        assert_eq!(form, driver.pay().unwrap());
        assert_eq!(
            form.action(),
            "https://sandbox.zarinpal.com/pg/StartPay/A00000123"
        );
    }

    #[tokio::test]
    async fn test_verify_returns_ref_id_receipt() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("SOAPAction", "PaymentVerification"))
            .and(body_string_contains("<Authority>A00000123</Authority>"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(verification_response(100, "RF-900")),
            )
            .mount(&server)
            .await;

        // The caller re-sets the amount in the callback request; the
        // authority arrives through the callback parameters.
        let driver = ZarinpalSandbox::new(invoice_with_amount(45_000), config_for(&server));
        let callback: CallbackParams = [("Authority", "A00000123"), ("Status", "OK")]
            .into_iter()
            .collect();

        let receipt = driver.verify(&callback).await.unwrap();
        assert_eq!(receipt.gateway(), "zarinpal");
        assert_eq!(receipt.reference_id(), "RF-900");
    }

    #[tokio::test]
    async fn test_verify_invalid_authority_translates() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(verification_response(-54, "")),
            )
            .mount(&server)
            .await;

        let driver = ZarinpalSandbox::new(invoice_with_amount(1000), config_for(&server));
        let callback: CallbackParams = [("Authority", "bogus")].into_iter().collect();
        let err = driver.verify(&callback).await.unwrap_err();

        assert!(matches!(
            &err,
            PaymentError::InvalidPayment { message, status: Some(-54) }
                if message == "Authority is invalid."
        ));
    }

    #[tokio::test]
    async fn test_verify_unknown_status_uses_fallback() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(verification_response(-999, "")),
            )
            .mount(&server)
            .await;

        let driver = ZarinpalSandbox::new(invoice_with_amount(1000), config_for(&server));
        let callback: CallbackParams = [("Authority", "A1")].into_iter().collect();
        let err = driver.verify(&callback).await.unwrap_err();

        assert!(matches!(
            &err,
            PaymentError::InvalidPayment { message, status: Some(-999) }
                if message == STATUS.fallback()
        ));
    }
}
