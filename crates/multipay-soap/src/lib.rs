//! # multipay-soap
//!
//! Minimal SOAP 1.1 shim for the gateways that still speak XML RPC
//! (Saman's token/verification web services, Zarinpal's WebGate).
//!
//! The gateways' SOAP surface is shallow: one operation in, a handful of
//! scalar result elements out. This shim wraps the operation body in a
//! SOAP envelope, POSTs it, and flattens the response's leaf elements into
//! name→text pairs for field extraction. It is not, and does not try to be,
//! a general WSDL client.
//!
//! ```rust,ignore
//! let soap = SoapClient::new();
//! let response = soap
//!     .call(url, "VerifyTransaction", &format!(
//!         "<VerifyTransaction><RefNum>{}</RefNum><MerchantID>{}</MerchantID></VerifyTransaction>",
//!         escape(ref_num), escape(merchant_id),
//!     ))
//!     .await?;
//! let status: f64 = response.require("VerifyTransactionResult")?.parse()?;
//! ```

use multipay_core::{PaymentError, PaymentResult};
use quick_xml::events::Event;
use quick_xml::Reader;
use std::collections::HashMap;
use tracing::{debug, error, instrument};

pub use quick_xml::escape::escape;

/// SOAP client owning its HTTP transport.
pub struct SoapClient {
    http: reqwest::Client,
}

impl SoapClient {
    /// Create a client with the standard 30-second timeout.
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()
            .expect("Failed to create HTTP client");

        Self { http }
    }

    /// Wrap an operation body in a SOAP 1.1 envelope.
    pub fn envelope(operation_body: &str) -> String {
        format!(
            "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\
             <soapenv:Envelope xmlns:soapenv=\"http://schemas.xmlsoap.org/soap/envelope/\">\
             <soapenv:Body>{operation_body}</soapenv:Body>\
             </soapenv:Envelope>"
        )
    }

    /// POST one operation and flatten the response.
    ///
    /// A SOAP fault in the body is surfaced as an error even when the
    /// gateway answers 200; a non-2xx status without a fault is a transport
    /// error.
    #[instrument(skip(self, operation_body))]
    pub async fn call(
        &self,
        url: &str,
        action: &str,
        operation_body: &str,
    ) -> PaymentResult<SoapResponse> {
        let envelope = Self::envelope(operation_body);
        debug!("SOAP call: action={}", action);

        let response = self
            .http
            .post(url)
            .header("Content-Type", "text/xml; charset=utf-8")
            .header("SOAPAction", action)
            .body(envelope)
            .send()
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| PaymentError::Network(e.to_string()))?;

        let parsed = SoapResponse::parse(&body)?;

        if let Some(fault) = parsed.fault() {
            error!("SOAP fault from {}: {}", url, fault);
            return Err(PaymentError::UnexpectedResponse(format!(
                "SOAP fault: {fault}"
            )));
        }

        if !status.is_success() {
            error!("SOAP endpoint error: status={}, body={}", status, body);
            return Err(PaymentError::Network(format!(
                "HTTP {status} from SOAP endpoint"
            )));
        }

        Ok(parsed)
    }
}

impl Default for SoapClient {
    fn default() -> Self {
        Self::new()
    }
}

/// A flattened SOAP response: every leaf element's local name mapped to its
/// text content. Namespace prefixes are dropped; a repeated element name
/// keeps the last occurrence.
#[derive(Debug, Clone)]
pub struct SoapResponse {
    fields: HashMap<String, String>,
}

impl SoapResponse {
    /// Parse a response envelope.
    pub fn parse(xml: &str) -> PaymentResult<Self> {
        let mut reader = Reader::from_str(xml);
        reader.config_mut().trim_text(true);

        let mut fields = HashMap::new();
        let mut current: Option<String> = None;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    current = Some(String::from_utf8_lossy(e.local_name().as_ref()).into_owned());
                }
                Ok(Event::Text(t)) => {
                    if let Some(name) = &current {
                        let text = t
                            .unescape()
                            .map_err(|e| PaymentError::UnexpectedResponse(e.to_string()))?;
                        fields.insert(name.clone(), text.into_owned());
                    }
                }
                Ok(Event::CData(t)) => {
                    if let Some(name) = &current {
                        let text = String::from_utf8_lossy(&t.into_inner()).into_owned();
                        fields.insert(name.clone(), text);
                    }
                }
                Ok(Event::End(_)) => current = None,
                Ok(Event::Eof) => break,
                Ok(_) => {}
                Err(e) => {
                    return Err(PaymentError::UnexpectedResponse(format!(
                        "malformed SOAP response: {e}"
                    )))
                }
            }
        }

        Ok(Self { fields })
    }

    /// Text of a leaf element, by local name.
    pub fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(String::as_str)
    }

    /// Like [`text`](SoapResponse::text), but absence is an
    /// [`UnexpectedResponse`](PaymentError::UnexpectedResponse).
    pub fn require(&self, name: &str) -> PaymentResult<&str> {
        self.text(name).ok_or_else(|| {
            PaymentError::UnexpectedResponse(format!("missing element <{name}> in SOAP response"))
        })
    }

    /// A leaf element parsed as an integer.
    pub fn int(&self, name: &str) -> Option<i64> {
        self.text(name).and_then(|value| value.parse().ok())
    }

    /// The `faultstring` of a SOAP fault, when the body carries one.
    pub fn fault(&self) -> Option<&str> {
        self.text("faultstring")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const VERIFY_RESPONSE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
  <soap:Body>
    <VerifyTransactionResponse xmlns="urn:Foo">
      <VerifyTransactionResult>150000</VerifyTransactionResult>
    </VerifyTransactionResponse>
  </soap:Body>
</soap:Envelope>"#;

    #[test]
    fn test_parse_extracts_leaf_elements() {
        let response = SoapResponse::parse(VERIFY_RESPONSE).unwrap();
        assert_eq!(response.text("VerifyTransactionResult"), Some("150000"));
        assert_eq!(response.int("VerifyTransactionResult"), Some(150000));
        assert!(response.fault().is_none());
        assert!(response.require("RefID").is_err());
    }

    #[test]
    fn test_parse_detects_fault() {
        let xml = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
          <soap:Body><soap:Fault>
            <faultcode>soap:Server</faultcode>
            <faultstring>endpoint unavailable</faultstring>
          </soap:Fault></soap:Body></soap:Envelope>"#;

        let response = SoapResponse::parse(xml).unwrap();
        assert_eq!(response.fault(), Some("endpoint unavailable"));
    }

    #[test]
    fn test_envelope_wraps_body() {
        let envelope = SoapClient::envelope("<Ping/>");
        assert!(envelope.starts_with("<?xml"));
        assert!(envelope.contains("<soapenv:Body><Ping/></soapenv:Body>"));
    }

    #[test]
    fn test_escape_for_operation_bodies() {
        assert_eq!(escape("a<b&c"), "a&lt;b&amp;c");
    }

    #[tokio::test]
    async fn test_call_round_trip() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("SOAPAction", "VerifyTransaction"))
            .respond_with(ResponseTemplate::new(200).set_body_string(VERIFY_RESPONSE))
            .mount(&server)
            .await;

        let soap = SoapClient::new();
        let response = soap
            .call(&server.uri(), "VerifyTransaction", "<VerifyTransaction/>")
            .await
            .unwrap();

        assert_eq!(response.int("VerifyTransactionResult"), Some(150000));
    }

    #[tokio::test]
    async fn test_call_surfaces_fault_over_200() {
        let server = MockServer::start().await;
        let fault = r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/">
          <soap:Body><soap:Fault><faultstring>bad request</faultstring></soap:Fault></soap:Body>
        </soap:Envelope>"#;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string(fault))
            .mount(&server)
            .await;

        let soap = SoapClient::new();
        let err = soap.call(&server.uri(), "Ping", "<Ping/>").await.unwrap_err();
        assert!(err.to_string().contains("bad request"));
    }
}
