//! # Driver Trait
//!
//! The three-phase protocol every gateway adapter exposes:
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                       Driver (trait)                        │
//! │  ├── purchase()   register invoice, get a transaction id    │
//! │  ├── pay()        build the redirection, no network I/O     │
//! │  └── verify()     confirm via callback params, get Receipt  │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!          ┌─────────────────┼──────────────────┐
//!          │                 │                  │
//!       Idpay        Saman / SamanOnlinePg   Sepordeh, Zarinpal, ...
//! ```
//!
//! Purchase and verify run in two different web requests, separated by the
//! end user's trip through the gateway. No adapter field set during
//! `purchase()` survives into `verify()`; anything verification needs must
//! arrive through [`CallbackParams`] or the invoice's stored transaction id.

use crate::callback::CallbackParams;
use crate::error::PaymentResult;
use crate::invoice::Invoice;
use crate::receipt::Receipt;
use crate::redirection::RedirectionForm;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

/// One gateway adapter bound to one invoice for one payment attempt.
///
/// The logical lifecycle is linear and single-shot:
/// `CREATED → purchase → PURCHASED → pay → REDIRECTED → verify → VERIFIED`,
/// with purchase and verification failures both terminal. Retrying means a
/// fresh Invoice/Driver pair.
#[async_trait]
pub trait Driver: Send + Sync {
    /// The bound invoice.
    fn invoice(&self) -> &Invoice;

    /// Mutable access to the bound invoice.
    fn invoice_mut(&mut self) -> &mut Invoice;

    /// Gateway name, used for receipts, logging and registry routing.
    fn gateway_name(&self) -> &'static str;

    /// Set the payment amount. Fails on non-positive values, before any
    /// network call is attempted.
    fn amount(&mut self, amount: i64) -> PaymentResult<()> {
        self.invoice_mut().set_amount(amount)
    }

    /// Set one invoice detail; overwrites on key collision.
    fn detail(&mut self, key: &str, value: Value) {
        self.invoice_mut().detail(key, value);
    }

    /// Merge a batch of invoice details; a later call wins on collisions.
    fn add_details(&mut self, entries: HashMap<String, Value>) {
        self.invoice_mut().add_details(entries);
    }

    /// Register the invoice with the remote gateway.
    ///
    /// On success the returned transaction id has also been stored on the
    /// invoice. On failure the invoice is left untouched and the error is
    /// [`PaymentError::PurchaseFailed`](crate::PaymentError::PurchaseFailed)
    /// (gateway rejection) or a generic transport error.
    async fn purchase(&mut self) -> PaymentResult<String>;

    /// Build the redirection the caller must present to the end user.
    ///
    /// Pure view construction over invoice and settings state: no network
    /// I/O, deterministic for unchanged state. Requires a prior successful
    /// [`purchase`](Driver::purchase).
    fn pay(&self) -> PaymentResult<RedirectionForm>;

    /// Confirm with the gateway that the transaction completed.
    ///
    /// Runs in the callback request; gateway-supplied parameters arrive via
    /// `callback`, not via adapter memory. Fails with
    /// [`PaymentError::InvalidPayment`](crate::PaymentError::InvalidPayment)
    /// when the gateway reports anything but success.
    async fn verify(&self, callback: &CallbackParams) -> PaymentResult<Receipt>;
}

/// Boxed driver for dynamic dispatch.
pub type BoxedDriver = Box<dyn Driver>;

/// Factory producing a fresh driver for one invoice.
pub type DriverFactory = Box<dyn Fn(Invoice) -> BoxedDriver + Send + Sync>;

/// Configuration-driven driver selection.
///
/// Each gateway registers a factory rather than an instance because a driver
/// binds exactly one invoice for exactly one attempt; there is nothing
/// reusable to share between attempts.
pub struct DriverRegistry {
    factories: HashMap<String, DriverFactory>,
    default_gateway: String,
}

impl DriverRegistry {
    /// Create a registry with a default gateway name.
    pub fn new(default_gateway: impl Into<String>) -> Self {
        Self {
            factories: HashMap::new(),
            default_gateway: default_gateway.into(),
        }
    }

    /// Register a gateway factory.
    pub fn register<F>(&mut self, gateway: impl Into<String>, factory: F)
    where
        F: Fn(Invoice) -> BoxedDriver + Send + Sync + 'static,
    {
        self.factories.insert(gateway.into(), Box::new(factory));
    }

    /// Register with builder pattern.
    pub fn with_gateway<F>(mut self, gateway: impl Into<String>, factory: F) -> Self
    where
        F: Fn(Invoice) -> BoxedDriver + Send + Sync + 'static,
    {
        self.register(gateway, factory);
        self
    }

    /// Build a driver for the named gateway.
    pub fn create(&self, gateway: &str, invoice: Invoice) -> Option<BoxedDriver> {
        self.factories.get(gateway).map(|factory| factory(invoice))
    }

    /// Build a driver for the configured default gateway.
    pub fn create_default(&self, invoice: Invoice) -> Option<BoxedDriver> {
        self.create(&self.default_gateway, invoice)
    }

    /// Build a driver for `gateway`, falling back to the default.
    pub fn create_or_default(&self, gateway: Option<&str>, invoice: Invoice) -> Option<BoxedDriver> {
        match gateway {
            Some(name) if self.factories.contains_key(name) => self.create(name, invoice),
            _ => self.create_default(invoice),
        }
    }

    /// List all registered gateways.
    pub fn gateways(&self) -> Vec<&str> {
        self.factories.keys().map(String::as_str).collect()
    }

    /// Check whether a gateway is registered.
    pub fn has_gateway(&self, gateway: &str) -> bool {
        self.factories.contains_key(gateway)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::PaymentError;

    struct NullDriver {
        invoice: Invoice,
    }

    #[async_trait]
    impl Driver for NullDriver {
        fn invoice(&self) -> &Invoice {
            &self.invoice
        }

        fn invoice_mut(&mut self) -> &mut Invoice {
            &mut self.invoice
        }

        fn gateway_name(&self) -> &'static str {
            "null"
        }

        async fn purchase(&mut self) -> PaymentResult<String> {
            self.invoice.set_transaction_id("N-1");
            Ok("N-1".to_string())
        }

        fn pay(&self) -> PaymentResult<RedirectionForm> {
            let id = self
                .invoice
                .transaction_id()
                .ok_or(PaymentError::MissingTransactionId)?;
            Ok(RedirectionForm::get(format!("https://null.example/{id}")))
        }

        async fn verify(&self, _callback: &CallbackParams) -> PaymentResult<Receipt> {
            Ok(Receipt::new("null", "N-1"))
        }
    }

    #[test]
    fn test_amount_helper_rejects_non_positive() {
        let mut driver = NullDriver {
            invoice: Invoice::new(),
        };
        assert!(driver.amount(-1).is_err());
        assert!(driver.amount(100).is_ok());
        assert_eq!(driver.invoice().amount(), 100);
    }

    #[test]
    fn test_pay_requires_purchase_first() {
        let driver = NullDriver {
            invoice: Invoice::new(),
        };
        assert!(matches!(
            driver.pay(),
            Err(PaymentError::MissingTransactionId)
        ));
    }

    #[test]
    fn test_registry_routes_by_name() {
        let registry = DriverRegistry::new("null").with_gateway("null", |invoice| {
            Box::new(NullDriver { invoice }) as BoxedDriver
        });

        assert!(registry.has_gateway("null"));
        assert!(!registry.has_gateway("zibal"));

        let driver = registry.create("null", Invoice::new()).unwrap();
        assert_eq!(driver.gateway_name(), "null");

        assert!(registry.create("zibal", Invoice::new()).is_none());
        assert!(registry
            .create_or_default(Some("zibal"), Invoice::new())
            .is_some());
    }
}
