//! # multipay-core
//!
//! Core types and traits for the multipay gateway adapters.
//!
//! This crate provides:
//! - `Driver` trait for implementing gateway adapters
//! - `Invoice`, `Receipt`, and `RedirectionForm` for the shared data model
//! - `CallbackParams` for read-only access to gateway callback parameters
//! - `StatusMap` for per-gateway status-code translation with fallback
//! - `PaymentError` for typed error handling
//!
//! ## Example
//!
//! ```rust,ignore
//! use multipay_core::{CallbackParams, Driver, Invoice};
//! use multipay_idpay::{Idpay, IdpayConfig};
//!
//! // First request: register the invoice and redirect the user.
//! let mut invoice = Invoice::new();
//! invoice.set_amount(150_000)?;
//! invoice.detail("mobile", "09123456789");
//!
//! let mut driver = Idpay::new(invoice, IdpayConfig::from_env()?);
//! driver.purchase().await?;
//! let form = driver.pay()?;            // render form.action() / form.render()
//!
//! // Second request: the gateway calls back; confirm the transaction.
//! let callback: CallbackParams = query_pairs.into_iter().collect();
//! let receipt = driver.verify(&callback).await?;
//! println!("confirmed: {}", receipt.reference_id());
//! ```

pub mod callback;
pub mod driver;
pub mod error;
pub mod invoice;
pub mod receipt;
pub mod redirection;
pub mod status;

// Re-exports for convenience
pub use callback::CallbackParams;
pub use driver::{BoxedDriver, Driver, DriverFactory, DriverRegistry};
pub use error::{PaymentError, PaymentResult};
pub use invoice::Invoice;
pub use receipt::Receipt;
pub use redirection::{HttpMethod, RedirectionForm};
pub use status::StatusMap;
