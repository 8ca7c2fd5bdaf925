//! # multipay-idpay
//!
//! Idpay gateway driver for multipay (REST/JSON).
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use multipay_core::{Driver, Invoice};
//! use multipay_idpay::{Idpay, IdpayConfig};
//!
//! let mut invoice = Invoice::new();
//! invoice.set_amount(150_000)?;
//!
//! let mut driver = Idpay::new(invoice, IdpayConfig::from_env()?);
//! driver.purchase().await?;
//! let form = driver.pay()?;   // redirect the user to form.action()
//! ```

pub mod config;
pub mod driver;

// Re-exports
pub use config::IdpayConfig;
pub use driver::Idpay;
