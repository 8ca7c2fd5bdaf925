//! # multipay-sepordeh
//!
//! Sepordeh gateway driver for multipay (REST/form-encoded).
//!
//! Supports both the hosted invoice page and the direct-pay page; select
//! with [`PaymentMode`] on the config.

pub mod config;
pub mod driver;

// Re-exports
pub use config::{PaymentMode, SepordehConfig};
pub use driver::Sepordeh;
