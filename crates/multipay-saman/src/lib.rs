//! # multipay-saman
//!
//! Saman gateway drivers for multipay.
//!
//! Two integration flavors share one verification path:
//!
//! 1. **Saman** - classic token web service
//!    - Token request over SOAP (`RequestToken`)
//!    - Best for: terminals provisioned on the legacy web service
//!
//! 2. **SamanOnlinePg** - OnlinePG token flow
//!    - Token request over REST (`action=token`)
//!    - Best for: terminals provisioned on OnlinePG
//!
//! Both POST the token to the payment page and verify the callback's
//! reference number over the SOAP reference-payment service. Amounts are
//! converted toman→rial inside the drivers.

pub mod config;
pub mod online_pg;
mod verify;
pub mod web_service;

// Re-exports
pub use config::{SamanConfig, SamanOnlinePgConfig};
pub use online_pg::SamanOnlinePg;
pub use web_service::Saman;
