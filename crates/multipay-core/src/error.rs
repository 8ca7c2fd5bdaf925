//! # Payment Error Types
//!
//! Typed error handling for the multipay drivers.
//! All payment operations return `Result<T, PaymentError>`.

use thiserror::Error;

/// Core error type for all payment operations.
///
/// Exactly two variants are gateway rejections carrying a translated
/// message and, when the gateway supplied one, the raw status code:
/// [`PurchaseFailed`](PaymentError::PurchaseFailed) out of `purchase()` and
/// [`InvalidPayment`](PaymentError::InvalidPayment) out of `verify()`.
/// Everything else is a generic failure of the surrounding machinery.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The gateway refused to register the invoice, or the purchase
    /// call produced no usable transaction id
    #[error("purchase failed: {message}")]
    PurchaseFailed {
        message: String,
        status: Option<i64>,
    },

    /// The gateway reported the transaction as not completed during
    /// verification
    #[error("payment not verified: {message}")]
    InvalidPayment {
        message: String,
        status: Option<i64>,
    },

    /// Amount failed the positivity constraint
    #[error("invalid amount: {0} (must be a positive value)")]
    InvalidAmount(i64),

    /// Configuration errors (missing keys, empty merchant id, ...)
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Network/HTTP error communicating with the gateway
    #[error("network error: {0}")]
    Network(String),

    /// Response body did not match the gateway's documented shape
    #[error("unexpected gateway response: {0}")]
    UnexpectedResponse(String),

    /// `pay()` or `verify()` needed a transaction id that no successful
    /// `purchase()` has produced
    #[error("invoice has no transaction id; purchase() must succeed first")]
    MissingTransactionId,

    /// A callback parameter required for verification was absent
    #[error("missing callback parameter: {0}")]
    MissingCallbackParam(String),
}

impl PaymentError {
    /// Build a purchase rejection from a gateway message and optional code.
    pub fn purchase_failed(message: impl Into<String>, status: Option<i64>) -> Self {
        PaymentError::PurchaseFailed {
            message: message.into(),
            status,
        }
    }

    /// Build a verification rejection from a gateway message and optional code.
    pub fn invalid_payment(message: impl Into<String>, status: Option<i64>) -> Self {
        PaymentError::InvalidPayment {
            message: message.into(),
            status,
        }
    }

    /// The raw gateway status code, for the two gateway-rejection kinds.
    pub fn gateway_status(&self) -> Option<i64> {
        match self {
            PaymentError::PurchaseFailed { status, .. }
            | PaymentError::InvalidPayment { status, .. } => *status,
            _ => None,
        }
    }

    /// Returns true when the gateway itself rejected the transaction,
    /// as opposed to a transport or configuration failure.
    pub fn is_gateway_rejection(&self) -> bool {
        matches!(
            self,
            PaymentError::PurchaseFailed { .. } | PaymentError::InvalidPayment { .. }
        )
    }
}

/// Result type alias for payment operations
pub type PaymentResult<T> = Result<T, PaymentError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_gateway_status() {
        let err = PaymentError::purchase_failed("ip not allowed", Some(-18));
        assert_eq!(err.gateway_status(), Some(-18));
        assert!(err.is_gateway_rejection());

        let err = PaymentError::invalid_payment("already verified", Some(101));
        assert_eq!(err.gateway_status(), Some(101));

        assert_eq!(PaymentError::Network("timeout".into()).gateway_status(), None);
        assert!(!PaymentError::MissingTransactionId.is_gateway_rejection());
    }

    #[test]
    fn test_display_carries_message() {
        let err = PaymentError::purchase_failed("merchant blocked", None);
        assert!(err.to_string().contains("merchant blocked"));
    }
}
