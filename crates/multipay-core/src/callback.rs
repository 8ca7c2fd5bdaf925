//! # Callback Parameters
//!
//! Read-only accessor for the query/form parameters the gateway sends to the
//! callback URL. Verification runs in a separate request from purchase, so
//! these parameters are the only channel through which gateway-supplied data
//! (reference numbers, authority tokens, card masks) can reach `verify()`.

use crate::error::{PaymentError, PaymentResult};
use std::collections::HashMap;

/// Inbound callback parameters, decoded by the caller's web framework and
/// handed to `verify()` as-is.
#[derive(Debug, Clone, Default)]
pub struct CallbackParams {
    params: HashMap<String, String>,
}

impl CallbackParams {
    /// An empty parameter set (verification will rely on the invoice's
    /// stored transaction id alone).
    pub fn new() -> Self {
        Self::default()
    }

    /// Look up a parameter. Missing keys and empty values both read as
    /// absent, matching how gateways signal "not provided".
    pub fn input(&self, name: &str) -> Option<&str> {
        self.params
            .get(name)
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }

    /// Like [`input`](CallbackParams::input), but absence is an error.
    pub fn require(&self, name: &str) -> PaymentResult<&str> {
        self.input(name)
            .ok_or_else(|| PaymentError::MissingCallbackParam(name.to_string()))
    }

    /// Add one parameter.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.params.insert(name.into(), value.into());
        self
    }
}

impl From<HashMap<String, String>> for CallbackParams {
    fn from(params: HashMap<String, String>) -> Self {
        Self { params }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for CallbackParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            params: iter
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_treats_empty_as_absent() {
        let params: CallbackParams =
            [("RefNum", "ABC123"), ("SecurePan", "")].into_iter().collect();

        assert_eq!(params.input("RefNum"), Some("ABC123"));
        assert_eq!(params.input("SecurePan"), None);
        assert_eq!(params.input("TraceNo"), None);
    }

    #[test]
    fn test_require_reports_the_missing_name() {
        let params = CallbackParams::new();
        let err = params.require("Authority").unwrap_err();
        assert!(matches!(
            err,
            PaymentError::MissingCallbackParam(name) if name == "Authority"
        ));
    }
}
