//! # Invoice
//!
//! The payment request under construction: amount, free-form details and a
//! process-unique number, plus the gateway transaction id once a purchase
//! succeeds.

use crate::error::{PaymentError, PaymentResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use uuid::Uuid;

/// A single payment attempt.
///
/// Created by the caller, handed to a driver at construction time, and
/// scoped to one purchase/verify round trip. The amount unit is whatever the
/// caller's books use; adapters convert to their gateway's subunit before
/// transmission.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Invoice {
    /// Process-unique invoice number, sent to gateways as the order id
    uuid: Uuid,

    /// Payment amount; only ever set through [`set_amount`](Invoice::set_amount)
    amount: i64,

    /// Gateway-specific fields (phone, email, description, ...) not modeled
    /// as first-class attributes because each gateway accepts a different
    /// subset
    #[serde(default)]
    details: HashMap<String, Value>,

    /// Gateway-issued id correlating purchase and verification, set by the
    /// adapter after a successful purchase call
    #[serde(skip_serializing_if = "Option::is_none")]
    transaction_id: Option<String>,
}

impl Invoice {
    /// Create a new invoice with a generated number and no amount.
    pub fn new() -> Self {
        Self {
            uuid: Uuid::new_v4(),
            amount: 0,
            details: HashMap::new(),
            transaction_id: None,
        }
    }

    /// The invoice number.
    pub fn uuid(&self) -> Uuid {
        self.uuid
    }

    /// The current amount. Zero until [`set_amount`](Invoice::set_amount)
    /// has been called.
    pub fn amount(&self) -> i64 {
        self.amount
    }

    /// Set the payment amount. Rejects anything that is not strictly
    /// positive.
    pub fn set_amount(&mut self, amount: i64) -> PaymentResult<()> {
        if amount <= 0 {
            return Err(PaymentError::InvalidAmount(amount));
        }
        self.amount = amount;
        Ok(())
    }

    /// Set one detail. Overwrites on key collision.
    pub fn detail(&mut self, key: impl Into<String>, value: impl Into<Value>) -> &mut Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Merge a batch of details; entries from a later call win.
    pub fn add_details(&mut self, entries: impl IntoIterator<Item = (String, Value)>) {
        self.details.extend(entries);
    }

    /// All details.
    pub fn details(&self) -> &HashMap<String, Value> {
        &self.details
    }

    /// A single detail as a string, if present and a string.
    pub fn detail_str(&self, key: &str) -> Option<&str> {
        self.details.get(key).and_then(Value::as_str)
    }

    /// First non-empty string detail among `keys`, in order.
    ///
    /// This is the per-field fallback policy shared by all adapters
    /// (`phone` falls back to `mobile`, `mail` to `email`, and so on).
    pub fn first_detail(&self, keys: &[&str]) -> Option<&str> {
        keys.iter()
            .filter_map(|key| self.detail_str(key))
            .find(|value| !value.is_empty())
    }

    /// The gateway transaction id, once purchase has succeeded.
    pub fn transaction_id(&self) -> Option<&str> {
        self.transaction_id.as_deref()
    }

    /// Record the gateway transaction id. Called by adapters exactly once
    /// per purchase attempt, after the gateway accepted the invoice.
    pub fn set_transaction_id(&mut self, id: impl Into<String>) {
        self.transaction_id = Some(id.into());
    }
}

impl Default for Invoice {
    fn default() -> Self {
        Self::new()
    }
}
