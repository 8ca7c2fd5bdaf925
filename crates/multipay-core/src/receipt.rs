//! # Receipt
//!
//! Proof of a confirmed transaction. A `Receipt` only ever exists as the
//! return value of a successful `verify()`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

/// The outcome of a successful verification.
///
/// `reference_id` is the gateway-confirmed identifier and the only value a
/// reconciliation system should trust. Extra gateway-returned fields (trace
/// number, RRN, masked card number, ...) live in the detail map, populated
/// by the adapter right after construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    gateway: String,
    reference_id: String,
    date: DateTime<Utc>,
    #[serde(default)]
    details: HashMap<String, Value>,
}

impl Receipt {
    /// Create a receipt for the given gateway and confirmed reference.
    pub fn new(gateway: impl Into<String>, reference_id: impl Into<String>) -> Self {
        Self {
            gateway: gateway.into(),
            reference_id: reference_id.into(),
            date: Utc::now(),
            details: HashMap::new(),
        }
    }

    /// Builder: attach one gateway-returned detail.
    pub fn with_detail(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.details.insert(key.into(), value.into());
        self
    }

    /// Name of the adapter that produced this receipt.
    pub fn gateway(&self) -> &str {
        &self.gateway
    }

    /// The gateway-confirmed reference id.
    pub fn reference_id(&self) -> &str {
        &self.reference_id
    }

    /// When verification completed.
    pub fn date(&self) -> DateTime<Utc> {
        self.date
    }

    /// Extra gateway-returned fields.
    pub fn details(&self) -> &HashMap<String, Value> {
        &self.details
    }

    /// A single detail as a string, if present and a string.
    pub fn detail_str(&self, key: &str) -> Option<&str> {
        self.details.get(key).and_then(Value::as_str)
    }
}
