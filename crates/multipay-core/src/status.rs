//! # Status Translation
//!
//! Every gateway speaks its own status-code vocabulary. Adapters keep one
//! static code→message table per phase (purchase / verification) and use it
//! for exactly one thing: enriching the error they raise. Lookup never
//! affects control flow beyond the adapter's own success/failure decision.

/// A static status-code translation table with a fixed fallback message.
///
/// Duplicate codes are legal; the **last** entry for a code wins. (Upstream
/// gateway documentation occasionally repeats a code with amended wording;
/// scanning in reverse makes the resolution deterministic.)
#[derive(Debug, Clone, Copy)]
pub struct StatusMap {
    entries: &'static [(i64, &'static str)],
    fallback: &'static str,
}

impl StatusMap {
    pub const fn new(entries: &'static [(i64, &'static str)], fallback: &'static str) -> Self {
        Self { entries, fallback }
    }

    /// Translate a status code, falling back for unknown codes.
    pub fn message(&self, code: i64) -> &'static str {
        self.entries
            .iter()
            .rev()
            .find(|(known, _)| *known == code)
            .map(|(_, message)| *message)
            .unwrap_or(self.fallback)
    }

    /// The fixed message for unrecognized codes.
    pub const fn fallback(&self) -> &'static str {
        self.fallback
    }
}
