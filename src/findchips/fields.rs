//! Sentinel defaults for every extracted offer field.
//!
//! Extraction never fails on a missing node or attribute: each field is
//! looked up as an `Option` and resolved here against its declared default.
//! Keeping the table in one place makes the tolerant-extraction contract easy
//! to audit.

use tracing::trace;

/// Placeholder for any text field that could not be extracted.
pub const NOT_AVAILABLE: &str = "N/A";

/// Currency assumed when a price carries no currency attribute.
pub const DEFAULT_CURRENCY: &str = "$";

/// An extracted field and the value substituted when it is missing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldRule {
    pub name: &'static str,
    pub default: &'static str,
}

impl FieldRule {
    const fn new(name: &'static str, default: &'static str) -> Self {
        Self { name, default }
    }

    /// Resolves a looked-up value, trimming it or falling back to the default.
    pub fn resolve(&self, found: Option<String>) -> String {
        match found {
            Some(value) => {
                let value = value.trim().to_string();
                trace!("  - {}: '{}'", self.name, value);
                value
            }
            None => {
                trace!("  - {} not found, using '{}'", self.name, self.default);
                self.default.to_string()
            }
        }
    }
}

pub const SELLER: FieldRule = FieldRule::new("seller", NOT_AVAILABLE);
pub const MOQ: FieldRule = FieldRule::new("moq", NOT_AVAILABLE);
pub const QUANTITY: FieldRule = FieldRule::new("quantity", NOT_AVAILABLE);
pub const UNIT_PRICE: FieldRule = FieldRule::new("unit_price", NOT_AVAILABLE);
pub const CURRENCY: FieldRule = FieldRule::new("currency", DEFAULT_CURRENCY);

/// Offer links resolve to an empty string rather than a placeholder.
pub const OFFER_URL: FieldRule = FieldRule::new("offer_url", "");

/// The site never exposes a standard package quantity.
pub const SPQ: FieldRule = FieldRule::new("spq", NOT_AVAILABLE);
