//! Data models for export requests and distributor offers.

use crate::findchips::fields::{DEFAULT_CURRENCY, NOT_AVAILABLE};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};

/// A queued request to export offers for one part number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRequest {
    /// Manufacturer part number as submitted by the caller
    pub part_number: String,
}

impl ExportRequest {
    /// Creates a new export request.
    pub fn new(part_number: impl Into<String>) -> Self {
        Self { part_number: part_number.into() }
    }

    /// Decodes a queue message body (`{"partNumber": "..."}`).
    pub fn from_json(body: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(body)
    }

    /// Encodes the request as a queue message body.
    pub fn to_json(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}

/// Row-level fields shared by every price break of one distributor listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub distributor_name: String,
    pub seller_name: String,
    pub moq: String,
    pub spq: String,
    pub offer_url: String,
}

/// One quantity tier and its unit price.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceBreak {
    pub quantity: String,
    pub unit_price: String,
    pub currency: String,
}

impl PriceBreak {
    /// Placeholder used when a listing has no price list at all.
    pub fn unavailable() -> Self {
        Self {
            quantity: NOT_AVAILABLE.to_string(),
            unit_price: NOT_AVAILABLE.to_string(),
            currency: DEFAULT_CURRENCY.to_string(),
        }
    }
}

/// One price-break line for one distributor/seller pairing of a part.
///
/// Fields are read-only once constructed; filtering moves whole offers around
/// but never edits them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Offer {
    distributor_name: String,
    seller_name: String,
    moq: String,
    spq: String,
    quantity: String,
    unit_price: String,
    currency: String,
    offer_url: String,
    timestamp: DateTime<Local>,
}

impl Offer {
    /// Builds an offer from its listing and price break, stamped with the current time.
    pub fn new(listing: &Listing, price: PriceBreak) -> Self {
        Self::captured_at(listing, price, Local::now())
    }

    /// Builds an offer with an explicit capture time.
    pub fn captured_at(listing: &Listing, price: PriceBreak, timestamp: DateTime<Local>) -> Self {
        Self {
            distributor_name: listing.distributor_name.clone(),
            seller_name: listing.seller_name.clone(),
            moq: listing.moq.clone(),
            spq: listing.spq.clone(),
            quantity: price.quantity,
            unit_price: price.unit_price,
            currency: price.currency,
            offer_url: listing.offer_url.clone(),
            timestamp,
        }
    }

    pub fn distributor_name(&self) -> &str {
        &self.distributor_name
    }

    pub fn seller_name(&self) -> &str {
        &self.seller_name
    }

    /// Minimum order quantity.
    pub fn moq(&self) -> &str {
        &self.moq
    }

    /// Standard package quantity.
    pub fn spq(&self) -> &str {
        &self.spq
    }

    /// Price-break quantity label, e.g. `100+`.
    pub fn quantity(&self) -> &str {
        &self.quantity
    }

    pub fn unit_price(&self) -> &str {
        &self.unit_price
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn offer_url(&self) -> &str {
        &self.offer_url
    }

    pub fn timestamp(&self) -> DateTime<Local> {
        self.timestamp
    }

    /// Returns true if this offer carries no price information.
    pub fn is_unpriced(&self) -> bool {
        self.unit_price == NOT_AVAILABLE
    }
}

impl std::fmt::Display for Offer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} via {} (MOQ {}): {} @ {} {}",
            self.distributor_name,
            self.seller_name,
            self.moq,
            self.quantity,
            self.unit_price,
            self.currency
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_listing() -> Listing {
        Listing {
            distributor_name: "Digi-Key".to_string(),
            seller_name: "Texas Instruments".to_string(),
            moq: "1".to_string(),
            spq: NOT_AVAILABLE.to_string(),
            offer_url: "https://www.findchips.com/offer/abc".to_string(),
        }
    }

    #[test]
    fn test_export_request_wire_format() {
        let request = ExportRequest::from_json(br#"{"partNumber": "LM358N"}"#).unwrap();
        assert_eq!(request.part_number, "LM358N");

        let body = String::from_utf8(request.to_json().unwrap()).unwrap();
        assert_eq!(body, r#"{"partNumber":"LM358N"}"#);
    }

    #[test]
    fn test_export_request_rejects_wrong_shape() {
        assert!(ExportRequest::from_json(br#"{"part_number": "LM358N"}"#).is_err());
        assert!(ExportRequest::from_json(b"not json").is_err());
    }

    #[test]
    fn test_offer_shares_listing_fields() {
        let listing = make_listing();
        let offer = Offer::new(
            &listing,
            PriceBreak {
                quantity: "100+".to_string(),
                unit_price: "0.21".to_string(),
                currency: "USD".to_string(),
            },
        );

        assert_eq!(offer.distributor_name(), "Digi-Key");
        assert_eq!(offer.seller_name(), "Texas Instruments");
        assert_eq!(offer.moq(), "1");
        assert_eq!(offer.spq(), "N/A");
        assert_eq!(offer.quantity(), "100+");
        assert_eq!(offer.unit_price(), "0.21");
        assert_eq!(offer.currency(), "USD");
        assert_eq!(offer.offer_url(), "https://www.findchips.com/offer/abc");
        assert!(!offer.is_unpriced());
    }

    #[test]
    fn test_unavailable_price_break() {
        let offer = Offer::new(&make_listing(), PriceBreak::unavailable());
        assert_eq!(offer.quantity(), "N/A");
        assert_eq!(offer.unit_price(), "N/A");
        assert_eq!(offer.currency(), "$");
        assert!(offer.is_unpriced());
    }

    #[test]
    fn test_offer_display() {
        let offer = Offer::new(&make_listing(), PriceBreak::unavailable());
        assert_eq!(offer.to_string(), "Digi-Key via Texas Instruments (MOQ 1): N/A @ N/A $");
    }

    #[test]
    fn test_offer_serializes_fields() {
        let offer = Offer::new(&make_listing(), PriceBreak::unavailable());
        let json = serde_json::to_string(&offer).unwrap();
        assert!(json.contains("\"distributor_name\":\"Digi-Key\""));
        assert!(json.contains("\"timestamp\""));
    }
}
