//! HTML parser for FindChips search result pages.

use crate::findchips::fields;
use crate::findchips::models::{Listing, Offer, PriceBreak};
use crate::findchips::selectors::{errors, price_break, rows};
use scraper::{ElementRef, Html};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

/// Markup that cannot be turned into a usable document.
///
/// A well-formed page without any distributor rows is *not* an error.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("response body is empty")]
    EmptyDocument,

    #[error("response body does not contain any markup")]
    NotMarkup,

    #[error("challenge page detected ({0}); FindChips is blocking requests")]
    Blocked(String),
}

/// Parser for FindChips search result pages.
pub struct Parser {
    origin: Option<Url>,
}

impl Parser {
    /// Creates a parser that resolves relative offer links against `origin`.
    pub fn new(origin: &str) -> Self {
        let origin = match Url::parse(origin) {
            Ok(url) => Some(url),
            Err(e) => {
                warn!("Invalid origin '{}': {}. Relative offer links will be dropped.", origin, e);
                None
            }
        };

        Self { origin }
    }

    /// Parses raw markup into a document, rejecting bodies that are not usable pages.
    pub fn parse_document(&self, html: &str) -> Result<Html, ParseError> {
        if html.trim().is_empty() {
            return Err(ParseError::EmptyDocument);
        }

        if !html.contains('<') {
            return Err(ParseError::NotMarkup);
        }

        let document = Html::parse_document(html);

        if let Some(challenge) = document.select(&errors::CHALLENGE).next() {
            return Err(ParseError::Blocked(challenge.value().name().to_string()));
        }

        Ok(document)
    }

    /// Selects every distributor row, in document order.
    pub fn locate_rows<'a>(&self, document: &'a Html) -> Vec<ElementRef<'a>> {
        let found: Vec<_> = document.select(&rows::ROW).collect();

        if found.is_empty() {
            info!("No distributor rows found; check the row selector against a page snapshot");
        } else {
            info!("Found {} potential distributor rows", found.len());
        }

        found
    }

    /// Extracts offers from every row, preserving row and price-break order.
    pub fn extract_all(&self, found: &[ElementRef]) -> Vec<Offer> {
        let offers: Vec<Offer> = found.iter().flat_map(|row| self.extract_offers(*row)).collect();
        info!("Extracted {} raw offers from {} rows", offers.len(), found.len());
        offers
    }

    /// Parses a whole page into raw offers.
    pub fn parse_offers(&self, html: &str) -> Result<Vec<Offer>, ParseError> {
        let document = self.parse_document(html)?;
        let found = self.locate_rows(&document);
        Ok(self.extract_all(&found))
    }

    /// Extracts the offers of a single distributor row.
    ///
    /// Returns no offers for a row without a distributor name, one sentinel
    /// offer for a row without a price list, and one offer per price break
    /// otherwise.
    pub fn extract_offers(&self, row: ElementRef) -> Vec<Offer> {
        let distributor_name =
            row.value().attr(rows::DISTRIBUTOR_ATTR).map(str::trim).unwrap_or_default();

        if distributor_name.is_empty() {
            debug!("Skipping row without distributor name");
            return Vec::new();
        }

        debug!("Processing row for distributor: {}", distributor_name);

        let listing = Listing {
            distributor_name: distributor_name.to_string(),
            seller_name: fields::SELLER.resolve(first_text(row, &rows::SELLER)),
            moq: fields::MOQ.resolve(first_text(row, &rows::MOQ)),
            spq: fields::SPQ.resolve(None),
            offer_url: fields::OFFER_URL.resolve(self.offer_url(row)),
        };

        let entries: Vec<_> = row.select(&rows::PRICE_BREAKS).collect();

        if entries.is_empty() {
            warn!(
                "No price list found for distributor {}. Row snippet: {}",
                listing.distributor_name,
                snippet(&row.html(), 500)
            );
            return vec![Offer::new(&listing, PriceBreak::unavailable())];
        }

        debug!("  - {} price list items for {}", entries.len(), listing.distributor_name);

        entries
            .into_iter()
            .filter(|entry| {
                let see_more = is_see_more(*entry);
                if see_more {
                    debug!("  - Skipping 'See More' entry for {}", listing.distributor_name);
                }
                !see_more
            })
            .map(|entry| Offer::new(&listing, self.price_break(entry)))
            .collect()
    }

    /// Reads quantity, unit price and currency from one price-break entry.
    fn price_break(&self, entry: ElementRef) -> PriceBreak {
        let price = entry.select(&price_break::PRICE).next();

        PriceBreak {
            quantity: fields::QUANTITY.resolve(first_text(entry, &price_break::QUANTITY)),
            unit_price: fields::UNIT_PRICE
                .resolve(price.and_then(|p| p.value().attr(price_break::PRICE_ATTR)).map(String::from)),
            currency: fields::CURRENCY
                .resolve(price.and_then(|p| p.value().attr(price_break::CURRENCY_ATTR)).map(String::from)),
        }
    }

    /// Reads the buy-button link of a row and makes it absolute.
    fn offer_url(&self, row: ElementRef) -> Option<String> {
        let href = row.select(&rows::OFFER_LINK).next()?.value().attr("href")?.trim();
        Some(self.absolutize(href))
    }

    /// Resolves `href` against the site origin.
    ///
    /// Absolute links are returned untouched; links that cannot be resolved
    /// become an empty string.
    pub fn absolutize(&self, href: &str) -> String {
        let href = href.trim();
        if href.is_empty() || Url::parse(href).is_ok() {
            return href.to_string();
        }

        let resolved = self.origin.as_ref().map(|origin| origin.join(href));
        match resolved {
            Some(Ok(url)) => {
                debug!("  - Converted relative URL to absolute: '{}'", url);
                url.to_string()
            }
            Some(Err(e)) => {
                warn!("Could not create absolute URL from '{}': {}", href, e);
                String::new()
            }
            None => String::new(),
        }
    }
}

/// Whitespace-normalized text of the first match of `selector` under `parent`.
fn first_text(parent: ElementRef, selector: &scraper::Selector) -> Option<String> {
    parent
        .select(selector)
        .next()
        .map(|e| e.text().flat_map(str::split_whitespace).collect::<Vec<_>>().join(" "))
}

/// Returns true if the entry is the "See More" expander rather than a price break.
fn is_see_more(entry: ElementRef) -> bool {
    entry.select(&price_break::CONTROL).any(|control| {
        control.text().collect::<String>().to_lowercase().contains(price_break::SEE_MORE_TEXT)
    })
}

fn snippet(html: &str, max_chars: usize) -> String {
    html.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ORIGIN: &str = "https://www.findchips.com";

    fn parser() -> Parser {
        Parser::new(ORIGIN)
    }

    fn page(rows: &str) -> String {
        format!("<html><body><table><tbody>{}</tbody></table></body></html>", rows)
    }

    fn price_entry(quantity: &str, price: &str, currency: &str) -> String {
        format!(
            r#"<li><span class="label">{}</span><span class="value" data-baseprice="{}" data-basecurrency="{}">{}{}</span></li>"#,
            quantity, price, currency, currency, price
        )
    }

    fn full_row(distributor: &str, entries: &str) -> String {
        format!(
            r#"<tr class="row" data-distributor_name="{}">
                <td class="td-mfg"><span> Texas   Instruments </span></td>
                <td class="td-stock">Min Qty: 1</td>
                <td class="td-price"><ul class="price-list">{}</ul></td>
                <td class="td-buy"><a class="buy-button" href="/offer/{}">Buy</a></td>
            </tr>"#,
            distributor, entries, distributor
        )
    }

    // Absolute URL resolution

    #[test]
    fn test_absolutize_relative() {
        assert_eq!(parser().absolutize("/offer/abc"), "https://www.findchips.com/offer/abc");
    }

    #[test]
    fn test_absolutize_keeps_absolute() {
        assert_eq!(
            parser().absolutize("https://www.mouser.com/ProductDetail/595-LM358N"),
            "https://www.mouser.com/ProductDetail/595-LM358N"
        );
    }

    #[test]
    fn test_absolutize_unresolvable() {
        // Invalid port: neither absolute nor joinable
        assert_eq!(parser().absolutize("http://host:99999/offer"), "");
    }

    #[test]
    fn test_absolutize_without_valid_origin() {
        let parser = Parser::new("not a url");
        assert_eq!(parser.absolutize("/offer/abc"), "");
        assert_eq!(parser.absolutize("https://example.com/x"), "https://example.com/x");
    }

    #[test]
    fn test_absolutize_empty() {
        assert_eq!(parser().absolutize("   "), "");
    }

    // Document checks

    #[test]
    fn test_parse_document_empty() {
        assert_eq!(parser().parse_document("  \n ").unwrap_err(), ParseError::EmptyDocument);
    }

    #[test]
    fn test_parse_document_not_markup() {
        assert_eq!(parser().parse_document("Service Unavailable").unwrap_err(), ParseError::NotMarkup);
    }

    #[test]
    fn test_parse_document_challenge() {
        let html = r#"<html><body><form id="challenge-form" action="/cdn-cgi"></form></body></html>"#;
        let err = parser().parse_document(html).unwrap_err();
        assert!(matches!(err, ParseError::Blocked(_)));
        assert!(err.to_string().contains("blocking"));
    }

    #[test]
    fn test_no_rows_is_empty_not_error() {
        let html = "<html><body><p>No results for part XYZ</p></body></html>";
        let offers = parser().parse_offers(html).unwrap();
        assert!(offers.is_empty());
    }

    // Row extraction

    #[test]
    fn test_row_with_price_breaks() {
        let entries = [
            price_entry("1+", "0.45", "USD"),
            price_entry("100+", "0.32", "USD"),
            price_entry("1000+", "0.21", "USD"),
        ]
        .concat();
        let offers = parser().parse_offers(&page(&full_row("Digi-Key", &entries))).unwrap();

        assert_eq!(offers.len(), 3);
        assert_eq!(offers[0].quantity(), "1+");
        assert_eq!(offers[1].unit_price(), "0.32");
        assert_eq!(offers[2].quantity(), "1000+");
        for offer in &offers {
            assert_eq!(offer.distributor_name(), "Digi-Key");
            assert_eq!(offer.seller_name(), "Texas Instruments");
            assert_eq!(offer.moq(), "Min Qty: 1");
            assert_eq!(offer.spq(), "N/A");
            assert_eq!(offer.currency(), "USD");
            assert_eq!(offer.offer_url(), "https://www.findchips.com/offer/Digi-Key");
        }
    }

    #[test]
    fn test_see_more_entry_skipped() {
        let entries = format!(
            "{}{}<li><button class=\"btn\">See More</button></li>",
            price_entry("1+", "0.45", "USD"),
            price_entry("10+", "0.40", "USD")
        );
        let offers = parser().parse_offers(&page(&full_row("Mouser", &entries))).unwrap();
        assert_eq!(offers.len(), 2);
        assert!(offers.iter().all(|o| o.quantity() != "N/A"));
    }

    #[test]
    fn test_other_buttons_do_not_skip_entry() {
        let entries = r#"<li><span class="label">5+</span><button>Add</button></li>"#;
        let offers = parser().parse_offers(&page(&full_row("Arrow", entries))).unwrap();
        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].quantity(), "5+");
    }

    #[test]
    fn test_row_without_price_list_yields_sentinel_offer() {
        let row = r#"<tr class="row" data-distributor_name="Newark">
            <td class="td-mfg"><span>onsemi</span></td>
        </tr>"#;
        let offers = parser().parse_offers(&page(row)).unwrap();

        assert_eq!(offers.len(), 1);
        let offer = &offers[0];
        assert_eq!(offer.distributor_name(), "Newark");
        assert_eq!(offer.seller_name(), "onsemi");
        assert_eq!(offer.moq(), "N/A");
        assert_eq!(offer.quantity(), "N/A");
        assert_eq!(offer.unit_price(), "N/A");
        assert_eq!(offer.currency(), "$");
        assert_eq!(offer.offer_url(), "");
    }

    #[test]
    fn test_empty_price_list_yields_sentinel_offer() {
        let offers = parser().parse_offers(&page(&full_row("Farnell", ""))).unwrap();
        assert_eq!(offers.len(), 1);
        assert!(offers[0].is_unpriced());
    }

    #[test]
    fn test_price_entry_missing_attributes() {
        let entries = r#"<li><span class="label">25+</span><span class="value">0.10</span></li><li>odd</li>"#;
        let offers = parser().parse_offers(&page(&full_row("Rochester", entries))).unwrap();

        assert_eq!(offers.len(), 2);
        assert_eq!(offers[0].quantity(), "25+");
        assert_eq!(offers[0].unit_price(), "N/A");
        assert_eq!(offers[0].currency(), "$");
        assert_eq!(offers[1].quantity(), "N/A");
        assert_eq!(offers[1].unit_price(), "N/A");
    }

    #[test]
    fn test_rows_without_distributor_dropped() {
        let rows = [
            full_row("", &price_entry("1+", "1.00", "USD")),
            full_row("   ", &price_entry("1+", "1.00", "USD")),
            r#"<tr class="row"><td class="td-mfg"><span>x</span></td></tr>"#.to_string(),
            full_row("TME", &price_entry("1+", "1.00", "EUR")),
        ]
        .concat();
        let offers = parser().parse_offers(&page(&rows)).unwrap();

        assert_eq!(offers.len(), 1);
        assert_eq!(offers[0].distributor_name(), "TME");
    }

    #[test]
    fn test_distributor_name_trimmed() {
        let offers =
            parser().parse_offers(&page(&full_row("  LCSC  ", &price_entry("1+", "0.05", "USD")))).unwrap();
        assert_eq!(offers[0].distributor_name(), "LCSC");
    }

    #[test]
    fn test_absolute_offer_link_kept() {
        let row = r#"<tr class="row" data-distributor_name="Avnet">
            <td class="td-buy"><a class="buy-button primary" href="https://www.avnet.com/shop/p/LM358N">Buy</a></td>
        </tr>"#;
        let offers = parser().parse_offers(&page(row)).unwrap();
        assert_eq!(offers[0].offer_url(), "https://www.avnet.com/shop/p/LM358N");
    }

    #[test]
    fn test_rows_keep_document_order() {
        let rows = ["Zeta", "Alpha", "Mid"]
            .iter()
            .map(|d| full_row(d, &price_entry("1+", "1.00", "USD")))
            .collect::<String>();
        let offers = parser().parse_offers(&page(&rows)).unwrap();
        let names: Vec<_> = offers.iter().map(|o| o.distributor_name()).collect();
        assert_eq!(names, vec!["Zeta", "Alpha", "Mid"]);
    }

    #[test]
    fn test_snippet_respects_char_boundaries() {
        assert_eq!(snippet("µµµµ", 2), "µµ");
    }
}
