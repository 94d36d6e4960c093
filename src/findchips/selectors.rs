//! CSS selectors for FindChips search result pages.
//!
//! This file contains all CSS selectors used for parsing FindChips pages.
//! Update this file when FindChips changes their HTML structure.
//!
//! **Update process**: When parsing fails, enable `save_html`, capture the
//! snapshot, update selectors, and add a test fixture.

use scraper::Selector;
use std::sync::LazyLock;

/// Selectors for distributor rows on the search results page.
pub mod rows {
    use super::*;

    /// Distributor row inside a results table body.
    pub static ROW: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("tbody > tr[class*='row']").unwrap());

    /// Distributor name attribute on the row.
    pub const DISTRIBUTOR_ATTR: &str = "data-distributor_name";

    /// Seller / manufacturer name.
    pub static SELLER: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("td[class*='td-mfg'] span").unwrap());

    /// Stock cell, which carries the minimum order quantity.
    pub static MOQ: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("td[class*='td-stock']").unwrap());

    /// Buy button linking to the distributor offer.
    pub static OFFER_LINK: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("td[class*='td-buy'] a[class*='buy-button']").unwrap());

    /// Price-break entries.
    pub static PRICE_BREAKS: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse("td[class*='td-price'] ul[class='price-list'] li").unwrap()
    });
}

/// Selectors scoped to a single price-break entry.
pub mod price_break {
    use super::*;

    /// Quantity label, e.g. "100+".
    pub static QUANTITY: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("span[class='label']").unwrap());

    /// Price element carrying the data attributes below.
    pub static PRICE: LazyLock<Selector> =
        LazyLock::new(|| Selector::parse("span[class='value']").unwrap());

    pub const PRICE_ATTR: &str = "data-baseprice";
    pub const CURRENCY_ATTR: &str = "data-basecurrency";

    /// Control elements; an entry holding a "See More" button is not a price break.
    pub static CONTROL: LazyLock<Selector> = LazyLock::new(|| Selector::parse("button").unwrap());

    /// Text identifying the expand control (matched case-insensitively).
    pub const SEE_MORE_TEXT: &str = "see more";
}

/// Selectors for detecting challenge/error pages.
pub mod errors {
    use super::*;

    /// CAPTCHA / bot challenge.
    pub static CHALLENGE: LazyLock<Selector> = LazyLock::new(|| {
        Selector::parse(
            "form#challenge-form, \
             form[action*='captcha'], \
             #cf-challenge-running, \
             div.g-recaptcha, \
             iframe[src*='captcha']",
        )
        .unwrap()
    });
}
