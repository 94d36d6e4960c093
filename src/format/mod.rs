//! Output formatting for offers (table, JSON, markdown, CSV).

use crate::config::OutputFormat;
use crate::export::write_csv;
use crate::findchips::Offer;

/// Formats offers for terminal output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    /// Creates a new formatter.
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats a filtered offer set.
    pub fn format_offers(&self, offers: &[Offer]) -> String {
        if offers.is_empty() {
            return match self.format {
                OutputFormat::Json => "[]".to_string(),
                OutputFormat::Csv => self.csv_offers(offers),
                _ => "No offers found.".to_string(),
            };
        }

        match self.format {
            OutputFormat::Json => self.json_offers(offers),
            OutputFormat::Table => self.table_offers(offers),
            OutputFormat::Markdown => self.markdown_offers(offers),
            OutputFormat::Csv => self.csv_offers(offers),
        }
    }

    // JSON formatting

    fn json_offers(&self, offers: &[Offer]) -> String {
        serde_json::to_string_pretty(offers).unwrap_or_else(|_| "[]".to_string())
    }

    // Table formatting

    fn table_offers(&self, offers: &[Offer]) -> String {
        let distributor_width = 20;
        let seller_width = 20;
        let qty_width = 8;
        let price_width = 12;

        let mut lines = Vec::new();

        lines.push(format!(
            "{:<distributor_width$}  {:<seller_width$}  {:<qty_width$}  {:>price_width$}  {}",
            "Distributor", "Seller", "Qty", "Unit Price", "MOQ"
        ));
        lines.push(format!(
            "{:-<distributor_width$}  {:-<seller_width$}  {:-<qty_width$}  {:-<price_width$}  {:-<10}",
            "", "", "", "", ""
        ));

        for offer in offers {
            let price = if offer.is_unpriced() {
                offer.unit_price().to_string()
            } else {
                format!("{}{}", offer.currency(), offer.unit_price())
            };

            lines.push(format!(
                "{:<distributor_width$}  {:<seller_width$}  {:<qty_width$}  {:>price_width$}  {}",
                truncate(offer.distributor_name(), distributor_width),
                truncate(offer.seller_name(), seller_width),
                truncate(offer.quantity(), qty_width),
                price,
                offer.moq()
            ));
        }

        lines.push(String::new());
        lines.push(format!("Total: {} offers", offers.len()));

        lines.join("\n")
    }

    // Markdown formatting

    fn markdown_offers(&self, offers: &[Offer]) -> String {
        let mut lines = Vec::new();

        lines.push("| Distributor | Seller | MOQ | Qty | Unit Price | Currency | Offer |".to_string());
        lines.push("|-------------|--------|-----|-----|------------|----------|-------|".to_string());

        for offer in offers {
            let link = if offer.offer_url().is_empty() {
                String::new()
            } else {
                format!("[Buy]({})", offer.offer_url())
            };

            lines.push(format!(
                "| {} | {} | {} | {} | {} | {} | {} |",
                escape_pipes(offer.distributor_name()),
                escape_pipes(offer.seller_name()),
                escape_pipes(offer.moq()),
                escape_pipes(offer.quantity()),
                offer.unit_price(),
                offer.currency(),
                link
            ));
        }

        lines.push(String::new());
        lines.push(format!("*{} offers found*", offers.len()));

        lines.join("\n")
    }

    // CSV formatting

    fn csv_offers(&self, offers: &[Offer]) -> String {
        let mut out = Vec::new();
        match write_csv(&mut out, offers) {
            Ok(()) => String::from_utf8_lossy(&out).trim_end().to_string(),
            Err(e) => format!("Failed to format CSV: {}", e),
        }
    }
}

/// Truncates to `max` characters, marking the cut with `...`.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() > max {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    } else {
        s.to_string()
    }
}

fn escape_pipes(s: &str) -> String {
    s.replace('|', "\\|")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::findchips::{Listing, PriceBreak};

    fn make_offer() -> Offer {
        Offer::new(
            &Listing {
                distributor_name: "Digi-Key".to_string(),
                seller_name: "Texas Instruments".to_string(),
                moq: "1".to_string(),
                spq: "N/A".to_string(),
                offer_url: "https://www.findchips.com/offer/abc".to_string(),
            },
            PriceBreak {
                quantity: "100+".to_string(),
                unit_price: "0.32".to_string(),
                currency: "USD".to_string(),
            },
        )
    }

    fn make_unpriced_offer() -> Offer {
        Offer::new(
            &Listing {
                distributor_name: "A Distributor With A Very Long Name Indeed".to_string(),
                seller_name: "N/A".to_string(),
                moq: "N/A".to_string(),
                spq: "N/A".to_string(),
                offer_url: String::new(),
            },
            PriceBreak::unavailable(),
        )
    }

    #[test]
    fn test_json_offers() {
        let output = Formatter::new(OutputFormat::Json).format_offers(&[make_offer()]);
        assert!(output.starts_with('['));
        assert!(output.contains("\"distributor_name\": \"Digi-Key\""));
        assert!(output.contains("\"quantity\": \"100+\""));
    }

    #[test]
    fn test_table_offers() {
        let output = Formatter::new(OutputFormat::Table).format_offers(&[make_offer(), make_unpriced_offer()]);
        assert!(output.contains("Distributor"));
        assert!(output.contains("Digi-Key"));
        assert!(output.contains("USD0.32"));
        assert!(output.contains("A Distributor Wit..."));
        assert!(output.contains("Total: 2 offers"));
    }

    #[test]
    fn test_markdown_offers() {
        let output = Formatter::new(OutputFormat::Markdown).format_offers(&[make_offer(), make_unpriced_offer()]);
        assert!(output.contains("| Distributor |"));
        assert!(output.contains("[Buy](https://www.findchips.com/offer/abc)"));
        assert!(output.contains("*2 offers found*"));
    }

    #[test]
    fn test_csv_offers() {
        let output = Formatter::new(OutputFormat::Csv).format_offers(&[make_offer()]);
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("Distributor Name,Seller Name,MOQ,SPQ"));
        assert!(lines[1].starts_with("Digi-Key,Texas Instruments,1,N/A,0.32,USD,"));
    }

    #[test]
    fn test_empty_offers() {
        assert_eq!(Formatter::new(OutputFormat::Json).format_offers(&[]), "[]");
        assert_eq!(Formatter::new(OutputFormat::Table).format_offers(&[]), "No offers found.");
        assert_eq!(Formatter::new(OutputFormat::Markdown).format_offers(&[]), "No offers found.");
        assert_eq!(
            Formatter::new(OutputFormat::Csv).format_offers(&[]),
            "Distributor Name,Seller Name,MOQ,SPQ,Unit Price,Currency,Offer URL,Timestamp"
        );
    }

    #[test]
    fn test_truncate() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("exactly10!", 10), "exactly10!");
        assert_eq!(truncate("µµµµµµµµµµµµ", 6), "µµµ...");
    }

    #[test]
    fn test_escape_pipes() {
        assert_eq!(escape_pipes("a|b"), "a\\|b");
    }
}
