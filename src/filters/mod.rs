//! Top-N offer selection.
//!
//! The policy is a deterministic truncation by encounter order: the first
//! distributors seen on the page, and the first price breaks seen for each.
//! It is not a relevance or price ranking.

use crate::findchips::Offer;
use std::collections::HashMap;
use tracing::{debug, info};

/// Default number of distributors kept.
pub const DEFAULT_MAX_DISTRIBUTORS: usize = 5;

/// Default number of offers kept per distributor.
pub const DEFAULT_MAX_OFFERS_PER_DISTRIBUTOR: usize = 5;

/// Keeps the first distributors and the first offers of each.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TopOffers {
    max_distributors: usize,
    max_offers_per_distributor: usize,
}

impl TopOffers {
    /// Creates a filter with the given limits.
    pub fn new(max_distributors: usize, max_offers_per_distributor: usize) -> Self {
        Self { max_distributors, max_offers_per_distributor }
    }

    /// Largest number of offers this filter can return.
    pub fn capacity(&self) -> usize {
        self.max_distributors.saturating_mul(self.max_offers_per_distributor)
    }

    /// Reduces `offers` to the bounded, ordered subset.
    ///
    /// Offers without a distributor name are dropped. The rest are grouped by
    /// distributor in first-seen order and the groups concatenated, so offers
    /// of one distributor end up adjacent even if the page interleaved them.
    pub fn apply(&self, offers: Vec<Offer>) -> Vec<Offer> {
        let total = offers.len();
        let mut groups: Vec<Vec<Offer>> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for offer in offers {
            if offer.distributor_name().trim().is_empty() {
                debug!("Dropping offer without distributor name");
                continue;
            }

            let slot = match index.get(offer.distributor_name()) {
                Some(&slot) => slot,
                None => {
                    index.insert(offer.distributor_name().to_string(), groups.len());
                    groups.push(Vec::new());
                    groups.len() - 1
                }
            };
            groups[slot].push(offer);
        }

        info!("Grouped {} offers into {} distributors", total, groups.len());

        let filtered: Vec<Offer> = groups
            .into_iter()
            .take(self.max_distributors)
            .flat_map(|group| group.into_iter().take(self.max_offers_per_distributor))
            .collect();

        info!(
            "Kept {} offers (top {} distributors x {} offers)",
            filtered.len(),
            self.max_distributors,
            self.max_offers_per_distributor
        );

        filtered
    }
}

impl Default for TopOffers {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_DISTRIBUTORS, DEFAULT_MAX_OFFERS_PER_DISTRIBUTOR)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::findchips::{Listing, PriceBreak};

    fn make_offer(distributor: &str, quantity: &str) -> Offer {
        make_break(distributor, quantity, "1.00")
    }

    fn make_priced_offer(distributor: &str, unit_price: &str) -> Offer {
        make_break(distributor, "1+", unit_price)
    }

    fn make_break(distributor: &str, quantity: &str, unit_price: &str) -> Offer {
        let listing = Listing {
            distributor_name: distributor.to_string(),
            seller_name: "Texas Instruments".to_string(),
            moq: "1".to_string(),
            spq: "N/A".to_string(),
            offer_url: String::new(),
        };
        Offer::new(
            &listing,
            PriceBreak {
                quantity: quantity.to_string(),
                unit_price: unit_price.to_string(),
                currency: "USD".to_string(),
            },
        )
    }

    fn make_grid(distributors: usize, per_distributor: usize) -> Vec<Offer> {
        (0..distributors)
            .flat_map(|d| (0..per_distributor).map(move |q| make_offer(&format!("D{}", d), &format!("{}+", q))))
            .collect()
    }

    fn keys(offers: &[Offer]) -> Vec<(String, String)> {
        offers
            .iter()
            .map(|o| (o.distributor_name().to_string(), o.quantity().to_string()))
            .collect()
    }

    #[test]
    fn test_default_limits() {
        let filter = TopOffers::default();
        assert_eq!(filter, TopOffers::new(5, 5));
        assert_eq!(filter.capacity(), 25);
    }

    #[test]
    fn test_seven_by_six_keeps_first_twenty_five() {
        let filtered = TopOffers::default().apply(make_grid(7, 6));

        assert_eq!(filtered.len(), 25);
        let expected: Vec<_> = (0..5)
            .flat_map(|d| (0..5).map(move |q| (format!("D{}", d), format!("{}+", q))))
            .collect();
        assert_eq!(keys(&filtered), expected);
    }

    #[test]
    fn test_never_exceeds_capacity() {
        for (d, n) in [(0, 0), (1, 30), (30, 1), (6, 6), (12, 9)] {
            let filtered = TopOffers::default().apply(make_grid(d, n));
            assert!(filtered.len() <= 25, "{}x{} gave {}", d, n, filtered.len());
        }
    }

    #[test]
    fn test_idempotent_on_small_sets() {
        let filter = TopOffers::default();
        let once = filter.apply(make_grid(4, 3));
        let twice = filter.apply(once.clone());
        assert_eq!(once, twice);

        let once = filter.apply(make_grid(5, 5));
        let twice = filter.apply(once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn test_blank_distributors_dropped() {
        let offers = vec![
            make_offer("", "1+"),
            make_offer("  ", "1+"),
            make_offer("Mouser", "1+"),
        ];
        let filtered = TopOffers::default().apply(offers);
        assert_eq!(keys(&filtered), vec![("Mouser".to_string(), "1+".to_string())]);
    }

    #[test]
    fn test_blank_distributors_do_not_use_a_slot() {
        let mut offers = vec![make_offer(" ", "1+")];
        offers.extend(make_grid(5, 1));
        let filtered = TopOffers::default().apply(offers);
        assert_eq!(filtered.len(), 5);
        assert_eq!(filtered[4].distributor_name(), "D4");
    }

    #[test]
    fn test_groups_by_first_seen_order() {
        let offers = vec![
            make_offer("Arrow", "1+"),
            make_offer("Mouser", "1+"),
            make_offer("Arrow", "10+"),
            make_offer("Digi-Key", "1+"),
            make_offer("Mouser", "10+"),
        ];
        let filtered = TopOffers::default().apply(offers);
        let names: Vec<_> = filtered.iter().map(|o| o.distributor_name()).collect();
        assert_eq!(names, vec!["Arrow", "Arrow", "Mouser", "Mouser", "Digi-Key"]);
        assert_eq!(filtered[1].quantity(), "10+");
    }

    #[test]
    fn test_not_a_price_ranking() {
        let mut offers = make_grid(5, 1);
        offers.push(make_priced_offer("Late", "0.01"));

        let filtered = TopOffers::default().apply(offers);
        assert!(filtered.iter().all(|o| o.distributor_name() != "Late"));
    }

    #[test]
    fn test_custom_limits() {
        let filtered = TopOffers::new(2, 3).apply(make_grid(4, 4));
        assert_eq!(filtered.len(), 6);
        assert_eq!(filtered[3].distributor_name(), "D1");
    }

    #[test]
    fn test_empty_input() {
        assert!(TopOffers::default().apply(Vec::new()).is_empty());
    }
}
