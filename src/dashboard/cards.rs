//! Summary cards shown above the charts

use rand::seq::SliceRandom;
use serde::Serialize;

use crate::pipeline::{FamilyAggregates, OverviewCounts, StateAggregates, StoreAggregates};

/// Accent colours a card may be drawn with. Purely cosmetic.
const PALETTE: &[&str] = &["warning", "secondary", "primary", "success", "danger"];

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Card {
    pub header: &'static str,
    pub title: &'static str,
    pub text: String,
    pub color: &'static str,
}

impl Card {
    fn new(header: &'static str, title: &'static str, text: String, color: &'static str) -> Self {
        Self {
            header,
            title,
            text,
            color,
        }
    }

    /// Card with a randomly picked accent colour
    fn accented(header: &'static str, title: &'static str, text: String) -> Self {
        let color = PALETTE.choose(&mut rand::thread_rng()).copied().unwrap_or("primary");
        Self::new(header, title, text, color)
    }
}

/// Sales totals are shown the way they are summed, without rounding
fn sales_text(total: f64) -> String {
    format!("{total} sales")
}

pub fn overview_cards(counts: &OverviewCounts) -> Vec<Card> {
    vec![
        Card::new(
            "Number of store-clients collected",
            "Store-clients",
            format!("{} stores", counts.stores),
            "primary",
        ),
        Card::new(
            "Number of product categories sold",
            "Product categories",
            format!("{} categories", counts.families),
            "secondary",
        ),
        Card::new(
            "Number of years of collected data",
            "Years",
            format!("{} years", counts.years),
            "warning",
        ),
        Card::new(
            "Number of states where the company is active",
            "States",
            format!("{} states", counts.states),
            "warning",
        ),
        Card::new(
            "Number of cities where the company is active",
            "Cities",
            format!("{} cities", counts.cities),
            "success",
        ),
        Card::new(
            "Number of months of collected data",
            "Months",
            format!("{} months", counts.months),
            "danger",
        ),
    ]
}

pub fn store_cards(view: &StoreAggregates) -> Vec<Card> {
    vec![
        Card::accented(
            "Total number of sold product categories",
            "Product categories",
            format!("{} products", view.families_sold),
        ),
        Card::accented("Total number of sales made", "Sales", sales_text(view.total_sales)),
        Card::accented(
            "Store type of the selected store",
            "Type",
            format!("{} type", view.store_type),
        ),
    ]
}

pub fn state_cards(view: &StateAggregates) -> Vec<Card> {
    vec![
        Card::accented(
            "Most profitable product category in the region",
            "Best product category",
            view.best_family.clone(),
        ),
        Card::accented("Total number of sales made", "Sales", sales_text(view.total_sales)),
        Card::accented(
            "Most common type of store in the selected region",
            "Store type (most common)",
            format!("{} type", view.modal_store_type),
        ),
    ]
}

pub fn family_cards(view: &FamilyAggregates) -> Vec<Card> {
    vec![
        Card::accented(
            "State in which the product was the most sold",
            "State (most successful)",
            view.best_state.clone(),
        ),
        Card::accented("Total number of sales made", "Sales", sales_text(view.total_sales)),
        Card::accented(
            "Place on the ranking of most profitable product",
            "Ranking categories",
            format!("{} place", view.rank_ordinal),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn family_cards_show_ordinal_place() {
        let view = FamilyAggregates {
            family: "BREAD".into(),
            best_state: "Pichincha".into(),
            total_sales: 12.5,
            rank: 3,
            rank_ordinal: "3rd".into(),
            top_cities: Vec::new(),
        };

        let cards = family_cards(&view);
        let texts: Vec<&str> = cards.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, ["Pichincha", "12.5 sales", "3rd place"]);
        assert!(cards.iter().all(|c| PALETTE.contains(&c.color)));
    }

    #[test]
    fn overview_counts_render_with_units() {
        let counts = OverviewCounts {
            stores: 54,
            families: 33,
            years: 5,
            states: 16,
            cities: 22,
            months: 56,
        };
        let texts: Vec<String> = overview_cards(&counts).into_iter().map(|c| c.text).collect();
        assert_eq!(
            texts,
            ["54 stores", "33 categories", "5 years", "16 states", "22 cities", "56 months"]
        );
    }
}
