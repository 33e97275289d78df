//! Dashboard context: the loaded table, its global aggregates and the
//! per-sheet content built from them.

pub mod cards;
pub mod charts;

use serde::Serialize;
use std::collections::BTreeSet;
use std::str::FromStr;
use std::sync::Arc;

use crate::data::RawTable;
use crate::error::{Error, Result};
use crate::pipeline::{
    family_view, global_aggregates, state_view, store_view, FamilyAggregates, GlobalAggregates, StateAggregates,
    StoreAggregates,
};
use cards::Card;
use charts::Chart;

/// The dashboard tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Sheet {
    #[serde(rename = "sheet-1")]
    Sheet1,
    #[serde(rename = "sheet-2")]
    Sheet2,
    #[serde(rename = "sheet-3")]
    Sheet3,
    #[serde(rename = "sheet-4")]
    Sheet4,
}

impl Sheet {
    pub const ALL: [Sheet; 4] = [Sheet::Sheet1, Sheet::Sheet2, Sheet::Sheet3, Sheet::Sheet4];

    pub fn id(self) -> &'static str {
        match self {
            Sheet::Sheet1 => "sheet-1",
            Sheet::Sheet2 => "sheet-2",
            Sheet::Sheet3 => "sheet-3",
            Sheet::Sheet4 => "sheet-4",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Sheet::Sheet1 => "Sheet 1",
            Sheet::Sheet2 => "Sheet 2",
            Sheet::Sheet3 => "Sheet 3",
            Sheet::Sheet4 => "Sheet 4",
        }
    }
}

impl FromStr for Sheet {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Sheet::ALL
            .into_iter()
            .find(|sheet| sheet.id() == s)
            .ok_or_else(|| Error::UnknownSheet(s.to_string()))
    }
}

/// Values offered by one dropdown
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Selector<T> {
    pub options: Vec<T>,
    pub default: Option<T>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SelectorOptions {
    pub stores: Selector<i64>,
    pub states: Selector<String>,
    pub families: Selector<String>,
}

impl SelectorOptions {
    /// Sorted distinct values. Stores default to the lowest id, states and
    /// families to the first row's value.
    fn from_table(raw: &RawTable) -> Self {
        let rows = raw.records();
        let stores: Vec<i64> = rows.iter().map(|r| r.store_id).collect::<BTreeSet<_>>().into_iter().collect();
        let sorted = |values: BTreeSet<&str>| values.into_iter().map(str::to_string).collect::<Vec<_>>();
        let first = rows.first();

        Self {
            states: Selector {
                options: sorted(rows.iter().map(|r| r.state.as_str()).collect()),
                default: first.map(|r| r.state.clone()),
            },
            families: Selector {
                options: sorted(rows.iter().map(|r| r.family.as_str()).collect()),
                default: first.map(|r| r.family.clone()),
            },
            stores: Selector {
                default: stores.first().copied(),
                options: stores,
            },
        }
    }
}

/// Content of one tab
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SheetContent {
    Overview {
        cards: Vec<Card>,
        charts: Vec<Chart>,
    },
    StoreSelector {
        label: &'static str,
        selector: Selector<i64>,
    },
    StateSelector {
        label: &'static str,
        selector: Selector<String>,
    },
    FamilySelector {
        label: &'static str,
        selector: Selector<String>,
    },
}

/// Aggregates for one selector value, with the cards and charts drawn from them
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Panel<T> {
    pub aggregates: T,
    pub cards: Vec<Card>,
    pub charts: Vec<Chart>,
}

/// Immutable context shared by every request
#[derive(Debug)]
pub struct Dashboard {
    raw: RawTable,
    globals: GlobalAggregates,
    options: SelectorOptions,
    overview_cards: Vec<Card>,
    overview_charts: Vec<Chart>,
}

pub type SharedDashboard = Arc<Dashboard>;

impl Dashboard {
    pub fn new(raw: RawTable) -> Self {
        let globals = global_aggregates(&raw);
        let options = SelectorOptions::from_table(&raw);
        let overview_cards = cards::overview_cards(&globals.overview);
        let overview_charts = charts::overview_charts(&globals);
        Self {
            raw,
            globals,
            options,
            overview_cards,
            overview_charts,
        }
    }

    pub fn raw(&self) -> &RawTable {
        &self.raw
    }

    pub fn globals(&self) -> &GlobalAggregates {
        &self.globals
    }

    pub fn options(&self) -> &SelectorOptions {
        &self.options
    }

    pub fn sheet(&self, sheet: Sheet) -> SheetContent {
        match sheet {
            Sheet::Sheet1 => SheetContent::Overview {
                cards: self.overview_cards.clone(),
                charts: self.overview_charts.clone(),
            },
            Sheet::Sheet2 => SheetContent::StoreSelector {
                label: "Store:",
                selector: self.options.stores.clone(),
            },
            Sheet::Sheet3 => SheetContent::StateSelector {
                label: "State:",
                selector: self.options.states.clone(),
            },
            Sheet::Sheet4 => SheetContent::FamilySelector {
                label: "Product category:",
                selector: self.options.families.clone(),
            },
        }
    }

    pub fn store_panel(&self, store_id: i64) -> Result<Panel<StoreAggregates>> {
        let aggregates = store_view(&self.raw, store_id)?;
        Ok(Panel {
            cards: cards::store_cards(&aggregates),
            charts: charts::store_charts(&aggregates),
            aggregates,
        })
    }

    pub fn state_panel(&self, state: &str) -> Result<Panel<StateAggregates>> {
        let aggregates = state_view(&self.raw, state)?;
        Ok(Panel {
            cards: cards::state_cards(&aggregates),
            charts: charts::state_charts(&aggregates),
            aggregates,
        })
    }

    pub fn family_panel(&self, family: &str) -> Result<Panel<FamilyAggregates>> {
        let aggregates = family_view(&self.raw, &self.globals.product_ranking, family)?;
        Ok(Panel {
            cards: cards::family_cards(&aggregates),
            charts: charts::family_charts(&aggregates),
            aggregates,
        })
    }
}
