//! Filtered views for a single selector value
//!
//! Each call filters the raw table afresh; nothing here is cached.

use serde::Serialize;
use tracing::debug;

use super::group::{mode, rank_descending, sum_by, top_n_ascending};
use super::{ordinal, FamilySales, Ranking};
use crate::data::{RawTable, Transaction};
use crate::error::{Dimension, Error, Result};

/// Stores shown on the state panel
pub const TOP_STORES: usize = 5;
/// Cities shown on the family panel
pub const TOP_CITIES: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct YearlySales {
    pub year: i32,
    pub on_promotion: bool,
    pub sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreAggregates {
    pub store_id: i64,
    /// Distinct families with non-zero sales
    pub families_sold: usize,
    pub total_sales: f64,
    pub store_type: String,
    /// Ordered by (year, on_promotion)
    pub yearly_sales: Vec<YearlySales>,
    /// Non-zero-sales rows summed per family, by family name
    pub family_breakdown: Vec<FamilySales>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreSales {
    pub store_id: i64,
    pub sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateAggregates {
    pub state: String,
    pub best_family: String,
    pub total_sales: f64,
    pub modal_store_type: String,
    pub family_ranking: Ranking,
    /// Up to `TOP_STORES` stores, ascending by sales
    pub top_stores: Vec<StoreSales>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CitySales {
    pub city: String,
    pub sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FamilyAggregates {
    pub family: String,
    pub best_state: String,
    pub total_sales: f64,
    /// 1-based position in the product ranking
    pub rank: usize,
    pub rank_ordinal: String,
    /// Up to `TOP_CITIES` cities, ascending by sales
    pub top_cities: Vec<CitySales>,
}

fn filter<'a>(
    raw: &'a RawTable,
    dimension: Dimension,
    value: impl ToString,
    keep: impl Fn(&Transaction) -> bool,
) -> Result<Vec<&'a Transaction>> {
    let rows: Vec<&Transaction> = raw.records().iter().filter(|r| keep(r)).collect();
    if rows.is_empty() {
        return Err(Error::not_found(dimension, value));
    }
    Ok(rows)
}

fn total(rows: &[&Transaction]) -> f64 {
    rows.iter().map(|r| r.sales).sum()
}

/// Store type is fixed per store, so the first row is as good as any
fn first_store_type(rows: &[&Transaction]) -> Result<String> {
    rows.first()
        .map(|r| r.store_type.clone())
        .ok_or(Error::EmptyAggregate("store type"))
}

fn modal_store_type(rows: &[&Transaction]) -> Result<String> {
    mode(rows.iter().map(|r| r.store_type.as_str()))
        .map(str::to_string)
        .ok_or(Error::EmptyAggregate("modal store type"))
}

pub fn store_view(raw: &RawTable, store_id: i64) -> Result<StoreAggregates> {
    let rows = filter(raw, Dimension::Store, store_id, |r| r.store_id == store_id)?;
    debug!("store {}: {} rows", store_id, rows.len());

    let store_type = first_store_type(&rows)?;
    let sold: Vec<&Transaction> = rows.iter().copied().filter(|r| r.sales != 0.0).collect();

    let yearly_sales = sum_by(rows.iter().copied(), |r| (r.year, r.on_promotion))
        .into_iter()
        .map(|((year, on_promotion), sales)| YearlySales {
            year,
            on_promotion,
            sales,
        })
        .collect();

    let family_breakdown: Vec<FamilySales> = sum_by(sold.iter().copied(), |r| r.family.as_str())
        .into_iter()
        .map(|(family, sales)| FamilySales {
            family: family.to_string(),
            sales,
        })
        .collect();

    Ok(StoreAggregates {
        store_id,
        families_sold: family_breakdown.len(),
        total_sales: total(&rows),
        store_type,
        yearly_sales,
        family_breakdown,
    })
}

pub fn state_view(raw: &RawTable, state: &str) -> Result<StateAggregates> {
    let rows = filter(raw, Dimension::State, state, |r| r.state == state)?;
    debug!("state {}: {} rows", state, rows.len());

    let family_ranking = Ranking::from_groups(sum_by(rows.iter().copied(), |r| r.family.as_str()));
    let best_family = family_ranking
        .first()
        .map(|f| f.family.clone())
        .ok_or(Error::EmptyAggregate("best family"))?;

    let top_stores = top_n_ascending(sum_by(rows.iter().copied(), |r| r.store_id), TOP_STORES)
        .into_iter()
        .map(|(store_id, sales)| StoreSales { store_id, sales })
        .collect();

    Ok(StateAggregates {
        state: state.to_string(),
        best_family,
        total_sales: total(&rows),
        modal_store_type: modal_store_type(&rows)?,
        family_ranking,
        top_stores,
    })
}

pub fn family_view(raw: &RawTable, product_ranking: &Ranking, family: &str) -> Result<FamilyAggregates> {
    let rows = filter(raw, Dimension::Family, family, |r| r.family == family)?;
    debug!("family {}: {} rows", family, rows.len());

    let rank = product_ranking
        .rank_of(family)
        .ok_or_else(|| Error::not_found(Dimension::Family, family))?;

    let best_state = rank_descending(sum_by(rows.iter().copied(), |r| r.state.as_str()))
        .first()
        .map(|(state, _)| state.to_string())
        .ok_or(Error::EmptyAggregate("best state"))?;

    let top_cities = top_n_ascending(sum_by(rows.iter().copied(), |r| r.city.as_str()), TOP_CITIES)
        .into_iter()
        .map(|(city, sales)| CitySales {
            city: city.to_string(),
            sales,
        })
        .collect();

    Ok(FamilyAggregates {
        family: family.to_string(),
        best_state,
        total_sales: total(&rows),
        rank,
        rank_ordinal: ordinal(rank),
        top_cities,
    })
}
