//! Aggregation pipeline
//!
//! Turns the raw transaction table into the derived tables each dashboard
//! view needs. Every function here is pure: derived tables are fresh
//! snapshots and the raw table is only ever read.

mod group;
mod ordinal;
mod views;

pub use ordinal::ordinal;
pub use views::{
    family_view, state_view, store_view, CitySales, FamilyAggregates, StateAggregates, StoreAggregates, StoreSales,
    YearlySales, TOP_CITIES, TOP_STORES,
};

use chrono::Weekday;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::data::{RawTable, Transaction};
use group::{mean, rank_descending, sum_by};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeekdaySales {
    pub day_of_week: Weekday,
    pub avg_sales: f64,
}

/// One period (week or month) of a trend
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrendPoint {
    pub period: u32,
    /// Mean over years of the period's yearly total
    pub avg_sales: f64,
    /// Largest yearly total for the period
    pub max_sales: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Trend {
    pub points: Vec<TrendPoint>,
    /// Mean of `avg_sales` across points, `None` when there are no points
    pub mean_avg_sales: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FamilySales {
    pub family: String,
    pub sales: f64,
}

/// Families ordered by total sales descending; position 0 is rank 1.
/// Equal totals are ordered by family name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Ranking(Vec<FamilySales>);

impl Ranking {
    fn from_groups(groups: BTreeMap<&str, f64>) -> Self {
        Ranking(
            rank_descending(groups)
                .into_iter()
                .map(|(family, sales)| FamilySales {
                    family: family.to_string(),
                    sales,
                })
                .collect(),
        )
    }

    pub fn entries(&self) -> &[FamilySales] {
        &self.0
    }

    /// 1-based rank of a family
    pub fn rank_of(&self, family: &str) -> Option<usize> {
        self.0.iter().position(|f| f.family == family).map(|i| i + 1)
    }

    pub fn first(&self) -> Option<&FamilySales> {
        self.0.first()
    }

    /// The `n` best families in ascending order of sales
    pub fn top_ascending(&self, n: usize) -> Vec<FamilySales> {
        self.0.iter().take(n).rev().cloned().collect()
    }

    pub fn total(&self) -> f64 {
        self.0.iter().map(|f| f.sales).sum()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreTypeSales {
    pub store_type: String,
    pub sales: f64,
}

/// Distinct counts shown on the overview cards
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct OverviewCounts {
    pub stores: usize,
    pub families: usize,
    pub years: usize,
    pub states: usize,
    pub cities: usize,
    /// Distinct (month, year) pairs
    pub months: usize,
}

/// Dataset-wide derived tables, computed once at startup
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalAggregates {
    pub weekday_average: Vec<WeekdaySales>,
    pub weekly_trend: Trend,
    pub monthly_trend: Trend,
    pub product_ranking: Ranking,
    pub promotion_ranking: Ranking,
    pub store_type_split: Vec<StoreTypeSales>,
    pub overview: OverviewCounts,
}

pub fn global_aggregates(raw: &RawTable) -> GlobalAggregates {
    let rows = raw.records();

    GlobalAggregates {
        weekday_average: weekday_average(rows),
        weekly_trend: trend(rows, |r| r.week),
        monthly_trend: trend(rows, |r| r.month),
        product_ranking: Ranking::from_groups(sum_by(rows, |r| r.family.as_str())),
        promotion_ranking: Ranking::from_groups(sum_by(
            rows.iter().filter(|r| r.on_promotion),
            |r| r.family.as_str(),
        )),
        store_type_split: sum_by(rows, |r| r.store_type.as_str())
            .into_iter()
            .map(|(store_type, sales)| StoreTypeSales {
                store_type: store_type.to_string(),
                sales,
            })
            .collect(),
        overview: overview(rows),
    }
}

/// Mean sales per day of week, Monday first
fn weekday_average(rows: &[Transaction]) -> Vec<WeekdaySales> {
    let mut days: BTreeMap<u32, (Weekday, f64, usize)> = BTreeMap::new();
    for row in rows {
        let day = row.day_of_week;
        let entry = days.entry(day.num_days_from_monday()).or_insert((day, 0.0, 0));
        entry.1 += row.sales;
        entry.2 += 1;
    }

    days.into_values()
        .map(|(day_of_week, sum, count)| WeekdaySales {
            day_of_week,
            avg_sales: sum / count as f64,
        })
        .collect()
}

/// Sum per (period, year), then mean and max of those sums per period
fn trend(rows: &[Transaction], period: fn(&Transaction) -> u32) -> Trend {
    let yearly = sum_by(rows, |r| (period(r), r.year));

    let mut per_period: BTreeMap<u32, Vec<f64>> = BTreeMap::new();
    for ((p, _year), sales) in yearly {
        per_period.entry(p).or_default().push(sales);
    }

    let points: Vec<TrendPoint> = per_period
        .into_iter()
        .filter_map(|(period, totals)| {
            Some(TrendPoint {
                period,
                avg_sales: mean(&totals)?,
                max_sales: totals.iter().copied().fold(f64::NEG_INFINITY, f64::max),
            })
        })
        .collect();

    let averages: Vec<f64> = points.iter().map(|p| p.avg_sales).collect();
    Trend {
        mean_avg_sales: mean(&averages),
        points,
    }
}

fn overview(rows: &[Transaction]) -> OverviewCounts {
    let mut stores = BTreeSet::new();
    let mut families = BTreeSet::new();
    let mut years = BTreeSet::new();
    let mut states = BTreeSet::new();
    let mut cities = BTreeSet::new();
    let mut months = BTreeSet::new();

    for row in rows {
        stores.insert(row.store_id);
        families.insert(row.family.as_str());
        years.insert(row.year);
        states.insert(row.state.as_str());
        cities.insert(row.city.as_str());
        months.insert((row.month, row.year));
    }

    OverviewCounts {
        stores: stores.len(),
        families: families.len(),
        years: years.len(),
        states: states.len(),
        cities: cities.len(),
        months: months.len(),
    }
}
