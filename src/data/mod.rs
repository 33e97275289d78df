//! Raw transaction table

mod loader;
pub mod schema;

pub use loader::load;
pub use schema::{ColumnType, DtypeOverrides};

use chrono::Weekday;
use serde::Serialize;
use std::collections::HashMap;

use crate::error::LoadError;

/// One row of the raw table
#[derive(Debug, Clone, PartialEq)]
pub struct Transaction {
    pub store_id: i64,
    pub day_of_week: Weekday,
    pub week: u32,
    pub month: u32,
    pub year: i32,
    pub family: String,
    pub sales: f64,
    pub on_promotion: bool,
    pub store_type: String,
    pub state: String,
    pub city: String,
    /// Cells of the non-required columns, aligned with `RawTable::extra_columns`
    pub extras: Vec<CellValue>,
}

/// A typed cell from a non-required column
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Null,
    Text(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
}

/// The full, unfiltered set of transactions. Immutable once built.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    records: Vec<Transaction>,
    extra_columns: Vec<String>,
}

impl RawTable {
    /// Build a table, checking that store attributes are fixed per store id
    pub fn new(records: Vec<Transaction>, extra_columns: Vec<String>) -> Result<Self, LoadError> {
        check_store_attributes(&records)?;
        Ok(Self {
            records,
            extra_columns,
        })
    }

    pub fn from_records(records: Vec<Transaction>) -> Result<Self, LoadError> {
        Self::new(records, Vec::new())
    }

    pub fn records(&self) -> &[Transaction] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn extra_columns(&self) -> &[String] {
        &self.extra_columns
    }

    /// Look up an extra cell by row index and column name
    #[cfg(test)]
    pub(crate) fn extra(&self, row: usize, column: &str) -> Option<&CellValue> {
        let idx = self.extra_columns.iter().position(|c| c == column)?;
        self.records.get(row)?.extras.get(idx)
    }

    pub fn total_sales(&self) -> f64 {
        self.records.iter().map(|r| r.sales).sum()
    }
}

fn check_store_attributes(records: &[Transaction]) -> Result<(), LoadError> {
    let mut first_seen: HashMap<i64, &Transaction> = HashMap::new();

    for record in records {
        let first = *first_seen.entry(record.store_id).or_insert(record);
        let pairs = [
            ("state", &first.state, &record.state),
            ("city", &first.city, &record.city),
            ("store_type", &first.store_type, &record.store_type),
        ];
        for (attribute, a, b) in pairs {
            if a != b {
                return Err(LoadError::InconsistentStore {
                    store_id: record.store_id,
                    attribute,
                    first: a.clone(),
                    other: b.clone(),
                });
            }
        }
    }

    Ok(())
}

#[cfg(test)]
pub(crate) mod fixtures {
    use super::Transaction;
    use chrono::Weekday;

    /// Store layout used across unit tests: (id, type, state, city)
    const STORES: &[(i64, &str, &str, &str)] = &[
        (1, "D", "Pichincha", "Quito"),
        (2, "D", "Pichincha", "Quito"),
        (3, "A", "Pichincha", "Cayambe"),
        (4, "B", "Guayas", "Guayaquil"),
        (5, "C", "Guayas", "Daule"),
        (6, "A", "Azuay", "Cuenca"),
    ];

    pub fn tx(store_id: i64, family: &str, sales: f64) -> Transaction {
        let (_, store_type, state, city) = STORES
            .iter()
            .copied()
            .find(|(id, ..)| *id == store_id)
            .unwrap_or((store_id, "E", "Loja", "Loja"));
        Transaction {
            store_id,
            day_of_week: Weekday::Mon,
            week: 1,
            month: 1,
            year: 2020,
            family: family.to_string(),
            sales,
            on_promotion: false,
            store_type: store_type.to_string(),
            state: state.to_string(),
            city: city.to_string(),
            extras: Vec::new(),
        }
    }

    pub fn promoted(mut t: Transaction) -> Transaction {
        t.on_promotion = true;
        t
    }

    pub fn dated(mut t: Transaction, year: i32, month: u32, week: u32, day: Weekday) -> Transaction {
        t.year = year;
        t.month = month;
        t.week = week;
        t.day_of_week = day;
        t
    }
}
