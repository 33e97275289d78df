//! Source table schema definitions

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

pub const STORE_ID: &str = "store_nbr";
pub const FAMILY: &str = "family";
pub const SALES: &str = "sales";
pub const ON_PROMOTION: &str = "onpromotion";
pub const STORE_TYPE: &str = "store_type";
pub const STATE: &str = "state";
pub const CITY: &str = "city";
pub const YEAR: &str = "year";
pub const MONTH: &str = "month";
pub const WEEK: &str = "week";
pub const DAY_OF_WEEK: &str = "day_of_week";

/// Target type a column is read as
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnType {
    Text,
    Integer,
    Float,
    Boolean,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ColumnType::Text => "text",
            ColumnType::Integer => "integer",
            ColumnType::Float => "float",
            ColumnType::Boolean => "boolean",
        };
        f.write_str(name)
    }
}

/// Columns every source must carry, with the type they are parsed as.
/// `day_of_week` is parsed into a weekday but declared as text here.
pub const REQUIRED_COLUMNS: &[(&str, ColumnType)] = &[
    (STORE_ID, ColumnType::Integer),
    (FAMILY, ColumnType::Text),
    (SALES, ColumnType::Float),
    (ON_PROMOTION, ColumnType::Boolean),
    (STORE_TYPE, ColumnType::Text),
    (STATE, ColumnType::Text),
    (CITY, ColumnType::Text),
    (YEAR, ColumnType::Integer),
    (MONTH, ColumnType::Integer),
    (WEEK, ColumnType::Integer),
    (DAY_OF_WEEK, ColumnType::Text),
];

/// Column name -> target type, applied to each source before concatenation
pub type DtypeOverrides = BTreeMap<String, ColumnType>;

pub fn required_type(column: &str) -> Option<ColumnType> {
    REQUIRED_COLUMNS
        .iter()
        .find(|(name, _)| *name == column)
        .map(|(_, ty)| *ty)
}
