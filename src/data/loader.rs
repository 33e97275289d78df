//! CSV loading and concatenation of source tables

use chrono::Weekday;
use std::collections::HashMap;
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{debug, info};

use super::schema::{self, required_type, ColumnType, DtypeOverrides, REQUIRED_COLUMNS};
use super::{CellValue, RawTable, Transaction};
use crate::error::LoadError;

/// One parsed source, before concatenation
struct SourceTable {
    extra_columns: Vec<String>,
    records: Vec<Transaction>,
}

/// Read every source, apply the dtype overrides and concatenate row-wise.
/// Rows keep their order, source by source.
pub fn load<P: AsRef<Path>>(sources: &[P], overrides: &DtypeOverrides) -> Result<RawTable, LoadError> {
    if sources.is_empty() {
        return Err(LoadError::NoSources);
    }

    let mut parts = Vec::with_capacity(sources.len());
    for source in sources {
        let path = source.as_ref();
        let part = read_source(path, overrides)?;
        info!("Loaded {} rows from {}", part.records.len(), path.display());
        parts.push(part);
    }

    let table = concat(parts)?;
    info!(
        "Raw table ready: {} rows, {} extra columns",
        table.len(),
        table.extra_columns().len()
    );
    Ok(table)
}

fn read_source(path: &Path, overrides: &DtypeOverrides) -> Result<SourceTable, LoadError> {
    if !path.exists() {
        return Err(LoadError::Missing(path.to_path_buf()));
    }
    let file = File::open(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    read_csv(path, file, overrides)
}

fn read_csv<R: Read>(path: &Path, input: R, overrides: &DtypeOverrides) -> Result<SourceTable, LoadError> {
    let csv_error = |source| LoadError::Csv {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(input);

    let headers = reader.headers().map_err(csv_error)?.clone();
    let layout = ColumnLayout::resolve(path, &headers, overrides)?;

    let mut records = Vec::new();
    for result in reader.records() {
        let row = result.map_err(csv_error)?;
        records.push(layout.parse_row(&row)?);
    }

    Ok(SourceTable {
        extra_columns: layout.extras.into_iter().map(|e| e.name).collect(),
        records,
    })
}

/// Concatenate sources; extra columns become the union, absent cells are null
fn concat(parts: Vec<SourceTable>) -> Result<RawTable, LoadError> {
    let mut columns: Vec<String> = Vec::new();
    for part in &parts {
        for name in &part.extra_columns {
            if !columns.contains(name) {
                columns.push(name.clone());
            }
        }
    }

    let total = parts.iter().map(|p| p.records.len()).sum();
    let mut records = Vec::with_capacity(total);

    for part in parts {
        let positions: Vec<usize> = part
            .extra_columns
            .iter()
            .filter_map(|name| columns.iter().position(|c| c == name))
            .collect();

        for mut record in part.records {
            let mut extras = vec![CellValue::Null; columns.len()];
            for (cell, &pos) in record.extras.drain(..).zip(&positions) {
                extras[pos] = cell;
            }
            record.extras = extras;
            records.push(record);
        }
    }

    RawTable::new(records, columns)
}

struct ExtraColumn {
    index: usize,
    name: String,
    ty: ColumnType,
}

/// Header positions of one source
struct ColumnLayout {
    path: PathBuf,
    required: HashMap<&'static str, usize>,
    extras: Vec<ExtraColumn>,
}

impl ColumnLayout {
    fn resolve(path: &Path, headers: &csv::StringRecord, overrides: &DtypeOverrides) -> Result<Self, LoadError> {
        let names: Vec<String> = headers
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();

        for (column, requested) in overrides {
            if let Some(required) = required_type(column) {
                if required != *requested {
                    return Err(LoadError::OverrideConflict {
                        path: path.to_path_buf(),
                        column: column.clone(),
                        required: required.to_string(),
                        requested: requested.to_string(),
                    });
                }
            } else if !names.contains(column) {
                debug!("Override for '{}' ignored: not present in {}", column, path.display());
            }
        }

        let mut required = HashMap::new();
        for &(column, _) in REQUIRED_COLUMNS {
            let index = names
                .iter()
                .position(|n| n == column)
                .ok_or_else(|| LoadError::MissingColumn {
                    path: path.to_path_buf(),
                    column,
                })?;
            required.insert(column, index);
        }

        let extras = names
            .iter()
            .enumerate()
            .filter(|(_, name)| required_type(name).is_none())
            .map(|(index, name)| ExtraColumn {
                index,
                name: name.clone(),
                ty: overrides.get(name).copied().unwrap_or(ColumnType::Text),
            })
            .collect();

        Ok(Self {
            path: path.to_path_buf(),
            required,
            extras,
        })
    }

    fn parse_row(&self, row: &csv::StringRecord) -> Result<Transaction, LoadError> {
        let line = row.position().map(|p| p.line()).unwrap_or(0);
        let cell = |column: &'static str| row.get(self.required[column]).unwrap_or("");

        let invalid = |column: &str, value: &str, reason: String| LoadError::InvalidValue {
            path: self.path.clone(),
            line,
            column: column.to_string(),
            value: value.to_string(),
            reason,
        };

        let parse = |column: &'static str, parser: fn(&str) -> Result<CellValue, String>| {
            let value = cell(column);
            parser(value).map_err(|reason| invalid(column, value, reason))
        };

        let store_id = match parse(schema::STORE_ID, parse_integer)? {
            CellValue::Integer(v) => v,
            _ => return Err(invalid(schema::STORE_ID, cell(schema::STORE_ID), "expected integer".into())),
        };
        let sales = match parse(schema::SALES, parse_float)? {
            CellValue::Float(v) if v >= 0.0 => v,
            _ => return Err(invalid(schema::SALES, cell(schema::SALES), "expected non-negative number".into())),
        };
        let on_promotion = matches!(parse(schema::ON_PROMOTION, parse_boolean)?, CellValue::Boolean(true));
        let year = bounded(cell(schema::YEAR), i32::MIN as i64, i32::MAX as i64)
            .map_err(|reason| invalid(schema::YEAR, cell(schema::YEAR), reason))? as i32;
        let month = bounded(cell(schema::MONTH), 1, 12)
            .map_err(|reason| invalid(schema::MONTH, cell(schema::MONTH), reason))? as u32;
        let week = bounded(cell(schema::WEEK), 1, 53)
            .map_err(|reason| invalid(schema::WEEK, cell(schema::WEEK), reason))? as u32;
        let day_of_week = parse_weekday(cell(schema::DAY_OF_WEEK))
            .map_err(|reason| invalid(schema::DAY_OF_WEEK, cell(schema::DAY_OF_WEEK), reason))?;

        let text = |column: &'static str| -> Result<String, LoadError> {
            let value = cell(column);
            if value.is_empty() {
                return Err(invalid(column, value, "must not be empty".into()));
            }
            Ok(value.to_string())
        };
        let family = text(schema::FAMILY)?;
        let store_type = text(schema::STORE_TYPE)?;
        let state = text(schema::STATE)?;
        let city = text(schema::CITY)?;

        let mut extras = Vec::with_capacity(self.extras.len());
        for extra in &self.extras {
            let value = row.get(extra.index).unwrap_or("");
            extras.push(coerce(value, extra.ty).map_err(|reason| invalid(&extra.name, value, reason))?);
        }

        Ok(Transaction {
            store_id,
            day_of_week,
            week,
            month,
            year,
            family,
            sales,
            on_promotion,
            store_type,
            state,
            city,
            extras,
        })
    }
}

/// Coerce a raw cell to the given type; empty cells are null
fn coerce(value: &str, ty: ColumnType) -> Result<CellValue, String> {
    if value.is_empty() {
        return Ok(CellValue::Null);
    }
    match ty {
        ColumnType::Text => Ok(CellValue::Text(value.to_string())),
        ColumnType::Integer => parse_integer(value),
        ColumnType::Float => parse_float(value),
        ColumnType::Boolean => parse_boolean(value),
    }
}

fn parse_integer(value: &str) -> Result<CellValue, String> {
    if let Ok(v) = value.parse::<i64>() {
        return Ok(CellValue::Integer(v));
    }
    // Integers written as "12.0" by spreadsheet exports; `as` saturates, so
    // anything outside i64 must be rejected before the cast
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() && v.fract() == 0.0 && v >= i64::MIN as f64 && v < i64::MAX as f64 => {
            Ok(CellValue::Integer(v as i64))
        }
        _ => Err("expected integer".to_string()),
    }
}

fn parse_float(value: &str) -> Result<CellValue, String> {
    match value.parse::<f64>() {
        Ok(v) if v.is_finite() => Ok(CellValue::Float(v)),
        _ => Err("expected number".to_string()),
    }
}

/// Booleans may be words or numbers; any non-zero number is true
fn parse_boolean(value: &str) -> Result<CellValue, String> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "t" | "yes" => return Ok(CellValue::Boolean(true)),
        "false" | "f" | "no" => return Ok(CellValue::Boolean(false)),
        _ => {}
    }
    match value.parse::<f64>() {
        Ok(v) if !v.is_nan() => Ok(CellValue::Boolean(v != 0.0)),
        _ => Err("expected boolean or number".to_string()),
    }
}

fn bounded(value: &str, min: i64, max: i64) -> Result<i64, String> {
    match parse_integer(value)? {
        CellValue::Integer(v) if (min..=max).contains(&v) => Ok(v),
        _ => Err(format!("expected integer in {min}..={max}")),
    }
}

/// Day names ("Monday", "mon") or 0..=6 counting from Monday
fn parse_weekday(value: &str) -> Result<Weekday, String> {
    if let Ok(day) = Weekday::from_str(value) {
        return Ok(day);
    }
    match value.parse::<u8>() {
        Ok(n) if n < 7 => Ok((0..n).fold(Weekday::Mon, |day, _| day.succ())),
        _ => Err("expected day name or 0..=6".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const HEADER: &str = "store_nbr,family,sales,onpromotion,store_type,state,city,year,month,week,day_of_week";

    fn write_csv(body: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(body.as_bytes()).unwrap();
        file
    }

    #[test]
    fn concatenates_sources_in_order() {
        let a = write_csv(&format!(
            "{HEADER}\n1,BREAD,10.5,0,D,Pichincha,Quito,2016,1,1,Friday\n1,DAIRY,3,2,D,Pichincha,Quito,2016,1,1,Friday\n"
        ));
        let b = write_csv(&format!("{HEADER}\n7,BEVERAGES,4,0,A,Guayas,Guayaquil,2017,12,52,Sun\n"));

        let table = load(&[a.path(), b.path()], &DtypeOverrides::new()).unwrap();
        let families: Vec<&str> = table.records().iter().map(|r| r.family.as_str()).collect();
        assert_eq!(families, ["BREAD", "DAIRY", "BEVERAGES"]);

        let first = &table.records()[0];
        assert_eq!(first.store_id, 1);
        assert_eq!(first.day_of_week, Weekday::Fri);
        assert!(!first.on_promotion);
        assert!(table.records()[1].on_promotion);
        assert_eq!(table.records()[2].day_of_week, Weekday::Sun);
    }

    #[test]
    fn missing_source_is_load_error() {
        let err = load(&["does/not/exist.csv"], &DtypeOverrides::new()).unwrap_err();
        assert!(matches!(err, LoadError::Missing(_)));
    }

    #[test]
    fn no_sources_is_load_error() {
        let sources: [&str; 0] = [];
        let err = load(&sources, &DtypeOverrides::new()).unwrap_err();
        assert!(matches!(err, LoadError::NoSources));
    }

    #[test]
    fn missing_required_column() {
        let file = write_csv("store_nbr,family,sales\n1,BREAD,1\n");
        let err = load(&[file.path()], &DtypeOverrides::new()).unwrap_err();
        assert!(matches!(err, LoadError::MissingColumn { column: "onpromotion", .. }));
    }

    #[test]
    fn negative_sales_rejected_with_line() {
        let file = write_csv(&format!(
            "{HEADER}\n1,BREAD,1,0,D,Pichincha,Quito,2016,1,1,Mon\n1,BREAD,-2,0,D,Pichincha,Quito,2016,1,1,Mon\n"
        ));
        let err = load(&[file.path()], &DtypeOverrides::new()).unwrap_err();
        match err {
            LoadError::InvalidValue { line, column, .. } => {
                assert_eq!(line, 3);
                assert_eq!(column, "sales");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn week_out_of_range_rejected() {
        let file = write_csv(&format!("{HEADER}\n1,BREAD,1,0,D,Pichincha,Quito,2016,1,54,Mon\n"));
        let err = load(&[file.path()], &DtypeOverrides::new()).unwrap_err();
        assert!(matches!(err, LoadError::InvalidValue { ref column, .. } if column == "week"));
    }

    #[test]
    fn store_id_beyond_i64_rejected() {
        for huge in ["1e20", "9.3e18"] {
            let file = write_csv(&format!("{HEADER}\n{huge},BREAD,1,0,D,Pichincha,Quito,2016,1,1,Mon\n"));
            let err = load(&[file.path()], &DtypeOverrides::new()).unwrap_err();
            match err {
                LoadError::InvalidValue { column, value, .. } => {
                    assert_eq!(column, "store_nbr");
                    assert_eq!(value, huge);
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        assert_eq!(parse_integer("12.0"), Ok(CellValue::Integer(12)));
        assert_eq!(parse_integer("-9.2e18"), Ok(CellValue::Integer(-9_200_000_000_000_000_000)));
    }

    #[test]
    fn overrides_coerce_extra_columns() {
        let file = write_csv(&format!(
            "{HEADER},holiday_type,transferred,transactions\n\
             1,BREAD,1,0,D,Pichincha,Quito,2016,1,1,Mon,Holiday,False,2111\n\
             1,BREAD,1,0,D,Pichincha,Quito,2016,1,1,Tue,,,\n"
        ));
        let mut overrides = DtypeOverrides::new();
        overrides.insert("transferred".into(), ColumnType::Boolean);
        overrides.insert("transactions".into(), ColumnType::Integer);

        let table = load(&[file.path()], &overrides).unwrap();
        assert_eq!(table.extra(0, "holiday_type"), Some(&CellValue::Text("Holiday".into())));
        assert_eq!(table.extra(0, "transferred"), Some(&CellValue::Boolean(false)));
        assert_eq!(table.extra(0, "transactions"), Some(&CellValue::Integer(2111)));
        assert_eq!(table.extra(1, "holiday_type"), Some(&CellValue::Null));
    }

    #[test]
    fn override_coercion_failure_is_load_error() {
        let file = write_csv(&format!("{HEADER},transactions\n1,BREAD,1,0,D,Pichincha,Quito,2016,1,1,Mon,many\n"));
        let mut overrides = DtypeOverrides::new();
        overrides.insert("transactions".into(), ColumnType::Integer);

        let err = load(&[file.path()], &overrides).unwrap_err();
        assert!(matches!(err, LoadError::InvalidValue { ref column, .. } if column == "transactions"));
    }

    #[test]
    fn override_conflicting_with_required_column() {
        let file = write_csv(&format!("{HEADER}\n1,BREAD,1,0,D,Pichincha,Quito,2016,1,1,Mon\n"));
        let mut overrides = DtypeOverrides::new();
        overrides.insert("sales".into(), ColumnType::Text);

        let err = load(&[file.path()], &overrides).unwrap_err();
        assert!(matches!(err, LoadError::OverrideConflict { ref column, .. } if column == "sales"));
    }

    #[test]
    fn extra_columns_are_unioned_and_null_filled() {
        let a = write_csv(&format!("{HEADER},locale\n1,BREAD,1,0,D,Pichincha,Quito,2016,1,1,Mon,National\n"));
        let b = write_csv(&format!("{HEADER},description\n2,BREAD,1,0,D,Pichincha,Quito,2016,1,1,Mon,Carnaval\n"));

        let table = load(&[a.path(), b.path()], &DtypeOverrides::new()).unwrap();
        assert_eq!(table.extra_columns(), ["locale", "description"]);
        assert_eq!(table.extra(0, "description"), Some(&CellValue::Null));
        assert_eq!(table.extra(1, "locale"), Some(&CellValue::Null));
        assert_eq!(table.extra(1, "description"), Some(&CellValue::Text("Carnaval".into())));
    }

    #[test]
    fn inconsistent_store_across_sources() {
        let a = write_csv(&format!("{HEADER}\n1,BREAD,1,0,D,Pichincha,Quito,2016,1,1,Mon\n"));
        let b = write_csv(&format!("{HEADER}\n1,BREAD,1,0,A,Pichincha,Quito,2016,1,1,Mon\n"));

        let err = load(&[a.path(), b.path()], &DtypeOverrides::new()).unwrap_err();
        assert!(matches!(err, LoadError::InconsistentStore { attribute: "store_type", .. }));
    }

    #[test]
    fn weekday_accepts_names_and_numbers() {
        assert_eq!(parse_weekday("monday").unwrap(), Weekday::Mon);
        assert_eq!(parse_weekday("Sat").unwrap(), Weekday::Sat);
        assert_eq!(parse_weekday("0").unwrap(), Weekday::Mon);
        assert_eq!(parse_weekday("6").unwrap(), Weekday::Sun);
        assert!(parse_weekday("7").is_err());
        assert!(parse_weekday("someday").is_err());
    }

    #[test]
    fn promotion_counts_normalize_to_bool() {
        assert_eq!(parse_boolean("0").unwrap(), CellValue::Boolean(false));
        assert_eq!(parse_boolean("14").unwrap(), CellValue::Boolean(true));
        assert_eq!(parse_boolean("True").unwrap(), CellValue::Boolean(true));
        assert!(parse_boolean("maybe").is_err());
    }
}
