//! Group-by helpers shared by the global and filtered aggregates

use std::collections::BTreeMap;

use crate::data::Transaction;

/// Total sales per key. Keys come back in ascending order and each group is
/// summed in row order, so repeated calls are bit-identical.
pub(crate) fn sum_by<'a, K, I, F>(rows: I, key: F) -> BTreeMap<K, f64>
where
    K: Ord,
    I: IntoIterator<Item = &'a Transaction>,
    F: Fn(&'a Transaction) -> K,
{
    let mut groups = BTreeMap::new();
    for row in rows {
        *groups.entry(key(row)).or_insert(0.0) += row.sales;
    }
    groups
}

/// Groups ordered by sales descending, ties by key ascending
pub(crate) fn rank_descending<K: Ord>(groups: BTreeMap<K, f64>) -> Vec<(K, f64)> {
    let mut ranked: Vec<(K, f64)> = groups.into_iter().collect();
    // stable: equal totals keep ascending key order from the map
    ranked.sort_by(|a, b| b.1.total_cmp(&a.1));
    ranked
}

/// The `n` highest groups, presented in ascending order of sales.
/// Returns everything when fewer than `n` groups exist.
pub(crate) fn top_n_ascending<K: Ord>(groups: BTreeMap<K, f64>, n: usize) -> Vec<(K, f64)> {
    let mut top = rank_descending(groups);
    top.truncate(n);
    top.reverse();
    top
}

/// Most frequent value; ties go to the lowest value
pub(crate) fn mode<'a, I>(values: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for value in values {
        *counts.entry(value).or_insert(0) += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for (value, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((value, count));
        }
    }
    best.map(|(value, _)| value)
}

pub(crate) fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}
