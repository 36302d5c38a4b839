use crate::structs::{CleanRecord, GroupMean};
use std::cmp::Ordering;
use std::collections::HashMap;

/// Number of cities listed in the text report.
pub const REPORT_TOP_N: usize = 5;

/// Mean of `value` for every distinct `key`, in first-encountered order.
///
/// Missing values are skipped. A group without any value gets a `NaN` mean.
/// Rows without a key belong to no group.
pub fn group_means<T, K, V>(rows: &[T], key: K, value: V) -> Vec<GroupMean>
where
    K: Fn(&T) -> Option<&str>,
    V: Fn(&T) -> Option<f64>,
{
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut acc: Vec<(&str, f64, usize)> = Vec::new();

    for row in rows {
        let Some(group) = key(row) else {
            continue;
        };
        let slot = *index.entry(group).or_insert_with(|| {
            acc.push((group, 0.0, 0));
            acc.len() - 1
        });
        if let Some(v) = value(row).filter(|v| !v.is_nan()) {
            acc[slot].1 += v;
            acc[slot].2 += 1;
        }
    }

    acc.into_iter()
        .map(|(group, sum, count)| GroupMean {
            group: group.to_string(),
            mean: if count == 0 {
                f64::NAN
            } else {
                sum / count as f64
            },
        })
        .collect()
}

/// The `n` groups with the highest mean, highest first.
///
/// Equal means keep first-encountered order and `NaN` means sort last.
pub fn top_n_by_group_mean<T, K, V>(rows: &[T], key: K, value: V, n: usize) -> Vec<GroupMean>
where
    K: Fn(&T) -> Option<&str>,
    V: Fn(&T) -> Option<f64>,
{
    let mut means = group_means(rows, key, value);
    means.sort_by(|a, b| descending_nan_last(a.mean, b.mean));
    means.truncate(n);
    means
}

/// Every group with a defined mean, lowest first.
///
/// Groups whose mean is `NaN` (no values at all) are left out, so a city with
/// no temperature still listed in the top-N report gets no bar in the chart.
pub fn ascending_group_means<T, K, V>(rows: &[T], key: K, value: V) -> Vec<GroupMean>
where
    K: Fn(&T) -> Option<&str>,
    V: Fn(&T) -> Option<f64>,
{
    let mut means: Vec<GroupMean> = group_means(rows, key, value)
        .into_iter()
        .filter(|m| !m.mean.is_nan())
        .collect();
    means.sort_by(|a, b| a.mean.total_cmp(&b.mean));
    means
}

/// Hottest cities by mean Celsius temperature, as listed in the text report.
pub fn top_cities_by_temperature(rows: &[CleanRecord], n: usize) -> Vec<GroupMean> {
    top_n_by_group_mean(rows, city, temperature, n)
}

/// Mean Celsius temperature of every city, coolest first, as charted.
///
/// Cities without any temperature are omitted.
pub fn city_temperatures_ascending(rows: &[CleanRecord]) -> Vec<GroupMean> {
    ascending_group_means(rows, city, temperature)
}

fn city(record: &CleanRecord) -> Option<&str> {
    record.city.as_deref()
}

fn temperature(record: &CleanRecord) -> Option<f64> {
    record.temperature_celsius
}

fn descending_nan_last(a: f64, b: f64) -> Ordering {
    match (a.is_nan(), b.is_nan()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
    }
}
