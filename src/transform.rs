use crate::dates::parse_date;
use crate::structs::{
    CleanConfig, CleanRecord, CleanedTable, CleaningStats, HUMIDITY_PERCENT, TEMPERATURE_CELSIUS,
    Table, WIND_SPEED_KPH, WeatherRecord,
};
use log::{debug, info};
use std::collections::HashMap;

/// Category label removed after normalization.
const UNKNOWN_CONDITION: &str = "Unknown";

/// Nullable numeric columns that are filled from their city's mean.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NumericColumn {
    TemperatureCelsius,
    HumidityPercent,
    WindSpeedKph,
}

impl NumericColumn {
    pub const ALL: [NumericColumn; 3] = [
        NumericColumn::TemperatureCelsius,
        NumericColumn::HumidityPercent,
        NumericColumn::WindSpeedKph,
    ];

    pub fn name(self) -> &'static str {
        match self {
            NumericColumn::TemperatureCelsius => TEMPERATURE_CELSIUS,
            NumericColumn::HumidityPercent => HUMIDITY_PERCENT,
            NumericColumn::WindSpeedKph => WIND_SPEED_KPH,
        }
    }

    pub fn value(self, record: &WeatherRecord) -> Option<f64> {
        match self {
            NumericColumn::TemperatureCelsius => record.temperature_celsius,
            NumericColumn::HumidityPercent => record.humidity_percent,
            NumericColumn::WindSpeedKph => record.wind_speed_kph,
        }
    }

    fn slot(self, record: &mut WeatherRecord) -> &mut Option<f64> {
        match self {
            NumericColumn::TemperatureCelsius => &mut record.temperature_celsius,
            NumericColumn::HumidityPercent => &mut record.humidity_percent,
            NumericColumn::WindSpeedKph => &mut record.wind_speed_kph,
        }
    }
}

/// Runs the full cleaning pipeline over an ingested table.
///
/// Stages run in a fixed order, each relying on the previous one:
///
/// 1. Fill missing temperature, humidity and wind speed with the city's
///    rounded mean.
/// 2. Drop rows without a `date` or `weather_condition`.
/// 3. Parse `date` against the known layouts. Rows that match none keep an
///    empty date unless `config.drop_unparsed_dates` is set.
/// 4. Derive `temperature_fahrenheit` from `temperature_celsius`.
/// 5. Trim and title-case `weather_condition`.
/// 6. Drop rows whose condition is `Unknown`.
///
/// Malformed cells degrade to empty values; cleaning itself cannot fail.
///
/// # Arguments
///
/// * `table` - Ingested rows with their source header layout
/// * `config` - Cleaning options, currently whether to drop unparsed dates
///
/// # Returns
///
/// The surviving rows in input order, the unchanged header layout, and the
/// per-stage counts in `CleaningStats`.
pub fn clean(table: Table, config: &CleanConfig) -> CleanedTable {
    let Table {
        headers,
        layout,
        mut rows,
    } = table;
    let mut stats = CleaningStats {
        input_rows: rows.len(),
        ..CleaningStats::default()
    };

    for column in NumericColumn::ALL {
        let filled = impute_group_mean(&mut rows, |r| r.city.as_deref(), column);
        debug!("Imputed {} missing {} values", filled, column.name());
        match column {
            NumericColumn::TemperatureCelsius => stats.imputed_temperature = filled,
            NumericColumn::HumidityPercent => stats.imputed_humidity = filled,
            NumericColumn::WindSpeedKph => stats.imputed_wind_speed = filled,
        }
    }

    let before = rows.len();
    rows.retain(|r| r.date.is_some() && r.weather_condition.is_some());
    stats.dropped_incomplete = before - rows.len();
    debug!(
        "Dropped {} rows missing date or weather condition",
        stats.dropped_incomplete
    );

    let mut cleaned = Vec::with_capacity(rows.len());
    for record in rows {
        let date = record.date.as_deref().and_then(parse_date);
        if date.is_none() {
            stats.unparsed_dates += 1;
            debug!("Unrecognised date format: {:?}", record.date);
            if config.drop_unparsed_dates {
                stats.dropped_unparsed_dates += 1;
                continue;
            }
        }

        let weather_condition = normalize_category(record.weather_condition.as_deref());
        if weather_condition == UNKNOWN_CONDITION {
            stats.dropped_unknown += 1;
            continue;
        }

        cleaned.push(CleanRecord {
            city: record.city,
            date,
            weather_condition,
            temperature_fahrenheit: record.temperature_celsius.map(celsius_to_fahrenheit),
            temperature_celsius: record.temperature_celsius,
            humidity_percent: record.humidity_percent,
            wind_speed_kph: record.wind_speed_kph,
            extra: record.extra,
        });
    }
    stats.output_rows = cleaned.len();

    info!(
        "Cleaned {} rows into {} ({} incomplete, {} unknown condition, {} unparsed dates)",
        stats.input_rows,
        stats.output_rows,
        stats.dropped_incomplete,
        stats.dropped_unknown,
        stats.unparsed_dates
    );

    CleanedTable {
        headers,
        layout,
        rows: cleaned,
        stats,
    }
}

/// Fills missing values of `column` with the rounded mean of the row's group.
///
/// Group means are computed over the untouched column before any value is
/// filled, and `NaN` values do not count towards them. Means round half to
/// even. A group with no values keeps its gaps, and rows without a group key
/// are left alone.
///
/// # Arguments
///
/// * `rows` - Records to fill in place
/// * `key` - Extracts the group label of a record, `None` for no group
/// * `column` - The numeric column to fill
///
/// # Returns
///
/// The number of cells filled.
pub fn impute_group_mean<K>(rows: &mut [WeatherRecord], key: K, column: NumericColumn) -> usize
where
    K: Fn(&WeatherRecord) -> Option<&str>,
{
    let mut sums: HashMap<String, (f64, usize)> = HashMap::new();
    for record in rows.iter() {
        let value = column.value(record).filter(|v| !v.is_nan());
        if let (Some(group), Some(value)) = (key(record), value) {
            let entry = sums.entry(group.to_string()).or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
        }
    }

    let fills: HashMap<String, f64> = sums
        .into_iter()
        .map(|(group, (sum, count))| (group, (sum / count as f64).round_ties_even()))
        .collect();

    let mut filled = 0;
    for record in rows.iter_mut() {
        if column.value(record).is_some() {
            continue;
        }
        let Some(fill) = key(record).and_then(|group| fills.get(group)).copied() else {
            continue;
        };
        *column.slot(record) = Some(fill);
        filled += 1;
    }
    filled
}

/// Canonical form of a category label: trimmed and title-cased.
///
/// A missing label becomes `"Nan"`, the title-cased text of a missing value.
pub fn normalize_category(value: Option<&str>) -> String {
    title_case(value.unwrap_or("nan").trim())
}

fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut word_start = true;
    for c in text.chars() {
        if c.is_whitespace() {
            word_start = true;
            out.push(c);
        } else if word_start {
            word_start = false;
            out.extend(c.to_uppercase());
        } else {
            out.extend(c.to_lowercase());
        }
    }
    out
}

/// °F = (°C × 9/5) + 32
pub fn celsius_to_fahrenheit(temp_celsius: f64) -> f64 {
    temp_celsius * 9.0 / 5.0 + 32.0
}
