use chrono::NaiveDate;
use log::{Log, Metadata, Record as LogRecord};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const CITY: &str = "city";
pub const DATE: &str = "date";
pub const WEATHER_CONDITION: &str = "weather_condition";
pub const TEMPERATURE_CELSIUS: &str = "temperature_celsius";
pub const HUMIDITY_PERCENT: &str = "humidity_percent";
pub const WIND_SPEED_KPH: &str = "wind_speed_kph";
pub const TEMPERATURE_FAHRENHEIT: &str = "temperature_fahrenheit";

/// Simple logger implementation
pub struct SimpleLogger;

impl Log for SimpleLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &LogRecord) {
        if self.enabled(record.metadata()) {
            println!("[{}] {}", record.level(), record.args());
        }
    }

    fn flush(&self) {}
}

/// Where a header position sits in the typed record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Column {
    City,
    Date,
    WeatherCondition,
    TemperatureCelsius,
    HumidityPercent,
    WindSpeedKph,
    /// Index into `extra` of a pass-through column.
    Extra(usize),
}

/// One ingested row. Every required field may be missing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WeatherRecord {
    pub city: Option<String>,
    pub date: Option<String>,
    pub weather_condition: Option<String>,
    pub temperature_celsius: Option<f64>,
    pub humidity_percent: Option<f64>,
    pub wind_speed_kph: Option<f64>,
    pub extra: Vec<String>,
}

/// Ingested record table, keeping the source header order.
#[derive(Debug, Clone, Default)]
pub struct Table {
    pub headers: Vec<String>,
    pub layout: Vec<Column>,
    pub rows: Vec<WeatherRecord>,
}

impl Table {
    /// Builds a table with only the required columns, in canonical order.
    pub fn from_records(rows: Vec<WeatherRecord>) -> Self {
        let headers = [
            CITY,
            DATE,
            WEATHER_CONDITION,
            TEMPERATURE_CELSIUS,
            HUMIDITY_PERCENT,
            WIND_SPEED_KPH,
        ]
        .iter()
        .map(|h| h.to_string())
        .collect();
        let layout = vec![
            Column::City,
            Column::Date,
            Column::WeatherCondition,
            Column::TemperatureCelsius,
            Column::HumidityPercent,
            Column::WindSpeedKph,
        ];
        Self {
            headers,
            layout,
            rows,
        }
    }
}

/// A row after cleaning. `date` is `None` when no known format matched.
#[derive(Debug, Clone, PartialEq)]
pub struct CleanRecord {
    pub city: Option<String>,
    pub date: Option<NaiveDate>,
    pub weather_condition: String,
    pub temperature_celsius: Option<f64>,
    pub humidity_percent: Option<f64>,
    pub wind_speed_kph: Option<f64>,
    pub temperature_fahrenheit: Option<f64>,
    pub extra: Vec<String>,
}

/// Row counts collected while cleaning, reported at the end of a run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CleaningStats {
    pub input_rows: usize,
    pub imputed_temperature: usize,
    pub imputed_humidity: usize,
    pub imputed_wind_speed: usize,
    pub dropped_incomplete: usize,
    pub unparsed_dates: usize,
    pub dropped_unparsed_dates: usize,
    pub dropped_unknown: usize,
    pub output_rows: usize,
}

/// Output of the cleaning pipeline.
#[derive(Debug, Clone, Default)]
pub struct CleanedTable {
    pub headers: Vec<String>,
    pub layout: Vec<Column>,
    pub rows: Vec<CleanRecord>,
    pub stats: CleaningStats,
}

impl CleanedTable {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Mean of a numeric column for one group, `NaN` when the group has no values.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupMean {
    pub group: String,
    pub mean: f64,
}

/// Configuration for the cleaning pipeline
#[derive(Debug, Clone, Default)]
pub struct CleanConfig {
    /// Drop rows whose date matched none of the known formats instead of
    /// keeping them with an empty date.
    pub drop_unparsed_dates: bool,
}

/// Where and what to write after cleaning
#[derive(Debug, Clone)]
pub struct OutputConfig {
    pub folder: PathBuf,
    pub csv_filename: String,
    pub report_filename: String,
    pub chart_filename: Option<String>,
    pub json_filename: Option<String>,
    pub parquet_filename: Option<String>,
}

impl OutputConfig {
    pub fn csv_path(&self) -> PathBuf {
        self.folder.join(&self.csv_filename)
    }

    pub fn report_path(&self) -> PathBuf {
        self.folder.join(&self.report_filename)
    }

    pub fn chart_path(&self) -> Option<PathBuf> {
        self.chart_filename.as_ref().map(|name| self.folder.join(name))
    }

    pub fn json_path(&self) -> Option<PathBuf> {
        self.json_filename.as_ref().map(|name| self.folder.join(name))
    }

    pub fn parquet_path(&self) -> Option<PathBuf> {
        self.parquet_filename
            .as_ref()
            .map(|name| self.folder.join(name))
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            folder: PathBuf::from("outputs"),
            csv_filename: "transformed_weather_data.csv".to_string(),
            report_filename: "top_5_hottest_cities.txt".to_string(),
            chart_filename: Some("avg_temperature_per_city.png".to_string()),
            json_filename: None,
            parquet_filename: None,
        }
    }
}
