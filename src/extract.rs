use crate::error::{PipelineError, Result};
use crate::structs::{
    CITY, Column, DATE, HUMIDITY_PERCENT, TEMPERATURE_CELSIUS, Table, WEATHER_CONDITION,
    WIND_SPEED_KPH, WeatherRecord,
};
use csv::{ReaderBuilder, StringRecord};
use log::debug;
use std::io::Read;
use std::path::Path;

/// Cell contents read as a missing value.
const NA_VALUES: [&str; 19] = [
    "", "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "null", "NULL", "None", "<NA>", "#N/A",
    "#NA", "#N/A N/A", "-1.#IND", "1.#IND", "-1.#QNAN", "1.#QNAN",
];

const REQUIRED_COLUMNS: [(&str, Column); 6] = [
    (CITY, Column::City),
    (DATE, Column::Date),
    (WEATHER_CONDITION, Column::WeatherCondition),
    (TEMPERATURE_CELSIUS, Column::TemperatureCelsius),
    (HUMIDITY_PERCENT, Column::HumidityPercent),
    (WIND_SPEED_KPH, Column::WindSpeedKph),
];

/// Reads a comma-separated weather file with a header row into a [`Table`].
///
/// # Errors
/// Returns `PipelineError::Input` if the file cannot be opened or is not
/// valid CSV, and `PipelineError::MissingColumn` if a required column is
/// absent from the header.
pub fn read_table(path: &Path) -> Result<Table> {
    debug!("Reading CSV file: {}", path.display());
    let file = std::fs::File::open(path).map_err(|e| PipelineError::Input {
        path: path.to_path_buf(),
        source: csv::Error::from(e),
    })?;
    read_table_from(file, path)
}

/// Reads CSV data from any reader; `source` names it in errors.
pub fn read_table_from<R: Read>(input: R, source: &Path) -> Result<Table> {
    let input_error = |e: csv::Error| PipelineError::Input {
        path: source.to_path_buf(),
        source: e,
    };

    let mut reader = ReaderBuilder::new().flexible(true).from_reader(input);
    let headers: Vec<String> = reader
        .headers()
        .map_err(input_error)?
        .iter()
        .map(str::to_string)
        .collect();
    let layout = build_layout(&headers)?;

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result.map_err(input_error)?;
        rows.push(parse_row(&record, &layout));
    }
    debug!("Read {} rows with {} columns", rows.len(), headers.len());

    Ok(Table {
        headers,
        layout,
        rows,
    })
}

/// Maps each header to its typed column; unknown headers pass through.
fn build_layout(headers: &[String]) -> Result<Vec<Column>> {
    let mut layout = Vec::with_capacity(headers.len());
    let mut extras = 0;
    for header in headers {
        let required = REQUIRED_COLUMNS
            .iter()
            .find(|(name, column)| *name == header.as_str() && !layout.contains(column))
            .map(|&(_, column)| column);
        match required {
            Some(column) => layout.push(column),
            None => {
                layout.push(Column::Extra(extras));
                extras += 1;
            }
        }
    }

    for (name, column) in REQUIRED_COLUMNS {
        if !layout.contains(&column) {
            return Err(PipelineError::MissingColumn(name.to_string()));
        }
    }
    Ok(layout)
}

fn parse_row(record: &StringRecord, layout: &[Column]) -> WeatherRecord {
    let mut row = WeatherRecord::default();
    for (i, column) in layout.iter().enumerate() {
        let cell = record.get(i);
        match column {
            Column::City => row.city = parse_text(cell),
            Column::Date => row.date = parse_text(cell),
            Column::WeatherCondition => row.weather_condition = parse_text(cell),
            Column::TemperatureCelsius => row.temperature_celsius = parse_number(cell),
            Column::HumidityPercent => row.humidity_percent = parse_number(cell),
            Column::WindSpeedKph => row.wind_speed_kph = parse_number(cell),
            Column::Extra(_) => row.extra.push(cell.unwrap_or_default().to_string()),
        }
    }
    row
}

fn is_missing(cell: &str) -> bool {
    NA_VALUES.contains(&cell)
}

fn parse_text(cell: Option<&str>) -> Option<String> {
    cell.filter(|c| !is_missing(c)).map(str::to_string)
}

/// Numeric cells must hold a finite number; `NAN`, `inf` and the like are
/// read as missing.
fn parse_number(cell: Option<&str>) -> Option<f64> {
    let cell = cell.map(str::trim).filter(|c| !is_missing(c))?;
    match cell.parse::<f64>() {
        Ok(v) if v.is_finite() => Some(v),
        _ => {
            debug!("Treating non-numeric value {:?} as missing", cell);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read(data: &str) -> Result<Table> {
        read_table_from(data.as_bytes(), Path::new("test.csv"))
    }

    #[test]
    fn test_reads_required_and_extra_columns() {
        let table = read(
            "station,city,date,weather_condition,temperature_celsius,humidity_percent,wind_speed_kph\n\
             s1,Paris,2020-01-01,Rain,12.5,80,14\n",
        )
        .unwrap();
        assert_eq!(table.headers[0], "station");
        assert_eq!(table.layout[0], Column::Extra(0));
        assert_eq!(table.layout[1], Column::City);

        let row = &table.rows[0];
        assert_eq!(row.city.as_deref(), Some("Paris"));
        assert_eq!(row.date.as_deref(), Some("2020-01-01"));
        assert_eq!(row.weather_condition.as_deref(), Some("Rain"));
        assert_eq!(row.temperature_celsius, Some(12.5));
        assert_eq!(row.humidity_percent, Some(80.0));
        assert_eq!(row.wind_speed_kph, Some(14.0));
        assert_eq!(row.extra, vec!["s1".to_string()]);
    }

    #[test]
    fn test_missing_value_tokens() {
        let table = read(
            "city,date,weather_condition,temperature_celsius,humidity_percent,wind_speed_kph\n\
             ,NA,NaN,N/A,null,\n\
             Rome,2020-01-01, sunny ,abc, 40 ,None\n",
        )
        .unwrap();
        assert_eq!(table.rows[0], WeatherRecord::default());

        let row = &table.rows[1];
        assert_eq!(row.weather_condition.as_deref(), Some(" sunny "));
        assert_eq!(row.temperature_celsius, None);
        assert_eq!(row.humidity_percent, Some(40.0));
        assert_eq!(row.wind_speed_kph, None);
    }

    #[test]
    fn test_non_finite_numbers_are_missing() {
        let table = read(
            "city,date,weather_condition,temperature_celsius,humidity_percent,wind_speed_kph\n\
             X,2020-01-01,Rain,NAN, nan ,inf\n\
             X,2020-01-02,Rain,-Infinity,infinity, 7.5\n",
        )
        .unwrap();
        assert_eq!(table.rows[0].temperature_celsius, None);
        assert_eq!(table.rows[0].humidity_percent, None);
        assert_eq!(table.rows[0].wind_speed_kph, None);
        assert_eq!(table.rows[1].temperature_celsius, None);
        assert_eq!(table.rows[1].humidity_percent, None);
        assert_eq!(table.rows[1].wind_speed_kph, Some(7.5));
    }

    #[test]
    fn test_short_rows_are_padded_with_missing_values() {
        let table = read(
            "city,date,weather_condition,temperature_celsius,humidity_percent,wind_speed_kph,note\n\
             Oslo,2020-01-01,Snow\n",
        )
        .unwrap();
        let row = &table.rows[0];
        assert_eq!(row.city.as_deref(), Some("Oslo"));
        assert_eq!(row.temperature_celsius, None);
        assert_eq!(row.extra, vec![String::new()]);
    }

    #[test]
    fn test_missing_required_column() {
        let err = read("city,date,temperature_celsius,humidity_percent,wind_speed_kph\n").unwrap_err();
        match err {
            PipelineError::MissingColumn(name) => assert_eq!(name, "weather_condition"),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unreadable_file_is_input_error() {
        let err = read_table(Path::new("/definitely/not/here.csv")).unwrap_err();
        assert!(matches!(err, PipelineError::Input { .. }));
    }
}
