use crate::dates::OUTPUT_DATE_FORMAT;
use crate::error::{PipelineError, Result};
use crate::structs::{CleanRecord, CleanedTable, Column, GroupMean, TEMPERATURE_FAHRENHEIT};
use arrow_array::{ArrayRef, Float64Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use chrono::NaiveDate;
use csv::Writer;
use parquet::arrow::ArrowWriter;
use parquet::file::properties::WriterProperties;
use serde::Serialize;
use std::io::Write;
use std::{fs::File, path::Path, sync::Arc};

/// First line of the text report.
pub const REPORT_HEADER: &str = "Top 5 Cities with Highest Average Temperature (°C):";

/// A column of the cleaned output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputColumn {
    Source(Column),
    Fahrenheit,
}

enum Cell<'a> {
    Text(Option<&'a str>),
    Number(Option<f64>),
    Date(Option<NaiveDate>),
}

/// JSON form of the top cities report
#[derive(Debug, Serialize)]
struct TemperatureReport<'a> {
    title: &'a str,
    cities: &'a [GroupMean],
}

/// Creates the output folder if it does not exist yet.
///
/// # Arguments
/// * `folder` - Directory to create, parents included
///
/// # Errors
/// Returns `PipelineError::Output` if the directory cannot be created.
pub fn ensure_output_dir(folder: &Path) -> Result<()> {
    std::fs::create_dir_all(folder).map_err(|source| PipelineError::Output {
        path: folder.to_path_buf(),
        source,
    })
}

/// Writes the cleaned table to a CSV file.
///
/// The source header order is kept and `temperature_fahrenheit` is appended,
/// unless the source already had a column of that name, which then receives
/// the derived values in place. Dates are written `YYYY-MM-DD`; missing
/// values are written as empty cells.
///
/// # Arguments
/// * `table` - Cleaned rows together with the source header layout
/// * `output_path` - File to create or overwrite
///
/// # Returns
/// Returns `Ok(())` on success.
///
/// # Errors
/// Returns `PipelineError::Output` naming `output_path` if the file cannot be
/// created or written to.
pub fn write_csv(table: &CleanedTable, output_path: &Path) -> Result<()> {
    let file = create(output_path)?;
    write_csv_to(table, file, output_path)
}

/// Writes the cleaned table as CSV to any writer; `target` names it in errors.
pub fn write_csv_to<W: Write>(table: &CleanedTable, output: W, target: &Path) -> Result<()> {
    let output_error = |e: csv::Error| PipelineError::Output {
        path: target.to_path_buf(),
        source: std::io::Error::from(e),
    };

    let (headers, columns) = output_layout(table);
    let mut writer = Writer::from_writer(output);

    writer.write_record(&headers).map_err(output_error)?;
    for record in &table.rows {
        writer
            .write_record(columns.iter().map(|&c| render(cell(record, c))))
            .map_err(output_error)?;
    }

    writer.flush().map_err(|source| PipelineError::Output {
        path: target.to_path_buf(),
        source,
    })?;
    Ok(())
}

/// Writes the top cities report as UTF-8 text.
///
/// # Arguments
/// * `top` - Cities with their mean temperature, hottest first
/// * `output_path` - Path where the report will be created
///
/// # Returns
/// Returns `Ok(())` on success.
///
/// # Errors
/// Returns `PipelineError::Output` if the file cannot be created or written to.
pub fn write_report(top: &[GroupMean], output_path: &Path) -> Result<()> {
    let mut file = create(output_path)?;
    file.write_all(render_report(top).as_bytes())
        .map_err(|source| PipelineError::Output {
            path: output_path.to_path_buf(),
            source,
        })
}

/// Text of the top cities report: header, blank line, one line per city.
pub fn render_report(top: &[GroupMean]) -> String {
    let mut out = format!("{}\n\n", REPORT_HEADER);
    for entry in top {
        out.push_str(&format!("{}: {}°C\n", entry.group, format_mean(entry.mean)));
    }
    out
}

/// Writes the top cities report to a pretty-formatted JSON file.
///
/// # Arguments
/// * `top` - Cities with their mean temperature, hottest first
/// * `output_path` - Path where the JSON file will be created
///
/// # Returns
/// Returns `Ok(())` on success.
///
/// # Errors
/// Returns error if file cannot be created or serialization fails.
pub fn write_json(top: &[GroupMean], output_path: &Path) -> Result<()> {
    let file = create(output_path)?;
    let report = TemperatureReport {
        title: REPORT_HEADER,
        cities: top,
    };
    serde_json::to_writer_pretty(file, &report)?;
    Ok(())
}

/// Writes the cleaned table to a columnar Parquet file using Arrow format.
///
/// Numeric columns are nullable Float64, everything else nullable Utf8 with
/// dates in `YYYY-MM-DD`.
///
/// # Arguments
/// * `table` - Cleaned rows together with the source header layout
/// * `output_path` - Path where the Parquet file will be created
///
/// # Returns
/// Returns `Ok(())` on success.
///
/// # Errors
/// Returns error if file cannot be created, schema is invalid, or Arrow operations fail.
pub fn write_parquet(table: &CleanedTable, output_path: &Path) -> Result<()> {
    let (headers, columns) = output_layout(table);

    let mut fields = Vec::with_capacity(columns.len());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(columns.len());
    for (name, &column) in headers.iter().zip(&columns) {
        if is_numeric(column) {
            let values: Float64Array = table
                .rows
                .iter()
                .map(|r| match cell(r, column) {
                    Cell::Number(v) => v,
                    _ => None,
                })
                .collect();
            fields.push(Field::new(name, DataType::Float64, true));
            arrays.push(Arc::new(values));
        } else {
            let values: StringArray = table
                .rows
                .iter()
                .map(|r| match cell(r, column) {
                    Cell::Text(v) => v.map(str::to_string),
                    Cell::Date(d) => d.map(|d| d.format(OUTPUT_DATE_FORMAT).to_string()),
                    Cell::Number(v) => v.map(format_float),
                })
                .collect();
            fields.push(Field::new(name, DataType::Utf8, true));
            arrays.push(Arc::new(values));
        }
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), arrays)?;

    let file = create(output_path)?;
    let props = WriterProperties::builder().build();
    let mut writer = ArrowWriter::try_new(file, schema, Some(props))?;
    writer.write(&batch)?;
    writer.close()?;

    Ok(())
}

fn create(path: &Path) -> Result<File> {
    File::create(path).map_err(|source| PipelineError::Output {
        path: path.to_path_buf(),
        source,
    })
}

fn output_layout(table: &CleanedTable) -> (Vec<String>, Vec<OutputColumn>) {
    let mut headers = table.headers.clone();
    let mut columns: Vec<OutputColumn> = table
        .headers
        .iter()
        .zip(&table.layout)
        .map(|(name, &column)| match column {
            Column::Extra(_) if name == TEMPERATURE_FAHRENHEIT => OutputColumn::Fahrenheit,
            _ => OutputColumn::Source(column),
        })
        .collect();
    if !columns.contains(&OutputColumn::Fahrenheit) {
        headers.push(TEMPERATURE_FAHRENHEIT.to_string());
        columns.push(OutputColumn::Fahrenheit);
    }
    (headers, columns)
}

fn is_numeric(column: OutputColumn) -> bool {
    matches!(
        column,
        OutputColumn::Fahrenheit
            | OutputColumn::Source(
                Column::TemperatureCelsius | Column::HumidityPercent | Column::WindSpeedKph
            )
    )
}

fn cell(record: &CleanRecord, column: OutputColumn) -> Cell<'_> {
    match column {
        OutputColumn::Fahrenheit => Cell::Number(record.temperature_fahrenheit),
        OutputColumn::Source(source) => match source {
            Column::City => Cell::Text(record.city.as_deref()),
            Column::Date => Cell::Date(record.date),
            Column::WeatherCondition => Cell::Text(Some(record.weather_condition.as_str())),
            Column::TemperatureCelsius => Cell::Number(record.temperature_celsius),
            Column::HumidityPercent => Cell::Number(record.humidity_percent),
            Column::WindSpeedKph => Cell::Number(record.wind_speed_kph),
            Column::Extra(i) => Cell::Text(record.extra.get(i).map(String::as_str)),
        },
    }
}

fn render(cell: Cell<'_>) -> String {
    match cell {
        Cell::Text(v) => v.unwrap_or_default().to_string(),
        Cell::Number(v) => v.map(format_float).unwrap_or_default(),
        Cell::Date(d) => d
            .map(|d| d.format(OUTPUT_DATE_FORMAT).to_string())
            .unwrap_or_default(),
    }
}

/// Shortest round-trip form, keeping a trailing `.0` on whole numbers.
fn format_float(v: f64) -> String {
    if v.is_finite() && v.fract() == 0.0 && v.abs() < 1e16 {
        format!("{:.1}", v)
    } else {
        v.to_string()
    }
}

fn format_mean(v: f64) -> String {
    if v.is_nan() {
        "nan".to_string()
    } else {
        format!("{:.2}", v)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structs::CleaningStats;

    fn cleaned(headers: &[&str], layout: Vec<Column>, rows: Vec<CleanRecord>) -> CleanedTable {
        CleanedTable {
            headers: headers.iter().map(|h| h.to_string()).collect(),
            layout,
            rows,
            stats: CleaningStats::default(),
        }
    }

    fn row(city: &str, temp: Option<f64>) -> CleanRecord {
        CleanRecord {
            city: Some(city.to_string()),
            date: NaiveDate::from_ymd_opt(2020, 1, 2),
            weather_condition: "Rain".to_string(),
            temperature_celsius: temp,
            humidity_percent: Some(55.5),
            wind_speed_kph: None,
            temperature_fahrenheit: temp.map(|t| t * 9.0 / 5.0 + 32.0),
            extra: vec!["x".to_string()],
        }
    }

    fn full_layout() -> Vec<Column> {
        vec![
            Column::Date,
            Column::City,
            Column::Extra(0),
            Column::WeatherCondition,
            Column::TemperatureCelsius,
            Column::HumidityPercent,
            Column::WindSpeedKph,
        ]
    }

    const HEADERS: [&str; 7] = [
        "date",
        "city",
        "station",
        "weather_condition",
        "temperature_celsius",
        "humidity_percent",
        "wind_speed_kph",
    ];

    #[test]
    fn test_format_float() {
        assert_eq!(format_float(15.0), "15.0");
        assert_eq!(format_float(-3.0), "-3.0");
        assert_eq!(format_float(12.25), "12.25");
        assert_eq!(format_float(53.6), "53.6");
    }

    #[test]
    fn test_render_report() {
        let top = vec![
            GroupMean {
                group: "Cairo".to_string(),
                mean: 30.0,
            },
            GroupMean {
                group: "Lima".to_string(),
                mean: 19.456,
            },
        ];
        assert_eq!(
            render_report(&top),
            "Top 5 Cities with Highest Average Temperature (°C):\n\nCairo: 30.00°C\nLima: 19.46°C\n"
        );
    }

    #[test]
    fn test_render_empty_report() {
        assert_eq!(render_report(&[]), format!("{}\n\n", REPORT_HEADER));
    }

    #[test]
    fn test_write_csv_keeps_header_order_and_appends_fahrenheit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let table = cleaned(
            &HEADERS,
            full_layout(),
            vec![row("Paris", Some(10.0)), row("Oslo", None)],
        );
        write_csv(&table, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "date,city,station,weather_condition,temperature_celsius,humidity_percent,wind_speed_kph,temperature_fahrenheit"
        );
        assert_eq!(lines[1], "2020-01-02,Paris,x,Rain,10.0,55.5,,50.0");
        assert_eq!(lines[2], "2020-01-02,Oslo,x,Rain,,55.5,,");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_write_csv_fills_existing_fahrenheit_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        let mut headers = HEADERS;
        headers[2] = "temperature_fahrenheit";
        let table = cleaned(&headers, full_layout(), vec![row("Paris", Some(0.0))]);
        write_csv(&table, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(
            lines[0],
            "date,city,temperature_fahrenheit,weather_condition,temperature_celsius,humidity_percent,wind_speed_kph"
        );
        assert_eq!(lines[1], "2020-01-02,Paris,32.0,Rain,0.0,55.5,");
    }

    #[test]
    fn test_write_csv_empty_table_writes_header() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.csv");
        write_csv(&cleaned(&HEADERS, full_layout(), Vec::new()), &path).unwrap();
        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().count(), 1);
    }

    #[test]
    fn test_write_json_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.json");
        let top = vec![GroupMean {
            group: "Cairo".to_string(),
            mean: 30.5,
        }];
        write_json(&top, &path).unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["title"], REPORT_HEADER);
        assert_eq!(value["cities"][0]["group"], "Cairo");
        assert_eq!(value["cities"][0]["mean"], 30.5);
    }

    #[test]
    fn test_write_parquet() {
        use parquet::file::reader::{FileReader, SerializedFileReader};

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.parquet");
        let table = cleaned(
            &HEADERS,
            full_layout(),
            vec![row("Paris", Some(10.0)), row("Oslo", None)],
        );
        write_parquet(&table, &path).unwrap();

        let reader = SerializedFileReader::new(File::open(&path).unwrap()).unwrap();
        let metadata = reader.metadata();
        assert_eq!(metadata.file_metadata().num_rows(), 2);
        assert_eq!(metadata.file_metadata().schema_descr().num_columns(), 8);
    }

    struct BrokenPipe;

    impl Write for BrokenPipe {
        fn write(&mut self, _: &[u8]) -> std::io::Result<usize> {
            Err(std::io::Error::new(std::io::ErrorKind::BrokenPipe, "closed"))
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_failed_csv_write_names_the_output_file() {
        // Enough rows to overflow the writer's buffer before the final flush.
        let rows = (0..2000).map(|_| row("Paris", Some(10.0))).collect();
        let table = cleaned(&HEADERS, full_layout(), rows);
        let err = write_csv_to(&table, BrokenPipe, Path::new("out/cleaned.csv")).unwrap_err();
        match err {
            PipelineError::Output { path, source } => {
                assert_eq!(path, Path::new("out/cleaned.csv"));
                assert!(source.to_string().contains("closed"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_unwritable_path_is_output_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("missing").join("report.txt");
        let err = write_report(&[], &path).unwrap_err();
        assert!(matches!(err, PipelineError::Output { .. }));
    }
}
