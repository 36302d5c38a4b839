use clap::Parser;
use lib::{
    CleanConfig, OutputConfig, PipelineError, REPORT_TOP_N, SimpleLogger, city_temperatures_ascending,
    clean, ensure_output_dir, read_table, render_chart, top_cities_by_temperature, write_csv,
    write_json, write_parquet, write_report,
};
use log::{debug, error, warn};
use std::path::PathBuf;
use std::time::Instant;

static LOGGER: SimpleLogger = SimpleLogger;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input CSV file with a header row
    #[arg(short, long)]
    input_file: PathBuf,

    /// Output folder (created if missing)
    #[arg(short, long, default_value = "outputs")]
    output_dir: PathBuf,

    /// File name of the cleaned CSV
    #[arg(long, default_value = "transformed_weather_data.csv")]
    csv_name: String,

    /// File name of the text report
    #[arg(long, default_value = "top_5_hottest_cities.txt")]
    report_name: String,

    /// File name of the bar chart
    #[arg(long, default_value = "avg_temperature_per_city.png")]
    chart_name: String,

    /// Skip rendering the bar chart
    #[arg(long, default_value_t = false)]
    no_chart: bool,

    /// Also write the report as JSON
    #[arg(long, default_value_t = false)]
    json: bool,

    /// Also write the cleaned table as Parquet
    #[arg(long, default_value_t = false)]
    parquet: bool,

    /// Drop rows whose date matches none of the known formats
    #[arg(long, default_value_t = false)]
    drop_unparsed_dates: bool,

    /// Log level for output
    #[arg(long, default_value = "false")]
    debug: bool,
}

impl Args {
    fn output_config(&self) -> OutputConfig {
        let stem = |name: &str| {
            std::path::Path::new(name)
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| name.to_string())
        };
        OutputConfig {
            folder: self.output_dir.clone(),
            csv_filename: self.csv_name.clone(),
            report_filename: self.report_name.clone(),
            chart_filename: (!self.no_chart).then(|| self.chart_name.clone()),
            json_filename: self
                .json
                .then(|| format!("{}.json", stem(&self.report_name))),
            parquet_filename: self
                .parquet
                .then(|| format!("{}.parquet", stem(&self.csv_name))),
        }
    }
}

fn main() -> Result<(), PipelineError> {
    // Initialize timer and logger
    let total_start = Instant::now();
    log::set_logger(&LOGGER).unwrap();

    // Acquire CLI args
    let args = Args::parse();
    if args.debug {
        log::set_max_level(log::LevelFilter::Debug);
    } else {
        log::set_max_level(log::LevelFilter::Info);
    }

    let output = args.output_config();
    let config = CleanConfig {
        drop_unparsed_dates: args.drop_unparsed_dates,
    };
    debug!("Input file: {}", args.input_file.display());
    debug!("Cleaning configuration: {:?}", config);
    debug!("Output configuration: {:?}", output);

    // Ingest
    println!("Weather Cleaner! Rust Weather Data Pipeline");
    let read_start = Instant::now();
    let table = read_table(&args.input_file)?;
    println!(
        "Read {} rows from {} in {:.2?}",
        table.rows.len(),
        args.input_file.display(),
        read_start.elapsed()
    );

    // Clean
    let clean_start = Instant::now();
    let cleaned = clean(table, &config);
    let stats = &cleaned.stats;
    println!(
        "Cleaning completed in {:.2?} | {} of {} rows kept",
        clean_start.elapsed(),
        stats.output_rows,
        stats.input_rows
    );
    debug!(
        "Imputed values: temperature={}, humidity={}, wind speed={}",
        stats.imputed_temperature, stats.imputed_humidity, stats.imputed_wind_speed
    );
    if stats.unparsed_dates > 0 {
        warn!(
            "{} rows have a date in an unrecognised format{}",
            stats.unparsed_dates,
            if config.drop_unparsed_dates {
                " and were dropped"
            } else {
                " and were kept with an empty date"
            }
        );
    }
    if cleaned.is_empty() {
        warn!("No rows survived cleaning; writing empty outputs");
    }

    // Write artifacts, each independently of the others
    ensure_output_dir(&output.folder)?;
    let io_start = Instant::now();
    let mut failures: Vec<PipelineError> = Vec::new();

    let csv_path = output.csv_path();
    match write_csv(&cleaned, &csv_path) {
        Ok(()) => println!("CSV data saved to: {}", csv_path.display()),
        Err(e) => {
            error!("{}", e);
            failures.push(e);
        }
    }

    let top = top_cities_by_temperature(&cleaned.rows, REPORT_TOP_N);
    let report_path = output.report_path();
    match write_report(&top, &report_path) {
        Ok(()) => println!("Temperature report saved to: {}", report_path.display()),
        Err(e) => {
            error!("{}", e);
            failures.push(e);
        }
    }

    if let Some(json_path) = output.json_path() {
        match write_json(&top, &json_path) {
            Ok(()) => println!("JSON report saved to: {}", json_path.display()),
            Err(e) => {
                error!("{}", e);
                failures.push(e);
            }
        }
    }

    if let Some(parquet_path) = output.parquet_path() {
        match write_parquet(&cleaned, &parquet_path) {
            Ok(()) => println!("Parquet data saved to: {}", parquet_path.display()),
            Err(e) => {
                error!("{}", e);
                failures.push(e);
            }
        }
    }

    if let Some(chart_path) = output.chart_path() {
        let means = city_temperatures_ascending(&cleaned.rows);
        if means.is_empty() {
            warn!("No city temperatures to plot; skipping chart");
        } else {
            match render_chart(&means, &chart_path) {
                Ok(()) => println!("Chart saved to: {}", chart_path.display()),
                Err(e) => {
                    error!("{}", e);
                    failures.push(e);
                }
            }
        }
    }
    println!("All files took {:.2?}", io_start.elapsed());

    // Show summary
    for entry in &top {
        debug!("  {}: {:.2}°C", entry.group, entry.mean);
    }
    println!("\nTotal runtime: {:.2?}", total_start.elapsed());

    match failures.into_iter().next() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}
