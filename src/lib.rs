pub mod aggregate;
pub mod chart;
pub mod dates;
pub mod error;
pub mod extract;
pub mod load;
pub mod structs;
pub mod transform;

// Re-export public API
pub use aggregate::{
    REPORT_TOP_N, city_temperatures_ascending, group_means, top_cities_by_temperature,
    top_n_by_group_mean,
};
pub use chart::render_chart;
pub use dates::{DateFormat, parse_date};
pub use error::{PipelineError, Result};
pub use extract::read_table;
pub use load::{ensure_output_dir, write_csv, write_json, write_parquet, write_report};
pub use structs::{
    CleanConfig, CleanRecord, CleanedTable, CleaningStats, GroupMean, OutputConfig, SimpleLogger,
    Table, WeatherRecord,
};
pub use transform::{clean, impute_group_mean, normalize_category};
