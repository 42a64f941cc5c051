pub mod config;
pub mod schema;

pub use config::{AxisPolicy, ConfigError, ExtractionConfig, PlotFormat, load_extraction_config};
pub use schema::{FeatureMetric, FeatureRow, ROWS_PER_KIND, measurement_names};
