//! Core module - analytics engine and service access

pub mod aggregator;
pub mod catalog;
pub mod client;
pub mod config;
pub mod error;
pub mod export;
pub mod histogram;
pub mod identity;
pub mod notice;
pub mod source;
pub mod stats;
pub mod wafer;

pub use aggregator::{
    CachedResults, FetchOutcome, FetchTicket, ResultSetAggregator, ResultStore,
    DEFAULT_PAGE_SIZE, MAX_SELECTED_TESTS,
};
pub use catalog::{merge_catalogs, sort_by_fail_rate};
pub use client::{is_stdf_file, upload_percent, HttpClient};
pub use config::{Config, ConfigError};
pub use error::{AnalyticsError, ParseJobError, TransportError, ValidationError};
pub use export::{records_to_csv, write_csv_file, ExportError};
pub use histogram::{build_histogram, Histogram, HistogramBin};
pub use identity::{ensure_mergeable, ProgramIdentity, SourceFile};
pub use notice::{Notice, NoticeLevel};
pub use source::DataSource;
pub use stats::{capability_stats, CapabilityStats};
pub use wafer::{project_wafer, GridLayout, WaferProjection};
