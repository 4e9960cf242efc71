pub mod app_config;
pub mod report;
pub mod journal;

pub use app_config::Config;
pub use report::{default_report_path, FileReportWriter, ReportFormat, ReportWriter};
pub use journal::{ActionEntry, ActionJournal};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;
