use crate::StoreResult;
use async_trait::async_trait;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tote_dispatch::Delivery;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// One human readable line per delivery
    #[default]
    Text,
    /// One JSON object per line
    Json,
}

impl ReportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ReportFormat::Text => "txt",
            ReportFormat::Json => "jsonl",
        }
    }
}

/// Destination for delivery reports
#[async_trait]
pub trait ReportWriter: Send + Sync {
    /// Write one line per delivery to `destination`, returning the line count
    async fn write_report(&self, deliveries: &[Delivery], destination: &Path) -> StoreResult<usize>;
}

/// Writes delivery reports to the local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct FileReportWriter {
    format: ReportFormat,
}

impl FileReportWriter {
    pub fn new(format: ReportFormat) -> Self {
        Self { format }
    }

    pub fn format(&self) -> ReportFormat {
        self.format
    }

    pub fn render(&self, deliveries: &[Delivery]) -> StoreResult<String> {
        let mut out = String::new();
        for delivery in deliveries {
            match self.format {
                ReportFormat::Text => out.push_str(&delivery.to_string()),
                ReportFormat::Json => out.push_str(&serde_json::to_string(&delivery.record())?),
            }
            out.push('\n');
        }
        Ok(out)
    }
}

#[async_trait]
impl ReportWriter for FileReportWriter {
    async fn write_report(
        &self,
        deliveries: &[Delivery],
        destination: &Path,
    ) -> StoreResult<usize> {
        let body = self.render(deliveries)?;

        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        match tokio::fs::write(destination, body).await {
            Ok(()) => {
                tracing::info!(
                    path = %destination.display(),
                    deliveries = deliveries.len(),
                    "Delivery report exported"
                );
                Ok(deliveries.len())
            }
            Err(e) => {
                tracing::error!(
                    path = %destination.display(),
                    error = %e,
                    "Failed to write delivery report"
                );
                Err(e.into())
            }
        }
    }
}

/// `delivery-report-YYYY-MM-DD_HH-MM-SS.<ext>` inside `directory`
pub fn default_report_path(directory: &Path, format: ReportFormat) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y-%m-%d_%H-%M-%S");
    directory.join(format!("delivery-report-{}.{}", stamp, format.extension()))
}
