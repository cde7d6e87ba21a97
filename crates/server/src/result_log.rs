//! Shared append-only result log.

use std::path::{Path, PathBuf};

use filestat_analyzer::AnalysisReport;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Separator line between result blocks.
const SEPARATOR: &str = "----------------------------------------";

/// Append-only log of analysis results, shared by all connection handlers.
///
/// Each append (open, write, flush) runs inside one exclusive critical
/// section, so blocks from concurrent handlers never interleave at the
/// byte level.
#[derive(Debug)]
pub struct ResultLog {
    path: PathBuf,
    lock: Mutex<()>,
}

impl ResultLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    /// Appends one result block followed by a separator line.
    pub async fn append(&self, report: &AnalysisReport) -> std::io::Result<()> {
        let block = format!("{}\n{SEPARATOR}\n", report.summary());

        let _guard = self.lock.lock().await;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(block.as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
