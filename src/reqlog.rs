//! Append-only request log.
//!
//! One line per prediction, written best-effort: a full disk or bad path must
//! never fail the request that triggered the write.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::schemas::PredictResponse;

pub struct RequestLog {
    path: PathBuf,
}

impl RequestLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Append one log line for a prediction. Errors are swallowed after a
    /// debug log; the caller's request must not fail because of logging.
    pub fn record(&self, response: &PredictResponse) {
        if let Err(e) = self.append(response) {
            log::debug!("request log write failed: {:#}", e);
        }
    }

    fn append(&self, response: &PredictResponse) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("failed to create log directory {}", parent.display())
                })?;
            }
        }

        let (aisle, section) = match &response.location {
            Some(location) => (location.aisle.as_str(), location.section.as_str()),
            None => ("-", "-"),
        };

        let timestamp = chrono::Local::now().format("%Y-%m-%dT%H:%M:%S");
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("failed to open request log {}", self.path.display()))?;
        writeln!(
            file,
            "{} | label={} | conf={:.3} | found={} | aisle={} | section={}",
            timestamp,
            response.predicted_label,
            response.confidence,
            response.found_in_database,
            aisle,
            section
        )?;
        Ok(())
    }
}
