//! Append-only observability log sink.
//!
//! `app://__svc/log?file=<basename>&line=<text>` appends exactly one line to
//! `<log_dir>/<basename>.log`. Only the basenames in [`LOG_SINK_FILES`] are writable.

use super::ServiceRoute;
use crate::error::ProtocolError;
use crate::request::QueryParams;
use crate::response::ProtocolResponse;
use async_trait::async_trait;
use std::path::PathBuf;
use tokio::io::AsyncWriteExt;

/// Writable log basenames.
pub const LOG_SINK_FILES: &[&str] = &[
    "sentry-init-renderer-latest",
    "sentry-init-main-latest",
    "renderer-console-latest",
    "renderer-perf-latest",
];

pub struct LogSinkRoute {
    log_dir: PathBuf,
}

impl LogSinkRoute {
    pub fn new(log_dir: impl Into<PathBuf>) -> Self {
        Self {
            log_dir: log_dir.into(),
        }
    }

    /// Path of the log file for an allowed basename.
    pub fn log_path(&self, basename: &str) -> PathBuf {
        self.log_dir.join(format!("{basename}.log"))
    }

    async fn append(&self, basename: &str, line: &str) -> std::io::Result<()> {
        tokio::fs::create_dir_all(&self.log_dir).await?;
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.log_path(basename))
            .await?;
        let mut record = single_line(line);
        record.push('\n');
        file.write_all(record.as_bytes()).await?;
        file.flush().await
    }
}

/// Collapse embedded line breaks so one request is one line.
fn single_line(text: &str) -> String {
    text.chars()
        .map(|c| if c == '\n' || c == '\r' { ' ' } else { c })
        .collect()
}

#[async_trait]
impl ServiceRoute for LogSinkRoute {
    fn name(&self) -> &str {
        "log"
    }

    async fn handle(&self, query: &QueryParams) -> Result<ProtocolResponse, ProtocolError> {
        let file = query.get("file").unwrap_or_default();
        if !LOG_SINK_FILES.contains(&file) {
            return Err(ProtocolError::InvalidParameters(format!(
                "log file '{file}' is not writable"
            )));
        }
        let line = query
            .get("line")
            .ok_or_else(|| ProtocolError::InvalidParameters("missing 'line'".to_string()))?;

        self.append(file, line)
            .await
            .map_err(ProtocolError::LogWrite)?;
        Ok(ProtocolResponse::json(200, &serde_json::json!({})))
    }
}
