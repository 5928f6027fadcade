//! FileSink - appends every flushed block to a transcript file

use chrono::{SecondsFormat, Utc};
use contracts::{ContractError, TextSink, BLOCK_SEPARATOR};
use std::collections::HashMap;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use tokio::fs::File;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument};

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Transcript file, created if missing
    pub path: PathBuf,
}

impl FileSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let path = params
            .get("path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./chat_transcript.log"));

        Self { path }
    }
}

/// Sink that writes one line per block: `<utc timestamp>\t<fragments joined by " | ">`
pub struct FileSink {
    name: String,
    config: FileSinkConfig,
    file: Option<File>,
}

impl FileSink {
    /// Create a new FileSink, opening the file in append mode
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        if let Some(parent) = config.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&config.path)?;

        Ok(Self {
            name: name.into(),
            config,
            file: Some(File::from_std(file)),
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        let config = FileSinkConfig::from_params(params);
        Self::new(name, config)
    }

    fn format_line(text: &str) -> String {
        format!(
            "{}\t{}\n",
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            text.replace(BLOCK_SEPARATOR, " | ")
        )
    }
}

impl TextSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_send",
        skip(self, text),
        fields(sink = %self.name, path = %self.config.path.display())
    )]
    async fn send(&mut self, text: &str) -> Result<(), ContractError> {
        let name = &self.name;
        let file = self
            .file
            .as_mut()
            .ok_or_else(|| ContractError::sink_failure(name, "file already closed"))?;

        let line = Self::format_line(text);
        file.write_all(line.as_bytes())
            .await
            .map_err(|e| ContractError::sink_failure(name, e.to_string()))?;
        file.flush()
            .await
            .map_err(|e| ContractError::sink_failure(name, e.to_string()))?;

        debug!(sink = %name, bytes = line.len(), "Block written");
        Ok(())
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        if let Some(mut file) = self.file.take() {
            file.flush().await?;
        }
        debug!(sink = %self.name, "FileSink closed");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_file_sink_appends_lines() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("nested").join("transcript.log");
        let config = FileSinkConfig { path: path.clone() };

        let mut sink = FileSink::new("test_file", config).unwrap();
        sink.send(&format!("alice:hi{BLOCK_SEPARATOR}bob:yo"))
            .await
            .unwrap();
        sink.send("carol:hey").await.unwrap();
        sink.close().await.unwrap();

        let content = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with("\talice:hi | bob:yo"), "got: {}", lines[0]);
        assert!(lines[1].ends_with("\tcarol:hey"), "got: {}", lines[1]);
    }

    #[tokio::test]
    async fn test_file_sink_send_after_close_fails() {
        let temp_dir = TempDir::new().unwrap();
        let config = FileSinkConfig {
            path: temp_dir.path().join("t.log"),
        };
        let mut sink = FileSink::new("test_file", config).unwrap();
        sink.close().await.unwrap();
        assert!(sink.send("late").await.is_err());
    }

    #[test]
    fn test_file_sink_config_default_path() {
        let config = FileSinkConfig::from_params(&HashMap::new());
        assert_eq!(config.path, PathBuf::from("./chat_transcript.log"));
    }
}
