//! Append-only message log
//!
//! Best-effort persistence: each message is written as its raw bytes
//! followed by a newline. The file is opened and closed on every call.

use std::path::{Path, PathBuf};

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;

use crate::message::Payload;

/// Default log file, relative to the working directory
pub const DEFAULT_LOG_PATH: &str = "chat_log.txt";

/// Fixed-path message log
#[derive(Debug, Clone)]
pub struct MessageLog {
    path: PathBuf,
}

impl MessageLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one line
    ///
    /// The handle is dropped when this returns, whether or not the write
    /// succeeded. Callers log the error and carry on.
    pub async fn save(&self, payload: &Payload) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        let mut line = Vec::with_capacity(payload.as_bytes().len() + 1);
        line.extend_from_slice(payload.as_bytes());
        line.push(b'\n');

        file.write_all(&line).await?;
        file.flush().await
    }
}

impl Default for MessageLog {
    fn default() -> Self {
        Self::new(DEFAULT_LOG_PATH)
    }
}
