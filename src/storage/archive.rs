use crate::dedup::DigestItem;
use crate::pipeline::RunResult;
use crate::storage::traits::{RunStore, StorageError, StorageResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// One archived run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchiveRecord {
    pub result: RunResult,
    pub items: Vec<DigestItem>,
}

/// Run store appending one JSON document per run to a file
#[derive(Debug)]
pub struct JsonlArchive {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlArchive {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl RunStore for JsonlArchive {
    async fn store(&self, result: &RunResult, items: &[DigestItem]) -> StorageResult<()> {
        let record = ArchiveRecord {
            result: result.clone(),
            items: items.to_vec(),
        };
        let mut line = serde_json::to_string(&record)?;
        line.push('\n');

        let _guard = self.write_lock.lock().await;
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.flush().await?;

        tracing::debug!("Archived run {} to {}", result.run_id, self.path.display());
        Ok(())
    }
}

/// Reads every record of an archive, oldest first
///
/// A missing file is an empty archive. Blank lines are skipped.
pub async fn load_archive(path: &Path) -> StorageResult<Vec<ArchiveRecord>> {
    let content = match tokio::fs::read_to_string(path).await {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(e.into()),
    };

    content
        .lines()
        .enumerate()
        .filter(|(_, line)| !line.trim().is_empty())
        .map(|(index, line)| {
            serde_json::from_str(line).map_err(|e| StorageError::Corrupt {
                line: index + 1,
                message: e.to_string(),
            })
        })
        .collect()
}
