//! Directory-backed workflow store
//!
//! Each workflow is one pretty-printed JSON record, `<id>.json`. Writes go
//! to a uniquely named temp file first and are renamed into place, so an
//! interrupted save leaves the last committed record intact and readers
//! never see a partial record.
//!
//! Every write takes an exclusive OS lock on the directory's lock file for
//! the whole read-compare-write. The lock is held per open file, so it
//! serialises stores in other processes and other store instances in this
//! process alike.

use std::fs::{self as std_fs, OpenOptions};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use fd_lock::RwLock as FdRwLock;
use tokio::fs;
use workflow_graph::WorkflowGraph;

use crate::constants::files;
use crate::error::{Result, WorkflowServiceError};
use crate::store::{GraphStore, StoredWorkflow, WorkflowId, WorkflowSummary};

/// Workflow store persisting to a directory
#[derive(Debug, Clone)]
pub struct FileGraphStore {
    dir: PathBuf,
}

impl FileGraphStore {
    /// Create a store over `dir`; the directory is created on first write
    pub fn new(dir: impl AsRef<Path>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Run `op` on a blocking thread while holding the directory write lock
    async fn locked<T, F>(&self, op: F) -> Result<T>
    where
        F: FnOnce(&Path) -> Result<T> + Send + 'static,
        T: Send + 'static,
    {
        let dir = self.dir.clone();
        tokio::task::spawn_blocking(move || {
            std_fs::create_dir_all(&dir)?;
            let file = OpenOptions::new()
                .create(true)
                .truncate(false)
                .write(true)
                .open(dir.join(files::LOCK_FILE))?;
            let mut lock = FdRwLock::new(file);
            let _guard = lock.write()?;
            op(&dir)
        })
        .await
        .map_err(|e| WorkflowServiceError::Io(std::io::Error::other(e)))?
    }
}

/// Path of a workflow record, or None for ids that cannot be file names
fn record_path(dir: &Path, id: &str) -> Option<PathBuf> {
    let safe = !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    safe.then(|| dir.join(format!("{}.{}", id, files::RECORD_EXTENSION)))
}

fn not_found(id: &str) -> WorkflowServiceError {
    WorkflowServiceError::NotFound(id.to_string())
}

fn read_record(dir: &Path, id: &str) -> Result<StoredWorkflow> {
    let path = record_path(dir, id).ok_or_else(|| not_found(id))?;
    let contents = match std_fs::read_to_string(&path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound => return Err(not_found(id)),
        Err(e) => return Err(e.into()),
    };
    Ok(serde_json::from_str(&contents)?)
}

fn write_record(dir: &Path, record: &StoredWorkflow) -> Result<()> {
    let path = record_path(dir, &record.id).ok_or_else(|| not_found(&record.id))?;
    let temp = dir.join(format!(
        "{}.{}.{}.{}",
        record.id,
        files::RECORD_EXTENSION,
        uuid::Uuid::new_v4().simple(),
        files::TEMP_SUFFIX
    ));

    let contents = serde_json::to_string_pretty(record)?;
    let written = std_fs::write(&temp, contents).and_then(|()| std_fs::rename(&temp, &path));
    if let Err(e) = written {
        let _ = std_fs::remove_file(&temp);
        return Err(e.into());
    }
    log::debug!("Wrote workflow '{}' to {:?}", record.id, path);
    Ok(())
}

#[async_trait]
impl GraphStore for FileGraphStore {
    async fn create(&self, graph: &WorkflowGraph) -> Result<WorkflowId> {
        let id = uuid::Uuid::new_v4().to_string();
        let record = StoredWorkflow::new(id.clone(), graph.clone());
        self.locked(move |dir| write_record(dir, &record)).await?;
        log::info!("Created workflow '{}' in {:?}", id, self.dir);
        Ok(id)
    }

    async fn load(&self, id: &str) -> Result<WorkflowGraph> {
        let path = record_path(&self.dir, id).ok_or_else(|| not_found(id))?;
        let contents = match fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => return Err(not_found(id)),
            Err(e) => return Err(e.into()),
        };
        let record: StoredWorkflow = serde_json::from_str(&contents)?;
        log::info!("Loaded workflow '{}' at v{}", id, record.graph.version());
        Ok(record.graph)
    }

    async fn save(&self, id: &str, graph: &WorkflowGraph, expected_version: u64) -> Result<u64> {
        let id = id.to_string();
        let graph = graph.clone();
        self.locked(move |dir| {
            let mut record = read_record(dir, &id)?;
            let version = record.commit(&graph, expected_version)?;
            write_record(dir, &record)?;
            Ok(version)
        })
        .await
    }

    async fn delete(&self, id: &str) -> Result<()> {
        let path = record_path(&self.dir, id).ok_or_else(|| not_found(id))?;
        let id = id.to_string();
        self.locked(move |_| match std_fs::remove_file(&path) {
            Ok(()) => {
                log::info!("Deleted workflow '{}' from {:?}", id, path);
                Ok(())
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Err(not_found(&id)),
            Err(e) => Err(e.into()),
        })
        .await
    }

    async fn list(&self) -> Result<Vec<WorkflowSummary>> {
        let mut entries = match fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut summaries = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().map_or(true, |e| e != files::RECORD_EXTENSION) {
                continue;
            }

            let contents = match fs::read_to_string(&path).await {
                Ok(contents) => contents,
                Err(e) => {
                    log::warn!("Skipping unreadable workflow record {:?}: {}", path, e);
                    continue;
                }
            };
            match serde_json::from_str::<StoredWorkflow>(&contents) {
                Ok(record) => summaries.push(record.summary()),
                Err(e) => log::warn!("Skipping unreadable workflow record {:?}: {}", path, e),
            }
        }

        summaries.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(summaries)
    }
}
