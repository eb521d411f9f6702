//! Durable `ReasoningLog` that appends one JSON line per record to a file
//!. Writers within this process are serialized through a
//! `tokio::sync::Mutex` guarding the open file handle; an `fs2` advisory
//! exclusive lock is additionally taken around each write so a second
//! process appending to the same path can't interleave a partial line
//! either. There is no mutation or compaction after a record is written.

use crate::record::LogRecord;
use crate::{LogError, ReasoningLog};
use async_trait::async_trait;
use enos_core::ids::{OperationId, PointId};
use enos_core::reasoning::ReasoningChain;
use enos_core::reflection::Reflection;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;

pub struct JsonlReasoningLog {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonlReasoningLog {
    /// Opens (creating if necessary) `path` for appending. Existing content
    /// is left untouched; new records are always appended after it.
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, LogError> {
        let path = path.as_ref().to_path_buf();
        let open_path = path.clone();
        tokio::task::spawn_blocking(move || {
            std::fs::OpenOptions::new().create(true).append(true).open(&open_path)
        })
        .await
        .map_err(|e| LogError::Write(e.to_string()))?
        .map_err(|e| LogError::Write(format!("opening {}: {e}", path.display())))?;
        Ok(Self { path, write_lock: Mutex::new(()) })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn append_line(&self, record: &LogRecord) -> Result<(), LogError> {
        let mut line = serde_json::to_string(record)?;
        line.push('\n');
        let _guard = self.write_lock.lock().await;
        let path = self.path.clone();
        tokio::task::spawn_blocking(move || -> std::io::Result<()> {
            let mut file = std::fs::OpenOptions::new().create(true).append(true).open(&path)?;
            fs2::FileExt::lock_exclusive(&file)?;
            let result = file.write_all(line.as_bytes()).and_then(|()| file.flush());
            let _ = fs2::FileExt::unlock(&file);
            result
        })
        .await
        .map_err(|e| LogError::Write(e.to_string()))?
        .map_err(|e| LogError::Write(e.to_string()))
    }
}

#[async_trait]
impl ReasoningLog for JsonlReasoningLog {
    async fn append_chain(&self, chain: ReasoningChain) -> Result<(), LogError> {
        self.append_line(&LogRecord::Chain(chain)).await
    }

    async fn append_reflection(&self, operation_id: OperationId, point_id: PointId, reflection: Reflection) -> Result<(), LogError> {
        self.append_line(&LogRecord::Reflection { operation_id, point_id, reflection }).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enos_core::reasoning::StepType;
    use std::sync::Arc;

    fn read_lines(path: &Path) -> Vec<String> {
        std::fs::read_to_string(path).unwrap().lines().map(str::to_string).collect()
    }

    #[tokio::test]
    async fn appends_one_json_line_per_record() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reasoning.jsonl");
        let log = JsonlReasoningLog::open(&path).await.unwrap();

        let mut chain = ReasoningChain::new(OperationId::from("op1".to_string()), PointId::from("p1"));
        chain.push(StepType::Analysis, "decomposed name", None, None);
        log.append_chain(chain).await.unwrap();

        let reflection = Reflection::new(enos_core::reflection::ReflectionType::LowConfidence);
        log.append_reflection(OperationId::from("op1".to_string()), PointId::from("p1"), reflection).await.unwrap();

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 2);
        assert!(serde_json::from_str::<LogRecord>(&lines[0]).is_ok());
        assert!(serde_json::from_str::<LogRecord>(&lines[1]).is_ok());
    }

    #[tokio::test]
    async fn reopening_an_existing_file_preserves_prior_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reasoning.jsonl");

        {
            let log = JsonlReasoningLog::open(&path).await.unwrap();
            let chain = ReasoningChain::new(OperationId::from("op1".to_string()), PointId::from("p1"));
            log.append_chain(chain).await.unwrap();
        }
        {
            let log = JsonlReasoningLog::open(&path).await.unwrap();
            let chain = ReasoningChain::new(OperationId::from("op1".to_string()), PointId::from("p2"));
            log.append_chain(chain).await.unwrap();
        }

        assert_eq!(read_lines(&path).len(), 2);
    }

    #[tokio::test]
    async fn concurrent_writers_never_interleave_a_partial_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reasoning.jsonl");
        let log = Arc::new(JsonlReasoningLog::open(&path).await.unwrap());

        let mut handles = Vec::new();
        for i in 0..30 {
            let log = log.clone();
            handles.push(tokio::spawn(async move {
                let mut chain = ReasoningChain::new(OperationId::from("op1".to_string()), PointId::from(format!("p{i}")));
                chain.push(StepType::Matching, format!("step for p{i}"), None, None);
                log.append_chain(chain).await.unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }

        let lines = read_lines(&path);
        assert_eq!(lines.len(), 30);
        for line in &lines {
            assert!(serde_json::from_str::<LogRecord>(line).is_ok(), "corrupt line: {line}");
        }
    }
}
