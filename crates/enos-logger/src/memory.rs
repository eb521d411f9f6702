//! In-memory `ReasoningLog`, used by tests and by any caller that doesn't
//! need durability across process restarts.

use crate::record::LogRecord;
use crate::{LogError, ReasoningLog};
use async_trait::async_trait;
use enos_core::ids::{OperationId, PointId};
use enos_core::reasoning::ReasoningChain;
use enos_core::reflection::Reflection;
use tokio::sync::Mutex;

#[derive(Default)]
pub struct MemoryReasoningLog {
    records: Mutex<Vec<LogRecord>>,
}

impl MemoryReasoningLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of every record appended so far, in append order.
    pub async fn records(&self) -> Vec<LogRecord> {
        self.records.lock().await.clone()
    }

    /// Every record for one point within one operation, in append order.
    pub async fn records_for(&self, operation_id: &OperationId, point_id: &PointId) -> Vec<LogRecord> {
        self.records
            .lock()
            .await
            .iter()
            .filter(|r| r.key() == (operation_id, point_id))
            .cloned()
            .collect()
    }
}

#[async_trait]
impl ReasoningLog for MemoryReasoningLog {
    async fn append_chain(&self, chain: ReasoningChain) -> Result<(), LogError> {
        self.records.lock().await.push(LogRecord::Chain(chain));
        Ok(())
    }

    async fn append_reflection(&self, operation_id: OperationId, point_id: PointId, reflection: Reflection) -> Result<(), LogError> {
        self.records.lock().await.push(LogRecord::Reflection { operation_id, point_id, reflection });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use enos_core::reasoning::StepType;

    #[tokio::test]
    async fn append_and_filter_by_operation_and_point() {
        let log = MemoryReasoningLog::new();
        let mut chain_a = ReasoningChain::new(OperationId::from("op1".to_string()), PointId::from("p1"));
        chain_a.push(StepType::Analysis, "decomposed name", None, None);
        let chain_b = ReasoningChain::new(OperationId::from("op1".to_string()), PointId::from("p2"));

        log.append_chain(chain_a.clone()).await.unwrap();
        log.append_chain(chain_b).await.unwrap();

        let for_p1 = log.records_for(&OperationId::from("op1".to_string()), &PointId::from("p1")).await;
        assert_eq!(for_p1.len(), 1);
        assert_eq!(log.records().await.len(), 2);
    }

    #[tokio::test]
    async fn concurrent_appends_from_multiple_tasks_lose_nothing() {
        let log = std::sync::Arc::new(MemoryReasoningLog::new());
        let mut handles = Vec::new();
        for i in 0..20 {
            let log = log.clone();
            handles.push(tokio::spawn(async move {
                let chain = ReasoningChain::new(OperationId::from("op1".to_string()), PointId::from(format!("p{i}")));
                log.append_chain(chain).await.unwrap();
            }));
        }
        for h in handles {
            h.await.unwrap();
        }
        assert_eq!(log.records().await.len(), 20);
    }
}
