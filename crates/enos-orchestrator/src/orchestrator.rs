//! Pipeline Orchestrator: drives grouping -> tagging -> mapping -> conditional
//! reflection over batches of points, tracking `OperationProgress` and
//! committing immutable records.

use crate::api::PipelineApi;
use crate::types::{MappingSummary, RemapRequest, SubmitRequest};
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use enos_core::config::PipelineConfig;
use enos_core::ids::OperationId;
use enos_core::mapping::{Mapping, MappingKind};
use enos_core::point::{Point, PointType};
use enos_core::progress::{OperationProgress, OperationState, Phase};
use enos_core::reasoning::{ReasoningChain, StepType};
use enos_core::tagged_point::TaggedPoint;
use enos_core::CanonicalPoint;
use enos_grouping::GroupingEngine;
use enos_llm::LlmAdapter;
use enos_logger::ReasoningLog;
use enos_mapping::MappingEngine;
use enos_ontology::OntologyStore;
use enos_reflection::ReflectionEngine;
use enos_tagging::TaggingEngine;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::warn;

const STRUCTURED_VIEW_REASON: &str = "structured_view_container_not_mapped";

struct OperationHandle {
    progress: parking_lot::Mutex<OperationProgress>,
    mappings: parking_lot::Mutex<Vec<Mapping>>,
    cancel: CancellationToken,
    config: PipelineConfig,
}

struct Inner {
    ontology: OntologyStore,
    schema: Vec<CanonicalPoint>,
    adapter: Option<LlmAdapter>,
    log: Arc<dyn ReasoningLog>,
    operations: DashMap<OperationId, Arc<OperationHandle>>,
}

/// The one in-process implementation of `PipelineApi`.
#[derive(Clone)]
pub struct Orchestrator {
    inner: Arc<Inner>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(ontology: OntologyStore, schema: Vec<CanonicalPoint>, adapter: Option<LlmAdapter>, log: Arc<dyn ReasoningLog>) -> Self {
        Self {
            inner: Arc::new(Inner {
                ontology,
                schema,
                adapter,
                log,
                operations: DashMap::new(),
            }),
        }
    }

    fn set_state(handle: &OperationHandle, state: OperationState) {
        let mut progress = handle.progress.lock();
        progress.state = state;
        progress.last_update = Utc::now();
    }

    fn fail(handle: &OperationHandle, phase: Phase, batch_index: usize) {
        let mut progress = handle.progress.lock();
        progress.state = OperationState::Failed;
        progress.failure_phase = Some(phase);
        progress.failure_batch_index = Some(batch_index);
        progress.last_update = Utc::now();
    }

    fn record_point(handle: &OperationHandle, mapping: Mapping, succeeded: bool) {
        let mut progress = handle.progress.lock();
        progress.processed += 1;
        if succeeded {
            progress.succeeded += 1;
        } else {
            progress.failed += 1;
        }
        progress.last_update = Utc::now();
        drop(progress);
        handle.mappings.lock().push(mapping);
    }

    fn structured_view_mapping(operation_id: &OperationId, point: &Point) -> Mapping {
        Mapping {
            operation_id: operation_id.clone(),
            source_point: point.clone(),
            target: None,
            confidence: 0.0,
            kind: MappingKind::Unmapped,
            transform: None,
            rationale: STRUCTURED_VIEW_REASON.to_string(),
            reasoning_ref: enos_core::reasoning::ReasoningRef {
                operation_id: operation_id.clone(),
                point_id: point.point_id.clone(),
            },
            reason: Some(STRUCTURED_VIEW_REASON.to_string()),
        }
    }

    /// Reflection triggers when `kind in {unmapped, suggested}` or
    /// `confidence < tau_reflect`.
    fn needs_reflection(mapping: &Mapping, tau_reflect: f64) -> bool {
        matches!(mapping.kind, MappingKind::Unmapped | MappingKind::Suggested) || mapping.confidence < tau_reflect
    }

    /// Run one tagged point through the mapping engine and, if warranted, one
    /// bounded reflection pass.
    #[allow(clippy::too_many_arguments)]
    async fn map_with_reflection(
        operation_id: &OperationId,
        mapping_engine: &MappingEngine<'_>,
        reflection_engine: &ReflectionEngine<'_>,
        tagged: &TaggedPoint,
        schema: &[CanonicalPoint],
        adapter: Option<&LlmAdapter>,
        cancel: &CancellationToken,
        config: &PipelineConfig,
        chain: &mut ReasoningChain,
    ) -> Mapping {
        let mapping = mapping_engine.map(operation_id.clone(), tagged, schema, adapter, cancel).await;
        chain.push(StepType::Matching, "mapping engine scored candidates", Some(mapping.rationale.clone()), None);

        if !reflection_engine.bounded(0) || !Self::needs_reflection(&mapping, config.thresholds.tau_reflect) {
            return mapping;
        }

        match mapping.kind {
            MappingKind::Unmapped if mapping.target.is_none() => {
                let reflection = reflection_engine.reflect_unknown_mapping(tagged, schema);
                chain.push(StepType::Reflection, "unknown_mapping reflection", None, serde_json::to_value(&reflection).ok());
                let closest: Vec<&CanonicalPoint> = schema.iter().filter(|c| reflection.closest_matches.contains(&c.id)).collect();
                if closest.is_empty() {
                    return mapping;
                }
                let restricted: Vec<CanonicalPoint> = closest.into_iter().cloned().collect();
                let revised = mapping_engine.map(operation_id.clone(), tagged, &restricted, adapter, cancel).await;
                if revised.kind != MappingKind::Unmapped {
                    chain.push(StepType::Matching, "refined mapping after unknown_mapping reflection", Some(revised.rationale.clone()), None);
                    revised
                } else {
                    mapping
                }
            }
            _ if mapping.target.is_some() => {
                let ranked = mapping_engine.rank_candidates(tagged, schema);
                let Some(candidate) = ranked.iter().find(|c| Some(&c.canonical_id) == mapping.target.as_ref().map(|t| &t.id)) else {
                    return mapping;
                };
                let (reflection, revised) = reflection_engine.reflect_low_confidence(&mapping, &candidate.scores);
                chain.push(StepType::Reflection, "low_confidence reflection", None, serde_json::to_value(&reflection).ok());
                revised.unwrap_or(mapping)
            }
            _ => mapping,
        }
    }

    async fn process_point(
        operation_id: &OperationId,
        point: &Point,
        equipment_type: &str,
        instance_id: &str,
        tagging: &TaggingEngine<'_>,
        mapping_engine: &MappingEngine<'_>,
        reflection_engine: &ReflectionEngine<'_>,
        schema: &[CanonicalPoint],
        adapter: Option<&LlmAdapter>,
        cancel: &CancellationToken,
        config: &PipelineConfig,
    ) -> (Mapping, ReasoningChain) {
        let mut chain = ReasoningChain::new(operation_id.clone(), point.point_id.clone());

        if point.point_type == PointType::StructuredView {
            chain.push(StepType::Analysis, "structured-view container; not mapped", None, None);
            return (Self::structured_view_mapping(operation_id, point), chain);
        }

        let tagged = tagging.tag_with_fallback(point, equipment_type, instance_id, adapter, cancel).await;
        chain.push(StepType::Identification, "tagged point", Some(tagged.enhanced_description.clone()), None);

        let mapping = Self::map_with_reflection(operation_id, mapping_engine, reflection_engine, &tagged, schema, adapter, cancel, config, &mut chain).await;
        (mapping, chain)
    }

    async fn run(self, operation_id: OperationId, points: Vec<Point>, config: PipelineConfig, handle: Arc<OperationHandle>) {
        Self::set_state(&handle, OperationState::Running);

        let grouping = GroupingEngine::new(&self.inner.ontology, config.instance_policy);
        let tagging = TaggingEngine::new(&self.inner.ontology);
        let mapping_engine = MappingEngine::new(&self.inner.ontology, config.thresholds);
        let reflection_engine = ReflectionEngine::new(&self.inner.ontology, config.thresholds, config.n_reflect);
        let adapter = if config.llm_enabled { self.inner.adapter.as_ref() } else { None };

        for (batch_index, batch) in points.chunks(config.batch_size.max(1)).enumerate() {
            if handle.cancel.is_cancelled() {
                Self::set_state(&handle, OperationState::Cancelled);
                return;
            }

            let grouping_result = grouping.group(batch.to_vec(), adapter, &handle.cancel).await;

            for group in &grouping_result.groups {
                for point in &group.points {
                    if handle.cancel.is_cancelled() {
                        Self::set_state(&handle, OperationState::Cancelled);
                        return;
                    }
                    let (mapping, chain) = Self::process_point(
                        &operation_id,
                        point,
                        &group.equipment_type,
                        &group.instance_id,
                        &tagging,
                        &mapping_engine,
                        &reflection_engine,
                        &self.inner.schema,
                        adapter,
                        &handle.cancel,
                        &config,
                    )
                    .await;

                    // Structurally impossible unless a future engine change
                    // stops threading the source point through untouched;
                    // fatal rather than silently misattributed.
                    if mapping.source_point.point_id != point.point_id {
                        Self::fail(&handle, Phase::Mapping, batch_index);
                        return;
                    }

                    if let Err(e) = self.inner.log.append_chain(chain).await {
                        warn!(point_id = %point.point_id, error = %e, "failed to persist reasoning chain");
                    }

                    let succeeded = !matches!(mapping.kind, MappingKind::Unmapped);
                    Self::record_point(&handle, mapping, succeeded);
                }
            }

            tokio::task::yield_now().await;
        }

        Self::set_state(&handle, OperationState::Completed);
    }
}

#[async_trait]
impl PipelineApi for Orchestrator {
    async fn submit(&self, request: SubmitRequest) -> OperationId {
        let operation_id = OperationId::new();
        let progress = OperationProgress::new(operation_id.clone(), "mapping", request.points.len(), Utc::now());
        let handle = Arc::new(OperationHandle {
            progress: parking_lot::Mutex::new(progress),
            mappings: parking_lot::Mutex::new(Vec::new()),
            cancel: CancellationToken::new(),
            config: request.config.clone(),
        });
        self.inner.operations.insert(operation_id.clone(), handle.clone());

        let this = self.clone();
        let op_id = operation_id.clone();
        tokio::spawn(async move {
            this.run(op_id, request.points, request.config, handle).await;
        });

        operation_id
    }

    async fn progress(&self, operation_id: &OperationId) -> Option<OperationProgress> {
        self.inner.operations.get(operation_id).map(|h| h.progress.lock().clone())
    }

    async fn summary(&self, operation_id: &OperationId) -> Option<MappingSummary> {
        self.inner
            .operations
            .get(operation_id)
            .map(|h| MappingSummary::from_mappings(operation_id.clone(), h.mappings.lock().clone()))
    }

    async fn remap(&self, operation_id: &OperationId, request: RemapRequest) -> Option<Mapping> {
        let handle = self.inner.operations.get(operation_id)?.clone();
        let existing = {
            let mappings = handle.mappings.lock();
            mappings.iter().find(|m| m.source_point.point_id == request.point_id).cloned()
        }?;

        let reflection_engine = ReflectionEngine::new(&self.inner.ontology, handle.config.thresholds, handle.config.n_reflect);

        if let Some(raw) = request.raw_format_error_response.as_deref() {
            let candidate_ids: Vec<String> = self.inner.schema.iter().map(|c| c.id.clone()).collect();
            let (reflection, revised) = reflection_engine.reflect_format_error(&existing, &self.inner.schema, raw, &candidate_ids);
            if let Err(e) = self.inner.log.append_reflection(operation_id.clone(), request.point_id.clone(), reflection).await {
                warn!(error = %e, "failed to persist format_error reflection record");
            }
            if let Some(revised) = revised {
                let mut mappings = handle.mappings.lock();
                if let Some(slot) = mappings.iter_mut().find(|m| m.source_point.point_id == request.point_id) {
                    *slot = revised.clone();
                }
                return Some(revised);
            }
            return None;
        }

        None
    }

    async fn cancel(&self, operation_id: &OperationId) -> bool {
        let Some(handle) = self.inner.operations.get(operation_id) else {
            return false;
        };
        let was_running = matches!(handle.progress.lock().state, OperationState::Running | OperationState::Pending);
        handle.cancel.cancel();
        was_running
    }
}

#[cfg(test)]
impl Orchestrator {
    fn operation_count(&self) -> usize {
        self.inner.operations.len()
    }
}
