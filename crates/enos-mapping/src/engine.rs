//! Mapping Engine: scores a `TaggedPoint` against the
//! normalized canonical schema and emits a `Mapping`.

use crate::prompts::{build_user_prompt, EnosPointEnvelope, MAPPING_SYSTEM_PROMPT, UNKNOWN_ENVELOPE_VALUE};
use crate::scoring::{conversion_formula, score};
use crate::types::{rank, Candidate};
use enos_core::config::Thresholds;
use enos_core::ids::OperationId;
use enos_core::mapping::{Mapping, MappingKind, Transform};
use enos_core::reasoning::ReasoningRef;
use enos_core::tagged_point::TaggedPoint;
use enos_core::CanonicalPoint;
use enos_llm::{extract_json, LlmAdapter};
use enos_ontology::OntologyStore;
use tokio_util::sync::CancellationToken;
use tracing::warn;

/// How many top-ranked local candidates get offered to the LLM.
const TOP_K: usize = 5;

/// Confidence assigned to a rule-based fallback match. Documented range is
/// 0.6-0.8 (`suggested`, never `auto`); the rule table offers no finer
/// signal than "a standard pattern matched", so every hit lands at the
/// band's floor.
const FALLBACK_CONFIDENCE: f64 = 0.6;

fn contains_ci(haystack: &str, needle: &str) -> bool {
    !needle.is_empty() && haystack.to_lowercase().contains(&needle.to_lowercase())
}

pub struct MappingEngine<'a> {
    ontology: &'a OntologyStore,
    thresholds: Thresholds,
}

impl<'a> MappingEngine<'a> {
    #[must_use]
    pub fn new(ontology: &'a OntologyStore, thresholds: Thresholds) -> Self {
        Self { ontology, thresholds }
    }

    fn candidates_for<'c>(&self, equipment_type: &str, schema: &'c [CanonicalPoint]) -> Vec<&'c CanonicalPoint> {
        if equipment_type == TaggedPoint::UNKNOWN_EQUIPMENT {
            schema.iter().collect()
        } else {
            schema.iter().filter(|c| c.equipment_type == equipment_type).collect()
        }
    }

    /// Score and rank every in-scope candidate.
    #[must_use]
    pub fn rank_candidates(&self, tagged: &TaggedPoint, schema: &[CanonicalPoint]) -> Vec<Candidate> {
        let scored = self
            .candidates_for(&tagged.equipment_type, schema)
            .into_iter()
            .map(|candidate| Candidate {
                canonical_id: candidate.id.clone(),
                scores: score(self.ontology, tagged, candidate),
            })
            .collect();
        rank(scored)
    }

    fn transform_for(&self, tagged_unit: Option<&str>, candidate_unit: Option<&str>) -> Option<Transform> {
        match (tagged_unit, candidate_unit) {
            (Some(from), Some(to)) if !from.eq_ignore_ascii_case(to) => {
                conversion_formula(from, to).map(|formula| Transform::UnitConversion {
                    from: from.to_string(),
                    to: to.to_string(),
                    formula: formula.to_string(),
                })
            }
            _ => None,
        }
    }

    /// Last-resort rule table, consulted only once both the local weighted
    /// score and the LLM path (if any) have failed to clear `tau_sugg`.
    /// Reuses the ontology's own documented `standard_points` catalog as the
    /// `(substring, unit) -> canonical id` rule set rather than inventing a
    /// separate one, since that catalog already states the same fact the
    /// Grouping Engine's ontology-direct pass consults. Never emits `auto`.
    fn rule_based_fallback(&self, tagged: &TaggedPoint, schema: &[CanonicalPoint]) -> Option<(CanonicalPoint, f64)> {
        for standard_point in self.ontology.standard_points(&tagged.equipment_type) {
            let Some(canonical_id) = &standard_point.canonical_id else {
                continue;
            };
            if !contains_ci(&tagged.source.point_name, &standard_point.name_pattern) {
                continue;
            }
            if let (Some(rule_unit), Some(point_unit)) = (standard_point.unit.as_deref(), tagged.source.unit.as_deref()) {
                if !rule_unit.eq_ignore_ascii_case(point_unit) {
                    continue;
                }
            }
            if let Some(candidate) = schema.iter().find(|c| &c.id == canonical_id) {
                return Some((candidate.clone(), FALLBACK_CONFIDENCE));
            }
        }
        None
    }

    fn finalize_rule_based(
        &self,
        operation_id: OperationId,
        tagged: &TaggedPoint,
        target: CanonicalPoint,
        confidence: f64,
        reasoning_ref: ReasoningRef,
    ) -> Mapping {
        let transform = self.transform_for(tagged.source.unit.as_deref(), target.unit.as_deref());
        let rationale = format!("rule-based fallback: point name matched the documented standard-point pattern for {}", target.id);
        Mapping {
            operation_id,
            source_point: tagged.source.clone(),
            target: Some(target),
            confidence,
            kind: MappingKind::Suggested,
            transform,
            rationale,
            reasoning_ref,
            reason: None,
        }
    }

    fn rationale_for(candidate: &Candidate) -> String {
        let s = &candidate.scores;
        format!(
            "name={:.2} function={:.2} component={:.2} phenomenon={:.2} unit={:.2} tags={:.2} => score={:.2}",
            s.name_similarity,
            s.function_match,
            s.component_overlap,
            s.phenomenon_match,
            s.unit_compatibility,
            s.tag_overlap,
            candidate.score()
        )
    }

    fn finalize(
        &self,
        operation_id: OperationId,
        tagged: &TaggedPoint,
        schema: &[CanonicalPoint],
        candidate: &Candidate,
        reasoning_ref: ReasoningRef,
        kind: MappingKind,
    ) -> Mapping {
        let target = schema.iter().find(|c| c.id == candidate.canonical_id).cloned();
        let transform = target
            .as_ref()
            .and_then(|t| self.transform_for(tagged.source.unit.as_deref(), t.unit.as_deref()));
        Mapping {
            operation_id,
            source_point: tagged.source.clone(),
            target,
            confidence: candidate.score(),
            kind,
            transform,
            rationale: Self::rationale_for(candidate),
            reasoning_ref,
            reason: None,
        }
    }

    fn unmapped(&self, operation_id: OperationId, tagged: &TaggedPoint, reasoning_ref: ReasoningRef, confidence: f64, reason: String) -> Mapping {
        Mapping {
            operation_id,
            source_point: tagged.source.clone(),
            target: None,
            confidence,
            kind: MappingKind::Unmapped,
            transform: None,
            rationale: reason.clone(),
            reasoning_ref,
            reason: Some(reason),
        }
    }

    /// Offer the top-k ranked candidates to the LLM, accepting only an id
    /// drawn from that exact set or the literal `"unknown"`.
    async fn llm_select(
        &self,
        tagged: &TaggedPoint,
        schema: &[CanonicalPoint],
        ranked: &[Candidate],
        adapter: &LlmAdapter,
        cancel: &CancellationToken,
    ) -> Option<Candidate> {
        let top_k: Vec<&CanonicalPoint> = ranked
            .iter()
            .take(TOP_K)
            .filter_map(|c| schema.iter().find(|s| s.id == c.canonical_id))
            .collect();
        if top_k.is_empty() {
            return None;
        }
        let description = tagged.enhanced_description.as_str();
        let user = build_user_prompt(&tagged.source.point_name, description, &top_k);
        let raw = match adapter.invoke(MAPPING_SYSTEM_PROMPT, &user, cancel).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(point_id = %tagged.source.point_id, error = %e, "mapping LLM call failed");
                return None;
            }
        };
        let envelope = match extract_json::<EnosPointEnvelope>(&raw) {
            Ok(envelope) => envelope,
            Err(e) => {
                warn!(point_id = %tagged.source.point_id, error = %e, "mapping LLM response failed JSON extraction");
                return None;
            }
        };
        if envelope.enos_point == UNKNOWN_ENVELOPE_VALUE {
            return None;
        }
        // Never accept an id outside the offered candidate set.
        ranked.iter().find(|c| c.canonical_id == envelope.enos_point).cloned()
    }

    /// Produce the `Mapping` for one tagged point.
    pub async fn map(
        &self,
        operation_id: OperationId,
        tagged: &TaggedPoint,
        schema: &[CanonicalPoint],
        adapter: Option<&LlmAdapter>,
        cancel: &CancellationToken,
    ) -> Mapping {
        let ranked = self.rank_candidates(tagged, schema);
        let reasoning_ref = ReasoningRef {
            operation_id: operation_id.clone(),
            point_id: tagged.source.point_id.clone(),
        };

        let Some(best) = ranked.first() else {
            return self.unmapped(operation_id, tagged, reasoning_ref, 0.0, "no canonical candidates in scope for this equipment type".to_string());
        };

        if best.score() >= self.thresholds.tau_auto {
            return self.finalize(operation_id, tagged, schema, best, reasoning_ref, MappingKind::Auto);
        }

        if let Some(adapter) = adapter {
            if !cancel.is_cancelled() {
                if let Some(selected) = self.llm_select(tagged, schema, &ranked, adapter, cancel).await {
                    let kind = if selected.score() >= self.thresholds.tau_auto {
                        MappingKind::Auto
                    } else if selected.score() >= self.thresholds.tau_sugg {
                        MappingKind::Suggested
                    } else {
                        MappingKind::Unmapped
                    };
                    if kind == MappingKind::Unmapped {
                        return self.unmapped(operation_id, tagged, reasoning_ref, selected.score(), "LLM-selected candidate still below tau_sugg".to_string());
                    }
                    return self.finalize(operation_id, tagged, schema, &selected, reasoning_ref, kind);
                }
            }
        }

        if best.score() >= self.thresholds.tau_sugg {
            return self.finalize(operation_id, tagged, schema, best, reasoning_ref, MappingKind::Suggested);
        }

        if let Some((target, confidence)) = self.rule_based_fallback(tagged, schema) {
            return self.finalize_rule_based(operation_id, tagged, target, confidence, reasoning_ref);
        }

        self.unmapped(
            operation_id,
            tagged,
            reasoning_ref,
            best.score(),
            format!("best candidate {} scored {:.2}, below tau_sugg", best.canonical_id, best.score()),
        )
    }
}
