//! Reflection Engine: dispatches to the three sub-modes
//! and decides whether a revised `Mapping` is warranted.
//!
//! Reflection is bounded (at most `n_reflect` per point, strictly serial);
//! this engine is stateless per call, so the caller (the orchestrator) is
//! responsible for tracking `attempt` across calls and consulting
//! `ReflectionEngine::bounded` before invoking it again.

use crate::format_error::{self, Recovery};
use crate::low_confidence;
use crate::unknown_mapping;
use enos_core::config::Thresholds;
use enos_core::mapping::{Mapping, MappingKind};
use enos_core::reflection::Reflection;
use enos_core::tagged_point::TaggedPoint;
use enos_core::CanonicalPoint;
use enos_mapping::MappingScores;
use enos_ontology::OntologyStore;

pub struct ReflectionEngine<'a> {
    ontology: &'a OntologyStore,
    thresholds: Thresholds,
    n_reflect: u32,
}

impl<'a> ReflectionEngine<'a> {
    #[must_use]
    pub fn new(ontology: &'a OntologyStore, thresholds: Thresholds, n_reflect: u32) -> Self {
        Self { ontology, thresholds, n_reflect }
    }

    /// At most `n_reflect` reflections per point.
    #[must_use]
    pub fn bounded(&self, attempt: u32) -> bool {
        attempt < self.n_reflect
    }

    fn rewrite(&self, mapping: &Mapping, schema: &[CanonicalPoint], candidate_id: &str, confidence: f64, note: &str) -> Mapping {
        let target = schema.iter().find(|c| c.id == candidate_id).cloned();
        let kind = if target.is_none() {
            MappingKind::Unmapped
        } else if confidence >= self.thresholds.tau_auto {
            MappingKind::Auto
        } else if confidence >= self.thresholds.tau_sugg {
            MappingKind::Suggested
        } else {
            MappingKind::Unmapped
        };
        let reason = if kind == MappingKind::Unmapped { mapping.reason.clone() } else { None };
        Mapping {
            target,
            confidence,
            kind,
            reason,
            rationale: format!("{} | reflected: {note}", mapping.rationale),
            ..mapping.clone()
        }
    }

    /// `format_error` sub-mode. Returns the diagnosis plus a
    /// locally-rewritten `Mapping` when recovery found an in-set id; when it
    /// didn't, `Reflection::corrected_format` carries the retry prompt for the
    /// LLM adapter.
    #[must_use]
    pub fn reflect_format_error(&self, mapping: &Mapping, schema: &[CanonicalPoint], raw_response: &str, candidate_ids: &[String]) -> (Reflection, Option<Mapping>) {
        let (reflection, recovery) = format_error::recover(raw_response, candidate_ids);
        let revised = match recovery {
            Recovery::Recovered(id) => Some(self.rewrite(mapping, schema, &id, mapping.confidence.max(self.thresholds.tau_sugg), "recovered id from malformed LLM response")),
            Recovery::Retry => None,
        };
        (reflection, revised)
    }

    /// `unknown_mapping` sub-mode. Always local, never
    /// produces a revised `Mapping` by itself — its output (decomposition,
    /// closest matches, suggestions) is meant to seed a retried LLM call,
    /// which the caller drives through the LLM Adapter and then re-runs the
    /// Mapping Engine over `closest_matches`.
    #[must_use]
    pub fn reflect_unknown_mapping(&self, tagged: &TaggedPoint, schema: &[CanonicalPoint]) -> Reflection {
        unknown_mapping::reflect(tagged, self.ontology, schema)
    }

    /// `low_confidence` sub-mode. Emits a revised `Mapping`
    /// only if the projected overall confidence clears `tau_sugg`.
    #[must_use]
    pub fn reflect_low_confidence(&self, mapping: &Mapping, scores: &MappingScores) -> (Reflection, Option<Mapping>) {
        let reflection = low_confidence::reflect(scores, mapping.confidence);
        let projected = reflection.projected_confidence(mapping.confidence);
        let revised = if projected >= self.thresholds.tau_sugg {
            let Some(target) = mapping.target.as_ref() else {
                return (reflection, None);
            };
            Some(self.rewrite(mapping, std::slice::from_ref(target), &target.id, projected, "projected confidence improvement"))
        } else {
            None
        };
        (reflection, revised)
    }
}
