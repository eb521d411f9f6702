//! Grouping Engine: the explicit/prefix/verify
//! three-pass protocol that assigns `(equipment_type, instance_id)` to
//! every point.

use crate::confidence::score_group;
use crate::prompts::{build_user_prompt, EquipmentTypeEnvelope, GROUPING_SYSTEM_PROMPT};
use crate::types::{AssignmentSource, Group, GroupingResult, NO_INSTANCE};
use enos_analyzer::{analyze, leading_segment, suffix};
use enos_core::config::InstancePolicy;
use enos_core::point::Point;
use enos_llm::{estimate_tokens, extract_json, LlmAdapter};
use enos_ontology::OntologyStore;
use std::collections::HashMap;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

const UNKNOWN_EQUIPMENT: &str = "unknown";

pub struct GroupingEngine<'a> {
    ontology: &'a OntologyStore,
    instance_policy: InstancePolicy,
}

fn contains_ci(haystack: &str, needle: &str) -> bool {
    !needle.is_empty() && haystack.to_lowercase().contains(&needle.to_lowercase())
}

impl<'a> GroupingEngine<'a> {
    #[must_use]
    pub fn new(ontology: &'a OntologyStore, instance_policy: InstancePolicy) -> Self {
        Self { ontology, instance_policy }
    }

    fn instance_for(&self, point: &Point) -> String {
        let unit = point.unit.as_deref();
        let decomposition = analyze(&point.point_name, unit, &[]);
        decomposition
            .instance(self.instance_policy)
            .unwrap_or_else(|| NO_INSTANCE.to_string())
    }

    /// Pass 1: points that already carry `equipment_type`.
    fn explicit_pass(&self, points: Vec<Point>) -> (Vec<(Point, String)>, Vec<Point>) {
        let mut explicit = Vec::new();
        let mut remaining = Vec::new();
        for point in points {
            if let Some(equipment_type) = point.equipment_type.clone() {
                explicit.push((point, equipment_type));
            } else {
                remaining.push(point);
            }
        }
        (explicit, remaining)
    }

    /// Precedence cascade steps (a)-(c) of pass 2. Returns
    /// `None` when no local rule matches, signalling the LLM step (d).
    fn local_cascade(&self, prefix: &str, suffixes: &[&str]) -> Option<(String, AssignmentSource)> {
        // (a) ontology direct pattern match: exact suffix == standard_point.name_pattern.
        for equipment_type in self.ontology.all_equipment_types() {
            let standard_points = self.ontology.standard_points(equipment_type);
            if standard_points
                .iter()
                .any(|sp| suffixes.iter().any(|s| s.eq_ignore_ascii_case(&sp.name_pattern)))
            {
                return Some((equipment_type.to_string(), AssignmentSource::OntologyDirect));
            }
        }

        // (b) component-substring match: an equipment's declared component
        // names appear verbatim in the prefix or one of its suffixes.
        for equipment_type in self.ontology.all_equipment_types() {
            let Some(info) = self.ontology.equipment_type_info(equipment_type) else {
                continue;
            };
            let hit = info.components.iter().any(|component| {
                contains_ci(prefix, component) || suffixes.iter().any(|s| contains_ci(s, component))
            }) || contains_ci(prefix, equipment_type);
            if hit {
                return Some((equipment_type.to_string(), AssignmentSource::ComponentSubstring));
            }
        }

        // (c) standard-point-name match: a standard point's pattern appears
        // as a substring (looser than (a)'s exact match).
        for equipment_type in self.ontology.all_equipment_types() {
            let standard_points = self.ontology.standard_points(equipment_type);
            if standard_points
                .iter()
                .any(|sp| suffixes.iter().any(|s| contains_ci(s, &sp.name_pattern) || contains_ci(&sp.name_pattern, s)))
            {
                return Some((equipment_type.to_string(), AssignmentSource::StandardPointName));
            }
        }

        None
    }

    /// Pass 2(d) with token-budget-aware splitting: greedily accumulates
    /// points into the largest prompt that still fits `adapter`'s
    /// configured `token_budget`, issuing one LLM call per chunk instead of
    /// one call for the whole prefix. Each chunk resolves its own
    /// equipment-type assignment independently; `finalize`'s
    /// `(equipment_type, instance_id)` bucketing is what actually merges
    /// every chunk's points back together once the full three-pass
    /// protocol has run.
    async fn llm_cascade_batched(
        &self,
        prefix: &str,
        points: Vec<Point>,
        adapter: &LlmAdapter,
        cancel: &CancellationToken,
    ) -> Vec<(Point, String, AssignmentSource)> {
        let budget = adapter.token_budget();
        let mut chunks: Vec<Vec<Point>> = Vec::new();
        let mut current: Vec<Point> = Vec::new();
        for point in points {
            current.push(point);
            let suffixes: Vec<&str> = current.iter().map(|p| suffix(&p.point_name)).collect();
            let prompt = build_user_prompt(prefix, &suffixes, self.ontology);
            if estimate_tokens(&prompt) > budget && current.len() > 1 {
                let overflowed = current.pop().expect("just pushed above");
                chunks.push(std::mem::take(&mut current));
                current.push(overflowed);
            }
        }
        if !current.is_empty() {
            chunks.push(current);
        }
        if chunks.len() > 1 {
            debug!(prefix, chunks = chunks.len(), token_budget = budget, "prefix prompt exceeded token budget; split into chunks");
        }

        let mut resolved = Vec::new();
        for chunk in chunks {
            let suffixes: Vec<&str> = chunk.iter().map(|p| suffix(&p.point_name)).collect();
            let assignment = self.llm_cascade(prefix, &suffixes, adapter, cancel).await;
            let (equipment_type, source) = assignment.unwrap_or_else(|| (UNKNOWN_EQUIPMENT.to_string(), AssignmentSource::Unknown));
            for point in chunk {
                resolved.push((point, equipment_type.clone(), source));
            }
        }
        resolved
    }

    /// Pass 2(d): LLM batch inference for one prefix's points.
    async fn llm_cascade(
        &self,
        prefix: &str,
        suffixes: &[&str],
        adapter: &LlmAdapter,
        cancel: &CancellationToken,
    ) -> Option<(String, AssignmentSource)> {
        let user = build_user_prompt(prefix, suffixes, self.ontology);
        let raw = match adapter.invoke(GROUPING_SYSTEM_PROMPT, &user, cancel).await {
            Ok(text) => text,
            Err(e) => {
                warn!(prefix, error = %e, "grouping LLM call failed; leaving prefix unknown");
                return None;
            }
        };
        match extract_json::<EquipmentTypeEnvelope>(&raw) {
            Ok(envelope) if envelope.equipment_type != UNKNOWN_EQUIPMENT => {
                Some((envelope.equipment_type, AssignmentSource::Llm))
            }
            Ok(_) => None,
            Err(e) => {
                warn!(prefix, error = %e, "grouping LLM response failed JSON extraction");
                None
            }
        }
    }

    /// Pass 3: detect contradictions between an assigned
    /// equipment type and its points' names.
    fn has_contradiction(&self, equipment_type: &str, points: &[Point]) -> bool {
        let Some(info) = self.ontology.equipment_type_info(equipment_type) else {
            return false;
        };
        info.contradiction_substrings
            .iter()
            .any(|bad| points.iter().any(|p| contains_ci(&p.point_name, bad)))
    }

    /// Run the full three-pass protocol over a batch of points.
    pub async fn group(
        &self,
        points: Vec<Point>,
        adapter: Option<&LlmAdapter>,
        cancel: &CancellationToken,
    ) -> GroupingResult {
        let order: HashMap<enos_core::ids::PointId, usize> =
            points.iter().enumerate().map(|(i, p)| (p.point_id.clone(), i)).collect();

        let (explicit, remaining) = self.explicit_pass(points);

        // Pass 2: bucket the remaining points by leading segment.
        let mut prefix_buckets: HashMap<String, Vec<Point>> = HashMap::new();
        for point in remaining {
            prefix_buckets
                .entry(leading_segment(&point.point_name).to_string())
                .or_default()
                .push(point);
        }

        let mut assigned: Vec<(Point, String, AssignmentSource)> = explicit
            .into_iter()
            .map(|(point, equipment_type)| (point, equipment_type, AssignmentSource::Explicit))
            .collect();

        for (prefix, points) in prefix_buckets {
            if cancel.is_cancelled() {
                for point in points {
                    assigned.push((point, UNKNOWN_EQUIPMENT.to_string(), AssignmentSource::Unknown));
                }
                continue;
            }
            let suffixes: Vec<&str> = points.iter().map(|p| suffix(&p.point_name)).collect();
            let local = self.local_cascade(&prefix, &suffixes);
            match local {
                Some((equipment_type, source)) => {
                    debug!(prefix, equipment_type = %equipment_type, ?source, "grouping assignment");
                    for point in points {
                        assigned.push((point, equipment_type.clone(), source));
                    }
                }
                None => match adapter {
                    Some(adapter) => {
                        for (point, equipment_type, source) in self.llm_cascade_batched(&prefix, points, adapter, cancel).await {
                            debug!(prefix, equipment_type = %equipment_type, ?source, "grouping assignment");
                            assigned.push((point, equipment_type, source));
                        }
                    }
                    None => {
                        for point in points {
                            assigned.push((point, UNKNOWN_EQUIPMENT.to_string(), AssignmentSource::Unknown));
                        }
                    }
                },
            }
        }

        // Pass 3: verify, reassigning contradictions against a filtered
        // candidate set (the ontology minus the contradicting type).
        let mut by_equipment: HashMap<String, Vec<(Point, AssignmentSource)>> = HashMap::new();
        for (point, equipment_type, source) in assigned {
            by_equipment.entry(equipment_type).or_default().push((point, source));
        }

        let mut final_assignments: Vec<(Point, String, AssignmentSource)> = Vec::new();
        let equipment_types: Vec<String> = by_equipment.keys().cloned().collect();
        for equipment_type in equipment_types {
            let Some(entries) = by_equipment.remove(&equipment_type) else {
                continue;
            };
            if equipment_type == UNKNOWN_EQUIPMENT {
                for (point, source) in entries {
                    final_assignments.push((point, equipment_type.clone(), source));
                }
                continue;
            }
            let points_only: Vec<Point> = entries.iter().map(|(p, _)| p.clone()).collect();
            if self.has_contradiction(&equipment_type, &points_only) {
                warn!(equipment_type, "contradiction detected in verify pass; reassigning");
                let prefix = points_only.first().map(|p| leading_segment(&p.point_name).to_string()).unwrap_or_default();
                let suffixes: Vec<&str> = points_only.iter().map(|p| suffix(&p.point_name)).collect();
                let reassignment = self
                    .local_cascade_excluding(&prefix, &suffixes, &equipment_type)
                    .unwrap_or_else(|| (UNKNOWN_EQUIPMENT.to_string(), AssignmentSource::Unknown));
                for (point, _) in entries {
                    final_assignments.push((point, reassignment.0.clone(), reassignment.1));
                }
            } else {
                for (point, source) in entries {
                    final_assignments.push((point, equipment_type.clone(), source));
                }
            }
        }

        self.finalize(final_assignments, &order)
    }

    fn local_cascade_excluding(
        &self,
        prefix: &str,
        suffixes: &[&str],
        excluded: &str,
    ) -> Option<(String, AssignmentSource)> {
        self.local_cascade(prefix, suffixes)
            .filter(|(equipment_type, _)| equipment_type != excluded)
    }

    fn finalize(
        &self,
        assignments: Vec<(Point, String, AssignmentSource)>,
        order: &HashMap<enos_core::ids::PointId, usize>,
    ) -> GroupingResult {
        let mut by_key: HashMap<(String, String), Vec<(Point, AssignmentSource)>> = HashMap::new();
        for (point, equipment_type, source) in assignments {
            let instance_id = if equipment_type == UNKNOWN_EQUIPMENT {
                NO_INSTANCE.to_string()
            } else {
                self.instance_for(&point)
            };
            by_key
                .entry((equipment_type, instance_id))
                .or_default()
                .push((point, source));
        }

        let mut groups: Vec<Group> = by_key
            .into_iter()
            .map(|((equipment_type, instance_id), mut entries)| {
                // Points within a group must appear in submission order regardless of
                // which HashMap bucket carried them here; otherwise two points that
                // resolve to the same (equipment_type, instance_id) via different
                // prefixes could swap order from run to run.
                entries.sort_by_key(|(p, _)| order.get(&p.point_id).copied().unwrap_or(usize::MAX));
                let points: Vec<Point> = entries.iter().map(|(p, _)| p.clone()).collect();
                let source = entries.first().map(|(_, s)| *s).unwrap_or(AssignmentSource::Unknown);
                let confidence = score_group(&equipment_type, &points, self.ontology, source);
                Group {
                    equipment_type,
                    instance_id,
                    points,
                    source,
                    confidence,
                }
            })
            .collect();

        groups.sort_by(|a, b| (&a.equipment_type, &a.instance_id).cmp(&(&b.equipment_type, &b.instance_id)));
        GroupingResult { groups }
    }
}
