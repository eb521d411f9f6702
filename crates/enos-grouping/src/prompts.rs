//! Prompt construction for the grouping cascade's LLM step: lists the
//! unresolved prefix, its points' suffixes, and the enumerated equipment
//! catalog with one-line descriptions.

use enos_ontology::OntologyStore;
use serde::Deserialize;
use std::collections::BTreeMap;

pub const GROUPING_SYSTEM_PROMPT: &str = "You classify a group of building-management-system points \
into one equipment type from a fixed catalog. Respond with exactly one JSON object of the form \
{\"equipment_type\": \"<id>\"} where <id> is one of the listed catalog ids, or \"unknown\" if none fit. \
No other text.";

/// Response envelope expected back from the grouping LLM call.
#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct EquipmentTypeEnvelope {
    pub equipment_type: String,
}

#[must_use]
pub fn build_user_prompt(prefix: &str, suffixes: &[&str], ontology: &OntologyStore) -> String {
    let mut catalog_lines = String::new();
    for equipment_type in ontology.all_equipment_types() {
        let description = ontology
            .equipment_type_info(equipment_type)
            .map(|info| info.description.as_str())
            .unwrap_or("");
        catalog_lines.push_str(&format!("- {equipment_type}: {description}\n"));
    }

    let suffix_lines = suffixes.iter().map(|s| format!("- {s}")).collect::<Vec<_>>().join("\n");

    format!(
        "Prefix: {prefix}\nPoint suffixes under this prefix:\n{suffix_lines}\n\nEquipment catalog:\n{catalog_lines}"
    )
}

/// Group suffixes by their shared leading segment, stable-sorted for
/// deterministic prompt text across runs with the same input set.
#[must_use]
pub fn group_suffixes_by_prefix<'a>(
    names_and_suffixes: impl IntoIterator<Item = (&'a str, &'a str)>,
) -> BTreeMap<&'a str, Vec<&'a str>> {
    let mut out: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (prefix, suffix) in names_and_suffixes {
        out.entry(prefix).or_default().push(suffix);
    }
    for suffixes in out.values_mut() {
        suffixes.sort_unstable();
        suffixes.dedup();
    }
    out
}
