//! Schema Adapter — absorbs drift between the external
//! canonical schema and the internal `CanonicalPoint` shape.

use crate::store::OntologyStore;
use enos_core::CanonicalPoint;
use serde_json::Value;

/// A validation finding against a normalized `CanonicalPoint`; logged, never
/// used to discard the point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub point_id: String,
    pub message: String,
}

fn scalar_or_list_strings(value: Option<&Value>) -> Vec<String> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        Some(other) => vec![other.to_string()],
    }
}

fn str_field<'a>(obj: &'a serde_json::Map<String, Value>, keys: &[&str]) -> Option<&'a str> {
    keys.iter().find_map(|k| obj.get(*k)).and_then(Value::as_str)
}

/// Normalize one raw schema entry into a `CanonicalPoint`. Field renames:
/// `quantity -> measurement`; `phenomenon ∪ aspect -> component[]` (merged
/// with any already-present `component` field); scalars are coerced to
/// singleton lists where the consumer expects a list.
fn adapt_one(id: &str, entry: &serde_json::Map<String, Value>, ontology: Option<&OntologyStore>) -> CanonicalPoint {
    let equipment_type = str_field(entry, &["equipment_type", "equipmentType"])
        .unwrap_or("unknown")
        .to_string();
    let name = str_field(entry, &["name", "pointName"]).unwrap_or(id).to_string();
    let measurement = str_field(entry, &["measurement", "quantity"]).unwrap_or("").to_string();

    let mut component = scalar_or_list_strings(entry.get("component"));
    component.extend(scalar_or_list_strings(entry.get("phenomenon")));
    component.extend(scalar_or_list_strings(entry.get("aspect")));
    component.sort();
    component.dedup();

    let mut unit = str_field(entry, &["unit"]).map(str::to_string);
    if unit.is_none() {
        if let Some(ontology) = ontology {
            let phenomenon = component.first().map(String::as_str).unwrap_or("");
            unit = ontology.units_for(phenomenon, &measurement).map(str::to_string);
        }
    }

    let data_type = str_field(entry, &["data_type", "dataType"]).map(str::to_string);

    CanonicalPoint {
        id: id.to_string(),
        equipment_type,
        name,
        measurement,
        component,
        unit,
        data_type,
    }
}

fn entries_from_raw(raw: &Value) -> Vec<(String, serde_json::Map<String, Value>)> {
    match raw {
        Value::Object(map) => {
            // Could be dict-by-id (values are objects) or a single object entry.
            let looks_like_dict_by_id = map.values().all(|v| v.is_object());
            if looks_like_dict_by_id && !map.is_empty() {
                map.iter()
                    .filter_map(|(k, v)| v.as_object().map(|o| (k.clone(), o.clone())))
                    .collect()
            } else {
                let id = str_field(map, &["id"]).map(str::to_string);
                id.map(|id| vec![(id, map.clone())]).unwrap_or_default()
            }
        }
        Value::Array(items) => items
            .iter()
            .filter_map(|v| v.as_object())
            .filter_map(|o| str_field(o, &["id"]).map(|id| (id.to_string(), o.clone())))
            .collect(),
        _ => Vec::new(),
    }
}

/// Normalize the external canonical schema into the internal mapping-friendly
/// shape. Entries missing an `id` are dropped; everything else
/// is kept and normalized on a best-effort basis.
#[must_use]
pub fn adapt(raw: &Value, ontology: Option<&OntologyStore>) -> Vec<CanonicalPoint> {
    entries_from_raw(raw)
        .into_iter()
        .map(|(id, entry)| adapt_one(&id, &entry, ontology))
        .collect()
}

/// Validate normalized points, logging (and returning) issues per point
/// without discarding anything.
#[must_use]
pub fn validate(points: &[CanonicalPoint]) -> Vec<Issue> {
    let mut issues = Vec::new();
    for point in points {
        if point.name.is_empty() {
            let issue = Issue {
                point_id: point.id.clone(),
                message: "canonical point has an empty name".to_string(),
            };
            tracing::warn!(point_id = %point.id, "{}", issue.message);
            issues.push(issue);
        }
        if point.measurement.is_empty() {
            let issue = Issue {
                point_id: point.id.clone(),
                message: "canonical point has no measurement".to_string(),
            };
            tracing::warn!(point_id = %point.id, "{}", issue.message);
            issues.push(issue);
        }
        if point.unit.is_none() {
            let issue = Issue {
                point_id: point.id.clone(),
                message: "canonical point has no resolvable unit".to_string(),
            };
            tracing::warn!(point_id = %point.id, "{}", issue.message);
            issues.push(issue);
        }
    }
    issues
}

/// Re-encode already-normalized points back into the adapter's input shape,
/// so `adapt` can be re-run on its own output.
#[must_use]
pub fn to_raw(points: &[CanonicalPoint]) -> Value {
    Value::Array(
        points
            .iter()
            .map(|p| serde_json::to_value(p).expect("CanonicalPoint always serializes"))
            .collect(),
    )
}
