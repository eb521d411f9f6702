//! Deterministic `enhanced_description` template:
//! `"{equipment} {instance} — {component} — {function} — {phenomenon/quantity} [— in {unit}]"`,
//! elided parts omitted.

use enos_core::tagged_point::Function;

#[must_use]
pub fn build(
    equipment_type: &str,
    instance_id: &str,
    component: Option<&str>,
    function: Function,
    phenomenon: Option<&str>,
    quantity: Option<&str>,
    unit: Option<&str>,
) -> String {
    let mut parts: Vec<String> = Vec::new();

    let equipment_part = if instance_id.is_empty() || instance_id == "_" {
        equipment_type.to_string()
    } else {
        format!("{equipment_type} {instance_id}")
    };
    parts.push(equipment_part);

    if let Some(component) = component {
        parts.push(component.to_string());
    }
    if !matches!(function, Function::Unknown) {
        parts.push(function.to_string());
    }
    match (phenomenon, quantity) {
        (Some(p), Some(q)) if p != q => parts.push(format!("{p}/{q}")),
        (Some(p), _) => parts.push(p.to_string()),
        (None, Some(q)) => parts.push(q.to_string()),
        (None, None) => {}
    }

    let mut description = parts.join(" — ");
    if let Some(unit) = unit {
        description.push_str(&format!(" — in {unit}"));
    }
    description
}
