//! Point Analyzer — a pure function from a point name and
//! optional unit to a `Decomposition`. Deterministic; never consults an LLM.

use enos_core::config::InstancePolicy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

fn segment_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"[.\-_\s]+").expect("static regex is valid"))
}

/// Output of decomposing one point name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decomposition {
    pub segments: Vec<String>,
    pub abbreviations: Vec<String>,
    pub measurement_type: Option<String>,
    /// Raw device signal from substring matching (e.g. `"pump"`, `"drive"`);
    /// equipment-aware refinement of a generic `"drive"` signal into the
    /// equipment's actual primary mover happens in the Reflection Engine
    ///, not here.
    pub device: Option<String>,
    pub property: Option<String>,
    /// Numeric groups found in the leading (pre-first-dot) segment, in the
    /// order they occur, e.g. `FCU_01_25` -> `["01", "25"]`.
    pub instance_candidates: Vec<String>,
}

impl Decomposition {
    /// Resolve the canonical instance id per the configured policy.
    #[must_use]
    pub fn instance(&self, policy: InstancePolicy) -> Option<String> {
        match policy {
            InstancePolicy::FirstGroup => self.instance_candidates.first().cloned(),
            InstancePolicy::LastGroup => self.instance_candidates.last().cloned(),
        }
    }
}

const MEASUREMENT_PATTERNS: &[(&str, &[&str], &[&str])] = &[
    // (measurement_type, name substrings, unit substrings)
    ("temperature", &["temp", "rmtmp"], &["degc", "degf", "°c", "°f", "c", "f"]),
    ("pressure", &["press", "prs"], &["kpa", "pa", "psi", "bar", "inwc"]),
    ("flow", &["flow", "flw"], &["cfm", "l/s", "gpm", "m3/h", "m3h"]),
    ("frequency", &["freq", "hz", "vsd", "vfd"], &["hz"]),
    ("power", &["power", "kw", "pwr"], &["kw", "w"]),
    ("position", &["pos", "damperpos"], &["%"]),
    ("setpoint", &["sp", "setpoint", "stpt"], &[]),
    ("status", &["status", "state", "alarm", "fault", "run"], &[]),
    ("humidity", &["humid", "rh"], &["%rh", "rh"]),
    ("co2", &["co2"], &["ppm"]),
];

const DEVICE_PATTERNS: &[(&str, &[&str])] = &[
    ("pump", &["pump", "pmp"]),
    ("valve", &["valve", "vlv"]),
    ("damper", &["damper", "dmpr"]),
    ("fan", &["fan"]),
    ("compressor", &["compressor", "comp"]),
    ("chiller", &["chiller", "chlr", "chw"]),
    ("boiler", &["boiler", "blr"]),
    ("drive", &["vsd", "vfd", "drive"]),
];

const PROPERTY_PATTERNS: &[(&str, &[&str])] = &[
    ("supply", &["supply", "sa", "sup"]),
    ("return", &["return", "ra", "ret"]),
    ("speed", &["speed", "spd"]),
    ("command", &["cmd", "command"]),
    ("position", &["pos", "position"]),
    ("raw", &["raw"]),
];

fn contains_ci(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

fn unit_matches(unit: Option<&str>, candidates: &[&str]) -> bool {
    unit.is_some_and(|u| candidates.iter().any(|c| u.eq_ignore_ascii_case(c)))
}

/// Portion of a point name before the first `.`, e.g. `"CH-SYS-1"` out of
/// `"CH-SYS-1.CWP.VSD.Hz"`. Exposed for the Grouping Engine's prefix pass
///, which groups points sharing this segment.
#[must_use]
pub fn leading_segment(name: &str) -> &str {
    name.split('.').next().unwrap_or(name)
}

/// Everything after the first `.`, e.g. `"CWP.VSD.Hz"` out of
/// `"CH-SYS-1.CWP.VSD.Hz"`. Empty if the name carries no `.`-separated
/// suffix (e.g. a bare `StructuredView` container name).
#[must_use]
pub fn suffix(name: &str) -> &str {
    name.split_once('.').map_or("", |(_, rest)| rest)
}

fn instance_candidates(leading: &str) -> Vec<String> {
    leading
        .split(['_', '-'])
        .filter(|s| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit()))
        .map(str::to_string)
        .collect()
}

fn detect_abbreviations(name: &str, catalog: &[&str]) -> Vec<String> {
    let mut found: Vec<String> = catalog
        .iter()
        .filter(|abbr| contains_ci(name, abbr))
        .map(|abbr| (*abbr).to_string())
        .collect();
    found.sort();
    found.dedup();
    found
}

fn detect_measurement_type(name: &str, unit: Option<&str>) -> Option<String> {
    MEASUREMENT_PATTERNS
        .iter()
        .find(|(_, substrings, units)| {
            substrings.iter().any(|s| contains_ci(name, s)) || unit_matches(unit, units)
        })
        .map(|(measurement_type, _, _)| (*measurement_type).to_string())
}

fn detect_device(name: &str) -> Option<String> {
    DEVICE_PATTERNS
        .iter()
        .find(|(_, substrings)| substrings.iter().any(|s| contains_ci(name, s)))
        .map(|(device, _)| (*device).to_string())
}

fn detect_property(name: &str) -> Option<String> {
    PROPERTY_PATTERNS
        .iter()
        .find(|(_, substrings)| substrings.iter().any(|s| contains_ci(name, s)))
        .map(|(property, _)| (*property).to_string())
}

/// Decompose a point name (+ optional unit) into segments, abbreviations,
/// measurement type, device, property, and instance candidates
///. `abbreviation_catalog` is the ontology's known
/// abbreviation list; the analyzer itself has no ontology dependency.
#[must_use]
pub fn analyze(point_name: &str, unit: Option<&str>, abbreviation_catalog: &[&str]) -> Decomposition {
    let segments: Vec<String> = segment_re()
        .split(point_name)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();

    Decomposition {
        abbreviations: detect_abbreviations(point_name, abbreviation_catalog),
        measurement_type: detect_measurement_type(point_name, unit),
        device: detect_device(point_name),
        property: detect_property(point_name),
        instance_candidates: instance_candidates(leading_segment(point_name)),
        segments,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s1_pump_frequency() {
        let d = analyze("CH-SYS-1.CWP.VSD.Hz", Some("Hz"), &["CWP"]);
        assert_eq!(d.measurement_type.as_deref(), Some("frequency"));
        assert_eq!(d.device.as_deref(), Some("drive"));
        assert_eq!(d.instance_candidates, vec!["1".to_string()]);
        assert!(d.abbreviations.contains(&"CWP".to_string()));
    }

    #[test]
    fn s2_room_temperature_underscore_convention() {
        let d = analyze("FCU_01_25.RoomTemp", Some("degC"), &[]);
        assert_eq!(d.measurement_type.as_deref(), Some("temperature"));
        assert_eq!(d.instance_candidates, vec!["01".to_string(), "25".to_string()]);
        assert_eq!(d.instance(InstancePolicy::LastGroup).as_deref(), Some("25"));
        assert_eq!(d.instance(InstancePolicy::FirstGroup).as_deref(), Some("01"));
    }

    #[test]
    fn s3_structured_view_has_no_strong_signals() {
        let d = analyze("ChillerPlant", None, &[]);
        assert!(d.measurement_type.is_none());
        assert!(d.instance_candidates.is_empty());
    }

    #[test]
    fn segments_split_on_all_delimiters() {
        let d = analyze("AHU-1_Supply.Fan Speed", None, &[]);
        assert_eq!(
            d.segments,
            vec!["AHU", "1", "Supply", "Fan", "Speed"]
                .into_iter()
                .map(str::to_string)
                .collect::<Vec<_>>()
        );
    }

    #[test]
    fn leading_segment_and_suffix_split_on_first_dot() {
        assert_eq!(leading_segment("CH-SYS-1.CWP.VSD.Hz"), "CH-SYS-1");
        assert_eq!(suffix("CH-SYS-1.CWP.VSD.Hz"), "CWP.VSD.Hz");
        assert_eq!(leading_segment("ChillerPlant"), "ChillerPlant");
        assert_eq!(suffix("ChillerPlant"), "");
    }

    #[test]
    fn determinism_same_input_same_output() {
        let a = analyze("CT_3.VSD.Hz", Some("Hz"), &["CT"]);
        let b = analyze("CT_3.VSD.Hz", Some("Hz"), &["CT"]);
        assert_eq!(a, b);
    }

    proptest::proptest! {
        #[test]
        fn never_panics_on_arbitrary_input(name in "\\PC{0,64}", unit in proptest::option::of("\\PC{0,8}")) {
            let _ = analyze(&name, unit.as_deref(), &["CWP", "AHU", "VAV"]);
        }
    }
}
