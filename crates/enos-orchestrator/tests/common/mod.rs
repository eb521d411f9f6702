//! Shared fixtures for the orchestrator's end-to-end tests: an ontology and
//! canonical schema covering a chiller-plant pump, a fan coil unit, and a
//! cooling tower.

use enos_core::config::{CacheConfig, LlmConfig, PipelineConfig};
use enos_core::llm_client::LlmClient;
use enos_core::retry::RetryPolicy;
use enos_core::CanonicalPoint;
use enos_llm::{LlmAdapter, PromptCache, TokenBucketLimiter};
use enos_ontology::{EquipmentInfo, OntologyDocument, OntologyStore, ResourceOntology, StandardPoint};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[must_use]
pub fn ontology() -> OntologyStore {
    let mut equipment = HashMap::new();
    equipment.insert(
        "CH-SYS".to_string(),
        EquipmentInfo {
            abbreviations: vec!["CWP".to_string()],
            standard_points: vec![StandardPoint {
                name_pattern: "CWP.VSD.Hz".to_string(),
                canonical_id: Some("CH-SYS_PUMP_raw_frequency".to_string()),
                phenomenon: Some("frequency".to_string()),
                quantity: Some("frequency".to_string()),
                unit: Some("Hz".to_string()),
                function: Some("sensor".to_string()),
                component: Some("pump".to_string()),
            }],
            components: vec!["pump".to_string()],
            contradiction_substrings: vec![],
            description: "Chiller plant system".to_string(),
            primary_device: Some("pump".to_string()),
        },
    );
    equipment.insert(
        "FCU".to_string(),
        EquipmentInfo {
            abbreviations: vec![],
            standard_points: vec![StandardPoint {
                name_pattern: "RoomTemp".to_string(),
                canonical_id: Some("FCU_RoomTemp".to_string()),
                phenomenon: Some("temperature".to_string()),
                quantity: Some("temperature".to_string()),
                unit: Some("degC".to_string()),
                function: Some("sensor".to_string()),
                component: Some("Temperature Sensor".to_string()),
            }],
            components: vec!["Temperature Sensor".to_string()],
            contradiction_substrings: vec![],
            description: "Fan coil unit".to_string(),
            primary_device: None,
        },
    );
    equipment.insert(
        "CT".to_string(),
        EquipmentInfo {
            abbreviations: vec![],
            standard_points: vec![],
            components: vec!["fan".to_string()],
            contradiction_substrings: vec![],
            description: "Cooling tower".to_string(),
            primary_device: Some("fan".to_string()),
        },
    );
    let (store, _warnings) = OntologyStore::load(OntologyDocument { equipment, resources: ResourceOntology::default() }).unwrap();
    store
}

#[must_use]
pub fn schema() -> Vec<CanonicalPoint> {
    vec![
        CanonicalPoint::new("CH-SYS_PUMP_raw_frequency", "CH-SYS", "PUMP_raw_frequency", "frequency")
            .with_unit("Hz")
            .with_component("pump"),
        CanonicalPoint::new("FCU_RoomTemp", "FCU", "RoomTemp", "temperature")
            .with_unit("degC")
            .with_component("Temperature Sensor"),
        CanonicalPoint::new("CT_FAN_raw_frequency", "CT", "FAN_raw_frequency", "frequency")
            .with_unit("Hz")
            .with_component("fan"),
        CanonicalPoint::new("CT_BASIN_level", "CT", "BASIN_level", "level").with_unit("percent"),
    ]
}

#[must_use]
pub fn config() -> PipelineConfig {
    PipelineConfig::default()
}

#[must_use]
pub fn config_without_llm() -> PipelineConfig {
    let mut config = PipelineConfig::default();
    config.llm_enabled = false;
    config
}

#[must_use]
pub fn adapter(client: Arc<dyn LlmClient>) -> LlmAdapter {
    LlmAdapter::new(
        client,
        LlmConfig {
            model_id: "test-model".to_string(),
            temperature: 0.0,
            max_tokens: 200,
            call_deadline: Duration::from_secs(1),
            token_budget: 6000,
        },
        PromptCache::new(CacheConfig { enabled: false, ttl: Duration::from_secs(60), max_entries: 10 }),
        TokenBucketLimiter::new(1000, Duration::from_secs(1)),
        RetryPolicy::exponential_with_params(1, 1, 2),
    )
}
