//! Shared fixtures for downstream crates' test modules, gated behind the
//! `test-support` feature.

use crate::ids::PointId;
use crate::llm_client::{LlmClient, LlmError, LlmRequest};
use crate::point::{Point, PointType};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

/// Pump frequency point on a clean naming convention, maps cleanly.
#[must_use]
pub fn s1_point() -> Point {
    Point::new("p1", "CH-SYS-1.CWP.VSD.Hz", PointType::AnalogInput).with_unit("Hz")
}

/// Room temperature point using the underscore naming convention with two
/// numeric groups.
#[must_use]
pub fn s2_point() -> Point {
    Point::new("p2", "FCU_01_25.RoomTemp", PointType::AnalogInput).with_unit("degC")
}

/// A structured-view container point, never itself mapped or tagged.
#[must_use]
pub fn s3_point() -> Point {
    Point::new("p3", "ChillerPlant", PointType::StructuredView)
}

/// Cooling-tower fan point driven through a generic VSD signal, a case that
/// leans on reflection to resolve.
#[must_use]
pub fn s5_point() -> Point {
    Point::new("p5", "CT_3.VSD.Hz", PointType::AnalogInput).with_unit("Hz")
}

/// A deterministic, in-memory `LlmClient` for tests: canned responses keyed by
/// an exact match on `request.user`, with a default fallback for anything
/// unmapped. Never touches the network, so it is safe for the determinism
/// property test and CI.
pub struct ScriptedLlmClient {
    responses: Mutex<HashMap<String, String>>,
    default_response: String,
    calls: Mutex<Vec<String>>,
}

impl ScriptedLlmClient {
    #[must_use]
    pub fn new(default_response: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(HashMap::new()),
            default_response: default_response.into(),
            calls: Mutex::new(Vec::new()),
        }
    }

    #[must_use]
    pub fn with_response(self, user_prompt: impl Into<String>, response: impl Into<String>) -> Self {
        self.responses
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .insert(user_prompt.into(), response.into());
        self
    }

    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap_or_else(|e| e.into_inner()).len()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlmClient {
    fn name(&self) -> &str {
        "scripted-test-client"
    }

    async fn complete(&self, request: &LlmRequest) -> Result<String, LlmError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(request.user.clone());
        let responses = self.responses.lock().unwrap_or_else(|e| e.into_inner());
        Ok(responses
            .get(&request.user)
            .cloned()
            .unwrap_or_else(|| self.default_response.clone()))
    }
}

#[must_use]
pub fn point_id(s: &str) -> PointId {
    PointId(s.to_string())
}
