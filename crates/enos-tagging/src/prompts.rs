//! Prompt construction for the tagging engine's ambiguous-point LLM fallback.

use serde::Deserialize;

pub const TAGGING_SYSTEM_PROMPT: &str = "You assign a function to one ambiguous building-management-system \
point using its free-text description. Respond with exactly one JSON object of the form \
{\"function\": \"<sensor|command|setpoint|status|unknown>\"}. No other text.";

#[derive(Debug, Deserialize, PartialEq, Eq)]
pub struct FunctionEnvelope {
    pub function: String,
}

#[must_use]
pub fn build_user_prompt(point_name: &str, description: &str, equipment_type: &str) -> String {
    format!(
        "Equipment type: {equipment_type}\nPoint name: {point_name}\nDescription: {description}\n\n\
Choose the function that best matches this point."
    )
}
