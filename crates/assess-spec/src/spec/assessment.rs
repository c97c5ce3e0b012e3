use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::spec::node::NodeSpec;

/// Top-level assessment definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AssessmentSpec {
    pub id: String,
    pub title: String,
    pub version: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_markers: Option<Vec<String>>,
    pub children: Vec<NodeSpec>,
}
