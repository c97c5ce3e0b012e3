use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

use crate::spec::question::AnswerKind;

/// Direction a traversal step was taken in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Forward,
    Backward,
    Exit,
}

/// One traversal step, tagged with the direction it was taken in.
///
/// Markers disambiguate revisits when skip rules loop the participant back
/// over the same node; they are append-only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct PathMarker {
    pub identifier: String,
    pub direction: Direction,
}

/// Recorded answer for one visit of a question node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AnswerResult {
    pub identifier: String,
    #[serde(default)]
    pub answer_kind: AnswerKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub answer: Option<Value>,
}

/// Marker result for display-only steps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StepResult {
    pub identifier: String,
}

/// Result entry for one visited node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeResult {
    Answer(AnswerResult),
    Step(StepResult),
    Branch(BranchNodeResult),
}

impl NodeResult {
    pub fn identifier(&self) -> &str {
        match self {
            NodeResult::Answer(answer) => &answer.identifier,
            NodeResult::Step(step) => &step.identifier,
            NodeResult::Branch(branch) => &branch.identifier,
        }
    }

    pub fn as_answer(&self) -> Option<&AnswerResult> {
        match self {
            NodeResult::Answer(answer) => Some(answer),
            _ => None,
        }
    }
}

/// Error raised when exporting collected answers.
#[derive(Debug, Error)]
pub enum ResultExportError {
    #[error("cbor encode error: {0}")]
    Cbor(#[from] serde_cbor::Error),
    #[error("json encode error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Mutable per-branch record of everything collected while traversing one
/// sibling list.
///
/// `step_history` holds one entry per visit (loops may duplicate an
/// identifier); `path` holds one marker per traversal step in either
/// direction and is never truncated, so `path.len() >= step_history.len()`
/// whenever path tracking is in use.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct BranchNodeResult {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub step_history: Vec<NodeResult>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<PathMarker>,
}

impl BranchNodeResult {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            step_history: Vec::new(),
            path: Vec::new(),
        }
    }

    /// Most recent recorded answer for the given node, if any.
    pub fn answer_result(&self, identifier: &str) -> Option<&AnswerResult> {
        self.step_history.iter().rev().find_map(|result| {
            result
                .as_answer()
                .filter(|answer| answer.identifier == identifier)
        })
    }

    pub fn answer_result_mut(&mut self, identifier: &str) -> Option<&mut AnswerResult> {
        self.step_history.iter_mut().rev().find_map(|result| match result {
            NodeResult::Answer(answer) if answer.identifier == identifier => Some(answer),
            _ => None,
        })
    }

    /// Flattened identifier-to-answer object; the latest visit of a node
    /// wins, and section results nest as objects under their identifier.
    pub fn answer_map(&self) -> Map<String, Value> {
        let mut map = Map::new();
        for result in &self.step_history {
            match result {
                NodeResult::Answer(answer) => {
                    if let Some(value) = &answer.answer {
                        map.insert(answer.identifier.clone(), value.clone());
                    }
                }
                NodeResult::Branch(branch) => {
                    map.insert(branch.identifier.clone(), Value::Object(branch.answer_map()));
                }
                NodeResult::Step(_) => {}
            }
        }
        map
    }

    pub fn to_cbor(&self) -> Result<Vec<u8>, ResultExportError> {
        Ok(serde_cbor::to_vec(&Value::Object(self.answer_map()))?)
    }

    pub fn to_json_pretty(&self) -> Result<String, ResultExportError> {
        Ok(serde_json::to_string_pretty(&Value::Object(self.answer_map()))?)
    }
}
