use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::results::{BranchNodeResult, NodeResult, StepResult};
use crate::spec::question::QuestionNode;

/// One addressable unit in an assessment: a step, question, section, or
/// completion marker.
///
/// Serialization and navigation share this single sum type; the navigator
/// only ever consumes it through the capability methods below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NodeSpec {
    Instruction(InstructionNode),
    Question(QuestionNode),
    Section(SectionNode),
    Completion(CompletionNode),
}

/// Display-only step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct InstructionNode {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

/// A nested group of nodes navigated by its own child cursor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SectionNode {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<NodeSpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_markers: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

/// Terminal marker step shown when a run is complete.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CompletionNode {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl NodeSpec {
    pub fn identifier(&self) -> &str {
        match self {
            NodeSpec::Instruction(step) => &step.identifier,
            NodeSpec::Question(question) => &question.identifier,
            NodeSpec::Section(section) => &section.identifier,
            NodeSpec::Completion(step) => &step.identifier,
        }
    }

    pub fn title(&self) -> Option<&str> {
        match self {
            NodeSpec::Instruction(step) => step.title.as_deref(),
            NodeSpec::Question(question) => question.title.as_deref(),
            NodeSpec::Section(section) => section.title.as_deref(),
            NodeSpec::Completion(step) => step.title.as_deref(),
        }
    }

    pub fn detail(&self) -> Option<&str> {
        match self {
            NodeSpec::Instruction(step) => step.detail.as_deref(),
            NodeSpec::Question(question) => question.detail.as_deref(),
            NodeSpec::Section(section) => section.detail.as_deref(),
            NodeSpec::Completion(step) => step.detail.as_deref(),
        }
    }

    pub fn is_completion(&self) -> bool {
        matches!(self, NodeSpec::Completion(_))
    }

    pub fn as_question(&self) -> Option<&QuestionNode> {
        match self {
            NodeSpec::Question(question) => Some(question),
            _ => None,
        }
    }

    pub fn as_section(&self) -> Option<&SectionNode> {
        match self {
            NodeSpec::Section(section) => Some(section),
            _ => None,
        }
    }

    /// Unconditional next pointer, ignoring survey rules.
    pub fn direct_next(&self) -> Option<&str> {
        match self {
            NodeSpec::Instruction(step) => step.next.as_deref(),
            NodeSpec::Question(question) => question.next.as_deref(),
            NodeSpec::Section(section) => section.next.as_deref(),
            NodeSpec::Completion(_) => None,
        }
    }

    /// Fresh result placeholder for one visit of this node.
    ///
    /// Section results are materialized by the child cursor instead; the
    /// placeholder here only carries the identifier.
    pub fn new_result(&self) -> NodeResult {
        match self {
            NodeSpec::Question(question) => NodeResult::Answer(question.new_result()),
            NodeSpec::Section(section) => {
                NodeResult::Branch(BranchNodeResult::new(section.identifier.clone()))
            }
            other => NodeResult::Step(StepResult {
                identifier: other.identifier().to_string(),
            }),
        }
    }

    /// The navigation-rule capability: an explicit next-identifier override.
    pub fn next_node_identifier(
        &self,
        branch: &BranchNodeResult,
        is_peeking: bool,
    ) -> Option<String> {
        match self {
            NodeSpec::Question(question) => question.next_node_identifier(branch, is_peeking),
            NodeSpec::Instruction(step) => step.next.clone(),
            NodeSpec::Section(section) => section.next.clone(),
            NodeSpec::Completion(_) => None,
        }
    }
}
