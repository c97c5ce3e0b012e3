use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::results::{AnswerResult, BranchNodeResult};
use crate::rules::SurveyRule;

/// Declared shape of a question's answer value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum AnswerKind {
    #[default]
    String,
    Boolean,
    Integer,
    Number,
    Choice,
}

/// Bounds applied to a question's answer before it is recorded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Default)]
pub struct Constraint {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_len: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_len: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// A single question screen with an optional ordered list of skip rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct QuestionNode {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(default)]
    pub answer_kind: AnswerKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub constraint: Option<Constraint>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub survey_rules: Vec<SurveyRule>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next: Option<String>,
}

impl QuestionNode {
    /// Fresh result placeholder stamped with this question's declared kind.
    pub fn new_result(&self) -> AnswerResult {
        AnswerResult {
            identifier: self.identifier.clone(),
            answer_kind: self.answer_kind,
            answer: None,
        }
    }

    /// Next-identifier override for this question.
    ///
    /// Peeking resolves only the unconditional `next` pointer; survey rules
    /// are consulted exclusively when committing, since they depend on an
    /// answer that is not final until the step is submitted.
    pub fn next_node_identifier(
        &self,
        branch: &BranchNodeResult,
        is_peeking: bool,
    ) -> Option<String> {
        if is_peeking {
            self.next.clone()
        } else {
            self.evaluate_survey_rules(branch)
                .or_else(|| self.next.clone())
        }
    }

    /// First matching rule in declared order wins.
    pub fn evaluate_survey_rules(&self, branch: &BranchNodeResult) -> Option<String> {
        if self.survey_rules.is_empty() {
            return None;
        }
        let answer = branch.answer_result(&self.identifier);
        self.survey_rules.iter().find_map(|rule| rule.evaluate(answer))
    }
}
