use std::collections::HashSet;

use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

use crate::reserved;
use crate::rules::RuleOperator;
use crate::spec::assessment::AssessmentSpec;
use crate::spec::node::NodeSpec;
use crate::spec::question::{AnswerKind, Constraint, QuestionNode};

/// One authoring problem found in an assessment definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub path: String,
    pub code: String,
    pub message: String,
}

/// Collected authoring problems; an empty report means the definition is
/// safe to navigate.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub findings: Vec<Finding>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.findings.is_empty()
    }

    fn push(&mut self, path: &str, code: &str, message: impl Into<String>) {
        self.findings.push(Finding {
            path: path.to_string(),
            code: code.to_string(),
            message: message.into(),
        });
    }
}

/// Walk the whole definition and report authoring errors the navigator
/// itself stays silent about: duplicate sibling identifiers, rule targets
/// that resolve nowhere, choice questions without choices, and unsatisfiable
/// constraints.
pub fn validate(spec: &AssessmentSpec) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_children(&spec.children, "", &mut report);
    check_markers(
        spec.progress_markers.as_deref(),
        &spec.children,
        "",
        &mut report,
    );
    report
}

fn validate_children(children: &[NodeSpec], parent: &str, report: &mut ValidationReport) {
    let mut seen = HashSet::new();
    for node in children {
        let path = format!("{}/{}", parent, node.identifier());
        if !seen.insert(node.identifier()) {
            report.push(
                &path,
                "duplicate_identifier",
                format!("identifier '{}' is used twice", node.identifier()),
            );
        }
        if let Some(next) = node.direct_next()
            && !target_exists(next, children)
        {
            report.push(
                &path,
                "unknown_next_target",
                format!("next points at unknown node '{}'", next),
            );
        }
        match node {
            NodeSpec::Question(question) => {
                validate_question(question, children, &path, report);
            }
            NodeSpec::Section(section) => {
                if section.children.is_empty() {
                    report.push(&path, "empty_section", "section has no children");
                }
                validate_children(&section.children, &path, report);
                check_markers(
                    section.progress_markers.as_deref(),
                    &section.children,
                    &path,
                    report,
                );
            }
            _ => {}
        }
    }
}

fn validate_question(
    question: &QuestionNode,
    siblings: &[NodeSpec],
    path: &str,
    report: &mut ValidationReport,
) {
    if matches!(question.answer_kind, AnswerKind::Choice) {
        let has_choices = question
            .choices
            .as_ref()
            .map(|choices| !choices.is_empty())
            .unwrap_or(false);
        if !has_choices {
            report.push(path, "missing_choices", "choice question has no choices");
        }
    }

    if let Some(constraint) = &question.constraint {
        validate_constraint(constraint, path, report);
    }

    for rule in &question.survey_rules {
        if !target_exists(&rule.skip_to, siblings) {
            report.push(
                path,
                "unknown_rule_target",
                format!("survey rule skips to unknown node '{}'", rule.skip_to),
            );
        }
        if rule.matching_value.is_none()
            && !matches!(rule.operator, RuleOperator::Equal | RuleOperator::NotEqual)
        {
            report.push(
                path,
                "rule_missing_value",
                "ordering operator needs a matching value",
            );
        }
    }
}

fn validate_constraint(constraint: &Constraint, path: &str, report: &mut ValidationReport) {
    if let (Some(min), Some(max)) = (constraint.min, constraint.max)
        && min > max
    {
        report.push(
            path,
            "constraint_bounds",
            format!("min '{}' exceeds max '{}'", min, max),
        );
    }
    if let (Some(min_len), Some(max_len)) = (constraint.min_len, constraint.max_len)
        && min_len > max_len
    {
        report.push(
            path,
            "constraint_bounds",
            format!("min_len '{}' exceeds max_len '{}'", min_len, max_len),
        );
    }
    if let Some(pattern) = &constraint.pattern
        && Regex::new(pattern).is_err()
    {
        report.push(
            path,
            "invalid_pattern",
            format!("'{}' is not a valid pattern", pattern),
        );
    }
}

fn check_markers(
    markers: Option<&[String]>,
    children: &[NodeSpec],
    parent: &str,
    report: &mut ValidationReport,
) {
    let Some(markers) = markers else { return };
    for marker in markers {
        if !children.iter().any(|node| node.identifier() == marker) {
            report.push(
                parent,
                "unknown_progress_marker",
                format!("progress marker '{}' names no child", marker),
            );
        }
    }
}

fn target_exists(target: &str, siblings: &[NodeSpec]) -> bool {
    reserved::is_reserved(target) || siblings.iter().any(|node| node.identifier() == target)
}

/// Error raised when a submitted answer does not fit the question.
#[derive(Debug, Error, PartialEq)]
pub enum AnswerError {
    #[error("expected {expected}")]
    TypeMismatch { expected: &'static str },
    #[error("value below minimum {0}")]
    BelowMinimum(f64),
    #[error("value above maximum {0}")]
    AboveMaximum(f64),
    #[error("shorter than minimum length {0}")]
    TooShort(usize),
    #[error("longer than maximum length {0}")]
    TooLong(usize),
    #[error("value does not match pattern '{0}'")]
    PatternMismatch(String),
    #[error("'{0}' is not an available choice")]
    UnknownChoice(String),
}

/// Check a decoded answer value against the question's declared kind and
/// constraint before it is recorded.
pub fn check_answer(question: &QuestionNode, value: &Value) -> Result<(), AnswerError> {
    match question.answer_kind {
        AnswerKind::String => {
            let text = value.as_str().ok_or(AnswerError::TypeMismatch {
                expected: "a string",
            })?;
            check_text(question.constraint.as_ref(), text)
        }
        AnswerKind::Boolean => {
            value.as_bool().ok_or(AnswerError::TypeMismatch {
                expected: "a boolean",
            })?;
            Ok(())
        }
        AnswerKind::Integer => {
            let number = value.as_i64().ok_or(AnswerError::TypeMismatch {
                expected: "an integer",
            })?;
            check_range(question.constraint.as_ref(), number as f64)
        }
        AnswerKind::Number => {
            let number = value.as_f64().ok_or(AnswerError::TypeMismatch {
                expected: "a number",
            })?;
            check_range(question.constraint.as_ref(), number)
        }
        AnswerKind::Choice => {
            let text = value.as_str().ok_or(AnswerError::TypeMismatch {
                expected: "one of the listed choices",
            })?;
            let known = question
                .choices
                .as_ref()
                .is_some_and(|choices| choices.iter().any(|choice| choice == text));
            if known {
                Ok(())
            } else {
                Err(AnswerError::UnknownChoice(text.to_string()))
            }
        }
    }
}

fn check_text(constraint: Option<&Constraint>, text: &str) -> Result<(), AnswerError> {
    let Some(constraint) = constraint else {
        return Ok(());
    };
    if let Some(min_len) = constraint.min_len
        && text.len() < min_len
    {
        return Err(AnswerError::TooShort(min_len));
    }
    if let Some(max_len) = constraint.max_len
        && text.len() > max_len
    {
        return Err(AnswerError::TooLong(max_len));
    }
    if let Some(pattern) = &constraint.pattern
        && let Ok(regex) = Regex::new(pattern)
        && !regex.is_match(text)
    {
        return Err(AnswerError::PatternMismatch(pattern.clone()));
    }
    Ok(())
}

fn check_range(constraint: Option<&Constraint>, number: f64) -> Result<(), AnswerError> {
    let Some(constraint) = constraint else {
        return Ok(());
    };
    if let Some(min) = constraint.min
        && number < min
    {
        return Err(AnswerError::BelowMinimum(min));
    }
    if let Some(max) = constraint.max
        && number > max
    {
        return Err(AnswerError::AboveMaximum(max));
    }
    Ok(())
}
