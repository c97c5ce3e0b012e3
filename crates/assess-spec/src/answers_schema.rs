use serde_json::{Map, Value, json};

use crate::spec::assessment::AssessmentSpec;
use crate::spec::node::NodeSpec;
use crate::spec::question::{AnswerKind, QuestionNode};

/// Build a JSON schema describing the answer map an assessment collects.
///
/// Section answers nest as objects under the section identifier, matching
/// `BranchNodeResult::answer_map`.
pub fn generate(spec: &AssessmentSpec) -> Value {
    let (properties, required) = collect(&spec.children);
    json!({
        "$schema": "http://json-schema.org/draft-07/schema#",
        "title": format!("{} answers", spec.title),
        "type": "object",
        "properties": properties,
        "required": required,
        "additionalProperties": false,
    })
}

fn collect(children: &[NodeSpec]) -> (Map<String, Value>, Vec<String>) {
    let mut properties = Map::new();
    let mut required = Vec::new();
    for node in children {
        match node {
            NodeSpec::Question(question) => {
                properties.insert(question.identifier.clone(), question_schema(question));
                if question.required {
                    required.push(question.identifier.clone());
                }
            }
            NodeSpec::Section(section) => {
                let (nested, nested_required) = collect(&section.children);
                properties.insert(
                    section.identifier.clone(),
                    json!({
                        "type": "object",
                        "properties": nested,
                        "required": nested_required,
                    }),
                );
            }
            _ => {}
        }
    }
    (properties, required)
}

fn question_schema(question: &QuestionNode) -> Value {
    let mut schema = Map::new();
    let type_label = match question.answer_kind {
        AnswerKind::String | AnswerKind::Choice => "string",
        AnswerKind::Boolean => "boolean",
        AnswerKind::Integer => "integer",
        AnswerKind::Number => "number",
    };
    schema.insert("type".into(), Value::String(type_label.into()));
    if let Some(title) = &question.title {
        schema.insert("description".into(), Value::String(title.clone()));
    }
    if matches!(question.answer_kind, AnswerKind::Choice)
        && let Some(choices) = &question.choices
    {
        schema.insert(
            "enum".into(),
            Value::Array(choices.iter().cloned().map(Value::String).collect()),
        );
    }
    if let Some(constraint) = &question.constraint {
        if let Some(min) = constraint.min {
            schema.insert("minimum".into(), json!(min));
        }
        if let Some(max) = constraint.max {
            schema.insert("maximum".into(), json!(max));
        }
        if let Some(min_len) = constraint.min_len {
            schema.insert("minLength".into(), json!(min_len));
        }
        if let Some(max_len) = constraint.max_len {
            schema.insert("maxLength".into(), json!(max_len));
        }
        if let Some(pattern) = &constraint.pattern {
            schema.insert("pattern".into(), Value::String(pattern.clone()));
        }
    }
    Value::Object(schema)
}
