use std::fmt::Write;

use serde_json::{Number, Value};

use assess_nav::Progress;
use assess_spec::results::BranchNodeResult;
use assess_spec::spec::node::NodeSpec;
use assess_spec::spec::question::AnswerKind;

/// Controls which bits of state the wizard prints.
#[derive(Copy, Clone, Eq, PartialEq)]
pub enum Verbosity {
    /// Clean output: step text and question prompts only.
    Clean,
    /// Verbose output: progress counters and parse expectations.
    Verbose,
}

impl Verbosity {
    pub fn from_verbose(verbose: bool) -> Self {
        if verbose {
            Verbosity::Verbose
        } else {
            Verbosity::Clean
        }
    }

    pub fn is_verbose(&self) -> bool {
        matches!(self, Verbosity::Verbose)
    }
}

/// Display-only snapshot of the node the cursor is sitting on.
pub struct NodeView {
    pub identifier: String,
    pub title: String,
    pub detail: Option<String>,
    pub answer_kind: Option<AnswerKind>,
    pub required: bool,
    pub choices: Vec<String>,
}

impl NodeView {
    pub fn from_node(node: &NodeSpec) -> Self {
        let question = node.as_question();
        Self {
            identifier: node.identifier().to_string(),
            title: node
                .title()
                .unwrap_or_else(|| node.identifier())
                .to_string(),
            detail: node.detail().map(|detail| detail.to_string()),
            answer_kind: question.map(|question| question.answer_kind),
            required: question.map(|question| question.required).unwrap_or(false),
            choices: question
                .and_then(|question| question.choices.clone())
                .unwrap_or_default(),
        }
    }

}

/// Context used to format a single prompt.
pub struct PromptContext {
    pub position: Option<(usize, usize)>,
    pub title: String,
    pub detail: Option<String>,
    pub required: bool,
    pub hint: Option<String>,
    pub choices: Vec<String>,
    pub current_value: Option<Value>,
    pub is_last: bool,
}

impl PromptContext {
    pub fn new(
        view: &NodeView,
        progress: Option<Progress>,
        has_node_after: bool,
        current_value: Option<&Value>,
    ) -> Self {
        let hint = view
            .answer_kind
            .map(|kind| answer_hint(kind, &view.choices))
            .unwrap_or_default();
        Self {
            position: progress.map(|progress| (progress.current + 1, progress.total)),
            title: view.title.clone(),
            detail: view.detail.clone(),
            required: view.required,
            hint,
            choices: view.choices.clone(),
            current_value: current_value.cloned(),
            is_last: !has_node_after,
        }
    }
}

fn answer_hint(kind: AnswerKind, choices: &[String]) -> Option<String> {
    match kind {
        AnswerKind::Boolean => Some("(yes/no, y/n, true/false)".to_string()),
        AnswerKind::Integer => Some("(integer)".to_string()),
        AnswerKind::Number => Some("(number)".to_string()),
        AnswerKind::Choice if !choices.is_empty() => Some(format!("({})", choices.join("/"))),
        _ => None,
    }
}

/// Error produced when parsing answers from the user.
#[derive(Debug)]
pub struct AnswerParseError {
    pub user_message: String,
    pub debug_message: Option<String>,
}

impl AnswerParseError {
    pub fn new(user_message: impl Into<String>, debug_message: Option<String>) -> Self {
        Self {
            user_message: user_message.into(),
            debug_message,
        }
    }
}

/// Parse one line of input into the JSON scalar the question records.
pub fn parse_answer(
    kind: AnswerKind,
    input: &str,
    choices: &[String],
) -> Result<Value, AnswerParseError> {
    let trimmed = input.trim();
    match kind {
        AnswerKind::String => Ok(Value::String(trimmed.to_string())),
        AnswerKind::Boolean => match trimmed.to_lowercase().as_str() {
            "y" | "yes" | "true" => Ok(Value::Bool(true)),
            "n" | "no" | "false" => Ok(Value::Bool(false)),
            _ => Err(AnswerParseError::new(
                format!("'{}' is not a yes/no answer", trimmed),
                Some("yes/no, y/n, true/false".into()),
            )),
        },
        AnswerKind::Integer => trimmed
            .parse::<i64>()
            .map(|number| Value::Number(number.into()))
            .map_err(|_| {
                AnswerParseError::new(
                    format!("'{}' is not an integer", trimmed),
                    Some("a whole number such as 7".into()),
                )
            }),
        AnswerKind::Number => trimmed
            .parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .map(Value::Number)
            .ok_or_else(|| {
                AnswerParseError::new(
                    format!("'{}' is not a number", trimmed),
                    Some("a finite number such as 7.5".into()),
                )
            }),
        AnswerKind::Choice => choices
            .iter()
            .find(|choice| choice.eq_ignore_ascii_case(trimmed))
            .map(|choice| Value::String(choice.clone()))
            .ok_or_else(|| {
                AnswerParseError::new(
                    format!("'{}' is not an available choice", trimmed),
                    Some(format!("one of: {}", choices.join(", "))),
                )
            }),
    }
}

/// Prints headers, prompts, and the completion summary for a wizard run.
pub struct WizardPresenter {
    verbosity: Verbosity,
    header_printed: bool,
    show_answers_json: bool,
}

impl WizardPresenter {
    pub fn new(verbosity: Verbosity, show_answers_json: bool) -> Self {
        Self {
            verbosity,
            header_printed: false,
            show_answers_json,
        }
    }

    pub fn show_header(&mut self, title: &str, description: Option<&str>) {
        if self.header_printed {
            return;
        }
        println!("Assessment: {}", title);
        if self.verbosity.is_verbose()
            && let Some(description) = description
        {
            println!("About: {}", description);
        }
        self.header_printed = true;
    }

    /// Display-only step: instructions and completion screens.
    pub fn show_step(&self, view: &NodeView) {
        println!("{}", view.title);
        if let Some(detail) = &view.detail {
            println!("{}", detail);
        }
    }

    pub fn show_prompt(&self, prompt: &PromptContext) {
        let mut line = match prompt.position {
            Some((index, total)) => format!("{}/{} {}", index, total, prompt.title),
            None => prompt.title.clone(),
        };
        if prompt.required {
            line.push_str(" *");
        }
        if let Some(hint) = &prompt.hint {
            line.push(' ');
            line.push_str(hint);
        }
        println!("{}", line);
        if let Some(detail) = &prompt.detail {
            println!("{}", detail);
        }
        if let Some(value) = &prompt.current_value {
            println!("  Current answer: {} (press Enter to keep)", value_to_display(value));
        }
        if self.verbosity.is_verbose() {
            if !prompt.choices.is_empty() {
                println!("Choices: {}", prompt.choices.join(", "));
            }
            if prompt.is_last {
                println!("This is the last step.");
            }
        }
    }

    pub fn show_parse_error(&self, error: &AnswerParseError) {
        eprintln!("Invalid answer: {}", error.user_message);
        if self.verbosity.is_verbose()
            && let Some(debug) = &error.debug_message
        {
            eprintln!("  Expected: {}", debug);
        }
    }

    pub fn show_exit(&self) {
        println!("Assessment exited early.");
    }

    pub fn show_completion(&self, branch: &BranchNodeResult) {
        println!("Done ✅");
        match branch.to_cbor() {
            Ok(bytes) => {
                println!("Answers (CBOR hex): {}", encode_hex(&bytes));
            }
            Err(err) => {
                eprintln!("Failed to serialize answers to CBOR: {}", err);
            }
        }
        if self.show_answers_json {
            match branch.to_json_pretty() {
                Ok(pretty) => println!("{}", pretty),
                Err(err) => {
                    eprintln!("Failed to serialize answers to JSON: {}", err);
                }
            }
        }
    }
}

fn value_to_display(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => number.to_string(),
        other => other.to_string(),
    }
}

fn encode_hex(bytes: &[u8]) -> String {
    let mut encoded = String::with_capacity(bytes.len() * 2);
    for byte in bytes {
        write!(&mut encoded, "{:02x}", byte).expect("writing to string cannot fail");
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_each_answer_kind() {
        assert_eq!(
            parse_answer(AnswerKind::String, " hello ", &[]).unwrap(),
            json!("hello")
        );
        assert_eq!(
            parse_answer(AnswerKind::Boolean, "Y", &[]).unwrap(),
            json!(true)
        );
        assert_eq!(
            parse_answer(AnswerKind::Integer, "42", &[]).unwrap(),
            json!(42)
        );
        assert_eq!(
            parse_answer(AnswerKind::Number, "7.5", &[]).unwrap(),
            json!(7.5)
        );
        let choices = vec!["great".to_string(), "okay".to_string()];
        assert_eq!(
            parse_answer(AnswerKind::Choice, "OKAY", &choices).unwrap(),
            json!("okay")
        );
    }

    #[test]
    fn rejects_unparseable_input() {
        assert!(parse_answer(AnswerKind::Integer, "seven", &[]).is_err());
        assert!(parse_answer(AnswerKind::Boolean, "maybe", &[]).is_err());
        assert!(parse_answer(AnswerKind::Number, "inf+", &[]).is_err());
        let choices = vec!["great".to_string()];
        assert!(parse_answer(AnswerKind::Choice, "meh", &choices).is_err());
    }
}
