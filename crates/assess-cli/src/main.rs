mod wizard;

use std::fs;
use std::io::{self, BufRead};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use serde_json::{Map, Value};

use assess_nav::{BranchNodeState, BranchStatus};
use assess_spec::spec::node::NodeSpec;
use assess_spec::spec::question::{AnswerKind, QuestionNode};
use assess_spec::validate::ValidationReport;
use assess_spec::{
    AssessmentSpec, RuleOperator, SurveyRule, TemplateEngine, answers_schema, check_answer,
    validate,
};
use wizard::{AnswerParseError, NodeView, PromptContext, Verbosity, WizardPresenter, parse_answer};

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

#[derive(Parser)]
#[command(
    author,
    version,
    about = "Text-based assessment runner",
    long_about = "Runs branching assessment flows in a text shell and provides validation and schema helpers for assessment specs"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run an assessment interactively in a text shell.
    Run {
        /// Path to the assessment spec JSON.
        #[arg(long, value_name = "SPEC")]
        spec: PathBuf,
        /// Optional JSON file with previously collected answers.
        #[arg(long, value_name = "ANSWERS")]
        answers: Option<PathBuf>,
        /// Show verbose output (progress counters, parse expectations).
        #[arg(long, alias = "debug")]
        verbose: bool,
        /// Also emit the collected answers as pretty JSON.
        #[arg(long)]
        answers_json: bool,
    },
    /// Check an assessment spec for authoring errors.
    Validate {
        /// Path to the assessment spec JSON.
        #[arg(long, value_name = "SPEC")]
        spec: PathBuf,
    },
    /// Print the flattened node list with rule targets.
    Describe {
        /// Path to the assessment spec JSON.
        #[arg(long, value_name = "SPEC")]
        spec: PathBuf,
    },
    /// Emit the JSON schema for the expected answer map.
    Schema {
        /// Path to the assessment spec JSON.
        #[arg(long, value_name = "SPEC")]
        spec: PathBuf,
    },
}

fn main() -> CliResult<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Run {
            spec,
            answers,
            verbose,
            answers_json,
        } => run_assessment(spec, answers, verbose, answers_json),
        Command::Validate { spec } => run_validate(spec),
        Command::Describe { spec } => run_describe(spec),
        Command::Schema { spec } => run_schema(spec),
    }
}

enum AnswerFlow {
    Advance,
    MovedBack,
}

fn run_assessment(
    spec_path: PathBuf,
    answers_path: Option<PathBuf>,
    verbose: bool,
    answers_json: bool,
) -> CliResult<()> {
    let spec = load_spec(&spec_path)?;
    let report = validate(&spec);
    if !report.is_valid() {
        print_findings(&report);
        return Err("assessment definition has authoring errors".into());
    }
    let initial = match answers_path {
        Some(path) => load_answers(&path)?,
        None => Map::new(),
    };

    let engine = TemplateEngine::new();
    let mut presenter = WizardPresenter::new(Verbosity::from_verbose(verbose), answers_json);
    presenter.show_header(&spec.title, spec.description.as_deref());

    let mut state = BranchNodeState::for_assessment(&spec)?;
    let stdin = io::stdin();
    let mut input = stdin.lock();
    state.go_forward();

    while state.status() == BranchStatus::InProgress {
        let Some(node) = state.current_node() else {
            break;
        };
        let question = node.as_question().cloned();
        let mut view = NodeView::from_node(node);
        let answers = state.answer_map();
        view.title = engine.render_text(&view.title, &answers)?;
        if let Some(detail) = view.detail.take() {
            view.detail = Some(engine.render_text(&detail, &answers)?);
        }

        match question {
            Some(question) => {
                let current_value = answers
                    .get(&view.identifier)
                    .cloned()
                    .or_else(|| initial.get(&view.identifier).cloned());
                let prompt = PromptContext::new(
                    &view,
                    state.progress(),
                    state.has_node_after(),
                    current_value.as_ref(),
                );
                presenter.show_prompt(&prompt);
                let flow = collect_answer(
                    &mut input,
                    &mut state,
                    &view,
                    &question,
                    current_value,
                    &presenter,
                )?;
                if matches!(flow, AnswerFlow::Advance) {
                    state.go_forward();
                }
            }
            None => {
                presenter.show_step(&view);
                state.go_forward();
            }
        }
    }

    match state.status() {
        BranchStatus::Exited => presenter.show_exit(),
        _ => presenter.show_completion(state.branch_result()),
    }
    Ok(())
}

fn collect_answer(
    input: &mut impl BufRead,
    state: &mut BranchNodeState,
    view: &NodeView,
    question: &QuestionNode,
    prefill: Option<Value>,
    presenter: &WizardPresenter,
) -> CliResult<AnswerFlow> {
    loop {
        let line = read_line(input)?;
        let trimmed = line.trim();
        if trimmed == ":back" {
            if state.go_backward() {
                return Ok(AnswerFlow::MovedBack);
            }
            println!("Already at the first step.");
            continue;
        }
        if trimmed == ":skip" {
            if question.required {
                println!("This question is required.");
                continue;
            }
            return Ok(AnswerFlow::Advance);
        }
        if trimmed.is_empty() {
            if let Some(value) = &prefill {
                state.set_answer(value.clone())?;
                return Ok(AnswerFlow::Advance);
            }
            if !question.required {
                return Ok(AnswerFlow::Advance);
            }
            println!("This question is required.");
            continue;
        }
        match parse_answer(question.answer_kind, trimmed, &view.choices) {
            Ok(value) => {
                if let Err(err) = check_answer(question, &value) {
                    presenter.show_parse_error(&AnswerParseError::new(err.to_string(), None));
                    continue;
                }
                state.set_answer(value)?;
                return Ok(AnswerFlow::Advance);
            }
            Err(err) => {
                presenter.show_parse_error(&err);
                continue;
            }
        }
    }
}

fn read_line(input: &mut impl BufRead) -> CliResult<String> {
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err("input ended before the assessment completed".into());
    }
    Ok(line)
}

fn run_validate(spec_path: PathBuf) -> CliResult<()> {
    let spec = load_spec(&spec_path)?;
    let report = validate(&spec);
    if report.is_valid() {
        println!("No findings.");
        return Ok(());
    }
    print_findings(&report);
    Err(format!("{} finding(s)", report.findings.len()).into())
}

fn run_describe(spec_path: PathBuf) -> CliResult<()> {
    let spec = load_spec(&spec_path)?;
    println!("{} v{} ({})", spec.title, spec.version, spec.id);
    if let Some(description) = &spec.description {
        println!("{}", description);
    }
    if let Some(markers) = &spec.progress_markers {
        println!("Progress markers: {}", markers.join(", "));
    }
    describe_children(&spec.children, 0);
    Ok(())
}

fn describe_children(children: &[NodeSpec], depth: usize) {
    let indent = "  ".repeat(depth);
    for node in children {
        match node {
            NodeSpec::Instruction(step) => {
                println!(
                    "{}- {} [instruction]{}",
                    indent,
                    step.identifier,
                    next_suffix(step.next.as_deref())
                );
            }
            NodeSpec::Question(question) => {
                let mut line = format!(
                    "{}- {} [question: {}]",
                    indent,
                    question.identifier,
                    kind_label(question.answer_kind)
                );
                if question.required {
                    line.push_str(" required");
                }
                if !question.survey_rules.is_empty() {
                    line.push_str(&format!(" rules: {}", format_rules(&question.survey_rules)));
                }
                line.push_str(&next_suffix(question.next.as_deref()));
                println!("{}", line);
            }
            NodeSpec::Section(section) => {
                println!(
                    "{}- {} [section]{}",
                    indent,
                    section.identifier,
                    next_suffix(section.next.as_deref())
                );
                describe_children(&section.children, depth + 1);
            }
            NodeSpec::Completion(step) => {
                println!("{}- {} [completion]", indent, step.identifier);
            }
        }
    }
}

fn next_suffix(next: Option<&str>) -> String {
    match next {
        Some(next) => format!(" next: {}", next),
        None => String::new(),
    }
}

fn format_rules(rules: &[SurveyRule]) -> String {
    rules
        .iter()
        .map(|rule| match &rule.matching_value {
            Some(value) => format!(
                "{}{} -> {}",
                operator_symbol(rule.operator),
                value,
                rule.skip_to
            ),
            None => format!("unanswered -> {}", rule.skip_to),
        })
        .collect::<Vec<_>>()
        .join(", ")
}

fn operator_symbol(operator: RuleOperator) -> &'static str {
    match operator {
        RuleOperator::Equal => "=",
        RuleOperator::NotEqual => "!=",
        RuleOperator::LessThan => "<",
        RuleOperator::GreaterThan => ">",
        RuleOperator::LessThanEqual => "<=",
        RuleOperator::GreaterThanEqual => ">=",
    }
}

fn kind_label(kind: AnswerKind) -> &'static str {
    match kind {
        AnswerKind::String => "string",
        AnswerKind::Boolean => "boolean",
        AnswerKind::Integer => "integer",
        AnswerKind::Number => "number",
        AnswerKind::Choice => "choice",
    }
}

fn run_schema(spec_path: PathBuf) -> CliResult<()> {
    let spec = load_spec(&spec_path)?;
    let schema = answers_schema(&spec);
    println!("{}", serde_json::to_string_pretty(&schema)?);
    Ok(())
}

fn print_findings(report: &ValidationReport) {
    for finding in &report.findings {
        println!(" - {} [{}] {}", finding.path, finding.code, finding.message);
    }
}

fn load_spec(path: &Path) -> CliResult<AssessmentSpec> {
    let contents = fs::read_to_string(path)
        .map_err(|err| format!("failed to read {}: {}", path.display(), err))?;
    let spec = serde_json::from_str(&contents)
        .map_err(|err| format!("failed to parse {}: {}", path.display(), err))?;
    Ok(spec)
}

fn load_answers(path: &Path) -> CliResult<Map<String, Value>> {
    let contents = fs::read_to_string(path)
        .map_err(|err| format!("failed to read {}: {}", path.display(), err))?;
    let value: Value = serde_json::from_str(&contents)
        .map_err(|err| format!("failed to parse {}: {}", path.display(), err))?;
    value
        .as_object()
        .cloned()
        .ok_or_else(|| format!("{} must contain a JSON object of answers", path.display()).into())
}
