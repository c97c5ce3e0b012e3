#![allow(missing_docs)]

pub mod answers_schema;
pub mod reserved;
pub mod results;
pub mod rules;
pub mod spec;
pub mod template;
pub mod validate;

pub use answers_schema::generate as answers_schema;
pub use results::{
    AnswerResult, BranchNodeResult, Direction, NodeResult, PathMarker, ResultExportError,
    StepResult,
};
pub use rules::{DEFAULT_DECIMAL_DIGITS, RuleOperator, SurveyRule};
pub use spec::{
    AnswerKind, AssessmentSpec, CompletionNode, Constraint, InstructionNode, NodeSpec,
    QuestionNode, SectionNode,
};
pub use template::{TemplateEngine, TemplateError};
pub use validate::{AnswerError, Finding, ValidationReport, check_answer, validate};
