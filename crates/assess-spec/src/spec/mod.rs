pub mod assessment;
pub mod node;
pub mod question;

pub use assessment::AssessmentSpec;
pub use node::{CompletionNode, InstructionNode, NodeSpec, SectionNode};
pub use question::{AnswerKind, Constraint, QuestionNode};
