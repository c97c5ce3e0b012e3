use std::cmp::Ordering;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::results::AnswerResult;
use crate::spec::question::AnswerKind;

/// Decimal digits used for numeric equality when a rule carries no explicit
/// accuracy and the answer is not integer-typed.
pub const DEFAULT_DECIMAL_DIGITS: u32 = 5;

/// Comparison applied between the recorded answer and `matching_value`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "snake_case")]
pub enum RuleOperator {
    #[default]
    Equal,
    NotEqual,
    LessThan,
    GreaterThan,
    LessThanEqual,
    GreaterThanEqual,
}

/// One conditional skip target attached to a question.
///
/// Rules are evaluated in declared order and the first match wins. A rule
/// without a `matching_value` matches an unanswered question ("skip"
/// semantics).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct SurveyRule {
    pub skip_to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matching_value: Option<Value>,
    #[serde(default)]
    pub operator: RuleOperator,
    /// Decimal digits for numeric equality, overriding the kind-based default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub accuracy: Option<u32>,
}

impl SurveyRule {
    /// Returns the skip target when the recorded answer satisfies this rule.
    pub fn evaluate(&self, result: Option<&AnswerResult>) -> Option<String> {
        self.matches(result).then(|| self.skip_to.clone())
    }

    fn matches(&self, result: Option<&AnswerResult>) -> bool {
        let target = self.matching_value.as_ref().filter(|value| !value.is_null());
        let answer = result
            .and_then(|result| result.answer.as_ref())
            .filter(|value| !value.is_null());
        match (target, answer) {
            (None, None) => matches!(self.operator, RuleOperator::Equal),
            (None, Some(_)) | (Some(_), None) => matches!(self.operator, RuleOperator::NotEqual),
            (Some(target), Some(answer)) => {
                compare_values(answer, target, self.operator, self.decimal_digits(result))
            }
        }
    }

    fn decimal_digits(&self, result: Option<&AnswerResult>) -> u32 {
        self.accuracy.unwrap_or_else(|| {
            match result.map(|result| result.answer_kind) {
                Some(AnswerKind::Integer) => 0,
                _ => DEFAULT_DECIMAL_DIGITS,
            }
        })
    }
}

fn compare_values(answer: &Value, target: &Value, operator: RuleOperator, digits: u32) -> bool {
    match (answer, target) {
        (Value::Number(answer), Value::Number(target)) => {
            match (answer.as_f64(), target.as_f64()) {
                (Some(answer), Some(target)) => compare_numbers(answer, target, operator, digits),
                _ => matches!(operator, RuleOperator::NotEqual),
            }
        }
        (Value::String(answer), Value::String(target)) => {
            compare_ordering(answer.as_str().cmp(target), operator)
        }
        (Value::Bool(answer), Value::Bool(target)) => match operator {
            RuleOperator::Equal => answer == target,
            RuleOperator::NotEqual => answer != target,
            _ => false,
        },
        // Mismatched scalar types never compare as ordered or equal.
        _ => matches!(operator, RuleOperator::NotEqual),
    }
}

fn compare_numbers(answer: f64, target: f64, operator: RuleOperator, digits: u32) -> bool {
    match operator {
        RuleOperator::Equal => rounds_equal(answer, target, digits),
        RuleOperator::NotEqual => !rounds_equal(answer, target, digits),
        RuleOperator::LessThan => answer < target,
        RuleOperator::GreaterThan => answer > target,
        RuleOperator::LessThanEqual => answer <= target,
        RuleOperator::GreaterThanEqual => answer >= target,
    }
}

/// Equality after rounding both sides to `digits` decimal places, absorbing
/// floating-point round-off from decoded JSON numbers.
fn rounds_equal(answer: f64, target: f64, digits: u32) -> bool {
    let factor = 10f64.powi(digits as i32);
    (answer * factor).round() == (target * factor).round()
}

fn compare_ordering(ordering: Ordering, operator: RuleOperator) -> bool {
    match operator {
        RuleOperator::Equal => ordering.is_eq(),
        RuleOperator::NotEqual => !ordering.is_eq(),
        RuleOperator::LessThan => ordering.is_lt(),
        RuleOperator::GreaterThan => ordering.is_gt(),
        RuleOperator::LessThanEqual => ordering.is_le(),
        RuleOperator::GreaterThanEqual => ordering.is_ge(),
    }
}
