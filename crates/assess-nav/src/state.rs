use serde_json::{Map, Value};
use thiserror::Error;

use assess_spec::reserved;
use assess_spec::results::{BranchNodeResult, Direction, NodeResult, PathMarker};
use assess_spec::spec::assessment::AssessmentSpec;
use assess_spec::spec::node::NodeSpec;

use crate::navigator::{Navigator, NavigatorError, Progress};

/// Error raised when recording an answer against the cursor.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("no current node to answer")]
    NoCurrentNode,
    #[error("current node '{0}' does not take an answer")]
    NotAQuestion(String),
    #[error("no result recorded for '{0}'")]
    MissingResult(String),
}

/// Lifecycle of one branch traversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BranchStatus {
    InProgress,
    /// Walked off the end of the child list (or hit a `nextSection` target).
    Finished,
    /// A rule requested an early exit from the whole run.
    Exited,
}

enum ForwardDecision {
    Move(String),
    Restart,
    End,
    Exit,
}

/// Mutable traversal cursor over one branch of an assessment.
///
/// The navigator computes pure decisions; this cursor applies them and is
/// the only writer of the branch result's `step_history` and `path`. Section
/// nodes are entered by nesting a child cursor, whose branch result is
/// appended to this level's history once the section finishes.
#[derive(Debug, Clone)]
pub struct BranchNodeState {
    navigator: Navigator,
    branch_result: BranchNodeResult,
    current: Option<String>,
    child: Option<Box<BranchNodeState>>,
    status: BranchStatus,
}

impl BranchNodeState {
    pub fn for_assessment(spec: &AssessmentSpec) -> Result<Self, NavigatorError> {
        let navigator = Navigator::for_assessment(spec)?;
        check_nested(navigator.nodes())?;
        Ok(Self::with_navigator(navigator))
    }

    /// Rebuild a cursor from a previously collected branch result; the
    /// cursor lands on the last visited node.
    pub fn restore(
        spec: &AssessmentSpec,
        branch_result: BranchNodeResult,
    ) -> Result<Self, NavigatorError> {
        let navigator = Navigator::for_assessment(spec)?;
        check_nested(navigator.nodes())?;
        let current = branch_result
            .step_history
            .last()
            .map(|result| result.identifier().to_string());
        Ok(Self {
            navigator,
            branch_result,
            current,
            child: None,
            status: BranchStatus::InProgress,
        })
    }

    fn with_navigator(navigator: Navigator) -> Self {
        let branch_result = BranchNodeResult::new(navigator.identifier());
        Self {
            navigator,
            branch_result,
            current: None,
            child: None,
            status: BranchStatus::InProgress,
        }
    }

    pub fn status(&self) -> BranchStatus {
        self.status
    }

    pub fn branch_result(&self) -> &BranchNodeResult {
        &self.branch_result
    }

    pub fn take_result(self) -> BranchNodeResult {
        self.branch_result
    }

    /// Answers collected so far, with any in-flight section answers
    /// flattened over the top for display purposes.
    pub fn answer_map(&self) -> Map<String, Value> {
        let mut map = self.branch_result.answer_map();
        if let Some(child) = &self.child {
            for (key, value) in child.answer_map() {
                map.insert(key, value);
            }
        }
        map
    }

    fn local_current(&self) -> Option<&NodeSpec> {
        self.current
            .as_deref()
            .and_then(|identifier| self.navigator.node(identifier))
    }

    /// The node a UI should present right now, drilling into sections.
    pub fn current_node(&self) -> Option<&NodeSpec> {
        if let Some(child) = &self.child {
            return child.current_node();
        }
        self.local_current()
    }

    pub fn progress(&self) -> Option<Progress> {
        if let Some(child) = &self.child {
            return child.progress();
        }
        self.local_current()
            .and_then(|node| self.navigator.progress(node))
    }

    pub fn has_node_after(&self) -> bool {
        if let Some(child) = &self.child
            && child.has_node_after()
        {
            return true;
        }
        self.local_current()
            .is_some_and(|node| self.navigator.has_node_after(node, &self.branch_result))
    }

    pub fn allow_back_navigation(&self) -> bool {
        if let Some(child) = &self.child
            && child.allow_back_navigation()
        {
            return true;
        }
        self.local_current()
            .is_some_and(|node| self.navigator.allow_back_navigation(node, &self.branch_result))
    }

    pub fn is_completed(&self) -> bool {
        if let Some(child) = &self.child {
            return child.is_completed();
        }
        self.local_current()
            .is_some_and(|node| self.navigator.is_completed(node, &self.branch_result))
    }

    /// Record an answer on the current question's most recent result entry.
    pub fn set_answer(&mut self, value: Value) -> Result<(), StateError> {
        if let Some(child) = self.child.as_mut() {
            return child.set_answer(value);
        }
        let Some(identifier) = self.current.clone() else {
            return Err(StateError::NoCurrentNode);
        };
        if self
            .navigator
            .node(&identifier)
            .and_then(NodeSpec::as_question)
            .is_none()
        {
            return Err(StateError::NotAQuestion(identifier));
        }
        match self.branch_result.answer_result_mut(&identifier) {
            Some(result) => {
                result.answer = Some(value);
                Ok(())
            }
            None => Err(StateError::MissingResult(identifier)),
        }
    }

    /// Commit one forward step: append the chosen node's fresh result and a
    /// forward path marker, descending into sections.
    pub fn go_forward(&mut self) -> BranchStatus {
        if self.status != BranchStatus::InProgress {
            return self.status;
        }
        if let Some(child) = self.child.as_mut() {
            match child.go_forward() {
                BranchStatus::InProgress => return BranchStatus::InProgress,
                BranchStatus::Exited => {
                    self.finish_child();
                    self.status = BranchStatus::Exited;
                    return BranchStatus::Exited;
                }
                BranchStatus::Finished => self.finish_child(),
            }
        }
        self.advance()
    }

    /// Move one step back along the recorded path. Returns false at the
    /// branch boundary; the cursor does not move and nothing is deleted.
    pub fn go_backward(&mut self) -> bool {
        if self.status != BranchStatus::InProgress {
            return false;
        }
        if let Some(child) = self.child.as_mut() {
            if child.go_backward() {
                return true;
            }
            let can_retreat = self
                .navigator
                .node_before(self.local_current(), &self.branch_result)
                .node
                .is_some();
            if !can_retreat {
                return false;
            }
            self.child = None;
            return self.retreat();
        }
        self.retreat()
    }

    fn finish_child(&mut self) {
        if let Some(child) = self.child.take() {
            self.branch_result
                .step_history
                .push(NodeResult::Branch(child.take_result()));
        }
    }

    fn advance(&mut self) -> BranchStatus {
        let decision = {
            let point = self
                .navigator
                .node_after(self.local_current(), &self.branch_result);
            match (point.node, point.direction) {
                (Some(node), _) => ForwardDecision::Move(node.identifier().to_string()),
                (None, Direction::Exit) => ForwardDecision::Exit,
                (None, _) => {
                    // Unresolved targets are the cursor's concern: `beginning`
                    // restarts this branch, everything else ends it.
                    let target = self
                        .local_current()
                        .and_then(|node| node.next_node_identifier(&self.branch_result, false));
                    match target.as_deref() {
                        Some(reserved::BEGINNING) => ForwardDecision::Restart,
                        _ => ForwardDecision::End,
                    }
                }
            }
        };
        match decision {
            ForwardDecision::Move(identifier) => self.move_forward_to(&identifier),
            ForwardDecision::Restart => {
                let first = self
                    .navigator
                    .nodes()
                    .first()
                    .map(|node| node.identifier().to_string());
                match first {
                    Some(identifier) => self.move_forward_to(&identifier),
                    None => {
                        self.status = BranchStatus::Finished;
                        self.status
                    }
                }
            }
            ForwardDecision::End => {
                self.status = BranchStatus::Finished;
                self.status
            }
            ForwardDecision::Exit => {
                self.status = BranchStatus::Exited;
                self.status
            }
        }
    }

    fn move_forward_to(&mut self, identifier: &str) -> BranchStatus {
        self.current = Some(identifier.to_string());
        self.branch_result.path.push(PathMarker {
            identifier: identifier.to_string(),
            direction: Direction::Forward,
        });

        let mut child_navigator = None;
        let mut result = None;
        match self.navigator.node(identifier) {
            Some(NodeSpec::Section(section)) => {
                child_navigator = Navigator::for_section(section).ok();
            }
            Some(node) => result = Some(node.new_result()),
            None => {}
        }
        if let Some(entry) = result {
            self.branch_result.step_history.push(entry);
        }
        if let Some(navigator) = child_navigator {
            let mut child = Self::with_navigator(navigator);
            match child.go_forward() {
                BranchStatus::InProgress => self.child = Some(Box::new(child)),
                BranchStatus::Exited => {
                    self.branch_result
                        .step_history
                        .push(NodeResult::Branch(child.take_result()));
                    self.status = BranchStatus::Exited;
                    return BranchStatus::Exited;
                }
                BranchStatus::Finished => {
                    self.branch_result
                        .step_history
                        .push(NodeResult::Branch(child.take_result()));
                    return self.advance();
                }
            }
        }
        BranchStatus::InProgress
    }

    fn retreat(&mut self) -> bool {
        let target = self
            .navigator
            .node_before(self.local_current(), &self.branch_result)
            .node
            .map(|node| node.identifier().to_string());
        let Some(identifier) = target else {
            return false;
        };
        self.branch_result.path.push(PathMarker {
            identifier: identifier.clone(),
            direction: Direction::Backward,
        });
        self.current = Some(identifier.clone());
        self.reenter_section(&identifier);
        true
    }

    /// Landing on a section node while moving backward re-opens it at its
    /// last visited screen, using the branch result committed on the way
    /// forward.
    fn reenter_section(&mut self, identifier: &str) {
        let section = self
            .navigator
            .node(identifier)
            .and_then(NodeSpec::as_section)
            .cloned();
        let Some(section) = section else { return };
        let committed = self
            .branch_result
            .step_history
            .iter()
            .rev()
            .find_map(|result| match result {
                NodeResult::Branch(branch) if branch.identifier == identifier => {
                    Some(branch.clone())
                }
                _ => None,
            });
        if let Some(branch_result) = committed
            && let Ok(navigator) = Navigator::for_section(&section)
        {
            let current = branch_result
                .step_history
                .last()
                .map(|result| result.identifier().to_string());
            self.child = Some(Box::new(Self {
                navigator,
                branch_result,
                current,
                child: None,
                status: BranchStatus::InProgress,
            }));
        }
    }
}

fn check_nested(nodes: &[NodeSpec]) -> Result<(), NavigatorError> {
    for node in nodes {
        if let Some(section) = node.as_section() {
            Navigator::for_section(section)?;
            check_nested(&section.children)?;
        }
    }
    Ok(())
}
