use std::collections::HashSet;

use serde::Serialize;
use thiserror::Error;

use assess_spec::reserved;
use assess_spec::results::{BranchNodeResult, Direction};
use assess_spec::spec::assessment::AssessmentSpec;
use assess_spec::spec::node::{NodeSpec, SectionNode};

/// Error raised while building a navigator.
#[derive(Debug, Error)]
pub enum NavigatorError {
    #[error("node identifier '{identifier}' is not unique within '{owner}'")]
    NotUniqueIdentifiers { owner: String, identifier: String },
}

/// Transient decision returned by every navigator query.
///
/// An absent node means "no such node": past the end of the list, an
/// unresolvable rule target, or an explicit exit.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NavigationPoint<'a> {
    pub node: Option<&'a NodeSpec>,
    pub direction: Direction,
}

/// Position within a run.
///
/// `is_estimated` is always true here: skip rules can shorten a run, so the
/// flat child (or marker) count is an upper bound, not a promise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Progress {
    pub current: usize,
    pub total: usize,
    pub is_estimated: bool,
}

/// Computes forward/backward navigation over one ordered sibling list.
///
/// The list is fixed at construction and every query is a pure function of
/// its inputs; the navigator never mutates the branch result it is handed.
#[derive(Debug, Clone)]
pub struct Navigator {
    identifier: String,
    nodes: Vec<NodeSpec>,
    progress_markers: Option<Vec<String>>,
}

impl Navigator {
    /// Fails when two siblings share an identifier; that is an authoring
    /// error in the definition, not a runtime condition.
    pub fn new(
        identifier: impl Into<String>,
        nodes: Vec<NodeSpec>,
        progress_markers: Option<Vec<String>>,
    ) -> Result<Self, NavigatorError> {
        let identifier = identifier.into();
        let mut seen = HashSet::new();
        for node in &nodes {
            if !seen.insert(node.identifier()) {
                return Err(NavigatorError::NotUniqueIdentifiers {
                    owner: identifier.clone(),
                    identifier: node.identifier().to_string(),
                });
            }
        }
        Ok(Self {
            identifier,
            nodes,
            progress_markers,
        })
    }

    pub fn for_assessment(spec: &AssessmentSpec) -> Result<Self, NavigatorError> {
        Self::new(
            spec.id.clone(),
            spec.children.clone(),
            spec.progress_markers.clone(),
        )
    }

    pub fn for_section(section: &SectionNode) -> Result<Self, NavigatorError> {
        Self::new(
            section.identifier.clone(),
            section.children.clone(),
            section.progress_markers.clone(),
        )
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }

    pub fn nodes(&self) -> &[NodeSpec] {
        &self.nodes
    }

    /// Lookup among direct children only; absent is a valid outcome.
    pub fn node(&self, identifier: &str) -> Option<&NodeSpec> {
        self.nodes.iter().find(|node| node.identifier() == identifier)
    }

    fn position(&self, identifier: &str) -> Option<usize> {
        self.nodes.iter().position(|node| node.identifier() == identifier)
    }

    /// Next node when committing to forward motion.
    ///
    /// A rule jump always reports `Forward`, even when the target sits
    /// earlier in the list; slide direction in a UI depends on that and this
    /// implementation does not support reversing it.
    pub fn node_after<'a>(
        &'a self,
        current: Option<&NodeSpec>,
        branch: &BranchNodeResult,
    ) -> NavigationPoint<'a> {
        let Some(current) = current else {
            return NavigationPoint {
                node: self.nodes.first(),
                direction: Direction::Forward,
            };
        };
        if let Some(target) = current.next_node_identifier(branch, false) {
            if target == reserved::EXIT {
                return NavigationPoint {
                    node: None,
                    direction: Direction::Exit,
                };
            }
            return NavigationPoint {
                node: self.node(&target),
                direction: Direction::Forward,
            };
        }
        let node = self
            .position(current.identifier())
            .and_then(|idx| self.nodes.get(idx + 1));
        NavigationPoint {
            node,
            direction: Direction::Forward,
        }
    }

    pub fn node_before<'a>(
        &'a self,
        current: Option<&NodeSpec>,
        branch: &BranchNodeResult,
    ) -> NavigationPoint<'a> {
        NavigationPoint {
            node: self.previous_node(current, branch),
            direction: Direction::Backward,
        }
    }

    /// Same rule consultation as [`node_after`](Self::node_after) but
    /// peeking, so conditional skips never resolve before the answer is
    /// committed. Used for "Next" vs "Done" button labeling.
    pub fn has_node_after(&self, current: &NodeSpec, branch: &BranchNodeResult) -> bool {
        match current.next_node_identifier(branch, true) {
            Some(target) if target == reserved::EXIT => false,
            Some(target) => self.node(&target).is_some(),
            None => self
                .position(current.identifier())
                .is_some_and(|idx| idx + 1 < self.nodes.len()),
        }
    }

    pub fn allow_back_navigation(&self, current: &NodeSpec, branch: &BranchNodeResult) -> bool {
        self.previous_node(Some(current), branch).is_some()
    }

    pub fn progress(&self, current: &NodeSpec) -> Option<Progress> {
        if let Some(markers) = &self.progress_markers {
            let idx = markers
                .iter()
                .position(|marker| marker == current.identifier())?;
            return Some(Progress {
                current: idx,
                total: markers.len(),
                is_estimated: true,
            });
        }
        let idx = self.position(current.identifier())?;
        Some(Progress {
            current: idx,
            total: self.nodes.len(),
            is_estimated: true,
        })
    }

    pub fn is_completed(&self, current: &NodeSpec, branch: &BranchNodeResult) -> bool {
        current.is_completion() && !self.allow_back_navigation(current, branch)
    }

    /// Resolve the node shown before `current`.
    ///
    /// Without path tracking this is plain positional lookup. With a path,
    /// the marker stream is walked instead so that revisits caused by loops
    /// resolve to the screen the participant actually came from: the normal
    /// case reads the marker before the LAST forward visit of `current`;
    /// when that marker names a node at or after `current`'s own position
    /// the path has looped, and the answer is taken from before the FIRST
    /// forward visit instead.
    fn previous_node<'a>(
        &'a self,
        current: Option<&NodeSpec>,
        branch: &BranchNodeResult,
    ) -> Option<&'a NodeSpec> {
        let Some(current) = current else {
            return match branch.step_history.last() {
                Some(result) => self.node(result.identifier()),
                None => self.nodes.first(),
            };
        };
        let current_idx = self.position(current.identifier())?;
        if branch.path.is_empty() {
            if current_idx == 0 {
                return None;
            }
            return self.nodes.get(current_idx - 1);
        }
        let last = branch.path.iter().rposition(|marker| {
            marker.identifier == current.identifier() && marker.direction == Direction::Forward
        })?;
        if last == 0 {
            return None;
        }
        let previous_idx = self.position(&branch.path[last - 1].identifier)?;
        if previous_idx < current_idx {
            return self.nodes.get(previous_idx);
        }
        let first = branch.path.iter().position(|marker| {
            marker.identifier == current.identifier() && marker.direction == Direction::Forward
        })?;
        if first == 0 {
            return None;
        }
        self.node(&branch.path[first - 1].identifier)
    }
}
