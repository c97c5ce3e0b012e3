#![allow(missing_docs)]

pub mod navigator;
pub mod state;

pub use navigator::{NavigationPoint, Navigator, NavigatorError, Progress};
pub use state::{BranchNodeState, BranchStatus, StateError};
