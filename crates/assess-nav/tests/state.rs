use serde_json::{Value, json};

use assess_nav::{BranchNodeState, BranchStatus};
use assess_spec::results::{Direction, NodeResult};
use assess_spec::spec::assessment::AssessmentSpec;
use assess_spec::spec::node::{CompletionNode, InstructionNode, NodeSpec, SectionNode};
use assess_spec::spec::question::{AnswerKind, QuestionNode};
use assess_spec::{RuleOperator, SurveyRule};

fn instruction(identifier: &str) -> NodeSpec {
    NodeSpec::Instruction(InstructionNode {
        identifier: identifier.into(),
        title: None,
        detail: None,
        next: None,
    })
}

fn question(identifier: &str, kind: AnswerKind, rules: Vec<SurveyRule>) -> NodeSpec {
    NodeSpec::Question(QuestionNode {
        identifier: identifier.into(),
        title: None,
        detail: None,
        answer_kind: kind,
        required: false,
        choices: None,
        constraint: None,
        survey_rules: rules,
        next: None,
    })
}

fn rule(value: Value, operator: RuleOperator, skip_to: &str) -> SurveyRule {
    SurveyRule {
        skip_to: skip_to.into(),
        matching_value: Some(value),
        operator,
        accuracy: None,
    }
}

fn make_spec(children: Vec<NodeSpec>) -> AssessmentSpec {
    AssessmentSpec {
        id: "run".into(),
        title: "Run".into(),
        version: "1.0.0".into(),
        description: None,
        progress_markers: None,
        children,
    }
}

fn current_identifier(state: &BranchNodeState) -> Option<String> {
    state.current_node().map(|node| node.identifier().to_string())
}

#[test]
fn forward_walk_commits_history_and_forward_markers() {
    let spec = make_spec(vec![
        instruction("step0"),
        instruction("step1"),
        instruction("step2"),
    ]);
    let mut state = BranchNodeState::for_assessment(&spec).expect("state");
    for expected in ["step0", "step1", "step2"] {
        assert_eq!(state.go_forward(), BranchStatus::InProgress);
        assert_eq!(current_identifier(&state).as_deref(), Some(expected));
    }
    assert_eq!(state.go_forward(), BranchStatus::Finished);

    let branch = state.branch_result();
    assert_eq!(branch.step_history.len(), 3);
    assert_eq!(branch.path.len(), 3);
    assert!(branch.path.iter().all(|marker| marker.direction == Direction::Forward));
    assert!(branch.path.len() >= branch.step_history.len());
}

#[test]
fn backward_moves_append_markers_without_new_history() {
    let spec = make_spec(vec![instruction("step0"), instruction("step1")]);
    let mut state = BranchNodeState::for_assessment(&spec).expect("state");
    state.go_forward();
    state.go_forward();
    assert!(state.go_backward());
    assert_eq!(current_identifier(&state).as_deref(), Some("step0"));
    // At the branch boundary the cursor stays put.
    assert!(!state.go_backward());
    assert_eq!(current_identifier(&state).as_deref(), Some("step0"));

    let branch = state.branch_result();
    assert_eq!(branch.step_history.len(), 2);
    assert_eq!(branch.path.len(), 3);
    assert_eq!(branch.path[2].direction, Direction::Backward);
}

#[test]
fn looping_survey_rules_keep_back_navigation_on_the_latest_pass() {
    let spec = make_spec(vec![
        question(
            "choiceQ1",
            AnswerKind::String,
            vec![rule(json!("skip"), RuleOperator::Equal, "followupQ")],
        ),
        instruction("stepB"),
        question(
            "followupQ",
            AnswerKind::String,
            vec![rule(json!("again"), RuleOperator::Equal, "choiceQ1")],
        ),
        instruction("end"),
    ]);
    let mut state = BranchNodeState::for_assessment(&spec).expect("state");

    state.go_forward();
    state.set_answer(json!("go")).expect("answer choiceQ1");
    state.go_forward();
    assert_eq!(current_identifier(&state).as_deref(), Some("stepB"));
    state.go_forward();
    state.set_answer(json!("again")).expect("answer followupQ");
    state.go_forward();
    assert_eq!(current_identifier(&state).as_deref(), Some("choiceQ1"));
    state.set_answer(json!("skip")).expect("answer choiceQ1 again");
    state.go_forward();
    assert_eq!(current_identifier(&state).as_deref(), Some("followupQ"));

    // Going back from the second visit lands on choiceQ1, not stepB.
    assert!(state.go_backward());
    assert_eq!(current_identifier(&state).as_deref(), Some("choiceQ1"));
}

#[test]
fn exit_rules_end_the_whole_run() {
    let spec = make_spec(vec![
        question(
            "sleep_hours",
            AnswerKind::Number,
            vec![rule(json!(0), RuleOperator::LessThanEqual, "exit")],
        ),
        instruction("rest"),
    ]);
    let mut state = BranchNodeState::for_assessment(&spec).expect("state");
    state.go_forward();
    state.set_answer(json!(0)).expect("answer");
    assert_eq!(state.go_forward(), BranchStatus::Exited);
    assert_eq!(state.status(), BranchStatus::Exited);
}

#[test]
fn answers_overwrite_on_revisit_and_reject_non_questions() {
    let spec = make_spec(vec![
        question("q1", AnswerKind::Integer, vec![]),
        instruction("pause"),
    ]);
    let mut state = BranchNodeState::for_assessment(&spec).expect("state");
    state.go_forward();
    state.set_answer(json!(1)).expect("first answer");
    state.go_forward();
    assert!(state.set_answer(json!(2)).is_err());
    assert!(state.go_backward());
    state.set_answer(json!(3)).expect("revised answer");

    let branch = state.branch_result();
    assert_eq!(branch.step_history.len(), 2);
    assert_eq!(branch.answer_map()["q1"], json!(3));
}

#[test]
fn sections_run_in_a_nested_cursor_and_fold_into_history() {
    let section = NodeSpec::Section(SectionNode {
        identifier: "secA".into(),
        title: None,
        detail: None,
        children: vec![
            question("inner1", AnswerKind::Integer, vec![]),
            question("inner2", AnswerKind::Integer, vec![]),
        ],
        progress_markers: None,
        next: None,
    });
    let spec = make_spec(vec![instruction("intro"), section, instruction("outro")]);
    let mut state = BranchNodeState::for_assessment(&spec).expect("state");

    state.go_forward();
    assert_eq!(current_identifier(&state).as_deref(), Some("intro"));
    state.go_forward();
    assert_eq!(current_identifier(&state).as_deref(), Some("inner1"));
    state.set_answer(json!(10)).expect("inner1");
    state.go_forward();
    assert_eq!(current_identifier(&state).as_deref(), Some("inner2"));
    state.set_answer(json!(20)).expect("inner2");
    state.go_forward();
    assert_eq!(current_identifier(&state).as_deref(), Some("outro"));

    let branch = state.branch_result();
    let nested = branch
        .step_history
        .iter()
        .find_map(|result| match result {
            NodeResult::Branch(branch) if branch.identifier == "secA" => Some(branch),
            _ => None,
        })
        .expect("section result folded into history");
    assert_eq!(nested.step_history.len(), 2);
    assert_eq!(state.answer_map()["secA"], json!({ "inner1": 10, "inner2": 20 }));
}

#[test]
fn backing_into_a_section_reopens_its_last_screen() {
    let section = NodeSpec::Section(SectionNode {
        identifier: "secA".into(),
        title: None,
        detail: None,
        children: vec![
            question("inner1", AnswerKind::Integer, vec![]),
            question("inner2", AnswerKind::Integer, vec![]),
        ],
        progress_markers: None,
        next: None,
    });
    let spec = make_spec(vec![section, instruction("outro")]);
    let mut state = BranchNodeState::for_assessment(&spec).expect("state");
    state.go_forward();
    state.set_answer(json!(1)).expect("inner1");
    state.go_forward();
    state.set_answer(json!(2)).expect("inner2");
    state.go_forward();
    assert_eq!(current_identifier(&state).as_deref(), Some("outro"));

    assert!(state.go_backward());
    assert_eq!(current_identifier(&state).as_deref(), Some("inner2"));
    assert!(state.go_backward());
    assert_eq!(current_identifier(&state).as_deref(), Some("inner1"));
}

#[test]
fn beginning_target_restarts_the_branch() {
    let restart = NodeSpec::Instruction(InstructionNode {
        identifier: "restart".into(),
        title: None,
        detail: None,
        next: Some("beginning".into()),
    });
    let spec = make_spec(vec![question("q1", AnswerKind::Integer, vec![]), restart]);
    let mut state = BranchNodeState::for_assessment(&spec).expect("state");
    state.go_forward();
    state.set_answer(json!(1)).expect("answer");
    state.go_forward();
    assert_eq!(current_identifier(&state).as_deref(), Some("restart"));
    assert_eq!(state.go_forward(), BranchStatus::InProgress);
    assert_eq!(current_identifier(&state).as_deref(), Some("q1"));

    let branch = state.branch_result();
    let q1_visits = branch
        .path
        .iter()
        .filter(|marker| marker.identifier == "q1" && marker.direction == Direction::Forward)
        .count();
    assert_eq!(q1_visits, 2);
}

#[test]
fn restore_resumes_at_the_last_visited_node() {
    let spec = make_spec(vec![
        question("q1", AnswerKind::Integer, vec![]),
        instruction("pause"),
        instruction("end"),
    ]);
    let mut state = BranchNodeState::for_assessment(&spec).expect("state");
    state.go_forward();
    state.set_answer(json!(5)).expect("answer");
    state.go_forward();

    let saved = state.branch_result().clone();
    let resumed = BranchNodeState::restore(&spec, saved).expect("restore");
    assert_eq!(current_identifier(&resumed).as_deref(), Some("pause"));
    assert_eq!(resumed.answer_map()["q1"], json!(5));
}

#[test]
fn next_and_done_labels_follow_has_node_after() {
    let spec = make_spec(vec![
        instruction("intro"),
        NodeSpec::Completion(CompletionNode {
            identifier: "done".into(),
            title: None,
            detail: None,
        }),
    ]);
    let mut state = BranchNodeState::for_assessment(&spec).expect("state");
    state.go_forward();
    assert!(state.has_node_after());
    state.go_forward();
    assert!(!state.has_node_after());
    assert!(state.allow_back_navigation());
    assert!(!state.is_completed());
}
