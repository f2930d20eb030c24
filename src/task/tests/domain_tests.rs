//! Unit tests for task domain types.

use crate::agent::domain::AgentId;
use crate::task::domain::{ProgressUpdate, Task, TaskDomainError, TaskId, TaskQuery, TaskState};
use mockable::DefaultClock;
use rstest::rstest;
use serde_json::{Value, json};

fn agent(id: &str) -> AgentId {
    AgentId::new(id).expect("valid agent id")
}

fn working_task() -> Task {
    let target = Some(agent("worker"));
    let mut task = Task::new(agent("requester"), target, Value::Null, &DefaultClock);
    task.transition_to(TaskState::Working, None, &DefaultClock)
        .expect("submitted -> working is valid");
    task
}

#[rstest]
fn new_task_starts_submitted() {
    let task = Task::new(
        agent("requester"),
        None,
        json!({"prompt": "summarise"}),
        &DefaultClock,
    );

    assert_eq!(task.state(), TaskState::Submitted);
    assert_eq!(task.progress().to_bits(), 0.0_f64.to_bits());
    assert!(task.history().is_empty());
    assert_eq!(task.input(), &json!({"prompt": "summarise"}));
    assert_eq!(task.created_at(), task.updated_at());
}

#[rstest]
#[case("submitted", TaskState::Submitted)]
#[case("working", TaskState::Working)]
#[case("input-required", TaskState::InputRequired)]
#[case("input_required", TaskState::InputRequired)]
#[case("Paused", TaskState::Paused)]
#[case("completed", TaskState::Completed)]
#[case("failed", TaskState::Failed)]
#[case("cancelled", TaskState::Cancelled)]
#[case("canceled", TaskState::Cancelled)]
fn task_state_parses_wire_names(#[case] input: &str, #[case] expected: TaskState) {
    assert_eq!(TaskState::try_from(input), Ok(expected));
}

#[rstest]
fn task_state_rejects_unknown_names() {
    assert!(TaskState::try_from("reopened").is_err());
}

#[rstest]
fn task_state_serializes_kebab_case() {
    let encoded = serde_json::to_value(TaskState::InputRequired).expect("serializable state");
    assert_eq!(encoded, json!("input-required"));
}

#[rstest]
fn task_id_parse_rejects_non_uuid() {
    assert_eq!(
        TaskId::parse("task-1"),
        Err(TaskDomainError::InvalidTaskId("task-1".to_owned()))
    );
}

#[rstest]
fn task_id_round_trips_through_display() {
    let id = TaskId::new();
    assert_eq!(TaskId::parse(&id.to_string()), Ok(id));
}

#[rstest]
fn completed_transition_stores_result_payload() {
    let mut task = working_task();
    let outcome = Some(json!({"ok": true}));

    task.transition_to(TaskState::Completed, outcome, &DefaultClock)
        .expect("working -> completed is valid");

    assert_eq!(task.result(), Some(&json!({"ok": true})));
    assert_eq!(task.error(), None);
}

#[rstest]
fn failed_transition_stores_error_payload() {
    let mut task = working_task();
    let reason = Some(json!({"reason": "timeout"}));

    task.transition_to(TaskState::Failed, reason, &DefaultClock)
        .expect("working -> failed is valid");

    assert_eq!(task.error(), Some(&json!({"reason": "timeout"})));
    assert_eq!(task.result(), None);
}

#[rstest]
fn payload_is_ignored_for_non_terminal_destinations() {
    let mut task = working_task();
    let ignored = Some(json!({"ignored": true}));

    task.transition_to(TaskState::Paused, ignored, &DefaultClock)
        .expect("working -> paused is valid");

    assert_eq!(task.result(), None);
    assert_eq!(task.error(), None);
}

#[rstest]
#[case(0.4, 0.4)]
#[case(1.7, 1.0)]
fn set_progress_clamps_and_advances(#[case] reported: f64, #[case] expected: f64) {
    let mut task = working_task();

    let update = task
        .set_progress(reported, &DefaultClock)
        .expect("progress while working");

    assert_eq!(
        update,
        ProgressUpdate::Advanced {
            previous: 0.0,
            current: expected,
        }
    );
    assert_eq!(task.progress().to_bits(), expected.to_bits());
}

#[rstest]
#[case(0.5)]
#[case(0.2)]
#[case(f64::MIN)]
fn set_progress_never_decreases(#[case] reported: f64) {
    let mut task = working_task();
    task.set_progress(0.5, &DefaultClock)
        .expect("progress while working");

    let update = task
        .set_progress(reported, &DefaultClock)
        .expect("progress while working");

    assert_eq!(update, ProgressUpdate::Unchanged);
    assert_eq!(task.progress().to_bits(), 0.5_f64.to_bits());
}

#[rstest]
#[case(f64::NAN)]
#[case(f64::INFINITY)]
fn set_progress_rejects_non_finite_values(#[case] reported: f64) {
    let mut task = working_task();

    assert_eq!(
        task.set_progress(reported, &DefaultClock),
        Err(TaskDomainError::NonFiniteProgress)
    );
}

#[rstest]
fn set_progress_requires_working_state() {
    let mut task = Task::new(agent("requester"), None, Value::Null, &DefaultClock);

    assert_eq!(
        task.set_progress(0.3, &DefaultClock),
        Err(TaskDomainError::ProgressRequiresWorking {
            task_id: task.id(),
            state: TaskState::Submitted,
        })
    );
}

#[rstest]
fn resuming_from_paused_keeps_progress() {
    let mut task = working_task();
    task.set_progress(0.6, &DefaultClock)
        .expect("progress while working");
    task.transition_to(TaskState::Paused, None, &DefaultClock)
        .expect("working -> paused is valid");

    task.transition_to(TaskState::Working, None, &DefaultClock)
        .expect("paused -> working is valid");

    assert_eq!(task.progress().to_bits(), 0.6_f64.to_bits());
}

#[rstest]
fn task_query_matches_on_every_set_field() {
    let task = working_task();

    let both = TaskQuery {
        owner: Some(agent("requester")),
        state: Some(TaskState::Working),
    };
    let wrong_state = TaskQuery {
        owner: Some(agent("requester")),
        state: Some(TaskState::Submitted),
    };
    let wrong_owner = TaskQuery {
        owner: Some(agent("worker")),
        state: None,
    };

    assert!(TaskQuery::default().matches(&task));
    assert!(both.matches(&task));
    assert!(!wrong_state.matches(&task));
    assert!(!wrong_owner.matches(&task));
}
