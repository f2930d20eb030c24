//! Unit tests for stream event records.

use crate::agent::domain::AgentId;
use crate::channel::domain::{Channel, ChannelName};
use crate::event::domain::{EventType, StreamEvent};
use crate::task::domain::{Task, TaskState};
use mockable::DefaultClock;
use rstest::rstest;
use serde_json::{Map, Value, json};

fn agent(id: &str) -> AgentId {
    AgentId::new(id).expect("valid agent id")
}

fn completed_task() -> (Task, StreamEvent) {
    let mut task = Task::new(
        agent("owner"),
        Some(agent("worker")),
        Value::Null,
        &DefaultClock,
    );
    task.transition_to(TaskState::Working, None, &DefaultClock)
        .expect("submitted -> working is valid");
    let change = task
        .transition_to(
            TaskState::Completed,
            Some(json!({"ok": true})),
            &DefaultClock,
        )
        .expect("working -> completed is valid");
    let event = StreamEvent::task_transition(&task, change);
    (task, event)
}

#[rstest]
#[case(EventType::ConnectionEstablished, "connection-established")]
#[case(EventType::TaskStateChanged, "task-state-changed")]
#[case(EventType::TaskProgress, "task-progress")]
#[case(EventType::TaskCompleted, "task-completed")]
#[case(EventType::TaskFailed, "task-failed")]
#[case(EventType::TaskCancelled, "task-cancelled")]
#[case(EventType::ChannelMessage, "channel-message")]
#[case(EventType::ChannelCreated, "channel-created")]
#[case(EventType::ChannelDeleted, "channel-deleted")]
#[case(EventType::Keepalive, "keepalive")]
fn event_type_wire_names(#[case] event_type: EventType, #[case] wire: &str) {
    assert_eq!(event_type.as_str(), wire);
    assert_eq!(EventType::try_from(wire), Ok(event_type));
    assert_eq!(
        serde_json::to_value(event_type).expect("serializable"),
        json!(wire)
    );
}

#[rstest]
fn event_type_rejects_unknown_names() {
    assert!(EventType::try_from("task-reopened").is_err());
}

#[rstest]
#[case(TaskState::Working, EventType::TaskStateChanged)]
#[case(TaskState::InputRequired, EventType::TaskStateChanged)]
#[case(TaskState::Paused, EventType::TaskStateChanged)]
#[case(TaskState::Completed, EventType::TaskCompleted)]
#[case(TaskState::Failed, EventType::TaskFailed)]
#[case(TaskState::Cancelled, EventType::TaskCancelled)]
fn task_state_maps_to_event_type(#[case] state: TaskState, #[case] expected: EventType) {
    assert_eq!(EventType::for_task_state(state), expected);
}

#[rstest]
fn task_event_serializes_identifying_fields() {
    let (task, event) = completed_task();

    let encoded = serde_json::to_value(&event).expect("serializable event");

    assert_eq!(encoded["type"], json!("task-completed"));
    assert_eq!(encoded["payload"]["task_id"], json!(task.id().to_string()));
    assert_eq!(encoded["payload"]["owner"], json!("owner"));
    assert_eq!(encoded["payload"]["target"], json!("worker"));
    assert_eq!(encoded["payload"]["state"], json!("completed"));
    assert_eq!(encoded["payload"]["previous_state"], json!("working"));
    assert_eq!(encoded["payload"]["result"], json!({"ok": true}));
    assert!(encoded["payload"].get("error").is_none());
    assert!(encoded["timestamp"].is_string());
}

#[rstest]
fn task_event_exposes_task_and_agents() {
    let (task, event) = completed_task();

    assert_eq!(event.task_id(), Some(task.id()));
    assert_eq!(event.agent_ids(), [&agent("owner"), &agent("worker")]);
    assert!(event.channel().is_none());
}

#[rstest]
fn channel_message_exposes_channel_and_sender() {
    let name = ChannelName::new("alerts.disk").expect("valid channel");
    let mut channel = Channel::new(name.clone(), agent("creator"), Map::new(), &DefaultClock);
    channel.record_message();

    let event = StreamEvent::channel_message(
        &channel,
        agent("sensor"),
        json!({"pct": 97}),
        &DefaultClock,
    );
    let encoded = serde_json::to_value(&event).expect("serializable event");

    assert_eq!(event.channel(), Some(&name));
    assert_eq!(event.agent_ids(), [&agent("sensor")]);
    assert!(event.task_id().is_none());
    assert_eq!(encoded["payload"]["channel"], json!("alerts.disk"));
    assert_eq!(encoded["payload"]["sequence"], json!(1));
}

#[rstest]
fn keepalive_has_empty_payload() {
    let event = StreamEvent::keepalive(&DefaultClock);

    let encoded = serde_json::to_value(&event).expect("serializable event");

    assert!(event.is_keepalive());
    assert_eq!(encoded["type"], json!("keepalive"));
    assert_eq!(encoded["payload"], json!({}));
}
