//! Then steps for hub behaviour scenarios.

use super::world::HubWorld;
use eyre::eyre;
use rstest_bdd_macros::then;
use serde_json::{Value, json};
use switchboard::{
    event::domain::{EventType, StreamEvent},
    rpc::codes,
};

fn assert_that(condition: bool, message: impl Into<String>) -> Result<(), eyre::Report> {
    if condition {
        Ok(())
    } else {
        Err(eyre!(message.into()))
    }
}

fn code_for(kind: &str) -> Result<i64, eyre::Report> {
    match kind {
        "invalid params" => Ok(codes::INVALID_PARAMS),
        "not found" => Ok(codes::NOT_FOUND),
        "invalid state transition" => Ok(codes::INVALID_STATE_TRANSITION),
        "progress requires working" => Ok(codes::PROGRESS_REQUIRES_WORKING),
        "invalid channel" => Ok(codes::INVALID_CHANNEL),
        "channel exists" => Ok(codes::CHANNEL_EXISTS),
        other => Err(eyre!("unknown error kind in scenario: {other}")),
    }
}

#[then("the call succeeds")]
fn call_succeeds(world: &HubWorld) -> Result<(), eyre::Report> {
    match world.last_result.as_ref() {
        Some(Ok(_)) => Ok(()),
        Some(Err(error)) => Err(eyre!("call failed with {}: {}", error.code, error.message)),
        None => Err(eyre!("no call was made")),
    }
}

#[then(r#"the call fails with "{kind}""#)]
fn call_fails_with(world: &HubWorld, kind: String) -> Result<(), eyre::Report> {
    let expected = code_for(&kind)?;
    match world.last_result.as_ref() {
        Some(Err(error)) => {
            let got = format!("{} ({})", error.code, error.message);
            assert_that(
                error.code == expected,
                format!("expected code {expected}, got {got}"),
            )
        }
        Some(Ok(result)) => Err(eyre!("expected {kind}, call returned {result}")),
        None => Err(eyre!("no call was made")),
    }
}

#[then(r#"the task state is "{state}""#)]
fn task_state_is(world: &mut HubWorld, state: String) -> Result<(), eyre::Report> {
    let task_id = world.current_task()?;
    let task = world
        .call("observer", "task.get", json!({"task_id": task_id}))?
        .clone()
        .map_err(|error| eyre!("task.get failed: {}", error.message))?;
    assert_that(
        task.get("state").and_then(Value::as_str) == Some(state.as_str()),
        format!("expected state {state}, task is {task}"),
    )
}

#[then(r#"channel "{channel}" has {count:u64} message owned by "{owner}""#)]
fn channel_has_messages(
    world: &mut HubWorld,
    channel: String,
    count: u64,
    owner: String,
) -> Result<(), eyre::Report> {
    let info = world
        .call(&owner, "channel.info", json!({"channel": channel}))?
        .clone()
        .map_err(|error| eyre!("channel.info failed: {}", error.message))?;
    assert_that(
        info.get("message_count").and_then(Value::as_u64) == Some(count),
        format!("expected {count} messages, channel is {info}"),
    )?;
    assert_that(
        info.get("owner").and_then(Value::as_str) == Some(owner.as_str()),
        format!("expected owner {owner}, channel is {info}"),
    )
}

#[then(r#"connection "{name}" receives "{expected}""#)]
fn connection_receives(
    world: &HubWorld,
    name: String,
    expected: String,
) -> Result<(), eyre::Report> {
    let expected_types = expected
        .split(',')
        .map(|raw| EventType::try_from(raw.trim()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| eyre!("invalid event type in scenario: {err}"))?;
    let received: Vec<EventType> = world
        .drain(&name)?
        .iter()
        .map(StreamEvent::event_type)
        .collect();
    assert_that(
        received == expected_types,
        format!("connection {name} expected {expected_types:?}, received {received:?}"),
    )
}
