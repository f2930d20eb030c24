//! When steps for hub behaviour scenarios.

use super::world::HubWorld;
use eyre::WrapErr;
use rstest_bdd_macros::when;
use serde_json::json;

#[when(r#""{agent}" moves the task to "{state}""#)]
fn move_task(world: &mut HubWorld, agent: String, state: String) -> Result<(), eyre::Report> {
    let task_id = world.current_task()?;
    let params = json!({"task_id": task_id, "state": state});
    world.call(&agent, "task.update_state", params)?;
    Ok(())
}

#[when(r#""{agent}" sets the task progress to "{progress}""#)]
fn set_progress(world: &mut HubWorld, agent: String, progress: String) -> Result<(), eyre::Report> {
    let value: f64 = progress
        .parse()
        .wrap_err_with(|| format!("invalid progress in scenario: {progress}"))?;
    let task_id = world.current_task()?;
    let params = json!({"task_id": task_id, "progress": value});
    world.call(&agent, "task.set_progress", params)?;
    Ok(())
}

#[when(r#""{agent}" completes the task with result "{outcome}""#)]
fn complete_task(world: &mut HubWorld, agent: String, outcome: String) -> Result<(), eyre::Report> {
    let task_id = world.current_task()?;
    world.call(
        &agent,
        "task.update_state",
        json!({"task_id": task_id, "state": "completed", "result": {"outcome": outcome}}),
    )?;
    Ok(())
}

#[when(r#""{agent}" publishes to "{channel}""#)]
fn publish(world: &mut HubWorld, agent: String, channel: String) -> Result<(), eyre::Report> {
    world.call(
        &agent,
        "channel.publish",
        json!({"channel": channel, "message": {"from": agent}}),
    )?;
    Ok(())
}

#[when(r#""{owner}" creates channel "{channel}""#)]
fn create_channel(
    world: &mut HubWorld,
    owner: String,
    channel: String,
) -> Result<(), eyre::Report> {
    world.call(&owner, "channel.create", json!({"channel": channel}))?;
    Ok(())
}
