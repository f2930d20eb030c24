//! Given steps for hub behaviour scenarios.

use super::world::HubWorld;
use eyre::{OptionExt, eyre};
use rstest_bdd_macros::given;
use serde_json::{Value, json};
use switchboard::{stream::domain::SubscriptionFilter, task::domain::TaskId};

#[given(r#"a task created by "{owner}" for "{target}""#)]
fn task_created(world: &mut HubWorld, owner: String, target: String) -> Result<(), eyre::Report> {
    let created = world
        .call(&owner, "task.create", json!({"target": target}))?
        .clone()
        .map_err(|error| eyre!("task.create failed: {}", error.message))?;
    let task_id = created
        .get("id")
        .and_then(Value::as_str)
        .ok_or_eyre("created task has no id")?;
    world.task_id = Some(task_id.to_owned());
    Ok(())
}

#[given(r#""{agent}" has moved the task to "{state}""#)]
fn task_moved(world: &mut HubWorld, agent: String, state: String) -> Result<(), eyre::Report> {
    let task_id = world.current_task()?;
    let params = json!({"task_id": task_id, "state": state});
    world
        .call(&agent, "task.update_state", params)?
        .as_ref()
        .map_err(|error| eyre!("setup transition failed: {}", error.message))?;
    Ok(())
}

#[given(r#"a connection "{name}" following the task"#)]
fn connection_following_task(world: &mut HubWorld, name: String) -> Result<(), eyre::Report> {
    let task_id = TaskId::parse(&world.current_task()?)?;
    let handle = world
        .hub
        .streams()
        .create_connection(SubscriptionFilter::new().with_task(task_id))?;
    world.connections.insert(name, handle);
    Ok(())
}

#[given(r#"a connection "{name}" following another task"#)]
fn connection_following_other_task(world: &mut HubWorld, name: String) -> Result<(), eyre::Report> {
    let handle = world
        .hub
        .streams()
        .create_connection(SubscriptionFilter::new().with_task(TaskId::new()))?;
    world.connections.insert(name, handle);
    Ok(())
}

#[given(r#"a connection "{name}" subscribed to pattern "{pattern}""#)]
fn connection_with_pattern(
    world: &mut HubWorld,
    name: String,
    pattern: String,
) -> Result<(), eyre::Report> {
    let handle = world
        .hub
        .streams()
        .create_connection(SubscriptionFilter::new())?;
    let connection_id = handle.id().to_string();
    world.connections.insert(name.clone(), handle);
    world
        .call(
            &name,
            "channel.subscribe_pattern",
            json!({"connection_id": connection_id, "pattern": pattern}),
        )?
        .as_ref()
        .map_err(|error| eyre!("subscribe_pattern failed: {}", error.message))?;
    Ok(())
}

#[given(r#""{owner}" has created channel "{channel}""#)]
fn channel_created(
    world: &mut HubWorld,
    owner: String,
    channel: String,
) -> Result<(), eyre::Report> {
    world
        .call(&owner, "channel.create", json!({"channel": channel}))?
        .as_ref()
        .map_err(|error| eyre!("channel.create failed: {}", error.message))?;
    Ok(())
}
