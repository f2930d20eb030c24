//! Behaviour tests for task streaming and channel publishing through the hub.

mod a2a_steps;

use a2a_steps::world::{HubWorld, world};
use rstest_bdd_macros::scenario;

#[scenario(
    path = "tests/features/task_streaming.feature",
    name = "Subscriber follows a task to completion"
)]
#[tokio::test(flavor = "multi_thread")]
async fn subscriber_follows_task_to_completion(world: HubWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/task_streaming.feature",
    name = "A terminal task rejects further transitions"
)]
#[tokio::test(flavor = "multi_thread")]
async fn terminal_task_rejects_transitions(world: HubWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/task_streaming.feature",
    name = "Progress requires a working task"
)]
#[tokio::test(flavor = "multi_thread")]
async fn progress_requires_working_task(world: HubWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/task_streaming.feature",
    name = "Repeating the same progress value is silent"
)]
#[tokio::test(flavor = "multi_thread")]
async fn repeated_progress_is_silent(world: HubWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/channel_bridge.feature",
    name = "First publish creates the channel"
)]
#[tokio::test(flavor = "multi_thread")]
async fn first_publish_creates_channel(world: HubWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/channel_bridge.feature",
    name = "Single-segment wildcard ignores deeper channels"
)]
#[tokio::test(flavor = "multi_thread")]
async fn single_segment_wildcard(world: HubWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/channel_bridge.feature",
    name = "Creating an existing channel is rejected"
)]
#[tokio::test(flavor = "multi_thread")]
async fn duplicate_channel_rejected(world: HubWorld) {
    let _ = world;
}

#[scenario(
    path = "tests/features/channel_bridge.feature",
    name = "Publishing to an invalid channel name is rejected"
)]
#[tokio::test(flavor = "multi_thread")]
async fn invalid_channel_rejected(world: HubWorld) {
    let _ = world;
}
