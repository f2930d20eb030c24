//! Unit tests for channel bridge orchestration.

use std::sync::{Arc, Mutex};

use crate::agent::domain::AgentId;
use crate::channel::{
    adapters::memory::InMemoryChannelRepository,
    services::{
        ChannelBridge, ChannelBridgeError, CreateChannelRequest, PublishRequest,
        SubscribePatternRequest,
    },
};
use crate::event::{
    domain::{EventPayload, EventType, StreamEvent},
    ports::EventSink,
};
use crate::stream::{
    domain::{ConnectionId, SubscriptionFilter},
    ports::SubscriptionError,
    services::StreamManager,
};
use crate::task::domain::TaskId;
use eyre::{OptionExt, ensure};
use mockable::DefaultClock;
use rstest::{fixture, rstest};
use serde_json::{Map, json};

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<StreamEvent>>,
}

impl RecordingSink {
    fn types(&self) -> Vec<EventType> {
        self.events
            .lock()
            .expect("sink lock")
            .iter()
            .map(StreamEvent::event_type)
            .collect()
    }

    fn last(&self) -> Option<StreamEvent> {
        self.events.lock().expect("sink lock").last().cloned()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: StreamEvent) {
        self.events.lock().expect("sink lock").push(event);
    }
}

type TestBridge = ChannelBridge<InMemoryChannelRepository, DefaultClock>;

struct Harness {
    bridge: TestBridge,
    sink: Arc<RecordingSink>,
    streams: Arc<StreamManager<DefaultClock>>,
}

#[fixture]
fn harness() -> Harness {
    let sink = Arc::new(RecordingSink::default());
    let streams = Arc::new(StreamManager::new(Arc::new(DefaultClock), 16));
    let bridge = ChannelBridge::new(
        Arc::new(InMemoryChannelRepository::new()),
        Arc::new(DefaultClock),
        Arc::clone(&sink) as Arc<dyn EventSink>,
        Arc::clone(&streams) as Arc<dyn crate::stream::ports::SubscriptionRegistry>,
    );
    Harness {
        bridge,
        sink,
        streams,
    }
}

fn agent(id: &str) -> AgentId {
    AgentId::new(id).expect("valid agent id")
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn first_publish_creates_channel_then_emits_message(harness: Harness) -> eyre::Result<()> {
    let receipt = harness
        .bridge
        .publish(PublishRequest::new(
            "alerts.disk",
            agent("monitor"),
            json!({"usage": 0.97}),
        ))
        .await?;

    ensure!(receipt.created);
    ensure!(receipt.sequence == 1);
    ensure!(receipt.channel.message_count() == 1);
    ensure!(receipt.channel.owner() == &agent("monitor"));
    ensure!(
        harness.sink.types() == [EventType::ChannelCreated, EventType::ChannelMessage]
    );
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn later_publishes_only_emit_messages(harness: Harness) -> eyre::Result<()> {
    harness
        .bridge
        .publish(PublishRequest::new(
            "metrics.cpu",
            agent("sensor"),
            json!(1),
        ))
        .await?;
    let receipt = harness
        .bridge
        .publish(PublishRequest::new("metrics.cpu", agent("other"), json!(2)))
        .await?;

    ensure!(!receipt.created);
    ensure!(receipt.sequence == 2);
    ensure!(receipt.channel.owner() == &agent("sensor"));
    let expected = [
        EventType::ChannelCreated,
        EventType::ChannelMessage,
        EventType::ChannelMessage,
    ];
    ensure!(harness.sink.types() == expected);
    let last = harness.sink.last().ok_or_eyre("message event")?;
    ensure!(matches!(
        last.payload(),
        EventPayload::ChannelMessage(message)
            if message.sequence == 2 && message.sender == agent("other")
    ));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn create_rejects_existing_channel(harness: Harness) -> eyre::Result<()> {
    let mut metadata = Map::new();
    metadata.insert("retention".to_owned(), json!("1h"));
    let request =
        CreateChannelRequest::new("metrics.mem", agent("sensor")).with_metadata(metadata);
    let created = harness.bridge.create(request).await?;

    let duplicate = harness
        .bridge
        .create(CreateChannelRequest::new("metrics.mem", agent("sensor")))
        .await;

    ensure!(created.metadata().get("retention") == Some(&json!("1h")));
    ensure!(matches!(duplicate, Err(ChannelBridgeError::Exists(_))));
    ensure!(harness.sink.types() == [EventType::ChannelCreated]);
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn delete_emits_before_removal(harness: Harness) -> eyre::Result<()> {
    harness
        .bridge
        .publish(PublishRequest::new(
            "jobs.nightly",
            agent("cron"),
            json!({}),
        ))
        .await?;

    let deleted = harness.bridge.delete("jobs.nightly").await?;
    let lookup = harness.bridge.info("jobs.nightly").await;
    let again = harness.bridge.delete("jobs.nightly").await;

    ensure!(deleted.message_count() == 1);
    ensure!(matches!(lookup, Err(ChannelBridgeError::NotFound(_))));
    ensure!(matches!(again, Err(ChannelBridgeError::NotFound(_))));
    let last = harness.sink.last().ok_or_eyre("deleted event")?;
    ensure!(last.event_type() == EventType::ChannelDeleted);
    ensure!(matches!(
        last.payload(),
        EventPayload::Channel(channel) if channel.message_count == 1
    ));
    Ok(())
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn list_filters_by_pattern(harness: Harness) -> eyre::Result<()> {
    for channel in ["metrics.cpu", "metrics.system.cpu", "alerts.disk"] {
        harness
            .bridge
            .create(CreateChannelRequest::new(channel, agent("sensor")))
            .await?;
    }

    let all = harness.bridge.list(None).await?;
    let single = harness.bridge.list(Some("metrics.*")).await?;
    let nested = harness.bridge.list(Some("metrics.**")).await?;

    let names = |channels: &[crate::channel::domain::Channel]| -> Vec<String> {
        channels
            .iter()
            .map(|channel| channel.name().to_string())
            .collect()
    };
    ensure!(
        names(&all) == ["alerts.disk", "metrics.cpu", "metrics.system.cpu"]
    );
    ensure!(names(&single) == ["metrics.cpu"]);
    ensure!(names(&nested) == ["metrics.cpu", "metrics.system.cpu"]);
    Ok(())
}

#[rstest]
#[case("metrics..cpu")]
#[case("metrics.*")]
#[tokio::test(flavor = "multi_thread")]
async fn invalid_channel_names_are_domain_errors(harness: Harness, #[case] channel: &str) {
    let result = harness
        .bridge
        .publish(PublishRequest::new(channel, agent("sensor"), json!(null)))
        .await;

    assert!(matches!(result, Err(ChannelBridgeError::Domain(_))));
    assert!(harness.sink.types().is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn subscribe_pattern_replaces_connection_filter(harness: Harness) -> eyre::Result<()> {
    let task_id = TaskId::new();
    let handle = harness
        .streams
        .create_connection(SubscriptionFilter::new().with_task(task_id))?;

    let request = SubscribePatternRequest::new(handle.id(), "alerts.**")
        .with_event_types([EventType::ChannelMessage]);
    let installed = harness.bridge.subscribe_pattern(request)?;

    let current = harness
        .streams
        .subscriptions()
        .filter(handle.id())?
        .ok_or_eyre("connection is indexed")?;
    ensure!(current == installed);
    ensure!(
        current.task_id().is_none(),
        "filters are replaced, not merged"
    );
    let pattern = current.channel_pattern().map(ToString::to_string);
    ensure!(pattern.as_deref() == Some("alerts.**"));
    Ok(())
}

#[rstest]
fn subscribe_pattern_reports_unknown_connection(harness: Harness) {
    let missing = ConnectionId::new();

    let result = harness
        .bridge
        .subscribe_pattern(SubscribePatternRequest::new(missing, "alerts.**"));

    assert!(matches!(
        result,
        Err(ChannelBridgeError::Subscription(SubscriptionError::UnknownConnection(id)))
            if id == missing
    ));
}

#[rstest]
fn subscribe_pattern_rejects_foreign_connection(harness: Harness) -> eyre::Result<()> {
    let owner = AgentId::new("watcher")?;
    let handle = harness
        .streams
        .create_owned_connection(owner.clone(), SubscriptionFilter::new())?;

    let foreign = SubscribePatternRequest::new(handle.id(), "alerts.**")
        .with_caller(AgentId::new("intruder")?);
    let rejected = harness.bridge.subscribe_pattern(foreign);
    ensure!(matches!(
        rejected,
        Err(ChannelBridgeError::Subscription(SubscriptionError::NotOwner(id)))
            if id == handle.id()
    ));
    let untouched = harness.streams.subscriptions().filter(handle.id())?;
    ensure!(untouched == Some(SubscriptionFilter::new()));

    let own = SubscribePatternRequest::new(handle.id(), "alerts.**").with_caller(owner);
    harness.bridge.subscribe_pattern(own)?;
    Ok(())
}

#[rstest]
fn subscribe_pattern_rejects_invalid_pattern(harness: Harness) {
    let request = SubscribePatternRequest::new(ConnectionId::new(), "alerts.**.disk");

    let result = harness.bridge.subscribe_pattern(request);

    assert!(matches!(result, Err(ChannelBridgeError::Domain(_))));
}
