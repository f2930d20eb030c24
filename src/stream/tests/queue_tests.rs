//! Unit tests for the bounded connection queue.

use std::sync::Arc;
use std::time::Duration;

use crate::agent::domain::AgentId;
use crate::event::domain::{EventType, StreamEvent};
use crate::stream::services::{ConnectionQueue, PushOutcome};
use crate::task::domain::Task;
use mockable::DefaultClock;
use rstest::rstest;
use serde_json::Value;

fn task_event() -> StreamEvent {
    let owner = AgentId::new("owner").expect("valid agent id");
    let mut task = Task::new(owner, None, Value::Null, &DefaultClock);
    let change = task
        .cancel(&DefaultClock)
        .expect("submitted -> cancelled is valid");
    StreamEvent::task_transition(&task, change)
}

fn established() -> StreamEvent {
    StreamEvent::connection_established(uuid::Uuid::new_v4(), &DefaultClock)
}

fn keepalive() -> StreamEvent {
    StreamEvent::keepalive(&DefaultClock)
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn events_are_delivered_in_push_order() {
    let queue = ConnectionQueue::new(4);
    let first = established();
    let second = task_event();

    assert_eq!(queue.push(first.clone()), PushOutcome::Queued);
    assert_eq!(queue.push(second.clone()), PushOutcome::Queued);

    assert_eq!(queue.recv().await, Some(first));
    assert_eq!(queue.recv().await, Some(second));
    assert!(queue.is_empty());
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn overflow_drops_oldest_event() {
    let queue = ConnectionQueue::new(2);
    let oldest = established();
    let middle = task_event();
    let newest = task_event();

    queue.push(oldest);
    queue.push(middle.clone());
    let outcome = queue.push(newest.clone());

    assert_eq!(outcome, PushOutcome::DroppedOldest);
    assert_eq!(queue.dropped(), 1);
    assert_eq!(queue.recv().await, Some(middle));
    assert_eq!(queue.recv().await, Some(newest));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn overflow_keeps_buffered_keepalive() {
    let queue = ConnectionQueue::new(2);
    queue.push(keepalive());
    queue.push(established());
    let newest = task_event();

    queue.push(newest.clone());

    let first = queue.recv().await.expect("buffered keepalive");
    assert_eq!(first.event_type(), EventType::Keepalive);
    assert_eq!(queue.recv().await, Some(newest));
}

#[rstest]
fn keepalive_is_discarded_when_full() {
    let queue = ConnectionQueue::new(1);
    queue.push(task_event());

    assert_eq!(queue.push(keepalive()), PushOutcome::Discarded);
    assert_eq!(queue.len(), 1);
    assert_eq!(queue.dropped(), 1);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn close_wakes_suspended_consumer() {
    let queue = Arc::new(ConnectionQueue::new(4));
    let consumer = {
        let waiting = Arc::clone(&queue);
        tokio::spawn(async move { waiting.recv().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;

    queue.close();

    let received = tokio::time::timeout(Duration::from_secs(2), consumer)
        .await
        .expect("consumer woke up")
        .expect("consumer task completed");
    assert!(received.is_none());
    assert_eq!(queue.push(task_event()), PushOutcome::Closed);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn push_wakes_suspended_consumer() {
    let queue = Arc::new(ConnectionQueue::new(4));
    let consumer = {
        let waiting = Arc::clone(&queue);
        tokio::spawn(async move { waiting.recv().await })
    };
    tokio::time::sleep(Duration::from_millis(20)).await;
    let event = task_event();

    queue.push(event.clone());

    let received = tokio::time::timeout(Duration::from_secs(2), consumer)
        .await
        .expect("consumer woke up")
        .expect("consumer task completed");
    assert_eq!(received, Some(event));
}
