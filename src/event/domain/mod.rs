//! Domain model for stream events.

mod event;

pub use event::{
    ChannelEventPayload, ChannelMessagePayload, EventPayload, EventType, ParseEventTypeError,
    StreamEvent, TaskEventPayload,
};
