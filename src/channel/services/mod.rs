//! Application services for channels.

mod bridge;

pub use bridge::{
    ChannelBridge, ChannelBridgeError, ChannelBridgeResult, CreateChannelRequest,
    PublishReceipt, PublishRequest, SubscribePatternRequest,
};
