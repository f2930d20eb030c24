//! Shared world state for hub behaviour scenarios.

use std::collections::HashMap;
use std::time::Duration;

use eyre::{OptionExt, eyre};
use rstest::fixture;
use serde_json::{Value, json};
use switchboard::{
    config::HubConfig,
    event::domain::StreamEvent,
    hub::Hub,
    rpc::{CallerContext, RpcErrorObject, RpcReply},
    stream::services::ConnectionHandle,
};

/// How long a step waits for an event that should already be queued.
const RECEIVE_TIMEOUT: Duration = Duration::from_millis(250);

/// Scenario world for hub behaviour tests.
pub struct HubWorld {
    pub hub: Hub,
    pub task_id: Option<String>,
    pub connections: HashMap<String, ConnectionHandle>,
    pub last_result: Option<Result<Value, RpcErrorObject>>,
}

impl HubWorld {
    /// Creates a world around a freshly built hub.
    ///
    /// # Panics
    ///
    /// Panics when the default configuration fails to build a hub.
    #[must_use]
    pub fn new() -> Self {
        Self {
            hub: Hub::build(HubConfig::default()).expect("default configuration is valid"),
            task_id: None,
            connections: HashMap::new(),
            last_result: None,
        }
    }

    /// Sends one JSON-RPC call as `caller` and records the outcome.
    pub fn call(
        &mut self,
        caller: &str,
        method: &str,
        params: Value,
    ) -> Result<&Result<Value, RpcErrorObject>, eyre::Report> {
        let body = json!({"jsonrpc": "2.0", "method": method, "params": params, "id": 1});
        let context = CallerContext::from_header(Some(caller));
        let reply = run_async(
            self.hub
                .dispatcher()
                .handle(body.to_string().as_bytes(), &context),
        )
        .ok_or_eyre("a request with an id always gets a reply")?;
        let RpcReply::Single(response) = reply else {
            return Err(eyre!("expected a single response"));
        };
        let outcome = match (response.result(), response.error()) {
            (Some(result), None) => Ok(result.clone()),
            (None, Some(error)) => Err(error.clone()),
            _ => return Err(eyre!("response carries neither result nor error")),
        };
        Ok(self.last_result.insert(outcome))
    }

    /// Returns the task created earlier in the scenario.
    pub fn current_task(&self) -> Result<String, eyre::Report> {
        self.task_id
            .clone()
            .ok_or_else(|| eyre!("missing created task in scenario world"))
    }

    /// Returns the named connection.
    pub fn connection(&self, name: &str) -> Result<&ConnectionHandle, eyre::Report> {
        self.connections
            .get(name)
            .ok_or_else(|| eyre!("no connection named {name}"))
    }

    /// Collects every event already queued for the named connection.
    pub fn drain(&self, name: &str) -> Result<Vec<StreamEvent>, eyre::Report> {
        let handle = self.connection(name)?;
        let mut events = Vec::new();
        while let Ok(Some(event)) =
            run_async(tokio::time::timeout(RECEIVE_TIMEOUT, handle.recv()))
        {
            events.push(event);
        }
        Ok(events)
    }
}

impl Default for HubWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> HubWorld {
    HubWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
