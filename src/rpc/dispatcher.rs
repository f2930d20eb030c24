//! Request parsing, routing and method execution.

use super::{
    AllowAll, Authorizer, CallerContext, Method, MethodRegistry, RpcError, RpcRequest,
    RpcResponse, RpcResult, params,
};
use crate::agent::{
    domain::AgentId,
    ports::AgentRepository,
    services::{AgentRegistryService, DiscoverAgentsRequest, RegisterAgentRequest},
};
use crate::channel::{
    domain::ChannelPattern,
    ports::ChannelRepository,
    services::{ChannelBridge, CreateChannelRequest, PublishRequest, SubscribePatternRequest},
};
use crate::event::domain::EventType;
use crate::stream::domain::ConnectionId;
use crate::task::{
    domain::{TaskId, TaskQuery, TaskState},
    ports::TaskRepository,
    services::{CreateTaskRequest, TaskLedgerService, TransitionTaskRequest},
};
use mockable::Clock;
use serde::{Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use std::sync::Arc;
use uuid::Uuid;

/// Reply to one HTTP body: a single response or a batch.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum RpcReply {
    /// Response to a single request.
    Single(RpcResponse),
    /// Responses to the non-notification members of a batch.
    Batch(Vec<RpcResponse>),
}

/// JSON-RPC 2.0 entry point for every A2A method.
pub struct MethodDispatcher<A, T, Ch, C>
where
    A: AgentRepository,
    T: TaskRepository,
    Ch: ChannelRepository,
    C: Clock + Send + Sync,
{
    agents: Arc<AgentRegistryService<A, C>>,
    tasks: Arc<TaskLedgerService<T, C>>,
    channels: Arc<ChannelBridge<Ch, C>>,
    methods: MethodRegistry,
    authorizer: Arc<dyn Authorizer>,
}

impl<A, T, Ch, C> MethodDispatcher<A, T, Ch, C>
where
    A: AgentRepository,
    T: TaskRepository,
    Ch: ChannelRepository,
    C: Clock + Send + Sync,
{
    /// Creates a dispatcher that admits every caller.
    #[must_use]
    pub fn new(
        agents: Arc<AgentRegistryService<A, C>>,
        tasks: Arc<TaskLedgerService<T, C>>,
        channels: Arc<ChannelBridge<Ch, C>>,
        methods: MethodRegistry,
    ) -> Self {
        Self {
            agents,
            tasks,
            channels,
            methods,
            authorizer: Arc::new(AllowAll),
        }
    }

    /// Replaces the authorization policy.
    #[must_use]
    pub fn with_authorizer(mut self, authorizer: Arc<dyn Authorizer>) -> Self {
        self.authorizer = authorizer;
        self
    }

    /// Handles one request body.
    ///
    /// Returns `None` when the body held only notifications.
    pub async fn handle(&self, body: &[u8], caller: &CallerContext) -> Option<RpcReply> {
        let parsed: Value = match serde_json::from_slice(body) {
            Ok(value) => value,
            Err(err) => {
                tracing::warn!(error = %err, "rejected unparsable rpc body");
                let error = RpcError::Parse(err.to_string());
                return Some(RpcReply::Single(RpcResponse::failure(Value::Null, &error)));
            }
        };

        match parsed {
            Value::Array(items) if items.is_empty() => {
                let error = RpcError::invalid_request("batch must not be empty");
                Some(RpcReply::Single(RpcResponse::failure(Value::Null, &error)))
            }
            Value::Array(items) => {
                let mut responses = Vec::with_capacity(items.len());
                for item in items {
                    if let Some(response) = self.handle_value(item, caller).await {
                        responses.push(response);
                    }
                }
                (!responses.is_empty()).then_some(RpcReply::Batch(responses))
            }
            single => self
                .handle_value(single, caller)
                .await
                .map(RpcReply::Single),
        }
    }

    async fn handle_value(&self, value: Value, caller: &CallerContext) -> Option<RpcResponse> {
        let request = match RpcRequest::from_value(value) {
            Ok(request) => request,
            Err((id, error)) => {
                tracing::warn!(error = %error, "rejected malformed rpc envelope");
                return Some(RpcResponse::failure(id, &error));
            }
        };
        let RpcRequest { id, method, params } = request;

        let outcome = self.execute(&method, params, caller).await;
        match &outcome {
            Err(error) if !error.is_internal() => {
                tracing::warn!(
                    method = %method,
                    code = error.code(),
                    error = %error,
                    "rpc request rejected"
                );
            }
            _ => {}
        }

        let Some(id) = id else {
            tracing::debug!(method = %method, "rpc notification handled");
            return None;
        };
        Some(match outcome {
            Ok(result) => RpcResponse::success(id, result),
            Err(error) => RpcResponse::failure(id, &error),
        })
    }

    async fn execute(&self, name: &str, params: Value, caller: &CallerContext) -> RpcResult<Value> {
        let method =
            Method::from_name(name).ok_or_else(|| RpcError::MethodNotFound(name.to_owned()))?;
        self.authorizer
            .authorize(caller, method.name())
            .await
            .map_err(|denied| RpcError::Unauthorized(denied.to_string()))?;
        self.methods.validate(method, &params)?;
        tracing::debug!(method = %method, "dispatching rpc request");

        match method {
            Method::AgentRegister => self.agent_register(decode(params)?).await,
            Method::AgentUnregister => self.agent_unregister(decode(params)?).await,
            Method::AgentGet => self.agent_get(decode(params)?).await,
            Method::AgentDiscover => self.agent_discover(decode(params)?).await,
            Method::TaskCreate => self.task_create(decode(params)?, caller).await,
            Method::TaskGet => self.task_get(decode(params)?).await,
            Method::TaskCancel => self.task_cancel(decode(params)?).await,
            Method::TaskUpdateState => self.task_update_state(decode(params)?).await,
            Method::TaskSetProgress => self.task_set_progress(decode(params)?).await,
            Method::TaskList => self.task_list(decode(params)?).await,
            Method::ChannelPublish => self.channel_publish(decode(params)?, caller).await,
            Method::ChannelSubscribePattern => self.channel_subscribe(decode(params)?, caller),
            Method::ChannelList => self.channel_list(decode(params)?).await,
            Method::ChannelInfo => self.channel_info(decode(params)?).await,
            Method::ChannelCreate => self.channel_create(decode(params)?, caller).await,
            Method::ChannelDelete => self.channel_delete(decode(params)?).await,
        }
    }

    async fn agent_register(&self, params: params::RegisterAgentParams) -> RpcResult<Value> {
        let params::RegisterAgentParams {
            id,
            name,
            description,
            version,
            capabilities,
            methods,
            endpoint,
            protocol_version,
            security,
        } = params;
        let mut request = RegisterAgentRequest::from_optional(id, endpoint, protocol_version)
            .with_name(name)
            .with_description(description)
            .with_version(version)
            .with_capabilities(capabilities)
            .with_methods(methods);
        if let Some(scheme) = security {
            request = request.with_security(scheme);
        }
        encode(&self.agents.register(request).await?)
    }

    async fn agent_unregister(&self, params: params::AgentIdParams) -> RpcResult<Value> {
        let id = agent_id(params.id)?;
        let removed = self.agents.unregister(&id).await?;
        Ok(json!({ "removed": removed }))
    }

    async fn agent_get(&self, params: params::AgentIdParams) -> RpcResult<Value> {
        let id = agent_id(params.id)?;
        encode(&self.agents.get(&id).await?)
    }

    async fn agent_discover(&self, params: params::DiscoverAgentsParams) -> RpcResult<Value> {
        let params::DiscoverAgentsParams {
            capabilities,
            protocol_version,
            sort_by,
            sort_direction,
            offset,
            limit,
        } = params;
        let mut request = DiscoverAgentsRequest::new()
            .with_capabilities(capabilities)
            .sorted_by(sort_by, sort_direction)
            .with_page(offset, limit);
        if let Some(protocol) = protocol_version {
            request = request.with_protocol_version(protocol);
        }
        encode(&self.agents.discover(request).await?)
    }

    async fn task_create(
        &self,
        params: params::CreateTaskParams,
        caller: &CallerContext,
    ) -> RpcResult<Value> {
        let params::CreateTaskParams {
            owner,
            target,
            input,
        } = params;
        let mut request = CreateTaskRequest::new(acting_agent(owner, caller, "owner")?)
            .with_input(input);
        if let Some(target_id) = target {
            request = request.with_target(agent_id(target_id)?);
        }
        encode(&self.tasks.create(request).await?)
    }

    async fn task_get(&self, params: params::TaskIdParams) -> RpcResult<Value> {
        let id = task_id(&params.task_id)?;
        encode(&self.tasks.get(id).await?)
    }

    async fn task_cancel(&self, params: params::TaskIdParams) -> RpcResult<Value> {
        let id = task_id(&params.task_id)?;
        encode(&self.tasks.cancel(id).await?)
    }

    async fn task_update_state(&self, params: params::UpdateStateParams) -> RpcResult<Value> {
        let params::UpdateStateParams {
            task_id: raw_id,
            state,
            result,
            error,
        } = params;
        let id = task_id(&raw_id)?;
        let payload = match TaskState::try_from(state.as_str()) {
            Ok(TaskState::Completed) => result,
            Ok(TaskState::Failed) => error,
            Ok(_) => None,
            Err(err) => return Err(RpcError::invalid_params(&err)),
        };
        let mut request = TransitionTaskRequest::new(id, state);
        if let Some(value) = payload {
            request = request.with_payload(value);
        }
        encode(&self.tasks.transition(request).await?)
    }

    async fn task_set_progress(&self, params: params::SetProgressParams) -> RpcResult<Value> {
        let id = task_id(&params.task_id)?;
        encode(&self.tasks.set_progress(id, params.progress).await?)
    }

    async fn task_list(&self, params: params::ListTasksParams) -> RpcResult<Value> {
        let params::ListTasksParams { owner, state } = params;
        let query = TaskQuery {
            owner: owner.map(agent_id).transpose()?,
            state: state
                .map(|raw| TaskState::try_from(raw.as_str()))
                .transpose()
                .map_err(|err| RpcError::invalid_params(&err))?,
        };
        let tasks = self.tasks.list(&query).await?;
        Ok(json!({ "tasks": encode(&tasks)? }))
    }

    async fn channel_publish(
        &self,
        params: params::PublishParams,
        caller: &CallerContext,
    ) -> RpcResult<Value> {
        let params::PublishParams {
            channel,
            message,
            sender,
        } = params;
        let sender_id = acting_agent(sender, caller, "sender")?;
        let receipt = self
            .channels
            .publish(PublishRequest::new(channel, sender_id, message))
            .await?;
        Ok(json!({
            "channel": receipt.channel.name(),
            "sequence": receipt.sequence,
            "created": receipt.created,
        }))
    }

    fn channel_subscribe(
        &self,
        params: params::SubscribePatternParams,
        caller: &CallerContext,
    ) -> RpcResult<Value> {
        let params::SubscribePatternParams {
            connection_id,
            pattern,
            task_id: raw_task,
            agent_id: raw_agent,
            event_types,
        } = params;
        let connection = Uuid::parse_str(connection_id.trim())
            .map(ConnectionId::from_uuid)
            .map_err(|err| RpcError::invalid_params(&err))?;
        let types = event_types
            .iter()
            .map(|raw| EventType::try_from(raw.as_str()))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|err| RpcError::invalid_params(&err))?;

        let mut request = SubscribePatternRequest::new(connection, pattern).with_event_types(types);
        if let Some(raw) = raw_task {
            request = request.with_task(task_id(&raw)?);
        }
        if let Some(raw) = raw_agent {
            request = request.with_agent(agent_id(raw)?);
        }
        if let Some(agent) = caller.caller() {
            request = request.with_caller(agent.clone());
        }
        let filter = self.channels.subscribe_pattern(request)?;
        Ok(json!({
            "connection_id": connection,
            "pattern": filter.channel_pattern().map(ChannelPattern::as_str),
        }))
    }

    async fn channel_list(&self, params: params::ListChannelsParams) -> RpcResult<Value> {
        let channels = self.channels.list(params.pattern.as_deref()).await?;
        Ok(json!({ "channels": encode(&channels)? }))
    }

    async fn channel_info(&self, params: params::ChannelNameParams) -> RpcResult<Value> {
        encode(&self.channels.info(&params.channel).await?)
    }

    async fn channel_create(
        &self,
        params: params::CreateChannelParams,
        caller: &CallerContext,
    ) -> RpcResult<Value> {
        let params::CreateChannelParams {
            channel,
            owner,
            metadata,
        } = params;
        let request =
            CreateChannelRequest::new(channel, acting_agent(owner, caller, "owner")?)
                .with_metadata(metadata);
        encode(&self.channels.create(request).await?)
    }

    async fn channel_delete(&self, params: params::ChannelNameParams) -> RpcResult<Value> {
        encode(&self.channels.delete(&params.channel).await?)
    }
}

fn decode<P: DeserializeOwned>(params: Value) -> RpcResult<P> {
    serde_json::from_value(params).map_err(|err| RpcError::invalid_params(&err))
}

fn encode<R: Serialize>(result: &R) -> RpcResult<Value> {
    serde_json::to_value(result).map_err(|err| RpcError::internal(&err))
}

fn agent_id(raw: String) -> RpcResult<AgentId> {
    AgentId::new(raw).map_err(|err| RpcError::invalid_params(&err))
}

fn task_id(raw: &str) -> RpcResult<TaskId> {
    TaskId::parse(raw).map_err(|err| RpcError::invalid_params(&err))
}

/// Resolves the agent acting in a request: the explicit field when given,
/// otherwise the verified caller.
fn acting_agent(
    explicit: Option<String>,
    caller: &CallerContext,
    field: &'static str,
) -> RpcResult<AgentId> {
    match (explicit, caller.caller()) {
        (Some(raw), _) => agent_id(raw),
        (None, Some(agent)) => Ok(agent.clone()),
        (None, None) => Err(RpcError::invalid_params(&format_args!(
            "{field} is required when the caller is anonymous"
        ))),
    }
}
