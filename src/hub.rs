//! Composition root wiring the services behind the HTTP surface.

use crate::agent::{
    adapters::memory::InMemoryAgentRepository,
    domain::{AgentCard, AgentDomainError},
    services::AgentRegistryService,
};
use crate::channel::{adapters::memory::InMemoryChannelRepository, services::ChannelBridge};
use crate::config::{ConfigError, HubConfig};
use crate::event::ports::EventSink;
use crate::http::{self, AppState};
use crate::rpc::{AllowAll, Authorizer, MethodDispatcher, MethodRegistry, SchemaCompileError};
use crate::stream::{ports::SubscriptionRegistry, services::StreamManager};
use crate::task::{adapters::memory::InMemoryTaskRepository, services::TaskLedgerService};
use axum::Router;
use mockable::DefaultClock;
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;

/// Agent registry used by the hub.
pub type HubAgents = AgentRegistryService<InMemoryAgentRepository, DefaultClock>;
/// Task ledger used by the hub.
pub type HubTasks = TaskLedgerService<InMemoryTaskRepository, DefaultClock>;
/// Channel bridge used by the hub.
pub type HubChannels = ChannelBridge<InMemoryChannelRepository, DefaultClock>;
/// Stream manager used by the hub.
pub type HubStreams = StreamManager<DefaultClock>;
/// Method dispatcher used by the hub.
pub type HubDispatcher = MethodDispatcher<
    InMemoryAgentRepository,
    InMemoryTaskRepository,
    InMemoryChannelRepository,
    DefaultClock,
>;

/// Startup and serving failures.
#[derive(Debug, Error)]
pub enum HubError {
    /// The configuration is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// The configured local Agent Card is invalid.
    #[error("invalid local agent card: {0}")]
    LocalCard(#[from] AgentDomainError),
    /// A params schema failed to compile.
    #[error(transparent)]
    Schema(#[from] SchemaCompileError),
    /// The listener could not bind.
    #[error("failed to bind {address}: {source}")]
    Bind {
        /// Requested address.
        address: SocketAddr,
        /// Underlying I/O failure.
        source: std::io::Error,
    },
    /// The server stopped with an I/O error.
    #[error("server failed: {0}")]
    Serve(#[source] std::io::Error),
}

/// Every service of a running hub, sharing one event bus.
#[derive(Clone)]
pub struct Hub {
    config: HubConfig,
    agents: Arc<HubAgents>,
    tasks: Arc<HubTasks>,
    channels: Arc<HubChannels>,
    streams: Arc<HubStreams>,
    dispatcher: Arc<HubDispatcher>,
    local_card: Arc<AgentCard>,
}

impl Hub {
    /// Builds a hub that admits every caller.
    ///
    /// # Errors
    ///
    /// Returns [`HubError`] when the configuration or the local card is
    /// invalid.
    pub fn build(config: HubConfig) -> Result<Self, HubError> {
        Self::build_with_authorizer(config, Arc::new(AllowAll))
    }

    /// Builds a hub that consults `authorizer` before every method call.
    ///
    /// # Errors
    ///
    /// Returns [`HubError`] when the configuration or the local card is
    /// invalid.
    pub fn build_with_authorizer(
        config: HubConfig,
        authorizer: Arc<dyn Authorizer>,
    ) -> Result<Self, HubError> {
        config.validate()?;
        let clock = Arc::new(DefaultClock);
        let local_card = Arc::new(AgentCard::new(
            config.local_agent.to_request().into_parts()?,
            &*clock,
        ));

        let streams = Arc::new(StreamManager::new(
            Arc::clone(&clock),
            config.queue_capacity,
        ));
        let sink = Arc::clone(&streams) as Arc<dyn EventSink>;
        let agents = Arc::new(AgentRegistryService::with_limits(
            Arc::new(InMemoryAgentRepository::new()),
            Arc::clone(&clock),
            config.discovery_limits(),
        ));
        let tasks = Arc::new(TaskLedgerService::new(
            Arc::new(InMemoryTaskRepository::new()),
            Arc::clone(&clock),
            Arc::clone(&sink),
        ));
        let channels = Arc::new(ChannelBridge::new(
            Arc::new(InMemoryChannelRepository::new()),
            clock,
            sink,
            Arc::clone(&streams) as Arc<dyn SubscriptionRegistry>,
        ));
        let dispatcher = Arc::new(
            MethodDispatcher::new(
                Arc::clone(&agents),
                Arc::clone(&tasks),
                Arc::clone(&channels),
                MethodRegistry::new()?,
            )
            .with_authorizer(authorizer),
        );

        Ok(Self {
            config,
            agents,
            tasks,
            channels,
            streams,
            dispatcher,
            local_card,
        })
    }

    /// Returns the configuration the hub was built from.
    #[must_use]
    pub const fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Returns the agent registry.
    #[must_use]
    pub const fn agents(&self) -> &Arc<HubAgents> {
        &self.agents
    }

    /// Returns the task ledger.
    #[must_use]
    pub const fn tasks(&self) -> &Arc<HubTasks> {
        &self.tasks
    }

    /// Returns the channel bridge.
    #[must_use]
    pub const fn channels(&self) -> &Arc<HubChannels> {
        &self.channels
    }

    /// Returns the stream manager.
    #[must_use]
    pub const fn streams(&self) -> &Arc<HubStreams> {
        &self.streams
    }

    /// Returns the method dispatcher.
    #[must_use]
    pub const fn dispatcher(&self) -> &Arc<HubDispatcher> {
        &self.dispatcher
    }

    /// Returns the card served as the discovery document.
    #[must_use]
    pub const fn local_card(&self) -> &Arc<AgentCard> {
        &self.local_card
    }

    /// Builds the HTTP router.
    #[must_use]
    pub fn router(&self) -> Router {
        http::router(AppState::new(
            Arc::clone(&self.dispatcher),
            Arc::clone(&self.streams),
            Arc::clone(&self.local_card),
        ))
    }

    /// Starts the periodic keepalive broadcast.
    #[must_use]
    pub fn spawn_keepalive(&self) -> JoinHandle<()> {
        let interval = self.config.keepalive_interval();
        self.streams.spawn_keepalive(interval)
    }

    /// Serves HTTP on the configured address until `shutdown` resolves.
    ///
    /// Open streams are closed once shutdown begins so that in-flight SSE
    /// responses end and the server can drain.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::Bind`] when the address is unavailable, or
    /// [`HubError::Serve`] when the server fails.
    pub async fn serve<F>(self, shutdown: F) -> Result<(), HubError>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let address = self.config.bind_address;
        let listener = tokio::net::TcpListener::bind(address)
            .await
            .map_err(|source| HubError::Bind { address, source })?;
        tracing::info!(
            %address,
            agent_id = %self.local_card.id(),
            "switchboard listening"
        );

        let keepalive = self.spawn_keepalive();
        let streams = Arc::clone(&self.streams);
        let result = axum::serve(listener, self.router())
            .with_graceful_shutdown(async move {
                shutdown.await;
                tracing::info!("shutdown requested, closing streams");
                if let Err(err) = streams.close_all() {
                    tracing::error!(error = %err, "failed to close streams during shutdown");
                }
            })
            .await
            .map_err(HubError::Serve);
        keepalive.abort();
        result
    }
}
