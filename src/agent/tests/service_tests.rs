//! Unit tests for agent registry service orchestration.

use std::sync::Arc;

use crate::agent::{
    adapters::memory::InMemoryAgentRepository,
    domain::{AgentDomainError, AgentId, SortDirection, SortField},
    services::{
        AgentRegistryService, AgentRegistryServiceError, DiscoverAgentsRequest, DiscoveryLimits,
        RegisterAgentRequest,
    },
};
use chrono::{Duration, Utc};
use mockable::DefaultClock;
use rstest::{fixture, rstest};

type TestService = AgentRegistryService<InMemoryAgentRepository, DefaultClock>;

#[fixture]
fn service() -> TestService {
    AgentRegistryService::new(
        Arc::new(InMemoryAgentRepository::new()),
        Arc::new(DefaultClock),
    )
}

fn request(id: &str) -> RegisterAgentRequest {
    RegisterAgentRequest::new(id, format!("http://{id}.local/rpc"), "1.0")
        .with_name(id.to_uppercase())
        .with_version("0.1.0")
}

fn agent_id(value: &str) -> AgentId {
    AgentId::new(value).expect("valid agent id")
}

async fn register_all(service: &TestService, ids: &[&str]) {
    for id in ids {
        service
            .register(request(id))
            .await
            .expect("registration should succeed");
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn register_and_get(service: TestService) {
    let created = service
        .register(request("planner").with_capabilities(vec!["plan".to_owned()]))
        .await
        .expect("registration should succeed");

    let found = service
        .get(&agent_id("planner"))
        .await
        .expect("lookup should succeed");

    assert_eq!(found, created);
    assert_eq!(found.capabilities(), ["plan".to_owned()]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn re_registration_replaces_the_record(service: TestService) {
    service
        .register(request("planner").with_description("first"))
        .await
        .expect("first registration should succeed");
    service
        .register(request("planner").with_description("second"))
        .await
        .expect("second registration should succeed");

    let page = service
        .discover(DiscoverAgentsRequest::new())
        .await
        .expect("discovery should succeed");

    assert_eq!(page.total, 1);
    let card = page.agents.first().expect("one agent");
    assert_eq!(card.description(), "second");
}

#[rstest]
#[case::missing_id(None, Some("a"), Some("1.0"), AgentDomainError::MissingAgentId)]
#[case::missing_endpoint(Some("a"), None, Some("1.0"), AgentDomainError::MissingEndpoint)]
#[case::missing_protocol(Some("a"), Some("a"), None, AgentDomainError::MissingProtocolVersion)]
#[tokio::test(flavor = "multi_thread")]
async fn missing_required_fields_are_invalid_cards(
    service: TestService,
    #[case] id: Option<&str>,
    #[case] host: Option<&str>,
    #[case] protocol_version: Option<&str>,
    #[case] expected: AgentDomainError,
) {
    let incomplete = RegisterAgentRequest::from_optional(
        id.map(str::to_owned),
        host.map(|name| format!("http://{name}/rpc")),
        protocol_version.map(str::to_owned),
    );

    let result = service.register(incomplete).await;

    match result {
        Err(AgentRegistryServiceError::Domain(err)) => assert_eq!(err, expected),
        other => panic!("expected domain error, got {other:?}"),
    }
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn get_unknown_agent_is_not_found(service: TestService) {
    let result = service.get(&agent_id("ghost")).await;

    assert!(matches!(
        result,
        Err(AgentRegistryServiceError::NotFound(id)) if id.as_str() == "ghost"
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn unregister_is_idempotent(service: TestService) {
    register_all(&service, &["planner"]).await;

    let first = service
        .unregister(&agent_id("planner"))
        .await
        .expect("unregister should succeed");
    let second = service
        .unregister(&agent_id("planner"))
        .await
        .expect("unregistering an absent agent is not an error");

    assert!(first);
    assert!(!second);
    assert!(matches!(
        service.get(&agent_id("planner")).await,
        Err(AgentRegistryServiceError::NotFound(_))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn out_of_range_page_returns_empty_result(service: TestService) {
    register_all(&service, &["a", "b", "c"]).await;

    let page = service
        .discover(DiscoverAgentsRequest::new().with_page(4, Some(2)))
        .await
        .expect("out-of-range page is not an error");

    assert!(page.agents.is_empty());
    assert_eq!(page.total, 3);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn requested_limit_is_capped(#[values(None, Some(100))] limit: Option<usize>) {
    let limits = DiscoveryLimits {
        default_limit: 2,
        max_limit: 3,
    };
    let capped = AgentRegistryService::with_limits(
        Arc::new(InMemoryAgentRepository::new()),
        Arc::new(DefaultClock),
        limits,
    );
    register_all(&capped, &["a", "b", "c", "d"]).await;

    let page = capped
        .discover(DiscoverAgentsRequest::new().with_page(0, limit))
        .await
        .expect("discovery should succeed");

    let expected = if limit.is_some() { 3 } else { 2 };
    assert_eq!(page.agents.len(), expected);
    assert_eq!(page.total, 4);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn discovery_filters_and_sorts(service: TestService) {
    for (id, caps) in [
        ("a", vec!["code"]),
        ("b", vec!["search"]),
        ("c", vec!["code", "search"]),
    ] {
        service
            .register(request(id).with_capabilities(caps.into_iter().map(str::to_owned)))
            .await
            .expect("registration should succeed");
    }

    let page = service
        .discover(
            DiscoverAgentsRequest::new()
                .with_capabilities(vec!["code".to_owned()])
                .sorted_by(SortField::Id, SortDirection::Asc),
        )
        .await
        .expect("discovery should succeed");

    let ids: Vec<&str> = page.agents.iter().map(|card| card.id().as_str()).collect();
    assert_eq!(ids, vec!["a", "c"]);
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn blank_protocol_filter_is_rejected(service: TestService) {
    let result = service
        .discover(DiscoverAgentsRequest::new().with_protocol_version(" "))
        .await;

    assert!(matches!(
        result,
        Err(AgentRegistryServiceError::InvalidFilter(
            AgentDomainError::MissingProtocolVersion
        ))
    ));
}

#[rstest]
#[tokio::test(flavor = "multi_thread")]
async fn prune_removes_stale_registrations(service: TestService) {
    register_all(&service, &["a", "b"]).await;

    let none_removed = service
        .prune_registered_before(Utc::now() - Duration::hours(1))
        .await
        .expect("prune should succeed");
    let all_removed = service
        .prune_registered_before(Utc::now() + Duration::seconds(1))
        .await
        .expect("prune should succeed");

    assert!(none_removed.is_empty());
    assert_eq!(all_removed.len(), 2);
}
