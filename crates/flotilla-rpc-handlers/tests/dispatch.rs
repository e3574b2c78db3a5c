//! End-to-end dispatch tests: registry, facades, auth, batch protocol.

use flotilla_api::ApiCall;
use flotilla_api::ApiRequest;
use flotilla_api::ApiResponse;
use flotilla_api::Entities;
use flotilla_api::ErrorCode;
use flotilla_api::ErrorInfo;
use flotilla_api::SetStatusArg;
use flotilla_api::SetStatusArgs;
use flotilla_core::test_support::MemoryState;
use flotilla_core::EntityStatus;
use flotilla_core::Error;
use flotilla_core::Life;
use flotilla_core::MachineEntity;
use flotilla_core::StateBackend;
use flotilla_rpc_handlers::test_support::TestContextBuilder;
use flotilla_rpc_handlers::FacadeRegistry;

fn scenario_state() -> MemoryState {
    let state = MemoryState::new();
    state.add_machine("0", Some("i-zero"));
    state.add_machine("1", Some("i-one"));
    state
}

#[tokio::test]
async fn life_batch_preserves_order_and_reports_not_found() {
    // Scenario: machine-1 dead, machine-0 alive, machine-42 absent.
    let state = scenario_state();
    let machine = state.machine("1").await.unwrap();
    machine.ensure_dead().await.unwrap();

    let ctx = TestContextBuilder::new()
        .with_state(state)
        .as_machine_agent("0", true)
        .build();
    let registry = FacadeRegistry::new();

    let call = ApiCall::new(
        "Firewaller",
        ApiRequest::Life(Entities::from_tags(["machine-1", "machine-0", "machine-42"])),
    );
    let response = registry.dispatch(call, &ctx).await.unwrap();

    let results = match response {
        ApiResponse::Life(results) => results.results,
        other => panic!("expected Life results, got {other:?}"),
    };
    assert_eq!(results.len(), 3);
    assert_eq!(results[0].life, Some(Life::Dead));
    assert_eq!(results[1].life, Some(Life::Alive));
    let missing = results[2].error.as_ref().unwrap();
    assert_eq!(missing.code, ErrorCode::NotFound);
    assert_eq!(missing.message, "machine 42 not found");
}

#[tokio::test]
async fn owner_scoped_batch_denies_foreign_units() {
    // Scenario: a unit agent for wordpress/0 touches wordpress/0 and
    // mysql/0; the foreign unit is denied even though it exists.
    let state = MemoryState::new();
    state.add_service("wordpress");
    state.add_service("mysql");
    state.add_unit("wordpress", "wordpress/0", None);
    state.add_unit("mysql", "mysql/0", None);

    let ctx = TestContextBuilder::new().with_state(state.clone()).as_unit_agent("wordpress/0").build();
    let registry = FacadeRegistry::new();

    let call = ApiCall::new(
        "Uniter",
        ApiRequest::SetStatus(SetStatusArgs {
            entities: vec![
                SetStatusArg {
                    tag: "unit-wordpress-0".to_string(),
                    status: EntityStatus::Started,
                    info: String::new(),
                },
                SetStatusArg {
                    tag: "unit-mysql-0".to_string(),
                    status: EntityStatus::Started,
                    info: String::new(),
                },
            ],
        }),
    );
    let response = registry.dispatch(call, &ctx).await.unwrap();

    let results = match response {
        ApiResponse::Errors(results) => results.results,
        other => panic!("expected error results, got {other:?}"),
    };
    assert_eq!(results.len(), 2);
    assert!(results[0].error.is_none());
    assert_eq!(results[1].error.as_ref().unwrap().code, ErrorCode::PermissionDenied);

    assert_eq!(state.unit_status_now("wordpress/0").unwrap().0, EntityStatus::Started);
    assert_eq!(state.unit_status_now("mysql/0").unwrap().0, EntityStatus::Pending);
}

#[tokio::test]
async fn denied_slot_masks_not_found() {
    // A nonexistent foreign unit reads PermissionDenied, not NotFound:
    // unauthorized callers cannot probe for existence.
    let state = MemoryState::new();
    state.add_service("wordpress");
    state.add_unit("wordpress", "wordpress/0", None);

    let ctx = TestContextBuilder::new().with_state(state).as_unit_agent("wordpress/0").build();
    let registry = FacadeRegistry::new();

    let call = ApiCall::new(
        "Agent",
        ApiRequest::Life(Entities::from_tags(["unit-ghost-9"])),
    );
    let response = registry.dispatch(call, &ctx).await.unwrap();
    let results = match response {
        ApiResponse::Life(results) => results.results,
        other => panic!("expected Life results, got {other:?}"),
    };
    assert_eq!(results[0].error.as_ref().unwrap().code, ErrorCode::PermissionDenied);
}

#[tokio::test]
async fn destroy_machines_aggregates_partial_failures() {
    // Scenario: machine 0 hosts a unit, machine 1 is a manager, machine 2
    // is free; the summary lists the failures and machine 2 ends dying.
    let state = MemoryState::new();
    state.add_machine("0", Some("i-zero"));
    state.add_machine_with(
        "1",
        flotilla_core::test_support::MachineParams {
            is_manager: true,
            ..Default::default()
        },
    );
    state.add_machine("2", Some("i-two"));
    state.add_service("wordpress");
    state.add_unit("wordpress", "wordpress/0", Some("0"));

    let ctx = TestContextBuilder::new().with_state(state.clone()).as_client("admin").build();
    let registry = FacadeRegistry::new();

    let call = ApiCall::new(
        "Client",
        ApiRequest::DestroyMachines(flotilla_api::DestroyMachinesArgs {
            machine_ids: vec!["0".to_string(), "1".to_string(), "2".to_string()],
        }),
    );
    let err = registry.dispatch(call, &ctx).await.unwrap_err();
    assert_eq!(
        ErrorInfo::from_anyhow(&err).message,
        "some machines were not destroyed: machine 0 has unit \"wordpress/0\" assigned; machine 1 is required by the environment"
    );
    assert_eq!(state.machine_life_now("2"), Some(Life::Dying));
    assert_eq!(state.machine_life_now("0"), Some(Life::Alive));
}

#[tokio::test]
async fn destroy_units_all_failed_summary() {
    let state = MemoryState::new();
    let ctx = TestContextBuilder::new().with_state(state).as_client("admin").build();
    let registry = FacadeRegistry::new();

    let call = ApiCall::new(
        "Client",
        ApiRequest::DestroyUnits(flotilla_api::DestroyUnitsArgs {
            unit_names: vec!["ghost/0".to_string()],
        }),
    );
    let err = registry.dispatch(call, &ctx).await.unwrap_err();
    assert_eq!(ErrorInfo::from_anyhow(&err).message, "no units were destroyed: unit ghost/0 not found");
}

#[tokio::test]
async fn facade_construction_fails_fast_on_role_mismatch() {
    // A machine agent asking for the client facade is rejected before any
    // method logic runs.
    let ctx = TestContextBuilder::new().as_machine_agent("0", false).build();
    let registry = FacadeRegistry::new();

    let call = ApiCall::new("Client", ApiRequest::DestroyEnvironment);
    let err = registry.dispatch(call, &ctx).await.unwrap_err();
    assert_eq!(err.downcast_ref::<Error>(), Some(&Error::PermissionDenied));

    // Likewise a non-manager agent asking for the firewaller.
    let call = ApiCall::new("Firewaller", ApiRequest::WatchEnvironMachines);
    let err = registry.dispatch(call, &ctx).await.unwrap_err();
    assert_eq!(err.downcast_ref::<Error>(), Some(&Error::PermissionDenied));
}

#[tokio::test]
async fn unknown_facade_and_bad_instance_id() {
    let ctx = TestContextBuilder::new().as_client("admin").build();
    let registry = FacadeRegistry::new();

    let call = ApiCall::new("Barge", ApiRequest::DestroyEnvironment);
    let err = registry.dispatch(call, &ctx).await.unwrap_err();
    assert_eq!(
        err.downcast_ref::<Error>(),
        Some(&Error::UnknownFacade {
            name: "Barge".to_string()
        })
    );

    // Ordinary facades reject a non-empty instance id.
    let call = ApiCall::with_id("Client", "7", ApiRequest::DestroyEnvironment);
    let err = registry.dispatch(call, &ctx).await.unwrap_err();
    assert_eq!(err.downcast_ref::<Error>(), Some(&Error::BadId { id: "7".to_string() }));
}

#[tokio::test]
async fn run_results_are_sorted_and_cover_bad_tags() {
    let state = scenario_state();
    let ctx = TestContextBuilder::new().with_state(state).as_client("admin").build();
    let registry = FacadeRegistry::new();

    let call = ApiCall::new(
        "Client",
        ApiRequest::Run(flotilla_api::RunArgs {
            targets: vec!["machine-1".to_string(), "machine-0".to_string(), "bogus".to_string()],
            commands: "uptime".to_string(),
            timeout_ms: Some(1_000),
        }),
    );
    let response = registry.dispatch(call, &ctx).await.unwrap();
    let results = match response {
        ApiResponse::Exec(results) => results.results,
        other => panic!("expected exec results, got {other:?}"),
    };
    let tags: Vec<&str> = results.iter().map(|r| r.tag.as_str()).collect();
    assert_eq!(tags, vec!["bogus", "machine-0", "machine-1"]);
    assert_eq!(results[0].error.as_ref().unwrap().code, ErrorCode::InvalidTag);
    assert_eq!(results[1].stdout, "machine-0: uptime");
}

#[tokio::test]
async fn authorized_keys_are_owner_scoped() {
    let state = MemoryState::new();
    state.add_machine("0", Some("i-zero"));
    state.add_machine("1", Some("i-one"));
    state.set_environ_config_value("authorized-keys", serde_json::json!("ssh-ed25519 AAA alice\nssh-rsa BBB bob"));

    let ctx = TestContextBuilder::new().with_state(state).as_machine_agent("0", false).build();
    let registry = FacadeRegistry::new();

    let call = ApiCall::new(
        "KeyUpdater",
        ApiRequest::AuthorizedKeys(Entities::from_tags(["machine-0", "machine-1"])),
    );
    let response = registry.dispatch(call, &ctx).await.unwrap();
    let results = match response {
        ApiResponse::StringsLists(results) => results.results,
        other => panic!("expected strings results, got {other:?}"),
    };
    assert_eq!(
        results[0].result.as_ref().unwrap(),
        &vec!["ssh-ed25519 AAA alice".to_string(), "ssh-rsa BBB bob".to_string()]
    );
    assert_eq!(results[1].error.as_ref().unwrap().code, ErrorCode::PermissionDenied);
}
