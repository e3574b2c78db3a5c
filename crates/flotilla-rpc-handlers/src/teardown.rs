//! Environment teardown orchestrator.
//!
//! Two entry points take an environment from alive to gone, both
//! idempotent on re-invocation: [`destroy_environment`] leaves the final
//! cleanup of manager machines to the deployment tool, while
//! [`destroy_system`] is full control-plane self-destruction for hosted
//! deployments with no external tool to finish the job.
//!
//! Failure semantics: no step is compensated or rolled back. Destruction
//! intent, once recorded, is never reversed; the only safe re-entry path
//! is calling the same entry point again, which tolerates entities that
//! are already gone or already dying. The orchestrator itself retries
//! nothing except the explicit unit-removal poll of the draining variant.

use std::sync::Arc;
use std::time::Duration;

use flotilla_core::retry_until;
use flotilla_core::EnvironmentEntity;
use flotilla_core::Error;
use flotilla_core::InstanceBroker;
use flotilla_core::InstanceId;
use flotilla_core::MachineEntity;
use flotilla_core::ServiceEntity;
use flotilla_core::StateBackend;
use flotilla_core::Tag;
use flotilla_core::UnitEntity;
use tokio::time::Instant;
use tracing::debug;
use tracing::info;

/// Budget for the unit-draining variant of [`destroy_system`].
#[derive(Debug, Clone, Copy)]
pub struct DrainBudget {
    /// Total time allowed for all unit removals together.
    pub total: Duration,
    /// Fixed delay between removal checks.
    pub poll_interval: Duration,
}

/// Destroy the environment, leaving provisioned manager machines and
/// provider-level resources to the deployment tool.
///
/// Steps, in order: manual-machine precondition (a pure check; failure
/// makes no state change), mark the environment dying, re-list machines,
/// bulk-terminate provisioned non-manager instances, re-check for manual
/// machines. A late manual machine leaves the environment dying with the
/// caller responsible for remediation; the transition is never reversed.
pub async fn destroy_environment(state: &Arc<dyn StateBackend>, instances: &Arc<dyn InstanceBroker>) -> Result<(), Error> {
    ensure_no_manual_machines(state).await?;

    let env = state.environment().await?;
    env.destroy().await?;
    info!("environment marked dying");

    // Re-list: a machine may have been added between the check and the
    // lifecycle transition. The window is inherent; the re-check below
    // narrows it but cannot close it.
    let machines = state.all_machines().await?;
    stop_provider_instances(&machines, instances).await?;

    ensure_no_manual_machines(state).await?;
    info!("environment teardown complete");
    Ok(())
}

/// Full control-plane self-destruction.
///
/// Marks the environment dying, destroys every service, enforces the
/// manual-machine precondition, optionally drains principal units within
/// `drain`, bulk-terminates non-manager instances, and finally marks the
/// environment dead, the terminal signal for every remaining agent to
/// self-terminate and uninstall.
///
/// With draining enabled, dead is never reached while a targeted unit
/// still exists: a lingering unit fails the call with
/// [`Error::RemovalTimeout`] and the environment stays dying.
pub async fn destroy_system(
    state: &Arc<dyn StateBackend>,
    instances: &Arc<dyn InstanceBroker>,
    drain: Option<DrainBudget>,
) -> Result<(), Error> {
    let env = state.environment().await?;
    env.destroy().await?;
    info!("environment marked dying");

    // Destroying the services first prevents new unit creation while the
    // rest of the teardown proceeds.
    for service in state.all_services().await? {
        service.destroy().await?;
    }
    info!("all services destroyed");

    ensure_no_manual_machines(state).await?;

    if let Some(budget) = drain {
        drain_principal_units(state, budget).await?;
    }

    let machines = state.all_machines().await?;
    stop_provider_instances(&machines, instances).await?;

    env.ensure_dead().await?;
    info!("environment marked dead");
    Ok(())
}

/// Fail with [`Error::ManualMachinesRemain`] if any non-manager machine
/// was provisioned outside the cluster's own provider integration.
/// Read-only: never changes state.
async fn ensure_no_manual_machines(state: &Arc<dyn StateBackend>) -> Result<(), Error> {
    let mut manual = Vec::new();
    for machine in state.all_machines().await? {
        if !machine.is_manager().await? && machine.is_manual().await? {
            manual.push(machine.id());
        }
    }
    if !manual.is_empty() {
        return Err(Error::ManualMachinesRemain { ids: manual });
    }
    Ok(())
}

/// Bulk-terminate the instances backing non-manager, non-manual machines.
///
/// Machines without an instance yet are skipped; any other lookup failure
/// propagates. The provider call is all-or-nothing per batch and its
/// errors propagate as-is.
async fn stop_provider_instances(
    machines: &[Arc<dyn MachineEntity>],
    instances: &Arc<dyn InstanceBroker>,
) -> Result<(), Error> {
    let mut ids: Vec<InstanceId> = Vec::new();
    for machine in machines {
        if machine.is_manager().await? || machine.is_manual().await? {
            continue;
        }
        match machine.instance_id().await {
            Ok(id) => ids.push(id),
            Err(err) if err.is_not_provisioned() => continue,
            Err(err) => return Err(err),
        }
    }
    if ids.is_empty() {
        return Ok(());
    }
    debug!(instance_count = ids.len(), "requesting bulk instance termination");
    instances.stop_instances(&ids).await
}

/// Advance every principal unit to destroy, then poll for each unit's
/// removal within the shared budget. Never sleeps longer than what
/// remains of the total.
async fn drain_principal_units(state: &Arc<dyn StateBackend>, budget: DrainBudget) -> Result<(), Error> {
    let mut names = Vec::new();
    for unit in state.all_units().await? {
        if unit.is_principal().await? {
            unit.destroy().await?;
            names.push(unit.name());
        }
    }
    info!(unit_count = names.len(), "principal units destroyed, waiting for removal");

    let deadline = Instant::now() + budget.total;
    for name in names {
        let remaining = deadline.saturating_duration_since(Instant::now());
        let gone = retry_until(remaining, budget.poll_interval, || {
            let state = Arc::clone(state);
            let name = name.clone();
            async move { matches!(state.unit(&name).await, Err(err) if err.is_not_found()) }
        })
        .await;
        if !gone {
            return Err(Error::RemovalTimeout {
                tag: Tag::unit(&name).to_string(),
            });
        }
    }
    Ok(())
}
