use std::{fmt::Debug, path::Path, path::PathBuf, sync::Arc};

use infra_tunnel_core::prelude::{ShutdownHandle, ShutdownListener, ShutdownReason, ShutdownSignalError};
use parking_lot::Mutex;

use crate::identity::RunIdentity;
use crate::lifecycle::LifecycleState;
use crate::types::InfraTunnelResult;

pub trait UserValuesConstraint: Debug + Send + Sync + 'static {}

/// Everything about a run that is shared between the lifecycle hooks and the scenarios.
///
/// The context is shared with the signal listener so that teardown can run from there. Values
/// that hooks need to change after the run has started must use interior mutability.
#[derive(Debug)]
pub struct RunnerContext<RV: UserValuesConstraint> {
    run_id: String,
    identity: RunIdentity,
    working_dir: PathBuf,
    shutdown_handle: ShutdownHandle,
    state: Mutex<LifecycleState>,
    value: RV,
}

impl<RV: UserValuesConstraint> RunnerContext<RV> {
    pub fn new(
        run_id: impl Into<String>,
        identity: RunIdentity,
        working_dir: impl Into<PathBuf>,
        shutdown_handle: ShutdownHandle,
        value: RV,
    ) -> Self {
        Self {
            run_id: run_id.into(),
            identity,
            working_dir: working_dir.into(),
            shutdown_handle,
            state: Mutex::new(LifecycleState::Uninitialized),
            value,
        }
    }

    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    pub fn identity(&self) -> &RunIdentity {
        &self.identity
    }

    /// The directory that the prerequisite module lives in.
    pub fn working_dir(&self) -> &Path {
        &self.working_dir
    }

    pub fn lifecycle_state(&self) -> LifecycleState {
        *self.state.lock()
    }

    /// Move the run to the `next` lifecycle state, returning the state it was in.
    pub(crate) fn set_lifecycle_state(&self, next: LifecycleState) -> LifecycleState {
        let mut state = self.state.lock();
        let previous = *state;
        if !previous.can_transition_to(next) {
            log::warn!("Unexpected lifecycle transition from {previous} to {next}");
        }
        log::info!("Lifecycle: {previous} -> {next}");
        *state = next;
        previous
    }

    pub fn new_shutdown_listener(&self) -> ShutdownListener {
        self.shutdown_handle.new_listener()
    }

    /// Stop the run from starting any more scenarios. The scenario that is running is allowed to
    /// finish and then teardown runs as normal.
    pub fn force_stop(&self) {
        self.shutdown_handle.shutdown(ShutdownReason::Requested);
    }

    pub(crate) fn shutdown_handle(&self) -> &ShutdownHandle {
        &self.shutdown_handle
    }

    pub fn get(&self) -> &RV {
        &self.value
    }
}

/// The context passed to a scenario hook.
pub struct ScenarioContext<RV: UserValuesConstraint> {
    name: String,
    runner_context: Arc<RunnerContext<RV>>,
    shutdown_listener: ShutdownListener,
}

impl<RV: UserValuesConstraint> ScenarioContext<RV> {
    pub fn new(name: impl Into<String>, runner_context: Arc<RunnerContext<RV>>) -> Self {
        let shutdown_listener = runner_context.new_shutdown_listener();
        Self {
            name: name.into(),
            runner_context,
            shutdown_listener,
        }
    }

    /// The name the scenario was registered with.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn runner_context(&self) -> &Arc<RunnerContext<RV>> {
        &self.runner_context
    }

    pub fn shutdown_listener(&mut self) -> &mut ShutdownListener {
        &mut self.shutdown_listener
    }

    /// Return a [ShutdownSignalError] if the run is shutting down.
    ///
    /// Call this between long running steps so that a scenario does not start new work while the
    /// run is being torn down.
    pub fn check_shutdown(&mut self) -> InfraTunnelResult<()> {
        if self.shutdown_listener.should_shutdown() {
            return Err(ShutdownSignalError::default().into());
        }

        Ok(())
    }
}
