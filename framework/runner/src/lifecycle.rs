use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use infra_tunnel_core::prelude::{TeardownError, TeardownGuard, TeardownOutcome};

use crate::cleanup::{clean_working_tree, CleanupRules};
use crate::context::{RunnerContext, UserValuesConstraint};
use crate::definition::GlobalHook;

/// The phases of a run, in the order they happen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum LifecycleState {
    Uninitialized,
    PrerequisitesProvisioning,
    Ready,
    ScenariosRunning,
    TearingDown,
    Terminated,
}

impl LifecycleState {
    /// Whether moving from this state to `next` is part of a normal run.
    ///
    /// Teardown may begin from any state before it, because an interrupt or a failed setup can
    /// cut the run short.
    pub fn can_transition_to(self, next: LifecycleState) -> bool {
        use LifecycleState::*;

        match (self, next) {
            (Uninitialized, PrerequisitesProvisioning)
            | (PrerequisitesProvisioning, Ready)
            | (Ready, ScenariosRunning)
            | (TearingDown, Terminated) => true,
            (TearingDown | Terminated, TearingDown) => false,
            (_, TearingDown) => true,
            _ => false,
        }
    }
}

/// Owns the teardown of a run.
///
/// Teardown can be requested from the main thread when the scenarios finish, and from the signal
/// listener when the process is interrupted. The [TeardownGuard] makes sure it only happens once.
pub(crate) struct Lifecycle<RV: UserValuesConstraint> {
    context: Arc<RunnerContext<RV>>,
    teardown_fn: Option<GlobalHook<RV>>,
    cleanup_rules: Option<CleanupRules>,
    guard: TeardownGuard,
}

impl<RV: UserValuesConstraint> Lifecycle<RV> {
    /// Pass `None` for the `cleanup_rules` to leave transient files in place.
    pub(crate) fn new(
        context: Arc<RunnerContext<RV>>,
        teardown_fn: Option<GlobalHook<RV>>,
        cleanup_rules: Option<CleanupRules>,
    ) -> Self {
        Self {
            context,
            teardown_fn,
            cleanup_rules,
            guard: TeardownGuard::new(),
        }
    }

    pub(crate) fn context(&self) -> &Arc<RunnerContext<RV>> {
        &self.context
    }

    /// Run the teardown hook and then clean the working directory.
    ///
    /// Failures are logged and never returned, teardown is best effort.
    pub(crate) fn teardown(&self) -> TeardownOutcome<()> {
        self.guard.run(|| {
            self.context
                .set_lifecycle_state(LifecycleState::TearingDown);

            if let Some(teardown_fn) = self.teardown_fn {
                match std::panic::catch_unwind(AssertUnwindSafe(|| teardown_fn(&self.context))) {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => {
                        log::error!(
                            "{:?}",
                            e.context(TeardownError::new("teardown hook returned an error"))
                        );
                    }
                    Err(_) => {
                        log::error!("{}", TeardownError::new("teardown hook panicked"));
                    }
                }
            }

            if let Some(rules) = &self.cleanup_rules {
                println!("Cleaning...");
                match clean_working_tree(self.context.working_dir(), rules) {
                    Ok(report) => log::info!(
                        "Removed {} transient files from '{}'",
                        report.removed().len(),
                        self.context.working_dir().display()
                    ),
                    Err(e) => log::error!(
                        "{:?}",
                        e.context(TeardownError::new("failed to clean the working directory"))
                    ),
                }
            }

            self.context
                .set_lifecycle_state(LifecycleState::Terminated);
        })
    }
}
