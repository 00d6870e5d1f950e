use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;

use anyhow::Context;
use infra_tunnel_core::prelude::{
    FatalSetupError, ShutdownHandle, ShutdownSignalError, TeardownOutcome,
};
use infra_tunnel_summary_model::{append_run_summary, RunSummary, ScenarioStatus, ScenarioSummary};

use crate::context::{RunnerContext, ScenarioContext, UserValuesConstraint};
use crate::definition::{HookResult, SuiteDefinition, SuiteDefinitionBuilder};
use crate::identity::RunIdentity;
use crate::lifecycle::{Lifecycle, LifecycleState};
use crate::progress::ScenarioProgress;
use crate::shutdown::start_shutdown_listener;

/// How a single scenario ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioOutcome {
    Passed,
    /// The scenario returned an error or panicked. Holds the error chain.
    Failed(String),
    /// The scenario was filtered out, or was not started because the run was shutting down.
    Skipped,
}

impl ScenarioOutcome {
    fn status(&self) -> ScenarioStatus {
        match self {
            ScenarioOutcome::Passed => ScenarioStatus::Passed,
            ScenarioOutcome::Failed(reason) => ScenarioStatus::Failed {
                reason: reason.clone(),
            },
            ScenarioOutcome::Skipped => ScenarioStatus::Skipped,
        }
    }
}

/// The result of a run that got past setup.
#[derive(Debug)]
pub struct RunOutcome {
    run_id: String,
    scenarios: Vec<(String, ScenarioOutcome)>,
    interrupted: bool,
}

impl RunOutcome {
    pub fn run_id(&self) -> &str {
        &self.run_id
    }

    /// Every registered scenario with its outcome, in registration order.
    pub fn scenarios(&self) -> &[(String, ScenarioOutcome)] {
        &self.scenarios
    }

    pub fn outcome(&self, name: &str) -> Option<&ScenarioOutcome> {
        self.scenarios
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, outcome)| outcome)
    }

    pub fn passed(&self) -> usize {
        self.count(|o| *o == ScenarioOutcome::Passed)
    }

    pub fn failed(&self) -> usize {
        self.count(|o| matches!(o, ScenarioOutcome::Failed(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|o| *o == ScenarioOutcome::Skipped)
    }

    /// Whether a shutdown was received at any point before teardown finished.
    pub fn interrupted(&self) -> bool {
        self.interrupted
    }

    /// Convert to an error if any scenario failed or the run was cut short, for use as the exit
    /// status of a suite binary.
    pub fn into_result(self) -> anyhow::Result<()> {
        let failed = self
            .scenarios
            .iter()
            .filter(|(_, o)| matches!(o, ScenarioOutcome::Failed(_)))
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>();

        if !failed.is_empty() {
            anyhow::bail!(
                "{} of {} scenarios failed: {:?}",
                failed.len(),
                self.scenarios.len(),
                failed
            );
        }

        if self.interrupted {
            anyhow::bail!("Run [{}] was stopped before all scenarios ran", self.run_id);
        }

        Ok(())
    }

    fn count(&self, predicate: impl Fn(&ScenarioOutcome) -> bool) -> usize {
        self.scenarios.iter().filter(|(_, o)| predicate(o)).count()
    }
}

/// Run a suite.
///
/// Setup runs first and an error from it is fatal: teardown is still attempted and then the error
/// is returned, wrapped in a [FatalSetupError]. Otherwise every selected scenario runs in
/// registration order and a failing scenario does not stop the others. Teardown always runs at
/// the end. When a signal is received while scenarios are running, the signal listener tears down
/// and exits the process with status 1. When it arrives during the final teardown, the returned
/// outcome is marked as interrupted instead.
pub fn run<RV: UserValuesConstraint>(
    definition: SuiteDefinitionBuilder<RV>,
) -> anyhow::Result<RunOutcome> {
    let SuiteDefinition {
        name,
        cli,
        value,
        setup_fn,
        scenarios,
        teardown_fn,
        cleanup_rules,
        recorded_env,
    } = definition.build()?;

    let run_id = cli.run_id.clone().unwrap_or_else(|| nanoid::nanoid!());
    let started_at = chrono::Utc::now().timestamp();
    log::info!("Running suite [{}] with run id [{}]", name, run_id);

    let identity = RunIdentity::generate(&cli.deny_regions);
    log::info!(
        "Environment tag [{}], project label [{}], denied regions {:?}",
        identity.environment_tag(),
        identity.project_label(),
        identity.denied_regions()
    );

    let runtime = tokio::runtime::Runtime::new().context("Failed to create Tokio runtime")?;
    let shutdown_handle = ShutdownHandle::new();
    let mut run_shutdown_listener = shutdown_handle.new_listener();

    let context = Arc::new(RunnerContext::new(
        run_id.clone(),
        identity,
        cli.working_dir.clone(),
        shutdown_handle,
        value,
    ));
    let lifecycle = Arc::new(Lifecycle::new(context.clone(), teardown_fn, cleanup_rules));

    // Registered before anything is provisioned so that an interrupt during setup still tears
    // down.
    start_shutdown_listener(&runtime, lifecycle.clone())?;

    context.set_lifecycle_state(LifecycleState::PrerequisitesProvisioning);
    if let Some(setup_fn) = setup_fn {
        if let Err(e) = run_hook(|| setup_fn(&context)) {
            log::error!("Setup failed for suite [{}]: {:?}", name, e);
            lifecycle.teardown();
            return Err(e.context(FatalSetupError::new(format!(
                "setup for suite [{name}] failed"
            ))));
        }
    }
    context.set_lifecycle_state(LifecycleState::Ready);

    let mut summary = RunSummary::new(
        run_id.clone(),
        name.clone(),
        started_at,
        context.identity().environment_tag().to_string(),
        context.identity().project_label().to_string(),
        context.identity().denied_regions().to_vec(),
        env!("CARGO_PKG_VERSION").to_string(),
    );
    for key in recorded_env {
        if let Ok(value) = std::env::var(&key) {
            summary.add_env(key, value);
        }
    }

    context.set_lifecycle_state(LifecycleState::ScenariosRunning);
    let progress = ScenarioProgress::new(
        scenarios
            .iter()
            .filter(|(scenario_name, _)| cli.is_selected(scenario_name))
            .count(),
        cli.no_progress,
    );

    let mut outcomes = Vec::with_capacity(scenarios.len());
    for (scenario_name, scenario_fn) in scenarios {
        let started = Instant::now();

        let outcome = if run_shutdown_listener.should_shutdown() {
            log::info!("Skipping scenario [{scenario_name}], the run is shutting down");
            ScenarioOutcome::Skipped
        } else if !cli.is_selected(&scenario_name) {
            log::debug!("Skipping scenario [{scenario_name}], not selected");
            ScenarioOutcome::Skipped
        } else {
            progress.start(&scenario_name);
            log::info!("Running scenario [{scenario_name}]");

            let mut scenario_context = ScenarioContext::new(scenario_name.clone(), context.clone());
            let outcome = match run_hook(|| scenario_fn(&mut scenario_context)) {
                Ok(()) => {
                    log::info!("Scenario [{scenario_name}] passed");
                    ScenarioOutcome::Passed
                }
                Err(e) if e.is::<ShutdownSignalError>() => {
                    log::warn!("Scenario [{scenario_name}] stopped by shutdown");
                    ScenarioOutcome::Skipped
                }
                Err(e) => {
                    log::error!("Scenario [{scenario_name}] failed: {e:?}");
                    ScenarioOutcome::Failed(format!("{e:#}"))
                }
            };
            progress.finish_one();
            outcome
        };

        summary.add_scenario(ScenarioSummary {
            name: scenario_name.clone(),
            status: outcome.status(),
            duration_ms: started.elapsed().as_millis() as u64,
        });
        outcomes.push((scenario_name, outcome));
    }
    progress.finish();

    if let TeardownOutcome::AlreadyDone = lifecycle.teardown() {
        log::debug!("Teardown had already run");
    }
    // Checked after teardown so that a signal received while tearing down is still reported. The
    // signal listener leaves the exit status to this thread when it did not run the teardown.
    let interrupted = run_shutdown_listener.should_shutdown();

    summary.set_interrupted(interrupted);
    if !cli.no_run_summary {
        if let Err(e) = append_run_summary(&summary, cli.run_summary.clone()) {
            log::error!("Failed to write run summary: {e:?}");
        }
    }

    let outcome = RunOutcome {
        run_id,
        scenarios: outcomes,
        interrupted,
    };
    println!(
        "Suite [{}]: {} passed, {} failed, {} skipped",
        name,
        outcome.passed(),
        outcome.failed(),
        outcome.skipped()
    );

    Ok(outcome)
}

/// Run a hook, turning a panic into an error so that it can be handled like any other failure.
fn run_hook(hook: impl FnOnce() -> HookResult) -> HookResult {
    match std::panic::catch_unwind(AssertUnwindSafe(hook)) {
        Ok(result) => result,
        Err(panic) => Err(anyhow::anyhow!("Hook panicked: {}", panic_message(&*panic))),
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> &str {
    if let Some(msg) = panic.downcast_ref::<&str>() {
        msg
    } else if let Some(msg) = panic.downcast_ref::<String>() {
        msg
    } else {
        "unknown panic"
    }
}
