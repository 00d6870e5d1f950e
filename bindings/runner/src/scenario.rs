use std::path::PathBuf;

use infra_tunnel_runner::prelude::{HookResult, ScenarioAssertionError, ScenarioContext};
use terraform_client::prelude::{lookup_str, ProvisioningEngine, TerraformOptions};

use crate::config::build_scenario_config;
use crate::prerequisites::SubnetRole;
use crate::runner_context::TerraformRunnerContext;

/// What a plan-only scenario expects the plan to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanExpectation {
    Succeeds,
    /// The plan must fail and its diagnostics must contain every one of these substrings.
    FailsWith(Vec<String>),
}

impl PlanExpectation {
    pub fn fails_with<S: Into<String>>(substrings: impl IntoIterator<Item = S>) -> Self {
        PlanExpectation::FailsWith(substrings.into_iter().map(Into::into).collect())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScenarioMode {
    /// Initialise and plan the module. Nothing is applied.
    PlanOnly(PlanExpectation),
    /// Initialise, plan and apply the module. The resources are left for teardown to destroy.
    ///
    /// Teardown only knows about the most recently configured scenario, so the resources leak if
    /// any later scenario runs. Use this mode for the last scenario of a suite only.
    PlanAndApply,
    /// Initialise and apply the module, check that the output at `output_path` is a non-empty
    /// string and then destroy the module. The path is dotted, like `gke.gke_cluster_endpoint`.
    ///
    /// The module is destroyed whether or not the check passes.
    FullCycle { output_path: String },
}

/// One scenario of a Terraform suite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScenarioSpec {
    /// The module directory, relative to the runner working directory.
    pub dir: PathBuf,
    /// Which prerequisite subnet the module is deployed into.
    pub subnet: SubnetRole,
    pub mode: ScenarioMode,
}

impl ScenarioSpec {
    pub fn new(dir: impl Into<PathBuf>, subnet: SubnetRole, mode: ScenarioMode) -> Self {
        Self {
            dir: dir.into(),
            subnet,
            mode,
        }
    }
}

/// Run a scenario against the prerequisites.
///
/// A fresh region is picked for every scenario. The configuration is stored as the current
/// scenario before the engine is called, so that teardown can destroy it if the run is
/// interrupted.
pub fn run_scenario(
    ctx: &mut ScenarioContext<TerraformRunnerContext>,
    spec: &ScenarioSpec,
) -> HookResult {
    ctx.check_shutdown()?;

    let runner_context = ctx.runner_context().clone();
    let value = runner_context.get();
    let prerequisites = value
        .prerequisites()
        .ok_or_else(|| anyhow::anyhow!("Prerequisites have not been provisioned"))?;

    let project_id = value.project_id()?;
    let region = value.pick_region(&project_id, runner_context.identity().denied_regions())?;
    let options = build_scenario_config(
        runner_context.identity(),
        Some(prerequisites),
        &runner_context.working_dir().join(&spec.dir),
        &region,
        prerequisites.subnet(spec.subnet),
        &project_id,
    );
    value.set_current_scenario(options.clone());

    log::info!(
        "Scenario [{}] using module '{}' in region '{region}'",
        ctx.name(),
        options.dir().display()
    );

    match &spec.mode {
        ScenarioMode::PlanOnly(expectation) => plan_only(value.engine(), &options, expectation),
        ScenarioMode::PlanAndApply => {
            value.engine().init_and_plan(&options)?;
            ctx.check_shutdown()?;
            value.engine().apply(&options)?;
            Ok(())
        }
        ScenarioMode::FullCycle { output_path } => {
            let _destroy = DestroyOnDrop {
                context: value,
                options: &options,
            };

            value.engine().init_and_apply(&options)?;
            ctx.check_shutdown()?;

            let outputs = value.engine().output_all(&options)?;
            let path = output_path.split('.').collect::<Vec<_>>();
            let found = lookup_str(&outputs, &path)?;
            if found.is_empty() {
                return Err(ScenarioAssertionError::new(format!(
                    "output '{output_path}' is empty"
                ))
                .into());
            }

            println!("Found {output_path} {found}...");
            Ok(())
        }
    }
}

fn plan_only(
    engine: &dyn ProvisioningEngine,
    options: &TerraformOptions,
    expectation: &PlanExpectation,
) -> HookResult {
    match (engine.init_and_plan(options), expectation) {
        (Ok(_), PlanExpectation::Succeeds) => Ok(()),
        (Err(e), PlanExpectation::Succeeds) => Err(anyhow::Error::from(e)
            .context(ScenarioAssertionError::new("plan was expected to succeed"))),
        (Ok(output), PlanExpectation::FailsWith(_)) => {
            log::debug!("Unexpectedly successful plan:\n{output}");
            Err(ScenarioAssertionError::new("plan was expected to fail but succeeded").into())
        }
        (Err(e), PlanExpectation::FailsWith(expected)) => {
            let Some(diagnostics) = e.diagnostics() else {
                return Err(anyhow::Error::from(e).context(ScenarioAssertionError::new(
                    "plan failed before producing any diagnostics",
                )));
            };

            let missing = expected
                .iter()
                .filter(|s| !diagnostics.contains(s.as_str()))
                .collect::<Vec<_>>();
            if !missing.is_empty() {
                return Err(ScenarioAssertionError::new(format!(
                    "plan diagnostics do not contain {missing:?}:\n{diagnostics}"
                ))
                .into());
            }

            log::info!("Plan failed with all {} expected messages", expected.len());
            Ok(())
        }
    }
}

/// Destroys a module when dropped, so that it is destroyed even if the scenario fails or panics.
struct DestroyOnDrop<'a> {
    context: &'a TerraformRunnerContext,
    options: &'a TerraformOptions,
}

impl Drop for DestroyOnDrop<'_> {
    fn drop(&mut self) {
        log::info!("Destroying module '{}'", self.options.dir().display());
        match self.context.engine().destroy(self.options) {
            Ok(()) => self.context.clear_current_scenario(self.options),
            Err(e) => log::error!(
                "Failed to destroy module '{}', teardown will try again: {e}",
                self.options.dir().display()
            ),
        }
    }
}
