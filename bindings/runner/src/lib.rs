mod config;
mod definition;
mod prerequisites;
mod runner_context;
mod scenario;

pub mod prelude {
    pub use crate::config::{build_scenario_config, PROJECT_OVERRIDE_ENV};
    pub use crate::definition::TerraformSuiteDefinitionBuilder;
    pub use crate::prerequisites::{
        destroy_lingering_resources, provision_prerequisites, PrerequisiteOutputs, SubnetRole,
    };
    pub use crate::runner_context::TerraformRunnerContext;
    pub use crate::scenario::{run_scenario, PlanExpectation, ScenarioMode, ScenarioSpec};

    /// Re-export of the `infra_tunnel_runner` prelude.
    ///
    /// This is for convenience so that you can depend on a single crate for the runner in your suites.
    pub use infra_tunnel_runner::prelude::*;

    /// Re-export of the Terraform and cloud metadata bindings for convenience.
    pub use gcp_metadata::prelude::*;
    pub use terraform_client::prelude::*;
}
