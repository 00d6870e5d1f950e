use gcp_metadata::prelude::REGION_ENV;
use infra_tunnel_runner::prelude::{init, InfraTunnelCli, SuiteDefinitionBuilder};
use terraform_client::prelude::TERRAFORM_PATH_ENV;

use crate::prerequisites::{destroy_lingering_resources, provision_prerequisites};
use crate::runner_context::TerraformRunnerContext;

pub struct TerraformSuiteDefinitionBuilder {
    inner: SuiteDefinitionBuilder<TerraformRunnerContext>,
}

impl TerraformSuiteDefinitionBuilder {
    /// See [SuiteDefinitionBuilder::new_with_init].
    ///
    /// The runner value is built with [TerraformRunnerContext::from_env].
    pub fn new_with_init(name: &str) -> anyhow::Result<Self> {
        let cli = init();
        Ok(Self::new(name, cli, TerraformRunnerContext::from_env()?))
    }

    pub fn new(name: &str, cli: InfraTunnelCli, value: TerraformRunnerContext) -> Self {
        Self {
            inner: SuiteDefinitionBuilder::new(name, cli, value),
        }
    }

    /// Once the Terraform customisations have been made, use this function to switch back to
    /// configuring the scenarios of the suite.
    ///
    /// The setup and teardown hooks provision and destroy the prerequisites. Replacing them
    /// leaves prerequisite resources behind.
    pub fn into_std(self) -> SuiteDefinitionBuilder<TerraformRunnerContext> {
        // These environment variables change where and how every Terraform suite runs. Always
        // capture them and let suites add any that are custom.
        self.inner
            .use_setup(provision_prerequisites)
            .use_teardown(destroy_lingering_resources)
            .record_env(TERRAFORM_PATH_ENV)
            .record_env(REGION_ENV)
    }
}
