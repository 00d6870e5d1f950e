use std::sync::{Arc, OnceLock};

use anyhow::Context;
use gcp_metadata::prelude::{project_id_from_env, select_region, GcloudRegionSource, RegionSource};
use infra_tunnel_runner::prelude::UserValuesConstraint;
use parking_lot::Mutex;
use terraform_client::prelude::{ProvisioningEngine, TerraformCli, TerraformOptions};

use crate::prerequisites::PrerequisiteOutputs;

/// The runner value for Terraform suites.
///
/// Holds the engine and the cloud metadata source, plus the state that teardown needs: the
/// configuration the prerequisites were provisioned with, and the configuration of the most
/// recently started scenario.
#[derive(Debug)]
pub struct TerraformRunnerContext {
    engine: Arc<dyn ProvisioningEngine>,
    region_source: Box<dyn RegionSource>,
    project_id: Option<String>,
    approved_regions: Option<Vec<String>>,
    prerequisites: OnceLock<PrerequisiteOutputs>,
    prerequisite_options: Mutex<Option<TerraformOptions>>,
    current_scenario: Mutex<Option<TerraformOptions>>,
}

impl UserValuesConstraint for TerraformRunnerContext {}

impl TerraformRunnerContext {
    pub fn new(engine: Arc<dyn ProvisioningEngine>, region_source: Box<dyn RegionSource>) -> Self {
        Self {
            engine,
            region_source,
            project_id: None,
            approved_regions: None,
            prerequisites: OnceLock::new(),
            prerequisite_options: Mutex::new(None),
            current_scenario: Mutex::new(None),
        }
    }

    /// Use the `terraform` binary found by [terraform_client::prelude::terraform_path] and list
    /// regions with `gcloud`.
    pub fn from_env() -> anyhow::Result<Self> {
        let engine = TerraformCli::from_env().context("Could not set up the Terraform engine")?;
        Ok(Self::new(
            Arc::new(engine),
            Box::new(GcloudRegionSource::default()),
        ))
    }

    /// Use this project instead of reading it from the environment.
    pub fn with_project_id(mut self, project_id: impl Into<String>) -> Self {
        self.project_id = Some(project_id.into());
        self
    }

    /// Only pick regions from this list, instead of every region the project has.
    pub fn with_approved_regions(mut self, regions: Vec<String>) -> Self {
        self.approved_regions = Some(regions);
        self
    }

    pub fn engine(&self) -> &dyn ProvisioningEngine {
        self.engine.as_ref()
    }

    pub fn project_id(&self) -> anyhow::Result<String> {
        match &self.project_id {
            Some(project_id) => Ok(project_id.clone()),
            None => project_id_from_env(),
        }
    }

    /// Pick a region for the next module, excluding the `denied` regions.
    pub fn pick_region(&self, project_id: &str, denied: &[String]) -> anyhow::Result<String> {
        select_region(
            self.region_source.as_ref(),
            project_id,
            self.approved_regions.as_deref(),
            denied,
        )
    }

    /// The prerequisite outputs, once the prerequisites have been provisioned.
    pub fn prerequisites(&self) -> Option<&PrerequisiteOutputs> {
        self.prerequisites.get()
    }

    pub(crate) fn set_prerequisites(&self, outputs: PrerequisiteOutputs) -> anyhow::Result<()> {
        self.prerequisites
            .set(outputs)
            .map_err(|_| anyhow::anyhow!("Prerequisite outputs have already been set"))
    }

    pub(crate) fn set_prerequisite_options(&self, options: TerraformOptions) {
        *self.prerequisite_options.lock() = Some(options);
    }

    pub(crate) fn take_prerequisite_options(&self) -> Option<TerraformOptions> {
        self.prerequisite_options.lock().take()
    }

    /// Remember `options` as the module to destroy if the run is torn down, replacing whichever
    /// scenario was there before.
    pub(crate) fn set_current_scenario(&self, options: TerraformOptions) {
        *self.current_scenario.lock() = Some(options);
    }

    /// Forget the current scenario if it is still `options`, because its resources are gone.
    pub(crate) fn clear_current_scenario(&self, options: &TerraformOptions) {
        let mut current = self.current_scenario.lock();
        if current.as_ref() == Some(options) {
            *current = None;
        }
    }

    pub(crate) fn take_current_scenario(&self) -> Option<TerraformOptions> {
        self.current_scenario.lock().take()
    }

    /// The configuration of the most recently started scenario that has not been destroyed.
    pub fn current_scenario(&self) -> Option<TerraformOptions> {
        self.current_scenario.lock().clone()
    }
}
