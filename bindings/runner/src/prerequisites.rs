use infra_tunnel_runner::prelude::{
    HookResult, MissingOutputError, RunnerContext, TeardownError,
};
use terraform_client::prelude::{
    lookup_object, lookup_str, EngineError, OutputMap, ProvisioningEngine, TerraformOptions,
};

use crate::config::build_scenario_config;
use crate::runner_context::TerraformRunnerContext;

/// The subnets that the prerequisite module creates, one for each kind of scenario.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubnetRole {
    /// For the plan-only scenarios that exercise input validation.
    Asserts,
    /// For scenarios that create cluster nodes.
    Nodes,
}

impl SubnetRole {
    /// The key of this subnet in the `subnets` output.
    pub fn key(self) -> &'static str {
        match self {
            SubnetRole::Asserts => "gke-asserts",
            SubnetRole::Nodes => "gke-k8nodes",
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        [SubnetRole::Asserts, SubnetRole::Nodes]
            .into_iter()
            .find(|role| role.key() == key)
    }
}

/// The outputs of the prerequisite module that scenarios are configured with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrerequisiteOutputs {
    pub vpc_id: String,
    pub asserts_subnet: String,
    pub nodes_subnet: String,
    pub gke_service_account: String,
    pub kms_key: String,
}

impl PrerequisiteOutputs {
    /// Read the prerequisite outputs, failing on the first output that is missing or has the
    /// wrong type.
    ///
    /// The `subnets` output must have an entry for every [SubnetRole]. Any other entries are
    /// ignored.
    pub fn from_outputs(outputs: &OutputMap) -> Result<Self, MissingOutputError> {
        let subnets = lookup_object(outputs, &["subnets"])?;
        for key in subnets.keys() {
            if SubnetRole::from_key(key).is_none() {
                log::warn!("Ignoring unexpected subnet '{key}' in the prerequisite outputs");
            }
        }

        Ok(Self {
            vpc_id: lookup_str(outputs, &["vpc_id"])?.to_string(),
            asserts_subnet: subnet_name(outputs, SubnetRole::Asserts)?,
            nodes_subnet: subnet_name(outputs, SubnetRole::Nodes)?,
            gke_service_account: lookup_str(outputs, &["gke_sa"])?.to_string(),
            kms_key: lookup_str(outputs, &["crypto_key"])?.to_string(),
        })
    }

    pub fn subnet(&self, role: SubnetRole) -> &str {
        match role {
            SubnetRole::Asserts => &self.asserts_subnet,
            SubnetRole::Nodes => &self.nodes_subnet,
        }
    }
}

fn subnet_name(outputs: &OutputMap, role: SubnetRole) -> Result<String, MissingOutputError> {
    Ok(lookup_str(outputs, &["subnets", role.key(), "name"])?.to_string())
}

/// Provision the prerequisite module in the working directory.
///
/// Use this as the setup hook of a Terraform suite. It plans and applies the module in a randomly
/// picked region and then reads the [PrerequisiteOutputs] that scenarios need. The configuration
/// is remembered before anything is applied, so that teardown can destroy whatever was created
/// even if this hook fails part way through.
pub fn provision_prerequisites(ctx: &RunnerContext<TerraformRunnerContext>) -> HookResult {
    let value = ctx.get();

    let project_id = value.project_id()?;
    let region = value.pick_region(&project_id, ctx.identity().denied_regions())?;
    let options = build_scenario_config(
        ctx.identity(),
        None,
        ctx.working_dir(),
        &region,
        "",
        &project_id,
    );
    value.set_prerequisite_options(options.clone());

    log::info!(
        "Provisioning prerequisites from '{}' in region '{region}' of project '{project_id}'",
        ctx.working_dir().display()
    );
    value.engine().init_and_plan(&options)?;
    value.engine().apply(&options)?;

    require_output(value.engine(), &options, "subnets")?;
    require_output(value.engine(), &options, "vpc_id")?;

    let outputs = value.engine().output_all(&options)?;
    let prerequisites = PrerequisiteOutputs::from_outputs(&outputs)?;
    log::info!("Prerequisites ready: {prerequisites:?}");

    value.set_prerequisites(prerequisites)
}

/// Destroy whatever the suite may have left behind.
///
/// Use this as the teardown hook of a Terraform suite. The most recently started scenario is
/// destroyed first, then the prerequisites with the configuration they were provisioned with. A
/// failure to destroy one does not stop the other from being attempted.
pub fn destroy_lingering_resources(ctx: &RunnerContext<TerraformRunnerContext>) -> HookResult {
    let value = ctx.get();
    let mut failures = 0;

    println!("Cleaning possible lingering resources..");
    match value.take_current_scenario() {
        Some(options) => failures += destroy_best_effort(value.engine(), &options),
        None => log::debug!("No scenario resources to destroy"),
    }

    println!("Cleaning our prereq resources...");
    match value.take_prerequisite_options() {
        Some(options) => failures += destroy_best_effort(value.engine(), &options),
        None => log::debug!("No prerequisite resources to destroy"),
    }

    if failures > 0 {
        anyhow::bail!("{failures} module(s) could not be destroyed");
    }

    Ok(())
}

fn destroy_best_effort(engine: &dyn ProvisioningEngine, options: &TerraformOptions) -> usize {
    log::info!("Destroying module '{}'", options.dir().display());
    match engine.destroy(options) {
        Ok(()) => 0,
        Err(e) => {
            log::error!(
                "{:?}",
                anyhow::Error::from(e).context(TeardownError::new(format!(
                    "failed to destroy module '{}'",
                    options.dir().display()
                )))
            );
            1
        }
    }
}

/// Like [ProvisioningEngine::require_output_present], but a missing output is reported as a
/// [MissingOutputError] rather than an [EngineError].
fn require_output(
    engine: &dyn ProvisioningEngine,
    options: &TerraformOptions,
    key: &str,
) -> anyhow::Result<()> {
    match engine.require_output_present(options, key) {
        Ok(()) => Ok(()),
        Err(EngineError::MissingOutput(e)) => Err(e.into()),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn outputs(value: serde_json::Value) -> OutputMap {
        value.as_object().unwrap().clone()
    }

    fn valid_outputs() -> serde_json::Value {
        json!({
            "vpc_id": "net-abc",
            "subnets": {
                "gke-asserts": { "name": "gke-asserts-xyz", "region": "europe-west1" },
                "gke-k8nodes": { "name": "gke-k8nodes-xyz", "region": "europe-west1" },
            },
            "gke_sa": "gke-sa@my-project.iam.gserviceaccount.com",
            "crypto_key": "projects/my-project/cryptoKeys/key",
        })
    }

    #[test]
    fn reads_prerequisite_outputs() {
        let prerequisites = PrerequisiteOutputs::from_outputs(&outputs(valid_outputs())).unwrap();

        assert_eq!(
            PrerequisiteOutputs {
                vpc_id: "net-abc".to_string(),
                asserts_subnet: "gke-asserts-xyz".to_string(),
                nodes_subnet: "gke-k8nodes-xyz".to_string(),
                gke_service_account: "gke-sa@my-project.iam.gserviceaccount.com".to_string(),
                kms_key: "projects/my-project/cryptoKeys/key".to_string(),
            },
            prerequisites
        );
        assert_eq!("gke-k8nodes-xyz", prerequisites.subnet(SubnetRole::Nodes));
        assert_eq!("gke-asserts-xyz", prerequisites.subnet(SubnetRole::Asserts));
    }

    #[test]
    fn extra_subnets_are_ignored() {
        let mut value = valid_outputs();
        value["subnets"]["gke-extra"] = json!({ "name": "extra" });

        let prerequisites = PrerequisiteOutputs::from_outputs(&outputs(value)).unwrap();

        assert_eq!("gke-k8nodes-xyz", prerequisites.nodes_subnet);
    }

    #[test]
    fn missing_subnet_names_the_path() {
        let mut value = valid_outputs();
        value["subnets"]
            .as_object_mut()
            .unwrap()
            .remove("gke-k8nodes");

        let err = PrerequisiteOutputs::from_outputs(&outputs(value)).unwrap_err();

        assert_eq!("subnets.gke-k8nodes", err.key());
    }

    #[test]
    fn wrongly_typed_output_is_rejected() {
        let mut value = valid_outputs();
        value["vpc_id"] = json!(42);

        let err = PrerequisiteOutputs::from_outputs(&outputs(value)).unwrap_err();

        assert_eq!("vpc_id", err.key());
    }

    #[test]
    fn subnets_must_be_an_object() {
        let mut value = valid_outputs();
        value["subnets"] = json!(["gke-asserts", "gke-k8nodes"]);

        let err = PrerequisiteOutputs::from_outputs(&outputs(value)).unwrap_err();

        assert_eq!("subnets", err.key());
    }

    #[test]
    fn subnet_roles_round_trip_through_keys() {
        assert_eq!(Some(SubnetRole::Asserts), SubnetRole::from_key("gke-asserts"));
        assert_eq!(Some(SubnetRole::Nodes), SubnetRole::from_key("gke-k8nodes"));
        assert_eq!(None, SubnetRole::from_key("gke-other"));
    }
}
