use std::path::Path;

use infra_tunnel_runner::prelude::RunIdentity;
use terraform_client::prelude::TerraformOptions;

use crate::prerequisites::PrerequisiteOutputs;

/// The environment variable that tells the Google provider which project to use.
pub const PROJECT_OVERRIDE_ENV: &str = "GOOGLE_CLOUD_PROJECT";

/// Build the configuration for one Terraform module.
///
/// Every module gets the same variables. Without `prerequisites`, which is the case for the
/// prerequisite module itself, the network, service account and key variables are empty.
pub fn build_scenario_config(
    identity: &RunIdentity,
    prerequisites: Option<&PrerequisiteOutputs>,
    dir: &Path,
    region: &str,
    subnet: &str,
    project_id: &str,
) -> TerraformOptions {
    let (network, service_account, kms_key) = match prerequisites {
        Some(p) => (
            p.vpc_id.as_str(),
            p.gke_service_account.as_str(),
            p.kms_key.as_str(),
        ),
        None => ("", "", ""),
    };

    TerraformOptions::new(dir)
        .with_var("environment", identity.environment_tag())
        .with_var("project", identity.project_label())
        .with_var("location", region)
        .with_var("network", network)
        .with_var("subnetwork", subnet)
        .with_var("service_account", service_account)
        .with_var("database_encryption_kms_key", kms_key)
        .with_env_var(PROJECT_OVERRIDE_ENV, project_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn identity() -> RunIdentity {
        RunIdentity::new("infratest abc123", "tftdef456", vec!["asia-east2".to_string()])
    }

    fn prerequisites() -> PrerequisiteOutputs {
        PrerequisiteOutputs {
            vpc_id: "net-abc".to_string(),
            asserts_subnet: "gke-asserts-xyz".to_string(),
            nodes_subnet: "gke-k8nodes-xyz".to_string(),
            gke_service_account: "gke-sa@my-project.iam.gserviceaccount.com".to_string(),
            kms_key: "projects/my-project/locations/europe-west1/keyRings/ring/cryptoKeys/key"
                .to_string(),
        }
    }

    #[test]
    fn scenario_config_uses_prerequisites() {
        let prerequisites = prerequisites();
        let options = build_scenario_config(
            &identity(),
            Some(&prerequisites),
            Path::new("defaults"),
            "europe-west1",
            &prerequisites.nodes_subnet,
            "my-project",
        );

        assert_eq!(Path::new("defaults"), options.dir());
        assert_eq!(
            &json!({
                "environment": "infratest abc123",
                "project": "tftdef456",
                "location": "europe-west1",
                "network": "net-abc",
                "subnetwork": "gke-k8nodes-xyz",
                "service_account": "gke-sa@my-project.iam.gserviceaccount.com",
                "database_encryption_kms_key": "projects/my-project/locations/europe-west1/keyRings/ring/cryptoKeys/key",
            }),
            &serde_json::to_value(options.vars()).unwrap()
        );
        assert_eq!(
            Some(&"my-project".to_string()),
            options.env_vars().get(PROJECT_OVERRIDE_ENV)
        );
    }

    #[test]
    fn prerequisite_config_has_empty_network() {
        let options = build_scenario_config(
            &identity(),
            None,
            Path::new("."),
            "us-east1",
            "",
            "my-project",
        );

        for name in [
            "network",
            "subnetwork",
            "service_account",
            "database_encryption_kms_key",
        ] {
            assert_eq!(Some(&json!("")), options.var(name), "{name}");
        }
        assert_eq!(Some(&json!("us-east1")), options.var("location"));
    }

    #[test]
    fn config_is_deterministic() {
        let prerequisites = prerequisites();
        let build = || {
            build_scenario_config(
                &identity(),
                Some(&prerequisites),
                Path::new("overrides"),
                "europe-west1",
                "gke-k8nodes-xyz",
                "my-project",
            )
        };

        assert_eq!(build(), build());
    }
}
