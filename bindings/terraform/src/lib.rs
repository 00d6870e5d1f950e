//! Bindings for the Terraform CLI.
//!
//! Suites talk to the engine through the [prelude::ProvisioningEngine] trait so that the lifecycle
//! can be exercised without real infrastructure. [prelude::TerraformCli] is the implementation
//! that shells out to the `terraform` binary.

mod bin_path;
mod engine;
mod options;
mod output;
mod terraform;

pub mod prelude {
    pub use crate::bin_path::{terraform_path, TERRAFORM_PATH_ENV};
    pub use crate::engine::{EngineError, OutputMap, ProvisioningEngine};
    pub use crate::options::TerraformOptions;
    pub use crate::output::{lookup, lookup_object, lookup_str, parse_output_json};
    pub use crate::terraform::{Subcommand, TerraformCli};
}
