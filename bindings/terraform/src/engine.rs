use crate::options::TerraformOptions;
use infra_tunnel_core::prelude::MissingOutputError;
use std::fmt::Debug;

/// Root module outputs, keyed by output name. Values are the decoded output values, without the
/// `sensitive` and `type` metadata that Terraform wraps them in.
pub type OutputMap = serde_json::Map<String, serde_json::Value>;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("Failed to run `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` failed with {status}:\n{output}")]
    Failed {
        command: String,
        status: String,
        /// Everything the engine wrote to stdout followed by everything it wrote to stderr.
        output: String,
    },
    #[error("Could not parse the output of `{command}`: {source}")]
    InvalidOutput {
        command: String,
        #[source]
        source: serde_json::Error,
    },
    #[error(transparent)]
    MissingOutput(#[from] MissingOutputError),
}

impl EngineError {
    /// The diagnostic text the engine produced, if it got far enough to produce any.
    pub fn diagnostics(&self) -> Option<&str> {
        match self {
            EngineError::Failed { output, .. } => Some(output),
            _ => None,
        }
    }
}

/// The operations a suite needs from an infrastructure-as-code engine.
///
/// Every call blocks until the engine process exits. There is no streaming of partial results.
pub trait ProvisioningEngine: Debug + Send + Sync {
    /// Initialise the module and compute a plan without applying it.
    ///
    /// Returns the combined diagnostic text of both steps. On failure the text is available from
    /// [EngineError::diagnostics].
    fn init_and_plan(&self, options: &TerraformOptions) -> Result<String, EngineError>;

    /// Apply the module, assuming it has already been initialised.
    fn apply(&self, options: &TerraformOptions) -> Result<(), EngineError>;

    /// Initialise the module and apply it.
    fn init_and_apply(&self, options: &TerraformOptions) -> Result<(), EngineError>;

    /// Destroy everything the module manages.
    fn destroy(&self, options: &TerraformOptions) -> Result<(), EngineError>;

    /// Read every output of the root module.
    fn output_all(&self, options: &TerraformOptions) -> Result<OutputMap, EngineError>;

    /// Check that an output exists and is not null.
    fn require_output_present(
        &self,
        options: &TerraformOptions,
        key: &str,
    ) -> Result<(), EngineError> {
        match self.output_all(options)?.get(key) {
            Some(value) if !value.is_null() => Ok(()),
            Some(_) => Err(MissingOutputError::new(key, "output is null").into()),
            None => Err(MissingOutputError::new(key, "not present in the module outputs").into()),
        }
    }
}
