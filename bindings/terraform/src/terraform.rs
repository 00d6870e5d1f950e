use crate::bin_path::terraform_path;
use crate::engine::{EngineError, OutputMap, ProvisioningEngine};
use crate::options::TerraformOptions;
use crate::output::parse_output_json;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// The Terraform subcommands used by the [TerraformCli].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subcommand {
    Init,
    Plan,
    Apply,
    Destroy,
    Output,
}

impl Subcommand {
    /// The full argument list for this subcommand against the module described by `options`.
    pub fn args(self, options: &TerraformOptions) -> Vec<String> {
        let fixed: &[&str] = match self {
            Subcommand::Init => &["init", "-upgrade=false", "-input=false", "-no-color"],
            Subcommand::Plan => &["plan", "-input=false", "-lock=false", "-no-color"],
            Subcommand::Apply => &[
                "apply",
                "-input=false",
                "-auto-approve",
                "-lock=false",
                "-no-color",
            ],
            Subcommand::Destroy => &[
                "destroy",
                "-auto-approve",
                "-input=false",
                "-lock=false",
                "-no-color",
            ],
            Subcommand::Output => &["output", "-no-color", "-json"],
        };

        let mut args = fixed.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        if self.takes_vars() {
            args.extend(options.var_args());
        }
        args
    }

    fn takes_vars(self) -> bool {
        matches!(
            self,
            Subcommand::Plan | Subcommand::Apply | Subcommand::Destroy
        )
    }
}

/// A [ProvisioningEngine] that runs the `terraform` binary as a child process.
#[derive(Debug, Clone)]
pub struct TerraformCli {
    bin_path: PathBuf,
}

impl TerraformCli {
    pub fn new(bin_path: impl Into<PathBuf>) -> Self {
        Self {
            bin_path: bin_path.into(),
        }
    }

    /// Locate the `terraform` binary using [terraform_path].
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self::new(terraform_path()?))
    }

    fn run(
        &self,
        options: &TerraformOptions,
        subcommand: Subcommand,
    ) -> Result<CapturedOutput, EngineError> {
        let args = subcommand.args(options);
        let command = format!("terraform {}", args.join(" "));

        log::info!("Running `{command}` in '{}'", options.dir().display());
        let output = Command::new(&self.bin_path)
            .current_dir(options.dir())
            .args(&args)
            .envs(options.env_vars())
            .env("TF_IN_AUTOMATION", "1")
            .stdin(Stdio::null())
            .output()
            .map_err(|source| EngineError::Spawn {
                command: command.clone(),
                source,
            })?;

        let captured = CapturedOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        };

        if output.status.success() {
            log::debug!("`{command}` succeeded:\n{}", captured.combined());
            Ok(captured)
        } else {
            Err(EngineError::Failed {
                command,
                status: output.status.to_string(),
                output: captured.combined(),
            })
        }
    }
}

/// What a `terraform` child process wrote, with the two streams kept apart so that machine
/// readable output on stdout is not mixed with warnings on stderr.
struct CapturedOutput {
    stdout: String,
    stderr: String,
}

impl CapturedOutput {
    fn combined(&self) -> String {
        format!("{}{}", self.stdout, self.stderr)
    }
}

impl ProvisioningEngine for TerraformCli {
    fn init_and_plan(&self, options: &TerraformOptions) -> Result<String, EngineError> {
        let init = self.run(options, Subcommand::Init)?.combined();
        match self.run(options, Subcommand::Plan) {
            Ok(plan) => Ok(init + &plan.combined()),
            Err(EngineError::Failed {
                command,
                status,
                output,
            }) => Err(EngineError::Failed {
                command,
                status,
                output: init + &output,
            }),
            Err(e) => Err(e),
        }
    }

    fn apply(&self, options: &TerraformOptions) -> Result<(), EngineError> {
        self.run(options, Subcommand::Apply).map(|_| ())
    }

    fn init_and_apply(&self, options: &TerraformOptions) -> Result<(), EngineError> {
        self.run(options, Subcommand::Init)?;
        self.apply(options)
    }

    fn destroy(&self, options: &TerraformOptions) -> Result<(), EngineError> {
        self.run(options, Subcommand::Destroy).map(|_| ())
    }

    fn output_all(&self, options: &TerraformOptions) -> Result<OutputMap, EngineError> {
        let args = Subcommand::Output.args(options);
        let captured = self.run(options, Subcommand::Output)?;
        if !captured.stderr.is_empty() {
            log::warn!("`terraform output` wrote to stderr:\n{}", captured.stderr);
        }

        parse_output_json(&captured.stdout).map_err(|source| EngineError::InvalidOutput {
            command: format!("terraform {}", args.join(" ")),
            source,
        })
    }
}
