use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(about, long_about = None)]
pub struct InfraTunnelCli {
    /// The directory containing the root module for the prerequisite resources.
    ///
    /// Scenario modules are resolved relative to this directory and transient engine files are
    /// cleaned up beneath it when the run ends.
    #[clap(long, default_value = ".")]
    pub working_dir: PathBuf,

    /// Only run the named scenario. Can be given multiple times to run several scenarios, for
    /// example `--scenario=ut_assertions --scenario=it_defaults`.
    ///
    /// Scenarios that are not selected are reported as skipped. The prerequisite resources are
    /// always provisioned.
    #[clap(long = "scenario", short)]
    pub scenarios: Vec<String>,

    /// Exclude a region from random region selection, in addition to the default denied regions.
    #[clap(long = "deny-region")]
    pub deny_regions: Vec<String>,

    /// Do not show a progress bar on the CLI.
    ///
    /// This is recommended for CI/CD environments where the progress bar isn't being looked at by anyone and is just adding noise to the logs.
    #[clap(long, default_value = "false")]
    pub no_progress: bool,

    /// Leave transient engine files, such as `.terraform` directories and state files, in the
    /// working directory after the run.
    #[clap(long, default_value = "false")]
    pub keep_artifacts: bool,

    /// The id of this run. A random id is generated if not provided.
    #[clap(long)]
    pub run_id: Option<String>,

    /// The file to append the run summary to.
    #[clap(long, env = "RUN_SUMMARY_PATH", default_value = "run_summary.jsonl")]
    pub run_summary: PathBuf,

    /// Do not write a run summary.
    #[clap(long, default_value = "false")]
    pub no_run_summary: bool,
}

impl InfraTunnelCli {
    /// Whether the scenario was selected with `--scenario`. Every scenario is selected when no
    /// filter was given.
    pub fn is_selected(&self, scenario: &str) -> bool {
        self.scenarios.is_empty() || self.scenarios.iter().any(|s| s == scenario)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let cli = InfraTunnelCli::parse_from(["gke_cluster"]);

        assert_eq!(PathBuf::from("."), cli.working_dir);
        assert!(cli.scenarios.is_empty());
        assert!(cli.deny_regions.is_empty());
        assert!(!cli.no_progress);
        assert!(!cli.keep_artifacts);
        assert!(cli.run_id.is_none());
    }

    #[test]
    fn repeated_flags_collect() {
        let cli = InfraTunnelCli::parse_from([
            "gke_cluster",
            "--scenario=ut_assertions",
            "-s",
            "it_defaults",
            "--deny-region=us-west4",
            "--deny-region",
            "europe-west9",
            "--working-dir",
            "test",
            "--no-progress",
        ]);

        assert_eq!(vec!["ut_assertions", "it_defaults"], cli.scenarios);
        assert_eq!(vec!["us-west4", "europe-west9"], cli.deny_regions);
        assert_eq!(PathBuf::from("test"), cli.working_dir);
        assert!(cli.no_progress);
        assert!(cli.is_selected("it_defaults"));
        assert!(!cli.is_selected("ut_defaults"));
    }
}
