use itertools::Itertools;
use serde::{Deserialize, Serialize};
use sha3::Digest;
use std::collections::HashMap;
use std::io::{BufRead, Read, Write};
use std::path::PathBuf;

/// How a single scenario ended.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ScenarioStatus {
    Passed,
    Failed { reason: String },
    /// The scenario was not started, because the run was shutting down or it was filtered out.
    Skipped,
}

/// Summary of one scenario within a run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScenarioSummary {
    pub name: String,
    pub status: ScenarioStatus,
    /// Wall clock time spent in the scenario, in milliseconds
    pub duration_ms: u64,
}

/// Summary of a run
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RunSummary {
    /// The unique run id
    ///
    /// Chosen by the runner. Unique for each run.
    pub run_id: String,
    /// The name of the suite that was run
    pub suite_name: String,
    /// The time the run started
    ///
    /// This is a Unix timestamp in seconds.
    pub started_at: i64,
    /// The environment tag that every resource created by this run was labelled with
    pub environment_tag: String,
    /// The project label generated for this run
    pub project_label: String,
    /// Regions that were excluded from random region selection
    pub denied_regions: Vec<String>,
    /// One entry per registered scenario, in the order they were run
    pub scenarios: Vec<ScenarioSummary>,
    /// Whether the run stopped early because of a shutdown signal
    pub interrupted: bool,
    /// Environment variables set for the run
    ///
    /// This won't capture all environment variables. Just the ones that the runner is aware of or
    /// that are included by the suite itself.
    pub env: HashMap<String, String>,
    /// The version of Infra Tunnel that was used for this run
    pub infra_tunnel_version: String,
}

impl RunSummary {
    /// Create a new run summary
    pub fn new(
        run_id: String,
        suite_name: String,
        started_at: i64,
        environment_tag: String,
        project_label: String,
        denied_regions: Vec<String>,
        infra_tunnel_version: String,
    ) -> Self {
        Self {
            run_id,
            suite_name,
            started_at,
            environment_tag,
            project_label,
            denied_regions,
            scenarios: Vec::new(),
            interrupted: false,
            env: HashMap::with_capacity(0),
            infra_tunnel_version,
        }
    }

    /// Record the outcome of a scenario
    pub fn add_scenario(&mut self, scenario: ScenarioSummary) {
        self.scenarios.push(scenario);
    }

    /// Mark the run as stopped by a shutdown signal
    pub fn set_interrupted(&mut self, interrupted: bool) {
        self.interrupted = interrupted;
    }

    /// Add an environment variable
    pub fn add_env(&mut self, key: String, value: String) {
        self.env.insert(key, value);
    }

    /// The number of scenarios that failed
    pub fn failed_count(&self) -> usize {
        self.scenarios
            .iter()
            .filter(|s| matches!(s.status, ScenarioStatus::Failed { .. }))
            .count()
    }

    /// Compute a fingerprint for this run summary
    ///
    /// The fingerprint is intended to identify the configuration used to run the suite, so that
    /// runs of the same configuration can be compared. It uses the
    ///     - Suite name
    ///     - Scenario names, in run order
    ///     - Denied regions
    ///     - Selected environment variables
    ///     - Infra Tunnel version
    ///
    /// Run specific values such as the run id and the generated identity are not included.
    ///
    /// The fingerprint is computed using [sha3::Sha3_256].
    pub fn fingerprint(&self) -> String {
        let mut hasher = sha3::Sha3_256::new();
        Digest::update(&mut hasher, self.suite_name.as_bytes());
        self.scenarios.iter().for_each(|s| {
            Digest::update(&mut hasher, s.name.as_bytes());
        });
        self.denied_regions.iter().for_each(|r| {
            Digest::update(&mut hasher, r.as_bytes());
        });
        self.env
            .iter()
            .sorted_by_key(|(k, _)| k.to_owned())
            .for_each(|(k, v)| {
                Digest::update(&mut hasher, k.as_bytes());
                Digest::update(&mut hasher, v.as_bytes());
            });
        Digest::update(&mut hasher, self.infra_tunnel_version.as_bytes());

        format!("{:x}", hasher.finalize())
    }
}

/// Append the run summary to a file
///
/// The summary will be serialized to JSON and output as a single line followed by a newline. The
/// recommended file extension is `.jsonl`.
pub fn append_run_summary(run_summary: &RunSummary, path: PathBuf) -> anyhow::Result<()> {
    let mut file = std::fs::OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)?;
    store_run_summary(run_summary, &mut file)?;
    file.write_all("\n".as_bytes())?;
    Ok(())
}

/// Serialize the run summary to a writer
pub fn store_run_summary<W: Write>(run_summary: &RunSummary, writer: &mut W) -> anyhow::Result<()> {
    serde_json::to_writer(writer, run_summary)?;
    Ok(())
}

/// Load a run summary from a reader
pub fn load_run_summary<R: Read>(reader: R) -> anyhow::Result<RunSummary> {
    let reader = std::io::BufReader::new(reader);
    let run_summary: RunSummary = serde_json::from_reader(reader)?;
    Ok(run_summary)
}

/// Load run summaries from a file
///
/// The file should contain one JSON object per line. This is the format produced by
/// [append_run_summary].
pub fn load_summary_runs(path: PathBuf) -> anyhow::Result<Vec<RunSummary>> {
    let file = std::fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    let mut runs = Vec::new();
    for line in reader.lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        runs.push(load_run_summary(line.as_bytes())?);
    }
    Ok(runs)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_summary(run_id: &str) -> RunSummary {
        let mut summary = RunSummary::new(
            run_id.to_string(),
            "gke_cluster".to_string(),
            1_700_000_000,
            format!("infratest {run_id}"),
            format!("tft{run_id}"),
            vec!["asia-east2".to_string()],
            "0.1.0".to_string(),
        );
        summary.add_scenario(ScenarioSummary {
            name: "ut_assertions".to_string(),
            status: ScenarioStatus::Passed,
            duration_ms: 1200,
        });
        summary.add_scenario(ScenarioSummary {
            name: "it_defaults".to_string(),
            status: ScenarioStatus::Failed {
                reason: "Missing output 'gke'".to_string(),
            },
            duration_ms: 800,
        });
        summary
    }

    #[test]
    fn fingerprint_ignores_run_specific_values() {
        let first = sample_summary("abc123");
        let second = sample_summary("xyz789");

        assert_eq!(first.fingerprint(), second.fingerprint());
    }

    #[test]
    fn fingerprint_changes_with_denied_regions() {
        let first = sample_summary("abc123");
        let mut second = sample_summary("abc123");
        second.denied_regions.push("us-west4".to_string());

        assert_ne!(first.fingerprint(), second.fingerprint());
    }

    #[test]
    fn counts_failed_scenarios() {
        assert_eq!(1, sample_summary("abc123").failed_count());
    }

    #[test]
    fn stored_summary_loads_back() {
        let mut buffer = Vec::new();
        let mut summary = sample_summary("abc123");
        summary.set_interrupted(true);
        summary.add_env("IT_GCP_REGION".to_string(), "europe-west1".to_string());

        store_run_summary(&summary, &mut buffer).unwrap();

        pretty_assertions::assert_eq!(summary, load_run_summary(buffer.as_slice()).unwrap());
    }

    #[test]
    fn appended_summaries_load_back_in_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("run_summary.jsonl");

        append_run_summary(&sample_summary("first"), path.clone()).unwrap();
        append_run_summary(&sample_summary("second"), path.clone()).unwrap();

        let runs = load_summary_runs(path).unwrap();
        pretty_assertions::assert_eq!(vec![sample_summary("first"), sample_summary("second")], runs);
    }
}
