use anyhow::{bail, Context};
use infra_tunnel_core::prelude::NoEligibleRegionError;
use rand::seq::SliceRandom;
use std::env;
use std::fmt::Debug;
use std::path::PathBuf;
use std::process::{Command, Stdio};

/// Environment variable to force the region used by a run instead of picking one at random.
///
/// The forced region is still checked against the denied regions.
pub const REGION_ENV: &str = "IT_GCP_REGION";

/// Somewhere to get the regions that are available to a project.
pub trait RegionSource: Debug + Send + Sync {
    fn regions(&self, project_id: &str) -> anyhow::Result<Vec<String>>;
}

/// Lists regions with `gcloud compute regions list`.
#[derive(Debug, Clone)]
pub struct GcloudRegionSource {
    bin_path: PathBuf,
}

impl Default for GcloudRegionSource {
    fn default() -> Self {
        Self {
            bin_path: PathBuf::from("gcloud"),
        }
    }
}

impl GcloudRegionSource {
    pub fn new(bin_path: impl Into<PathBuf>) -> Self {
        Self {
            bin_path: bin_path.into(),
        }
    }
}

impl RegionSource for GcloudRegionSource {
    fn regions(&self, project_id: &str) -> anyhow::Result<Vec<String>> {
        log::debug!("Listing regions for project '{project_id}'");
        let output = Command::new(&self.bin_path)
            .arg("compute")
            .arg("regions")
            .arg("list")
            .arg("--project")
            .arg(project_id)
            .arg("--format=value(name)")
            .stdin(Stdio::null())
            .output()
            .context("Failed to run 'gcloud compute regions list'")?;

        if !output.status.success() {
            bail!(
                "'gcloud compute regions list' failed with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr)
            );
        }

        Ok(parse_region_list(&String::from_utf8_lossy(&output.stdout)))
    }
}

/// A fixed set of regions, for when the regions are known up front.
#[derive(Debug, Clone, Default)]
pub struct StaticRegionSource {
    regions: Vec<String>,
}

impl StaticRegionSource {
    pub fn new<S: Into<String>>(regions: impl IntoIterator<Item = S>) -> Self {
        Self {
            regions: regions.into_iter().map(Into::into).collect(),
        }
    }
}

impl RegionSource for StaticRegionSource {
    fn regions(&self, _project_id: &str) -> anyhow::Result<Vec<String>> {
        Ok(self.regions.clone())
    }
}

fn parse_region_list(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect()
}

/// Pick a region uniformly at random from the candidates that are not denied.
///
/// The candidates are `approved` if given, otherwise every region the `source` knows about for
/// the project.
pub fn pick_random_region(
    source: &dyn RegionSource,
    project_id: &str,
    approved: Option<&[String]>,
    denied: &[String],
) -> anyhow::Result<String> {
    let candidates = match approved {
        Some(approved) => approved.to_vec(),
        None => source.regions(project_id)?,
    };

    let eligible = candidates
        .iter()
        .filter(|region| !denied.contains(*region))
        .collect::<Vec<_>>();

    let region = eligible
        .choose(&mut rand::thread_rng())
        .map(|region| region.to_string())
        .ok_or_else(|| NoEligibleRegionError::new(project_id, denied.to_vec()))?;

    log::debug!("Picked region '{region}' from {} eligible regions", eligible.len());
    Ok(region)
}

/// Select the region for a run, honouring [REGION_ENV] before falling back to
/// [pick_random_region].
pub fn select_region(
    source: &dyn RegionSource,
    project_id: &str,
    approved: Option<&[String]>,
    denied: &[String],
) -> anyhow::Result<String> {
    match env::var(REGION_ENV).ok().filter(|region| !region.is_empty()) {
        Some(region) if denied.contains(&region) => {
            Err(NoEligibleRegionError::new(project_id, denied.to_vec()))
                .with_context(|| format!("'{REGION_ENV}={region}' is a denied region"))
        }
        Some(region) => {
            log::info!("Using region '{region}' from '{REGION_ENV}'");
            Ok(region)
        }
        None => pick_random_region(source, project_id, approved, denied),
    }
}
