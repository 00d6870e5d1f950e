/// Regions that are never picked for a run, because the resources under test are not available
/// in them.
pub const DEFAULT_DENIED_REGIONS: [&str; 1] = ["asia-east2"];

const ENVIRONMENT_TAG_PREFIX: &str = "infratest";
const PROJECT_LABEL_PREFIX: &str = "tft";
const UNIQUE_ID_LEN: usize = 6;
const UNIQUE_ID_ALPHABET: [char; 36] = [
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i',
    'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z',
];

/// Identifiers that are unique to one run of a suite.
///
/// Every resource a run creates is labelled with these, so that resources left behind by an
/// abandoned run can be traced back to it. Created once when the run starts and never changed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunIdentity {
    environment_tag: String,
    project_label: String,
    denied_regions: Vec<String>,
}

impl RunIdentity {
    /// Generate a new identity.
    ///
    /// The denied regions are [DEFAULT_DENIED_REGIONS] followed by `extra_denied_regions`, with
    /// duplicates removed.
    pub fn generate(extra_denied_regions: &[String]) -> Self {
        let mut denied_regions = Vec::new();
        for region in DEFAULT_DENIED_REGIONS
            .iter()
            .map(|r| r.to_string())
            .chain(extra_denied_regions.iter().cloned())
        {
            if !denied_regions.contains(&region) {
                denied_regions.push(region);
            }
        }

        Self {
            environment_tag: format!("{ENVIRONMENT_TAG_PREFIX} {}", unique_id()),
            project_label: format!("{PROJECT_LABEL_PREFIX}{}", unique_id()),
            denied_regions,
        }
    }

    /// Create an identity from known values, for example to reproduce an earlier run.
    pub fn new(
        environment_tag: impl Into<String>,
        project_label: impl Into<String>,
        denied_regions: Vec<String>,
    ) -> Self {
        Self {
            environment_tag: environment_tag.into(),
            project_label: project_label.into(),
            denied_regions,
        }
    }

    /// The tag for the environment that resources are created in, for resource labelling.
    pub fn environment_tag(&self) -> &str {
        &self.environment_tag
    }

    /// A short, lowercase alphanumeric label to name resources with.
    pub fn project_label(&self) -> &str {
        &self.project_label
    }

    pub fn denied_regions(&self) -> &[String] {
        &self.denied_regions
    }
}

fn unique_id() -> String {
    nanoid::nanoid!(UNIQUE_ID_LEN, &UNIQUE_ID_ALPHABET)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_identity_is_lowercase() {
        let identity = RunIdentity::generate(&[]);

        let suffix = identity
            .environment_tag()
            .strip_prefix("infratest ")
            .unwrap();
        assert_eq!(UNIQUE_ID_LEN, suffix.len());
        assert_eq!(identity.environment_tag().to_lowercase(), identity.environment_tag());

        let label = identity.project_label().strip_prefix("tft").unwrap();
        assert_eq!(UNIQUE_ID_LEN, label.len());
        assert!(label
            .chars()
            .all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
    }

    #[test]
    fn generated_identities_differ() {
        let first = RunIdentity::generate(&[]);
        let second = RunIdentity::generate(&[]);

        assert_ne!(first.environment_tag(), second.environment_tag());
        assert_ne!(first.project_label(), second.project_label());
    }

    #[test]
    fn denied_regions_start_with_defaults_and_have_no_duplicates() {
        let identity = RunIdentity::generate(&[
            "us-west4".to_string(),
            "asia-east2".to_string(),
            "us-west4".to_string(),
        ]);

        assert_eq!(vec!["asia-east2", "us-west4"], identity.denied_regions());
    }
}
