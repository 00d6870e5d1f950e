/// Return this error from a setup hook to indicate that the run cannot continue.
///
/// The runner still attempts teardown before reporting the error, but no scenarios are started.
#[derive(derive_more::Error, derive_more::Display, Debug)]
#[display("Fatal setup error: {msg}")]
pub struct FatalSetupError {
    msg: String,
}

impl FatalSetupError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}

/// Return this error from a scenario when what the engine reported does not match what the
/// scenario expected.
///
/// Only the scenario that returns it fails, the other scenarios in the suite still run.
#[derive(derive_more::Error, derive_more::Display, Debug)]
#[display("Scenario assertion failed: {msg}")]
pub struct ScenarioAssertionError {
    msg: String,
}

impl ScenarioAssertionError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}

/// A failure while destroying resources or cleaning up after a run.
///
/// These are logged and never stop the process from exiting.
#[derive(derive_more::Error, derive_more::Display, Debug)]
#[display("Teardown failed: {msg}")]
pub struct TeardownError {
    msg: String,
}

impl TeardownError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self { msg: msg.into() }
    }
}

/// An output that the engine was expected to produce is missing or has the wrong shape.
#[derive(derive_more::Error, derive_more::Display, Debug, Clone, PartialEq, Eq)]
#[display("Missing output '{key}': {detail}")]
pub struct MissingOutputError {
    key: String,
    detail: String,
}

impl MissingOutputError {
    pub fn new(key: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            detail: detail.into(),
        }
    }

    /// The output key, or dotted path for nested outputs, that could not be read.
    pub fn key(&self) -> &str {
        &self.key
    }
}

/// Every region offered for a project was excluded.
#[derive(derive_more::Error, derive_more::Display, Debug, Clone, PartialEq, Eq)]
#[display("No eligible region for project '{project_id}', denied regions are {denied:?}")]
pub struct NoEligibleRegionError {
    project_id: String,
    denied: Vec<String>,
}

impl NoEligibleRegionError {
    pub fn new(project_id: impl Into<String>, denied: Vec<String>) -> Self {
        Self {
            project_id: project_id.into(),
            denied,
        }
    }
}
