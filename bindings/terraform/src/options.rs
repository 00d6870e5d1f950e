use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Everything the engine needs to act on one Terraform root module.
///
/// Variables are passed to the engine as `-var name=value`. String values are passed verbatim and
/// any other value is JSON encoded, which Terraform accepts as an HCL literal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TerraformOptions {
    /// The directory containing the root module.
    dir: PathBuf,
    /// Input variables for the module.
    vars: BTreeMap<String, Value>,
    /// Environment variables set on the engine process, on top of the inherited environment.
    env_vars: BTreeMap<String, String>,
}

impl TerraformOptions {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Default::default()
        }
    }

    pub fn with_var(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.vars.insert(name.into(), value.into());
        self
    }

    pub fn with_env_var(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.env_vars.insert(name.into(), value.into());
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn vars(&self) -> &BTreeMap<String, Value> {
        &self.vars
    }

    pub fn var(&self, name: &str) -> Option<&Value> {
        self.vars.get(name)
    }

    pub fn env_vars(&self) -> &BTreeMap<String, String> {
        &self.env_vars
    }

    /// The `-var` arguments for this module, in variable name order.
    pub(crate) fn var_args(&self) -> Vec<String> {
        self.vars
            .iter()
            .flat_map(|(name, value)| {
                ["-var".to_string(), format!("{name}={}", format_var_value(value))]
            })
            .collect()
    }
}

fn format_var_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
