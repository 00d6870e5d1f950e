use crate::cleanup::CleanupRules;
use crate::cli::InfraTunnelCli;
use crate::context::{RunnerContext, ScenarioContext, UserValuesConstraint};
use crate::init::init;

pub type HookResult = anyhow::Result<()>;

pub type GlobalHook<RV> = fn(&RunnerContext<RV>) -> HookResult;
pub type ScenarioHook<RV> = fn(&mut ScenarioContext<RV>) -> HookResult;

/// The builder for a suite definition.
///
/// This must be used at the start of a test binary to define the suite that you want to run.
pub struct SuiteDefinitionBuilder<RV: UserValuesConstraint> {
    /// The name of the suite, which is used in logs and in the run summary.
    ///
    /// Recommended value is `env!("CARGO_PKG_NAME")`.
    name: String,
    /// This value is initialised for you and you cannot change it.
    #[doc(hidden)]
    cli: InfraTunnelCli,
    /// The runner value, shared with every hook through the [RunnerContext].
    value: RV,
    /// Global setup hook for this suite. It is run once, before any scenarios are started. An
    /// error from this hook is fatal to the run.
    setup_fn: Option<GlobalHook<RV>>,
    /// The scenarios in this suite, in the order they were registered.
    scenarios: Vec<(String, ScenarioHook<RV>)>,
    /// Global teardown hook for this suite. It is run once, after the scenarios or when the run
    /// is interrupted. This hook is best effort and its errors are only logged.
    teardown_fn: Option<GlobalHook<RV>>,
    cleanup_rules: CleanupRules,
    /// Environment variables to capture in the run summary.
    recorded_env: Vec<String>,
}

pub(crate) struct SuiteDefinition<RV: UserValuesConstraint> {
    pub(crate) name: String,
    pub(crate) cli: InfraTunnelCli,
    pub(crate) value: RV,
    pub(crate) setup_fn: Option<GlobalHook<RV>>,
    pub(crate) scenarios: Vec<(String, ScenarioHook<RV>)>,
    pub(crate) teardown_fn: Option<GlobalHook<RV>>,
    /// `None` when transient files should be kept.
    pub(crate) cleanup_rules: Option<CleanupRules>,
    pub(crate) recorded_env: Vec<String>,
}

impl<RV: UserValuesConstraint> SuiteDefinitionBuilder<RV> {
    /// Initialise a new suite definition from the suite name, command line arguments and runner
    /// value. See the [SuiteDefinitionBuilder::name] for more information about the name.
    pub fn new(name: &str, cli: InfraTunnelCli, value: RV) -> Self {
        Self {
            name: name.to_string(),
            cli,
            value,
            setup_fn: None,
            scenarios: Vec::new(),
            teardown_fn: None,
            cleanup_rules: CleanupRules::default(),
            recorded_env: Vec::new(),
        }
    }

    /// Initialise logging and parse the command line before creating the definition.
    pub fn new_with_init(name: &str, value: RV) -> Self {
        Self::new(name, init(), value)
    }

    pub fn cli(&self) -> &InfraTunnelCli {
        &self.cli
    }

    /// Set the global setup hook [SuiteDefinitionBuilder::setup_fn] for this suite.
    pub fn use_setup(mut self, setup_fn: GlobalHook<RV>) -> Self {
        self.setup_fn = Some(setup_fn);
        self
    }

    /// Add a scenario to this suite.
    ///
    /// Panics if a scenario with the same name has already been added.
    pub fn use_scenario(mut self, name: &str, scenario: ScenarioHook<RV>) -> Self {
        if self.scenarios.iter().any(|(n, _)| n == name) {
            panic!("Scenario [{}] is already defined", name);
        }

        self.scenarios.push((name.to_string(), scenario));
        self
    }

    /// Set the global teardown hook [SuiteDefinitionBuilder::teardown_fn] for this suite.
    pub fn use_teardown(mut self, teardown_fn: GlobalHook<RV>) -> Self {
        self.teardown_fn = Some(teardown_fn);
        self
    }

    /// Replace the default [CleanupRules].
    pub fn with_cleanup_rules(mut self, rules: CleanupRules) -> Self {
        self.cleanup_rules = rules;
        self
    }

    /// Capture the value of an environment variable in the run summary.
    pub fn record_env(mut self, key: &str) -> Self {
        self.recorded_env.push(key.to_string());
        self
    }

    pub(crate) fn build(self) -> anyhow::Result<SuiteDefinition<RV>> {
        for selected in &self.cli.scenarios {
            if !self.scenarios.iter().any(|(name, _)| name == selected) {
                anyhow::bail!(
                    "Unknown scenario [{}], available scenarios are {:?}",
                    selected,
                    self.scenarios
                        .iter()
                        .map(|(name, _)| name.as_str())
                        .collect::<Vec<_>>()
                );
            }
        }

        let cleanup_rules = if self.cli.keep_artifacts {
            None
        } else {
            Some(self.cleanup_rules)
        };

        Ok(SuiteDefinition {
            name: self.name,
            cli: self.cli,
            value: self.value,
            setup_fn: self.setup_fn,
            scenarios: self.scenarios,
            teardown_fn: self.teardown_fn,
            cleanup_rules,
            recorded_env: self.recorded_env,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Debug)]
    struct Values;

    impl UserValuesConstraint for Values {}

    fn scenario(_ctx: &mut ScenarioContext<Values>) -> HookResult {
        Ok(())
    }

    fn cli(args: &[&str]) -> InfraTunnelCli {
        InfraTunnelCli::parse_from(std::iter::once("suite").chain(args.iter().copied()))
    }

    #[test]
    fn scenarios_keep_registration_order() {
        let definition = SuiteDefinitionBuilder::new("suite", cli(&[]), Values)
            .use_scenario("b", scenario)
            .use_scenario("a", scenario)
            .use_scenario("c", scenario)
            .build()
            .unwrap();

        let names = definition
            .scenarios
            .iter()
            .map(|(name, _)| name.as_str())
            .collect::<Vec<_>>();
        assert_eq!(vec!["b", "a", "c"], names);
        assert!(definition.cli.is_selected("a"));
    }

    #[test]
    #[should_panic(expected = "Scenario [a] is already defined")]
    fn duplicate_scenario_panics() {
        let _ = SuiteDefinitionBuilder::new("suite", cli(&[]), Values)
            .use_scenario("a", scenario)
            .use_scenario("a", scenario);
    }

    #[test]
    fn filter_selects_scenarios() {
        let definition = SuiteDefinitionBuilder::new("suite", cli(&["-s", "b"]), Values)
            .use_scenario("a", scenario)
            .use_scenario("b", scenario)
            .build()
            .unwrap();

        assert!(definition.cli.is_selected("b"));
        assert!(!definition.cli.is_selected("a"));
    }

    #[test]
    fn unknown_filter_is_rejected() {
        let result = SuiteDefinitionBuilder::new("suite", cli(&["-s", "missing"]), Values)
            .use_scenario("a", scenario)
            .build();

        let err = result.err().unwrap();
        assert!(err.to_string().contains("Unknown scenario [missing]"));
    }

    #[test]
    fn keep_artifacts_disables_cleanup() {
        let definition = SuiteDefinitionBuilder::new("suite", cli(&["--keep-artifacts"]), Values)
            .build()
            .unwrap();
        assert!(definition.cleanup_rules.is_none());

        let definition = SuiteDefinitionBuilder::new("suite", cli(&[]), Values)
            .build()
            .unwrap();
        assert_eq!(Some(CleanupRules::default()), definition.cleanup_rules);
    }
}
