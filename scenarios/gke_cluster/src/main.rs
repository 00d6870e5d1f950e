use terraform_tunnel_runner::prelude::*;

/// Messages that the input validation in the `assertions` module must produce.
const EXPECTED_ASSERTIONS: [&str; 3] = [
    "'s generated name is too long",
    "does not match regex",
    "ETCD Database Encryption Key specified",
];

const ENDPOINT_OUTPUT: &str = "gke.gke_cluster_endpoint";

fn ut_assertions(ctx: &mut ScenarioContext<TerraformRunnerContext>) -> HookResult {
    run_scenario(
        ctx,
        &ScenarioSpec::new(
            "assertions",
            SubnetRole::Asserts,
            ScenarioMode::PlanOnly(PlanExpectation::fails_with(EXPECTED_ASSERTIONS)),
        ),
    )
}

fn ut_defaults(ctx: &mut ScenarioContext<TerraformRunnerContext>) -> HookResult {
    run_scenario(
        ctx,
        &ScenarioSpec::new(
            "defaults",
            SubnetRole::Nodes,
            ScenarioMode::PlanOnly(PlanExpectation::Succeeds),
        ),
    )
}

fn ut_overrides(ctx: &mut ScenarioContext<TerraformRunnerContext>) -> HookResult {
    run_scenario(
        ctx,
        &ScenarioSpec::new(
            "overrides",
            SubnetRole::Nodes,
            ScenarioMode::PlanOnly(PlanExpectation::Succeeds),
        ),
    )
}

fn it_defaults(ctx: &mut ScenarioContext<TerraformRunnerContext>) -> HookResult {
    run_scenario(
        ctx,
        &ScenarioSpec::new(
            "defaults",
            SubnetRole::Nodes,
            ScenarioMode::FullCycle {
                output_path: ENDPOINT_OUTPUT.to_string(),
            },
        ),
    )
}

fn it_overrides(ctx: &mut ScenarioContext<TerraformRunnerContext>) -> HookResult {
    run_scenario(
        ctx,
        &ScenarioSpec::new(
            "overrides",
            SubnetRole::Nodes,
            ScenarioMode::FullCycle {
                output_path: ENDPOINT_OUTPUT.to_string(),
            },
        ),
    )
}

fn main() -> InfraTunnelResult<()> {
    let builder = TerraformSuiteDefinitionBuilder::new_with_init(env!("CARGO_PKG_NAME"))?
        .into_std()
        .record_env(PROJECT_OVERRIDE_ENV)
        .use_scenario("ut_assertions", ut_assertions)
        .use_scenario("ut_defaults", ut_defaults)
        .use_scenario("ut_overrides", ut_overrides)
        .use_scenario("it_defaults", it_defaults)
        .use_scenario("it_overrides", it_overrides);

    run(builder)?.into_result()
}
