//! Sends a real signal to the test process, so it lives in its own test binary where no other run
//! has a signal listener installed.
#![cfg(unix)]

use std::path::PathBuf;
use std::process::Command;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use infra_tunnel_runner::prelude::{
    run, HookResult, InfraTunnelCli, RunnerContext, ScenarioContext, ScenarioOutcome,
    SuiteDefinitionBuilder, UserValuesConstraint,
};
use pretty_assertions::assert_eq;

#[derive(Default, Debug)]
struct RunnerValue;

impl UserValuesConstraint for RunnerValue {}

static TEARDOWNS: AtomicUsize = AtomicUsize::new(0);

fn scenario(_ctx: &mut ScenarioContext<RunnerValue>) -> HookResult {
    Ok(())
}

fn teardown_interrupted_by_sigint(ctx: &RunnerContext<RunnerValue>) -> HookResult {
    TEARDOWNS.fetch_add(1, Ordering::SeqCst);

    let mut listener = ctx.new_shutdown_listener();
    let status = Command::new("kill")
        .args(["-INT", &std::process::id().to_string()])
        .status()?;
    anyhow::ensure!(status.success(), "kill exited with {status}");

    let deadline = Instant::now() + Duration::from_secs(10);
    while !listener.should_shutdown() {
        anyhow::ensure!(Instant::now() < deadline, "signal was never broadcast");
        std::thread::sleep(Duration::from_millis(20));
    }

    Ok(())
}

#[test]
fn sigint_during_final_teardown_marks_the_run_interrupted() {
    let cli = InfraTunnelCli {
        working_dir: PathBuf::from("."),
        scenarios: vec![],
        deny_regions: vec![],
        no_progress: true,
        keep_artifacts: true,
        run_id: None,
        run_summary: PathBuf::from("run_summary.jsonl"),
        no_run_summary: true,
    };

    let suite = SuiteDefinitionBuilder::new("sigint_during_teardown", cli, RunnerValue)
        .use_scenario("passes", scenario)
        .use_teardown(teardown_interrupted_by_sigint);

    let outcome = run(suite).unwrap();

    assert_eq!(1, TEARDOWNS.load(Ordering::SeqCst));
    assert_eq!(Some(&ScenarioOutcome::Passed), outcome.outcome("passes"));
    assert!(outcome.interrupted());
    assert!(outcome.into_result().is_err());
}
