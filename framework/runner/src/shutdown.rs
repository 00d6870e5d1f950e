use std::sync::Arc;

use infra_tunnel_core::prelude::{ShutdownReason, TeardownOutcome};

use crate::context::UserValuesConstraint;
use crate::lifecycle::Lifecycle;

/// Listen for interrupt and terminate signals for the rest of the run.
///
/// On a signal, the shutdown is broadcast so that no new scenarios start, then the full teardown
/// runs and the process exits with status 1. If teardown had already been started by the run, the
/// listener waits for it to finish and leaves the exit status to the run, which sees the broadcast
/// shutdown and reports itself as interrupted.
pub(crate) fn start_shutdown_listener<RV: UserValuesConstraint>(
    runtime: &tokio::runtime::Runtime,
    lifecycle: Arc<Lifecycle<RV>>,
) -> anyhow::Result<()> {
    // Signal streams have to be registered inside the runtime.
    let _guard = runtime.enter();
    let mut signals = Signals::register()?;

    runtime.spawn(async move {
        let reason = signals.recv().await;

        lifecycle.context().shutdown_handle().shutdown(reason);
        println!("Received {reason} signal, tearing down...");

        let teardown_lifecycle = lifecycle.clone();
        match tokio::task::spawn_blocking(move || teardown_lifecycle.teardown()).await {
            Ok(TeardownOutcome::Ran(())) => log::info!("Teardown after {reason} complete"),
            Ok(TeardownOutcome::AlreadyDone) => {
                log::info!("Teardown had already started when {reason} was received");
                return;
            }
            Err(e) => log::error!("Teardown after {reason} failed: {e:?}"),
        }

        std::process::exit(1);
    });

    Ok(())
}

#[cfg(unix)]
struct Signals {
    interrupt: tokio::signal::unix::Signal,
    terminate: tokio::signal::unix::Signal,
}

#[cfg(unix)]
impl Signals {
    fn register() -> anyhow::Result<Self> {
        use anyhow::Context;
        use tokio::signal::unix::{signal, SignalKind};

        Ok(Self {
            interrupt: signal(SignalKind::interrupt())
                .context("Failed to install SIGINT handler")?,
            terminate: signal(SignalKind::terminate())
                .context("Failed to install SIGTERM handler")?,
        })
    }

    async fn recv(&mut self) -> ShutdownReason {
        tokio::select! {
            _ = self.interrupt.recv() => ShutdownReason::Interrupt,
            _ = self.terminate.recv() => ShutdownReason::Terminate,
        }
    }
}

#[cfg(not(unix))]
struct Signals;

#[cfg(not(unix))]
impl Signals {
    fn register() -> anyhow::Result<Self> {
        Ok(Self)
    }

    async fn recv(&mut self) -> ShutdownReason {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("Failed to listen for Ctrl-C: {e:?}");
            // Without a signal there is nothing to react to.
            std::future::pending::<()>().await;
        }
        ShutdownReason::Interrupt
    }
}
