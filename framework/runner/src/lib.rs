mod cleanup;
mod cli;
mod context;
mod definition;
mod identity;
mod init;
mod lifecycle;
mod progress;
mod run;
mod shutdown;
mod types;

pub mod prelude {
    pub use crate::cleanup::{clean_working_tree, CleanupReport, CleanupRules};
    pub use crate::cli::InfraTunnelCli;
    pub use crate::context::{RunnerContext, ScenarioContext, UserValuesConstraint};
    pub use crate::definition::{HookResult, SuiteDefinitionBuilder};
    pub use crate::identity::{RunIdentity, DEFAULT_DENIED_REGIONS};
    pub use crate::init::init;
    pub use crate::lifecycle::LifecycleState;
    pub use crate::run::{run, RunOutcome, ScenarioOutcome};
    pub use crate::types::InfraTunnelResult;

    /// Re-export of the `infra_tunnel_core` prelude.
    pub use infra_tunnel_core::prelude::*;
}
