mod error;
mod shutdown;
mod teardown;

pub mod prelude {
    pub use crate::error::{
        FatalSetupError, MissingOutputError, NoEligibleRegionError, ScenarioAssertionError,
        TeardownError,
    };
    pub use crate::shutdown::{ShutdownHandle, ShutdownListener, ShutdownReason, ShutdownSignalError};
    pub use crate::teardown::{TeardownGuard, TeardownOutcome};
}
