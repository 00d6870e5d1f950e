mod project;
mod region;

pub mod prelude {
    pub use crate::project::{project_id_from_env, PROJECT_ENV_VARS};
    pub use crate::region::{
        pick_random_region, select_region, GcloudRegionSource, RegionSource, StaticRegionSource,
        REGION_ENV,
    };
}
