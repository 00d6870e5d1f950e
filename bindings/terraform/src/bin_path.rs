use anyhow::Context;
use std::env;
use std::path::{Component, Path, PathBuf};

/// Environment variable that picks the Terraform binary. Either a path to the binary or the name
/// of a binary to find on `PATH`, such as `tofu`.
pub const TERRAFORM_PATH_ENV: &str = "IT_TERRAFORM_PATH";

const DEFAULT_BINARY: &str = "terraform";

/// Resolve the Terraform binary from [TERRAFORM_PATH_ENV], falling back to `terraform` on `PATH`.
pub fn terraform_path() -> anyhow::Result<PathBuf> {
    let requested = env::var(TERRAFORM_PATH_ENV).ok();
    match requested.as_deref() {
        None => find_on_path(DEFAULT_BINARY),
        Some("") => anyhow::bail!("'{TERRAFORM_PATH_ENV}' is set but empty"),
        Some(value) if is_bare_name(value) => find_on_path(value),
        Some(value) => {
            let path = PathBuf::from(value);
            anyhow::ensure!(
                path.is_file(),
                "'{TERRAFORM_PATH_ENV}={value}' does not point at a file"
            );
            Ok(path)
        }
    }
}

/// A value with no directory component names a binary rather than a location.
fn is_bare_name(value: &str) -> bool {
    let mut components = Path::new(value).components();
    matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    )
}

fn find_on_path(name: &str) -> anyhow::Result<PathBuf> {
    log::debug!("Looking for '{name}' on 'PATH'");
    which::which(name).with_context(|| {
        format!("Could not find '{name}' on 'PATH', install it or set '{TERRAFORM_PATH_ENV}'")
    })
}
