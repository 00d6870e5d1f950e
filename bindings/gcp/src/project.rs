use anyhow::bail;
use std::env;

/// Environment variables that may hold the Google Cloud project id, in the order they are checked.
pub const PROJECT_ENV_VARS: [&str; 5] = [
    "GOOGLE_PROJECT",
    "GOOGLE_CLOUD_PROJECT",
    "GOOGLE_CLOUD_PROJECT_ID",
    "GCLOUD_PROJECT",
    "CLOUDSDK_CORE_PROJECT",
];

/// Get the id of the Google Cloud project to run against from the first non-empty variable in
/// [PROJECT_ENV_VARS].
pub fn project_id_from_env() -> anyhow::Result<String> {
    for name in PROJECT_ENV_VARS {
        match env::var(name) {
            Ok(value) if !value.is_empty() => {
                log::debug!("Using Google Cloud project '{value}' from '{name}'");
                return Ok(value);
            }
            _ => {}
        }
    }

    bail!(
        "No Google Cloud project configured, set one of {}",
        PROJECT_ENV_VARS.join(", ")
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_project_vars() {
        for name in PROJECT_ENV_VARS {
            env::remove_var(name);
        }
    }

    #[test]
    #[serial]
    fn fails_when_no_project_is_set() {
        clear_project_vars();

        let err = project_id_from_env().unwrap_err();

        assert!(err.to_string().contains("GOOGLE_CLOUD_PROJECT"));
    }

    #[test]
    #[serial]
    fn earlier_variables_take_precedence() {
        clear_project_vars();
        env::set_var("GCLOUD_PROJECT", "from-gcloud");
        env::set_var("GOOGLE_CLOUD_PROJECT", "from-google-cloud");

        let project_id = project_id_from_env().unwrap();
        clear_project_vars();

        assert_eq!("from-google-cloud", project_id);
    }

    #[test]
    #[serial]
    fn empty_values_are_skipped() {
        clear_project_vars();
        env::set_var("GOOGLE_PROJECT", "");
        env::set_var("CLOUDSDK_CORE_PROJECT", "from-sdk");

        let project_id = project_id_from_env().unwrap();
        clear_project_vars();

        assert_eq!("from-sdk", project_id);
    }
}
