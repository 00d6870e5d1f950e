use std::path::{Path, PathBuf};

use anyhow::Context;
use walkdir::WalkDir;

/// Which transient files to remove from a working tree once a run has finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CleanupRules {
    /// Directories that are never entered, matched by file name.
    pub skip_dirs: Vec<String>,
    /// Directories that are removed with all of their contents, matched by file name.
    pub remove_dirs: Vec<String>,
    /// Files that are removed, matched by file name.
    pub remove_files: Vec<String>,
}

impl Default for CleanupRules {
    fn default() -> Self {
        Self {
            skip_dirs: vec!["vendor".to_string()],
            remove_dirs: vec![".terraform".to_string()],
            remove_files: vec![
                "terraform.tfstate".to_string(),
                "terraform.tfplan".to_string(),
                "terraform.tfstate.backup".to_string(),
            ],
        }
    }
}

#[derive(Debug, Default)]
pub struct CleanupReport {
    removed: Vec<PathBuf>,
}

impl CleanupReport {
    pub fn removed(&self) -> &[PathBuf] {
        &self.removed
    }
}

/// Walk the tree under `root` and remove everything the `rules` match.
///
/// Each removal is printed. The walk stops at the first entry that cannot be read or removed.
pub fn clean_working_tree(root: &Path, rules: &CleanupRules) -> anyhow::Result<CleanupReport> {
    let mut report = CleanupReport::default();

    let mut walker = WalkDir::new(root).min_depth(1).into_iter();
    while let Some(entry) = walker.next() {
        let entry = entry.with_context(|| format!("Failed to walk '{}'", root.display()))?;
        let name = entry.file_name().to_string_lossy();

        if entry.file_type().is_dir() {
            if rules.skip_dirs.iter().any(|d| *d == name) {
                walker.skip_current_dir();
                continue;
            }

            if rules.remove_dirs.iter().any(|d| *d == name) {
                walker.skip_current_dir();
                std::fs::remove_dir_all(entry.path()).with_context(|| {
                    format!("Failed to remove directory '{}'", entry.path().display())
                })?;
                println!("Removed {:?}", entry.path());
                report.removed.push(entry.into_path());
            }
        } else if rules.remove_files.iter().any(|f| *f == name) {
            std::fs::remove_file(entry.path())
                .with_context(|| format!("Failed to remove file '{}'", entry.path().display()))?;
            println!("Removed {:?}", entry.path());
            report.removed.push(entry.into_path());
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn touch(path: &Path) {
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "{}").unwrap();
    }

    #[test]
    fn removes_transient_files_and_keeps_the_rest() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        touch(&root.join("main.tf"));
        touch(&root.join("terraform.tfstate"));
        touch(&root.join("terraform.tfstate.backup"));
        touch(&root.join(".terraform/providers/google/lock"));
        touch(&root.join("modules/gke/terraform.tfplan"));
        touch(&root.join("modules/gke/variables.tf"));

        let report = clean_working_tree(root, &CleanupRules::default()).unwrap();

        assert_eq!(4, report.removed().len());
        assert!(root.join("main.tf").exists());
        assert!(root.join("modules/gke/variables.tf").exists());
        assert!(!root.join("terraform.tfstate").exists());
        assert!(!root.join("terraform.tfstate.backup").exists());
        assert!(!root.join(".terraform").exists());
        assert!(!root.join("modules/gke/terraform.tfplan").exists());
    }

    #[test]
    fn vendor_is_never_visited() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        touch(&root.join("vendor/module/terraform.tfstate"));
        touch(&root.join("vendor/module/.terraform/lock"));

        let report = clean_working_tree(root, &CleanupRules::default()).unwrap();

        assert!(report.removed().is_empty());
        assert!(root.join("vendor/module/terraform.tfstate").exists());
        assert!(root.join("vendor/module/.terraform/lock").exists());
    }

    #[test]
    fn custom_rules() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path();

        touch(&root.join("cache/data"));
        touch(&root.join("plan.out"));
        touch(&root.join("terraform.tfstate"));

        let rules = CleanupRules {
            skip_dirs: vec![],
            remove_dirs: vec!["cache".to_string()],
            remove_files: vec!["plan.out".to_string()],
        };
        clean_working_tree(root, &rules).unwrap();

        assert!(!root.join("cache").exists());
        assert!(!root.join("plan.out").exists());
        assert!(root.join("terraform.tfstate").exists());
    }
}
