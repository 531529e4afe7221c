//! Locate the session script by walking up from a starting directory.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crate::error::SessionError;
use crate::io::config::ScriptConfig;

/// Project root and the session script found beneath it.
///
/// `script_path` is always `project_root/<subfolder>/<name>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptLocation {
    project_root: PathBuf,
    script_path: PathBuf,
}

impl ScriptLocation {
    pub fn new(project_root: impl Into<PathBuf>, script: &ScriptConfig) -> Self {
        let project_root = project_root.into();
        let script_path = project_root.join(&script.subfolder).join(&script.name);
        Self {
            project_root,
            script_path,
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn script_path(&self) -> &Path {
        &self.script_path
    }

    /// Script path as seen from the project root, e.g. `scripts/sessions.sh`.
    pub fn relative_script_path(&self) -> &Path {
        self.script_path
            .strip_prefix(&self.project_root)
            .unwrap_or(&self.script_path)
    }

    /// Final component of the project root.
    pub fn project_name(&self) -> String {
        self.project_root
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.project_root.display().to_string())
    }
}

/// Locate the script starting from the process working directory.
pub fn locate(script: &ScriptConfig) -> Result<ScriptLocation, SessionError> {
    let cwd = std::env::current_dir()?;
    locate_from(&cwd, script)
}

/// Walk from `start` towards the filesystem root and return the first
/// directory containing `<subfolder>/<name>`.
///
/// Read-only: only existence checks are performed.
#[instrument(skip_all, fields(start = %start.display()))]
pub fn locate_from(start: &Path, script: &ScriptConfig) -> Result<ScriptLocation, SessionError> {
    let start = std::path::absolute(start)?;
    let mut candidate = start.as_path();
    loop {
        let location = ScriptLocation::new(candidate, script);
        if location.script_path().exists() {
            debug!(root = %candidate.display(), "found session script");
            return Ok(location);
        }
        match candidate.parent() {
            Some(parent) if parent != candidate => candidate = parent,
            _ => break,
        }
    }

    debug!("session script not found");
    Err(SessionError::NotFound {
        subfolder: script.subfolder.clone(),
        script: script.name.clone(),
        start,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn probe_script() -> ScriptConfig {
        ScriptConfig {
            subfolder: "scripts".to_string(),
            name: "sessions-locate-probe.sh".to_string(),
        }
    }

    fn plant_script(root: &Path, script: &ScriptConfig) {
        let dir = root.join(&script.subfolder);
        fs::create_dir_all(&dir).expect("create scripts dir");
        fs::write(dir.join(&script.name), "#!/bin/sh\n").expect("write script");
    }

    #[test]
    fn finds_script_in_start_directory() {
        let temp = tempfile::tempdir().expect("tempdir");
        let script = probe_script();
        plant_script(temp.path(), &script);

        let location = locate_from(temp.path(), &script).expect("locate");
        assert_eq!(location.project_root(), temp.path());
        assert_eq!(
            location.relative_script_path(),
            Path::new("scripts/sessions-locate-probe.sh")
        );
    }

    #[test]
    fn finds_nearest_ancestor_from_nested_directory() {
        let temp = tempfile::tempdir().expect("tempdir");
        let script = probe_script();
        plant_script(temp.path(), &script);
        let nested = temp.path().join("a").join("b").join("c");
        fs::create_dir_all(&nested).expect("nested");

        let location = locate_from(&nested, &script).expect("locate");
        assert_eq!(location.project_root(), temp.path());
        assert!(location.script_path().starts_with(location.project_root()));
    }

    #[test]
    fn nearest_ancestor_wins_over_outer_project() {
        let temp = tempfile::tempdir().expect("tempdir");
        let script = probe_script();
        plant_script(temp.path(), &script);
        let inner = temp.path().join("inner");
        plant_script(&inner, &script);
        let nested = inner.join("src");
        fs::create_dir_all(&nested).expect("nested");

        let location = locate_from(&nested, &script).expect("locate");
        assert_eq!(location.project_root(), inner);
    }

    #[test]
    fn reports_not_found_with_start_directory() {
        let temp = tempfile::tempdir().expect("tempdir");
        let script = probe_script();

        let err = locate_from(temp.path(), &script).expect_err("should fail");
        match err {
            SessionError::NotFound {
                subfolder, start, ..
            } => {
                assert_eq!(subfolder, "scripts");
                assert_eq!(start, temp.path());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn repeated_lookups_agree() {
        let temp = tempfile::tempdir().expect("tempdir");
        let script = probe_script();
        plant_script(temp.path(), &script);
        let nested = temp.path().join("x");
        fs::create_dir_all(&nested).expect("nested");

        let first = locate_from(&nested, &script).expect("first");
        let second = locate_from(&nested, &script).expect("second");
        assert_eq!(first, second);
    }

    #[test]
    fn project_name_is_root_directory_name() {
        let location = ScriptLocation::new("/work/entre-vetas", &ScriptConfig::default());
        assert_eq!(location.project_name(), "entre-vetas");
        assert_eq!(
            location.script_path(),
            Path::new("/work/entre-vetas/scripts/sessions.sh")
        );
    }
}
