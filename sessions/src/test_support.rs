//! Test-only helpers: stub projects on disk and scripted runners.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tempfile::TempDir;

use crate::core::command::CommandRequest;
use crate::error::SessionError;
use crate::io::config::ScriptConfig;
use crate::io::locate::ScriptLocation;
use crate::io::process::{ExecutionResult, ScriptExecutor, ScriptRunner};
use crate::session::Sessions;

/// Stand-in for `sessions.sh` that keeps its state in `.sessions/` relative
/// to the working directory, so it only behaves when run from the project root.
pub const SESSION_STUB: &str = r#"#!/bin/sh
state=.sessions/active.md

require_session() {
  if [ ! -f "$state" ]; then
    echo "No hay sesión activa" >&2
    exit 1
  fi
}

case "$1" in
  start)
    if [ -f "$state" ]; then
      echo "Ya existe una sesión activa" >&2
      exit 1
    fi
    mkdir -p .sessions
    printf '# Sesión: %s\n**Inicio:** 10:00\n**Descripción:** %s\n' "sesion-1" "$3" > "$state"
    echo "Sesión iniciada: $3"
    ;;
  note)
    require_session
    printf '%s %s\n' "-" "$2" >> "$state"
    echo "Nota añadida"
    ;;
  context)
    require_session
    cat "$state"
    ;;
  end)
    require_session
    rm "$state"
    echo "Sesión finalizada${3:+: $3}"
    ;;
  commit)
    require_session
    rm "$state"
    echo "Commit: $2"
    ;;
  list-issues)
    printf '12|Fix login flow\n7|Add dark mode\n'
    ;;
  issue)
    echo "Selección interactiva para $2"
    ;;
  issue-direct)
    mkdir -p .sessions
    printf '# Sesión: %s\n**Inicio:** 10:00\n**Descripción:** #%s %s\n' "$2" "$3" "$4" > "$state"
    echo "Sesión iniciada en $2 con issue #$3"
    ;;
  *)
    echo "Comando desconocido: $1" >&2
    exit 2
    ;;
esac
"#;

/// Temporary project root with a `scripts/` folder.
pub struct TestProject {
    temp: TempDir,
    location: ScriptLocation,
}

impl TestProject {
    /// Empty project: `scripts/` exists but holds no script yet.
    pub fn new() -> Result<Self> {
        let temp = tempfile::tempdir().context("create tempdir")?;
        let location = ScriptLocation::new(temp.path(), &ScriptConfig::default());
        let scripts_dir = temp.path().join(&ScriptConfig::default().subfolder);
        fs::create_dir_all(&scripts_dir)
            .with_context(|| format!("create {}", scripts_dir.display()))?;
        Ok(Self { temp, location })
    }

    /// Project whose script is the stateful [`SESSION_STUB`].
    pub fn with_session_stub() -> Result<Self> {
        Self::with_script(SESSION_STUB)
    }

    /// Project whose script has the given contents, marked executable.
    pub fn with_script(contents: &str) -> Result<Self> {
        let project = Self::new()?;
        project.write_script(contents)?;
        Ok(project)
    }

    pub fn root(&self) -> &Path {
        self.temp.path()
    }

    pub fn location(&self) -> &ScriptLocation {
        &self.location
    }

    pub fn executor(&self) -> ScriptExecutor {
        ScriptExecutor::new(self.location.clone())
    }

    pub fn sessions(&self) -> Sessions {
        Sessions::new(self.location.clone(), self.executor())
    }

    /// Create a nested directory under the root.
    pub fn subdir(&self, relative: &str) -> Result<PathBuf> {
        let dir = self.root().join(relative);
        fs::create_dir_all(&dir).with_context(|| format!("create {}", dir.display()))?;
        Ok(dir)
    }

    pub fn write_script(&self, contents: &str) -> Result<()> {
        let path = self.location.script_path();
        fs::write(path, contents).with_context(|| format!("write {}", path.display()))?;
        self.set_mode(0o755)
    }

    #[cfg(unix)]
    pub fn set_mode(&self, mode: u32) -> Result<()> {
        use std::os::unix::fs::PermissionsExt;

        let path = self.location.script_path();
        fs::set_permissions(path, fs::Permissions::from_mode(mode))
            .with_context(|| format!("chmod {}", path.display()))
    }

    #[cfg(not(unix))]
    pub fn set_mode(&self, _mode: u32) -> Result<()> {
        Ok(())
    }
}

/// Predetermined outcome for one [`ScriptedRunner`] call.
#[derive(Debug)]
pub enum ScriptedStep {
    Exit(ExecutionResult),
    SpawnFailure,
}

impl ScriptedStep {
    pub fn exit(exit_code: i32, output: &str) -> Self {
        Self::Exit(ExecutionResult {
            exit_code,
            output: output.to_string(),
        })
    }

    pub fn spawn_failure() -> Self {
        Self::SpawnFailure
    }
}

/// Runner that replays queued outcomes and records every request.
///
/// Running past the end of the queue behaves like a spawn failure.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    steps: RefCell<VecDeque<ScriptedStep>>,
    calls: RefCell<Vec<CommandRequest>>,
}

impl ScriptedRunner {
    pub fn new(steps: Vec<ScriptedStep>) -> Self {
        Self {
            steps: RefCell::new(steps.into()),
            calls: RefCell::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<CommandRequest> {
        self.calls.borrow().clone()
    }
}

impl ScriptRunner for ScriptedRunner {
    fn run_blocking(&self, request: &CommandRequest) -> Result<ExecutionResult, SessionError> {
        self.calls.borrow_mut().push(request.clone());
        match self.steps.borrow_mut().pop_front() {
            Some(ScriptedStep::Exit(result)) => Ok(result),
            Some(ScriptedStep::SpawnFailure) | None => Err(SessionError::SpawnFailed {
                program: PathBuf::from("scripts/sessions.sh"),
                source: io::Error::new(io::ErrorKind::NotFound, "scripted spawn failure"),
            }),
        }
    }
}
