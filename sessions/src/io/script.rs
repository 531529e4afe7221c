//! Runnability checks for the located session script.

use std::fmt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::SessionError;
use crate::io::locate::ScriptLocation;

/// Outcome of validating the session script. Never an error by itself.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptCheck {
    Valid { script: PathBuf },
    Missing { script: PathBuf },
    NotExecutable { script: PathBuf },
}

impl ScriptCheck {
    pub fn is_valid(&self) -> bool {
        matches!(self, Self::Valid { .. })
    }

    /// Human-readable message for the `(valid, message)` pair.
    pub fn message(&self) -> String {
        self.to_string()
    }

    /// Convert an invalid check into `ValidationFailed`.
    pub fn into_result(self) -> Result<(), SessionError> {
        if self.is_valid() {
            Ok(())
        } else {
            Err(SessionError::ValidationFailed(self.message()))
        }
    }
}

impl fmt::Display for ScriptCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Valid { script } => write!(f, "Script {} válido", file_name(script)),
            Self::Missing { script } => write!(
                f,
                "Script {} no encontrado en {}",
                file_name(script),
                script.display()
            ),
            Self::NotExecutable { script } => write!(
                f,
                "Script {} no es ejecutable: {}",
                file_name(script),
                script.display()
            ),
        }
    }
}

/// Check that the script still exists and is executable for this user.
///
/// Existence is re-checked because the file may have been removed since it
/// was located.
pub fn validate_script(location: &ScriptLocation) -> ScriptCheck {
    let script = location.script_path().to_path_buf();
    let check = if !script.is_file() {
        ScriptCheck::Missing { script }
    } else if !is_executable(&script) {
        ScriptCheck::NotExecutable { script }
    } else {
        ScriptCheck::Valid { script }
    };
    debug!(valid = check.is_valid(), "validated session script");
    check
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use nix::unistd::{AccessFlags, access};

    access(path, AccessFlags::X_OK).is_ok()
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default()
}
