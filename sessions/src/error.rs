//! Error kinds surfaced by the session orchestration engine.
//!
//! Startup failures (`NotFound`, `ValidationFailed`) are terminal for the
//! binary. Per-command failures are returned to the facade, which converts
//! them into status values so the menu stays usable.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum SessionError {
    /// The script was not found under any ancestor of `start`.
    #[error(
        "no se encontró '{script}' dentro de la carpeta '{subfolder}' en la jerarquía de directorios superior desde {}",
        start.display()
    )]
    NotFound {
        subfolder: String,
        script: String,
        start: PathBuf,
    },

    /// The script exists but cannot be run.
    #[error("{0}")]
    ValidationFailed(String),

    /// The OS refused to start the process.
    #[error("no se pudo ejecutar {}: {source}", program.display())]
    SpawnFailed {
        program: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The process ran and reported failure.
    #[error("el comando terminó con código {code}")]
    NonZeroExit { code: i32, output: String },

    /// The child was killed by a signal or terminated by the caller.
    #[error("comando interrumpido{}", signal.map(|s| format!(" (señal {s})")).unwrap_or_default())]
    Interrupted { signal: Option<i32> },

    /// The configured command timeout elapsed; the child was killed.
    #[error("el comando excedió el tiempo límite de {0:?}")]
    TimedOut(Duration),

    #[error("error leyendo la salida del comando: {0}")]
    Io(#[from] io::Error),
}

impl SessionError {
    /// True when the process never produced an exit status of its own.
    pub fn is_execution_failure(&self) -> bool {
        matches!(
            self,
            Self::SpawnFailed { .. } | Self::Interrupted { .. } | Self::TimedOut(_) | Self::Io(_)
        )
    }
}
