//! Session commands offered to the presentation layer.
//!
//! [`Sessions`] composes the located script, its validation and a
//! [`ScriptRunner`] into one method per catalog command. Per-command execution
//! errors never tear the engine down: the derived queries fold them into
//! status values, and the command wrappers hand them back to the caller.

use tracing::{debug, info, instrument, warn};

use crate::core::command::{CATALOG, CatalogEntry, CommandRequest};
use crate::core::issues::{Issue, parse_issues};
use crate::core::session_info::{SessionInfo, parse_session_info};
use crate::error::SessionError;
use crate::io::config::SessionsConfig;
use crate::io::locate::{ScriptLocation, locate};
use crate::io::process::{ExecutionResult, ScriptExecutor, ScriptRunner, StreamHandle};
use crate::io::script::{ScriptCheck, validate_script};

/// Result of the status query: whether it could be determined, plus a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusReport {
    pub ok: bool,
    pub message: String,
}

/// Orchestration facade over the session script.
#[derive(Debug)]
pub struct Sessions<R = ScriptExecutor> {
    location: ScriptLocation,
    runner: R,
}

impl Sessions<ScriptExecutor> {
    /// Locate the script from the current directory and build an executor for it.
    ///
    /// Fails with `NotFound` when no ancestor holds the script.
    pub fn discover(config: &SessionsConfig) -> Result<Self, SessionError> {
        let location = locate(&config.script)?;
        info!(root = %location.project_root().display(), "session script located");
        let executor = ScriptExecutor::new(location.clone()).with_timeout(config.command_timeout());
        Ok(Self::new(location, executor))
    }

    /// Run any script command with live output.
    pub fn stream(&self, request: &CommandRequest) -> Result<StreamHandle, SessionError> {
        self.runner.run_streaming(request)
    }
}

impl<R: ScriptRunner> Sessions<R> {
    pub fn new(location: ScriptLocation, runner: R) -> Self {
        Self { location, runner }
    }

    pub fn location(&self) -> &ScriptLocation {
        &self.location
    }

    pub fn runner(&self) -> &R {
        &self.runner
    }

    pub fn project_name(&self) -> String {
        self.location.project_name()
    }

    pub fn catalog(&self) -> &'static [CatalogEntry] {
        CATALOG
    }

    pub fn validate(&self) -> ScriptCheck {
        validate_script(&self.location)
    }

    pub fn run(&self, request: &CommandRequest) -> Result<ExecutionResult, SessionError> {
        self.runner.run_blocking(request)
    }

    pub fn start_session(&self, description: &str) -> Result<ExecutionResult, SessionError> {
        self.run(&CommandRequest::start(description))
    }

    pub fn add_note(&self, text: &str) -> Result<ExecutionResult, SessionError> {
        self.run(&CommandRequest::note(text))
    }

    pub fn session_context(&self) -> Result<ExecutionResult, SessionError> {
        self.run(&CommandRequest::context())
    }

    /// End the active session; an empty `closing_note` is not passed on.
    pub fn end_session(&self, closing_note: &str) -> Result<ExecutionResult, SessionError> {
        self.run(&CommandRequest::end(closing_note))
    }

    pub fn commit_and_close(&self, message: &str) -> Result<ExecutionResult, SessionError> {
        self.run(&CommandRequest::commit(message))
    }

    pub fn list_issues(&self) -> Result<ExecutionResult, SessionError> {
        self.run(&CommandRequest::list_issues())
    }

    /// `list-issues`, parsed into records. A non-zero exit is an error here.
    pub fn issues(&self) -> Result<Vec<Issue>, SessionError> {
        let result = self.list_issues()?.into_checked()?;
        Ok(parse_issues(&result.output))
    }

    /// Start a session letting the script pick the issue interactively.
    pub fn start_with_issue(&self, branch_name: &str) -> Result<ExecutionResult, SessionError> {
        self.run(&CommandRequest::issue(branch_name))
    }

    pub fn start_with_issue_direct(
        &self,
        branch_name: &str,
        issue_number: &str,
        issue_title: &str,
    ) -> Result<ExecutionResult, SessionError> {
        self.run(&CommandRequest::issue_direct(
            branch_name,
            issue_number,
            issue_title,
        ))
    }

    /// True when `context` exits 0. Execution errors count as "no session".
    #[instrument(skip_all)]
    pub fn has_active_session(&self) -> bool {
        match self.session_context() {
            Ok(result) => result.success(),
            Err(err) => {
                warn!(err = %err, "context query failed, assuming no active session");
                false
            }
        }
    }

    /// Parsed view of the active session.
    #[instrument(skip_all)]
    pub fn active_session_info(&self) -> SessionInfo {
        match self.session_context() {
            Ok(result) => {
                let info = parse_session_info(result.exit_code, &result.output);
                if info.is_active() && !info.missing_fields().is_empty() {
                    debug!(missing = ?info.missing_fields(), "context output lacks some fields");
                }
                info
            }
            Err(err) => SessionInfo::error(err.to_string()),
        }
    }

    /// Describe the session state, with the full context when a session is active.
    #[instrument(skip_all)]
    pub fn status(&self) -> StatusReport {
        if !self.has_active_session() {
            return StatusReport {
                ok: true,
                message: "No hay sesión activa".to_string(),
            };
        }
        match self.session_context() {
            Ok(result) if result.success() => StatusReport {
                ok: true,
                message: format!("Sesión activa encontrada:\n\n{}", result.output),
            },
            Ok(result) => {
                warn!(exit_code = result.exit_code, "context failed right after succeeding");
                StatusReport {
                    ok: false,
                    message: "Error obteniendo contexto de sesión activa".to_string(),
                }
            }
            Err(err) => StatusReport {
                ok: false,
                message: format!("Error obteniendo contexto de sesión activa: {err}"),
            },
        }
    }
}
