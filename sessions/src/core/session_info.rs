//! Best-effort extraction of session state from `sessions.sh context` output.
//!
//! A non-zero exit from `context` means "no active session". Field markers
//! are matched as line prefixes; anything else is ignored.

use serde::Serialize;

/// Prefix of the line carrying the session name.
pub const NAME_MARKER: &str = "# Sesión:";
/// Prefix of the line carrying the start time.
pub const START_TIME_MARKER: &str = "**Inicio:**";
/// Prefix of the line carrying the description.
pub const DESCRIPTION_MARKER: &str = "**Descripción:**";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Active,
    Inactive,
    Error,
}

/// Structured view of the active session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionInfo {
    pub status: SessionStatus,
    pub raw_content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

impl SessionInfo {
    pub fn inactive() -> Self {
        Self {
            status: SessionStatus::Inactive,
            raw_content: String::new(),
            name: None,
            start_time: None,
            description: None,
            error_message: None,
        }
    }

    /// Session state when the context query could not be executed at all.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            status: SessionStatus::Error,
            error_message: Some(message.into()),
            ..Self::inactive()
        }
    }

    pub fn is_active(&self) -> bool {
        self.status == SessionStatus::Active
    }

    /// Names of optional fields the output did not provide.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.name.is_none() {
            missing.push("name");
        }
        if self.start_time.is_none() {
            missing.push("start_time");
        }
        if self.description.is_none() {
            missing.push("description");
        }
        missing
    }
}

/// Interpret the exit code and output of the `context` command.
pub fn parse_session_info(exit_code: i32, output: &str) -> SessionInfo {
    if exit_code != 0 {
        return SessionInfo::inactive();
    }

    let content = output.trim();
    let mut info = SessionInfo {
        status: SessionStatus::Active,
        raw_content: content.to_string(),
        ..SessionInfo::inactive()
    };
    for line in content.lines() {
        if let Some(value) = field_value(line, NAME_MARKER) {
            info.name = Some(value);
        } else if let Some(value) = field_value(line, START_TIME_MARKER) {
            info.start_time = Some(value);
        } else if let Some(value) = field_value(line, DESCRIPTION_MARKER) {
            info.description = Some(value);
        }
    }
    info
}

fn field_value(line: &str, marker: &str) -> Option<String> {
    line.strip_prefix(marker).map(|rest| rest.trim().to_string())
}
