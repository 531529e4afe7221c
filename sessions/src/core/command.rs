//! Command vocabulary understood by `sessions.sh`.
//!
//! The catalog order is the order commands are offered to users. Argument
//! assembly for every command lives here so a change in the script's
//! vocabulary is a one-place fix.

use std::fmt;

use serde::Serialize;

/// Commands the session script accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum CommandKind {
    Start,
    ListIssues,
    IssueDirect,
    Issue,
    Note,
    Context,
    End,
    Commit,
}

/// One catalog row: identifier plus a human-readable description.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CatalogEntry {
    pub kind: CommandKind,
    pub description: &'static str,
}

/// Ordered, read-only catalog of session commands.
pub const CATALOG: &[CatalogEntry] = &[
    CatalogEntry {
        kind: CommandKind::Start,
        description: "Iniciar una nueva sesión de trabajo",
    },
    CatalogEntry {
        kind: CommandKind::ListIssues,
        description: "Listar issues disponibles de GitHub",
    },
    CatalogEntry {
        kind: CommandKind::IssueDirect,
        description: "Iniciar sesión con issue específico",
    },
    CatalogEntry {
        kind: CommandKind::Issue,
        description: "Iniciar sesión seleccionando issue interactivamente",
    },
    CatalogEntry {
        kind: CommandKind::Note,
        description: "Añadir una nota a la sesión activa",
    },
    CatalogEntry {
        kind: CommandKind::Context,
        description: "Ver el contexto y notas de la sesión activa",
    },
    CatalogEntry {
        kind: CommandKind::End,
        description: "Finalizar la sesión activa",
    },
    CatalogEntry {
        kind: CommandKind::Commit,
        description: "Hacer commit y cerrar sesión",
    },
];

impl CommandKind {
    /// Identifier as the script spells it.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Start => "start",
            Self::ListIssues => "list-issues",
            Self::IssueDirect => "issue-direct",
            Self::Issue => "issue",
            Self::Note => "note",
            Self::Context => "context",
            Self::End => "end",
            Self::Commit => "commit",
        }
    }

    pub fn description(self) -> &'static str {
        CATALOG
            .iter()
            .find(|entry| entry.kind == self)
            .map_or("Ejecutar comando", |entry| entry.description)
    }

    pub fn parse(id: &str) -> Option<Self> {
        CATALOG
            .iter()
            .map(|entry| entry.kind)
            .find(|kind| kind.as_str() == id)
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordered argument vector for one script invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandRequest {
    args: Vec<String>,
}

impl CommandRequest {
    pub fn new<I, S>(args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    pub fn args(&self) -> &[String] {
        &self.args
    }

    pub fn start(description: &str) -> Self {
        Self::new(["start", "session", description])
    }

    pub fn note(text: &str) -> Self {
        Self::new(["note", text])
    }

    pub fn context() -> Self {
        Self::new(["context"])
    }

    /// `end session`, with the closing note only when it is non-empty.
    pub fn end(closing_note: &str) -> Self {
        if closing_note.is_empty() {
            Self::new(["end", "session"])
        } else {
            Self::new(["end", "session", closing_note])
        }
    }

    pub fn commit(message: &str) -> Self {
        Self::new(["commit", message])
    }

    pub fn list_issues() -> Self {
        Self::new(["list-issues"])
    }

    pub fn issue(branch_name: &str) -> Self {
        Self::new(["issue", branch_name])
    }

    pub fn issue_direct(branch_name: &str, issue_number: &str, issue_title: &str) -> Self {
        Self::new(["issue-direct", branch_name, issue_number, issue_title])
    }
}

impl fmt::Display for CommandRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.args.join(" "))
    }
}
