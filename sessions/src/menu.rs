//! Interactive, line-oriented session menu.
//!
//! Reads choices and answers from any `BufRead` and writes to any `Write`, so
//! the same flows run on a terminal and in tests. A failed command is reported
//! and the menu keeps going; only I/O errors on the menu's own streams end it.

use std::io::{BufRead, Write};

use anyhow::Result;
use tracing::debug;

use crate::core::command::{CATALOG, CommandKind};
use crate::core::issues::{Issue, parse_issues, suggest_branch_name};
use crate::io::config::BranchConfig;
use crate::io::process::{ExecutionResult, ScriptRunner};
use crate::session::Sessions;

const STATUS_DESCRIPTION: &str = "Ver estado actual del gestor de sesiones";

/// One selectable menu row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuAction {
    Command(CommandKind),
    Status,
}

impl MenuAction {
    /// Catalog commands followed by `status`.
    pub fn all() -> Vec<Self> {
        CATALOG
            .iter()
            .map(|entry| Self::Command(entry.kind))
            .chain(std::iter::once(Self::Status))
            .collect()
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Command(kind) => kind.as_str(),
            Self::Status => "status",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Self::Command(kind) => kind.description(),
            Self::Status => STATUS_DESCRIPTION,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Level {
    Info,
    Success,
    Warning,
    Error,
}

impl Level {
    fn tag(self) -> &'static str {
        match self {
            Self::Info => "[info]",
            Self::Success => "[ok]",
            Self::Warning => "[aviso]",
            Self::Error => "[error]",
        }
    }
}

pub struct Menu<'a, R, I, O> {
    sessions: &'a Sessions<R>,
    branch: BranchConfig,
    input: I,
    output: O,
}

impl<'a, R: ScriptRunner, I: BufRead, O: Write> Menu<'a, R, I, O> {
    pub fn new(sessions: &'a Sessions<R>, branch: BranchConfig, input: I, output: O) -> Self {
        Self {
            sessions,
            branch,
            input,
            output,
        }
    }

    /// Validate the script, print the banner and loop until the user quits or
    /// input ends. An invalid script is reported and the menu does not open.
    pub fn run(&mut self) -> Result<()> {
        let check = self.sessions.validate();
        if !check.is_valid() {
            return self.message(Level::Error, &check.message());
        }

        self.header()?;
        self.message(
            Level::Success,
            &format!(
                "Gestor de sesiones detectado en: {}",
                self.sessions.location().project_root().display()
            ),
        )?;
        self.message(Level::Info, &check.message())?;

        let actions = MenuAction::all();
        while let Some(action) = self.choose(&actions)? {
            debug!(action = action.label(), "menu action selected");
            if let Err(err) = self.handle(action) {
                self.message(
                    Level::Error,
                    &format!(
                        "Error ejecutando acción de sesión '{}': {err:#}",
                        action.label()
                    ),
                )?;
            }
        }
        self.message(Level::Info, "¡Hasta luego!")?;
        Ok(())
    }

    fn handle(&mut self, action: MenuAction) -> Result<()> {
        match action {
            MenuAction::Command(CommandKind::Start) => self.start_session(),
            MenuAction::Command(CommandKind::ListIssues) => self.list_issues(),
            MenuAction::Command(CommandKind::IssueDirect) => self.issue_direct(),
            MenuAction::Command(CommandKind::Issue) => self.issue_interactive(),
            MenuAction::Command(CommandKind::Note) => self.add_note(),
            MenuAction::Command(CommandKind::Context) => self.show_context(),
            MenuAction::Command(CommandKind::End) => self.end_session(),
            MenuAction::Command(CommandKind::Commit) => self.commit_and_close(),
            MenuAction::Status => self.show_status(),
        }
    }

    fn start_session(&mut self) -> Result<()> {
        let description = self.ask("Introduce una descripción para la nueva sesión")?;
        if description.is_empty() {
            return self.message(Level::Warning, "Descripción vacía. Sesión no iniciada.");
        }
        let result = self.sessions.start_session(&description)?;
        self.report(
            &result,
            "Sesión iniciada exitosamente",
            "Error al iniciar sesión",
        )
    }

    fn add_note(&mut self) -> Result<()> {
        if !self.require_session("No hay una sesión activa para añadir notas.")? {
            return Ok(());
        }
        let text = self.ask("Introduce el texto de la nota")?;
        if text.is_empty() {
            return self.message(Level::Warning, "Nota vacía. No se añadió nada.");
        }
        let result = self.sessions.add_note(&text)?;
        self.report(&result, "Nota añadida exitosamente", "Error al añadir nota")
    }

    fn show_context(&mut self) -> Result<()> {
        if !self.require_session("No hay una sesión activa para mostrar contexto.")? {
            return Ok(());
        }
        let result = self.sessions.session_context()?;
        if result.success() {
            self.panel("Contexto de Sesión Activa", &result.output)
        } else {
            self.failure("Error al obtener contexto", &result)
        }
    }

    fn end_session(&mut self) -> Result<()> {
        if !self.require_session("No hay una sesión activa para finalizar.")? {
            return Ok(());
        }
        if !self.confirm("¿Estás seguro de finalizar la sesión activa?")? {
            return self.message(Level::Warning, "Operación cancelada.");
        }
        let closing_note = self.ask("Introduce una nota de cierre (opcional)")?;
        let result = self.sessions.end_session(&closing_note)?;
        self.report(
            &result,
            "Sesión finalizada exitosamente",
            "Error al finalizar sesión",
        )
    }

    fn commit_and_close(&mut self) -> Result<()> {
        if !self.require_session("No hay una sesión activa para cerrar.")? {
            return Ok(());
        }
        let message = self.ask("Introduce el mensaje del commit")?;
        if message.is_empty() {
            return self.message(Level::Warning, "Mensaje de commit requerido.");
        }
        let result = self.sessions.commit_and_close(&message)?;
        self.report(&result, "Sesión cerrada con commit", "Error al cerrar sesión")
    }

    fn list_issues(&mut self) -> Result<()> {
        let result = self.sessions.list_issues()?;
        if !result.success() {
            return self.failure("Error al obtener issues", &result);
        }
        let issues = parse_issues(&result.output);
        if issues.is_empty() {
            return self.message(Level::Info, "No hay issues disponibles.");
        }
        self.issue_table(&issues)
    }

    fn issue_direct(&mut self) -> Result<()> {
        let branch_name = self.ask("Introduce el nombre de la rama")?;
        if branch_name.is_empty() {
            return self.message(Level::Warning, "Nombre de rama requerido.");
        }
        let issue_number = self.ask("Introduce el número del issue")?;
        let issue_title = self.ask("Introduce el título del issue")?;
        if issue_number.is_empty() || issue_title.is_empty() {
            return self.message(Level::Warning, "Número y título del issue son requeridos.");
        }
        let result =
            self.sessions
                .start_with_issue_direct(&branch_name, &issue_number, &issue_title)?;
        self.report(
            &result,
            "Sesión iniciada con issue",
            "Error iniciando sesión con issue",
        )
    }

    /// Pick an issue from `list-issues`, then start it through `issue-direct`.
    fn issue_interactive(&mut self) -> Result<()> {
        let result = self.sessions.list_issues()?;
        if !result.success() {
            return self.failure("Error obteniendo issues", &result);
        }
        let issues = parse_issues(&result.output);
        if issues.is_empty() {
            return self.message(Level::Warning, "No hay issues disponibles.");
        }
        self.issue_table(&issues)?;
        let choice = self.ask("Selecciona un issue (vacío para cancelar)")?;
        let Some(issue) = choice
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|index| issues.get(index))
        else {
            return self.message(Level::Warning, "Selección cancelada.");
        };

        let suggested = suggest_branch_name(issue, &self.branch.prefix, self.branch.slug_max_chars);
        let answer = self.ask(&format!("Introduce el nombre de la rama [{suggested}]"))?;
        let branch_name = if answer.is_empty() { suggested } else { answer };

        let result =
            self.sessions
                .start_with_issue_direct(&branch_name, &issue.number, &issue.title)?;
        self.report(
            &result,
            "Sesión iniciada con issue",
            "Error iniciando sesión con issue",
        )
    }

    fn show_status(&mut self) -> Result<()> {
        let report = self.sessions.status();
        if report.ok {
            self.panel("Estado de Sesiones", &report.message)
        } else {
            self.message(Level::Error, &report.message)
        }
    }

    fn require_session(&mut self, warning: &str) -> Result<bool> {
        if self.sessions.has_active_session() {
            return Ok(true);
        }
        self.message(Level::Warning, warning)?;
        Ok(false)
    }

    fn report(&mut self, result: &ExecutionResult, success: &str, failure: &str) -> Result<()> {
        if result.success() {
            self.message(Level::Success, &format!("{success}:\n{}", result.output))
        } else {
            self.failure(failure, result)
        }
    }

    fn failure(&mut self, label: &str, result: &ExecutionResult) -> Result<()> {
        self.message(
            Level::Error,
            &format!("{label} (código {}):\n{}", result.exit_code, result.output),
        )
    }

    /// Show the table and read a choice. `None` means quit.
    fn choose(&mut self, actions: &[MenuAction]) -> Result<Option<MenuAction>> {
        writeln!(self.output)?;
        writeln!(self.output, "Comandos de Sesión")?;
        for (i, action) in actions.iter().enumerate() {
            writeln!(
                self.output,
                "  {:>2}  {:<14} {}",
                i + 1,
                action.label(),
                action.description()
            )?;
        }
        writeln!(self.output, "  {:>2}  {:<14} {}", "q", "salir", "Salir de la aplicación")?;

        loop {
            let Some(choice) = self.read_answer("Selecciona una acción")? else {
                return Ok(None);
            };
            if choice == "q" {
                return Ok(None);
            }
            let picked = choice
                .parse::<usize>()
                .ok()
                .and_then(|n| n.checked_sub(1))
                .and_then(|index| actions.get(index));
            match picked {
                Some(action) => return Ok(Some(*action)),
                None => self.message(Level::Warning, &format!("Opción inválida: {choice}"))?,
            }
        }
    }

    fn confirm(&mut self, question: &str) -> Result<bool> {
        let answer = self.ask(&format!("{question} [s/N]"))?;
        Ok(matches!(answer.to_lowercase().as_str(), "s" | "si" | "sí" | "y" | "yes"))
    }

    /// Prompt for a line; end of input reads as an empty answer.
    fn ask(&mut self, label: &str) -> Result<String> {
        Ok(self.read_answer(label)?.unwrap_or_default())
    }

    fn read_answer(&mut self, label: &str) -> Result<Option<String>> {
        write!(self.output, "{label}: ")?;
        self.output.flush()?;
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            writeln!(self.output)?;
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    fn header(&mut self) -> Result<()> {
        let title = format!(
            "Entre Vetas Sessions - Sesiones - {}",
            self.sessions.project_name()
        );
        let rule = "=".repeat(title.chars().count() + 4);
        writeln!(self.output, "{rule}\n  {title}\n{rule}")?;
        Ok(())
    }

    fn panel(&mut self, title: &str, body: &str) -> Result<()> {
        writeln!(self.output, "--- {title} ---\n{body}\n---")?;
        Ok(())
    }

    fn issue_table(&mut self, issues: &[Issue]) -> Result<()> {
        writeln!(self.output, "Issues Disponibles")?;
        for (i, issue) in issues.iter().enumerate() {
            writeln!(
                self.output,
                "  {:>2}  #{:<6} {}",
                i + 1,
                issue.number,
                issue.title
            )?;
        }
        Ok(())
    }

    fn message(&mut self, level: Level, text: &str) -> Result<()> {
        writeln!(self.output, "{} {text}", level.tag())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedRunner, ScriptedStep, TestProject};

    fn run_menu_in(
        project: &TestProject,
        steps: Vec<ScriptedStep>,
        input: &str,
    ) -> (String, Vec<Vec<String>>) {
        let sessions = Sessions::new(project.location().clone(), ScriptedRunner::new(steps));
        let mut output = Vec::new();
        Menu::new(
            &sessions,
            BranchConfig::default(),
            input.as_bytes(),
            &mut output,
        )
        .run()
        .expect("menu run");
        let calls = sessions_calls(&sessions);
        (String::from_utf8(output).expect("utf8"), calls)
    }

    fn run_menu(steps: Vec<ScriptedStep>, input: &str) -> (String, Vec<Vec<String>>) {
        let project = TestProject::with_session_stub().expect("project");
        run_menu_in(&project, steps, input)
    }

    fn sessions_calls(sessions: &Sessions<ScriptedRunner>) -> Vec<Vec<String>> {
        sessions
            .runner()
            .calls()
            .iter()
            .map(|call| call.args().to_vec())
            .collect()
    }

    #[test]
    fn lists_catalog_plus_status_and_quits() {
        let project = TestProject::with_session_stub().expect("project");
        let name = project
            .root()
            .file_name()
            .expect("tempdir name")
            .to_string_lossy()
            .into_owned();
        let (out, calls) = run_menu_in(&project, Vec::new(), "q\n");
        assert!(out.contains(&format!("Entre Vetas Sessions - Sesiones - {name}")));
        assert!(out.contains("list-issues"));
        assert!(out.contains("   9  status"));
        assert!(out.contains("¡Hasta luego!"));
        assert!(calls.is_empty());
    }

    #[test]
    fn banner_reports_valid_script() {
        let (out, _) = run_menu(Vec::new(), "q\n");
        let detected = out.find("Gestor de sesiones detectado en:").expect("banner");
        let valid = out.find("[info] Script sessions.sh válido").expect("validation line");
        assert!(detected < valid);
    }

    #[cfg(unix)]
    #[test]
    fn invalid_script_keeps_menu_closed() {
        let project = TestProject::with_session_stub().expect("project");
        project.set_mode(0o644).expect("chmod");
        let (out, calls) = run_menu_in(&project, Vec::new(), "1\nnunca\nq\n");
        assert!(out.starts_with("[error] Script sessions.sh no es ejecutable"));
        assert!(!out.contains("Comandos de Sesión"));
        assert!(calls.is_empty());
    }

    #[test]
    fn end_of_input_quits() {
        let (out, _) = run_menu(Vec::new(), "");
        assert!(out.contains("¡Hasta luego!"));
    }

    #[test]
    fn invalid_choice_prompts_again() {
        let (out, _) = run_menu(Vec::new(), "42\nq\n");
        assert!(out.contains("Opción inválida: 42"));
    }

    #[test]
    fn start_runs_script_with_description() {
        let (out, calls) = run_menu(
            vec![ScriptedStep::exit(0, "creada")],
            "1\nrefactor menu\nq\n",
        );
        assert_eq!(calls, vec![vec!["start", "session", "refactor menu"]]);
        assert!(out.contains("[ok] Sesión iniciada exitosamente:\ncreada"));
    }

    #[test]
    fn empty_description_skips_script() {
        let (out, calls) = run_menu(Vec::new(), "1\n\nq\n");
        assert!(calls.is_empty());
        assert!(out.contains("Descripción vacía"));
    }

    #[test]
    fn note_requires_active_session() {
        let (out, calls) = run_menu(vec![ScriptedStep::exit(1, "")], "5\nq\n");
        assert_eq!(calls, vec![vec!["context"]]);
        assert!(out.contains("No hay una sesión activa para añadir notas."));
    }

    #[test]
    fn end_asks_for_confirmation() {
        let (out, calls) = run_menu(vec![ScriptedStep::exit(0, "")], "7\nn\nq\n");
        assert_eq!(calls, vec![vec!["context"]]);
        assert!(out.contains("Operación cancelada."));
    }

    #[test]
    fn end_passes_closing_note() {
        let (_, calls) = run_menu(
            vec![ScriptedStep::exit(0, ""), ScriptedStep::exit(0, "fin")],
            "7\ns\ntodo listo\nq\n",
        );
        assert_eq!(
            calls,
            vec![vec!["context"], vec!["end", "session", "todo listo"]]
        );
    }

    #[test]
    fn failed_command_is_reported_with_exit_code() {
        let (out, _) = run_menu(
            vec![ScriptedStep::exit(0, ""), ScriptedStep::exit(3, "sin cambios")],
            "8\nmensaje\nq\n",
        );
        assert!(out.contains("[error] Error al cerrar sesión (código 3):\nsin cambios"));
    }

    #[test]
    fn spawn_failure_keeps_menu_alive() {
        let (out, _) = run_menu(vec![ScriptedStep::spawn_failure()], "2\nq\n");
        assert!(out.contains("Error ejecutando acción de sesión 'list-issues'"));
        assert!(out.contains("¡Hasta luego!"));
    }

    #[test]
    fn issue_selection_uses_suggested_branch() {
        let (_, calls) = run_menu(
            vec![
                ScriptedStep::exit(0, "12|Fix Login Flow\n7|Dark mode"),
                ScriptedStep::exit(0, "ok"),
            ],
            "4\n1\n\nq\n",
        );
        assert_eq!(
            calls,
            vec![
                vec!["list-issues"],
                vec!["issue-direct", "feat/12-fix-login-flow", "12", "Fix Login Flow"],
            ]
        );
    }

    #[test]
    fn issue_selection_accepts_custom_branch() {
        let (_, calls) = run_menu(
            vec![
                ScriptedStep::exit(0, "12|Fix Login Flow"),
                ScriptedStep::exit(0, "ok"),
            ],
            "4\n1\nhotfix/login\nq\n",
        );
        assert_eq!(
            calls[1],
            vec!["issue-direct", "hotfix/login", "12", "Fix Login Flow"]
        );
    }

    #[test]
    fn issue_selection_can_be_cancelled() {
        let (out, calls) = run_menu(vec![ScriptedStep::exit(0, "12|Fix")], "4\n\nq\n");
        assert_eq!(calls.len(), 1);
        assert!(out.contains("Selección cancelada."));
    }

    #[test]
    fn issue_direct_requires_number_and_title() {
        let (out, calls) = run_menu(Vec::new(), "3\nfeat/x\n\n\nq\n");
        assert!(calls.is_empty());
        assert!(out.contains("Número y título del issue son requeridos."));
    }

    #[test]
    fn status_shows_context_panel() {
        let (out, _) = run_menu(
            vec![
                ScriptedStep::exit(0, "# Sesión: Foo"),
                ScriptedStep::exit(0, "# Sesión: Foo"),
            ],
            "9\nq\n",
        );
        assert!(out.contains("--- Estado de Sesiones ---\nSesión activa encontrada:\n\n# Sesión: Foo"));
    }
}
