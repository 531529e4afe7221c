//! `evc-sessions`: Entre Vetas work-session manager.
//!
//! Without a subcommand it opens the interactive menu. Subcommands run a
//! single session command and exit with the script's exit code.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sessions::core::command::CommandRequest;
use sessions::core::session_info::SessionStatus;
use sessions::exit_codes;
use sessions::io::config::{SessionsConfig, load_config};
use sessions::io::process::ExecutionResult;
use sessions::menu::{Menu, MenuAction};
use sessions::{SessionError, Sessions, logging};

#[derive(Parser)]
#[command(
    name = "evc-sessions",
    version,
    about = "Entre Vetas Sessions - Gestor de sesiones de trabajo documentadas"
)]
struct Cli {
    /// Archivo de configuración TOML.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Iniciar una nueva sesión de trabajo.
    Start { description: String },
    /// Añadir una nota a la sesión activa.
    Note { text: String },
    /// Ver el contexto y notas de la sesión activa.
    Context {
        /// Imprimir la sesión como JSON.
        #[arg(long)]
        json: bool,
    },
    /// Finalizar la sesión activa.
    End { closing_note: Option<String> },
    /// Hacer commit y cerrar sesión.
    Commit { message: String },
    /// Listar issues disponibles de GitHub.
    ListIssues,
    /// Iniciar sesión seleccionando issue interactivamente.
    Issue { branch: String },
    /// Iniciar sesión con issue específico.
    IssueDirect {
        branch: String,
        number: String,
        title: String,
    },
    /// Ver estado actual del gestor de sesiones.
    Status,
    /// Listar los comandos de sesión disponibles.
    Commands,
    /// Comprobar que el script de sesiones existe y es ejecutable.
    Validate,
    /// Ejecutar cualquier comando del script mostrando la salida en vivo.
    Exec {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
}

fn main() {
    logging::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("Error: {err:#}");
            std::process::exit(exit_code_for(&err));
        }
    }
}

fn run(cli: Cli) -> Result<i32> {
    let config = match &cli.config {
        Some(path) => load_config(path).context("load config")?,
        None => SessionsConfig::default(),
    };

    if matches!(cli.command, Some(Command::Commands)) {
        print_commands()?;
        return Ok(exit_codes::OK);
    }

    let sessions = match Sessions::discover(&config) {
        Ok(sessions) => sessions,
        Err(err @ SessionError::NotFound { .. }) => {
            eprintln!("Error de configuración inicial: {err}");
            eprintln!(
                "Asegúrate de ejecutar 'evc-sessions' desde un directorio dentro de tu proyecto, \
                 donde se encuentre la carpeta '{}' con '{}'.",
                config.script.subfolder, config.script.name
            );
            return Ok(exit_codes::INVALID);
        }
        Err(err) => return Err(err.into()),
    };

    let check = sessions.validate();
    if matches!(cli.command, Some(Command::Validate)) {
        println!("{check}");
        return Ok(if check.is_valid() {
            exit_codes::OK
        } else {
            exit_codes::INVALID
        });
    }
    if let Err(err) = check.into_result() {
        eprintln!("Error: {err}");
        return Ok(exit_codes::INVALID);
    }

    let Some(command) = cli.command else {
        Menu::new(
            &sessions,
            config.branch.clone(),
            io::stdin().lock(),
            io::stdout().lock(),
        )
        .run()?;
        return Ok(exit_codes::OK);
    };

    match command {
        Command::Start { description } => print_result(sessions.start_session(&description)?),
        Command::Note { text } => print_result(sessions.add_note(&text)?),
        Command::Context { json: false } => print_result(sessions.session_context()?),
        Command::Context { json: true } => {
            let info = sessions.active_session_info();
            println!(
                "{}",
                serde_json::to_string_pretty(&info).context("serialize session info")?
            );
            Ok(match info.status {
                SessionStatus::Active => exit_codes::OK,
                SessionStatus::Inactive => exit_codes::INVALID,
                SessionStatus::Error => exit_codes::EXEC_FAILED,
            })
        }
        Command::End { closing_note } => {
            print_result(sessions.end_session(closing_note.as_deref().unwrap_or_default())?)
        }
        Command::Commit { message } => print_result(sessions.commit_and_close(&message)?),
        Command::ListIssues => print_result(sessions.list_issues()?),
        Command::Issue { branch } => print_result(sessions.start_with_issue(&branch)?),
        Command::IssueDirect {
            branch,
            number,
            title,
        } => print_result(sessions.start_with_issue_direct(&branch, &number, &title)?),
        Command::Status => {
            let report = sessions.status();
            println!("{}", report.message);
            Ok(if report.ok {
                exit_codes::OK
            } else {
                exit_codes::EXEC_FAILED
            })
        }
        Command::Exec { args } => stream_command(&sessions, CommandRequest::new(args)),
        Command::Commands | Command::Validate => Ok(exit_codes::OK),
    }
}

/// Print captured output and pass the script's exit code through.
fn print_result(result: ExecutionResult) -> Result<i32> {
    if !result.output.is_empty() {
        println!("{}", result.output);
    }
    Ok(result.exit_code)
}

fn stream_command(sessions: &Sessions, request: CommandRequest) -> Result<i32> {
    let mut stream = sessions.stream(&request)?;
    let mut stdout = io::stdout().lock();
    for line in stream.by_ref() {
        writeln!(stdout, "{}", line?)?;
        stdout.flush()?;
    }
    Ok(stream.finish()?)
}

fn print_commands() -> Result<()> {
    let mut stdout = io::stdout().lock();
    for action in MenuAction::all() {
        writeln!(stdout, "{:<14} {}", action.label(), action.description())?;
    }
    Ok(())
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    match err.downcast_ref::<SessionError>() {
        Some(SessionError::Interrupted { .. }) => exit_codes::INTERRUPTED,
        Some(err) if err.is_execution_failure() => exit_codes::EXEC_FAILED,
        _ => exit_codes::INVALID,
    }
}
