//! Run the session script as a child process.
//!
//! Every invocation runs with the project root as the child's working
//! directory (set per spawn, the engine's own working directory is never
//! touched) and with stderr merged into stdout through a single pipe, so the
//! caller sees one time-ordered stream of lines.

use std::io::{BufRead, BufReader, PipeReader};
use std::process::{Child, Command, ExitStatus};
use std::thread;
use std::time::Duration;

use tracing::{debug, instrument, warn};
use wait_timeout::ChildExt;

use crate::core::command::CommandRequest;
use crate::error::SessionError;
use crate::io::locate::ScriptLocation;

/// Exit code and combined output of a finished blocking invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionResult {
    pub exit_code: i32,
    /// Output lines in arrival order, trailing whitespace stripped, joined by `\n`.
    pub output: String,
}

impl ExecutionResult {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Turn a non-zero exit into `NonZeroExit`, keeping the output.
    pub fn into_checked(self) -> Result<Self, SessionError> {
        if self.success() {
            Ok(self)
        } else {
            Err(SessionError::NonZeroExit {
                code: self.exit_code,
                output: self.output,
            })
        }
    }
}

/// Blocking execution seam used by the facade. Tests substitute scripted runners.
pub trait ScriptRunner {
    fn run_blocking(&self, request: &CommandRequest) -> Result<ExecutionResult, SessionError>;
}

/// Spawns the located session script.
#[derive(Debug, Clone)]
pub struct ScriptExecutor {
    location: ScriptLocation,
    timeout: Option<Duration>,
}

impl ScriptExecutor {
    pub fn new(location: ScriptLocation) -> Self {
        Self {
            location,
            timeout: None,
        }
    }

    /// Kill blocking invocations that outlive `timeout`.
    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn location(&self) -> &ScriptLocation {
        &self.location
    }

    /// Start the script and hand back its output as a live line stream.
    ///
    /// The child is not waited on until the caller drains the stream through
    /// [`StreamHandle::finish`] (or drops the handle).
    #[instrument(skip_all, fields(command = %request))]
    pub fn run_streaming(&self, request: &CommandRequest) -> Result<StreamHandle, SessionError> {
        let (child, reader) = self.spawn(request)?;
        Ok(StreamHandle {
            child,
            reader: BufReader::new(reader),
            exhausted: false,
            status: None,
        })
    }

    fn spawn(&self, request: &CommandRequest) -> Result<(Child, PipeReader), SessionError> {
        let relative = self.location.relative_script_path();
        let (reader, writer) = std::io::pipe()?;
        let writer_for_stderr = writer.try_clone()?;

        // On unix a relative program is resolved after the child's chdir, so the
        // script is started as `scripts/<name>` from the project root.
        #[cfg(unix)]
        let program = relative;
        #[cfg(not(unix))]
        let program = self.location.script_path();

        let mut cmd = Command::new(program);
        // stdin stays inherited: `issue` prompts on the terminal.
        cmd.args(request.args())
            .current_dir(self.location.project_root())
            .stdout(writer)
            .stderr(writer_for_stderr);

        debug!(script = %relative.display(), "spawning session script");
        let child = cmd.spawn().map_err(|source| {
            warn!(err = %source, "failed to spawn session script");
            SessionError::SpawnFailed {
                program: relative.to_path_buf(),
                source,
            }
        })?;
        // Release the parent's write ends so the reader sees EOF once the child exits.
        drop(cmd);
        Ok((child, reader))
    }
}

impl ScriptRunner for ScriptExecutor {
    #[instrument(skip_all, fields(command = %request, timeout = ?self.timeout))]
    fn run_blocking(&self, request: &CommandRequest) -> Result<ExecutionResult, SessionError> {
        let (mut child, reader) = self.spawn(request)?;
        let reader_handle = thread::spawn(move || read_lines(reader));

        let status = match self.timeout {
            Some(timeout) => match child.wait_timeout(timeout)? {
                Some(status) => status,
                None => {
                    warn!(timeout_secs = timeout.as_secs(), "session script timed out, killing");
                    kill_and_reap(&mut child)?;
                    // The reader thread is left to finish on its own: a grandchild
                    // may still hold the write end of the pipe.
                    return Err(SessionError::TimedOut(timeout));
                }
            },
            None => child.wait()?,
        };

        let lines = match reader_handle.join() {
            Ok(lines) => lines?,
            Err(_) => {
                return Err(SessionError::Io(std::io::Error::other(
                    "output reader thread panicked",
                )));
            }
        };
        let exit_code = exit_code(status)?;
        debug!(exit_code, lines = lines.len(), "session script finished");
        Ok(ExecutionResult {
            exit_code,
            output: lines.join("\n"),
        })
    }
}

/// Live, one-pass view of a running script's combined output.
///
/// Iterating yields lines as they arrive. [`finish`](Self::finish) drains the
/// rest and reaps the child. A handle dropped before `finish` kills and reaps
/// the child.
#[derive(Debug)]
pub struct StreamHandle {
    child: Child,
    reader: BufReader<PipeReader>,
    exhausted: bool,
    status: Option<ExitStatus>,
}

impl StreamHandle {
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Drain any unread output, wait for the child and return its exit code.
    pub fn finish(mut self) -> Result<i32, SessionError> {
        for line in self.by_ref() {
            line?;
        }
        let status = self.child.wait()?;
        self.status = Some(status);
        exit_code(status)
    }

    /// Kill the child and stop the stream; `finish` then reports `Interrupted`.
    pub fn terminate(&mut self) -> Result<(), SessionError> {
        self.exhausted = true;
        if self.status.is_some() {
            return Ok(());
        }
        warn!(pid = self.child.id(), "terminating session script");
        self.status = Some(kill_and_reap(&mut self.child)?);
        Ok(())
    }
}

impl Iterator for StreamHandle {
    type Item = Result<String, SessionError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.exhausted {
            return None;
        }
        match read_line(&mut self.reader) {
            Ok(Some(line)) => Some(Ok(line)),
            Ok(None) => {
                self.exhausted = true;
                None
            }
            Err(err) => {
                self.exhausted = true;
                Some(Err(err.into()))
            }
        }
    }
}

impl Drop for StreamHandle {
    fn drop(&mut self) {
        if self.status.is_some() {
            return;
        }
        debug!(pid = self.child.id(), "reaping undrained session script");
        if let Err(err) = kill_and_reap(&mut self.child) {
            warn!(err = %err, "failed to reap session script");
        }
    }
}

/// Kill the child and always wait for it, even when the kill itself fails
/// (for example because the child already exited).
fn kill_and_reap(child: &mut Child) -> std::io::Result<ExitStatus> {
    if let Err(err) = child.kill() {
        warn!(pid = child.id(), err = %err, "failed to kill session script");
    }
    child.wait()
}

fn read_lines(reader: PipeReader) -> std::io::Result<Vec<String>> {
    let mut reader = BufReader::new(reader);
    let mut lines = Vec::new();
    while let Some(line) = read_line(&mut reader)? {
        lines.push(line);
    }
    Ok(lines)
}

/// Read one line, decoding lossily and stripping trailing whitespace.
fn read_line<R: BufRead>(reader: &mut R) -> std::io::Result<Option<String>> {
    let mut buf = Vec::new();
    let n = reader.read_until(b'\n', &mut buf)?;
    if n == 0 {
        return Ok(None);
    }
    Ok(Some(String::from_utf8_lossy(&buf).trim_end().to_string()))
}

fn exit_code(status: ExitStatus) -> Result<i32, SessionError> {
    if let Some(code) = status.code() {
        return Ok(code);
    }
    #[cfg(unix)]
    let signal = {
        use std::os::unix::process::ExitStatusExt;
        status.signal()
    };
    #[cfg(not(unix))]
    let signal = None;
    warn!(?signal, "session script terminated by signal");
    Err(SessionError::Interrupted { signal })
}
