//! Worker process lifecycle and request/response exchange.

use std::io::{self, BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use thiserror::Error;

use super::protocol::{WorkerRequest, WorkerResponse};
use crate::backend::RuntimeEnvironment;
use crate::config::BackendSettings;
use crate::process::render_command;

const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Errors talking to the inference worker.
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("Failed to start worker '{program}': {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("Worker I/O failed: {0}")]
    Io(#[from] io::Error),

    #[error("Malformed worker message: {0}")]
    Protocol(#[from] serde_json::Error),

    #[error("Worker exited before answering '{op}'")]
    Closed { op: &'static str },

    #[error("{0}")]
    Rejected(String),
}

/// Result type for worker operations.
pub type WorkerResult<T> = Result<T, WorkerError>;

/// How to start the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkerCommand {
    pub program: String,
    pub args: Vec<String>,
}

impl WorkerCommand {
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Self {
        Self {
            program: program.into(),
            args,
        }
    }

    pub fn from_settings(settings: &BackendSettings) -> Self {
        Self::new(settings.worker_program.clone(), settings.worker_args.clone())
    }

    fn build(&self) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args);
        command
    }
}

/// A running worker. Dropping it asks the worker to exit and reaps it.
pub struct WorkerProcess {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: BufReader<ChildStdout>,
}

impl WorkerProcess {
    /// Start the worker with the environment adjustments applied.
    pub fn spawn(command: &WorkerCommand, environment: &dyn RuntimeEnvironment) -> WorkerResult<Self> {
        let mut cmd = command.build();
        environment.apply_to(&mut cmd);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());

        tracing::debug!("Starting worker: {}", render_command(&command.program, &command.args));
        let mut child = cmd.spawn().map_err(|source| WorkerError::Spawn {
            program: command.program.clone(),
            source,
        })?;

        let stdin = child.stdin.take();
        let stdout = child.stdout.take().ok_or_else(|| WorkerError::Spawn {
            program: command.program.clone(),
            source: io::Error::new(io::ErrorKind::BrokenPipe, "stdout not captured"),
        })?;

        if let Some(stderr) = child.stderr.take() {
            thread::spawn(move || {
                for line in BufReader::new(stderr).lines().map_while(Result::ok) {
                    tracing::debug!(target: "oev_worker", "{}", line);
                }
            });
        }

        Ok(Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        })
    }

    /// Send one request and wait for its response.
    ///
    /// Stdout lines that are not protocol messages are skipped. A response
    /// with `ok: false` becomes [`WorkerError::Rejected`]; any other failure
    /// closes the exchange so later requests return [`WorkerError::Closed`].
    pub fn request(&mut self, request: &WorkerRequest<'_>) -> WorkerResult<WorkerResponse> {
        let op = request.op();
        let response = match self.exchange(request) {
            Ok(response) => response,
            Err(e) => {
                if !matches!(e, WorkerError::Closed { .. }) {
                    tracing::debug!("Worker exchange for '{}' failed, closing: {}", op, e);
                }
                self.stdin = None;
                return Err(e);
            }
        };
        if !response.ok {
            return Err(WorkerError::Rejected(
                response
                    .error
                    .unwrap_or_else(|| format!("worker rejected '{}'", op)),
            ));
        }
        Ok(response)
    }

    fn exchange(&mut self, request: &WorkerRequest<'_>) -> WorkerResult<WorkerResponse> {
        let op = request.op();
        let stdin = self.stdin.as_mut().ok_or(WorkerError::Closed { op })?;

        let mut line = serde_json::to_string(request)?;
        line.push('\n');
        stdin.write_all(line.as_bytes())?;
        stdin.flush()?;

        let mut reply = String::new();
        loop {
            reply.clear();
            if self.stdout.read_line(&mut reply)? == 0 {
                return Err(WorkerError::Closed { op });
            }
            let trimmed = reply.trim();
            if trimmed.is_empty() {
                continue;
            }
            match serde_json::from_str::<WorkerResponse>(trimmed) {
                Ok(response) => return Ok(response),
                Err(_) => tracing::debug!(target: "oev_worker", "{}", trimmed),
            }
        }
    }

    fn wait_or_kill(&mut self) {
        let started = Instant::now();
        loop {
            match self.child.try_wait() {
                Ok(Some(_)) => return,
                Ok(None) if started.elapsed() < SHUTDOWN_GRACE => {
                    thread::sleep(Duration::from_millis(20));
                }
                _ => break,
            }
        }
        tracing::debug!("Worker did not exit in time, killing it");
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

impl Drop for WorkerProcess {
    fn drop(&mut self) {
        if let Some(mut stdin) = self.stdin.take() {
            if let Ok(mut line) = serde_json::to_string(&WorkerRequest::Shutdown) {
                line.push('\n');
                let _ = stdin.write_all(line.as_bytes());
                let _ = stdin.flush();
            }
        }
        self.wait_or_kill();
    }
}
