#![cfg(not(target_arch = "wasm32"))]
//! The only path from the panel to the `antfarm` workflow-control CLI.
//!
//! Server execution only. Invocations are checked against a closed set of
//! `(action, subcommand)` pairs before anything is spawned, and the child gets
//! an argument vector, never a shell string.

use std::io::{BufReader, Read};
use std::process::{Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread;
use std::time::{Duration, Instant};

pub const ANTFARM_BINARY: &str = "antfarm";
pub const ANTFARM_COMMAND_TIMEOUT: Duration = Duration::from_secs(30);

/// Exact `(action, subcommand)` pairs the panel may run.
pub const ALLOWED_ACTIONS: &[(&str, &str)] = &[
    ("workflow", "status"),
    ("workflow", "run"),
    ("workflow", "resume"),
    ("step", "complete"),
    ("step", "fail"),
];

#[derive(Debug, thiserror::Error)]
pub enum AntfarmCommandError {
    #[error("unauthorized antfarm action `{action}`")]
    Unauthorized { action: String },
    #[error("antfarm binary missing: {binary}")]
    MissingBinary { binary: String },
    #[error("antfarm command `{command}` timed out after {timeout_ms}ms")]
    Timeout { command: String, timeout_ms: u64 },
    #[error("antfarm command `{command}` failed with exit code {exit_code}: {stderr}")]
    NonZeroExit {
        command: String,
        exit_code: i32,
        stderr: String,
    },
    #[error("io error while running antfarm command `{command}`: {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

impl AntfarmCommandError {
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
}

pub fn is_allowed_action(action: &str, subcommand: &str) -> bool {
    ALLOWED_ACTIONS
        .iter()
        .any(|&(allowed_action, allowed_sub)| allowed_action == action && allowed_sub == subcommand)
}

/// Checks `action` plus the first argument against [`ALLOWED_ACTIONS`].
///
/// No trimming, case folding or path handling happens first, so `workflow;`,
/// `/bin/bash` and `Workflow` are all rejected.
pub fn authorize(action: &str, args: &[String]) -> Result<(), AntfarmCommandError> {
    let subcommand = args.first().map(String::as_str).unwrap_or("");
    if is_allowed_action(action, subcommand) {
        return Ok(());
    }
    Err(AntfarmCommandError::Unauthorized {
        action: format!("{action} {subcommand}"),
    })
}

#[derive(Debug, Clone)]
pub struct AntfarmCli {
    binary: String,
    timeout: Duration,
}

impl Default for AntfarmCli {
    fn default() -> Self {
        Self {
            binary: ANTFARM_BINARY.to_string(),
            timeout: ANTFARM_COMMAND_TIMEOUT,
        }
    }
}

impl AntfarmCli {
    /// Points the executor at a different binary. Process wiring only (tests,
    /// packaging); request input never reaches this.
    pub fn with_binary(binary: impl Into<String>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    pub fn run(&self, action: &str, args: &[String]) -> Result<CommandOutput, AntfarmCommandError> {
        authorize(action, args)?;

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push(action.to_string());
        argv.extend(args.iter().cloned());
        let command_form = argv.join(" ");
        let io_error = |source: std::io::Error| AntfarmCommandError::Io {
            command: command_form.clone(),
            source,
        };

        let mut child = match Command::new(&self.binary)
            .args(&argv)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
        {
            Ok(child) => child,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(AntfarmCommandError::MissingBinary {
                    binary: self.binary.clone(),
                })
            }
            Err(err) => return Err(io_error(err)),
        };

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| io_error(std::io::Error::other("missing stdout pipe")))?;
        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| io_error(std::io::Error::other("missing stderr pipe")))?;
        let (chunks_tx, chunks) = mpsc::channel();
        spawn_reader(OutputStream::Stdout, stdout, chunks_tx.clone());
        spawn_reader(OutputStream::Stderr, stderr, chunks_tx);

        let deadline = Instant::now() + self.timeout;
        let exit_status = loop {
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => {
                    if Instant::now() > deadline {
                        let _ = child.kill();
                        child.wait().map_err(io_error)?;
                        return Err(AntfarmCommandError::Timeout {
                            command: command_form,
                            timeout_ms: self.timeout.as_millis() as u64,
                        });
                    }
                    thread::sleep(Duration::from_millis(10));
                }
                Err(err) => {
                    let _ = child.kill();
                    return Err(io_error(err));
                }
            }
        };

        // Background processes left by the child may keep the pipes open;
        // output is only collected until the deadline.
        let captured = collect_output(&chunks, deadline);
        let stdout = String::from_utf8_lossy(&captured.stdout);
        let stderr = String::from_utf8_lossy(&captured.stderr);

        if !exit_status.success() {
            return Err(AntfarmCommandError::NonZeroExit {
                command: command_form,
                exit_code: exit_status.code().unwrap_or(-1),
                stderr: stderr.trim().to_string(),
            });
        }

        Ok(CommandOutput {
            stdout: stdout.trim().to_string(),
            stderr: stderr.trim().to_string(),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OutputStream {
    Stdout,
    Stderr,
}

enum OutputChunk {
    Data(OutputStream, Vec<u8>),
    Closed,
}

#[derive(Debug, Default)]
struct CapturedOutput {
    stdout: Vec<u8>,
    stderr: Vec<u8>,
}

impl CapturedOutput {
    fn push(&mut self, stream: OutputStream, bytes: &[u8]) {
        match stream {
            OutputStream::Stdout => self.stdout.extend_from_slice(bytes),
            OutputStream::Stderr => self.stderr.extend_from_slice(bytes),
        }
    }
}

fn spawn_reader(
    stream: OutputStream,
    source: impl Read + Send + 'static,
    tx: Sender<OutputChunk>,
) {
    thread::spawn(move || {
        let mut reader = BufReader::new(source);
        let mut buf = [0u8; 4096];
        loop {
            match reader.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => {
                    if tx.send(OutputChunk::Data(stream, buf[..n].to_vec())).is_err() {
                        return;
                    }
                }
                Err(err) if err.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(_) => break,
            }
        }
        let _ = tx.send(OutputChunk::Closed);
    });
}

/// Drains reader chunks until both pipes close or `deadline` passes, keeping
/// whatever arrived in time.
fn collect_output(chunks: &Receiver<OutputChunk>, deadline: Instant) -> CapturedOutput {
    let mut captured = CapturedOutput::default();
    let mut open_streams = 2;

    while open_streams > 0 {
        let remaining = deadline.saturating_duration_since(Instant::now());
        match chunks.recv_timeout(remaining) {
            Ok(OutputChunk::Data(stream, bytes)) => captured.push(stream, &bytes),
            Ok(OutputChunk::Closed) => open_streams -= 1,
            Err(RecvTimeoutError::Timeout) => {
                while let Ok(chunk) = chunks.try_recv() {
                    if let OutputChunk::Data(stream, bytes) = chunk {
                        captured.push(stream, &bytes);
                    }
                }
                break;
            }
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    captured
}
