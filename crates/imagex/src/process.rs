//! Synchronous execution of the external conversion tools.

use crate::error::ImagexError;
use std::ffi::{OsStr, OsString};
use std::fmt;
use std::io::{self, Write};
use std::process::{Command, Stdio};
use std::thread;
use tracing::debug;

/// A program and its arguments, kept separate from `std::process::Command`
/// so it can be displayed and inspected.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolCommand {
    program: String,
    args: Vec<OsString>,
}

impl ToolCommand {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl AsRef<OsStr>) -> Self {
        self.args.push(arg.as_ref().to_os_string());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        self.args
            .extend(args.into_iter().map(|a| a.as_ref().to_os_string()));
        self
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    pub fn get_args(&self) -> &[OsString] {
        &self.args
    }
}

impl fmt::Display for ToolCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg.to_string_lossy())?;
        }
        Ok(())
    }
}

/// Exit status and captured streams of a finished tool.
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ToolOutput {
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Return stdout, or an `ExternalTool` error when the tool failed.
    pub fn into_stdout(self, command: &ToolCommand) -> Result<Vec<u8>, ImagexError> {
        if self.success() {
            Ok(self.stdout)
        } else {
            Err(ImagexError::ExternalTool {
                command: command.to_string(),
                code: self.code,
                stderr: String::from_utf8_lossy(&self.stderr).trim().to_string(),
            })
        }
    }
}

/// Runs a tool to completion, optionally feeding it standard input.
pub trait ToolRunner {
    fn run(&self, command: &ToolCommand, stdin: Option<&[u8]>) -> Result<ToolOutput, ImagexError>;
}

/// [`ToolRunner`] backed by real child processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn run(&self, command: &ToolCommand, stdin: Option<&[u8]>) -> Result<ToolOutput, ImagexError> {
        debug!(command = %command, stdin_bytes = stdin.map(<[u8]>::len), "running tool");

        let launch_error = |source: io::Error| ImagexError::ToolLaunch {
            command: command.to_string(),
            source,
        };

        let mut child = Command::new(&command.program)
            .args(&command.args)
            .stdin(if stdin.is_some() {
                Stdio::piped()
            } else {
                Stdio::null()
            })
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(launch_error)?;

        let pipe = child.stdin.take();

        // Feed stdin from a helper thread so a tool that fills its stdout
        // before draining stdin cannot deadlock us.
        let (written, output) = thread::scope(|scope| {
            let writer = scope.spawn(move || match (pipe, stdin) {
                (Some(mut pipe), Some(input)) => pipe.write_all(input),
                _ => Ok(()),
            });
            let output = child.wait_with_output();
            (writer.join(), output)
        });

        let output = output.map_err(launch_error)?;
        let code = output.status.code();

        match written {
            // A tool that exits early closes its stdin; its exit status tells the story.
            Ok(Err(e)) if e.kind() != io::ErrorKind::BrokenPipe && code == Some(0) => {
                return Err(ImagexError::Io(e))
            }
            Err(_) => {
                return Err(ImagexError::Io(io::Error::new(
                    io::ErrorKind::Other,
                    format!("stdin writer for `{}` panicked", command),
                )))
            }
            _ => {}
        }

        debug!(command = %command, ?code, stdout_bytes = output.stdout.len(), "tool finished");

        Ok(ToolOutput {
            code,
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}
