//! # External Process Execution
//!
//! Every external tool the pipeline touches (`git` and the dependency
//! resolver) runs through the [`ProcessRunner`] trait. A run blocks until the
//! child terminates and returns a [`TerminationResult`] value describing how it
//! ended. There is no ambient "last status" to consult afterwards.
//!
//! The child inherits the caller's standard streams, so tool output is shown
//! to the operator rather than captured. There is no timeout: a hung command
//! hangs the caller.

use std::path::Path;
use std::process::{Command, ExitStatus};

use crate::error::{Error, Result, TerminationCause};

/// How a child process terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TerminationResult {
    /// Normal exit with the given status code.
    Exited(i32),
    /// Terminated by the given signal.
    Signaled(i32),
    /// Neither an exit code nor a signal was reported.
    Unknown,
}

impl TerminationResult {
    pub fn success() -> Self {
        TerminationResult::Exited(0)
    }

    pub fn is_success(&self) -> bool {
        matches!(self, TerminationResult::Exited(0))
    }

    /// The failure cause, or `None` for a successful termination.
    pub fn failure_cause(&self) -> Option<TerminationCause> {
        match *self {
            TerminationResult::Exited(0) => None,
            TerminationResult::Exited(code) => Some(TerminationCause::ExitedNonZero { code }),
            TerminationResult::Signaled(signal) => {
                Some(TerminationCause::KilledBySignal { signal })
            }
            TerminationResult::Unknown => Some(TerminationCause::UnknownTermination),
        }
    }

    /// Turn a non-success termination into `CommandExecutionFailed`.
    pub fn into_result(self, argv: &[String]) -> Result<()> {
        match self.failure_cause() {
            None => Ok(()),
            Some(cause) => Err(Error::CommandExecutionFailed {
                argv: argv.to_vec(),
                cause,
            }),
        }
    }
}

impl From<ExitStatus> for TerminationResult {
    fn from(status: ExitStatus) -> Self {
        if let Some(code) = status.code() {
            return TerminationResult::Exited(code);
        }

        #[cfg(unix)]
        {
            use std::os::unix::process::ExitStatusExt;
            if let Some(signal) = status.signal() {
                return TerminationResult::Signaled(signal);
            }
        }

        TerminationResult::Unknown
    }
}

/// Trait for running external commands - allows faking in tests
pub trait ProcessRunner {
    /// Runs `argv` with `working_dir` as the child's current directory and
    /// blocks until it terminates.
    ///
    /// Only a failure to start the process is an `Err`; a process that runs
    /// and fails is reported through the returned `TerminationResult`.
    fn run(&self, argv: &[String], working_dir: &Path) -> Result<TerminationResult>;

    /// Runs `argv` and converts a non-success termination into
    /// `Error::CommandExecutionFailed`.
    fn run_checked(&self, argv: &[String], working_dir: &Path) -> Result<()> {
        self.run(argv, working_dir)?.into_result(argv)
    }
}

/// The default `ProcessRunner`, backed by `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProcessRunner;

impl ProcessRunner for SystemProcessRunner {
    fn run(&self, argv: &[String], working_dir: &Path) -> Result<TerminationResult> {
        let (program, args) = argv.split_first().ok_or_else(|| Error::Spawn {
            argv: Vec::new(),
            source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "empty argv"),
        })?;

        log::debug!("running {:?} in {}", argv.join(" "), working_dir.display());

        let status = Command::new(program)
            .args(args)
            .current_dir(working_dir)
            .status()
            .map_err(|source| Error::Spawn {
                argv: argv.to_vec(),
                source,
            })?;

        Ok(status.into())
    }
}
