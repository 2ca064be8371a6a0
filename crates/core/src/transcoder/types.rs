//! Types for the transcoder module.

use std::path::PathBuf;

/// Everything needed to start one transcoder process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    /// Executable name or path.
    pub program: PathBuf,
    /// Argument vector, without the program itself.
    pub args: Vec<String>,
    /// Working directory of the process.
    pub cwd: PathBuf,
}

/// Observable process activity, relayed without interpretation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    /// One line of diagnostic output (stderr).
    Output(String),
    /// The process or its output stream failed while running.
    Error(String),
    /// The process is gone. `code` is `None` when it was killed by a signal
    /// or the exit status could not be collected.
    Exited { code: Option<i32> },
}
