//! Chained invocations of external tools.
//!
//! A pipeline is a list of [`Stage`]s. Each stage reads the previous stage's
//! output and writes `<prefix><suffix>`, so the artifacts of one program share
//! a prefix and differ only by suffix (`.ll`, `.labeled.ll`, ...).

use crate::error::PipelineError;
use std::ffi::{OsStr, OsString};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use tracing::debug;

/// Options shared by every invocation of the pipeline.
#[derive(Debug, Clone, Copy)]
pub struct PipelineOptions {
    /// Number of timed executions averaged per measurement.
    pub repeats: usize,
    /// Let tool output through to the terminal instead of capturing it.
    pub debug: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            repeats: 3,
            debug: false,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Stage {
    suffix: String,
    program: PathBuf,
    args: Vec<OsString>,
    textual: bool,
}

impl Stage {
    pub fn new<I, S>(suffix: &str, program: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            suffix: suffix.to_string(),
            program: program.into(),
            args: args.into_iter().map(Into::into).collect(),
            textual: false,
        }
    }

    /// Ask the tool for textual output (`-S`).
    pub fn textual(mut self) -> Self {
        self.textual = true;
        self
    }

    pub fn args(&self) -> &[OsString] {
        &self.args
    }

    pub fn is_textual(&self) -> bool {
        self.textual
    }

    fn command(&self, input: &Path, output: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command.args(&self.args).arg(input).arg("-o").arg(output);
        if self.textual {
            command.arg("-S");
        }
        command
    }
}

/// `prefix` with `suffix` appended verbatim (no extension replacement).
pub fn with_suffix(prefix: &Path, suffix: &str) -> PathBuf {
    let mut path = prefix.as_os_str().to_owned();
    path.push(suffix);
    PathBuf::from(path)
}

/// Run `stages` in order starting from `first_input`; returns the last output.
pub fn run_stages(
    prefix: &Path,
    first_input: &Path,
    stages: &[Stage],
    options: &PipelineOptions,
) -> Result<PathBuf, PipelineError> {
    let mut last = first_input.to_path_buf();
    for stage in stages {
        let next = with_suffix(prefix, &stage.suffix);
        let mut command = stage.command(&last, &next);
        run_command(&stage.suffix, &mut command, options.debug)?;
        last = next;
    }
    Ok(last)
}

fn run_command(stage: &str, command: &mut Command, debug: bool) -> Result<(), PipelineError> {
    let line = command_line(command);
    debug!(stage, command = %line, "running");

    let program = command.get_program().to_string_lossy().into_owned();
    let spawn_error = |source| PipelineError::Spawn {
        program: program.clone(),
        source,
    };

    let (status, output) = if debug {
        let status = command.status().map_err(spawn_error)?;
        (status, String::new())
    } else {
        let output = command
            .stdin(Stdio::null())
            .output()
            .map_err(spawn_error)?;
        let mut text = String::from_utf8_lossy(&output.stdout).into_owned();
        text.push_str(&String::from_utf8_lossy(&output.stderr));
        (output.status, text)
    };

    if !status.success() {
        return Err(PipelineError::ToolFailed {
            stage: stage.to_string(),
            command: line,
            status,
            output: output.trim_end().to_string(),
        });
    }
    Ok(())
}

fn command_line(command: &Command) -> String {
    std::iter::once(command.get_program())
        .chain(command.get_args())
        .map(OsStr::to_string_lossy)
        .collect::<Vec<_>>()
        .join(" ")
}
