//! Wall-clock timing of a built executable.

use crate::error::PipelineError;
use std::path::Path;
use std::process::{Command, ExitStatus, Stdio};
use std::time::Instant;

/// Result of running an executable `repeats` times.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RunOutcome {
    /// Average seconds per run, whole process included.
    Timed(f64),
    /// Run number `run` (zero-based) exited unsuccessfully; later runs were skipped.
    Failed { run: usize, status: ExitStatus },
}

impl RunOutcome {
    /// Seconds per run, `+inf` for a failed run.
    pub fn seconds(&self) -> f64 {
        match self {
            RunOutcome::Timed(seconds) => *seconds,
            RunOutcome::Failed { .. } => f64::INFINITY,
        }
    }
}

/// Run `executable` `repeats` times back to back and average the elapsed time.
pub fn measure_executable(executable: &Path, repeats: usize) -> Result<RunOutcome, PipelineError> {
    let repeats = repeats.max(1);
    let start = Instant::now();
    for run in 0..repeats {
        let output = Command::new(executable)
            .stdin(Stdio::null())
            .output()
            .map_err(|source| PipelineError::Spawn {
                program: executable.display().to_string(),
                source,
            })?;
        if !output.status.success() {
            return Ok(RunOutcome::Failed {
                run,
                status: output.status,
            });
        }
    }
    Ok(RunOutcome::Timed(
        start.elapsed().as_secs_f64() / repeats as f64,
    ))
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    #[test]
    fn test_successful_runs_are_timed() {
        let outcome = measure_executable(Path::new("true"), 3).unwrap();
        let RunOutcome::Timed(seconds) = outcome else {
            panic!("expected a timing, got {outcome:?}");
        };
        assert!(seconds.is_finite() && seconds >= 0.0);
    }

    #[test]
    fn test_failing_run_scores_infinity() {
        let outcome = measure_executable(Path::new("false"), 3).unwrap();
        assert!(matches!(outcome, RunOutcome::Failed { run: 0, .. }));
        assert_eq!(outcome.seconds(), f64::INFINITY);
    }
}
