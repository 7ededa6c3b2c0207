//! Compiler session orchestration.
//!
//! One session owns the artifacts of one input program inside a working
//! directory. Artifacts are overwritten on every build, so a session must not
//! be shared between concurrent builds.

use crate::defs::ExtraDefs;
use crate::error::PipelineError;
use crate::measure::{measure_executable, RunOutcome};
use crate::pipeline::{run_stages, with_suffix, PipelineOptions};
use crate::toolchain::{Toolchain, DISCOVERY_CLANG_FLAGS};
use knobtune_knobs::{Config, KnobSpace};
use serde_json::Value;
use std::ffi::OsString;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Substring of a multiplication instruction in textual IR.
pub const MULTIPLICATION_MARKER: &str = " mul";

/// Name of the knob assignment written for each build.
pub const KNOB_ASSIGNMENT_FILE: &str = "tmp.json";

/// Build-and-time backend used by the tuner.
pub trait MeasurePipeline {
    /// Run knob discovery once and return the flattened knob space.
    fn discover_knobs(&mut self) -> Result<KnobSpace, PipelineError>;

    /// Build the program with a full knob assignment and time it.
    ///
    /// Returns `+inf` when the program itself fails; build failures are errors.
    fn compile_run_measure(&mut self, config: &Config) -> Result<f64, PipelineError>;
}

pub struct CompilerSession {
    toolchain: Toolchain,
    options: PipelineOptions,
    program: PathBuf,
    workdir: PathBuf,
    defs: ExtraDefs,
}

impl CompilerSession {
    /// Create the working directory if needed and resolve it to an absolute path.
    pub fn new(
        toolchain: Toolchain,
        program: impl Into<PathBuf>,
        workdir: impl AsRef<Path>,
        defs: ExtraDefs,
        options: PipelineOptions,
    ) -> Result<Self, PipelineError> {
        let workdir = workdir.as_ref();
        fs::create_dir_all(workdir).map_err(|source| PipelineError::io(workdir, source))?;
        let workdir = fs::canonicalize(workdir).map_err(|source| PipelineError::io(workdir, source))?;

        if !defs.is_empty() {
            info!(defs = ?defs.flags(), "using extra definitions");
        }

        Ok(Self {
            toolchain,
            options,
            program: program.into(),
            workdir,
            defs,
        })
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Common prefix of every artifact: `<workdir>/<program stem>`.
    pub fn artifact_prefix(&self) -> PathBuf {
        let stem = self
            .program
            .file_stem()
            .map(OsString::from)
            .unwrap_or_else(|| OsString::from("program"));
        self.workdir.join(stem)
    }

    /// Lower, optimize and link the program with `config`; returns the executable.
    pub fn build(&self, config: &Config) -> Result<PathBuf, PipelineError> {
        let assignment = self.workdir.join(KNOB_ASSIGNMENT_FILE);
        write_json(&assignment, &config.to_nested()?, false)?;

        let prefix = self.artifact_prefix();
        let labeled = with_suffix(&prefix, ".labeled.ll");
        let lower_flags: Vec<OsString> = vec![
            "-tensor-analysis".into(),
            "-lower-tensor".into(),
            "-read-knobs-from".into(),
            assignment.into(),
        ];
        let optimized = run_stages(
            &prefix,
            &labeled,
            &[
                self.toolchain.plugin_stage(".lowered.ll", lower_flags),
                self.toolchain.optimize_stage(".lowered.opt.ll"),
            ],
            &self.options,
        )?;

        check_multiplication(&optimized, config)?;

        run_stages(
            &prefix,
            &optimized,
            &[self.toolchain.clang_stage("", Vec::<OsString>::new())],
            &self.options,
        )
    }
}

impl MeasurePipeline for CompilerSession {
    fn discover_knobs(&mut self) -> Result<KnobSpace, PipelineError> {
        let prefix = self.artifact_prefix();
        let knobs_path = with_suffix(&prefix, ".json");
        match fs::remove_file(&knobs_path) {
            Err(source) if source.kind() != ErrorKind::NotFound => {
                return Err(PipelineError::io(&knobs_path, source));
            }
            _ => {}
        }

        let clang_flags = DISCOVERY_CLANG_FLAGS
            .iter()
            .map(OsString::from)
            .chain(self.defs.flags().iter().map(OsString::from));
        let discover_flags: Vec<OsString> = vec![
            "-mem2reg".into(),
            "-tensor".into(),
            "-tensor-analysis".into(),
            "-lower-tensor".into(),
            "-print-knobs-to".into(),
            knobs_path.clone().into(),
        ];
        run_stages(
            &prefix,
            &self.program,
            &[
                self.toolchain.clang_stage(".ll", clang_flags),
                self.toolchain.plugin_stage(".labeled.ll", discover_flags),
            ],
            &self.options,
        )?;

        let text =
            fs::read_to_string(&knobs_path).map_err(|source| PipelineError::io(&knobs_path, source))?;
        let nested: Value = serde_json::from_str(&text).map_err(|source| PipelineError::Json {
            path: knobs_path.clone(),
            source,
        })?;
        let space = KnobSpace::from_nested(&nested)?;
        write_json(&knobs_path, &space.to_flat_json()?, true)?;

        info!(knobs = space.len(), path = %knobs_path.display(), "discovered knobs");
        Ok(space)
    }

    fn compile_run_measure(&mut self, config: &Config) -> Result<f64, PipelineError> {
        let executable = self.build(config)?;
        let outcome = measure_executable(&executable, self.options.repeats)?;
        if let RunOutcome::Failed { run, status } = outcome {
            warn!(
                config = ?config.as_map(),
                run,
                status = %status,
                "measured config died"
            );
        } else {
            debug!(seconds = outcome.seconds(), "measured config");
        }
        Ok(outcome.seconds())
    }
}

fn check_multiplication(optimized: &Path, config: &Config) -> Result<(), PipelineError> {
    let text =
        fs::read_to_string(optimized).map_err(|source| PipelineError::io(optimized, source))?;
    if text.contains(MULTIPLICATION_MARKER) {
        return Ok(());
    }
    Err(PipelineError::Anomaly {
        path: optimized.to_path_buf(),
        config: serde_json::to_string(config).unwrap_or_default(),
    })
}

fn write_json(path: &Path, value: &Value, pretty: bool) -> Result<(), PipelineError> {
    let text = if pretty {
        serde_json::to_string_pretty(value)
    } else {
        serde_json::to_string(value)
    }
    .map_err(|source| PipelineError::Json {
        path: path.to_path_buf(),
        source,
    })?;
    fs::write(path, text).map_err(|source| PipelineError::io(path, source))
}
