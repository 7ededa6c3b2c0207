//! knobtune compile-measure pipeline.
//!
//! Drives the external LLVM tools: knob discovery on the input program, then
//! per trial lowering with a knob assignment, the fixed optimization sequence,
//! the multiplication check, codegen and timed execution.

pub mod defs;
pub mod error;
pub mod measure;
pub mod pipeline;
pub mod session;
pub mod toolchain;

pub use defs::ExtraDefs;
pub use error::PipelineError;
pub use measure::{measure_executable, RunOutcome};
pub use pipeline::{run_stages, with_suffix, PipelineOptions, Stage};
pub use session::{CompilerSession, MeasurePipeline, MULTIPLICATION_MARKER};
pub use toolchain::Toolchain;
