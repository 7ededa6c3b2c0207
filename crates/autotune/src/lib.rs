//! Autotuning driver for tensor lowering knobs.

pub mod accumulator;
pub mod adapter;
#[cfg(feature = "cli")]
pub mod cli;
pub mod record;
pub mod session;
pub mod target;

pub use accumulator::*;
pub use adapter::*;
pub use record::*;
pub use session::*;
pub use target::*;

#[cfg(test)]
mod testing;
