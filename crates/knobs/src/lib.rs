//! Knob space model for knobtune.
//!
//! The lowering pass describes its tunable parameters as a document nested
//! three levels deep (`function -> operator -> parameter`). This crate turns
//! that document into a flat [`KnobSpace`] keyed by dotted paths, derives the
//! per-operator [`Mask`]s used to partition the space, and maps [`Config`]s
//! back to the nested shape the lowering pass reads.
//!
//! # Key Components
//!
//! - [`tree::flatten`] / [`tree::unflatten`]: depth-checked conversion between
//!   nested and dotted-key documents
//! - [`knob::Knob`]: one tunable integer with either a range or a value set
//! - [`space::KnobSpace`]: all knobs of one program, masks and filtering
//! - [`config::Config`]: an assignment of values to some or all knobs

pub mod config;
pub mod error;
pub mod knob;
pub mod space;
pub mod tree;

pub use config::Config;
pub use error::KnobError;
pub use knob::{DataType, Knob, KnobDomain};
pub use space::{KnobPath, KnobSpace, Mask, KNOB_DEPTH};
pub use tree::{flatten, unflatten};
