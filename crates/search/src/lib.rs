//! Pluggable search engines for knobtune.
//!
//! A search engine only sees a [`ParameterSpace`]: it proposes [`Candidate`]s,
//! receives their costs, and reports the best one when it stops proposing.
//! How a candidate is measured is the caller's business.
//!
//! Two reference engines are provided: [`RandomSearch`] and
//! [`ExhaustiveSearch`]. Anything implementing [`SearchEngine`] can replace them.

pub mod engine;
pub mod error;
pub mod exhaustive;
pub mod random;
pub mod space;

pub use engine::{BestSoFar, SearchEngine, SearchLimits, SpaceHandle};
pub use error::SearchError;
pub use exhaustive::ExhaustiveSearch;
pub use random::RandomSearch;
pub use space::{Candidate, Parameter, ParameterKind, ParameterSpace};
