//! The search engine contract.

use crate::error::SearchError;
use crate::space::{Candidate, ParameterSpace};

/// Summary returned when a space is declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpaceHandle {
    pub parameters: usize,
    /// Estimated number of distinct points.
    pub size: u128,
}

/// Budget shared by the reference engines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchLimits {
    /// Maximum number of distinct candidates handed out for evaluation.
    pub test_limit: usize,
}

impl Default for SearchLimits {
    fn default() -> Self {
        Self { test_limit: 100 }
    }
}

/// A black-box minimizer over a [`ParameterSpace`].
///
/// The caller declares the space once, then alternates [`propose_next`] and
/// [`report_cost`] until `propose_next` returns `None`. Costs are minimized;
/// `f64::INFINITY` marks a failed evaluation and never beats a finite cost.
///
/// [`propose_next`]: SearchEngine::propose_next
/// [`report_cost`]: SearchEngine::report_cost
pub trait SearchEngine {
    /// Name of this engine, for logs.
    fn name(&self) -> &str;

    fn declare_parameter_space(&mut self, space: ParameterSpace)
        -> Result<SpaceHandle, SearchError>;

    /// Next candidate to evaluate, or `None` once the budget or the space is exhausted.
    fn propose_next(&mut self) -> Option<Candidate>;

    fn report_cost(&mut self, candidate: &Candidate, cost: f64);

    /// Lowest-cost candidate reported so far.
    fn best(&self) -> Option<Candidate>;

    /// Internal iteration count, including candidates that were drawn but not
    /// handed out (duplicates).
    fn iterations(&self) -> usize;
}

impl<E: SearchEngine + ?Sized> SearchEngine for Box<E> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn declare_parameter_space(
        &mut self,
        space: ParameterSpace,
    ) -> Result<SpaceHandle, SearchError> {
        (**self).declare_parameter_space(space)
    }

    fn propose_next(&mut self) -> Option<Candidate> {
        (**self).propose_next()
    }

    fn report_cost(&mut self, candidate: &Candidate, cost: f64) {
        (**self).report_cost(candidate, cost)
    }

    fn best(&self) -> Option<Candidate> {
        (**self).best()
    }

    fn iterations(&self) -> usize {
        (**self).iterations()
    }
}

/// Tracks the lowest cost seen; ties keep the earlier candidate.
#[derive(Debug, Clone, Default)]
pub struct BestSoFar {
    best: Option<(Candidate, f64)>,
}

impl BestSoFar {
    pub fn observe(&mut self, candidate: &Candidate, cost: f64) {
        let cost = if cost.is_nan() { f64::INFINITY } else { cost };
        let improves = match &self.best {
            None => true,
            Some((_, best_cost)) => cost < *best_cost,
        };
        if improves {
            self.best = Some((candidate.clone(), cost));
        }
    }

    pub fn candidate(&self) -> Option<&Candidate> {
        self.best.as_ref().map(|(candidate, _)| candidate)
    }

    pub fn cost(&self) -> Option<f64> {
        self.best.as_ref().map(|(_, cost)| *cost)
    }
}

pub(crate) fn declare(space: &ParameterSpace) -> Result<SpaceHandle, SearchError> {
    if space.is_empty() {
        return Err(SearchError::EmptySpace);
    }
    Ok(SpaceHandle {
        parameters: space.len(),
        size: space.size(),
    })
}
