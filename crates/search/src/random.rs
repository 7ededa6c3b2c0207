//! Seeded uniform random sampling.

use crate::engine::{declare, BestSoFar, SearchEngine, SearchLimits, SpaceHandle};
use crate::error::SearchError;
use crate::space::{Candidate, ParameterKind, ParameterSpace};
use std::collections::HashSet;
use tracing::debug;

/// Consecutive duplicate draws after which the space is treated as exhausted.
const MAX_DUPLICATE_STREAK: usize = 1_000;

/// Draws candidates uniformly at random and never hands out the same one twice.
pub struct RandomSearch {
    rng: fastrand::Rng,
    limits: SearchLimits,
    space: ParameterSpace,
    seen: HashSet<Candidate>,
    best: BestSoFar,
    iterations: usize,
}

impl RandomSearch {
    pub fn new(seed: u64, limits: SearchLimits) -> Self {
        Self {
            rng: fastrand::Rng::with_seed(seed),
            limits,
            space: ParameterSpace::new(),
            seen: HashSet::new(),
            best: BestSoFar::default(),
            iterations: 0,
        }
    }

    fn draw(&mut self) -> Candidate {
        let rng = &mut self.rng;
        self.space
            .parameters()
            .iter()
            .map(|parameter| {
                let value = match &parameter.kind {
                    ParameterKind::Integer { low, high } => rng.i64(*low..=*high),
                    ParameterKind::Categorical(values) => values[rng.usize(..values.len())],
                };
                (parameter.name.clone(), value)
            })
            .collect()
    }
}

impl SearchEngine for RandomSearch {
    fn name(&self) -> &str {
        "random"
    }

    fn declare_parameter_space(
        &mut self,
        space: ParameterSpace,
    ) -> Result<SpaceHandle, SearchError> {
        let handle = declare(&space)?;
        self.space = space;
        self.seen.clear();
        self.best = BestSoFar::default();
        self.iterations = 0;
        Ok(handle)
    }

    fn propose_next(&mut self) -> Option<Candidate> {
        if self.space.is_empty()
            || self.seen.len() >= self.limits.test_limit
            || self.seen.len() as u128 >= self.space.size()
        {
            return None;
        }

        for _ in 0..MAX_DUPLICATE_STREAK {
            self.iterations += 1;
            let candidate = self.draw();
            if self.seen.insert(candidate.clone()) {
                return Some(candidate);
            }
        }

        debug!(
            engine = self.name(),
            distinct = self.seen.len(),
            "duplicate streak exhausted the search"
        );
        None
    }

    fn report_cost(&mut self, candidate: &Candidate, cost: f64) {
        self.best.observe(candidate, cost);
    }

    fn best(&self) -> Option<Candidate> {
        self.best.candidate().cloned()
    }

    fn iterations(&self) -> usize {
        self.iterations
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::Parameter;

    fn space() -> ParameterSpace {
        let mut space = ParameterSpace::new();
        space.push(Parameter::integer("unroll", 0, 3)).unwrap();
        space.push(Parameter::categorical("tile", [2, 4, 8])).unwrap();
        space
    }

    #[test]
    fn test_respects_test_limit() {
        let mut engine = RandomSearch::new(7, SearchLimits { test_limit: 5 });
        engine.declare_parameter_space(space()).unwrap();
        let mut proposed = 0;
        while let Some(candidate) = engine.propose_next() {
            engine.report_cost(&candidate, 1.0);
            proposed += 1;
        }
        assert_eq!(proposed, 5);
    }

    #[test]
    fn test_stops_when_space_is_exhausted_without_duplicates() {
        let mut engine = RandomSearch::new(1, SearchLimits { test_limit: 1_000 });
        let declared = space();
        engine.declare_parameter_space(declared.clone()).unwrap();

        let mut seen = HashSet::new();
        while let Some(candidate) = engine.propose_next() {
            assert!(declared.admits(&candidate));
            assert!(seen.insert(candidate.clone()), "duplicate proposal");
            engine.report_cost(&candidate, 1.0);
        }
        assert_eq!(seen.len(), 12);
        assert!(engine.iterations() >= 12);
    }

    #[test]
    fn test_best_is_lowest_cost() {
        let mut engine = RandomSearch::new(3, SearchLimits { test_limit: 12 });
        engine.declare_parameter_space(space()).unwrap();
        while let Some(candidate) = engine.propose_next() {
            let cost = (candidate.get("unroll").unwrap() - 2).abs() as f64
                + candidate.get("tile").unwrap() as f64;
            engine.report_cost(&candidate, cost);
        }
        let best = engine.best().unwrap();
        assert_eq!(best.get("unroll"), Some(2));
        assert_eq!(best.get("tile"), Some(2));
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let run = |seed| {
            let mut engine = RandomSearch::new(seed, SearchLimits { test_limit: 6 });
            engine.declare_parameter_space(space()).unwrap();
            std::iter::from_fn(|| engine.propose_next()).collect::<Vec<_>>()
        };
        assert_eq!(run(42), run(42));
    }

    #[test]
    fn test_nothing_proposed_before_declaration() {
        let mut engine = RandomSearch::new(0, SearchLimits::default());
        assert!(engine.propose_next().is_none());
        assert!(engine.best().is_none());
    }
}
