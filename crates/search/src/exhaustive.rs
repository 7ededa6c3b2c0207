//! Grid enumeration in odometer order.

use crate::engine::{declare, BestSoFar, SearchEngine, SearchLimits, SpaceHandle};
use crate::error::SearchError;
use crate::space::{Candidate, ParameterSpace};

/// Walks every point of the space, last parameter fastest, up to the test limit.
pub struct ExhaustiveSearch {
    limits: SearchLimits,
    space: ParameterSpace,
    cursor: Option<Vec<u64>>,
    best: BestSoFar,
    iterations: usize,
}

impl ExhaustiveSearch {
    pub fn new(limits: SearchLimits) -> Self {
        Self {
            limits,
            space: ParameterSpace::new(),
            cursor: None,
            best: BestSoFar::default(),
            iterations: 0,
        }
    }

    fn advance(&mut self) {
        let Some(cursor) = self.cursor.as_mut() else {
            return;
        };
        for (index, parameter) in cursor.iter_mut().zip(self.space.parameters()).rev() {
            *index += 1;
            if *index < parameter.kind.cardinality() {
                return;
            }
            *index = 0;
        }
        // Every digit wrapped around.
        self.cursor = None;
    }
}

impl SearchEngine for ExhaustiveSearch {
    fn name(&self) -> &str {
        "exhaustive"
    }

    fn declare_parameter_space(
        &mut self,
        space: ParameterSpace,
    ) -> Result<SpaceHandle, SearchError> {
        let handle = declare(&space)?;
        self.cursor = Some(vec![0; space.len()]);
        self.space = space;
        self.best = BestSoFar::default();
        self.iterations = 0;
        Ok(handle)
    }

    fn propose_next(&mut self) -> Option<Candidate> {
        if self.iterations >= self.limits.test_limit {
            return None;
        }
        let cursor = self.cursor.as_ref()?;
        let candidate = cursor
            .iter()
            .zip(self.space.parameters())
            .map(|(index, parameter)| {
                parameter
                    .kind
                    .value_at(*index)
                    .map(|value| (parameter.name.clone(), value))
            })
            .collect::<Option<Candidate>>()?;

        self.iterations += 1;
        self.advance();
        Some(candidate)
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
