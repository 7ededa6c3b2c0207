//! Bridges a subset of the knob space to a [`SearchEngine`].

use crate::record::TrialRecord;
use crate::target::TargetDescriptor;
use anyhow::{anyhow, Result};
use indicatif::{ProgressBar, ProgressStyle};
use knobtune_compiler::{MeasurePipeline, PipelineError};
use knobtune_knobs::{Config, KnobDomain, KnobError, KnobSpace};
use knobtune_search::{Candidate, Parameter, ParameterSpace, SearchEngine, SearchLimits};
use tracing::{debug, info};

/// Outcome of searching one subset of the knobs.
#[derive(Debug, Clone, PartialEq)]
pub struct PartitionResult {
    /// Best assignment of the subset's knobs.
    pub best: Config,
    /// Every evaluated trial, `iter` counting from zero.
    pub records: Vec<TrialRecord>,
}

/// One search parameter per knob: ranges become ordered integers, value sets
/// become categoricals over the sorted values.
pub fn declare_parameters(knobs: &KnobSpace) -> Result<ParameterSpace> {
    let mut space = ParameterSpace::new();
    for (path, knob) in knobs.iter() {
        if !knob.data_type.is_integer() {
            return Err(KnobError::UnsupportedDataType {
                path: path.to_string(),
                data_type: knob.data_type.to_string(),
            }
            .into());
        }
        let parameter = match &knob.domain {
            KnobDomain::Range { low, high } => Parameter::integer(path, *low, *high),
            KnobDomain::Values(values) => Parameter::categorical(path, values.iter().copied()),
        };
        space.push(parameter)?;
    }
    Ok(space)
}

pub struct MeasurementAdapter<'t, P> {
    target: &'t mut TargetDescriptor<P>,
    knobs: KnobSpace,
    limits: SearchLimits,
    records: Vec<TrialRecord>,
    progress: ProgressBar,
}

impl<'t, P: MeasurePipeline> MeasurementAdapter<'t, P> {
    pub fn new(
        target: &'t mut TargetDescriptor<P>,
        knobs: KnobSpace,
        limits: SearchLimits,
        show_progress: bool,
    ) -> Self {
        let progress = if show_progress {
            let bar = ProgressBar::new(limits.test_limit as u64);
            if let Ok(style) = ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            {
                bar.set_style(style.progress_chars("#>-"));
            }
            bar
        } else {
            ProgressBar::hidden()
        };
        Self {
            target,
            knobs,
            limits,
            records: Vec::new(),
            progress,
        }
    }

    pub fn parameter_space(&self) -> Result<ParameterSpace> {
        declare_parameters(&self.knobs)
    }

    /// Build and time one candidate; the returned time is the cost to minimize.
    pub fn run_trial(&mut self, candidate: &Candidate) -> Result<f64, PipelineError> {
        let config = Config::from(candidate.clone().into_inner());
        let time = self.target.compile_run_measure(&config)?;
        let speedup = self.target.baseline() / time;
        let iter = self.records.len();
        debug!(iter, time, speedup, "trial finished");

        self.records.push(TrialRecord {
            config,
            time,
            iter,
            speedup,
        });
        Ok(time)
    }

    /// Trials actually evaluated, which may be fewer than the engine's iterations.
    pub fn trials_evaluated(&self) -> usize {
        self.records.len()
    }

    pub fn records(&self) -> &[TrialRecord] {
        &self.records
    }

    /// Close the partition with the engine's best candidate.
    pub fn finalize(self, best: Option<Candidate>) -> Result<PartitionResult> {
        let best = best.ok_or_else(|| {
            anyhow!(
                "search finished without a best candidate after {} trials",
                self.records.len()
            )
        })?;
        Ok(PartitionResult {
            best: Config::from(best.into_inner()),
            records: self.records,
        })
    }

    /// Declare the subset to `engine` and evaluate candidates until it stops proposing.
    pub fn drive(mut self, engine: &mut dyn SearchEngine) -> Result<PartitionResult> {
        let handle = engine.declare_parameter_space(self.parameter_space()?)?;
        info!(
            engine = engine.name(),
            knobs = handle.parameters,
            size = %handle.size,
            "searching"
        );

        let length = handle.size.min(self.limits.test_limit as u128);
        self.progress.set_length(u64::try_from(length).unwrap_or(u64::MAX));

        while let Some(candidate) = engine.propose_next() {
            let cost = match self.run_trial(&candidate) {
                Ok(cost) => cost,
                Err(err) => {
                    self.progress.abandon();
                    return Err(err.into());
                }
            };
            engine.report_cost(&candidate, cost);
            self.progress.set_position(self.trials_evaluated() as u64);
        }
        debug!(
            iterations = engine.iterations(),
            evaluated = self.trials_evaluated(),
            "search stopped"
        );
        self.progress.finish_and_clear();

        let best = engine.best();
        self.finalize(best)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{anomaly, bowl, sample_space, tool_failure, FakePipeline};
    use knobtune_knobs::{DataType, Knob};
    use knobtune_search::{ExhaustiveSearch, ParameterKind, RandomSearch};
    use std::collections::BTreeMap;

    fn limits(test_limit: usize) -> SearchLimits {
        SearchLimits { test_limit }
    }

    #[test]
    fn test_parameter_kinds_follow_domains() {
        let space = declare_parameters(&sample_space()).unwrap();
        let kinds: BTreeMap<&str, &ParameterKind> = space
            .parameters()
            .iter()
            .map(|parameter| (parameter.name.as_str(), &parameter.kind))
            .collect();
        assert_eq!(
            kinds["main.mul.InnerLoopUnrollFactor"],
            &ParameterKind::Integer { low: 0, high: 3 }
        );
        assert_eq!(
            kinds["main.mul.TileSize_M"],
            &ParameterKind::Categorical(vec![2, 4, 8])
        );
    }

    #[test]
    fn test_non_integer_knob_is_rejected() {
        let mut knob = Knob::range(0, 1).unwrap();
        knob.data_type = DataType::Other("float".into());
        let space =
            KnobSpace::from_knobs(BTreeMap::from([("f.op.alpha".to_string(), knob)])).unwrap();

        let err = declare_parameters(&space).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<KnobError>(),
            Some(KnobError::UnsupportedDataType { .. })
        ));
    }

    #[test]
    fn test_trials_count_from_zero() {
        let mut target = TargetDescriptor::new(FakePipeline::new(sample_space(), bowl)).unwrap();
        let knobs = target.filter_knobs("main.mul.");
        let mut adapter = MeasurementAdapter::new(&mut target, knobs, limits(10), false);

        let mut engine = ExhaustiveSearch::new(limits(3));
        engine
            .declare_parameter_space(adapter.parameter_space().unwrap())
            .unwrap();
        while let Some(candidate) = engine.propose_next() {
            let cost = adapter.run_trial(&candidate).unwrap();
            engine.report_cost(&candidate, cost);
        }

        let iters: Vec<usize> = adapter.records().iter().map(|record| record.iter).collect();
        assert_eq!(iters, vec![0, 1, 2]);
        assert_eq!(adapter.trials_evaluated(), 3);
        // Baseline 7.0 over the first exhaustive point (tile 2, unroll 0) at 7.0.
        assert_eq!(adapter.records()[0].speedup, 1.0);
    }

    #[test]
    fn test_drive_finds_bowl_minimum() {
        let mut target = TargetDescriptor::new(FakePipeline::new(sample_space(), bowl)).unwrap();
        let knobs = target.filter_knobs("main.mul.");
        let adapter = MeasurementAdapter::new(&mut target, knobs, limits(100), false);

        let result = adapter.drive(&mut ExhaustiveSearch::new(limits(100))).unwrap();
        assert_eq!(result.records.len(), 12);
        assert_eq!(result.best.get("main.mul.TileSize_M"), Some(4));
        assert_eq!(result.best.get("main.mul.InnerLoopUnrollFactor"), Some(2));
        assert_eq!(result.best.len(), 2);
    }

    #[test]
    fn test_failed_trial_continues_search() {
        let mut target = TargetDescriptor::new(FakePipeline::new(sample_space(), |config| {
            if config.get("main.add.TileSize") == Some(2) {
                Err(tool_failure())
            } else {
                bowl(config)
            }
        }))
        .unwrap();
        let knobs = target.filter_knobs("main.add.");
        let adapter = MeasurementAdapter::new(&mut target, knobs, limits(100), false);

        let result = adapter.drive(&mut RandomSearch::new(3, limits(100))).unwrap();
        assert_eq!(result.records.len(), 4);
        let failed: Vec<&TrialRecord> = result.records.iter().filter(|r| r.failed()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].speedup, 0.0);
        assert_eq!(result.best.get("main.add.TileSize"), Some(3));
    }

    #[test]
    fn test_anomaly_aborts_search() {
        let mut target = TargetDescriptor::new(FakePipeline::new(sample_space(), |config| {
            if config.get("main.mul.TileSize_M") == Some(8) {
                Err(anomaly())
            } else {
                Ok(1.0)
            }
        }))
        .unwrap();
        let knobs = target.filter_knobs("main.mul.");
        let adapter = MeasurementAdapter::new(&mut target, knobs, limits(100), false);

        let err = adapter
            .drive(&mut ExhaustiveSearch::new(limits(100)))
            .unwrap_err();
        assert!(matches!(
            err.downcast_ref::<PipelineError>(),
            Some(PipelineError::Anomaly { .. })
        ));
    }

    #[test]
    fn test_progress_counts_evaluated_trials() {
        let mut target = TargetDescriptor::new(FakePipeline::new(sample_space(), bowl)).unwrap();
        let knobs = target.filter_knobs("main.add.");
        let adapter = MeasurementAdapter::new(&mut target, knobs, limits(100), false);
        let bar = adapter.progress.clone();

        let mut engine = RandomSearch::new(3, limits(100));
        let result = adapter.drive(&mut engine).unwrap();

        assert_eq!(result.records.len(), 4);
        assert_eq!(bar.length(), Some(4));
        assert_eq!(bar.position(), 4);
        assert!(engine.iterations() >= 4);
    }

    #[test]
    fn test_missing_best_candidate_is_an_error() {
        let mut target = TargetDescriptor::new(FakePipeline::new(sample_space(), bowl)).unwrap();
        let knobs = target.filter_knobs("main.add.");
        let adapter = MeasurementAdapter::new(&mut target, knobs, limits(100), false);
        assert!(adapter.finalize(None).is_err());
    }

    #[test]
    fn test_zero_budget_has_no_best() {
        let mut target = TargetDescriptor::new(FakePipeline::new(sample_space(), bowl)).unwrap();
        let knobs = target.filter_knobs("main.add.");
        let adapter = MeasurementAdapter::new(&mut target, knobs, limits(0), false);
        let err = adapter
            .drive(&mut ExhaustiveSearch::new(limits(0)))
            .unwrap_err();
        assert!(err.to_string().contains("without a best candidate"));
    }
}
