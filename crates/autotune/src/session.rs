//! A full tuning run: one search per partition, merged into one log.

use crate::accumulator::ResultAccumulator;
use crate::adapter::{declare_parameters, MeasurementAdapter};
use crate::target::TargetDescriptor;
use anyhow::{Context, Result};
use knobtune_compiler::MeasurePipeline;
use knobtune_knobs::{Config, KnobSpace};
use knobtune_search::{ExhaustiveSearch, RandomSearch, SearchEngine, SearchLimits};
use serde::Serialize;
use std::path::Path;
use tracing::info;

/// Search engine used for every partition.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum Technique {
    #[default]
    Random,
    Exhaustive,
}

impl Technique {
    pub fn engine(self, seed: u64, limits: SearchLimits) -> Box<dyn SearchEngine> {
        match self {
            Technique::Random => Box::new(RandomSearch::new(seed, limits)),
            Technique::Exhaustive => Box::new(ExhaustiveSearch::new(limits)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TuneOptions {
    /// Search each operator's knobs separately instead of all at once.
    pub partition: bool,
    /// Evaluations allowed per search.
    pub test_limit: usize,
    pub technique: Technique,
    /// Seed of the first search; partition `i` uses `seed + i`.
    pub seed: u64,
    pub show_progress: bool,
}

impl Default for TuneOptions {
    fn default() -> Self {
        Self {
            partition: false,
            test_limit: SearchLimits::default().test_limit,
            technique: Technique::default(),
            seed: 0,
            show_progress: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TuningReport {
    pub baseline: f64,
    pub best_config: Config,
    /// Fastest trial time; `+inf` if every trial failed.
    pub best_time: f64,
    pub best_speedup: f64,
    pub trials: usize,
}

pub struct TuningSession {
    options: TuneOptions,
    accumulator: ResultAccumulator,
}

impl TuningSession {
    pub fn new(options: TuneOptions) -> Self {
        Self {
            options,
            accumulator: ResultAccumulator::new(),
        }
    }

    pub fn accumulator(&self) -> &ResultAccumulator {
        &self.accumulator
    }

    /// Tune `target`, write the trial log to `output` and summarize the run.
    pub fn run<P: MeasurePipeline>(
        &mut self,
        target: &mut TargetDescriptor<P>,
        output: &Path,
    ) -> Result<TuningReport> {
        // Reject unsupported knobs before the first trial.
        declare_parameters(target.knob_space())?;

        let limits = SearchLimits {
            test_limit: self.options.test_limit,
        };

        for (index, (label, knobs)) in self.partitions(target).into_iter().enumerate() {
            let mut engine = self
                .options
                .technique
                .engine(self.options.seed.wrapping_add(index as u64), limits);
            let adapter = MeasurementAdapter::new(target, knobs, limits, self.options.show_progress);
            let result = adapter
                .drive(engine.as_mut())
                .with_context(|| format!("tuning {label} failed"))?;

            info!(partition = %label, config = ?result.best.as_map(), "partition done");
            target.merge_best(&result.best);
            self.accumulator.extend(result.records);
        }

        self.accumulator.finalize(output)?;

        let (best_time, best_speedup) = self
            .accumulator
            .best()
            .map_or((f64::INFINITY, 0.0), |record| (record.time, record.speedup));
        info!(
            seconds = best_time,
            speedup = best_speedup,
            output = %output.display(),
            "best trial"
        );

        Ok(TuningReport {
            baseline: target.baseline(),
            best_config: target.best_config().clone(),
            best_time,
            best_speedup,
            trials: self.accumulator.records().len(),
        })
    }

    fn partitions<P: MeasurePipeline>(&self, target: &TargetDescriptor<P>) -> Vec<(String, KnobSpace)> {
        if !self.options.partition {
            return vec![("all knobs".to_string(), target.knob_space().clone())];
        }
        let masks = target.list_masks();
        info!(operators = masks.len(), "partitioning by operator");
        masks
            .iter()
            .map(|mask| (mask.to_string(), target.filter_knobs(&mask.filter_pattern())))
            .collect()
    }
}
