//! The program being tuned: its knob space, best-known config and baseline.

use anyhow::{bail, Context, Result};
use knobtune_compiler::{MeasurePipeline, PipelineError};
use knobtune_knobs::{Config, KnobSpace, Mask};
use std::collections::BTreeSet;
use tracing::{info, warn};

pub struct TargetDescriptor<P> {
    pipeline: P,
    space: KnobSpace,
    best: Config,
    baseline: f64,
}

impl<P: MeasurePipeline> TargetDescriptor<P> {
    /// Discover the knobs of the program and time it with every knob at its default.
    ///
    /// Fails when discovery fails, when the program has no knobs, or when the
    /// default build cannot be compiled or run.
    pub fn new(mut pipeline: P) -> Result<Self> {
        let space = pipeline.discover_knobs().context("knob discovery failed")?;
        if space.is_empty() {
            bail!("knob discovery found no tunable knobs");
        }

        let best = space.defaults();
        info!(config = ?best.as_map(), "default config");

        let baseline = pipeline
            .compile_run_measure(&best)
            .context("failed to measure the default config")?;
        if !baseline.is_finite() {
            bail!("the default config failed to run, no baseline to compare against");
        }
        info!(seconds = baseline, "baseline");

        Ok(Self {
            pipeline,
            space,
            best,
            baseline,
        })
    }

    /// Operators present in the knob space.
    pub fn list_masks(&self) -> BTreeSet<Mask> {
        self.space.masks()
    }

    /// Knobs whose path contains `mask` anywhere. Pass `function.operator.`
    /// to select exactly one operator.
    pub fn filter_knobs(&self, mask: &str) -> KnobSpace {
        self.space.filter(mask)
    }

    pub fn merge_best(&mut self, partial: &Config) {
        self.best.merge(partial);
    }

    /// Time `partial` with the remaining knobs taken from the best-known config.
    ///
    /// Build and launch failures score `+inf`; anything else is fatal.
    pub fn compile_run_measure(&mut self, partial: &Config) -> Result<f64, PipelineError> {
        let full = partial.completed_from(&self.best);
        match self.pipeline.compile_run_measure(&full) {
            Ok(seconds) => Ok(seconds),
            Err(err) if err.is_recoverable() => {
                warn!(config = ?partial.as_map(), error = %err, "trial failed to build");
                Ok(f64::INFINITY)
            }
            Err(err) => Err(err),
        }
    }

    pub fn baseline(&self) -> f64 {
        self.baseline
    }

    pub fn best_config(&self) -> &Config {
        &self.best
    }

    pub fn knob_space(&self) -> &KnobSpace {
        &self.space
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{sample_space, tool_failure, FakePipeline};

    #[test]
    fn test_baseline_uses_defaults() {
        let target = TargetDescriptor::new(FakePipeline::new(sample_space(), |_| Ok(2.0))).unwrap();
        assert_eq!(target.baseline(), 2.0);
        assert_eq!(target.best_config(), &sample_space().defaults());
        assert_eq!(target.pipeline().builds, vec![sample_space().defaults()]);
    }

    #[test]
    fn test_baseline_is_never_remeasured() {
        let mut target =
            TargetDescriptor::new(FakePipeline::new(sample_space(), |_| Ok(2.0))).unwrap();
        let mut partial = Config::new();
        partial.insert("main.mul.TileSize_M", 8);
        target.merge_best(&partial);
        target.compile_run_measure(&partial).unwrap();
        assert_eq!(target.baseline(), 2.0);
        assert_eq!(target.pipeline().builds.len(), 2);
    }

    #[test]
    fn test_empty_space_is_fatal() {
        let err = TargetDescriptor::new(FakePipeline::new(KnobSpace::default(), |_| Ok(1.0)))
            .err()
            .unwrap();
        assert!(err.to_string().contains("no tunable knobs"));
    }

    #[test]
    fn test_baseline_failures_are_fatal() {
        assert!(TargetDescriptor::new(FakePipeline::new(sample_space(), |_| Ok(f64::INFINITY)))
            .is_err());

        let err = TargetDescriptor::new(FakePipeline::new(sample_space(), |_| Err(tool_failure())))
            .err()
            .unwrap();
        assert!(err.downcast_ref::<PipelineError>().is_some());
    }

    #[test]
    fn test_merge_keeps_absent_knobs() {
        let mut target =
            TargetDescriptor::new(FakePipeline::new(sample_space(), |_| Ok(1.0))).unwrap();
        let before = target.best_config().clone();

        let mut partial = Config::new();
        partial.insert("main.mul.InnerLoopUnrollFactor", 3);
        target.merge_best(&partial);

        for (path, value) in target.best_config().iter() {
            if path == "main.mul.InnerLoopUnrollFactor" {
                assert_eq!(value, 3);
            } else {
                assert_eq!(Some(value), before.get(path));
            }
        }
    }

    #[test]
    fn test_partial_config_is_completed_from_best() {
        let mut target =
            TargetDescriptor::new(FakePipeline::new(sample_space(), |_| Ok(1.0))).unwrap();
        let mut merged = Config::new();
        merged.insert("main.add.TileSize", 4);
        target.merge_best(&merged);

        let mut partial = Config::new();
        partial.insert("main.mul.TileSize_M", 8);
        target.compile_run_measure(&partial).unwrap();

        let built = target.pipeline().builds.last().unwrap();
        assert_eq!(built.len(), sample_space().len());
        assert_eq!(built.get("main.mul.TileSize_M"), Some(8));
        assert_eq!(built.get("main.add.TileSize"), Some(4));
    }

    #[test]
    fn test_build_failure_scores_infinity() {
        let mut calls = 0;
        let mut target = TargetDescriptor::new(FakePipeline::new(sample_space(), move |_| {
            calls += 1;
            if calls == 1 {
                Ok(1.0)
            } else {
                Err(tool_failure())
            }
        }))
        .unwrap();
        assert_eq!(target.compile_run_measure(&Config::new()).unwrap(), f64::INFINITY);
    }

    #[test]
    fn test_filter_uses_contains() {
        let target = TargetDescriptor::new(FakePipeline::new(sample_space(), |_| Ok(1.0))).unwrap();
        let masks: Vec<String> = target.list_masks().iter().map(ToString::to_string).collect();
        assert_eq!(masks, vec!["main.add", "main.mul"]);
        assert_eq!(target.filter_knobs("main.mul.").len(), 2);
        assert_eq!(target.filter_knobs("TileSize").len(), 2);
    }
}
