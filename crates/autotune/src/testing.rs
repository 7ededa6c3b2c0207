//! In-memory pipeline for unit tests.

use knobtune_compiler::{MeasurePipeline, PipelineError};
use knobtune_knobs::{Config, Knob, KnobSpace};
use std::collections::BTreeMap;
use std::io;
use std::path::PathBuf;

type CostFn = Box<dyn FnMut(&Config) -> Result<f64, PipelineError>>;

pub(crate) struct FakePipeline {
    space: KnobSpace,
    cost: CostFn,
    pub builds: Vec<Config>,
}

impl FakePipeline {
    pub fn new(
        space: KnobSpace,
        cost: impl FnMut(&Config) -> Result<f64, PipelineError> + 'static,
    ) -> Self {
        Self {
            space,
            cost: Box::new(cost),
            builds: Vec::new(),
        }
    }
}

impl MeasurePipeline for FakePipeline {
    fn discover_knobs(&mut self) -> Result<KnobSpace, PipelineError> {
        Ok(self.space.clone())
    }

    fn compile_run_measure(&mut self, config: &Config) -> Result<f64, PipelineError> {
        self.builds.push(config.clone());
        (self.cost)(config)
    }
}

/// Two operators: `main.mul` with two knobs and `main.add` with one.
pub(crate) fn sample_space() -> KnobSpace {
    let knobs = BTreeMap::from([
        (
            "main.mul.TileSize_M".to_string(),
            Knob::values([8, 2, 4]).unwrap(),
        ),
        (
            "main.mul.InnerLoopUnrollFactor".to_string(),
            Knob::range(0, 3).unwrap(),
        ),
        ("main.add.TileSize".to_string(), Knob::range(1, 4).unwrap()),
    ]);
    KnobSpace::from_knobs(knobs).unwrap()
}

/// Smooth cost with its minimum at tile 4, unroll 2, add tile 3.
pub(crate) fn bowl(config: &Config) -> Result<f64, PipelineError> {
    let distance = |path: &str, target: i64| {
        config
            .get(path)
            .map_or(0.0, |value| (value - target).abs() as f64)
    };
    Ok(1.0
        + distance("main.mul.TileSize_M", 4)
        + distance("main.mul.InnerLoopUnrollFactor", 2)
        + distance("main.add.TileSize", 3))
}

pub(crate) fn tool_failure() -> PipelineError {
    PipelineError::Spawn {
        program: "clang".into(),
        source: io::Error::new(io::ErrorKind::NotFound, "no such file"),
    }
}

pub(crate) fn anomaly() -> PipelineError {
    PipelineError::Anomaly {
        path: PathBuf::from("matmul.lowered.opt.ll"),
        config: "{}".into(),
    }
}
