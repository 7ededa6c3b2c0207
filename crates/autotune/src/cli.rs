//! CLI wiring for knobtune.

use crate::session::{Technique, TuneOptions, TuningSession};
use crate::target::TargetDescriptor;
use anyhow::{Context, Result};
use clap::Parser;
use knobtune_compiler::{CompilerSession, ExtraDefs, PipelineOptions, Toolchain};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "knobtune", about = "Tune the lowering knobs of a tensor program")]
pub struct Cli {
    /// C source of the program to tune.
    pub program: PathBuf,

    /// Directory for intermediate artifacts.
    #[arg(short = 'd', long, default_value = ".")]
    pub workdir: PathBuf,

    /// Timed runs averaged per measurement.
    #[arg(
        short,
        long,
        default_value_t = 3,
        value_parser = clap::builder::RangedU64ValueParser::<usize>::new().range(1..)
    )]
    pub repeats: usize,

    /// JSON object of extra `-D` definitions for the front end.
    #[arg(long)]
    pub defs: Option<PathBuf>,

    /// Trial log; defaults to `<workdir>/configs.json`.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Tune each operator separately.
    #[arg(short, long, default_value_t = false)]
    pub partition: bool,

    /// Show compiler output.
    #[arg(long, default_value_t = false)]
    pub debug: bool,

    /// Evaluations per search.
    #[arg(long, default_value_t = 100)]
    pub test_limit: usize,

    #[arg(long, value_enum, default_value = "random")]
    pub technique: Technique,

    #[arg(long, default_value_t = 0)]
    pub seed: u64,

    /// LLVM build holding `bin/clang`, `bin/opt` and `lib/LLVMTensor.so`;
    /// falls back to `$KNOBTUNE_LLVM_BUILD_DIR`, then `../build`.
    #[arg(long)]
    pub llvm_build_dir: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub no_progress: bool,
}

impl Cli {
    fn tune_options(&self) -> TuneOptions {
        TuneOptions {
            partition: self.partition,
            test_limit: self.test_limit,
            technique: self.technique,
            seed: self.seed,
            show_progress: !self.no_progress,
        }
    }
}

pub fn run_cli(cli: Cli) -> Result<()> {
    tracing_subscriber::fmt::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let defs = match &cli.defs {
        Some(path) => ExtraDefs::load(path)
            .with_context(|| format!("invalid extra definitions in {}", path.display()))?,
        None => ExtraDefs::default(),
    };

    let toolchain = Toolchain::locate(cli.llvm_build_dir.clone());
    info!(clang = %toolchain.clang.display(), opt = %toolchain.opt.display(), "toolchain");

    let session = CompilerSession::new(
        toolchain,
        &cli.program,
        &cli.workdir,
        defs,
        PipelineOptions {
            repeats: cli.repeats,
            debug: cli.debug,
        },
    )?;
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| session.workdir().join("configs.json"));

    let mut target = TargetDescriptor::new(session)?;
    let report = TuningSession::new(cli.tune_options()).run(&mut target, &output)?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
