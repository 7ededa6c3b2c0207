//! Location of the LLVM tools and the tensor lowering plugin.

use crate::pipeline::Stage;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Environment variable naming the LLVM build directory.
pub const BUILD_DIR_ENV: &str = "KNOBTUNE_LLVM_BUILD_DIR";

/// Build directory used when neither the CLI nor the environment names one.
pub const DEFAULT_BUILD_DIR: &str = "../build";

/// File name of the lowering plugin inside `<build>/lib`.
pub const PLUGIN_NAME: &str = "LLVMTensor.so";

/// Front-end flags for emitting unoptimized, still optimizable IR.
pub const DISCOVERY_CLANG_FLAGS: &[&str] = &[
    "-S",
    "-emit-llvm",
    "-O0",
    "-Xclang",
    "-disable-O0-optnone",
    "-mavx512f",
];

/// Fixed optimization sequence run after lowering.
///
/// Roughly `-O2` minus `-indvars -loop-deletion -loop-unroll -sroa
/// -instcombine`, which reshape the loops the knobs control.
pub const OPT_PASSES: &[&str] = &[
    "-targetlibinfo",
    "-tti",
    "-tbaa",
    "-scoped-noalias-aa",
    "-assumption-cache-tracker",
    "-profile-summary-info",
    "-forceattrs",
    "-inferattrs",
    "-ipsccp",
    "-called-value-propagation",
    "-globalopt",
    "-domtree",
    "-mem2reg",
    "-deadargelim",
    "-basic-aa",
    "-aa",
    "-loops",
    "-lazy-branch-prob",
    "-lazy-block-freq",
    "-opt-remark-emitter",
    "-simplifycfg",
    "-basiccg",
    "-globals-aa",
    "-prune-eh",
    "-inline",
    "-function-attrs",
    "-memoryssa",
    "-early-cse-memssa",
    "-speculative-execution",
    "-lazy-value-info",
    "-jump-threading",
    "-correlated-propagation",
    "-libcalls-shrinkwrap",
    "-branch-prob",
    "-block-freq",
    "-pgo-memop-opt",
    "-tailcallelim",
    "-reassociate",
    "-loop-simplify",
    "-lcssa-verification",
    "-lcssa",
    "-scalar-evolution",
    "-loop-rotate",
    "-licm",
    "-loop-unswitch",
    "-loop-idiom",
    "-memdep",
    "-memcpyopt",
    "-sccp",
    "-demanded-bits",
    "-bdce",
    "-dse",
    "-postdomtree",
    "-barrier",
    "-rpo-function-attrs",
    "-globaldce",
    "-float2int",
    "-loop-accesses",
    "-loop-distribute",
    "-loop-vectorize",
    "-loop-load-elim",
    "-alignment-from-assumptions",
    "-strip-dead-prototypes",
    "-loop-sink",
    "-instsimplify",
    "-div-rem-pairs",
    "-verify",
    "-ee-instrument",
    "-early-cse",
    "-lower-expect",
    "-inline",
    "-mldst-motion",
    "-gvn",
    "-elim-avail-extern",
    "-slp-vectorizer",
    "-constmerge",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolchain {
    pub clang: PathBuf,
    pub opt: PathBuf,
    pub plugin: PathBuf,
}

impl Toolchain {
    pub fn from_build_dir(build_dir: impl AsRef<Path>) -> Self {
        let build_dir = build_dir.as_ref();
        Self {
            clang: build_dir.join("bin/clang"),
            opt: build_dir.join("bin/opt"),
            plugin: build_dir.join("lib").join(PLUGIN_NAME),
        }
    }

    /// Resolve the build directory: explicit path, then `KNOBTUNE_LLVM_BUILD_DIR`,
    /// then [`DEFAULT_BUILD_DIR`].
    pub fn locate(explicit: Option<PathBuf>) -> Self {
        let build_dir = explicit
            .or_else(|| std::env::var_os(BUILD_DIR_ENV).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_BUILD_DIR));
        Self::from_build_dir(build_dir)
    }

    /// `clang` stage with the given flags.
    pub fn clang_stage<I, S>(&self, suffix: &str, flags: I) -> Stage
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Stage::new(suffix, &self.clang, flags)
    }

    /// `opt` stage with the lowering plugin loaded; emits textual IR.
    pub fn plugin_stage<I, S>(&self, suffix: &str, flags: I) -> Stage
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        let mut args: Vec<OsString> = vec!["-load".into(), self.plugin.clone().into()];
        args.extend(flags.into_iter().map(Into::into));
        Stage::new(suffix, &self.opt, args).textual()
    }

    /// `opt` stage running [`OPT_PASSES`]; emits textual IR.
    pub fn optimize_stage(&self, suffix: &str) -> Stage {
        Stage::new(suffix, &self.opt, OPT_PASSES.iter().copied()).textual()
    }
}
