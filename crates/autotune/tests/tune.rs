#![cfg(unix)]

use anyhow::Result;
use knobtune_autotune::{load_log, Technique, TargetDescriptor, TuneOptions, TuningSession};
use knobtune_compiler::{CompilerSession, ExtraDefs, PipelineOptions, Toolchain};
use serde_json::json;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use tempfile::TempDir;

const FAKE_OPT: &str = r#"#!/bin/sh
out=""
knobs_out=""
knobs_in=""
while [ $# -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift ;;
    -print-knobs-to) knobs_out="$2"; shift ;;
    -read-knobs-from) knobs_in="$2"; shift ;;
  esac
  shift
done
if [ -n "$knobs_out" ]; then
  cp "@TOOLS@/knobs.json" "$knobs_out"
elif [ -n "$knobs_in" ]; then
  cp "$knobs_in" "@TOOLS@/assignment.json"
fi
echo "%3 = mul nsw i32 %1, %2" > "$out"
"#;

/// Programs built with `TileSize_M = 8` crash.
const FAKE_CLANG: &str = r#"#!/bin/sh
out=""
while [ $# -gt 0 ]; do
  case "$1" in
    -o) out="$2"; shift ;;
  esac
  shift
done
case "$out" in
  *.ll) echo "; ir" > "$out" ;;
  *)
    if grep -q '"TileSize_M":8' "@TOOLS@/assignment.json"; then
      printf '#!/bin/sh\nexit 1\n' > "$out"
    else
      printf '#!/bin/sh\nexit 0\n' > "$out"
    fi
    chmod +x "$out"
    ;;
esac
"#;

fn install_tools(dir: &Path) -> Result<Toolchain> {
    let root = dir.display().to_string();
    for (name, body) in [("opt", FAKE_OPT), ("clang", FAKE_CLANG)] {
        let path = dir.join(name);
        fs::write(&path, body.replace("@TOOLS@", &root))?;
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755))?;
    }
    fs::write(
        dir.join("knobs.json"),
        json!({
            "main": {
                "mul": {"TileSize_M": {"data_type": "int", "values": [2, 4, 8]}},
                "add": {"TileSize": {"data_type": "int", "data_range": [1, 2]}}
            }
        })
        .to_string(),
    )?;
    Ok(Toolchain {
        clang: dir.join("clang"),
        opt: dir.join("opt"),
        plugin: dir.join("LLVMTensor.so"),
    })
}

fn build_target(tools: &TempDir, work: &TempDir) -> Result<TargetDescriptor<CompilerSession>> {
    let program = work.path().join("matmul.c");
    fs::write(&program, "int main(void) { return 0; }\n")?;
    let session = CompilerSession::new(
        install_tools(tools.path())?,
        program,
        work.path(),
        ExtraDefs::default(),
        PipelineOptions {
            repeats: 1,
            debug: false,
        },
    )?;
    TargetDescriptor::new(session)
}

#[test]
fn crashing_config_is_logged_and_search_continues() -> Result<()> {
    let tools = tempfile::tempdir()?;
    let work = tempfile::tempdir()?;
    let mut target = build_target(&tools, &work)?;
    assert!(target.baseline().is_finite());

    let output = work.path().join("logs/configs.json");
    let options = TuneOptions {
        partition: true,
        technique: Technique::Exhaustive,
        show_progress: false,
        ..TuneOptions::default()
    };
    let report = TuningSession::new(options).run(&mut target, &output)?;

    // main.add: 2 trials, main.mul: 3 trials.
    assert_eq!(report.trials, 5);
    assert!(report.best_time.is_finite());
    assert_ne!(report.best_config.get("main.mul.TileSize_M"), Some(8));

    let log = load_log(&output)?;
    let iters: Vec<usize> = log.iter().map(|record| record.iter).collect();
    assert_eq!(iters, vec![0, 1, 3, 4, 5]);

    let crashed: Vec<_> = log.iter().filter(|record| record.failed()).collect();
    assert_eq!(crashed.len(), 1);
    assert_eq!(crashed[0].config.get("main.mul.TileSize_M"), Some(8));
    assert_eq!(crashed[0].speedup, 0.0);
    Ok(())
}

#[test]
fn discovery_failure_is_fatal() -> Result<()> {
    let tools = tempfile::tempdir()?;
    let work = tempfile::tempdir()?;
    let toolchain = install_tools(tools.path())?;
    fs::write(tools.path().join("knobs.json"), "not json")?;

    let program = work.path().join("matmul.c");
    fs::write(&program, "")?;
    let session = CompilerSession::new(
        toolchain,
        program,
        work.path(),
        ExtraDefs::default(),
        PipelineOptions::default(),
    )?;
    let err = TargetDescriptor::new(session).err().expect("discovery must fail");
    assert!(err.to_string().contains("knob discovery failed"));
    Ok(())
}
