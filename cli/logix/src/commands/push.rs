//! `logix push`: merge a master project into site projects.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::info;

use logix_l5x::ExportProfile;
use logix_sync::PushOptions;

/// Where the merged copy of `target` is written.
///
/// With an output directory the file keeps its name; otherwise it is written
/// beside the target with a `_pushed` suffix so the original survives.
pub fn output_path(target: &Path, out_dir: Option<&Path>) -> PathBuf {
    let file_name = target.file_name().map(PathBuf::from).unwrap_or_default();
    match out_dir {
        Some(dir) => dir.join(file_name),
        None => {
            let stem = target.file_stem().and_then(|s| s.to_str()).unwrap_or("target");
            let extension = target.extension().and_then(|e| e.to_str()).unwrap_or(logix_l5x::EXTENSION);
            target.with_file_name(format!("{stem}_pushed.{extension}"))
        }
    }
}

/// Push `master` into each of `targets`, one target graph at a time.
pub fn run(
    master: &Path,
    targets: &[PathBuf],
    out_dir: Option<&Path>,
    options: &PushOptions,
    profile: &ExportProfile,
) -> Result<()> {
    let source =
        logix_l5x::read_controller(master).with_context(|| format!("reading {}", master.display()))?;
    if let Some(dir) = out_dir {
        std::fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }

    for path in targets {
        let mut target =
            logix_l5x::read_controller(path).with_context(|| format!("reading {}", path.display()))?;
        let report = logix_sync::push_controller(&source, &mut target, options)
            .with_context(|| format!("pushing into {}", path.display()))?;

        let output = output_path(path, out_dir);
        logix_l5x::write_controller(&output, &target, profile)
            .with_context(|| format!("writing {}", output.display()))?;
        info!(target = %path.display(), output = %output.display(), "wrote merged project");

        println!("{} -> {}", path.display(), output.display());
        print!("{report}");
    }
    Ok(())
}
