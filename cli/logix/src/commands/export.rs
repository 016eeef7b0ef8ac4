//! `logix export`: write one object and its dependency closure.

use std::path::Path;

use anyhow::{bail, Context, Result};
use clap::ValueEnum;

use logix_l5x::{ExportProfile, ExportTarget};

/// Object kinds accepted by `--kind`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportKind {
    Datatype,
    Tag,
    Aoi,
    Program,
    Routine,
    Module,
    Task,
}

/// Map the command-line selection onto an export target.
pub fn target<'a>(kind: ExportKind, name: &'a str, program: Option<&'a str>) -> Result<ExportTarget<'a>> {
    if program.is_some() && kind != ExportKind::Routine {
        bail!("--program only applies to --kind routine");
    }
    Ok(match kind {
        ExportKind::Datatype => ExportTarget::DataType(name),
        ExportKind::Tag => ExportTarget::Tag(name),
        ExportKind::Aoi => ExportTarget::AddOnInstruction(name),
        ExportKind::Program => ExportTarget::Program(name),
        ExportKind::Routine => match program {
            Some(program) => ExportTarget::Routine { program, routine: name },
            None => bail!("exporting a routine requires --program"),
        },
        ExportKind::Module => ExportTarget::Module(name),
        ExportKind::Task => ExportTarget::Task(name),
    })
}

pub fn run(
    file: &Path,
    kind: ExportKind,
    name: &str,
    program: Option<&str>,
    out: &Path,
    profile: &ExportProfile,
) -> Result<()> {
    let target = target(kind, name, program)?;
    let controller =
        logix_l5x::read_controller(file).with_context(|| format!("reading {}", file.display()))?;
    let written = logix_l5x::export_to_file(&controller, target, profile, out)
        .with_context(|| format!("exporting {} '{name}'", target.target_type()))?;
    println!("Exported {} '{name}' to {}", target.target_type(), written.display());
    Ok(())
}
