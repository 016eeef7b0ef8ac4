//! L5X documents for Logix controller projects.
//!
//! Reading goes text → [`Document`] → [`Controller`] (rebound); writing goes
//! the other way. Whole projects use [`encode::encode`]; a single object and
//! its dependency closure use [`export::export`]. Literals stamped into every
//! output come from an [`ExportProfile`].

pub mod decode;
pub mod document;
pub mod encode;
pub mod error;
pub mod export;
pub mod profile;
pub mod reader;
pub mod value;
pub mod writer;

use std::fs;
use std::path::{Path, PathBuf};

use logix_core::Controller;

pub use document::{Document, Element, Node};
pub use error::{L5xError, Result};
pub use export::ExportTarget;
pub use profile::ExportProfile;

/// File extension of exported documents.
pub const EXTENSION: &str = "L5X";

/// Decode a project file into a rebound controller.
pub fn read_controller(path: &Path) -> Result<Controller> {
    let text = fs::read_to_string(path)?;
    decode::decode(&reader::parse(&text)?)
}

/// Write a full project file.
pub fn write_controller(path: &Path, controller: &Controller, profile: &ExportProfile) -> Result<()> {
    let document = encode::encode(controller, profile);
    fs::write(path, writer::write(&document, &profile.indent))?;
    Ok(())
}

/// Export one object to `path`, adding the `.L5X` extension when it has none.
///
/// Returns the path actually written.
pub fn export_to_file(
    controller: &Controller,
    target: ExportTarget<'_>,
    profile: &ExportProfile,
    path: &Path,
) -> Result<PathBuf> {
    let path = with_extension(path);
    let document = export::export(controller, target, profile)?;
    fs::write(&path, writer::write(&document, &profile.indent))?;
    Ok(path)
}

fn with_extension(path: &Path) -> PathBuf {
    let has_extension = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(EXTENSION));
    if has_extension {
        path.to_path_buf()
    } else {
        let mut name = path.as_os_str().to_os_string();
        name.push(".");
        name.push(EXTENSION);
        PathBuf::from(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logix_core::{DataType, DataTypeMember, Named, Program, Routine, Tag};

    fn controller() -> Controller {
        let mut c = Controller::new("PLC01");
        c.data_types.append(
            DataType::new("Motor").with_member(DataTypeMember::new("Speed", "DINT")),
            false,
        );
        c.tags.append(Tag::new("M1", "Motor"), false);
        c.programs.append(
            Program::new("Main").with_routine(Routine::new("MainRoutine").with_rung("OTE(M1.Speed);")),
            false,
        );
        c.rebind().unwrap();
        c
    }

    #[test]
    fn extension_is_added_once() {
        assert_eq!(with_extension(Path::new("out/pump")), PathBuf::from("out/pump.L5X"));
        assert_eq!(with_extension(Path::new("out/pump.l5x")), PathBuf::from("out/pump.l5x"));
        assert_eq!(with_extension(Path::new("out/v1.2")), PathBuf::from("out/v1.2.L5X"));
    }

    #[test]
    fn project_file_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plc.L5X");
        let profile = ExportProfile {
            indent: "  ".to_string(),
            ..ExportProfile::default()
        };
        write_controller(&path, &controller(), &profile).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert!(text.starts_with(writer::DECLARATION));
        let back = read_controller(&path).unwrap();
        assert_eq!(back.name(), "PLC01");
        assert!(back.data_types.contains("Motor"));
        let rung = &back.programs.by_name("Main").unwrap().routines.by_name("MainRoutine").unwrap().rungs[0];
        assert_eq!(rung.tags, vec![back.tags.id_of("M1").unwrap()]);
    }

    #[test]
    fn export_writes_standalone_document() {
        let dir = tempfile::tempdir().unwrap();
        let written = export_to_file(
            &controller(),
            ExportTarget::Tag("M1"),
            &ExportProfile::default(),
            &dir.path().join("M1"),
        )
        .unwrap();
        assert_eq!(written.file_name().and_then(|n| n.to_str()), Some("M1.L5X"));

        let document = reader::parse(&fs::read_to_string(&written).unwrap()).unwrap();
        assert_eq!(document.root.attr("TargetType"), Some("Tag"));
        let ctrl = document.root.child("Controller").unwrap();
        assert_eq!(ctrl.list("DataTypes", "DataType").len(), 1);
        assert_eq!(ctrl.list("Tags", "Tag")[0].attr("Use"), Some("Target"));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            read_controller(&dir.path().join("absent.L5X")),
            Err(L5xError::Io(_))
        ));
    }
}
