//! Export profile: the fixed literals written into generated documents.

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Values stamped onto every exported document.
///
/// The defaults reproduce the historical output byte for byte; override them
/// to target a different software revision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct ExportProfile {
    pub schema_revision: String,
    pub software_revision: String,
    pub export_date: String,
    pub export_options: String,
    pub project_creation_date: String,
    pub last_modified_date: String,
    /// Written when an add-on instruction has no created date of its own.
    pub aoi_created_date: String,
    /// Written when an add-on instruction has no edited date of its own.
    pub aoi_edited_date: String,
    /// Emit scalar `BOOL` members of user types as `BIT`.
    pub scalar_bool_members_as_bit: bool,
    /// Per-level indentation of the output.
    pub indent: String,
}

impl Default for ExportProfile {
    fn default() -> Self {
        Self {
            schema_revision: "1.0".to_string(),
            software_revision: "32.04".to_string(),
            export_date: "Sat Jan 13 12:30:38 2024".to_string(),
            export_options: "References NoRawData L5KData DecoratedData Context Dependencies ForceProtectedEncoding AllProjDocTrans".to_string(),
            project_creation_date: "Fri Oct 06 12:49:55 2023".to_string(),
            last_modified_date: "Thu Jan 11 16:29:06 2024".to_string(),
            aoi_created_date: "2023-04-13T12:30:52.518Z".to_string(),
            aoi_edited_date: "2023-12-26T18:39:04.664Z".to_string(),
            scalar_bool_members_as_bit: true,
            indent: String::new(),
        }
    }
}

impl ExportProfile {
    /// Parse a profile from TOML; absent keys keep their defaults.
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_legacy_output() {
        let profile = ExportProfile::default();
        assert_eq!(profile.schema_revision, "1.0");
        assert_eq!(profile.software_revision, "32.04");
        assert!(profile.scalar_bool_members_as_bit);
        assert!(profile.indent.is_empty());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let profile = ExportProfile::from_toml("software-revision = \"35.11\"\nindent = \"  \"\n").unwrap();
        assert_eq!(profile.software_revision, "35.11");
        assert_eq!(profile.indent, "  ");
        assert_eq!(profile.export_date, ExportProfile::default().export_date);
    }

    #[test]
    fn rejects_wrong_types() {
        assert!(ExportProfile::from_toml("scalar-bool-members-as-bit = \"yes\"").is_err());
    }
}
