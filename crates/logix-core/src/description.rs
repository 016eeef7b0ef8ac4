//! Metadata embedded in description text.
//!
//! Descriptions may carry bracketed tokens such as
//! `<@PROGRAM> <@TYPE MAIN> <@VERSION 1.2>`. The first token names the kind of
//! object, the remaining tokens are keyed properties. Roles used by the push
//! engine come from the `@TYPE` property.

use serde::Serialize;

use crate::vocab::DescriptionIdentifier;

const TYPE_KEY: &str = "@TYPE";
const VERSION_KEY: &str = "@VERSION";
const DESC_KEY: &str = "@DESC";
const NO_EDITS_KEY: &str = "@NOEDITS";

/// Properties parsed out of a description.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DescriptionProperties {
    pub identifier: Option<DescriptionIdentifier>,
    pub kind: Option<String>,
    pub version: Option<String>,
    pub description: Option<String>,
    /// `None` when the description carries no metadata at all.
    pub editable: Option<bool>,
}

impl DescriptionProperties {
    /// Parse the metadata tokens of a description. Plain text yields the default.
    pub fn parse(description: Option<&str>) -> Self {
        let tokens = match description {
            Some(text) => scan_tokens(text),
            None => return Self::default(),
        };
        Self::from_tokens(&tokens)
    }

    /// Build properties from already-scanned tokens.
    pub fn from_tokens(tokens: &[String]) -> Self {
        let Some(first) = tokens.first() else {
            return Self::default();
        };
        Self {
            identifier: DescriptionIdentifier::parse(first.trim()),
            kind: keyed(tokens, TYPE_KEY),
            version: keyed(tokens, VERSION_KEY),
            description: keyed(tokens, DESC_KEY),
            editable: Some(!tokens.iter().any(|t| t.trim() == NO_EDITS_KEY)),
        }
    }

    /// The role declared with `@TYPE`, if any and non-empty.
    pub fn role(&self) -> Option<&str> {
        self.kind.as_deref().filter(|k| !k.is_empty())
    }
}

fn keyed(tokens: &[String], key: &str) -> Option<String> {
    tokens
        .iter()
        .find(|t| t.contains(key))
        .map(|t| t.replace(key, "").trim().to_string())
}

/// Collect the contents of every `<...>` pair in `text`, left to right.
///
/// An opening bracket without a closing one ends the scan.
pub fn scan_tokens(text: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut rest = text;
    while let Some(open) = rest.find('<') {
        let after_open = &rest[open + 1..];
        let Some(close) = after_open.find('>') else {
            break;
        };
        tokens.push(after_open[..close].trim().to_string());
        rest = &after_open[close + 1..];
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scans_tokens_in_order() {
        let tokens = scan_tokens("Pump <@PROGRAM> text <@TYPE MAIN><@VERSION 2.1>");
        assert_eq!(tokens, vec!["@PROGRAM", "@TYPE MAIN", "@VERSION 2.1"]);
    }

    #[test]
    fn unterminated_bracket_stops_scan() {
        assert_eq!(scan_tokens("<@ROUTINE> <@TYPE DRIVER"), vec!["@ROUTINE"]);
        assert!(scan_tokens("no metadata here").is_empty());
    }

    #[test]
    fn parses_properties() {
        let props = DescriptionProperties::parse(Some(
            "<@ROUTINE> <@TYPE DRIVER> <@VERSION 1.0> <@DESC Drives the pump>",
        ));
        assert_eq!(props.identifier, Some(DescriptionIdentifier::Routine));
        assert_eq!(props.role(), Some("DRIVER"));
        assert_eq!(props.version.as_deref(), Some("1.0"));
        assert_eq!(props.description.as_deref(), Some("Drives the pump"));
        assert_eq!(props.editable, Some(true));
    }

    #[test]
    fn no_edits_flag() {
        let props = DescriptionProperties::parse(Some("<@DATATYPE> <@NOEDITS>"));
        assert_eq!(props.editable, Some(false));
        assert_eq!(props.kind, None);
    }

    #[test]
    fn plain_text_has_no_metadata() {
        let props = DescriptionProperties::parse(Some("just a comment"));
        assert_eq!(props, DescriptionProperties::default());
        assert_eq!(props.editable, None);
        assert_eq!(DescriptionProperties::parse(None), DescriptionProperties::default());
    }

    #[test]
    fn unknown_identifier() {
        let props = DescriptionProperties::parse(Some("<@WIDGET> <@TYPE MAIN>"));
        assert_eq!(props.identifier, None);
        assert_eq!(props.role(), Some("MAIN"));
    }
}
