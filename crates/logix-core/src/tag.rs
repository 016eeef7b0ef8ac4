//! Tags.

use crate::collection::{Id, Named};
use crate::datatype::DataType;
use crate::description::DescriptionProperties;
use crate::error::Result;
use crate::name;
use crate::substitute::Substitution;
use crate::value::TagValue;
use crate::vocab::{ExternalAccess, LogixClass, Radix, TagType, TagUsage};

/// Where a resolved tag reference points.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TagRef {
    /// A controller-scope tag.
    Controller(Id<Tag>),
    /// A tag of the program that owns the referencing object.
    Program(Id<Tag>),
}

/// A named data point, owned by the controller or by a program.
#[derive(Debug, Clone, PartialEq)]
pub struct Tag {
    name: String,
    pub description: Option<String>,
    pub class: Option<LogixClass>,
    pub tag_type: TagType,
    /// Declared type. For aliases this is inherited from the target by rebind
    /// and never written out.
    pub data_type_name: Option<String>,
    /// Target of an alias; authoritative over `data_type_name` when set.
    pub alias_for: Option<String>,
    /// Up to three array dimensions; empty for scalars.
    pub dimensions: Vec<u32>,
    pub radix: Option<Radix>,
    pub constant: bool,
    pub usage: Option<TagUsage>,
    pub external_access: Option<ExternalAccess>,
    pub value: Option<TagValue>,
    pub properties: DescriptionProperties,
    /// Resolved by rebind.
    pub data_type: Option<Id<DataType>>,
    /// Resolved by rebind for aliases.
    pub alias_target: Option<TagRef>,
}

impl Tag {
    /// A base tag of the given type.
    pub fn new(name: impl Into<String>, data_type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            class: None,
            tag_type: TagType::Base,
            data_type_name: Some(data_type_name.into()),
            alias_for: None,
            dimensions: Vec::new(),
            radix: None,
            constant: false,
            usage: None,
            external_access: Some(ExternalAccess::ReadWrite),
            value: None,
            properties: DescriptionProperties::default(),
            data_type: None,
            alias_target: None,
        }
    }

    /// An alias of `target`.
    pub fn alias(name: impl Into<String>, target: impl Into<String>) -> Self {
        Self {
            tag_type: TagType::Alias,
            data_type_name: None,
            alias_for: Some(target.into()),
            ..Self::new(name, "")
        }
    }

    pub fn with_dimensions(mut self, dimensions: Vec<u32>) -> Self {
        self.dimensions = dimensions;
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn set_name(&mut self, new_name: &str) -> Result<()> {
        name::validate(new_name)?;
        self.name = new_name.to_string();
        Ok(())
    }

    pub fn is_alias(&self) -> bool {
        self.alias_for.as_deref().is_some_and(|a| !a.is_empty())
    }

    /// Name of the tag an alias ultimately stores into, without member or
    /// index suffixes (`Pump.Run` and `Pumps[3]` both yield the base tag).
    pub fn alias_base(&self) -> Option<&str> {
        let alias = self.alias_for.as_deref().filter(|a| !a.is_empty())?;
        let end = alias.find(['.', '[']).unwrap_or(alias.len());
        Some(&alias[..end])
    }

    /// Apply a text substitution to name, description and alias target.
    ///
    /// Fails without touching the name if the substituted name is invalid.
    pub fn rename_strings(&mut self, substitution: &Substitution) -> Result<()> {
        let renamed = substitution.apply(&self.name);
        if renamed != self.name {
            self.set_name(&renamed)?;
        }
        if let Some(description) = &mut self.description {
            *description = substitution.apply(description);
        }
        if let Some(alias) = &mut self.alias_for {
            *alias = substitution.apply(alias);
        }
        Ok(())
    }
}

impl Named for Tag {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Parse a space-separated `Dimensions` attribute (`"10"`, `"2 5"`, `"2 3 4"`).
///
/// Malformed text and more than three dimensions yield an empty list.
pub fn parse_dimensions(text: &str) -> Vec<u32> {
    let parsed: std::result::Result<Vec<u32>, _> =
        text.split_whitespace().map(str::parse::<u32>).collect();
    match parsed {
        Ok(dims) if dims.len() <= 3 => dims,
        _ => Vec::new(),
    }
}

/// Format dimensions the way a `Tag` element spells them.
pub fn format_dimensions(dimensions: &[u32]) -> String {
    dimensions
        .iter()
        .map(u32::to_string)
        .collect::<Vec<_>>()
        .join(" ")
}
