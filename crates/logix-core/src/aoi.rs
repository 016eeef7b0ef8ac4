//! Add-on instruction definitions.

use crate::collection::{Collection, Id, Named};
use crate::datatype::DataType;
use crate::description::DescriptionProperties;
use crate::error::Result;
use crate::name;
use crate::routine::Routine;
use crate::vocab::{ExternalAccess, LogixClass, Radix, TagType, TagUsage};

/// A parameter of an add-on instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct AoiParameter {
    name: String,
    pub description: Option<String>,
    pub tag_type: TagType,
    pub data_type_name: Option<String>,
    pub dimensions: Option<u32>,
    pub usage: Option<TagUsage>,
    pub radix: Option<Radix>,
    pub required: bool,
    pub visible: bool,
    pub external_access: Option<ExternalAccess>,
    pub constant: Option<bool>,
    /// Resolved by rebind.
    pub data_type: Option<Id<DataType>>,
}

impl AoiParameter {
    pub fn new(name: impl Into<String>, data_type_name: impl Into<String>, usage: TagUsage) -> Self {
        Self {
            name: name.into(),
            description: None,
            tag_type: TagType::Base,
            data_type_name: Some(data_type_name.into()),
            dimensions: None,
            usage: Some(usage),
            radix: None,
            required: false,
            visible: false,
            external_access: None,
            constant: None,
            data_type: None,
        }
    }

    pub fn set_name(&mut self, new_name: &str) -> Result<()> {
        name::validate(new_name)?;
        self.name = new_name.to_string();
        Ok(())
    }
}

impl Named for AoiParameter {
    fn name(&self) -> &str {
        &self.name
    }
}

/// A tag local to an add-on instruction.
#[derive(Debug, Clone, PartialEq)]
pub struct LocalTag {
    name: String,
    pub description: Option<String>,
    pub data_type_name: Option<String>,
    pub dimensions: Option<u32>,
    pub radix: Option<Radix>,
    pub external_access: Option<ExternalAccess>,
    /// Resolved by rebind.
    pub data_type: Option<Id<DataType>>,
}

impl LocalTag {
    pub fn new(name: impl Into<String>, data_type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            data_type_name: Some(data_type_name.into()),
            dimensions: None,
            radix: None,
            external_access: None,
            data_type: None,
        }
    }

    pub fn set_name(&mut self, new_name: &str) -> Result<()> {
        name::validate(new_name)?;
        self.name = new_name.to_string();
        Ok(())
    }
}

impl Named for LocalTag {
    fn name(&self) -> &str {
        &self.name
    }
}

/// A reusable instruction with its own parameters, local tags and body.
#[derive(Debug, Clone, PartialEq)]
pub struct AddOnInstruction {
    name: String,
    pub description: Option<String>,
    pub class: Option<LogixClass>,
    pub revision: Option<String>,
    pub vendor: Option<String>,
    pub execute_prescan: bool,
    pub execute_postscan: bool,
    pub execute_enable_in_false: bool,
    pub created_date: Option<String>,
    pub created_by: Option<String>,
    pub edited_date: Option<String>,
    pub edited_by: Option<String>,
    pub software_revision: Option<String>,
    pub revision_note: Option<String>,
    pub parameters: Vec<AoiParameter>,
    pub local_tags: Vec<LocalTag>,
    pub routines: Collection<Routine>,
    pub properties: DescriptionProperties,
}

impl AddOnInstruction {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            class: Some(LogixClass::Standard),
            revision: Some("1.0".into()),
            vendor: None,
            execute_prescan: false,
            execute_postscan: false,
            execute_enable_in_false: false,
            created_date: None,
            created_by: None,
            edited_date: None,
            edited_by: None,
            software_revision: None,
            revision_note: None,
            parameters: Vec::new(),
            local_tags: Vec::new(),
            routines: Collection::new(),
            properties: DescriptionProperties::default(),
        }
    }

    pub fn with_parameter(mut self, parameter: AoiParameter) -> Self {
        self.parameters.push(parameter);
        self
    }

    pub fn with_local_tag(mut self, tag: LocalTag) -> Self {
        self.local_tags.push(tag);
        self
    }

    pub fn with_routine(mut self, routine: Routine) -> Self {
        self.routines.append(routine, true);
        self
    }

    pub fn set_name(&mut self, new_name: &str) -> Result<()> {
        name::validate(new_name)?;
        self.name = new_name.to_string();
        Ok(())
    }
}

impl Named for AddOnInstruction {
    fn name(&self) -> &str {
        &self.name
    }
}
