//! Programs and routine roles.

use std::fmt;

use crate::collection::{Collection, Named};
use crate::description::DescriptionProperties;
use crate::error::{CoreError, Result};
use crate::name;
use crate::routine::Routine;
use crate::substitute::Substitution;
use crate::tag::Tag;
use crate::vocab::LogixClass;

/// Role of a program or routine, declared with `<@TYPE ...>` in its description.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    Main,
    Driver,
    Internal,
    Device,
    Other(String),
}

impl Role {
    pub fn parse(text: &str) -> Self {
        match text {
            "MAIN" => Role::Main,
            "DRIVER" => Role::Driver,
            "INTERNAL" => Role::Internal,
            "DEVICE" => Role::Device,
            other => Role::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Role::Main => "MAIN",
            Role::Driver => "DRIVER",
            Role::Internal => "INTERNAL",
            Role::Device => "DEVICE",
            Role::Other(other) => other,
        }
    }

    /// Role declared by `properties`, if any.
    pub fn of(properties: &DescriptionProperties) -> Option<Role> {
        properties.role().map(Role::parse)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A program owning its own tags and routines.
#[derive(Debug, Clone, PartialEq)]
pub struct Program {
    name: String,
    pub description: Option<String>,
    pub test_edits: bool,
    pub main_routine_name: Option<String>,
    pub disabled: bool,
    pub class: Option<LogixClass>,
    pub use_as_folder: bool,
    pub tags: Collection<Tag>,
    pub routines: Collection<Routine>,
    pub properties: DescriptionProperties,
}

impl Program {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            test_edits: false,
            main_routine_name: None,
            disabled: false,
            class: Some(LogixClass::Standard),
            use_as_folder: false,
            tags: Collection::new(),
            routines: Collection::new(),
            properties: DescriptionProperties::default(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        self.properties = DescriptionProperties::parse(Some(&description));
        self.description = Some(description);
        self
    }

    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tags.append(tag, true);
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

    pub fn role(&self) -> Option<Role> {
        Role::of(&self.properties)
    }

    /// First routine declared as `MAIN`.
    pub fn main_routine(&self) -> Option<&Routine> {
        self.routines_with(Role::Main).next()
    }

    pub fn driver_routines(&self) -> impl Iterator<Item = &Routine> {
        self.routines_with(Role::Driver)
    }

    pub fn internal_routines(&self) -> impl Iterator<Item = &Routine> {
        self.routines_with(Role::Internal)
    }

    fn routines_with(&self, role: Role) -> impl Iterator<Item = &Routine> {
        self.routines
            .iter()
            .filter(move |r| Role::of(&r.properties).as_ref() == Some(&role))
    }

    /// Apply a substitution to the program and everything it owns.
    ///
    /// Entries are rebuilt so the name indexes stay consistent. Nothing
    /// changes when a new name is invalid or two entries would collide.
    pub fn rename_strings(&mut self, substitution: &Substitution) -> Result<()> {
        let name = substitution.apply(&self.name);
        name::validate(&name)?;
        let tags = renamed(&self.tags, |tag| tag.rename_strings(substitution))?;
        let routines = renamed(&self.routines, |routine| routine.rename_strings(substitution))?;

        self.name = name;
        if let Some(description) = &mut self.description {
            *description = substitution.apply(description);
        }
        self.tags = tags;
        self.routines = routines;
        Ok(())
    }
}

fn renamed<T: Named + Clone>(
    items: &Collection<T>,
    mut rename: impl FnMut(&mut T) -> Result<()>,
) -> Result<Collection<T>> {
    let mut out = Collection::new();
    for item in items.iter() {
        let mut item = item.clone();
        rename(&mut item)?;
        if out.contains(item.name()) {
            return Err(CoreError::InvalidName {
                name: item.name().to_string(),
                reason: "renamed onto another entry".into(),
            });
        }
        out.append(item, false);
    }
    Ok(out)
}

impl Named for Program {
    fn name(&self) -> &str {
        &self.name
    }
}
