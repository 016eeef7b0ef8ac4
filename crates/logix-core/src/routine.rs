//! Routines and rungs.

use crate::aoi::AddOnInstruction;
use crate::collection::{Id, Named};
use crate::description::DescriptionProperties;
use crate::error::Result;
use crate::name;
use crate::substitute::Substitution;
use crate::tag::Tag;
use crate::vocab::{RoutineType, RungType};

/// One unit of ladder logic.
#[derive(Debug, Clone, PartialEq)]
pub struct Rung {
    pub number: u32,
    pub rung_type: Option<RungType>,
    pub text: Option<String>,
    pub comment: Option<String>,
    /// Mnemonics mined from the text.
    pub instructions: Vec<String>,
    /// Controller-scope tags referenced by the text.
    pub tags: Vec<Id<Tag>>,
    /// Tags of the owning program referenced by the text.
    pub program_tags: Vec<Id<Tag>>,
    pub add_on_instructions: Vec<Id<AddOnInstruction>>,
}

impl Rung {
    pub fn new(number: u32, text: impl Into<String>) -> Self {
        Self {
            number,
            rung_type: Some(RungType::Normal),
            text: Some(text.into()),
            comment: None,
            instructions: Vec::new(),
            tags: Vec::new(),
            program_tags: Vec::new(),
            add_on_instructions: Vec::new(),
        }
    }

    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn text(&self) -> &str {
        self.text.as_deref().unwrap_or_default()
    }

    /// Drop every resolved reference. Used before moving a rung into
    /// another controller.
    pub fn clear_references(&mut self) {
        self.tags.clear();
        self.program_tags.clear();
        self.add_on_instructions.clear();
    }

    pub fn rename_strings(&mut self, substitution: &Substitution) {
        if let Some(text) = &mut self.text {
            *text = substitution.apply(text);
        }
        if let Some(comment) = &mut self.comment {
            *comment = substitution.apply(comment);
        }
    }
}

/// An ordered list of rungs.
#[derive(Debug, Clone, PartialEq)]
pub struct Routine {
    name: String,
    pub description: Option<String>,
    pub routine_type: Option<RoutineType>,
    pub rungs: Vec<Rung>,
    pub properties: DescriptionProperties,
}

impl Routine {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            routine_type: Some(RoutineType::Rll),
            rungs: Vec::new(),
            properties: DescriptionProperties::default(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        let description = description.into();
        self.properties = DescriptionProperties::parse(Some(&description));
        self.description = Some(description);
        self
    }

    pub fn with_rung(mut self, text: impl Into<String>) -> Self {
        let number = self.rungs.len() as u32;
        self.rungs.push(Rung::new(number, text));
        self
    }

    pub fn set_name(&mut self, new_name: &str) -> Result<()> {
        name::validate(new_name)?;
        self.name = new_name.to_string();
        Ok(())
    }

    /// Role declared in the description metadata.
    pub fn role(&self) -> Option<&str> {
        self.properties.role()
    }

    pub fn clear_references(&mut self) {
        self.rungs.iter_mut().for_each(Rung::clear_references);
    }

    /// Apply a text substitution to name, description and every rung.
    pub fn rename_strings(&mut self, substitution: &Substitution) -> Result<()> {
        let renamed = substitution.apply(&self.name);
        if renamed != self.name {
            self.set_name(&renamed)?;
        }
        if let Some(description) = &mut self.description {
            *description = substitution.apply(description);
        }
        for rung in &mut self.rungs {
            rung.rename_strings(substitution);
        }
        Ok(())
    }
}

impl Named for Routine {
    fn name(&self) -> &str {
        &self.name
    }
}
