//! The controller aggregate.
//!
//! A [`Controller`] exclusively owns the top-level collections of a project.
//! Objects move in and out through the closed [`Entity`] variant; cross
//! references between them are name strings plus ids filled in by
//! [`Controller::rebind`].

use std::fmt;

use tracing::debug;

use crate::aoi::AddOnInstruction;
use crate::closure::Dependencies;
use crate::collection::{Collection, Named};
use crate::datatype::DataType;
use crate::description::DescriptionProperties;
use crate::error::Result;
use crate::module::Module;
use crate::name;
use crate::program::Program;
use crate::tag::Tag;
use crate::task::Task;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RedundancyInfo {
    pub enabled: bool,
    pub keep_test_edits_on_switch_over: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SecurityInfo {
    pub code: u32,
    pub changes_to_detect: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SafetyInfo {
    pub safety_signature: Option<String>,
    pub safety_locked: bool,
    pub safety_lock_password: Option<String>,
    pub safety_unlock_password: Option<String>,
    pub signature_run_mode_protect: bool,
    pub configure_safety_io_always: bool,
    pub safety_level: Option<String>,
    pub safety_tag_map: Vec<String>,
}

/// Kind of a top-level controller object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    DataType,
    Module,
    AddOnInstruction,
    Tag,
    Program,
    Task,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::DataType => "data type",
            EntityKind::Module => "module",
            EntityKind::AddOnInstruction => "add-on instruction",
            EntityKind::Tag => "tag",
            EntityKind::Program => "program",
            EntityKind::Task => "task",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any object a controller owns at the top level.
#[derive(Debug, Clone, PartialEq)]
pub enum Entity {
    DataType(DataType),
    Module(Module),
    AddOnInstruction(AddOnInstruction),
    Tag(Tag),
    Program(Program),
    Task(Task),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::DataType(_) => EntityKind::DataType,
            Entity::Module(_) => EntityKind::Module,
            Entity::AddOnInstruction(_) => EntityKind::AddOnInstruction,
            Entity::Tag(_) => EntityKind::Tag,
            Entity::Program(_) => EntityKind::Program,
            Entity::Task(_) => EntityKind::Task,
        }
    }
}

impl Named for Entity {
    fn name(&self) -> &str {
        match self {
            Entity::DataType(e) => e.name(),
            Entity::Module(e) => e.name(),
            Entity::AddOnInstruction(e) => e.name(),
            Entity::Tag(e) => e.name(),
            Entity::Program(e) => e.name(),
            Entity::Task(e) => e.name(),
        }
    }
}

/// Root of a controller project.
#[derive(Debug, Clone)]
pub struct Controller {
    name: String,
    pub description: Option<String>,
    pub processor_type: Option<String>,
    pub major_rev: Option<u32>,
    pub minor_rev: Option<u32>,
    pub sfc_execution_control: Option<String>,
    pub sfc_restart_position: Option<String>,
    pub sfc_last_scan: Option<String>,
    pub comm_path: Option<String>,
    pub project_sn: Option<String>,
    pub match_project_to_controller: bool,
    pub can_use_rpi_from_producer: bool,
    pub inhibit_automatic_firmware_update: bool,
    pub pass_through_configuration: Option<String>,
    pub download_project_documentation_and_extended_properties: bool,
    pub download_project_custom_properties: bool,
    pub report_minor_overflow: bool,
    pub redundancy_info: Option<RedundancyInfo>,
    pub security: Option<SecurityInfo>,
    pub safety_info: Option<SafetyInfo>,
    pub data_types: Collection<DataType>,
    pub modules: Collection<Module>,
    pub add_on_instructions: Collection<AddOnInstruction>,
    pub tags: Collection<Tag>,
    pub programs: Collection<Program>,
    pub tasks: Collection<Task>,
    pub properties: DescriptionProperties,
}

impl Controller {
    /// An empty controller carrying the built-in data types.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            processor_type: None,
            major_rev: None,
            minor_rev: None,
            sfc_execution_control: None,
            sfc_restart_position: None,
            sfc_last_scan: None,
            comm_path: None,
            project_sn: None,
            match_project_to_controller: false,
            can_use_rpi_from_producer: false,
            inhibit_automatic_firmware_update: false,
            pass_through_configuration: None,
            download_project_documentation_and_extended_properties: true,
            download_project_custom_properties: true,
            report_minor_overflow: false,
            redundancy_info: None,
            security: None,
            safety_info: None,
            data_types: DataType::builtins().into_iter().collect(),
            modules: Collection::new(),
            add_on_instructions: Collection::new(),
            tags: Collection::new(),
            programs: Collection::new(),
            tasks: Collection::new(),
            properties: DescriptionProperties::default(),
        }
    }

    pub fn set_name(&mut self, new_name: &str) -> Result<()> {
        name::validate(new_name)?;
        self.name = new_name.to_string();
        Ok(())
    }

    /// Insert an object into the collection matching its kind.
    pub fn append(&mut self, entity: Entity, overwrite: bool) {
        match entity {
            Entity::DataType(e) => {
                self.data_types.append(e, overwrite);
            }
            Entity::Module(e) => {
                self.modules.append(e, overwrite);
            }
            Entity::AddOnInstruction(e) => {
                self.add_on_instructions.append(e, overwrite);
            }
            Entity::Tag(e) => {
                self.tags.append(e, overwrite);
            }
            Entity::Program(e) => {
                self.programs.append(e, overwrite);
            }
            Entity::Task(e) => {
                self.tasks.append(e, overwrite);
            }
        }
    }

    /// Remove the named object of the given kind.
    pub fn remove(&mut self, kind: EntityKind, name: &str) -> Option<Entity> {
        match kind {
            EntityKind::DataType => self.data_types.remove(name).map(Entity::DataType),
            EntityKind::Module => self.modules.remove(name).map(Entity::Module),
            EntityKind::AddOnInstruction => self
                .add_on_instructions
                .remove(name)
                .map(Entity::AddOnInstruction),
            EntityKind::Tag => self.tags.remove(name).map(Entity::Tag),
            EntityKind::Program => self.programs.remove(name).map(Entity::Program),
            EntityKind::Task => self.tasks.remove(name).map(Entity::Task),
        }
    }

    /// Merge a dependency set into this controller, replacing objects with
    /// the same name, then rebind.
    ///
    /// Data types marked editable in their description are only added, never
    /// written over an existing type of the same name.
    ///
    /// An incoming alias of a whole tag whose target is missing gets a base
    /// tag of the alias's inherited type.
    pub fn import_dependencies(&mut self, dependencies: Dependencies) -> Result<()> {
        let Dependencies {
            add_on_instructions,
            data_types,
            modules,
            programs,
            tags,
            program_tags: _,
            tasks,
        } = dependencies;

        self.add_on_instructions.extend(add_on_instructions, true);
        for data_type in data_types {
            if data_type.properties.editable == Some(true) && self.data_types.contains(data_type.name()) {
                debug!(data_type = data_type.name(), "keeping editable data type");
                continue;
            }
            self.data_types.append(data_type, true);
        }
        self.modules.extend(modules, true);
        self.programs.extend(programs, true);

        let bases: Vec<Tag> = tags
            .iter()
            .filter_map(|tag| {
                let base = tag.alias_base().filter(|b| tag.alias_for.as_deref() == Some(*b))?;
                let data_type = tag.data_type_name.clone().filter(|t| !t.is_empty())?;
                Some(Tag::new(base, data_type))
            })
            .collect();
        self.tags.extend(tags, true);
        for base in bases {
            if !self.tags.contains(base.name()) {
                debug!(tag = base.name(), "creating base tag for alias");
                self.tags.append(base, false);
            }
        }

        self.tasks.extend(tasks, true);
        self.rebind()
    }

    /// Compute the closure of `entity` in `source` and import it here.
    pub fn import_with_dependencies(
        &mut self,
        source: &Controller,
        entity: &Entity,
        include_root: bool,
    ) -> Result<()> {
        let dependencies = source.dependencies(entity, include_root)?;
        self.import_dependencies(dependencies)
    }
}

impl Named for Controller {
    fn name(&self) -> &str {
        &self.name
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::datatype::DataTypeMember;

    #[test]
    fn new_controller_has_builtins() {
        let controller = Controller::new("PLC01");
        for name in ["BOOL", "DINT", "REAL", "TIMER", "CONTROL"] {
            assert!(controller.data_types.contains(name), "{name} missing");
        }
    }

    #[test]
    fn append_routes_by_kind() {
        let mut controller = Controller::new("PLC01");
        controller.append(Entity::Tag(Tag::new("Start", "BOOL")), false);
        controller.append(Entity::Program(Program::new("Main")), false);
        controller.append(Entity::Task(Task::new("T1", crate::vocab::TaskType::Continuous)), false);
        assert!(controller.tags.contains("Start"));
        assert!(controller.programs.contains("Main"));
        assert!(controller.tasks.contains("T1"));

        let removed = controller.remove(EntityKind::Tag, "Start").unwrap();
        assert_eq!(removed.kind(), EntityKind::Tag);
        assert!(controller.remove(EntityKind::Tag, "Start").is_none());
    }

    #[test]
    fn append_without_overwrite_keeps_existing() {
        let mut controller = Controller::new("PLC01");
        controller.append(Entity::Tag(Tag::new("Speed", "DINT")), false);
        controller.append(Entity::Tag(Tag::new("Speed", "REAL")), false);
        let tag = controller.tags.by_name("Speed").unwrap();
        assert_eq!(tag.data_type_name.as_deref(), Some("DINT"));
        controller.append(Entity::Tag(Tag::new("Speed", "REAL")), true);
        let tag = controller.tags.by_name("Speed").unwrap();
        assert_eq!(tag.data_type_name.as_deref(), Some("REAL"));
    }

    #[test]
    fn import_creates_missing_alias_base() {
        let mut source = Controller::new("Master");
        source.tags.append(Tag::new("Pump", "Motor"), false);
        source
            .data_types
            .append(DataType::new("Motor").with_member(DataTypeMember::new("Run", "BIT")), false);
        source.tags.append(Tag::alias("PumpAlias", "Pump"), false);
        source.rebind().unwrap();

        let alias = source.tags.by_name("PumpAlias").unwrap().clone();
        let mut dependencies = Dependencies::default();
        dependencies.add_tag(alias);

        let mut target = Controller::new("Target");
        target.import_dependencies(dependencies).unwrap();
        assert!(target.tags.contains("PumpAlias"));
        let base = target.tags.by_name("Pump").unwrap();
        assert_eq!(base.data_type_name.as_deref(), Some("Motor"));
        assert_eq!(base.tag_type, crate::vocab::TagType::Base);
    }

    #[test]
    fn import_does_not_replace_existing_alias_base() {
        let mut target = Controller::new("Target");
        target.tags.append(Tag::new("Pump", "Motor").with_description("keep"), false);

        let mut alias = Tag::alias("PumpAlias", "Pump");
        alias.data_type_name = Some("Motor".into());
        let mut dependencies = Dependencies::default();
        dependencies.add_tag(alias);

        target.import_dependencies(dependencies).unwrap();
        let base = target.tags.by_name("Pump").unwrap();
        assert_eq!(base.description.as_deref(), Some("keep"));
    }

    #[test]
    fn import_keeps_editable_data_types_already_present() {
        fn udt(name: &str, member: &str, description: Option<&str>) -> DataType {
            let mut data_type = DataType::new(name).with_member(DataTypeMember::new(member, "DINT"));
            data_type.description = description.map(str::to_string);
            data_type.properties = DescriptionProperties::parse(description);
            data_type
        }

        let mut target = Controller::new("Target");
        for name in ["Recipe", "Locked", "Plain"] {
            target.data_types.append(udt(name, "Local", None), false);
        }

        let mut dependencies = Dependencies::default();
        dependencies.add_data_type(udt("Recipe", "Master", Some("<@DATATYPE><@TYPE UDT>")));
        dependencies.add_data_type(udt("Locked", "Master", Some("<@DATATYPE><@TYPE UDT><@NOEDITS>")));
        dependencies.add_data_type(udt("Plain", "Master", Some("shared layout")));
        dependencies.add_data_type(udt("Batch", "Master", Some("<@DATATYPE><@TYPE UDT>")));
        target.import_dependencies(dependencies).unwrap();

        let member = |name: &str, member: &str| target.data_types.by_name(name).unwrap().member(member).is_some();
        assert!(member("Recipe", "Local"));
        assert!(member("Locked", "Master"));
        assert!(member("Plain", "Master"));
        assert!(member("Batch", "Master"));
    }

    #[test]
    fn import_with_dependencies_pulls_data_types() {
        let mut source = Controller::new("Master");
        source
            .data_types
            .append(DataType::new("Valve").with_member(DataTypeMember::new("Open", "BOOL")), false);
        source.tags.append(Tag::new("V1", "Valve"), false);
        source.rebind().unwrap();

        let tag = source.tags.by_name("V1").unwrap().clone();
        let mut target = Controller::new("Target");
        target
            .import_with_dependencies(&source, &Entity::Tag(tag), true)
            .unwrap();
        assert!(target.tags.contains("V1"));
        assert!(target.data_types.contains("Valve"));
        let v1 = target.tags.by_name("V1").unwrap();
        assert!(v1.data_type.is_some());
        assert!(v1.value.is_some());
    }
}
