//! Dependency closure.
//!
//! The closure of an object is everything a standalone document needs to
//! define it: data types reachable through its members, tags and add-on
//! instructions referenced from its logic, and so on. Results are grouped in
//! typed buckets, each free of duplicate names.

use crate::aoi::AddOnInstruction;
use crate::collection::Named;
use crate::controller::{Controller, Entity};
use crate::datatype::DataType;
use crate::error::{CoreError, Result};
use crate::module::Module;
use crate::program::Program;
use crate::routine::{Routine, Rung};
use crate::tag::{Tag, TagRef};
use crate::task::Task;

/// Objects required by an export, deduplicated by name per bucket.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dependencies {
    pub add_on_instructions: Vec<AddOnInstruction>,
    pub data_types: Vec<DataType>,
    pub modules: Vec<Module>,
    pub programs: Vec<Program>,
    pub tags: Vec<Tag>,
    pub program_tags: Vec<Tag>,
    pub tasks: Vec<Task>,
}

fn insert<T: Named>(bucket: &mut Vec<T>, item: T) -> bool {
    if bucket.iter().any(|existing| existing.name() == item.name()) {
        return false;
    }
    bucket.push(item);
    true
}

fn contains<T: Named>(bucket: &[T], name: &str) -> bool {
    bucket.iter().any(|existing| existing.name() == name)
}

fn sort_bucket<T: Named>(bucket: &mut [T]) {
    bucket.sort_by_cached_key(|item| item.name().to_lowercase());
}

impl Dependencies {
    pub fn add_add_on_instruction(&mut self, aoi: AddOnInstruction) -> bool {
        insert(&mut self.add_on_instructions, aoi)
    }

    pub fn add_data_type(&mut self, data_type: DataType) -> bool {
        insert(&mut self.data_types, data_type)
    }

    pub fn add_module(&mut self, module: Module) -> bool {
        insert(&mut self.modules, module)
    }

    pub fn add_program(&mut self, program: Program) -> bool {
        insert(&mut self.programs, program)
    }

    pub fn add_tag(&mut self, tag: Tag) -> bool {
        insert(&mut self.tags, tag)
    }

    pub fn add_program_tag(&mut self, tag: Tag) -> bool {
        insert(&mut self.program_tags, tag)
    }

    pub fn add_task(&mut self, task: Task) -> bool {
        insert(&mut self.tasks, task)
    }

    /// Union with `other`. Entries already present by name are kept.
    pub fn extend(&mut self, other: Dependencies) {
        for aoi in other.add_on_instructions {
            self.add_add_on_instruction(aoi);
        }
        for data_type in other.data_types {
            self.add_data_type(data_type);
        }
        for module in other.modules {
            self.add_module(module);
        }
        for program in other.programs {
            self.add_program(program);
        }
        for tag in other.tags {
            self.add_tag(tag);
        }
        for tag in other.program_tags {
            self.add_program_tag(tag);
        }
        for task in other.tasks {
            self.add_task(task);
        }
    }

    /// Stable, case-insensitive name order in every bucket.
    pub fn sort(&mut self) {
        sort_bucket(&mut self.add_on_instructions);
        sort_bucket(&mut self.data_types);
        sort_bucket(&mut self.modules);
        sort_bucket(&mut self.programs);
        sort_bucket(&mut self.tags);
        sort_bucket(&mut self.program_tags);
        sort_bucket(&mut self.tasks);
    }

    pub fn len(&self) -> usize {
        self.add_on_instructions.len()
            + self.data_types.len()
            + self.modules.len()
            + self.programs.len()
            + self.tags.len()
            + self.program_tags.len()
            + self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Computes closures over one controller.
///
/// Rung references are followed through the ids set by rebind, so the
/// controller should be rebound before asking for the closure of logic.
pub struct DependencyResolver<'a> {
    controller: &'a Controller,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(controller: &'a Controller) -> Self {
        Self { controller }
    }

    pub fn data_type(&self, data_type: &DataType, include_root: bool) -> Result<Dependencies> {
        let mut deps = Dependencies::default();
        self.collect_data_type(data_type, include_root, &mut deps, &mut Vec::new())?;
        Ok(deps)
    }

    pub fn tag(&self, tag: &Tag, include_root: bool) -> Result<Dependencies> {
        let mut deps = Dependencies::default();
        self.collect_tag(tag, include_root, &mut deps)?;
        Ok(deps)
    }

    pub fn add_on_instruction(&self, aoi: &AddOnInstruction, include_root: bool) -> Result<Dependencies> {
        let mut deps = Dependencies::default();
        self.collect_aoi(aoi, include_root, &mut deps)?;
        Ok(deps)
    }

    /// Closure of one rung; `program` owns the rung's program-scope tags.
    pub fn rung(&self, rung: &Rung, program: Option<&Program>) -> Result<Dependencies> {
        let mut deps = Dependencies::default();
        self.collect_rung(rung, program, &mut deps)?;
        Ok(deps)
    }

    pub fn routine(&self, routine: &Routine, program: Option<&Program>) -> Result<Dependencies> {
        let mut deps = Dependencies::default();
        for rung in &routine.rungs {
            self.collect_rung(rung, program, &mut deps)?;
        }
        Ok(deps)
    }

    pub fn program(&self, program: &Program, include_root: bool) -> Result<Dependencies> {
        let mut deps = Dependencies::default();
        if include_root {
            deps.add_program(program.clone());
        }
        for routine in program.routines.iter() {
            for rung in &routine.rungs {
                self.collect_rung(rung, Some(program), &mut deps)?;
            }
        }
        for tag in program.tags.iter() {
            self.collect_tag_type(tag, &mut deps)?;
            self.collect_alias_target(tag, Some(program), &mut deps)?;
        }
        Ok(deps)
    }

    pub fn task(&self, task: &Task, include_root: bool) -> Dependencies {
        let mut deps = Dependencies::default();
        if include_root {
            deps.add_task(task.clone());
        }
        deps
    }

    pub fn module(&self, module: &Module, include_root: bool) -> Dependencies {
        let mut deps = Dependencies::default();
        if include_root {
            deps.add_module(module.clone());
        }
        deps
    }

    pub fn entity(&self, entity: &Entity, include_root: bool) -> Result<Dependencies> {
        match entity {
            Entity::DataType(e) => self.data_type(e, include_root),
            Entity::Module(e) => Ok(self.module(e, include_root)),
            Entity::AddOnInstruction(e) => self.add_on_instruction(e, include_root),
            Entity::Tag(e) => self.tag(e, include_root),
            Entity::Program(e) => self.program(e, include_root),
            Entity::Task(e) => Ok(self.task(e, include_root)),
        }
    }

    fn collect_data_type(
        &self,
        data_type: &DataType,
        include_root: bool,
        deps: &mut Dependencies,
        stack: &mut Vec<String>,
    ) -> Result<()> {
        if data_type.is_terminal() {
            return Ok(());
        }
        if stack.iter().any(|n| n == data_type.name()) {
            return Err(CoreError::RecursiveDataType {
                name: data_type.name().to_string(),
            });
        }
        if include_root && !deps.add_data_type(data_type.clone()) {
            return Ok(());
        }
        stack.push(data_type.name().to_string());
        for member in &data_type.members {
            if let Some(member_type) = self.controller.data_types.by_name(&member.data_type_name) {
                self.collect_data_type(member_type, true, deps, stack)?;
            }
        }
        stack.pop();
        Ok(())
    }

    fn collect_tag(&self, tag: &Tag, include_root: bool, deps: &mut Dependencies) -> Result<()> {
        if include_root && !deps.add_tag(tag.clone()) {
            return Ok(());
        }
        self.collect_tag_type(tag, deps)?;
        self.collect_alias_target(tag, None, deps)
    }

    fn collect_tag_type(&self, tag: &Tag, deps: &mut Dependencies) -> Result<()> {
        let data_type = tag
            .data_type_name
            .as_deref()
            .and_then(|n| self.controller.data_types.by_name(n));
        match data_type {
            Some(data_type) => self.collect_data_type(data_type, true, deps, &mut Vec::new()),
            None => Ok(()),
        }
    }

    /// Controller tags an alias stores into travel with it.
    fn collect_alias_target(
        &self,
        tag: &Tag,
        program: Option<&Program>,
        deps: &mut Dependencies,
    ) -> Result<()> {
        match tag.alias_target {
            Some(TagRef::Controller(id)) => match self.controller.tags.get(id) {
                Some(target) => self.collect_tag(target, true, deps),
                None => Ok(()),
            },
            Some(TagRef::Program(id)) => match program.and_then(|p| p.tags.get(id)) {
                Some(target) => {
                    deps.add_program_tag(target.clone());
                    self.collect_tag_type(target, deps)
                }
                None => Ok(()),
            },
            None => Ok(()),
        }
    }

    fn collect_rung(&self, rung: &Rung, program: Option<&Program>, deps: &mut Dependencies) -> Result<()> {
        for &id in &rung.tags {
            if let Some(tag) = self.controller.tags.get(id) {
                self.collect_tag(tag, true, deps)?;
            }
        }
        if let Some(program) = program {
            for &id in &rung.program_tags {
                if let Some(tag) = program.tags.get(id) {
                    deps.add_program_tag(tag.clone());
                    self.collect_tag_type(tag, deps)?;
                }
            }
        }
        for &id in &rung.add_on_instructions {
            if let Some(aoi) = self.controller.add_on_instructions.get(id) {
                self.collect_aoi(aoi, true, deps)?;
            }
        }
        Ok(())
    }

    fn collect_aoi(&self, aoi: &AddOnInstruction, include_root: bool, deps: &mut Dependencies) -> Result<()> {
        if include_root && !deps.add_add_on_instruction(aoi.clone()) {
            return Ok(());
        }
        let typed = aoi
            .parameters
            .iter()
            .map(|p| ("add-on instruction parameter", p.name(), p.data_type_name.as_deref()))
            .chain(
                aoi.local_tags
                    .iter()
                    .map(|t| ("add-on instruction local tag", t.name(), t.data_type_name.as_deref())),
            );
        for (kind, name, data_type_name) in typed {
            let data_type = data_type_name
                .filter(|n| !n.is_empty())
                .and_then(|n| self.controller.data_types.by_name(n))
                .ok_or_else(|| CoreError::MissingDataType {
                    kind,
                    name: format!("{}.{}", aoi.name(), name),
                })?;
            self.collect_data_type(data_type, true, deps, &mut Vec::new())?;
        }
        for routine in aoi.routines.iter() {
            for rung in &routine.rungs {
                for &id in &rung.add_on_instructions {
                    if let Some(nested) = self.controller.add_on_instructions.get(id) {
                        if nested.name() != aoi.name() && !contains(&deps.add_on_instructions, nested.name()) {
                            self.collect_aoi(nested, true, deps)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

impl Controller {
    /// Closure of `entity` within this controller.
    pub fn dependencies(&self, entity: &Entity, include_root: bool) -> Result<Dependencies> {
        DependencyResolver::new(self).entity(entity, include_root)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aoi::{AoiParameter, LocalTag};
    use crate::datatype::DataTypeMember;
    use crate::vocab::{TagUsage, TaskType};

    fn names<T: Named>(bucket: &[T]) -> Vec<&str> {
        bucket.iter().map(Named::name).collect()
    }

    fn controller() -> Controller {
        let mut c = Controller::new("PLC01");
        c.data_types.append(
            DataType::new("Seal").with_member(DataTypeMember::new("Ok", "BIT")),
            false,
        );
        c.data_types.append(
            DataType::new("Pump")
                .with_member(DataTypeMember::new("Speed", "DINT"))
                .with_member(DataTypeMember::new("Seal", "Seal"))
                .with_member(DataTypeMember::new("Delay", "TIMER")),
            false,
        );
        c.data_types.append(
            DataType::new("Station")
                .with_member(DataTypeMember::new("PumpA", "Pump"))
                .with_member(DataTypeMember::new("PumpB", "Pump"))
                .with_member(DataTypeMember::new("Seal", "Seal")),
            false,
        );
        c.tags.append(Tag::new("Start", "BOOL"), false);
        c.tags.append(Tag::new("P1", "Pump"), false);
        c.tags.append(Tag::new("St1", "Station"), false);
        c.add_on_instructions.append(
            AddOnInstruction::new("Ramp")
                .with_parameter(AoiParameter::new("Target", "REAL", TagUsage::Input))
                .with_local_tag(LocalTag::new("State", "Seal")),
            false,
        );
        c.add_on_instructions.append(
            AddOnInstruction::new("Drive")
                .with_parameter(AoiParameter::new("Cfg", "Pump", TagUsage::InOut))
                .with_routine(Routine::new("Logic").with_rung("Ramp(R1,10.0);")),
            false,
        );
        c.programs.append(
            Program::new("Line")
                .with_tag(Tag::new("Local", "Seal"))
                .with_routine(
                    Routine::new("Main")
                        .with_rung("XIC(Start)OTE(P1.Seal.Ok);")
                        .with_rung("XIC(Local.Ok)Drive(D1,P1);"),
                ),
            false,
        );
        c.tasks.append(Task::new("T1", TaskType::Continuous).schedule("Line"), false);
        c.rebind().unwrap();
        c
    }

    #[test]
    fn terminal_types_have_empty_closure() {
        let c = controller();
        let resolver = DependencyResolver::new(&c);
        for dt in c.data_types.iter().filter(|d| d.is_terminal()) {
            assert!(resolver.data_type(dt, true).unwrap().is_empty(), "{}", dt.name());
            assert!(resolver.data_type(dt, false).unwrap().is_empty());
        }
    }

    #[test]
    fn data_type_closure_is_transitive_and_unique() {
        let c = controller();
        let resolver = DependencyResolver::new(&c);
        let station = c.data_types.by_name("Station").unwrap();
        let deps = resolver.data_type(station, true).unwrap();
        assert_eq!(names(&deps.data_types), vec!["Station", "Pump", "Seal"]);
        let deps = resolver.data_type(station, false).unwrap();
        assert_eq!(names(&deps.data_types), vec!["Pump", "Seal"]);
    }

    #[test]
    fn union_with_itself_is_unchanged() {
        let c = controller();
        let program = c.programs.by_name("Line").unwrap();
        let deps = c.dependencies(&Entity::Program(program.clone()), true).unwrap();
        let mut doubled = deps.clone();
        doubled.extend(deps.clone());
        assert_eq!(doubled, deps);
    }

    #[test]
    fn tag_closure_includes_type_chain() {
        let c = controller();
        let tag = c.tags.by_name("P1").unwrap();
        let deps = c.dependencies(&Entity::Tag(tag.clone()), true).unwrap();
        assert_eq!(names(&deps.tags), vec!["P1"]);
        assert_eq!(names(&deps.data_types), vec!["Pump", "Seal"]);

        let atomic = c.tags.by_name("Start").unwrap();
        let deps = c.dependencies(&Entity::Tag(atomic.clone()), false).unwrap();
        assert!(deps.is_empty());
    }

    #[test]
    fn program_closure_follows_rungs() {
        let c = controller();
        let program = c.programs.by_name("Line").unwrap();
        let mut deps = c.dependencies(&Entity::Program(program.clone()), true).unwrap();
        deps.sort();
        assert_eq!(names(&deps.programs), vec!["Line"]);
        assert_eq!(names(&deps.tags), vec!["P1", "Start"]);
        assert_eq!(names(&deps.program_tags), vec!["Local"]);
        assert_eq!(names(&deps.add_on_instructions), vec!["Drive", "Ramp"]);
        assert_eq!(names(&deps.data_types), vec!["Pump", "Seal"]);
    }

    #[test]
    fn aoi_without_data_type_is_fatal() {
        let mut c = controller();
        let mut broken = AddOnInstruction::new("Broken");
        let mut parameter = AoiParameter::new("In", "DINT", TagUsage::Input);
        parameter.data_type_name = None;
        broken.parameters.push(parameter);
        c.add_on_instructions.append(broken, false);
        let aoi = c.add_on_instructions.by_name("Broken").unwrap();
        let err = c
            .dependencies(&Entity::AddOnInstruction(aoi.clone()), true)
            .unwrap_err();
        assert!(matches!(err, CoreError::MissingDataType { ref name, .. } if name == "Broken.In"));
    }

    #[test]
    fn task_and_module_are_self_only() {
        let c = controller();
        let task = c.tasks.by_name("T1").unwrap();
        assert_eq!(names(&c.dependencies(&Entity::Task(task.clone()), true).unwrap().tasks), vec!["T1"]);
        assert!(c.dependencies(&Entity::Task(task.clone()), false).unwrap().is_empty());
        let module = Module::new("IO", "1734-AENT");
        assert_eq!(c.dependencies(&Entity::Module(module), true).unwrap().len(), 1);
    }

    #[test]
    fn recursive_type_is_reported() {
        let mut c = Controller::new("PLC01");
        c.data_types.append(
            DataType::new("Node").with_member(DataTypeMember::new("Next", "Node")),
            false,
        );
        let node = c.data_types.by_name("Node").unwrap();
        let err = DependencyResolver::new(&c).data_type(node, true).unwrap_err();
        assert!(matches!(err, CoreError::RecursiveDataType { .. }));
    }

    #[test]
    fn sort_is_case_insensitive() {
        let mut deps = Dependencies::default();
        deps.add_tag(Tag::new("beta", "DINT"));
        deps.add_tag(Tag::new("Alpha", "DINT"));
        deps.add_tag(Tag::new("Gamma", "DINT"));
        assert!(!deps.add_tag(Tag::new("Alpha", "REAL")));
        deps.sort();
        assert_eq!(names(&deps.tags), vec!["Alpha", "beta", "Gamma"]);
    }
}
