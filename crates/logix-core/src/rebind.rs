//! Name-reference resolution.
//!
//! After a parse, a merge or any other structural change, [`Controller::rebind`]
//! turns the name strings held by every object into ids, re-reads description
//! metadata, mines rung text and derives missing value trees. Running it again
//! on an unchanged controller gives the same result.

use tracing::debug;

use crate::aoi::AddOnInstruction;
use crate::collection::{Collection, Id, Named};
use crate::controller::Controller;
use crate::datatype::DataType;
use crate::description::DescriptionProperties;
use crate::error::Result;
use crate::miner;
use crate::routine::Rung;
use crate::tag::{Tag, TagRef};
use crate::value::TagValue;

/// Longest alias chain followed before giving up.
const MAX_ALIAS_DEPTH: usize = 8;

#[derive(Clone, Copy)]
enum Scope {
    Controller,
    Program,
}

impl Scope {
    fn local(self, id: Id<Tag>) -> TagRef {
        match self {
            Scope::Controller => TagRef::Controller(id),
            Scope::Program => TagRef::Program(id),
        }
    }
}

impl Controller {
    /// Resolve every cross reference in the controller.
    pub fn rebind(&mut self) -> Result<()> {
        self.properties = DescriptionProperties::parse(self.description.as_deref());

        bind_data_types(&mut self.data_types);
        bind_tags(&mut self.tags, None, &self.data_types, Scope::Controller)?;

        for module in self.modules.iter_mut() {
            module.properties = DescriptionProperties::parse(module.description.as_deref());
        }

        for program in self.programs.iter_mut() {
            program.properties = DescriptionProperties::parse(program.description.as_deref());
            bind_tags(&mut program.tags, Some(&self.tags), &self.data_types, Scope::Program)?;
            for routine in program.routines.iter_mut() {
                routine.properties = DescriptionProperties::parse(routine.description.as_deref());
                for rung in &mut routine.rungs {
                    bind_rung(
                        rung,
                        Some(&self.tags),
                        Some(&program.tags),
                        &self.add_on_instructions,
                    );
                }
            }
        }

        self.bind_add_on_instructions();

        for task in self.tasks.iter_mut() {
            task.properties = DescriptionProperties::parse(task.description.as_deref());
            task.programs = task
                .scheduled_programs
                .iter()
                .filter_map(|name| {
                    let id = self.programs.id_of(name);
                    if id.is_none() {
                        debug!(task = task.name(), program = name.as_str(), "scheduled program not found");
                    }
                    id
                })
                .collect();
        }
        Ok(())
    }

    fn bind_add_on_instructions(&mut self) {
        // Rungs of an instruction body only reference other instructions.
        let mut mined = Vec::new();
        for (aoi_id, aoi) in self.add_on_instructions.entries() {
            for (routine_id, routine) in aoi.routines.entries() {
                for (index, rung) in routine.rungs.iter().enumerate() {
                    let instructions = miner::instructions(rung.text());
                    let nested: Vec<Id<AddOnInstruction>> = instructions
                        .iter()
                        .filter_map(|m| self.add_on_instructions.id_of(m))
                        .filter(|&id| id != aoi_id)
                        .collect();
                    mined.push((aoi_id, routine_id, index, instructions, nested));
                }
            }
        }

        for aoi in self.add_on_instructions.iter_mut() {
            aoi.properties = DescriptionProperties::parse(aoi.description.as_deref());
            for parameter in &mut aoi.parameters {
                parameter.data_type = parameter
                    .data_type_name
                    .as_deref()
                    .and_then(|n| self.data_types.id_of(n));
            }
            for local in &mut aoi.local_tags {
                local.data_type = local
                    .data_type_name
                    .as_deref()
                    .and_then(|n| self.data_types.id_of(n));
            }
            for routine in aoi.routines.iter_mut() {
                routine.properties = DescriptionProperties::parse(routine.description.as_deref());
            }
        }

        for (aoi_id, routine_id, index, instructions, nested) in mined {
            let rung = self
                .add_on_instructions
                .get_mut(aoi_id)
                .and_then(|aoi| aoi.routines.get_mut(routine_id))
                .and_then(|routine| routine.rungs.get_mut(index));
            if let Some(rung) = rung {
                rung.clear_references();
                rung.instructions = instructions;
                rung.add_on_instructions = nested;
            }
        }
    }
}

fn bind_data_types(data_types: &mut Collection<DataType>) {
    let resolved: Vec<Vec<Option<Id<DataType>>>> = data_types
        .iter()
        .map(|dt| {
            dt.members
                .iter()
                .map(|m| data_types.id_of(&m.data_type_name))
                .collect()
        })
        .collect();
    for (data_type, member_ids) in data_types.iter_mut().zip(resolved) {
        data_type.properties = DescriptionProperties::parse(data_type.description.as_deref());
        for (member, id) in data_type.members.iter_mut().zip(member_ids) {
            member.properties = DescriptionProperties::parse(member.description.as_deref());
            member.data_type = id;
        }
    }
}

struct AliasResolution {
    target: Option<TagRef>,
    data_type_name: Option<String>,
}

fn bind_tags(
    tags: &mut Collection<Tag>,
    outer: Option<&Collection<Tag>>,
    data_types: &Collection<DataType>,
    scope: Scope,
) -> Result<()> {
    let aliases: Vec<(Id<Tag>, AliasResolution)> = tags
        .entries()
        .filter(|(_, tag)| tag.is_alias())
        .map(|(id, tag)| (id, resolve_alias(tag, tags, outer, data_types, scope)))
        .collect();

    for (id, resolution) in aliases {
        if let Some(tag) = tags.get_mut(id) {
            if resolution.target.is_none() {
                debug!(tag = tag.name(), alias = ?tag.alias_for, "alias target not found");
            }
            tag.alias_target = resolution.target;
            tag.data_type_name = resolution.data_type_name;
        }
    }

    for tag in tags.iter_mut() {
        tag.properties = DescriptionProperties::parse(tag.description.as_deref());
        tag.data_type = tag
            .data_type_name
            .as_deref()
            .and_then(|n| data_types.id_of(n));
        if tag.is_alias() {
            tag.value = None;
            continue;
        }
        let stale = match (&tag.value, tag.data_type_name.as_deref()) {
            (None, _) => true,
            (Some(value), Some(name)) => value.data_type() != name,
            (Some(_), None) => true,
        };
        if stale {
            tag.value = TagValue::derive(tag, data_types)?;
        }
    }
    Ok(())
}

/// Find the tag an alias points at and the type of the aliased path.
fn resolve_alias(
    tag: &Tag,
    local: &Collection<Tag>,
    outer: Option<&Collection<Tag>>,
    data_types: &Collection<DataType>,
    scope: Scope,
) -> AliasResolution {
    let mut resolution = AliasResolution {
        target: None,
        data_type_name: None,
    };
    let Some(path) = tag.alias_for.as_deref() else {
        return resolution;
    };
    let Some((target, base_type)) = find_base(path, local, outer, data_types, scope, 0) else {
        return resolution;
    };
    resolution.target = Some(target);
    resolution.data_type_name = base_type.and_then(|t| walk_members(&t, path, data_types));
    resolution
}

fn find_base(
    path: &str,
    local: &Collection<Tag>,
    outer: Option<&Collection<Tag>>,
    data_types: &Collection<DataType>,
    scope: Scope,
    depth: usize,
) -> Option<(TagRef, Option<String>)> {
    if depth > MAX_ALIAS_DEPTH {
        return None;
    }
    let base = base_name(path);
    let (target, tag) = match local.id_of(base) {
        Some(id) => (scope.local(id), local.get(id)?),
        None => {
            let outer = outer?;
            let id = outer.id_of(base)?;
            (TagRef::Controller(id), outer.get(id)?)
        }
    };
    let base_type = match tag.alias_for.as_deref().filter(|a| !a.is_empty()) {
        Some(next) => find_base(next, local, outer, data_types, scope, depth + 1)
            .and_then(|(_, t)| t)
            .and_then(|t| walk_members(&t, next, data_types)),
        None => tag.data_type_name.clone(),
    };
    Some((target, base_type))
}

fn base_name(path: &str) -> &str {
    let end = path.find(['.', '[']).unwrap_or(path.len());
    &path[..end]
}

/// Follow `.member` segments of `path` starting from `base_type`.
///
/// Index suffixes keep the element type; a numeric segment is a bit of an
/// integer and yields `BOOL`.
fn walk_members(base_type: &str, path: &str, data_types: &Collection<DataType>) -> Option<String> {
    let mut current = base_type.to_string();
    for segment in path.split('.').skip(1) {
        let member_name = base_name(segment);
        if member_name.chars().all(|c| c.is_ascii_digit()) {
            current = crate::datatype::BOOL.to_string();
            continue;
        }
        let member = data_types.by_name(&current)?.member(member_name)?;
        current = member.data_type_name.clone();
    }
    Some(current)
}

fn bind_rung(
    rung: &mut Rung,
    tags: Option<&Collection<Tag>>,
    program_tags: Option<&Collection<Tag>>,
    add_on_instructions: &Collection<AddOnInstruction>,
) {
    rung.clear_references();
    let text = rung.text().to_string();

    for operand in miner::operands(&text) {
        if let Some(id) = tags.and_then(|t| t.id_of(&operand)) {
            rung.tags.push(id);
        } else if let Some(id) = program_tags.and_then(|t| t.id_of(&operand)) {
            rung.program_tags.push(id);
        }
    }

    // Program aliases of controller tags pull the controller tag in as well.
    if let Some(program_tags) = program_tags {
        for id in rung.program_tags.clone() {
            if let Some(TagRef::Controller(target)) = program_tags.get(id).and_then(|t| t.alias_target) {
                if !rung.tags.contains(&target) {
                    rung.tags.push(target);
                }
            }
        }
    }

    rung.instructions = miner::instructions(&text);
    rung.add_on_instructions = rung
        .instructions
        .iter()
        .filter_map(|m| add_on_instructions.id_of(m))
        .collect();
}
