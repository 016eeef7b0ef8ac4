//! Standalone documents holding one object and everything it needs.
//!
//! The exported object is written with `Use="Target"` inside a context
//! controller; its dependency closure fills the sibling collections, each
//! sorted by name and marked `Use="Context"`.

use tracing::info;

use logix_core::closure::DependencyResolver;
use logix_core::controller::Controller;
use logix_core::error::CoreError;
use logix_core::program::Program;
use logix_core::{Dependencies, Named};

use crate::document::{Document, Element};
use crate::encode::{self, Encoder};
use crate::error::Result;
use crate::profile::ExportProfile;

/// The object a standalone document is built around.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportTarget<'a> {
    DataType(&'a str),
    Tag(&'a str),
    AddOnInstruction(&'a str),
    Program(&'a str),
    Routine { program: &'a str, routine: &'a str },
    Module(&'a str),
    Task(&'a str),
}

impl ExportTarget<'_> {
    /// Value of the `TargetType` root attribute.
    pub fn target_type(&self) -> &'static str {
        match self {
            ExportTarget::DataType(_) => "DataType",
            ExportTarget::Tag(_) => "Tag",
            ExportTarget::AddOnInstruction(_) => "AddOnInstructionDefinition",
            ExportTarget::Program(_) => "Program",
            ExportTarget::Routine { .. } => "Routine",
            ExportTarget::Module(_) => "Module",
            ExportTarget::Task(_) => "Task",
        }
    }

    pub fn name(&self) -> &str {
        match self {
            ExportTarget::DataType(n)
            | ExportTarget::Tag(n)
            | ExportTarget::AddOnInstruction(n)
            | ExportTarget::Program(n)
            | ExportTarget::Module(n)
            | ExportTarget::Task(n) => n,
            ExportTarget::Routine { routine, .. } => routine,
        }
    }
}

fn not_found(kind: &'static str, name: &str) -> CoreError {
    CoreError::NotFound {
        kind,
        name: name.to_string(),
    }
}

fn mark(mut element: Element, usage: &str) -> Element {
    element.attributes.insert(0, ("Use".to_string(), usage.to_string()));
    element
}

fn bucket(name: &str, children: Vec<Element>) -> Option<Element> {
    if children.is_empty() {
        None
    } else {
        Some(mark(Element::new(name), "Context").with_children(children))
    }
}

/// Build the standalone document for `target`.
pub fn export(controller: &Controller, target: ExportTarget<'_>, profile: &ExportProfile) -> Result<Document> {
    let resolver = DependencyResolver::new(controller);
    let encoder = Encoder::new(profile, &controller.data_types);
    let mut extra = Vec::new();
    let mut routine_shell = None;

    let (mut deps, description) = match target {
        ExportTarget::DataType(name) => {
            let dt = controller
                .data_types
                .by_name(name)
                .ok_or_else(|| not_found("data type", name))?;
            (resolver.data_type(dt, true)?, dt.description.clone())
        }
        ExportTarget::Tag(name) => {
            let tag = controller.tags.by_name(name).ok_or_else(|| not_found("tag", name))?;
            (resolver.tag(tag, true)?, tag.description.clone())
        }
        ExportTarget::AddOnInstruction(name) => {
            let aoi = controller
                .add_on_instructions
                .by_name(name)
                .ok_or_else(|| not_found("add-on instruction", name))?;
            if let Some(class) = aoi.class {
                extra.push(("TargetClass", class.to_string()));
            }
            if let Some(revision) = &aoi.revision {
                extra.push(("TargetRevision", revision.clone()));
            }
            extra.push((
                "TargetLastEdited",
                aoi.edited_date.clone().unwrap_or_else(|| profile.aoi_edited_date.clone()),
            ));
            (resolver.add_on_instruction(aoi, true)?, aoi.description.clone())
        }
        ExportTarget::Program(name) => {
            let program = controller.programs.by_name(name).ok_or_else(|| not_found("program", name))?;
            (resolver.program(program, true)?, program.description.clone())
        }
        ExportTarget::Routine { program, routine } => {
            let owner = controller
                .programs
                .by_name(program)
                .ok_or_else(|| not_found("program", program))?;
            let found = owner.routines.by_name(routine).ok_or_else(|| not_found("routine", routine))?;
            let deps = resolver.routine(found, Some(owner))?;
            routine_shell = Some(routine_in_program(&encoder, owner, routine, &deps));
            (deps, found.description.clone())
        }
        ExportTarget::Module(name) => {
            let module = controller.modules.by_name(name).ok_or_else(|| not_found("module", name))?;
            (resolver.module(module, true), module.description.clone())
        }
        ExportTarget::Task(name) => {
            let task = controller.tasks.by_name(name).ok_or_else(|| not_found("task", name))?;
            (resolver.task(task, true), task.description.clone())
        }
    };
    deps.sort();

    let is_target = |kind: &str, name: &str| kind == target.target_type() && name == target.name();
    let use_of = |kind: &str, name: &str| if is_target(kind, name) { "Target" } else { "Context" };

    let mut context = mark(
        Element::new("Controller").with_attr("Name", controller.name()),
        "Context",
    );
    let data_types = deps
        .data_types
        .iter()
        .filter_map(|dt| {
            encoder
                .data_type(dt, true)
                .map(|e| mark(e, use_of("DataType", dt.name())))
        })
        .collect();
    let modules = deps
        .modules
        .iter()
        .map(|m| mark(encoder.module(m), use_of("Module", m.name())))
        .collect();
    let aois = deps
        .add_on_instructions
        .iter()
        .map(|a| {
            mark(
                encoder.add_on_instruction(a),
                use_of("AddOnInstructionDefinition", a.name()),
            )
        })
        .collect();
    let tags = deps
        .tags
        .iter()
        .map(|t| mark(encoder.tag(t), use_of("Tag", t.name())))
        .collect();
    let mut programs: Vec<Element> = deps
        .programs
        .iter()
        .map(|p| mark(encoder.program(p), use_of("Program", p.name())))
        .collect();
    programs.extend(routine_shell);
    let tasks = deps
        .tasks
        .iter()
        .map(|t| mark(encode::task(t), use_of("Task", t.name())))
        .collect();

    context = context
        .with_children(bucket("DataTypes", data_types))
        .with_children(bucket("Modules", modules))
        .with_children(bucket("AddOnInstructionDefinitions", aois))
        .with_children(bucket("Tags", tags))
        .with_children(bucket("Programs", programs))
        .with_children(bucket("Tasks", tasks));

    let mut document = Document::new(
        encoder
            .content(target.target_type(), target.name(), &extra)
            .with_child(context),
    );
    if let Some(description) = description.filter(|d| !d.is_empty()) {
        document.prolog.push(description);
    }
    info!(
        kind = target.target_type(),
        name = target.name(),
        dependencies = deps.len(),
        "exported object"
    );
    Ok(document)
}

/// The owning program as context, holding only the exported routine and the
/// program tags its rungs use.
fn routine_in_program(encoder: &Encoder<'_>, program: &Program, routine: &str, deps: &Dependencies) -> Element {
    let mut shell = Element::new("Program")
        .with_attr("Name", program.name())
        .with_opt("MainRoutineName", program.main_routine_name.as_deref())
        .with_opt("Class", program.class);
    shell = mark(shell, "Context");
    let tags = deps.program_tags.iter().map(|t| encoder.tag(t));
    let routines = program
        .routines
        .iter()
        .filter(|r| r.name() == routine)
        .map(|r| mark(encode::routine(r), "Target"));
    shell
        .with_child(Element::new("Tags").with_children(tags))
        .with_child(Element::new("Routines").with_children(routines))
}
