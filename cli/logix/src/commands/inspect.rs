//! `logix inspect`: summarize a project file.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

use logix_core::{Controller, Named};

#[derive(Debug, Serialize)]
pub struct Summary {
    pub name: String,
    pub processor_type: Option<String>,
    pub data_types: usize,
    pub modules: usize,
    pub add_on_instructions: usize,
    pub tags: usize,
    pub tasks: usize,
    pub programs: Vec<ProgramSummary>,
}

#[derive(Debug, Serialize)]
pub struct ProgramSummary {
    pub name: String,
    pub role: Option<String>,
    pub tags: usize,
    pub routines: usize,
}

impl Summary {
    pub fn of(controller: &Controller) -> Self {
        Summary {
            name: controller.name().to_string(),
            processor_type: controller.processor_type.clone(),
            data_types: controller.data_types.len(),
            modules: controller.modules.len(),
            add_on_instructions: controller.add_on_instructions.len(),
            tags: controller.tags.len(),
            tasks: controller.tasks.len(),
            programs: controller
                .programs
                .iter()
                .map(|p| ProgramSummary {
                    name: p.name().to_string(),
                    role: p.role().map(|r| r.to_string()),
                    tags: p.tags.len(),
                    routines: p.routines.len(),
                })
                .collect(),
        }
    }
}

/// Decode `file` and print its summary.
pub fn run(file: &Path, json: bool) -> Result<()> {
    let controller =
        logix_l5x::read_controller(file).with_context(|| format!("reading {}", file.display()))?;
    let summary = Summary::of(&controller);

    if json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Controller {}", summary.name);
    if let Some(processor) = &summary.processor_type {
        println!("  Processor:    {processor}");
    }
    println!("  Data types:   {}", summary.data_types);
    println!("  Modules:      {}", summary.modules);
    println!("  AOIs:         {}", summary.add_on_instructions);
    println!("  Tags:         {}", summary.tags);
    println!("  Programs:     {}", summary.programs.len());
    println!("  Tasks:        {}", summary.tasks);
    for program in &summary.programs {
        let role = program.role.as_deref().unwrap_or("-");
        println!(
            "    {} [{role}] {} routines, {} tags",
            program.name, program.routines, program.tags
        );
    }
    Ok(())
}
