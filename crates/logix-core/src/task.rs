//! Tasks.

use crate::collection::{Id, Named};
use crate::description::DescriptionProperties;
use crate::error::Result;
use crate::name;
use crate::program::Program;
use crate::vocab::{LogixClass, TaskType};

/// A scheduling unit running an ordered list of programs.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    name: String,
    pub description: Option<String>,
    pub task_type: Option<TaskType>,
    /// Period in milliseconds, kept as written.
    pub rate: Option<String>,
    pub priority: u32,
    pub watchdog: u32,
    pub disable_update_outputs: bool,
    pub inhibit_task: bool,
    pub class: Option<LogixClass>,
    /// Scheduled program names in order.
    pub scheduled_programs: Vec<String>,
    pub properties: DescriptionProperties,
    /// Resolved by rebind; unknown names are skipped.
    pub programs: Vec<Id<Program>>,
}

impl Task {
    pub fn new(name: impl Into<String>, task_type: TaskType) -> Self {
        Self {
            name: name.into(),
            description: None,
            task_type: Some(task_type),
            rate: None,
            priority: 10,
            watchdog: 500,
            disable_update_outputs: false,
            inhibit_task: false,
            class: Some(LogixClass::Standard),
            scheduled_programs: Vec::new(),
            properties: DescriptionProperties::default(),
            programs: Vec::new(),
        }
    }

    pub fn schedule(mut self, program: impl Into<String>) -> Self {
        self.scheduled_programs.push(program.into());
        self
    }

    pub fn set_name(&mut self, new_name: &str) -> Result<()> {
        name::validate(new_name)?;
        self.name = new_name.to_string();
        Ok(())
    }
}

impl Named for Task {
    fn name(&self) -> &str {
        &self.name
    }
}
