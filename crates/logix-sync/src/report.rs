//! Summary of a push.

use std::fmt;

use serde::Serialize;

/// One routine written into a target program.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutinePush {
    /// Name of the routine as written into the target.
    pub routine: String,
    /// Target routine it replaced; `None` when it was added.
    pub replaced: Option<String>,
}

/// Routines pushed from one master program into one target program.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ProgramPush {
    pub source: String,
    pub target: String,
    pub routines: Vec<RoutinePush>,
}

/// A master routine that could not be pushed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRoutine {
    pub program: String,
    pub routine: String,
    pub reason: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PushReport {
    pub programs: Vec<ProgramPush>,
    pub skipped: Vec<SkippedRoutine>,
    /// Objects imported into the target controller, by name.
    pub data_types: Vec<String>,
    pub add_on_instructions: Vec<String>,
    pub tags: Vec<String>,
}

impl PushReport {
    pub fn routine_count(&self) -> usize {
        self.programs.iter().map(|p| p.routines.len()).sum()
    }
}

impl fmt::Display for PushReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for program in &self.programs {
            writeln!(f, "{} -> {}", program.source, program.target)?;
            for routine in &program.routines {
                match &routine.replaced {
                    Some(old) if *old == routine.routine => writeln!(f, "  replaced {}", routine.routine)?,
                    Some(old) => writeln!(f, "  replaced {old} with {}", routine.routine)?,
                    None => writeln!(f, "  added {}", routine.routine)?,
                }
            }
        }
        for skipped in &self.skipped {
            writeln!(f, "skipped {}/{}: {}", skipped.program, skipped.routine, skipped.reason)?;
        }
        write!(
            f,
            "{} routines, {} data types, {} add-on instructions, {} tags",
            self.routine_count(),
            self.data_types.len(),
            self.add_on_instructions.len(),
            self.tags.len()
        )
    }
}
