//! Push updates from a master controller into a target controller.
//!
//! Programs pair up by the role in their descriptions. Within a pair, the
//! master's `MAIN` routine replaces the target's routine of the same name,
//! each `DRIVER` routine is cloned onto every target routine sharing its name
//! suffix with the instance tokens swapped, and `INTERNAL` routines replace
//! their exact or closest-named counterpart or are added. Everything the
//! pushed logic depends on is then imported into the target, which is
//! rebound.

use tracing::{info, warn};

use logix_core::{Controller, Dependencies, DependencyResolver, Named, Program, Role, Routine};

use crate::error::{Result, SyncError};
use crate::matching::{best_match, driver_tokens, master_driver_tokens, DriverName};
use crate::options::PushOptions;
use crate::report::{ProgramPush, PushReport, RoutinePush, SkippedRoutine};

/// Push every role-matched program of `source` into `target`.
///
/// The push runs against a copy of `target`, which is only written back when
/// every routine and dependency went through. Only one push may write into a
/// given target at a time.
pub fn push_controller(source: &Controller, target: &mut Controller, options: &PushOptions) -> Result<PushReport> {
    let resolver = DependencyResolver::new(source);
    let mut work = target.clone();
    let mut report = PushReport::default();
    let mut deps = Dependencies::default();

    for master in source.programs.iter() {
        let Some(master_role) = master.role() else {
            continue;
        };
        for id in work.programs.ids() {
            let Some(program) = work.programs.get_mut(id) else {
                continue;
            };
            let Some(target_role) = program.role() else {
                continue;
            };
            if master_role != target_role && master_role != Role::Device {
                continue;
            }
            if master_role == target_role && master_role != Role::Device {
                program.description = master.description.clone();
            }
            let originals = program.routines.iter().map(|r| r.name().to_string()).collect();
            let mut push = Pusher {
                resolver: &resolver,
                master,
                program,
                originals,
                options,
                deps: &mut deps,
                report: &mut report,
            };
            let pushed = push.run()?;
            report.programs.push(pushed);
        }
    }

    report.data_types = deps.data_types.iter().map(|d| d.name().to_string()).collect();
    report.add_on_instructions = deps.add_on_instructions.iter().map(|a| a.name().to_string()).collect();
    report.tags = deps.tags.iter().map(|t| t.name().to_string()).collect();
    work.import_dependencies(deps)?;
    *target = work;
    info!(
        source = source.name(),
        target = target.name(),
        routines = report.routine_count(),
        skipped = report.skipped.len(),
        "pushed updates"
    );
    Ok(report)
}

struct Pusher<'a> {
    resolver: &'a DependencyResolver<'a>,
    master: &'a Program,
    program: &'a mut Program,
    /// Routines the target program had before this push; only these can be
    /// replaced.
    originals: Vec<String>,
    options: &'a PushOptions,
    deps: &'a mut Dependencies,
    report: &'a mut PushReport,
}

impl Pusher<'_> {
    fn run(&mut self) -> Result<ProgramPush> {
        let master = self.master;
        let mut pushed = ProgramPush {
            source: master.name().to_string(),
            target: self.program.name().to_string(),
            routines: Vec::new(),
        };

        if let Some(main) = master.main_routine() {
            pushed.routines.push(self.replace(main, None)?);
        }

        for driver in master.driver_routines() {
            match self.push_driver(driver) {
                Ok(routines) => pushed.routines.extend(routines),
                Err(SyncError::DriverNaming { routine }) => {
                    warn!(program = master.name(), routine = %routine, "driver routine skipped");
                    self.report.skipped.push(SkippedRoutine {
                        program: master.name().to_string(),
                        reason: SyncError::DriverNaming { routine: routine.clone() }.to_string(),
                        routine,
                    });
                }
                Err(e) => return Err(e),
            }
        }

        if master.role() != Some(Role::Device) {
            let threshold = self
                .options
                .use_similarity
                .then_some(self.options.similarity_threshold);
            for internal in master.internal_routines() {
                pushed.routines.push(self.replace(internal, threshold)?);
            }
        }
        Ok(pushed)
    }

    fn is_original(&self, name: &str) -> bool {
        self.originals.iter().any(|n| n == name)
    }

    /// Write `routine` over its counterpart in the target program, or add it.
    fn replace(&mut self, routine: &Routine, threshold: Option<f64>) -> Result<RoutinePush> {
        let deps = self.resolver.routine(routine, Some(self.master))?;
        let replaced = best_match(
            routine.name(),
            self.program.routines.iter().filter(|r| self.is_original(r.name())),
            threshold,
        )
        .map(|r| r.name().to_string());
        if let Some(old) = replaced.as_deref() {
            self.originals.retain(|n| n != old);
            if old != routine.name() {
                self.program.routines.remove(old);
            }
        }
        self.program.routines.append(routine.clone(), true);

        self.absorb(deps);
        info!(program = self.program.name(), routine = routine.name(), replaced = ?replaced, "pushed routine");
        Ok(RoutinePush {
            routine: routine.name().to_string(),
            replaced,
        })
    }

    /// Clone a driver routine onto every target routine with the same suffix.
    fn push_driver(&mut self, routine: &Routine) -> Result<Vec<RoutinePush>> {
        let tokens = master_driver_tokens(routine.name())?;
        let master_name = DriverName::from_tokens(&tokens);
        let matches: Vec<String> = self
            .program
            .routines
            .iter()
            .filter(|r| self.is_original(r.name()))
            .filter(|r| driver_tokens(r.name()).is_some_and(|t| t[2..] == *master_name.suffix))
            .map(|r| r.name().to_string())
            .collect();
        if matches.is_empty() {
            return Ok(Vec::new());
        }

        let deps = self.resolver.routine(routine, Some(self.master))?;
        let mut clones = Vec::with_capacity(matches.len());
        for old in matches {
            let Some(target_tokens) = driver_tokens(&old) else {
                continue;
            };
            let substitution = master_name.substitution_to(&DriverName::from_tokens(&target_tokens));

            let mut clone = routine.clone();
            clone.rename_strings(&substitution)?;
            let mut renamed = deps.clone();
            for tag in renamed.tags.iter_mut().chain(renamed.program_tags.iter_mut()) {
                tag.rename_strings(&substitution)?;
            }
            clones.push((old, clone, renamed));
        }

        let mut pushed = Vec::with_capacity(clones.len());
        for (old, clone, renamed) in clones {
            self.originals.retain(|n| *n != old);
            self.program.routines.remove(&old);
            let name = clone.name().to_string();
            self.program.routines.append(clone, true);
            self.absorb(renamed);
            info!(program = self.program.name(), routine = %name, replaced = %old, "pushed driver routine");
            pushed.push(RoutinePush {
                routine: name,
                replaced: Some(old),
            });
        }
        Ok(pushed)
    }

    /// Program tags land in the target program unless already there; the rest
    /// is imported into the controller afterwards.
    fn absorb(&mut self, mut deps: Dependencies) {
        for tag in deps.program_tags.drain(..) {
            self.program.tags.append(tag, false);
        }
        self.deps.extend(deps);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use logix_core::vocab::TagUsage;
    use logix_core::{AddOnInstruction, AoiParameter, CoreError, DataType, DataTypeMember, Tag};

    fn routine(name: &str, role: &str, rung: &str) -> Routine {
        Routine::new(name)
            .with_description(format!("<@ROUTINE><@TYPE {role}>"))
            .with_rung(rung)
    }

    fn master() -> Controller {
        let mut c = Controller::new("Master");
        c.data_types.append(
            DataType::new("PumpData")
                .with_member(DataTypeMember::new("Run", "BOOL"))
                .with_member(DataTypeMember::new("Speed", "REAL")),
            false,
        );
        c.tags.append(Tag::new("PumpA_Data", "PumpData"), false);
        c.programs.append(
            Program::new("Unit")
                .with_description("<@PROGRAM><@TYPE UNIT>")
                .with_tag(Tag::new("Step", "DINT"))
                .with_routine(routine("MainRoutine", "MAIN", "JSR(M01_PumpA_Start);MOV(1,Step);"))
                .with_routine(routine(
                    "M01_PumpA_Start",
                    "DRIVER",
                    "XIC(PumpA_Data.Run)OTE(M01_PumpA_Out);",
                ))
                .with_routine(routine("Sequencer_Fill", "INTERNAL", "MOV(2,Step);"))
                .with_routine(routine("Alarms", "INTERNAL", "NOP();")),
            false,
        );
        c.rebind().unwrap();
        c
    }

    fn target() -> Controller {
        let mut c = Controller::new("Line2");
        c.data_types.append(
            DataType::new("PumpData").with_member(DataTypeMember::new("Run", "BOOL")),
            false,
        );
        c.tags.append(Tag::new("PumpB_Data", "PumpData"), false);
        c.programs.append(
            Program::new("Unit2")
                .with_description("<@PROGRAM><@TYPE UNIT> line two")
                .with_routine(routine("MainRoutine", "MAIN", "NOP();"))
                .with_routine(routine("M02_PumpB_Start", "DRIVER", "NOP();"))
                .with_routine(routine("M02_PumpB_Stop", "DRIVER", "NOP();"))
                .with_routine(routine("Sequencer_Fil", "INTERNAL", "NOP();")),
            false,
        );
        c.programs.append(
            Program::new("Other").with_description("<@PROGRAM><@TYPE CONVEYOR>"),
            false,
        );
        c.rebind().unwrap();
        c
    }

    #[test]
    fn driver_routine_is_renamed_for_each_instance() {
        let mut line = target();
        let report = push_controller(&master(), &mut line, &PushOptions::default()).unwrap();

        let unit = line.programs.by_name("Unit2").unwrap();
        assert!(!unit.routines.contains("M01_PumpA_Start"));
        let start = unit.routines.by_name("M02_PumpB_Start").unwrap();
        assert_eq!(start.rungs[0].text(), "XIC(PumpB_Data.Run)OTE(M02_PumpB_Out);");
        assert_eq!(start.rungs[0].tags, vec![line.tags.id_of("PumpB_Data").unwrap()]);
        assert_eq!(unit.routines.by_name("M02_PumpB_Stop").unwrap().rungs[0].text(), "NOP();");

        assert_eq!(report.programs.len(), 1);
        assert!(report.programs[0].routines.contains(&RoutinePush {
            routine: "M02_PumpB_Start".into(),
            replaced: Some("M02_PumpB_Start".into()),
        }));
    }

    #[test]
    fn main_and_internal_routines_are_replaced_or_added() {
        let mut line = target();
        let report = push_controller(&master(), &mut line, &PushOptions::default()).unwrap();
        let unit = line.programs.by_name("Unit2").unwrap();

        assert_eq!(unit.routines.by_name("MainRoutine").unwrap().rungs[0].text(), "JSR(M01_PumpA_Start);MOV(1,Step);");
        assert!(unit.tags.contains("Step"));
        assert_eq!(unit.description.as_deref(), Some("<@PROGRAM><@TYPE UNIT>"));

        assert!(!unit.routines.contains("Sequencer_Fil"));
        assert!(unit.routines.contains("Sequencer_Fill"));
        assert!(unit.routines.contains("Alarms"));
        assert!(report.programs[0].routines.contains(&RoutinePush {
            routine: "Sequencer_Fill".into(),
            replaced: Some("Sequencer_Fil".into()),
        }));
        let added: Vec<_> = report.programs[0]
            .routines
            .iter()
            .filter(|r| r.replaced.is_none())
            .map(|r| r.routine.as_str())
            .collect();
        assert_eq!(added, vec!["Alarms"]);
    }

    #[test]
    fn similarity_threshold_controls_internal_matching() {
        let mut line = target();
        let options = PushOptions {
            similarity_threshold: 0.97,
            ..PushOptions::default()
        };
        let report = push_controller(&master(), &mut line, &options).unwrap();
        let unit = line.programs.by_name("Unit2").unwrap();
        assert!(unit.routines.contains("Sequencer_Fil"));
        assert!(unit.routines.contains("Sequencer_Fill"));
        assert!(report.programs[0].routines.contains(&RoutinePush {
            routine: "Sequencer_Fill".into(),
            replaced: None,
        }));

        let mut line = target();
        let options = PushOptions {
            use_similarity: false,
            similarity_threshold: 0.5,
        };
        push_controller(&master(), &mut line, &options).unwrap();
        assert!(line.programs.by_name("Unit2").unwrap().routines.contains("Sequencer_Fil"));
    }

    #[test]
    fn numbered_internal_routines_replace_their_counterpart() {
        let mut source = master();
        if let Some(unit) = source.programs.by_name_mut("Unit") {
            unit.routines.append(routine("FillSequence2", "INTERNAL", "MOV(3,Step);"), false);
        }
        source.rebind().unwrap();
        let mut line = target();
        if let Some(unit) = line.programs.by_name_mut("Unit2") {
            unit.routines.append(routine("FillSequence", "INTERNAL", "NOP();"), false);
        }
        line.rebind().unwrap();

        let report = push_controller(&source, &mut line, &PushOptions::default()).unwrap();
        let unit = line.programs.by_name("Unit2").unwrap();
        assert!(!unit.routines.contains("FillSequence"));
        assert_eq!(unit.routines.by_name("FillSequence2").unwrap().rungs[0].text(), "MOV(3,Step);");
        assert!(report.programs[0].routines.contains(&RoutinePush {
            routine: "FillSequence2".into(),
            replaced: Some("FillSequence".into()),
        }));
    }

    #[test]
    fn pushed_routines_are_not_replaced_by_later_ones() {
        let mut source = master();
        if let Some(unit) = source.programs.by_name_mut("Unit") {
            unit.routines.append(routine("Sequencer_Fill_Step_01", "INTERNAL", "MOV(11,Step);"), false);
            unit.routines.append(routine("Sequencer_Fill_Step_02", "INTERNAL", "MOV(12,Step);"), false);
        }
        source.rebind().unwrap();
        let mut line = target();
        let report = push_controller(&source, &mut line, &PushOptions::default()).unwrap();

        let unit = line.programs.by_name("Unit2").unwrap();
        assert_eq!(unit.routines.by_name("Sequencer_Fill_Step_01").unwrap().rungs[0].text(), "MOV(11,Step);");
        assert_eq!(unit.routines.by_name("Sequencer_Fill_Step_02").unwrap().rungs[0].text(), "MOV(12,Step);");
        for name in ["Sequencer_Fill_Step_01", "Sequencer_Fill_Step_02"] {
            assert!(report.programs[0].routines.contains(&RoutinePush {
                routine: name.into(),
                replaced: None,
            }));
        }
    }

    #[test]
    fn failed_push_leaves_target_untouched() {
        let mut source = master();
        let mut broken = AddOnInstruction::new("Broken");
        let mut parameter = AoiParameter::new("In", "DINT", TagUsage::Input);
        parameter.data_type_name = None;
        broken.parameters.push(parameter);
        source.add_on_instructions.append(broken, false);
        if let Some(unit) = source.programs.by_name_mut("Unit") {
            unit.routines.append(routine("Dosing", "INTERNAL", "Broken(Step);"), false);
        }
        source.rebind().unwrap();

        let mut line = target();
        let before = line.clone();
        let err = push_controller(&source, &mut line, &PushOptions::default()).unwrap_err();
        assert!(matches!(err, SyncError::Core(CoreError::MissingDataType { .. })));
        assert_eq!(line.programs.by_name("Unit2"), before.programs.by_name("Unit2"));
        assert_eq!(line.data_types.by_name("PumpData"), before.data_types.by_name("PumpData"));
        assert!(line.tags.contains("PumpB_Data"));
        assert!(!line.tags.contains("PumpA_Data"));
    }

    #[test]
    fn data_types_are_replaced_wholesale() {
        let mut line = target();
        let report = push_controller(&master(), &mut line, &PushOptions::default()).unwrap();
        let pump = line.data_types.by_name("PumpData").unwrap();
        assert!(pump.member("Speed").is_some());
        assert_eq!(report.data_types, vec!["PumpData"]);
        assert!(line.tags.contains("PumpB_Data"));
        assert!(!line.tags.contains("PumpA_Data"));
    }

    #[test]
    fn unmatched_roles_are_left_alone() {
        let mut line = target();
        push_controller(&master(), &mut line, &PushOptions::default()).unwrap();
        let other = line.programs.by_name("Other").unwrap();
        assert!(other.routines.is_empty());
    }

    #[test]
    fn malformed_driver_name_skips_only_that_routine() {
        let mut source = master();
        if let Some(unit) = source.programs.by_name_mut("Unit") {
            unit.routines.append(routine("Valves", "DRIVER", "NOP();"), false);
        }
        source.rebind().unwrap();
        let mut line = target();
        let report = push_controller(&source, &mut line, &PushOptions::default()).unwrap();
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.skipped[0].routine, "Valves");
        assert!(line.programs.by_name("Unit2").unwrap().routines.by_name("M02_PumpB_Start").is_some());
    }

    #[test]
    fn device_master_skips_internal_routines() {
        let mut source = master();
        if let Some(unit) = source.programs.by_name_mut("Unit") {
            unit.description = Some("<@PROGRAM><@TYPE DEVICE>".into());
        }
        source.rebind().unwrap();
        let mut line = target();
        let report = push_controller(&source, &mut line, &PushOptions::default()).unwrap();

        // A device template reaches every program with a role.
        assert_eq!(report.programs.len(), 2);
        let unit = line.programs.by_name("Unit2").unwrap();
        assert!(!unit.routines.contains("Alarms"));
        assert_eq!(unit.description.as_deref(), Some("<@PROGRAM><@TYPE UNIT> line two"));
        let other = line.programs.by_name("Other").unwrap();
        assert!(other.routines.contains("MainRoutine"));
    }

    #[test]
    fn report_serializes() {
        let mut line = target();
        let report = push_controller(&master(), &mut line, &PushOptions::default()).unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["programs"][0]["source"], "Unit");
        assert!(report.to_string().contains("Unit -> Unit2"));
    }
}
