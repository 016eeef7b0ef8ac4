//! Entity graph to document.
//!
//! Attribute order follows the order Studio 5000 writes, so exported files
//! diff cleanly against ones saved by the IDE.

use logix_core::aoi::{AddOnInstruction, AoiParameter, LocalTag};
use logix_core::controller::{Controller, RedundancyInfo, SafetyInfo, SecurityInfo};
use logix_core::datatype::{DataType, DataTypeMember};
use logix_core::module::{ExtensionElement, Module, ModulePort};
use logix_core::program::Program;
use logix_core::routine::{Routine, Rung};
use logix_core::tag::{format_dimensions, Tag};
use logix_core::task::Task;
use logix_core::{Collection, Named};

use crate::decode::CONTENT;
use crate::document::{Document, Element, Node};
use crate::profile::ExportProfile;
use crate::value;

const DESCRIPTION: &str = "Description";

/// Builds document elements for entities of one controller.
pub struct Encoder<'a> {
    profile: &'a ExportProfile,
    data_types: &'a Collection<DataType>,
}

impl<'a> Encoder<'a> {
    pub fn new(profile: &'a ExportProfile, data_types: &'a Collection<DataType>) -> Self {
        Self { profile, data_types }
    }

    /// The `RSLogix5000Content` root for a document targeting `target_name`.
    pub fn content(&self, target_type: &str, target_name: &str, extra: &[(&str, String)]) -> Element {
        let mut root = Element::new(CONTENT)
            .with_attr("SchemaRevision", &self.profile.schema_revision)
            .with_attr("SoftwareRevision", &self.profile.software_revision)
            .with_attr("TargetName", target_name)
            .with_attr("TargetType", target_type);
        for (key, value) in extra {
            root.set_attr(key, value);
        }
        root.with_bool("ContainsContext", true)
            .with_attr("ExportDate", &self.profile.export_date)
            .with_attr("ExportOptions", &self.profile.export_options)
    }

    pub fn controller_header(&self, controller: &Controller) -> Element {
        Element::new("Controller")
            .with_attr("Name", controller.name())
            .with_opt("ProcessorType", controller.processor_type.as_deref())
            .with_opt("MajorRev", controller.major_rev)
            .with_opt("MinorRev", controller.minor_rev)
            .with_attr("ProjectCreationDate", &self.profile.project_creation_date)
            .with_attr("LastModifiedDate", &self.profile.last_modified_date)
            .with_opt("SFCExecutionControl", controller.sfc_execution_control.as_deref())
            .with_opt("SFCRestartPosition", controller.sfc_restart_position.as_deref())
            .with_opt("SFCLastScan", controller.sfc_last_scan.as_deref())
            .with_opt("CommPath", controller.comm_path.as_deref())
            .with_opt("ProjectSN", controller.project_sn.as_deref())
            .with_bool("MatchProjectToController", controller.match_project_to_controller)
            .with_bool("CanUseRPIFromProducer", controller.can_use_rpi_from_producer)
            .with_attr(
                "InhibitAutomaticFirmwareUpdate",
                u8::from(controller.inhibit_automatic_firmware_update),
            )
            .with_opt("PassThroughConfiguration", controller.pass_through_configuration.as_deref())
            .with_bool(
                "DownloadProjectDocumentationAndExtendedProperties",
                controller.download_project_documentation_and_extended_properties,
            )
            .with_bool("DownloadProjectCustomProperties", controller.download_project_custom_properties)
            .with_bool("ReportMinorOverflow", controller.report_minor_overflow)
            .with_children(description(controller.description.as_deref()))
    }

    /// `None` for atomic and built-in instruction types, which are never
    /// written out.
    pub fn data_type(&self, data_type: &DataType, with_dependencies: bool) -> Option<Element> {
        if data_type.is_terminal() {
            return None;
        }
        let mut e = Element::new("DataType")
            .with_attr("Name", data_type.name())
            .with_opt("Family", data_type.family)
            .with_opt(
                "Class",
                data_type
                    .class
                    .filter(|c| *c != logix_core::vocab::DataTypeClass::Standard),
            )
            .with_children(description(data_type.description.as_deref()));
        if data_type.members.is_empty() {
            return Some(e);
        }
        e.push(Element::new("Members").with_children(data_type.members.iter().map(|m| self.member(m))));

        if with_dependencies {
            let mut seen: Vec<&str> = Vec::new();
            for member in &data_type.members {
                let Some(member_type) = self.data_types.by_name(&member.data_type_name) else {
                    continue;
                };
                if member_type.is_terminal() || seen.contains(&member_type.name()) {
                    continue;
                }
                seen.push(member_type.name());
            }
            if !seen.is_empty() {
                e.push(Element::new("Dependencies").with_children(seen.into_iter().map(|name| {
                    Element::new("Dependency")
                        .with_attr("Type", "DataType")
                        .with_attr("Name", name)
                })));
            }
        }
        Some(e)
    }

    fn member(&self, member: &DataTypeMember) -> Element {
        Element::new("Member")
            .with_attr("Name", member.name())
            .with_attr(
                "DataType",
                member.emitted_type_name(self.profile.scalar_bool_members_as_bit),
            )
            .with_attr("Dimension", member.dimension)
            .with_opt("Radix", member.radix)
            .with_bool("Hidden", member.hidden)
            .with_opt("Target", member.target.as_deref())
            .with_opt("BitNumber", member.bit_number)
            .with_opt("ExternalAccess", member.external_access)
            .with_children(description(member.description.as_deref()))
    }

    pub fn tag(&self, tag: &Tag) -> Element {
        let mut e = Element::new("Tag")
            .with_attr("Name", tag.name())
            .with_opt("Class", tag.class)
            .with_attr("TagType", tag.tag_type);
        if tag.is_alias() {
            e = e.with_opt("AliasFor", tag.alias_for.as_deref());
        } else {
            e = e
                .with_attr("DataType", tag.data_type_name.as_deref().unwrap_or_default())
                .with_opt(
                    "Dimensions",
                    Some(format_dimensions(&tag.dimensions)).filter(|d| !d.is_empty()),
                )
                .with_opt("Radix", tag.radix)
                .with_bool("Constant", tag.constant);
        }
        e = e
            .with_opt("Usage", tag.usage)
            .with_opt("ExternalAccess", tag.external_access)
            .with_children(description(tag.description.as_deref()));
        if let Some(value) = &tag.value {
            e.push(value::write(value));
        }
        e
    }

    pub fn module(&self, module: &Module) -> Element {
        let mut e = Element::new("Module")
            .with_opt(
                "Name",
                Some(module.name()).filter(|n| !n.is_empty()),
            )
            .with_attr("CatalogNumber", &module.catalog_number)
            .with_attr("Vendor", module.vendor)
            .with_attr("ProductType", module.product_type)
            .with_attr("ProductCode", module.product_code)
            .with_attr("Major", module.major)
            .with_attr("Minor", module.minor)
            .with_opt("UserDefinedVendor", module.user_defined_vendor.as_deref())
            .with_opt("UserDefinedProductType", module.user_defined_product_type.as_deref())
            .with_opt("UserDefinedProductCode", module.user_defined_product_code.as_deref())
            .with_opt("UserDefinedMajor", module.user_defined_major.as_deref())
            .with_opt("UserDefinedMinor", module.user_defined_minor.as_deref())
            .with_attr("ParentModule", &module.parent_module)
            .with_attr("ParentModPortId", module.parent_port_id)
            .with_bool("Inhibited", module.inhibited)
            .with_bool("MajorFault", module.major_fault);
        if module.safety_enabled {
            e = e.with_bool("SafetyEnabled", true);
        }
        e = e
            .with_opt("SafetyNetwork", module.safety_network.as_deref())
            .with_children(description(module.description.as_deref()));
        if let Some(state) = module.ekey_state {
            e.push(Element::new("EKey").with_attr("State", state));
        }
        e.push(Element::new("Ports").with_children(module.ports.iter().map(port)));
        if let Some(communications) = &module.communications {
            e.push(extension(communications));
        }
        if let Some(extended) = &module.extended_properties {
            e.push(extension(extended));
        }
        e
    }

    pub fn add_on_instruction(&self, aoi: &AddOnInstruction) -> Element {
        let mut e = Element::new("AddOnInstructionDefinition")
            .with_attr("Name", aoi.name())
            .with_opt("Class", aoi.class)
            .with_opt("Revision", aoi.revision.as_deref())
            .with_opt("Vendor", aoi.vendor.as_deref())
            .with_bool("ExecutePrescan", aoi.execute_prescan)
            .with_bool("ExecutePostscan", aoi.execute_postscan)
            .with_bool("ExecuteEnableInFalse", aoi.execute_enable_in_false)
            .with_attr(
                "CreatedDate",
                aoi.created_date.as_deref().unwrap_or(&self.profile.aoi_created_date),
            )
            .with_opt("CreatedBy", aoi.created_by.as_deref())
            .with_attr(
                "EditedDate",
                aoi.edited_date.as_deref().unwrap_or(&self.profile.aoi_edited_date),
            )
            .with_opt("EditedBy", aoi.edited_by.as_deref())
            .with_opt("SoftwareRevision", aoi.software_revision.as_deref())
            .with_children(description(aoi.description.as_deref()));
        if let Some(note) = aoi.revision_note.as_deref() {
            e.push(Element::cdata("RevisionNote", note));
        }
        e.push(Element::new("Parameters").with_children(aoi.parameters.iter().map(parameter)));
        e.push(Element::new("LocalTags").with_children(aoi.local_tags.iter().map(local_tag)));
        e.push(Element::new("Routines").with_children(aoi.routines.iter().map(routine)));
        e
    }

    pub fn program(&self, program: &Program) -> Element {
        Element::new("Program")
            .with_attr("Name", program.name())
            .with_bool("TestEdits", program.test_edits)
            .with_opt("MainRoutineName", program.main_routine_name.as_deref())
            .with_bool("Disabled", program.disabled)
            .with_opt("Class", program.class)
            .with_bool("UseAsFolder", program.use_as_folder)
            .with_children(description(program.description.as_deref()))
            .with_child(Element::new("Tags").with_children(program.tags.iter().map(|t| self.tag(t))))
            .with_child(Element::new("Routines").with_children(program.routines.iter().map(routine)))
    }

    /// A full project document.
    pub fn controller(&self, controller: &Controller) -> Document {
        let mut header = self.controller_header(controller);
        header.attributes.insert(0, ("Use".to_string(), "Target".to_string()));
        if let Some(info) = &controller.redundancy_info {
            header.push(redundancy(info));
        }
        if let Some(security) = &controller.security {
            header.push(security_element(security));
        }
        if let Some(safety) = &controller.safety_info {
            header.push(safety_element(safety));
        }
        header.push(
            Element::new("DataTypes")
                .with_children(controller.data_types.iter().filter_map(|dt| self.data_type(dt, false))),
        );
        header.push(Element::new("Modules").with_children(controller.modules.iter().map(|m| self.module(m))));
        header.push(
            Element::new("AddOnInstructionDefinitions")
                .with_children(controller.add_on_instructions.iter().map(|a| self.add_on_instruction(a))),
        );
        header.push(Element::new("Tags").with_children(controller.tags.iter().map(|t| self.tag(t))));
        header.push(Element::new("Programs").with_children(controller.programs.iter().map(|p| self.program(p))));
        header.push(Element::new("Tasks").with_children(controller.tasks.iter().map(task)));
        header.push(Element::new("CST").with_attr("MasterID", 0));
        header.push(
            Element::new("WallClockTime")
                .with_attr("LocalTimeAdjustment", 0)
                .with_attr("TimeZone", 0),
        );
        header.push(
            Element::new("TimeSynchronize")
                .with_attr("Priority1", 128)
                .with_attr("Priority2", 128)
                .with_bool("PTPEnable", true),
        );
        header.push(
            Element::new("EthernetPorts").with_child(
                Element::new("EthernetPort")
                    .with_attr("Port", 1)
                    .with_attr("Label", 1)
                    .with_bool("PortEnable", true),
            ),
        );

        Document::new(self.content("Controller", controller.name(), &[]).with_child(header))
    }
}

/// Encode a whole controller with `profile`.
pub fn encode(controller: &Controller, profile: &ExportProfile) -> Document {
    Encoder::new(profile, &controller.data_types).controller(controller)
}

fn description(text: Option<&str>) -> Option<Element> {
    text.map(|t| Element::cdata(DESCRIPTION, t))
}

fn port(port: &ModulePort) -> Element {
    let e = Element::new("Port")
        .with_attr("Id", port.id)
        .with_opt("Address", port.address.as_deref())
        .with_opt("Type", port.port_type)
        .with_bool("Upstream", port.upstream)
        .with_opt("SafetyNetwork", port.safety_network.as_deref());
    match port.bus_size {
        Some(size) if size > 0 => e.with_child(Element::new("Bus").with_attr("Size", size)),
        _ => e,
    }
}

fn extension(node: &ExtensionElement) -> Element {
    let mut e = Element::new(node.name.as_str());
    e.attributes = node.attributes.clone();
    if let Some(text) = &node.text {
        e.children.push(Node::Text(text.clone()));
    }
    e.with_children(node.children.iter().map(extension))
}

fn parameter(p: &AoiParameter) -> Element {
    Element::new("Parameter")
        .with_attr("Name", p.name())
        .with_attr("TagType", p.tag_type)
        .with_opt("DataType", p.data_type_name.as_deref())
        .with_opt("Dimensions", p.dimensions.filter(|d| *d > 0))
        .with_opt("Usage", p.usage)
        .with_opt("Radix", p.radix)
        .with_bool("Required", p.required)
        .with_bool("Visible", p.visible)
        .with_opt("ExternalAccess", p.external_access)
        .with_opt("Constant", p.constant.map(logix_core::vocab::bool_str))
        .with_children(description(p.description.as_deref()))
}

fn local_tag(t: &LocalTag) -> Element {
    Element::new("LocalTag")
        .with_attr("Name", t.name())
        .with_opt("DataType", t.data_type_name.as_deref())
        .with_opt("Dimensions", t.dimensions.filter(|d| *d > 0))
        .with_opt("Radix", t.radix)
        .with_opt("ExternalAccess", t.external_access)
        .with_children(description(t.description.as_deref()))
}

pub fn routine(routine: &Routine) -> Element {
    Element::new("Routine")
        .with_attr("Name", routine.name())
        .with_opt("Type", routine.routine_type)
        .with_children(description(routine.description.as_deref()))
        .with_child(Element::new("RLLContent").with_children(routine.rungs.iter().map(rung)))
}

fn rung(rung: &Rung) -> Element {
    Element::new("Rung")
        .with_attr("Number", rung.number)
        .with_opt("Type", rung.rung_type)
        .with_children(rung.comment.as_deref().map(|c| Element::cdata("Comment", c)))
        .with_children(
            rung.text
                .as_deref()
                .filter(|t| !t.is_empty())
                .map(|t| Element::cdata("Text", t)),
        )
}

pub fn task(task: &Task) -> Element {
    Element::new("Task")
        .with_attr("Name", task.name())
        .with_opt("Type", task.task_type)
        .with_opt("Rate", task.rate.as_deref())
        .with_attr("Priority", task.priority)
        .with_attr("Watchdog", task.watchdog)
        .with_bool("DisableUpdateOutputs", task.disable_update_outputs)
        .with_bool("InhibitTask", task.inhibit_task)
        .with_opt("Class", task.class)
        .with_children(description(task.description.as_deref()))
        .with_child(
            Element::new("ScheduledPrograms").with_children(
                task.scheduled_programs
                    .iter()
                    .map(|p| Element::new("ScheduledProgram").with_attr("Name", p)),
            ),
        )
}

fn redundancy(info: &RedundancyInfo) -> Element {
    Element::new("RedundancyInfo")
        .with_bool("Enabled", info.enabled)
        .with_bool("KeepTestEditsOnSwitchOver", info.keep_test_edits_on_switch_over)
}

fn security_element(security: &SecurityInfo) -> Element {
    Element::new("Security")
        .with_attr("Code", security.code)
        .with_attr("ChangesToDetect", &security.changes_to_detect)
}

fn safety_element(safety: &SafetyInfo) -> Element {
    let mut e = Element::new("SafetyInfo")
        .with_opt("SafetySignature", safety.safety_signature.as_deref())
        .with_bool("SafetyLocked", safety.safety_locked)
        .with_opt("SafetyLockPassword", safety.safety_lock_password.as_deref())
        .with_opt("SafetyUnlockPassword", safety.safety_unlock_password.as_deref())
        .with_bool("SignatureRunModeProtect", safety.signature_run_mode_protect)
        .with_bool("ConfigureSafetyIOAlways", safety.configure_safety_io_always)
        .with_opt("SafetyLevel", safety.safety_level.as_deref());
    if !safety.safety_tag_map.is_empty() {
        let mut map = Element::new("SafetyTagMap");
        map.push_text(safety.safety_tag_map.join(", "));
        e.push(map);
    }
    e
}
