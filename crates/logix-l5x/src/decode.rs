//! Document to entity graph.
//!
//! Attribute coercion never fails: a missing or malformed attribute yields the
//! field's default and a `debug!` event. Only a missing `RSLogix5000Content`
//! or `Controller` element is an error. The controller is rebound before it
//! is returned.

use std::str::FromStr;

use tracing::{debug, info};

use logix_core::aoi::{AddOnInstruction, AoiParameter, LocalTag};
use logix_core::controller::{Controller, RedundancyInfo, SafetyInfo, SecurityInfo};
use logix_core::datatype::{DataType, DataTypeMember};
use logix_core::module::{ExtensionElement, Module, ModulePort};
use logix_core::program::Program;
use logix_core::routine::{Routine, Rung};
use logix_core::tag::{parse_dimensions, Tag};
use logix_core::task::Task;
use logix_core::value::TagValue;
use logix_core::vocab::{
    parse_bool, DataTypeClass, EKeyState, ExternalAccess, Family, LogixClass, PortType, Radix, RoutineType,
    RungType, TagType, TagUsage, TaskType,
};
use logix_core::{Collection, Named};

use crate::document::{Document, Element, Node};
use crate::error::{L5xError, Result};
use crate::value;

pub const CONTENT: &str = "RSLogix5000Content";
const DESCRIPTION: &str = "Description";

/// Decode a whole project document into a rebound controller.
pub fn decode(document: &Document) -> Result<Controller> {
    if document.root.name != CONTENT {
        return Err(L5xError::MissingElement {
            element: CONTENT.to_string(),
        });
    }
    let node = document.root.child("Controller").ok_or_else(|| L5xError::MissingElement {
        element: "Controller".to_string(),
    })?;
    let mut controller = controller(node);

    for e in node.list("DataTypes", "DataType") {
        controller.data_types.append(data_type(e), true);
    }
    for e in node.list("Modules", "Module") {
        controller.modules.append(module(e), true);
    }
    for e in node.list("AddOnInstructionDefinitions", "AddOnInstructionDefinition") {
        controller.add_on_instructions.append(add_on_instruction(e), true);
    }
    let tags = tags(&node.list("Tags", "Tag"), &controller.data_types)?;
    controller.tags = tags;
    for e in node.list("Programs", "Program") {
        let program = program(e, &controller.data_types)?;
        controller.programs.append(program, true);
    }
    for e in node.list("Tasks", "Task") {
        controller.tasks.append(task(e), true);
    }

    controller.rebind()?;
    info!(
        controller = controller.name(),
        data_types = controller.data_types.len(),
        tags = controller.tags.len(),
        programs = controller.programs.len(),
        "decoded controller"
    );
    Ok(controller)
}

fn text(e: &Element, key: &str) -> Option<String> {
    e.attr(key).filter(|v| !v.is_empty()).map(str::to_string)
}

fn flag(e: &Element, key: &str) -> bool {
    match e.attr(key) {
        Some(v) => parse_bool(v).unwrap_or_else(|| {
            debug!(element = %e.name, attribute = key, value = v, "not a boolean, using false");
            false
        }),
        None => false,
    }
}

fn number<T: FromStr>(e: &Element, key: &str) -> Option<T> {
    let raw = e.attr(key)?;
    let parsed = raw.trim().parse().ok();
    if parsed.is_none() {
        debug!(element = %e.name, attribute = key, value = raw, "not a number, ignored");
    }
    parsed
}

fn vocab<T>(e: &Element, key: &str, parse: fn(&str) -> Option<T>) -> Option<T> {
    let raw = e.attr(key)?;
    let parsed = parse(raw);
    if parsed.is_none() && !raw.is_empty() {
        debug!(element = %e.name, attribute = key, value = raw, "unknown value, ignored");
    }
    parsed
}

fn description(e: &Element) -> Option<String> {
    e.child_text(DESCRIPTION)
}

fn controller(e: &Element) -> Controller {
    let mut c = Controller::new(e.attr("Name").unwrap_or_default());
    c.description = description(e);
    c.processor_type = text(e, "ProcessorType");
    c.major_rev = number(e, "MajorRev");
    c.minor_rev = number(e, "MinorRev");
    c.sfc_execution_control = text(e, "SFCExecutionControl");
    c.sfc_restart_position = text(e, "SFCRestartPosition");
    c.sfc_last_scan = text(e, "SFCLastScan");
    c.comm_path = text(e, "CommPath");
    c.project_sn = text(e, "ProjectSN");
    c.match_project_to_controller = flag(e, "MatchProjectToController");
    c.can_use_rpi_from_producer = flag(e, "CanUseRPIFromProducer");
    c.inhibit_automatic_firmware_update = number::<u32>(e, "InhibitAutomaticFirmwareUpdate").unwrap_or(0) != 0;
    c.pass_through_configuration = text(e, "PassThroughConfiguration");
    c.download_project_documentation_and_extended_properties =
        flag(e, "DownloadProjectDocumentationAndExtendedProperties");
    c.download_project_custom_properties = flag(e, "DownloadProjectCustomProperties");
    c.report_minor_overflow = flag(e, "ReportMinorOverflow");
    c.redundancy_info = e.child("RedundancyInfo").map(|r| RedundancyInfo {
        enabled: flag(r, "Enabled"),
        keep_test_edits_on_switch_over: flag(r, "KeepTestEditsOnSwitchOver"),
    });
    c.security = e.child("Security").map(|s| SecurityInfo {
        code: number(s, "Code").unwrap_or(0),
        changes_to_detect: s.attr("ChangesToDetect").unwrap_or_default().to_string(),
    });
    c.safety_info = e.child("SafetyInfo").map(|s| SafetyInfo {
        safety_signature: text(s, "SafetySignature"),
        safety_locked: flag(s, "SafetyLocked"),
        safety_lock_password: text(s, "SafetyLockPassword"),
        safety_unlock_password: text(s, "SafetyUnlockPassword"),
        signature_run_mode_protect: flag(s, "SignatureRunModeProtect"),
        configure_safety_io_always: flag(s, "ConfigureSafetyIOAlways"),
        safety_level: text(s, "SafetyLevel"),
        safety_tag_map: s
            .child_text("SafetyTagMap")
            .map(|m| {
                m.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default(),
    });
    c
}

pub(crate) fn data_type(e: &Element) -> DataType {
    let mut dt = DataType::new(e.attr("Name").unwrap_or_default());
    dt.description = description(e);
    if let Some(family) = vocab(e, "Family", Family::parse) {
        dt.family = Some(family);
    }
    if let Some(class) = vocab(e, "Class", DataTypeClass::parse) {
        dt.class = Some(class);
    }
    dt.members = e.list("Members", "Member").into_iter().map(member).collect();
    dt
}

fn member(e: &Element) -> DataTypeMember {
    let mut m = DataTypeMember::new(
        e.attr("Name").unwrap_or_default(),
        e.attr("DataType").unwrap_or_default(),
    );
    m.description = description(e);
    m.dimension = number(e, "Dimension").unwrap_or(0);
    m.radix = vocab(e, "Radix", Radix::parse);
    m.hidden = flag(e, "Hidden");
    m.target = text(e, "Target");
    m.bit_number = number(e, "BitNumber");
    if let Some(access) = vocab(e, "ExternalAccess", ExternalAccess::parse) {
        m.external_access = Some(access);
    }
    m
}

pub(crate) fn module(e: &Element) -> Module {
    let mut m = Module::new(
        e.attr("Name").unwrap_or_default(),
        e.attr("CatalogNumber").unwrap_or_default(),
    );
    m.description = description(e);
    m.vendor = number(e, "Vendor").unwrap_or(0);
    m.product_type = number(e, "ProductType").unwrap_or(0);
    m.product_code = number(e, "ProductCode").unwrap_or(0);
    m.major = number(e, "Major").unwrap_or(0);
    m.minor = number(e, "Minor").unwrap_or(0);
    m.user_defined_vendor = text(e, "UserDefinedVendor");
    m.user_defined_product_type = text(e, "UserDefinedProductType");
    m.user_defined_product_code = text(e, "UserDefinedProductCode");
    m.user_defined_major = text(e, "UserDefinedMajor");
    m.user_defined_minor = text(e, "UserDefinedMinor");
    m.parent_module = e.attr("ParentModule").unwrap_or_default().to_string();
    m.parent_port_id = number(e, "ParentModPortId").unwrap_or(m.parent_port_id);
    m.inhibited = flag(e, "Inhibited");
    m.major_fault = flag(e, "MajorFault");
    m.safety_enabled = flag(e, "SafetyEnabled");
    m.safety_network = text(e, "SafetyNetwork");
    m.ekey_state = e.child("EKey").and_then(|k| vocab(k, "State", EKeyState::parse));
    m.ports = e
        .list("Ports", "Port")
        .into_iter()
        .map(|p| ModulePort {
            id: number(p, "Id").unwrap_or(0),
            address: text(p, "Address"),
            port_type: vocab(p, "Type", PortType::parse),
            upstream: flag(p, "Upstream"),
            safety_network: text(p, "SafetyNetwork"),
            bus_size: p.child("Bus").and_then(|b| number(b, "Size")),
        })
        .collect();
    m.communications = e.child("Communications").map(extension);
    m.extended_properties = e.child("ExtendedProperties").map(extension);
    m
}

fn extension(e: &Element) -> ExtensionElement {
    let text: String = e
        .children
        .iter()
        .filter_map(|n| match n {
            Node::Text(t) | Node::CData(t) => Some(t.as_str()),
            _ => None,
        })
        .collect();
    ExtensionElement {
        name: e.name.clone(),
        attributes: e.attributes.clone(),
        text: Some(text).filter(|t| !t.trim().is_empty()),
        children: e.elements().map(extension).collect(),
    }
}

pub(crate) fn add_on_instruction(e: &Element) -> AddOnInstruction {
    let mut aoi = AddOnInstruction::new(e.attr("Name").unwrap_or_default());
    aoi.description = description(e);
    aoi.class = vocab(e, "Class", LogixClass::parse);
    aoi.revision = text(e, "Revision");
    aoi.vendor = text(e, "Vendor");
    aoi.execute_prescan = flag(e, "ExecutePrescan");
    aoi.execute_postscan = flag(e, "ExecutePostscan");
    aoi.execute_enable_in_false = flag(e, "ExecuteEnableInFalse");
    aoi.created_date = text(e, "CreatedDate");
    aoi.created_by = text(e, "CreatedBy");
    aoi.edited_date = text(e, "EditedDate");
    aoi.edited_by = text(e, "EditedBy");
    aoi.software_revision = text(e, "SoftwareRevision");
    aoi.revision_note = e.child_text("RevisionNote");
    aoi.parameters = e.list("Parameters", "Parameter").into_iter().map(parameter).collect();
    aoi.local_tags = e.list("LocalTags", "LocalTag").into_iter().map(local_tag).collect();
    for r in e.list("Routines", "Routine") {
        aoi.routines.append(routine(r), true);
    }
    aoi
}

fn parameter(e: &Element) -> AoiParameter {
    let mut p = AoiParameter::new(
        e.attr("Name").unwrap_or_default(),
        e.attr("DataType").unwrap_or_default(),
        TagUsage::Input,
    );
    p.data_type_name = text(e, "DataType");
    p.description = description(e);
    p.tag_type = vocab(e, "TagType", TagType::parse).unwrap_or(TagType::Base);
    p.dimensions = number(e, "Dimensions");
    p.usage = vocab(e, "Usage", TagUsage::parse);
    p.radix = vocab(e, "Radix", Radix::parse);
    p.required = flag(e, "Required");
    p.visible = flag(e, "Visible");
    p.external_access = vocab(e, "ExternalAccess", ExternalAccess::parse);
    p.constant = e.attr("Constant").and_then(parse_bool);
    p
}

fn local_tag(e: &Element) -> LocalTag {
    let mut t = LocalTag::new(
        e.attr("Name").unwrap_or_default(),
        e.attr("DataType").unwrap_or_default(),
    );
    t.data_type_name = text(e, "DataType");
    t.description = description(e);
    t.dimensions = number(e, "Dimensions");
    t.radix = vocab(e, "Radix", Radix::parse);
    t.external_access = vocab(e, "ExternalAccess", ExternalAccess::parse);
    t
}

/// Decode tags and their decorated values against `data_types`.
pub(crate) fn tags(elements: &[&Element], data_types: &Collection<DataType>) -> Result<Collection<Tag>> {
    let mut tags = Collection::new();
    for e in elements {
        tags.append(tag(e, data_types)?, true);
    }
    Ok(tags)
}

pub(crate) fn tag(e: &Element, data_types: &Collection<DataType>) -> Result<Tag> {
    let name = e.attr("Name").unwrap_or_default();
    let mut t = match text(e, "AliasFor") {
        Some(target) => Tag::alias(name, target),
        None => Tag::new(name, e.attr("DataType").unwrap_or_default()),
    };
    t.description = description(e);
    t.class = vocab(e, "Class", LogixClass::parse);
    if let Some(tag_type) = vocab(e, "TagType", TagType::parse) {
        t.tag_type = tag_type;
    }
    if !t.is_alias() {
        t.data_type_name = text(e, "DataType");
    }
    t.dimensions = e.attr("Dimensions").map(parse_dimensions).unwrap_or_default();
    t.radix = vocab(e, "Radix", Radix::parse);
    t.constant = flag(e, "Constant");
    t.usage = vocab(e, "Usage", TagUsage::parse);
    t.external_access = vocab(e, "ExternalAccess", ExternalAccess::parse);

    t.value = TagValue::derive(&t, data_types)?;
    if let (Some(value), Some(payload)) = (t.value.as_mut(), value::decorated_payload(e)) {
        value::read(value, payload);
    }
    Ok(t)
}

pub(crate) fn program(e: &Element, data_types: &Collection<DataType>) -> Result<Program> {
    let mut p = Program::new(e.attr("Name").unwrap_or_default());
    p.description = description(e);
    p.test_edits = flag(e, "TestEdits");
    p.main_routine_name = text(e, "MainRoutineName");
    p.disabled = flag(e, "Disabled");
    p.class = vocab(e, "Class", LogixClass::parse);
    p.use_as_folder = flag(e, "UseAsFolder");
    p.tags = tags(&e.list("Tags", "Tag"), data_types)?;
    for r in e.list("Routines", "Routine") {
        p.routines.append(routine(r), true);
    }
    Ok(p)
}

pub(crate) fn routine(e: &Element) -> Routine {
    let mut r = Routine::new(e.attr("Name").unwrap_or_default());
    r.description = description(e);
    r.routine_type = vocab(e, "Type", RoutineType::parse);
    r.rungs = e.list("RLLContent", "Rung").into_iter().map(rung).collect();
    r
}

fn rung(e: &Element) -> Rung {
    let mut r = Rung::new(number(e, "Number").unwrap_or(0), String::new());
    r.rung_type = vocab(e, "Type", RungType::parse);
    r.text = e.child_text("Text");
    r.comment = e.child_text("Comment");
    r
}

pub(crate) fn task(e: &Element) -> Task {
    let mut t = Task::new(e.attr("Name").unwrap_or_default(), TaskType::Continuous);
    t.description = description(e);
    t.task_type = vocab(e, "Type", TaskType::parse);
    t.rate = text(e, "Rate");
    t.priority = number(e, "Priority").unwrap_or(t.priority);
    t.watchdog = number(e, "Watchdog").unwrap_or(t.watchdog);
    t.disable_update_outputs = flag(e, "DisableUpdateOutputs");
    t.inhibit_task = flag(e, "InhibitTask");
    t.class = vocab(e, "Class", LogixClass::parse);
    t.scheduled_programs = e
        .list("ScheduledPrograms", "ScheduledProgram")
        .into_iter()
        .filter_map(|p| text(p, "Name"))
        .collect();
    t
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reader::parse;
    use logix_core::value::{ArrayElements, MemberValue};
    use logix_core::TagRef;

    const PROJECT: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<RSLogix5000Content SchemaRevision="1.0" SoftwareRevision="32.04" TargetName="PLC01" TargetType="Controller" ContainsContext="false">
<Controller Use="Target" Name="PLC01" ProcessorType="1756-L83ES" MajorRev="32" MinorRev="11" CommPath="AB_ETHIP-1\10.0.0.1" InhibitAutomaticFirmwareUpdate="0" MatchProjectToController="true" ReportMinorOverflow="bogus">
<Description><![CDATA[<@CONTROLLER><@TYPE CPU> Line 1]]></Description>
<RedundancyInfo Enabled="false" KeepTestEditsOnSwitchOver="false"/>
<Security Code="0" ChangesToDetect="16#ffff_ffff_ffff_ffff"/>
<SafetyInfo SafetyLocked="false" SafetyLevel="SIL2/PLd"><SafetyTagMap> SafeIn=StdIn, SafeOut=StdOut </SafetyTagMap></SafetyInfo>
<DataTypes>
<DataType Name="Motor" Family="NoFamily" Class="User">
<Members>
<Member Name="ZZZZZZZZZZMotor0" DataType="SINT" Dimension="0" Radix="Decimal" Hidden="true" ExternalAccess="Read/Write"/>
<Member Name="Run" DataType="BIT" Dimension="0" Radix="Decimal" Hidden="false" Target="ZZZZZZZZZZMotor0" BitNumber="0" ExternalAccess="Read/Write"/>
<Member Name="Speed" DataType="DINT" Dimension="oops" Radix="Decimal" Hidden="false" ExternalAccess="Read/Write"/>
</Members>
</DataType>
</DataTypes>
<Modules>
<Module Name="Local" CatalogNumber="1756-L83ES" Vendor="1" ProductType="14" ProductCode="200" Major="32" Minor="11" ParentModule="Local" ParentModPortId="1" Inhibited="false" MajorFault="false">
<EKey State="ExactMatch"/>
<Ports><Port Id="1" Address="0" Type="ICP" Upstream="false"><Bus Size="10"/></Port></Ports>
<Communications CommMethod="1"><ConfigTag ConfigSize="4"><Data Format="Message">raw</Data></ConfigTag></Communications>
</Module>
</Modules>
<AddOnInstructionDefinitions/>
<Tags>
<Tag Name="M1" TagType="Base" DataType="Motor" Constant="false" ExternalAccess="Read/Write">
<Data Format="L5K">[0,0]</Data>
<Data Format="Decorated"><Structure DataType="Motor"><DataValueMember Name="Run" DataType="BOOL" Value="1"/><DataValueMember Name="Speed" DataType="DINT" Radix="Decimal" Value="1500"/></Structure></Data>
</Tag>
<Tag Name="M1Run" TagType="Alias" AliasFor="M1.Run" ExternalAccess="Read/Write"/>
<Tag Name="Counts" TagType="Base" DataType="DINT" Dimensions="4" Radix="Decimal">
<Data Format="Decorated"><Array DataType="DINT" Dimensions="4" Radix="Decimal"><Element Index="[3]" Value="9"/></Array></Data>
</Tag>
</Tags>
<Programs>
<Program Name="Main" TestEdits="false" MainRoutineName="MainRoutine" Disabled="false" Class="Standard" UseAsFolder="false">
<Tags><Tag Name="Local" TagType="Base" DataType="BOOL" Radix="Decimal"/></Tags>
<Routines>
<Routine Name="MainRoutine" Type="RLL">
<Description><![CDATA[<@ROUTINE><@TYPE MAIN>]]></Description>
<RLLContent>
<Rung Number="0" Type="N"><Comment><![CDATA[start]]></Comment><Text><![CDATA[XIC(M1.Run)OTE(Local);]]></Text></Rung>
</RLLContent>
</Routine>
</Routines>
</Program>
</Programs>
<Tasks>
<Task Name="MainTask" Type="CONTINUOUS" Priority="10" Watchdog="500" DisableUpdateOutputs="false" InhibitTask="false" Class="Standard">
<ScheduledPrograms><ScheduledProgram Name="Main"/><ScheduledProgram Name="Ghost"/></ScheduledPrograms>
</Task>
</Tasks>
</Controller>
</RSLogix5000Content>
"#;

    fn controller() -> Controller {
        decode(&parse(PROJECT).unwrap()).unwrap()
    }

    #[test]
    fn controller_attributes_degrade_gracefully() {
        let c = controller();
        assert_eq!(c.name(), "PLC01");
        assert_eq!(c.major_rev, Some(32));
        assert!(c.match_project_to_controller);
        assert!(!c.report_minor_overflow);
        assert_eq!(c.properties.role(), Some("CPU"));
        assert_eq!(c.security.as_ref().unwrap().changes_to_detect, "16#ffff_ffff_ffff_ffff");
        assert_eq!(c.safety_info.as_ref().unwrap().safety_tag_map, vec!["SafeIn=StdIn", "SafeOut=StdOut"]);
    }

    #[test]
    fn bit_members_are_normalized_and_bad_dimensions_default() {
        let c = controller();
        let motor = c.data_types.by_name("Motor").unwrap();
        assert_eq!(motor.member("Run").unwrap().data_type_name, "BOOL");
        assert_eq!(motor.member("Run").unwrap().bit_number, Some(0));
        assert_eq!(motor.member("Speed").unwrap().dimension, 0);
        assert!(motor.member("ZZZZZZZZZZMotor0").unwrap().hidden);
        assert!(c.data_types.by_name("TIMER").is_some());
    }

    #[test]
    fn decorated_values_are_read() {
        let c = controller();
        let Some(TagValue::Structure { members, .. }) = &c.tags.by_name("M1").unwrap().value else {
            panic!("expected structure value");
        };
        assert_eq!(members.len(), 2);
        assert!(matches!(&members[1], MemberValue::DataValue { value, .. } if value == "1500"));

        let Some(TagValue::Array { elements: ArrayElements::Scalars(cells), .. }) = &c.tags.by_name("Counts").unwrap().value else {
            panic!("expected array value");
        };
        assert_eq!(cells, &["0", "0", "0", "9"]);
    }

    #[test]
    fn references_are_bound() {
        let c = controller();
        let alias = c.tags.by_name("M1Run").unwrap();
        assert_eq!(alias.data_type_name.as_deref(), Some("BOOL"));
        assert!(matches!(alias.alias_target, Some(TagRef::Controller(_))));

        let program = c.programs.by_name("Main").unwrap();
        let rung = &program.routines.by_name("MainRoutine").unwrap().rungs[0];
        assert_eq!(rung.comment.as_deref(), Some("start"));
        assert_eq!(rung.tags, vec![c.tags.id_of("M1").unwrap()]);
        assert_eq!(rung.program_tags, vec![program.tags.id_of("Local").unwrap()]);
        assert!(program.main_routine().is_some());

        let task = c.tasks.by_name("MainTask").unwrap();
        assert_eq!(task.scheduled_programs, vec!["Main", "Ghost"]);
        assert_eq!(task.programs, vec![c.programs.id_of("Main").unwrap()]);
    }

    #[test]
    fn module_extension_tree_is_kept() {
        let c = controller();
        let local = c.modules.by_name("Local").unwrap();
        assert_eq!(local.ekey_state, Some(EKeyState::ExactMatch));
        assert_eq!(local.port(1).unwrap().bus_size, Some(10));
        let comms = local.communications.as_ref().unwrap();
        assert_eq!(comms.attribute("CommMethod"), Some("1"));
        let data = comms.child("ConfigTag").and_then(|t| t.child("Data")).unwrap();
        assert_eq!(data.text.as_deref(), Some("raw"));
    }

    #[test]
    fn oversized_dimensions_leave_the_tag_without_value() {
        let text = PROJECT.replace(
            r#"<Tag Name="Counts" TagType="Base" DataType="DINT" Dimensions="4" Radix="Decimal">"#,
            r#"<Tag Name="Counts" TagType="Base" DataType="DINT" Dimensions="4294967295 4294967295 4294967295" Radix="Decimal">"#,
        );
        let c = decode(&parse(&text).unwrap()).unwrap();
        let counts = c.tags.by_name("Counts").unwrap();
        assert_eq!(counts.dimensions, vec![u32::MAX; 3]);
        assert!(counts.value.is_none());
    }

    #[test]
    fn missing_controller_is_an_error() {
        let doc = parse("<RSLogix5000Content/>").unwrap();
        assert!(matches!(decode(&doc), Err(L5xError::MissingElement { ref element }) if element == "Controller"));
        let doc = parse("<Other/>").unwrap();
        assert!(matches!(decode(&doc), Err(L5xError::MissingElement { .. })));
    }
}
