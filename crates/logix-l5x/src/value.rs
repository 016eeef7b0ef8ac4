//! Decorated tag data: `<Data Format="Decorated">`.
//!
//! Reading copies values from a document into a value tree that was derived
//! from the tag's data type, so the tree's shape always wins over whatever the
//! document holds. Nodes are matched on element kind, `Name` and `DataType`
//! among direct children; anything unmatched keeps its default.

use tracing::debug;

use logix_core::datatype::normalize_member_type;
use logix_core::value::{
    cell_count, flat_index, format_index, format_value_dims, parse_index, unflatten, ArrayElements,
    MemberValue, TagValue, ZERO,
};

use crate::document::Element;

pub const DATA: &str = "Data";
pub const FORMAT: &str = "Format";
pub const DECORATED: &str = "Decorated";

/// The decorated payload among the `Data` children of a tag element.
pub fn decorated_payload(tag: &Element) -> Option<&Element> {
    tag.children_named(DATA)
        .find(|d| d.attr(FORMAT) == Some(DECORATED))
}

/// Copy values from a decorated payload into `value`.
pub fn read(value: &mut TagValue, payload: &Element) {
    let Some(node) = payload.child(value.kind()) else {
        debug!(kind = value.kind(), "decorated payload has no matching node");
        return;
    };
    match value {
        TagValue::DataValue { value, .. } => {
            // Non-numeric top-level values are left at their default.
            match node.attr("Value").map(|v| v.trim().parse::<i64>()) {
                Some(Ok(parsed)) => *value = parsed,
                Some(Err(_)) => debug!(value = ?node.attr("Value"), "non-integer scalar value ignored"),
                None => {}
            }
        }
        TagValue::Array { dims, elements, .. } => read_elements(elements, dims, node),
        TagValue::Structure { members, .. } => read_members(members, node),
    }
}

fn same_type(declared: Option<&str>, expected: &str) -> bool {
    declared.is_some_and(|d| normalize_member_type(d) == normalize_member_type(expected))
}

fn read_members(members: &mut [MemberValue], node: &Element) {
    for member in members {
        let found = node.elements().find(|e| {
            e.name == member.kind()
                && e.attr("Name") == Some(member.name())
                && same_type(e.attr("DataType"), member.data_type())
        });
        let Some(found) = found else {
            continue;
        };
        match member {
            MemberValue::DataValue { value, .. } => {
                if let Some(v) = found.attr("Value") {
                    *value = v.to_string();
                }
            }
            MemberValue::Array {
                dimension, elements, ..
            } => {
                let dims = [*dimension];
                read_elements(elements, &dims, found);
            }
            MemberValue::Structure { members, .. } => read_members(members, found),
        }
    }
}

fn read_elements(elements: &mut ArrayElements, dims: &[usize], node: &Element) {
    for (position, element) in node.children_named("Element").enumerate() {
        let slot = match element.attr("Index") {
            None => position,
            Some(text) => match parse_index(text).and_then(|index| flat_index(dims, &index)) {
                Some(slot) => slot,
                None => {
                    debug!(index = text, "array element index out of range");
                    continue;
                }
            },
        };
        match elements {
            ArrayElements::Scalars(cells) => {
                if let (Some(cell), Some(v)) = (cells.get_mut(slot), element.attr("Value")) {
                    *cell = v.to_string();
                }
            }
            ArrayElements::Structures(items) => {
                if let (Some(members), Some(structure)) = (items.get_mut(slot), element.child("Structure")) {
                    read_members(members, structure);
                }
            }
        }
    }
}

/// Build the `Data` element for `value`.
pub fn write(value: &TagValue) -> Element {
    let node = match value {
        TagValue::DataValue {
            data_type,
            radix,
            value,
        } => Element::new("DataValue")
            .with_attr("DataType", data_type)
            .with_opt("Radix", *radix)
            .with_attr("Value", value),
        TagValue::Array {
            data_type,
            radix,
            dims,
            elements,
        } => Element::new("Array")
            .with_attr("DataType", data_type)
            .with_attr("Dimensions", format_value_dims(dims))
            .with_opt("Radix", *radix)
            .with_children(write_elements(elements, dims, data_type)),
        TagValue::Structure { data_type, members } => Element::new("Structure")
            .with_attr("DataType", data_type)
            .with_children(members.iter().map(write_member)),
    };
    Element::new(DATA).with_attr(FORMAT, DECORATED).with_child(node)
}

fn cell_text(cell: &str) -> &str {
    if cell.is_empty() {
        ZERO
    } else {
        cell
    }
}

fn write_member(member: &MemberValue) -> Element {
    match member {
        MemberValue::DataValue {
            name,
            data_type,
            radix,
            value,
        } => Element::new("DataValueMember")
            .with_attr("Name", name)
            .with_attr("DataType", data_type)
            .with_opt("Radix", *radix)
            .with_attr("Value", cell_text(value)),
        MemberValue::Array {
            name,
            data_type,
            radix,
            dimension,
            elements,
        } => Element::new("ArrayMember")
            .with_attr("Name", name)
            .with_attr("DataType", data_type)
            .with_attr("Dimensions", dimension)
            .with_opt("Radix", *radix)
            .with_children(write_elements(elements, &[*dimension], data_type)),
        MemberValue::Structure {
            name,
            data_type,
            members,
        } => Element::new("StructureMember")
            .with_attr("Name", name)
            .with_attr("DataType", data_type)
            .with_children(members.iter().map(write_member)),
    }
}

/// One `Element` per cell, every cell written.
fn write_elements(elements: &ArrayElements, dims: &[usize], data_type: &str) -> Vec<Element> {
    let count = cell_count(dims).map_or(elements.len(), |c| c.min(elements.len()));
    (0..count)
        .map(|flat| {
            let element = Element::new("Element").with_attr("Index", format_index(&unflatten(dims, flat)));
            match elements {
                ArrayElements::Scalars(cells) => element.with_attr("Value", cell_text(&cells[flat])),
                ArrayElements::Structures(items) => element.with_child(
                    Element::new("Structure")
                        .with_attr("DataType", data_type)
                        .with_children(items[flat].iter().map(write_member)),
                ),
            }
        })
        .collect()
}
