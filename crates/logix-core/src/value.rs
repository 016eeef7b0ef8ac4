//! Tag value trees.
//!
//! A tag's decorated value mirrors its data type: atomic scalars become a
//! [`TagValue::DataValue`], atomic arrays a [`TagValue::Array`] and structured
//! types a [`TagValue::Structure`] whose [`MemberValue`]s follow the type's
//! visible members one level at a time. Hidden members and members whose type
//! cannot be found are left out.

use crate::collection::{Collection, Named};
use crate::datatype::{DataType, DataTypeMember};
use crate::error::{CoreError, Result};
use crate::tag::Tag;
use crate::vocab::Radix;

use tracing::debug;

/// Highest array rank a tag may declare.
pub const MAX_RANK: usize = 3;

/// Most cells an array value may hold. Larger declarations get no value tree.
pub const MAX_CELLS: usize = 1 << 21;

/// Default text of a scalar cell.
pub const ZERO: &str = "0";

/// Cells of an array node, stored flat in row-major order.
#[derive(Debug, Clone, PartialEq)]
pub enum ArrayElements {
    Scalars(Vec<String>),
    /// One member list per element of an array of structures.
    Structures(Vec<Vec<MemberValue>>),
}

impl ArrayElements {
    pub fn len(&self) -> usize {
        match self {
            ArrayElements::Scalars(cells) => cells.len(),
            ArrayElements::Structures(elements) => elements.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Top-level node of a tag's value.
#[derive(Debug, Clone, PartialEq)]
pub enum TagValue {
    DataValue {
        data_type: String,
        radix: Option<Radix>,
        value: i64,
    },
    Array {
        data_type: String,
        radix: Option<Radix>,
        dims: Vec<usize>,
        elements: ArrayElements,
    },
    Structure {
        data_type: String,
        members: Vec<MemberValue>,
    },
}

/// Node below a structure.
#[derive(Debug, Clone, PartialEq)]
pub enum MemberValue {
    DataValue {
        name: String,
        data_type: String,
        radix: Option<Radix>,
        value: String,
    },
    Array {
        name: String,
        data_type: String,
        radix: Option<Radix>,
        dimension: usize,
        elements: ArrayElements,
    },
    Structure {
        name: String,
        data_type: String,
        members: Vec<MemberValue>,
    },
}

impl TagValue {
    /// Derive the default value tree of `tag` from its data type.
    ///
    /// Aliases and tags whose type is not in `data_types` have no value.
    pub fn derive(tag: &Tag, data_types: &Collection<DataType>) -> Result<Option<TagValue>> {
        if tag.is_alias() {
            return Ok(None);
        }
        let Some(data_type) = tag
            .data_type_name
            .as_deref()
            .and_then(|n| data_types.by_name(n))
        else {
            return Ok(None);
        };
        if tag.dimensions.len() > MAX_RANK {
            return Err(CoreError::InvalidValueShape {
                name: tag.name().to_string(),
                detail: format!("rank {} exceeds {MAX_RANK}", tag.dimensions.len()),
            });
        }
        let dims: Vec<usize> = tag.dimensions.iter().map(|&d| d as usize).collect();
        let Some(cells) = cell_count(&dims) else {
            debug!(tag = tag.name(), dims = ?dims, "array too large for a value tree");
            return Ok(None);
        };
        let type_name = data_type.name().to_string();
        let mut stack = Vec::new();

        let value = if data_type.is_atomic {
            let radix = Some(tag.radix.unwrap_or(Radix::Decimal));
            if dims.is_empty() {
                TagValue::DataValue {
                    data_type: type_name,
                    radix,
                    value: 0,
                }
            } else {
                TagValue::Array {
                    data_type: type_name,
                    radix,
                    elements: ArrayElements::Scalars(vec![ZERO.to_string(); cells]),
                    dims,
                }
            }
        } else {
            let members = members_of(data_type, data_types, &mut stack)?;
            if dims.is_empty() {
                TagValue::Structure {
                    data_type: type_name,
                    members,
                }
            } else {
                TagValue::Array {
                    data_type: type_name,
                    radix: None,
                    elements: ArrayElements::Structures(vec![members; cells]),
                    dims,
                }
            }
        };
        Ok(Some(value))
    }

    pub fn data_type(&self) -> &str {
        match self {
            TagValue::DataValue { data_type, .. }
            | TagValue::Array { data_type, .. }
            | TagValue::Structure { data_type, .. } => data_type,
        }
    }

    /// The element kind name used in documents.
    pub fn kind(&self) -> &'static str {
        match self {
            TagValue::DataValue { .. } => "DataValue",
            TagValue::Array { .. } => "Array",
            TagValue::Structure { .. } => "Structure",
        }
    }
}

impl MemberValue {
    pub fn name(&self) -> &str {
        match self {
            MemberValue::DataValue { name, .. }
            | MemberValue::Array { name, .. }
            | MemberValue::Structure { name, .. } => name,
        }
    }

    pub fn data_type(&self) -> &str {
        match self {
            MemberValue::DataValue { data_type, .. }
            | MemberValue::Array { data_type, .. }
            | MemberValue::Structure { data_type, .. } => data_type,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            MemberValue::DataValue { .. } => "DataValueMember",
            MemberValue::Array { .. } => "ArrayMember",
            MemberValue::Structure { .. } => "StructureMember",
        }
    }
}

fn members_of(
    data_type: &DataType,
    data_types: &Collection<DataType>,
    stack: &mut Vec<String>,
) -> Result<Vec<MemberValue>> {
    if stack.iter().any(|n| n == data_type.name()) {
        return Err(CoreError::RecursiveDataType {
            name: data_type.name().to_string(),
        });
    }
    stack.push(data_type.name().to_string());
    let mut values = Vec::new();
    for member in data_type.members.iter().filter(|m| !m.hidden) {
        if let Some(value) = member_value(member, data_types, stack)? {
            values.push(value);
        }
    }
    stack.pop();
    Ok(values)
}

fn member_value(
    member: &DataTypeMember,
    data_types: &Collection<DataType>,
    stack: &mut Vec<String>,
) -> Result<Option<MemberValue>> {
    let Some(member_type) = data_types.by_name(&member.data_type_name) else {
        return Ok(None);
    };
    let name = member.name().to_string();
    let data_type = member.data_type_name.clone();
    let dimension = member.dimension as usize;
    if dimension > MAX_CELLS {
        debug!(member = member.name(), dimension, "array member too large for a value tree");
        return Ok(None);
    }

    let value = match (member_type.is_atomic, dimension) {
        (true, 0) => MemberValue::DataValue {
            name,
            data_type,
            radix: member.radix,
            value: ZERO.to_string(),
        },
        (true, _) => MemberValue::Array {
            name,
            data_type,
            radix: member.radix,
            dimension,
            elements: ArrayElements::Scalars(vec![ZERO.to_string(); dimension]),
        },
        (false, 0) => MemberValue::Structure {
            name,
            data_type,
            members: members_of(member_type, data_types, stack)?,
        },
        (false, _) => {
            let members = members_of(member_type, data_types, stack)?;
            MemberValue::Array {
                name,
                data_type,
                radix: None,
                dimension,
                elements: ArrayElements::Structures(vec![members; dimension]),
            }
        }
    };
    Ok(Some(value))
}

/// Number of cells in an array of the given dimensions, `None` above
/// [`MAX_CELLS`].
pub fn cell_count(dims: &[usize]) -> Option<usize> {
    dims.iter()
        .try_fold(1usize, |acc, &d| acc.checked_mul(d))
        .filter(|&n| n <= MAX_CELLS)
}

/// Row-major position of `index` within `dims`, if in range.
pub fn flat_index(dims: &[usize], index: &[usize]) -> Option<usize> {
    if dims.len() != index.len() {
        return None;
    }
    let mut flat = 0;
    for (&i, &d) in index.iter().zip(dims) {
        if i >= d {
            return None;
        }
        flat = flat * d + i;
    }
    Some(flat)
}

/// Multi-dimensional index of the `flat`-th cell.
pub fn unflatten(dims: &[usize], mut flat: usize) -> Vec<usize> {
    let mut index = vec![0; dims.len()];
    for (slot, &d) in index.iter_mut().zip(dims).rev() {
        if d == 0 {
            continue;
        }
        *slot = flat % d;
        flat /= d;
    }
    index
}

/// Parse an element index such as `[3]` or `[1,2]`. Whitespace is tolerated.
pub fn parse_index(text: &str) -> Option<Vec<usize>> {
    let inner = text.trim().strip_prefix('[')?.strip_suffix(']')?;
    inner
        .split(',')
        .map(|part| part.trim().parse::<usize>().ok())
        .collect()
}

/// Format an element index as `[i]`, `[i,j]` or `[i,j,k]`.
pub fn format_index(index: &[usize]) -> String {
    let parts: Vec<String> = index.iter().map(usize::to_string).collect();
    format!("[{}]", parts.join(","))
}

/// Format array dimensions the way an `Array` value node spells them (`"2,3"`).
pub fn format_value_dims(dims: &[usize]) -> String {
    dims.iter()
        .map(usize::to_string)
        .collect::<Vec<_>>()
        .join(",")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types() -> Collection<DataType> {
        let mut types: Collection<DataType> = DataType::builtins().into_iter().collect();
        types.append(
            DataType::new("Motor")
                .with_member(DataTypeMember::new("Speed", "DINT").with_radix(Radix::Decimal))
                .with_member(DataTypeMember::new("Run", "BIT"))
                .with_member(DataTypeMember::new("Hist", "REAL").with_dimension(4))
                .with_member(DataTypeMember::new("ZZZHost", "SINT").hidden())
                .with_member(DataTypeMember::new("Delay", "TIMER"))
                .with_member(DataTypeMember::new("Missing", "NoSuchType")),
            false,
        );
        types.append(
            DataType::new("Line").with_member(DataTypeMember::new("Motors", "Motor").with_dimension(3)),
            false,
        );
        types
    }

    #[test]
    fn atomic_scalar_is_data_value() {
        let value = TagValue::derive(&Tag::new("Count", "DINT"), &types()).unwrap().unwrap();
        assert_eq!(
            value,
            TagValue::DataValue {
                data_type: "DINT".into(),
                radix: Some(Radix::Decimal),
                value: 0
            }
        );
    }

    #[test]
    fn atomic_array_cells_default_to_zero() {
        let tag = Tag::new("Grid", "INT").with_dimensions(vec![2, 3]);
        let TagValue::Array { dims, elements, .. } = TagValue::derive(&tag, &types()).unwrap().unwrap()
        else {
            panic!("expected array");
        };
        assert_eq!(dims, vec![2, 3]);
        assert_eq!(elements, ArrayElements::Scalars(vec!["0".to_string(); 6]));
    }

    #[test]
    fn structure_skips_hidden_and_unresolved_members() {
        let tag = Tag::new("M1", "Motor");
        let TagValue::Structure { members, .. } = TagValue::derive(&tag, &types()).unwrap().unwrap()
        else {
            panic!("expected structure");
        };
        let names: Vec<_> = members.iter().map(MemberValue::name).collect();
        assert_eq!(names, vec!["Speed", "Run", "Hist", "Delay"]);
        assert_eq!(members[1].data_type(), "BOOL");
        assert_eq!(members[2].kind(), "ArrayMember");
        let MemberValue::Structure { members: timer, .. } = &members[3] else {
            panic!("expected timer structure");
        };
        assert_eq!(timer.len(), 5);
    }

    #[test]
    fn array_of_structure_member_holds_every_element() {
        let tag = Tag::new("L1", "Line");
        let TagValue::Structure { members, .. } = TagValue::derive(&tag, &types()).unwrap().unwrap()
        else {
            panic!("expected structure");
        };
        let MemberValue::Array { elements, dimension, .. } = &members[0] else {
            panic!("expected array member");
        };
        assert_eq!(*dimension, 3);
        let ArrayElements::Structures(elements) = elements else {
            panic!("expected structured elements");
        };
        assert_eq!(elements.len(), 3);
        assert_eq!(elements[2].len(), 4);
    }

    #[test]
    fn alias_and_unknown_type_have_no_value() {
        assert!(TagValue::derive(&Tag::alias("A", "B"), &types()).unwrap().is_none());
        assert!(TagValue::derive(&Tag::new("X", "Nope"), &types()).unwrap().is_none());
    }

    #[test]
    fn rank_above_three_is_fatal() {
        let tag = Tag::new("Cube", "DINT").with_dimensions(vec![2, 2, 2, 2]);
        let err = TagValue::derive(&tag, &types()).unwrap_err();
        assert!(matches!(err, CoreError::InvalidValueShape { .. }));
    }

    #[test]
    fn oversized_arrays_have_no_value() {
        let huge = Tag::new("Huge", "DINT").with_dimensions(vec![u32::MAX, u32::MAX, u32::MAX]);
        assert!(TagValue::derive(&huge, &types()).unwrap().is_none());
        let wide = Tag::new("Wide", "DINT").with_dimensions(vec![4096, 4096]);
        assert!(TagValue::derive(&wide, &types()).unwrap().is_none());

        let mut types = types();
        types.append(
            DataType::new("Big").with_member(DataTypeMember::new("Cells", "DINT").with_dimension(u32::MAX)),
            false,
        );
        let TagValue::Structure { members, .. } = TagValue::derive(&Tag::new("B", "Big"), &types).unwrap().unwrap()
        else {
            panic!("expected structure");
        };
        assert!(members.is_empty());

        assert_eq!(cell_count(&[2, 3, 4]), Some(24));
        assert_eq!(cell_count(&[usize::MAX, 2]), None);
    }

    #[test]
    fn recursive_type_is_rejected() {
        let mut types = types();
        types.append(
            DataType::new("Loop").with_member(DataTypeMember::new("Next", "Loop")),
            false,
        );
        let err = TagValue::derive(&Tag::new("L", "Loop"), &types).unwrap_err();
        assert!(matches!(err, CoreError::RecursiveDataType { .. }));
    }

    #[test]
    fn index_math() {
        let dims = [2, 3, 4];
        assert_eq!(flat_index(&dims, &[1, 2, 3]), Some(23));
        assert_eq!(unflatten(&dims, 23), vec![1, 2, 3]);
        assert_eq!(flat_index(&dims, &[2, 0, 0]), None);
        assert_eq!(flat_index(&dims, &[0, 0]), None);
        assert_eq!(parse_index("[1, 2]"), Some(vec![1, 2]));
        assert_eq!(parse_index("[x]"), None);
        assert_eq!(format_index(&[0, 5]), "[0,5]");
        assert_eq!(format_value_dims(&[2, 3]), "2,3");
    }
}
