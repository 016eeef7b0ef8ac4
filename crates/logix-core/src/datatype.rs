//! Data types and their members.

use crate::collection::{Id, Named};
use crate::description::DescriptionProperties;
use crate::error::Result;
use crate::name;
use crate::vocab::{DataTypeClass, ExternalAccess, Family, Radix};

/// Declared type name of a scalar single-bit member in a document.
pub const BIT: &str = "BIT";
/// Internal name every single-bit member is stored with.
pub const BOOL: &str = "BOOL";

const ATOMIC_NAMES: &[&str] = &[
    "BOOL", "BIT", "SINT", "USINT", "INT", "UINT", "DINT", "UDINT", "LINT", "REAL",
];

/// A member of a [`DataType`].
#[derive(Debug, Clone, PartialEq)]
pub struct DataTypeMember {
    name: String,
    pub description: Option<String>,
    /// Declared type name. `BIT` is normalized to `BOOL` on construction.
    pub data_type_name: String,
    /// Array length; 0 is a scalar.
    pub dimension: u32,
    pub radix: Option<Radix>,
    pub hidden: bool,
    /// Backing member for bit overlays.
    pub target: Option<String>,
    pub bit_number: Option<u32>,
    pub external_access: Option<ExternalAccess>,
    pub properties: DescriptionProperties,
    /// Resolved by rebind.
    pub data_type: Option<Id<DataType>>,
}

impl DataTypeMember {
    pub fn new(name: impl Into<String>, data_type_name: impl Into<String>) -> Self {
        let declared = data_type_name.into();
        Self {
            name: name.into(),
            description: None,
            data_type_name: normalize_member_type(&declared).to_string(),
            dimension: 0,
            radix: None,
            hidden: false,
            target: None,
            bit_number: None,
            external_access: Some(ExternalAccess::ReadWrite),
            properties: DescriptionProperties::default(),
            data_type: None,
        }
    }

    pub fn with_dimension(mut self, dimension: u32) -> Self {
        self.dimension = dimension;
        self
    }

    pub fn with_radix(mut self, radix: Radix) -> Self {
        self.radix = Some(radix);
        self
    }

    pub fn hidden(mut self) -> Self {
        self.hidden = true;
        self
    }

    pub fn set_name(&mut self, new_name: &str) -> Result<()> {
        name::validate(new_name)?;
        self.name = new_name.to_string();
        Ok(())
    }

    /// Type name to write into a document.
    ///
    /// With `bool_as_bit` set, a scalar `BOOL` member is written as `BIT`.
    pub fn emitted_type_name(&self, bool_as_bit: bool) -> &str {
        if bool_as_bit && self.dimension == 0 && self.data_type_name == BOOL {
            BIT
        } else {
            &self.data_type_name
        }
    }
}

impl Named for DataTypeMember {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Map a declared member type onto its stored form.
pub fn normalize_member_type(declared: &str) -> &str {
    if declared == BIT {
        BOOL
    } else {
        declared
    }
}

/// A user-defined, atomic or built-in instruction data type.
#[derive(Debug, Clone, PartialEq)]
pub struct DataType {
    name: String,
    pub description: Option<String>,
    pub family: Option<Family>,
    pub class: Option<DataTypeClass>,
    pub is_atomic: bool,
    pub is_base_instruction: bool,
    pub members: Vec<DataTypeMember>,
    pub properties: DescriptionProperties,
}

impl DataType {
    /// A user-defined type with no members.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            family: Some(Family::NoFamily),
            class: Some(DataTypeClass::User),
            is_atomic: false,
            is_base_instruction: false,
            members: Vec::new(),
            properties: DescriptionProperties::default(),
        }
    }

    pub fn atomic(name: impl Into<String>) -> Self {
        Self {
            family: Some(Family::None),
            class: Some(DataTypeClass::Standard),
            is_atomic: true,
            ..Self::new(name)
        }
    }

    fn base_instruction(name: &str, members: Vec<DataTypeMember>) -> Self {
        Self {
            family: Some(Family::None),
            class: Some(DataTypeClass::Standard),
            is_base_instruction: true,
            members,
            ..Self::new(name)
        }
    }

    pub fn with_member(mut self, member: DataTypeMember) -> Self {
        self.members.push(member);
        self
    }

    pub fn set_name(&mut self, new_name: &str) -> Result<()> {
        name::validate(new_name)?;
        self.name = new_name.to_string();
        Ok(())
    }

    /// Atomic and built-in instruction types have no dependencies and are
    /// never written as standalone definitions.
    pub fn is_terminal(&self) -> bool {
        self.is_atomic || self.is_base_instruction
    }

    pub fn member(&self, name: &str) -> Option<&DataTypeMember> {
        self.members.iter().find(|m| m.name == name)
    }

    /// The types every controller carries.
    pub fn builtins() -> Vec<DataType> {
        let mut types: Vec<DataType> = ATOMIC_NAMES.iter().map(|n| DataType::atomic(*n)).collect();
        types.push(timer());
        types.push(control());
        types
    }
}

impl Named for DataType {
    fn name(&self) -> &str {
        &self.name
    }
}

fn dint(name: &str) -> DataTypeMember {
    DataTypeMember::new(name, "DINT").with_radix(Radix::Decimal)
}

fn bit(name: &str) -> DataTypeMember {
    DataTypeMember::new(name, BOOL)
}

fn timer() -> DataType {
    let mut members = vec![dint("PRE"), dint("ACC")];
    members.extend(["EN", "TT", "DN"].map(bit));
    DataType::base_instruction("TIMER", members)
}

fn control() -> DataType {
    let mut members = vec![dint("LEN"), dint("POS")];
    members.extend(["EN", "EU", "DN", "EM", "ER", "UL", "IN", "FD"].map(bit));
    DataType::base_instruction("CONTROL", members)
}
