//! Closed vocabularies used by L5X attributes.
//!
//! Every vocabulary maps to and from the exact attribute strings found in a
//! document. Unknown strings parse to `None` so a slightly nonstandard file still
//! loads.

use std::fmt;

use serde::Serialize;

macro_rules! vocabulary {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident => $text:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub enum $name {
            $(#[serde(rename = $text)] $variant),+
        }

        impl $name {
            /// All variants in declaration order.
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// The attribute string for this variant.
            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }

            /// Parse an attribute string, returning `None` for unknown values.
            pub fn parse(s: &str) -> Option<Self> {
                match s {
                    $($text => Some($name::$variant),)+
                    _ => None,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

vocabulary! {
    /// Display base of a scalar value.
    pub enum Radix {
        NullType => "NullType",
        General => "General",
        Binary => "Binary",
        Octal => "Octal",
        Decimal => "Decimal",
        Hex => "Hex",
        Exponential => "Exponential",
        Float => "Float",
        Ascii => "ASCII",
        Unicode => "Unicode",
        DateTime => "Date/Time",
        DateTimeNs => "Date/Time (ns)",
    }
}

vocabulary! {
    /// How a tag owns its storage.
    pub enum TagType {
        Base => "Base",
        Alias => "Alias",
        AddOnInstruction => "AddOnInstruction",
    }
}

vocabulary! {
    /// Tag and parameter usage.
    pub enum TagUsage {
        Public => "Public",
        Input => "Input",
        Output => "Output",
        InOut => "InOut",
    }
}

vocabulary! {
    /// Safety classification of a program, tag or AOI.
    pub enum LogixClass {
        NoClass => "N/A",
        Standard => "Standard",
        Safety => "Safety",
    }
}

vocabulary! {
    pub enum Family {
        NoFamily => "NoFamily",
        None => "None",
        StringFamily => "StringFamily",
    }
}

vocabulary! {
    pub enum DataTypeClass {
        User => "User",
        Standard => "Standard",
    }
}

vocabulary! {
    pub enum TaskType {
        Continuous => "CONTINUOUS",
        Periodic => "PERIODIC",
        Event => "EVENT",
    }
}

vocabulary! {
    pub enum RoutineType {
        Rll => "RLL",
        St => "ST",
        Fbd => "FBD",
        Sfc => "SFC",
    }
}

vocabulary! {
    pub enum RungType {
        Normal => "N",
        Insert => "I",
        Delete => "D",
        Replace => "R",
    }
}

vocabulary! {
    /// Electronic keying state of a module.
    pub enum EKeyState {
        Disabled => "Disabled",
        CompatibleModule => "CompatibleModule",
        ExactMatch => "ExactMatch",
    }
}

vocabulary! {
    pub enum PortType {
        Icp => "ICP",
        Ethernet => "Ethernet",
        PointIo => "PointIO",
        RhinoBp => "RhinoBP",
        Compact => "Compact",
    }
}

vocabulary! {
    /// External access level of a tag or parameter.
    pub enum ExternalAccess {
        ReadWrite => "Read/Write",
        ReadOnly => "Read Only",
        None => "None",
    }
}

vocabulary! {
    /// Leading token of a description metadata block.
    pub enum DescriptionIdentifier {
        AddOnInstruction => "@AOI",
        Controller => "@CONTROLLER",
        DataType => "@DATATYPE",
        Info => "@INFO",
        Module => "@MODULE",
        Program => "@PROGRAM",
        Routine => "@ROUTINE",
        Rung => "@RUNG",
        Tag => "@TAG",
        Task => "@TASK",
        Todo => "@TODO",
        Udt => "@UDT",
    }
}

/// Parse an L5X boolean attribute (`"true"`/`"false"`, case-insensitive).
pub fn parse_bool(s: &str) -> Option<bool> {
    if s.eq_ignore_ascii_case("true") {
        Some(true)
    } else if s.eq_ignore_ascii_case("false") {
        Some(false)
    } else {
        None
    }
}

/// Format a boolean the way L5X attributes spell it.
pub fn bool_str(value: bool) -> &'static str {
    if value {
        "true"
    } else {
        "false"
    }
}
