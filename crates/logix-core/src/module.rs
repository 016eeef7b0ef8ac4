//! I/O modules and their ports.

use crate::collection::Named;
use crate::description::DescriptionProperties;
use crate::error::Result;
use crate::name;
use crate::vocab::{EKeyState, PortType};

/// Port id modules attach to on their parent unless told otherwise.
pub const DEFAULT_PARENT_PORT: u32 = 2;

/// Opaque vendor configuration carried through unchanged.
///
/// `Communications` and `ExtendedProperties` blocks hold module-specific
/// trees; they are kept as plain elements with ordered attributes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExtensionElement {
    pub name: String,
    pub attributes: Vec<(String, String)>,
    pub text: Option<String>,
    pub children: Vec<ExtensionElement>,
}

impl ExtensionElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn child(&self, name: &str) -> Option<&ExtensionElement> {
        self.children.iter().find(|c| c.name == name)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModulePort {
    pub id: u32,
    pub address: Option<String>,
    pub port_type: Option<PortType>,
    pub upstream: bool,
    pub safety_network: Option<String>,
    pub bus_size: Option<u32>,
}

impl ModulePort {
    pub fn new(id: u32, port_type: PortType) -> Self {
        Self {
            id,
            address: None,
            port_type: Some(port_type),
            upstream: false,
            safety_network: None,
            bus_size: None,
        }
    }
}

/// A module in the I/O tree. Parents are referenced by name and port id only.
#[derive(Debug, Clone, PartialEq)]
pub struct Module {
    name: String,
    pub description: Option<String>,
    pub catalog_number: String,
    pub vendor: u32,
    pub product_type: u32,
    pub product_code: u32,
    pub major: u32,
    pub minor: u32,
    pub user_defined_vendor: Option<String>,
    pub user_defined_product_type: Option<String>,
    pub user_defined_product_code: Option<String>,
    pub user_defined_major: Option<String>,
    pub user_defined_minor: Option<String>,
    pub parent_module: String,
    pub parent_port_id: u32,
    pub inhibited: bool,
    pub major_fault: bool,
    pub safety_enabled: bool,
    pub safety_network: Option<String>,
    pub ekey_state: Option<EKeyState>,
    pub ports: Vec<ModulePort>,
    pub communications: Option<ExtensionElement>,
    pub extended_properties: Option<ExtensionElement>,
    pub properties: DescriptionProperties,
}

impl Module {
    pub fn new(name: impl Into<String>, catalog_number: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: None,
            catalog_number: catalog_number.into(),
            vendor: 1,
            product_type: 0,
            product_code: 0,
            major: 1,
            minor: 1,
            user_defined_vendor: None,
            user_defined_product_type: None,
            user_defined_product_code: None,
            user_defined_major: None,
            user_defined_minor: None,
            parent_module: "Local".into(),
            parent_port_id: DEFAULT_PARENT_PORT,
            inhibited: false,
            major_fault: false,
            safety_enabled: false,
            safety_network: None,
            ekey_state: Some(EKeyState::CompatibleModule),
            ports: Vec::new(),
            communications: None,
            extended_properties: None,
            properties: DescriptionProperties::default(),
        }
    }

    pub fn set_name(&mut self, new_name: &str) -> Result<()> {
        name::validate(new_name)?;
        self.name = new_name.to_string();
        Ok(())
    }

    pub fn port(&self, id: u32) -> Option<&ModulePort> {
        self.ports.iter().find(|p| p.id == id)
    }
}

impl Named for Module {
    fn name(&self) -> &str {
        &self.name
    }
}
