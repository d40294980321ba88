use std::fmt::Display;

use serde::{Deserialize, Serialize};

use super::{BusInterfaceDeclaration, MemoryMap, ParamValue, PortWidth};

/// Vendor / Library / Name / Version identifier of an IP core
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Vlnv {
    pub vendor: String,
    pub library: String,
    pub name: String,
    pub version: String,
}

impl Display for Vlnv {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}:{}", self.vendor, self.library, self.name, self.version)
    }
}

#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Parameter {
    pub name: String,
    #[serde(alias = "data_type", alias = "type")]
    pub data_type: String,
    #[serde(alias = "default", alias = "defaultValue", alias = "default_value")]
    pub value: ParamValue,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// Port direction, always from the point of view of the IP core
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PortDirection {#[default]
    #[serde(alias = "input", alias = "IN", alias = "In")]
    In,
    #[serde(alias = "output", alias = "OUT", alias = "Out")]
    Out,
    #[serde(alias = "in_out", alias = "INOUT", alias = "InOut", alias = "bidir")]
    Inout,
}

impl PortDirection {
    /// Swap input and output, inout is unchanged
    pub fn flipped(&self) -> PortDirection {
        match self {
            PortDirection::In => PortDirection::Out,
            PortDirection::Out => PortDirection::In,
            PortDirection::Inout => PortDirection::Inout,
        }
    }

    pub fn is_in(&self) -> bool {
        self == &PortDirection::In
    }

    pub fn is_out(&self) -> bool {
        self == &PortDirection::Out
    }
}

impl Display for PortDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortDirection::In => write!(f, "in"),
            PortDirection::Out => write!(f, "out"),
            PortDirection::Inout => write!(f, "inout"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Port {
    pub name: String,
    pub direction: PortDirection,
    pub width: PortWidth,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Clock {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Polarity {
    #[serde(alias = "active_high", alias = "high", alias = "ACTIVE_HIGH")]
    ActiveHigh,#[default]
    #[serde(alias = "active_low", alias = "low", alias = "ACTIVE_LOW")]
    ActiveLow,
}

impl Polarity {
    pub fn is_active_high(&self) -> bool {
        self == &Polarity::ActiveHigh
    }
}

#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Reset {
    pub name: String,
    pub polarity: Polarity,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// Memory maps are either written inline or imported from a separate document
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MemoryMapRef {
    Import { import: String },
    Inline(Vec<MemoryMap>),
}

/// Top level description of an IP core
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct IpCoreDescriptor {
    pub vlnv: Vlnv,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none", alias = "use_bus_library", alias = "busLibrary")]
    pub use_bus_library: Option<String>,
    pub parameters: Vec<Parameter>,
    pub ports: Vec<Port>,
    pub clocks: Vec<Clock>,
    pub resets: Vec<Reset>,
    #[serde(alias = "bus_interfaces")]
    pub bus_interfaces: Vec<BusInterfaceDeclaration>,
    #[serde(skip_serializing_if = "Option::is_none", alias = "memory_maps", alias = "memoryMap", alias = "memory_map")]
    pub memory_maps: Option<MemoryMapRef>,
}

impl IpCoreDescriptor {
    /// Iterator on parameter name/value pairs
    pub fn param_values(&self) -> impl Iterator<Item = (&str, &ParamValue)> + Clone {
        self.parameters.iter().map(|p| (p.name.as_str(), &p.value))
    }
}
