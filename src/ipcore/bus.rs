use std::{collections::BTreeMap, fmt::Display};

use serde::{Deserialize, Serialize};

use super::{value::{lenient_u32, lenient_width_map}, PortDirection};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BusMode {
    #[serde(alias = "MASTER", alias = "Master", alias = "initiator", alias = "manager")]
    Master,#[default]
    #[serde(alias = "SLAVE", alias = "Slave", alias = "target", alias = "subordinate")]
    Slave,
}

impl Display for BusMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BusMode::Master => write!(f, "master"),
            BusMode::Slave => write!(f, "slave"),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Presence {#[default]
    #[serde(alias = "REQUIRED", alias = "Required", alias = "mandatory")]
    Required,
    #[serde(alias = "OPTIONAL", alias = "Optional")]
    Optional,
}

/// Array instancing of a bus interface
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ArraySpec {
    #[serde(deserialize_with = "lenient_u32")]
    pub count: u32,
    #[serde(alias = "index_start", deserialize_with = "lenient_u32")]
    pub index_start: u32,
    /// Instance name pattern, `{index}` is replaced by the instance index
    #[serde(skip_serializing_if = "Option::is_none", alias = "naming_pattern")]
    pub naming_pattern: Option<String>,
    /// Physical prefix pattern, `{index}` is replaced by the instance index
    #[serde(skip_serializing_if = "Option::is_none", alias = "physical_prefix_pattern")]
    pub physical_prefix_pattern: Option<String>,
}

impl Default for ArraySpec {
    fn default() -> Self {
        ArraySpec {
            count: 1,
            index_start: 0,
            naming_pattern: None,
            physical_prefix_pattern: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BusInterfaceDeclaration {
    pub name: String,
    /// Free-form protocol name (normalized through the alias table)
    #[serde(rename = "type", alias = "protocolType", alias = "protocol_type", alias = "protocol")]
    pub protocol_type: String,
    pub mode: BusMode,
    #[serde(skip_serializing_if = "Option::is_none", alias = "physical_prefix", alias = "prefix")]
    pub physical_prefix: Option<String>,
    /// Optional ports explicitly enabled
    #[serde(skip_serializing_if = "Vec::is_empty", alias = "use_optional_ports", alias = "optionalPorts")]
    pub use_optional_ports: Vec<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", alias = "port_width_overrides", alias = "portWidths", deserialize_with = "lenient_width_map")]
    pub port_width_overrides: BTreeMap<String, u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub array: Option<ArraySpec>,
    #[serde(skip_serializing_if = "Option::is_none", alias = "associated_clock")]
    pub associated_clock: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", alias = "associated_reset")]
    pub associated_reset: Option<String>,
}

impl BusInterfaceDeclaration {
    /// True when the optional logical port was explicitly selected
    pub fn uses_optional(&self, logical_name: &str) -> bool {
        self.use_optional_ports.iter().any(|p| p.eq_ignore_ascii_case(logical_name))
    }

    /// Width override for a logical port
    pub fn width_override(&self, logical_name: &str) -> Option<u32> {
        self.port_width_overrides.iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(logical_name))
            .map(|(_, w)| *w)
    }
}

/// Logical port of a bus protocol, direction given from the master side
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BusPortDefinition {
    pub name: String,
    #[serde(deserialize_with = "lenient_u32")]
    pub width: u32,
    pub direction: PortDirection,
    pub presence: Presence,
}

impl Default for BusPortDefinition {
    fn default() -> Self {
        BusPortDefinition {
            name: String::new(),
            width: 1,
            direction: PortDirection::Out,
            presence: Presence::Required,
        }
    }
}

/// Entry of a bus library document
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BusProtocolDef {
    pub ports: Vec<BusPortDefinition>,
}
