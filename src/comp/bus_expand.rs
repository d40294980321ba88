use serde::Serialize;

use crate::{
    error::IpError,
    ipcore::{BusInterfaceDeclaration, BusMode, BusPortDefinition, PortDirection, Presence},
};

use super::bus_library::{normalize_protocol, BusLibrary, ProtocolInfo, AXI4L};

/// Logical ports carrying the bus own clock and reset: never materialized as bus ports
pub const BUS_OWN_SIGNALS: &[&str] = &["ACLK", "ARESETN", "CLK", "CLOCK", "RESET", "RESET_N", "RST", "RST_N"];

/// Physical prefix used when a declaration does not set one
pub const DEFAULT_PREFIX: &str = "s_axi_";

#[derive(Clone, Debug, Default)]
pub struct ExpandOptions {
    /// Reject protocol types missing from the alias table instead of using AXI4-Lite
    pub strict_protocol: bool,
}

/// Concrete port of a bus interface instance
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ResolvedBusPort {
    pub logical_name: String,
    pub name: String,
    /// Direction seen from the IP core
    pub direction: PortDirection,
    pub width: u32,
    pub presence: Presence,
}

/// One instance of a bus interface declaration
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ExpandedBusInterface {
    pub name: String,
    /// Protocol type as declared
    pub protocol_type: String,
    pub protocol_key: String,
    /// Short tag selecting the protocol templates
    pub render_type: String,
    /// Set when the declared protocol was not recognized and AXI4-Lite was used instead
    pub protocol_fallback: bool,
    pub mode: BusMode,
    pub physical_prefix: String,
    pub array_index: Option<u32>,
    /// Position of the declaration in the descriptor
    pub declaration_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub associated_clock: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub associated_reset: Option<String>,
    pub ports: Vec<ResolvedBusPort>,
}

pub fn is_bus_own_signal(logical_name: &str) -> bool {
    BUS_OWN_SIGNALS.iter().any(|s| s.eq_ignore_ascii_case(logical_name))
}

/// Protocol of a declaration, and whether the fallback was applied
fn resolve_protocol(decl: &BusInterfaceDeclaration, options: &ExpandOptions) -> Result<(ProtocolInfo, bool), IpError> {
    match normalize_protocol(&decl.protocol_type) {
        Some(info) => Ok((info, false)),
        None if options.strict_protocol => Err(IpError::UnknownProtocol(decl.protocol_type.to_owned())),
        None => {
            log::warn!(
                "Bus interface {}: unknown protocol '{}', using AXI4-Lite",
                decl.name, decl.protocol_type
            );
            Ok((AXI4L, true))
        }
    }
}

/// Active ports of one instance: required ports and selected optional ones
pub fn resolve_ports(decl: &BusInterfaceDeclaration, defs: &[BusPortDefinition], prefix: &str) -> Vec<ResolvedBusPort> {
    defs.iter()
        .filter(|def| !is_bus_own_signal(&def.name))
        .filter(|def| def.presence == Presence::Required || decl.uses_optional(&def.name))
        .map(|def| ResolvedBusPort {
            logical_name: def.name.to_owned(),
            name: format!("{prefix}{}", def.name.to_ascii_lowercase()),
            direction: match decl.mode {
                BusMode::Master => def.direction,
                BusMode::Slave => def.direction.flipped(),
            },
            width: decl.width_override(&def.name).unwrap_or(def.width),
            presence: def.presence,
        })
        .collect()
}

/// Expand one declaration into its instances
pub fn expand_declaration(
    decl: &BusInterfaceDeclaration,
    declaration_index: usize,
    library: &BusLibrary,
    options: &ExpandOptions,
) -> Result<Vec<ExpandedBusInterface>, IpError> {
    let (protocol, protocol_fallback) = resolve_protocol(decl, options)?;
    let defs = library.ports(protocol.key).unwrap_or_else(|| {
        log::warn!("Bus library has no definition for {}", protocol.key);
        &[]
    });
    let base_prefix = decl.physical_prefix.as_deref().unwrap_or(DEFAULT_PREFIX);

    // (name, prefix, index) of every instance
    let instances: Vec<(String, String, Option<u32>)> = match &decl.array {
        None => vec![(decl.name.to_owned(), base_prefix.to_owned(), None)],
        Some(array) => {
            let name_pattern = array.naming_pattern.clone()
                .unwrap_or_else(|| format!("{}_{{index}}", decl.name));
            let prefix_pattern = array.physical_prefix_pattern.clone()
                .unwrap_or_else(|| format!("{base_prefix}{{index}}_"));
            (0..array.count)
                .map(|i| -> Result<(String, String, Option<u32>), IpError> {
                    let index = array.index_start.checked_add(i).ok_or_else(|| {
                        IpError::malformed(
                            format!("bus interface {}", decl.name),
                            format!("array index {} + {i} out of range", array.index_start),
                        )
                    })?;
                    let idx = index.to_string();
                    Ok((
                        name_pattern.replace("{index}", &idx),
                        prefix_pattern.replace("{index}", &idx),
                        Some(index),
                    ))
                })
                .collect::<Result<_, IpError>>()?
        }
    };

    Ok(instances.into_iter()
        .map(|(name, prefix, array_index)| ExpandedBusInterface {
            ports: resolve_ports(decl, defs, &prefix),
            name,
            protocol_type: decl.protocol_type.to_owned(),
            protocol_key: protocol.key.to_owned(),
            render_type: protocol.tag.to_owned(),
            protocol_fallback,
            mode: decl.mode,
            physical_prefix: prefix,
            array_index,
            declaration_index,
            associated_clock: decl.associated_clock.clone(),
            associated_reset: decl.associated_reset.clone(),
        })
        .collect())
}

/// Expand all declarations, preserving declaration and index order
pub fn expand(
    decls: &[BusInterfaceDeclaration],
    library: &BusLibrary,
    options: &ExpandOptions,
) -> Result<Vec<ExpandedBusInterface>, IpError> {
    let mut expanded = Vec::new();
    for (i, decl) in decls.iter().enumerate() {
        expanded.extend(expand_declaration(decl, i, library, options)?);
    }
    log::debug!("{} bus declarations expanded into {} instances", decls.len(), expanded.len());
    Ok(expanded)
}

/// Bus ports split between the primary interface and all the others
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct BusPortSets {
    pub primary: Vec<ResolvedBusPort>,
    pub secondary: Vec<ResolvedBusPort>,
}

impl BusPortSets {
    /// The first instance of the first declaration is the primary interface
    pub fn split(instances: &[ExpandedBusInterface]) -> Self {
        let mut sets = BusPortSets::default();
        for (i, inst) in instances.iter().enumerate() {
            if i == 0 && inst.declaration_index == 0 {
                sets.primary.extend(inst.ports.iter().cloned());
            } else {
                sets.secondary.extend(inst.ports.iter().cloned());
            }
        }
        sets
    }
}
