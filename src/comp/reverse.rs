use crate::{
    ipcore::{
        BusInterfaceDeclaration, Clock, IpCoreDescriptor, ParamValue, Parameter, Port, PortWidth, Reset, Vlnv,
    },
    parser::{ParsedEntity, PortClass},
};

pub const REVERSE_VENDOR: &str = "user";
pub const REVERSE_LIBRARY: &str = "user";
pub const REVERSE_VERSION: &str = "1.0";

/// Build an IP core description from a parsed entity
pub fn to_descriptor(entity: &ParsedEntity) -> IpCoreDescriptor {
    let parameters = entity.generics.iter()
        .map(|g| Parameter {
            name: g.name.to_owned(),
            data_type: g.type_text.to_owned(),
            value: g.default.as_deref().map(ParamValue::from_text).unwrap_or_default(),
            description: String::new(),
        })
        .collect();

    let ports = entity.user_ports()
        .map(|p| Port {
            name: p.port.name.to_owned(),
            direction: p.port.direction,
            width: p.port.width.to_port_width(),
            description: String::new(),
        })
        .collect();

    let clocks = entity.clocks()
        .map(|p| Clock { name: p.port.name.to_owned(), description: String::new() })
        .collect();

    let resets = entity.ports.iter()
        .filter_map(|p| match p.class {
            PortClass::Reset(polarity) => Some(Reset {
                name: p.port.name.to_owned(),
                polarity,
                description: String::new(),
            }),
            _ => None,
        })
        .collect();

    let bus_interfaces = entity.bus_interfaces.iter()
        .map(|b| BusInterfaceDeclaration {
            name: b.name.to_owned(),
            protocol_type: b.protocol_type.to_owned(),
            mode: b.mode,
            physical_prefix: Some(b.physical_prefix.to_owned()),
            ..Default::default()
        })
        .collect();

    IpCoreDescriptor {
        vlnv: Vlnv {
            vendor: REVERSE_VENDOR.to_owned(),
            library: REVERSE_LIBRARY.to_owned(),
            name: entity.name.to_owned(),
            version: REVERSE_VERSION.to_owned(),
        },
        description: String::new(),
        use_bus_library: None,
        parameters,
        ports,
        clocks,
        resets,
        bus_interfaces,
        memory_maps: None,
    }
}

/// True when a port width refers to one of the entity generics
pub fn is_generic_width(entity: &ParsedEntity, width: &PortWidth) -> bool {
    match width {
        PortWidth::Symbolic(name) => entity.generics.iter().any(|g| g.name.eq_ignore_ascii_case(name)),
        PortWidth::Fixed(_) => false,
    }
}
