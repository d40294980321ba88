use std::path::Path;

use serde::Serialize;

use crate::{
    error::IpError,
    ipcore::{resolve_relative, IpCoreDescriptor, MemoryMap, Parameter, Polarity, PortDirection, PortWidth, Vlnv},
};

use super::{
    bus_expand::{expand, BusPortSets, ExpandOptions, ExpandedBusInterface, ResolvedBusPort},
    bus_library::BusLibraryCache,
    reg_flatten::{flatten, FlatRegister},
    validate::{validate, Diagnostic},
};

pub const DATA_WIDTH: u32 = 32;
pub const ADDR_WIDTH: u32 = 32;
pub const REG_WIDTH: u32 = 32;

/// Forward compilation settings
#[derive(Clone, Debug)]
pub struct CompileOptions {
    /// Unknown bus protocols are errors instead of AXI4-Lite fallbacks
    pub strict_protocol: bool,
    /// Run the register model validation
    pub validate: bool,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            strict_protocol: false,
            validate: true,
        }
    }
}

/// User port with its width resolved against the parameters when possible
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RenderPort {
    pub name: String,
    pub direction: PortDirection,
    pub width: PortWidth,
    pub resolved_width: Option<u32>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// Everything the template renderer needs to produce the sources of an IP core
#[derive(Clone, Debug, Serialize)]
pub struct RenderContext {
    pub entity_name: String,
    pub vlnv: Vlnv,
    pub description: String,
    pub registers: Vec<FlatRegister>,
    /// Registers written by software
    pub sw_registers: Vec<FlatRegister>,
    /// Read-only registers, written by hardware
    pub hw_registers: Vec<FlatRegister>,
    pub generics: Vec<Parameter>,
    pub user_ports: Vec<RenderPort>,
    pub primary_bus_ports: Vec<ResolvedBusPort>,
    pub secondary_bus_ports: Vec<ResolvedBusPort>,
    pub bus_interfaces: Vec<ExpandedBusInterface>,
    pub data_width: u32,
    pub addr_width: u32,
    pub reg_width: u32,
    pub clock_port: Option<String>,
    pub reset_port: Option<String>,
    pub reset_active_high: bool,
    pub clocks: Vec<String>,
    pub resets: Vec<String>,
    pub memory_maps: Vec<MemoryMap>,
    pub diagnostics: Vec<Diagnostic>,
}

impl RenderContext {
    pub fn has_warnings(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Forward pipeline: descriptor to render context
pub struct Compiler<'a> {
    cache: &'a mut BusLibraryCache,
    options: CompileOptions,
}

impl<'a> Compiler<'a> {

    pub fn new(cache: &'a mut BusLibraryCache, options: CompileOptions) -> Self {
        Compiler { cache, options }
    }

    /// Load an IP core document and compile it.
    /// Relative references are resolved from the document directory.
    pub fn compile_file(&mut self, path: &Path) -> Result<RenderContext, IpError> {
        let desc = IpCoreDescriptor::from_file(path)?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        self.compile(&desc, base_dir)
    }

    pub fn compile(&mut self, desc: &IpCoreDescriptor, base_dir: &Path) -> Result<RenderContext, IpError> {
        let memory_maps = desc.resolve_memory_maps(base_dir)?;

        let explicit = desc.use_bus_library.as_deref().map(|p| resolve_relative(base_dir, p));
        let library = self.cache.resolve(explicit.as_deref())?;
        let expand_options = ExpandOptions { strict_protocol: self.options.strict_protocol };
        let bus_interfaces = expand(&desc.bus_interfaces, &library, &expand_options)?;
        let bus_ports = BusPortSets::split(&bus_interfaces);

        let registers = flatten(&memory_maps);
        let diagnostics = if self.options.validate {
            validate(&memory_maps, &registers)
        } else {
            Vec::new()
        };
        let (sw_registers, hw_registers): (Vec<_>, Vec<_>) =
            registers.iter().cloned().partition(|r| r.is_writable());

        let user_ports = desc.ports.iter()
            .map(|p| RenderPort {
                name: p.name.to_owned(),
                direction: p.direction,
                width: p.width.clone(),
                resolved_width: p.width.resolve(desc.param_values()),
                description: p.description.to_owned(),
            })
            .collect();

        let reset = desc.resets.first();
        log::info!(
            "Compiled {}: {} registers, {} bus interfaces, {} diagnostics",
            desc.vlnv.name, registers.len(), bus_interfaces.len(), diagnostics.len()
        );

        Ok(RenderContext {
            entity_name: desc.vlnv.name.to_owned(),
            vlnv: desc.vlnv.clone(),
            description: desc.description.to_owned(),
            sw_registers,
            hw_registers,
            registers,
            generics: desc.parameters.clone(),
            user_ports,
            primary_bus_ports: bus_ports.primary,
            secondary_bus_ports: bus_ports.secondary,
            bus_interfaces,
            data_width: DATA_WIDTH,
            addr_width: ADDR_WIDTH,
            reg_width: REG_WIDTH,
            clock_port: desc.clocks.first().map(|c| c.name.to_owned()),
            reset_port: reset.map(|r| r.name.to_owned()),
            reset_active_high: reset.map(|r| r.polarity).unwrap_or(Polarity::ActiveLow).is_active_high(),
            clocks: desc.clocks.iter().map(|c| c.name.to_owned()).collect(),
            resets: desc.resets.iter().map(|r| r.name.to_owned()).collect(),
            memory_maps,
            diagnostics,
        })
    }
}
