use std::{fs, path::Path};

use ipcgen::{
    comp::{flatten, BusLibraryCache, CompileOptions, Compiler, DiagnosticKind},
    error::IpErrorKind,
    ipcore::{DocFormat, IpCoreDescriptor, MemoryMap, PortDirection},
};

fn compile(yaml: &str) -> Result<ipcgen::comp::RenderContext, ipcgen::error::IpError> {
    let desc = IpCoreDescriptor::from_str_as(yaml, DocFormat::Yaml)?;
    let mut cache = BusLibraryCache::new(None);
    Compiler::new(&mut cache, CompileOptions::default()).compile(&desc, Path::new("."))
}

#[test]
fn test_single_bit_field() {
    let maps: Vec<MemoryMap> = serde_yaml::from_str(
        r#"
        - name: regs
          addressBlocks:
            - name: main
              baseAddress: 0
              registers:
                - name: ctrl
                  offset: 0
                  fields:
                    - {name: enable, bits: "[0:0]"}
        "#,
    )
    .unwrap();
    let regs = flatten(&maps);
    assert_eq!(regs.len(), 1);
    assert_eq!(regs[0].offset, 0);
    assert_eq!(regs[0].fields.len(), 1);
    assert_eq!(regs[0].fields[0].offset, 0);
    assert_eq!(regs[0].fields[0].width, 1);
}

#[test]
fn test_group_instances_offset_by_stride() {
    let maps: Vec<MemoryMap> = serde_yaml::from_str(
        r#"
        - name: regs
          addressBlocks:
            - name: dma
              baseAddress: 0x1000
              registers:
                - name: chan
                  offset: 0x40
                  count: 4
                  stride: 0x10
                  registers:
                    - {name: src, offset: 0}
                    - {name: dst, offset: 4}
                    - {name: len, offset: 8}
        "#,
    )
    .unwrap();
    let regs = flatten(&maps);
    assert_eq!(regs.len(), 4 * 3);
    let inst0: Vec<_> = regs.iter().filter(|r| r.name.starts_with("chan_0_")).collect();
    for i in 1..4u64 {
        let inst: Vec<_> = regs.iter().filter(|r| r.name.starts_with(&format!("chan_{i}_"))).collect();
        assert_eq!(inst.len(), 3);
        for (a, b) in inst0.iter().zip(inst.iter()) {
            assert_eq!(b.offset, a.offset + i * 0x10);
        }
    }
    assert_eq!(inst0[0].offset, 0x1040);
}

#[test]
fn test_bus_array_instances() {
    let ctx = compile(
        r#"
        vlnv: {vendor: acme, library: ip, name: mux, version: "1.0"}
        busInterfaces:
          - name: port
            type: AXI4-Lite
            physicalPrefix: s_
            array: {count: 3, indexStart: 0}
        "#,
    )
    .unwrap();
    assert_eq!(ctx.bus_interfaces.len(), 3);
    let names: Vec<&str> = ctx.bus_interfaces.iter().map(|b| b.name.as_str()).collect();
    assert_eq!(names, vec!["port_0", "port_1", "port_2"]);
    let prefixes: Vec<&str> = ctx.bus_interfaces.iter().map(|b| b.physical_prefix.as_str()).collect();
    assert_eq!(prefixes, vec!["s_0_", "s_1_", "s_2_"]);
    assert!(ctx.primary_bus_ports.iter().all(|p| p.name.starts_with("s_0_")));
    assert!(ctx.secondary_bus_ports.iter().any(|p| p.name == "s_2_wdata"));
    assert_eq!(ctx.secondary_bus_ports.len(), 2 * ctx.primary_bus_ports.len());
}

#[test]
fn test_slave_direction_flip() {
    let ctx = compile(
        r#"
        vlnv: {name: core}
        busInterfaces:
          - {name: s, type: axil, mode: slave, physicalPrefix: s_}
          - {name: m, type: axil, mode: master, physicalPrefix: m_, portWidthOverrides: {AWADDR: 12}}
        "#,
    )
    .unwrap();
    let port = |name: &str| {
        ctx.primary_bus_ports.iter()
            .chain(ctx.secondary_bus_ports.iter())
            .find(|p| p.name == name)
            .unwrap()
            .clone()
    };
    assert_eq!(port("s_awaddr").direction, PortDirection::In);
    assert_eq!(port("s_rdata").direction, PortDirection::Out);
    assert_eq!(port("m_awaddr").direction, PortDirection::Out);
    assert_eq!(port("m_rdata").direction, PortDirection::In);
    assert_eq!(port("m_awaddr").width, 12);
    assert_eq!(port("s_awaddr").width, 32);
    assert!(ctx.primary_bus_ports.iter().all(|p| p.name.starts_with("s_")));
}

#[test]
fn test_optional_ports() {
    let ctx = compile(
        r#"
        vlnv: {name: core}
        busInterfaces:
          - {name: s, type: AXI4-Lite, useOptionalPorts: [awprot]}
        "#,
    )
    .unwrap();
    assert!(ctx.primary_bus_ports.iter().any(|p| p.name == "s_axi_awprot"));
    assert!(!ctx.primary_bus_ports.iter().any(|p| p.name == "s_axi_arprot"));
}

#[test]
fn test_unknown_protocol() {
    let yaml = r#"
        vlnv: {name: core}
        busInterfaces:
          - {name: wb, type: wishbone}
    "#;
    let ctx = compile(yaml).unwrap();
    assert!(ctx.bus_interfaces[0].protocol_fallback);
    assert_eq!(ctx.bus_interfaces[0].render_type, "axil");

    let desc = IpCoreDescriptor::from_str_as(yaml, DocFormat::Yaml).unwrap();
    let mut cache = BusLibraryCache::new(None);
    let options = CompileOptions { strict_protocol: true, ..Default::default() };
    let err = Compiler::new(&mut cache, options).compile(&desc, Path::new(".")).unwrap_err();
    assert_eq!(err.kind(), IpErrorKind::UnknownProtocol);
}

#[test]
fn test_missing_explicit_library_falls_back() {
    let dir = tempfile::tempdir().unwrap();
    let core = dir.path().join("core.yml");
    fs::write(
        &core,
        "vlnv: {name: core}\nuseBusLibrary: missing_bus.yml\nbusInterfaces: [{name: s, type: axil}]\n",
    )
    .unwrap();
    let mut cache = BusLibraryCache::new(None);
    let ctx = Compiler::new(&mut cache, CompileOptions::default()).compile_file(&core).unwrap();
    assert!(ctx.primary_bus_ports.iter().any(|p| p.name == "s_axi_awaddr"));
}

#[test]
fn test_explicit_library() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(
        dir.path().join("bus.yml"),
        "AXI4-Lite:\n  ports:\n    - {name: PADDR, width: 8, direction: out}\n",
    )
    .unwrap();
    let core = dir.path().join("core.json");
    fs::write(
        &core,
        r#"{"vlnv": {"name": "core"}, "use_bus_library": "bus.yml", "bus_interfaces": [{"name": "s", "protocol_type": "axil"}]}"#,
    )
    .unwrap();
    let mut cache = BusLibraryCache::new(None);
    let ctx = Compiler::new(&mut cache, CompileOptions::default()).compile_file(&core).unwrap();
    assert_eq!(ctx.primary_bus_ports.len(), 1);
    assert_eq!(ctx.primary_bus_ports[0].name, "s_axi_paddr");
    assert_eq!(ctx.primary_bus_ports[0].width, 8);
}

#[test]
fn test_missing_default_library_aborts() {
    let desc = IpCoreDescriptor::from_str_as("vlnv: {name: core}", DocFormat::Yaml).unwrap();
    let mut cache = BusLibraryCache::new(Some("/nonexistent/bus_definitions.yml".into()));
    let err = Compiler::new(&mut cache, CompileOptions::default()).compile(&desc, Path::new(".")).unwrap_err();
    assert_eq!(err.kind(), IpErrorKind::NotFound);
}

#[test]
fn test_import_relative_to_document() {
    let dir = tempfile::tempdir().unwrap();
    fs::create_dir(dir.path().join("maps")).unwrap();
    fs::write(
        dir.path().join("maps").join("regs.mm.yml"),
        "name: regs\naddressBlocks:\n  - name: b\n    registers:\n      - {name: id, offset: 0, access: read-only}\n",
    )
    .unwrap();
    fs::create_dir(dir.path().join("ip")).unwrap();
    let core = dir.path().join("ip").join("core.yml");
    fs::write(&core, "vlnv: {name: core}\nmemoryMaps: {import: ../maps/regs.mm.yml}\n").unwrap();

    let mut cache = BusLibraryCache::new(None);
    let ctx = Compiler::new(&mut cache, CompileOptions::default()).compile_file(&core).unwrap();
    assert_eq!(ctx.registers.len(), 1);
    assert_eq!(ctx.hw_registers.len(), 1);
    assert_eq!(ctx.memory_maps[0].name, "regs");

    fs::write(&core, "vlnv: {name: core}\nmemoryMaps: {import: regs.mm.yml}\n").unwrap();
    let err = Compiler::new(&mut cache, CompileOptions::default()).compile_file(&core).unwrap_err();
    assert_eq!(err.kind(), IpErrorKind::NotFound);
}

#[test]
fn test_validator_stride() {
    let ctx = compile(
        r#"
        vlnv: {name: core}
        memoryMaps:
          - name: regs
            addressBlocks:
              - name: b
                registers:
                  - name: grp
                    count: 2
                    stride: 4
                    registers:
                      - {name: a, offset: 0}
                      - {name: b, offset: 4}
        "#,
    )
    .unwrap();
    assert!(ctx.diagnostics.iter().any(|d| d.kind == DiagnosticKind::StrideTooSmall));
    // Compilation itself is not altered
    assert_eq!(ctx.registers.len(), 4);
}

#[test]
fn test_numeric_strings_and_access() {
    let ctx = compile(
        r#"
        vlnv: {name: core}
        memory_maps:
          - name: regs
            address_blocks:
              - name: b
                base_address: "0x2000"
                registers:
                  - {name: ctrl, address_offset: "0x1_0", access: READ-WRITE}
                  - {name: bad, offset: "zz"}
        "#,
    )
    .unwrap();
    assert_eq!(ctx.registers[0].name, "bad");
    assert_eq!(ctx.registers[0].offset, 0x2000);
    assert_eq!(ctx.registers[1].offset, 0x2010);
    assert_eq!(ctx.registers[1].access, "read-write");
    assert_eq!(ctx.sw_registers.len(), 2);
}

#[test]
fn test_demo_timer() {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("demos").join("timer.yml");
    let mut cache = BusLibraryCache::new(None);
    let ctx = Compiler::new(&mut cache, CompileOptions::default()).compile_file(&path).unwrap();
    assert_eq!(ctx.entity_name, "timer");
    assert_eq!(ctx.registers.len(), 10);
    assert_eq!(ctx.hw_registers.len(), 1);
    assert!(ctx.diagnostics.is_empty());
    assert_eq!(ctx.registers[0].reset_value(), 0x100);
    assert!(ctx.primary_bus_ports.iter().any(|p| p.name == "s_axi_awprot"));
    assert_eq!(ctx.user_ports[1].resolved_width, Some(32));
}
