use std::fmt::Display;

use serde::Serialize;

use crate::ipcore::{MemoryMap, RegisterDecl, REG_BYTES};

use super::reg_flatten::FlatRegister;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticKind {
    DuplicateOffset,
    RegisterOverlap,
    FieldOutOfBounds,
    FieldOverlap,
    StrideTooSmall,
}

/// Structural issue found in a register model
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub message: String,
}

impl Diagnostic {
    fn new(kind: DiagnosticKind, message: String) -> Self {
        Diagnostic { kind, message }
    }
}

impl Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

fn reg_bytes(reg: &FlatRegister) -> u64 {
    (reg.width as u64).div_ceil(8).max(1)
}

/// Bytes covered by one repetition of a declaration
fn instance_span(reg: &RegisterDecl) -> u64 {
    if reg.is_group() {
        reg.registers.iter()
            .map(|c| c.offset.saturating_add(extent(c)))
            .max()
            .unwrap_or(0)
    } else {
        REG_BYTES
    }
}

/// Bytes covered by all repetitions of a declaration
fn extent(reg: &RegisterDecl) -> u64 {
    let count = reg.count.unwrap_or(1).max(1);
    let stride = reg.stride.unwrap_or(0);
    (count - 1).saturating_mul(stride).saturating_add(instance_span(reg))
}

fn check_strides(reg: &RegisterDecl, path: &str, diags: &mut Vec<Diagnostic>) {
    let path = if path.is_empty() { reg.name.to_owned() } else { format!("{path}.{}", reg.name) };
    let count = reg.count.unwrap_or(1);
    if count > 1 {
        let stride = reg.stride.unwrap_or(0);
        let span = instance_span(reg);
        if stride < span {
            diags.push(Diagnostic::new(
                DiagnosticKind::StrideTooSmall,
                format!("{path}: stride 0x{stride:x} smaller than instance footprint 0x{span:x}"),
            ));
        }
    }
    for child in &reg.registers {
        check_strides(child, &path, diags);
    }
}

fn check_fields(reg: &FlatRegister, diags: &mut Vec<Diagnostic>) {
    for f in &reg.fields {
        if f.offset as u64 + f.width as u64 > reg.width as u64 {
            diags.push(Diagnostic::new(
                DiagnosticKind::FieldOutOfBounds,
                format!("{}.{}: bits [{}+:{}] outside of {}-bit register", reg.name, f.name, f.offset, f.width, reg.width),
            ));
        }
    }
    let mut fields: Vec<_> = reg.fields.iter().collect();
    fields.sort_by_key(|f| f.offset);
    let mut last: Option<(&str, u64)> = None;
    for f in fields {
        if let Some((name, end)) = last {
            if (f.offset as u64) < end {
                diags.push(Diagnostic::new(
                    DiagnosticKind::FieldOverlap,
                    format!("{}: field {} overlaps field {name}", reg.name, f.name),
                ));
            }
        }
        let end = f.offset as u64 + f.width as u64;
        if last.map(|(_, e)| end > e).unwrap_or(true) {
            last = Some((f.name.as_str(), end));
        }
    }
}

/// Check a flattened register model. Nothing is modified, issues are returned as diagnostics.
pub fn validate(maps: &[MemoryMap], regs: &[FlatRegister]) -> Vec<Diagnostic> {
    let mut diags = Vec::new();

    for map in maps {
        for block in &map.address_blocks {
            for reg in &block.registers {
                check_strides(reg, &block.name, &mut diags);
            }
        }
    }

    // Registers are sorted by offset
    let mut last: Option<&FlatRegister> = None;
    for reg in regs {
        if let Some(prev) = last {
            if prev.offset == reg.offset {
                diags.push(Diagnostic::new(
                    DiagnosticKind::DuplicateOffset,
                    format!("{} and {} share offset 0x{:x}", prev.name, reg.name, reg.offset),
                ));
            } else if prev.offset.saturating_add(reg_bytes(prev)) > reg.offset {
                diags.push(Diagnostic::new(
                    DiagnosticKind::RegisterOverlap,
                    format!("{} at 0x{:x} overlaps {} at 0x{:x}", reg.name, reg.offset, prev.name, prev.offset),
                ));
            }
        }
        if last.map(|p| reg.offset.saturating_add(reg_bytes(reg)) > p.offset.saturating_add(reg_bytes(p))).unwrap_or(true) {
            last = Some(reg);
        }
        check_fields(reg, &mut diags);
    }

    for d in &diags {
        log::warn!("{d}");
    }
    diags
}
