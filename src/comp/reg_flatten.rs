use serde::Serialize;

use crate::ipcore::{AddressBlock, FieldDecl, MemoryMap, RegisterDecl};

pub const DEFAULT_ACCESS: &str = "read-write";

/// Bit field with its absolute position in the register
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FlatField {
    pub name: String,
    pub offset: u32,
    pub width: u32,
    pub access: String,
    pub reset_value: u64,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

/// Register at its absolute byte address
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FlatRegister {
    pub name: String,
    pub offset: u64,
    pub width: u32,
    /// Name of the address block owning the register
    pub block: String,
    pub access: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    pub fields: Vec<FlatField>,
}

impl FlatRegister {
    /// Software can write the register
    pub fn is_writable(&self) -> bool {
        self.access.contains("write")
    }

    /// Reset value built from the field reset values
    pub fn reset_value(&self) -> u64 {
        self.fields.iter()
            .filter(|f| f.offset < 64)
            .fold(0, |acc, f| {
                let mask = if f.width >= 64 { u64::MAX } else { (1u64 << f.width) - 1 };
                acc | ((f.reset_value & mask) << f.offset)
            })
    }
}

/// Lower-cased access, `read-write` when not set
pub fn normalize_access(access: Option<&str>) -> String {
    match access.map(str::trim) {
        Some(a) if !a.is_empty() => a.to_ascii_lowercase(),
        _ => DEFAULT_ACCESS.to_owned(),
    }
}

fn flatten_field(field: &FieldDecl, reg_access: &str) -> FlatField {
    let span = field.bit_span();
    FlatField {
        name: field.name.to_owned(),
        offset: span.offset,
        width: span.width,
        access: field.access.as_deref().map(|a| normalize_access(Some(a))).unwrap_or_else(|| reg_access.to_owned()),
        reset_value: field.reset_value.unwrap_or(0),
        description: field.description.to_owned(),
    }
}

/// Flatten one register declaration located at `offset`.
/// Groups are repeated `count` times every `stride` bytes, each repetition
/// prefixing its children with `<group>_<i>_` (or `<group>_` for a single one).
fn flatten_entry(
    reg: &RegisterDecl,
    offset: u64,
    prefix: &str,
    inherited_access: Option<&str>,
    block: &AddressBlock,
    out: &mut Vec<FlatRegister>,
) {
    let access = reg.access.as_deref().or(inherited_access);
    let count = reg.count.unwrap_or(1);
    let stride = reg.stride.unwrap_or(0);

    if reg.is_group() {
        for i in 0..count {
            let new_prefix = if count > 1 {
                format!("{prefix}{}_{i}_", reg.name)
            } else {
                format!("{prefix}{}_", reg.name)
            };
            let base = offset.saturating_add(i.saturating_mul(stride));
            for child in &reg.registers {
                flatten_entry(child, base.saturating_add(child.offset), &new_prefix, access, block, out);
            }
        }
        return;
    }

    let access = normalize_access(access);
    let fields: Vec<FlatField> = reg.fields.iter().map(|f| flatten_field(f, &access)).collect();
    let width = if block.default_reg_width == 0 { 32 } else { block.default_reg_width };
    for i in 0..count.max(1) {
        let name = if count > 1 {
            format!("{prefix}{}_{i}", reg.name)
        } else {
            format!("{prefix}{}", reg.name)
        };
        out.push(FlatRegister {
            name,
            offset: offset.saturating_add(i.saturating_mul(stride)),
            width,
            block: block.name.to_owned(),
            access: access.clone(),
            description: reg.description.to_owned(),
            fields: fields.clone(),
        });
    }
}

/// Flatten all memory maps into a list of registers sorted by absolute offset.
/// No overlap check is done here.
pub fn flatten(maps: &[MemoryMap]) -> Vec<FlatRegister> {
    let mut out = Vec::new();
    for map in maps {
        for block in &map.address_blocks {
            for reg in &block.registers {
                flatten_entry(reg, block.base_address.saturating_add(reg.offset), "", None, block, &mut out);
            }
        }
    }
    // Stable: registers at the same offset keep their declaration order
    out.sort_by_key(|r| r.offset);
    log::debug!("Flattened {} registers", out.len());
    out
}
