use serde::{Deserialize, Serialize};

use crate::parser::{parse_bit_range, BitSpan};

use super::value::{lenient_opt_bits, lenient_opt_u64, lenient_u32, lenient_u64};

/// Size in bytes of one register word
pub const REG_BYTES: u64 = 4;

#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MemoryMap {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(alias = "address_blocks", alias = "blocks")]
    pub address_blocks: Vec<AddressBlock>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AddressBlock {
    pub name: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(alias = "base_address", alias = "offset", deserialize_with = "lenient_u64")]
    pub base_address: u64,
    /// Explicit size of the block in bytes
    #[serde(skip_serializing_if = "Option::is_none", alias = "size", deserialize_with = "lenient_opt_u64")]
    pub range: Option<u64>,
    pub usage: String,
    #[serde(alias = "default_reg_width", alias = "width", deserialize_with = "lenient_u32")]
    pub default_reg_width: u32,
    pub registers: Vec<RegisterDecl>,
}

impl Default for AddressBlock {
    fn default() -> Self {
        AddressBlock {
            name: String::new(),
            description: String::new(),
            base_address: 0,
            range: None,
            usage: "register".to_owned(),
            default_reg_width: 32,
            registers: Vec::new(),
        }
    }
}

/// Register declaration: either a leaf register with fields,
/// or a group of child registers repeated `count` times every `stride` bytes
#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct RegisterDecl {
    pub name: String,
    #[serde(alias = "address_offset", alias = "addressOffset", alias = "address", deserialize_with = "lenient_u64")]
    pub offset: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access: Option<String>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub fields: Vec<FieldDecl>,
    #[serde(skip_serializing_if = "Option::is_none", alias = "dim", deserialize_with = "lenient_opt_u64")]
    pub count: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none", alias = "dim_increment", alias = "dimIncrement", deserialize_with = "lenient_opt_u64")]
    pub stride: Option<u64>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub registers: Vec<RegisterDecl>,
}

impl RegisterDecl {
    pub fn new<S: Into<String>>(name: S, offset: u64) -> Self {
        RegisterDecl { name: name.into(), offset, ..Default::default() }
    }

    /// True when the declaration holds child registers
    pub fn is_group(&self) -> bool {
        !self.registers.is_empty()
    }

    /// Number of bytes covered starting from the register offset.
    /// Arrays (count and stride both set) cover `count * stride`.
    pub fn footprint(&self) -> u64 {
        match (self.count, self.stride) {
            (Some(count), Some(stride)) if count.saturating_mul(stride) > 0 => count.saturating_mul(stride),
            _ => REG_BYTES,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FieldDecl {
    pub name: String,
    /// Bit-range notation: `[high:low]` or `[bit]`
    #[serde(skip_serializing_if = "Option::is_none", alias = "bit_range", alias = "bitRange", deserialize_with = "lenient_opt_bits")]
    pub bits: Option<String>,
    #[serde(rename = "offset", skip_serializing_if = "Option::is_none", alias = "bit_offset", alias = "bitOffset", deserialize_with = "lenient_opt_u64")]
    pub bit_offset: Option<u64>,
    #[serde(rename = "width", skip_serializing_if = "Option::is_none", alias = "bit_width", alias = "bitWidth", deserialize_with = "lenient_opt_u64")]
    pub bit_width: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", alias = "reset_value", alias = "reset", deserialize_with = "lenient_opt_u64")]
    pub reset_value: Option<u64>,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub description: String,
}

impl FieldDecl {
    pub fn new<S: Into<String>>(name: S, offset: u64, width: u64) -> Self {
        FieldDecl {
            name: name.into(),
            bit_offset: Some(offset),
            bit_width: Some(width),
            ..Default::default()
        }
    }

    /// Bit position and width of the field.
    /// Numeric attributes take precedence over the bit-range notation,
    /// anything unreadable defaults to offset 0 / width 1.
    pub fn bit_span(&self) -> BitSpan {
        let clamp = |v: u64| u32::try_from(v).unwrap_or(u32::MAX);
        if let (Some(offset), Some(width)) = (self.bit_offset, self.bit_width) {
            return BitSpan::new(clamp(offset), clamp(width));
        }
        if let Some(span) = self.bits.as_deref().and_then(parse_bit_range) {
            return span;
        }
        if let Some(bits) = &self.bits {
            log::debug!("Field {}: unable to read bit range '{bits}', using [0]", self.name);
        }
        BitSpan::new(clamp(self.bit_offset.unwrap_or(0)), clamp(self.bit_width.unwrap_or(1)))
    }

    /// Move the field, keeping the notation used in the declaration
    pub fn set_bit_offset(&mut self, offset: u32) {
        let width = self.bit_span().width;
        if self.bits.is_some() && self.bit_offset.is_none() {
            self.bits = Some(BitSpan::new(offset, width).to_string());
        } else {
            self.bit_offset = Some(offset as u64);
            self.bit_width = Some(width as u64);
            if self.bits.is_some() {
                self.bits = Some(BitSpan::new(offset, width).to_string());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn field_aliases() {
        let f: FieldDecl = serde_yaml::from_str("{name: en, bitOffset: 3, bit_width: '2'}").unwrap();
        assert_eq!(f.bit_span(), BitSpan::new(3, 2));
        let f: FieldDecl = serde_yaml::from_str("{name: en, bits: '[7:4]'}").unwrap();
        assert_eq!(f.bit_span(), BitSpan::new(4, 4));
        let f: FieldDecl = serde_yaml::from_str("{name: en, bits: 'oops'}").unwrap();
        assert_eq!(f.bit_span(), BitSpan::new(0, 1));
    }

    #[test]
    fn wide_values_saturate() {
        let f: FieldDecl = serde_yaml::from_str("{name: en, offset: 4294967296, width: 1}").unwrap();
        assert_eq!(f.bit_span(), BitSpan::new(u32::MAX, 1));
        let f: FieldDecl = serde_yaml::from_str("{name: en, offset: 2, width: 8589934592}").unwrap();
        assert_eq!(f.bit_span(), BitSpan::new(2, u32::MAX));
    }

    #[test]
    fn move_field_keeps_notation() {
        let mut f: FieldDecl = serde_yaml::from_str("{name: en, bits: '[3:2]'}").unwrap();
        f.set_bit_offset(8);
        assert_eq!(f.bits.as_deref(), Some("[9:8]"));
        assert_eq!(f.bit_offset, None);
        let mut f = FieldDecl::new("x", 0, 1);
        f.set_bit_offset(5);
        assert_eq!(f.bit_span(), BitSpan::new(5, 1));
    }

    #[test]
    fn register_footprint() {
        let mut r = RegisterDecl::new("ctrl", 0);
        assert_eq!(r.footprint(), 4);
        r.count = Some(4);
        r.stride = Some(8);
        assert_eq!(r.footprint(), 32);
    }

    #[test]
    fn block_defaults() {
        let b: AddressBlock = serde_yaml::from_str("{name: regs, baseAddress: '0x100'}").unwrap();
        assert_eq!(b.base_address, 0x100);
        assert_eq!(b.default_reg_width, 32);
        assert_eq!(b.usage, "register");
    }
}
