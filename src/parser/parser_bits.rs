use std::fmt::Display;

use serde::Serialize;
use winnow::{
    combinator::{opt, preceded},
    Parser,
};

use super::{val_u64, ws, Res};

/// Bit position and width of a field inside a register
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BitSpan {
    pub offset: u32,
    pub width: u32,
}

impl BitSpan {
    pub fn new(offset: u32, width: u32) -> Self {
        BitSpan { offset, width }
    }

    /// Index of the most significant bit
    pub fn msb(&self) -> u32 {
        self.offset.saturating_add(self.width.max(1) - 1)
    }

    /// First bit after the field
    pub fn end(&self) -> u64 {
        self.offset as u64 + self.width as u64
    }
}

impl Display for BitSpan {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.width <= 1 {
            write!(f, "[{}]", self.offset)
        } else {
            write!(f, "[{}:{}]", self.msb(), self.offset)
        }
    }
}

/// Bit range in the form `high:low` or `bit`
pub fn bit_range<'a>(input: &mut &'a str) -> Res<'a, BitSpan> {
    let first = ws(val_u64).parse_next(input)?;
    let second = opt(preceded(ws(":"), ws(val_u64))).parse_next(input)?;
    let (hi, lo) = match second {
        Some(v) => (first, v),
        None => (first, first),
    };
    let offset = hi.min(lo);
    let width = hi.abs_diff(lo) + 1;
    Ok(BitSpan::new(
        u32::try_from(offset).unwrap_or(u32::MAX),
        u32::try_from(width).unwrap_or(u32::MAX),
    ))
}

/// Parse a bit-range notation `[high:low]` or `[bit]` (brackets optional).
/// Returns None when the text is not a valid range.
pub fn parse_bit_range(txt: &str) -> Option<BitSpan> {
    let txt = txt.trim();
    let inner = txt.strip_prefix('[').map(|t| t.strip_suffix(']')).unwrap_or(Some(txt))?;
    bit_range.parse(inner).ok()
}
