//! Lenient numeric and width values accepted by the input documents.
//!
//! Numbers may be written natively or as strings with a radix prefix
//! (`0x`, `0b`, `0o`, `'h`...). Values that cannot be read as a number
//! fall back to 0 for mandatory attributes and to `None` for optional ones.

use std::{collections::BTreeMap, fmt::Display};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::parser::parse_num;

#[derive(Deserialize)]
#[serde(untagged)]
enum RawNum {
    Unsigned(u64),
    Signed(i64),
    Float(f64),
    Text(String),
    Bool(bool),
}

impl RawNum {
    fn to_u64(&self) -> Option<u64> {
        match self {
            RawNum::Unsigned(v) => Some(*v),
            RawNum::Signed(v) => u64::try_from(*v).ok(),
            RawNum::Float(v) if *v >= 0.0 && v.fract() == 0.0 => Some(*v as u64),
            RawNum::Float(_) => None,
            RawNum::Text(s) => parse_num(s),
            RawNum::Bool(b) => Some(*b as u64),
        }
    }

    fn to_text(&self) -> Option<String> {
        match self {
            RawNum::Unsigned(v) => Some(v.to_string()),
            RawNum::Signed(v) => Some(v.to_string()),
            RawNum::Text(s) => Some(s.to_owned()),
            RawNum::Float(_) | RawNum::Bool(_) => None,
        }
    }
}

/// Bit-range notation as it may appear in YAML: `"[7:4]"`, `3`, or an unquoted `[7:4]`
#[derive(Deserialize)]
#[serde(untagged)]
enum RawBits {
    One(RawNum),
    Seq(Vec<RawNum>),
    Other(serde::de::IgnoredAny),
}

/// Mandatory number: unparseable or null values read as 0
pub fn lenient_u64<'de, D>(d: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawNum>::deserialize(d).unwrap_or(None);
    Ok(raw.and_then(|r| r.to_u64()).unwrap_or(0))
}

pub fn lenient_u32<'de, D>(d: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    lenient_u64(d).map(|v| u32::try_from(v).unwrap_or(u32::MAX))
}

/// Optional number: only a readable number is kept
pub fn lenient_opt_u64<'de, D>(d: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawNum>::deserialize(d).unwrap_or(None);
    Ok(raw.and_then(|r| r.to_u64()))
}

/// Optional bit-range text: anything that cannot be read back as a range is dropped
pub fn lenient_opt_bits<'de, D>(d: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawBits>::deserialize(d).unwrap_or(None);
    Ok(match raw {
        Some(RawBits::One(r)) => r.to_text(),
        Some(RawBits::Seq(v)) if v.len() == 1 => v[0].to_text().map(|t| format!("[{t}]")),
        _ => None,
    })
}

pub fn lenient_width_map<'de, D>(d: D) -> Result<BTreeMap<String, u32>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<BTreeMap<String, RawNum>>::deserialize(d)?.unwrap_or_default();
    Ok(raw.into_iter()
        .map(|(k, v)| (k, v.to_u64().and_then(|w| u32::try_from(w).ok()).unwrap_or(0)))
        .collect())
}

/// Port width: a constant or the name of a parameter
#[derive(Clone, Debug, PartialEq)]
pub enum PortWidth {
    Fixed(u32),
    Symbolic(String),
}

impl Default for PortWidth {
    fn default() -> Self {
        PortWidth::Fixed(1)
    }
}

impl PortWidth {
    /// Resolve the width using parameter values when symbolic
    pub fn resolve<'a, I>(&self, params: I) -> Option<u32>
    where
        I: IntoIterator<Item = (&'a str, &'a ParamValue)>,
    {
        match self {
            PortWidth::Fixed(w) => Some(*w),
            PortWidth::Symbolic(name) => params.into_iter()
                .find(|(n, _)| n.eq_ignore_ascii_case(name))
                .and_then(|(_, v)| v.as_u64())
                .and_then(|v| u32::try_from(v).ok()),
        }
    }
}

impl Display for PortWidth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortWidth::Fixed(w) => write!(f, "{w}"),
            PortWidth::Symbolic(s) => write!(f, "{s}"),
        }
    }
}

impl Serialize for PortWidth {
    fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            PortWidth::Fixed(w) => s.serialize_u32(*w),
            PortWidth::Symbolic(n) => s.serialize_str(n),
        }
    }
}

impl<'de> Deserialize<'de> for PortWidth {
    fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let raw = Option::<RawNum>::deserialize(d)?;
        Ok(match raw {
            None => PortWidth::default(),
            Some(RawNum::Text(s)) => match parse_num(&s) {
                Some(w) => PortWidth::Fixed(u32::try_from(w).unwrap_or(u32::MAX)),
                None => PortWidth::Symbolic(s.trim().to_owned()),
            },
            Some(r) => PortWidth::Fixed(r.to_u64().and_then(|w| u32::try_from(w).ok()).unwrap_or(1)),
        })
    }
}

/// Parameter value as written in the document
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl Default for ParamValue {
    fn default() -> Self {
        ParamValue::Text(String::new())
    }
}

impl ParamValue {
    /// Interpret the value as an unsigned integer, including numeric strings
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            ParamValue::Int(v) => u64::try_from(*v).ok(),
            ParamValue::Text(s) => parse_num(s),
            ParamValue::Bool(b) => Some(*b as u64),
            ParamValue::Float(_) => None,
        }
    }

    /// Build a value from declaration text, keeping integers typed
    pub fn from_text(s: &str) -> Self {
        let s = s.trim();
        if let Ok(v) = s.parse::<i64>() {
            return ParamValue::Int(v);
        }
        match s.to_ascii_lowercase().as_str() {
            "true" => ParamValue::Bool(true),
            "false" => ParamValue::Bool(false),
            _ => ParamValue::Text(s.trim_matches('"').to_owned()),
        }
    }
}

impl Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Int(v) => write!(f, "{v}"),
            ParamValue::Float(v) => write!(f, "{v}"),
            ParamValue::Text(s) => write!(f, "{s}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "lenient_u64")]
        a: u64,
        #[serde(default, deserialize_with = "lenient_opt_u64")]
        b: Option<u64>,
        #[serde(default)]
        w: PortWidth,
    }

    fn probe(txt: &str) -> Probe {
        serde_yaml::from_str(txt).unwrap()
    }

    #[test]
    fn numbers_and_strings() {
        assert_eq!(probe("a: 12").a, 12);
        assert_eq!(probe("a: '0x10'").a, 16);
        assert_eq!(probe("a: '0b101'").a, 5);
        assert_eq!(probe("a: \"8'hFF\"").a, 255);
        assert_eq!(probe("a: 0x20").a, 32);
    }

    #[test]
    fn unparseable_defaults() {
        assert_eq!(probe("a: garbage").a, 0);
        assert_eq!(probe("a: -4").a, 0);
        assert_eq!(probe("b: garbage").b, None);
        assert_eq!(probe("b: '7'").b, Some(7));
    }

    #[derive(Deserialize)]
    struct Bits {
        #[serde(default, deserialize_with = "lenient_opt_bits")]
        bits: Option<String>,
    }

    fn bits(txt: &str) -> Option<String> {
        serde_yaml::from_str::<Bits>(txt).unwrap().bits
    }

    #[test]
    fn bit_notation() {
        assert_eq!(bits("bits: '[7:4]'").as_deref(), Some("[7:4]"));
        assert_eq!(bits("bits: [7:4]").as_deref(), Some("[7:4]"));
        assert_eq!(bits("bits: [3]").as_deref(), Some("[3]"));
        assert_eq!(bits("bits: 5").as_deref(), Some("5"));
        assert_eq!(bits("bits: [1, 2]"), None);
        assert_eq!(bits("bits: {hi: 3}"), None);
        assert_eq!(bits("other: 1"), None);
    }

    #[test]
    fn port_width() {
        assert_eq!(probe("w: 8").w, PortWidth::Fixed(8));
        assert_eq!(probe("w: '16'").w, PortWidth::Fixed(16));
        assert_eq!(probe("w: DATA_WIDTH").w, PortWidth::Symbolic("DATA_WIDTH".to_owned()));
        assert_eq!(probe("a: 1").w, PortWidth::Fixed(1));
    }

    #[test]
    fn width_resolution() {
        let v = ParamValue::Int(12);
        let params = vec![("DATA_WIDTH", &v)];
        assert_eq!(PortWidth::Symbolic("data_width".to_owned()).resolve(params.clone()), Some(12));
        assert_eq!(PortWidth::Symbolic("OTHER".to_owned()).resolve(params), None);
    }
}
