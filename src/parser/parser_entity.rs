use std::fmt::Display;

use winnow::{
    ascii::{multispace1, Caseless},
    combinator::{alt, delimited, preceded, terminated},
    Parser,
};

use crate::{
    error::IpError,
    ipcore::{PortDirection, PortWidth},
};

use super::{
    classify_ports, find_keyword, identifier, is_ident_char, paren_group, parse_num,
    split_top_level, ws, ClassifiedPort, DetectedBus, PortClass, Res,
};

/// Reverse parsing options
#[derive(Clone, Debug)]
pub struct ParseOptions {
    /// Group ports matching a known bus vocabulary into a bus interface
    pub detect_bus: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions { detect_bus: true }
    }
}

/// Width of a port as written in its type
#[derive(Clone, Debug, PartialEq)]
pub enum WidthExpr {
    /// Single bit type
    Scalar,
    /// Vector with a numeric range
    Fixed(u32),
    /// Vector sized by a generic (`NAME - 1 downto 0`)
    Generic(String),
    /// Any other type expression, kept as text
    Unresolved(String),
}

impl WidthExpr {
    /// Width in bits when known numerically
    pub fn bits(&self) -> Option<u32> {
        match self {
            WidthExpr::Scalar => Some(1),
            WidthExpr::Fixed(w) => Some(*w),
            _ => None,
        }
    }

    pub fn to_port_width(&self) -> PortWidth {
        match self {
            WidthExpr::Scalar => PortWidth::Fixed(1),
            WidthExpr::Fixed(w) => PortWidth::Fixed(*w),
            WidthExpr::Generic(g) => PortWidth::Symbolic(g.to_owned()),
            WidthExpr::Unresolved(t) => PortWidth::Symbolic(t.to_owned()),
        }
    }
}

impl Display for WidthExpr {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WidthExpr::Scalar => write!(f, "1"),
            WidthExpr::Fixed(w) => write!(f, "{w}"),
            WidthExpr::Generic(g) => write!(f, "{g}"),
            WidthExpr::Unresolved(t) => write!(f, "{t}"),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct GenericDecl {
    pub name: String,
    pub type_text: String,
    pub default: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct PortDecl {
    pub name: String,
    pub direction: PortDirection,
    pub type_text: String,
    pub width: WidthExpr,
}

/// Entity extracted from a declaration text with its classified ports
#[derive(Clone, Debug, Default)]
pub struct ParsedEntity {
    pub name: String,
    pub generics: Vec<GenericDecl>,
    /// All ports in declaration order
    pub ports: Vec<ClassifiedPort>,
    pub bus_interfaces: Vec<DetectedBus>,
}

impl ParsedEntity {
    pub fn clocks(&self) -> impl Iterator<Item = &ClassifiedPort> {
        self.ports.iter().filter(|p| matches!(p.class, PortClass::Clock))
    }

    pub fn resets(&self) -> impl Iterator<Item = &ClassifiedPort> {
        self.ports.iter().filter(|p| matches!(p.class, PortClass::Reset(_)))
    }

    pub fn user_ports(&self) -> impl Iterator<Item = &ClassifiedPort> {
        self.ports.iter().filter(|p| matches!(p.class, PortClass::User(_)))
    }

    /// Ports assigned to the bus interface `name`
    pub fn bus_ports<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a ClassifiedPort> {
        self.ports.iter().filter(move |p| matches!(&p.class, PortClass::Bus(b) if b == name))
    }

    pub fn port(&self, name: &str) -> Option<&ClassifiedPort> {
        self.ports.iter().find(|p| p.port.name.eq_ignore_ascii_case(name))
    }
}

/// Remove `--` comments up to the end of line
pub fn strip_comments(src: &str) -> String {
    src.lines()
        .map(|l| match l.find("--") {
            Some(i) => &l[..i],
            None => l,
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn entity_header<'a>(input: &mut &'a str) -> Res<'a, &'a str> {
    preceded(
        Caseless("entity"),
        terminated(delimited(multispace1, identifier, multispace1), Caseless("is")),
    )
    .parse_next(input)
}

/// Entity name and byte position of the text following `entity <name> is`
pub fn entity_name(src: &str) -> Option<(&str, usize)> {
    let lower = src.to_ascii_lowercase();
    let mut from = 0;
    while let Some(pos) = find_keyword(&lower, "entity", from) {
        let mut s = &src[pos..];
        if let Ok(name) = entity_header.parse_next(&mut s) {
            if !s.starts_with(is_ident_char) {
                return Some((name, src.len() - s.len()));
            }
        }
        from = pos + "entity".len();
    }
    None
}

fn paren_depth(txt: &str) -> i32 {
    txt.chars().fold(0, |d, c| match c {
        '(' => d + 1,
        ')' => d - 1,
        _ => d,
    })
}

/// Position of the `end` closing the entity declaration starting at `start`
fn region_end(lower: &str, start: usize) -> usize {
    let mut from = start;
    while let Some(pos) = find_keyword(lower, "end", from) {
        if paren_depth(&lower[start..pos]) == 0 {
            return pos;
        }
        from = pos + "end".len();
    }
    lower.len()
}

/// Content of the parenthesis group following a keyword (word bounded).
/// Empty when the keyword is missing or the group is not terminated.
pub fn clause_body<'a>(region: &'a str, keyword: &str) -> &'a str {
    let lower = region.to_ascii_lowercase();
    let mut from = 0;
    while let Some(pos) = find_keyword(&lower, keyword, from) {
        let mut s = &region[pos + keyword.len()..];
        if let Ok(body) = paren_group(&mut s) {
            return body;
        }
        from = pos + keyword.len();
    }
    ""
}

/// Split `a, b : rest` into the list of identifiers and the remainder
fn split_entry(entry: &str) -> Option<(Vec<&str>, &str)> {
    let (names, rest) = entry.split_once(':')?;
    let names: Vec<&str> = names
        .split(',')
        .map(str::trim)
        .filter(|n| identifier.parse(*n).is_ok())
        .collect();
    if names.is_empty() {
        return None;
    }
    Some((names, rest.trim()))
}

pub fn parse_generics(body: &str) -> Vec<GenericDecl> {
    let mut generics = Vec::new();
    for entry in split_top_level(body, ';') {
        let Some((names, rest)) = split_entry(entry) else {
            log::debug!("Skipping generic entry '{entry}'");
            continue;
        };
        let (type_text, default) = match rest.split_once(":=") {
            Some((t, d)) => (t.trim(), Some(d.trim().to_owned())),
            None => (rest, None),
        };
        for name in names {
            generics.push(GenericDecl {
                name: name.to_owned(),
                type_text: type_text.to_owned(),
                default: default.clone(),
            });
        }
    }
    generics
}

pub fn port_mode<'a>(input: &mut &'a str) -> Res<'a, PortDirection> {
    terminated(
        alt((
            Caseless("inout").value(PortDirection::Inout),
            Caseless("in").value(PortDirection::In),
            Caseless("out").value(PortDirection::Out),
        )),
        multispace1,
    )
    .parse_next(input)
}

pub fn parse_ports(body: &str) -> Vec<PortDecl> {
    let mut ports = Vec::new();
    for entry in split_top_level(body, ';') {
        let Some((names, mut rest)) = split_entry(entry) else {
            log::debug!("Skipping port entry '{entry}'");
            continue;
        };
        let Ok(direction) = port_mode(&mut rest) else {
            log::debug!("Port entry without direction: '{entry}'");
            continue;
        };
        let type_text = match rest.split_once(":=") {
            Some((t, _)) => t.trim(),
            None => rest.trim(),
        };
        if type_text.is_empty() {
            continue;
        }
        let width = infer_width(type_text);
        for name in names {
            ports.push(PortDecl {
                name: name.to_owned(),
                direction,
                type_text: type_text.to_owned(),
                width: width.clone(),
            });
        }
    }
    ports
}

fn generic_minus_one<'a>(input: &mut &'a str) -> Res<'a, &'a str> {
    terminated(ws(identifier), (ws("-"), ws("1"))).parse_next(input)
}

fn range_width(range: &str) -> Option<WidthExpr> {
    let lower = range.to_ascii_lowercase();
    let (pos, kw_len, descending) = find_keyword(&lower, "downto", 0)
        .map(|p| (p, "downto".len(), true))
        .or_else(|| find_keyword(&lower, "to", 0).map(|p| (p, "to".len(), false)))?;
    let left = range[..pos].trim();
    let right = range[pos + kw_len..].trim();
    if let (Some(l), Some(r)) = (parse_num(left), parse_num(right)) {
        return u32::try_from(l.abs_diff(r) + 1).ok().map(WidthExpr::Fixed);
    }
    let (bound, zero) = if descending { (left, right) } else { (right, left) };
    if parse_num(zero) == Some(0) {
        if let Ok(name) = generic_minus_one.parse(bound) {
            return Some(WidthExpr::Generic(name.to_owned()));
        }
    }
    None
}

/// Width of a port from its type expression
pub fn infer_width(type_text: &str) -> WidthExpr {
    let Some(open) = type_text.find('(') else {
        return WidthExpr::Scalar;
    };
    let mut s = &type_text[open..];
    match paren_group(&mut s) {
        Ok(range) if s.trim().is_empty() => {
            range_width(range).unwrap_or_else(|| WidthExpr::Unresolved(type_text.to_owned()))
        }
        _ => WidthExpr::Unresolved(type_text.to_owned()),
    }
}

/// Parse an entity declaration: name, generics and classified ports
pub fn parse_entity(src: &str, options: &ParseOptions) -> Result<ParsedEntity, IpError> {
    let src = strip_comments(src);
    let (name, body_start) = entity_name(&src)
        .ok_or_else(|| IpError::not_found("Entity declaration"))?;
    let lower = src.to_ascii_lowercase();
    let region = &src[body_start..region_end(&lower, body_start)];

    let generics = parse_generics(clause_body(region, "generic"));
    let ports = parse_ports(clause_body(region, "port"));
    log::debug!("Entity {name}: {} generics, {} ports", generics.len(), ports.len());

    let (ports, bus_interfaces) = classify_ports(ports, options.detect_bus);
    Ok(ParsedEntity {
        name: name.to_owned(),
        generics,
        ports,
        bus_interfaces,
    })
}
