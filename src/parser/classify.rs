use crate::ipcore::{order_dict::OrderDict, BusMode, Polarity, PortDirection};

use super::PortDecl;

/// AXI4-Lite signal suffixes
pub const AXI4L_SUFFIXES: &[&str] = &[
    "awaddr", "awprot", "awvalid", "awready",
    "wdata", "wstrb", "wvalid", "wready",
    "bresp", "bvalid", "bready",
    "araddr", "arprot", "arvalid", "arready",
    "rdata", "rresp", "rvalid", "rready",
];
pub const AXI4L_THRESHOLD: usize = 4;

/// Avalon-MM signal suffixes
pub const AVMM_SUFFIXES: &[&str] = &[
    "address", "read", "write", "writedata", "readdata",
    "waitrequest", "byteenable", "readdatavalid",
];
pub const AVMM_THRESHOLD: usize = 3;

const CLOCK_TOKENS: &[&str] = &["clk", "clock", "aclk"];
const RESET_TOKENS: &[&str] = &["rst", "reset", "aresetn", "reset_n", "rst_n"];

/// Bus vocabulary used for detection
#[derive(Clone, Copy, Debug)]
pub struct BusVocabulary {
    pub protocol_type: &'static str,
    pub default_name: &'static str,
    pub suffixes: &'static [&'static str],
    pub threshold: usize,
}

/// Vocabularies in detection priority order
pub const BUS_VOCABULARIES: &[BusVocabulary] = &[
    BusVocabulary {
        protocol_type: "AXI4-Lite",
        default_name: "s_axi",
        suffixes: AXI4L_SUFFIXES,
        threshold: AXI4L_THRESHOLD,
    },
    BusVocabulary {
        protocol_type: "Avalon-MM",
        default_name: "avs",
        suffixes: AVMM_SUFFIXES,
        threshold: AVMM_THRESHOLD,
    },
];

/// Inferred role of a port
#[derive(Clone, Debug, PartialEq)]
pub enum PortClass {
    Clock,
    Reset(Polarity),
    /// Member of the named bus interface
    Bus(String),
    /// Plain port with its logical name
    User(String),
}

#[derive(Clone, Debug, PartialEq)]
pub struct ClassifiedPort {
    pub port: PortDecl,
    pub class: PortClass,
}

/// Bus interface recognized from the port names
#[derive(Clone, Debug, PartialEq)]
pub struct DetectedBus {
    pub name: String,
    pub protocol_type: String,
    pub mode: BusMode,
    pub physical_prefix: String,
    /// Port names in declaration order
    pub members: Vec<String>,
    pub signal_count: usize,
}

/// Check if a lower-case name is one of the tokens or ends with `_<token>`
fn ends_with_token(name: &str, tokens: &[&str]) -> bool {
    tokens.iter().any(|t| {
        name == *t || (name.ends_with(t) && name[..name.len() - t.len()].ends_with('_'))
    })
}

pub fn is_clock_name(name: &str) -> bool {
    ends_with_token(&name.to_ascii_lowercase(), CLOCK_TOKENS)
}

/// Polarity of a reset port, None if the name is not a reset name
pub fn reset_polarity(name: &str) -> Option<Polarity> {
    let lower = name.to_ascii_lowercase();
    if !ends_with_token(&lower, RESET_TOKENS) {
        return None;
    }
    if lower.ends_with('n') || lower.contains("reset_n") || lower.contains("rst_n") {
        Some(Polarity::ActiveLow)
    } else {
        Some(Polarity::ActiveHigh)
    }
}

/// Logical name of a user port: one leading `I_`, `O_` or `IO_` removed, upper-cased
pub fn user_logical_name(name: &str) -> String {
    let upper = name.to_ascii_uppercase();
    for p in ["IO_", "I_", "O_"] {
        if let Some(rest) = upper.strip_prefix(p) {
            if !rest.is_empty() {
                return rest.to_owned();
            }
        }
    }
    upper
}

/// Prefix left once the longest matching suffix is removed
fn bus_prefix(lower: &str, suffixes: &[&str]) -> Option<String> {
    suffixes.iter()
        .filter(|s| lower.ends_with(*s))
        .max_by_key(|s| s.len())
        .map(|s| lower[..lower.len() - s.len()].to_owned())
}

/// Tally port-name prefixes against every vocabulary and keep the best candidate.
/// The larger tally wins when several vocabularies clear their threshold,
/// ties go to the vocabulary listed first.
pub fn detect_bus(ports: &[PortDecl]) -> Option<DetectedBus> {
    let mut best: Option<(&BusVocabulary, String, usize)> = None;
    for vocab in BUS_VOCABULARIES {
        let mut tally: OrderDict<String, usize> = OrderDict::new();
        for p in ports {
            if let Some(prefix) = bus_prefix(&p.name.to_ascii_lowercase(), vocab.suffixes) {
                *tally.entry(&prefix) += 1;
            }
        }
        let Some((prefix, count)) = tally.max_count() else {
            continue;
        };
        log::debug!("{} vocabulary: best prefix '{prefix}' with {count} signals", vocab.protocol_type);
        if count < vocab.threshold {
            continue;
        }
        if best.as_ref().map(|(_, _, n)| count > *n).unwrap_or(true) {
            best = Some((vocab, prefix.to_owned(), count));
        }
    }

    let (vocab, prefix, count) = best?;
    let members = ports.iter()
        .filter(|p| bus_prefix(&p.name.to_ascii_lowercase(), vocab.suffixes).as_deref() == Some(prefix.as_str()))
        .map(|p| p.name.to_owned())
        .collect();
    let name = match prefix.trim_end_matches('_') {
        "" => vocab.default_name.to_owned(),
        n => n.to_owned(),
    };
    log::info!("Detected {} interface '{name}' ({count} signals)", vocab.protocol_type);
    Some(DetectedBus {
        name,
        protocol_type: vocab.protocol_type.to_owned(),
        mode: BusMode::Slave,
        physical_prefix: prefix,
        members,
        signal_count: count,
    })
}

/// Assign a class to every port: bus member first, then clock, reset and user
pub fn classify_ports(ports: Vec<PortDecl>, detect: bool) -> (Vec<ClassifiedPort>, Vec<DetectedBus>) {
    let buses: Vec<DetectedBus> = if detect { detect_bus(&ports).into_iter().collect() } else { Vec::new() };
    let classified = ports.into_iter()
        .map(|port| {
            let bus = buses.iter().find(|b| b.members.contains(&port.name));
            let class = if let Some(b) = bus {
                PortClass::Bus(b.name.to_owned())
            } else if port.direction == PortDirection::In && is_clock_name(&port.name) {
                PortClass::Clock
            } else if let Some(pol) = reset_polarity(&port.name).filter(|_| port.direction == PortDirection::In) {
                PortClass::Reset(pol)
            } else {
                PortClass::User(user_logical_name(&port.name))
            };
            ClassifiedPort { port, class }
        })
        .collect();
    (classified, buses)
}
