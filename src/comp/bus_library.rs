use std::{
    collections::{BTreeMap, HashMap},
    path::{Path, PathBuf},
    sync::Arc,
};

use crate::{
    error::IpError,
    ipcore::{parse_document, read_document, BusPortDefinition, BusProtocolDef, DocFormat},
};

const BUILTIN_LIBRARY: &str = include_str!("../../resources/bus_definitions.yml");

/// Canonical protocol key with its render type tag
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProtocolInfo {
    pub key: &'static str,
    pub tag: &'static str,
}

pub const AXI4L: ProtocolInfo = ProtocolInfo { key: "AXI4L", tag: "axil" };
pub const AXI4: ProtocolInfo = ProtocolInfo { key: "AXI4", tag: "axi4" };
pub const AXIS: ProtocolInfo = ProtocolInfo { key: "AXIS", tag: "axis" };
pub const AVALON_MM: ProtocolInfo = ProtocolInfo { key: "AVALON_MM", tag: "avmm" };
pub const AVALON_ST: ProtocolInfo = ProtocolInfo { key: "AVALON_ST", tag: "avst" };

/// Normalized spelling to protocol
const PROTOCOL_ALIASES: &[(&str, ProtocolInfo)] = &[
    ("AXI4LITE", AXI4L),
    ("AXI4L", AXI4L),
    ("AXIL", AXI4L),
    ("AXILITE", AXI4L),
    ("AXI4", AXI4),
    ("AXI4FULL", AXI4),
    ("AXI", AXI4),
    ("AXIS", AXIS),
    ("AXI4STREAM", AXIS),
    ("AXISTREAM", AXIS),
    ("AVALONMM", AVALON_MM),
    ("AVMM", AVALON_MM),
    ("AVALON", AVALON_MM),
    ("AVALONST", AVALON_ST),
    ("AVST", AVALON_ST),
];

/// Upper-case a protocol name and drop separators (`-`, `_`, space, `.`)
fn squash(name: &str) -> String {
    name.chars()
        .filter(|c| !matches!(c, '-' | '_' | ' ' | '.'))
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

/// Look up a free-form protocol name in the alias table
pub fn normalize_protocol(name: &str) -> Option<ProtocolInfo> {
    let squashed = squash(name);
    PROTOCOL_ALIASES.iter()
        .find(|(alias, _)| *alias == squashed)
        .map(|(_, info)| *info)
}

/// Protocol definitions indexed by canonical key
#[derive(Clone, Debug, Default)]
pub struct BusLibrary {
    protocols: BTreeMap<String, Vec<BusPortDefinition>>,
}

impl BusLibrary {

    pub fn from_protocols(defs: BTreeMap<String, BusProtocolDef>) -> Self {
        let protocols = defs.into_iter()
            .map(|(k, def)| {
                let key = normalize_protocol(&k).map(|p| p.key.to_owned()).unwrap_or_else(|| squash(&k));
                (key, def.ports)
            })
            .collect();
        BusLibrary { protocols }
    }

    pub fn from_yaml(txt: &str) -> Result<Self, IpError> {
        let defs: BTreeMap<String, BusProtocolDef> = parse_document(txt, DocFormat::Yaml)?;
        Ok(Self::from_protocols(defs))
    }

    pub fn from_file(path: &Path) -> Result<Self, IpError> {
        log::debug!("Loading bus library {}", path.display());
        let defs: BTreeMap<String, BusProtocolDef> = read_document(path)?;
        Ok(Self::from_protocols(defs))
    }

    /// Library embedded in the binary
    pub fn builtin() -> Result<Self, IpError> {
        Self::from_yaml(BUILTIN_LIBRARY)
    }

    /// Logical ports of a protocol
    pub fn ports(&self, key: &str) -> Option<&[BusPortDefinition]> {
        self.protocols.get(key).map(|v| v.as_slice())
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.protocols.keys().map(|k| k.as_str())
    }
}

/// Loaded bus libraries: the default one and any explicitly referenced one.
/// Owned by the caller and shared between requests until `clear` is called.
#[derive(Debug, Default)]
pub struct BusLibraryCache {
    default_path: Option<PathBuf>,
    default: Option<Arc<BusLibrary>>,
    explicit: HashMap<PathBuf, Arc<BusLibrary>>,
}

impl BusLibraryCache {

    /// Cache using `default_path` as default library, or the built-in one when None
    pub fn new(default_path: Option<PathBuf>) -> Self {
        BusLibraryCache {
            default_path,
            default: None,
            explicit: HashMap::new(),
        }
    }

    /// Default library, loaded on first use. A loading failure is returned to the caller.
    pub fn default_library(&mut self) -> Result<Arc<BusLibrary>, IpError> {
        if let Some(lib) = &self.default {
            return Ok(lib.clone());
        }
        let lib = match &self.default_path {
            Some(path) => BusLibrary::from_file(path)?,
            None => BusLibrary::builtin()?,
        };
        let lib = Arc::new(lib);
        self.default = Some(lib.clone());
        Ok(lib)
    }

    /// Library to use for a request: the explicit one when it can be loaded,
    /// the default one otherwise
    pub fn resolve(&mut self, explicit: Option<&Path>) -> Result<Arc<BusLibrary>, IpError> {
        let Some(path) = explicit else {
            return self.default_library();
        };
        if let Some(lib) = self.explicit.get(path) {
            return Ok(lib.clone());
        }
        match BusLibrary::from_file(path) {
            Ok(lib) => {
                let lib = Arc::new(lib);
                self.explicit.insert(path.to_owned(), lib.clone());
                Ok(lib)
            }
            Err(e) => {
                log::warn!("Unable to load bus library {}: {e}. Using default library", path.display());
                self.default_library()
            }
        }
    }

    /// Drop every loaded library
    pub fn clear(&mut self) {
        self.default = None;
        self.explicit.clear();
    }

    pub fn is_loaded(&self) -> bool {
        self.default.is_some() || !self.explicit.is_empty()
    }
}
