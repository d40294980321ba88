use std::{fs, path::{Path, PathBuf}};

use serde::{de::DeserializeOwned, Deserialize};

use crate::error::IpError;

use super::{IpCoreDescriptor, MemoryMap, MemoryMapRef};

/// Document encoding, selected from the file extension
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum DocFormat {
    Yaml,
    Json,
}

impl DocFormat {
    pub fn from_path(path: &Path) -> DocFormat {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DocFormat::Json,
            _ => DocFormat::Yaml,
        }
    }
}

/// Parse a document from text
pub fn parse_document<T: DeserializeOwned>(txt: &str, format: DocFormat) -> Result<T, IpError> {
    match format {
        DocFormat::Json => Ok(serde_json::from_str(txt)?),
        DocFormat::Yaml => Ok(serde_yaml::from_str(txt)?),
    }
}

/// Read and parse a document from disk (single read, no retry)
pub fn read_document<T: DeserializeOwned>(path: &Path) -> Result<T, IpError> {
    let txt = fs::read_to_string(path).map_err(|e| IpError::io(path, e))?;
    parse_document(&txt, DocFormat::from_path(path))
        .map_err(|e| match e {
            IpError::MalformedInput { txt, .. } => IpError::malformed(path.display().to_string(), txt),
            e => e,
        })
}

/// Resolve a path relative to the directory of the referencing document
pub fn resolve_relative(doc_dir: &Path, reference: &str) -> PathBuf {
    let p = Path::new(reference);
    if p.is_absolute() {
        p.to_owned()
    } else {
        doc_dir.join(p)
    }
}

/// A memory map document holds a list of maps or a single one
#[derive(Deserialize)]
#[serde(untagged)]
enum MemoryMapDoc {
    List(Vec<MemoryMap>),
    Single(MemoryMap),
}

pub fn load_memory_maps(path: &Path) -> Result<Vec<MemoryMap>, IpError> {
    log::debug!("Loading memory map {}", path.display());
    let doc: MemoryMapDoc = read_document(path)?;
    Ok(match doc {
        MemoryMapDoc::List(v) => v,
        MemoryMapDoc::Single(m) => vec![m],
    })
}

impl IpCoreDescriptor {

    pub fn from_file<P>(path: P) -> Result<IpCoreDescriptor, IpError>
    where
        P: AsRef<Path>,
    {
        log::info!("Loading IP core {}", path.as_ref().display());
        read_document(path.as_ref())
    }

    pub fn from_str_as(txt: &str, format: DocFormat) -> Result<IpCoreDescriptor, IpError> {
        parse_document(txt, format)
    }

    /// Memory maps of the core, following an `import:` reference if needed.
    /// A missing import is reported as `NotFound`.
    pub fn resolve_memory_maps(&self, doc_dir: &Path) -> Result<Vec<MemoryMap>, IpError> {
        match &self.memory_maps {
            None => Ok(Vec::new()),
            Some(MemoryMapRef::Inline(maps)) => Ok(maps.clone()),
            Some(MemoryMapRef::Import { import }) => {
                let path = resolve_relative(doc_dir, import);
                if !path.is_file() {
                    return Err(IpError::not_found(format!("Memory map import '{}'", path.display())));
                }
                load_memory_maps(&path)
            }
        }
    }
}
