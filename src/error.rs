use std::path::Path;

use thiserror::Error;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum IpErrorKind {
    /// File IO error
    Io,
    /// Text or document cannot be parsed
    MalformedInput,
    /// Missing entity clause or missing referenced document
    NotFound,
    /// Bus protocol type not in the alias table
    UnknownProtocol,
    /// Item placed outside of its container
    BoundsViolation,
    /// Repacking cannot remove an overlap
    CollisionUnresolvable,
}

#[derive(Error, Debug)]
pub enum IpError {
    #[error("IO exception on '{path}': {cause}")]
    Io {
        path: String,
        #[source]
        cause: std::io::Error,
    },
    #[error("Malformed {origin}: {txt}")]
    MalformedInput { origin: String, txt: String },
    #[error("{0} not found")]
    NotFound(String),
    #[error("Unknown bus protocol '{0}'")]
    UnknownProtocol(String),
    #[error("{0}")]
    BoundsViolation(String),
    #[error("{0}")]
    CollisionUnresolvable(String),
}

impl IpError {

    pub fn kind(&self) -> IpErrorKind {
        match self {
            IpError::Io { .. }                 => IpErrorKind::Io,
            IpError::MalformedInput { .. }     => IpErrorKind::MalformedInput,
            IpError::NotFound(_)               => IpErrorKind::NotFound,
            IpError::UnknownProtocol(_)        => IpErrorKind::UnknownProtocol,
            IpError::BoundsViolation(_)        => IpErrorKind::BoundsViolation,
            IpError::CollisionUnresolvable(_)  => IpErrorKind::CollisionUnresolvable,
        }
    }

    pub fn io(path: &Path, cause: std::io::Error) -> Self {
        if cause.kind() == std::io::ErrorKind::NotFound {
            return IpError::NotFound(format!("'{}'", path.display()));
        }
        IpError::Io { path: path.display().to_string(), cause }
    }

    pub fn malformed<S1, S2>(origin: S1, txt: S2) -> Self
    where
        S1: Into<String>,
        S2: Into<String>,
    {
        IpError::MalformedInput { origin: origin.into(), txt: txt.into() }
    }

    pub fn not_found<S: Into<String>>(what: S) -> Self {
        IpError::NotFound(what.into())
    }
}

impl From<std::io::Error> for IpError {
    fn from(cause: std::io::Error) -> IpError {
        IpError::Io { path: "<stream>".to_owned(), cause }
    }
}

impl From<serde_yaml::Error> for IpError {
    fn from(cause: serde_yaml::Error) -> IpError {
        IpError::malformed("YAML document", cause.to_string())
    }
}

impl From<serde_json::Error> for IpError {
    fn from(cause: serde_json::Error) -> IpError {
        IpError::malformed("JSON document", cause.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_is_not_found() {
        let e = IpError::io(Path::new("nowhere.yml"), std::io::Error::from(std::io::ErrorKind::NotFound));
        assert_eq!(e.kind(), IpErrorKind::NotFound);
        assert_eq!(e.to_string(), "'nowhere.yml' not found");
    }

    #[test]
    fn yaml_error_is_malformed() {
        let e: IpError = serde_yaml::from_str::<Vec<u32>>("{ not: [a list").unwrap_err().into();
        assert_eq!(e.kind(), IpErrorKind::MalformedInput);
    }
}
