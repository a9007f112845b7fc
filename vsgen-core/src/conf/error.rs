use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    // IO / Discovery
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("glob pattern error: {pattern}: {source}")]
    Glob {
        pattern: String,
        #[source]
        source: glob::PatternError,
    },

    // Parsing
    #[error("failed to parse HCL in {path}: {source}")]
    Hcl {
        path: PathBuf,
        #[source]
        source: hcl::Error,
    },

    #[error("failed to parse YAML in {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("unknown resource kind '{kind}' in {path}")]
    UnknownKind { path: PathBuf, kind: String },

    // Structure
    #[error("no VirtualServer found under {root}")]
    MissingVirtualServer { root: PathBuf },

    #[error("duplicate {kind} {key}")]
    DuplicateResource { kind: &'static str, key: String },
}

impl ConfigError {
    pub fn read_file(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::ReadFile {
            path: path.into(),
            source,
        }
    }

    pub fn hcl(path: impl Into<PathBuf>, source: hcl::Error) -> Self {
        Self::Hcl {
            path: path.into(),
            source,
        }
    }

    pub fn yaml(path: impl Into<PathBuf>, source: serde_yaml::Error) -> Self {
        Self::Yaml {
            path: path.into(),
            source,
        }
    }
}
