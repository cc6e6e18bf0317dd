//! Error types for Glint

use thiserror::Error;

/// The main error type for shader compilation
#[derive(Debug, Error)]
pub enum ShaderError {
    #[error("{path}:{line} - {text}")]
    Parse {
        path: String,
        line: usize,
        text: String,
    },

    #[error("Function not found while resolving dependencies: {0}")]
    MissingFunction(String),

    #[error("Cyclic function dependency: {0}")]
    CyclicDependency(String),

    #[error("Malformed shader node: {0}")]
    BadNodeShape(String),

    #[error("Unsupported type: {0}")]
    UnsupportedType(String),

    #[error("Config error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(String),

    #[error("TOML serialization error: {0}")]
    TomlSer(String),

    #[error("Serialization error: {0}")]
    Serialize(String),
}

impl ShaderError {
    /// Source line of a parse error, if this is one
    pub fn line(&self) -> Option<usize> {
        match self {
            ShaderError::Parse { line, .. } => Some(*line),
            _ => None,
        }
    }
}

/// Result type alias for Glint operations
pub type Result<T> = std::result::Result<T, ShaderError>;

impl From<toml::de::Error> for ShaderError {
    fn from(err: toml::de::Error) -> Self {
        ShaderError::TomlParse(err.to_string())
    }
}

impl From<toml::ser::Error> for ShaderError {
    fn from(err: toml::ser::Error) -> Self {
        ShaderError::TomlSer(err.to_string())
    }
}
