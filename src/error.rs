use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocattrError {
    #[error("Unknown attribute '{name}' on record type {record_type}")]
    UnknownAttribute { record_type: String, name: String },
    #[error("Type mismatch for {type_name}: {message}")]
    TypeMismatch { type_name: &'static str, message: String },
    #[error(
        "Configuration conflict on {record_type}: '{attempted}' and '{existing}' both store under {container}.{store_key}"
    )]
    ConfigurationConflict {
        record_type: String,
        container: String,
        store_key: String,
        existing: String,
        attempted: String,
    },
    #[error("Unknown attribute type: {0}")]
    UnknownType(String),
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),
    #[error("Unknown record type: {0}")]
    UnknownRecordType(String),
    #[error("No {record_type} record with id {id}")]
    RecordNotFound { record_type: String, id: i64 },
    #[error("Config error: {0}")]
    Config(String),
    #[error("Persistence error: {0}")]
    Persistence(String),
    #[error("Serialization error: {0}")]
    Serialization(String),
    #[error("Lock poisoned: {0}")]
    Lock(String),
}

impl DocattrError {
    pub(crate) fn mismatch(type_name: &'static str, message: impl Into<String>) -> Self {
        Self::TypeMismatch {
            type_name,
            message: message.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, DocattrError>;

// Helper conversions
impl From<rusqlite::Error> for DocattrError {
    fn from(e: rusqlite::Error) -> Self { Self::Persistence(e.to_string()) }
}
impl From<serde_json::Error> for DocattrError {
    fn from(e: serde_json::Error) -> Self { Self::Serialization(e.to_string()) }
}
impl From<config::ConfigError> for DocattrError {
    fn from(e: config::ConfigError) -> Self { Self::Config(e.to_string()) }
}
