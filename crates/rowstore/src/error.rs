use bytestream::StreamError;
use tagparser::TagError;
use thiserror::Error;

/// Failure to decode one attribute of a row from its XML text.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum FieldError {
    #[error("missing attribute '{name}'")]
    Missing { name: String },

    #[error("invalid value for attribute '{name}': {message}")]
    Invalid { name: String, message: String },

    #[error(transparent)]
    Tag(#[from] TagError),
}

/// Errors raised by table operations.
///
/// Bulk loads report every document-shape problem (and any duplicate key met
/// while ingesting rows) as [`TableError::Conversion`], so a caller only has
/// to distinguish "this table could not be loaded or saved" from an
/// explicit duplicate insertion.
#[derive(Debug, Error)]
pub enum TableError {
    /// A row with an equal key is already stored.
    #[error("duplicate key {key} in table {table}")]
    DuplicateKey { table: String, key: String },

    /// The document, the file or the stream could not be converted.
    #[error("{table}: {message}")]
    Conversion { table: String, message: String },

    /// A row that cannot be rendered as XML.
    #[error("row of table {table} cannot be rendered: {reason}")]
    NoSuchRow { table: String, reason: String },

    /// Attempt to change the key of a row owned by a table.
    #[error("the key of a row added to table {table} cannot change")]
    KeyFrozen { table: String },

    #[error(transparent)]
    Field(#[from] FieldError),
}

impl TableError {
    pub(crate) fn conversion(table: &str, message: impl Into<String>) -> Self {
        TableError::Conversion {
            table: table.to_string(),
            message: message.into(),
        }
    }

    pub(crate) fn stream(table: &str, err: StreamError) -> Self {
        Self::conversion(table, format!("error while reading binary data: {err}"))
    }
}
