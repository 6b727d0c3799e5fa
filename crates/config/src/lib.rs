//! # Config - dataset store settings
//!
//! Settings shared by the table engine and the shell. They are read from the
//! environment with a default for every variable:
//!
//! ```text
//! ROWSTORE_DIR          dataset directory                  (default: "dataset")
//! ROWSTORE_CHECK_UNIQUE enforce key uniqueness on load      (default: "true")
//! ROWSTORE_LAZY         load tables on first access         (default: "true")
//! ROWSTORE_BINARY       save new tables as binary sidecars  (default: "false")
//! ROWSTORE_BYTE_ORDER   Big_Endian | Little_Endian | Machine (default: "Machine")
//! ```
//!
//! Unparsable booleans fall back to their default. An unknown byte order is
//! an error, because writing sidecars in a surprising order is worse than
//! refusing to start.

use std::path::PathBuf;

use bytestream::{ByteOrder, StreamError};

pub const ENV_DIR: &str = "ROWSTORE_DIR";
pub const ENV_CHECK_UNIQUE: &str = "ROWSTORE_CHECK_UNIQUE";
pub const ENV_LAZY: &str = "ROWSTORE_LAZY";
pub const ENV_BINARY: &str = "ROWSTORE_BINARY";
pub const ENV_BYTE_ORDER: &str = "ROWSTORE_BYTE_ORDER";

/// Dataset-wide policy handed to the container and every table it owns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Directory holding `MANIFEST` and the per-table files.
    pub directory: PathBuf,
    /// When `false`, loads append rows without the duplicate-key check.
    pub check_row_uniqueness: bool,
    /// When `true`, opening a dataset only records declared sizes.
    pub load_on_demand: bool,
    /// Canonical on-disk form for tables: binary sidecar or plain XML.
    pub file_as_bin: bool,
    /// Byte order for binary sidecars.
    pub byte_order: ByteOrder,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            directory: PathBuf::from("dataset"),
            check_row_uniqueness: true,
            load_on_demand: true,
            file_as_bin: false,
            byte_order: ByteOrder::Machine,
        }
    }
}

impl StoreConfig {
    /// Convenience constructor: defaults with a specific directory.
    pub fn in_dir(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
            ..Self::default()
        }
    }

    /// Reads the settings from the process environment.
    pub fn from_env() -> Result<Self, StreamError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the settings through `lookup`, which maps a variable name to
    /// its value. `from_env` passes `std::env::var`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, StreamError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let flag = |key: &str, default: bool| {
            lookup(key)
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(default)
        };

        let byte_order = match lookup(ENV_BYTE_ORDER) {
            None => defaults.byte_order,
            Some(v) if v.trim().eq_ignore_ascii_case("machine") => ByteOrder::Machine,
            Some(v) => v.parse()?,
        };

        Ok(Self {
            directory: lookup(ENV_DIR)
                .map(PathBuf::from)
                .unwrap_or(defaults.directory),
            check_row_uniqueness: flag(ENV_CHECK_UNIQUE, defaults.check_row_uniqueness),
            load_on_demand: flag(ENV_LAZY, defaults.load_on_demand),
            file_as_bin: flag(ENV_BINARY, defaults.file_as_bin),
            byte_order,
        })
    }
}
