//! # Rowstore - typed tables with XML and binary persistence
//!
//! A [`Table`] owns an ordered collection of [`Row`]s, each made of a key
//! tuple and a value tuple. Tables are stored one file pair per table in a
//! dataset directory and can be read back lazily.
//!
//! ## Architecture
//!
//! ```text
//!            Container (directory, entity, uniqueness policy)
//!                |
//!                v
//! ┌─────────────────────────────────────────────────┐
//! │                    TABLE                        │
//! │                                                 │
//! │ write.rs → key check → TableKey::place          │
//! │ read.rs  → (lazy load) → linear scan            │
//! │                                                 │
//! │ xml.rs   ⇄ <NameTable> document                 │
//! │ mime.rs  ⇄ MIME envelope, XML header + binary   │
//! │ file.rs  ⇄ <Name>.xml / <Name>.bin              │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module         | Purpose                                              |
//! |----------------|------------------------------------------------------|
//! | [`lib.rs`]     | `Table` struct, constructor, accessors, staging      |
//! | [`write`]      | row factories, `add`, `check_and_add`, `append`      |
//! | [`read`]       | `get`, `get_row_by_key`, `lookup`, `size`            |
//! | [`xml`]        | `to_xml`, `from_xml`                                 |
//! | [`mime`]       | `to_mime`, `set_from_mime`                           |
//! | [`file`]       | `to_file`, `set_from_file`, lazy load                |
//! | [`interval`]   | time-interval keys and ordered insertion             |
//! | [`field`]      | per-attribute XML text and binary codecs             |
//!
//! ## Residency
//!
//! ```text
//! new() ───────────────────────────────► Resident
//! declare_on_disk(n) ──► OnDisk ──(first access)──► Loading ──► Resident
//!                          ▲                          │
//!                          └──────── load failed ─────┘
//! ```
//!
//! While `OnDisk`, [`Table::size`] answers with the declared size without
//! reading anything. Every load decodes into a staging copy of the table
//! and commits only when the whole document was accepted, so a failed load
//! leaves the table exactly as it was.

mod container;
mod error;
mod field;
mod file;
mod interval;
mod key;
mod mime;
mod read;
mod row;
mod schema;
mod types;
mod write;
mod xml;

use std::fmt;
use std::sync::Arc;

pub use bytestream;
pub use container::{Container, TableHandle, CONTAINER_TYPE_NAME};
pub use error::{FieldError, TableError};
pub use field::{Attributes, Field, XmlScalar, XmlText};
pub use interval::{insert_by_start_time, IntervalTable, TimeIntervalKey};
pub use key::{Placement, TableKey};
pub use mime::{BINARY_PART_HEADER, MIME_CLOSING, XML_PART_HEADER, XML_PART_HEADER_CRLF};
pub use row::{Row, UnknownAttributeReader};
pub use schema::TableSchema;
pub use types::{ArrayTime, Entity, Tag, TimeInterval};

use row::UnknownReaders;

/// Entity id given to tables and containers that have none yet.
pub const DEFAULT_ENTITY_ID: &str = "uid://X0/X0/X0";

/// Whether a table's rows are in memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Residency {
    /// Rows live on disk only; the size is the declared one.
    OnDisk,
    /// A load is running; nested triggers must not start another one.
    Loading,
    /// Rows are in memory.
    Resident,
}

/// A homogeneous collection of rows keyed by `K`, with values `V`.
///
/// # Insertion
///
/// [`Table::add`] refuses a row whose key matches a stored row and
/// otherwise lets the key type decide where the row goes: plain keys append,
/// [`TimeIntervalKey`] keeps rows sorted and non-overlapping.
///
/// # Loading
///
/// Loads honour the container's uniqueness policy: with it on, rows are
/// inserted with the duplicate check and a collision aborts the load. With
/// it off, binary rows are appended as they come, while XML loads still
/// refuse duplicate keys.
pub struct Table<K, V> {
    pub(crate) schema: Arc<TableSchema>,
    pub(crate) container: Arc<Container>,
    pub(crate) entity: Entity,
    pub(crate) rows: Vec<Row<K, V>>,
    /// Schema version of the most recently parsed document.
    pub(crate) version: String,
    pub(crate) archive_as_bin: bool,
    pub(crate) file_as_bin: bool,
    pub(crate) residency: Residency,
    /// Row count announced by the dataset manifest for the pending load.
    pub(crate) declared_size: Option<usize>,
    pub(crate) unknown_readers: UnknownReaders,
}

impl<K, V> fmt::Debug for Table<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Table")
            .field("name", &self.schema.name)
            .field("entity_id", &self.entity.entity_id)
            .field("residency", &self.residency)
            .field("rows", &self.rows.len())
            .field("declared_size", &self.declared_size)
            .field("version", &self.version)
            .field("file_as_bin", &self.file_as_bin)
            .field("unknown_readers", &self.unknown_readers.len())
            .finish()
    }
}

impl<K: TableKey, V: Attributes> Table<K, V> {
    /// Creates an empty, resident table owned by `container`.
    pub fn new(schema: TableSchema, container: Arc<Container>) -> Self {
        let entity = Entity::new(DEFAULT_ENTITY_ID, schema.table_name());
        Self {
            version: schema.schema_version.clone(),
            schema: Arc::new(schema),
            file_as_bin: container.file_as_bin(),
            container,
            entity,
            rows: Vec::new(),
            archive_as_bin: false,
            residency: Residency::Resident,
            declared_size: None,
            unknown_readers: UnknownReaders::new(),
        }
    }

    /// Turns the table into a handle on `declared` rows stored in the
    /// container's directory. Rows in memory are dropped; the next access
    /// loads them.
    pub fn declare_on_disk(&mut self, declared: usize) {
        self.rows.clear();
        self.declared_size = Some(declared);
        self.residency = Residency::OnDisk;
    }

    /// Entity name, e.g. `CalFocus`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.schema.name
    }

    #[must_use]
    pub fn schema(&self) -> &TableSchema {
        &self.schema
    }

    #[must_use]
    pub fn container(&self) -> &Container {
        &self.container
    }

    #[must_use]
    pub fn entity(&self) -> &Entity {
        &self.entity
    }

    pub fn set_entity(&mut self, entity: Entity) {
        self.entity = entity;
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    #[must_use]
    pub fn residency(&self) -> Residency {
        self.residency
    }

    #[must_use]
    pub fn is_resident(&self) -> bool {
        self.residency == Residency::Resident
    }

    #[must_use]
    pub fn declared_size(&self) -> Option<usize> {
        self.declared_size
    }

    /// True when the table was last read from a binary document.
    #[must_use]
    pub fn archive_as_bin(&self) -> bool {
        self.archive_as_bin
    }

    /// True when [`Table::to_file`] writes a binary sidecar.
    #[must_use]
    pub fn file_as_bin(&self) -> bool {
        self.file_as_bin
    }

    pub fn set_file_as_bin(&mut self, on: bool) {
        self.file_as_bin = on;
    }

    #[must_use]
    pub fn key_names(&self) -> &[&'static str] {
        &self.schema.key_names
    }

    #[must_use]
    pub fn attribute_names(&self) -> &[&'static str] {
        &self.schema.attribute_names
    }

    /// Attribute order assumed for binary documents without an
    /// `Attributes` header.
    #[must_use]
    pub fn default_binary_order(&self) -> &[&'static str] {
        &self.schema.legacy_order
    }

    /// Registers a decoder for binary attribute `name`, which the row type
    /// does not know.
    pub fn set_unknown_attribute_binary_reader(
        &mut self,
        name: &str,
        reader: UnknownAttributeReader,
    ) -> Result<(), TableError> {
        if self.schema.knows_attribute(name) {
            return Err(TableError::conversion(
                self.name(),
                format!(
                    "the attribute '{name}' is known, the way it is read cannot be overridden"
                ),
            ));
        }
        self.unknown_readers.insert(name.to_string(), reader);
        Ok(())
    }

    #[must_use]
    pub fn unknown_attribute_binary_reader(&self, name: &str) -> Option<&UnknownAttributeReader> {
        self.unknown_readers.get(name)
    }

    /// Loads the rows from the container's directory if they are only on
    /// disk. A trigger while a load is running returns at once.
    pub(crate) fn ensure_loaded(&mut self) -> Result<(), TableError> {
        if self.residency != Residency::OnDisk {
            return Ok(());
        }
        self.residency = Residency::Loading;
        let directory = self.container.directory().to_path_buf();
        let result = self.set_from_file(&directory);
        self.residency = match result {
            Ok(()) => Residency::Resident,
            Err(_) => Residency::OnDisk,
        };
        result
    }

    /// A resident copy of this table that a load can fill and then hand to
    /// [`Table::commit`].
    pub(crate) fn staging(&self) -> Self {
        Self {
            schema: Arc::clone(&self.schema),
            container: Arc::clone(&self.container),
            entity: self.entity.clone(),
            rows: self.rows.clone(),
            version: self.version.clone(),
            archive_as_bin: self.archive_as_bin,
            file_as_bin: self.file_as_bin,
            residency: Residency::Resident,
            declared_size: self.declared_size,
            unknown_readers: self.unknown_readers.clone(),
        }
    }

    pub(crate) fn commit(&mut self, staged: Self) {
        self.rows = staged.rows;
        self.entity = staged.entity;
        self.version = staged.version;
        self.archive_as_bin = staged.archive_as_bin;
        self.file_as_bin = staged.file_as_bin;
        self.residency = Residency::Resident;
        self.declared_size = None;
    }

    /// Index of the first stored row matching `key`.
    pub(crate) fn find_by_key(&self, key: &K) -> Option<usize> {
        self.rows.iter().position(|r| key.matches(r.key()))
    }

    /// Marks `row` as added and lets the key type store it.
    pub(crate) fn place(&mut self, mut row: Row<K, V>) -> Result<usize, TableError> {
        row.mark_added();
        K::place(&mut self.rows, row)
            .map(Placement::index)
            .map_err(|row| self.duplicate(row.key()))
    }

    pub(crate) fn duplicate(&self, key: &K) -> TableError {
        TableError::DuplicateKey {
            table: self.schema.name.clone(),
            key: format!("{key:?}"),
        }
    }
}

#[cfg(test)]
mod tests;
