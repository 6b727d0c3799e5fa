use std::path::{Path, PathBuf};

use bytestream::ByteOrder;
use config::StoreConfig;

use crate::error::TableError;
use crate::field::Attributes;
use crate::key::TableKey;
use crate::types::Entity;
use crate::{Residency, Table};

/// Entity type name of the container document.
pub const CONTAINER_TYPE_NAME: &str = "ASDM";

/// The owner of a dataset's tables: its identity, directory and policies.
///
/// Tables hold it behind an `Arc` and only read from it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Container {
    entity: Entity,
    directory: PathBuf,
    check_row_uniqueness: bool,
    load_on_demand: bool,
    file_as_bin: bool,
    byte_order: ByteOrder,
}

impl Container {
    pub fn new(entity_id: &str, config: &StoreConfig) -> Self {
        Self {
            entity: Entity::new(entity_id, CONTAINER_TYPE_NAME),
            directory: config.directory.clone(),
            check_row_uniqueness: config.check_row_uniqueness,
            load_on_demand: config.load_on_demand,
            file_as_bin: config.file_as_bin,
            byte_order: config.byte_order,
        }
    }

    #[must_use]
    pub fn entity(&self) -> &Entity {
        &self.entity
    }

    /// Base directory of the dataset.
    #[must_use]
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// When `false`, loads do not look for duplicate keys.
    #[must_use]
    pub fn check_row_uniqueness(&self) -> bool {
        self.check_row_uniqueness
    }

    #[must_use]
    pub fn load_on_demand(&self) -> bool {
        self.load_on_demand
    }

    /// Canonical on-disk form of newly created tables.
    #[must_use]
    pub fn file_as_bin(&self) -> bool {
        self.file_as_bin
    }

    /// Byte order of binary sidecars written by the tables.
    #[must_use]
    pub fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }
}

/// Type-erased view of a table, for code that walks every table of a
/// dataset regardless of its row type.
pub trait TableHandle: std::fmt::Debug {
    fn name(&self) -> &str;
    fn size(&self) -> usize;
    fn residency(&self) -> Residency;
    fn file_as_bin(&self) -> bool;
    fn set_file_as_bin(&mut self, on: bool);
    fn declare_on_disk(&mut self, declared: usize);
    fn load(&mut self) -> Result<(), TableError>;
    fn to_xml(&mut self) -> Result<String, TableError>;
    /// Returns the number of rows written.
    fn to_file(&mut self, directory: &Path) -> Result<usize, TableError>;
}

impl<K: TableKey, V: Attributes> TableHandle for Table<K, V> {
    fn name(&self) -> &str {
        Table::name(self)
    }

    fn size(&self) -> usize {
        Table::size(self)
    }

    fn residency(&self) -> Residency {
        Table::residency(self)
    }

    fn file_as_bin(&self) -> bool {
        Table::file_as_bin(self)
    }

    fn set_file_as_bin(&mut self, on: bool) {
        Table::set_file_as_bin(self, on);
    }

    fn declare_on_disk(&mut self, declared: usize) {
        Table::declare_on_disk(self, declared);
    }

    fn load(&mut self) -> Result<(), TableError> {
        self.ensure_loaded()
    }

    fn to_xml(&mut self) -> Result<String, TableError> {
        Table::to_xml(self)
    }

    fn to_file(&mut self, directory: &Path) -> Result<usize, TableError> {
        Table::to_file(self, directory)
    }
}
