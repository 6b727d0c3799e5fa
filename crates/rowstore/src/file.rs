//! Table files in a dataset directory.
//!
//! | Canonical form | `<Name>.xml`                         | `<Name>.bin`   |
//! |----------------|--------------------------------------|----------------|
//! | XML            | the whole table                      | not written    |
//! | binary         | the MIME XML part (`<BulkStoreRef>`) | MIME envelope  |

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::TableError;
use crate::field::Attributes;
use crate::key::TableKey;
use crate::Table;

impl<K: TableKey, V: Attributes> Table<K, V> {
    /// Path of the XML file of this table in `directory`.
    #[must_use]
    pub fn xml_path(&self, directory: &Path) -> PathBuf {
        directory.join(format!("{}.xml", self.name()))
    }

    /// Path of the binary file of this table in `directory`.
    #[must_use]
    pub fn bin_path(&self, directory: &Path) -> PathBuf {
        directory.join(format!("{}.bin", self.name()))
    }

    /// Writes the table to `directory`, creating it if needed. Binary tables
    /// use the container's byte order.
    ///
    /// Returns the number of rows written, which is smaller than
    /// [`Table::size`] when rows were skipped by [`Table::to_xml`].
    pub fn to_file(&mut self, directory: &Path) -> Result<usize, TableError> {
        self.ensure_loaded()?;
        fs::create_dir_all(directory).map_err(|e| {
            TableError::conversion(
                self.name(),
                format!("could not create directory {}: {e}", directory.display()),
            )
        })?;

        let xml_path = self.xml_path(directory);
        if self.file_as_bin {
            let byte_order = self.container.byte_order();
            let mime = self.to_mime(byte_order)?;
            write_file(self.name(), &self.bin_path(directory), &mime)?;
            write_file(
                self.name(),
                &xml_path,
                self.mime_xml_part(byte_order).as_bytes(),
            )?;
            Ok(self.rows.len())
        } else {
            let (xml, written) = self.render_xml()?;
            write_file(self.name(), &xml_path, xml.as_bytes())?;
            Ok(written)
        }
    }

    /// Loads the table from `directory`, preferring `<Name>.xml` over
    /// `<Name>.bin`.
    pub fn set_from_file(&mut self, directory: &Path) -> Result<(), TableError> {
        if self.xml_path(directory).exists() {
            self.set_from_xml_file(directory)
        } else if self.bin_path(directory).exists() {
            self.set_from_mime_file(directory)
        } else {
            Err(TableError::conversion(
                self.name(),
                format!(
                    "no file found for {} in {}",
                    self.name(),
                    directory.display()
                ),
            ))
        }
    }

    /// Loads `<Name>.xml`. A file that only references a binary document
    /// hands over to [`Table::set_from_mime_file`].
    pub fn set_from_xml_file(&mut self, directory: &Path) -> Result<(), TableError> {
        let path = self.xml_path(directory);
        debug!(table = %self.name(), path = %path.display(), "about to read");
        let document = fs::read_to_string(&path).map_err(|e| {
            TableError::conversion(
                self.name(),
                format!("could not read file {}: {e}", path.display()),
            )
        })?;

        if document.contains("<BulkStoreRef") {
            self.set_from_mime_file(directory)
        } else {
            self.from_xml(&document)
        }
    }

    /// Loads `<Name>.bin`.
    pub fn set_from_mime_file(&mut self, directory: &Path) -> Result<(), TableError> {
        let path = self.bin_path(directory);
        debug!(table = %self.name(), path = %path.display(), "about to read");
        let message = fs::read(&path).map_err(|e| {
            TableError::conversion(
                self.name(),
                format!("could not read file {}: {e}", path.display()),
            )
        })?;
        self.set_from_mime(&message)
    }
}

/// Writes `bytes` to `path` through a `.tmp` sibling that is synced and
/// renamed over the target. When the rename is refused the target is
/// overwritten in place.
fn write_file(table: &str, path: &Path, bytes: &[u8]) -> Result<(), TableError> {
    let failed = |what: &str, p: &Path, e: std::io::Error| {
        TableError::conversion(table, format!("could not {what} {}: {e}", p.display()))
    };

    let mut tmp_name = path.as_os_str().to_owned();
    tmp_name.push(".tmp");
    let tmp_path = PathBuf::from(tmp_name);
    {
        let mut f = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)
            .map_err(|e| failed("create file", &tmp_path, e))?;
        f.write_all(bytes)
            .and_then(|()| f.sync_all())
            .map_err(|e| failed("write file", &tmp_path, e))?;
    }

    if fs::rename(&tmp_path, path).is_err() {
        let mut f = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .map_err(|e| failed("open file", path, e))?;
        f.write_all(bytes)
            .and_then(|()| f.sync_all())
            .map_err(|e| failed("write file", path, e))?;
        let _ = fs::remove_file(&tmp_path);
    }
    Ok(())
}
