use crate::error::TableError;
use crate::field::Attributes;
use crate::key::TableKey;
use crate::row::Row;
use crate::{Residency, Table};

impl<K: TableKey, V: Attributes> Table<K, V> {
    /// Number of rows. A table whose rows are still on disk reports its
    /// declared size without loading.
    #[must_use]
    pub fn size(&self) -> usize {
        match self.residency {
            Residency::Resident => self.rows.len(),
            Residency::OnDisk | Residency::Loading => self.declared_size.unwrap_or(0),
        }
    }

    /// All rows, loading them first if needed. Interval tables return them
    /// sorted by start time, other tables in insertion order.
    pub fn get(&mut self) -> Result<&[Row<K, V>], TableError> {
        self.ensure_loaded()?;
        Ok(&self.rows)
    }

    /// The rows currently in memory, without triggering a load.
    #[must_use]
    pub fn rows(&self) -> &[Row<K, V>] {
        &self.rows
    }

    /// The first row matching `key`.
    ///
    /// For interval tables a row matches when its interval contains the
    /// start of `key`'s interval.
    pub fn get_row_by_key(&mut self, key: &K) -> Result<Option<&Row<K, V>>, TableError> {
        self.ensure_loaded()?;
        Ok(self.find_by_key(key).map(|i| &self.rows[i]))
    }

    /// Like [`Table::get_row_by_key`], for updating the values of the row.
    pub fn get_row_by_key_mut(
        &mut self,
        key: &K,
    ) -> Result<Option<&mut Row<K, V>>, TableError> {
        self.ensure_loaded()?;
        Ok(self.find_by_key(key).map(|i| &mut self.rows[i]))
    }

    /// The first row equal to `key` and `value` on every attribute.
    pub fn lookup(&mut self, key: &K, value: &V) -> Result<Option<&Row<K, V>>, TableError> {
        self.ensure_loaded()?;
        Ok(self
            .rows
            .iter()
            .find(|r| r.key() == key && r.value() == value))
    }
}
