use crate::error::TableError;
use crate::field::Attributes;
use crate::key::TableKey;
use crate::row::Row;
use crate::Table;

impl<K: TableKey, V: Attributes> Table<K, V> {
    /// A default-valued row belonging to this table, not yet added.
    #[must_use]
    pub fn new_row(&self) -> Row<K, V> {
        Row::new(self.schema.clone(), K::default(), V::default())
    }

    /// A row with the given attributes, not yet added.
    #[must_use]
    pub fn new_row_with(&self, key: K, value: V) -> Row<K, V> {
        Row::new(self.schema.clone(), key, value)
    }

    /// A detached copy of `row`, whose key may be changed before adding it.
    #[must_use]
    pub fn new_row_from(&self, row: &Row<K, V>) -> Row<K, V> {
        row.detached()
    }

    /// Adds `row`, failing with [`TableError::DuplicateKey`] when a stored
    /// row matches its key. Returns the stored row.
    pub fn add(&mut self, row: Row<K, V>) -> Result<&Row<K, V>, TableError> {
        self.ensure_loaded()?;
        if self.find_by_key(row.key()).is_some() {
            return Err(self.duplicate(row.key()));
        }
        let index = self.place(row)?;
        Ok(&self.rows[index])
    }

    /// Insertion used by loads when the container enforces uniqueness.
    /// Same contract as [`Table::add`].
    pub fn check_and_add(&mut self, row: Row<K, V>) -> Result<&Row<K, V>, TableError> {
        self.add(row)
    }

    /// Insertion used by XML loads when the container does not enforce
    /// uniqueness. A row whose key is already stored still fails, as the
    /// table would otherwise hold two rows for one key.
    pub fn add_without_checking_unique(&mut self, row: Row<K, V>) -> Result<(), TableError> {
        self.add(row).map(|_| ())
    }

    /// Appends `row` with no key check and no ordering.
    pub fn append(&mut self, mut row: Row<K, V>) -> Result<&Row<K, V>, TableError> {
        self.ensure_loaded()?;
        row.mark_added();
        self.rows.push(row);
        Ok(&self.rows[self.rows.len() - 1])
    }
}
