use std::collections::HashMap;
use std::sync::Arc;

use bytestream::{EndianReader, EndianWriter, StreamError};

use crate::error::{FieldError, TableError};
use crate::field::Attributes;
use crate::key::TableKey;
use crate::schema::TableSchema;

/// Decoder for a binary attribute the row type does not know. It must
/// consume exactly the attribute's bytes.
pub type UnknownAttributeReader =
    Arc<dyn Fn(&str, &mut EndianReader<'_>) -> Result<(), StreamError> + Send + Sync>;

pub(crate) type UnknownReaders = HashMap<String, UnknownAttributeReader>;

/// One record of a table: a key tuple and a value tuple.
///
/// Rows are created by their table ([`Table::new_row`](crate::Table::new_row))
/// and keep a handle on the table's schema. Once a row has been added, its
/// key can no longer change; values stay mutable.
#[derive(Debug, Clone)]
pub struct Row<K, V> {
    schema: Arc<TableSchema>,
    key: K,
    value: V,
    added: bool,
}

impl<K: TableKey, V: Attributes> Row<K, V> {
    pub(crate) fn new(schema: Arc<TableSchema>, key: K, value: V) -> Self {
        Self {
            schema,
            key,
            value,
            added: false,
        }
    }

    pub fn key(&self) -> &K {
        &self.key
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn value_mut(&mut self) -> &mut V {
        &mut self.value
    }

    pub fn set_value(&mut self, value: V) {
        self.value = value;
    }

    /// Replaces the key of a row that is not yet owned by a table.
    pub fn set_key(&mut self, key: K) -> Result<(), TableError> {
        if self.added {
            return Err(TableError::KeyFrozen {
                table: self.schema.name.clone(),
            });
        }
        self.key = key;
        Ok(())
    }

    /// True once the row belongs to a table.
    #[must_use]
    pub fn is_added(&self) -> bool {
        self.added
    }

    #[must_use]
    pub fn table_name(&self) -> &str {
        &self.schema.name
    }

    /// Equality on the key tuple.
    #[must_use]
    pub fn compare_by_key(&self, other: &Self) -> bool {
        self.key == other.key
    }

    /// Equality on key and values.
    #[must_use]
    pub fn compare_by_value(&self, other: &Self) -> bool {
        self.key == other.key && self.value == other.value
    }

    /// Mutable key for the table's own placement logic.
    pub(crate) fn key_mut(&mut self) -> &mut K {
        &mut self.key
    }

    pub(crate) fn mark_added(&mut self) {
        self.added = true;
    }

    /// Detaches a copy of this row from any table.
    pub(crate) fn detached(&self) -> Self {
        Self {
            added: false,
            ..self.clone()
        }
    }

    /// Renders `<row>...</row>` with every attribute in canonical order.
    ///
    /// Fails with [`TableError::NoSuchRow`] when an attribute holds text
    /// that an XML 1.0 document cannot carry, or a value whose text form
    /// would not parse back (a ragged 2-D array).
    pub fn to_xml_fragment(&self) -> Result<String, TableError> {
        let unrenderable = |e: FieldError| TableError::NoSuchRow {
            table: self.schema.name.clone(),
            reason: e.to_string(),
        };
        let mut out = String::from("<row>\n");
        self.key.write_xml(&mut out).map_err(unrenderable)?;
        self.value.write_xml(&mut out).map_err(unrenderable)?;
        out.push_str("</row>\n");

        if let Some(c) = out.chars().find(|c| !is_xml_char(*c)) {
            return Err(TableError::NoSuchRow {
                table: self.schema.name.clone(),
                reason: format!("character U+{:04X} is not allowed in XML", u32::from(c)),
            });
        }
        Ok(out)
    }

    /// Parses the content of one `<row>` element.
    pub fn from_xml_fragment(
        schema: &Arc<TableSchema>,
        fragment: &str,
    ) -> Result<Self, TableError> {
        let key = K::read_xml(fragment)?;
        let value = V::read_xml(fragment)?;
        Ok(Self::new(Arc::clone(schema), key, value))
    }

    /// Writes key then value attributes, in the schema's attribute order.
    pub fn to_binary(&self, w: &mut EndianWriter) {
        self.key.write_bin(w);
        self.value.write_bin(w);
    }

    /// Reads one row whose attributes appear in the order `names`.
    ///
    /// Names the row type does not know are handed to the matching entry of
    /// `unknown`; a name with no registered reader cannot be skipped, since
    /// attributes carry no length, and fails the decode.
    pub(crate) fn from_binary(
        r: &mut EndianReader<'_>,
        schema: &Arc<TableSchema>,
        names: &[String],
        unknown: &UnknownReaders,
    ) -> Result<Self, TableError> {
        let mut key = K::default();
        let mut value = V::default();
        let stream = |e: StreamError| TableError::stream(&schema.name, e);

        for name in names {
            if key.read_bin_attribute(name, r).map_err(stream)? {
                continue;
            }
            if value.read_bin_attribute(name, r).map_err(stream)? {
                continue;
            }
            match unknown.get(name.as_str()) {
                Some(reader) => reader(name, r).map_err(stream)?,
                None => {
                    return Err(TableError::conversion(
                        &schema.name,
                        format!("there is no method to read an attribute '{name}'"),
                    ))
                }
            }
        }
        Ok(Self::new(Arc::clone(schema), key, value))
    }
}

fn is_xml_char(c: char) -> bool {
    matches!(c,
        '\t' | '\n' | '\r'
        | '\u{20}'..='\u{D7FF}'
        | '\u{E000}'..='\u{FFFD}'
        | '\u{10000}'..='\u{10FFFF}')
}
