//! Whole-table XML documents.
//!
//! ```text
//! <?xml version="1.0" encoding="ISO-8859-1"?> <NameTable xmlns:... schemaVersion=".." schemaRevision="..">
//! <Entity entityId='..' .../>
//! <ContainerEntity entityId='..' .../>
//! <row>
//! <attr>..</attr>
//! </row>
//! ...
//! </NameTable>
//! ```

use tagparser::TagParser;
use tracing::{info, warn};

use crate::error::TableError;
use crate::field::Attributes;
use crate::key::TableKey;
use crate::row::Row;
use crate::types::Entity;
use crate::Table;

/// Declaration opening every table document.
pub(crate) const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?> ";

impl<K: TableKey, V: Attributes> Table<K, V> {
    /// Renders the whole table as an XML document, loading it first if
    /// needed.
    ///
    /// A row holding text that XML cannot carry is left out of the document
    /// and reported with a warning; the remaining rows are still written.
    pub fn to_xml(&mut self) -> Result<String, TableError> {
        self.render_xml().map(|(document, _)| document)
    }

    /// The XML document and the number of rows it holds.
    pub(crate) fn render_xml(&mut self) -> Result<(String, usize), TableError> {
        self.ensure_loaded()?;

        let mut out = String::from(XML_DECLARATION);
        out.push_str(&self.schema.root_open_tag());
        out.push('\n');
        out.push_str(&self.entity.to_xml());
        out.push('\n');
        out.push_str(&self.container.entity().to_xml_element("ContainerEntity"));
        out.push('\n');

        let mut written = 0;
        for (index, row) in self.rows.iter().enumerate() {
            match row.to_xml_fragment() {
                Ok(fragment) => {
                    out.push_str(&fragment);
                    written += 1;
                }
                Err(err) => warn!(table = %self.name(), index, error = %err, "skipping row"),
            }
        }

        out.push_str("</");
        out.push_str(&self.schema.table_name());
        out.push_str("> ");
        Ok((out, written))
    }

    /// Replaces the table's identity and adds every row of `document`.
    ///
    /// The load is all-or-nothing: any problem with the document, including
    /// a duplicate key among its rows, leaves the table untouched and is
    /// reported as [`TableError::Conversion`].
    pub fn from_xml(&mut self, document: &str) -> Result<(), TableError> {
        let table_name = self.schema.table_name();
        let invalid = |detail: String| {
            TableError::conversion(&self.schema.name, format!("Invalid xml document: {detail}"))
        };

        let mut p = TagParser::new(document);
        if !p.is_prefix(&format!("<{table_name}")) {
            return Err(invalid(format!("missing root element <{table_name}>")));
        }
        let root = p.take_until(">").map_err(|e| invalid(e.to_string()))?;
        let version =
            tagparser::attribute(root, "schemaVersion").map_err(|e| invalid(e.to_string()))?;

        let entity = p
            .element_attribute_block("<Entity", "/>")
            .map_err(|e| invalid(e.to_string()))?
            .ok_or_else(|| invalid("missing Entity element".to_string()))?;
        let entity =
            Entity::from_attribute_block(entity).map_err(|e| invalid(format!("Entity: {e}")))?;
        if entity.entity_type_name != table_name {
            return Err(invalid(format!(
                "entity type name '{}' does not match '{table_name}'",
                entity.entity_type_name
            )));
        }

        let container = p
            .element_attribute_block("<ContainerEntity", "/>")
            .map_err(|e| invalid(e.to_string()))?
            .ok_or_else(|| invalid("missing ContainerEntity element".to_string()))?;
        Entity::from_attribute_block(container)
            .map_err(|e| invalid(format!("ContainerEntity: {e}")))?;

        let mut staged = self.staging();
        if let Some(version) = version {
            staged.version = version;
        }
        let check = self.container.check_row_uniqueness();

        while let Some(fragment) = p
            .element_content("<row>", "</row>")
            .map_err(|e| invalid(e.to_string()))?
        {
            let row = Row::from_xml_fragment(&staged.schema, fragment)
                .map_err(|e| invalid(e.to_string()))?;
            let added = if check {
                staged.check_and_add(row).map(|_| ())
            } else {
                staged.add_without_checking_unique(row)
            };
            added.map_err(|e| TableError::conversion(&self.schema.name, e.to_string()))?;
        }

        if !p.is_prefix(&format!("</{table_name}>")) {
            return Err(invalid(format!("missing closing tag </{table_name}>")));
        }

        staged.entity = entity;
        staged.archive_as_bin = false;
        staged.file_as_bin = false;
        let rows = staged.rows.len();
        self.commit(staged);
        info!(table = %self.name(), rows, format = "xml", "table loaded");
        Ok(())
    }
}
