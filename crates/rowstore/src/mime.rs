//! Binary table documents wrapped in a MIME multipart envelope.
//!
//! ```text
//! MIME-Version: 1.0 ... alma-uid:<uid>
//!
//! --MIME_boundary
//! Content-Type: text/xml ...
//! Content-ID: <header.xml>
//!
//! <NameTable ...>            byte order and attribute order
//!   <BulkStoreRef .../>
//!   <Attributes><a/>...</Attributes>
//! </NameTable>
//! --MIME_boundary
//! Content-Type: binary/octet-stream
//! Content-ID: <content.bin>
//!
//! entity | container entity | i32 row count | row 0 | row 1 | ...
//! --MIME_boundary--
//! ```
//!
//! Documents written before the header carried its own layout have an
//! `<ASDMBinaryTable>` root instead; they are big-endian and list their
//! attributes in the table's legacy order.

use bytestream::{ByteOrder, EndianReader, EndianWriter, StreamError};
use tagparser::TagParser;
use tracing::{info, warn};

use crate::error::TableError;
use crate::field::Attributes;
use crate::key::TableKey;
use crate::row::Row;
use crate::types::Entity;
use crate::Table;

/// Marker ending the MIME headers of the XML part.
pub const XML_PART_HEADER: &str = "Content-ID: <header.xml>\n\n";
/// [`XML_PART_HEADER`] as written by producers using CRLF line ends.
pub const XML_PART_HEADER_CRLF: &str = "Content-ID: <header.xml>\r\n\r\n";
/// Boundary and headers introducing the binary part.
pub const BINARY_PART_HEADER: &str =
    "--MIME_boundary\nContent-Type: binary/octet-stream\nContent-ID: <content.bin>\n\n";
/// Closing boundary of the envelope.
pub const MIME_CLOSING: &str = "\n--MIME_boundary--\n";

const LEGACY_ROOT: &str = "<ASDMBinaryTable";
const LEGACY_VERSION: &str = "2";

/// Byte order, attribute order and schema version announced by an XML part.
struct BinaryLayout {
    byte_order: ByteOrder,
    attributes: Vec<String>,
    version: Option<String>,
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| from + i)
}

impl<K: TableKey, V: Attributes> Table<K, V> {
    /// The XML part of the envelope. It is also what [`Table::to_file`]
    /// writes to `<Name>.xml` for a binary table.
    #[must_use]
    pub fn mime_xml_part(&self, byte_order: ByteOrder) -> String {
        let mut out = String::from("<?xml version='1.0'  encoding='ISO-8859-1'?>\n");
        out.push_str(&self.schema.root_open_tag());
        out.push('\n');
        out.push_str(&self.entity.to_xml());
        out.push('\n');
        out.push_str(&self.container.entity().to_xml_element("ContainerEntity"));
        out.push('\n');
        out.push_str(&format!(
            "<BulkStoreRef file_id='{}' byteOrder='{}' />\n",
            tagparser::escape(self.entity.id_without_scheme()),
            byte_order,
        ));
        out.push_str("<Attributes>\n");
        for name in &self.schema.attribute_names {
            out.push('<');
            out.push_str(name);
            out.push_str("/>\n");
        }
        out.push_str("</Attributes>\n</");
        out.push_str(&self.schema.table_name());
        out.push_str(">\n");
        out
    }

    /// Serializes the table as a MIME envelope whose binary part uses
    /// `byte_order`, loading the table first if needed.
    pub fn to_mime(&mut self, byte_order: ByteOrder) -> Result<Vec<u8>, TableError> {
        self.ensure_loaded()?;
        let byte_order = byte_order.resolve();
        let count = i32::try_from(self.rows.len()).map_err(|_| {
            TableError::conversion(self.name(), "too many rows for a binary document")
        })?;

        let mut w = EndianWriter::with_capacity(byte_order, 64 * self.rows.len() + 1024);
        let headers = format!(
            "MIME-Version: 1.0\n\
             Content-Type: Multipart/Related; boundary='MIME_boundary'; type='text/xml'; start= '<header.xml>'\n\
             Content-Description: Correlator\n\
             alma-uid:{}\n\
             \n\
             --MIME_boundary\n\
             Content-Type: text/xml; charset='ISO-8859-1'\n\
             Content-Transfer-Encoding: 8bit\n\
             {XML_PART_HEADER}",
            self.entity.entity_id,
        );
        w.write_raw(headers.as_bytes());
        w.write_raw(self.mime_xml_part(byte_order).as_bytes());
        w.write_raw(BINARY_PART_HEADER.as_bytes());

        w.write(&self.entity);
        w.write(self.container.entity());
        w.write_i32(count);
        for row in &self.rows {
            row.to_binary(&mut w);
        }
        w.write_raw(MIME_CLOSING.as_bytes());
        Ok(w.into_bytes())
    }

    /// Replaces the table's identity and adds every row of a MIME envelope.
    ///
    /// The number of rows read is the size declared by the dataset manifest
    /// when there is one; a different count embedded in the document is
    /// reported and ignored. Like [`Table::from_xml`], the load is
    /// all-or-nothing.
    pub fn set_from_mime(&mut self, message: &[u8]) -> Result<(), TableError> {
        let name = self.schema.name.clone();
        let conversion = |msg: String| TableError::conversion(&name, msg);

        let (header_start, header_len) = match find(message, XML_PART_HEADER.as_bytes(), 0) {
            Some(at) => (at, XML_PART_HEADER.len()),
            None => find(message, XML_PART_HEADER_CRLF.as_bytes(), 0)
                .map(|at| (at, XML_PART_HEADER_CRLF.len()))
                .ok_or_else(|| {
                    conversion("Failed to detect the beginning of the XML header".to_string())
                })?,
        };
        let header_start = header_start + header_len;
        let binary_start = find(message, BINARY_PART_HEADER.as_bytes(), header_start)
            .ok_or_else(|| {
                conversion("Failed to detect the beginning of the binary part".to_string())
            })?;

        let header = std::str::from_utf8(&message[header_start..binary_start])
            .map_err(|e| conversion(format!("the XML header is not valid text: {e}")))?;
        let layout = self.binary_layout(header)?;

        let mut r = EndianReader::new(
            &message[binary_start + BINARY_PART_HEADER.len()..],
            layout.byte_order,
        );
        let stream = |e: StreamError| TableError::stream(&name, e);
        let entity: Entity = r.read().map_err(stream)?;
        let _container: Entity = r.read().map_err(stream)?;
        let embedded = r.read_i32().map_err(stream)?;

        let count = match self.declared_size {
            Some(declared) => {
                if embedded != -1 && usize::try_from(embedded).ok() != Some(declared) {
                    warn!(
                        table = %name,
                        embedded,
                        declared,
                        "row count in the binary document differs from the declared size; using the declared size"
                    );
                }
                declared
            }
            None => usize::try_from(embedded).map_err(|_| {
                conversion(format!("the binary document declares {embedded} rows"))
            })?,
        };

        let mut staged = self.staging();
        let check = self.container.check_row_uniqueness();
        for _ in 0..count {
            let row = Row::from_binary(
                &mut r,
                &staged.schema,
                &layout.attributes,
                &staged.unknown_readers,
            )?;
            let added = if check {
                staged.check_and_add(row).map(|_| ())
            } else {
                staged.append(row).map(|_| ())
            };
            added.map_err(|e| conversion(format!("error while reading binary data: {e}")))?;
        }

        staged.entity = entity;
        if let Some(version) = layout.version {
            staged.version = version;
        }
        staged.archive_as_bin = true;
        staged.file_as_bin = true;
        let rows = staged.rows.len();
        self.commit(staged);
        info!(
            table = %name,
            rows,
            format = "binary",
            byte_order = %layout.byte_order,
            "table loaded"
        );
        Ok(())
    }

    /// Reads the XML part of an envelope.
    fn binary_layout(&self, header: &str) -> Result<BinaryLayout, TableError> {
        let table_name = self.schema.table_name();
        let invalid = |detail: String| {
            TableError::conversion(&self.schema.name, format!("Invalid XML header: {detail}"))
        };

        let mut p = TagParser::new(header);
        if p.is_prefix(LEGACY_ROOT) {
            return Ok(BinaryLayout {
                byte_order: ByteOrder::BigEndian,
                attributes: self
                    .schema
                    .legacy_order
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
                version: Some(LEGACY_VERSION.to_string()),
            });
        }
        if !p.is_prefix(&format!("<{table_name}")) {
            return Err(invalid(format!(
                "the root element is neither <{table_name}> nor <ASDMBinaryTable>"
            )));
        }

        let root = p.take_until(">").map_err(|e| invalid(e.to_string()))?;
        let version =
            tagparser::attribute(root, "schemaVersion").map_err(|e| invalid(e.to_string()))?;

        let bulk_store_ref = p
            .element_attribute_block("<BulkStoreRef", "/>")
            .map_err(|e| invalid(e.to_string()))?
            .ok_or_else(|| {
                invalid(format!("could not find the element '/{table_name}/BulkStoreRef'"))
            })?;
        let token = tagparser::attribute(bulk_store_ref, "byteOrder")
            .map_err(|e| invalid(e.to_string()))?
            .ok_or_else(|| {
                invalid(format!(
                    "could not find the element '/{table_name}/BulkStoreRef/@byteOrder'"
                ))
            })?;
        let byte_order: ByteOrder = token
            .parse()
            .map_err(|e: StreamError| invalid(e.to_string()))?;

        let names = p
            .element_content("<Attributes>", "</Attributes>")
            .map_err(|e| invalid(e.to_string()))?
            .ok_or_else(|| {
                invalid(format!("could not find the element '/{table_name}/Attributes'"))
            })?;
        let attributes = tagparser::empty_element_names(names)
            .map_err(|e| invalid(e.to_string()))?
            .into_iter()
            .map(str::to_string)
            .collect();

        Ok(BinaryLayout {
            byte_order,
            attributes,
            version,
        })
    }
}
