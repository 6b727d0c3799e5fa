//! Value types shared by every table: instants, intervals, tags and the
//! entity identity block.

use std::fmt;

use bytestream::{BinaryCodec, EndianReader, EndianWriter, StreamError};

use crate::error::FieldError;
use crate::field::{XmlScalar, XmlText};

/// An instant, in nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct ArrayTime(pub i64);

impl ArrayTime {
    #[must_use]
    pub fn nanos(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ArrayTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl XmlText for ArrayTime {
    fn write_text(&self, out: &mut String) {
        self.0.write_text(out);
    }

    fn parse_text(text: &str) -> Result<Self, String> {
        i64::parse_text(text).map(ArrayTime)
    }
}

impl XmlScalar for ArrayTime {}

impl BinaryCodec for ArrayTime {
    fn encode(&self, w: &mut EndianWriter) {
        w.write_i64(self.0);
    }

    fn decode(r: &mut EndianReader<'_>) -> Result<Self, StreamError> {
        r.read_i64().map(ArrayTime)
    }
}

/// A half-open time span `[start, start + duration)`, durations in
/// nanoseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct TimeInterval {
    pub start: ArrayTime,
    pub duration: i64,
}

impl TimeInterval {
    pub fn new(start: i64, duration: i64) -> Self {
        Self {
            start: ArrayTime(start),
            duration,
        }
    }

    #[must_use]
    pub fn end(&self) -> ArrayTime {
        ArrayTime(self.start.0.saturating_add(self.duration))
    }

    /// True when `t` lies in `[start, end)`.
    #[must_use]
    pub fn contains(&self, t: ArrayTime) -> bool {
        self.start <= t && t < self.end()
    }

    /// True when the two spans share at least one instant.
    #[must_use]
    pub fn overlaps(&self, other: &TimeInterval) -> bool {
        self.start < other.end() && other.start < self.end()
    }
}

impl fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.start, self.end())
    }
}

impl XmlText for TimeInterval {
    fn write_text(&self, out: &mut String) {
        self.start.write_text(out);
        out.push(' ');
        self.duration.write_text(out);
    }

    fn parse_text(text: &str) -> Result<Self, String> {
        let mut parts = text.split_whitespace();
        let (Some(start), Some(duration), None) = (parts.next(), parts.next(), parts.next()) else {
            return Err(format!("expected 'start duration', found '{}'", text.trim()));
        };
        Ok(TimeInterval {
            start: ArrayTime::parse_text(start)?,
            duration: i64::parse_text(duration)?,
        })
    }
}

impl BinaryCodec for TimeInterval {
    fn encode(&self, w: &mut EndianWriter) {
        w.write_i64(self.start.0);
        w.write_i64(self.duration);
    }

    fn decode(r: &mut EndianReader<'_>) -> Result<Self, StreamError> {
        Ok(TimeInterval {
            start: ArrayTime(r.read_i64()?),
            duration: r.read_i64()?,
        })
    }
}

/// Opaque identifier of a row in another table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Tag(pub u64);

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl XmlText for Tag {
    fn write_text(&self, out: &mut String) {
        out.push_str(&self.0.to_string());
    }

    fn parse_text(text: &str) -> Result<Self, String> {
        let text = text.trim();
        text.parse()
            .map(Tag)
            .map_err(|_| format!("'{text}' is not a valid tag"))
    }
}

impl XmlScalar for Tag {}

impl BinaryCodec for Tag {
    fn encode(&self, w: &mut EndianWriter) {
        w.write_i64(self.0 as i64);
    }

    fn decode(r: &mut EndianReader<'_>) -> Result<Self, StreamError> {
        r.read_i64().map(|v| Tag(v as u64))
    }
}

/// Identity of a document: a table or the container that owns the tables.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Entity {
    pub entity_id: String,
    pub entity_id_encrypted: String,
    pub entity_type_name: String,
    pub entity_version: String,
    pub instance_version: String,
}

impl Entity {
    /// Default identity for a document of type `type_name`.
    pub fn new(entity_id: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            entity_id: entity_id.into(),
            entity_id_encrypted: "na".to_string(),
            entity_type_name: type_name.into(),
            entity_version: "1".to_string(),
            instance_version: "1".to_string(),
        }
    }

    /// The entity id without its `uid://` scheme, as used by `BulkStoreRef`.
    #[must_use]
    pub fn id_without_scheme(&self) -> &str {
        self.entity_id
            .strip_prefix("uid://")
            .unwrap_or(&self.entity_id)
    }

    /// `<Entity .../>`
    #[must_use]
    pub fn to_xml(&self) -> String {
        self.to_xml_element("Entity")
    }

    /// The same attributes under another element name (`ContainerEntity`).
    #[must_use]
    pub fn to_xml_element(&self, element: &str) -> String {
        format!(
            "<{element} entityId='{}' entityIdEncrypted='{}' entityTypeName='{}' schemaVersion='{}' documentVersion='{}'/>",
            tagparser::escape(&self.entity_id),
            tagparser::escape(&self.entity_id_encrypted),
            tagparser::escape(&self.entity_type_name),
            tagparser::escape(&self.entity_version),
            tagparser::escape(&self.instance_version),
        )
    }

    /// Reads the attribute list of an `<Entity .../>` element. `entityId`
    /// and `entityTypeName` are required.
    pub fn from_attribute_block(block: &str) -> Result<Self, FieldError> {
        let mut entity = Entity::default();
        for (name, value) in tagparser::attributes(block)? {
            match name {
                "entityId" => entity.entity_id = value,
                "entityIdEncrypted" => entity.entity_id_encrypted = value,
                "entityTypeName" => entity.entity_type_name = value,
                "schemaVersion" => entity.entity_version = value,
                "documentVersion" => entity.instance_version = value,
                _ => {}
            }
        }
        for (name, value) in [
            ("entityId", &entity.entity_id),
            ("entityTypeName", &entity.entity_type_name),
        ] {
            if value.is_empty() {
                return Err(FieldError::Missing {
                    name: name.to_string(),
                });
            }
        }
        Ok(entity)
    }
}

impl BinaryCodec for Entity {
    fn encode(&self, w: &mut EndianWriter) {
        w.write_string(&self.entity_id);
        w.write_string(&self.entity_id_encrypted);
        w.write_string(&self.entity_type_name);
        w.write_string(&self.entity_version);
        w.write_string(&self.instance_version);
    }

    fn decode(r: &mut EndianReader<'_>) -> Result<Self, StreamError> {
        Ok(Entity {
            entity_id: r.read_string()?,
            entity_id_encrypted: r.read_string()?,
            entity_type_name: r.read_string()?,
            entity_version: r.read_string()?,
            instance_version: r.read_string()?,
        })
    }
}
