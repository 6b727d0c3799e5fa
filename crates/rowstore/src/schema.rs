use crate::field::Attributes;

/// Namespace under which table documents are published.
pub const SCHEMA_NAMESPACE: &str = "http://Alma/XASDM";
/// Location prefix of the published XSD files.
pub const SCHEMA_LOCATION: &str = "http://almaobservatory.org/XML/XASDM";

/// Immutable description of one table type, built once and shared by the
/// table and every row it creates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSchema {
    /// Entity name without the `Table` suffix, e.g. `CalFocus`.
    pub name: String,
    /// Namespace prefix used in the document root, e.g. `clfcs`.
    pub xmlns_prefix: String,
    pub schema_version: String,
    pub schema_revision: String,
    /// Key attribute names in order.
    pub key_names: Vec<&'static str>,
    /// Key then value attribute names: the order rows are written in.
    pub attribute_names: Vec<&'static str>,
    /// Attribute order assumed for legacy binary documents, which carry no
    /// `Attributes` header.
    pub legacy_order: Vec<&'static str>,
}

impl TableSchema {
    /// Schema of a table whose rows have key `K` and values `V`.
    pub fn of<K: Attributes, V: Attributes>(
        name: &str,
        xmlns_prefix: &str,
        schema_version: &str,
        schema_revision: &str,
    ) -> Self {
        let attribute_names: Vec<&'static str> =
            K::NAMES.iter().chain(V::NAMES).copied().collect();
        Self {
            name: name.to_string(),
            xmlns_prefix: xmlns_prefix.to_string(),
            schema_version: schema_version.to_string(),
            schema_revision: schema_revision.to_string(),
            key_names: K::NAMES.to_vec(),
            legacy_order: attribute_names.clone(),
            attribute_names,
        }
    }

    /// Overrides the legacy binary attribute order.
    #[must_use]
    pub fn with_legacy_order(mut self, order: &[&'static str]) -> Self {
        self.legacy_order = order.to_vec();
        self
    }

    /// Root element and entity type name: `<name>Table`.
    #[must_use]
    pub fn table_name(&self) -> String {
        format!("{}Table", self.name)
    }

    #[must_use]
    pub fn knows_attribute(&self, name: &str) -> bool {
        self.attribute_names.contains(&name)
    }

    /// Opening tag of a table document, without the `<?xml` declaration.
    #[must_use]
    pub fn root_open_tag(&self) -> String {
        let table = self.table_name();
        format!(
            "<{table} xmlns:xsi=\"http://www.w3.org/2001/XMLSchema-instance\" \
             xmlns:{prefix}=\"{ns}/{table}\" \
             xsi:schemaLocation=\"{ns}/{table} {loc}/{version}/{table}.xsd\" \
             schemaVersion=\"{version}\" schemaRevision=\"{revision}\">",
            prefix = self.xmlns_prefix,
            ns = SCHEMA_NAMESPACE,
            loc = SCHEMA_LOCATION,
            version = self.schema_version,
            revision = self.schema_revision,
        )
    }
}
