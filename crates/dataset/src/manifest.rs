//! # Manifest - declared table sizes
//!
//! Records the container identity and the row count of every table saved in
//! a dataset directory, so that a dataset can be opened without reading any
//! table file.
//!
//! ## File Format
//!
//! ```text
//! # Rowstore dataset manifest
//! # Format: entity:<container uid> | table:<name>:<rows>
//! entity:uid://A002/X1/X2
//! table:CalFocus:12
//! table:FlagCmd:0
//! ```
//!
//! Lines starting with `#` are comments. Empty lines are ignored.
//!
//! ## Crash Safety
//!
//! The manifest is rewritten through `MANIFEST.tmp`: write, fsync, then
//! rename over the existing file.

use anyhow::{anyhow, bail, Context, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// Name of the manifest file within the dataset directory.
pub const MANIFEST_FILENAME: &str = "MANIFEST";

/// Temporary file used during atomic manifest writes.
const MANIFEST_TMP_FILENAME: &str = "MANIFEST.tmp";

/// Declared size of one table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableEntry {
    /// Entity name of the table, e.g. `CalFocus`.
    pub name: String,
    pub rows: usize,
}

/// In-memory representation of the manifest.
#[derive(Debug, Clone)]
pub struct Manifest {
    path: PathBuf,
    /// Entity id of the container that owns the tables.
    pub container_id: Option<String>,
    /// Table entries, in file order.
    pub tables: Vec<TableEntry>,
}

impl Manifest {
    /// An empty manifest for `dir`; nothing is written until [`Manifest::save`].
    pub fn new(dir: &Path) -> Self {
        Self {
            path: dir.join(MANIFEST_FILENAME),
            container_id: None,
            tables: Vec::new(),
        }
    }

    /// True when `dir` holds a manifest.
    pub fn exists(dir: &Path) -> bool {
        dir.join(MANIFEST_FILENAME).exists()
    }

    /// Reads `dir/MANIFEST`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file is missing, unreadable, or has a line
    /// that is neither a comment nor a valid entry.
    pub fn load(dir: &Path) -> Result<Self> {
        let path = dir.join(MANIFEST_FILENAME);
        let file = File::open(&path)
            .with_context(|| format!("failed to open manifest at {}", path.display()))?;
        let reader = BufReader::new(file);
        let mut manifest = Self::new(dir);

        for (line_num, line) in reader.lines().enumerate() {
            let line =
                line.with_context(|| format!("failed to read manifest line {}", line_num + 1))?;
            let trimmed = line.trim();

            if trimmed.is_empty() || trimmed.starts_with('#') {
                continue;
            }

            let (kind, rest) = trimmed.split_once(':').ok_or_else(|| {
                anyhow!(
                    "manifest line {}: invalid format (expected 'entity:<uid>' or 'table:<name>:<rows>'): {}",
                    line_num + 1,
                    trimmed
                )
            })?;

            match kind {
                "entity" => {
                    if manifest.container_id.is_some() {
                        bail!("manifest line {}: second entity line", line_num + 1);
                    }
                    manifest.container_id = Some(rest.to_string());
                }
                "table" => {
                    let (name, rows) = rest.rsplit_once(':').ok_or_else(|| {
                        anyhow!(
                            "manifest line {}: expected 'table:<name>:<rows>': {}",
                            line_num + 1,
                            trimmed
                        )
                    })?;
                    let rows = rows.parse::<usize>().with_context(|| {
                        format!("manifest line {}: invalid row count '{}'", line_num + 1, rows)
                    })?;
                    if manifest.rows(name).is_some() {
                        bail!("manifest line {}: table '{}' listed twice", line_num + 1, name);
                    }
                    manifest.tables.push(TableEntry {
                        name: name.to_string(),
                        rows,
                    });
                }
                other => bail!(
                    "manifest line {}: unknown entry '{}' (expected entity or table)",
                    line_num + 1,
                    other
                ),
            }
        }

        Ok(manifest)
    }

    /// Declared row count of table `name`.
    pub fn rows(&self, name: &str) -> Option<usize> {
        self.tables.iter().find(|t| t.name == name).map(|t| t.rows)
    }

    /// Records the row count of table `name` (does **not** save to disk).
    pub fn set_rows(&mut self, name: &str, rows: usize) {
        match self.tables.iter_mut().find(|t| t.name == name) {
            Some(entry) => entry.rows = rows,
            None => self.tables.push(TableEntry {
                name: name.to_string(),
                rows,
            }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Persists the manifest. When the rename over the existing file is
    /// refused, the file is overwritten in place and the tmp file removed.
    pub fn save(&self) -> Result<()> {
        let tmp_path = self.path.with_file_name(MANIFEST_TMP_FILENAME);

        {
            let mut f = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&tmp_path)
                .with_context(|| {
                    format!("failed to create manifest tmp at {}", tmp_path.display())
                })?;

            self.write_contents(&mut f)?;
            f.flush()?;
            f.sync_all()?;
        }

        if fs::rename(&tmp_path, &self.path).is_err() {
            let mut f = OpenOptions::new()
                .create(true)
                .write(true)
                .truncate(true)
                .open(&self.path)
                .with_context(|| format!("failed to open manifest at {}", self.path.display()))?;

            self.write_contents(&mut f)?;
            f.flush()?;
            f.sync_all()?;

            let _ = fs::remove_file(&tmp_path);
        }

        Ok(())
    }

    fn write_contents(&self, f: &mut File) -> Result<()> {
        writeln!(f, "# Rowstore dataset manifest")?;
        writeln!(f, "# Format: entity:<container uid> | table:<name>:<rows>")?;
        if let Some(id) = &self.container_id {
            writeln!(f, "entity:{id}")?;
        }
        for entry in &self.tables {
            writeln!(f, "table:{}:{}", entry.name, entry.rows)?;
        }
        Ok(())
    }
}
