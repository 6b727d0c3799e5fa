//! # Dataset - a container of observation metadata tables
//!
//! Owns one [`rowstore::Table`] per entity and the [`Container`] they share,
//! and keeps the declared size of every table in a `MANIFEST` next to the
//! table files.
//!
//! ```text
//! <directory>/
//!   MANIFEST        entity id + row count per table
//!   CalFocus.xml    whole table, or the XML header of CalFocus.bin
//!   CalFocus.bin    MIME envelope (binary tables only)
//!   FlagCmd.xml
//! ```
//!
//! ## Opening
//!
//! [`Dataset::open`] reads only the manifest. With `load_on_demand` set,
//! each table reports its declared size and reads its file on first access;
//! otherwise every table is read before `open` returns.
//!
//! ## Saving
//!
//! [`Dataset::save`] writes every table that is in memory, then the
//! manifest. The manifest records the rows actually written, so rows left
//! out of an XML document are not announced. Tables that were never loaded
//! keep their files and their declared size.

pub mod cal_focus;
pub mod flag_cmd;
pub mod manifest;

use std::path::Path;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use config::StoreConfig;
use rowstore::{Container, Residency, TableHandle};
use tracing::{debug, info};

use cal_focus::CalFocusTable;
use flag_cmd::FlagCmdTable;
use manifest::Manifest;

/// Entity names of the tables a dataset holds, in manifest order.
pub const TABLE_NAMES: &[&str] = &[cal_focus::NAME, flag_cmd::NAME];

pub struct Dataset {
    config: StoreConfig,
    container: Arc<Container>,
    cal_focus: CalFocusTable,
    flag_cmd: FlagCmdTable,
}

impl std::fmt::Debug for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dataset")
            .field("entity_id", &self.container.entity().entity_id)
            .field("directory", &self.config.directory)
            .field("cal_focus", &self.cal_focus)
            .field("flag_cmd", &self.flag_cmd)
            .finish()
    }
}

impl Dataset {
    /// A new, empty dataset identified by `entity_id`. Nothing is written
    /// until [`Dataset::save`].
    pub fn create(config: StoreConfig, entity_id: &str) -> Result<Self> {
        if !entity_id.starts_with("uid://") {
            bail!("invalid dataset entity id '{entity_id}' (expected uid://...)");
        }
        let container = Arc::new(Container::new(entity_id, &config));
        Ok(Self {
            cal_focus: cal_focus::table(&container),
            flag_cmd: flag_cmd::table(&container),
            container,
            config,
        })
    }

    /// Opens the dataset saved in `config.directory`.
    ///
    /// # Errors
    ///
    /// Fails when the manifest is missing or malformed, and, when tables are
    /// loaded eagerly, when a table file cannot be read.
    pub fn open(config: StoreConfig) -> Result<Self> {
        let dir = config.directory.clone();
        if !Manifest::exists(&dir) {
            bail!("no dataset in {} (MANIFEST not found)", dir.display());
        }
        let manifest = Manifest::load(&dir)?;
        let entity_id = manifest
            .container_id
            .clone()
            .with_context(|| format!("manifest in {} has no entity line", dir.display()))?;

        cleanup_tmp_files(&dir);

        let mut dataset = Self::create(config, &entity_id)?;
        let eager = !dataset.config.load_on_demand;
        for table in dataset.tables_mut() {
            let Some(rows) = manifest.rows(table.name()) else {
                debug!(table = %table.name(), "not listed in the manifest, starting empty");
                continue;
            };
            table.declare_on_disk(rows);
            if eager {
                table
                    .load()
                    .with_context(|| format!("failed to load table {}", table.name()))?;
            }
        }

        info!(
            directory = %dir.display(),
            entity_id = %entity_id,
            lazy = !eager,
            "dataset opened"
        );
        Ok(dataset)
    }

    /// Opens the dataset in `config.directory`, or creates an empty one
    /// identified by `entity_id` when the directory holds none.
    pub fn open_or_create(config: StoreConfig, entity_id: &str) -> Result<Self> {
        if Manifest::exists(&config.directory) {
            Self::open(config)
        } else {
            Self::create(config, entity_id)
        }
    }

    /// Writes every resident table and then the manifest.
    pub fn save(&mut self) -> Result<()> {
        let dir = self.config.directory.clone();
        let mut manifest = Manifest::new(&dir);
        manifest.container_id = Some(self.container.entity().entity_id.clone());

        for table in self.tables_mut() {
            let rows = if table.residency() == Residency::Resident {
                table
                    .to_file(&dir)
                    .with_context(|| format!("failed to save table {}", table.name()))?
            } else {
                debug!(table = %table.name(), "not loaded, keeping the file on disk");
                table.size()
            };
            manifest.set_rows(table.name(), rows);
        }
        manifest.save()?;

        info!(directory = %dir.display(), tables = manifest.tables.len(), "dataset saved");
        Ok(())
    }

    /// Reads every table that is still on disk.
    pub fn load_all(&mut self) -> Result<()> {
        for table in self.tables_mut() {
            table
                .load()
                .with_context(|| format!("failed to load table {}", table.name()))?;
        }
        Ok(())
    }

    /// `(name, size)` of every table. Sizes of tables that were not loaded
    /// are the declared ones.
    pub fn table_sizes(&self) -> Vec<(&str, usize)> {
        self.tables().into_iter().map(|t| (t.name(), t.size())).collect()
    }

    pub fn tables(&self) -> Vec<&dyn TableHandle> {
        vec![&self.cal_focus as &dyn TableHandle, &self.flag_cmd]
    }

    pub fn tables_mut(&mut self) -> Vec<&mut dyn TableHandle> {
        vec![&mut self.cal_focus as &mut dyn TableHandle, &mut self.flag_cmd]
    }

    /// The table whose entity name is `name`, ignoring ASCII case.
    pub fn table_mut(&mut self, name: &str) -> Option<&mut dyn TableHandle> {
        self.tables_mut()
            .into_iter()
            .find(|t| t.name().eq_ignore_ascii_case(name))
    }

    pub fn cal_focus(&mut self) -> &mut CalFocusTable {
        &mut self.cal_focus
    }

    pub fn flag_cmd(&mut self) -> &mut FlagCmdTable {
        &mut self.flag_cmd
    }

    pub fn container(&self) -> &Container {
        &self.container
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn directory(&self) -> &Path {
        &self.config.directory
    }
}

/// Removes `.tmp` files left behind by an interrupted save.
fn cleanup_tmp_files(dir: &Path) {
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let p = entry.path();
            if let Some(name) = p.file_name().and_then(|n| n.to_str()) {
                if name.ends_with(".tmp") {
                    debug!(path = %p.display(), "removing leftover tmp file");
                    let _ = std::fs::remove_file(&p);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests;
