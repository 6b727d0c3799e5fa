//! # CLI - dataset inspection shell
//!
//! A REPL over one dataset directory. Reads commands from stdin, runs them
//! against the dataset, and prints results to stdout; logs go to stderr.
//! Works interactively or with commands piped through stdin.
//!
//! ## Commands
//!
//! ```text
//! SIZE [table]                        Row count of every table, or of one
//! DUMP table                          Print the table as an XML document
//! FLAG start duration reason...       Insert a FlagCmd row (times in ns)
//! FOCUS antenna band temperature      Add a CalFocus row
//! FORMAT table xml|bin                Choose the on-disk form of a table
//! SAVE                                Write the tables and the manifest
//! STATS                               Print dataset debug info
//! EXIT / QUIT                         Leave without saving
//! ```
//!
//! ## Configuration
//!
//! ```text
//! ROWSTORE_DIR          dataset directory                  (default: "dataset")
//! ROWSTORE_CHECK_UNIQUE enforce key uniqueness on load      (default: "true")
//! ROWSTORE_LAZY         load tables on first access         (default: "true")
//! ROWSTORE_BINARY       save new tables as binary sidecars  (default: "false")
//! ROWSTORE_BYTE_ORDER   Big_Endian | Little_Endian | Machine (default: "Machine")
//! RUST_LOG              log filter                          (default: "info")
//! ```
//!
//! ## Example
//!
//! ```text
//! $ cargo run -p cli
//! Rowstore started (dir=dataset, lazy=true, binary=false, byte_order=Little_Endian)
//! > FLAG 0 100 wind
//! OK [0, 100)
//! > FLAG 50 100 shadow
//! OK [50, 150)
//! > SIZE FlagCmd
//! FlagCmd 2
//! > SAVE
//! OK
//! > EXIT
//! bye
//! ```

use anyhow::{anyhow, bail, Context, Result};
use config::StoreConfig;
use dataset::cal_focus::{CalFocusKey, CalFocusValue, ReceiverBand};
use dataset::flag_cmd::FlagCmdValue;
use dataset::Dataset;
use rowstore::{ArrayTime, TimeIntervalKey, DEFAULT_ENTITY_ID};
use std::io::{self, BufRead, Write};
use std::str::SplitWhitespace;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_logging();

    let config = StoreConfig::from_env().context("invalid ROWSTORE_* configuration")?;
    let mut dataset = Dataset::open_or_create(config.clone(), DEFAULT_ENTITY_ID)?;
    info!(
        directory = %config.directory.display(),
        entity_id = %dataset.container().entity().entity_id,
        "shell started"
    );

    println!(
        "Rowstore started (dir={}, lazy={}, binary={}, byte_order={})",
        config.directory.display(),
        config.load_on_demand,
        config.file_as_bin,
        config.byte_order,
    );
    println!("Commands: SIZE [table] | DUMP table | FLAG start duration reason");
    println!("          FOCUS antenna band temperature | FORMAT table xml|bin");
    println!("          SAVE | STATS | EXIT");
    print!("> ");
    io::stdout().flush().ok();

    let stdin = io::stdin();

    for line in stdin.lock().lines() {
        let line = line?;
        let mut parts = line.split_whitespace();
        if let Some(cmd) = parts.next() {
            debug!(command = %line, "running");
            let result = match cmd.to_uppercase().as_str() {
                "SIZE" => size(&mut dataset, parts.next()),
                "DUMP" => dump(&mut dataset, parts.next()),
                "FLAG" => flag(&mut dataset, parts),
                "FOCUS" => focus(&mut dataset, parts),
                "FORMAT" => set_format(&mut dataset, parts.next(), parts.next()),
                "SAVE" => dataset.save().map(|()| "OK".to_string()),
                "STATS" => Ok(format!("{dataset:#?}")),
                "EXIT" | "QUIT" => {
                    println!("bye");
                    break;
                }
                other => Ok(format!("unknown command: {other}")),
            };
            match result {
                Ok(out) => println!("{out}"),
                Err(e) => println!("ERR {e:#}"),
            }
        }

        print!("> ");
        io::stdout().flush().ok();
    }

    Ok(())
}

fn size(dataset: &mut Dataset, table: Option<&str>) -> Result<String> {
    let lines: Vec<String> = match table {
        Some(name) => {
            let table = dataset
                .table_mut(name)
                .ok_or_else(|| anyhow!("no table named {name}"))?;
            vec![format!("{} {}", table.name(), table.size())]
        }
        None => dataset
            .table_sizes()
            .into_iter()
            .map(|(name, size)| format!("{name} {size}"))
            .collect(),
    };
    Ok(lines.join("\n"))
}

fn dump(dataset: &mut Dataset, table: Option<&str>) -> Result<String> {
    let name = table.ok_or_else(|| anyhow!("usage: DUMP table"))?;
    let table = dataset
        .table_mut(name)
        .ok_or_else(|| anyhow!("no table named {name}"))?;
    Ok(table.to_xml()?)
}

fn number<T: std::str::FromStr>(token: Option<&str>, what: &str, usage: &str) -> Result<T> {
    let token = token.ok_or_else(|| anyhow!("usage: {usage}"))?;
    token
        .parse()
        .map_err(|_| anyhow!("invalid {what} '{token}'"))
}

fn flag(dataset: &mut Dataset, mut parts: SplitWhitespace<'_>) -> Result<String> {
    const USAGE: &str = "FLAG start duration reason";
    let start: i64 = number(parts.next(), "start", USAGE)?;
    let duration: i64 = number(parts.next(), "duration", USAGE)?;
    if duration <= 0 {
        bail!("duration must be positive");
    }
    let reason = parts.collect::<Vec<&str>>().join(" ");
    if reason.is_empty() {
        bail!("usage: {USAGE}");
    }

    let table = dataset.flag_cmd();
    let row = table.new_row_with(
        TimeIntervalKey::new(start, duration),
        FlagCmdValue {
            kind: "manual".to_string(),
            reason,
            level: 0,
            severity: 0,
            applied: false,
            command: String::new(),
        },
    );
    let stored = table.insert_by_start_time(row)?;
    Ok(format!("OK {}", stored.key().time_interval))
}

fn focus(dataset: &mut Dataset, mut parts: SplitWhitespace<'_>) -> Result<String> {
    const USAGE: &str = "FOCUS antenna band temperature";
    let antenna = parts.next().ok_or_else(|| anyhow!("usage: {USAGE}"))?;
    let band: ReceiverBand = parts
        .next()
        .ok_or_else(|| anyhow!("usage: {USAGE}"))?
        .parse()
        .map_err(|e: String| anyhow!(e))?;
    let temperature: f64 = number(parts.next(), "temperature", USAGE)?;

    let table = dataset.cal_focus();
    let row = table.new_row_with(
        CalFocusKey::new(antenna, band, 0, 0),
        CalFocusValue {
            start_valid_time: ArrayTime(0),
            end_valid_time: ArrayTime(0),
            ambient_temperature: temperature,
            ..CalFocusValue::default()
        },
    );
    table.add(row)?;
    Ok("OK".to_string())
}

fn set_format(dataset: &mut Dataset, table: Option<&str>, form: Option<&str>) -> Result<String> {
    const USAGE: &str = "FORMAT table xml|bin";
    let (Some(name), Some(form)) = (table, form) else {
        bail!("usage: {USAGE}");
    };
    let binary = match form.to_ascii_lowercase().as_str() {
        "xml" => false,
        "bin" => true,
        _ => bail!("usage: {USAGE}"),
    };
    let table = dataset
        .table_mut(name)
        .ok_or_else(|| anyhow!("no table named {name}"))?;
    // Loaded first, so that the next SAVE rewrites the files in the new form.
    table.load()?;
    table.set_file_as_bin(binary);
    Ok("OK".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dataset_in(dir: &std::path::Path) -> Dataset {
        Dataset::create(StoreConfig::in_dir(dir), "uid://A1/X1/X1").unwrap()
    }

    #[test]
    fn number_reports_usage_and_bad_tokens() {
        assert_eq!(number::<i64>(Some("42"), "start", "FLAG").unwrap(), 42);
        let missing = number::<i64>(None, "start", "FLAG start").unwrap_err();
        assert_eq!(missing.to_string(), "usage: FLAG start");
        let bad = number::<f64>(Some("warm"), "temperature", "FOCUS").unwrap_err();
        assert_eq!(bad.to_string(), "invalid temperature 'warm'");
    }

    #[test]
    fn flag_joins_the_reason_words() {
        let dir = tempfile::tempdir().unwrap();
        let mut dataset = dataset_in(dir.path());

        let out = flag(&mut dataset, "100 20 high wind gusts".split_whitespace()).unwrap();
        assert_eq!(out, "OK [100, 120)");
        assert_eq!(dataset.flag_cmd().rows()[0].value().reason, "high wind gusts");
    }

    #[test]
    fn size_of_one_table_ignores_case() {
        let dir = tempfile::tempdir().unwrap();
        let mut dataset = dataset_in(dir.path());
        focus(&mut dataset, "PM01 ALMA_RB_07 265".split_whitespace()).unwrap();

        assert_eq!(size(&mut dataset, Some("CALFOCUS")).unwrap(), "CalFocus 1");
        assert_eq!(size(&mut dataset, None).unwrap(), "CalFocus 1\nFlagCmd 0");
    }

    #[test]
    fn set_format_flips_the_table_form() {
        let dir = tempfile::tempdir().unwrap();
        let mut dataset = dataset_in(dir.path());

        set_format(&mut dataset, Some("FlagCmd"), Some("BIN")).unwrap();
        assert!(dataset.flag_cmd().file_as_bin());
        set_format(&mut dataset, Some("FlagCmd"), Some("xml")).unwrap();
        assert!(!dataset.flag_cmd().file_as_bin());
        assert!(set_format(&mut dataset, Some("FlagCmd"), None).is_err());
    }
}
