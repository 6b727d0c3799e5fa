use std::path::Path;
use std::sync::Arc;

use config::StoreConfig;

use crate::*;

crate::attributes! {
    pub struct AntennaKey {
        antenna_name: String => "antennaName",
        band: i32 => "receiverBand",
    }
}

impl TableKey for AntennaKey {}

impl AntennaKey {
    pub fn new(antenna_name: &str, band: i32) -> Self {
        Self {
            antenna_name: antenna_name.to_string(),
            band,
        }
    }
}

crate::enumeration! {
    pub enum Method {
        ThroughFocus => "THROUGH_FOCUS",
        Interferometric => "INTERFEROMETRIC",
    }
}

crate::attributes! {
    pub struct FocusValue {
        start_valid_time: ArrayTime => "startValidTime",
        temperature: f64 => "ambientTemperature",
        method: Method => "focusMethod",
        were_fixed: Vec<bool> => "wereFixed",
        offset: Vec<Vec<f64>> => "offset",
        comment: String => "comment",
        width: Option<f64> => "focusCurveWidth",
    }
}

crate::attributes! {
    pub struct FlagValue {
        reason: String => "reason",
        level: i32 => "level",
    }
}

pub type FocusTable = Table<AntennaKey, FocusValue>;
pub type FlagTable = IntervalTable<FlagValue>;

pub const CONTAINER_ID: &str = "uid://A002/X1/X2";

pub fn container_in(dir: &Path) -> Arc<Container> {
    Arc::new(Container::new(CONTAINER_ID, &StoreConfig::in_dir(dir)))
}

pub fn container_with(config: StoreConfig) -> Arc<Container> {
    Arc::new(Container::new(CONTAINER_ID, &config))
}

pub fn focus_schema() -> TableSchema {
    TableSchema::of::<AntennaKey, FocusValue>("CalFocus", "clfcs", "3", "1.61")
}

pub fn focus_table(container: &Arc<Container>) -> FocusTable {
    Table::new(focus_schema(), Arc::clone(container))
}

pub fn flag_table(container: &Arc<Container>) -> FlagTable {
    let schema = TableSchema::of::<TimeIntervalKey, FlagValue>("FlagCmd", "flgcmd", "3", "1.4");
    Table::new(schema, Arc::clone(container))
}

pub fn focus_value(temperature: f64) -> FocusValue {
    FocusValue {
        start_valid_time: ArrayTime(4_000_000_000),
        temperature,
        method: Method::Interferometric,
        were_fixed: vec![true, false, true],
        offset: vec![vec![0.5, -1.25], vec![2.0, 3.75]],
        comment: "focus <ok> & \"stable\"".to_string(),
        width: Some(1.5),
    }
}

pub fn focus_row(table: &FocusTable, antenna: &str, band: i32) -> Row<AntennaKey, FocusValue> {
    table.new_row_with(AntennaKey::new(antenna, band), focus_value(270.0 + f64::from(band)))
}

pub fn flag_row(
    table: &FlagTable,
    start: i64,
    duration: i64,
    reason: &str,
) -> Row<TimeIntervalKey, FlagValue> {
    table.new_row_with(
        TimeIntervalKey::new(start, duration),
        FlagValue {
            reason: reason.to_string(),
            level: 1,
        },
    )
}

/// `(start, end)` of every stored interval.
pub fn spans(table: &FlagTable) -> Vec<(i64, i64)> {
    table
        .rows()
        .iter()
        .map(|r| {
            let ti = r.key().time_interval;
            (ti.start.0, ti.end().0)
        })
        .collect()
}
