//! FlagCmd: flagging commands, each valid over a time interval.

use std::sync::Arc;

use rowstore::{Container, IntervalTable, Row, Table, TableSchema, TimeIntervalKey};

rowstore::attributes! {
    pub struct FlagCmdValue {
        kind: String => "type",
        reason: String => "reason",
        level: i32 => "level",
        severity: i32 => "severity",
        applied: bool => "applied",
        command: String => "command",
    }
}

pub type FlagCmdTable = IntervalTable<FlagCmdValue>;
pub type FlagCmdRow = Row<TimeIntervalKey, FlagCmdValue>;

pub const NAME: &str = "FlagCmd";

pub fn schema() -> TableSchema {
    TableSchema::of::<TimeIntervalKey, FlagCmdValue>(NAME, "flgcmd", "2", "1.53")
}

pub fn table(container: &Arc<Container>) -> FlagCmdTable {
    Table::new(schema(), Arc::clone(container))
}
