use std::path::Path;

use anyhow::Result;
use config::StoreConfig;
use rowstore::{ArrayTime, TimeIntervalKey};

use crate::cal_focus::{
    CalFocusKey, CalFocusRow, CalFocusValue, FocusMethod, PolarizationType, ReceiverBand,
};
use crate::flag_cmd::{FlagCmdRow, FlagCmdValue};
use crate::Dataset;

pub const DATASET_ID: &str = "uid://A002/X1f/X3";

pub fn focus_value(temperature: f64) -> CalFocusValue {
    CalFocusValue {
        start_valid_time: ArrayTime(4_800_000_000_000_000_000),
        end_valid_time: ArrayTime(4_800_000_060_000_000_000),
        ambient_temperature: temperature,
        focus_method: FocusMethod::FivePoint,
        frequency_range: vec![84.0e9, 116.0e9],
        pointing_direction: vec![0.1, -0.2],
        num_receptor: 2,
        polarization_types: vec![PolarizationType::X, PolarizationType::Y],
        were_fixed: vec![false, false, true],
        offset: vec![vec![0.001, -0.002, 0.0], vec![0.0015, -0.0025, 0.0]],
        offset_error: vec![vec![1e-5; 3]; 2],
        offset_was_tied: vec![vec![false; 3]; 2],
        reduced_chi_squared: vec![vec![1.1, 0.9, 1.0]; 2],
        position: vec![vec![0.0, 0.0, 6.5]; 2],
        focus_curve_width: Some(vec![vec![0.004; 3]; 2]),
        ..CalFocusValue::default()
    }
}

pub fn focus_row(dataset: &mut Dataset, antenna: &str, band: ReceiverBand) -> CalFocusRow {
    dataset.cal_focus().new_row_with(
        CalFocusKey::new(antenna, band, 1, 2),
        focus_value(270.5),
    )
}

pub fn flag_row(dataset: &mut Dataset, start: i64, duration: i64, reason: &str) -> FlagCmdRow {
    dataset.flag_cmd().new_row_with(
        TimeIntervalKey::new(start, duration),
        FlagCmdValue {
            kind: "online".to_string(),
            reason: reason.to_string(),
            level: 1,
            severity: 2,
            applied: false,
            command: format!("flagdata reason='{reason}'"),
        },
    )
}

/// A dataset with two CalFocus rows and three FlagCmd rows,
/// already saved.
pub fn saved_dataset(config: StoreConfig) -> Result<Dataset> {
    let mut dataset = Dataset::create(config, DATASET_ID)?;
    for (antenna, band) in [("DV01", ReceiverBand::AlmaRb03), ("DA41", ReceiverBand::AlmaRb06)] {
        let row = focus_row(&mut dataset, antenna, band);
        dataset.cal_focus().add(row)?;
    }
    for (start, reason) in [(0, "wind"), (100, "shadow"), (50, "slew")] {
        let row = flag_row(&mut dataset, start, 60, reason);
        dataset.flag_cmd().insert_by_start_time(row)?;
    }
    dataset.save()?;
    Ok(dataset)
}

pub fn lazy(dir: &Path) -> StoreConfig {
    StoreConfig::in_dir(dir)
}

pub fn eager(dir: &Path) -> StoreConfig {
    StoreConfig {
        load_on_demand: false,
        ..StoreConfig::in_dir(dir)
    }
}
