//! CalFocus: results of focus calibrations, one row per antenna, receiver
//! band and calibration reduction.

use std::sync::Arc;

use rowstore::{ArrayTime, Container, Row, Table, TableKey, TableSchema, Tag};

rowstore::enumeration! {
    pub enum ReceiverBand {
        AlmaRb01 => "ALMA_RB_01",
        AlmaRb02 => "ALMA_RB_02",
        AlmaRb03 => "ALMA_RB_03",
        AlmaRb04 => "ALMA_RB_04",
        AlmaRb05 => "ALMA_RB_05",
        AlmaRb06 => "ALMA_RB_06",
        AlmaRb07 => "ALMA_RB_07",
        AlmaRb08 => "ALMA_RB_08",
        AlmaRb09 => "ALMA_RB_09",
        AlmaRb10 => "ALMA_RB_10",
        AlmaHolographyReceiver => "ALMA_HOLOGRAPHY_RECEIVER",
        Unspecified => "UNSPECIFIED",
    }
}

rowstore::enumeration! {
    pub enum AtmPhaseCorrection {
        Uncorrected => "AP_UNCORRECTED",
        Corrected => "AP_CORRECTED",
    }
}

rowstore::enumeration! {
    pub enum FocusMethod {
        ThroughFocus => "THROUGH_FOCUS",
        FivePoint => "FIVE_POINT",
    }
}

rowstore::enumeration! {
    pub enum PolarizationType {
        R => "R",
        L => "L",
        X => "X",
        Y => "Y",
        Both => "BOTH",
    }
}

rowstore::attributes! {
    pub struct CalFocusKey {
        antenna_name: String => "antennaName",
        receiver_band: ReceiverBand => "receiverBand",
        cal_data_id: Tag => "calDataId",
        cal_reduction_id: Tag => "calReductionId",
    }
}

impl TableKey for CalFocusKey {}

impl CalFocusKey {
    pub fn new(
        antenna_name: &str,
        receiver_band: ReceiverBand,
        cal_data: u64,
        cal_reduction: u64,
    ) -> Self {
        Self {
            antenna_name: antenna_name.to_string(),
            receiver_band,
            cal_data_id: Tag(cal_data),
            cal_reduction_id: Tag(cal_reduction),
        }
    }
}

rowstore::attributes! {
    /// Lengths are in metres, frequencies in hertz, angles in radians and
    /// temperatures in kelvin.
    pub struct CalFocusValue {
        start_valid_time: ArrayTime => "startValidTime",
        end_valid_time: ArrayTime => "endValidTime",
        ambient_temperature: f64 => "ambientTemperature",
        atm_phase_correction: AtmPhaseCorrection => "atmPhaseCorrection",
        focus_method: FocusMethod => "focusMethod",
        frequency_range: Vec<f64> => "frequencyRange",
        pointing_direction: Vec<f64> => "pointingDirection",
        num_receptor: i32 => "numReceptor",
        polarization_types: Vec<PolarizationType> => "polarizationTypes",
        were_fixed: Vec<bool> => "wereFixed",
        offset: Vec<Vec<f64>> => "offset",
        offset_error: Vec<Vec<f64>> => "offsetError",
        offset_was_tied: Vec<Vec<bool>> => "offsetWasTied",
        reduced_chi_squared: Vec<Vec<f64>> => "reducedChiSquared",
        position: Vec<Vec<f64>> => "position",
        polarizations_averaged: Option<bool> => "polarizationsAveraged",
        focus_curve_width: Option<Vec<Vec<f64>>> => "focusCurveWidth",
        focus_curve_width_error: Option<Vec<Vec<f64>>> => "focusCurveWidthError",
        focus_curve_was_fixed: Option<Vec<bool>> => "focusCurveWasFixed",
        off_intensity: Option<Vec<f64>> => "offIntensity",
        off_intensity_error: Option<Vec<f64>> => "offIntensityError",
        off_intensity_was_fixed: Option<bool> => "offIntensityWasFixed",
        peak_intensity: Option<Vec<f64>> => "peakIntensity",
        peak_intensity_error: Option<Vec<f64>> => "peakIntensityError",
        peak_intensity_was_fixed: Option<bool> => "peakIntensityWasFixed",
    }
}

pub type CalFocusTable = Table<CalFocusKey, CalFocusValue>;
pub type CalFocusRow = Row<CalFocusKey, CalFocusValue>;

pub const NAME: &str = "CalFocus";

pub fn schema() -> TableSchema {
    TableSchema::of::<CalFocusKey, CalFocusValue>(NAME, "clfcs", "3", "1.61")
}

pub fn table(container: &Arc<Container>) -> CalFocusTable {
    Table::new(schema(), Arc::clone(container))
}
