// THEORY:
// `MeasurementRecord` is the flat, language-neutral shape of a measurement. It is
// written to disk or handed to another process. The per-sample structs are
// unzipped into parallel arrays, so any JSON consumer can read them without
// knowing our types.
//
// An empty profile has no max width. The record writes zeros for those fields
// and `heel_correction_applied` travels alongside, so the consumer can tell a
// real measurement from a placeholder.

use crate::core_modules::summary::MeasurementResult;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementRecord {
    pub positions_mm: Vec<f64>,
    pub widths_mm: Vec<f64>,
    pub left_edge_points_mm: Vec<f64>,
    pub right_edge_points_mm: Vec<f64>,
    pub center_points_mm: Vec<f64>,
    pub foot_length_mm: f64,
    pub max_width_mm: f64,
    pub max_width_position_mm: f64,
    pub measurement_interval_mm: f64,
    pub heel_correction_applied: bool,
}

impl From<&MeasurementResult> for MeasurementRecord {
    fn from(result: &MeasurementResult) -> Self {
        let samples = &result.samples;
        Self {
            positions_mm: samples.iter().map(|s| s.distance_from_toe_mm).collect(),
            widths_mm: samples.iter().map(|s| s.width_mm).collect(),
            left_edge_points_mm: samples.iter().map(|s| s.left_edge_mm).collect(),
            right_edge_points_mm: samples.iter().map(|s| s.right_edge_mm).collect(),
            center_points_mm: samples.iter().map(|s| s.center_mm).collect(),
            foot_length_mm: result.foot_length_mm,
            max_width_mm: result.max_width.map_or(0.0, |m| m.width_mm),
            max_width_position_mm: result.max_width.map_or(0.0, |m| m.distance_from_toe_mm),
            measurement_interval_mm: result.measurement_interval_mm,
            heel_correction_applied: result.heel_correction_applied,
        }
    }
}

impl MeasurementRecord {
    pub fn to_json_pretty(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_modules::width_profiler::WidthSample;

    fn sample(distance: f64, left: f64, right: f64) -> WidthSample {
        WidthSample {
            distance_from_toe_mm: distance,
            left_edge_mm: left,
            right_edge_mm: right,
            center_mm: (left + right) / 2.0,
            width_mm: right - left,
            row: 0,
        }
    }

    #[test]
    fn record_uses_the_flat_field_names() {
        let result = MeasurementResult::summarize(
            120.0,
            vec![sample(0.0, 80.0, 110.0), sample(5.0, 75.0, 115.0)],
            5.0,
            true,
        );
        let record = MeasurementRecord::from(&result);
        let value: serde_json::Value = serde_json::from_str(&record.to_json_pretty().unwrap()).unwrap();

        assert_eq!(value["positions_mm"], serde_json::json!([0.0, 5.0]));
        assert_eq!(value["widths_mm"], serde_json::json!([30.0, 40.0]));
        assert_eq!(value["left_edge_points_mm"], serde_json::json!([80.0, 75.0]));
        assert_eq!(value["right_edge_points_mm"], serde_json::json!([110.0, 115.0]));
        assert_eq!(value["center_points_mm"], serde_json::json!([95.0, 95.0]));
        assert_eq!(value["foot_length_mm"], 120.0);
        assert_eq!(value["max_width_mm"], 40.0);
        assert_eq!(value["max_width_position_mm"], 5.0);
        assert_eq!(value["measurement_interval_mm"], 5.0);
        assert_eq!(value["heel_correction_applied"], true);
        assert_eq!(value.as_object().unwrap().len(), 10);
    }

    #[test]
    fn empty_profile_writes_zeros() {
        let result = MeasurementResult::summarize(0.0, Vec::new(), 5.0, false);
        let record = MeasurementRecord::from(&result);
        assert!(record.positions_mm.is_empty());
        assert_eq!(record.max_width_mm, 0.0);
        assert_eq!(record.max_width_position_mm, 0.0);
        assert!(!record.heel_correction_applied);

        let parsed = MeasurementRecord::from_json(&record.to_json_pretty().unwrap()).unwrap();
        assert_eq!(parsed, record);
    }
}
