use std::fmt;
use std::str::FromStr;

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::error::KernelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ConservationStatus {
    #[serde(rename = "Least Concern")]
    LeastConcern,
    #[serde(rename = "Near Threatened")]
    NearThreatened,
    #[serde(rename = "Vulnerable")]
    Vulnerable,
    #[serde(rename = "Endangered")]
    Endangered,
    #[serde(rename = "Critically Endangered")]
    CriticallyEndangered,
}

impl ConservationStatus {
    pub const ALL: [ConservationStatus; 5] = [
        ConservationStatus::LeastConcern,
        ConservationStatus::NearThreatened,
        ConservationStatus::Vulnerable,
        ConservationStatus::Endangered,
        ConservationStatus::CriticallyEndangered,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ConservationStatus::LeastConcern => "Least Concern",
            ConservationStatus::NearThreatened => "Near Threatened",
            ConservationStatus::Vulnerable => "Vulnerable",
            ConservationStatus::Endangered => "Endangered",
            ConservationStatus::CriticallyEndangered => "Critically Endangered",
        }
    }
}

impl fmt::Display for ConservationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConservationStatus {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| KernelError::validation(format!("unknown conservation status: {s}")))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Species {
    pub species_id: i64,
    pub common_name: String,
    pub scientific_name: Option<String>,
    /// Stored as text; rows loaded by external scripts may hold other values.
    pub conservation_status: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub location_id: i64,
    pub location_name: String,
    pub region: Option<String>,
    pub water_type: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observer {
    pub observer_id: i64,
    pub name: String,
    pub organization: Option<String>,
    pub contact: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConservationAction {
    pub action_id: i64,
    pub action_type: String,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// Conservation action joined with the species it targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionOverview {
    pub action_id: i64,
    pub common_name: String,
    pub action_type: String,
    pub description: Option<String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesMatch {
    #[serde(flatten)]
    pub species: Species,
    pub total_observations: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentObservation {
    pub obs_id: i64,
    pub common_name: Option<String>,
    pub location_name: Option<String>,
    pub obs_date: NaiveDateTime,
    pub count_observed: i64,
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    pub species: i64,
    pub locations: i64,
    pub observations: i64,
    pub actions: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCount {
    pub conservation_status: Option<String>,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionPollution {
    pub region: Option<String>,
    pub avg_pollution: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dashboard {
    pub totals: Totals,
    pub species_by_status: Vec<StatusCount>,
    pub pollution_by_region: Vec<RegionPollution>,
    pub recent_observations: Vec<RecentObservation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewSpecies {
    pub common_name: String,
    #[serde(default)]
    pub scientific_name: Option<String>,
    pub conservation_status: ConservationStatus,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewObserver {
    pub name: String,
    #[serde(default)]
    pub organization: Option<String>,
    #[serde(default)]
    pub contact: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewLocation {
    pub location_name: String,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub water_type: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct WaterReadings {
    pub temperature: f64,
    #[serde(rename = "pH", alias = "ph")]
    pub ph: f64,
    pub salinity: f64,
    pub pollution_index: f64,
}

impl Default for WaterReadings {
    /// Defaults pre-filled by the observation form.
    fn default() -> Self {
        Self {
            temperature: 25.0,
            ph: 8.0,
            salinity: 35.0,
            pollution_index: 10.0,
        }
    }
}

impl WaterReadings {
    pub fn validate(&self) -> Result<(), KernelError> {
        let finite = [self.temperature, self.ph, self.salinity, self.pollution_index]
            .iter()
            .all(|v| v.is_finite());
        if !finite {
            return Err(KernelError::validation("water readings must be finite numbers"));
        }
        if !(0.0..=14.0).contains(&self.ph) {
            return Err(KernelError::validation("pH must be between 0 and 14"));
        }
        if self.salinity < 0.0 {
            return Err(KernelError::validation("salinity must not be negative"));
        }
        if !(0.0..=100.0).contains(&self.pollution_index) {
            return Err(KernelError::validation(
                "pollution index must be between 0 and 100",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewObservation {
    pub species_id: i64,
    pub location_id: i64,
    pub observer_id: i64,
    #[serde(default)]
    pub quality_id: Option<i64>,
    pub obs_date: NaiveDateTime,
    pub count_observed: u32,
    #[serde(default)]
    pub remarks: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewConservationAction {
    pub species_id: i64,
    pub action_type: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

/// Submission from the "Log New Observation" form, keyed by display labels.
#[derive(Debug, Clone, Deserialize)]
pub struct ObservationForm {
    pub species: String,
    pub location: String,
    #[serde(default)]
    pub observer: Option<String>,
    #[serde(default)]
    pub new_observer: Option<NewObserver>,
    pub obs_date: NaiveDate,
    pub obs_time: NaiveTime,
    pub count_observed: u32,
    #[serde(default)]
    pub remarks: Option<String>,
    #[serde(default)]
    pub water_quality: Option<WaterReadings>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggedObservation {
    pub obs_id: i64,
    pub species_id: i64,
    pub location_id: i64,
    pub observer_id: i64,
    pub quality_id: Option<i64>,
    pub obs_date: NaiveDateTime,
}

/// Option lists for the observation form selection widgets.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormOptions {
    pub species: Vec<String>,
    pub locations: Vec<String>,
    pub observers: Vec<String>,
    pub statuses: Vec<String>,
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_case_insensitively() {
        let parsed: ConservationStatus = " critically endangered ".parse().unwrap();
        assert_eq!(parsed, ConservationStatus::CriticallyEndangered);
        assert!("Extinct".parse::<ConservationStatus>().is_err());
    }

    #[test]
    fn status_serializes_with_display_names() {
        let json = serde_json::to_string(&ConservationStatus::NearThreatened).unwrap();
        assert_eq!(json, "\"Near Threatened\"");
    }

    #[test]
    fn water_readings_bounds() {
        assert!(WaterReadings::default().validate().is_ok());
        let bad_ph = WaterReadings {
            ph: 15.0,
            ..WaterReadings::default()
        };
        assert!(bad_ph.validate().is_err());
        let bad_pollution = WaterReadings {
            pollution_index: 101.0,
            ..WaterReadings::default()
        };
        assert!(bad_pollution.validate().is_err());
        let nan = WaterReadings {
            temperature: f64::NAN,
            ..WaterReadings::default()
        };
        assert!(nan.validate().is_err());
    }

    #[test]
    fn water_readings_accept_ph_alias() {
        let r: WaterReadings = serde_json::from_str(
            r#"{"temperature":20.5,"ph":7.9,"salinity":34.0,"pollution_index":3.0}"#,
        )
        .unwrap();
        assert_eq!(r.ph, 7.9);
    }
}
