//! Fixed table and column names accepted by the generic read paths.

use std::fmt;
use std::str::FromStr;

use crate::error::KernelError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Species,
    Location,
    Observer,
    WaterQuality,
    Observation,
    ConservationAction,
}

impl Table {
    pub const ALL: [Table; 6] = [
        Table::Species,
        Table::Location,
        Table::Observer,
        Table::WaterQuality,
        Table::Observation,
        Table::ConservationAction,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Table::Species => "Species",
            Table::Location => "Location",
            Table::Observer => "Observer",
            Table::WaterQuality => "Water_Quality",
            Table::Observation => "Observation",
            Table::ConservationAction => "Conservation_Action",
        }
    }

    pub fn primary_key(self) -> &'static str {
        self.columns()[0]
    }

    pub fn columns(self) -> &'static [&'static str] {
        match self {
            Table::Species => &[
                "species_id",
                "common_name",
                "scientific_name",
                "conservation_status",
            ],
            Table::Location => &["location_id", "location_name", "region", "water_type"],
            Table::Observer => &["observer_id", "name", "organization", "contact"],
            Table::WaterQuality => &[
                "quality_id",
                "location_id",
                "temperature",
                "pH",
                "salinity",
                "pollution_index",
                "recorded_at",
            ],
            Table::Observation => &[
                "obs_id",
                "species_id",
                "location_id",
                "observer_id",
                "quality_id",
                "obs_date",
                "count_observed",
                "remarks",
            ],
            Table::ConservationAction => &[
                "action_id",
                "species_id",
                "action_type",
                "description",
                "start_date",
                "end_date",
            ],
        }
    }

    /// Map a requested column to its canonical (whitelisted) spelling.
    pub fn column(self, requested: &str) -> Result<&'static str, KernelError> {
        let wanted = requested.trim();
        self.columns()
            .iter()
            .copied()
            .find(|c| c.eq_ignore_ascii_case(wanted))
            .ok_or_else(|| KernelError::UnknownColumn {
                table: self.as_str(),
                column: requested.to_string(),
            })
    }

    pub fn select_columns(self, requested: &[String]) -> Result<Vec<&'static str>, KernelError> {
        if requested.is_empty() {
            return Ok(self.columns().to_vec());
        }
        let mut out: Vec<&'static str> = Vec::with_capacity(requested.len());
        for raw in requested {
            let col = self.column(raw)?;
            if !out.contains(&col) {
                out.push(col);
            }
        }
        Ok(out)
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Table {
    type Err = KernelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Table::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| KernelError::UnknownTable(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_names_are_case_insensitive() {
        assert_eq!("water_quality".parse::<Table>().unwrap(), Table::WaterQuality);
        assert!(matches!(
            "Species; DROP TABLE Species".parse::<Table>(),
            Err(KernelError::UnknownTable(_))
        ));
    }

    #[test]
    fn columns_are_canonicalised_and_deduplicated() {
        let cols = Table::WaterQuality
            .select_columns(&["PH".into(), "salinity".into(), "ph".into()])
            .unwrap();
        assert_eq!(cols, vec!["pH", "salinity"]);
    }

    #[test]
    fn unknown_column_is_rejected() {
        let err = Table::Observer
            .select_columns(&["name".into(), "password".into()])
            .unwrap_err();
        assert!(matches!(err, KernelError::UnknownColumn { table: "Observer", .. }));
    }

    #[test]
    fn empty_request_selects_all_columns() {
        assert_eq!(
            Table::Species.select_columns(&[]).unwrap(),
            Table::Species.columns().to_vec()
        );
        assert_eq!(Table::Observation.primary_key(), "obs_id");
    }
}
