use tracing::info;

use crate::error::{KernelError, Result};
use crate::labels::LabelIndex;
use crate::model::{
    ConservationStatus, FormOptions, LoggedObservation, NewObservation, ObservationForm,
};
use crate::records::{
    insert_observation, insert_observer, insert_water_quality, query_locations,
    query_observers, query_species,
};
use crate::Kernel;

const UNRESOLVED_SELECTION: &str =
    "Ensure species, location and observer are available or add them first";

impl Kernel {
    pub fn form_options(&self) -> Result<FormOptions> {
        let conn = self.conn()?;
        Ok(FormOptions {
            species: LabelIndex::build(&query_species(&conn)?).options(),
            locations: LabelIndex::build(&query_locations(&conn)?).options(),
            observers: LabelIndex::build(&query_observers(&conn)?).options(),
            statuses: ConservationStatus::ALL
                .iter()
                .map(|s| s.as_str().to_string())
                .collect(),
        })
    }

    /// Resolve the form's labels and record the sighting, an optional new
    /// observer and optional water readings in one transaction.
    pub fn log_observation(&self, form: &ObservationForm) -> Result<LoggedObservation> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        let species = LabelIndex::build(&query_species(&tx)?);
        let locations = LabelIndex::build(&query_locations(&tx)?);
        let (Some(species_id), Some(location_id)) = (
            species.resolve(form.species.trim()),
            locations.resolve(form.location.trim()),
        ) else {
            return Err(KernelError::validation(UNRESOLVED_SELECTION));
        };

        let observer_id = match &form.new_observer {
            Some(new) => insert_observer(&tx, new)?,
            None => {
                let observers = LabelIndex::build(&query_observers(&tx)?);
                form.observer
                    .as_deref()
                    .and_then(|label| observers.resolve(label.trim()))
                    .ok_or_else(|| KernelError::validation(UNRESOLVED_SELECTION))?
            }
        };

        let quality_id = match &form.water_quality {
            Some(readings) => Some(insert_water_quality(&tx, location_id, readings)?),
            None => None,
        };

        let obs_date = form.obs_date.and_time(form.obs_time);
        let obs_id = insert_observation(
            &tx,
            &NewObservation {
                species_id,
                location_id,
                observer_id,
                quality_id,
                obs_date,
                count_observed: form.count_observed,
                remarks: form.remarks.clone(),
            },
        )?;
        tx.commit()?;

        info!(obs_id, species_id, location_id, observer_id, "observation logged");
        Ok(LoggedObservation {
            obs_id,
            species_id,
            location_id,
            observer_id,
            quality_id,
            obs_date,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::labels::EMPTY_CHOICE;
    use crate::model::{NewObserver, WaterReadings};
    use crate::test_support::{empty, seeded};
    use crate::whitelist::Table;
    use chrono::{NaiveDate, NaiveTime};

    fn form(observer: Option<&str>) -> ObservationForm {
        ObservationForm {
            species: "Dugong (Dugong dugon)".into(),
            location: "Mangrove Inlet - East Coast".into(),
            observer: observer.map(Into::into),
            new_observer: None,
            obs_date: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
            obs_time: NaiveTime::from_hms_opt(7, 30, 0).unwrap(),
            count_observed: 2,
            remarks: Some("mother and calf".into()),
            water_quality: None,
        }
    }

    #[test]
    fn options_list_labels_and_statuses() {
        let (_dir, kernel) = seeded();
        let opts = kernel.form_options().unwrap();
        assert!(opts
            .species
            .contains(&"Whale Shark (Rhincodon typus)".to_string()));
        assert!(opts
            .observers
            .contains(&"Sam Okafor (Marine Survey Unit)".to_string()));
        assert_eq!(opts.statuses.len(), 5);
    }

    #[test]
    fn options_on_empty_tables_offer_placeholder() {
        let (_dir, kernel) = empty();
        kernel.load_bundled_schema().unwrap();
        let conn = kernel.conn().unwrap();
        conn.execute_batch(
            "DELETE FROM Observation; DELETE FROM Water_Quality; DELETE FROM Conservation_Action; DELETE FROM Observer;",
        )
        .unwrap();
        let opts = kernel.form_options().unwrap();
        assert_eq!(opts.observers, vec![EMPTY_CHOICE.to_string()]);
    }

    #[test]
    fn logs_observation_with_selected_observer() {
        let (_dir, kernel) = seeded();
        let logged = kernel
            .log_observation(&form(Some("Dana Reyes (Reef Watch)")))
            .unwrap();
        assert_eq!(logged.species_id, 3);
        assert_eq!(logged.location_id, 2);
        assert_eq!(logged.observer_id, 1);
        assert_eq!(logged.quality_id, None);
        assert_eq!(logged.obs_date.to_string(), "2025-06-01 07:30:00");
        let recent = kernel.recent_observations(1).unwrap();
        assert_eq!(recent[0].obs_id, logged.obs_id);
        assert_eq!(recent[0].remarks.as_deref(), Some("mother and calf"));
    }

    #[test]
    fn new_observer_and_water_quality_are_linked() {
        let (_dir, kernel) = seeded();
        let mut f = form(None);
        f.new_observer = Some(NewObserver {
            name: "Kai".into(),
            organization: Some("Blue Trust".into()),
            contact: None,
        });
        f.water_quality = Some(WaterReadings::default());
        let logged = kernel.log_observation(&f).unwrap();
        assert!(logged.quality_id.is_some());
        let observers = kernel.list_observers().unwrap();
        assert!(observers
            .iter()
            .any(|o| o.observer_id == logged.observer_id && o.name == "Kai"));
    }

    #[test]
    fn unresolved_labels_are_rejected() {
        let (_dir, kernel) = seeded();
        let mut f = form(Some("Dana Reyes (Reef Watch)"));
        f.species = EMPTY_CHOICE.into();
        let err = kernel.log_observation(&f).unwrap_err();
        assert!(matches!(err, KernelError::Validation(ref m) if m == UNRESOLVED_SELECTION));

        let err = kernel.log_observation(&form(None)).unwrap_err();
        assert!(matches!(err, KernelError::Validation(_)));
    }

    #[test]
    fn failed_submission_rolls_back_new_observer_and_readings() {
        let (_dir, kernel) = seeded();
        let observers_before = kernel.count_rows(Table::Observer).unwrap();
        let readings_before = kernel.count_rows(Table::WaterQuality).unwrap();
        let mut f = form(None);
        f.new_observer = Some(NewObserver {
            name: "Ghost".into(),
            organization: None,
            contact: None,
        });
        f.water_quality = Some(WaterReadings {
            ph: 20.0,
            ..WaterReadings::default()
        });
        assert!(kernel.log_observation(&f).is_err());
        assert_eq!(kernel.count_rows(Table::Observer).unwrap(), observers_before);
        assert_eq!(
            kernel.count_rows(Table::WaterQuality).unwrap(),
            readings_before
        );
    }
}
