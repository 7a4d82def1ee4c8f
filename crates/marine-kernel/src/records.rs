use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::types::{Type, ValueRef};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::Serialize;
use tracing::debug;

use crate::error::{KernelError, Result};
use crate::model::{
    non_blank, ActionOverview, ConservationAction, Dashboard, Location, NewConservationAction,
    NewLocation, NewObservation, NewObserver, NewSpecies, Observer, RecentObservation,
    RegionPollution, Species, SpeciesMatch, StatusCount, Totals, WaterReadings,
};
use crate::whitelist::Table;
use crate::Kernel;

pub const DEFAULT_RECENT_LIMIT: i64 = 10;
pub const DASHBOARD_RECENT_LIMIT: i64 = 8;
const MAX_RECENT_LIMIT: i64 = 500;
const MAX_BROWSE_LIMIT: i64 = 1000;

#[derive(Debug, Clone, Serialize)]
pub struct BrowseResult {
    pub table: &'static str,
    pub columns: Vec<&'static str>,
    pub rows: Vec<serde_json::Map<String, serde_json::Value>>,
}

/// Accepts `DATETIME` text with or without fractional seconds or a `T`
/// separator, and bare `DATE` text at midnight.
fn parse_timestamp(raw: &str) -> std::result::Result<NaiveDateTime, chrono::ParseError> {
    let raw = raw.trim();
    for fmt in ["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M"] {
        if let Ok(ts) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Ok(ts);
        }
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map(|d| d.and_time(NaiveTime::MIN))
}

fn parse_calendar_date(raw: &str) -> std::result::Result<NaiveDate, chrono::ParseError> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .or_else(|err| parse_timestamp(raw).map(|ts| ts.date()).map_err(|_| err))
}

fn conversion_error(idx: usize, err: chrono::ParseError) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(err))
}

fn timestamp_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDateTime> {
    let raw: String = row.get(idx)?;
    parse_timestamp(&raw).map_err(|err| conversion_error(idx, err))
}

fn date_at(row: &Row<'_>, idx: usize) -> rusqlite::Result<Option<NaiveDate>> {
    let raw: Option<String> = row.get(idx)?;
    raw.map(|r| parse_calendar_date(&r).map_err(|err| conversion_error(idx, err)))
        .transpose()
}

fn species_from_row(row: &Row<'_>) -> rusqlite::Result<Species> {
    Ok(Species {
        species_id: row.get(0)?,
        common_name: row.get(1)?,
        scientific_name: row.get(2)?,
        conservation_status: row.get(3)?,
    })
}

fn action_from_row(row: &Row<'_>) -> rusqlite::Result<ConservationAction> {
    Ok(ConservationAction {
        action_id: row.get(0)?,
        action_type: row.get(1)?,
        description: row.get(2)?,
        start_date: date_at(row, 3)?,
        end_date: date_at(row, 4)?,
    })
}

fn recent_from_row(row: &Row<'_>) -> rusqlite::Result<RecentObservation> {
    Ok(RecentObservation {
        obs_id: row.get(0)?,
        common_name: row.get(1)?,
        location_name: row.get(2)?,
        obs_date: timestamp_at(row, 3)?,
        count_observed: row.get(4)?,
        remarks: row.get(5)?,
    })
}

fn required(value: &str, field: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(KernelError::validation(format!("{field} is required")));
    }
    Ok(trimmed.to_string())
}

pub(crate) fn ensure_exists(conn: &Connection, table: Table, id: i64) -> Result<()> {
    let sql = format!(
        "SELECT 1 FROM {} WHERE {}=? LIMIT 1",
        table.as_str(),
        table.primary_key()
    );
    let found: Option<i64> = conn.query_row(&sql, [id], |row| row.get(0)).optional()?;
    match found {
        Some(_) => Ok(()),
        None => Err(KernelError::NotFound {
            what: table.as_str(),
            id,
        }),
    }
}

pub(crate) fn query_species(conn: &Connection) -> Result<Vec<Species>> {
    let mut stmt = conn.prepare(
        "SELECT species_id, common_name, scientific_name, conservation_status FROM Species ORDER BY species_id",
    )?;
    let rows = stmt.query_map([], species_from_row)?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub(crate) fn query_locations(conn: &Connection) -> Result<Vec<Location>> {
    let mut stmt = conn.prepare(
        "SELECT location_id, location_name, region, water_type FROM Location ORDER BY location_id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(Location {
            location_id: row.get(0)?,
            location_name: row.get(1)?,
            region: row.get(2)?,
            water_type: row.get(3)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub(crate) fn query_observers(conn: &Connection) -> Result<Vec<Observer>> {
    let mut stmt = conn.prepare(
        "SELECT observer_id, name, organization, contact FROM Observer ORDER BY observer_id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(Observer {
            observer_id: row.get(0)?,
            name: row.get(1)?,
            organization: row.get(2)?,
            contact: row.get(3)?,
        })
    })?;
    Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
}

pub(crate) fn insert_observer(conn: &Connection, new: &NewObserver) -> Result<i64> {
    let name = required(&new.name, "observer name")?;
    conn.execute(
        "INSERT INTO Observer (name, organization, contact) VALUES (?, ?, ?)",
        params![
            name,
            non_blank(new.organization.as_deref()),
            non_blank(new.contact.as_deref())
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub(crate) fn insert_water_quality(
    conn: &Connection,
    location_id: i64,
    readings: &WaterReadings,
) -> Result<i64> {
    readings.validate()?;
    ensure_exists(conn, Table::Location, location_id)?;
    conn.execute(
        "INSERT INTO Water_Quality (location_id, temperature, pH, salinity, pollution_index) VALUES (?, ?, ?, ?, ?)",
        params![
            location_id,
            readings.temperature,
            readings.ph,
            readings.salinity,
            readings.pollution_index
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub(crate) fn insert_observation(conn: &Connection, new: &NewObservation) -> Result<i64> {
    ensure_exists(conn, Table::Species, new.species_id)?;
    ensure_exists(conn, Table::Location, new.location_id)?;
    ensure_exists(conn, Table::Observer, new.observer_id)?;
    if let Some(quality_id) = new.quality_id {
        ensure_exists(conn, Table::WaterQuality, quality_id)?;
    }
    conn.execute(
        "INSERT INTO Observation (species_id, location_id, observer_id, quality_id, obs_date, count_observed, remarks) VALUES (?, ?, ?, ?, ?, ?, ?)",
        params![
            new.species_id,
            new.location_id,
            new.observer_id,
            new.quality_id,
            new.obs_date,
            new.count_observed,
            non_blank(new.remarks.as_deref())
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn json_value(value: ValueRef<'_>) -> serde_json::Value {
    match value {
        ValueRef::Null => serde_json::Value::Null,
        ValueRef::Integer(i) => serde_json::Value::from(i),
        ValueRef::Real(f) => serde_json::Number::from_f64(f)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        ValueRef::Text(t) => serde_json::Value::String(String::from_utf8_lossy(t).into_owned()),
        ValueRef::Blob(b) => serde_json::Value::String(format!("<{} bytes>", b.len())),
    }
}

impl Kernel {
    pub fn list_species(&self) -> Result<Vec<Species>> {
        query_species(&self.conn()?)
    }

    pub fn list_locations(&self) -> Result<Vec<Location>> {
        query_locations(&self.conn()?)
    }

    pub fn list_observers(&self) -> Result<Vec<Observer>> {
        query_observers(&self.conn()?)
    }

    pub fn add_species(&self, new: &NewSpecies) -> Result<i64> {
        let common_name = required(&new.common_name, "common name")?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO Species (common_name, scientific_name, conservation_status) VALUES (?, ?, ?)",
            params![
                common_name,
                non_blank(new.scientific_name.as_deref()),
                new.conservation_status.as_str()
            ],
        )?;
        let id = conn.last_insert_rowid();
        debug!(species_id = id, "species added");
        Ok(id)
    }

    pub fn add_observer(&self, new: &NewObserver) -> Result<i64> {
        let id = insert_observer(&self.conn()?, new)?;
        debug!(observer_id = id, "observer added");
        Ok(id)
    }

    pub fn add_location(&self, new: &NewLocation) -> Result<i64> {
        let location_name = required(&new.location_name, "location name")?;
        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO Location (location_name, region, water_type) VALUES (?, ?, ?)",
            params![
                location_name,
                non_blank(new.region.as_deref()),
                non_blank(new.water_type.as_deref())
            ],
        )?;
        let id = conn.last_insert_rowid();
        debug!(location_id = id, "location added");
        Ok(id)
    }

    pub fn add_water_quality(&self, location_id: i64, readings: &WaterReadings) -> Result<i64> {
        let id = insert_water_quality(&self.conn()?, location_id, readings)?;
        debug!(quality_id = id, location_id, "water quality recorded");
        Ok(id)
    }

    pub fn add_observation(&self, new: &NewObservation) -> Result<i64> {
        let id = insert_observation(&self.conn()?, new)?;
        debug!(obs_id = id, "observation logged");
        Ok(id)
    }

    pub fn add_conservation_action(&self, new: &NewConservationAction) -> Result<i64> {
        let action_type = required(&new.action_type, "action type")?;
        if let Some(end) = new.end_date {
            if end < new.start_date {
                return Err(KernelError::validation(
                    "end date must not precede start date",
                ));
            }
        }
        let conn = self.conn()?;
        ensure_exists(&conn, Table::Species, new.species_id)?;
        conn.execute(
            "INSERT INTO Conservation_Action (species_id, action_type, description, start_date, end_date) VALUES (?, ?, ?, ?, ?)",
            params![
                new.species_id,
                action_type,
                non_blank(new.description.as_deref()),
                new.start_date,
                new.end_date
            ],
        )?;
        let id = conn.last_insert_rowid();
        debug!(action_id = id, species_id = new.species_id, "conservation action added");
        Ok(id)
    }

    pub fn search_species(&self, term: &str) -> Result<Vec<SpeciesMatch>> {
        let term = term.trim();
        if term.is_empty() {
            return Err(KernelError::validation("Please enter a search term"));
        }
        let like = format!("%{term}%");
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT s.species_id, s.common_name, s.scientific_name, s.conservation_status,
                    (SELECT COUNT(*) FROM Observation o WHERE o.species_id = s.species_id) AS total_observations
             FROM Species s
             WHERE s.common_name LIKE ?1 OR s.scientific_name LIKE ?1
             ORDER BY s.species_id",
        )?;
        let rows = stmt.query_map([like], |row| {
            Ok(SpeciesMatch {
                species: species_from_row(row)?,
                total_observations: row.get(4)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn actions_for_species(&self, species_id: i64) -> Result<Vec<ConservationAction>> {
        let conn = self.conn()?;
        ensure_exists(&conn, Table::Species, species_id)?;
        let mut stmt = conn.prepare(
            "SELECT action_id, action_type, description, start_date, end_date
             FROM Conservation_Action
             WHERE species_id = ?
             ORDER BY action_id",
        )?;
        let rows = stmt.query_map([species_id], action_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn recent_observations(&self, limit: i64) -> Result<Vec<RecentObservation>> {
        let limit = limit.clamp(1, MAX_RECENT_LIMIT);
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT o.obs_id, s.common_name, l.location_name, o.obs_date, o.count_observed, o.remarks
             FROM Observation o
             LEFT JOIN Species s ON o.species_id = s.species_id
             LEFT JOIN Location l ON o.location_id = l.location_id
             ORDER BY o.obs_date DESC, o.obs_id DESC
             LIMIT ?",
        )?;
        let rows = stmt.query_map([limit], recent_from_row)?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn list_conservation_actions(&self) -> Result<Vec<ActionOverview>> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT ca.action_id, s.common_name, ca.action_type, ca.description, ca.start_date, ca.end_date
             FROM Conservation_Action ca
             JOIN Species s ON ca.species_id = s.species_id
             ORDER BY ca.start_date DESC, ca.action_id DESC",
        )?;
        let rows = stmt.query_map([], |row| {
            Ok(ActionOverview {
                action_id: row.get(0)?,
                common_name: row.get(1)?,
                action_type: row.get(2)?,
                description: row.get(3)?,
                start_date: date_at(row, 4)?,
                end_date: date_at(row, 5)?,
            })
        })?;
        Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
    }

    pub fn count_rows(&self, table: Table) -> Result<i64> {
        let conn = self.conn()?;
        let sql = format!("SELECT COUNT(*) FROM {}", table.as_str());
        Ok(conn.query_row(&sql, [], |row| row.get(0))?)
    }

    pub fn dashboard(&self) -> Result<Dashboard> {
        let totals = Totals {
            species: self.count_rows(Table::Species)?,
            locations: self.count_rows(Table::Location)?,
            observations: self.count_rows(Table::Observation)?,
            actions: self.count_rows(Table::ConservationAction)?,
        };
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT conservation_status, COUNT(*) AS count
             FROM Species
             GROUP BY conservation_status
             ORDER BY conservation_status",
        )?;
        let species_by_status = stmt
            .query_map([], |row| {
                Ok(StatusCount {
                    conservation_status: row.get(0)?,
                    count: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        let mut stmt = conn.prepare(
            "SELECT l.region, AVG(wq.pollution_index) AS avg_pollution
             FROM Water_Quality wq
             JOIN Location l ON wq.location_id = l.location_id
             GROUP BY l.region
             ORDER BY l.region",
        )?;
        let pollution_by_region = stmt
            .query_map([], |row| {
                Ok(RegionPollution {
                    region: row.get(0)?,
                    avg_pollution: row.get(1)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(Dashboard {
            totals,
            species_by_status,
            pollution_by_region,
            recent_observations: self.recent_observations(DASHBOARD_RECENT_LIMIT)?,
        })
    }

    /// Read rows from a whitelisted table. Only canonical names from
    /// [`Table::columns`] ever reach the SQL text.
    pub fn browse_table(&self, table: Table, columns: &[String], limit: i64) -> Result<BrowseResult> {
        let columns = table.select_columns(columns)?;
        let limit = limit.clamp(1, MAX_BROWSE_LIMIT);
        let sql = format!(
            "SELECT {} FROM {} ORDER BY {} LIMIT ?",
            columns.join(", "),
            table.as_str(),
            table.primary_key()
        );
        let conn = self.conn()?;
        let mut stmt = conn.prepare(&sql)?;
        let mut rows = stmt.query([limit])?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut obj = serde_json::Map::with_capacity(columns.len());
            for (idx, col) in columns.iter().enumerate() {
                obj.insert((*col).to_string(), json_value(row.get_ref(idx)?));
            }
            out.push(obj);
        }
        Ok(BrowseResult {
            table: table.as_str(),
            columns,
            rows: out,
        })
    }
}
