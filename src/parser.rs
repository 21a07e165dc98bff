// 📥 Roster Import - CSV rows → validated people
//
// Expected headers: name,surname,birth_date[,declared_level]
// Dates are DD/MM/YYYY. Each bad row is rejected with a structured reason and
// the rest of the file still loads.

use crate::bands::{Band, BandTable};
use crate::entities::{Person, Roster};
use crate::error::{InputError, RosterError};
use crate::temporal;
use anyhow::{Context, Result};
use chrono::NaiveDate;
use serde::Deserialize;
use std::io;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

// ============================================================================
// CORE TYPES
// ============================================================================

/// One CSV row, before validation
#[derive(Debug, Clone, Deserialize)]
pub struct RosterRow {
    pub name: String,

    #[serde(default)]
    pub surname: String,

    pub birth_date: String,

    #[serde(default)]
    pub declared_level: Option<String>,
}

impl RosterRow {
    /// Validate the row and build a person evaluated against `today`
    pub fn into_person(
        self,
        table: &BandTable,
        today: NaiveDate,
        max_age_years: u32,
    ) -> Result<Person, RosterError> {
        let birth_date = temporal::parse_birth_date(&self.birth_date)?;

        let declared = match self.declared_level.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(name) => Some(
                Band::from_name(name).ok_or_else(|| InputError::UnknownBand(name.to_string()))?,
            ),
        };

        let person = Person::new_as_of(
            vec![self.name, self.surname],
            birth_date,
            today,
            table,
            max_age_years,
        )?;

        Ok(match declared {
            Some(level) => person.with_declared_level(level),
            None => person,
        })
    }
}

#[derive(Debug, Error)]
pub enum RowError {
    #[error("unreadable row: {0}")]
    Unreadable(#[from] csv::Error),

    #[error(transparent)]
    Rejected(#[from] RosterError),
}

#[derive(Debug)]
pub struct RowRejection {
    /// 1-based line in the source, header included
    pub line: usize,
    pub error: RowError,
}

#[derive(Debug, Default)]
pub struct ImportReport {
    pub accepted: Vec<Person>,
    pub rejected: Vec<RowRejection>,
}

impl ImportReport {
    pub fn summary(&self) -> String {
        format!(
            "{} registered, {} rejected",
            self.accepted.len(),
            self.rejected.len()
        )
    }
}

// ============================================================================
// PARSING
// ============================================================================

/// Parse CSV from any reader. Nothing is registered.
pub fn parse_roster<R: io::Read>(
    reader: R,
    table: &BandTable,
    today: NaiveDate,
    max_age_years: u32,
) -> ImportReport {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(reader);

    let mut report = ImportReport::default();

    for (idx, result) in rdr.deserialize::<RosterRow>().enumerate() {
        let line = idx + 2;
        let outcome = result
            .map_err(RowError::from)
            .and_then(|row| {
                row.into_person(table, today, max_age_years)
                    .map_err(RowError::from)
            });

        match outcome {
            Ok(person) => report.accepted.push(person),
            Err(error) => {
                warn!(line, error = %error, "rejected roster row");
                report.rejected.push(RowRejection { line, error });
            }
        }
    }

    report
}

/// Parse from `reader` and register every accepted person into `roster`
pub fn import_into<R: io::Read>(roster: &Roster, reader: R, today: NaiveDate) -> ImportReport {
    let report = parse_roster(
        reader,
        roster.band_table(),
        today,
        roster.config().max_age_years,
    );
    for person in &report.accepted {
        roster.register(person.clone());
    }
    info!(
        accepted = report.accepted.len(),
        rejected = report.rejected.len(),
        "roster import finished"
    );
    report
}

/// Load a CSV file into `roster`, evaluating ages against today
pub fn load_roster_csv(csv_path: &Path, roster: &Roster) -> Result<ImportReport> {
    let file = std::fs::File::open(csv_path)
        .with_context(|| format!("Failed to open roster CSV: {:?}", csv_path))?;

    Ok(import_into(roster, file, temporal::today()))
}

// ============================================================================
// TESTS
// ============================================================================
