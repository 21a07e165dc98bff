// 🧑 Person Entity - identity + birth date, derived age and band
//
// Identity: UUID (never changes)
// Values: name parts and birth date, fixed at registration
// Derived: age and band, computed once against the evaluation date
//
// There are no setters. A corrected birth date means a new Person.

use crate::bands::{Band, BandTable};
use crate::config::SurnameField;
use crate::error::{InputError, RosterResult};
use crate::temporal::{self, DEFAULT_MAX_AGE_YEARS};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use std::fmt;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Person {
    /// Stable identity (UUID)
    id: String,

    /// One or more name/surname strings, in entry order
    name_parts: Vec<String>,

    birth_date: NaiveDate,

    /// Date age and band were evaluated against
    evaluated_on: NaiveDate,

    age: u32,
    band: Band,

    /// Level the registrar declared; informational only
    declared_level: Option<Band>,

    registered_at: DateTime<Utc>,
}

impl Person {
    /// Create a person evaluated against today with the canonical band table
    pub fn new(name_parts: Vec<String>, birth_date: NaiveDate) -> RosterResult<Self> {
        Person::new_as_of(
            name_parts,
            birth_date,
            temporal::today(),
            &BandTable::canonical(),
            DEFAULT_MAX_AGE_YEARS,
        )
    }

    /// Create a person evaluated against an explicit date and band table
    pub fn new_as_of(
        name_parts: Vec<String>,
        birth_date: NaiveDate,
        today: NaiveDate,
        table: &BandTable,
        max_age_years: u32,
    ) -> RosterResult<Self> {
        let name_parts: Vec<String> = name_parts
            .into_iter()
            .map(|part| part.trim().to_string())
            .filter(|part| !part.is_empty())
            .collect();

        if name_parts.is_empty() {
            return Err(InputError::EmptyName.into());
        }

        temporal::validate_birth_date(birth_date, today, max_age_years)?;

        let age = temporal::age_on(birth_date, today);

        Ok(Person {
            id: uuid::Uuid::new_v4().to_string(),
            name_parts,
            birth_date,
            evaluated_on: today,
            age,
            band: table.classify(age),
            declared_level: None,
            registered_at: Utc::now(),
        })
    }

    /// Builder pattern: attach the declared education level
    pub fn with_declared_level(mut self, level: Band) -> Self {
        self.declared_level = Some(level);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name_parts(&self) -> &[String] {
        &self.name_parts
    }

    /// All name parts joined with spaces
    pub fn full_name(&self) -> String {
        self.name_parts.join(" ")
    }

    /// Name part used as surname. Single-part names use that part either way.
    pub fn surname(&self, field: SurnameField) -> &str {
        let part = match field {
            SurnameField::First => self.name_parts.first(),
            SurnameField::Last => self.name_parts.last(),
        };
        part.map(String::as_str).unwrap_or_default()
    }

    pub fn birth_date(&self) -> NaiveDate {
        self.birth_date
    }

    pub fn evaluated_on(&self) -> NaiveDate {
        self.evaluated_on
    }

    pub fn age(&self) -> u32 {
        self.age
    }

    pub fn band(&self) -> Band {
        self.band
    }

    pub fn declared_level(&self) -> Option<Band> {
        self.declared_level
    }

    pub fn registered_at(&self) -> DateTime<Utc> {
        self.registered_at
    }

    /// Plot annotation text: "<full name> (<age> years)"
    pub fn label(&self) -> String {
        format!("{} ({} years)", self.full_name(), self.age)
    }
}

impl fmt::Display for Person {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Name: {}", self.full_name())?;
        writeln!(f, "Birth date: {}", temporal::format_birth_date(self.birth_date))?;
        writeln!(f, "Age: {} years", self.age)?;
        writeln!(f, "Band: {}", self.band.description())?;
        if let Some(level) = self.declared_level {
            writeln!(f, "Declared level: {}", level.description())?;
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RosterError;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn names(parts: &[&str]) -> Vec<String> {
        parts.iter().map(|p| p.to_string()).collect()
    }

    fn person(parts: &[&str], birth: NaiveDate, today: NaiveDate) -> RosterResult<Person> {
        Person::new_as_of(names(parts), birth, today, &BandTable::canonical(), 100)
    }

    #[test]
    fn test_person_creation_derives_age_and_band() {
        let p = person(&["Ana", "Torres"], date(2014, 9, 1), date(2024, 8, 31)).unwrap();

        assert!(!p.id().is_empty());
        assert_eq!(p.full_name(), "Ana Torres");
        assert_eq!(p.age(), 9);
        assert_eq!(p.band(), Band::Primary);
        assert_eq!(p.declared_level(), None);
        assert_eq!(p.evaluated_on(), date(2024, 8, 31));
    }

    #[test]
    fn test_age_26_is_not_applicable() {
        let p = person(&["Luis"], date(1998, 1, 1), date(2024, 6, 1)).unwrap();

        assert_eq!(p.age(), 26);
        assert_eq!(p.band(), Band::NotApplicable);
    }

    #[test]
    fn test_person_rejects_future_birth_date() {
        let result = person(&["Ana"], date(2025, 1, 1), date(2024, 1, 1));

        assert!(matches!(
            result,
            Err(RosterError::InvalidInput(InputError::FutureDate { .. }))
        ));
    }

    #[test]
    fn test_person_rejects_too_old_birth_date() {
        let result = person(&["Ana"], date(1900, 1, 1), date(2024, 1, 1));

        assert!(matches!(
            result,
            Err(RosterError::InvalidInput(InputError::TooOld { .. }))
        ));
    }

    #[test]
    fn test_person_rejects_empty_name() {
        let result = person(&["  ", ""], date(2010, 1, 1), date(2024, 1, 1));

        assert_eq!(result, Err(RosterError::InvalidInput(InputError::EmptyName)));
    }

    #[test]
    fn test_surname_field() {
        let p = person(&["Maria", "Jose", "Perez"], date(2000, 1, 1), date(2024, 1, 1)).unwrap();

        assert_eq!(p.surname(SurnameField::Last), "Perez");
        assert_eq!(p.surname(SurnameField::First), "Maria");

        let single = person(&["Cher"], date(2000, 1, 1), date(2024, 1, 1)).unwrap();
        assert_eq!(single.surname(SurnameField::Last), "Cher");
    }

    #[test]
    fn test_name_parts_are_trimmed() {
        let p = person(&[" Ana ", "", "Lopez "], date(2000, 1, 1), date(2024, 1, 1)).unwrap();

        assert_eq!(p.name_parts(), &["Ana".to_string(), "Lopez".to_string()]);
    }

    #[test]
    fn test_label_and_display() {
        let p = person(&["Ana", "Lopez"], date(2010, 3, 4), date(2024, 3, 4))
            .unwrap()
            .with_declared_level(Band::Secondary);

        assert_eq!(p.label(), "Ana Lopez (14 years)");

        let text = p.to_string();
        assert!(text.contains("Name: Ana Lopez"));
        assert!(text.contains("Birth date: 04/03/2010"));
        assert!(text.contains("Age: 14 years"));
        assert!(text.contains("Band: Secondary school"));
        assert!(text.contains("Declared level: Secondary school"));
    }

    #[test]
    fn test_identity_is_unique() {
        let a = person(&["Ana"], date(2010, 1, 1), date(2024, 1, 1)).unwrap();
        let b = person(&["Ana"], date(2010, 1, 1), date(2024, 1, 1)).unwrap();

        assert_ne!(a.id(), b.id());
    }
}
