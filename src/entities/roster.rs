// 📋 Roster - ordered, append-only collection of people
//
// Owned by the session that created it and passed by reference.
// Registration takes the write lock; every query reads a stable snapshot
// and returns matches in insertion order.

use crate::bands::{Band, BandTable};
use crate::config::RosterConfig;
use crate::entities::Person;
use crate::error::{InputError, RosterError, RosterResult};
use crate::projection::{self, Projection};
use crate::temporal;
use anyhow::Result;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::debug;

pub struct Roster {
    /// All registered people (append-only)
    people: Arc<RwLock<Vec<Person>>>,

    config: RosterConfig,

    table: BandTable,
}

impl Roster {
    /// Empty roster with default configuration
    pub fn new() -> Self {
        Roster::with_table(RosterConfig::default(), BandTable::canonical())
    }

    /// Empty roster using the band table the configuration selects
    pub fn with_config(config: RosterConfig) -> Result<Self> {
        let table = config.band_table()?;
        Ok(Roster::with_table(config, table))
    }

    pub fn with_table(config: RosterConfig, table: BandTable) -> Self {
        Roster {
            people: Arc::new(RwLock::new(Vec::new())),
            config,
            table,
        }
    }

    pub fn config(&self) -> &RosterConfig {
        &self.config
    }

    pub fn band_table(&self) -> &BandTable {
        &self.table
    }

    // ========================================================================
    // REGISTRATION
    // ========================================================================

    /// Append an already built person
    pub fn register(&self, person: Person) {
        debug!(id = person.id(), age = person.age(), band = %person.band(), "registering person");
        let mut people = self.people.write().unwrap_or_else(PoisonError::into_inner);
        people.push(person);
    }

    /// Build a person against today with this roster's table and register it
    pub fn register_new(&self, name_parts: Vec<String>, birth_date: NaiveDate) -> RosterResult<Person> {
        self.register_new_as_of(name_parts, birth_date, temporal::today())
    }

    /// Build a person against `today` and register it. Nothing is appended on error.
    pub fn register_new_as_of(
        &self,
        name_parts: Vec<String>,
        birth_date: NaiveDate,
        today: NaiveDate,
    ) -> RosterResult<Person> {
        let person = Person::new_as_of(
            name_parts,
            birth_date,
            today,
            &self.table,
            self.config.max_age_years,
        )?;
        self.register(person.clone());
        Ok(person)
    }

    /// Stable copy of the roster in insertion order
    pub fn snapshot(&self) -> Vec<Person> {
        self.people
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn len(&self) -> usize {
        self.people.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // ========================================================================
    // QUERIES
    // ========================================================================

    fn filter<F>(&self, predicate: F) -> Vec<Person>
    where
        F: Fn(&Person) -> bool,
    {
        let people = self.people.read().unwrap_or_else(PoisonError::into_inner);
        people.iter().filter(|p| predicate(p)).cloned().collect()
    }

    /// People with `min <= age <= max`
    pub fn find_by_age_range(&self, min: i64, max: i64) -> RosterResult<Vec<Person>> {
        if min > max || min < 0 {
            return Err(RosterError::InvalidRange { min, max });
        }

        let found = self.filter(|p| {
            let age = i64::from(p.age());
            min <= age && age <= max
        });
        debug!(min, max, found = found.len(), "age range query");
        Ok(found)
    }

    /// People whose derived band matches `band_name`. Unknown names match nobody.
    pub fn find_by_band(&self, band_name: &str) -> Vec<Person> {
        match Band::from_name(band_name) {
            Some(band) => self.filter(|p| p.band() == band),
            None => {
                debug!(band_name, "unknown band name");
                Vec::new()
            }
        }
    }

    pub fn find_by_exact_age(&self, age: u32) -> Vec<Person> {
        self.filter(|p| p.age() == age)
    }

    /// People whose configured surname starts with `letter` (case-insensitive)
    pub fn find_by_surname_initial(&self, letter: &str) -> RosterResult<Vec<Person>> {
        let mut chars = letter.chars();
        let initial = match (chars.next(), chars.next()) {
            (Some(c), None) if c.is_alphabetic() => c,
            _ => return Err(InputError::NotSingleLetter(letter.to_string()).into()),
        };

        let field = self.config.surname_field;
        Ok(self.filter(|p| {
            p.surname(field)
                .chars()
                .next()
                .map_or(false, |first| first.to_lowercase().eq(initial.to_lowercase()))
        }))
    }

    pub fn find_by_birth_date(&self, birth_date: NaiveDate) -> Vec<Person> {
        self.filter(|p| p.birth_date() == birth_date)
    }

    // ========================================================================
    // SUMMARIES
    // ========================================================================

    /// Mean age over the whole roster, None when empty
    pub fn mean_age(&self) -> Option<f64> {
        let people = self.people.read().unwrap_or_else(PoisonError::into_inner);
        if people.is_empty() {
            return None;
        }
        let total: f64 = people.iter().map(|p| f64::from(p.age())).sum();
        Some(total / people.len() as f64)
    }

    /// Mean age within each band present in the roster
    pub fn mean_age_by_band(&self) -> BTreeMap<Band, f64> {
        projection::mean_age_by_band(&self.snapshot())
    }

    /// Number of people per band present in the roster
    pub fn band_counts(&self) -> BTreeMap<Band, usize> {
        let people = self.people.read().unwrap_or_else(PoisonError::into_inner);
        let mut counts = BTreeMap::new();
        for person in people.iter() {
            *counts.entry(person.band()).or_insert(0) += 1;
        }
        counts
    }

    // ========================================================================
    // PROJECTION
    // ========================================================================

    /// Run the projection pipeline over a snapshot of the roster
    pub fn project(&self) -> RosterResult<Projection> {
        projection::project(&self.snapshot(), &self.config)
    }
}

impl Default for Roster {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SurnameField;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn add(roster: &Roster, parts: &[&str], age: i32) -> Person {
        let birth = NaiveDate::from_ymd_opt(2024 - age, 1, 15).unwrap();
        roster
            .register_new_as_of(parts.iter().map(|p| p.to_string()).collect(), birth, today())
            .unwrap()
    }

    fn sample_roster() -> Roster {
        let roster = Roster::new();
        add(&roster, &["Ana", "Gomez"], 5);
        add(&roster, &["Bruno", "Diaz"], 20);
        add(&roster, &["Carla", "Ruiz"], 25);
        add(&roster, &["Dario", "daza"], 30);
        add(&roster, &["Elena", "Vega"], 40);
        roster
    }

    fn ages(people: &[Person]) -> Vec<u32> {
        people.iter().map(|p| p.age()).collect()
    }

    #[test]
    fn test_registration_preserves_order() {
        let roster = sample_roster();

        assert_eq!(roster.len(), 5);
        assert!(!roster.is_empty());
        assert_eq!(ages(&roster.snapshot()), vec![5, 20, 25, 30, 40]);
    }

    #[test]
    fn test_find_by_age_range() {
        let roster = sample_roster();
        let found = roster.find_by_age_range(20, 30).unwrap();

        assert_eq!(ages(&found), vec![20, 25, 30]);
        assert_eq!(found[0].full_name(), "Bruno Diaz");
        assert_eq!(found[2].full_name(), "Dario daza");
    }

    #[test]
    fn test_find_by_age_range_invalid() {
        let roster = sample_roster();

        assert_eq!(
            roster.find_by_age_range(10, 5).unwrap_err(),
            RosterError::InvalidRange { min: 10, max: 5 }
        );
        assert!(matches!(
            roster.find_by_age_range(-1, 5),
            Err(RosterError::InvalidRange { .. })
        ));
    }

    #[test]
    fn test_find_on_empty_roster() {
        let roster = Roster::new();

        assert!(roster.find_by_age_range(0, 100).unwrap().is_empty());
        assert!(roster.find_by_band("Primary").is_empty());
        assert!(roster.mean_age().is_none());
    }

    #[test]
    fn test_find_by_band() {
        let roster = sample_roster();

        assert_eq!(ages(&roster.find_by_band("University")), vec![20, 25]);
        assert_eq!(ages(&roster.find_by_band("OtherHigherEd")), vec![30, 40]);
        assert_eq!(ages(&roster.find_by_band("PreK")), vec![5]);
        assert!(roster.find_by_band("Kinder").is_empty());
        assert!(roster.find_by_band("Astronaut").is_empty());
    }

    #[test]
    fn test_find_by_exact_age() {
        let roster = sample_roster();
        add(&roster, &["Fede", "Sosa"], 20);

        let found = roster.find_by_exact_age(20);
        assert_eq!(found.len(), 2);
        assert_eq!(found[1].full_name(), "Fede Sosa");
        assert!(roster.find_by_exact_age(99).is_empty());
    }

    #[test]
    fn test_find_by_surname_initial() {
        let roster = sample_roster();

        let found = roster.find_by_surname_initial("d").unwrap();
        assert_eq!(ages(&found), vec![20, 30]);

        let found = roster.find_by_surname_initial("V").unwrap();
        assert_eq!(ages(&found), vec![40]);
    }

    #[test]
    fn test_find_by_surname_initial_rejects_bad_input() {
        let roster = sample_roster();

        for bad in ["", "ab", "1", " ", "?"] {
            assert!(matches!(
                roster.find_by_surname_initial(bad),
                Err(RosterError::InvalidInput(InputError::NotSingleLetter(_)))
            ));
        }
    }

    #[test]
    fn test_find_by_surname_initial_first_field() {
        let config = RosterConfig {
            surname_field: SurnameField::First,
            ..RosterConfig::default()
        };
        let roster = Roster::with_table(config, BandTable::canonical());
        add(&roster, &["Gomez", "Ana"], 10);
        add(&roster, &["Ruiz", "Gabriel"], 11);

        assert_eq!(ages(&roster.find_by_surname_initial("g").unwrap()), vec![10]);
    }

    #[test]
    fn test_find_by_birth_date() {
        let roster = sample_roster();
        let birth = NaiveDate::from_ymd_opt(1999, 1, 15).unwrap();

        let found = roster.find_by_birth_date(birth);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].age(), 25);
    }

    #[test]
    fn test_rejected_registration_leaves_roster_unchanged() {
        let roster = sample_roster();
        let future = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap();

        let result = roster.register_new_as_of(vec!["Zoe".to_string()], future, today());
        assert!(matches!(result, Err(RosterError::InvalidInput(_))));
        assert_eq!(roster.len(), 5);
    }

    #[test]
    fn test_queries_do_not_mutate() {
        let roster = sample_roster();
        let before = roster.snapshot();

        let _ = roster.find_by_age_range(0, 100);
        let _ = roster.find_by_band("University");
        let _ = roster.find_by_surname_initial("x");

        assert_eq!(roster.snapshot(), before);
    }

    #[test]
    fn test_summaries() {
        let roster = sample_roster();

        assert_eq!(roster.mean_age(), Some(24.0));

        let by_band = roster.mean_age_by_band();
        assert_eq!(by_band.get(&Band::University), Some(&22.5));
        assert_eq!(by_band.get(&Band::OtherHigherEd), Some(&35.0));
        assert_eq!(by_band.get(&Band::PreK), Some(&5.0));
        assert!(by_band.get(&Band::Kinder).is_none());

        let counts = roster.band_counts();
        assert_eq!(counts.get(&Band::University), Some(&2));
        assert_eq!(counts.values().sum::<usize>(), 5);
    }

    #[test]
    fn test_short_variant_roster() {
        let config = RosterConfig {
            other_higher_ed_max: 35,
            ..RosterConfig::default()
        };
        let roster = Roster::with_config(config).unwrap();
        add(&roster, &["Old", "Timer"], 40);

        assert_eq!(roster.snapshot()[0].band(), Band::NotApplicable);
    }

    #[test]
    fn test_with_config_rejects_unreachable_last_band() {
        let config = RosterConfig {
            other_higher_ed_max: 20,
            ..RosterConfig::default()
        };

        assert!(Roster::with_config(config).is_err());
    }

    #[test]
    fn test_roster_projection() {
        let roster = sample_roster();

        let projection = roster.project().unwrap();

        assert_eq!(projection.coordinates.len(), 5);
        assert!(projection.coordinates.iter().all(|c| c.len() == 2));
        assert_eq!(projection.labels[0], "Ana Gomez (5 years)");
        assert!(projection.annotate);
        assert!((projection.mean_age - 24.0).abs() < 1e-9);

        let total: f64 = projection.explained_variance_ratio.iter().sum();
        assert!((total - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_roster_projection_needs_three_people() {
        let roster = Roster::new();
        add(&roster, &["Ana", "Gomez"], 5);
        add(&roster, &["Bruno", "Diaz"], 20);

        assert!(matches!(
            roster.project(),
            Err(RosterError::InsufficientData { .. })
        ));
    }
}
