// 🏷️ Band Classification - Age ranges as data
// Maps an age to a named education band. First matching range wins.

use anyhow::{Context as AnyhowContext, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::Path;

/// Upper age bound of the last canonical band
pub const CANONICAL_OTHER_HIGHER_ED_MAX: u32 = 99;

/// Lower bound of the OtherHigherEd range in the canonical table
pub const OTHER_HIGHER_ED_MIN: u32 = 27;

// ============================================================================
// BAND
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Band {
    Kinder,
    PreK,
    Primary,
    Secondary,
    University,
    OtherHigherEd,
    /// Sentinel for ages no range covers
    NotApplicable,
}

impl Band {
    pub const ALL: [Band; 7] = [
        Band::Kinder,
        Band::PreK,
        Band::Primary,
        Band::Secondary,
        Band::University,
        Band::OtherHigherEd,
        Band::NotApplicable,
    ];

    /// Canonical name used for lookups and serialization
    pub fn as_str(&self) -> &'static str {
        match self {
            Band::Kinder => "Kinder",
            Band::PreK => "PreK",
            Band::Primary => "Primary",
            Band::Secondary => "Secondary",
            Band::University => "University",
            Band::OtherHigherEd => "OtherHigherEd",
            Band::NotApplicable => "NotApplicable",
        }
    }

    /// Human-readable label
    pub fn description(&self) -> &'static str {
        match self {
            Band::Kinder => "Kindergarten",
            Band::PreK => "Pre-kindergarten",
            Band::Primary => "Primary school",
            Band::Secondary => "Secondary school",
            Band::University => "University or institute",
            Band::OtherHigherEd => "Other higher education",
            Band::NotApplicable => "Not applicable to any education level",
        }
    }

    /// Numeric code used in feature vectors
    pub fn code(&self) -> u8 {
        match self {
            Band::NotApplicable => 0,
            Band::Kinder => 1,
            Band::PreK => 2,
            Band::Primary => 3,
            Band::Secondary => 4,
            Band::University => 5,
            Band::OtherHigherEd => 6,
        }
    }

    /// Parse a canonical name or description (case-insensitive)
    pub fn from_name(name: &str) -> Option<Band> {
        let needle = name.trim();
        Band::ALL.into_iter().find(|band| {
            band.as_str().eq_ignore_ascii_case(needle) || band.description().eq_ignore_ascii_case(needle)
        })
    }
}

impl fmt::Display for Band {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// BAND RULE
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BandRule {
    /// Inclusive lower bound
    pub min_age: u32,

    /// Inclusive upper bound
    pub max_age: u32,

    pub band: Band,
}

impl BandRule {
    pub fn new(min_age: u32, max_age: u32, band: Band) -> Self {
        BandRule {
            min_age,
            max_age,
            band,
        }
    }

    pub fn matches(&self, age: u32) -> bool {
        self.min_age <= age && age <= self.max_age
    }
}

// ============================================================================
// BAND TABLE
// ============================================================================

/// Ordered range table. Rules are never re-sorted: declaration order decides
/// which of two overlapping ranges wins.
#[derive(Debug, Clone, PartialEq)]
pub struct BandTable {
    rules: Vec<BandRule>,
}

impl BandTable {
    /// Canonical table. Age 26 is intentionally uncovered.
    pub fn canonical() -> Self {
        BandTable {
            rules: vec![
                BandRule::new(3, 4, Band::Kinder),
                BandRule::new(5, 5, Band::PreK),
                BandRule::new(6, 12, Band::Primary),
                BandRule::new(13, 17, Band::Secondary),
                BandRule::new(18, 25, Band::University),
                BandRule::new(OTHER_HIGHER_ED_MIN, CANONICAL_OTHER_HIGHER_ED_MAX, Band::OtherHigherEd),
            ],
        }
    }

    /// Canonical table with a different upper bound on the OtherHigherEd range
    pub fn with_last_upper_bound(max_age: u32) -> Self {
        let mut table = BandTable::canonical();
        for rule in table.rules.iter_mut().filter(|r| r.band == Band::OtherHigherEd) {
            rule.max_age = max_age;
        }
        table
    }

    /// Create table from a list of rules, keeping their order
    pub fn from_rules(rules: Vec<BandRule>) -> Self {
        BandTable { rules }
    }

    /// Load rules from JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read band rules file: {:?}", path.as_ref()))?;

        let rules: Vec<BandRule> =
            serde_json::from_str(&content).context("Failed to parse band rules JSON")?;

        Ok(BandTable::from_rules(rules))
    }

    /// Band of the first rule covering `age`, or the sentinel
    pub fn classify(&self, age: u32) -> Band {
        self.rules
            .iter()
            .find(|rule| rule.matches(age))
            .map(|rule| rule.band)
            .unwrap_or(Band::NotApplicable)
    }

    pub fn rules(&self) -> &[BandRule] {
        &self.rules
    }

    pub fn rule_count(&self) -> usize {
        self.rules.len()
    }
}

impl Default for BandTable {
    fn default() -> Self {
        Self::canonical()
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_classification() {
        let table = BandTable::canonical();

        assert_eq!(table.classify(3), Band::Kinder);
        assert_eq!(table.classify(4), Band::Kinder);
        assert_eq!(table.classify(5), Band::PreK);
        assert_eq!(table.classify(6), Band::Primary);
        assert_eq!(table.classify(12), Band::Primary);
        assert_eq!(table.classify(13), Band::Secondary);
        assert_eq!(table.classify(17), Band::Secondary);
        assert_eq!(table.classify(18), Band::University);
        assert_eq!(table.classify(25), Band::University);
        assert_eq!(table.classify(27), Band::OtherHigherEd);
        assert_eq!(table.classify(99), Band::OtherHigherEd);
    }

    #[test]
    fn test_uncovered_ages_fall_to_sentinel() {
        let table = BandTable::canonical();

        assert_eq!(table.classify(0), Band::NotApplicable);
        assert_eq!(table.classify(2), Band::NotApplicable);
        assert_eq!(table.classify(26), Band::NotApplicable);
        assert_eq!(table.classify(100), Band::NotApplicable);
        assert_eq!(table.classify(u32::MAX), Band::NotApplicable);
    }

    #[test]
    fn test_last_upper_bound_variant() {
        let table = BandTable::with_last_upper_bound(35);

        assert_eq!(table.classify(35), Band::OtherHigherEd);
        assert_eq!(table.classify(36), Band::NotApplicable);
        assert_eq!(table.classify(98), Band::NotApplicable);
        assert_eq!(BandTable::canonical().classify(36), Band::OtherHigherEd);
    }

    #[test]
    fn test_first_match_wins() {
        let table = BandTable::from_rules(vec![
            BandRule::new(5, 10, Band::PreK),
            BandRule::new(6, 12, Band::Primary),
        ]);

        assert_eq!(table.classify(7), Band::PreK);
        assert_eq!(table.classify(11), Band::Primary);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let table = BandTable::canonical();
        for age in 0..120 {
            assert_eq!(table.classify(age), table.classify(age));
        }
    }

    #[test]
    fn test_band_codes() {
        assert_eq!(Band::NotApplicable.code(), 0);
        assert_eq!(Band::Kinder.code(), 1);
        assert_eq!(Band::PreK.code(), 2);
        assert_eq!(Band::Primary.code(), 3);
        assert_eq!(Band::Secondary.code(), 4);
        assert_eq!(Band::University.code(), 5);
        assert_eq!(Band::OtherHigherEd.code(), 6);
    }

    #[test]
    fn test_band_from_name() {
        assert_eq!(Band::from_name("Primary"), Some(Band::Primary));
        assert_eq!(Band::from_name("primary"), Some(Band::Primary));
        assert_eq!(Band::from_name("Secondary school"), Some(Band::Secondary));
        assert_eq!(Band::from_name("Astronaut"), None);
    }

    #[test]
    fn test_rules_from_json() {
        let json = r#"[
            {"min_age": 3, "max_age": 4, "band": "Kinder"},
            {"min_age": 27, "max_age": 35, "band": "OtherHigherEd"}
        ]"#;
        let rules: Vec<BandRule> = serde_json::from_str(json).unwrap();
        let table = BandTable::from_rules(rules);

        assert_eq!(table.rule_count(), 2);
        assert_eq!(table.classify(4), Band::Kinder);
        assert_eq!(table.classify(30), Band::OtherHigherEd);
        assert_eq!(table.classify(10), Band::NotApplicable);
    }
}
