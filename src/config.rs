// ⚙️ Roster Configuration
// Loaded from JSON; every field has a default so partial files are fine.

use crate::bands::{BandTable, CANONICAL_OTHER_HIGHER_ED_MAX, OTHER_HIGHER_ED_MIN};
use crate::temporal::DEFAULT_MAX_AGE_YEARS;
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Rosters at or below this size get per-point labels in plots
pub const DEFAULT_LABEL_THRESHOLD: usize = 20;

/// Which name part is the surname for initial lookups
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurnameField {
    First,
    #[default]
    Last,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RosterConfig {
    /// Annotate projected points when roster size <= this
    pub label_threshold: usize,

    pub surname_field: SurnameField,

    /// Upper bound of the OtherHigherEd range (99 canonical, 35 in the short variant)
    pub other_higher_ed_max: u32,

    /// Oldest accepted birth year, relative to today's year
    pub max_age_years: u32,

    /// Optional JSON band rules file; overrides `other_higher_ed_max`
    pub band_rules_path: Option<PathBuf>,
}

impl Default for RosterConfig {
    fn default() -> Self {
        RosterConfig {
            label_threshold: DEFAULT_LABEL_THRESHOLD,
            surname_field: SurnameField::Last,
            other_higher_ed_max: CANONICAL_OTHER_HIGHER_ED_MAX,
            max_age_years: DEFAULT_MAX_AGE_YEARS,
            band_rules_path: None,
        }
    }
}

impl RosterConfig {
    /// Load configuration from JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file: {:?}", path.as_ref()))?;

        let config: RosterConfig =
            serde_json::from_str(&content).context("Failed to parse config JSON")?;
        config.validate()?;

        Ok(config)
    }

    /// Reject an OtherHigherEd bound that would leave the band unreachable
    pub fn validate(&self) -> Result<()> {
        if self.other_higher_ed_max < OTHER_HIGHER_ED_MIN {
            bail!(
                "other_higher_ed_max must be at least {} (got {})",
                OTHER_HIGHER_ED_MIN,
                self.other_higher_ed_max
            );
        }

        Ok(())
    }

    /// Band table this configuration selects
    pub fn band_table(&self) -> Result<BandTable> {
        self.validate()?;

        match &self.band_rules_path {
            Some(path) => BandTable::from_file(path),
            None if self.other_higher_ed_max == CANONICAL_OTHER_HIGHER_ED_MAX => {
                Ok(BandTable::canonical())
            }
            None => Ok(BandTable::with_last_upper_bound(self.other_higher_ed_max)),
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
