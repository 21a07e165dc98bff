// Education Roster - Core Library
// Age/band classification, roster lookups and the projection pipeline.
// Exposes all modules for use in the CLI, the TUI and tests.

pub mod error;
pub mod temporal;
pub mod bands;
pub mod config;
pub mod entities;
pub mod features;
pub mod projection;
pub mod data_quality;
pub mod parser;

// Re-export commonly used types
pub use error::{InputError, RosterError, RosterResult};
pub use temporal::{age_on, parse_birth_date, validate_birth_date};
pub use bands::{Band, BandRule, BandTable};
pub use config::{RosterConfig, SurnameField};
pub use entities::{Person, Roster};
pub use features::{encode, feature_matrix, FeatureVector};
pub use projection::{project, PrincipalComponents, Projection, Standardizer};
pub use data_quality::{QualityEngine, QualityReport, QualityIssue, Severity, BatchSummary};
pub use parser::{ImportReport, RowError, RowRejection, import_into, load_roster_csv, parse_roster};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
