// ✅ Data Quality Engine - roster record checks
//
// Registrars may declare an education level alongside the birth date. The
// derived band is always authoritative; this engine reports where the two
// disagree, along with other record-level issues worth a human look.

use crate::bands::Band;
use crate::entities::Person;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ============================================================================
// VALIDATION RESULT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResult {
    pub passed: bool,
    pub rule_name: String,
    pub field: String,
    pub message: String,
    pub confidence: f64,
    pub severity: Severity,
}

impl ValidationResult {
    pub fn pass(rule_name: &str, field: &str, message: &str) -> Self {
        ValidationResult {
            passed: true,
            rule_name: rule_name.to_string(),
            field: field.to_string(),
            message: message.to_string(),
            confidence: 1.0,
            severity: Severity::Info,
        }
    }

    pub fn fail(rule_name: &str, field: &str, message: &str, severity: Severity) -> Self {
        ValidationResult {
            passed: false,
            rule_name: rule_name.to_string(),
            field: field.to_string(),
            message: message.to_string(),
            confidence: match severity {
                Severity::Critical => 0.0,
                Severity::Warning => 0.5,
                Severity::Info => 0.8,
            },
            severity,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Severity {
    Critical, // Record contradicts itself
    Warning,  // Record is questionable or incomplete
    Info,     // Record is valid but worth noting
}

// ============================================================================
// QUALITY REPORT
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityIssue {
    pub severity: Severity,
    pub field: String,
    pub issue: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityReport {
    pub person_id: String,
    pub person_name: String,
    pub overall_quality: f64,
    pub overall_confidence: f64,
    pub validations: Vec<ValidationResult>,
    pub issues: Vec<QualityIssue>,
    pub passed_count: usize,
    pub failed_count: usize,
    pub needs_review: bool,
}

impl QualityReport {
    pub fn summary(&self) -> String {
        format!(
            "{}: quality {:.1}%, confidence {:.1}%, issues: {}",
            self.person_name,
            self.overall_quality * 100.0,
            self.overall_confidence * 100.0,
            self.issues.len()
        )
    }

    pub fn has_critical_issues(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Critical)
    }
}

// ============================================================================
// QUALITY ENGINE
// ============================================================================

pub struct QualityEngine {
    /// Records with average confidence below this need review
    review_threshold: f64,
}

impl QualityEngine {
    pub fn new() -> Self {
        QualityEngine {
            review_threshold: 0.85,
        }
    }

    pub fn with_review_threshold(review_threshold: f64) -> Self {
        QualityEngine { review_threshold }
    }

    /// Validate one person as of `today`
    pub fn validate(&self, person: &Person, today: NaiveDate) -> QualityReport {
        let mut validations = Vec::new();
        let mut issues = Vec::new();

        let mut record = |result: ValidationResult, recommendation: &str| {
            if !result.passed {
                issues.push(QualityIssue {
                    severity: result.severity.clone(),
                    field: result.field.clone(),
                    issue: result.message.clone(),
                    recommendation: recommendation.to_string(),
                });
            }
            validations.push(result);
        };

        // Rule 1: Both a name and a surname
        record(
            self.validate_name_parts(person),
            "Register the surname as a separate name part",
        );

        // Rule 2: Declared level present
        record(
            self.validate_declared_present(person),
            "Ask the registrar for the current education level",
        );

        // Rule 3: Declared level agrees with the derived band
        record(
            self.validate_declared_matches(person),
            "Verify the birth date or the declared level",
        );

        // Rule 4: Age falls inside an education band
        record(
            self.validate_band_covered(person),
            "Check whether this person belongs in the roster",
        );

        // Rule 5: Age was evaluated today
        record(
            self.validate_evaluation_current(person, today),
            "Re-register to refresh the derived age",
        );

        let passed_count = validations.iter().filter(|v| v.passed).count();
        let failed_count = validations.len() - passed_count;
        let overall_quality = passed_count as f64 / validations.len() as f64;
        let overall_confidence: f64 =
            validations.iter().map(|v| v.confidence).sum::<f64>() / validations.len() as f64;

        QualityReport {
            person_id: person.id().to_string(),
            person_name: person.full_name(),
            overall_quality,
            overall_confidence,
            validations,
            issues,
            passed_count,
            failed_count,
            needs_review: overall_confidence < self.review_threshold,
        }
    }

    pub fn validate_batch(&self, people: &[Person], today: NaiveDate) -> Vec<QualityReport> {
        people.iter().map(|p| self.validate(p, today)).collect()
    }

    pub fn batch_summary(&self, reports: &[QualityReport]) -> BatchSummary {
        let total = reports.len();
        let mismatched = reports
            .iter()
            .filter(|r| {
                r.validations
                    .iter()
                    .any(|v| v.rule_name == "declared_level_mismatch")
            })
            .count();
        let needs_review = reports.iter().filter(|r| r.needs_review).count();
        let average_quality = if total == 0 {
            0.0
        } else {
            reports.iter().map(|r| r.overall_quality).sum::<f64>() / total as f64
        };

        BatchSummary {
            total_people: total,
            level_mismatch_count: mismatched,
            needs_review_count: needs_review,
            average_quality,
        }
    }

    // ========================================================================
    // VALIDATION RULES
    // ========================================================================

    fn validate_name_parts(&self, person: &Person) -> ValidationResult {
        if person.name_parts().len() < 2 {
            return ValidationResult::fail(
                "surname_missing",
                "name",
                &format!("Only one name part: {}", person.full_name()),
                Severity::Warning,
            );
        }

        ValidationResult::pass("name_complete", "name", "Name and surname present")
    }

    fn validate_declared_present(&self, person: &Person) -> ValidationResult {
        match person.declared_level() {
            Some(level) => ValidationResult::pass(
                "declared_level_present",
                "declared_level",
                &format!("Declared level: {}", level),
            ),
            None => ValidationResult::fail(
                "declared_level_missing",
                "declared_level",
                "No declared education level",
                Severity::Info,
            ),
        }
    }

    fn validate_declared_matches(&self, person: &Person) -> ValidationResult {
        match person.declared_level() {
            Some(level) if level != person.band() => ValidationResult::fail(
                "declared_level_mismatch",
                "declared_level",
                &format!(
                    "Declared {} but age {} classifies as {}",
                    level,
                    person.age(),
                    person.band()
                ),
                Severity::Warning,
            ),
            Some(_) => ValidationResult::pass(
                "declared_level_match",
                "declared_level",
                "Declared level matches derived band",
            ),
            None => ValidationResult::pass(
                "declared_level_unchecked",
                "declared_level",
                "Nothing declared to compare",
            ),
        }
    }

    fn validate_band_covered(&self, person: &Person) -> ValidationResult {
        if person.band() == Band::NotApplicable {
            return ValidationResult::fail(
                "band_not_applicable",
                "band",
                &format!("Age {} is outside every education band", person.age()),
                Severity::Info,
            );
        }

        ValidationResult::pass(
            "band_covered",
            "band",
            &format!("Band: {}", person.band()),
        )
    }

    fn validate_evaluation_current(&self, person: &Person, today: NaiveDate) -> ValidationResult {
        if person.evaluated_on() != today {
            return ValidationResult::fail(
                "age_stale",
                "age",
                &format!("Age evaluated on {}", person.evaluated_on()),
                Severity::Info,
            );
        }

        ValidationResult::pass("age_current", "age", "Age evaluated today")
    }
}

impl Default for QualityEngine {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// BATCH SUMMARY
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub total_people: usize,
    pub level_mismatch_count: usize,
    pub needs_review_count: usize,
    pub average_quality: f64,
}

impl BatchSummary {
    pub fn summary(&self) -> String {
        format!(
            "{} people: {:.1}% quality | {} declared-level mismatches, {} need review",
            self.total_people,
            self.average_quality * 100.0,
            self.level_mismatch_count,
            self.needs_review_count
        )
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bands::BandTable;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).unwrap()
    }

    fn person(parts: &[&str], age: i32) -> Person {
        let birth = NaiveDate::from_ymd_opt(2024 - age, 1, 1).unwrap();
        Person::new_as_of(
            parts.iter().map(|p| p.to_string()).collect(),
            birth,
            today(),
            &BandTable::canonical(),
            100,
        )
        .unwrap()
    }

    #[test]
    fn test_validate_clean_record() {
        let engine = QualityEngine::new();
        let p = person(&["Ana", "Lopez"], 10).with_declared_level(Band::Primary);

        let report = engine.validate(&p, today());

        assert_eq!(report.issues.len(), 0);
        assert_eq!(report.failed_count, 0);
        assert!(!report.needs_review);
        assert!(!report.has_critical_issues());
        assert_eq!(report.overall_quality, 1.0);
    }

    #[test]
    fn test_validate_declared_mismatch() {
        let engine = QualityEngine::new();
        let p = person(&["Ana", "Lopez"], 10).with_declared_level(Band::University);

        let report = engine.validate(&p, today());

        assert!(report
            .issues
            .iter()
            .any(|i| i.field == "declared_level" && i.severity == Severity::Warning));
        assert!(report.issues[0].issue.contains("classifies as Primary"));
    }

    #[test]
    fn test_validate_missing_surname_and_level() {
        let engine = QualityEngine::new();
        let p = person(&["Ana"], 10);

        let report = engine.validate(&p, today());

        assert!(report.issues.iter().any(|i| i.field == "name"));
        assert!(report.issues.iter().any(|i| i.field == "declared_level"));
        assert_eq!(report.failed_count, 2);
    }

    #[test]
    fn test_validate_gap_age_and_stale_evaluation() {
        let engine = QualityEngine::new();
        let p = person(&["Ana", "Lopez"], 26).with_declared_level(Band::NotApplicable);
        let later = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();

        let report = engine.validate(&p, later);

        assert!(report.issues.iter().any(|i| i.field == "band"));
        assert!(report.issues.iter().any(|i| i.field == "age"));
    }

    #[test]
    fn test_batch_summary() {
        let engine = QualityEngine::new();
        let people = vec![
            person(&["Ana", "Lopez"], 10).with_declared_level(Band::Primary),
            person(&["Beto", "Paz"], 15).with_declared_level(Band::Primary),
            person(&["Cata"], 20),
        ];

        let reports = engine.validate_batch(&people, today());
        let summary = engine.batch_summary(&reports);

        assert_eq!(summary.total_people, 3);
        assert_eq!(summary.level_mismatch_count, 1);
        assert!(summary.average_quality < 1.0);
        assert!(summary.summary().contains("3 people"));
    }

    #[test]
    fn test_batch_summary_empty() {
        let engine = QualityEngine::new();
        let summary = engine.batch_summary(&[]);

        assert_eq!(summary.total_people, 0);
        assert_eq!(summary.average_quality, 0.0);
    }
}
