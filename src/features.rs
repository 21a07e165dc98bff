// 🔢 Feature Encoding
// A person becomes a fixed-length numeric vector: [age, band_code]

use crate::entities::Person;

/// Number of columns in a feature vector
pub const FEATURE_COUNT: usize = 2;

/// Column names, in vector order
pub const FEATURE_NAMES: [&str; FEATURE_COUNT] = ["Age", "Band (code)"];

pub type FeatureVector = [f64; FEATURE_COUNT];

/// Encode one person
pub fn encode(person: &Person) -> FeatureVector {
    [person.age() as f64, person.band().code() as f64]
}

/// Encode a sequence of people, one row per person, order preserved
pub fn feature_matrix(people: &[Person]) -> Vec<FeatureVector> {
    people.iter().map(encode).collect()
}

/// Column means of a feature matrix. Empty input gives NaN columns.
pub fn column_means(rows: &[FeatureVector]) -> FeatureVector {
    let n = rows.len() as f64;
    let mut means = [0.0; FEATURE_COUNT];
    for row in rows {
        for (mean, value) in means.iter_mut().zip(row) {
            *mean += value;
        }
    }
    means.map(|sum| sum / n)
}
