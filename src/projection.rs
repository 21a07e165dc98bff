// 📉 Projection Pipeline - standardize, then principal components
//
// 1. Encode every person as [age, band_code]
// 2. Standardize each column (population std, ddof = 0)
// 3. Eigen-decompose the covariance of the standardized matrix
// 4. Project people and one synthetic "average" point through the SAME fit
//
// Only three failures leave this module: InsufficientData, DegenerateData and
// ProjectionFailed. Everything is deterministic; repeated runs over the same
// roster produce bit-identical output.

use crate::bands::Band;
use crate::config::RosterConfig;
use crate::entities::Person;
use crate::error::{RosterError, RosterResult};
use crate::features::{self, FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
use nalgebra::DMatrix;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use tracing::{info, warn};

/// Smallest roster the pipeline accepts
pub const MIN_PEOPLE: usize = 3;

/// Components are capped at 2 for plotting
pub const MAX_COMPONENTS: usize = 2;

const EIGEN_EPSILON: f64 = 1e-12;
const EIGEN_MAX_ITERATIONS: usize = 1_000;

/// `min(2, n_features, n_samples - 1)`, saturating at 0
pub fn component_count(n_features: usize, n_samples: usize) -> usize {
    MAX_COMPONENTS
        .min(n_features)
        .min(n_samples.saturating_sub(1))
}

// ============================================================================
// STANDARDIZER
// ============================================================================

/// Per-column zero-mean, unit-variance rescaling
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Standardizer {
    means: FeatureVector,
    scales: FeatureVector,
}

impl Standardizer {
    /// Fit column means and population standard deviations.
    ///
    /// A column with zero spread has nothing to analyze and is reported as
    /// `DegenerateData` instead of being divided by zero.
    pub fn fit(rows: &[FeatureVector]) -> RosterResult<Self> {
        if rows.is_empty() {
            return Err(RosterError::DegenerateData("no rows to standardize".to_string()));
        }

        let means = features::column_means(rows);
        let n = rows.len() as f64;
        let mut scales = [0.0; FEATURE_COUNT];

        for (col, scale) in scales.iter_mut().enumerate() {
            let variance = rows
                .iter()
                .map(|row| (row[col] - means[col]).powi(2))
                .sum::<f64>()
                / n;
            *scale = variance.sqrt();

            if *scale == 0.0 || !scale.is_finite() {
                return Err(RosterError::DegenerateData(format!(
                    "column '{}' has no variance",
                    FEATURE_NAMES[col]
                )));
            }
        }

        Ok(Standardizer { means, scales })
    }

    pub fn transform(&self, row: &FeatureVector) -> FeatureVector {
        let mut out = [0.0; FEATURE_COUNT];
        for (col, value) in out.iter_mut().enumerate() {
            *value = (row[col] - self.means[col]) / self.scales[col];
        }
        out
    }

    /// Fit then transform, checking the result is finite
    pub fn fit_transform(rows: &[FeatureVector]) -> RosterResult<(Self, Vec<FeatureVector>)> {
        let scaler = Standardizer::fit(rows)?;
        let scaled: Vec<FeatureVector> = rows.iter().map(|row| scaler.transform(row)).collect();

        if scaled.iter().flatten().any(|v| !v.is_finite()) {
            return Err(RosterError::DegenerateData(
                "standardized matrix contains non-finite values".to_string(),
            ));
        }

        Ok((scaler, scaled))
    }

    pub fn means(&self) -> &FeatureVector {
        &self.means
    }

    pub fn scales(&self) -> &FeatureVector {
        &self.scales
    }
}

// ============================================================================
// PRINCIPAL COMPONENTS
// ============================================================================

/// Top-k principal axes of a (standardized) feature matrix
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrincipalComponents {
    /// Column means of the fitted matrix
    mean: FeatureVector,

    /// Unit loading vectors, strongest first
    components: Vec<FeatureVector>,

    /// Variance along each component (sample covariance, n - 1)
    explained_variance: Vec<f64>,

    /// Component variance / total variance
    explained_variance_ratio: Vec<f64>,
}

impl PrincipalComponents {
    pub fn fit(rows: &[FeatureVector], k: usize) -> RosterResult<Self> {
        let n = rows.len();
        if k < 1 || k > FEATURE_COUNT || n < 2 {
            return Err(RosterError::DegenerateData(format!(
                "cannot extract {} components from {} rows",
                k, n
            )));
        }

        let mean = features::column_means(rows);
        let centered = DMatrix::from_fn(n, FEATURE_COUNT, |i, j| rows[i][j] - mean[j]);
        let covariance = (centered.transpose() * &centered) / (n as f64 - 1.0);
        let total_variance = covariance.trace();

        if !total_variance.is_finite() || total_variance <= 0.0 {
            return Err(RosterError::ProjectionFailed(format!(
                "total variance is {}",
                total_variance
            )));
        }

        let eigen = covariance
            .try_symmetric_eigen(EIGEN_EPSILON, EIGEN_MAX_ITERATIONS)
            .ok_or_else(|| {
                RosterError::ProjectionFailed("eigen-decomposition did not converge".to_string())
            })?;

        if eigen.eigenvalues.iter().chain(eigen.eigenvectors.iter()).any(|v| !v.is_finite()) {
            return Err(RosterError::ProjectionFailed(
                "eigen-decomposition produced non-finite values".to_string(),
            ));
        }

        // Strongest first; stable sort keeps ties in solver order
        let mut order: Vec<usize> = (0..FEATURE_COUNT).collect();
        order.sort_by(|&a, &b| eigen.eigenvalues[b].total_cmp(&eigen.eigenvalues[a]));

        let mut components = Vec::with_capacity(k);
        let mut explained_variance = Vec::with_capacity(k);
        let mut explained_variance_ratio = Vec::with_capacity(k);

        for &idx in order.iter().take(k) {
            let mut axis = [0.0; FEATURE_COUNT];
            for (j, value) in axis.iter_mut().enumerate() {
                *value = eigen.eigenvectors[(j, idx)];
            }
            fix_sign(&mut axis);

            // Round-off can leave tiny negative eigenvalues
            let variance = eigen.eigenvalues[idx].max(0.0);
            components.push(axis);
            explained_variance.push(variance);
            explained_variance_ratio.push((variance / total_variance).clamp(0.0, 1.0));
        }

        Ok(PrincipalComponents {
            mean,
            components,
            explained_variance,
            explained_variance_ratio,
        })
    }

    /// Coordinates of one row along each component
    pub fn transform(&self, row: &FeatureVector) -> Vec<f64> {
        self.components
            .iter()
            .map(|axis| {
                axis.iter()
                    .zip(row.iter().zip(&self.mean))
                    .map(|(w, (x, m))| w * (x - m))
                    .sum::<f64>()
            })
            .collect()
    }

    pub fn n_components(&self) -> usize {
        self.components.len()
    }

    pub fn components(&self) -> &[FeatureVector] {
        &self.components
    }

    pub fn explained_variance(&self) -> &[f64] {
        &self.explained_variance
    }

    pub fn explained_variance_ratio(&self) -> &[f64] {
        &self.explained_variance_ratio
    }
}

/// Flip an axis so its largest-magnitude loading is positive
fn fix_sign(axis: &mut FeatureVector) {
    let mut pivot = 0;
    for (j, value) in axis.iter().enumerate() {
        if value.abs() > axis[pivot].abs() {
            pivot = j;
        }
    }
    if axis[pivot] < 0.0 {
        for value in axis.iter_mut() {
            *value = -*value;
        }
    }
}

// ============================================================================
// PROJECTION RESULT
// ============================================================================

/// Everything a plot needs, already computed
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Projection {
    /// N rows of k coordinates, roster order
    pub coordinates: Vec<Vec<f64>>,

    pub explained_variance_ratio: Vec<f64>,

    /// Raw [mean age, mean band code] before transformation
    pub aggregate_features: FeatureVector,

    /// Aggregate point through the fitted transform
    pub aggregate_point: Vec<f64>,

    /// Centroid of each band's projected points (only when k = 2)
    pub band_centroids: BTreeMap<Band, Vec<f64>>,

    /// Mean age within each band present
    pub band_mean_ages: BTreeMap<Band, f64>,

    pub mean_age: f64,

    /// "<name> (<age> years)" per point, roster order
    pub labels: Vec<String>,

    /// Whether the roster is small enough to annotate every point
    pub annotate: bool,

    pub ages: Vec<u32>,
    pub bands: Vec<Band>,

    pub standardizer: Standardizer,
    pub components: PrincipalComponents,
}

impl Projection {
    pub fn n_components(&self) -> usize {
        self.components.n_components()
    }

    /// Axis title, e.g. "PC1 (83.2% var.)"
    pub fn axis_label(&self, component: usize) -> String {
        let ratio = self
            .explained_variance_ratio
            .get(component)
            .copied()
            .unwrap_or(0.0);
        format!("PC{} ({:.1}% var.)", component + 1, ratio * 100.0)
    }

    /// Multi-line text report of averages and explained variance
    pub fn summary(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(
            out,
            "Input: {} people x {} features",
            self.coordinates.len(),
            FEATURE_COUNT
        );
        let _ = writeln!(out, "Mean age: {:.1} years", self.mean_age);
        let _ = writeln!(out, "Mean age by band:");
        for (band, mean) in &self.band_mean_ages {
            let _ = writeln!(out, "  {}: {:.1} years", band.description(), mean);
        }
        let _ = writeln!(out, "Reduced to {} principal components", self.n_components());
        for (i, ratio) in self.explained_variance_ratio.iter().enumerate() {
            let _ = writeln!(out, "  PC{}: {:.2}% of total variance", i + 1, ratio * 100.0);
        }
        out
    }
}

// ============================================================================
// PIPELINE
// ============================================================================

/// Mean age within each band present in `people`
pub fn mean_age_by_band(people: &[Person]) -> BTreeMap<Band, f64> {
    let mut sums: BTreeMap<Band, (f64, usize)> = BTreeMap::new();
    for person in people {
        let entry = sums.entry(person.band()).or_insert((0.0, 0));
        entry.0 += f64::from(person.age());
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(band, (total, count))| (band, total / count as f64))
        .collect()
}

/// Run the full pipeline over `people` (roster order)
pub fn project(people: &[Person], config: &RosterConfig) -> RosterResult<Projection> {
    let n = people.len();
    if n < MIN_PEOPLE {
        return Err(RosterError::InsufficientData {
            required: MIN_PEOPLE,
            actual: n,
        });
    }

    let rows = features::feature_matrix(people);

    let (standardizer, scaled) = Standardizer::fit_transform(&rows).map_err(|err| {
        warn!(people = n, error = %err, "projection skipped");
        err
    })?;

    let k = component_count(FEATURE_COUNT, n);
    if k < 1 {
        return Err(RosterError::DegenerateData("no components to extract".to_string()));
    }

    let components = PrincipalComponents::fit(&scaled, k)?;
    let coordinates: Vec<Vec<f64>> = scaled.iter().map(|row| components.transform(row)).collect();

    // Synthetic aggregate goes through the fitted transform, never a refit
    let aggregate_features = features::column_means(&rows);
    let aggregate_point = components.transform(&standardizer.transform(&aggregate_features));

    let bands: Vec<Band> = people.iter().map(Person::band).collect();
    let band_centroids = if k == 2 {
        band_centroids(&bands, &coordinates)
    } else {
        BTreeMap::new()
    };

    let explained_variance_ratio = components.explained_variance_ratio().to_vec();
    info!(
        people = n,
        components = k,
        ratios = ?explained_variance_ratio,
        "projection complete"
    );

    Ok(Projection {
        coordinates,
        explained_variance_ratio,
        aggregate_features,
        aggregate_point,
        band_centroids,
        band_mean_ages: mean_age_by_band(people),
        mean_age: aggregate_features[0],
        labels: people.iter().map(Person::label).collect(),
        annotate: n <= config.label_threshold,
        ages: people.iter().map(Person::age).collect(),
        bands,
        standardizer,
        components,
    })
}

fn band_centroids(bands: &[Band], coordinates: &[Vec<f64>]) -> BTreeMap<Band, Vec<f64>> {
    let mut sums: BTreeMap<Band, (Vec<f64>, usize)> = BTreeMap::new();
    for (band, point) in bands.iter().zip(coordinates) {
        let entry = sums
            .entry(*band)
            .or_insert_with(|| (vec![0.0; point.len()], 0));
        for (acc, value) in entry.0.iter_mut().zip(point) {
            *acc += value;
        }
        entry.1 += 1;
    }
    sums.into_iter()
        .map(|(band, (total, count))| {
            (band, total.into_iter().map(|v| v / count as f64).collect())
        })
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
