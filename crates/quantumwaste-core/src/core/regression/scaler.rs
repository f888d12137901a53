use super::{Dataset, ModelError};
use serde::{Deserialize, Serialize};

/// Standardizes each feature column to zero mean and unit variance.
///
/// Statistics use the population variance. Constant columns keep a scale of `1.0` so they
/// are centered but not divided by zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    mean: Vec<f64>,
    variance: Vec<f64>,
    scale: Vec<f64>,
    n_samples_seen: usize,
}

impl StandardScaler {
    pub fn fit(data: &Dataset) -> Result<Self, ModelError> {
        if data.is_empty() {
            return Err(ModelError::EmptyDataset);
        }
        let n_features = data.n_features();
        let n = data.len() as f64;

        let mut mean = vec![0.0; n_features];
        for row in data.rows() {
            for (m, &v) in mean.iter_mut().zip(row) {
                *m += v;
            }
        }
        mean.iter_mut().for_each(|m| *m /= n);

        let mut variance = vec![0.0; n_features];
        for row in data.rows() {
            for ((var, &v), &m) in variance.iter_mut().zip(row).zip(&mean) {
                let d = v - m;
                *var += d * d;
            }
        }
        variance.iter_mut().for_each(|v| *v /= n);

        if mean.iter().chain(&variance).any(|v| !v.is_finite()) {
            return Err(ModelError::NonFinite("scaler statistics"));
        }

        let scale = variance
            .iter()
            .map(|&v| if v > f64::EPSILON { v.sqrt() } else { 1.0 })
            .collect();

        Ok(Self {
            mean,
            variance,
            scale,
            n_samples_seen: data.len(),
        })
    }

    pub fn n_features(&self) -> usize {
        self.mean.len()
    }

    pub fn mean(&self) -> &[f64] {
        &self.mean
    }

    pub fn variance(&self) -> &[f64] {
        &self.variance
    }

    pub fn n_samples_seen(&self) -> usize {
        self.n_samples_seen
    }

    pub fn transform_row(&self, row: &[f64]) -> Result<Vec<f64>, ModelError> {
        if row.len() != self.n_features() {
            return Err(ModelError::DimensionMismatch {
                expected: self.n_features(),
                found: row.len(),
            });
        }
        Ok(row
            .iter()
            .zip(&self.mean)
            .zip(&self.scale)
            .map(|((&v, &m), &s)| (v - m) / s)
            .collect())
    }

    pub fn transform(&self, data: &Dataset) -> Result<Dataset, ModelError> {
        data.map_rows(|row| self.transform_row(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOLERANCE: f64 = 1e-9;

    fn sample() -> Dataset {
        Dataset::from_parts(
            3,
            vec![
                1.0, 10.0, 5.0, //
                2.0, 20.0, 5.0, //
                3.0, 30.0, 5.0, //
                4.0, 40.0, 5.0,
            ],
            vec![0.0; 4],
        )
        .unwrap()
    }

    #[test]
    fn fit_computes_population_statistics() {
        let scaler = StandardScaler::fit(&sample()).unwrap();
        assert_eq!(scaler.mean(), &[2.5, 25.0, 5.0]);
        assert!((scaler.variance()[0] - 1.25).abs() < TOLERANCE);
        assert!((scaler.variance()[1] - 125.0).abs() < TOLERANCE);
        assert_eq!(scaler.variance()[2], 0.0);
        assert_eq!(scaler.n_samples_seen(), 4);
    }

    #[test]
    fn transformed_columns_have_zero_mean_and_unit_variance() {
        let data = sample();
        let scaled = StandardScaler::fit(&data).unwrap().transform(&data).unwrap();
        for f in 0..2 {
            let column: Vec<f64> = (0..scaled.len()).map(|r| scaled.value(r, f)).collect();
            let mean = column.iter().sum::<f64>() / column.len() as f64;
            let var = column.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / column.len() as f64;
            assert!(mean.abs() < TOLERANCE);
            assert!((var - 1.0).abs() < TOLERANCE);
        }
    }

    #[test]
    fn constant_column_is_centered_without_division_by_zero() {
        let data = sample();
        let scaler = StandardScaler::fit(&data).unwrap();
        let row = scaler.transform_row(&[2.5, 25.0, 5.0]).unwrap();
        assert_eq!(row, vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn empty_dataset_is_rejected() {
        assert_eq!(
            StandardScaler::fit(&Dataset::new(2)),
            Err(ModelError::EmptyDataset)
        );
    }

    #[test]
    fn transform_row_checks_width() {
        let scaler = StandardScaler::fit(&sample()).unwrap();
        assert!(matches!(
            scaler.transform_row(&[1.0]),
            Err(ModelError::DimensionMismatch {
                expected: 3,
                found: 1
            })
        ));
    }
}
