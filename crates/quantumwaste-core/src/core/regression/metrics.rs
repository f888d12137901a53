use super::ModelError;

fn check_lengths(truth: &[f64], predicted: &[f64]) -> Result<(), ModelError> {
    if truth.is_empty() {
        return Err(ModelError::EmptyDataset);
    }
    if truth.len() != predicted.len() {
        return Err(ModelError::TargetCountMismatch {
            rows: predicted.len(),
            targets: truth.len(),
        });
    }
    Ok(())
}

pub fn mean_squared_error(truth: &[f64], predicted: &[f64]) -> Result<f64, ModelError> {
    check_lengths(truth, predicted)?;
    let sse: f64 = truth
        .iter()
        .zip(predicted)
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    Ok(sse / truth.len() as f64)
}

/// Coefficient of determination. A constant `truth` scores 1.0 for a perfect fit and 0.0
/// otherwise.
pub fn r2_score(truth: &[f64], predicted: &[f64]) -> Result<f64, ModelError> {
    check_lengths(truth, predicted)?;
    let mean = truth.iter().sum::<f64>() / truth.len() as f64;
    let ss_tot: f64 = truth.iter().map(|t| (t - mean).powi(2)).sum();
    let ss_res: f64 = truth
        .iter()
        .zip(predicted)
        .map(|(t, p)| (t - p).powi(2))
        .sum();

    if ss_tot == 0.0 {
        return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }
    Ok(1.0 - ss_res / ss_tot)
}
