use super::config::ModelConfig;
use super::error::EngineError;
use super::progress::{Progress, ProgressReporter};
use crate::core::models::features::{FeatureVector, NUM_FEATURES};
use crate::core::regression::Dataset;
use crate::core::regression::forest::RandomForest;
use crate::core::regression::metrics::{mean_squared_error, r2_score};
use crate::core::regression::scaler::StandardScaler;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use tracing::{info, instrument};

/// Linear weights of the synthetic difficulty target, in feature column order.
pub const TARGET_WEIGHTS: [f64; NUM_FEATURES] = [0.5, 0.3, 0.4, 0.6, 2.0, 0.1, 0.2];

/// Samples `samples` plausible polymers and labels each with a noisy linear difficulty score.
///
/// Lengths are drawn from `[5, 200)`. The A and B counts split the chain at random and C takes
/// the remainder, so the three counts always sum to the length. Bond strength is drawn from
/// `[0.5, 2.0)`, temperature from `[20, 100)` and pressure from `[1, 10)`.
pub fn generate_synthetic_dataset(
    samples: usize,
    noise_std: f64,
    rng: &mut impl Rng,
) -> Result<Dataset, EngineError> {
    let noise = Normal::new(0.0, noise_std)
        .map_err(|e| EngineError::InvalidArgument(format!("invalid noise level: {}", e)))?;

    let mut data = Dataset::with_capacity(NUM_FEATURES, samples);
    for _ in 0..samples {
        let length: usize = rng.gen_range(5..200);
        let a = rng.gen_range(0..length);
        let b = rng.gen_range(0..length - a);
        let c = length - a - b;

        let features = FeatureVector {
            length: length as f64,
            composition_a_count: a as f64,
            composition_b_count: b as f64,
            composition_c_count: c as f64,
            avg_bond_strength: rng.gen_range(0.5..2.0),
            temperature: rng.gen_range(20.0..100.0),
            pressure: rng.gen_range(1.0..10.0),
        };
        let row = features.to_array();
        let target = row
            .iter()
            .zip(TARGET_WEIGHTS)
            .map(|(x, w)| x * w)
            .sum::<f64>()
            + noise.sample(rng);
        data.push(&row, target)?;
    }
    Ok(data)
}

/// Shuffles the rows and holds out `ceil(n * test_fraction)` of them for testing.
///
/// Both halves are guaranteed at least one row.
pub fn train_test_split(
    data: &Dataset,
    test_fraction: f64,
    rng: &mut impl Rng,
) -> Result<(Dataset, Dataset), EngineError> {
    if !(test_fraction > 0.0 && test_fraction < 1.0) {
        return Err(EngineError::InvalidArgument(format!(
            "test fraction must lie strictly between 0 and 1 (got {})",
            test_fraction
        )));
    }
    if data.len() < 2 {
        return Err(EngineError::InvalidArgument(
            "at least two rows are needed for a train/test split".to_string(),
        ));
    }

    let n_test = ((data.len() as f64 * test_fraction).ceil() as usize).clamp(1, data.len() - 1);
    let mut indices: Vec<usize> = (0..data.len()).collect();
    indices.shuffle(rng);
    let (test, train) = indices.split_at(n_test);
    Ok((data.select(train), data.select(test)))
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrainingReport {
    pub train_rows: usize,
    pub test_rows: usize,
    pub r2: f64,
    pub mse: f64,
}

#[derive(Debug, Clone)]
pub struct TrainedModel {
    pub scaler: StandardScaler,
    pub forest: RandomForest,
    pub report: TrainingReport,
}

/// Trains the scaler and forest on a fresh synthetic dataset and scores the holdout split.
///
/// The scaler is fitted on the training split only; the holdout is transformed with the
/// training statistics before scoring.
#[instrument(skip_all, name = "train_model", fields(samples = config.samples, trees = config.trees))]
pub fn train_model(
    config: &ModelConfig,
    reporter: &ProgressReporter,
) -> Result<TrainedModel, EngineError> {
    config.validate()?;
    let mut rng = StdRng::seed_from_u64(config.seed);

    reporter.report(Progress::PhaseStart {
        name: "Generating synthetic data",
    });
    let data = generate_synthetic_dataset(config.samples, config.noise_std, &mut rng)?;
    let (train, test) = train_test_split(&data, config.test_fraction, &mut rng)?;
    reporter.report(Progress::DatasetReady {
        train_rows: train.len(),
        test_rows: test.len(),
    });
    reporter.report(Progress::PhaseFinish);

    reporter.report(Progress::PhaseStart {
        name: "Training random forest",
    });
    let scaler = StandardScaler::fit(&train)?;
    let train_scaled = scaler.transform(&train)?;
    let test_scaled = scaler.transform(&test)?;

    reporter.report(Progress::ForestStart {
        total_trees: config.trees as u64,
    });
    let forest = RandomForest::fit_with_callback(&train_scaled, &config.forest_params(), |_| {
        reporter.report(Progress::TreeTrained)
    })?;
    reporter.report(Progress::ForestFinish);
    reporter.report(Progress::PhaseFinish);

    let predictions = forest.predict_dataset(&test_scaled)?;
    let report = TrainingReport {
        train_rows: train.len(),
        test_rows: test.len(),
        r2: r2_score(test_scaled.targets(), &predictions)?,
        mse: mean_squared_error(test_scaled.targets(), &predictions)?,
    };
    reporter.report(Progress::Evaluated {
        r2: report.r2,
        mse: report.mse,
    });
    info!(
        r2 = report.r2,
        mse = report.mse,
        test_rows = report.test_rows,
        "Holdout evaluation complete."
    );

    Ok(TrainedModel {
        scaler,
        forest,
        report,
    })
}
