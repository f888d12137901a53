use crate::cli::TrainArgs;
use crate::config::{ServerOverrides, build_config};
use crate::error::Result;
use crate::utils::progress::CliProgressHandler;
use quantumwaste::engine::predictor::DifficultyPredictor;
use quantumwaste::engine::progress::ProgressReporter;
use tracing::info;

pub async fn run(args: TrainArgs) -> Result<()> {
    let app_config = build_config(&args.config, ServerOverrides::default())?;
    let model = &app_config.simulation.model;
    let dir = model.artifacts_dir.as_path();

    if DifficultyPredictor::artifacts_exist(dir) && !args.force {
        info!(dir = %dir.display(), "Artifacts present; skipping training.");
        println!(
            "Model artifacts already exist in {}. Use --force to retrain.",
            dir.display()
        );
        return Ok(());
    }

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    println!(
        "Training random forest ({} trees, {} samples)...",
        model.trees, model.samples
    );
    let (_, report) =
        tokio::task::block_in_place(|| DifficultyPredictor::retrain(model, &reporter))?;

    println!(
        "Model saved to {} (holdout R² = {:.4}, MSE = {:.4}, {} train / {} test rows).",
        dir.display(),
        report.r2,
        report.mse,
        report.train_rows,
        report.test_rows
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use tempfile::tempdir;

    fn train_args(dir: &std::path::Path, extra: &[&str]) -> TrainArgs {
        let dir = dir.to_string_lossy().into_owned();
        let mut argv = vec![
            "quantumwaste",
            "train",
            "--artifacts-dir",
            dir.as_str(),
            "-S",
            "model.samples=200",
            "-S",
            "model.trees=4",
        ];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Commands::Train(args) => args,
            _ => panic!("expected the train subcommand"),
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn existing_artifacts_are_kept_unless_forced() {
        let dir = tempdir().unwrap();

        run(train_args(dir.path(), &[])).await.unwrap();
        let first = DifficultyPredictor::load(dir.path()).unwrap();

        run(train_args(dir.path(), &["-S", "model.seed=7"])).await.unwrap();
        assert_eq!(DifficultyPredictor::load(dir.path()).unwrap(), first);

        run(train_args(dir.path(), &["-S", "model.seed=7", "--force"]))
            .await
            .unwrap();
        assert_ne!(DifficultyPredictor::load(dir.path()).unwrap(), first);
    }
}
