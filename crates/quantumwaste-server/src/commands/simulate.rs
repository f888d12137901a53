use crate::cli::SimulateArgs;
use crate::config::{ServerOverrides, build_config};
use crate::error::{Result, ServerError};
use crate::utils::progress::CliProgressHandler;
use quantumwaste::engine::predictor::DifficultyPredictor;
use quantumwaste::engine::progress::ProgressReporter;
use quantumwaste::workflows::simulate::{self, SimulationRequest};
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde_json::{Map, Value};
use tracing::info;

pub async fn run(args: SimulateArgs) -> Result<()> {
    let app_config = build_config(&args.config, ServerOverrides::default())?;
    let config = app_config.simulation;

    // The flags go through the same validation as an HTTP body.
    let request = SimulationRequest::from_json(&request_body(&args), &config)?;

    let progress_handler = CliProgressHandler::new();
    let reporter = ProgressReporter::with_callback(progress_handler.get_callback());

    let result = tokio::task::block_in_place(|| {
        let predictor = DifficultyPredictor::bootstrap(&config.model, &reporter)?;
        let mut rng = match args.seed {
            Some(seed) => {
                info!(seed, "Using a seeded generator.");
                StdRng::seed_from_u64(seed)
            }
            None => StdRng::from_entropy(),
        };
        simulate::run(&request, &predictor, &config, &mut rng).map_err(ServerError::from)
    })?;

    let rendered = serde_json::to_string_pretty(&result)
        .map_err(|e| ServerError::Other(anyhow::anyhow!("Failed to render result: {}", e)))?;
    println!("{}", rendered);
    Ok(())
}

fn request_body(args: &SimulateArgs) -> Value {
    let mut body = Map::new();
    if let Some(length) = args.length {
        body.insert("length".to_string(), Value::from(length));
    }
    if let Some(composition) = args.composition {
        body.insert("composition".to_string(), Value::from(composition.to_string()));
    }
    if let Some(temperature) = args.temperature {
        body.insert("temperature".to_string(), Value::from(temperature));
    }
    if let Some(pressure) = args.pressure {
        body.insert("pressure".to_string(), Value::from(pressure));
    }
    Value::Object(body)
}
