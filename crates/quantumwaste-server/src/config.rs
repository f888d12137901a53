mod defaults;

use crate::cli::ConfigArgs;
use crate::error::{Result, ServerError};
use defaults::ServerDefaults;
use quantumwaste::engine::config::{SimulationConfig, SimulationConfigBuilder};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialHttpConfig {
    host: Option<String>,
    port: Option<u16>,
    #[serde(rename = "max-length")]
    max_length: Option<usize>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialOptimizerConfig {
    iterations: Option<usize>,
    #[serde(rename = "step-size")]
    step_size: Option<f64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialModelConfig {
    #[serde(rename = "artifacts-dir")]
    artifacts_dir: Option<PathBuf>,
    samples: Option<usize>,
    trees: Option<usize>,
    #[serde(rename = "max-depth")]
    max_depth: Option<usize>,
    #[serde(rename = "test-fraction")]
    test_fraction: Option<f64>,
    seed: Option<u64>,
    #[serde(rename = "noise-std")]
    noise_std: Option<f64>,
    #[serde(rename = "lock-timeout-secs")]
    lock_timeout_secs: Option<u64>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialServerConfig {
    server: Option<PartialHttpConfig>,
    optimizer: Option<PartialOptimizerConfig>,
    model: Option<PartialModelConfig>,
}

/// Fully resolved settings for one invocation.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub simulation: SimulationConfig,
}

/// Command-line values that take precedence over the config file.
#[derive(Debug, Default)]
pub struct ServerOverrides {
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl PartialServerConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| ServerError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Applies `-S KEY=VALUE` overrides. Keys use the config file's `section.kebab-key` names.
    pub fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value)) = kv_pair.split_once('=') else {
                return Err(ServerError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };

            let server = || -> PartialHttpConfig { PartialHttpConfig::default() };
            match key {
                "server.host" => {
                    self.server.get_or_insert_with(server).host = Some(value.to_string());
                }
                "server.port" => {
                    self.server.get_or_insert_with(server).port = Some(parse_value(key, value)?);
                }
                "server.max-length" => {
                    self.server.get_or_insert_with(server).max_length =
                        Some(parse_value(key, value)?);
                }
                "optimizer.iterations" => {
                    self.optimizer
                        .get_or_insert_with(Default::default)
                        .iterations = Some(parse_value(key, value)?);
                }
                "optimizer.step-size" => {
                    self.optimizer
                        .get_or_insert_with(Default::default)
                        .step_size = Some(parse_value(key, value)?);
                }
                "model.artifacts-dir" => {
                    self.model.get_or_insert_with(Default::default).artifacts_dir =
                        Some(PathBuf::from(value));
                }
                "model.samples" => {
                    self.model.get_or_insert_with(Default::default).samples =
                        Some(parse_value(key, value)?);
                }
                "model.trees" => {
                    self.model.get_or_insert_with(Default::default).trees =
                        Some(parse_value(key, value)?);
                }
                "model.max-depth" => {
                    self.model.get_or_insert_with(Default::default).max_depth =
                        Some(parse_value(key, value)?);
                }
                "model.test-fraction" => {
                    self.model.get_or_insert_with(Default::default).test_fraction =
                        Some(parse_value(key, value)?);
                }
                "model.seed" => {
                    self.model.get_or_insert_with(Default::default).seed =
                        Some(parse_value(key, value)?);
                }
                "model.noise-std" => {
                    self.model.get_or_insert_with(Default::default).noise_std =
                        Some(parse_value(key, value)?);
                }
                "model.lock-timeout-secs" => {
                    self.model.get_or_insert_with(Default::default).lock_timeout_secs =
                        Some(parse_value(key, value)?);
                }
                _ => {
                    return Err(ServerError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }

    /// Resolves the final configuration. Precedence, highest first: command-line flags,
    /// `--set` values, the config file, built-in defaults.
    pub fn merge_with_cli(
        mut self,
        args: &ConfigArgs,
        overrides: ServerOverrides,
    ) -> Result<AppConfig> {
        self.apply_set_values(&args.set_values)?;
        let defaults = ServerDefaults::default();
        let sim = &defaults.simulation;

        let http = self.server.take().unwrap_or_default();
        let optimizer = self.optimizer.take().unwrap_or_default();
        let model = self.model.take().unwrap_or_default();

        let artifacts_dir = args
            .artifacts_dir
            .clone()
            .or(model.artifacts_dir)
            .unwrap_or_else(|| sim.model.artifacts_dir.clone());

        let simulation = SimulationConfigBuilder::new()
            .artifacts_dir(artifacts_dir)
            .iterations(optimizer.iterations.unwrap_or(sim.optimizer.iterations))
            .step_size(optimizer.step_size.unwrap_or(sim.optimizer.step_size))
            .samples(model.samples.unwrap_or(sim.model.samples))
            .trees(model.trees.unwrap_or(sim.model.trees))
            .max_depth(model.max_depth.unwrap_or(sim.model.max_depth))
            .test_fraction(model.test_fraction.unwrap_or(sim.model.test_fraction))
            .seed(model.seed.unwrap_or(sim.model.seed))
            .noise_std(model.noise_std.unwrap_or(sim.model.noise_std))
            .lock_timeout(
                model
                    .lock_timeout_secs
                    .map(Duration::from_secs)
                    .unwrap_or(sim.model.lock_timeout),
            )
            .max_length(http.max_length.unwrap_or(sim.max_length))
            .defaults(sim.defaults)
            .build()
            .map_err(|e| ServerError::Config(e.to_string()))?;

        Ok(AppConfig {
            host: overrides.host.or(http.host).unwrap_or(defaults.host),
            port: overrides.port.or(http.port).unwrap_or(defaults.port),
            simulation,
        })
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value.parse().map_err(|_| {
        ServerError::Config(format!(
            "Invalid value for {}: '{}' ({})",
            key,
            value,
            std::any::type_name::<T>()
        ))
    })
}

/// Loads the optional config file named in `args` and resolves it against the command line.
pub fn build_config(args: &ConfigArgs, overrides: ServerOverrides) -> Result<AppConfig> {
    let partial = match &args.config {
        Some(path) => PartialServerConfig::from_file(path)?,
        None => PartialServerConfig::default(),
    };
    partial.merge_with_cli(args, overrides)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn args_with_file(path: Option<PathBuf>) -> ConfigArgs {
        ConfigArgs {
            config: path,
            ..ConfigArgs::default()
        }
    }

    #[test]
    fn defaults_apply_without_a_file() {
        let app = build_config(&ConfigArgs::default(), ServerOverrides::default()).unwrap();
        assert_eq!(app.host, "127.0.0.1");
        assert_eq!(app.port, 5000);
        assert_eq!(app.simulation, SimulationConfig::default());
    }

    #[test]
    fn file_values_are_read_and_merged() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("quantumwaste.toml");
        fs::write(
            &path,
            r#"
[server]
host = "0.0.0.0"
port = 8000
max-length = 500

[optimizer]
iterations = 20
step-size = 0.1

[model]
artifacts-dir = "/var/lib/quantumwaste"
trees = 50
max-depth = 6
seed = 7
"#,
        )
        .unwrap();

        let app = build_config(&args_with_file(Some(path)), ServerOverrides::default()).unwrap();
        assert_eq!(app.host, "0.0.0.0");
        assert_eq!(app.port, 8000);
        assert_eq!(app.simulation.max_length, 500);
        assert_eq!(app.simulation.optimizer.iterations, 20);
        assert_eq!(app.simulation.optimizer.step_size, 0.1);
        assert_eq!(
            app.simulation.model.artifacts_dir,
            PathBuf::from("/var/lib/quantumwaste")
        );
        assert_eq!(app.simulation.model.trees, 50);
        assert_eq!(app.simulation.model.max_depth, 6);
        assert_eq!(app.simulation.model.seed, 7);
        assert_eq!(app.simulation.model.samples, 10_000);
    }

    #[test]
    fn cli_overrides_file_values() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("quantumwaste.toml");
        fs::write(&path, "[server]\nport = 8000\n\n[model]\nartifacts-dir = \"file-dir\"\n")
            .unwrap();

        let args = ConfigArgs {
            config: Some(path),
            artifacts_dir: Some(PathBuf::from("cli-dir")),
            set_values: vec![],
        };
        let overrides = ServerOverrides {
            host: None,
            port: Some(9001),
        };
        let app = build_config(&args, overrides).unwrap();
        assert_eq!(app.port, 9001);
        assert_eq!(app.simulation.model.artifacts_dir, PathBuf::from("cli-dir"));
    }

    #[test]
    fn set_values_override_file_values() {
        let args = ConfigArgs {
            set_values: vec![
                "model.trees=25".to_string(),
                "optimizer.step-size=0.2".to_string(),
                "server.host=localhost".to_string(),
            ],
            ..ConfigArgs::default()
        };
        let app = build_config(&args, ServerOverrides::default()).unwrap();
        assert_eq!(app.simulation.model.trees, 25);
        assert_eq!(app.simulation.optimizer.step_size, 0.2);
        assert_eq!(app.host, "localhost");
    }

    #[test]
    fn malformed_set_values_are_rejected() {
        for bad in ["model.trees", "model.trees=many", "model.colour=blue"] {
            let args = ConfigArgs {
                set_values: vec![bad.to_string()],
                ..ConfigArgs::default()
            };
            assert!(
                matches!(
                    build_config(&args, ServerOverrides::default()),
                    Err(ServerError::Config(_))
                ),
                "'{}' should be rejected",
                bad
            );
        }
    }

    #[test]
    fn unknown_file_keys_are_parse_errors() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.toml");
        fs::write(&path, "[model]\nforest-size = 3\n").unwrap();
        assert!(matches!(
            build_config(&args_with_file(Some(path)), ServerOverrides::default()),
            Err(ServerError::FileParsing { .. })
        ));
    }

    #[test]
    fn out_of_range_values_fail_validation() {
        let args = ConfigArgs {
            set_values: vec!["model.test-fraction=1.5".to_string()],
            ..ConfigArgs::default()
        };
        assert!(matches!(
            build_config(&args, ServerOverrides::default()),
            Err(ServerError::Config(_))
        ));
    }
}
