use quantumwaste::engine::config::SimulationConfig;

/// Values used when neither the config file nor the command line sets an option.
pub struct ServerDefaults {
    pub host: String,
    pub port: u16,
    pub simulation: SimulationConfig,
}

impl Default for ServerDefaults {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5000,
            simulation: SimulationConfig::default(),
        }
    }
}
