use std::io;
use std::path::PathBuf;
use anyhow::Result;
use clap::Parser;
use env_logger::Env;
use log::info;

use dv_routing::config::{OutputFormat, SimulationConfig};
use dv_routing::network::{CostModel, TopologySource};
use dv_routing::report::{JsonReporter, Reporter, TextReporter};

/// Distance-vector routing simulator
#[derive(Parser, Debug)]
#[command(name = "dv-routing", version, about)]
struct Cli {
    /// Topology as a JSON object, e.g. '{"A": {"B": 1}, "B": {"A": 1}}'
    topology: Option<String>,

    /// Read the topology from a JSON file
    #[arg(long, conflicts_with = "topology")]
    file: Option<PathBuf>,

    /// Simulation settings (JSON)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Link costs of the default topology
    #[arg(long, value_enum)]
    cost_model: Option<CostModel>,

    /// Seed for random link costs
    #[arg(long)]
    seed: Option<u64>,

    #[arg(long, value_enum)]
    mode: Option<dv_routing::RoundMode>,

    /// Fail instead of looping past this many rounds
    #[arg(long)]
    max_rounds: Option<usize>,

    #[arg(long, value_enum)]
    format: Option<OutputFormat>,

    #[arg(long, default_value = "info")]
    log_level: String,
}

impl Cli {
    fn simulation_config(&self) -> Result<SimulationConfig> {
        let mut config = match &self.config {
            Some(path) => SimulationConfig::load(path)?,
            None => SimulationConfig::default(),
        };

        if let Some(cost_model) = self.cost_model {
            config.cost_model = cost_model;
        }
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        if self.max_rounds.is_some() {
            config.max_rounds = self.max_rounds;
        }
        if let Some(format) = self.format {
            config.format = format;
        }
        Ok(config)
    }

    fn topology_source(&self) -> TopologySource {
        match (&self.topology, &self.file) {
            (Some(json), _) => TopologySource::Json(json.clone()),
            (None, Some(path)) => TopologySource::File(path.clone()),
            (None, None) => TopologySource::Default,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    env_logger::Builder::from_env(Env::default().default_filter_or(&cli.log_level)).init();

    let config = cli.simulation_config()?;
    let mut rng = config.rng();
    let topology = cli.topology_source().resolve(config.cost_model, &mut rng);

    let stdout = io::stdout().lock();
    let mut reporter: Box<dyn Reporter> = match config.format {
        OutputFormat::Text => Box::new(TextReporter::new(stdout)),
        OutputFormat::Json => Box::new(JsonReporter::new(stdout)),
    };

    let result = config.engine().run(&topology, reporter.as_mut())?;
    info!("Routing converged in {} rounds across {} nodes",
          result.rounds, result.network.len());

    Ok(())
}
