use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use anyhow::{Context, Result};
use rand::SeedableRng;
use rand::rngs::StdRng;
use crate::network::CostModel;
use crate::protocol::{ConvergenceEngine, RoundMode};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub cost_model: CostModel,
    pub seed: Option<u64>,
    pub mode: RoundMode,
    pub max_rounds: Option<usize>,
    pub format: OutputFormat,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            cost_model: CostModel::HopCount,
            seed: None,
            mode: RoundMode::InPlace,
            max_rounds: None,
            format: OutputFormat::Text,
        }
    }
}

impl SimulationConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config {:?}", path))?;
        let config: SimulationConfig = serde_json::from_str(&content)
            .with_context(|| format!("parsing config {:?}", path))?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        fs::write(path, content)?;
        Ok(())
    }

    pub fn engine(&self) -> ConvergenceEngine {
        ConvergenceEngine::new(self.mode).with_max_rounds(self.max_rounds)
    }

    pub fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        }
    }
}
