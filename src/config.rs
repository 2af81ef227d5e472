use crate::error::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};

// Names of the GS2 output variables each diagnostic family reads
#[derive(Debug, Clone)]
pub struct FieldCatalog {
    pub traces: Vec<&'static str>,
    pub spectra: Vec<&'static str>,
    pub transfers: Vec<&'static str>,
}

impl FieldCatalog {
    pub fn new() -> Self {
        FieldCatalog {
            traces: vec!["phi2", "apar2", "bpar2"],
            spectra: vec!["phi2_by_mode", "apar2_by_mode", "bpar2_by_mode"],
            transfers: vec![
                "kinetic_energy_transfer_theta",
                "entropy_transfer_phi_theta",
                "entropy_transfer_apar_theta",
                "entropy_transfer_bpar_theta",
            ],
        }
    }
}

impl Default for FieldCatalog {
    fn default() -> Self {
        Self::new()
    }
}

// Batch job description, read from a TOML file kept next to the run
#[derive(Debug, Clone, Deserialize)]
pub struct JobConfig {
    pub name: String,
    pub partition: String,
    pub ntasks: u32,
    pub walltime: String,
    pub executable: PathBuf,
    pub input_file: PathBuf,
    #[serde(default = "default_nodes")]
    pub nodes: u32,
    #[serde(default)]
    pub account: Option<String>,
    #[serde(default)]
    pub qos: Option<String>,
    #[serde(default)]
    pub modules: Vec<String>,
    #[serde(default)]
    pub extra_sbatch: Vec<String>,
}

fn default_nodes() -> u32 {
    1
}

impl JobConfig {
    pub fn from_toml(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_toml(&text)
    }
}
