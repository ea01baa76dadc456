use crate::error::{Error, Result};
use crate::model::DEFAULT_MODULE_DEPTH;
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default config file looked up in the working directory
pub const DEFAULT_CONFIG_FILE: &str = "msgflow.toml";

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub graph: GraphConfig,
    pub analysis: AnalysisConfig,
    pub diagram: DiagramConfig,
    pub output: OutputConfig,
}

/// Graph construction settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Leading name segments that form a handler's module key
    pub module_depth: usize,
}

/// Observation input settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// File name suffix of manifests picked up from a source directory
    pub manifest_suffix: String,
}

/// Diagram settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagramConfig {
    pub direction: Direction,
    pub splines: String,
    pub cluster_color: String,
    /// Module colors, assigned by module index modulo palette size
    pub palette: Vec<String>,
    pub unknown_color: String,
    pub highlight_color: String,
    pub inter_module_only: bool,
}

/// Output settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Persisted graph location
    pub data_file: PathBuf,
    /// Graphviz program used to lay out and render images
    pub layout_engine: String,
}

/// Layout direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default, ValueEnum)]
pub enum Direction {
    TB,
    #[default]
    LR,
    BT,
    RL,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::TB => "TB",
            Direction::LR => "LR",
            Direction::BT => "BT",
            Direction::RL => "RL",
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            module_depth: DEFAULT_MODULE_DEPTH,
        }
    }
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            manifest_suffix: ".msgflow.json".to_string(),
        }
    }
}

impl Default for DiagramConfig {
    fn default() -> Self {
        Self {
            direction: Direction::default(),
            splines: "ortho".to_string(),
            cluster_color: "blue".to_string(),
            palette: [
                "#ADD8E6", // light blue
                "#008B8B", // dark cyan
                "#F4A460", // sandy brown
                "#ADFF2F", // green yellow
                "#FFB6C1", // light pink
                "#008000", // green
                "#A9A9A9", // dark gray
                "#FF00FF", // magenta
                "#7FFFD4", // aquamarine
                "#FFFFFF", // white
            ]
            .iter()
            .map(|c| c.to_string())
            .collect(),
            unknown_color: "#FF0000".to_string(),
            highlight_color: "#FFD700".to_string(),
            inter_module_only: false,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from("messageflowdata.dat"),
            layout_engine: "dot".to_string(),
        }
    }
}

impl Config {
    /// Load config from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from file or return defaults
    pub fn load_or_default(path: &Path) -> Self {
        Self::load(path).unwrap_or_default()
    }

    /// Merge CLI arguments into config (CLI takes precedence)
    pub fn merge_cli(
        &mut self,
        data_file: Option<PathBuf>,
        direction: Option<Direction>,
        inter_module_only: bool,
    ) {
        if let Some(path) = data_file {
            self.output.data_file = path;
        }

        if let Some(dir) = direction {
            self.diagram.direction = dir;
        }

        if inter_module_only {
            self.diagram.inter_module_only = true;
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.graph.module_depth == 0 {
            return Err(Error::config_validation("module_depth must be at least 1"));
        }

        if self.diagram.palette.is_empty() {
            return Err(Error::config_validation("diagram palette needs at least one color"));
        }

        if self.analysis.manifest_suffix.is_empty() {
            return Err(Error::config_validation("manifest_suffix cannot be empty"));
        }

        if self.output.layout_engine.trim().is_empty() {
            return Err(Error::config_validation("layout_engine cannot be empty"));
        }

        Ok(())
    }
}
