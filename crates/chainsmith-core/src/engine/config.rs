use thiserror::Error;

pub const DEFAULT_HEAD_PORT: &str = "head";
pub const DEFAULT_TAIL_PORT: &str = "tail";
pub const DEFAULT_MONOMER_LABEL: &str = "monomer";
pub const DEFAULT_CHAIN_NAME: &str = "Polymer";
pub const DEFAULT_MEMBER_LABEL: &str = "member";
pub const DEFAULT_SYSTEM_NAME: &str = "System";

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
}

/// Parameters of a chain growth run.
#[derive(Debug, Clone, PartialEq)]
pub struct ChainConfig {
    /// Number of monomers in the finished chain.
    pub length: usize,
    /// Bound, in radians, of the random tilt applied to each appended monomer's tail port.
    pub perturbation: f64,
    pub head_port: String,
    pub tail_port: String,
    /// Base name of the monomer children; they are labeled `monomer[0]`, `monomer[1]`, ...
    pub monomer_label: String,
    pub chain_name: String,
}

#[derive(Default)]
pub struct ChainConfigBuilder {
    length: Option<usize>,
    perturbation: Option<f64>,
    head_port: Option<String>,
    tail_port: Option<String>,
    monomer_label: Option<String>,
    chain_name: Option<String>,
}

impl ChainConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn length(mut self, length: usize) -> Self {
        self.length = Some(length);
        self
    }
    pub fn perturbation(mut self, radians: f64) -> Self {
        self.perturbation = Some(radians);
        self
    }
    pub fn head_port(mut self, label: &str) -> Self {
        self.head_port = Some(label.to_string());
        self
    }
    pub fn tail_port(mut self, label: &str) -> Self {
        self.tail_port = Some(label.to_string());
        self
    }
    pub fn monomer_label(mut self, label: &str) -> Self {
        self.monomer_label = Some(label.to_string());
        self
    }
    pub fn chain_name(mut self, name: &str) -> Self {
        self.chain_name = Some(name.to_string());
        self
    }

    /// Builds the configuration.
    ///
    /// `length` is required; the perturbation defaults to zero and the labels to
    /// `head`, `tail`, `monomer` and `Polymer`. Range checks happen when the chain is grown.
    pub fn build(self) -> Result<ChainConfig, ConfigError> {
        Ok(ChainConfig {
            length: self.length.ok_or(ConfigError::MissingParameter("length"))?,
            perturbation: self.perturbation.unwrap_or(0.0),
            head_port: self
                .head_port
                .unwrap_or_else(|| DEFAULT_HEAD_PORT.to_string()),
            tail_port: self
                .tail_port
                .unwrap_or_else(|| DEFAULT_TAIL_PORT.to_string()),
            monomer_label: self
                .monomer_label
                .unwrap_or_else(|| DEFAULT_MONOMER_LABEL.to_string()),
            chain_name: self
                .chain_name
                .unwrap_or_else(|| DEFAULT_CHAIN_NAME.to_string()),
        })
    }
}

/// Options for laying out template copies on a pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct FillOptions {
    /// Spin every copy about x, y and z by uniform angles in `[0, 2π)` before placing it.
    pub random_orientation: bool,
    pub member_label: String,
    pub system_name: String,
}

impl Default for FillOptions {
    fn default() -> Self {
        Self {
            random_orientation: false,
            member_label: DEFAULT_MEMBER_LABEL.to_string(),
            system_name: DEFAULT_SYSTEM_NAME.to_string(),
        }
    }
}
