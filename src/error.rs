//! Error module for the Rusty Cell library.
use std::error::Error;
use std::fmt;

use crate::engine::EngineError;
use crate::spike_train::GenerationError;

/// Error types for invalid or incomplete simulation parameters.
#[derive(Debug, PartialEq, Clone)]
pub enum ConfigError {
    /// A required parameter field is absent.
    MissingField(String),
    /// A parameter field is present but is not a number.
    NonNumericField(String),
    /// A mechanism tag outside the known catalogue.
    UnknownMechanism(String),
    /// A mechanism with several conductance fields was only partially specified.
    IncompleteMechanism {
        mechanism: String,
        missing: Vec<String>,
    },
    /// A parameter value outside its admissible range.
    InvalidValue(String),
    /// The parameter document could not be read or parsed.
    Parse(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::MissingField(e) => write!(f, "Missing parameter: {}", e),
            ConfigError::NonNumericField(e) => write!(f, "Parameter is not numeric: {}", e),
            ConfigError::UnknownMechanism(e) => write!(f, "Unknown mechanism: {}", e),
            ConfigError::IncompleteMechanism { mechanism, missing } => write!(
                f,
                "Incomplete parameters for mechanism {}: missing {}",
                mechanism,
                missing.join(", ")
            ),
            ConfigError::InvalidValue(e) => write!(f, "Invalid parameter value: {}", e),
            ConfigError::Parse(e) => write!(f, "Unable to parse parameters: {}", e),
        }
    }
}

impl Error for ConfigError {}

/// Error types for a simulation run.
/// Every kind fails the whole run, there is no partial result.
#[derive(Debug, PartialEq, Clone)]
pub enum SimError {
    /// Error raised while configuring the model, before any engine call.
    Configuration(ConfigError),
    /// Error raised while generating the input spike train.
    Generation(GenerationError),
    /// Error reported by the simulation engine.
    Engine(EngineError),
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            SimError::Configuration(e) => write!(f, "Configuration error: {}", e),
            SimError::Generation(e) => write!(f, "Spike train generation error: {}", e),
            SimError::Engine(e) => write!(f, "Simulation engine error: {}", e),
        }
    }
}

impl Error for SimError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            SimError::Configuration(e) => Some(e),
            SimError::Generation(e) => Some(e),
            SimError::Engine(e) => Some(e),
        }
    }
}

impl From<ConfigError> for SimError {
    fn from(e: ConfigError) -> Self {
        SimError::Configuration(e)
    }
}

impl From<GenerationError> for SimError {
    fn from(e: GenerationError) -> Self {
        SimError::Generation(e)
    }
}

impl From<EngineError> for SimError {
    fn from(e: EngineError) -> Self {
        SimError::Engine(e)
    }
}
