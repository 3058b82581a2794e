//! Declarative parameters of a single-cell experiment.
//!
//! Parameters are read from a JSON document with one section per group:
//!
//! ```rust
//! use rusty_cell::params::SimulationParameters;
//!
//! let params = SimulationParameters::from_json(r#"{
//!     "passive": {"cm_mult": 1.0, "ra": 100.0},
//!     "soma": {"active": true, "mechanism": "cagk", "gkbar": 0.5},
//!     "dend": {"active": false, "e": -70.0, "g": 0.0001},
//!     "synapse": {"compartment": "soma", "position": 0.5, "tau_rise": 0.5,
//!                 "tau_decay": 1.5, "e_rev": 0.0, "weight": 1.17, "delay": 0.0},
//!     "stimulus": {"seed": 149, "rate_hz": 5.0, "horizon_ms": 200.0},
//!     "integration": {"v_init": -70.0, "dt": 0.025, "temperature": 35.0,
//!                     "reversal_potentials": {"ek": -85.0}}
//! }"#).unwrap();
//!
//! assert_eq!(params.stimulus.seed, 149);
//! ```

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::error::ConfigError;
use crate::mechanism::Mechanism;

/// A compartment of the two-compartment cell.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, Serialize, Deserialize)]
pub enum Compartment {
    #[serde(rename = "soma")]
    Soma,
    #[serde(rename = "dend", alias = "dendrite")]
    Dendrite,
}

impl Compartment {
    /// Returns the name of the compartment, as used in the parameter document.
    pub fn name(&self) -> &'static str {
        match self {
            Compartment::Soma => "soma",
            Compartment::Dendrite => "dend",
        }
    }
}

/// Passive cable properties shared by all compartments.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct PassiveProperties {
    /// Multiplier of the baseline specific membrane capacitance.
    pub cm_mult: f64,
    /// Axial resistivity (Ω·cm).
    pub ra: f64,
}

/// Mechanism selection for one compartment.
///
/// Mechanism and leak fields are kept untyped: only the fields referenced by the
/// selected mechanism are looked up (and validated).
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct CompartmentParameters {
    /// Whether an active mechanism is inserted, otherwise a passive leak.
    pub active: bool,
    /// Tag of the active mechanism.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mechanism: Option<String>,
    /// Mechanism-specific (or leak) fields.
    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl CompartmentParameters {
    /// Create parameters for a passive compartment with the given leak reversal potential and conductance.
    pub fn passive(e_leak: f64, g_leak: f64) -> Self {
        CompartmentParameters {
            active: false,
            mechanism: None,
            fields: Map::new(),
        }
        .with_field("e", e_leak)
        .with_field("g", g_leak)
    }

    /// Create parameters for an active compartment using the given mechanism tag.
    pub fn active(mechanism: &str) -> Self {
        CompartmentParameters {
            active: true,
            mechanism: Some(mechanism.to_string()),
            fields: Map::new(),
        }
    }

    /// Set a numeric field.
    pub fn with_field(mut self, name: &str, value: f64) -> Self {
        self.fields.insert(name.to_string(), Value::from(value));
        self
    }

    /// Returns the value of a field of the given mechanism, if present.
    /// A field may be written plainly (`gnatbar`) or suffixed with the tag (`gnatbar_ichan2`);
    /// the plain form wins when both are present.
    ///
    /// # Errors
    /// Returns an error if the field is present but not numeric.
    pub fn numeric_field(
        &self,
        name: &str,
        mechanism: Mechanism,
    ) -> Result<Option<f64>, ConfigError> {
        let suffixed = format!("{}_{}", name, mechanism.name());
        let (key, value) = match self.fields.get(name) {
            Some(value) => (name, value),
            None => match self.fields.get(&suffixed) {
                Some(value) => (suffixed.as_str(), value),
                None => return Ok(None),
            },
        };

        match value.as_f64() {
            Some(x) if x.is_finite() => Ok(Some(x)),
            _ => Err(ConfigError::NonNumericField(format!("{} = {}", key, value))),
        }
    }

    /// Returns the keys of the fields which are not read by the given mechanism.
    pub fn unused_fields(&self, mechanism: Mechanism) -> Vec<&str> {
        self.fields
            .keys()
            .filter(|key| {
                !mechanism.fields().iter().any(|f| {
                    key.as_str() == f.name
                        || key.strip_suffix(mechanism.name()).and_then(|k| k.strip_suffix('_'))
                            == Some(f.name)
                })
            })
            .map(String::as_str)
            .collect()
    }
}

/// Synapse placement and kinetics.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SynapseParameters {
    /// Compartment receiving the synapse.
    pub compartment: Compartment,
    /// Normalized position along the compartment, in [0, 1].
    pub position: f64,
    /// Rise time constant (ms).
    pub tau_rise: f64,
    /// Decay time constant (ms).
    pub tau_decay: f64,
    /// Reversal potential (mV).
    pub e_rev: f64,
    /// Connection weight (µS).
    pub weight: f64,
    /// Connection delay (ms).
    #[serde(default)]
    pub delay: f64,
}

/// Input spike train parameters.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct StimulusParameters {
    /// Seed of the spike train generator.
    /// Negative seeds are accepted and reinterpreted as their two's complement, e.g., `-1` is `u64::MAX`.
    #[serde(deserialize_with = "deserialize_seed")]
    pub seed: u64,
    /// Mean input rate (Hz).
    pub rate_hz: f64,
    /// Simulation horizon (ms).
    pub horizon_ms: f64,
    /// Explicit spike times (ms), replayed instead of sampling a Poisson train.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spikes: Option<Vec<f64>>,
}

/// Numerical integration settings, global to one engine call.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct IntegrationParameters {
    /// Initial membrane potential (mV).
    pub v_init: f64,
    /// Integration time step (ms).
    pub dt: f64,
    /// Temperature (°C).
    pub temperature: f64,
    /// Reversal potentials (mV) of ionic species shared across mechanisms, e.g., `ek`.
    #[serde(default)]
    pub reversal_potentials: BTreeMap<String, f64>,
    /// External calcium concentration (mM).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ca_ext: Option<f64>,
}

/// The complete, immutable parameter set of one experiment.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SimulationParameters {
    pub passive: PassiveProperties,
    pub soma: CompartmentParameters,
    pub dend: CompartmentParameters,
    pub synapse: SynapseParameters,
    pub stimulus: StimulusParameters,
    pub integration: IntegrationParameters,
}

impl SimulationParameters {
    /// Parse parameters from a JSON document.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(json).map_err(from_serde_error)
    }

    /// Load parameters from a JSON file.
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let file = File::open(path)
            .map_err(|e| ConfigError::Parse(format!("{}: {}", path.display(), e)))?;
        let reader = BufReader::new(file);
        serde_json::from_reader(reader).map_err(from_serde_error)
    }

    /// Save parameters to a JSON file.
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> std::io::Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)?;
        writer.flush()?;
        Ok(())
    }

    /// Returns the mechanism parameters of the given compartment.
    pub fn compartment(&self, compartment: Compartment) -> &CompartmentParameters {
        match compartment {
            Compartment::Soma => &self.soma,
            Compartment::Dendrite => &self.dend,
        }
    }

    /// Check the admissible range of the scalar parameters.
    /// Mechanism fields are checked when the model is configured.
    pub fn validate(&self) -> Result<(), ConfigError> {
        check(positive(self.passive.cm_mult), "passive.cm_mult must be positive")?;
        check(positive(self.passive.ra), "passive.ra must be positive")?;
        check(
            (0.0..=1.0).contains(&self.synapse.position),
            "synapse.position must lie in [0, 1]",
        )?;
        check(positive(self.synapse.tau_rise), "synapse.tau_rise must be positive")?;
        check(positive(self.synapse.tau_decay), "synapse.tau_decay must be positive")?;
        check(
            self.synapse.delay.is_finite() && self.synapse.delay >= 0.0,
            "synapse.delay must be non-negative",
        )?;
        check(
            self.synapse.e_rev.is_finite() && self.synapse.weight.is_finite(),
            "synapse.e_rev and synapse.weight must be finite",
        )?;
        check(positive(self.integration.dt), "integration.dt must be positive")?;
        check(
            self.integration.v_init.is_finite() && self.integration.temperature.is_finite(),
            "integration.v_init and integration.temperature must be finite",
        )?;
        Ok(())
    }
}

/// Returns true for finite, strictly positive values.
fn positive(x: f64) -> bool {
    x.is_finite() && x > 0.0
}

fn check(condition: bool, message: &str) -> Result<(), ConfigError> {
    match condition {
        true => Ok(()),
        false => Err(ConfigError::InvalidValue(message.to_string())),
    }
}

/// Any JSON integer is a valid seed.
#[derive(Deserialize)]
#[serde(untagged)]
enum Seed {
    Unsigned(u64),
    Signed(i64),
}

fn deserialize_seed<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u64, D::Error> {
    match Seed::deserialize(deserializer)? {
        Seed::Unsigned(seed) => Ok(seed),
        Seed::Signed(seed) => Ok(seed as u64),
    }
}

fn from_serde_error(e: serde_json::Error) -> ConfigError {
    let message = e.to_string();
    if message.starts_with("missing field") {
        ConfigError::MissingField(message)
    } else if message.starts_with("invalid type") {
        ConfigError::NonNumericField(message)
    } else {
        ConfigError::Parse(message)
    }
}
