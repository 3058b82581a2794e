//! Interface to the external simulation engine.
//!
//! The engine integrates the cable equation for the model it is given; this crate only
//! describes the model, the stimulus, and the integration settings of one call.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;

use crate::model::ModelDescriptor;
use crate::params::IntegrationParameters;
use crate::spike_train::SpikeTrain;

/// Failure reported by the simulation engine, with its diagnostic message.
#[derive(Debug, PartialEq, Clone)]
pub enum EngineError {
    /// The engine rejected the model topology or mechanisms.
    InvalidTopology(String),
    /// The integration became unstable.
    NumericalInstability(String),
    /// Any other engine failure.
    Failed(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            EngineError::InvalidTopology(e) => write!(f, "Invalid topology: {}", e),
            EngineError::NumericalInstability(e) => write!(f, "Numerical instability: {}", e),
            EngineError::Failed(e) => write!(f, "{}", e),
        }
    }
}

impl Error for EngineError {}

/// A synaptic event delivered to the synapse of the model.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct StimulusEvent {
    /// The time at which the pre-synaptic spike is emitted (ms).
    pub time: f64,
    /// The weight of the connection.
    pub weight: f64,
    /// The propagation delay of the connection (ms).
    pub delay: f64,
}

impl StimulusEvent {
    /// Returns the time at which the event reaches the synapse.
    pub fn arrival(&self) -> f64 {
        self.time + self.delay
    }
}

/// Ordered list of events targeting the synapse.
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct StimulusDescriptor {
    events: Vec<StimulusEvent>,
}

impl StimulusDescriptor {
    /// Pair each spike of the train with the given connection weight and delay.
    pub fn new(spike_train: &SpikeTrain, weight: f64, delay: f64) -> Self {
        let events = spike_train
            .firing_times()
            .iter()
            .map(|&time| StimulusEvent {
                time,
                weight,
                delay,
            })
            .collect();
        StimulusDescriptor { events }
    }

    /// Returns the events, sorted by time.
    pub fn events(&self) -> &[StimulusEvent] {
        &self.events[..]
    }

    /// Returns the number of events.
    pub fn num_events(&self) -> usize {
        self.events.len()
    }
}

/// Scalar settings of one engine call.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SimulationSettings {
    /// Initial voltage, time step, temperature, and shared reversal potentials.
    pub integration: IntegrationParameters,
    /// End of the simulation (ms).
    pub t_stop: f64,
}

/// A voltage sample.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct Sample {
    /// Time (ms).
    pub time: f64,
    /// Membrane potential (mV).
    pub voltage: f64,
}

/// Voltage recorded by the engine, as ordered (time, voltage) samples.
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
pub struct VoltageTrace {
    samples: Vec<Sample>,
}

impl VoltageTrace {
    pub fn new(samples: Vec<Sample>) -> Self {
        VoltageTrace { samples }
    }

    /// Returns the samples of the trace.
    pub fn samples(&self) -> &[Sample] {
        &self.samples[..]
    }

    /// Returns the number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns true if the trace has no sample.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Returns the sample times.
    pub fn times(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.time)
    }

    /// Returns the sampled voltages.
    pub fn voltages(&self) -> impl Iterator<Item = f64> + '_ {
        self.samples.iter().map(|s| s.voltage)
    }
}

impl FromIterator<(f64, f64)> for VoltageTrace {
    fn from_iter<I: IntoIterator<Item = (f64, f64)>>(iter: I) -> Self {
        VoltageTrace {
            samples: iter
                .into_iter()
                .map(|(time, voltage)| Sample { time, voltage })
                .collect(),
        }
    }
}

/// A numerical engine able to simulate a configured cell.
///
/// One call is self-contained: the settings are global to the call and must not leak into
/// other calls, so independent runs can share an engine across threads.
pub trait SimulationEngine {
    /// Simulate the model under the given stimulus and return the somatic voltage.
    fn simulate(
        &self,
        model: &ModelDescriptor,
        stimulus: &StimulusDescriptor,
        settings: &SimulationSettings,
    ) -> Result<VoltageTrace, EngineError>;
}

impl<E: SimulationEngine + ?Sized> SimulationEngine for &E {
    fn simulate(
        &self,
        model: &ModelDescriptor,
        stimulus: &StimulusDescriptor,
        settings: &SimulationSettings,
    ) -> Result<VoltageTrace, EngineError> {
        (**self).simulate(model, stimulus, settings)
    }
}
