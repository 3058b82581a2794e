//! This crate provides tools for configuring and driving single-neuron compartmental simulations.
//!
//! A run assembles a two-compartment cell from declarative parameters, samples a Poisson
//! pre-synaptic spike train, connects it to the cell through a two-exponential synapse, and
//! hands everything to an external [`engine::SimulationEngine`] which returns the somatic voltage.
//!
//! # Generating Spike Trains
//!
//! ```rust
//! use rusty_cell::spike_train::generate;
//!
//! // Same seed, same rate, same horizon: same spike train
//! let spike_train = generate(42, 5.0, 200.0).unwrap();
//! assert_eq!(spike_train, generate(42, 5.0, 200.0).unwrap());
//! assert!(spike_train.firing_times().iter().all(|&t| t < 200.0));
//! ```
//!
//! # Running Experiments
//!
//! ```rust
//! use rusty_cell::engine::{EngineError, SimulationEngine, SimulationSettings, StimulusDescriptor, VoltageTrace};
//! use rusty_cell::experiment::ExperimentDriver;
//! use rusty_cell::model::ModelDescriptor;
//! use rusty_cell::params::SimulationParameters;
//!
//! // An engine holding the membrane at its initial voltage
//! struct RestingEngine;
//!
//! impl SimulationEngine for RestingEngine {
//!     fn simulate(
//!         &self,
//!         _model: &ModelDescriptor,
//!         _stimulus: &StimulusDescriptor,
//!         settings: &SimulationSettings,
//!     ) -> Result<VoltageTrace, EngineError> {
//!         let num_steps = (settings.t_stop / settings.integration.dt) as usize;
//!         Ok((0..=num_steps)
//!             .map(|n| (n as f64 * settings.integration.dt, settings.integration.v_init))
//!             .collect())
//!     }
//! }
//!
//! let params = SimulationParameters::from_json(r#"{
//!     "passive": {"cm_mult": 1.0, "ra": 100.0},
//!     "soma": {"active": true, "mechanism": "hh", "gnabar": 1.0, "gkbar": 1.0, "gl": 1.0, "el": -54.3},
//!     "dend": {"active": false, "e": -70.0, "g": 0.0001},
//!     "synapse": {"compartment": "soma", "position": 0.5, "tau_rise": 0.5,
//!                 "tau_decay": 1.5, "e_rev": 0.0, "weight": 1.17},
//!     "stimulus": {"seed": 149, "rate_hz": 5.0, "horizon_ms": 200.0},
//!     "integration": {"v_init": -70.0, "dt": 0.5, "temperature": 35.0,
//!                     "reversal_potentials": {"ena": 50.0, "ek": -77.0}}
//! }"#).unwrap();
//!
//! let driver = ExperimentDriver::new(RestingEngine);
//! let trace = driver.run(&params).unwrap();
//! assert_eq!(trace.len(), 401);
//! ```

pub mod engine;
pub mod error;
pub mod experiment;
pub mod mechanism;
pub mod model;
pub mod params;
pub mod spike_train;
