//! Orchestration of single-cell experiments.
//!
//! A run configures the model, generates the input spike train, and submits both to the
//! engine in a single call. Any error fails the whole run.

use log::info;
use rayon::prelude::*;

use crate::engine::{SimulationEngine, SimulationSettings, StimulusDescriptor, VoltageTrace};
use crate::error::SimError;
use crate::model::{configure, ModelDescriptor};
use crate::params::SimulationParameters;
use crate::spike_train::{generate, SpikeTrain};

/// Everything the engine receives for one run.
#[derive(Debug, PartialEq, Clone)]
pub struct Experiment {
    pub model: ModelDescriptor,
    pub spike_train: SpikeTrain,
    pub stimulus: StimulusDescriptor,
    pub settings: SimulationSettings,
}

impl Experiment {
    /// Build the descriptors of a run, without calling the engine.
    ///
    /// The spike train is sampled from a generator owned by this call, unless the
    /// parameters provide explicit spike times.
    pub fn build(params: &SimulationParameters) -> Result<Self, SimError> {
        let model = configure(params)?;

        let stimulus_params = &params.stimulus;
        let spike_train = match &stimulus_params.spikes {
            Some(spikes) => SpikeTrain::build(spikes, stimulus_params.horizon_ms)?,
            None => generate(
                stimulus_params.seed,
                stimulus_params.rate_hz,
                stimulus_params.horizon_ms,
            )?,
        };

        let stimulus =
            StimulusDescriptor::new(&spike_train, model.synapse.weight, model.synapse.delay);

        let settings = SimulationSettings {
            integration: params.integration.clone(),
            t_stop: stimulus_params.horizon_ms,
        };

        Ok(Experiment {
            model,
            spike_train,
            stimulus,
            settings,
        })
    }
}

/// Drives experiments on a simulation engine.
#[derive(Debug, Clone)]
pub struct ExperimentDriver<E: SimulationEngine> {
    engine: E,
}

impl<E: SimulationEngine> ExperimentDriver<E> {
    pub fn new(engine: E) -> Self {
        ExperimentDriver { engine }
    }

    /// Returns the underlying engine.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Run one experiment and return the voltage trace produced by the engine, unmodified.
    pub fn run(&self, params: &SimulationParameters) -> Result<VoltageTrace, SimError> {
        let experiment = Experiment::build(params)?;

        info!(
            "Starting simulation of {} ms with {} input spikes...",
            experiment.settings.t_stop,
            experiment.stimulus.num_events()
        );

        let trace = self.engine.simulate(
            &experiment.model,
            &experiment.stimulus,
            &experiment.settings,
        )?;

        info!("Simulation finished with {} voltage samples", trace.len());
        Ok(trace)
    }
}

/// Run independent experiments in parallel, one result per parameter set (in order).
///
/// Each run gets its own engine from `new_engine`, its own generator, and its own
/// descriptors: no state is shared across runs, and a failing run does not affect the others.
pub fn run_sweep<E, F>(
    sweep: &[SimulationParameters],
    new_engine: F,
) -> Vec<Result<VoltageTrace, SimError>>
where
    E: SimulationEngine,
    F: Fn() -> E + Sync,
{
    info!("Starting a sweep of {} experiments...", sweep.len());
    sweep
        .par_iter()
        .map(|params| ExperimentDriver::new(new_engine()).run(params))
        .collect()
}

/// Run one experiment on the given engine.
pub fn run<E: SimulationEngine>(
    params: &SimulationParameters,
    engine: E,
) -> Result<VoltageTrace, SimError> {
    ExperimentDriver::new(engine).run(params)
}
