use std::sync::{Arc, Mutex};

use itertools::Itertools;
use rusty_cell::engine::{
    EngineError, SimulationEngine, SimulationSettings, StimulusDescriptor, VoltageTrace,
};
use rusty_cell::error::{ConfigError, SimError};
use rusty_cell::experiment::{run, run_sweep, ExperimentDriver};
use rusty_cell::mechanism::Mechanism;
use rusty_cell::model::{CompartmentMechanismAssignment, ModelDescriptor};
use rusty_cell::params::{CompartmentParameters, SimulationParameters};
use rusty_cell::spike_train::generate;

const PARAMS: &str = r#"{
    "passive": {"cm_mult": 1.0, "ra": 100.0},
    "soma": {"active": false, "e": -70.0, "g": 0.0001},
    "dend": {"active": false, "e": -70.0, "g": 0.0001},
    "synapse": {"compartment": "soma", "position": 0.5, "tau_rise": 0.5,
                "tau_decay": 1.5, "e_rev": 0.0, "weight": 1.17, "delay": 0.0},
    "stimulus": {"seed": 149, "rate_hz": 5.0, "horizon_ms": 200.0},
    "integration": {"v_init": -70.0, "dt": 0.025, "temperature": 35.0,
                    "reversal_potentials": {"ek": -85.0, "ena": 50.0, "enat": 45.0,
                                            "ekf": -90.0, "eks": -90.0, "elca": 130.0,
                                            "etca": 130.0, "esk": -90.0},
                    "ca_ext": 2.0}
}"#;

/// An engine recording every call and returning one sample per stimulus event.
#[derive(Default)]
struct RecordingEngine {
    calls: Mutex<Vec<(ModelDescriptor, StimulusDescriptor, SimulationSettings)>>,
}

impl RecordingEngine {
    fn num_calls(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl SimulationEngine for RecordingEngine {
    fn simulate(
        &self,
        model: &ModelDescriptor,
        stimulus: &StimulusDescriptor,
        settings: &SimulationSettings,
    ) -> Result<VoltageTrace, EngineError> {
        self.calls
            .lock()
            .unwrap()
            .push((model.clone(), stimulus.clone(), settings.clone()));

        Ok(stimulus
            .events()
            .iter()
            .map(|e| (e.arrival(), settings.integration.v_init + e.weight))
            .collect())
    }
}

/// A handle on a recording engine, kept alive after the run for inspection.
struct SharedEngine(Arc<RecordingEngine>);

impl SimulationEngine for SharedEngine {
    fn simulate(
        &self,
        model: &ModelDescriptor,
        stimulus: &StimulusDescriptor,
        settings: &SimulationSettings,
    ) -> Result<VoltageTrace, EngineError> {
        self.0.simulate(model, stimulus, settings)
    }
}

fn params() -> SimulationParameters {
    SimulationParameters::from_json(PARAMS).unwrap()
}

#[test]
fn test_run_passive_cell() {
    let engine = RecordingEngine::default();
    let trace = run(&params(), &engine).unwrap();

    let spike_train = generate(149, 5.0, 200.0).unwrap();
    assert_eq!(engine.num_calls(), 1);

    let calls = engine.calls.lock().unwrap();
    let (model, stimulus, settings) = &calls[0];
    assert_eq!(stimulus.num_events(), spike_train.len());
    assert!(matches!(
        model.soma.assignment,
        CompartmentMechanismAssignment::Passive { .. }
    ));
    assert!(matches!(
        model.dend.assignment,
        CompartmentMechanismAssignment::Passive { .. }
    ));
    assert_eq!(settings.t_stop, 200.0);
    assert_eq!(settings.integration.dt, 0.025);
    assert_eq!(settings.integration.temperature, 35.0);

    // the trace is handed back unmodified
    assert_eq!(trace.len(), spike_train.len());
    assert!(trace
        .samples()
        .iter()
        .zip(spike_train.firing_times())
        .all(|(s, &t)| s.time == t && s.voltage == -70.0 + 1.17));
}

#[test]
fn test_run_active_soma() {
    let mut params = params();
    params.soma = CompartmentParameters::active("cagk").with_field("gkbar", 0.5);

    let driver = ExperimentDriver::new(RecordingEngine::default());
    driver.run(&params).unwrap();

    let calls = driver.engine().calls.lock().unwrap();
    let soma = &calls[0].0.soma.assignment;
    assert_eq!(soma.mechanism(), Some(Mechanism::Cagk));
    assert_eq!(soma.parameter("gkbar"), Some(0.0006 * 0.5));
}

#[test]
fn test_run_fails_before_engine_call() {
    let engine = RecordingEngine::default();

    let mut params = params();
    params.soma = CompartmentParameters::active("ichan2")
        .with_field("gkfbar", 1.0)
        .with_field("gksbar", 1.0)
        .with_field("gl", 1.0)
        .with_field("el", -70.0);
    assert_eq!(
        run(&params, &engine),
        Err(SimError::Configuration(ConfigError::IncompleteMechanism {
            mechanism: "ichan2".to_string(),
            missing: vec!["gnatbar".to_string()],
        }))
    );

    let mut params = self::params();
    params.stimulus.rate_hz = -5.0;
    assert!(matches!(run(&params, &engine), Err(SimError::Generation(_))));

    assert_eq!(engine.num_calls(), 0);
}

#[test]
fn test_run_delay_is_configurable() {
    let mut params = params();
    params.synapse.delay = 3.0;

    let engine = RecordingEngine::default();
    let trace = run(&params, &engine).unwrap();
    let spike_train = generate(149, 5.0, 200.0).unwrap();

    assert!(trace
        .times()
        .zip(spike_train.firing_times())
        .all(|(arrival, &t)| arrival == t + 3.0));
}

#[test]
fn test_run_sweep() {
    let sweep = (0..16)
        .map(|seed| {
            let mut params = params();
            params.stimulus.seed = seed;
            params.stimulus.rate_hz = 20.0;
            if seed == 7 {
                params.dend = CompartmentParameters::active("unknown");
            }
            params
        })
        .collect_vec();

    let engines = Mutex::new(vec![]);
    let results = run_sweep(&sweep, || {
        let engine = Arc::new(RecordingEngine::default());
        engines.lock().unwrap().push(engine.clone());
        SharedEngine(engine)
    });

    assert_eq!(results.len(), 16);

    // one engine per run, each called at most once; the failing run never reaches its engine
    let engines = engines.into_inner().unwrap();
    assert_eq!(engines.len(), 16);
    let num_calls = engines.iter().map(|e| e.num_calls()).sorted().collect_vec();
    assert_eq!(num_calls[0], 0);
    assert!(num_calls[1..].iter().all(|&n| n == 1));

    for (seed, result) in results.iter().enumerate() {
        match seed {
            7 => assert_eq!(
                result,
                &Err(SimError::Configuration(ConfigError::UnknownMechanism(
                    "unknown".to_string()
                )))
            ),
            _ => {
                // each run matches the same run done in isolation
                let isolated = run(&sweep[seed], RecordingEngine::default()).unwrap();
                assert_eq!(result.as_ref().unwrap(), &isolated);
            }
        }
    }
}

#[test]
fn test_run_from_file() {
    let file = tempfile::NamedTempFile::new().unwrap();
    params().save_to(file.path()).unwrap();

    let params = SimulationParameters::load_from(file.path()).unwrap();
    let engine = RecordingEngine::default();
    run(&params, &engine).unwrap();
    assert_eq!(engine.num_calls(), 1);
}
