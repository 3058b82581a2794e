//! Assembly of the cell model from its declarative parameters.
//!
//! The model has two compartments: a spherical soma and a cylindrical dendrite. Each one
//! receives either a passive leak or a single active mechanism from the catalogue, see
//! [`Mechanism`]. The synapse is a two-exponential conductance placed on one of them.
//!
//! # Examples
//!
//! ```rust
//! use rusty_cell::model::{configure, CompartmentMechanismAssignment};
//! use rusty_cell::params::{CompartmentParameters, SimulationParameters};
//!
//! # let json = r#"{
//! #     "passive": {"cm_mult": 1.0, "ra": 100.0},
//! #     "soma": {"active": false, "e": -70.0, "g": 0.0001},
//! #     "dend": {"active": false, "e": -70.0, "g": 0.0001},
//! #     "synapse": {"compartment": "soma", "position": 0.5, "tau_rise": 0.5,
//! #                 "tau_decay": 1.5, "e_rev": 0.0, "weight": 1.17},
//! #     "stimulus": {"seed": 149, "rate_hz": 5.0, "horizon_ms": 200.0},
//! #     "integration": {"v_init": -70.0, "dt": 0.025, "temperature": 35.0,
//! #                     "reversal_potentials": {"ek": -85.0}}
//! # }"#;
//! let mut params = SimulationParameters::from_json(json).unwrap();
//! params.soma = CompartmentParameters::active("cagk").with_field("gkbar", 0.5);
//!
//! let model = configure(&params).unwrap();
//! assert_eq!(model.soma.assignment.parameter("gkbar"), Some(0.0006 * 0.5));
//! ```

use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::ConfigError;
use crate::mechanism::Mechanism;
use crate::params::{
    Compartment, CompartmentParameters, IntegrationParameters, SimulationParameters,
};

/// Baseline specific membrane capacitance (µF/cm²), scaled by `cm_mult`.
pub const SPECIFIC_CAPACITANCE: f64 = 1.0;
/// Soma diameter (µm), for a membrane area of about 500 µm².
pub const SOMA_DIAMETER: f64 = 11.65968;
/// Dendrite diameter (µm).
pub const DEND_DIAMETER: f64 = 1.165968;
/// Dendrite length (µm).
pub const DEND_LENGTH: f64 = 100.0;
/// Number of segments of the dendritic cable.
pub const DEND_SEGMENTS: usize = 100;
/// Position of the voltage probe on the soma.
pub const PROBE_POSITION: f64 = 0.5;

/// Ionic conductances of one compartment.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub enum CompartmentMechanismAssignment {
    /// Passive leak with its reversal potential (mV) and conductance (S/cm²).
    Passive { e_leak: f64, g_leak: f64 },
    /// Active mechanism with its parameters, keyed by field name: conductances scaled by
    /// their baseline, and reversal potentials (e.g., `el`) passed through unscaled.
    Active {
        mechanism: Mechanism,
        parameters: BTreeMap<String, f64>,
    },
}

impl CompartmentMechanismAssignment {
    /// Returns the active mechanism, if any.
    pub fn mechanism(&self) -> Option<Mechanism> {
        match self {
            CompartmentMechanismAssignment::Passive { .. } => None,
            CompartmentMechanismAssignment::Active { mechanism, .. } => Some(*mechanism),
        }
    }

    /// Returns the scaled value of a parameter of the active mechanism.
    pub fn parameter(&self, name: &str) -> Option<f64> {
        match self {
            CompartmentMechanismAssignment::Passive { .. } => None,
            CompartmentMechanismAssignment::Active { parameters, .. } => {
                parameters.get(name).copied()
            }
        }
    }
}

/// Shape of a compartment.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub enum Geometry {
    Sphere { diameter: f64 },
    Cable { diameter: f64, length: f64, segments: usize },
}

/// A compartment with its cable properties and conductances.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct CompartmentSpec {
    pub compartment: Compartment,
    pub geometry: Geometry,
    /// Specific membrane capacitance (µF/cm²).
    pub membrane_capacitance: f64,
    /// Axial resistivity (Ω·cm).
    pub axial_resistivity: f64,
    pub assignment: CompartmentMechanismAssignment,
}

/// Placement and kinetics of the two-exponential synapse.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct SynapseSpec {
    pub compartment: Compartment,
    /// Normalized position along the compartment.
    pub position: f64,
    pub tau_rise: f64,
    pub tau_decay: f64,
    pub e_rev: f64,
    pub weight: f64,
    pub delay: f64,
}

/// A point of the cell where the voltage is recorded.
#[derive(Debug, PartialEq, Clone, Copy, Serialize, Deserialize)]
pub struct Probe {
    pub compartment: Compartment,
    pub position: f64,
}

/// The topology handed over to the simulation engine.
#[derive(Debug, PartialEq, Clone, Serialize, Deserialize)]
pub struct ModelDescriptor {
    pub soma: CompartmentSpec,
    pub dend: CompartmentSpec,
    pub synapse: SynapseSpec,
    pub probe: Probe,
}

impl ModelDescriptor {
    /// Returns the compartments, soma first.
    pub fn compartments(&self) -> [&CompartmentSpec; 2] {
        [&self.soma, &self.dend]
    }

    /// Returns the specification of the given compartment.
    pub fn compartment(&self, compartment: Compartment) -> &CompartmentSpec {
        match compartment {
            Compartment::Soma => &self.soma,
            Compartment::Dendrite => &self.dend,
        }
    }
}

/// Derive the model descriptor from the parameters.
///
/// The function is pure: the same parameters always yield the same descriptor.
///
/// # Errors
/// Returns an error if a scalar parameter is out of range, a mechanism tag is unknown, or
/// a field required by a selected mechanism (or its reversal potentials) is missing or not numeric.
pub fn configure(params: &SimulationParameters) -> Result<ModelDescriptor, ConfigError> {
    params.validate()?;

    let membrane_capacitance = SPECIFIC_CAPACITANCE * params.passive.cm_mult;
    let axial_resistivity = params.passive.ra;

    let soma = CompartmentSpec {
        compartment: Compartment::Soma,
        geometry: Geometry::Sphere {
            diameter: SOMA_DIAMETER,
        },
        membrane_capacitance,
        axial_resistivity,
        assignment: assign(Compartment::Soma, &params.soma, &params.integration)?,
    };

    let dend = CompartmentSpec {
        compartment: Compartment::Dendrite,
        geometry: Geometry::Cable {
            diameter: DEND_DIAMETER,
            length: DEND_LENGTH,
            segments: DEND_SEGMENTS,
        },
        membrane_capacitance,
        axial_resistivity,
        assignment: assign(Compartment::Dendrite, &params.dend, &params.integration)?,
    };

    let synapse = SynapseSpec {
        compartment: params.synapse.compartment,
        position: params.synapse.position,
        tau_rise: params.synapse.tau_rise,
        tau_decay: params.synapse.tau_decay,
        e_rev: params.synapse.e_rev,
        weight: params.synapse.weight,
        delay: params.synapse.delay,
    };

    Ok(ModelDescriptor {
        soma,
        dend,
        synapse,
        probe: Probe {
            compartment: Compartment::Soma,
            position: PROBE_POSITION,
        },
    })
}

/// Select the conductances of one compartment.
fn assign(
    compartment: Compartment,
    params: &CompartmentParameters,
    integration: &IntegrationParameters,
) -> Result<CompartmentMechanismAssignment, ConfigError> {
    if !params.active {
        let e_leak = required(compartment, params, "e")?;
        let g_leak = required(compartment, params, "g")?;
        warn_unused(compartment, params, Mechanism::Pas);
        debug!("{}: passive leak (e = {}, g = {})", compartment.name(), e_leak, g_leak);
        return Ok(CompartmentMechanismAssignment::Passive { e_leak, g_leak });
    }

    let tag = params
        .mechanism
        .as_deref()
        .ok_or_else(|| ConfigError::MissingField(format!("{}.mechanism", compartment.name())))?;
    let mechanism: Mechanism = tag.parse()?;

    let mut parameters = BTreeMap::new();
    let mut missing = vec![];
    for field in mechanism.fields() {
        match params.numeric_field(field.name, mechanism)? {
            Some(value) => {
                parameters.insert(field.name.to_string(), field.scale * value);
            }
            None => missing.push(field.name.to_string()),
        }
    }

    if !missing.is_empty() {
        return Err(match mechanism.fields().len() {
            1 => ConfigError::MissingField(format!("{}.{}", compartment.name(), missing[0])),
            _ => ConfigError::IncompleteMechanism {
                mechanism: mechanism.name().to_string(),
                missing,
            },
        });
    }

    if let Some(key) = mechanism
        .reversal_potentials()
        .iter()
        .find(|key| !integration.reversal_potentials.contains_key(**key))
    {
        return Err(ConfigError::MissingField(format!(
            "integration.reversal_potentials.{}",
            key
        )));
    }

    warn_unused(compartment, params, mechanism);
    debug!("{}: {} {:?}", compartment.name(), mechanism, parameters);

    Ok(CompartmentMechanismAssignment::Active {
        mechanism,
        parameters,
    })
}

fn required(
    compartment: Compartment,
    params: &CompartmentParameters,
    name: &str,
) -> Result<f64, ConfigError> {
    params
        .numeric_field(name, Mechanism::Pas)?
        .ok_or_else(|| ConfigError::MissingField(format!("{}.{}", compartment.name(), name)))
}

fn warn_unused(compartment: Compartment, params: &CompartmentParameters, mechanism: Mechanism) {
    for key in params.unused_fields(mechanism) {
        warn!("Unused parameter for {} ({}): {}", compartment.name(), mechanism, key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::tests::passive_params;
    use serde_json::json;

    #[test]
    fn test_configure_passive() {
        let model = configure(&passive_params()).unwrap();

        assert_eq!(
            model.soma.assignment,
            CompartmentMechanismAssignment::Passive {
                e_leak: -70.0,
                g_leak: 0.0001
            }
        );
        assert_eq!(
            model.dend.assignment,
            CompartmentMechanismAssignment::Passive {
                e_leak: -65.0,
                g_leak: 0.0002
            }
        );
        assert_eq!(model.soma.membrane_capacitance, 1.0);
        assert_eq!(model.dend.axial_resistivity, 100.0);
        assert_eq!(model.probe.compartment, Compartment::Soma);
        assert_eq!(model.synapse.weight, 1.17);
        assert_eq!(model.synapse.compartment, Compartment::Soma);
    }

    #[test]
    fn test_configure_is_pure() {
        let mut params = passive_params();
        params.soma = CompartmentParameters::active("ichan2")
            .with_field("gnatbar", 1.0)
            .with_field("gkfbar", 1.5)
            .with_field("gksbar", 0.8)
            .with_field("gl", 1.0)
            .with_field("el", -70.0);

        let model_1 = configure(&params).unwrap();
        let model_2 = configure(&params).unwrap();
        assert_eq!(model_1, model_2);
    }

    #[test]
    fn test_configure_baseline_scales() {
        let mut params = passive_params();
        params.soma = CompartmentParameters::active("cagk").with_field("gkbar", 0.5);
        let model = configure(&params).unwrap();
        assert_eq!(model.soma.assignment.mechanism(), Some(Mechanism::Cagk));
        assert_eq!(model.soma.assignment.parameter("gkbar"), Some(0.0006 * 0.5));

        params.soma = CompartmentParameters::active("ichan2")
            .with_field("gnatbar_ichan2", 2.0)
            .with_field("gkfbar_ichan2", 1.0)
            .with_field("gksbar_ichan2", 1.0)
            .with_field("gl_ichan2", 1.0)
            .with_field("el_ichan2", -70.0);
        let model = configure(&params).unwrap();
        assert_eq!(model.soma.assignment.parameter("gnatbar"), Some(0.120 * 2.0));
        assert_eq!(model.soma.assignment.parameter("gkfbar"), Some(0.016));
        assert_eq!(model.soma.assignment.parameter("el"), Some(-70.0));

        params.dend = CompartmentParameters::active("ccanl")
            .with_field("catau", 2.0)
            .with_field("caiinf", 1.0);
        let model = configure(&params).unwrap();
        assert_eq!(model.dend.assignment.parameter("catau"), Some(20.0));
        assert_eq!(model.dend.assignment.parameter("caiinf"), Some(5.0e-6));

        params.soma = CompartmentParameters::active("hh")
            .with_field("gnabar", 1.0)
            .with_field("gkbar", 0.5)
            .with_field("gl", 2.0)
            .with_field("el", -54.3);
        let model = configure(&params).unwrap();
        assert_eq!(model.soma.assignment.mechanism(), Some(Mechanism::Hh));
        assert_eq!(model.soma.assignment.parameter("gnabar"), Some(0.12));
        assert_eq!(model.soma.assignment.parameter("gkbar"), Some(0.036 * 0.5));
        assert_eq!(model.soma.assignment.parameter("gl"), Some(0.0003 * 2.0));
        assert_eq!(model.soma.assignment.parameter("el"), Some(-54.3));
    }

    #[test]
    fn test_configure_capacitance() {
        let mut params = passive_params();
        params.passive.cm_mult = 1.5;
        let model = configure(&params).unwrap();
        assert!(model
            .compartments()
            .iter()
            .all(|c| c.membrane_capacitance == SPECIFIC_CAPACITANCE * 1.5));
    }

    #[test]
    fn test_configure_incomplete_mechanism() {
        let mut params = passive_params();
        params.soma = CompartmentParameters::active("ichan2")
            .with_field("gkfbar", 1.0)
            .with_field("gksbar", 1.0)
            .with_field("gl", 1.0)
            .with_field("el", -70.0);
        assert_eq!(
            configure(&params),
            Err(ConfigError::IncompleteMechanism {
                mechanism: "ichan2".to_string(),
                missing: vec!["gnatbar".to_string()]
            })
        );

        params.soma = CompartmentParameters::active("borgka");
        assert_eq!(
            configure(&params),
            Err(ConfigError::MissingField("soma.gkabar".to_string()))
        );
    }

    #[test]
    fn test_configure_invalid_mechanism() {
        let mut params = passive_params();
        params.dend = CompartmentParameters::active("kdr").with_field("gkdrbar", 1.0);
        assert_eq!(
            configure(&params),
            Err(ConfigError::UnknownMechanism("kdr".to_string()))
        );

        let mut params = passive_params();
        params.dend.active = true;
        assert_eq!(
            configure(&params),
            Err(ConfigError::MissingField("dend.mechanism".to_string()))
        );

        let mut params = passive_params();
        params.soma = CompartmentParameters::active("cagk");
        params.soma.fields.insert("gkbar".to_string(), json!("0.5"));
        assert!(matches!(
            configure(&params),
            Err(ConfigError::NonNumericField(_))
        ));
    }

    #[test]
    fn test_configure_missing_leak() {
        let mut params = passive_params();
        params.soma.fields.remove("g");
        assert_eq!(
            configure(&params),
            Err(ConfigError::MissingField("soma.g".to_string()))
        );
    }

    #[test]
    fn test_configure_ignores_unselected_fields() {
        let mut params = passive_params();
        params.soma.fields.insert("gnatbar".to_string(), json!("not a number"));
        params.soma.mechanism = Some("unknown".to_string());
        assert!(configure(&params).is_ok());
    }

    #[test]
    fn test_configure_missing_reversal_potential() {
        let mut params = passive_params();
        params.integration.reversal_potentials.remove("ek");
        params.soma = CompartmentParameters::active("cagk").with_field("gkbar", 0.5);
        assert_eq!(
            configure(&params),
            Err(ConfigError::MissingField(
                "integration.reversal_potentials.ek".to_string()
            ))
        );

        // nca relies on a fixed reversal potential
        params.soma = CompartmentParameters::active("nca").with_field("gncabar", 1.0);
        assert!(configure(&params).is_ok());
    }

    #[test]
    fn test_configure_synapse_on_dendrite() {
        let mut params = passive_params();
        params.synapse.compartment = Compartment::Dendrite;
        params.synapse.position = 0.9;
        params.synapse.delay = 1.5;
        let model = configure(&params).unwrap();
        assert_eq!(
            model.synapse,
            SynapseSpec {
                compartment: Compartment::Dendrite,
                position: 0.9,
                tau_rise: 0.5,
                tau_decay: 1.5,
                e_rev: 0.0,
                weight: 1.17,
                delay: 1.5,
            }
        );
        assert_eq!(
            model.compartment(model.synapse.compartment).geometry,
            Geometry::Cable {
                diameter: DEND_DIAMETER,
                length: DEND_LENGTH,
                segments: DEND_SEGMENTS
            }
        );
    }

    #[test]
    fn test_configure_invalid_values() {
        let mut params = passive_params();
        params.synapse.tau_decay = 0.0;
        assert!(matches!(configure(&params), Err(ConfigError::InvalidValue(_))));
    }
}
