//! Catalogue of the ionic conductance mechanisms that can be inserted in a compartment.
//!
//! Configured values are multipliers of calibrated baseline constants, e.g., a `cagk`
//! compartment configured with `gkbar = 0.5` gets a maximal conductance of `0.0006 * 0.5` S/cm².
//! Fields with a unit scale (reversal potentials) are passed through as is.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ConfigError;

/// A conductance field required by a mechanism, with its baseline scale.
#[derive(Debug, PartialEq, Clone, Copy)]
pub struct FieldSpec {
    /// Name of the field, both in the configuration and in the engine descriptor.
    pub name: &'static str,
    /// Baseline constant multiplying the configured value.
    pub scale: f64,
}

const fn field(name: &'static str, scale: f64) -> FieldSpec {
    FieldSpec { name, scale }
}

const ICHAN2: &[FieldSpec] = &[
    field("gnatbar", 0.120),
    field("gkfbar", 0.016),
    field("gksbar", 0.006),
    field("gl", 0.00004),
    field("el", 1.0),
];
const BORGKA: &[FieldSpec] = &[field("gkabar", 0.001)];
const NCA: &[FieldSpec] = &[field("gncabar", 0.001)];
const LCA: &[FieldSpec] = &[field("glcabar", 0.005)];
const CAT: &[FieldSpec] = &[field("gcatbar", 0.000037)];
const GSKCH: &[FieldSpec] = &[field("gskbar", 0.001)];
const CAGK: &[FieldSpec] = &[field("gkbar", 0.0006)];
const CCANL: &[FieldSpec] = &[field("catau", 10.0), field("caiinf", 5.0e-6)];
const HH: &[FieldSpec] = &[
    field("gnabar", 0.12),
    field("gkbar", 0.036),
    field("gl", 0.0003),
    field("el", 1.0),
];
const PAS: &[FieldSpec] = &[field("g", 1.0), field("e", 1.0)];

/// The closed set of mechanism tags.
#[derive(Debug, PartialEq, Eq, Hash, Clone, Copy, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mechanism {
    /// Fast sodium, fast and slow delayed rectifier potassium, and leak.
    Ichan2,
    /// A-type potassium.
    Borgka,
    /// N-type calcium.
    Nca,
    /// L-type calcium.
    Lca,
    /// T-type calcium.
    Cat,
    /// Calcium-activated (SK) potassium.
    Gskch,
    /// Calcium- and voltage-dependent (BK) potassium.
    Cagk,
    /// Calcium accumulation and decay.
    Ccanl,
    /// Hodgkin-Huxley sodium, potassium, and leak.
    Hh,
    /// Passive leak.
    Pas,
}

impl Mechanism {
    /// All mechanisms of the catalogue.
    pub const ALL: [Mechanism; 10] = [
        Mechanism::Ichan2,
        Mechanism::Borgka,
        Mechanism::Nca,
        Mechanism::Lca,
        Mechanism::Cat,
        Mechanism::Gskch,
        Mechanism::Cagk,
        Mechanism::Ccanl,
        Mechanism::Hh,
        Mechanism::Pas,
    ];

    /// Returns the tag of the mechanism.
    pub fn name(&self) -> &'static str {
        match self {
            Mechanism::Ichan2 => "ichan2",
            Mechanism::Borgka => "borgka",
            Mechanism::Nca => "nca",
            Mechanism::Lca => "lca",
            Mechanism::Cat => "cat",
            Mechanism::Gskch => "gskch",
            Mechanism::Cagk => "cagk",
            Mechanism::Ccanl => "ccanl",
            Mechanism::Hh => "hh",
            Mechanism::Pas => "pas",
        }
    }

    /// Returns the fields required by the mechanism together with their baseline scales.
    pub fn fields(&self) -> &'static [FieldSpec] {
        match self {
            Mechanism::Ichan2 => ICHAN2,
            Mechanism::Borgka => BORGKA,
            Mechanism::Nca => NCA,
            Mechanism::Lca => LCA,
            Mechanism::Cat => CAT,
            Mechanism::Gskch => GSKCH,
            Mechanism::Cagk => CAGK,
            Mechanism::Ccanl => CCANL,
            Mechanism::Hh => HH,
            Mechanism::Pas => PAS,
        }
    }

    /// Returns the reversal potentials (keys of the shared ionic table) the mechanism relies on.
    pub fn reversal_potentials(&self) -> &'static [&'static str] {
        match self {
            Mechanism::Ichan2 => &["enat", "ekf", "eks"],
            Mechanism::Borgka | Mechanism::Cagk => &["ek"],
            Mechanism::Lca => &["elca"],
            Mechanism::Cat => &["etca"],
            Mechanism::Gskch => &["esk"],
            Mechanism::Hh => &["ena", "ek"],
            // nca has a fixed zero reversal potential
            Mechanism::Nca | Mechanism::Ccanl | Mechanism::Pas => &[],
        }
    }
}

impl fmt::Display for Mechanism {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Mechanism {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Mechanism::ALL
            .iter()
            .find(|mechanism| mechanism.name() == s)
            .copied()
            .ok_or_else(|| ConfigError::UnknownMechanism(s.to_string()))
    }
}
