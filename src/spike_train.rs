//! This module provides functionality for sampling Poisson spike trains.
//!
//! # Examples
//!
//! ```rust
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//! use rusty_cell::spike_train::PoissonSpikeTrainSampler;
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//!
//! let sampler = PoissonSpikeTrainSampler::build(5.0, 200.0).unwrap();
//! let spike_train = sampler.sample(&mut rng);
//!
//! assert!(spike_train.firing_times().iter().all(|&t| t < 200.0));
//! ```

use itertools::Itertools;
use log::{debug, trace};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rand_distr::Open01;
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt;

/// Upper bound on the number of spikes reserved up front.
const MAX_RESERVED_SPIKES: usize = 1 << 20;

/// Error type for spike train generation.
#[derive(Debug, PartialEq, Clone)]
pub enum GenerationError {
    /// Returned when the firing rate is not positive (or not finite).
    InvalidFiringRate(f64),
    /// Returned when the horizon is not positive (or not finite).
    InvalidHorizon(f64),
    /// Returned when explicit firing times are not finite or not strictly increasing.
    InvalidFiringTimes,
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            GenerationError::InvalidFiringRate(rate) => {
                write!(f, "The firing rate must be positive, got {} Hz.", rate)
            }
            GenerationError::InvalidHorizon(horizon) => {
                write!(f, "The horizon must be positive, got {} ms.", horizon)
            }
            GenerationError::InvalidFiringTimes => {
                write!(f, "Firing times must be finite and strictly increasing.")
            }
        }
    }
}

impl Error for GenerationError {}

/// An ordered, strictly increasing sequence of spike times (in ms).
/// Deserialization goes through the same checks as [`SpikeTrain::build`].
#[derive(Debug, PartialEq, Clone, Default, Serialize, Deserialize)]
#[serde(try_from = "Vec<f64>", into = "Vec<f64>")]
pub struct SpikeTrain {
    firing_times: Vec<f64>,
}

impl SpikeTrain {
    /// Create a spike train from explicit firing times, keeping only the times up to the horizon.
    /// The function returns an error for non-finite or unsorted firing times.
    pub fn build(firing_times: &[f64], horizon: f64) -> Result<Self, GenerationError> {
        if !(horizon.is_finite() && horizon > 0.0) {
            return Err(GenerationError::InvalidHorizon(horizon));
        }

        check_firing_times(firing_times)?;

        let firing_times = firing_times
            .iter()
            .copied()
            .take_while(|&t| t <= horizon)
            .collect();

        Ok(SpikeTrain { firing_times })
    }

    /// Returns the firing times of the spike train.
    pub fn firing_times(&self) -> &[f64] {
        &self.firing_times[..]
    }

    /// Returns the number of spikes.
    pub fn len(&self) -> usize {
        self.firing_times.len()
    }

    /// Returns true if the spike train has no spike.
    pub fn is_empty(&self) -> bool {
        self.firing_times.is_empty()
    }
}

impl TryFrom<Vec<f64>> for SpikeTrain {
    type Error = GenerationError;

    fn try_from(firing_times: Vec<f64>) -> Result<Self, Self::Error> {
        check_firing_times(&firing_times)?;
        Ok(SpikeTrain { firing_times })
    }
}

impl From<SpikeTrain> for Vec<f64> {
    fn from(spike_train: SpikeTrain) -> Self {
        spike_train.firing_times
    }
}

/// Firing times must be finite, non-negative, and strictly increasing.
fn check_firing_times(firing_times: &[f64]) -> Result<(), GenerationError> {
    if firing_times.iter().any(|t| !t.is_finite() || *t < 0.0) {
        return Err(GenerationError::InvalidFiringTimes);
    }

    if firing_times.iter().tuple_windows().any(|(t1, t2)| t2 <= t1) {
        return Err(GenerationError::InvalidFiringTimes);
    }

    Ok(())
}

/// Sampler for homogeneous Poisson spike trains truncated to a horizon.
#[derive(Debug, PartialEq, Clone)]
pub struct PoissonSpikeTrainSampler {
    /// The mean firing rate (in Hz).
    firing_rate: f64,
    /// The simulation horizon (in ms).
    horizon: f64,
}

impl PoissonSpikeTrainSampler {
    /// Creates a new sampler with the specified firing rate (Hz) and horizon (ms).
    ///
    /// # Errors
    /// Returns an error if the firing rate or the horizon is not positive.
    pub fn build(firing_rate: f64, horizon: f64) -> Result<Self, GenerationError> {
        if !(firing_rate.is_finite() && firing_rate > 0.0) {
            return Err(GenerationError::InvalidFiringRate(firing_rate));
        }

        if !(horizon.is_finite() && horizon > 0.0) {
            return Err(GenerationError::InvalidHorizon(horizon));
        }

        Ok(PoissonSpikeTrainSampler {
            firing_rate,
            horizon,
        })
    }

    /// Returns the mean inter-spike interval (in ms).
    pub fn mean_interval(&self) -> f64 {
        1000.0 / self.firing_rate
    }

    /// Samples a spike train.
    ///
    /// Inter-spike intervals are drawn by inverse-CDF sampling of the exponential distribution.
    /// Sampling stops with the first partial sum reaching the horizon, and that sum is dropped.
    pub fn sample<R: Rng>(&self, rng: &mut R) -> SpikeTrain {
        let mean_interval = self.mean_interval();
        let expected = (self.horizon / mean_interval).ceil() as usize;
        let mut firing_times = Vec::with_capacity(expected.min(MAX_RESERVED_SPIKES));

        let mut elapsed = 0.0;
        loop {
            let roll: f64 = rng.sample(Open01);
            let interval = -mean_interval * roll.ln();
            trace!("Drew interval {} ms (u = {})", interval, roll);

            elapsed += interval;
            if elapsed >= self.horizon {
                break;
            }

            // At extreme rates an interval can vanish in the sum
            if firing_times.last().map_or(true, |&last| elapsed > last) {
                firing_times.push(elapsed);
            }
        }

        debug!(
            "Sampled {} spikes at {} Hz over {} ms",
            firing_times.len(),
            self.firing_rate,
            self.horizon
        );

        SpikeTrain { firing_times }
    }
}

/// Generates a Poisson spike train from a fresh generator seeded with `seed`.
/// The same seed, rate, and horizon always reproduce the same spike train.
pub fn generate(seed: u64, rate_hz: f64, horizon_ms: f64) -> Result<SpikeTrain, GenerationError> {
    let sampler = PoissonSpikeTrainSampler::build(rate_hz, horizon_ms)?;
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    Ok(sampler.sample(&mut rng))
}
