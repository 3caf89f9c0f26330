use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// Configuration data for population generation
/// and evolution.
///
/// # Note
/// All quantities expressing probabilities
/// should be in the range [0.0, 1.0]. Using
/// values that are not in this bound may result
/// in odd behaviours and/or incorrect programs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PopulationConfig {
    /// Size of the population.
    pub size: NonZeroUsize,
    /// Genetic distance threshold, beyond which
    /// genomes are considered as belonging to
    /// different species.
    pub distance_threshold: f32,
    /// Number of top species, ranked by their best
    /// member, that are never considered stagnant.
    pub elitism: usize,
    /// Number of generations without a fitness increase
    /// before a species is considered _stagnated_.
    pub stagnation_threshold: NonZeroUsize,
    /// Mutation rate handed to the mutation strategy.
    pub mutation_rate: f32,
    /// Per-node chance of a bias nudge applied to every child
    /// after the mutation strategy has run.
    pub bias_mutation_rate: f32,
    /// Bound of that bias nudge.
    pub bias_mutation_power: f32,
}

impl PopulationConfig {
    /// Returns a "zero-valued" default configuration.
    /// All values are 0, or in the case of
    /// `NonZeroUsize`s, 1.
    ///
    /// # Note
    /// This value is not suitable for use in most experiments.
    /// It is meant as a way to abbreviate configuration
    /// instantiation, or to fill in unused values.
    ///
    /// # Examples
    /// ```
    /// use ffneat::PopulationConfig;
    ///
    /// let cfg1 = PopulationConfig::zero();
    ///
    /// let cfg2 = PopulationConfig {
    ///     // Specify some values here...
    ///     distance_threshold: 3.0,
    ///     // Default the rest...
    ///     ..PopulationConfig::zero()
    /// };
    /// ```
    pub const fn zero() -> PopulationConfig {
        PopulationConfig {
            size: NonZeroUsize::MIN,
            distance_threshold: 0.0,
            elitism: 0,
            stagnation_threshold: NonZeroUsize::MIN,
            mutation_rate: 0.0,
            bias_mutation_rate: 0.0,
            bias_mutation_power: 0.0,
        }
    }
}

impl Default for PopulationConfig {
    fn default() -> Self {
        PopulationConfig {
            size: NonZeroUsize::new(150).unwrap_or(NonZeroUsize::MIN),
            distance_threshold: 3.0,
            elitism: 2,
            stagnation_threshold: NonZeroUsize::new(15).unwrap_or(NonZeroUsize::MIN),
            mutation_rate: 0.3,
            bias_mutation_rate: 0.3,
            bias_mutation_power: 0.3,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_round_trip() {
        let config = PopulationConfig::default();
        let text = serde_json::to_string(&config).unwrap();
        assert_eq!(serde_json::from_str::<PopulationConfig>(&text).unwrap(), config);
    }
}
