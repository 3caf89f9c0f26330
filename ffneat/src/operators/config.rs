use serde::{Deserialize, Serialize};

/// Probabilities and magnitudes used by the
/// [`StructuralMutator`].
///
/// [`StructuralMutator`]: crate::operators::StructuralMutator
///
/// # Note
/// All quantities expressing probabilities
/// should be in the range [0.0, 1.0].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MutationConfig {
    /// Chance that connection weights are mutated at all.
    pub weight_mutation_chance: f32,
    /// Per-connection chance of a weight nudge,
    /// once weights are being mutated.
    pub weight_mutation_rate: f32,
    /// Bound of the uniform weight nudge.
    pub weight_mutation_power: f32,
    /// Per-node chance of a bias nudge, once biases
    /// are being mutated.
    pub bias_mutation_rate: f32,
    /// Bound of the uniform bias nudge.
    pub bias_mutation_power: f32,
    /// Chance of a node addition mutation.
    pub node_addition_chance: f32,
    /// Chance of a connection addition mutation.
    pub connection_addition_chance: f32,
    /// Chance of a node elimination mutation.
    pub node_elimination_chance: f32,
    /// Chance of a connection elimination mutation.
    pub connection_elimination_chance: f32,
}

impl MutationConfig {
    /// Returns a "zero-valued" configuration under
    /// which no mutation ever takes place.
    ///
    /// # Examples
    /// ```
    /// use ffneat::operators::MutationConfig;
    ///
    /// let config = MutationConfig {
    ///     node_addition_chance: 1.0,
    ///     ..MutationConfig::zero()
    /// };
    /// ```
    pub const fn zero() -> MutationConfig {
        MutationConfig {
            weight_mutation_chance: 0.0,
            weight_mutation_rate: 0.0,
            weight_mutation_power: 0.0,
            bias_mutation_rate: 0.0,
            bias_mutation_power: 0.0,
            node_addition_chance: 0.0,
            connection_addition_chance: 0.0,
            node_elimination_chance: 0.0,
            connection_elimination_chance: 0.0,
        }
    }
}

impl Default for MutationConfig {
    fn default() -> Self {
        MutationConfig {
            weight_mutation_chance: 0.2,
            weight_mutation_rate: 0.5,
            weight_mutation_power: 0.2,
            bias_mutation_rate: 0.5,
            bias_mutation_power: 0.2,
            node_addition_chance: 0.3,
            connection_addition_chance: 0.3,
            node_elimination_chance: 0.2,
            connection_elimination_chance: 0.2,
        }
    }
}
