use serde::{Deserialize, Serialize};

use std::num::NonZeroUsize;

/// Configuration data for genome generation
/// and inter-genome comparison.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeneticConfig {
    /// Number of inputs in a genome.
    pub input_count: NonZeroUsize,
    /// Number of outputs in a genome.
    pub output_count: NonZeroUsize,
    /// Number of hidden nodes in a newly generated genome.
    pub initial_hidden_nodes: usize,
    /// Weight of excess genes in genetic distance.
    pub excess_gene_factor: f32,
    /// Weight of disjoint genes in genetic distance.
    pub disjoint_gene_factor: f32,
    /// Weight of the summed matching-connection weight
    /// difference in genetic distance.
    pub weight_difference_factor: f32,
}

impl GeneticConfig {
    /// Returns a "zero-valued" default configuration.
    /// All values are 0, or in the case of
    /// `NonZeroUsize`s, 1.
    ///
    /// # Note
    /// This value is not suitable for use in most experiments.
    /// It is meant as a way to fill in unused values during
    /// configuration instantiation.
    ///
    /// # Examples
    /// ```
    /// use ffneat::GeneticConfig;
    ///
    /// let cfg1 = GeneticConfig::zero();
    ///
    /// let cfg2 = GeneticConfig {
    ///     // Specify some values here...
    ///     initial_hidden_nodes: 2,
    ///     // Default the rest...
    ///     ..GeneticConfig::zero()
    /// };
    /// ```
    pub const fn zero() -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::MIN,
            output_count: NonZeroUsize::MIN,
            initial_hidden_nodes: 0,
            excess_gene_factor: 0.0,
            disjoint_gene_factor: 0.0,
            weight_difference_factor: 0.0,
        }
    }
}

impl Default for GeneticConfig {
    /// Unit compatibility factors over a single-input,
    /// single-output genome with no hidden nodes.
    fn default() -> Self {
        GeneticConfig {
            excess_gene_factor: 1.0,
            disjoint_gene_factor: 1.0,
            weight_difference_factor: 1.0,
            ..GeneticConfig::zero()
        }
    }
}
