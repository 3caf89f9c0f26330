use crate::GenomeId;

use thiserror::Error;

/// Errors preventing a population from evolving.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PopulationError {
    /// A genome has no fitness assigned.
    #[error("genome {0} has not been evaluated")]
    UnevaluatedGenome(GenomeId),
    /// A genome's fitness is NaN.
    #[error("genome {genome} has invalid fitness {fitness}")]
    InvalidFitness { genome: GenomeId, fitness: f32 },
    /// The population holds no genomes.
    #[error("population is empty")]
    EmptyPopulation,
}
