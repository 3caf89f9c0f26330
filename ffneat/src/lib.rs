//! An implementation of NeuroEvolution of Augmenting Topologies,
//! following the 2002 paper: <http://nn.cs.utexas.edu/keyword?stanley:ec02>,
//! restricted to feed-forward networks.
//!
//! Genomes are directed acyclic graphs of node and connection genes,
//! aligned across the population by innovation numbers handed out
//! by an [`IdentityRegistry`]. A [`Population`] clusters genomes into
//! species, protects improving species from stagnation and breeds
//! each new generation through a pluggable crossover and mutation
//! strategy pair. Generational population logging is also supported.
//!
//! Events are emitted through [`tracing`]; install a subscriber to
//! see them.
//!
//! # Example usage: Evolution of XOR function approximator
//! ```
//! use ffneat::{crossover, GeneticConfig, Genome, Population, PopulationConfig, StructuralMutator};
//! use std::num::NonZeroUsize;
//!
//! fn evaluate_xor(genome: &Genome) -> f32 {
//!     let values = [
//!         ([0.0, 0.0], 0.0),
//!         ([0.0, 1.0], 1.0),
//!         ([1.0, 0.0], 1.0),
//!         ([1.0, 1.0], 0.0),
//!     ];
//!
//!     let mut error = 0.0;
//!     for (input, output) in values.iter() {
//!         match genome.activate(input) {
//!             Ok(result) => error += (result[0] - output).abs(),
//!             Err(_) => return f32::NEG_INFINITY,
//!         }
//!     }
//!     -error
//! }
//!
//! fn main() {
//!     let genetic_config = GeneticConfig {
//!         input_count: NonZeroUsize::new(2).unwrap(),
//!         output_count: NonZeroUsize::new(1).unwrap(),
//!         initial_hidden_nodes: 2,
//!         ..GeneticConfig::default()
//!     };
//!
//!     let population_config = PopulationConfig {
//!         size: NonZeroUsize::new(50).unwrap(),
//!         ..PopulationConfig::default()
//!     };
//!
//!     let mutator = StructuralMutator::default();
//!     let mut population = Population::new(population_config, genetic_config);
//!     for _ in 0..20 {
//!         population.evaluate_fitness(evaluate_xor);
//!         if population.best_fitness() > -0.1 {
//!             println!("Solution found!: {}", population.best_genome().unwrap());
//!             break;
//!         }
//!         if let Err(e) = population.evolve(&crossover, &mutator) {
//!             eprintln!("{}", e);
//!             break;
//!         }
//!     }
//! }
//! ```

pub mod adjacency;
pub mod genomics;
pub mod operators;
pub mod populations;

/// Innovation number shared by equivalent genes across genomes.
pub type Innovation = usize;
/// Genome-local node identifier.
pub type NodeId = usize;
/// Population-wide genome identifier.
pub type GenomeId = usize;

pub use genomics::{GeneticConfig, Genome, GenomeError, IdentityRegistry};
pub use operators::{crossover, CrossoverStrategy, MutationConfig, MutationStrategy, StructuralMutator};
pub use populations::{logging, Population, PopulationConfig, PopulationError};
