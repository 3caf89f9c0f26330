//! A Population is a collection of genomes.
//! These are grouped into species, which can
//! be evolved using a genome evaluation function
//! as the source of selective pressure.
mod config;
mod errors;
pub mod logging;
mod species;
mod stagnation;

pub use config::PopulationConfig;
pub use errors::PopulationError;
pub use species::{Species, SpeciesID};
pub use stagnation::StagnationTracker;

use crate::genomics::{GeneticConfig, Genome, IdentityRegistry};
use crate::operators::{CrossoverStrategy, MutationStrategy};
use crate::GenomeId;

use ahash::RandomState;
use rand::prelude::SliceRandom;
use rand::thread_rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use std::collections::HashSet;

/// A population of genomes.
///
/// Each generation follows the same cycle: genomes are
/// evaluated by the caller, then [`evolve`] clusters them
/// into species, shares fitness within each species,
/// flags stagnant species, keeps the fittest genomes of
/// the remaining ones and refills the population with
/// their offspring.
///
/// [`evolve`]: Population::evolve
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Population {
    genomes: Vec<Genome>,
    species: Vec<Species>,
    registry: IdentityRegistry,
    tracker: StagnationTracker,
    stagnant: HashSet<SpeciesID, RandomState>,
    generation: usize,
    species_founded: usize,
    best_genome: Option<Genome>,
    best_fitness: f32,
    population_config: PopulationConfig,
    genetic_config: GeneticConfig,
}

impl Population {
    /// Creates a new population of randomly connected
    /// genomes using the passed configurations.
    ///
    /// Genomes are not assigned to species until the
    /// first call to [`speciate`] or [`evolve`].
    ///
    /// [`speciate`]: Population::speciate
    /// [`evolve`]: Population::evolve
    ///
    /// # Examples
    /// ```
    /// use ffneat::{GeneticConfig, Population, PopulationConfig};
    /// use std::num::NonZeroUsize;
    ///
    /// let pop_config = PopulationConfig {
    ///     size: NonZeroUsize::new(10).unwrap(),
    ///     ..PopulationConfig::zero()
    /// };
    /// let population = Population::new(pop_config, GeneticConfig::zero());
    ///
    /// assert_eq!(population.genomes().count(), 10);
    /// assert_eq!(population.generation(), 0);
    /// ```
    pub fn new(population_config: PopulationConfig, genetic_config: GeneticConfig) -> Population {
        let mut registry = IdentityRegistry::new();
        let genomes = (0..population_config.size.get())
            .map(|_| Genome::new(&genetic_config, &mut registry))
            .collect();
        Population {
            genomes,
            species: vec![],
            registry,
            tracker: StagnationTracker::new(
                population_config.stagnation_threshold.get(),
                population_config.elitism,
            ),
            stagnant: HashSet::default(),
            generation: 0,
            species_founded: 0,
            best_genome: None,
            best_fitness: f32::NEG_INFINITY,
            population_config,
            genetic_config,
        }
    }

    /// Evaluates the fitness of each genome in the
    /// population using the passed evaluator. Higher
    /// values are better; negative values are allowed.
    ///
    /// # Examples
    /// ```
    /// use ffneat::{GeneticConfig, Population, PopulationConfig};
    ///
    /// let mut population = Population::new(PopulationConfig::zero(), GeneticConfig::zero());
    ///
    /// population.evaluate_fitness(|g| {
    ///     // Outputs closer to 0 are given higher scores.
    ///     let output = g.activate(&[1.0]).unwrap()[0];
    ///     -output.abs()
    /// });
    ///
    /// assert!(population.genomes().all(|g| g.fitness().is_some()));
    /// ```
    pub fn evaluate_fitness<E>(&mut self, mut evaluator: E)
    where
        E: FnMut(&Genome) -> f32,
    {
        for genome in &mut self.genomes {
            let fitness = evaluator(genome);
            genome.set_fitness(fitness);
        }
        self.record_best();
    }

    /// Evaluates the fitness of each genome in parallel.
    /// The evaluator only ever reads genomes.
    #[cfg(feature = "parallel")]
    pub fn evaluate_fitness_parallel<E>(&mut self, evaluator: E)
    where
        E: Fn(&Genome) -> f32 + Sync,
    {
        use rayon::prelude::*;

        self.genomes.par_iter_mut().for_each(|genome| {
            let fitness = evaluator(genome);
            genome.set_fitness(fitness);
        });
        self.record_best();
    }

    /// Updates the all-time best genome.
    fn record_best(&mut self) {
        let Some(champion) = self.champion() else {
            return;
        };
        let fitness = fitness_key(champion);
        if fitness > self.best_fitness {
            self.best_genome = Some(champion.clone());
            self.best_fitness = fitness;
        }
    }

    /// Evolves the population by one generation.
    ///
    /// Genomes are speciated, their fitnesses shared within
    /// each species, and species stagnation is updated. The
    /// fittest fifth of the genomes belonging to non-stagnant
    /// species survive unchanged, and the population is refilled
    /// with their mutated offspring.
    ///
    /// # Errors
    /// Returns an error if any genome has not been evaluated or
    /// holds a NaN fitness, or if the population is empty. The
    /// population is left untouched in that case.
    ///
    /// # Examples
    /// ```
    /// use ffneat::{crossover, GeneticConfig, Population, PopulationConfig, StructuralMutator};
    /// use std::num::NonZeroUsize;
    ///
    /// let mut population = Population::new(
    ///     PopulationConfig {
    ///         size: NonZeroUsize::new(20).unwrap(),
    ///         ..PopulationConfig::default()
    ///     },
    ///     GeneticConfig::default(),
    /// );
    ///
    /// // Evolving before evaluation fails.
    /// assert!(population.evolve(&crossover, &StructuralMutator::default()).is_err());
    ///
    /// population.evaluate_fitness(|g| -(g.connections().count() as f32));
    /// population.evolve(&crossover, &StructuralMutator::default()).unwrap();
    ///
    /// assert_eq!(population.generation(), 1);
    /// assert_eq!(population.genomes().count(), 20);
    /// ```
    pub fn evolve<C, M>(&mut self, crossover: &C, mutator: &M) -> Result<(), PopulationError>
    where
        C: CrossoverStrategy,
        M: MutationStrategy,
    {
        self.validate_fitnesses()?;

        self.speciate();
        for species in &mut self.species {
            species.adjust_fitnesses();
            if let Some(best) = species.best_member_fitness() {
                species.update_best_fitness(best, self.generation);
            }
        }
        self.stagnant = self
            .tracker
            .update(&mut self.species, self.generation)
            .into_iter()
            .filter_map(|(id, stagnant)| stagnant.then(|| id))
            .collect();

        let selected = self.select_genomes();
        for species in &mut self.species {
            species.clear(&self.genomes);
        }

        info!(
            generation = self.generation,
            species = self.species.len(),
            stagnant = self.stagnant.len(),
            best_fitness = self.best_fitness,
            "evolving generation"
        );

        let config = self.population_config.clone();
        self.refill(
            selected,
            config.size.get(),
            config.mutation_rate,
            crossover,
            mutator,
            config.bias_mutation_rate,
            config.bias_mutation_power,
        );
        self.generation += 1;
        self.species_founded = 0;
        Ok(())
    }

    fn validate_fitnesses(&self) -> Result<(), PopulationError> {
        if self.genomes.is_empty() {
            return Err(PopulationError::EmptyPopulation);
        }
        for genome in &self.genomes {
            match genome.fitness() {
                None => return Err(PopulationError::UnevaluatedGenome(genome.id())),
                Some(fitness) if fitness.is_nan() => {
                    return Err(PopulationError::InvalidFitness {
                        genome: genome.id(),
                        fitness,
                    })
                }
                Some(_) => {}
            }
        }
        Ok(())
    }

    /// Assigns every genome to the first species whose
    /// representative is within the [distance threshold],
    /// founding a new species when there is none. Species
    /// left without members are dropped.
    ///
    /// Species founded during generation `g` are numbered
    /// `SpeciesID(g, 0)`, `SpeciesID(g, 1)`, and so on.
    ///
    /// [distance threshold]: PopulationConfig::distance_threshold
    ///
    /// # Examples
    /// ```
    /// use ffneat::{GeneticConfig, Population, PopulationConfig};
    /// use ffneat::populations::SpeciesID;
    /// use std::num::NonZeroUsize;
    ///
    /// let mut population = Population::new(
    ///     PopulationConfig {
    ///         size: NonZeroUsize::new(5).unwrap(),
    ///         // Every genome is its own species.
    ///         distance_threshold: -1.0,
    ///         ..PopulationConfig::zero()
    ///     },
    ///     GeneticConfig::zero(),
    /// );
    /// population.speciate();
    ///
    /// let ids: Vec<SpeciesID> = population.species().map(|s| s.id()).collect();
    /// assert_eq!(ids, (0..5).map(|i| SpeciesID(0, i)).collect::<Vec<_>>());
    /// ```
    pub fn speciate(&mut self) {
        for species in &mut self.species {
            species.clear(&self.genomes);
        }
        for genome in &self.genomes {
            match self.species.iter_mut().find(|s| {
                s.is_compatible(
                    genome,
                    self.population_config.distance_threshold,
                    &self.genetic_config,
                )
            }) {
                Some(species) => species.add_member(genome),
                None => {
                    let id = SpeciesID(self.generation, self.species_founded);
                    self.species_founded += 1;
                    debug!(?id, genome = genome.id(), "founded species");
                    self.species
                        .push(Species::new(id, genome.clone(), self.generation));
                }
            }
        }
        self.species.retain(|s| s.members().next().is_some());
        let alive: HashSet<SpeciesID, RandomState> = self.species.iter().map(|s| s.id()).collect();
        self.tracker.retain(|id| alive.contains(id));
    }

    /// Returns the survivors of the current generation: genomes
    /// of non-stagnant species (or every genome, if all species
    /// are stagnant) sorted by decreasing raw fitness, keeping the
    /// top `max(1, size / 5)`.
    pub fn select_genomes(&self) -> Vec<Genome> {
        let eligible: HashSet<GenomeId, RandomState> = self
            .species
            .iter()
            .filter(|s| !self.stagnant.contains(&s.id()))
            .flat_map(|s| s.members().map(|(id, _)| *id))
            .collect();
        let mut candidates: Vec<&Genome> = self
            .genomes
            .iter()
            .filter(|g| eligible.contains(&g.id()))
            .collect();
        if candidates.is_empty() {
            candidates = self.genomes.iter().collect();
        }
        candidates.sort_by(|a, b| {
            let (a, b) = (fitness_key(a), fitness_key(b));
            b.total_cmp(&a)
        });
        let survivors = (self.population_config.size.get() / 5).max(1);
        candidates.into_iter().take(survivors).cloned().collect()
    }

    /// Replaces the population with the genomes chosen by
    /// [`select_genomes`], followed by offspring until it holds
    /// `target_size` genomes. Each child is bred from two parents
    /// drawn uniformly, with replacement, from the selected genomes,
    /// mutated by `mutator` and finally has its biases nudged.
    ///
    /// [`select_genomes`]: Population::select_genomes
    ///
    /// # Examples
    /// ```
    /// use ffneat::{crossover, GeneticConfig, Population, PopulationConfig, StructuralMutator};
    /// use std::num::NonZeroUsize;
    ///
    /// let mut population = Population::new(
    ///     PopulationConfig {
    ///         size: NonZeroUsize::new(10).unwrap(),
    ///         ..PopulationConfig::zero()
    ///     },
    ///     GeneticConfig::zero(),
    /// );
    /// population.evaluate_fitness(|g| g.connections().count() as f32);
    ///
    /// population.reproduce_and_mutate(15, 0.3, &crossover, &StructuralMutator::default(), 0.3, 0.3);
    ///
    /// assert_eq!(population.genomes().count(), 15);
    /// ```
    #[allow(clippy::too_many_arguments)]
    pub fn reproduce_and_mutate<C, M>(
        &mut self,
        target_size: usize,
        mutation_rate: f32,
        crossover: &C,
        mutator: &M,
        bias_mutation_rate: f32,
        bias_mutation_power: f32,
    ) where
        C: CrossoverStrategy,
        M: MutationStrategy,
    {
        let selected = self.select_genomes();
        self.refill(
            selected,
            target_size,
            mutation_rate,
            crossover,
            mutator,
            bias_mutation_rate,
            bias_mutation_power,
        );
    }

    #[allow(clippy::too_many_arguments)]
    fn refill<C, M>(
        &mut self,
        selected: Vec<Genome>,
        target_size: usize,
        mutation_rate: f32,
        crossover: &C,
        mutator: &M,
        bias_mutation_rate: f32,
        bias_mutation_power: f32,
    ) where
        C: CrossoverStrategy,
        M: MutationStrategy,
    {
        let mut rng = thread_rng();
        let mut next_generation = selected.clone();
        next_generation.truncate(target_size);
        while next_generation.len() < target_size {
            let (Some(first), Some(second)) = (selected.choose(&mut rng), selected.choose(&mut rng))
            else {
                break;
            };
            let mut child = crossover.crossover(first, second, &mut self.registry);
            mutator.mutate(&mut child, &mut self.registry, mutation_rate);
            child.mutate_biases(bias_mutation_rate, bias_mutation_power);
            next_generation.push(child);
        }
        self.genomes = next_generation;
    }

    /// Returns the fittest evaluated genome of the current
    /// generation, if any.
    ///
    /// # Examples
    /// ```
    /// use ffneat::{GeneticConfig, Population, PopulationConfig};
    /// use std::num::NonZeroUsize;
    ///
    /// let mut population = Population::new(
    ///     PopulationConfig {
    ///         size: NonZeroUsize::new(20).unwrap(),
    ///         ..PopulationConfig::zero()
    ///     },
    ///     GeneticConfig::zero(),
    /// );
    /// assert!(population.champion().is_none());
    ///
    /// let mut fitness = 0.0;
    /// population.evaluate_fitness(move |_| {
    ///     fitness += 10.0;
    ///     fitness
    /// });
    ///
    /// assert_eq!(population.champion().unwrap().fitness(), Some(20.0 * 10.0));
    /// ```
    pub fn champion(&self) -> Option<&Genome> {
        self.genomes
            .iter()
            .filter(|g| g.fitness().map_or(false, |f| !f.is_nan()))
            .max_by(|a, b| fitness_key(a).total_cmp(&fitness_key(b)))
    }

    /// Returns the fittest genome ever evaluated.
    pub fn best_genome(&self) -> Option<&Genome> {
        self.best_genome.as_ref()
    }

    /// Returns the highest fitness ever evaluated,
    /// or negative infinity before any evaluation.
    pub fn best_fitness(&self) -> f32 {
        self.best_fitness
    }

    /// Returns an iterator over all current genomes.
    pub fn genomes(&self) -> impl Iterator<Item = &Genome> {
        self.genomes.iter()
    }

    /// Returns an iterator over all current species.
    pub fn species(&self) -> impl Iterator<Item = &Species> {
        self.species.iter()
    }

    /// Returns whether the species was flagged as
    /// stagnant during the last evolution step.
    pub fn is_stagnant(&self, species: SpeciesID) -> bool {
        self.stagnant.contains(&species)
    }

    /// Returns the current generation number.
    pub fn generation(&self) -> usize {
        self.generation
    }

    /// Returns the population's identity registry.
    pub fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }

    /// Returns the population's configuration.
    pub fn population_config(&self) -> &PopulationConfig {
        &self.population_config
    }

    /// Returns the configuration genomes are built with.
    pub fn genetic_config(&self) -> &GeneticConfig {
        &self.genetic_config
    }
}

fn fitness_key(genome: &Genome) -> f32 {
    genome.fitness().unwrap_or(f32::NEG_INFINITY)
}
