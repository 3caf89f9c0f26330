use crate::genomics::{GeneticConfig, Genome};
use crate::GenomeId;

use ahash::RandomState;
use serde::{Deserialize, Serialize};

use std::collections::HashMap;

/// Species identifier. Specifies
/// the generation in which the species
/// was born, and the count of other species
/// generated in the _same generation_ before
/// the one identified (i.e, if it was the
/// third species born in generation 5, it
/// will be species [5, 2]).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SpeciesID(pub usize, pub usize);

/// Species are collections of reproductively
/// compatible (within a certain [genetic distance])
/// genomes. Membership is determined by calculating
/// the genetic distance to a _representative_, which
/// is replaced by the species' fittest member at the
/// end of every generation.
///
/// Members are referenced by genome ID, together with
/// the raw fitness they had when they joined.
///
/// [genetic distance]: crate::PopulationConfig::distance_threshold
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Species {
    id: SpeciesID,
    representative: Genome,
    members: Vec<(GenomeId, f32)>,
    adjusted_fitnesses: HashMap<GenomeId, f32, RandomState>,
    best_fitness: f32,
    pub(super) historical_best_fitness: f32,
    pub(super) last_improved_generation: usize,
}

impl Species {
    /// Creates a new species with the specified ID and
    /// representative, born in `generation`. The representative
    /// is also added to the species' members.
    ///
    /// # Examples
    /// ```
    /// use ffneat::genomics::{GeneticConfig, Genome, IdentityRegistry};
    /// use ffneat::populations::{SpeciesID, Species};
    ///
    /// let mut registry = IdentityRegistry::new();
    /// let species = Species::new(
    ///     SpeciesID(1, 0),
    ///     Genome::new(&GeneticConfig::zero(), &mut registry),
    ///     1,
    /// );
    ///
    /// assert_eq!(species.id(), SpeciesID(1, 0));
    /// assert_eq!(species.members().count(), 1);
    /// ```
    pub fn new(id: SpeciesID, representative: Genome, generation: usize) -> Species {
        let best_fitness = representative.fitness().unwrap_or(f32::NEG_INFINITY);
        let mut species = Species {
            id,
            members: vec![],
            representative,
            adjusted_fitnesses: HashMap::default(),
            best_fitness,
            historical_best_fitness: best_fitness,
            last_improved_generation: generation,
        };
        species.members.push((species.representative.id(), best_fitness));
        species
    }

    /// Returns the species' ID.
    pub fn id(&self) -> SpeciesID {
        self.id
    }

    /// Returns the species' representative.
    pub fn representative(&self) -> &Genome {
        &self.representative
    }

    /// Returns whether `genome` is within `threshold` genetic
    /// distance of the species' representative.
    ///
    /// # Examples
    /// ```
    /// use ffneat::genomics::{GeneticConfig, Genome, IdentityRegistry};
    /// use ffneat::populations::{SpeciesID, Species};
    ///
    /// let config = GeneticConfig::default();
    /// let mut registry = IdentityRegistry::new();
    /// let representative = Genome::new(&config, &mut registry);
    /// let species = Species::new(SpeciesID(0, 0), representative.clone(), 0);
    ///
    /// // The boundary is inclusive.
    /// assert!(species.is_compatible(&representative, 0.0, &config));
    /// ```
    pub fn is_compatible(&self, genome: &Genome, threshold: f32, config: &GeneticConfig) -> bool {
        Genome::genetic_distance(&self.representative, genome, config) <= threshold
    }

    /// Adds a genome to the species, without
    /// checking compatibility.
    pub fn add_member(&mut self, genome: &Genome) {
        self.members
            .push((genome.id(), genome.fitness().unwrap_or(f32::NEG_INFINITY)));
    }

    /// Returns an iterator over the members' genome
    /// IDs and raw fitnesses.
    pub fn members(&self) -> impl Iterator<Item = &(GenomeId, f32)> {
        self.members.iter()
    }

    /// Returns whether the species has a member with the given ID.
    pub fn contains(&self, genome: GenomeId) -> bool {
        self.members.iter().any(|(id, _)| *id == genome)
    }

    /// Returns the highest raw fitness among the
    /// current members, if there are any.
    pub fn best_member_fitness(&self) -> Option<f32> {
        self.members
            .iter()
            .map(|(_, fitness)| *fitness)
            .max_by(|a, b| a.total_cmp(b))
    }

    /// Computes every member's shared fitness: its raw
    /// fitness divided by the member count.
    ///
    /// # Examples
    /// ```
    /// use ffneat::genomics::{GeneticConfig, Genome, IdentityRegistry};
    /// use ffneat::populations::{SpeciesID, Species};
    ///
    /// let mut registry = IdentityRegistry::new();
    /// let mut first = Genome::new(&GeneticConfig::zero(), &mut registry);
    /// let mut second = Genome::new(&GeneticConfig::zero(), &mut registry);
    /// first.set_fitness(4.0);
    /// second.set_fitness(2.0);
    ///
    /// let mut species = Species::new(SpeciesID(0, 0), first.clone(), 0);
    /// species.add_member(&second);
    /// species.adjust_fitnesses();
    ///
    /// assert_eq!(species.adjusted_fitness(&first), 2.0);
    /// assert_eq!(species.adjusted_fitness(&second), 1.0);
    /// ```
    pub fn adjust_fitnesses(&mut self) {
        let count = self.members.len() as f32;
        self.adjusted_fitnesses = self
            .members
            .iter()
            .map(|&(id, fitness)| (id, fitness / count))
            .collect();
    }

    /// Returns `genome`'s shared fitness, or its raw fitness
    /// if it is not a member of the species.
    pub fn adjusted_fitness(&self, genome: &Genome) -> f32 {
        self.adjusted_fitnesses
            .get(&genome.id())
            .copied()
            .unwrap_or_else(|| genome.fitness().unwrap_or(f32::NEG_INFINITY))
    }

    /// Ends the species' generation: its fittest member
    /// among `genomes` becomes the new representative and
    /// the member list is emptied.
    pub fn clear(&mut self, genomes: &[Genome]) {
        let mut members = std::mem::take(&mut self.members);
        members.sort_by(|a, b| b.1.total_cmp(&a.1));
        if let Some(champion) = members
            .iter()
            .find_map(|(id, _)| genomes.iter().find(|g| g.id() == *id))
        {
            self.representative = champion.clone();
        }
        self.adjusted_fitnesses.clear();
    }

    /// Raises the species' best fitness if `fitness` is a strict
    /// improvement, recording `generation` as the last generation
    /// in which it improved.
    ///
    /// # Examples
    /// ```
    /// use ffneat::genomics::{GeneticConfig, Genome, IdentityRegistry};
    /// use ffneat::populations::{SpeciesID, Species};
    ///
    /// let mut registry = IdentityRegistry::new();
    /// let mut representative = Genome::new(&GeneticConfig::zero(), &mut registry);
    /// representative.set_fitness(1.0);
    /// let mut species = Species::new(SpeciesID(0, 0), representative, 0);
    ///
    /// species.update_best_fitness(1.0, 3);
    /// assert_eq!(species.last_improved_generation(), 0);
    ///
    /// species.update_best_fitness(1.5, 4);
    /// assert_eq!(species.best_fitness(), 1.5);
    /// assert_eq!(species.last_improved_generation(), 4);
    /// ```
    pub fn update_best_fitness(&mut self, fitness: f32, generation: usize) {
        if fitness > self.best_fitness {
            self.best_fitness = fitness;
            self.historical_best_fitness = self.historical_best_fitness.max(fitness);
            self.last_improved_generation = generation;
        }
    }

    /// Returns the best fitness the species has reached.
    pub fn best_fitness(&self) -> f32 {
        self.best_fitness
    }

    /// Returns the best fitness recorded by stagnation tracking.
    pub fn historical_best_fitness(&self) -> f32 {
        self.historical_best_fitness
    }

    /// Returns the last generation in which the species improved.
    pub fn last_improved_generation(&self) -> usize {
        self.last_improved_generation
    }

    /// Returns the number of generations since the species
    /// last improved, as of `generation`.
    pub fn time_stagnated(&self, generation: usize) -> usize {
        generation.saturating_sub(self.last_improved_generation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::IdentityRegistry;
    use std::num::NonZeroUsize;

    fn evaluated(registry: &mut IdentityRegistry, fitness: f32) -> Genome {
        let config = GeneticConfig {
            input_count: NonZeroUsize::new(2).unwrap(),
            initial_hidden_nodes: 1,
            ..GeneticConfig::default()
        };
        let mut genome = Genome::new(&config, registry);
        genome.set_fitness(fitness);
        genome
    }

    #[test]
    fn clear_promotes_fittest_member() {
        let mut registry = IdentityRegistry::new();
        let genomes: Vec<Genome> = [1.0, 5.0, 3.0]
            .iter()
            .map(|&f| evaluated(&mut registry, f))
            .collect();
        let mut species = Species::new(SpeciesID(0, 0), genomes[0].clone(), 0);
        species.add_member(&genomes[1]);
        species.add_member(&genomes[2]);

        species.clear(&genomes);

        assert_eq!(species.representative().id(), genomes[1].id());
        assert_eq!(species.members().count(), 0);
        assert_eq!(species.best_member_fitness(), None);
    }

    #[test]
    fn clear_without_live_members_keeps_representative() {
        let mut registry = IdentityRegistry::new();
        let genome = evaluated(&mut registry, 2.0);
        let mut species = Species::new(SpeciesID(0, 0), genome.clone(), 0);
        species.clear(&[]);
        assert_eq!(species.representative(), &genome);
    }

    #[test]
    fn adjusted_fitness_falls_back_to_raw() {
        let mut registry = IdentityRegistry::new();
        let member = evaluated(&mut registry, 6.0);
        let outsider = evaluated(&mut registry, 7.0);
        let mut species = Species::new(SpeciesID(0, 0), member.clone(), 0);
        species.add_member(&evaluated(&mut registry, 0.0));
        species.add_member(&evaluated(&mut registry, 0.0));
        species.adjust_fitnesses();
        assert_eq!(species.adjusted_fitness(&member), 2.0);
        assert_eq!(species.adjusted_fitness(&outsider), 7.0);
    }

    #[test]
    fn best_fitness_only_moves_up() {
        let mut registry = IdentityRegistry::new();
        let mut species = Species::new(SpeciesID(0, 0), evaluated(&mut registry, 1.0), 0);
        species.update_best_fitness(0.5, 1);
        assert_eq!(species.best_fitness(), 1.0);
        assert_eq!(species.last_improved_generation(), 0);
        species.update_best_fitness(2.0, 2);
        assert_eq!(species.historical_best_fitness(), 2.0);
        assert_eq!(species.time_stagnated(7), 5);
    }

    #[test]
    fn compatibility_threshold_is_inclusive() {
        let mut registry = IdentityRegistry::new();
        let config = GeneticConfig::default();
        let a = evaluated(&mut registry, 0.0);
        let b = evaluated(&mut registry, 0.0);
        let species = Species::new(SpeciesID(0, 0), a.clone(), 0);
        let d = Genome::genetic_distance(&a, &b, &config);
        assert!(species.is_compatible(&b, d, &config));
        if d > 0.0 {
            assert!(!species.is_compatible(&b, d * 0.5, &config));
        }
    }
}
