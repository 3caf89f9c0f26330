use super::{Species, SpeciesID};

use ahash::RandomState;
use serde::{Deserialize, Serialize};
use tracing::debug;

use std::collections::{HashMap, HashSet};

/// Flags species whose best fitness has not improved
/// for too many generations, while protecting the
/// top species from ever being flagged.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StagnationTracker {
    max_stagnation: usize,
    elitism: usize,
    seen: HashSet<SpeciesID, RandomState>,
}

impl StagnationTracker {
    /// Creates a tracker flagging species after `max_stagnation`
    /// generations without improvement, and exempting the
    /// `elitism` best species.
    ///
    /// # Examples
    /// ```
    /// use ffneat::populations::StagnationTracker;
    ///
    /// let tracker = StagnationTracker::new(15, 2);
    /// assert_eq!(tracker.max_stagnation(), 15);
    /// assert_eq!(tracker.elitism(), 2);
    /// ```
    pub fn new(max_stagnation: usize, elitism: usize) -> StagnationTracker {
        StagnationTracker {
            max_stagnation,
            elitism,
            seen: HashSet::default(),
        }
    }

    /// Returns the number of generations without
    /// improvement before a species is stagnant.
    pub fn max_stagnation(&self) -> usize {
        self.max_stagnation
    }

    /// Returns the number of species never flagged.
    pub fn elitism(&self) -> usize {
        self.elitism
    }

    /// Updates every species' stagnation record as of `generation`
    /// and returns whether each is stagnant.
    ///
    /// A species seen for the first time is never stagnant. A species
    /// whose best fitness exceeds its recorded historical best has
    /// improved this generation. Any other species is stagnant once
    /// `generation − last_improved_generation >= max_stagnation`.
    /// Afterwards, the `elitism` species with the fittest current
    /// members are marked as not stagnant regardless.
    ///
    /// # Examples
    /// ```
    /// use ffneat::genomics::{GeneticConfig, Genome, IdentityRegistry};
    /// use ffneat::populations::{Species, SpeciesID, StagnationTracker};
    ///
    /// let mut registry = IdentityRegistry::new();
    /// let mut genome = Genome::new(&GeneticConfig::zero(), &mut registry);
    /// genome.set_fitness(1.0);
    /// let mut species = vec![Species::new(SpeciesID(0, 0), genome, 0)];
    ///
    /// let mut tracker = StagnationTracker::new(3, 0);
    /// assert!(!tracker.update(&mut species, 0)[&SpeciesID(0, 0)]);
    /// assert!(!tracker.update(&mut species, 2)[&SpeciesID(0, 0)]);
    /// assert!(tracker.update(&mut species, 3)[&SpeciesID(0, 0)]);
    /// ```
    pub fn update(
        &mut self,
        species: &mut [Species],
        generation: usize,
    ) -> HashMap<SpeciesID, bool, RandomState> {
        let mut stagnation: HashMap<SpeciesID, bool, RandomState> = species
            .iter_mut()
            .map(|s| (s.id(), self.update_species(s, generation)))
            .collect();

        let mut ranking: Vec<(SpeciesID, f32)> = species
            .iter()
            .map(|s| (s.id(), s.best_member_fitness().unwrap_or(s.best_fitness())))
            .collect();
        ranking.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        for (id, _) in ranking.iter().take(self.elitism) {
            stagnation.insert(*id, false);
        }

        debug!(
            generation,
            stagnant = stagnation.values().filter(|s| **s).count(),
            "updated species stagnation"
        );
        stagnation
    }

    fn update_species(&mut self, species: &mut Species, generation: usize) -> bool {
        if self.seen.insert(species.id()) {
            species.historical_best_fitness = species.best_fitness();
            species.last_improved_generation = generation;
            false
        } else if species.best_fitness() > species.historical_best_fitness {
            species.historical_best_fitness = species.best_fitness();
            species.last_improved_generation = generation;
            false
        } else {
            species.time_stagnated(generation) >= self.max_stagnation
        }
    }

    /// Forgets species that are no longer alive.
    pub fn retain(&mut self, alive: impl Fn(&SpeciesID) -> bool) {
        self.seen.retain(|id| alive(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{GeneticConfig, Genome, IdentityRegistry};

    fn species(registry: &mut IdentityRegistry, index: usize, fitness: f32) -> Species {
        let mut genome = Genome::new(&GeneticConfig::zero(), registry);
        genome.set_fitness(fitness);
        Species::new(SpeciesID(0, index), genome, 0)
    }

    #[test]
    fn improving_species_never_stagnates() {
        let mut registry = IdentityRegistry::new();
        let mut all = vec![species(&mut registry, 0, 0.0)];
        let mut tracker = StagnationTracker::new(2, 0);
        for generation in 0..50 {
            all[0].update_best_fitness(generation as f32, generation);
            assert!(!tracker.update(&mut all, generation)[&SpeciesID(0, 0)]);
        }
    }

    #[test]
    fn flat_species_stagnates() {
        let mut registry = IdentityRegistry::new();
        let mut all = vec![species(&mut registry, 0, 1.0)];
        let mut tracker = StagnationTracker::new(15, 0);
        for generation in 0..15 {
            all[0].update_best_fitness(1.0, generation);
            assert!(!tracker.update(&mut all, generation)[&SpeciesID(0, 0)]);
        }
        assert!(tracker.update(&mut all, 15)[&SpeciesID(0, 0)]);
        assert!(tracker.update(&mut all, 40)[&SpeciesID(0, 0)]);
    }

    #[test]
    fn elite_species_are_protected() {
        let mut registry = IdentityRegistry::new();
        let mut all = vec![
            species(&mut registry, 0, 1.0),
            species(&mut registry, 1, 5.0),
            species(&mut registry, 2, 3.0),
        ];
        let mut tracker = StagnationTracker::new(15, 2);
        tracker.update(&mut all, 0);
        let flags = tracker.update(&mut all, 20);
        assert!(flags[&SpeciesID(0, 0)]);
        assert!(!flags[&SpeciesID(0, 1)]);
        assert!(!flags[&SpeciesID(0, 2)]);
    }

    #[test]
    fn new_species_seed_historical_best() {
        let mut registry = IdentityRegistry::new();
        let mut all = vec![species(&mut registry, 0, 4.0)];
        let mut tracker = StagnationTracker::new(1, 0);
        assert!(!tracker.update(&mut all, 7)[&SpeciesID(0, 0)]);
        assert_eq!(all[0].historical_best_fitness(), 4.0);
        assert_eq!(all[0].last_improved_generation(), 7);
        assert!(tracker.update(&mut all, 8)[&SpeciesID(0, 0)]);
    }

    #[test]
    fn retain_forgets_extinct_species() {
        let mut registry = IdentityRegistry::new();
        let mut all = vec![species(&mut registry, 0, 4.0)];
        let mut tracker = StagnationTracker::new(1, 0);
        tracker.update(&mut all, 0);
        tracker.retain(|_| false);
        assert!(!tracker.update(&mut all, 9)[&SpeciesID(0, 0)]);
    }
}
