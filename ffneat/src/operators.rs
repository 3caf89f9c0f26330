//! Reproduction operators. A population is driven by a
//! [`CrossoverStrategy`] and a [`MutationStrategy`], both
//! implemented for plain functions and closures of the
//! right shape. [`crossover`] and [`StructuralMutator`]
//! are the standard choices.
mod config;

pub use config::MutationConfig;

use crate::genomics::{Genome, IdentityRegistry, NodeGene, NodeRole};
use crate::{Innovation, NodeId};

use ahash::RandomState;
use rand::prelude::Rng;
use rand::thread_rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

use std::collections::{HashMap, HashSet};

/// Combines two parents into a child genome.
pub trait CrossoverStrategy {
    fn crossover(&self, first: &Genome, second: &Genome, registry: &mut IdentityRegistry) -> Genome;
}

impl<F> CrossoverStrategy for F
where
    F: Fn(&Genome, &Genome, &mut IdentityRegistry) -> Genome,
{
    fn crossover(&self, first: &Genome, second: &Genome, registry: &mut IdentityRegistry) -> Genome {
        self(first, second, registry)
    }
}

/// Mutates a genome in place. `mutation_rate` is the
/// population-wide mutation rate.
pub trait MutationStrategy {
    fn mutate(&self, genome: &mut Genome, registry: &mut IdentityRegistry, mutation_rate: f32);
}

impl<F> MutationStrategy for F
where
    F: Fn(&mut Genome, &mut IdentityRegistry, f32),
{
    fn mutate(&self, genome: &mut Genome, registry: &mut IdentityRegistry, mutation_rate: f32) {
        self(genome, registry, mutation_rate)
    }
}

fn fitness_key(genome: &Genome) -> f32 {
    genome.fitness().unwrap_or(f32::NEG_INFINITY)
}

/// Combines two genomes by innovation number and returns
/// their child.
///
/// The fitter parent is `first` if its fitness is strictly
/// greater, otherwise `second`; unevaluated parents count as
/// least fit. Genes present in both parents are taken from
/// either with equal probability, genes present in only one
/// are inherited only from the fitter parent. The child thus
/// has exactly the fitter parent's structure, a fresh genome
/// ID, the fitter parent's output order, and no fitness.
///
/// # Examples
/// ```
/// use ffneat::genomics::{GeneticConfig, Genome, IdentityRegistry};
/// use ffneat::operators::crossover;
///
/// let config = GeneticConfig { initial_hidden_nodes: 2, ..GeneticConfig::default() };
/// let mut registry = IdentityRegistry::new();
/// let mut fit = Genome::new(&config, &mut registry);
/// let mut unfit = Genome::new(&config, &mut registry);
/// fit.set_fitness(1.0);
/// unfit.set_fitness(0.0);
///
/// let child = crossover(&unfit, &fit, &mut registry);
///
/// assert_eq!(child.connections().count(), fit.connections().count());
/// assert_eq!(child.fitness(), None);
/// assert_eq!(child.id(), 2);
/// ```
pub fn crossover(first: &Genome, second: &Genome, registry: &mut IdentityRegistry) -> Genome {
    let (fitter, other) = if fitness_key(first) > fitness_key(second) {
        (first, second)
    } else {
        (second, first)
    };
    let mut rng = thread_rng();
    let mut child = Genome::empty(registry.reserve_genome_id());

    let other_nodes: HashMap<Innovation, &NodeGene, RandomState> =
        other.nodes().map(|n| (n.innovation(), n)).collect();
    let mut nodes: Vec<&NodeGene> = fitter.nodes().collect();
    nodes.sort_unstable_by_key(|n| n.innovation());
    for node in nodes {
        let kind = match other_nodes.get(&node.innovation()) {
            Some(o) if o.role() == node.role() && rng.gen::<bool>() => o.kind(),
            _ => node.kind(),
        };
        child.add_node_unchecked(NodeGene::new(node.id(), node.innovation(), kind));
    }
    let present: HashSet<NodeId, RandomState> = child.nodes().map(|n| n.id()).collect();

    let mut connections: Vec<_> = fitter.connections().collect();
    connections.sort_unstable_by_key(|c| c.innovation());
    for connection in connections {
        let inherited = match other.connection(connection.innovation()) {
            Some(o) if o.endpoints() == connection.endpoints() && rng.gen::<bool>() => *o,
            _ => *connection,
        };
        if present.contains(&inherited.source()) && present.contains(&inherited.target()) {
            child.add_connection_unchecked(inherited);
        }
    }

    child.set_output_nodes(
        fitter
            .output_nodes()
            .iter()
            .copied()
            .filter(|id| present.contains(id))
            .collect(),
    );
    trace!(
        child = child.id(),
        fitter = fitter.id(),
        other = other.id(),
        "crossover"
    );
    child
}

/// The standard mutation strategy.
///
/// Each mutation kind fires independently with its configured
/// chance: weight nudges, bias nudges (gated by the population
/// mutation rate), node addition, connection addition, node
/// elimination and connection elimination, in that order. The
/// genome is then repaired so that every hidden node has at least
/// one incoming and one outgoing connection, every input node
/// feeds some node and every output node is fed by some node.
///
/// # Examples
/// ```
/// use ffneat::genomics::{GeneticConfig, Genome, IdentityRegistry, NodeRole};
/// use ffneat::operators::{MutationConfig, MutationStrategy, StructuralMutator};
///
/// let mutator = StructuralMutator::new(MutationConfig {
///     node_addition_chance: 1.0,
///     ..MutationConfig::zero()
/// });
/// let mut registry = IdentityRegistry::new();
/// let mut genome = Genome::unconnected(&GeneticConfig::zero(), &mut registry);
/// genome.add_connection(10, 0, 1, 1.0).unwrap();
///
/// mutator.mutate(&mut genome, &mut registry, 0.0);
///
/// assert_eq!(genome.hidden_count(), 1);
/// ```
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StructuralMutator {
    pub config: MutationConfig,
}

impl StructuralMutator {
    pub fn new(config: MutationConfig) -> StructuralMutator {
        StructuralMutator { config }
    }

    /// Restores structural validity after arbitrary edits:
    /// hidden dead ends and orphans are removed, then
    /// disconnected inputs and outputs are reconnected.
    pub fn repair(genome: &mut Genome, registry: &mut IdentityRegistry) {
        genome.prune_dead_ends();
        genome.prune_orphans();
        genome.prune_disconnected_inputs(registry);
        genome.prune_disconnected_outputs(registry);
    }
}

impl MutationStrategy for StructuralMutator {
    fn mutate(&self, genome: &mut Genome, registry: &mut IdentityRegistry, mutation_rate: f32) {
        let config = &self.config;
        let mut rng = thread_rng();

        if rng.gen::<f32>() < config.weight_mutation_chance && genome.connections().next().is_some() {
            genome.mutate_weights(config.weight_mutation_rate, config.weight_mutation_power);
        }
        if rng.gen::<f32>() < mutation_rate {
            genome.mutate_biases(config.bias_mutation_rate, config.bias_mutation_power);
        }
        if rng.gen::<f32>() < config.node_addition_chance {
            genome.mutate_add_node(registry);
        }
        if rng.gen::<f32>() < config.connection_addition_chance && genome.nodes().count() >= 2 {
            let sources: Vec<NodeId> = genome
                .nodes()
                .filter(|n| n.role() != NodeRole::Output)
                .map(|n| n.id())
                .collect();
            let targets: Vec<NodeId> = genome
                .nodes()
                .filter(|n| n.role() != NodeRole::Input)
                .map(|n| n.id())
                .collect();
            genome.mutate_add_connection(&sources, &targets, registry);
        }
        if rng.gen::<f32>() < config.node_elimination_chance && genome.hidden_count() > 0 {
            genome.mutate_eliminate_node();
        }
        if rng.gen::<f32>() < config.connection_elimination_chance {
            genome.mutate_eliminate_connection();
        }

        Self::repair(genome, registry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::GeneticConfig;
    use std::num::NonZeroUsize;

    fn config() -> GeneticConfig {
        GeneticConfig {
            input_count: NonZeroUsize::new(3).unwrap(),
            output_count: NonZeroUsize::new(2).unwrap(),
            initial_hidden_nodes: 3,
            ..GeneticConfig::default()
        }
    }

    fn innovations(genome: &Genome) -> (Vec<Innovation>, Vec<Innovation>) {
        let mut nodes: Vec<_> = genome.nodes().map(|n| n.innovation()).collect();
        let mut connections: Vec<_> = genome.connections().map(|c| c.innovation()).collect();
        nodes.sort_unstable();
        connections.sort_unstable();
        (nodes, connections)
    }

    #[test]
    fn child_inherits_fitter_structure_in_either_order() {
        let mut registry = IdentityRegistry::new();
        let mutator = StructuralMutator::default();
        for _ in 0..50 {
            let mut a = Genome::new(&config(), &mut registry);
            let mut b = Genome::new(&config(), &mut registry);
            for _ in 0..5 {
                mutator.mutate(&mut a, &mut registry, 0.3);
                mutator.mutate(&mut b, &mut registry, 0.3);
            }
            a.set_fitness(2.0);
            b.set_fitness(1.0);

            let first = crossover(&a, &b, &mut registry);
            let second = crossover(&b, &a, &mut registry);
            assert_eq!(innovations(&first), innovations(&a));
            assert_eq!(innovations(&second), innovations(&a));
            assert_eq!(first.output_nodes(), a.output_nodes());
            assert!(first.is_acyclic());
        }
    }

    #[test]
    fn ties_go_to_second_parent() {
        let mut registry = IdentityRegistry::new();
        let mut a = Genome::unconnected(&config(), &mut registry);
        let mut b = a.clone();
        a.add_connection(100, 0, 3, 1.0).unwrap();
        b.add_connection(101, 1, 3, 1.0).unwrap();
        a.set_fitness(1.0);
        b.set_fitness(1.0);
        let child = crossover(&a, &b, &mut registry);
        assert!(child.connection(101).is_some());
        assert!(child.connection(100).is_none());
    }

    #[test]
    fn unevaluated_parent_is_least_fit() {
        let mut registry = IdentityRegistry::new();
        let mut a = Genome::unconnected(&config(), &mut registry);
        let b = a.clone();
        a.add_connection(100, 0, 3, 1.0).unwrap();
        a.set_fitness(-1000.0);
        let child = crossover(&a, &b, &mut registry);
        assert!(child.connection(100).is_some());
    }

    #[test]
    fn matching_genes_are_a_fair_coin() {
        const TRIALS: usize = 2000;
        let mut registry = IdentityRegistry::new();
        let mut a = Genome::unconnected(&config(), &mut registry);
        let mut b = a.clone();
        a.add_connection(100, 0, 3, 1.0).unwrap();
        b.add_connection(100, 0, 3, -1.0).unwrap();
        a.set_fitness(1.0);
        b.set_fitness(0.0);

        let from_b = (0..TRIALS)
            .filter(|_| crossover(&a, &b, &mut registry).connection(100).unwrap().weight() < 0.0)
            .count();
        // Six standard deviations either side of 1000.
        assert!((866..=1134).contains(&from_b), "{}", from_b);
    }

    #[test]
    fn child_ids_are_fresh() {
        let mut registry = IdentityRegistry::new();
        let a = Genome::new(&config(), &mut registry);
        let b = Genome::new(&config(), &mut registry);
        let child = crossover(&a, &b, &mut registry);
        assert_eq!(child.id(), 2);
        assert_eq!(child.next_node_id(), b.next_node_id());
    }

    #[test]
    fn closures_are_strategies() {
        let mut registry = IdentityRegistry::new();
        let mut genome = Genome::new(&config(), &mut registry);
        let mutate = |g: &mut Genome, _: &mut IdentityRegistry, rate: f32| g.set_fitness(rate);
        mutate.mutate(&mut genome, &mut registry, 0.5);
        assert_eq!(genome.fitness(), Some(0.5));

        let keep_first = |a: &Genome, _: &Genome, _: &mut IdentityRegistry| a.clone();
        let child = keep_first.crossover(&genome, &genome, &mut registry);
        assert_eq!(child, genome);
    }

    #[test]
    fn mutator_maintains_invariants() {
        let mut registry = IdentityRegistry::new();
        let mutator = StructuralMutator::new(MutationConfig {
            weight_mutation_chance: 1.0,
            node_addition_chance: 0.5,
            connection_addition_chance: 0.5,
            node_elimination_chance: 0.4,
            connection_elimination_chance: 0.4,
            ..MutationConfig::default()
        });
        for _ in 0..30 {
            let mut genome = Genome::new(&config(), &mut registry);
            for _ in 0..40 {
                mutator.mutate(&mut genome, &mut registry, 0.3);
                assert!(genome.is_acyclic());
                assert_eq!(genome.input_count(), 3);
                assert_eq!(genome.output_count(), 2);
                for node in genome.nodes() {
                    let has_in = genome.connections().any(|c| c.target() == node.id());
                    let has_out = genome.connections().any(|c| c.source() == node.id());
                    match node.role() {
                        NodeRole::Input => assert!(has_out),
                        NodeRole::Output => assert!(has_in),
                        NodeRole::Hidden => assert!(has_in && has_out, "{}", genome),
                    }
                }
            }
        }
    }

    #[test]
    fn zero_config_only_repairs() {
        let mut registry = IdentityRegistry::new();
        let mut genome = Genome::unconnected(&config(), &mut registry);
        StructuralMutator::new(MutationConfig::zero()).mutate(&mut genome, &mut registry, 0.0);
        // The hidden nodes were isolated and go; I/O gets reconnected.
        assert_eq!(genome.hidden_count(), 0);
        assert!(genome.connections().count() >= 3);
    }
}
