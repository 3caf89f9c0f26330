use super::Genome;
use crate::Innovation;

use ahash::RandomState;

use std::collections::HashMap;

type WeightMap = HashMap<Innovation, f32, RandomState>;

/// Excess, disjoint and matching gene tallies of one gene kind.
#[derive(Default)]
struct Alignment {
    excess: usize,
    disjoint: usize,
    weight_difference: f32,
}

/// Aligns two innovation → weight maps. Genes past the other
/// map's highest innovation are excess, the remaining unmatched
/// genes disjoint. Matching genes add `|wA − wB|`.
fn align(first: &WeightMap, second: &WeightMap) -> Alignment {
    let first_max = first.keys().copied().max().unwrap_or(0);
    let second_max = second.keys().copied().max().unwrap_or(0);
    let mut alignment = Alignment::default();
    for (innovation, weight) in first {
        match second.get(innovation) {
            Some(other) => alignment.weight_difference += (weight - other).abs(),
            None => alignment.unmatched(*innovation, second_max),
        }
    }
    for innovation in second.keys().filter(|i| !first.contains_key(i)) {
        alignment.unmatched(*innovation, first_max);
    }
    alignment
}

impl Alignment {
    fn unmatched(&mut self, innovation: Innovation, other_max: Innovation) {
        if innovation > other_max {
            self.excess += 1;
        } else {
            self.disjoint += 1;
        }
    }
}

/// Returns the compatibility distance between two genomes:
///
/// `c1·excess/N + c2·disjoint/N + c3·weight_difference/N`
///
/// Node and connection genes are aligned separately by innovation
/// number. Only matching connections contribute to the weight
/// difference. `N` is the largest of the four gene counts, and
/// at least 1. The distance is symmetric.
///
/// # Examples
/// ```
/// use ffneat::genomics::{distance, GeneticConfig, Genome, IdentityRegistry};
///
/// let mut registry = IdentityRegistry::new();
/// let mut a = Genome::unconnected(&GeneticConfig::zero(), &mut registry);
/// let mut b = a.clone();
/// a.add_connection(10, 0, 1, 0.5).unwrap();
/// b.add_connection(10, 0, 1, -0.5).unwrap();
///
/// // Two nodes match, the single connection differs by 1.
/// assert_eq!(distance(&a, &b, 1.0, 1.0, 1.0), 0.5);
/// ```
pub fn distance(first: &Genome, second: &Genome, c1: f32, c2: f32, c3: f32) -> f32 {
    let nodes = |g: &Genome| -> WeightMap {
        g.nodes().map(|n| (n.innovation(), 0.0)).collect()
    };
    let connections = |g: &Genome| -> WeightMap {
        g.connections().map(|c| (c.innovation(), c.weight())).collect()
    };
    let (first_nodes, second_nodes) = (nodes(first), nodes(second));
    let (first_connections, second_connections) = (connections(first), connections(second));

    let node_alignment = align(&first_nodes, &second_nodes);
    let connection_alignment = align(&first_connections, &second_connections);

    let n = first_nodes
        .len()
        .max(second_nodes.len())
        .max(first_connections.len())
        .max(second_connections.len())
        .max(1) as f32;
    let excess = (node_alignment.excess + connection_alignment.excess) as f32;
    let disjoint = (node_alignment.disjoint + connection_alignment.disjoint) as f32;

    c1 * excess / n + c2 * disjoint / n + c3 * connection_alignment.weight_difference / n
}
