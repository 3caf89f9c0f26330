//! Genomes are the focus of evolution in NEAT.
//! They are a collection of node and connection genes that
//! describe a feed-forward network. Genomes can be progressively
//! mutated, thus adding complexity and functionality, while
//! innovation numbers keep genes of different genomes aligned.

mod compatibility;
mod config;
mod errors;
mod genes;
mod history;
mod nodes;

pub use compatibility::distance;
pub use config::GeneticConfig;
pub use errors::GenomeError;
pub use genes::ConnectionGene;
pub use history::{IdentityRegistry, InnovationKind};
pub use nodes::{ActivationType, NodeGene, NodeKind, NodeRole, HIDDEN_ACTIVATIONS};

use crate::adjacency::AdjacencyIndex;
use crate::{GenomeId, Innovation, NodeId};

use ahash::RandomState;
use rand::prelude::{IteratorRandom, Rng, SliceRandom};
use rand::thread_rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use std::collections::{HashMap, HashSet};
use std::fmt;

/// A feed-forward network encoded as node and connection genes.
///
/// Node genes are keyed by their genome-local ID, connection
/// genes by their innovation number. No two connections share
/// the same pair of endpoints, in either direction, and the
/// connections never form a cycle.
///
/// Suports Serde for convenient genome saving and loading.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Genome {
    id: GenomeId,
    nodes: HashMap<NodeId, NodeGene, RandomState>,
    connections: HashMap<Innovation, ConnectionGene, RandomState>,
    node_pairings: HashSet<(NodeId, NodeId), RandomState>,
    next_node_id: NodeId,
    output_nodes: Vec<NodeId>,
    fitness: Option<f32>,
}

impl Genome {
    /// Create a new genome with the specified configuration,
    /// and a sparse random set of initial connections.
    ///
    /// Nodes are numbered inputs first, then hidden nodes,
    /// then outputs. Each non-output node makes one attempt
    /// at a connection to a uniformly chosen node, which is
    /// kept only if it is a valid feed-forward connection.
    ///
    /// # Examples
    /// ```
    /// use ffneat::genomics::{GeneticConfig, Genome, IdentityRegistry, NodeRole};
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(3).unwrap(),
    ///     output_count: NonZeroUsize::new(2).unwrap(),
    ///     initial_hidden_nodes: 4,
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut registry = IdentityRegistry::new();
    ///
    /// let genome = Genome::new(&config, &mut registry);
    ///
    /// assert_eq!(genome.nodes().count(), 3 + 4 + 2);
    /// assert_eq!(genome.nodes().filter(|n| n.role() == NodeRole::Input).count(), 3);
    /// assert_eq!(genome.output_nodes(), &[7, 8]);
    ///
    /// // At most one connection per non-output node.
    /// assert!(genome.connections().count() <= 3 + 4);
    /// assert!(genome.connections().all(|c| c.weight().abs() <= 1.0));
    /// ```
    pub fn new(config: &GeneticConfig, registry: &mut IdentityRegistry) -> Genome {
        let mut genome = Self::unconnected(config, registry);
        genome.connect_randomly(registry);
        genome
    }

    /// Create a new genome with the configured nodes
    /// and no connections.
    ///
    /// # Examples
    /// ```
    /// use ffneat::genomics::{GeneticConfig, Genome, IdentityRegistry};
    ///
    /// let mut registry = IdentityRegistry::new();
    /// let genome = Genome::unconnected(&GeneticConfig::zero(), &mut registry);
    ///
    /// assert_eq!(genome.nodes().count(), 2);
    /// assert_eq!(genome.connections().count(), 0);
    /// ```
    pub fn unconnected(config: &GeneticConfig, registry: &mut IdentityRegistry) -> Genome {
        let mut genome = Genome::empty(registry.reserve_genome_id());
        for _ in 0..config.input_count.get() {
            genome.add_registered_node(NodeKind::Input, registry);
        }
        for _ in 0..config.initial_hidden_nodes {
            genome.add_registered_node(NodeKind::random_hidden(), registry);
        }
        for _ in 0..config.output_count.get() {
            genome.add_registered_node(NodeKind::random_output(), registry);
        }
        genome
    }

    /// Returns a genome with no genes.
    pub(crate) fn empty(id: GenomeId) -> Genome {
        Genome {
            id,
            nodes: HashMap::default(),
            connections: HashMap::default(),
            node_pairings: HashSet::default(),
            next_node_id: 0,
            output_nodes: vec![],
            fitness: None,
        }
    }

    fn connect_randomly(&mut self, registry: &mut IdentityRegistry) {
        let mut rng = thread_rng();
        let mut sources: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|n| n.role() != NodeRole::Output)
            .map(|n| n.id())
            .collect();
        sources.sort_unstable();
        for source in sources {
            let target = match self.nodes.keys().copied().choose(&mut rng) {
                Some(target) => target,
                None => return,
            };
            if self.check_connection_viability(source, target).is_ok() {
                self.add_registered_connection(source, target, ConnectionGene::random_weight(), registry);
            }
        }
    }

    /// Adds a node with the next free node ID, its innovation
    /// number resolved through the registry.
    fn add_registered_node(&mut self, kind: NodeKind, registry: &mut IdentityRegistry) -> NodeId {
        let id = self.next_node_id;
        let innovation = registry.create_or_reuse_innovation(InnovationKind::Node, id, None, None);
        self.add_node_unchecked(NodeGene::new(id, innovation, kind));
        id
    }

    /// Adds a connection whose viability has already been
    /// checked, its innovation number resolved through the registry.
    fn add_registered_connection(
        &mut self,
        source: NodeId,
        target: NodeId,
        weight: f32,
        registry: &mut IdentityRegistry,
    ) -> Innovation {
        let innovation = registry.create_or_reuse_innovation(
            InnovationKind::Connection,
            source,
            Some(target),
            None,
        );
        self.add_connection_unchecked(ConnectionGene::new(innovation, source, target, weight));
        innovation
    }

    /// Add a new node to the genome.
    /// Returns a reference to the newly created node.
    ///
    /// # Errors
    /// Returns an error if a node with the same ID
    /// or innovation number already exists.
    ///
    /// # Examples
    /// ```
    /// use ffneat::genomics::{ActivationType, GeneticConfig, Genome, GenomeError, IdentityRegistry, NodeKind};
    ///
    /// let mut registry = IdentityRegistry::new();
    /// let mut genome = Genome::unconnected(&GeneticConfig::zero(), &mut registry);
    ///
    /// let kind = NodeKind::Hidden { activation: ActivationType::Tanh, bias: 0.0 };
    /// let node = genome.add_node(42, 100, kind).unwrap();
    /// assert_eq!(node.innovation(), 100);
    ///
    /// assert_eq!(genome.add_node(42, 101, kind).unwrap_err(), GenomeError::DuplicateNode(42));
    /// // Later nodes are numbered after the highest ID seen.
    /// assert_eq!(genome.next_node_id(), 43);
    /// ```
    pub fn add_node(
        &mut self,
        id: NodeId,
        innovation: Innovation,
        kind: NodeKind,
    ) -> Result<&mut NodeGene, GenomeError> {
        if self.nodes.contains_key(&id) {
            return Err(GenomeError::DuplicateNode(id));
        }
        if self.nodes.values().any(|n| n.innovation() == innovation) {
            return Err(GenomeError::DuplicateInnovation(innovation));
        }
        Ok(self.add_node_unchecked(NodeGene::new(id, innovation, kind)))
    }

    pub(crate) fn add_node_unchecked(&mut self, node: NodeGene) -> &mut NodeGene {
        let id = node.id();
        if node.role() == NodeRole::Output {
            self.output_nodes.push(id);
        }
        self.next_node_id = self.next_node_id.max(id + 1);
        self.nodes.entry(id).or_insert(node)
    }

    /// Add a new connection to the genome.
    /// Returns a reference to the new connection.
    ///
    /// # Errors
    /// Returns an error if the innovation number is taken,
    /// either endpoint is missing, the connection is a
    /// self-loop, leaves an output node or enters an input
    /// node, shadows an existing connection between the same
    /// nodes, or would close a cycle.
    ///
    /// # Examples
    /// ```
    /// use ffneat::genomics::{GeneticConfig, Genome, GenomeError, IdentityRegistry};
    ///
    /// let mut registry = IdentityRegistry::new();
    /// // Node 0 is the input, node 1 the output.
    /// let mut genome = Genome::unconnected(&GeneticConfig::zero(), &mut registry);
    ///
    /// let connection = genome.add_connection(42, 0, 1, 2.5).unwrap();
    /// assert_eq!(connection.endpoints(), (0, 1));
    /// assert_eq!(connection.weight(), 2.5);
    ///
    /// assert_eq!(
    ///     genome.add_connection(43, 1, 0, 1.0).unwrap_err(),
    ///     GenomeError::InvalidEndpoint(1, 0),
    /// );
    /// ```
    pub fn add_connection(
        &mut self,
        innovation: Innovation,
        source: NodeId,
        target: NodeId,
        weight: f32,
    ) -> Result<&mut ConnectionGene, GenomeError> {
        if self.connections.contains_key(&innovation) {
            return Err(GenomeError::DuplicateInnovation(innovation));
        }
        self.check_connection_viability(source, target)?;
        Ok(self.add_connection_unchecked(ConnectionGene::new(innovation, source, target, weight)))
    }

    pub(crate) fn add_connection_unchecked(&mut self, connection: ConnectionGene) -> &mut ConnectionGene {
        self.node_pairings.insert(connection.endpoints());
        self.connections
            .entry(connection.innovation())
            .or_insert(connection)
    }

    /// Checks whether a `source -> target` connection
    /// could be added to the genome.
    fn check_connection_viability(&self, source: NodeId, target: NodeId) -> Result<(), GenomeError> {
        use GenomeError::*;
        let (source_node, target_node) = match (self.nodes.get(&source), self.nodes.get(&target)) {
            (Some(s), Some(t)) => (s, t),
            _ => return Err(NonexistentEndpoint(source, target)),
        };
        if source == target
            || source_node.role() == NodeRole::Output
            || target_node.role() == NodeRole::Input
        {
            Err(InvalidEndpoint(source, target))
        } else if self.node_pairings.contains(&(source, target))
            || self.node_pairings.contains(&(target, source))
        {
            Err(DuplicateConnection(source, target))
        } else if self.adjacency().reaches(target, source) {
            Err(CycleIntroduced(source, target))
        } else {
            Ok(())
        }
    }

    fn remove_connection(&mut self, innovation: Innovation) -> Option<ConnectionGene> {
        let connection = self.connections.remove(&innovation)?;
        self.node_pairings.remove(&connection.endpoints());
        Some(connection)
    }

    /// Removes a node and every connection touching it.
    fn remove_node(&mut self, id: NodeId) -> Option<(NodeGene, Vec<ConnectionGene>)> {
        let node = self.nodes.remove(&id)?;
        self.output_nodes.retain(|&o| o != id);
        let incident: Vec<Innovation> = self
            .connections
            .values()
            .filter(|c| c.source() == id || c.target() == id)
            .map(|c| c.innovation())
            .collect();
        let removed = incident
            .into_iter()
            .filter_map(|innovation| self.remove_connection(innovation))
            .collect();
        Some((node, removed))
    }

    /// Nudges each connection weight with probability `rate`
    /// by a value drawn uniformly from [-power, power].
    ///
    /// Returns whether any weight was nudged.
    ///
    /// # Examples
    /// ```
    /// use ffneat::genomics::{GeneticConfig, Genome, IdentityRegistry};
    ///
    /// let mut registry = IdentityRegistry::new();
    /// let mut genome = Genome::unconnected(&GeneticConfig::zero(), &mut registry);
    /// genome.add_connection(10, 0, 1, 0.0).unwrap();
    ///
    /// genome.mutate_weights(1.0, 0.5);
    ///
    /// assert!(genome.connections().all(|c| c.weight().abs() <= 0.5));
    /// ```
    pub fn mutate_weights(&mut self, rate: f32, power: f32) -> bool {
        let mut rng = thread_rng();
        let mut mutated = false;
        for connection in self.connections.values_mut() {
            if rng.gen::<f32>() < rate {
                connection.nudge_weight(power);
                mutated = true;
            }
        }
        mutated
    }

    /// Nudges each non-input node's bias with probability `rate`
    /// by a value drawn uniformly from [-power, power].
    ///
    /// Returns whether any bias was nudged.
    pub fn mutate_biases(&mut self, rate: f32, power: f32) -> bool {
        let mut rng = thread_rng();
        let mut mutated = false;
        for node in self.nodes.values_mut() {
            if node.role() != NodeRole::Input && rng.gen::<f32>() < rate {
                let nudge = if power > 0.0 {
                    rng.gen_range(-power..=power)
                } else {
                    0.0
                };
                node.set_bias(node.bias() + nudge);
                mutated = true;
            }
        }
        mutated
    }

    /// Splits a randomly chosen connection `a -> b` with weight `w`
    /// into `a -> new` with weight 1 and `new -> b` with weight `w`,
    /// where `new` is a fresh hidden node. The split connection
    /// is removed.
    ///
    /// Returns the new node's ID, or `None` if the genome
    /// has no connections.
    ///
    /// # Examples
    /// ```
    /// use ffneat::genomics::{GeneticConfig, Genome, IdentityRegistry, NodeRole};
    ///
    /// let mut registry = IdentityRegistry::new();
    /// let mut genome = Genome::unconnected(&GeneticConfig::zero(), &mut registry);
    /// assert_eq!(genome.mutate_add_node(&mut registry), None);
    ///
    /// genome.add_connection(10, 0, 1, -0.75).unwrap();
    /// let node = genome.mutate_add_node(&mut registry).unwrap();
    ///
    /// assert_eq!(genome.node(node).unwrap().role(), NodeRole::Hidden);
    /// assert!(genome.connection(10).is_none());
    /// assert!(genome.connections().any(|c| c.endpoints() == (0, node) && c.weight() == 1.0));
    /// assert!(genome.connections().any(|c| c.endpoints() == (node, 1) && c.weight() == -0.75));
    /// ```
    pub fn mutate_add_node(&mut self, registry: &mut IdentityRegistry) -> Option<NodeId> {
        let split = self.connections.keys().copied().choose(&mut thread_rng())?;
        let split = self.remove_connection(split)?;
        let (source, target) = split.endpoints();

        let new_node = self.add_registered_node(NodeKind::random_hidden(), registry);
        self.add_registered_connection(source, new_node, 1.0, registry);
        self.add_registered_connection(new_node, target, split.weight(), registry);

        debug!(
            genome = self.id,
            split = split.innovation(),
            new_node,
            "split connection"
        );
        Some(new_node)
    }

    /// Attempts a connection from a node drawn uniformly from
    /// `source_pool` to one drawn uniformly from `target_pool`.
    /// The attempt is dropped unless the source ID is lower than
    /// the target ID and the pair is a valid new feed-forward
    /// connection.
    ///
    /// Returns the new connection's innovation number, if created.
    ///
    /// # Examples
    /// ```
    /// use ffneat::genomics::{GeneticConfig, Genome, IdentityRegistry};
    ///
    /// let mut registry = IdentityRegistry::new();
    /// let mut genome = Genome::unconnected(&GeneticConfig::zero(), &mut registry);
    ///
    /// let innovation = genome.mutate_add_connection(&[0], &[1], &mut registry).unwrap();
    /// assert_eq!(genome.connection(innovation).unwrap().endpoints(), (0, 1));
    ///
    /// // The same pair cannot be connected twice.
    /// assert_eq!(genome.mutate_add_connection(&[0], &[1], &mut registry), None);
    ///
    /// // New connections never point to a lower node ID.
    /// let hidden = genome.mutate_add_node(&mut registry).unwrap();
    /// assert_eq!(genome.mutate_add_connection(&[hidden], &[1], &mut registry), None);
    /// ```
    pub fn mutate_add_connection(
        &mut self,
        source_pool: &[NodeId],
        target_pool: &[NodeId],
        registry: &mut IdentityRegistry,
    ) -> Option<Innovation> {
        let mut rng = thread_rng();
        let source = *source_pool.choose(&mut rng)?;
        let target = *target_pool.choose(&mut rng)?;
        if source >= target {
            return None;
        }
        self.check_connection_viability(source, target).ok()?;
        let innovation =
            self.add_registered_connection(source, target, ConnectionGene::random_weight(), registry);
        debug!(genome = self.id, source, target, innovation, "added connection");
        Some(innovation)
    }

    /// Deletes a randomly-chosen hidden node, and all
    /// incident connections, from the genome. Neighbours
    /// left without connections are not repaired.
    ///
    /// Returns `None` if there are no hidden nodes, or
    /// `Some((node, incident_connections))` otherwise.
    pub fn mutate_eliminate_node(&mut self) -> Option<(NodeGene, Vec<ConnectionGene>)> {
        let mut hidden: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|n| n.role() == NodeRole::Hidden)
            .map(|n| n.id())
            .collect();
        hidden.shuffle(&mut thread_rng());
        let id = *hidden.first()?;
        debug!(genome = self.id, node = id, "eliminated node");
        self.remove_node(id)
    }

    /// Deletes a randomly-chosen connection whose removal leaves
    /// every hidden endpoint with at least one input and one output.
    /// Candidates are tried in random order until one qualifies,
    /// after which orphaned nodes are pruned.
    ///
    /// Returns the removed connection, or `None` if no
    /// connection could be removed.
    pub fn mutate_eliminate_connection(&mut self) -> Option<ConnectionGene> {
        let mut candidates: Vec<ConnectionGene> = self.connections.values().copied().collect();
        candidates.shuffle(&mut thread_rng());

        let removable = candidates.into_iter().find(|candidate| {
            let (source, target) = candidate.endpoints();
            let (source_node, target_node) = match (self.nodes.get(&source), self.nodes.get(&target)) {
                (Some(s), Some(t)) => (s, t),
                _ => return false,
            };
            let source_keeps_output = self
                .connections
                .values()
                .any(|c| c.source() == source && c.innovation() != candidate.innovation());
            let target_keeps_input = self
                .connections
                .values()
                .any(|c| c.target() == target && c.innovation() != candidate.innovation());
            !(source_node.role() == NodeRole::Hidden && !source_keeps_output
                || target_node.role() == NodeRole::Hidden && !target_keeps_input)
        })?;

        let removed = self.remove_connection(removable.innovation())?;
        debug!(genome = self.id, innovation = removed.innovation(), "eliminated connection");
        self.prune_orphans();
        Some(removed)
    }

    /// Removes hidden nodes with no incident connections.
    /// Input and output nodes are never removed.
    ///
    /// Returns the IDs of the removed nodes.
    pub fn prune_orphans(&mut self) -> Vec<NodeId> {
        let connected: HashSet<NodeId, RandomState> = self
            .connections
            .values()
            .flat_map(|c| [c.source(), c.target()])
            .collect();
        let orphans: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|n| n.role() == NodeRole::Hidden && !connected.contains(&n.id()))
            .map(|n| n.id())
            .collect();
        for &orphan in &orphans {
            self.remove_node(orphan);
        }
        orphans
    }

    /// Removes hidden nodes lacking either an incoming or an
    /// outgoing connection, together with their connections,
    /// until every hidden node has both.
    ///
    /// Returns the IDs of the removed nodes.
    pub fn prune_dead_ends(&mut self) -> Vec<NodeId> {
        let mut removed = vec![];
        loop {
            let sources: HashSet<NodeId, RandomState> = self
                .connections
                .values()
                .map(|c| c.source())
                .collect();
            let targets: HashSet<NodeId, RandomState> = self
                .connections
                .values()
                .map(|c| c.target())
                .collect();
            let dead_ends: Vec<NodeId> = self
                .nodes
                .values()
                .filter(|n| {
                    n.role() == NodeRole::Hidden
                        && (!sources.contains(&n.id()) || !targets.contains(&n.id()))
                })
                .map(|n| n.id())
                .collect();
            if dead_ends.is_empty() {
                return removed;
            }
            for id in dead_ends {
                self.remove_node(id);
                removed.push(id);
            }
        }
    }

    /// Gives every input node without outgoing connections a
    /// new connection to a uniformly chosen hidden or output node.
    ///
    /// Returns the innovation numbers of the new connections.
    pub fn prune_disconnected_inputs(&mut self, registry: &mut IdentityRegistry) -> Vec<Innovation> {
        let sources: HashSet<NodeId, RandomState> = self
            .connections
            .values()
            .map(|c| c.source())
            .collect();
        let mut disconnected: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|n| n.role() == NodeRole::Input && !sources.contains(&n.id()))
            .map(|n| n.id())
            .collect();
        disconnected.sort_unstable();
        let targets: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|n| n.role() != NodeRole::Input)
            .map(|n| n.id())
            .collect();
        self.reconnect(disconnected, &targets, true, registry)
    }

    /// Gives every output node without incoming connections a
    /// new connection from a uniformly chosen input or hidden node.
    ///
    /// Returns the innovation numbers of the new connections.
    pub fn prune_disconnected_outputs(&mut self, registry: &mut IdentityRegistry) -> Vec<Innovation> {
        let targets: HashSet<NodeId, RandomState> = self
            .connections
            .values()
            .map(|c| c.target())
            .collect();
        let mut disconnected: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|n| n.role() == NodeRole::Output && !targets.contains(&n.id()))
            .map(|n| n.id())
            .collect();
        disconnected.sort_unstable();
        let sources: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|n| n.role() != NodeRole::Output)
            .map(|n| n.id())
            .collect();
        self.reconnect(disconnected, &sources, false, registry)
    }

    /// Connects each of `nodes` with a random partner from
    /// `partners`, as source if `outgoing`, else as target.
    fn reconnect(
        &mut self,
        nodes: Vec<NodeId>,
        partners: &[NodeId],
        outgoing: bool,
        registry: &mut IdentityRegistry,
    ) -> Vec<Innovation> {
        let mut rng = thread_rng();
        let mut added = vec![];
        for node in nodes {
            let partner = match partners.choose(&mut rng) {
                Some(&partner) => partner,
                None => break,
            };
            let (source, target) = if outgoing { (node, partner) } else { (partner, node) };
            if self.check_connection_viability(source, target).is_ok() {
                added.push(self.add_registered_connection(
                    source,
                    target,
                    ConnectionGene::random_weight(),
                    registry,
                ));
            }
        }
        added
    }

    /// Feeds `inputs` through the network and returns the output
    /// node values, in output order.
    ///
    /// Inputs are assigned to input nodes in ascending ID order.
    /// Every other node sums its enabled incoming connections,
    /// adds its bias, and applies its activation function.
    /// Outputs that cannot be computed default to 0.
    ///
    /// # Errors
    /// Returns [`GenomeError::ShapeMismatch`] if the number of
    /// inputs differs from the number of input nodes.
    ///
    /// # Examples
    /// ```
    /// use ffneat::genomics::{GeneticConfig, Genome, IdentityRegistry};
    /// use std::num::NonZeroUsize;
    ///
    /// let config = GeneticConfig {
    ///     input_count: NonZeroUsize::new(2).unwrap(),
    ///     ..GeneticConfig::zero()
    /// };
    /// let mut registry = IdentityRegistry::new();
    /// let mut genome = Genome::unconnected(&config, &mut registry);
    /// genome.node_mut(2).unwrap().set_bias(0.5);
    /// genome.add_connection(10, 0, 2, 2.0).unwrap();
    /// genome.add_connection(11, 1, 2, -1.0).unwrap();
    ///
    /// assert_eq!(genome.activate(&[1.0, 3.0]).unwrap(), vec![-0.5]);
    /// assert!(genome.activate(&[1.0]).is_err());
    /// ```
    pub fn activate(&self, inputs: &[f32]) -> Result<Vec<f32>, GenomeError> {
        let input_nodes = self.input_nodes();
        if inputs.len() != input_nodes.len() {
            return Err(GenomeError::ShapeMismatch {
                expected: input_nodes.len(),
                found: inputs.len(),
            });
        }

        let mut incoming: HashMap<NodeId, Vec<(NodeId, f32)>, RandomState> = HashMap::default();
        for connection in self.connections.values().filter(|c| c.enabled()) {
            incoming
                .entry(connection.target())
                .or_default()
                .push((connection.source(), connection.weight()));
        }

        let mut values: HashMap<NodeId, f32, RandomState> =
            input_nodes.iter().copied().zip(inputs.iter().copied()).collect();
        for id in self.evaluation_order() {
            let node = match self.nodes.get(&id) {
                Some(node) if node.role() != NodeRole::Input => node,
                _ => continue,
            };
            let sum: f32 = incoming
                .get(&id)
                .into_iter()
                .flatten()
                .filter_map(|(source, weight)| values.get(source).map(|v| v * weight))
                .sum();
            values.insert(id, node.activation().apply(sum + node.bias()));
        }

        Ok(self
            .output_nodes
            .iter()
            .map(|id| values.get(id).copied().unwrap_or(0.0))
            .collect())
    }

    /// Node IDs in topological order, lowest ID first among ready nodes.
    fn evaluation_order(&self) -> Vec<NodeId> {
        self.adjacency().topological_order().unwrap_or_else(|| {
            let mut ids: Vec<NodeId> = self.nodes.keys().copied().collect();
            ids.sort_unstable();
            ids
        })
    }

    /// Returns the genome's connectivity as an adjacency index
    /// over all node IDs, disabled connections included.
    pub fn adjacency(&self) -> AdjacencyIndex {
        AdjacencyIndex::from_nodes(self.nodes.keys().copied(), self.node_pairings.iter().copied())
    }

    /// Returns whether the connections are free of cycles.
    pub fn is_acyclic(&self) -> bool {
        self.adjacency().topological_order().is_some()
    }

    /// Returns the genetic distance between two genomes, using
    /// the compatibility factors in `config`.
    ///
    /// # Examples
    /// ```
    /// use ffneat::genomics::{GeneticConfig, Genome, IdentityRegistry};
    ///
    /// let config = GeneticConfig::default();
    /// let mut registry = IdentityRegistry::new();
    /// let genome = Genome::new(&config, &mut registry);
    ///
    /// assert_eq!(Genome::genetic_distance(&genome, &genome, &config), 0.0);
    /// ```
    pub fn genetic_distance(first: &Genome, second: &Genome, config: &GeneticConfig) -> f32 {
        distance(
            first,
            second,
            config.excess_gene_factor,
            config.disjoint_gene_factor,
            config.weight_difference_factor,
        )
    }

    /// Returns the genome's ID.
    pub fn id(&self) -> GenomeId {
        self.id
    }

    /// Returns an iterator over the genome's node genes.
    /// No ordering is guaranteed.
    pub fn nodes(&self) -> impl Iterator<Item = &NodeGene> {
        self.nodes.values()
    }

    /// Returns an iterator over the genome's connection genes.
    /// No ordering is guaranteed.
    pub fn connections(&self) -> impl Iterator<Item = &ConnectionGene> {
        self.connections.values()
    }

    /// Returns the node with the given ID.
    pub fn node(&self, id: NodeId) -> Option<&NodeGene> {
        self.nodes.get(&id)
    }

    /// Returns a mutable reference to the node with the given ID.
    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut NodeGene> {
        self.nodes.get_mut(&id)
    }

    /// Returns the connection with the given innovation number.
    pub fn connection(&self, innovation: Innovation) -> Option<&ConnectionGene> {
        self.connections.get(&innovation)
    }

    /// Returns a mutable reference to the connection with
    /// the given innovation number.
    pub fn connection_mut(&mut self, innovation: Innovation) -> Option<&mut ConnectionGene> {
        self.connections.get_mut(&innovation)
    }

    /// Returns the input node IDs in ascending order,
    /// which is the order inputs are fed in.
    pub fn input_nodes(&self) -> Vec<NodeId> {
        let mut inputs: Vec<NodeId> = self
            .nodes
            .values()
            .filter(|n| n.role() == NodeRole::Input)
            .map(|n| n.id())
            .collect();
        inputs.sort_unstable();
        inputs
    }

    /// Returns the output node IDs, in output order.
    pub fn output_nodes(&self) -> &[NodeId] {
        &self.output_nodes
    }

    pub(crate) fn set_output_nodes(&mut self, output_nodes: Vec<NodeId>) {
        self.output_nodes = output_nodes;
    }

    /// Returns the number of input nodes.
    pub fn input_count(&self) -> usize {
        self.count_role(NodeRole::Input)
    }

    /// Returns the number of output nodes.
    pub fn output_count(&self) -> usize {
        self.count_role(NodeRole::Output)
    }

    /// Returns the number of hidden nodes.
    pub fn hidden_count(&self) -> usize {
        self.count_role(NodeRole::Hidden)
    }

    fn count_role(&self, role: NodeRole) -> usize {
        self.nodes.values().filter(|n| n.role() == role).count()
    }

    /// Returns the ID the next created node will get.
    pub fn next_node_id(&self) -> NodeId {
        self.next_node_id
    }

    /// Sets the genome's fitness.
    pub fn set_fitness(&mut self, fitness: f32) {
        self.fitness = Some(fitness);
    }

    /// Returns the genome's fitness, or `None`
    /// if it has not been evaluated.
    pub fn fitness(&self) -> Option<f32> {
        self.fitness
    }
}

impl fmt::Display for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut connections: Vec<&ConnectionGene> = self.connections.values().collect();
        let mut nodes: Vec<&NodeGene> = self.nodes.values().collect();
        connections.sort_unstable_by_key(|c| c.innovation());
        nodes.sort_unstable_by_key(|n| n.id());
        f.debug_struct("Genome")
            .field("Id", &self.id)
            .field("Nodes", &nodes)
            .field("Connections", &connections)
            .field("Fitness", &self.fitness)
            .finish()
    }
}
