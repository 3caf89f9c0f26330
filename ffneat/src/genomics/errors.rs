use crate::{Innovation, NodeId};

use thiserror::Error;

/// Errors arising from direct genome manipulation
/// or activation.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum GenomeError {
    /// The number of activation inputs did not match
    /// the genome's input node count.
    #[error("expected {expected} inputs, found {found}")]
    ShapeMismatch { expected: usize, found: usize },
    /// A node with the same ID already exists.
    #[error("duplicate node insertion with id {0}")]
    DuplicateNode(NodeId),
    /// A gene with the same innovation number already exists.
    #[error("duplicate gene insertion with innovation {0}")]
    DuplicateInnovation(Innovation),
    /// A connection between the same pair of nodes already
    /// exists, in either direction.
    #[error("connection {0} -> {1} shadows an existing connection between the same nodes")]
    DuplicateConnection(NodeId, NodeId),
    /// One of the connection's endpoints is not in the genome.
    #[error("connection between nonexistent endpoint(s) {0} -> {1}")]
    NonexistentEndpoint(NodeId, NodeId),
    /// The connection is a self-loop, starts at an output
    /// node, or ends at an input node.
    #[error("invalid connection endpoints {0} -> {1}")]
    InvalidEndpoint(NodeId, NodeId),
    /// The connection would close a cycle.
    #[error("connection {0} -> {1} would introduce a cycle")]
    CycleIntroduced(NodeId, NodeId),
}
