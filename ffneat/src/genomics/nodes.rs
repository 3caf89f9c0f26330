use crate::{Innovation, NodeId};

use rand::prelude::{Rng, SliceRandom};
use rand::thread_rng;
use serde::{Deserialize, Serialize};

use std::fmt;

/// Activation types a hidden node may be
/// randomly assigned on creation.
pub const HIDDEN_ACTIVATIONS: [ActivationType; 3] = [
    ActivationType::ReLU,
    ActivationType::Sigmoid,
    ActivationType::Tanh,
];

/// An ActivationType represents the type
/// of activation function applied to a node's
/// summed input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActivationType {
    // x
    Identity,
    // 0   if x < 0
    // x   if x ≥ 0
    ReLU,
    // 1 / (1 + exp(-x))
    Sigmoid,
    // tanh(x)
    Tanh,
}

impl ActivationType {
    /// Applies the activation function to `x`.
    ///
    /// # Examples
    /// ```
    /// use ffneat::genomics::ActivationType;
    ///
    /// assert_eq!(ActivationType::Identity.apply(-2.0), -2.0);
    /// assert_eq!(ActivationType::ReLU.apply(-2.0), 0.0);
    /// assert_eq!(ActivationType::Sigmoid.apply(0.0), 0.5);
    /// assert_eq!(ActivationType::Tanh.apply(0.0), 0.0);
    /// ```
    pub fn apply(self, x: f32) -> f32 {
        match self {
            ActivationType::Identity => x,
            ActivationType::ReLU => x.max(0.0),
            ActivationType::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            ActivationType::Tanh => x.tanh(),
        }
    }

    /// Returns a uniformly chosen hidden-node activation.
    pub fn random_hidden() -> ActivationType {
        *HIDDEN_ACTIVATIONS
            .choose(&mut thread_rng())
            .unwrap_or(&ActivationType::Sigmoid)
    }
}

/// A NodeRole indicates the function of
/// a node within the network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeRole {
    /// Input nodes.
    Input,
    /// Hidden nodes.
    Hidden,
    /// Output nodes.
    Output,
}

/// Role-specific payload of a node gene. Input nodes
/// carry neither an activation nor a bias.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    Input,
    Hidden { activation: ActivationType, bias: f32 },
    Output { activation: ActivationType, bias: f32 },
}

impl NodeKind {
    /// A hidden node with a random activation type
    /// and a bias drawn uniformly from [-1, 1].
    pub fn random_hidden() -> NodeKind {
        NodeKind::Hidden {
            activation: ActivationType::random_hidden(),
            bias: random_bias(),
        }
    }

    /// An identity output node with a bias drawn
    /// uniformly from [-1, 1].
    pub fn random_output() -> NodeKind {
        NodeKind::Output {
            activation: ActivationType::Identity,
            bias: random_bias(),
        }
    }

    /// Returns the role this kind corresponds to.
    pub fn role(&self) -> NodeRole {
        match self {
            NodeKind::Input => NodeRole::Input,
            NodeKind::Hidden { .. } => NodeRole::Hidden,
            NodeKind::Output { .. } => NodeRole::Output,
        }
    }
}

pub(crate) fn random_bias() -> f32 {
    thread_rng().gen_range(-1.0..=1.0)
}

/// Node genes are the structural elements of genomes
/// between which connections are created.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct NodeGene {
    id: NodeId,
    innovation: Innovation,
    kind: NodeKind,
}

impl NodeGene {
    /// Generate a new node gene with the passed parameters.
    ///
    /// # Examples
    /// ```
    /// use ffneat::genomics::{ActivationType, NodeGene, NodeKind, NodeRole};
    ///
    /// let node = NodeGene::new(5, 12, NodeKind::Hidden {
    ///     activation: ActivationType::Tanh,
    ///     bias: 0.5,
    /// });
    ///
    /// assert_eq!(node.id(), 5);
    /// assert_eq!(node.innovation(), 12);
    /// assert_eq!(node.role(), NodeRole::Hidden);
    /// assert_eq!(node.bias(), 0.5);
    /// ```
    pub fn new(id: NodeId, innovation: Innovation, kind: NodeKind) -> NodeGene {
        NodeGene {
            id,
            innovation,
            kind,
        }
    }

    /// Returns the node's genome-local ID.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Returns the node's innovation number.
    pub fn innovation(&self) -> Innovation {
        self.innovation
    }

    /// Returns the node's role-specific payload.
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Returns the node's role.
    pub fn role(&self) -> NodeRole {
        self.kind.role()
    }

    /// Returns the node's activation type.
    /// Input nodes always report [`Identity`].
    ///
    /// [`Identity`]: ActivationType::Identity
    pub fn activation(&self) -> ActivationType {
        match self.kind {
            NodeKind::Input => ActivationType::Identity,
            NodeKind::Hidden { activation, .. } | NodeKind::Output { activation, .. } => activation,
        }
    }

    /// Returns the node's bias, which is always 0 for input nodes.
    pub fn bias(&self) -> f32 {
        match self.kind {
            NodeKind::Input => 0.0,
            NodeKind::Hidden { bias, .. } | NodeKind::Output { bias, .. } => bias,
        }
    }

    /// Sets the node's bias. Has no effect on input nodes.
    ///
    /// # Examples
    /// ```
    /// use ffneat::genomics::{NodeGene, NodeKind};
    ///
    /// let mut input = NodeGene::new(0, 1, NodeKind::Input);
    /// input.set_bias(3.0);
    /// assert_eq!(input.bias(), 0.0);
    ///
    /// let mut output = NodeGene::new(1, 2, NodeKind::random_output());
    /// output.set_bias(3.0);
    /// assert_eq!(output.bias(), 3.0);
    /// ```
    pub fn set_bias(&mut self, value: f32) {
        match &mut self.kind {
            NodeKind::Input => {}
            NodeKind::Hidden { bias, .. } | NodeKind::Output { bias, .. } => *bias = value,
        }
    }
}

impl fmt::Display for NodeGene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:?}({:?})[{:?}, {:?}, {:.3}]",
            self.id,
            self.innovation,
            self.role(),
            self.activation(),
            self.bias(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_hidden_kind_is_bounded() {
        for _ in 0..100 {
            let kind = NodeKind::random_hidden();
            let node = NodeGene::new(0, 0, kind);
            assert_eq!(node.role(), NodeRole::Hidden);
            assert!(HIDDEN_ACTIVATIONS.contains(&node.activation()));
            assert!(node.bias().abs() <= 1.0);
        }
    }

    #[test]
    fn output_kind_is_identity() {
        let node = NodeGene::new(3, 4, NodeKind::random_output());
        assert_eq!(node.role(), NodeRole::Output);
        assert_eq!(node.activation(), ActivationType::Identity);
    }

    #[test]
    fn input_has_no_bias() {
        let node = NodeGene::new(0, 1, NodeKind::Input);
        assert_eq!(node.activation(), ActivationType::Identity);
        assert_eq!(node.bias(), 0.0);
    }

    #[test]
    fn relu_clamps_negative() {
        assert_eq!(ActivationType::ReLU.apply(-0.1), 0.0);
        assert_eq!(ActivationType::ReLU.apply(2.5), 2.5);
    }
}
