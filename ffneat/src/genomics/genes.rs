use crate::{Innovation, NodeId};

use std::fmt;

use rand::{thread_rng, Rng};
use serde::{Deserialize, Serialize};

/// Connection genes link two nodes of a genome,
/// and become weighted edges in the genome's network.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
pub struct ConnectionGene {
    innovation: Innovation,
    source: NodeId,
    target: NodeId,
    weight: f32,
    enabled: bool,
}

impl ConnectionGene {
    /// Returns a new _enabled_ connection gene with the specified parameters.
    ///
    /// # Examples
    /// ```
    /// use ffneat::genomics::ConnectionGene;
    ///
    /// let gene = ConnectionGene::new(42, 3, 9, 2.0);
    ///
    /// assert_eq!(gene.innovation(), 42);
    /// assert_eq!(gene.endpoints(), (3, 9));
    /// assert_eq!(gene.weight(), 2.0);
    /// assert!(gene.enabled());
    /// ```
    pub fn new(innovation: Innovation, source: NodeId, target: NodeId, weight: f32) -> ConnectionGene {
        ConnectionGene {
            innovation,
            source,
            target,
            weight,
            enabled: true,
        }
    }

    /// Returns a random weight drawn uniformly from [-1, 1].
    pub(crate) fn random_weight() -> f32 {
        thread_rng().gen_range(-1.0..=1.0)
    }

    /// Nudges the gene's weight by a value drawn
    /// uniformly from [-power, power].
    ///
    /// # Examples
    /// ```
    /// use ffneat::genomics::ConnectionGene;
    ///
    /// let mut gene = ConnectionGene::new(42, 3, 9, 3.0);
    /// gene.nudge_weight(0.5);
    ///
    /// assert!((gene.weight() - 3.0).abs() <= 0.5);
    /// ```
    pub fn nudge_weight(&mut self, power: f32) {
        if power > 0.0 {
            self.weight += thread_rng().gen_range(-power..=power);
        }
    }

    /// Returns the gene's innovation number.
    pub fn innovation(&self) -> Innovation {
        self.innovation
    }

    /// Returns the gene's source node ID.
    pub fn source(&self) -> NodeId {
        self.source
    }

    /// Returns the gene's target node ID.
    pub fn target(&self) -> NodeId {
        self.target
    }

    /// Returns the gene's `(source, target)` pair.
    pub fn endpoints(&self) -> (NodeId, NodeId) {
        (self.source, self.target)
    }

    /// Returns the gene's weight.
    pub fn weight(&self) -> f32 {
        self.weight
    }

    /// Sets the gene's weight.
    ///
    /// # Examples
    /// ```
    /// use ffneat::genomics::ConnectionGene;
    ///
    /// let mut gene = ConnectionGene::new(42, 3, 9, 2.0);
    /// gene.set_weight(-5.0);
    ///
    /// assert_eq!(gene.weight(), -5.0);
    /// ```
    pub fn set_weight(&mut self, w: f32) {
        self.weight = w;
    }

    /// Returns whether the gene takes part in activation.
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Sets the gene's enabled status.
    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }
}

impl fmt::Display for ConnectionGene {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}{:?}[{:?}->{:?}, {:.3}]{}",
            if self.enabled { "" } else { "(" },
            self.innovation,
            self.source,
            self.target,
            self.weight,
            if self.enabled { "" } else { ")" },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn random_weight_in_unit_range() {
        for _ in 0..1000 {
            assert!(ConnectionGene::random_weight().abs() <= 1.0);
        }
    }

    #[test]
    fn zero_power_nudge_is_noop() {
        let mut gene = ConnectionGene::new(0, 0, 1, 0.25);
        gene.nudge_weight(0.0);
        assert_eq!(gene.weight(), 0.25);
    }

    #[test]
    fn disabled_display_is_parenthesized() {
        let mut gene = ConnectionGene::new(7, 1, 2, 1.0);
        gene.set_enabled(false);
        assert_eq!(gene.to_string(), "(7[1->2, 1.000])");
    }
}
