use crate::{GenomeId, Innovation, NodeId};

use ahash::RandomState;
use serde::{Deserialize, Serialize};
use tracing::trace;

use std::collections::hash_map::{Entry, HashMap};

/// The kind of structural event an innovation
/// number was issued for.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InnovationKind {
    /// A node gene, keyed by its node ID alone.
    Node,
    /// A connection gene, keyed by its endpoints.
    Connection,
}

type InnovationKey = (InnovationKind, NodeId, Option<NodeId>);

/// An `IdentityRegistry` keeps track of structural innovations
/// in a population, in order to make sure identical mutations
/// are assigned the same innovation numbers, and hands out
/// unique genome IDs.
///
/// Node innovations are identified by the created node's ID,
/// connection innovations by their `(source, target)` pair.
/// Both kinds share a single counter, which starts at 1.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityRegistry {
    next_innovation: Innovation,
    next_genome_id: GenomeId,
    innovations: HashMap<InnovationKey, Innovation, RandomState>,
}

impl Default for IdentityRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityRegistry {
    /// Creates an empty registry.
    ///
    /// # Examples
    /// ```
    /// use ffneat::genomics::IdentityRegistry;
    ///
    /// let registry = IdentityRegistry::new();
    ///
    /// assert_eq!(registry.max_innovation(), 0);
    /// assert_eq!(registry.next_genome_id(), 0);
    /// ```
    pub fn new() -> IdentityRegistry {
        IdentityRegistry {
            next_innovation: 1,
            next_genome_id: 0,
            innovations: HashMap::default(),
        }
    }

    /// Returns the innovation number previously recorded
    /// for the structural event, if any. Never issues a
    /// new number.
    ///
    /// # Examples
    /// ```
    /// use ffneat::genomics::{IdentityRegistry, InnovationKind};
    ///
    /// let mut registry = IdentityRegistry::new();
    /// assert_eq!(registry.innovation_for(InnovationKind::Connection, 0, Some(3)), None);
    ///
    /// let innovation = registry.create_or_reuse_innovation(InnovationKind::Connection, 0, Some(3), None);
    /// assert_eq!(registry.innovation_for(InnovationKind::Connection, 0, Some(3)), Some(innovation));
    /// ```
    pub fn innovation_for(
        &self,
        kind: InnovationKind,
        in_id: NodeId,
        out_id: Option<NodeId>,
    ) -> Option<Innovation> {
        self.innovations.get(&(kind, in_id, out_id)).copied()
    }

    /// Returns the innovation number for a structural event,
    /// issuing and recording a new one if the event has never
    /// been seen.
    ///
    /// If `explicit` is given, that number is recorded for
    /// the event verbatim and returned. The counter is moved
    /// past it so later events never collide with it.
    ///
    /// # Examples
    /// ```
    /// use ffneat::genomics::{IdentityRegistry, InnovationKind};
    ///
    /// let mut registry = IdentityRegistry::new();
    ///
    /// let a = registry.create_or_reuse_innovation(InnovationKind::Node, 4, None, None);
    /// let b = registry.create_or_reuse_innovation(InnovationKind::Connection, 0, Some(4), None);
    /// // Identical events resolve to the same number.
    /// assert_eq!(registry.create_or_reuse_innovation(InnovationKind::Node, 4, None, None), a);
    /// // Distinct events get strictly increasing numbers.
    /// assert!(b > a);
    ///
    /// let c = registry.create_or_reuse_innovation(InnovationKind::Connection, 4, Some(1), Some(100));
    /// assert_eq!(c, 100);
    /// assert!(registry.create_or_reuse_innovation(InnovationKind::Connection, 2, Some(1), None) > 100);
    /// ```
    pub fn create_or_reuse_innovation(
        &mut self,
        kind: InnovationKind,
        in_id: NodeId,
        out_id: Option<NodeId>,
        explicit: Option<Innovation>,
    ) -> Innovation {
        let key = (kind, in_id, out_id);
        if let Some(innovation) = explicit {
            self.innovations.insert(key, innovation);
            self.next_innovation = self.next_innovation.max(innovation + 1);
            return innovation;
        }
        match self.innovations.entry(key) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let innovation = self.next_innovation;
                entry.insert(innovation);
                self.next_innovation += 1;
                trace!(?kind, in_id, ?out_id, innovation, "issued innovation");
                innovation
            }
        }
    }

    /// Returns the ID the next reserved genome will get,
    /// without consuming it.
    pub fn next_genome_id(&self) -> GenomeId {
        self.next_genome_id
    }

    /// Consumes and returns a fresh genome ID.
    ///
    /// # Examples
    /// ```
    /// use ffneat::genomics::IdentityRegistry;
    ///
    /// let mut registry = IdentityRegistry::new();
    ///
    /// assert_eq!(registry.reserve_genome_id(), 0);
    /// assert_eq!(registry.next_genome_id(), 1);
    /// assert_eq!(registry.reserve_genome_id(), 1);
    /// ```
    pub fn reserve_genome_id(&mut self) -> GenomeId {
        let id = self.next_genome_id;
        self.next_genome_id += 1;
        id
    }

    /// Returns the highest innovation number issued so far,
    /// or 0 if none has been.
    pub fn max_innovation(&self) -> Innovation {
        self.next_innovation - 1
    }

    /// Returns an iterator over the complete record of
    /// innovations, in the format `((kind, in, out), innovation)`.
    /// No ordering is guaranteed.
    pub fn innovation_history(
        &self,
    ) -> impl Iterator<Item = (&(InnovationKind, NodeId, Option<NodeId>), &Innovation)> {
        self.innovations.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counter_starts_at_one() {
        let mut registry = IdentityRegistry::new();
        assert_eq!(
            registry.create_or_reuse_innovation(InnovationKind::Node, 0, None, None),
            1
        );
    }

    #[test]
    fn kinds_do_not_alias() {
        let mut registry = IdentityRegistry::new();
        let node = registry.create_or_reuse_innovation(InnovationKind::Node, 2, None, None);
        let conn = registry.create_or_reuse_innovation(InnovationKind::Connection, 2, None, None);
        assert_ne!(node, conn);
    }

    #[test]
    fn distinct_keys_strictly_increase() {
        let mut registry = IdentityRegistry::new();
        let mut last = 0;
        for s in 0..5 {
            for t in 5..10 {
                let i = registry.create_or_reuse_innovation(
                    InnovationKind::Connection,
                    s,
                    Some(t),
                    None,
                );
                assert!(i > last);
                last = i;
            }
        }
        assert_eq!(registry.max_innovation(), last);
    }

    #[test]
    fn reuse_is_idempotent() {
        let mut registry = IdentityRegistry::new();
        let first = registry.create_or_reuse_innovation(InnovationKind::Connection, 1, Some(2), None);
        registry.create_or_reuse_innovation(InnovationKind::Connection, 3, Some(2), None);
        for _ in 0..10 {
            assert_eq!(
                registry.create_or_reuse_innovation(InnovationKind::Connection, 1, Some(2), None),
                first
            );
        }
        assert_eq!(registry.innovation_history().count(), 2);
    }

    #[test]
    fn explicit_overwrites_and_advances() {
        let mut registry = IdentityRegistry::new();
        registry.create_or_reuse_innovation(InnovationKind::Node, 0, None, None);
        assert_eq!(
            registry.create_or_reuse_innovation(InnovationKind::Node, 0, None, Some(50)),
            50
        );
        assert_eq!(registry.innovation_for(InnovationKind::Node, 0, None), Some(50));
        assert_eq!(
            registry.create_or_reuse_innovation(InnovationKind::Node, 1, None, None),
            51
        );
    }

    #[test]
    fn explicit_below_counter_keeps_counter() {
        let mut registry = IdentityRegistry::new();
        for n in 0..5 {
            registry.create_or_reuse_innovation(InnovationKind::Node, n, None, None);
        }
        registry.create_or_reuse_innovation(InnovationKind::Node, 9, None, Some(2));
        assert_eq!(
            registry.create_or_reuse_innovation(InnovationKind::Node, 10, None, None),
            6
        );
    }

    #[test]
    fn genome_ids_are_independent() {
        let mut registry = IdentityRegistry::new();
        registry.create_or_reuse_innovation(InnovationKind::Node, 0, None, None);
        assert_eq!(registry.reserve_genome_id(), 0);
        assert_eq!(registry.reserve_genome_id(), 1);
        assert_eq!(registry.max_innovation(), 1);
    }
}
