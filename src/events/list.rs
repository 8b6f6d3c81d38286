//! # Ordered subscription list with a live forward cursor.
//!
//! [`SubscriptionList`] keeps node records sorted by [`SubscriptionId`]. Because ids
//! are handed out monotonically and every insertion appends, the vector order *is*
//! the subscription order, and the position of any id can be found by binary search.
//!
//! ## Dispatch cursor
//! A dispatch pass remembers only the id of the last node it visited. After every
//! delivery the next node is looked up again in the **live** list:
//! ```text
//! nodes:   [1] [2] [4] [7]        cursor = Some(2)
//! claim_after(Some(2)) ─────────► node 4 (first id > 2)
//!
//! handler for 2 removes 4  ─────► claim_after(Some(2)) ─► node 7   (skipped, honored)
//! handler for 4 removes 1  ─────► no effect on the pass           (already visited)
//! handler subscribes 9     ─────► appended at the tail; reached by this pass
//!                                 only if the pass has not finished yet
//! ```
//!
//! ## Rules
//! - Ids are never reused, so a removed-then-readded handler gets a fresh position.
//! - `Mode::Once` nodes are spliced out by `claim_after` before they are delivered.
//! - No snapshot is taken: the list is never cloned for a pass.

use super::node::{Matcher, Mode, Node, SubscriptionId, Target};

/// Ordered collection of subscription nodes owned by one channel.
pub(crate) struct SubscriptionList<E> {
    nodes: Vec<Node<E>>,
    next_id: u64,
}

impl<E> SubscriptionList<E> {
    /// Creates an empty list with room for `capacity` nodes.
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            next_id: 0,
        }
    }

    /// Appends a node at the tail and returns its id.
    pub(crate) fn push(&mut self, target: Target<E>, mode: Mode) -> SubscriptionId {
        let id = SubscriptionId::new(self.next_id);
        self.next_id += 1;
        self.nodes.push(Node { id, target, mode });
        id
    }

    /// Removes the first node (in subscription order) satisfying `m`.
    pub(crate) fn remove_first(&mut self, m: &Matcher) -> Option<SubscriptionId> {
        let idx = self.nodes.iter().position(|n| n.matches(m))?;
        Some(self.nodes.remove(idx).id)
    }

    /// Removes every node satisfying `m` and returns how many were removed.
    pub(crate) fn remove_all(&mut self, m: &Matcher) -> usize {
        let before = self.nodes.len();
        self.nodes.retain(|n| !n.matches(m));
        before - self.nodes.len()
    }

    /// Claims the first node strictly after `cursor` (`None` = from the head).
    ///
    /// Recurring nodes stay in place and their target is cloned out; once nodes
    /// are unlinked and their target is moved out.
    pub(crate) fn claim_after(
        &mut self,
        cursor: Option<SubscriptionId>,
    ) -> Option<(SubscriptionId, Target<E>)> {
        let idx = match cursor {
            None => 0,
            Some(last) => self.nodes.partition_point(|n| n.id <= last),
        };
        let node = self.nodes.get(idx)?;
        match node.mode {
            Mode::Recurring => Some((node.id, node.target.clone())),
            Mode::Once => {
                let node = self.nodes.remove(idx);
                Some((node.id, node.target))
            }
        }
    }

    /// Mode of the node with this id, if it is still linked.
    pub(crate) fn mode_of(&self, id: SubscriptionId) -> Option<Mode> {
        let idx = self.nodes.binary_search_by_key(&id, |n| n.id).ok()?;
        Some(self.nodes[idx].mode)
    }

    /// Drops every node.
    pub(crate) fn clear(&mut self) -> usize {
        let n = self.nodes.len();
        self.nodes.clear();
        n
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.nodes.len()
    }

    #[inline]
    pub(crate) fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
