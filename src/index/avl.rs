//! AVL tree keyed by a floating-point scheduling key.
//!
//! ## Architecture
//!
//! - **Slab**: every node is an arena slot, children are slot keys
//! - **Root**: `Option<usize>` pointing into the slab
//!
//! All structural helpers follow the "replace subtree root, return new root"
//! pattern: they receive the root of a subtree, mutate below it, and hand back
//! whichever slot now sits at the top of that subtree. The caller stores the
//! returned slot in the parent's link.
//!
//! ## Duplicate Keys
//!
//! Keys are not unique. Insertion sends an equal key to the right. After
//! rotations equal keys may sit on either side of each other, so lookups by
//! key find *some* node with that key and range scans descend into both
//! subtrees of an equal node.
//!
//! ## Rebalancing
//!
//! Insertion and deletion use separate rule sets:
//!
//! - After insertion the heavy grandchild is identified by comparing the
//!   inserted key with the child's key (equal keys went right).
//! - After deletion there is no inserted key, so the case is picked from the
//!   sign of the child's balance factor (`>= 0` / `<= 0` for single rotations).
//!
//! ## Example
//!
//! ```
//! use delivery_dispatch::index::BalancedIndex;
//!
//! let mut index: BalancedIndex<u64> = BalancedIndex::with_capacity(16);
//! for (key, id) in [(1.0, 10), (2.0, 20), (3.0, 30)] {
//!     index.insert(key, id);
//! }
//!
//! // Right-right insertion rotated 2.0 to the root
//! assert_eq!(index.height(), 2);
//! assert_eq!(index.remove_by_payload_id(20), Some(20));
//! assert_eq!(index.in_order_traversal(), vec![10, 30]);
//! assert!(index.is_balanced());
//! ```

use std::cmp::max;

use slab::Slab;

use crate::index::{IndexNode, PayloadId};

/// Self-balancing binary search tree over `f64` keys.
///
/// Payloads are small `Copy` handles (order ids in the dispatcher); the data
/// they refer to lives with the caller.
#[derive(Debug, Clone)]
pub struct BalancedIndex<P> {
    /// Arena of tree nodes
    nodes: Slab<IndexNode<P>>,

    /// Slot of the root node, None when empty
    root: Option<usize>,
}

impl<P: PayloadId + Copy> Default for BalancedIndex<P> {
    fn default() -> Self {
        Self::new()
    }
}

impl<P: PayloadId + Copy> BalancedIndex<P> {
    /// Create an empty index
    pub fn new() -> Self {
        Self {
            nodes: Slab::new(),
            root: None,
        }
    }

    /// Create an index with `capacity` pre-allocated node slots
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            nodes: Slab::with_capacity(capacity),
            root: None,
        }
    }

    // ========================================================================
    // Capacity and Size
    // ========================================================================

    /// Number of indexed payloads
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if the index holds nothing
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Pre-allocated node slots
    #[inline]
    pub fn capacity(&self) -> usize {
        self.nodes.capacity()
    }

    /// Height of the whole tree (0 when empty)
    #[inline]
    pub fn height(&self) -> u32 {
        self.height_of(self.root)
    }

    /// Remove every node
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = None;
    }

    // ========================================================================
    // Key-Based Operations
    // ========================================================================

    /// Insert `payload` under `key`
    ///
    /// Equal keys are placed to the right of existing ones.
    pub fn insert(&mut self, key: f64, payload: P) {
        let root = self.insert_at(self.root, key, payload);
        self.root = Some(root);
    }

    /// Remove one node whose key equals `key`
    ///
    /// # Returns
    ///
    /// The payload of the removed node, or None if no node has that key
    pub fn remove(&mut self, key: f64) -> Option<P> {
        let mut removed = None;
        self.root = self.remove_at(self.root, key, &mut removed);
        removed
    }

    /// Move the payload stored under `old_key` to `new_key`
    ///
    /// Only meaningful when `old_key` is currently indexed. When it is not,
    /// nothing changes and `false` is returned.
    pub fn update_key(&mut self, old_key: f64, new_key: f64) -> bool {
        match self.remove(old_key) {
            Some(payload) => {
                self.insert(new_key, payload);
                true
            }
            None => false,
        }
    }

    /// Payload of some node whose key equals `key`
    pub fn get(&self, key: f64) -> Option<P> {
        let mut node = self.root;
        while let Some(slot) = node {
            let current = &self.nodes[slot];
            if key < current.key {
                node = current.left;
            } else if key > current.key {
                node = current.right;
            } else {
                return Some(current.payload);
            }
        }
        None
    }

    /// Check if any node has exactly `key`
    #[inline]
    pub fn contains_key(&self, key: f64) -> bool {
        self.get(key).is_some()
    }

    /// Payload with the smallest key strictly greater than `value`
    ///
    /// A node whose key equals `value` is *not* a match: the comparison is
    /// `>`, not `>=`.
    ///
    /// ```
    /// use delivery_dispatch::index::BalancedIndex;
    ///
    /// let mut index: BalancedIndex<u64> = BalancedIndex::new();
    /// index.insert(5.0, 1);
    /// index.insert(10.0, 2);
    ///
    /// assert_eq!(index.find_predecessor(4.0), Some(1));
    /// assert_eq!(index.find_predecessor(5.0), Some(2));
    /// assert_eq!(index.find_predecessor(10.0), None);
    /// ```
    pub fn find_predecessor(&self, value: f64) -> Option<P> {
        let mut node = self.root;
        let mut candidate = None;
        while let Some(slot) = node {
            let current = &self.nodes[slot];
            if current.key > value {
                candidate = Some(slot);
                node = current.left;
            } else {
                node = current.right;
            }
        }
        candidate.map(|slot| self.nodes[slot].payload)
    }

    // ========================================================================
    // Payload-Id Operations
    // ========================================================================

    /// Remove the node holding the payload with id `id`
    ///
    /// Does not look at keys at all. The whole tree is scanned in post-order,
    /// so this is O(n). Use it when the key stored in the tree may differ
    /// from the caller's current value for that payload.
    ///
    /// # Returns
    ///
    /// The removed payload, or None if no payload has that id
    pub fn remove_by_payload_id(&mut self, id: P::Id) -> Option<P> {
        let mut removed = None;
        self.root = self.remove_id_at(self.root, id, &mut removed);
        removed
    }

    /// Key currently indexing the payload with id `id` (O(n) scan)
    pub fn find_by_payload_id(&self, id: P::Id) -> Option<f64> {
        let mut stack: Vec<usize> = self.root.into_iter().collect();
        while let Some(slot) = stack.pop() {
            let node = &self.nodes[slot];
            if node.payload.payload_id() == id {
                return Some(node.key);
            }
            stack.extend(node.left);
            stack.extend(node.right);
        }
        None
    }

    // ========================================================================
    // Bulk Access
    // ========================================================================

    /// All payloads in ascending key order
    pub fn in_order_traversal(&self) -> Vec<P> {
        let mut out = Vec::with_capacity(self.len());
        self.collect_in_order(self.root, &mut out);
        out
    }

    /// Payloads with `lo <= key <= hi`, ascending
    ///
    /// Subtrees entirely outside the bounds are skipped.
    pub fn range(&self, lo: f64, hi: f64) -> Vec<P> {
        let mut out = Vec::new();
        if lo <= hi {
            self.collect_range(self.root, lo, hi, &mut out);
        }
        out
    }

    /// Replace the whole tree with a minimal-height tree over `items`
    ///
    /// `items` must already be sorted ascending by `key_fn`. The middle
    /// element becomes the root and each half is built the same way, giving
    /// a height of `ceil(log2(n + 1))`.
    pub fn rebuild_from_sorted<F>(&mut self, items: &[P], key_fn: F)
    where
        F: Fn(&P) -> f64,
    {
        debug_assert!(
            items.windows(2).all(|w| key_fn(&w[0]) <= key_fn(&w[1])),
            "rebuild_from_sorted requires ascending input"
        );
        self.clear();
        self.root = self.build_balanced(items, &key_fn);
    }

    /// Verify the BST order, the stored heights and the AVL balance of
    /// every node
    pub fn is_balanced(&self) -> bool {
        self.check_subtree(self.root, f64::NEG_INFINITY, f64::INFINITY)
            .is_some()
    }

    // ========================================================================
    // Height and Rotation Helpers
    // ========================================================================

    #[inline]
    fn height_of(&self, node: Option<usize>) -> u32 {
        node.map_or(0, |slot| self.nodes[slot].height)
    }

    #[inline]
    fn update_height(&mut self, slot: usize) {
        let node = &self.nodes[slot];
        let height = 1 + max(self.height_of(node.left), self.height_of(node.right));
        self.nodes[slot].height = height;
    }

    /// Left height minus right height (0 for an empty subtree)
    #[inline]
    fn balance_of(&self, node: Option<usize>) -> i64 {
        match node {
            Some(slot) => {
                let node = &self.nodes[slot];
                i64::from(self.height_of(node.left)) - i64::from(self.height_of(node.right))
            }
            None => 0,
        }
    }

    fn rotate_right(&mut self, y: usize) -> usize {
        let left = self.nodes[y].left;
        debug_assert!(left.is_some(), "right rotation at slot {y} without a left child");
        let Some(x) = left else {
            return y;
        };
        let t2 = self.nodes[x].right;

        self.nodes[x].right = Some(y);
        self.nodes[y].left = t2;

        self.update_height(y);
        self.update_height(x);
        x
    }

    fn rotate_left(&mut self, x: usize) -> usize {
        let right = self.nodes[x].right;
        debug_assert!(right.is_some(), "left rotation at slot {x} without a right child");
        let Some(y) = right else {
            return x;
        };
        let t2 = self.nodes[y].left;

        self.nodes[y].left = Some(x);
        self.nodes[x].right = t2;

        self.update_height(x);
        self.update_height(y);
        y
    }

    // ========================================================================
    // Insertion
    // ========================================================================

    fn insert_at(&mut self, node: Option<usize>, key: f64, payload: P) -> usize {
        let Some(slot) = node else {
            return self.nodes.insert(IndexNode::new(key, payload));
        };

        if key < self.nodes[slot].key {
            let left = self.insert_at(self.nodes[slot].left, key, payload);
            self.nodes[slot].left = Some(left);
        } else {
            let right = self.insert_at(self.nodes[slot].right, key, payload);
            self.nodes[slot].right = Some(right);
        }

        self.update_height(slot);
        self.rebalance_after_insert(slot, key)
    }

    fn rebalance_after_insert(&mut self, slot: usize, key: f64) -> usize {
        let balance = self.balance_of(Some(slot));

        if balance > 1 {
            if let Some(left) = self.nodes[slot].left {
                if key < self.nodes[left].key {
                    // Left-left
                    return self.rotate_right(slot);
                }
                // Left-right
                let left = self.rotate_left(left);
                self.nodes[slot].left = Some(left);
                return self.rotate_right(slot);
            }
        }

        if balance < -1 {
            if let Some(right) = self.nodes[slot].right {
                if key >= self.nodes[right].key {
                    // Right-right
                    return self.rotate_left(slot);
                }
                // Right-left
                let right = self.rotate_right(right);
                self.nodes[slot].right = Some(right);
                return self.rotate_left(slot);
            }
        }

        slot
    }

    // ========================================================================
    // Deletion
    // ========================================================================

    fn remove_at(&mut self, node: Option<usize>, key: f64, removed: &mut Option<P>) -> Option<usize> {
        let slot = node?;

        if key < self.nodes[slot].key {
            let left = self.remove_at(self.nodes[slot].left, key, removed);
            self.nodes[slot].left = left;
        } else if key > self.nodes[slot].key {
            let right = self.remove_at(self.nodes[slot].right, key, removed);
            self.nodes[slot].right = right;
        } else {
            *removed = Some(self.nodes[slot].payload);
            return self.unlink(slot);
        }

        self.update_height(slot);
        Some(self.rebalance(slot))
    }

    fn remove_id_at(
        &mut self,
        node: Option<usize>,
        id: P::Id,
        removed: &mut Option<P>,
    ) -> Option<usize> {
        let slot = node?;

        // Post-order: children first, stop descending once found
        let left = self.remove_id_at(self.nodes[slot].left, id, removed);
        self.nodes[slot].left = left;
        if removed.is_none() {
            let right = self.remove_id_at(self.nodes[slot].right, id, removed);
            self.nodes[slot].right = right;
        }

        if removed.is_none() && self.nodes[slot].payload.payload_id() == id {
            *removed = Some(self.nodes[slot].payload);
            return self.unlink(slot);
        }

        self.update_height(slot);
        Some(self.rebalance(slot))
    }

    /// Delete `slot` from its subtree and return the subtree's new root
    ///
    /// With two children the in-order successor's key and payload move into
    /// `slot` and the successor is deleted from the right subtree.
    fn unlink(&mut self, slot: usize) -> Option<usize> {
        let (left, right) = (self.nodes[slot].left, self.nodes[slot].right);

        match (left, right) {
            (None, child) | (child, None) => {
                self.nodes.remove(slot);
                child
            }
            (Some(_), Some(right)) => {
                let (right, key, payload) = self.take_min(right);
                let node = &mut self.nodes[slot];
                node.key = key;
                node.payload = payload;
                node.right = right;

                self.update_height(slot);
                Some(self.rebalance(slot))
            }
        }
    }

    /// Detach the minimum of the subtree at `slot`
    ///
    /// # Returns
    ///
    /// `(new subtree root, key, payload)` of the detached minimum
    fn take_min(&mut self, slot: usize) -> (Option<usize>, f64, P) {
        match self.nodes[slot].left {
            None => {
                let node = self.nodes.remove(slot);
                (node.right, node.key, node.payload)
            }
            Some(left) => {
                let (left, key, payload) = self.take_min(left);
                self.nodes[slot].left = left;
                self.update_height(slot);
                (Some(self.rebalance(slot)), key, payload)
            }
        }
    }

    /// Deletion rebalancing, driven by the child's balance factor
    fn rebalance(&mut self, slot: usize) -> usize {
        let balance = self.balance_of(Some(slot));

        if balance > 1 {
            let left = self.nodes[slot].left;
            if self.balance_of(left) < 0 {
                if let Some(left) = left {
                    let left = self.rotate_left(left);
                    self.nodes[slot].left = Some(left);
                }
            }
            return self.rotate_right(slot);
        }

        if balance < -1 {
            let right = self.nodes[slot].right;
            if self.balance_of(right) > 0 {
                if let Some(right) = right {
                    let right = self.rotate_right(right);
                    self.nodes[slot].right = Some(right);
                }
            }
            return self.rotate_left(slot);
        }

        slot
    }

    // ========================================================================
    // Traversal and Rebuild
    // ========================================================================

    fn collect_in_order(&self, node: Option<usize>, out: &mut Vec<P>) {
        if let Some(slot) = node {
            let node = &self.nodes[slot];
            self.collect_in_order(node.left, out);
            out.push(node.payload);
            self.collect_in_order(node.right, out);
        }
    }

    fn collect_range(&self, node: Option<usize>, lo: f64, hi: f64, out: &mut Vec<P>) {
        let Some(slot) = node else {
            return;
        };
        let node = &self.nodes[slot];

        if node.key >= lo {
            self.collect_range(node.left, lo, hi, out);
        }
        if node.key >= lo && node.key <= hi {
            out.push(node.payload);
        }
        if node.key <= hi {
            self.collect_range(node.right, lo, hi, out);
        }
    }

    fn build_balanced<F>(&mut self, items: &[P], key_fn: &F) -> Option<usize>
    where
        F: Fn(&P) -> f64,
    {
        if items.is_empty() {
            return None;
        }

        let mid = (items.len() - 1) / 2;
        let payload = items[mid];
        let slot = self.nodes.insert(IndexNode::new(key_fn(&payload), payload));

        let left = self.build_balanced(&items[..mid], key_fn);
        let right = self.build_balanced(&items[mid + 1..], key_fn);
        self.nodes[slot].left = left;
        self.nodes[slot].right = right;
        self.update_height(slot);

        Some(slot)
    }

    /// Returns the subtree height when every node in it is valid
    fn check_subtree(&self, node: Option<usize>, lo: f64, hi: f64) -> Option<u32> {
        let Some(slot) = node else {
            return Some(0);
        };
        let node = &self.nodes[slot];
        if node.key < lo || node.key > hi {
            return None;
        }

        let left = self.check_subtree(node.left, lo, node.key)?;
        let right = self.check_subtree(node.right, node.key, hi)?;
        let height = 1 + max(left, right);

        if left.abs_diff(right) > 1 || height != node.height {
            return None;
        }
        Some(height)
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
