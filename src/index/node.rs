//! Index node for slab-based tree storage.
//!
//! ## Design
//!
//! `IndexNode` is one slot of a [`BalancedIndex`](crate::index::BalancedIndex)
//! arena. Child links are slab keys (`usize`), not owning pointers, so a
//! rotation only rewrites two or three `Option<usize>` fields.
//!
//! ## Slab Integration
//!
//! Per official slab docs (https://docs.rs/slab/0.4.11):
//! - Keys are `usize` values returned by `slab.insert()`
//! - Keys may be reused after `slab.remove()`
//! - O(1) insert, remove, and lookup

/// Secondary identity carried by an index payload.
///
/// The index orders nodes by their `f64` key, but callers sometimes need to
/// find a node by *what* it holds rather than *where* it sits, for example
/// when the key stored in the tree may no longer match the caller's view of
/// it.
pub trait PayloadId {
    /// Identity type compared by payload lookups
    type Id: PartialEq + Copy;

    /// Identity used by `remove_by_payload_id` and `find_by_payload_id`
    fn payload_id(&self) -> Self::Id;
}

impl PayloadId for u64 {
    type Id = u64;

    #[inline]
    fn payload_id(&self) -> u64 {
        *self
    }
}

/// Tree node stored in the slab.
///
/// ## Memory Layout
///
/// ```text
/// IndexNode {
///     key: f64
///     payload: P
///     height: u32
///     left: Option<usize>
///     right: Option<usize>
/// }
/// ```
#[derive(Debug, Clone)]
pub struct IndexNode<P> {
    /// Scheduling key the tree is ordered by
    pub key: f64,

    /// Opaque payload
    pub payload: P,

    /// Height of the subtree rooted here (a leaf has height 1)
    pub height: u32,

    /// Left child (slab key), keys <= this key
    pub left: Option<usize>,

    /// Right child (slab key), keys >= this key
    pub right: Option<usize>,
}

impl<P> IndexNode<P> {
    /// Create a detached leaf
    ///
    /// # Example
    ///
    /// ```
    /// use delivery_dispatch::index::IndexNode;
    ///
    /// let node = IndexNode::new(0.6, 1u64);
    ///
    /// assert!(node.is_leaf());
    /// assert_eq!(node.height, 1);
    /// ```
    #[inline]
    pub fn new(key: f64, payload: P) -> Self {
        Self {
            key,
            payload,
            height: 1,
            left: None,
            right: None,
        }
    }

    /// Check if this node has no children
    #[inline]
    pub fn is_leaf(&self) -> bool {
        self.left.is_none() && self.right.is_none()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
