//! Dynamic bounding-volume hierarchy
//!
//! Based on Game Engine Architecture 3rd Edition, Section 13.3.2 (broad
//! phase) and the incremental insertion scheme popularised by Box2D's
//! dynamic tree.
//!
//! Nodes live in a [`SlotMap`] arena and reference each other through
//! [`NodeId`] keys, so a removed node can never be reached through a stale
//! link. Alongside the tree the container keeps a flat list of leaves in
//! insertion order; sibling selection and object lookup scan that list, which
//! keeps tie-breaking reproducible.

use slotmap::{new_key_type, SlotMap};

use crate::physics::collision::AABB;

new_key_type! {
    /// Stable handle to a node of a [`DynamicBvh`]
    pub struct NodeId;
}

#[derive(Debug, Clone)]
enum NodeKind<T> {
    Leaf(T),
    Internal { left: NodeId, right: NodeId },
}

#[derive(Debug, Clone)]
struct BvhNode<T> {
    bound: AABB,
    parent: Option<NodeId>,
    kind: NodeKind<T>,
}

impl<T> BvhNode<T> {
    fn children(&self) -> Option<(NodeId, NodeId)> {
        match self.kind {
            NodeKind::Internal { left, right } => Some((left, right)),
            NodeKind::Leaf(_) => None,
        }
    }
}

/// Incremental binary BVH over objects of type `T`
///
/// Every internal node has exactly two children and, once a mutation has
/// finished, a bound equal to the union of its children's bounds.
#[derive(Debug, Clone)]
pub struct DynamicBvh<T> {
    nodes: SlotMap<NodeId, BvhNode<T>>,
    root: Option<NodeId>,
    leaves: Vec<NodeId>,
}

impl<T: Copy + PartialEq> DynamicBvh<T> {
    /// Create an empty tree
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            root: None,
            leaves: Vec::new(),
        }
    }

    /// Insert `object` with `bound` and return its leaf.
    ///
    /// The sibling is the existing leaf with the lowest surface-area cost:
    /// the area of the union with the new bound plus the area growth of every
    /// ancestor of the candidate.
    pub fn insert(&mut self, object: T, bound: AABB) -> NodeId {
        let leaf = self.nodes.insert(BvhNode {
            bound,
            parent: None,
            kind: NodeKind::Leaf(object),
        });

        let Some(root) = self.root else {
            self.root = Some(leaf);
            self.leaves.push(leaf);
            return leaf;
        };

        let sibling = self.best_sibling(&bound).unwrap_or(root);
        self.leaves.push(leaf);

        let old_parent = self.nodes[sibling].parent;
        let parent = self.nodes.insert(BvhNode {
            bound: self.nodes[sibling].bound.union(&bound),
            parent: old_parent,
            kind: NodeKind::Internal { left: sibling, right: leaf },
        });
        self.nodes[sibling].parent = Some(parent);
        self.nodes[leaf].parent = Some(parent);

        match old_parent {
            Some(grandparent) => self.replace_child(grandparent, sibling, parent),
            None => self.root = Some(parent),
        }

        log::trace!(
            "BVH insert: paired new leaf with sibling {:?} ({} leaves)",
            sibling,
            self.leaves.len()
        );

        self.refit_from(old_parent);
        debug_assert!(self.validate(), "BVH invariant broken by insert");
        leaf
    }

    /// Remove a leaf and return the object it held.
    ///
    /// Stale or internal ids are ignored.
    pub fn remove(&mut self, leaf: NodeId) -> Option<T> {
        let object = match self.nodes.get(leaf).map(|n| &n.kind) {
            Some(NodeKind::Leaf(object)) => *object,
            _ => return None,
        };

        if let Some(index) = self.leaves.iter().position(|&l| l == leaf) {
            self.leaves.remove(index);
        }

        let parent = self.nodes[leaf].parent;
        self.nodes.remove(leaf);

        let Some(parent) = parent else {
            self.root = None;
            return Some(object);
        };

        let sibling = match self.nodes[parent].children() {
            Some((left, right)) => if left == leaf { right } else { left },
            None => {
                debug_assert!(false, "BVH leaf parent is not an internal node");
                return Some(object);
            }
        };

        let grandparent = self.nodes[parent].parent;
        self.nodes.remove(parent);
        self.nodes[sibling].parent = grandparent;

        match grandparent {
            Some(grandparent) => {
                self.replace_child(grandparent, parent, sibling);
                self.refit_from(Some(grandparent));
            }
            None => self.root = Some(sibling),
        }

        debug_assert!(self.validate(), "BVH invariant broken by remove");
        Some(object)
    }

    /// Move `object` to `bound`, inserting it when it has no leaf yet.
    ///
    /// When the old and new bounds nest inside one another the leaf is updated
    /// in place and only its ancestors are refitted; otherwise the leaf is
    /// removed and re-inserted.
    pub fn update(&mut self, object: T, bound: AABB) -> NodeId {
        let Some(leaf) = self.find_leaf(object) else {
            return self.insert(object, bound);
        };

        let old = self.nodes[leaf].bound;
        if old.contains(&bound) || bound.contains(&old) {
            self.nodes[leaf].bound = bound;
            let parent = self.nodes[leaf].parent;
            self.refit_from(parent);
            return leaf;
        }

        self.remove(leaf);
        self.insert(object, bound)
    }

    /// Leaf holding `object`, if any
    pub fn find_leaf(&self, object: T) -> Option<NodeId> {
        self.leaves.iter().copied().find(|&leaf| {
            matches!(self.nodes.get(leaf).map(|n| &n.kind), Some(NodeKind::Leaf(o)) if *o == object)
        })
    }

    /// Append every object whose leaf bound intersects `bound` to `out`
    pub fn query(&self, bound: &AABB, out: &mut Vec<T>) {
        let Some(root) = self.root else { return };

        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            if !node.bound.intersects(bound) {
                continue;
            }
            match node.kind {
                NodeKind::Leaf(object) => out.push(object),
                NodeKind::Internal { left, right } => {
                    stack.push(left);
                    stack.push(right);
                }
            }
        }
    }

    /// Append every pair of objects whose leaf bounds intersect to `out`.
    ///
    /// Each unordered pair appears exactly once: a pair of leaves is only
    /// reached through the two children of their lowest common ancestor.
    pub fn collect_pairs(&self, out: &mut Vec<(T, T)>) {
        let Some(root) = self.root else { return };
        if self.nodes[root].children().is_none() {
            return;
        }

        let mut pairs: Vec<(NodeId, NodeId)> = Vec::new();
        let mut internals = vec![root];

        // Each internal node contributes the pair of its own children
        while let Some(id) = internals.pop() {
            if let Some((left, right)) = self.nodes[id].children() {
                pairs.push((left, right));
                internals.push(left);
                internals.push(right);
            }
        }

        while let Some((a, b)) = pairs.pop() {
            let (node_a, node_b) = (&self.nodes[a], &self.nodes[b]);
            if !node_a.bound.intersects(&node_b.bound) {
                continue;
            }

            match (&node_a.kind, &node_b.kind) {
                (NodeKind::Leaf(oa), NodeKind::Leaf(ob)) => out.push((*oa, *ob)),
                (NodeKind::Leaf(_), NodeKind::Internal { left, right }) => {
                    pairs.push((a, *left));
                    pairs.push((a, *right));
                }
                (NodeKind::Internal { left, right }, NodeKind::Leaf(_)) => {
                    pairs.push((*left, b));
                    pairs.push((*right, b));
                }
                (
                    NodeKind::Internal { left: al, right: ar },
                    NodeKind::Internal { left: bl, right: br },
                ) => {
                    pairs.push((*al, *bl));
                    pairs.push((*al, *br));
                    pairs.push((*ar, *bl));
                    pairs.push((*ar, *br));
                }
            }
        }
    }

    /// Bound currently stored for a node
    pub fn bound(&self, id: NodeId) -> Option<AABB> {
        self.nodes.get(id).map(|n| n.bound)
    }

    /// Object stored in a leaf
    pub fn object(&self, leaf: NodeId) -> Option<T> {
        match self.nodes.get(leaf).map(|n| &n.kind) {
            Some(NodeKind::Leaf(object)) => Some(*object),
            _ => None,
        }
    }

    /// Objects in leaf insertion order
    pub fn objects(&self) -> impl Iterator<Item = T> + '_ {
        self.leaves.iter().filter_map(|&leaf| self.object(leaf))
    }

    /// Bound of the whole tree
    pub fn root_bound(&self) -> Option<AABB> {
        self.root.map(|root| self.nodes[root].bound)
    }

    /// Number of leaves
    pub fn leaf_count(&self) -> usize {
        self.leaves.len()
    }

    /// Number of internal nodes (`leaf_count - 1` for a non-empty tree)
    pub fn internal_count(&self) -> usize {
        self.nodes.len() - self.leaves.len()
    }

    /// Whether the tree holds no leaves
    pub fn is_empty(&self) -> bool {
        self.root.is_none()
    }

    /// Number of nodes on the longest root-to-leaf path (0 when empty)
    pub fn height(&self) -> usize {
        let Some(root) = self.root else { return 0 };

        let mut max_depth = 0;
        let mut stack = vec![(root, 1)];
        while let Some((id, depth)) = stack.pop() {
            max_depth = max_depth.max(depth);
            if let Some((left, right)) = self.nodes[id].children() {
                stack.push((left, depth + 1));
                stack.push((right, depth + 1));
            }
        }
        max_depth
    }

    /// Drop every node
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.leaves.clear();
        self.root = None;
    }

    /// Check the structural invariants of the tree.
    ///
    /// Parent and child links agree, every internal bound equals the union of
    /// its children, and the leaf list holds exactly the reachable leaves.
    pub fn validate(&self) -> bool {
        let Some(root) = self.root else {
            return self.nodes.is_empty() && self.leaves.is_empty();
        };
        if self.nodes.get(root).map_or(true, |n| n.parent.is_some()) {
            return false;
        }

        let mut reachable_leaves = 0;
        let mut reachable_nodes = 0;
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            reachable_nodes += 1;
            let node = &self.nodes[id];
            match node.kind {
                NodeKind::Leaf(_) => reachable_leaves += 1,
                NodeKind::Internal { left, right } => {
                    let (Some(l), Some(r)) = (self.nodes.get(left), self.nodes.get(right)) else {
                        return false;
                    };
                    if l.parent != Some(id) || r.parent != Some(id) {
                        return false;
                    }
                    if node.bound != l.bound.union(&r.bound) {
                        return false;
                    }
                    stack.push(left);
                    stack.push(right);
                }
            }
        }

        reachable_nodes == self.nodes.len()
            && reachable_leaves == self.leaves.len()
            && self.leaves.iter().all(|&leaf| self.object(leaf).is_some())
    }

    fn best_sibling(&self, bound: &AABB) -> Option<NodeId> {
        let mut best: Option<(NodeId, f32)> = None;

        for &candidate in &self.leaves {
            let node = &self.nodes[candidate];
            let mut cost = node.bound.union(bound).surface_area();

            let mut ancestor = node.parent;
            while let Some(id) = ancestor {
                let a = &self.nodes[id];
                cost += a.bound.union(bound).surface_area() - a.bound.surface_area();
                ancestor = a.parent;
            }

            if best.map_or(true, |(_, best_cost)| cost < best_cost) {
                best = Some((candidate, cost));
            }
        }

        best.map(|(id, _)| id)
    }

    fn replace_child(&mut self, parent: NodeId, old: NodeId, new: NodeId) {
        if let NodeKind::Internal { left, right } = &mut self.nodes[parent].kind {
            if *left == old {
                *left = new;
            } else if *right == old {
                *right = new;
            } else {
                debug_assert!(false, "BVH node is not a child of its parent");
            }
        }
    }

    fn refit_from(&mut self, start: Option<NodeId>) {
        let mut current = start;
        while let Some(id) = current {
            if let Some((left, right)) = self.nodes[id].children() {
                self.nodes[id].bound = self.nodes[left].bound.union(&self.nodes[right].bound);
            }
            current = self.nodes[id].parent;
        }
    }
}

impl<T: Copy + PartialEq> Default for DynamicBvh<T> {
    fn default() -> Self {
        Self::new()
    }
}
