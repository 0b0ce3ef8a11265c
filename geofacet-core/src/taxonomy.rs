//! Taxonomy forests built from flat hierarchical bucket keys.
//!
//! A bucket key such as `"Alps > Mont Blanc > North Face"` is split on the
//! literal [`HIERARCHY_DELIMITER`] and walked from the root, creating nodes
//! as needed. Segments are kept verbatim, so joining a node's segments
//! reproduces the bucket key exactly and a taxonomy filter on that path
//! selects the same items the node counts. Nodes live in an arena indexed by [`NodeId`]; a parent is always
//! created before its children, so every child id is larger than its
//! parent's. Rollups therefore run as a single reverse sweep over the arena
//! and no traversal depends on call-stack depth. Paths are not stored; they
//! are rebuilt from the parent chain on demand.
//!
//! Invariant after [`TaxonomyForest::build`]:
//! `doc_count(n) == self_count(n) + Σ doc_count(child)` for every node.

use crate::aggregation::Bucket;
use serde::Serialize;
use std::collections::HashMap;

/// Segment separator in taxonomy paths
pub const HIERARCHY_DELIMITER: &str = " > ";

pub type NodeId = usize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaxonomyNode {
    pub id: NodeId,
    /// Last path segment
    pub key: String,
    pub depth: usize,
    pub parent: Option<NodeId>,
    /// Children in first-seen order
    pub children: Vec<NodeId>,
    /// Items whose value is exactly this path
    pub self_count: usize,
    /// Items at this path or below it
    pub doc_count: usize,
    child_index: HashMap<String, NodeId>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaxonomyForest {
    nodes: Vec<TaxonomyNode>,
    roots: Vec<NodeId>,
    root_index: HashMap<String, NodeId>,
}

/// Split a path on the literal delimiter; segments keep their whitespace
pub fn split_path(path: &str) -> Vec<&str> {
    path.split(HIERARCHY_DELIMITER).collect()
}

/// Build a forest from a facet's bucket list
pub fn build_taxonomy(buckets: &[Bucket]) -> TaxonomyForest {
    TaxonomyForest::build(buckets)
}

impl TaxonomyForest {
    pub fn build(buckets: &[Bucket]) -> Self {
        let mut forest = Self::default();

        for bucket in buckets {
            let segments = split_path(&bucket.key);
            let mut parent: Option<NodeId> = None;

            for segment in &segments {
                parent = Some(forest.child_or_insert(parent, segment));
            }

            if let Some(terminal) = parent {
                forest.nodes[terminal].self_count += bucket.doc_count;
            }
        }

        forest.roll_up();
        forest
    }

    fn child_or_insert(&mut self, parent: Option<NodeId>, segment: &str) -> NodeId {
        let existing = match parent {
            Some(p) => self.nodes[p].child_index.get(segment),
            None => self.root_index.get(segment),
        };
        if let Some(&id) = existing {
            return id;
        }

        let id = self.nodes.len();
        let depth = parent.map_or(0, |p| self.nodes[p].depth + 1);

        self.nodes.push(TaxonomyNode {
            id,
            key: segment.to_string(),
            depth,
            parent,
            children: Vec::new(),
            self_count: 0,
            doc_count: 0,
            child_index: HashMap::new(),
        });

        match parent {
            Some(p) => {
                let parent_node = &mut self.nodes[p];
                parent_node.children.push(id);
                parent_node.child_index.insert(segment.to_string(), id);
            }
            None => {
                self.roots.push(id);
                self.root_index.insert(segment.to_string(), id);
            }
        }

        id
    }

    /// Children always follow their parent in the arena, so a reverse
    /// sweep visits every node after all of its descendants
    fn roll_up(&mut self) {
        for node in self.nodes.iter_mut() {
            node.doc_count = node.self_count;
        }
        for id in (0..self.nodes.len()).rev() {
            if let Some(parent) = self.nodes[id].parent {
                let count = self.nodes[id].doc_count;
                self.nodes[parent].doc_count += count;
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn roots(&self) -> impl Iterator<Item = &TaxonomyNode> {
        self.roots.iter().map(|&id| &self.nodes[id])
    }

    pub fn node(&self, id: NodeId) -> Option<&TaxonomyNode> {
        self.nodes.get(id)
    }

    pub fn children(&self, id: NodeId) -> impl Iterator<Item = &TaxonomyNode> {
        self.nodes
            .get(id)
            .map(|node| node.children.as_slice())
            .unwrap_or_default()
            .iter()
            .map(|&child| &self.nodes[child])
    }

    /// Look up a direct child by segment
    pub fn child(&self, id: NodeId, segment: &str) -> Option<&TaxonomyNode> {
        let child = *self.nodes.get(id)?.child_index.get(segment)?;
        self.nodes.get(child)
    }

    /// Look up a node by its full path
    pub fn find(&self, path: &str) -> Option<&TaxonomyNode> {
        let segments = split_path(path);
        let (first, rest) = segments.split_first()?;

        let mut id = *self.root_index.get(*first)?;
        for segment in rest {
            id = *self.nodes[id].child_index.get(*segment)?;
        }
        self.nodes.get(id)
    }

    /// Full path of a node, rebuilt from its ancestors
    pub fn path(&self, id: NodeId) -> Option<String> {
        let mut segments = Vec::new();
        let mut current = Some(id);
        while let Some(id) = current {
            let node = self.nodes.get(id)?;
            segments.push(node.key.as_str());
            current = node.parent;
        }
        segments.reverse();
        Some(segments.join(HIERARCHY_DELIMITER))
    }

    /// Pre-order walk, children in first-seen order, using an explicit stack
    pub fn depth_first(&self) -> Vec<&TaxonomyNode> {
        let mut ordered = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<NodeId> = self.roots.iter().rev().copied().collect();

        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            ordered.push(node);
            stack.extend(node.children.iter().rev().copied());
        }

        ordered
    }

    /// Flat pre-order listing; nesting is carried by `parent` ids
    pub fn entries(&self) -> Vec<TaxonomyEntry<'_>> {
        self.depth_first()
            .into_iter()
            .map(|node| TaxonomyEntry {
                id: node.id,
                key: &node.key,
                depth: node.depth,
                parent: node.parent,
                self_count: node.self_count,
                doc_count: node.doc_count,
            })
            .collect()
    }
}

/// One node as it is serialized
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaxonomyEntry<'a> {
    pub id: NodeId,
    pub key: &'a str,
    pub depth: usize,
    pub parent: Option<NodeId>,
    pub self_count: usize,
    pub doc_count: usize,
}

impl Serialize for TaxonomyForest {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.entries())
    }
}
