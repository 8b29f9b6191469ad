//! Bump allocator for [`Node`]s.

use crate::node::{Node, NodeId};

/// Batch-growth hint: nodes are reserved in chunks this size rather than one
/// at a time, keeping allocation batches cache-sized.
const SLAB_SIZE: usize = 100;

/// Owns every [`Node`] produced while scanning a document.
///
/// Indices handed out by [`Arena::alloc`] are stable for the life of the
/// arena; there is no per-node free, only bulk teardown when the arena itself
/// is dropped.
#[derive(Debug, Default)]
pub struct Arena {
    nodes: Vec<Node>,
}

impl Arena {
    pub fn new() -> Self {
        Arena { nodes: Vec::new() }
    }

    /// Push a node and return the id it was stored under.
    pub fn alloc(&mut self, node: Node) -> NodeId {
        if self.nodes.len() == self.nodes.capacity() {
            self.nodes.reserve(SLAB_SIZE);
        }
        let id = NodeId::new(self.nodes.len() as u32);
        self.nodes.push(node);
        id
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.index()]
    }

    pub fn get_mut(&mut self, id: NodeId) -> &mut Node {
        &mut self.nodes[id.index()]
    }

    /// Number of nodes allocated so far. Every scalar and every container is
    /// one node, so this doubles as the document's token count.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
