//! Arena storage shared by both octree flavours.
//!
//! Nodes live in a [`Pool`] and refer to each other by [`NodeId`]. Ownership
//! follows the tree: a node is released by whoever holds its id in a child
//! slot. The per-depth [`LevelRegistry`] is an intrusive doubly linked list
//! threaded through the nodes themselves and never owns anything.

use super::MAX_DEPTH;

pub type NodeId = u32;

#[derive(Debug, Default)]
pub struct Pool<T> {
    nodes: Vec<T>,
    live: usize,
}

impl<T: Default> Pool<T> {
    pub fn create(&mut self) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(T::default());
        self.live += 1;
        id as NodeId
    }

    #[inline]
    pub fn get(&self, id: NodeId) -> &T {
        &self.nodes[id as usize]
    }

    #[inline]
    pub fn get_mut(&mut self, id: NodeId) -> &mut T {
        &mut self.nodes[id as usize]
    }

    /// Takes the node out of the arena, leaving a vacant default in its slot.
    pub fn release(&mut self, id: NodeId) -> T {
        self.live -= 1;
        std::mem::take(&mut self.nodes[id as usize])
    }

    /// Number of created nodes not yet released.
    #[inline]
    pub fn live(&self) -> usize {
        self.live
    }
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Links {
    pub prev: Option<NodeId>,
    pub next: Option<NodeId>,
}

/// Nodes that can be threaded into a [`LevelRegistry`].
pub trait Linked {
    fn links(&self) -> &Links;
    fn links_mut(&mut self) -> &mut Links;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Level {
    head: Option<NodeId>,
    len: usize,
}

impl Level {
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

/// One linked list of nodes per tree depth (1..=8). Depth 0 is the root and
/// is never registered.
#[derive(Debug, Default)]
pub struct LevelRegistry {
    levels: [Level; MAX_DEPTH as usize + 1],
}

impl LevelRegistry {
    #[inline]
    pub fn level(&self, depth: u8) -> &Level {
        &self.levels[depth as usize]
    }

    /// Links `id` at the head of its depth list.
    pub fn push<T: Linked + Default>(&mut self, pool: &mut Pool<T>, depth: u8, id: NodeId) {
        let level = &mut self.levels[depth as usize];
        let head = level.head;
        *pool.get_mut(id).links_mut() = Links {
            prev: None,
            next: head,
        };
        if let Some(head) = head {
            pool.get_mut(head).links_mut().prev = Some(id);
        }
        level.head = Some(id);
        level.len += 1;
    }

    pub fn unlink<T: Linked + Default>(&mut self, pool: &mut Pool<T>, depth: u8, id: NodeId) {
        let level = &mut self.levels[depth as usize];
        let Links { prev, next } = std::mem::take(pool.get_mut(id).links_mut());
        match prev {
            Some(prev) => pool.get_mut(prev).links_mut().next = next,
            None => level.head = next,
        }
        if let Some(next) = next {
            pool.get_mut(next).links_mut().prev = prev;
        }
        level.len -= 1;
    }

    /// Walks the list of one depth in registry order.
    pub fn iter<'a, T: Linked + Default>(
        &self,
        pool: &'a Pool<T>,
        depth: u8,
    ) -> impl Iterator<Item = NodeId> + 'a {
        let mut cursor = self.levels[depth as usize].head;
        std::iter::from_fn(move || {
            let id = cursor?;
            cursor = pool.get(id).links().next;
            Some(id)
        })
    }
}
