use crate::NodeError;
use crate::kind::NodeKind;
use crate::variants::{Node, NodeVariant};
use std::collections::HashSet;
use std::fmt;

/// Index of a node inside its [`NodeArena`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

#[derive(Debug, Clone)]
struct Slot {
    node: Node,
    next: Option<NodeId>,
    prev: Option<NodeId>,
}

/// Owns every node created during a run.
///
/// Lists are chains of ids; a node that is nobody's neighbour is a valid
/// one-element list. Nodes are never freed individually, the arena is
/// dropped as a whole.
///
/// List integrity is the caller's responsibility: inserting a node that is
/// still linked into another list does not detach it, and cycles through
/// `next` are not detected by traversal.
#[derive(Debug, Clone, Default)]
pub struct NodeArena {
    slots: Vec<Slot>,
}

impl NodeArena {
    pub fn new() -> Self {
        Self { slots: Vec::new() }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Stores a fully built node and returns its id. Links start out empty.
    pub fn alloc(&mut self, node: impl Into<Node>) -> NodeId {
        let id = NodeId(self.slots.len() as u32);
        self.slots.push(Slot {
            node: node.into(),
            next: None,
            prev: None,
        });
        id
    }

    /// A fresh node of `kind` with default fields and null links.
    pub fn new_node(&mut self, kind: NodeKind) -> NodeId {
        self.alloc(Node::new(kind))
    }

    /// Like [`NodeArena::new_node`] for names coming from a script.
    pub fn new_node_named(&mut self, name: &str) -> Result<NodeId, NodeError> {
        let kind = NodeKind::from_name(name).ok_or_else(|| NodeError::UnknownKind(name.to_string()))?;
        Ok(self.new_node(kind))
    }

    pub fn node(&self, id: NodeId) -> &Node {
        &self.slots[id.index()].node
    }

    pub fn kind(&self, id: NodeId) -> NodeKind {
        self.node(id).kind()
    }

    /// Downcasts to a concrete variant.
    pub fn get<T: NodeVariant>(&self, id: NodeId) -> Result<&T, NodeError> {
        let node = self.node(id);
        T::from_node(node).ok_or(NodeError::TypeMismatch {
            expected: T::KIND,
            found: node.kind(),
        })
    }

    pub fn get_mut<T: NodeVariant>(&mut self, id: NodeId) -> Result<&mut T, NodeError> {
        let node = &mut self.slots[id.index()].node;
        let found = node.kind();
        T::from_node_mut(node).ok_or(NodeError::TypeMismatch {
            expected: T::KIND,
            found,
        })
    }

    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        self.slots[id.index()].next
    }

    pub fn prev(&self, id: NodeId) -> Option<NodeId> {
        self.slots[id.index()].prev
    }

    /// Rewrites only this node's `next` link.
    pub fn set_next(&mut self, id: NodeId, next: Option<NodeId>) {
        self.slots[id.index()].next = next;
    }

    /// Rewrites only this node's `prev` link.
    pub fn set_prev(&mut self, id: NodeId, prev: Option<NodeId>) {
        self.slots[id.index()].prev = prev;
    }

    /// Forward traversal starting at `head`.
    pub fn iter(&self, head: Option<NodeId>) -> ListIter<'_> {
        ListIter {
            arena: self,
            current: head,
        }
    }

    pub fn tail(&self, head: NodeId) -> NodeId {
        let mut cur = head;
        while let Some(next) = self.next(cur) {
            cur = next;
        }
        cur
    }

    /// Splices `insert` right after `current` and returns the head of the
    /// resulting list.
    ///
    /// With no `head` the result is the one-element list `insert`. With no
    /// `current` the node is put in front and becomes the new head.
    pub fn insert_after(&mut self, head: Option<NodeId>, current: Option<NodeId>, insert: NodeId) -> NodeId {
        let Some(head) = head else {
            self.set_prev(insert, None);
            self.set_next(insert, None);
            return insert;
        };
        let Some(current) = current else {
            self.set_prev(insert, None);
            self.set_next(insert, Some(head));
            self.set_prev(head, Some(insert));
            return insert;
        };

        let old_next = self.next(current);
        self.set_next(current, Some(insert));
        self.set_prev(insert, Some(current));
        self.set_next(insert, old_next);
        if let Some(old_next) = old_next {
            self.set_prev(old_next, Some(insert));
        }
        head
    }

    /// Splices `insert` right before `current` and returns the head of the
    /// resulting list.
    ///
    /// When `current` is the head, `insert` becomes the new head. With no
    /// `current` the node is appended after the tail.
    pub fn insert_before(&mut self, head: Option<NodeId>, current: Option<NodeId>, insert: NodeId) -> NodeId {
        let Some(head) = head else {
            self.set_prev(insert, None);
            self.set_next(insert, None);
            return insert;
        };
        let Some(current) = current else {
            let tail = self.tail(head);
            return self.insert_after(Some(head), Some(tail), insert);
        };

        let old_prev = self.prev(current);
        self.set_prev(current, Some(insert));
        self.set_next(insert, Some(current));
        self.set_prev(insert, old_prev);
        match old_prev {
            Some(old_prev) => {
                self.set_next(old_prev, Some(insert));
                head
            }
            None if current == head => insert,
            // `current` starts a chain other than `head`; the caller keeps its head.
            None => head,
        }
    }

    /// Unlinks `id` from its neighbours, joining them, and clears its links.
    pub fn detach(&mut self, id: NodeId) {
        let prev = self.prev(id);
        let next = self.next(id);
        if let Some(prev) = prev {
            self.set_next(prev, next);
        }
        if let Some(next) = next {
            self.set_prev(next, prev);
        }
        self.set_prev(id, None);
        self.set_next(id, None);
    }

    /// Whether `target` can be reached from `head` through `next` links or
    /// nested container lists.
    pub fn reaches(&self, head: NodeId, target: NodeId) -> bool {
        let mut seen = HashSet::new();
        let mut stack = vec![head];
        while let Some(start) = stack.pop() {
            let mut cur = Some(start);
            while let Some(id) = cur {
                if id == target {
                    return true;
                }
                if !seen.insert(id) {
                    break;
                }
                if let Some(child) = self.node(id).list() {
                    stack.push(child);
                }
                cur = self.next(id);
            }
        }
        false
    }
}

/// Iterator over a list in `next` order.
pub struct ListIter<'a> {
    arena: &'a NodeArena,
    current: Option<NodeId>,
}

impl Iterator for ListIter<'_> {
    type Item = NodeId;

    fn next(&mut self) -> Option<NodeId> {
        let id = self.current?;
        self.current = self.arena.next(id);
        Some(id)
    }
}
