//! Id-based storage for element nodes.
//!
//! Elements refer to each other through `ElementId` handles rather than owning
//! references, so releasing a subtree can never leave a dangling back-pointer:
//! a stale id simply stops resolving. Freed indices are pooled for reuse.

use std::collections::HashMap;

use super::element::ElementNode;

/// Non-owning handle to an element node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub(crate) usize);

/// Owned storage for all element nodes of one project
#[derive(Debug, Default)]
pub struct ElementArena {
    nodes: Vec<Option<ElementNode>>,
    free: Vec<usize>,
    names: HashMap<String, ElementId>,
    /// Per-family counters used to generate "box1"-style names
    name_counters: HashMap<String, usize>,
}

impl ElementArena {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a node, generating a unique name when none is given or the
    /// requested name is already taken.
    pub fn create(&mut self, family: &str, name: Option<&str>) -> ElementId {
        let name = match name {
            Some(n) if !self.names.contains_key(n) => n.to_string(),
            _ => self.generate_name(family),
        };
        let node = ElementNode::new(family, &name);

        let index = match self.free.pop() {
            Some(index) => {
                self.nodes[index] = Some(node);
                index
            }
            None => {
                self.nodes.push(Some(node));
                self.nodes.len() - 1
            }
        };
        let id = ElementId(index);
        self.names.insert(name, id);
        id
    }

    fn generate_name(&mut self, family: &str) -> String {
        let counter = self.name_counters.entry(family.to_string()).or_insert(0);
        loop {
            *counter += 1;
            let candidate = format!("{}{}", family, counter);
            if !self.names.contains_key(&candidate) {
                return candidate;
            }
        }
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.nodes.get(id.0).map_or(false, Option::is_some)
    }

    pub fn get(&self, id: ElementId) -> Option<&ElementNode> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut ElementNode> {
        self.nodes.get_mut(id.0).and_then(Option::as_mut)
    }

    /// Resolve a node that is known to be live. Ids are only ever produced by
    /// this arena and handed out while the node exists, so a miss here is a
    /// bookkeeping bug, not a recoverable condition.
    pub fn node(&self, id: ElementId) -> &ElementNode {
        self.get(id).expect("stale element id")
    }

    pub fn node_mut(&mut self, id: ElementId) -> &mut ElementNode {
        self.get_mut(id).expect("stale element id")
    }

    pub fn by_name(&self, name: &str) -> Option<ElementId> {
        self.names.get(name).copied()
    }

    /// Attach `child` under `parent` at `index` (append when `None`),
    /// updating both sides of the relationship.
    pub fn attach(&mut self, parent: ElementId, child: ElementId, index: Option<usize>) {
        self.detach(child);
        let children = &mut self.node_mut(parent).children;
        let index = index.unwrap_or(children.len()).min(children.len());
        children.insert(index, child);
        self.node_mut(child).parent = Some(parent);
    }

    /// Detach `child` from its parent, returning the old parent. The child's
    /// own subtree is untouched.
    pub fn detach(&mut self, child: ElementId) -> Option<ElementId> {
        let parent = self.node_mut(child).parent.take()?;
        let children = &mut self.node_mut(parent).children;
        children.retain(|c| *c != child);
        Some(parent)
    }

    /// Release a node and its whole subtree, detaching from any parent first.
    /// Returns every released id (children before parents) so callers can
    /// clean up per-element state of their own.
    pub fn release(&mut self, id: ElementId) -> Vec<ElementId> {
        if !self.contains(id) {
            return Vec::new();
        }
        self.detach(id);
        let mut released = Vec::new();
        self.release_rec(id, &mut released);
        released
    }

    fn release_rec(&mut self, id: ElementId, released: &mut Vec<ElementId>) {
        let children = self.node(id).children.clone();
        for child in children {
            self.release_rec(child, released);
        }
        let node = self.nodes[id.0].take().expect("stale element id");
        self.names.remove(&node.name);
        self.free.push(id.0);
        released.push(id);
    }

    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate over all live ids
    pub fn ids(&self) -> impl Iterator<Item = ElementId> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .filter_map(|(i, n)| n.as_ref().map(|_| ElementId(i)))
    }
}
