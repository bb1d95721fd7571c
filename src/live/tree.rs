//! Live instance tree: the constructed widget objects the design tree drives
//!
//! Slots of a container hold either a widget backed by an element node or a
//! placeholder. A slot may be empty only inside the body of a single adaptor
//! operation; every operation restores full occupancy before returning.
//! Placeholders exist only here: they are never element nodes and never reach
//! the document.

use std::collections::{BTreeMap, HashMap};

use crate::model::{ElementId, PropertyValue};

/// Handle to a live instance node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LiveId(pub(crate) usize);

/// What occupies a live node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveContent {
    /// A real widget backed by a design-model element
    Element(ElementId),
    /// A stand-in occupant for an empty but required slot
    Placeholder,
}

/// One constructed widget or placeholder
#[derive(Debug)]
pub struct LiveNode {
    pub class: String,
    pub content: LiveContent,
    parent: Option<LiveId>,
    children: Vec<LiveId>,
    /// Special-slot attachments (slot kind, occupant), e.g. notebook tabs
    special: Vec<(String, LiveId)>,
    /// Layout parameters the parent maintains for this child (grid cells etc.)
    pub layout: BTreeMap<String, PropertyValue>,
}

impl LiveNode {
    fn new(class: &str, content: LiveContent) -> Self {
        Self {
            class: class.to_string(),
            content,
            parent: None,
            children: Vec::new(),
            special: Vec::new(),
            layout: BTreeMap::new(),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self.content, LiveContent::Placeholder)
    }
}

/// Structural notification originating from direct manipulation of the live
/// tree (the drag-reorder path)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LiveEvent {
    ChildReordered {
        container: LiveId,
        child: LiveId,
        from: usize,
        to: usize,
    },
}

/// Arena of live nodes plus the element <-> instance resolution maps
#[derive(Debug, Default)]
pub struct LiveTree {
    nodes: Vec<Option<LiveNode>>,
    free: Vec<usize>,
    element_to_live: HashMap<ElementId, LiveId>,
    events: Vec<LiveEvent>,
    /// Notifications are suppressed while a design-driven mutation is being
    /// applied, so a mutation can never echo back as a live-side event
    notifications: bool,
}

impl LiveTree {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, node: LiveNode) -> LiveId {
        match self.free.pop() {
            Some(index) => {
                self.nodes[index] = Some(node);
                LiveId(index)
            }
            None => {
                self.nodes.push(Some(node));
                LiveId(self.nodes.len() - 1)
            }
        }
    }

    /// Construct the live instance for a design element
    pub fn create_widget(&mut self, class: &str, element: ElementId) -> LiveId {
        let id = self.insert(LiveNode::new(class, LiveContent::Element(element)));
        self.element_to_live.insert(element, id);
        id
    }

    /// Construct a placeholder occupant
    pub fn create_placeholder(&mut self) -> LiveId {
        self.insert(LiveNode::new("placeholder", LiveContent::Placeholder))
    }

    pub fn contains(&self, id: LiveId) -> bool {
        self.nodes.get(id.0).map_or(false, Option::is_some)
    }

    pub fn get(&self, id: LiveId) -> Option<&LiveNode> {
        self.nodes.get(id.0).and_then(Option::as_ref)
    }

    /// Resolve a node known to be live; a miss is a bookkeeping bug.
    pub fn node(&self, id: LiveId) -> &LiveNode {
        self.get(id).expect("stale live id")
    }

    pub fn node_mut(&mut self, id: LiveId) -> &mut LiveNode {
        self.nodes
            .get_mut(id.0)
            .and_then(Option::as_mut)
            .expect("stale live id")
    }

    /// The live instance constructed for an element
    pub fn live_of(&self, element: ElementId) -> Option<LiveId> {
        self.element_to_live.get(&element).copied()
    }

    /// Resolve a live instance back to its owning element
    pub fn element_of(&self, id: LiveId) -> Option<ElementId> {
        match self.get(id)?.content {
            LiveContent::Element(element) => Some(element),
            LiveContent::Placeholder => None,
        }
    }

    pub fn parent(&self, id: LiveId) -> Option<LiveId> {
        self.get(id)?.parent
    }

    pub fn children(&self, id: LiveId) -> &[LiveId] {
        &self.node(id).children
    }

    pub fn special_children(&self, id: LiveId) -> &[(String, LiveId)] {
        &self.node(id).special
    }

    /// Index of `child` in `parent`'s slot list
    pub fn index_of(&self, parent: LiveId, child: LiveId) -> Option<usize> {
        self.node(parent).children.iter().position(|c| *c == child)
    }

    pub fn attach(&mut self, parent: LiveId, child: LiveId, index: Option<usize>) {
        self.detach(child);
        let children = &mut self.node_mut(parent).children;
        let index = index.unwrap_or(children.len()).min(children.len());
        children.insert(index, child);
        self.node_mut(child).parent = Some(parent);
    }

    pub fn detach(&mut self, child: LiveId) -> Option<LiveId> {
        let parent = self.node_mut(child).parent.take()?;
        let node = self.node_mut(parent);
        node.children.retain(|c| *c != child);
        node.special.retain(|(_, c)| *c != child);
        self.node_mut(child).layout.clear();
        Some(parent)
    }

    /// Attach into a named special slot instead of the primary slot list
    pub fn attach_special(&mut self, parent: LiveId, kind: &str, child: LiveId) {
        self.detach(child);
        self.node_mut(parent).special.push((kind.to_string(), child));
        self.node_mut(child).parent = Some(parent);
    }

    /// Move a child to a new index within its parent (design-driven; does not
    /// emit a notification)
    pub fn move_child(&mut self, parent: LiveId, child: LiveId, new_index: usize) {
        let children = &mut self.node_mut(parent).children;
        if let Some(old) = children.iter().position(|c| *c == child) {
            children.remove(old);
            let new_index = new_index.min(children.len());
            children.insert(new_index, child);
        }
    }

    /// Destroy one node, detaching it first. The caller is responsible for
    /// the node's own children.
    pub fn destroy(&mut self, id: LiveId) {
        if !self.contains(id) {
            return;
        }
        self.detach(id);
        let node = self.nodes[id.0].take().expect("stale live id");
        if let LiveContent::Element(element) = node.content {
            self.element_to_live.remove(&element);
        }
        self.free.push(id.0);
    }

    /// Destroy a node and its whole subtree, special occupants included
    pub fn destroy_subtree(&mut self, id: LiveId) {
        if !self.contains(id) {
            return;
        }
        let mut descendants: Vec<LiveId> = self.node(id).children.clone();
        descendants.extend(self.node(id).special.iter().map(|(_, c)| *c));
        for child in descendants {
            self.destroy_subtree(child);
        }
        self.destroy(id);
    }

    // ---- occupancy queries ----------------------------------------------

    pub fn placeholders_of(&self, container: LiveId) -> Vec<LiveId> {
        self.node(container)
            .children
            .iter()
            .copied()
            .filter(|c| self.node(*c).is_placeholder())
            .collect()
    }

    pub fn placeholder_count(&self, container: LiveId) -> usize {
        self.placeholders_of(container).len()
    }

    /// Index of the first placeholder slot, if any
    pub fn first_placeholder(&self, container: LiveId) -> Option<usize> {
        self.node(container)
            .children
            .iter()
            .position(|c| self.node(*c).is_placeholder())
    }

    /// Elements occupying primary slots, in slot order
    pub fn element_children(&self, container: LiveId) -> Vec<ElementId> {
        self.node(container)
            .children
            .iter()
            .filter_map(|c| self.element_of(*c))
            .collect()
    }

    // ---- notifications ---------------------------------------------------

    /// Enable or disable live-side notifications, returning the previous
    /// state. Design-driven mutations run with notifications disabled.
    pub fn set_notifications(&mut self, enabled: bool) -> bool {
        std::mem::replace(&mut self.notifications, enabled)
    }

    pub fn notifications_enabled(&self) -> bool {
        self.notifications
    }

    /// Direct manipulation of the live tree: reorder a child as a user drag
    /// would, emitting a structural notification when enabled.
    pub fn simulate_reorder(&mut self, parent: LiveId, child: LiveId, new_index: usize) {
        let Some(from) = self.index_of(parent, child) else {
            return;
        };
        self.move_child(parent, child, new_index);
        let to = self.index_of(parent, child).unwrap_or(new_index);
        if self.notifications {
            self.events.push(LiveEvent::ChildReordered {
                container: parent,
                child,
                from,
                to,
            });
        }
    }

    /// Drain pending structural notifications
    pub fn take_events(&mut self) -> Vec<LiveEvent> {
        std::mem::take(&mut self.events)
    }

    pub fn len(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn element(n: usize) -> ElementId {
        ElementId(n)
    }

    #[test]
    fn test_widget_mapping_round_trip() {
        let mut tree = LiveTree::new();
        let live = tree.create_widget("button", element(7));
        assert_eq!(tree.live_of(element(7)), Some(live));
        assert_eq!(tree.element_of(live), Some(element(7)));

        tree.destroy(live);
        assert_eq!(tree.live_of(element(7)), None);
    }

    #[test]
    fn test_placeholder_has_no_element() {
        let mut tree = LiveTree::new();
        let ph = tree.create_placeholder();
        assert!(tree.node(ph).is_placeholder());
        assert_eq!(tree.element_of(ph), None);
    }

    #[test]
    fn test_attach_orders_slots() {
        let mut tree = LiveTree::new();
        let parent = tree.create_widget("box", element(0));
        let a = tree.create_widget("button", element(1));
        let b = tree.create_placeholder();
        tree.attach(parent, a, None);
        tree.attach(parent, b, Some(0));

        assert_eq!(tree.children(parent), &[b, a]);
        assert_eq!(tree.first_placeholder(parent), Some(0));
        assert_eq!(tree.element_children(parent), vec![element(1)]);
    }

    #[test]
    fn test_reorder_emits_only_when_enabled() {
        let mut tree = LiveTree::new();
        let parent = tree.create_widget("box", element(0));
        let a = tree.create_widget("button", element(1));
        let b = tree.create_widget("button", element(2));
        tree.attach(parent, a, None);
        tree.attach(parent, b, None);

        tree.simulate_reorder(parent, a, 1);
        assert!(tree.take_events().is_empty());

        tree.set_notifications(true);
        tree.simulate_reorder(parent, a, 0);
        let events = tree.take_events();
        assert_eq!(
            events,
            vec![LiveEvent::ChildReordered {
                container: parent,
                child: a,
                from: 1,
                to: 0,
            }]
        );
    }

    #[test]
    fn test_destroy_subtree_releases_special_occupants() {
        let mut tree = LiveTree::new();
        let notebook = tree.create_widget("notebook", element(0));
        let page = tree.create_widget("button", element(1));
        let tab = tree.create_widget("label", element(2));
        tree.attach(notebook, page, None);
        tree.attach_special(notebook, "tab", tab);

        tree.destroy_subtree(notebook);
        assert!(tree.is_empty());
    }
}
