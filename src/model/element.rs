//! Element nodes: the design-model record for one interface element

use std::collections::BTreeMap;

use super::arena::ElementId;
use super::value::PropertyValue;

/// One element in the design tree.
///
/// An element stores its named properties and, while it has a parent, the
/// packing properties its parent's family declares for it. The parent
/// back-reference and the parent's child list are kept in agreement by the
/// arena; neither is mutated directly from outside the model.
#[derive(Debug, Clone)]
pub struct ElementNode {
    /// Stable unique name within the project
    pub name: String,
    /// Catalog family identifier
    pub family: String,
    /// Named element properties, in stable order
    pub properties: BTreeMap<String, PropertyValue>,
    /// Packing properties interpreted by the parent's family; empty while
    /// the element has no parent
    pub packing: BTreeMap<String, PropertyValue>,
    /// Non-owning back-reference to the parent element
    pub(crate) parent: Option<ElementId>,
    /// Owned children, in attachment order
    pub(crate) children: Vec<ElementId>,
    /// Role name when this child was created automatically by its parent's
    /// family; such children cannot be detached on their own
    pub internal: Option<String>,
    /// Set while another element manages this one; a locked element is not
    /// independently movable
    pub locked_by: Option<ElementId>,
    /// Special slot this child occupies in its parent ("tab" etc.), written
    /// as the `type` attribute of the child wrapper in documents
    pub child_type: Option<String>,
}

impl ElementNode {
    pub fn new(family: &str, name: &str) -> Self {
        Self {
            name: name.to_string(),
            family: family.to_string(),
            properties: BTreeMap::new(),
            packing: BTreeMap::new(),
            parent: None,
            children: Vec::new(),
            internal: None,
            locked_by: None,
            child_type: None,
        }
    }

    pub fn parent(&self) -> Option<ElementId> {
        self.parent
    }

    pub fn children(&self) -> &[ElementId] {
        &self.children
    }

    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties.get(name)
    }

    pub fn packing_value(&self, name: &str) -> Option<&PropertyValue> {
        self.packing.get(name)
    }

    pub fn is_internal(&self) -> bool {
        self.internal.is_some()
    }

    pub fn is_locked(&self) -> bool {
        self.locked_by.is_some()
    }
}
