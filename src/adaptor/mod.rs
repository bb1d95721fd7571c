//! Adaptors: per-family capability tables for container and packing behavior
//!
//! Every element family is serviced by one [`Adaptor`]. An adaptor that does
//! not override an operation forwards it unchanged to its more-general
//! adaptor ([`Adaptor::general`]); an override may still invoke the inherited
//! version explicitly. The chain bottoms out in the widget table, whose
//! behavior is the provided default body of each trait method. No language
//! inheritance is involved: the chain is an explicit reference held by each
//! adaptor, wired up by the registry.
//!
//! Operations receive an [`OpContext`] (mutating) or [`QueryContext`]
//! (read-only) instead of touching shared state; transient flags that span a
//! cascade, such as the displacement guard, live on the context and die with
//! the operation.

pub mod container;
pub mod grid;
pub mod item_host;
pub mod linear;
pub mod notebook;
pub mod paned;
pub mod widget;

use std::sync::Arc;

use crate::catalog::{AdaptorRegistry, FamilySpec};
use crate::document::DocNode;
use crate::error::AdaptorError;
use crate::live::{LiveId, LiveTree};
use crate::model::{ElementArena, ElementId, PropertyValue};

/// Why an element is being instantiated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateReason {
    /// Direct user action in the tool
    User,
    /// Reconstruction while loading a document
    Load,
}

/// Mutable state one adaptor operation runs against
pub struct OpContext<'a> {
    pub model: &'a mut ElementArena,
    pub live: &'a mut LiveTree,
    pub registry: &'a AdaptorRegistry,
    /// Set while a document is being loaded; placeholder bookkeeping and
    /// default packing assignment are deferred to the load-finished pass
    pub loading: bool,
    /// Set while a slot-displacement cascade is re-resolving siblings, so the
    /// cascade cannot re-enter itself
    pub displacing: bool,
}

impl<'a> OpContext<'a> {
    pub fn new(
        model: &'a mut ElementArena,
        live: &'a mut LiveTree,
        registry: &'a AdaptorRegistry,
    ) -> Self {
        Self {
            model,
            live,
            registry,
            loading: false,
            displacing: false,
        }
    }

    pub fn query(&self) -> QueryContext<'_> {
        QueryContext {
            model: self.model,
            live: self.live,
            registry: self.registry,
        }
    }

    /// Resolved family metadata of an element. Elements are only ever created
    /// through the registry, so their family is always resolvable.
    pub fn spec_of(&self, element: ElementId) -> Arc<FamilySpec> {
        let family = &self.model.node(element).family;
        self.registry.spec(family).expect("unregistered family").clone()
    }

    /// Live instance of an element; every attached element has one.
    pub fn live_of(&self, element: ElementId) -> LiveId {
        self.live.live_of(element).expect("element without live instance")
    }

    pub fn name_of(&self, element: ElementId) -> String {
        self.model.node(element).name.clone()
    }
}

/// Read-only view for queries and verification
pub struct QueryContext<'a> {
    pub model: &'a ElementArena,
    pub live: &'a LiveTree,
    pub registry: &'a AdaptorRegistry,
}

impl<'a> QueryContext<'a> {
    pub fn new(
        model: &'a ElementArena,
        live: &'a LiveTree,
        registry: &'a AdaptorRegistry,
    ) -> Self {
        Self {
            model,
            live,
            registry,
        }
    }

    pub fn spec_of(&self, element: ElementId) -> Arc<FamilySpec> {
        let family = &self.model.node(element).family;
        self.registry.spec(family).expect("unregistered family").clone()
    }

    pub fn live_of(&self, element: ElementId) -> LiveId {
        self.live.live_of(element).expect("element without live instance")
    }

    pub fn name_of(&self, element: ElementId) -> String {
        self.model.node(element).name.clone()
    }
}

pub type ArcAdaptor = Arc<dyn Adaptor>;

/// The per-family capability table.
///
/// Provided method bodies implement the chain-up rule: forward to the
/// more-general adaptor when there is one, otherwise fall back to leaf
/// behavior (no children, no packing, plain property storage).
pub trait Adaptor: Send + Sync {
    /// The more-general adaptor this one delegates unimplemented operations
    /// to; `None` only for the root widget table.
    fn general(&self) -> Option<&ArcAdaptor>;

    /// Family setup after an element is instantiated: seeding placeholders,
    /// building internal children.
    fn post_create(
        &self,
        ctx: &mut OpContext,
        element: ElementId,
        reason: CreateReason,
    ) -> Result<(), AdaptorError> {
        match self.general() {
            Some(g) => g.post_create(ctx, element, reason),
            None => Ok(()),
        }
    }

    /// Pure pre-check for [`Adaptor::add_child`]; no side effects.
    fn add_verify(
        &self,
        ctx: &QueryContext,
        container: ElementId,
        child: ElementId,
    ) -> Result<(), AdaptorError> {
        match self.general() {
            Some(g) => g.add_verify(ctx, container, child),
            None => Err(refuses_children(ctx, container, child)),
        }
    }

    /// Insert `child` into `container`'s live instance and design tree,
    /// consuming a placeholder in the target slot when one is there and
    /// assigning initial packing values.
    fn add_child(
        &self,
        ctx: &mut OpContext,
        container: ElementId,
        child: ElementId,
        user_initiated: bool,
    ) -> Result<(), AdaptorError> {
        match self.general() {
            Some(g) => g.add_child(ctx, container, child, user_initiated),
            None => Err(refuses_children(&ctx.query(), container, child)),
        }
    }

    /// Detach `child` from `container`, restoring a placeholder when the
    /// family keeps stable slot occupancy. Never destroys the child's own
    /// subtree.
    fn remove_child(
        &self,
        ctx: &mut OpContext,
        container: ElementId,
        child: ElementId,
    ) -> Result<(), AdaptorError> {
        match self.general() {
            Some(g) => g.remove_child(ctx, container, child),
            None => Err(refuses_children(&ctx.query(), container, child)),
        }
    }

    /// Atomic remove-then-add preserving slot identity; transferable packing
    /// values are copied forward.
    fn replace_child(
        &self,
        ctx: &mut OpContext,
        container: ElementId,
        current: ElementId,
        replacement: ElementId,
    ) -> Result<(), AdaptorError> {
        match self.general() {
            Some(g) => g.replace_child(ctx, container, current, replacement),
            None => Err(refuses_children(&ctx.query(), container, replacement)),
        }
    }

    /// Design children in the family's natural order.
    fn children(&self, ctx: &QueryContext, container: ElementId) -> Vec<ElementId> {
        match self.general() {
            Some(g) => g.children(ctx, container),
            None => Vec::new(),
        }
    }

    fn packing_property(
        &self,
        ctx: &QueryContext,
        container: ElementId,
        child: ElementId,
        name: &str,
    ) -> Result<PropertyValue, AdaptorError> {
        match self.general() {
            Some(g) => g.packing_property(ctx, container, child, name),
            None => Err(no_packing(ctx, container, name)),
        }
    }

    /// Pure validation of a candidate packing value; no side effects.
    fn verify_packing_property(
        &self,
        ctx: &QueryContext,
        container: ElementId,
        child: ElementId,
        name: &str,
        value: &PropertyValue,
    ) -> Result<(), AdaptorError> {
        match self.general() {
            Some(g) => g.verify_packing_property(ctx, container, child, name, value),
            None => Err(no_packing(ctx, container, name)),
        }
    }

    /// Validate, store, and apply one packing value to the live instance,
    /// re-resolving sibling slots when the change collides.
    fn set_packing_property(
        &self,
        ctx: &mut OpContext,
        container: ElementId,
        child: ElementId,
        name: &str,
        value: PropertyValue,
    ) -> Result<(), AdaptorError> {
        match self.general() {
            Some(g) => g.set_packing_property(ctx, container, child, name, value),
            None => Err(no_packing(&ctx.query(), container, name)),
        }
    }

    fn property(
        &self,
        ctx: &QueryContext,
        element: ElementId,
        name: &str,
    ) -> Result<PropertyValue, AdaptorError> {
        match self.general() {
            Some(g) => g.property(ctx, element, name),
            None => {
                ctx.model
                    .node(element)
                    .property(name)
                    .cloned()
                    .ok_or_else(|| AdaptorError::UnknownProperty {
                        element: ctx.name_of(element),
                        name: name.to_string(),
                    })
            }
        }
    }

    fn verify_property(
        &self,
        ctx: &QueryContext,
        element: ElementId,
        name: &str,
        value: &PropertyValue,
    ) -> Result<(), AdaptorError> {
        match self.general() {
            Some(g) => g.verify_property(ctx, element, name, value),
            None => Ok(()),
        }
    }

    fn set_property(
        &self,
        ctx: &mut OpContext,
        element: ElementId,
        name: &str,
        value: PropertyValue,
    ) -> Result<(), AdaptorError> {
        match self.general() {
            Some(g) => g.set_property(ctx, element, name, value),
            None => {
                ctx.model
                    .node_mut(element)
                    .properties
                    .insert(name.to_string(), value);
                Ok(())
            }
        }
    }

    /// Family-specific structural operation on a slot (insert a row, remove a
    /// placeholder slot, ...).
    fn child_action(
        &self,
        ctx: &mut OpContext,
        container: ElementId,
        slot: usize,
        action: &str,
    ) -> Result<(), AdaptorError> {
        match self.general() {
            Some(g) => g.child_action(ctx, container, slot, action),
            None => Err(AdaptorError::UnknownChildAction {
                family: ctx.model.node(container).family.clone(),
                action: action.to_string(),
            }),
        }
    }

    /// Serialize the packing-property set of `child` into its child wrapper
    /// node.
    fn write_packing_state(
        &self,
        ctx: &QueryContext,
        container: ElementId,
        child: ElementId,
        node: &mut DocNode,
    ) -> Result<(), AdaptorError> {
        match self.general() {
            Some(g) => g.write_packing_state(ctx, container, child, node),
            None => Ok(()),
        }
    }

    /// Restore the packing-property set of `child` from its child wrapper
    /// node, overriding defaults assigned during attachment.
    fn read_packing_state(
        &self,
        ctx: &mut OpContext,
        container: ElementId,
        child: ElementId,
        node: &DocNode,
    ) -> Result<(), AdaptorError> {
        match self.general() {
            Some(g) => g.read_packing_state(ctx, container, child, node),
            None => Ok(()),
        }
    }

    /// Reconcile declared capacity with loaded children once a document load
    /// completes: placeholders are reconstructed here, never persisted.
    fn read_finished(&self, ctx: &mut OpContext, element: ElementId) -> Result<(), AdaptorError> {
        match self.general() {
            Some(g) => g.read_finished(ctx, element),
            None => Ok(()),
        }
    }
}

fn refuses_children(
    ctx: &QueryContext,
    container: ElementId,
    child: ElementId,
) -> AdaptorError {
    AdaptorError::incompatible(
        ctx.name_of(container),
        ctx.name_of(child),
        "this family does not accept children",
    )
}

fn no_packing(ctx: &QueryContext, container: ElementId, name: &str) -> AdaptorError {
    AdaptorError::unknown_packing(ctx.model.node(container).family.clone(), name)
}

/// Detach an element from both trees and release its whole subtree.
pub(crate) fn delete_subtree(ctx: &mut OpContext, element: ElementId) {
    let live = ctx.live.live_of(element);
    ctx.model.release(element);
    if let Some(live) = live {
        ctx.live.destroy_subtree(live);
    }
}
