//! Project: one design session holding the element tree and its live mirror
//!
//! Every mutation routes through the adaptor resolved for the container's
//! family, synchronously, inside a notification guard: the live tree cannot
//! echo a design-driven change back as a live-side event. Queries borrow the
//! trees read-only and never require the guard.

use std::sync::Arc;

use crate::adaptor::{delete_subtree, Adaptor, ArcAdaptor, CreateReason, OpContext, QueryContext};
use crate::catalog::AdaptorRegistry;
use crate::command::CommandSink;
use crate::error::AdaptorError;
use crate::live::{forward_live_event, LiveTree};
use crate::model::{ElementArena, ElementId, PropertyValue};
use crate::ComposerError;

pub struct Project {
    model: ElementArena,
    live: LiveTree,
    registry: Arc<AdaptorRegistry>,
    loading: bool,
}

impl Project {
    pub fn new(registry: Arc<AdaptorRegistry>) -> Self {
        Self {
            model: ElementArena::new(),
            live: LiveTree::new(),
            registry,
            loading: false,
        }
    }

    /// Project over the standard catalog
    pub fn with_standard_catalog() -> Result<Self, ComposerError> {
        Ok(Self::new(Arc::new(AdaptorRegistry::standard()?)))
    }

    pub fn registry(&self) -> &AdaptorRegistry {
        &self.registry
    }

    pub fn model(&self) -> &ElementArena {
        &self.model
    }

    pub(crate) fn model_mut(&mut self) -> &mut ElementArena {
        &mut self.model
    }

    pub fn live(&self) -> &LiveTree {
        &self.live
    }

    /// Mutable access to the live tree, for the direct-manipulation path
    /// (drag simulation and toolkit callbacks).
    pub fn live_mut(&mut self) -> &mut LiveTree {
        &mut self.live
    }

    /// Enable or disable live-side notifications. An embedding application
    /// turns them on once its toolkit callbacks are wired up.
    pub fn set_live_notifications(&mut self, enabled: bool) {
        self.live.set_notifications(enabled);
    }

    pub(crate) fn begin_load(&mut self) {
        self.loading = true;
    }

    pub(crate) fn end_load(&mut self) {
        self.loading = false;
    }

    pub(crate) fn query(&self) -> QueryContext<'_> {
        QueryContext::new(&self.model, &self.live, &self.registry)
    }

    pub(crate) fn adaptor_of(&self, element: ElementId) -> Result<ArcAdaptor, ComposerError> {
        let node = self
            .model
            .get(element)
            .ok_or(ComposerError::UnknownElement)?;
        Ok(self.registry.resolve(&node.family)?.clone())
    }

    /// Run one mutating operation inside the notification guard.
    pub(crate) fn guarded<T>(
        &mut self,
        op: impl FnOnce(&mut OpContext) -> Result<T, AdaptorError>,
    ) -> Result<T, AdaptorError> {
        let previous = self.live.set_notifications(false);
        let registry = self.registry.clone();
        let mut ctx = OpContext::new(&mut self.model, &mut self.live, &registry);
        ctx.loading = self.loading;
        let result = op(&mut ctx);
        self.live.set_notifications(previous);
        result
    }

    // ---- element lifecycle -----------------------------------------------

    /// Create an element of `family` with its live instance, running the
    /// family's post-creation setup.
    pub fn create_element(
        &mut self,
        family: &str,
        name: Option<&str>,
    ) -> Result<ElementId, ComposerError> {
        let adaptor = self.registry.resolve(family)?.clone();
        let element = self.model.create(family, name);
        self.live.create_widget(family, element);
        let reason = if self.loading {
            CreateReason::Load
        } else {
            CreateReason::User
        };
        self.guarded(|ctx| adaptor.post_create(ctx, element, reason))?;
        Ok(element)
    }

    /// Mark an element as a special-slot child ("tab" and the like) ahead of
    /// adding it; the container family decides what the marker means.
    pub fn set_child_type(
        &mut self,
        element: ElementId,
        child_type: Option<&str>,
    ) -> Result<(), ComposerError> {
        self.model
            .get_mut(element)
            .ok_or(ComposerError::UnknownElement)?
            .child_type = child_type.map(str::to_string);
        Ok(())
    }

    /// Delete an element and its whole subtree. A child is detached through
    /// its parent's adaptor first, so the vacated slot is placeheld.
    pub fn delete_element(&mut self, element: ElementId) -> Result<(), ComposerError> {
        if let Some(parent) = self
            .model
            .get(element)
            .ok_or(ComposerError::UnknownElement)?
            .parent()
        {
            self.remove_child(parent, element)?;
        }
        self.guarded(|ctx| {
            delete_subtree(ctx, element);
            Ok(())
        })?;
        Ok(())
    }

    // ---- structural operations -------------------------------------------

    pub fn add_child(
        &mut self,
        container: ElementId,
        child: ElementId,
        user_initiated: bool,
    ) -> Result<(), ComposerError> {
        let adaptor = self.adaptor_of(container)?;
        self.guarded(|ctx| adaptor.add_child(ctx, container, child, user_initiated))?;
        Ok(())
    }

    /// Pure pre-check of [`Project::add_child`]
    pub fn add_verify(
        &self,
        container: ElementId,
        child: ElementId,
    ) -> Result<(), ComposerError> {
        let adaptor = self.adaptor_of(container)?;
        adaptor.add_verify(&self.query(), container, child)?;
        Ok(())
    }

    pub fn remove_child(
        &mut self,
        container: ElementId,
        child: ElementId,
    ) -> Result<(), ComposerError> {
        let adaptor = self.adaptor_of(container)?;
        self.guarded(|ctx| adaptor.remove_child(ctx, container, child))?;
        Ok(())
    }

    pub fn replace_child(
        &mut self,
        container: ElementId,
        current: ElementId,
        replacement: ElementId,
    ) -> Result<(), ComposerError> {
        let adaptor = self.adaptor_of(container)?;
        self.guarded(|ctx| adaptor.replace_child(ctx, container, current, replacement))?;
        Ok(())
    }

    /// Design children of a container in the family's natural order
    pub fn children(&self, container: ElementId) -> Result<Vec<ElementId>, ComposerError> {
        let adaptor = self.adaptor_of(container)?;
        Ok(adaptor.children(&self.query(), container))
    }

    /// Family-specific slot operation, grouped on the sink when one is given
    pub fn child_action(
        &mut self,
        container: ElementId,
        slot: usize,
        action: &str,
        sink: Option<&mut dyn CommandSink>,
    ) -> Result<(), ComposerError> {
        let adaptor = self.adaptor_of(container)?;
        let label = format!(
            "{} on {}",
            action,
            self.model.node(container).name.clone()
        );
        if let Some(sink) = sink {
            sink.begin_group(&label);
            let result = self.guarded(|ctx| adaptor.child_action(ctx, container, slot, action));
            sink.end_group();
            result?;
        } else {
            self.guarded(|ctx| adaptor.child_action(ctx, container, slot, action))?;
        }
        Ok(())
    }

    // ---- packing properties ----------------------------------------------

    pub fn packing_property(
        &self,
        container: ElementId,
        child: ElementId,
        name: &str,
    ) -> Result<PropertyValue, ComposerError> {
        let adaptor = self.adaptor_of(container)?;
        Ok(adaptor.packing_property(&self.query(), container, child, name)?)
    }

    pub fn verify_packing_property(
        &self,
        container: ElementId,
        child: ElementId,
        name: &str,
        value: &PropertyValue,
    ) -> Result<(), ComposerError> {
        let adaptor = self.adaptor_of(container)?;
        adaptor.verify_packing_property(&self.query(), container, child, name, value)?;
        Ok(())
    }

    pub fn set_packing_property(
        &mut self,
        container: ElementId,
        child: ElementId,
        name: &str,
        value: PropertyValue,
    ) -> Result<(), ComposerError> {
        let adaptor = self.adaptor_of(container)?;
        self.guarded(|ctx| adaptor.set_packing_property(ctx, container, child, name, value))?;
        Ok(())
    }

    // ---- element properties ----------------------------------------------

    pub fn property(
        &self,
        element: ElementId,
        name: &str,
    ) -> Result<PropertyValue, ComposerError> {
        let adaptor = self.adaptor_of(element)?;
        Ok(adaptor.property(&self.query(), element, name)?)
    }

    pub fn verify_property(
        &self,
        element: ElementId,
        name: &str,
        value: &PropertyValue,
    ) -> Result<(), ComposerError> {
        let adaptor = self.adaptor_of(element)?;
        adaptor.verify_property(&self.query(), element, name, value)?;
        Ok(())
    }

    pub fn set_property(
        &mut self,
        element: ElementId,
        name: &str,
        value: PropertyValue,
    ) -> Result<(), ComposerError> {
        let adaptor = self.adaptor_of(element)?;
        self.guarded(|ctx| adaptor.set_property(ctx, element, name, value))?;
        Ok(())
    }

    // ---- live-side notifications -----------------------------------------

    /// Drain pending live-side notifications, forwarding each as the
    /// equivalent packing-property request on the command sink. Returns how
    /// many were forwarded.
    pub fn process_live_events(
        &mut self,
        sink: &mut dyn CommandSink,
    ) -> Result<usize, ComposerError> {
        let events = self.live.take_events();
        let count = events.len();
        for event in &events {
            forward_live_event(&self.model, &self.live, event, sink)?;
        }
        Ok(count)
    }
}
