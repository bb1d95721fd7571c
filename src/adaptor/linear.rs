//! Linear box family: ordered slots driven by a `position` packing property
//!
//! The declared capacity is the `size` element property, which always equals
//! the number of live slots (real children plus placeholders). Growing adds
//! placeholders at the first blank position; shrinking removes slots from the
//! end, cascading deletion of any real child occupying a removed slot.

use log::debug;

use crate::error::AdaptorError;
use crate::model::{ElementId, PropertyValue};

use super::container::{
    base_add_checks, attach_child, linear_reorder, renumber_positions, resolve_self,
};
use super::{delete_subtree, Adaptor, ArcAdaptor, CreateReason, OpContext, QueryContext};

pub struct BoxAdaptor {
    general: ArcAdaptor,
}

impl BoxAdaptor {
    pub fn new(general: ArcAdaptor) -> Self {
        Self { general }
    }

    fn slot_count(&self, ctx: &QueryContext, container: ElementId) -> usize {
        ctx.live.children(ctx.live_of(container)).len()
    }
}

/// First slot index whose occupants all sit at or before their recorded
/// position; new placeholders are inserted there so a grown container fills
/// its gaps before extending.
fn first_blank(ctx: &OpContext, container: ElementId) -> usize {
    let live = ctx.live_of(container);
    let children = ctx.live.children(live);
    for (index, child) in children.iter().enumerate() {
        if let Some(element) = ctx.live.element_of(*child) {
            let position = ctx
                .model
                .node(element)
                .packing_value("position")
                .and_then(PropertyValue::as_int)
                .unwrap_or(index as i32);
            if position > index as i32 {
                return index;
            }
        }
    }
    children.len()
}

impl Adaptor for BoxAdaptor {
    fn general(&self) -> Option<&ArcAdaptor> {
        Some(&self.general)
    }

    fn post_create(
        &self,
        ctx: &mut OpContext,
        element: ElementId,
        reason: CreateReason,
    ) -> Result<(), AdaptorError> {
        self.general.post_create(ctx, element, reason)?;
        if reason == CreateReason::User {
            let size = ctx.live.children(ctx.live_of(element)).len() as i32;
            ctx.model
                .node_mut(element)
                .properties
                .insert("size".to_string(), PropertyValue::Int(size));
        }
        Ok(())
    }

    fn add_verify(
        &self,
        ctx: &QueryContext,
        container: ElementId,
        child: ElementId,
    ) -> Result<(), AdaptorError> {
        // A box grows on demand, so no free slot is required up front.
        base_add_checks(ctx, container, child, false)
    }

    fn add_child(
        &self,
        ctx: &mut OpContext,
        container: ElementId,
        child: ElementId,
        user_initiated: bool,
    ) -> Result<(), AdaptorError> {
        if user_initiated {
            resolve_self(ctx, container).add_verify(&ctx.query(), container, child)?;
        }

        let live = ctx.live_of(container);
        let slot = if ctx.loading {
            None
        } else {
            match ctx.live.first_placeholder(live) {
                Some(index) => {
                    let placeholder = ctx.live.children(live)[index];
                    ctx.live.destroy(placeholder);
                    Some(index)
                }
                None => None,
            }
        };

        attach_child(ctx, container, child, slot);
        if !ctx.loading {
            renumber_positions(ctx, container);
            let size = self.slot_count(&ctx.query(), container) as i32;
            ctx.model
                .node_mut(container)
                .properties
                .insert("size".to_string(), PropertyValue::Int(size));
        }
        Ok(())
    }

    fn remove_child(
        &self,
        ctx: &mut OpContext,
        container: ElementId,
        child: ElementId,
    ) -> Result<(), AdaptorError> {
        self.general.remove_child(ctx, container, child)?;
        if !ctx.loading {
            renumber_positions(ctx, container);
        }
        Ok(())
    }

    fn verify_packing_property(
        &self,
        ctx: &QueryContext,
        container: ElementId,
        child: ElementId,
        name: &str,
        value: &PropertyValue,
    ) -> Result<(), AdaptorError> {
        if name != "position" {
            return self
                .general
                .verify_packing_property(ctx, container, child, name, value);
        }
        let position = value.as_int().ok_or_else(|| {
            AdaptorError::invalid_packing(name, ctx.name_of(child), "expected an Int value")
        })?;
        let count = self.slot_count(ctx, container) as i32;
        if position < 0 || position >= count {
            return Err(AdaptorError::invalid_packing(
                name,
                ctx.name_of(child),
                format!("position {} outside 0..{}", position, count),
            ));
        }
        Ok(())
    }

    fn set_packing_property(
        &self,
        ctx: &mut OpContext,
        container: ElementId,
        child: ElementId,
        name: &str,
        value: PropertyValue,
    ) -> Result<(), AdaptorError> {
        if name != "position" || ctx.displacing || ctx.loading {
            return self
                .general
                .set_packing_property(ctx, container, child, name, value);
        }

        resolve_self(ctx, container).verify_packing_property(
            &ctx.query(),
            container,
            child,
            name,
            &value,
        )?;
        let position = value.as_int().unwrap_or(0) as usize;
        debug!(
            "moving '{}' to slot {} of '{}'",
            ctx.model.node(child).name,
            position,
            ctx.model.node(container).name
        );
        linear_reorder(ctx, container, child, position);
        Ok(())
    }

    fn property(
        &self,
        ctx: &QueryContext,
        element: ElementId,
        name: &str,
    ) -> Result<PropertyValue, AdaptorError> {
        if name == "size" {
            return Ok(PropertyValue::Int(self.slot_count(ctx, element) as i32));
        }
        self.general.property(ctx, element, name)
    }

    fn verify_property(
        &self,
        ctx: &QueryContext,
        element: ElementId,
        name: &str,
        value: &PropertyValue,
    ) -> Result<(), AdaptorError> {
        if name != "size" {
            return self.general.verify_property(ctx, element, name, value);
        }
        match value.as_int() {
            Some(v) if v >= 0 => Ok(()),
            _ => Err(AdaptorError::InvalidPropertyValue {
                name: name.to_string(),
                element: ctx.name_of(element),
                reason: "the declared capacity must be a non-negative Int".to_string(),
            }),
        }
    }

    fn set_property(
        &self,
        ctx: &mut OpContext,
        element: ElementId,
        name: &str,
        value: PropertyValue,
    ) -> Result<(), AdaptorError> {
        if name != "size" {
            return self.general.set_property(ctx, element, name, value);
        }
        resolve_self(ctx, element).verify_property(&ctx.query(), element, name, &value)?;
        let new_size = value.as_int().unwrap_or(0) as usize;

        if ctx.loading {
            ctx.model
                .node_mut(element)
                .properties
                .insert(name.to_string(), value);
            return Ok(());
        }

        let live = ctx.live_of(element);
        while ctx.live.children(live).len() < new_size {
            let blank = first_blank(ctx, element);
            let placeholder = ctx.live.create_placeholder();
            ctx.live.attach(live, placeholder, Some(blank));
        }
        while ctx.live.children(live).len() > new_size {
            let last = *ctx
                .live
                .children(live)
                .last()
                .expect("shrinking a non-empty slot list");
            match ctx.live.element_of(last) {
                Some(child) => delete_subtree(ctx, child),
                None => ctx.live.destroy(last),
            }
        }

        ctx.model
            .node_mut(element)
            .properties
            .insert(name.to_string(), PropertyValue::Int(new_size as i32));
        renumber_positions(ctx, element);
        debug!(
            "resized '{}' to {} slots",
            ctx.model.node(element).name,
            new_size
        );
        Ok(())
    }

    fn child_action(
        &self,
        ctx: &mut OpContext,
        container: ElementId,
        slot: usize,
        action: &str,
    ) -> Result<(), AdaptorError> {
        match action {
            "insert-slot" => {
                let live = ctx.live_of(container);
                let slot = slot.min(ctx.live.children(live).len());
                let placeholder = ctx.live.create_placeholder();
                ctx.live.attach(live, placeholder, Some(slot));
                let size = ctx.live.children(live).len() as i32;
                ctx.model
                    .node_mut(container)
                    .properties
                    .insert("size".to_string(), PropertyValue::Int(size));
                renumber_positions(ctx, container);
                Ok(())
            }
            "remove-slot" => {
                let live = ctx.live_of(container);
                let children = ctx.live.children(live);
                let occupant = children.get(slot).copied().ok_or_else(|| {
                    AdaptorError::slot_conflict(
                        ctx.name_of(container),
                        format!("no slot {}", slot),
                    )
                })?;
                if !ctx.live.node(occupant).is_placeholder() {
                    return Err(AdaptorError::slot_conflict(
                        ctx.name_of(container),
                        format!("slot {} holds a real child", slot),
                    ));
                }
                ctx.live.destroy(occupant);
                let size = ctx.live.children(live).len() as i32;
                ctx.model
                    .node_mut(container)
                    .properties
                    .insert("size".to_string(), PropertyValue::Int(size));
                renumber_positions(ctx, container);
                Ok(())
            }
            _ => self.general.child_action(ctx, container, slot, action),
        }
    }

    fn read_finished(&self, ctx: &mut OpContext, element: ElementId) -> Result<(), AdaptorError> {
        let declared = ctx
            .model
            .node(element)
            .property("size")
            .and_then(PropertyValue::as_int)
            .unwrap_or(0)
            .max(0) as usize;

        let live = ctx.live_of(element);
        let loaded: Vec<ElementId> = ctx.live.element_children(live);
        let mut positioned: Vec<(i32, ElementId)> = loaded
            .iter()
            .map(|el| {
                let pos = ctx
                    .model
                    .node(*el)
                    .packing_value("position")
                    .and_then(PropertyValue::as_int)
                    .unwrap_or(0);
                (pos, *el)
            })
            .collect();
        positioned.sort_by_key(|(pos, _)| *pos);

        let highest = positioned.last().map(|(pos, _)| *pos + 1).unwrap_or(0).max(0) as usize;
        let slots = declared.max(highest).max(positioned.len());

        // Rebuild slot order: loaded children at their recorded positions,
        // placeholders in every remaining slot.
        let mut occupants: Vec<Option<ElementId>> = vec![None; slots];
        let mut overflow = Vec::new();
        for (pos, el) in positioned {
            let index = pos.max(0) as usize;
            match occupants.get_mut(index) {
                Some(slot @ None) => *slot = Some(el),
                _ => overflow.push(el),
            }
        }
        for el in overflow {
            if let Some(slot) = occupants.iter_mut().find(|s| s.is_none()) {
                *slot = Some(el);
            }
        }

        for (index, occupant) in occupants.into_iter().enumerate() {
            match occupant {
                Some(el) => {
                    let child_live = ctx.live_of(el);
                    ctx.live.move_child(live, child_live, index);
                }
                None => {
                    let placeholder = ctx.live.create_placeholder();
                    ctx.live.attach(live, placeholder, Some(index));
                }
            }
        }

        ctx.model
            .node_mut(element)
            .properties
            .insert("size".to_string(), PropertyValue::Int(slots as i32));
        renumber_positions(ctx, element);
        Ok(())
    }
}
