//! Typed item hosts: menu shells and tree/list column hosts
//!
//! An item host accepts only the child families its manifest declares, keeps
//! them ordered by the `position` packing property, and never uses
//! placeholders: its capacity is whatever it holds. A host declared with
//! `locks-children` takes ownership of every child it accepts, so the child
//! cannot be moved elsewhere until the host releases it.

use crate::error::AdaptorError;
use crate::model::{ElementId, PropertyValue};

use super::container::{
    attach_child, base_add_checks, linear_reorder, renumber_positions, resolve_self,
};
use super::{Adaptor, ArcAdaptor, OpContext, QueryContext};

pub struct ItemHostAdaptor {
    general: ArcAdaptor,
}

impl ItemHostAdaptor {
    pub fn new(general: ArcAdaptor) -> Self {
        Self { general }
    }
}

fn lock_if_declared(ctx: &mut OpContext, container: ElementId, child: ElementId) {
    if ctx.spec_of(container).locks_children {
        ctx.model.node_mut(child).locked_by = Some(container);
    }
}

impl Adaptor for ItemHostAdaptor {
    fn general(&self) -> Option<&ArcAdaptor> {
        Some(&self.general)
    }

    fn add_verify(
        &self,
        ctx: &QueryContext,
        container: ElementId,
        child: ElementId,
    ) -> Result<(), AdaptorError> {
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
        attach_child(ctx, container, child, None);
        lock_if_declared(ctx, container, child);
        if !ctx.loading {
            renumber_positions(ctx, container);
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

    fn replace_child(
        &self,
        ctx: &mut OpContext,
        container: ElementId,
        current: ElementId,
        replacement: ElementId,
    ) -> Result<(), AdaptorError> {
        self.general
            .replace_child(ctx, container, current, replacement)?;
        lock_if_declared(ctx, container, replacement);
        renumber_positions(ctx, container);
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
        let count = ctx.live.children(ctx.live_of(container)).len() as i32;
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
        linear_reorder(ctx, container, child, position);
        Ok(())
    }

    fn read_finished(&self, ctx: &mut OpContext, element: ElementId) -> Result<(), AdaptorError> {
        let live = ctx.live_of(element);
        let mut positioned: Vec<(i32, ElementId)> = ctx
            .live
            .element_children(live)
            .into_iter()
            .map(|child| {
                let position = ctx
                    .model
                    .node(child)
                    .packing_value("position")
                    .and_then(PropertyValue::as_int)
                    .unwrap_or(0);
                (position, child)
            })
            .collect();
        positioned.sort_by_key(|(position, _)| *position);

        for (index, (_, child)) in positioned.into_iter().enumerate() {
            let child_live = ctx.live_of(child);
            ctx.live.move_child(live, child_live, index);
            lock_if_declared(ctx, element, child);
        }
        renumber_positions(ctx, element);
        Ok(())
    }
}
