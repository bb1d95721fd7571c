//! Split-pane family: exactly two slots, addressed by the `pane` token
//!
//! Both panes are placeheld from creation, so the declared capacity is always
//! two and an add at capacity is refused by the free-slot check. Moving a
//! child to the occupied pane swaps the sibling into the vacated one.

use crate::error::AdaptorError;
use crate::model::{ElementId, PropertyValue};

use super::container::{attach_child, resolve_self};
use super::{Adaptor, ArcAdaptor, CreateReason, OpContext, QueryContext};

pub struct PanedAdaptor {
    general: ArcAdaptor,
}

impl PanedAdaptor {
    pub fn new(general: ArcAdaptor) -> Self {
        Self { general }
    }
}

const PANES: usize = 2;

fn pane_token(index: usize) -> &'static str {
    if index == 0 {
        "start"
    } else {
        "end"
    }
}

fn pane_index(token: &str) -> Option<usize> {
    match token {
        "start" => Some(0),
        "end" => Some(1),
        _ => None,
    }
}

fn ensure_panes(ctx: &mut OpContext, element: ElementId) {
    let live = ctx.live_of(element);
    while ctx.live.children(live).len() < PANES {
        let placeholder = ctx.live.create_placeholder();
        ctx.live.attach(live, placeholder, None);
    }
}

fn store_pane(ctx: &mut OpContext, child: ElementId, index: usize) {
    ctx.model.node_mut(child).packing.insert(
        "pane".to_string(),
        PropertyValue::Token(pane_token(index).to_string()),
    );
}

impl Adaptor for PanedAdaptor {
    fn general(&self) -> Option<&ArcAdaptor> {
        Some(&self.general)
    }

    fn post_create(
        &self,
        ctx: &mut OpContext,
        element: ElementId,
        reason: CreateReason,
    ) -> Result<(), AdaptorError> {
        if reason == CreateReason::User {
            ensure_panes(ctx, element);
        }
        Ok(())
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
        if !ctx.loading && ctx.live.element_children(live).len() >= PANES {
            return Err(AdaptorError::incompatible(
                ctx.name_of(container),
                ctx.name_of(child),
                "both panes are occupied",
            ));
        }

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
            let index = ctx
                .live
                .index_of(ctx.live_of(container), ctx.live_of(child))
                .unwrap_or(0);
            store_pane(ctx, child, index.min(1));
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
        if name != "pane" {
            return self
                .general
                .verify_packing_property(ctx, container, child, name, value);
        }
        match value.as_token().and_then(pane_index) {
            Some(_) => Ok(()),
            None => Err(AdaptorError::invalid_packing(
                name,
                ctx.name_of(child),
                "expected 'start' or 'end'",
            )),
        }
    }

    fn set_packing_property(
        &self,
        ctx: &mut OpContext,
        container: ElementId,
        child: ElementId,
        name: &str,
        value: PropertyValue,
    ) -> Result<(), AdaptorError> {
        if name != "pane" || ctx.displacing || ctx.loading {
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
        let target = value.as_token().and_then(pane_index).unwrap_or(0);

        let live = ctx.live_of(container);
        let child_live = ctx.live_of(child);
        let current = ctx.live.index_of(live, child_live).ok_or_else(|| {
            AdaptorError::invalid_packing(
                name,
                ctx.name_of(child),
                format!("not a child of '{}'", ctx.name_of(container)),
            )
        })?;
        if current == target {
            store_pane(ctx, child, target);
            return Ok(());
        }

        let occupant = ctx.live.children(live).get(target).copied();
        match occupant {
            Some(other) if ctx.live.node(other).is_placeholder() => {
                ctx.live.destroy(other);
                ctx.live.move_child(live, child_live, target);
                let placeholder = ctx.live.create_placeholder();
                ctx.live.attach(live, placeholder, Some(current));
            }
            Some(other) => {
                // The sibling did not ask for this pane; it is displaced into
                // the one the mover vacates.
                ctx.live.move_child(live, child_live, target);
                if let Some(sibling) = ctx.live.element_of(other) {
                    ctx.displacing = true;
                    store_pane(ctx, sibling, current);
                    ctx.displacing = false;
                }
            }
            None => {
                ctx.live.move_child(live, child_live, target);
            }
        }
        store_pane(ctx, child, target);
        ensure_panes(ctx, container);
        Ok(())
    }

    fn read_finished(&self, ctx: &mut OpContext, element: ElementId) -> Result<(), AdaptorError> {
        let live = ctx.live_of(element);
        let elements = ctx.live.element_children(live);
        if elements.len() > PANES {
            return Err(AdaptorError::incompatible(
                ctx.name_of(element),
                ctx.name_of(elements[PANES]),
                "a split pane holds at most two children",
            ));
        }

        // Recorded pane tokens win; a child without one takes the first free
        // pane in order.
        let mut occupants: [Option<ElementId>; PANES] = [None, None];
        let mut unplaced = Vec::new();
        for child in elements {
            let requested = ctx
                .model
                .node(child)
                .packing_value("pane")
                .and_then(|v| v.as_token().and_then(pane_index));
            match requested {
                Some(index) if occupants[index].is_none() => occupants[index] = Some(child),
                _ => unplaced.push(child),
            }
        }
        for child in unplaced {
            if let Some(slot) = occupants.iter_mut().find(|s| s.is_none()) {
                *slot = Some(child);
            }
        }

        for (index, occupant) in occupants.into_iter().enumerate() {
            match occupant {
                Some(child) => {
                    let child_live = ctx.live_of(child);
                    ctx.live.move_child(live, child_live, index);
                    store_pane(ctx, child, index);
                }
                None => {
                    let placeholder = ctx.live.create_placeholder();
                    ctx.live.attach(live, placeholder, Some(index));
                }
            }
        }
        Ok(())
    }
}
