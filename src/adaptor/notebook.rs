//! Notebook family: page slots plus `tab` special children
//!
//! The `pages` element property declares the page capacity; every page slot
//! holds a real child or a placeholder. Tab children occupy the special
//! `tab` slot list and use their `position` packing value to name the page
//! they label. Tabs are never placeheld.

use log::debug;

use crate::error::AdaptorError;
use crate::model::{ElementId, PropertyValue};

use super::container::{
    attach_child, detach_child, linear_reorder, renumber_positions, resolve_self,
    transferable_packing,
};
use super::{delete_subtree, Adaptor, ArcAdaptor, CreateReason, OpContext, QueryContext};

pub struct NotebookAdaptor {
    general: ArcAdaptor,
}

impl NotebookAdaptor {
    pub fn new(general: ArcAdaptor) -> Self {
        Self { general }
    }
}

fn is_tab(ctx_model: &crate::model::ElementArena, child: ElementId) -> bool {
    ctx_model.node(child).child_type.as_deref() == Some("tab")
}

fn store_pages(ctx: &mut OpContext, element: ElementId, pages: usize) {
    ctx.model
        .node_mut(element)
        .properties
        .insert("pages".to_string(), PropertyValue::Int(pages as i32));
}

fn tab_position(model: &crate::model::ElementArena, tab: ElementId) -> i32 {
    model
        .node(tab)
        .packing_value("position")
        .and_then(PropertyValue::as_int)
        .unwrap_or(0)
}

impl Adaptor for NotebookAdaptor {
    fn general(&self) -> Option<&ArcAdaptor> {
        Some(&self.general)
    }

    fn post_create(
        &self,
        ctx: &mut OpContext,
        element: ElementId,
        reason: CreateReason,
    ) -> Result<(), AdaptorError> {
        if reason == CreateReason::User && ctx.model.node(element).property("pages").is_none() {
            store_pages(ctx, element, 0);
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
        if is_tab(ctx.model, child) {
            ctx.model.attach(container, child, None);
            let container_live = ctx.live_of(container);
            let child_live = ctx.live_of(child);
            ctx.live.attach_special(container_live, "tab", child_live);

            let spec = ctx.spec_of(container);
            let labelled = (ctx.live.special_children(container_live).len() - 1) as i32;
            let packing = &mut ctx.model.node_mut(child).packing;
            packing.clear();
            for decl in &spec.packing {
                packing.insert(decl.name.clone(), decl.default.clone());
            }
            packing.insert("position".to_string(), PropertyValue::Int(labelled));
            return Ok(());
        }

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
            let pages = ctx.live.children(ctx.live_of(container)).len();
            store_pages(ctx, container, pages);
        }
        Ok(())
    }

    fn remove_child(
        &self,
        ctx: &mut OpContext,
        container: ElementId,
        child: ElementId,
    ) -> Result<(), AdaptorError> {
        if is_tab(ctx.model, child) {
            detach_child(ctx, container, child)?;
            return Ok(());
        }

        let index = detach_child(ctx, container, child)?;
        if !ctx.loading {
            let live = ctx.live_of(container);
            let placeholder = ctx.live.create_placeholder();
            ctx.live.attach(live, placeholder, Some(index));
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
        if !is_tab(ctx.model, current) {
            return self
                .general
                .replace_child(ctx, container, current, replacement);
        }

        let copied = transferable_packing(&ctx.query(), container, current);
        detach_child(ctx, container, current)?;
        ctx.model.node_mut(replacement).child_type = Some("tab".to_string());
        ctx.model.attach(container, replacement, None);
        let container_live = ctx.live_of(container);
        let replacement_live = ctx.live_of(replacement);
        ctx.live
            .attach_special(container_live, "tab", replacement_live);

        let spec = ctx.spec_of(container);
        let packing = &mut ctx.model.node_mut(replacement).packing;
        packing.clear();
        for decl in &spec.packing {
            packing.insert(decl.name.clone(), decl.default.clone());
        }
        for (name, value) in copied {
            packing.insert(name, value);
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
        let pages = ctx.live.children(ctx.live_of(container)).len() as i32;
        if position < 0 || position >= pages.max(1) {
            return Err(AdaptorError::invalid_packing(
                name,
                ctx.name_of(child),
                format!("page {} outside 0..{}", position, pages),
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
        if name != "position" || ctx.displacing || ctx.loading || is_tab(ctx.model, child) {
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

    fn verify_property(
        &self,
        ctx: &QueryContext,
        element: ElementId,
        name: &str,
        value: &PropertyValue,
    ) -> Result<(), AdaptorError> {
        if name != "pages" {
            return self.general.verify_property(ctx, element, name, value);
        }
        match value.as_int() {
            Some(v) if v >= 0 => Ok(()),
            _ => Err(AdaptorError::InvalidPropertyValue {
                name: name.to_string(),
                element: ctx.name_of(element),
                reason: "the page count must be a non-negative Int".to_string(),
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
        if name != "pages" {
            return self.general.set_property(ctx, element, name, value);
        }
        resolve_self(ctx, element).verify_property(&ctx.query(), element, name, &value)?;
        let new_pages = value.as_int().unwrap_or(0) as usize;

        if ctx.loading {
            store_pages(ctx, element, new_pages);
            return Ok(());
        }

        let live = ctx.live_of(element);
        while ctx.live.children(live).len() < new_pages {
            let placeholder = ctx.live.create_placeholder();
            ctx.live.attach(live, placeholder, None);
        }
        while ctx.live.children(live).len() > new_pages {
            let last = *ctx
                .live
                .children(live)
                .last()
                .expect("shrinking a non-empty page list");
            match ctx.live.element_of(last) {
                Some(page) => delete_subtree(ctx, page),
                None => ctx.live.destroy(last),
            }
        }

        // Tabs labelling removed pages go with them.
        let doomed_tabs: Vec<ElementId> = ctx
            .live
            .special_children(live)
            .iter()
            .filter_map(|(_, t)| ctx.live.element_of(*t))
            .filter(|tab| tab_position(ctx.model, *tab) >= new_pages as i32)
            .collect();
        for tab in doomed_tabs {
            debug!(
                "page shrink of '{}' deletes tab '{}'",
                ctx.model.node(element).name,
                ctx.model.node(tab).name
            );
            delete_subtree(ctx, tab);
        }

        store_pages(ctx, element, new_pages);
        renumber_positions(ctx, element);
        Ok(())
    }

    fn read_finished(&self, ctx: &mut OpContext, element: ElementId) -> Result<(), AdaptorError> {
        let live = ctx.live_of(element);
        let loaded = ctx.live.element_children(live);

        let declared = ctx
            .model
            .node(element)
            .property("pages")
            .and_then(PropertyValue::as_int)
            .unwrap_or(0)
            .max(0) as usize;

        let mut positioned: Vec<(i32, ElementId)> = loaded
            .iter()
            .map(|page| {
                let position = ctx
                    .model
                    .node(*page)
                    .packing_value("position")
                    .and_then(PropertyValue::as_int)
                    .unwrap_or(0);
                (position, *page)
            })
            .collect();
        positioned.sort_by_key(|(position, _)| *position);

        let highest = positioned
            .last()
            .map(|(position, _)| *position + 1)
            .unwrap_or(0)
            .max(0) as usize;
        let pages = declared.max(highest).max(positioned.len());

        let mut occupants: Vec<Option<ElementId>> = vec![None; pages];
        let mut overflow = Vec::new();
        for (position, page) in positioned {
            let index = position.max(0) as usize;
            match occupants.get_mut(index) {
                Some(slot @ None) => *slot = Some(page),
                _ => overflow.push(page),
            }
        }
        for page in overflow {
            if let Some(slot) = occupants.iter_mut().find(|s| s.is_none()) {
                *slot = Some(page);
            }
        }

        for (index, occupant) in occupants.into_iter().enumerate() {
            match occupant {
                Some(page) => {
                    let page_live = ctx.live_of(page);
                    ctx.live.move_child(live, page_live, index);
                }
                None => {
                    let placeholder = ctx.live.create_placeholder();
                    ctx.live.attach(live, placeholder, Some(index));
                }
            }
        }

        store_pages(ctx, element, pages);
        renumber_positions(ctx, element);
        Ok(())
    }
}
