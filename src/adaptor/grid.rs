//! Grid family: two-axis slots addressed by attach and span packing
//!
//! Capacity is declared by the `n-rows` and `n-columns` element properties.
//! Every cell not covered by a real child carries exactly one 1x1
//! placeholder; the placeholder set is recomputed after any structural or
//! attachment change rather than patched incrementally.

use log::debug;

use crate::error::AdaptorError;
use crate::live::LiveId;
use crate::model::{ElementId, PropertyValue};

use super::container::{attach_child, detach_child, resolve_self};
use super::{delete_subtree, Adaptor, ArcAdaptor, CreateReason, OpContext, QueryContext};

pub struct GridAdaptor {
    general: ArcAdaptor,
}

impl GridAdaptor {
    pub fn new(general: ArcAdaptor) -> Self {
        Self { general }
    }
}

const ATTACH_NAMES: [&str; 4] = ["left-attach", "top-attach", "width", "height"];

/// Attachment rectangle of one child, read from its packing properties
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Attach {
    left: i32,
    top: i32,
    width: i32,
    height: i32,
}

impl Attach {
    fn covers(&self, column: i32, row: i32) -> bool {
        column >= self.left
            && column < self.left + self.width
            && row >= self.top
            && row < self.top + self.height
    }

    fn overlaps(&self, other: &Attach) -> bool {
        self.left < other.left + other.width
            && other.left < self.left + self.width
            && self.top < other.top + other.height
            && other.top < self.top + self.height
    }
}

fn attach_of(model: &crate::model::ElementArena, child: ElementId) -> Attach {
    let node = model.node(child);
    let get = |name: &str, fallback: i32| {
        node.packing_value(name)
            .and_then(PropertyValue::as_int)
            .unwrap_or(fallback)
    };
    Attach {
        left: get("left-attach", 0),
        top: get("top-attach", 0),
        width: get("width", 1).max(1),
        height: get("height", 1).max(1),
    }
}

fn dims(model: &crate::model::ElementArena, element: ElementId) -> (i32, i32) {
    let node = model.node(element);
    let get = |name: &str| {
        node.property(name)
            .and_then(PropertyValue::as_int)
            .unwrap_or(1)
            .max(1)
    };
    (get("n-rows"), get("n-columns"))
}

fn store_dims(ctx: &mut OpContext, element: ElementId, rows: i32, columns: i32) {
    let properties = &mut ctx.model.node_mut(element).properties;
    properties.insert("n-rows".to_string(), PropertyValue::Int(rows));
    properties.insert("n-columns".to_string(), PropertyValue::Int(columns));
}

/// Copy a child's attachment rectangle onto its live node so the instance
/// tree always reflects the stored packing.
fn apply_layout(ctx: &mut OpContext, child: ElementId) {
    let attach = attach_of(ctx.model, child);
    let live = ctx.live_of(child);
    let layout = &mut ctx.live.node_mut(live).layout;
    layout.insert("left-attach".to_string(), PropertyValue::Int(attach.left));
    layout.insert("top-attach".to_string(), PropertyValue::Int(attach.top));
    layout.insert("width".to_string(), PropertyValue::Int(attach.width));
    layout.insert("height".to_string(), PropertyValue::Int(attach.height));
}

fn placeholder_cell(ctx: &OpContext, placeholder: LiveId) -> (i32, i32) {
    let layout = &ctx.live.node(placeholder).layout;
    let get = |name: &str| {
        layout
            .get(name)
            .and_then(PropertyValue::as_int)
            .unwrap_or(0)
    };
    (get("left-attach"), get("top-attach"))
}

/// Rebuild the placeholder set: exactly one per uncovered cell, in reading
/// order.
fn refresh_placeholders(ctx: &mut OpContext, container: ElementId) {
    let live = ctx.live_of(container);
    for placeholder in ctx.live.placeholders_of(live) {
        ctx.live.destroy(placeholder);
    }

    let (rows, columns) = dims(ctx.model, container);
    let attaches: Vec<Attach> = ctx
        .live
        .element_children(live)
        .into_iter()
        .map(|child| attach_of(ctx.model, child))
        .collect();

    for row in 0..rows {
        for column in 0..columns {
            if attaches.iter().any(|a| a.covers(column, row)) {
                continue;
            }
            let placeholder = ctx.live.create_placeholder();
            let layout = &mut ctx.live.node_mut(placeholder).layout;
            layout.insert("left-attach".to_string(), PropertyValue::Int(column));
            layout.insert("top-attach".to_string(), PropertyValue::Int(row));
            layout.insert("width".to_string(), PropertyValue::Int(1));
            layout.insert("height".to_string(), PropertyValue::Int(1));
            ctx.live.attach(live, placeholder, None);
        }
    }
}

/// The real child overlapping `attach`, excluding `except`
fn find_overlap(
    ctx: &OpContext,
    container: ElementId,
    except: ElementId,
    attach: &Attach,
) -> Option<ElementId> {
    let live = ctx.live_of(container);
    ctx.live
        .element_children(live)
        .into_iter()
        .filter(|child| *child != except)
        .find(|child| attach_of(ctx.model, *child).overlaps(attach))
}

impl Adaptor for GridAdaptor {
    fn general(&self) -> Option<&ArcAdaptor> {
        Some(&self.general)
    }

    fn post_create(
        &self,
        ctx: &mut OpContext,
        element: ElementId,
        reason: CreateReason,
    ) -> Result<(), AdaptorError> {
        if reason != CreateReason::User {
            return Ok(());
        }
        let (rows, columns) = dims(ctx.model, element);
        store_dims(ctx, element, rows, columns);
        refresh_placeholders(ctx, element);
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

        let cell = if ctx.loading {
            None
        } else {
            let live = ctx.live_of(container);
            // Target the free cell closest to the origin in reading order.
            let mut cells: Vec<(LiveId, (i32, i32))> = ctx
                .live
                .placeholders_of(live)
                .into_iter()
                .map(|p| (p, placeholder_cell(ctx, p)))
                .collect();
            cells.sort_by_key(|(_, (column, row))| (*row, *column));
            cells.first().map(|(p, cell)| (*p, *cell))
        };

        match cell {
            Some((placeholder, (column, row))) => {
                ctx.live.destroy(placeholder);
                attach_child(ctx, container, child, None);
                let packing = &mut ctx.model.node_mut(child).packing;
                packing.insert("left-attach".to_string(), PropertyValue::Int(column));
                packing.insert("top-attach".to_string(), PropertyValue::Int(row));
                apply_layout(ctx, child);
                refresh_placeholders(ctx, container);
            }
            None => {
                attach_child(ctx, container, child, None);
                if !ctx.loading {
                    apply_layout(ctx, child);
                    refresh_placeholders(ctx, container);
                }
            }
        }
        debug!(
            "attached '{}' in grid '{}'",
            ctx.model.node(child).name,
            ctx.model.node(container).name
        );
        Ok(())
    }

    fn remove_child(
        &self,
        ctx: &mut OpContext,
        container: ElementId,
        child: ElementId,
    ) -> Result<(), AdaptorError> {
        detach_child(ctx, container, child)?;
        if !ctx.loading {
            refresh_placeholders(ctx, container);
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
        apply_layout(ctx, replacement);
        refresh_placeholders(ctx, container);
        Ok(())
    }

    fn children(&self, ctx: &QueryContext, container: ElementId) -> Vec<ElementId> {
        let mut children = self.general.children(ctx, container);
        children.sort_by_key(|child| {
            let attach = attach_of(ctx.model, *child);
            (attach.top, attach.left)
        });
        children
    }

    fn verify_packing_property(
        &self,
        ctx: &QueryContext,
        container: ElementId,
        child: ElementId,
        name: &str,
        value: &PropertyValue,
    ) -> Result<(), AdaptorError> {
        if !ATTACH_NAMES.contains(&name) {
            return self
                .general
                .verify_packing_property(ctx, container, child, name, value);
        }
        let v = value.as_int().ok_or_else(|| {
            AdaptorError::invalid_packing(name, ctx.name_of(child), "expected an Int value")
        })?;

        let node = ctx.model.node(container);
        let rows = node
            .property("n-rows")
            .and_then(PropertyValue::as_int)
            .unwrap_or(1);
        let columns = node
            .property("n-columns")
            .and_then(PropertyValue::as_int)
            .unwrap_or(1);
        let child_node = ctx.model.node(child);
        let packed = |other: &str, fallback: i32| {
            child_node
                .packing_value(other)
                .and_then(PropertyValue::as_int)
                .unwrap_or(fallback)
        };

        let fits = match name {
            "left-attach" => v >= 0 && v + packed("width", 1) <= columns,
            "width" => v >= 1 && packed("left-attach", 0) + v <= columns,
            "top-attach" => v >= 0 && v + packed("height", 1) <= rows,
            "height" => v >= 1 && packed("top-attach", 0) + v <= rows,
            _ => true,
        };
        if !fits {
            return Err(AdaptorError::invalid_packing(
                name,
                child_node.name.clone(),
                format!("{} does not fit a {}x{} grid", v, rows, columns),
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
        if !ATTACH_NAMES.contains(&name) || ctx.loading || ctx.displacing {
            return self
                .general
                .set_packing_property(ctx, container, child, name, value);
        }

        // Store through the generic path (verification included), then check
        // the resulting rectangle; on a collision the old value is restored
        // so the operation leaves no trace.
        let old = ctx.model.node(child).packing_value(name).cloned();
        self.general
            .set_packing_property(ctx, container, child, name, value)?;

        let attach = attach_of(ctx.model, child);
        if let Some(other) = find_overlap(ctx, container, child, &attach) {
            let conflict = AdaptorError::slot_conflict(
                ctx.name_of(container),
                format!(
                    "'{}' and '{}' would occupy the same cell",
                    ctx.name_of(child),
                    ctx.name_of(other)
                ),
            );
            let packing = &mut ctx.model.node_mut(child).packing;
            match old {
                Some(old) => {
                    packing.insert(name.to_string(), old);
                }
                None => {
                    packing.remove(name);
                }
            }
            return Err(conflict);
        }

        apply_layout(ctx, child);
        refresh_placeholders(ctx, container);
        Ok(())
    }

    fn verify_property(
        &self,
        ctx: &QueryContext,
        element: ElementId,
        name: &str,
        value: &PropertyValue,
    ) -> Result<(), AdaptorError> {
        if name != "n-rows" && name != "n-columns" {
            return self.general.verify_property(ctx, element, name, value);
        }
        match value.as_int() {
            Some(v) if v >= 1 => Ok(()),
            _ => Err(AdaptorError::InvalidPropertyValue {
                name: name.to_string(),
                element: ctx.name_of(element),
                reason: "a grid keeps at least one row and one column".to_string(),
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
        if name != "n-rows" && name != "n-columns" {
            return self.general.set_property(ctx, element, name, value);
        }
        resolve_self(ctx, element).verify_property(&ctx.query(), element, name, &value)?;
        ctx.model
            .node_mut(element)
            .properties
            .insert(name.to_string(), value);
        if ctx.loading {
            return Ok(());
        }

        // Capacity shrink cascades: children that no longer fit are deleted.
        let (rows, columns) = dims(ctx.model, element);
        let live = ctx.live_of(element);
        let doomed: Vec<ElementId> = ctx
            .live
            .element_children(live)
            .into_iter()
            .filter(|child| {
                let a = attach_of(ctx.model, *child);
                a.left + a.width > columns || a.top + a.height > rows
            })
            .collect();
        for child in doomed {
            debug!(
                "capacity shrink of '{}' deletes '{}'",
                ctx.model.node(element).name,
                ctx.model.node(child).name
            );
            delete_subtree(ctx, child);
        }
        refresh_placeholders(ctx, element);
        Ok(())
    }

    fn child_action(
        &self,
        ctx: &mut OpContext,
        container: ElementId,
        slot: usize,
        action: &str,
    ) -> Result<(), AdaptorError> {
        let (rows, columns) = dims(ctx.model, container);
        let (horizontal, remove) = match action {
            "insert-row" => (false, false),
            "remove-row" => (false, true),
            "insert-column" => (true, false),
            "remove-column" => (true, true),
            _ => return self.general.child_action(ctx, container, slot, action),
        };
        let extent = if horizontal { columns } else { rows };
        let at = slot as i32;
        if remove && (at >= extent || extent <= 1) {
            return Err(AdaptorError::InvalidPropertyValue {
                name: if horizontal { "n-columns" } else { "n-rows" }.to_string(),
                element: ctx.name_of(container),
                reason: format!("cannot remove line {} of {}", at, extent),
            });
        }

        let (attach_name, span_name) = if horizontal {
            ("left-attach", "width")
        } else {
            ("top-attach", "height")
        };

        let live = ctx.live_of(container);
        let children = ctx.live.element_children(live);
        let mut doomed = Vec::new();
        for child in children {
            let node = ctx.model.node(child);
            let start = node
                .packing_value(attach_name)
                .and_then(PropertyValue::as_int)
                .unwrap_or(0);
            let span = node
                .packing_value(span_name)
                .and_then(PropertyValue::as_int)
                .unwrap_or(1)
                .max(1);

            let (new_start, new_span) = if remove {
                if start == at && span == 1 {
                    doomed.push(child);
                    continue;
                } else if start <= at && at < start + span {
                    (start, span - 1)
                } else if start > at {
                    (start - 1, span)
                } else {
                    (start, span)
                }
            } else if start >= at {
                (start + 1, span)
            } else {
                (start, span)
            };

            let packing = &mut ctx.model.node_mut(child).packing;
            packing.insert(attach_name.to_string(), PropertyValue::Int(new_start));
            packing.insert(span_name.to_string(), PropertyValue::Int(new_span));
            apply_layout(ctx, child);
        }
        for child in doomed {
            delete_subtree(ctx, child);
        }

        let delta = if remove { -1 } else { 1 };
        if horizontal {
            store_dims(ctx, container, rows, columns + delta);
        } else {
            store_dims(ctx, container, rows + delta, columns);
        }
        refresh_placeholders(ctx, container);
        Ok(())
    }

    fn read_finished(&self, ctx: &mut OpContext, element: ElementId) -> Result<(), AdaptorError> {
        let live = ctx.live_of(element);
        let children = ctx.live.element_children(live);

        let (mut rows, mut columns) = dims(ctx.model, element);
        for child in &children {
            let attach = attach_of(ctx.model, *child);
            rows = rows.max(attach.top + attach.height);
            columns = columns.max(attach.left + attach.width);
        }
        store_dims(ctx, element, rows, columns);

        for child in &children {
            let attach = attach_of(ctx.model, *child);
            if let Some(other) = find_overlap(ctx, element, *child, &attach) {
                return Err(AdaptorError::slot_conflict(
                    ctx.name_of(element),
                    format!(
                        "'{}' and '{}' occupy the same cell",
                        ctx.name_of(*child),
                        ctx.name_of(other)
                    ),
                ));
            }
            apply_layout(ctx, *child);
        }

        refresh_placeholders(ctx, element);
        Ok(())
    }
}
