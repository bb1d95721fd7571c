//! Generic container behavior and the helpers family tables build on
//!
//! The generic table keeps one rule above all: a slot never stays empty. A
//! removed child leaves a placeholder behind, an added child consumes the
//! placeholder in its target slot, and a replacement swaps within the slot so
//! the container is never observably empty in between.

use log::debug;

use crate::document::DocNode;
use crate::error::AdaptorError;
use crate::model::{ElementId, PropertyValue};

use super::{Adaptor, ArcAdaptor, CreateReason, OpContext, QueryContext};

pub struct ContainerAdaptor {
    general: ArcAdaptor,
}

impl ContainerAdaptor {
    pub fn new(general: ArcAdaptor) -> Self {
        Self { general }
    }
}

/// Checks shared by every container family: toplevels never nest, locked
/// elements stay with their manager, and typed hosts only take the families
/// they declare. `require_placeholder` additionally demands a free slot.
pub(crate) fn base_add_checks(
    ctx: &QueryContext,
    container: ElementId,
    child: ElementId,
    require_placeholder: bool,
) -> Result<(), AdaptorError> {
    let child_node = ctx.model.node(child);
    let child_spec = ctx.spec_of(child);

    if child_spec.toplevel {
        return Err(AdaptorError::incompatible(
            ctx.name_of(container),
            child_node.name.clone(),
            "a toplevel element cannot be added to a container",
        ));
    }
    if let Some(owner) = child_node.locked_by {
        if owner != container {
            return Err(AdaptorError::incompatible(
                ctx.name_of(container),
                child_node.name.clone(),
                format!("the element is managed by '{}'", ctx.name_of(owner)),
            ));
        }
    }

    let container_spec = ctx.spec_of(container);
    if let Some(accepts) = &container_spec.accepts {
        let accepted = accepts.iter().any(|family| child_spec.is_a(family));
        if !accepted {
            return Err(AdaptorError::incompatible(
                ctx.name_of(container),
                child_node.name.clone(),
                format!("only {} children are accepted", accepts.join(", ")),
            ));
        }
    }

    if require_placeholder {
        let live = ctx.live_of(container);
        if ctx.live.placeholder_count(live) == 0 {
            return Err(AdaptorError::incompatible(
                ctx.name_of(container),
                child_node.name.clone(),
                "the container has no free slot",
            ));
        }
    }

    Ok(())
}

/// Attach `child` to both trees at `live_index` (append when `None`) and
/// instantiate its packing properties with the declared defaults.
pub(crate) fn attach_child(
    ctx: &mut OpContext,
    container: ElementId,
    child: ElementId,
    live_index: Option<usize>,
) {
    ctx.model.attach(container, child, None);
    let container_live = ctx.live_of(container);
    let child_live = ctx.live_of(child);
    ctx.live.attach(container_live, child_live, live_index);

    let spec = ctx.spec_of(container);
    let packing = &mut ctx.model.node_mut(child).packing;
    packing.clear();
    for decl in &spec.packing {
        packing.insert(decl.name.clone(), decl.default.clone());
    }
}

/// Detach `child` from both trees, destroying its packing properties.
/// Returns the vacated live slot index. Internal children are refused.
pub(crate) fn detach_child(
    ctx: &mut OpContext,
    container: ElementId,
    child: ElementId,
) -> Result<usize, AdaptorError> {
    let child_node = ctx.model.node(child);
    if child_node.is_internal() {
        return Err(AdaptorError::ImmovableChild {
            name: child_node.name.clone(),
        });
    }

    let container_live = ctx.live_of(container);
    let child_live = ctx.live_of(child);
    let index = ctx
        .live
        .index_of(container_live, child_live)
        .unwrap_or(usize::MAX);

    ctx.live.detach(child_live);
    ctx.model.detach(child);
    let node = ctx.model.node_mut(child);
    node.packing.clear();
    if node.locked_by == Some(container) {
        node.locked_by = None;
    }
    Ok(index)
}

/// Packing values of `current` that transfer to a replacement, in declaration
/// order. Properties declared `transfer = false` are left behind.
pub(crate) fn transferable_packing(
    ctx: &QueryContext,
    container: ElementId,
    current: ElementId,
) -> Vec<(String, PropertyValue)> {
    let spec = ctx.spec_of(container);
    let node = ctx.model.node(current);
    spec.packing
        .iter()
        .filter(|decl| decl.transfer)
        .filter_map(|decl| {
            node.packing_value(&decl.name)
                .map(|v| (decl.name.clone(), v.clone()))
        })
        .collect()
}

/// Re-dispatch an operation through the container's own (most-derived)
/// adaptor, so generic code applying packing values goes through the family's
/// overrides.
pub(crate) fn resolve_self(ctx: &OpContext, container: ElementId) -> ArcAdaptor {
    let family = &ctx.model.node(container).family;
    ctx.registry
        .resolve(family)
        .expect("unregistered family")
        .clone()
}

/// Rewrite the `position` packing value of every real child to its live slot
/// index. Linear families call this after any structural change, which keeps
/// positions unique and contiguous from 0..N-1.
pub(crate) fn renumber_positions(ctx: &mut OpContext, container: ElementId) {
    let live = ctx.live_of(container);
    let slots: Vec<(usize, Option<ElementId>)> = ctx
        .live
        .children(live)
        .iter()
        .enumerate()
        .map(|(i, c)| (i, ctx.live.element_of(*c)))
        .collect();
    for (index, element) in slots {
        if let Some(element) = element {
            ctx.model
                .node_mut(element)
                .packing
                .insert("position".to_string(), PropertyValue::Int(index as i32));
        }
    }
}

/// Move a real child to a new slot and displace the siblings in between by
/// renumbering every occupant from live order. The displacement guard on the
/// context keeps a cascade from re-entering itself when sibling updates are
/// replayed through `set_packing_property`.
pub(crate) fn linear_reorder(
    ctx: &mut OpContext,
    container: ElementId,
    child: ElementId,
    new_index: usize,
) {
    let live = ctx.live_of(container);
    let child_live = ctx.live_of(child);
    ctx.live.move_child(live, child_live, new_index);

    ctx.displacing = true;
    renumber_positions(ctx, container);
    ctx.displacing = false;
}

impl Adaptor for ContainerAdaptor {
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
        let spec = ctx.spec_of(element);

        if let Some(internal) = &spec.internal_child {
            let child = ctx.model.create(&internal.family, None);
            ctx.model.node_mut(child).internal = Some(internal.role.clone());
            ctx.live.create_widget(&internal.family, child);
            let child_adaptor = resolve_self_family(ctx, &internal.family);
            child_adaptor.post_create(ctx, child, reason)?;
            resolve_self(ctx, element).add_child(ctx, element, child, false)?;
        }

        let live = ctx.live_of(element);
        if spec.uses_placeholders && ctx.live.children(live).is_empty() {
            let placeholder = ctx.live.create_placeholder();
            ctx.live.attach(live, placeholder, None);
        }
        Ok(())
    }

    fn add_verify(
        &self,
        ctx: &QueryContext,
        container: ElementId,
        child: ElementId,
    ) -> Result<(), AdaptorError> {
        let spec = ctx.spec_of(container);
        base_add_checks(ctx, container, child, spec.uses_placeholders)
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
        let slot = if user_initiated && !ctx.loading {
            match ctx.live.first_placeholder(live) {
                Some(index) => {
                    let placeholder = ctx.live.children(live)[index];
                    ctx.live.destroy(placeholder);
                    Some(index)
                }
                None => None,
            }
        } else {
            None
        };

        attach_child(ctx, container, child, slot);
        debug!(
            "added '{}' to '{}'",
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
        let index = detach_child(ctx, container, child)?;

        let spec = ctx.spec_of(container);
        if spec.uses_placeholders && !ctx.loading {
            let live = ctx.live_of(container);
            let placeholder = ctx.live.create_placeholder();
            ctx.live.attach(live, placeholder, Some(index));
            debug!(
                "placeheld slot {} of '{}'",
                index,
                ctx.model.node(container).name
            );
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
        let copied = transferable_packing(&ctx.query(), container, current);
        let child_type = ctx.model.node(current).child_type.clone();

        let index = detach_child(ctx, container, current)?;
        attach_child(ctx, container, replacement, Some(index));
        ctx.model.node_mut(replacement).child_type = child_type;

        let adaptor = resolve_self(ctx, container);
        let was_displacing = ctx.displacing;
        ctx.displacing = true;
        for (name, value) in copied {
            adaptor.set_packing_property(ctx, container, replacement, &name, value)?;
        }
        ctx.displacing = was_displacing;
        Ok(())
    }

    fn children(&self, ctx: &QueryContext, container: ElementId) -> Vec<ElementId> {
        let live = ctx.live_of(container);
        let mut children = ctx.live.element_children(live);
        children.extend(
            ctx.live
                .special_children(live)
                .iter()
                .filter_map(|(_, c)| ctx.live.element_of(*c)),
        );
        children
    }

    fn packing_property(
        &self,
        ctx: &QueryContext,
        container: ElementId,
        child: ElementId,
        name: &str,
    ) -> Result<PropertyValue, AdaptorError> {
        let decl = require_decl(ctx, container, name)?;
        require_parentage(ctx, container, child, name)?;
        Ok(ctx
            .model
            .node(child)
            .packing_value(name)
            .cloned()
            .unwrap_or(decl))
    }

    fn verify_packing_property(
        &self,
        ctx: &QueryContext,
        container: ElementId,
        child: ElementId,
        name: &str,
        value: &PropertyValue,
    ) -> Result<(), AdaptorError> {
        let spec = ctx.spec_of(container);
        let decl = spec
            .packing_decl(name)
            .ok_or_else(|| AdaptorError::unknown_packing(&spec.name, name))?;
        if value.kind() != decl.kind {
            return Err(AdaptorError::invalid_packing(
                name,
                ctx.name_of(child),
                format!("expected a {:?} value", decl.kind),
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
        let adaptor = resolve_self(ctx, container);
        adaptor.verify_packing_property(&ctx.query(), container, child, name, &value)?;
        require_parentage(&ctx.query(), container, child, name)?;
        ctx.model
            .node_mut(child)
            .packing
            .insert(name.to_string(), value);
        Ok(())
    }

    fn write_packing_state(
        &self,
        ctx: &QueryContext,
        container: ElementId,
        child: ElementId,
        node: &mut DocNode,
    ) -> Result<(), AdaptorError> {
        let spec = ctx.spec_of(container);
        let child_node = ctx.model.node(child);

        let mut packing = DocNode::new("packing");
        for decl in &spec.packing {
            if let Some(value) = child_node.packing_value(&decl.name) {
                let mut entry = DocNode::new("property");
                entry.set_attr("name", &decl.name);
                entry.text = Some(value.encode());
                packing.children.push(entry);
            }
        }
        if !packing.children.is_empty() {
            node.children.push(packing);
        }
        Ok(())
    }

    fn read_packing_state(
        &self,
        ctx: &mut OpContext,
        container: ElementId,
        child: ElementId,
        node: &DocNode,
    ) -> Result<(), AdaptorError> {
        let Some(packing) = node.child("packing") else {
            return Ok(());
        };
        // Persisted values overwrite the defaults assigned at attachment
        // directly; capacity-dependent normalization happens once the whole
        // load has finished.
        let spec = ctx.spec_of(container);
        for entry in packing.children_named("property") {
            let Some(name) = entry.attr("name") else {
                continue;
            };
            let decl = spec
                .packing_decl(name)
                .ok_or_else(|| AdaptorError::unknown_packing(&spec.name, name))?;
            let raw = entry.text.clone().unwrap_or_default();
            let value = PropertyValue::decode(decl.kind, &raw).map_err(|e| {
                AdaptorError::invalid_packing(name, ctx.name_of(child), e.to_string())
            })?;
            ctx.model
                .node_mut(child)
                .packing
                .insert(name.to_string(), value);
        }
        Ok(())
    }

    fn read_finished(&self, ctx: &mut OpContext, element: ElementId) -> Result<(), AdaptorError> {
        let spec = ctx.spec_of(element);

        if let Some(internal) = &spec.internal_child {
            let has_internal = ctx
                .model
                .node(element)
                .children()
                .iter()
                .any(|c| ctx.model.node(*c).internal.as_deref() == Some(internal.role.as_str()));
            if !has_internal {
                let child = ctx.model.create(&internal.family, None);
                ctx.model.node_mut(child).internal = Some(internal.role.clone());
                ctx.live.create_widget(&internal.family, child);
                resolve_self(ctx, element).add_child(ctx, element, child, false)?;
            }
        }

        let live = ctx.live_of(element);
        if spec.uses_placeholders && ctx.live.children(live).is_empty() {
            let placeholder = ctx.live.create_placeholder();
            ctx.live.attach(live, placeholder, None);
        }
        Ok(())
    }
}

fn resolve_self_family(ctx: &OpContext, family: &str) -> ArcAdaptor {
    ctx.registry
        .resolve(family)
        .expect("unregistered family")
        .clone()
}

fn require_decl(
    ctx: &QueryContext,
    container: ElementId,
    name: &str,
) -> Result<PropertyValue, AdaptorError> {
    let spec = ctx.spec_of(container);
    spec.packing_decl(name)
        .map(|d| d.default.clone())
        .ok_or_else(|| AdaptorError::unknown_packing(&spec.name, name))
}

fn require_parentage(
    ctx: &QueryContext,
    container: ElementId,
    child: ElementId,
    name: &str,
) -> Result<(), AdaptorError> {
    if ctx.model.node(child).parent() != Some(container) {
        return Err(AdaptorError::invalid_packing(
            name,
            ctx.name_of(child),
            format!("not a child of '{}'", ctx.name_of(container)),
        ));
    }
    Ok(())
}
