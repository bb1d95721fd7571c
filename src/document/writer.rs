//! Design tree to document: walks containers through their adaptor hooks

use crate::adaptor::{Adaptor, QueryContext};
use crate::model::ElementId;
use crate::project::Project;

use super::{
    emit_str, DocNode, DocumentError, ATTR_CLASS, ATTR_ID, ATTR_INTERNAL, ATTR_NAME, ATTR_TYPE,
    TAG_CHILD, TAG_ELEMENT, TAG_PROPERTY, TAG_ROOT,
};

/// Serialize the subtrees rooted at `roots` into an XML document.
/// Placeholders are not persisted; capacity-bearing families rebuild them on
/// load.
pub fn write_document(project: &Project, roots: &[ElementId]) -> Result<String, DocumentError> {
    let ctx = project.query();
    let mut document = DocNode::new(TAG_ROOT);
    for root in roots {
        document.children.push(write_element(&ctx, *root)?);
    }
    emit_str(&document)
}

fn write_element(ctx: &QueryContext, element: ElementId) -> Result<DocNode, DocumentError> {
    let node = ctx.model.node(element);
    let mut out = DocNode::new(TAG_ELEMENT);
    out.set_attr(ATTR_CLASS, &node.family);
    out.set_attr(ATTR_ID, &node.name);

    for (name, value) in &node.properties {
        let mut property = DocNode::new(TAG_PROPERTY);
        property.set_attr(ATTR_NAME, name);
        property.text = Some(value.encode());
        out.children.push(property);
    }

    let adaptor = ctx.registry.resolve(&node.family)?;
    for child in adaptor.children(ctx, element) {
        let child_node = ctx.model.node(child);
        let mut wrapper = DocNode::new(TAG_CHILD);
        if let Some(child_type) = &child_node.child_type {
            wrapper.set_attr(ATTR_TYPE, child_type);
        }
        if let Some(role) = &child_node.internal {
            wrapper.set_attr(ATTR_INTERNAL, role);
        }
        wrapper.children.push(write_element(ctx, child)?);
        adaptor.write_packing_state(ctx, element, child, &mut wrapper)?;
        out.children.push(wrapper);
    }

    Ok(out)
}
