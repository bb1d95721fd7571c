//! Document to design tree: element nodes first, attachment second, packing
//! state last
//!
//! The order is load-bearing: attaching a child assigns default packing
//! values, and the persisted packing state must be read afterwards so it can
//! override them. Placeholders never appear in documents; once the whole
//! tree is attached, each family reconciles its declared capacity against the
//! children it actually loaded and rebuilds them.

use crate::adaptor::Adaptor;
use crate::model::{ElementId, PropertyValue, ValueKind};
use crate::project::Project;

use super::{
    parse_str, DocNode, DocumentError, ATTR_CLASS, ATTR_ID, ATTR_INTERNAL, ATTR_NAME, ATTR_TYPE,
    TAG_CHILD, TAG_ELEMENT, TAG_PROPERTY, TAG_ROOT,
};

/// Reconstruct a design tree from an XML document, returning the toplevel
/// elements in document order.
pub fn read_document(project: &mut Project, xml: &str) -> Result<Vec<ElementId>, DocumentError> {
    let document = parse_str(xml)?;
    if document.name != TAG_ROOT {
        return Err(DocumentError::Malformed(format!(
            "expected a '{}' document, found '{}'",
            TAG_ROOT, document.name
        )));
    }

    project.begin_load();
    let result = read_roots(project, &document);
    project.end_load();
    result
}

fn read_roots(project: &mut Project, document: &DocNode) -> Result<Vec<ElementId>, DocumentError> {
    let mut roots = Vec::new();
    let mut created = Vec::new();
    for element in document.children_named(TAG_ELEMENT) {
        roots.push(read_element(project, element, None, &mut created)?);
    }

    // Capacity reconciliation runs children-first, so a container sees its
    // children already in their final slots.
    for element in &created {
        let adaptor = project.adaptor_of(*element)?;
        project.guarded(|ctx| adaptor.read_finished(ctx, *element))?;
    }
    Ok(roots)
}

fn read_element(
    project: &mut Project,
    node: &DocNode,
    parent: Option<(ElementId, &DocNode)>,
    created: &mut Vec<ElementId>,
) -> Result<ElementId, DocumentError> {
    let class = node
        .attr(ATTR_CLASS)
        .ok_or_else(|| DocumentError::Malformed("element without a class".to_string()))?;
    let element = project.create_element(class, node.attr(ATTR_ID))?;

    let adaptor = project.adaptor_of(element)?;
    for property in node.children_named(TAG_PROPERTY) {
        let name = property
            .attr(ATTR_NAME)
            .ok_or_else(|| DocumentError::Malformed("property without a name".to_string()))?
            .to_string();
        let value = decode_free_value(property.text.as_deref().unwrap_or_default());
        project.guarded(|ctx| adaptor.set_property(ctx, element, &name, value))?;
    }

    if let Some((container, wrapper)) = parent {
        {
            let node = project.model_mut().node_mut(element);
            node.child_type = wrapper.attr(ATTR_TYPE).map(str::to_string);
            node.internal = wrapper.attr(ATTR_INTERNAL).map(str::to_string);
        }
        let container_adaptor = project.adaptor_of(container)?;
        project.guarded(|ctx| {
            container_adaptor.add_child(ctx, container, element, false)?;
            container_adaptor.read_packing_state(ctx, container, element, wrapper)
        })?;
    }

    for wrapper in node.children_named(TAG_CHILD) {
        let Some(inner) = wrapper.child(TAG_ELEMENT) else {
            continue;
        };
        read_element(project, inner, Some((element, wrapper)), created)?;
    }

    created.push(element);
    Ok(element)
}

/// Element properties carry no declared kind in the document, so the value
/// shape is inferred: integers and booleans in canonical form decode as such,
/// anything else stays text.
fn decode_free_value(raw: &str) -> PropertyValue {
    if let Ok(PropertyValue::Int(v)) = PropertyValue::decode(ValueKind::Int, raw) {
        return PropertyValue::Int(v);
    }
    match raw {
        "true" | "false" => PropertyValue::Bool(raw == "true"),
        _ => PropertyValue::Text(raw.to_string()),
    }
}
