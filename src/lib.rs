//! UI Composer - design-model core for a visual interface builder
//!
//! This library keeps three representations of an interface in lock-step: the
//! design model (a serializable tree of elements and named properties), the
//! live instance tree the user sees and manipulates, and the XML document the
//! tree persists as. Container behavior is supplied per element family by
//! adaptors resolved from a declarative catalog.
//!
//! # Example
//!
//! ```rust
//! use ui_composer::{write_document, Project, PropertyValue};
//!
//! let mut project = Project::with_standard_catalog().unwrap();
//! let window = project.create_element("window", Some("main")).unwrap();
//! let content = project.create_element("box", None).unwrap();
//! project.add_child(window, content, true).unwrap();
//! project.set_property(content, "size", PropertyValue::Int(2)).unwrap();
//!
//! let button = project.create_element("button", None).unwrap();
//! project.add_child(content, button, true).unwrap();
//!
//! let xml = write_document(&project, &[window]).unwrap();
//! assert!(xml.contains("interface"));
//! assert!(xml.contains("position"));
//! ```

pub mod adaptor;
pub mod catalog;
pub mod command;
pub mod document;
pub mod error;
pub mod live;
pub mod model;
pub mod project;

use thiserror::Error;

pub use adaptor::{Adaptor, ArcAdaptor, CreateReason, OpContext, QueryContext};
pub use catalog::{AdaptorRegistry, Catalog, CatalogError, FamilySpec};
pub use command::{CommandSink, NullSink, RecordedCommand, RecordingSink};
pub use document::{read_document, write_document, DocNode, DocumentError};
pub use error::AdaptorError;
pub use live::{LiveContent, LiveEvent, LiveId, LiveTree};
pub use model::{ElementArena, ElementId, ElementNode, PropertyValue, ValueKind};
pub use project::Project;

/// Errors that can surface from the composition core
#[derive(Debug, Error)]
pub enum ComposerError {
    /// Catalog loading or registry construction failed
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),

    /// An adaptor operation was refused
    #[error("adaptor error: {0}")]
    Adaptor(#[from] AdaptorError),

    /// Document serialization failed
    #[error("document error: {0}")]
    Document(#[from] DocumentError),

    /// An element id no longer resolves
    #[error("the element no longer exists")]
    UnknownElement,
}

impl From<ComposerError> for DocumentError {
    fn from(err: ComposerError) -> Self {
        match err {
            ComposerError::Catalog(e) => DocumentError::Catalog(e),
            ComposerError::Adaptor(e) => DocumentError::Adaptor(e),
            ComposerError::Document(e) => e,
            ComposerError::UnknownElement => {
                DocumentError::Malformed("element no longer exists".to_string())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_project_builds() {
        let project = Project::with_standard_catalog().expect("Should build");
        assert!(project.registry().contains("box"));
        assert!(project.registry().contains("grid"));
    }

    #[test]
    fn test_unknown_family_refused() {
        let mut project = Project::with_standard_catalog().expect("Should build");
        let result = project.create_element("gizmo", None);
        assert!(matches!(
            result,
            Err(ComposerError::Catalog(CatalogError::UnknownType { .. }))
        ));
    }

    #[test]
    fn test_leaf_refuses_children() {
        let mut project = Project::with_standard_catalog().expect("Should build");
        let button = project.create_element("button", None).expect("Should create");
        let label = project.create_element("label", None).expect("Should create");
        let result = project.add_child(button, label, true);
        assert!(matches!(
            result,
            Err(ComposerError::Adaptor(AdaptorError::IncompatibleChild { .. }))
        ));
    }
}
