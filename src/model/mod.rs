//! Design model: element nodes, typed values, and id-based tree storage

pub mod arena;
pub mod element;
pub mod value;

pub use arena::{ElementArena, ElementId};
pub use element::ElementNode;
pub use value::{PropertyValue, ValueDecodeError, ValueKind};
