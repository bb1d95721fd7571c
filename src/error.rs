//! Error types for container and packing operations

use thiserror::Error;

/// Errors raised by adaptor operations.
///
/// Every operation that returns one of these guarantees it has not mutated
/// the design tree or the live tree: a refused operation leaves both exactly
/// as they were.
#[derive(Debug, Error)]
pub enum AdaptorError {
    /// The container's family refuses this child
    #[error("'{container}' cannot accept '{child}': {reason}")]
    IncompatibleChild {
        container: String,
        child: String,
        reason: String,
    },

    /// A packing value failed verification
    #[error("invalid value for packing property '{name}' of '{child}': {reason}")]
    InvalidPackingValue {
        name: String,
        child: String,
        reason: String,
    },

    /// Two children resolved to the same slot and displacement could not
    /// resolve it
    #[error("slot conflict in '{container}': {reason}")]
    SlotConflict { container: String, reason: String },

    /// The family chain declares no packing property of this name
    #[error("family '{family}' declares no packing property '{name}'")]
    UnknownPackingProperty { family: String, name: String },

    /// The element has no property of this name
    #[error("'{element}' has no property '{name}'")]
    UnknownProperty { element: String, name: String },

    /// A container-level property value failed verification (declared
    /// capacities and the like)
    #[error("invalid value for property '{name}' of '{element}': {reason}")]
    InvalidPropertyValue {
        name: String,
        element: String,
        reason: String,
    },

    /// The family supports no child operation of this name
    #[error("family '{family}' has no child operation '{action}'")]
    UnknownChildAction { family: String, action: String },

    /// The child is managed by its parent and cannot be detached on its own
    #[error("'{name}' is managed by its parent and cannot be detached")]
    ImmovableChild { name: String },
}

impl AdaptorError {
    pub fn incompatible(
        container: impl Into<String>,
        child: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::IncompatibleChild {
            container: container.into(),
            child: child.into(),
            reason: reason.into(),
        }
    }

    pub fn invalid_packing(
        name: impl Into<String>,
        child: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidPackingValue {
            name: name.into(),
            child: child.into(),
            reason: reason.into(),
        }
    }

    pub fn slot_conflict(container: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::SlotConflict {
            container: container.into(),
            reason: reason.into(),
        }
    }

    pub fn unknown_packing(family: impl Into<String>, name: impl Into<String>) -> Self {
        Self::UnknownPackingProperty {
            family: family.into(),
            name: name.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_incompatible_child_display() {
        let err = AdaptorError::incompatible("paned1", "button3", "the container is at capacity");
        assert!(err.to_string().contains("paned1"));
        assert!(err.to_string().contains("at capacity"));
    }

    #[test]
    fn test_invalid_packing_display() {
        let err = AdaptorError::invalid_packing("position", "button1", "out of range");
        assert!(err.to_string().contains("position"));
    }
}
