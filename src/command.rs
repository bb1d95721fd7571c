//! Interface to the external undo/redo collaborator
//!
//! The core only ever performs forward operations. The collaborator groups
//! invocations into undoable actions and records prior/new values; what it
//! does with them is its own business. Live-side notifications reach it
//! through [`CommandSink::set_packing_property`] instead of mutating the
//! design model directly.

use crate::model::{ElementId, PropertyValue};

/// Receiver for operations the core wants routed through the command log
pub trait CommandSink {
    /// Open an undoable group; groups do not nest observably.
    fn begin_group(&mut self, label: &str);

    /// Close the current group.
    fn end_group(&mut self);

    /// Request a packing-property change carrying both the prior and the new
    /// value, so the collaborator can reverse it.
    fn set_packing_property(
        &mut self,
        child: ElementId,
        name: &str,
        old: PropertyValue,
        new: PropertyValue,
    );
}

/// One recorded sink invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordedCommand {
    BeginGroup(String),
    EndGroup,
    SetPackingProperty {
        child: ElementId,
        name: String,
        old: PropertyValue,
        new: PropertyValue,
    },
}

/// Sink that records every invocation; the collaborator embedding the core
/// replays or reverses them, and tests inspect them.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub commands: Vec<RecordedCommand>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl CommandSink for RecordingSink {
    fn begin_group(&mut self, label: &str) {
        self.commands.push(RecordedCommand::BeginGroup(label.to_string()));
    }

    fn end_group(&mut self) {
        self.commands.push(RecordedCommand::EndGroup);
    }

    fn set_packing_property(
        &mut self,
        child: ElementId,
        name: &str,
        old: PropertyValue,
        new: PropertyValue,
    ) {
        self.commands.push(RecordedCommand::SetPackingProperty {
            child,
            name: name.to_string(),
            old,
            new,
        });
    }
}

/// Sink that discards everything
#[derive(Debug, Default)]
pub struct NullSink;

impl CommandSink for NullSink {
    fn begin_group(&mut self, _label: &str) {}

    fn end_group(&mut self) {}

    fn set_packing_property(
        &mut self,
        _child: ElementId,
        _name: &str,
        _old: PropertyValue,
        _new: PropertyValue,
    ) {
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ElementId;

    #[test]
    fn test_recording_sink_keeps_order() {
        let mut sink = RecordingSink::new();
        sink.begin_group("reorder");
        sink.set_packing_property(
            ElementId(1),
            "position",
            PropertyValue::Int(0),
            PropertyValue::Int(2),
        );
        sink.end_group();

        assert_eq!(sink.commands.len(), 3);
        assert!(matches!(sink.commands[0], RecordedCommand::BeginGroup(_)));
        assert!(matches!(sink.commands[2], RecordedCommand::EndGroup));
    }
}
