//! Live-to-design synchronization
//!
//! Design-to-live flows through the adaptor operations themselves and is
//! synchronous by construction. This module handles the reverse direction:
//! a structural notification from the live tree is translated into the
//! equivalent packing-property change and handed to the command collaborator,
//! never applied to the design model directly. The project wraps every
//! design-driven operation in a notification guard, so a mutation it applies
//! can never come back around as a notification.

use log::{debug, warn};

use crate::command::CommandSink;
use crate::error::AdaptorError;
use crate::model::{ElementArena, PropertyValue};

use super::tree::{LiveEvent, LiveTree};

/// Translate one live-side notification into a `set_packing_property`
/// request on the command sink. Notifications touching placeholders or
/// unresolvable instances are dropped with a warning.
pub fn forward_live_event(
    model: &ElementArena,
    live: &LiveTree,
    event: &LiveEvent,
    sink: &mut dyn CommandSink,
) -> Result<(), AdaptorError> {
    match event {
        LiveEvent::ChildReordered {
            container,
            child,
            from,
            to,
        } => {
            let Some(child_element) = live.element_of(*child) else {
                debug!("ignoring reorder of a placeholder slot");
                return Ok(());
            };
            if live.element_of(*container).is_none() {
                warn!("reorder notification from an unowned live container");
                return Ok(());
            }

            let old = model
                .node(child_element)
                .packing_value("position")
                .cloned()
                .unwrap_or(PropertyValue::Int(*from as i32));
            let new = PropertyValue::Int(*to as i32);
            if old == new {
                return Ok(());
            }

            debug!(
                "live reorder of '{}': {:?} -> {:?}",
                model.node(child_element).name,
                old,
                new
            );
            sink.set_packing_property(child_element, "position", old, new);
            Ok(())
        }
    }
}
