//! Live instance tree and the design/live synchronizer

pub mod sync;
pub mod tree;

pub use sync::forward_live_event;
pub use tree::{LiveContent, LiveEvent, LiveId, LiveNode, LiveTree};
