//! Root capability table for leaf elements
//!
//! Leaf behavior lives in the trait's provided method bodies, so this table
//! overrides nothing; it exists to terminate adaptor chains and to service
//! families whose manifest binds the plain widget behavior.

use super::{Adaptor, ArcAdaptor};

pub struct WidgetAdaptor {
    general: Option<ArcAdaptor>,
}

impl WidgetAdaptor {
    pub fn new(general: Option<ArcAdaptor>) -> Self {
        Self { general }
    }
}

impl Adaptor for WidgetAdaptor {
    fn general(&self) -> Option<&ArcAdaptor> {
        self.general.as_ref()
    }
}
