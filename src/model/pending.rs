use std::cell::RefCell;
use std::rc::Rc;

use crate::model::GeometryRecord;

/// Single-slot mailbox between the feed listener and the buffer manager.
///
/// Last write wins: publishing over an unconsumed record replaces it. Handles are
/// cheap clones of one shared slot. The slot is `!Send`, so every handle lives on the
/// thread that dispatches both feed callbacks and render ticks.
#[derive(Clone, Default)]
pub struct PendingGeometry {
    slot: Rc<RefCell<Option<GeometryRecord>>>,
}

impl PendingGeometry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `record`, returning the unconsumed record it superseded, if any.
    pub fn publish(&self, record: GeometryRecord) -> Option<GeometryRecord> {
        self.slot.borrow_mut().replace(record)
    }

    pub fn take(&self) -> Option<GeometryRecord> {
        self.slot.borrow_mut().take()
    }
}
