//! udev event operations (trigger, settle).

use crate::HalResult;

/// Device event trait.
pub trait EventOps {
    /// Ask udev to re-run its rules for the named block device.
    ///
    /// Returns once the request is submitted, not once it has been processed.
    fn trigger_change(&self, devname: &str) -> HalResult<()>;

    /// Block until every queued udev event on the host has been processed.
    fn settle(&self) -> HalResult<()>;
}
