//! udev event signalling.
//!
//! Both operations are best-effort: a failing udevadm is logged and otherwise
//! ignored. Lack of effect shows up later as a verification failure.

use xs_devs_hal::EventOps;

pub struct EventNotifier<'a, E: EventOps + ?Sized> {
    events: &'a E,
}

impl<'a, E: EventOps + ?Sized> EventNotifier<'a, E> {
    pub fn new(events: &'a E) -> Self {
        Self { events }
    }

    pub fn trigger_change(&self, devname: &str) {
        if let Err(err) = self.events.trigger_change(devname) {
            log::warn!("udev trigger for {} failed: {}", devname, err);
        }
    }

    /// Systemwide barrier; may block for a long time.
    pub fn settle(&self) {
        if let Err(err) = self.events.settle() {
            log::warn!("udev settle failed: {}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xs_devs_hal::{FakeHal, Operation};

    #[test]
    fn failures_are_not_propagated() {
        let hal = FakeHal::new();
        hal.fail_event_tools(true);
        let notifier = EventNotifier::new(&hal);

        notifier.trigger_change("sdb");
        notifier.settle();

        assert!(hal.has_operation(|op| matches!(op, Operation::Settle)));
        assert_eq!(hal.operation_count(), 2);
    }
}
