//! The tagging protocol.
//!
//! A tag is proposed by writing a marker and triggering udev, then confirmed
//! only after a settle barrier by reading the device's tags back. There is no
//! per-device acknowledgment; settle is the only synchronisation point.

use crate::markers::MarkerStore;
use crate::notifier::EventNotifier;
use crate::resolver::DeviceResolver;
use std::collections::BTreeSet;
use std::fmt;
use xs_devs_error::{XsDevsError, XsResult};
use xs_devs_hal::SystemHal;

pub const TAG_PREFIX: &str = "inuse_";

/// Tag expected on a device once udev has processed a claim by `system`.
pub fn expected_tag(system: &str) -> String {
    format!("{}{}", TAG_PREFIX, system)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagPhase {
    Resolving,
    Marking,
    Triggered,
    Settled,
    Verifying,
    Committed,
    RolledBack,
}

impl fmt::Display for TagPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TagPhase::Resolving => "RESOLVING",
            TagPhase::Marking => "MARKING",
            TagPhase::Triggered => "TRIGGERED",
            TagPhase::Settled => "SETTLED",
            TagPhase::Verifying => "VERIFYING",
            TagPhase::Committed => "COMMITTED",
            TagPhase::RolledBack => "ROLLED_BACK",
        };
        f.write_str(s)
    }
}

/// Result of a successful `tag` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagReceipt {
    /// Device actually marked (the whole disk when a partition was named).
    pub device: String,
    pub system: String,
    /// False when verification was skipped.
    pub verified: bool,
}

pub struct Tagger<'a, H: SystemHal + ?Sized> {
    hal: &'a H,
    store: &'a MarkerStore,
}

/// Debug trace of the phases one `tag` call passes through.
struct PhaseLog<'s> {
    device: &'s str,
    system: &'s str,
    trail: &'s mut Vec<TagPhase>,
}

impl<'s> PhaseLog<'s> {
    fn start(device: &'s str, system: &'s str, trail: &'s mut Vec<TagPhase>) -> Self {
        log::debug!("tag {} as {}: {}", device, system, TagPhase::Resolving);
        trail.clear();
        trail.push(TagPhase::Resolving);
        Self {
            device,
            system,
            trail,
        }
    }

    fn advance(&mut self, next: TagPhase) {
        let current = self.trail.last().copied().unwrap_or(TagPhase::Resolving);
        log::debug!(
            "tag {} as {}: {} -> {}",
            self.device,
            self.system,
            current,
            next
        );
        self.trail.push(next);
    }
}

impl<'a, H: SystemHal + ?Sized> Tagger<'a, H> {
    pub fn new(hal: &'a H, store: &'a MarkerStore) -> Self {
        Self { hal, store }
    }

    pub(crate) fn hal(&self) -> &'a H {
        self.hal
    }

    fn resolver(&self) -> DeviceResolver<'a, H> {
        DeviceResolver::new(self.hal)
    }

    fn notifier(&self) -> EventNotifier<'a, H> {
        EventNotifier::new(self.hal)
    }

    /// Claim `device` for `system`.
    ///
    /// With `verify`, the claim only succeeds once udev reports the
    /// `inuse_<system>` tag after a settle; otherwise the marker is removed
    /// again and `XsDevsError::DeviceTagging` is returned.
    pub fn tag(&self, device: &str, system: &str, verify: bool) -> XsResult<TagReceipt> {
        let mut trail = Vec::new();
        self.tag_traced(device, system, verify, &mut trail)
    }

    /// `tag`, recording every phase entered into `trail`.
    pub(crate) fn tag_traced(
        &self,
        device: &str,
        system: &str,
        verify: bool,
        trail: &mut Vec<TagPhase>,
    ) -> XsResult<TagReceipt> {
        let mut progress = PhaseLog::start(device, system, trail);
        let resolver = self.resolver();
        let resolved = resolver.resolve(device)?;
        let target = match resolver.parent_of(&resolved)? {
            Some(parent) => parent,
            None => resolved,
        };

        progress.advance(TagPhase::Marking);
        self.store.put(&target.name, system)?;
        if !verify {
            return Ok(TagReceipt {
                device: target.name,
                system: system.to_string(),
                verified: false,
            });
        }

        let notifier = self.notifier();
        notifier.trigger_change(&target.name);
        progress.advance(TagPhase::Triggered);
        notifier.settle();
        progress.advance(TagPhase::Settled);

        progress.advance(TagPhase::Verifying);
        let observed = match resolver.reload(&target) {
            Ok(reloaded) => resolver.observed_tags(&reloaded),
            Err(err) => {
                log::warn!("cannot reload {} after settle: {}", target.name, err);
                BTreeSet::new()
            }
        };

        if observed.contains(&expected_tag(system)) {
            progress.advance(TagPhase::Committed);
            log::info!("tagged {} as in use by {}", target.name, system);
            return Ok(TagReceipt {
                device: target.name,
                system: system.to_string(),
                verified: true,
            });
        }

        // The marker must go, or udev would tag the device later on its own.
        self.store.remove(&target.name, system);
        notifier.trigger_change(&target.name);
        progress.advance(TagPhase::RolledBack);
        Err(XsDevsError::DeviceTagging {
            device: target.name,
            system: system.to_string(),
        })
    }

    /// Release claims on `device`: the one held by `system`, or all of them.
    ///
    /// Never fails. A partition whose disk already vanished cannot be promoted,
    /// so a marker left on that disk stays behind.
    pub fn untag(&self, device: &str, system: Option<&str>) {
        let target = self.resolver().promote_or_fallback(device);
        match system {
            Some(system) => self.store.remove(&target, system),
            None => {
                let removed = self.store.remove_all(&target);
                log::debug!("removed {} marker(s) for {}", removed, target);
            }
        }
        self.notifier().trigger_change(&target);
    }

    /// Tags udev currently reports for exactly the named node.
    pub fn show(&self, device: &str) -> XsResult<BTreeSet<String>> {
        let resolver = self.resolver();
        let resolved = resolver.resolve(device)?;
        Ok(resolver.observed_tags(&resolved))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;
    use xs_devs_hal::{FakeHal, Operation};

    #[test]
    fn expected_tag_format() {
        assert_eq!(expected_tag("xs"), "inuse_xs");
        assert_eq!(TagPhase::RolledBack.to_string(), "ROLLED_BACK");
    }

    #[test]
    fn verified_tag_triggers_then_settles() {
        let tmp = tempdir().unwrap();
        let store = MarkerStore::new(tmp.path());
        let hal = FakeHal::new();
        hal.add_disk("sdb");
        hal.emulate_udev_rules(tmp.path());

        let receipt = Tagger::new(&hal, &store).tag("sdb", "xs", true).unwrap();
        assert!(receipt.verified);
        assert_eq!(
            hal.operations(),
            vec![
                Operation::TriggerChange {
                    device: "sdb".to_string()
                },
                Operation::Settle,
            ]
        );
    }

    #[test]
    fn unverified_tag_touches_no_events() {
        let tmp = tempdir().unwrap();
        let store = MarkerStore::new(tmp.path());
        let hal = FakeHal::new();
        hal.add_disk("sdb");

        let receipt = Tagger::new(&hal, &store).tag("sdb", "xs", false).unwrap();
        assert!(!receipt.verified);
        assert_eq!(hal.operation_count(), 0);
        assert!(tmp.path().join("devs-xs/sdb").exists());
    }

    #[test]
    fn tag_without_settle_effect_rolls_back() {
        let tmp = tempdir().unwrap();
        let store = MarkerStore::new(tmp.path());
        let hal = FakeHal::new();
        hal.add_disk("sdb");
        hal.emulate_udev_rules(tmp.path());
        hal.fail_event_tools(true);

        let err = Tagger::new(&hal, &store).tag("sdb", "xs", true).unwrap_err();
        assert!(matches!(err, XsDevsError::DeviceTagging { .. }));
        assert!(!tmp.path().join("devs-xs/sdb").exists());
    }

    #[test]
    fn committed_trail_passes_every_phase() {
        let tmp = tempdir().unwrap();
        let store = MarkerStore::new(tmp.path());
        let hal = FakeHal::new();
        hal.add_disk("sdb");
        hal.emulate_udev_rules(tmp.path());

        let mut trail = Vec::new();
        Tagger::new(&hal, &store)
            .tag_traced("sdb", "xs", true, &mut trail)
            .unwrap();
        assert_eq!(
            trail,
            vec![
                TagPhase::Resolving,
                TagPhase::Marking,
                TagPhase::Triggered,
                TagPhase::Settled,
                TagPhase::Verifying,
                TagPhase::Committed,
            ]
        );
    }

    #[test]
    fn unverified_trail_stops_at_marking() {
        let tmp = tempdir().unwrap();
        let store = MarkerStore::new(tmp.path());
        let hal = FakeHal::new();
        hal.add_disk("sdb");

        let mut trail = Vec::new();
        Tagger::new(&hal, &store)
            .tag_traced("sdb", "xs", false, &mut trail)
            .unwrap();
        assert_eq!(trail, vec![TagPhase::Resolving, TagPhase::Marking]);
    }

    #[test]
    fn rolled_back_trail_ends_after_verifying() {
        let tmp = tempdir().unwrap();
        let store = MarkerStore::new(tmp.path());
        let hal = FakeHal::new();
        hal.add_disk("sdb");
        hal.emulate_udev_rules(tmp.path());
        hal.refuse_system("xs");

        let mut trail = Vec::new();
        let res = Tagger::new(&hal, &store).tag_traced("sdb", "xs", true, &mut trail);
        assert!(res.is_err());
        assert_eq!(
            trail[trail.len() - 2..],
            [TagPhase::Verifying, TagPhase::RolledBack]
        );
    }

    #[test]
    fn unresolved_device_trail_is_only_resolving() {
        let tmp = tempdir().unwrap();
        let store = MarkerStore::new(tmp.path());
        let hal = FakeHal::new();

        let mut trail = Vec::new();
        let res = Tagger::new(&hal, &store).tag_traced("sdz", "xs", true, &mut trail);
        assert!(matches!(res, Err(XsDevsError::DeviceNotFound(_))));
        assert_eq!(trail, vec![TagPhase::Resolving]);
    }
}
