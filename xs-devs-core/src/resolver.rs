//! Device name resolution and partition-to-disk promotion.

use std::collections::BTreeSet;
use xs_devs_error::{XsDevsError, XsResult};
use xs_devs_hal::{BlockDevice, RegistryOps};

pub struct DeviceResolver<'a, R: RegistryOps + ?Sized> {
    registry: &'a R,
}

impl<'a, R: RegistryOps + ?Sized> DeviceResolver<'a, R> {
    pub fn new(registry: &'a R) -> Self {
        Self { registry }
    }

    pub fn resolve(&self, name: &str) -> XsResult<BlockDevice> {
        self.registry
            .block_device(name)?
            .ok_or_else(|| XsDevsError::DeviceNotFound(name.to_string()))
    }

    pub fn parent_of(&self, device: &BlockDevice) -> XsResult<Option<BlockDevice>> {
        Ok(self.registry.block_parent(device)?)
    }

    /// Name to tag for `name`: its whole disk when it is a partition.
    pub fn promote_to_parent(&self, name: &str) -> XsResult<String> {
        let device = self.resolve(name)?;
        Ok(match self.parent_of(&device)? {
            Some(parent) => parent.name,
            None => device.name,
        })
    }

    /// Like [`promote_to_parent`](Self::promote_to_parent) but falls back to
    /// `name` on any resolution failure, so vanished devices can still be untagged.
    pub fn promote_or_fallback(&self, name: &str) -> String {
        match self.promote_to_parent(name) {
            Ok(promoted) => promoted,
            Err(err) => {
                log::debug!("cannot promote {}, using it as is: {}", name, err);
                name.to_string()
            }
        }
    }

    /// Fresh snapshot; tags on an existing snapshot never update.
    pub fn reload(&self, device: &BlockDevice) -> XsResult<BlockDevice> {
        self.resolve(&device.name)
    }

    pub fn observed_tags(&self, device: &BlockDevice) -> BTreeSet<String> {
        device.tags.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use xs_devs_hal::FakeHal;

    #[test]
    fn partition_promotes_to_disk() {
        let hal = FakeHal::new();
        hal.add_disk("sdb");
        hal.add_partition("sdb1", "sdb");
        let resolver = DeviceResolver::new(&hal);

        assert_eq!(resolver.promote_to_parent("sdb1").unwrap(), "sdb");
        assert_eq!(resolver.promote_to_parent("sdb").unwrap(), "sdb");
    }

    #[test]
    fn unknown_device_is_not_found() {
        let hal = FakeHal::new();
        let resolver = DeviceResolver::new(&hal);
        let err = resolver.resolve("sdq").unwrap_err();
        assert!(err.is_not_found());
        assert!(resolver.promote_to_parent("sdq").unwrap_err().is_not_found());
    }

    #[test]
    fn fallback_swallows_lookup_errors() {
        let hal = FakeHal::new();
        hal.add_disk("sdb");
        hal.add_partition("sdb1", "sdb");
        hal.fail_registry(true);
        let resolver = DeviceResolver::new(&hal);

        assert_eq!(resolver.promote_or_fallback("sdb1"), "sdb1");
        assert_eq!(resolver.promote_or_fallback("gone"), "gone");
    }

    #[test]
    fn reload_sees_new_tags() {
        let hal = FakeHal::new();
        hal.add_disk("sdb");
        let resolver = DeviceResolver::new(&hal);

        let before = resolver.resolve("sdb").unwrap();
        hal.set_tags("sdb", &["inuse_xs"]);
        assert!(resolver.observed_tags(&before).is_empty());

        let after = resolver.reload(&before).unwrap();
        assert!(resolver.observed_tags(&after).contains("inuse_xs"));
    }
}
