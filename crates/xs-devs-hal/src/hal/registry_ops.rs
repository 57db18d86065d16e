//! Block device registry lookups.

use crate::HalResult;
use std::collections::BTreeSet;
use std::path::PathBuf;

/// Snapshot of a block device as reported by the registry.
///
/// Tags are captured at lookup time and never refreshed; query the registry
/// again to observe newer state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockDevice {
    pub name: String,
    pub syspath: PathBuf,
    pub tags: BTreeSet<String>,
}

/// Live block device registry, scoped to the "block" subsystem.
pub trait RegistryOps {
    /// Look up a block device by kernel short name. `None` when it does not exist.
    fn block_device(&self, name: &str) -> HalResult<Option<BlockDevice>>;

    /// Enclosing whole-disk device when `device` is a partition.
    fn block_parent(&self, device: &BlockDevice) -> HalResult<Option<BlockDevice>>;
}
