//! Fake HAL implementation for testing.
//!
//! This implementation records all operations without executing them,
//! allowing for CI-safe testing without root privileges or real hardware.
//!
//! Besides recording, it keeps an in-memory block device table and can emulate
//! the udev rule that turns marker files into `inuse_<system>` tags. Tags only
//! change on `settle()`, for the devices triggered since the previous settle.

use super::{BlockDevice, DmOps, EventOps, RegistryOps};
use crate::{HalError, HalResult};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Operation records for testing and verification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    TriggerChange { device: String },
    Settle,
    DmInfo { dm_name: String },
}

#[derive(Debug, Clone, Default)]
struct FakeDevice {
    parent: Option<String>,
    tags: BTreeSet<String>,
}

/// Shared state for FakeHal operations.
#[derive(Debug, Clone, Default)]
struct FakeHalState {
    /// All operations that were recorded
    operations: Vec<Operation>,
    devices: BTreeMap<String, FakeDevice>,
    /// Devices triggered but not yet settled
    pending: BTreeSet<String>,
    /// Marker root read by the emulated udev rule
    marker_root: Option<PathBuf>,
    /// Systems the emulated rule never tags
    refused_systems: HashSet<String>,
    dm_replies: HashMap<String, String>,
    fail_events: bool,
    fail_registry: bool,
}

/// Fake HAL implementation that records operations without executing them.
///
/// This is designed for testing and CI environments where real system
/// operations would fail or be dangerous.
#[derive(Debug, Clone, Default)]
pub struct FakeHal {
    state: Arc<Mutex<FakeHalState>>,
}

impl FakeHal {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeHalState::default())),
        }
    }

    /// Register a whole-disk device.
    pub fn add_disk(&self, name: &str) {
        self.state
            .lock()
            .unwrap()
            .devices
            .insert(name.to_string(), FakeDevice::default());
    }

    /// Register a partition of `parent`.
    pub fn add_partition(&self, name: &str, parent: &str) {
        self.state.lock().unwrap().devices.insert(
            name.to_string(),
            FakeDevice {
                parent: Some(parent.to_string()),
                tags: BTreeSet::new(),
            },
        );
    }

    /// Simulate hot-unplug.
    pub fn remove_device(&self, name: &str) {
        self.state.lock().unwrap().devices.remove(name);
    }

    pub fn set_tags(&self, name: &str, tags: &[&str]) {
        if let Some(dev) = self.state.lock().unwrap().devices.get_mut(name) {
            dev.tags = tags.iter().map(|t| t.to_string()).collect();
        }
    }

    pub fn tags_of(&self, name: &str) -> BTreeSet<String> {
        self.state
            .lock()
            .unwrap()
            .devices
            .get(name)
            .map(|dev| dev.tags.clone())
            .unwrap_or_default()
    }

    /// Emulate the udev rule that tags devices from `<root>/devs-<system>/<device>`.
    pub fn emulate_udev_rules(&self, marker_root: &Path) {
        self.state.lock().unwrap().marker_root = Some(marker_root.to_path_buf());
    }

    /// Make the emulated rule decline claims from `system`.
    pub fn refuse_system(&self, system: &str) {
        self.state
            .lock()
            .unwrap()
            .refused_systems
            .insert(system.to_string());
    }

    pub fn set_dm_info(&self, dm_name: &str, reply: &str) {
        self.state
            .lock()
            .unwrap()
            .dm_replies
            .insert(dm_name.to_string(), reply.to_string());
    }

    /// Make trigger/settle fail without effect, as if udevadm were broken.
    pub fn fail_event_tools(&self, fail: bool) {
        self.state.lock().unwrap().fail_events = fail;
    }

    /// Make registry lookups error out (as opposed to reporting "not found").
    pub fn fail_registry(&self, fail: bool) {
        self.state.lock().unwrap().fail_registry = fail;
    }

    /// Get all recorded operations.
    pub fn operations(&self) -> Vec<Operation> {
        self.state.lock().unwrap().operations.clone()
    }

    /// Get the number of operations recorded.
    pub fn operation_count(&self) -> usize {
        self.state.lock().unwrap().operations.len()
    }

    /// Check if a specific operation was recorded.
    pub fn has_operation(&self, check: impl Fn(&Operation) -> bool) -> bool {
        self.state.lock().unwrap().operations.iter().any(check)
    }

    /// Clear all recorded operations.
    pub fn clear(&self) {
        let mut state = self.state.lock().unwrap();
        state.operations.clear();
        state.pending.clear();
    }

    fn record_operation(&self, op: Operation) {
        self.state.lock().unwrap().operations.push(op);
    }

    fn snapshot(state: &FakeHalState, name: &str) -> Option<BlockDevice> {
        state.devices.get(name).map(|dev| BlockDevice {
            name: name.to_string(),
            syspath: PathBuf::from("/sys/class/block").join(name),
            tags: dev.tags.clone(),
        })
    }
}

fn rule_tags(marker_root: &Path, device: &str, refused: &HashSet<String>) -> BTreeSet<String> {
    let mut tags = BTreeSet::new();
    let entries = match std::fs::read_dir(marker_root) {
        Ok(entries) => entries,
        Err(_) => return tags,
    };
    for entry in entries.flatten() {
        let dir_name = entry.file_name().to_string_lossy().to_string();
        let system = match dir_name.strip_prefix("devs-") {
            Some(system) => system.to_string(),
            None => continue,
        };
        if refused.contains(&system) {
            continue;
        }
        if entry.path().join(device).is_file() {
            tags.insert(format!("inuse_{}", system));
        }
    }
    tags
}

impl EventOps for FakeHal {
    fn trigger_change(&self, devname: &str) -> HalResult<()> {
        self.record_operation(Operation::TriggerChange {
            device: devname.to_string(),
        });
        let mut state = self.state.lock().unwrap();
        if state.fail_events {
            return Err(HalError::CommandFailed {
                program: "udevadm".to_string(),
                code: Some(1),
                stderr: "fake trigger failure".to_string(),
            });
        }
        state.pending.insert(devname.to_string());
        Ok(())
    }

    fn settle(&self) -> HalResult<()> {
        self.record_operation(Operation::Settle);
        let mut state = self.state.lock().unwrap();
        if state.fail_events {
            return Err(HalError::CommandFailed {
                program: "udevadm".to_string(),
                code: Some(1),
                stderr: "fake settle failure".to_string(),
            });
        }
        let pending = std::mem::take(&mut state.pending);
        let marker_root = match state.marker_root.clone() {
            Some(root) => root,
            None => return Ok(()),
        };
        for name in pending {
            let computed = rule_tags(&marker_root, &name, &state.refused_systems);
            if let Some(dev) = state.devices.get_mut(&name) {
                dev.tags.retain(|t| !t.starts_with("inuse_"));
                dev.tags.extend(computed);
                log::info!("FAKE HAL: settled {} -> {:?}", name, dev.tags);
            }
        }
        Ok(())
    }
}

impl DmOps for FakeHal {
    fn dm_info(&self, dm_name: &str) -> HalResult<String> {
        self.record_operation(Operation::DmInfo {
            dm_name: dm_name.to_string(),
        });
        let reply = self
            .state
            .lock()
            .unwrap()
            .dm_replies
            .get(dm_name)
            .cloned()
            .unwrap_or_default();
        Ok(reply.trim_end().to_string())
    }
}

impl RegistryOps for FakeHal {
    fn block_device(&self, name: &str) -> HalResult<Option<BlockDevice>> {
        let state = self.state.lock().unwrap();
        if state.fail_registry {
            return Err(HalError::Other("fake registry failure".to_string()));
        }
        Ok(Self::snapshot(&state, name))
    }

    fn block_parent(&self, device: &BlockDevice) -> HalResult<Option<BlockDevice>> {
        let state = self.state.lock().unwrap();
        if state.fail_registry {
            return Err(HalError::Other("fake registry failure".to_string()));
        }
        let parent = state
            .devices
            .get(&device.name)
            .and_then(|dev| dev.parent.clone());
        Ok(parent.and_then(|p| Self::snapshot(&state, &p)))
    }
}
