//! HAL trait definitions and implementations.
//!
//! This module defines the core traits for system operations and provides
//! both real (LinuxHal) and fake (FakeHal) implementations.

pub mod dm_ops;
pub mod event_ops;
pub mod fake_hal;
pub mod linux_hal;
pub mod process_ops;
pub mod registry_ops;

pub use dm_ops::DmOps;
pub use event_ops::EventOps;
pub use fake_hal::{FakeHal, Operation};
pub use linux_hal::{HalPaths, LinuxHal};
pub use process_ops::ProcessOps;
pub use registry_ops::{BlockDevice, RegistryOps};

/// Complete HAL combining all system operation traits.
///
/// `ProcessOps` is not part of it: running tools is a `LinuxHal` detail.
pub trait SystemHal: EventOps + RegistryOps + DmOps + Send + Sync {}

/// Automatically implement SystemHal for any type implementing all required traits.
impl<T> SystemHal for T where T: EventOps + RegistryOps + DmOps + Send + Sync {}
