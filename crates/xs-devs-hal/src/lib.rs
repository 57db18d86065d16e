//! xs-devs Hardware Abstraction Layer (HAL).
//!
//! Everything that touches the running system goes through the traits in [`hal`]:
//! the block device registry (libudev), udev event tooling and the device-mapper
//! query. [`LinuxHal`] talks to the real host, [`FakeHal`] records operations and
//! emulates the registry for tests.

pub mod error;
pub mod hal;

pub use error::{HalError, HalResult};
pub use hal::{
    BlockDevice, DmOps, EventOps, FakeHal, HalPaths, LinuxHal, Operation, ProcessOps,
    RegistryOps, SystemHal,
};
