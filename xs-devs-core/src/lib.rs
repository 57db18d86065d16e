//! xs-devs core library.
//!
//! Claims on block devices are recorded as marker files
//! (`<root>/devs-<system>/<device>`), which a udev rule turns into
//! `inuse_<system>` tags. [`tagging::Tagger`] keeps the two consistent with a
//! propose (marker + trigger), barrier (settle), verify cycle.

pub mod config;
pub mod logging;
pub mod markers;
pub mod multipath;
pub mod notifier;
pub mod resolver;
pub mod tagging;

#[cfg(test)]
pub mod test_env;

pub use markers::{Claim, MarkerStore};
pub use multipath::{DmClass, DmComposition};
pub use tagging::{TagPhase, TagReceipt, Tagger};
pub use xs_devs_error::{XsDevsError, XsResult};
