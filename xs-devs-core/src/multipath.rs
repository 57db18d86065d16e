//! Device-mapper composition and multipath refresh.

use crate::tagging::Tagger;
use std::fmt;
use xs_devs_error::{XsDevsError, XsResult};
use xs_devs_hal::SystemHal;

/// Local storage repository volumes.
pub const SR_NAME_PREFIX: &str = "XSLocalEXT";
/// Volume groups carrying virtual disks.
pub const VDI_NAME_PREFIX: &str = "VG_XenStorage";
pub const MPATH_SYSTEM: &str = "mpath";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DmClass {
    Sr,
    Vdi,
    Mpath,
}

impl DmClass {
    pub fn classify(dm_name: &str) -> Self {
        if dm_name.starts_with(SR_NAME_PREFIX) {
            DmClass::Sr
        } else if dm_name.starts_with(VDI_NAME_PREFIX) {
            DmClass::Vdi
        } else {
            DmClass::Mpath
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DmClass::Sr => "sr",
            DmClass::Vdi => "vdi",
            DmClass::Mpath => "mpath",
        }
    }
}

impl fmt::Display for DmClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A dm device's name and the block devices it is built from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DmComposition {
    pub name: String,
    pub devices: Vec<String>,
}

impl DmComposition {
    /// Parse `dmsetup info -c -o name,blkdevs_used --noheadings` output,
    /// i.e. exactly `name:dev1,dev2,...`.
    pub fn parse(output: &str) -> XsResult<Self> {
        let line = output.trim_end();
        let mut fields = line.split(':');
        let (name, devs) = match (fields.next(), fields.next(), fields.next()) {
            (Some(name), Some(devs), None) if !name.is_empty() => (name, devs),
            _ => return Err(XsDevsError::DmInfo(line.to_string())),
        };
        let devices = devs
            .split(',')
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .map(String::from)
            .collect();
        Ok(Self {
            name: name.to_string(),
            devices,
        })
    }
}

impl<'a, H: SystemHal + ?Sized> Tagger<'a, H> {
    /// Classify a dm device and, for multipath maps, re-tag its paths as
    /// `mpath` without verification.
    pub fn refresh_multipath(&self, dm_device: &str) -> XsResult<DmClass> {
        let composition = DmComposition::parse(&self.hal().dm_info(dm_device)?)?;
        let class = DmClass::classify(&composition.name);
        log::info!(
            "{} ({}) classified as {}",
            dm_device,
            composition.name,
            class
        );
        if class != DmClass::Mpath {
            return Ok(class);
        }
        for device in &composition.devices {
            self.tag(device, MPATH_SYSTEM, false)?;
        }
        Ok(class)
    }
}
