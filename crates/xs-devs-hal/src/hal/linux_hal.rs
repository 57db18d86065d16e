//! Linux HAL implementation using real system tools and libudev.

use super::{BlockDevice, DmOps, EventOps, ProcessOps, RegistryOps};
use crate::{HalError, HalResult};
use std::collections::BTreeSet;
use std::ffi::OsStr;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, Output, Stdio};

const BLOCK_SUBSYSTEM: &str = "block";

/// Locations of the external tools the HAL runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HalPaths {
    pub udevadm: PathBuf,
    pub dmsetup: PathBuf,
}

impl Default for HalPaths {
    fn default() -> Self {
        Self {
            udevadm: PathBuf::from("/usr/sbin/udevadm"),
            dmsetup: PathBuf::from("/usr/sbin/dmsetup"),
        }
    }
}

/// Real HAL implementation for Linux systems.
#[derive(Debug, Clone, Default)]
pub struct LinuxHal {
    paths: HalPaths,
}

impl LinuxHal {
    pub fn new(paths: HalPaths) -> Self {
        Self { paths }
    }
}

fn map_command_err(program: &Path, err: io::Error) -> HalError {
    if err.kind() == io::ErrorKind::NotFound {
        return HalError::CommandNotFound(program.display().to_string());
    }
    HalError::Io(err)
}

/// libudev reports an unknown sysname through errno rather than a distinct result.
fn is_missing_device(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::NotFound
        || matches!(err.raw_os_error(), Some(libc::ENOENT) | Some(libc::ENODEV))
}

fn is_plain_name(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains('/')
}

fn os_str_to_str(value: &OsStr) -> Option<&str> {
    value.to_str()
}

/// libudev exposes the tag list as the `:`-delimited `TAGS` property.
pub fn parse_tags_property(value: &str) -> BTreeSet<String> {
    value
        .split(':')
        .filter(|tag| !tag.is_empty())
        .map(String::from)
        .collect()
}

fn snapshot(device: &udev::Device) -> BlockDevice {
    let tags = device
        .property_value("TAGS")
        .and_then(os_str_to_str)
        .map(parse_tags_property)
        .unwrap_or_default();
    BlockDevice {
        name: device.sysname().to_string_lossy().into_owned(),
        syspath: device.syspath().to_path_buf(),
        tags,
    }
}

impl ProcessOps for LinuxHal {
    fn command_output(&self, program: &Path, args: &[&str]) -> HalResult<Output> {
        log::debug!("exec: {} {}", program.display(), args.join(" "));
        Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .map_err(|e| map_command_err(program, e))
    }
}

impl EventOps for LinuxHal {
    fn trigger_change(&self, devname: &str) -> HalResult<()> {
        let sysname = format!("--sysname-match={}", devname);
        self.command_status(&self.paths.udevadm, &["trigger", &sysname])
    }

    fn settle(&self) -> HalResult<()> {
        self.command_status(&self.paths.udevadm, &["settle"])
    }
}

impl DmOps for LinuxHal {
    fn dm_info(&self, dm_name: &str) -> HalResult<String> {
        let target = format!("/dev/{}", dm_name);
        let output = self.command_output(
            &self.paths.dmsetup,
            &[
                "info",
                "-c",
                "-o",
                "name,blkdevs_used",
                "--noheadings",
                &target,
            ],
        )?;
        if !output.status.success() {
            log::debug!(
                "dmsetup info {} exited with {:?}: {}",
                target,
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(String::from_utf8(output.stdout)?.trim_end().to_string())
    }
}

impl RegistryOps for LinuxHal {
    fn block_device(&self, name: &str) -> HalResult<Option<BlockDevice>> {
        if !is_plain_name(name) {
            return Ok(None);
        }
        match udev::Device::from_subsystem_sysname(BLOCK_SUBSYSTEM.to_string(), name.to_string())
        {
            Ok(device) => Ok(Some(snapshot(&device))),
            Err(err) if is_missing_device(&err) => Ok(None),
            Err(err) => Err(HalError::Io(err)),
        }
    }

    fn block_parent(&self, device: &BlockDevice) -> HalResult<Option<BlockDevice>> {
        let device = udev::Device::from_syspath(&device.syspath)?;
        let parent = device.parent_with_subsystem_devtype(BLOCK_SUBSYSTEM, "disk")?;
        Ok(parent.as_ref().map(snapshot))
    }
}
