//! On-disk claim markers.
//!
//! A claim (device, system) exists iff `<root>/devs-<system>/<device>` exists.
//! The files are always empty.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;
use xs_devs_error::{XsDevsError, XsResult};

pub const SYSTEM_DIR_PREFIX: &str = "devs-";

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct Claim {
    pub device: String,
    pub system: String,
}

#[derive(Debug, Clone)]
pub struct MarkerStore {
    root: PathBuf,
}

fn validate(kind: &'static str, name: &str) -> XsResult<()> {
    if name.is_empty() || name == "." || name == ".." || name.contains('/') || name.contains('\0')
    {
        return Err(XsDevsError::InvalidName {
            kind,
            name: name.to_string(),
        });
    }
    Ok(())
}

fn try_unlink(path: &Path) -> bool {
    match fs::remove_file(path) {
        Ok(()) => true,
        Err(e) => {
            if e.kind() != io::ErrorKind::NotFound {
                log::debug!("ignoring unlink failure for {}: {}", path.display(), e);
            }
            false
        }
    }
}

impl MarkerStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn system_dir(&self, system: &str) -> PathBuf {
        self.root.join(format!("{}{}", SYSTEM_DIR_PREFIX, system))
    }

    pub fn marker_path(&self, device: &str, system: &str) -> XsResult<PathBuf> {
        validate("device", device)?;
        validate("system", system)?;
        Ok(self.system_dir(system).join(device))
    }

    /// Record a claim. Touching an existing marker is a no-op success.
    pub fn put(&self, device: &str, system: &str) -> XsResult<PathBuf> {
        let path = self.marker_path(device, system)?;
        fs::create_dir_all(self.system_dir(system))?;
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)?;
        log::debug!("marker created: {}", path.display());
        Ok(path)
    }

    /// Drop a claim. Any unlink failure, absence included, is ignored.
    pub fn remove(&self, device: &str, system: &str) {
        match self.marker_path(device, system) {
            Ok(path) => {
                if try_unlink(&path) {
                    log::debug!("marker removed: {}", path.display());
                }
            }
            Err(err) => log::warn!("not removing marker: {}", err),
        }
    }

    /// Drop the device's claim in every `devs-*` directory below the root.
    ///
    /// Returns how many markers were actually removed.
    pub fn remove_all(&self, device: &str) -> usize {
        if let Err(err) = validate("device", device) {
            log::warn!("not removing markers: {}", err);
            return 0;
        }
        let mut removed = 0;
        for entry in WalkDir::new(&self.root).into_iter().flatten() {
            if !entry.file_type().is_dir() {
                continue;
            }
            let is_system_dir = entry
                .file_name()
                .to_string_lossy()
                .starts_with(SYSTEM_DIR_PREFIX);
            if is_system_dir && try_unlink(&entry.path().join(device)) {
                log::debug!("marker removed: {}/{}", entry.path().display(), device);
                removed += 1;
            }
        }
        removed
    }

    /// Every claim recorded directly under the root, sorted.
    pub fn claims(&self) -> XsResult<Vec<Claim>> {
        let entries = match fs::read_dir(&self.root) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        let mut claims = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let dir_name = entry.file_name().to_string_lossy().to_string();
            let system = match dir_name.strip_prefix(SYSTEM_DIR_PREFIX) {
                Some(system) => system.to_string(),
                None => continue,
            };
            for marker in fs::read_dir(entry.path())? {
                let marker = marker?;
                if marker.file_type()?.is_file() {
                    claims.push(Claim {
                        device: marker.file_name().to_string_lossy().to_string(),
                        system: system.clone(),
                    });
                }
            }
        }
        claims.sort();
        Ok(claims)
    }

    pub fn systems_for(&self, device: &str) -> XsResult<Vec<String>> {
        Ok(self
            .claims()?
            .into_iter()
            .filter(|c| c.device == device)
            .map(|c| c.system)
            .collect())
    }
}
