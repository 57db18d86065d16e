//! Runtime configuration.
//!
//! Defaults match a stock host. An optional TOML file and then `XS_DEVS_*`
//! environment variables override them.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use xs_devs_hal::HalPaths;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/xs_devs.toml";
pub const DEFAULT_MARKER_ROOT: &str = "/var/lib/xs_devs";

pub const CONFIG_ENV: &str = "XS_DEVS_CONFIG";
pub const ROOT_ENV: &str = "XS_DEVS_ROOT";
pub const UDEVADM_ENV: &str = "XS_DEVS_UDEVADM";
pub const DMSETUP_ENV: &str = "XS_DEVS_DMSETUP";
pub const LOG_FILE_ENV: &str = "XS_DEVS_LOG_FILE";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub marker_root: PathBuf,
    pub udevadm: PathBuf,
    pub dmsetup: PathBuf,
    pub log_file: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        let hal = HalPaths::default();
        Self {
            marker_root: PathBuf::from(DEFAULT_MARKER_ROOT),
            udevadm: hal.udevadm,
            dmsetup: hal.dmsetup,
            log_file: None,
        }
    }
}

/// On-disk form; every key is optional.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    marker_root: Option<PathBuf>,
    udevadm: Option<PathBuf>,
    dmsetup: Option<PathBuf>,
    log_file: Option<PathBuf>,
}

impl Config {
    /// Defaults, then the config file, then the environment.
    pub fn load() -> Result<Self> {
        let mut config = Self::default();
        match env::var_os(CONFIG_ENV) {
            Some(path) => config.merge_file(Path::new(&path))?,
            None => {
                let path = Path::new(DEFAULT_CONFIG_PATH);
                if path.exists() {
                    config.merge_file(path)?;
                }
            }
        }
        config.apply_env();
        Ok(config)
    }

    /// Defaults plus the environment, for commands that must run without a
    /// readable config file.
    pub fn fallback() -> Self {
        let mut config = Self::default();
        config.apply_env();
        config
    }

    pub fn merge_file(&mut self, path: &Path) -> Result<()> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("failed to read config {}", path.display()))?;
        let file: ConfigFile = toml::from_str(&content)
            .with_context(|| format!("failed to parse config {}", path.display()))?;

        if let Some(v) = file.marker_root {
            self.marker_root = v;
        }
        if let Some(v) = file.udevadm {
            self.udevadm = v;
        }
        if let Some(v) = file.dmsetup {
            self.dmsetup = v;
        }
        if file.log_file.is_some() {
            self.log_file = file.log_file;
        }
        Ok(())
    }

    pub fn apply_env(&mut self) {
        let var = |key: &str| env::var_os(key).filter(|v| !v.is_empty()).map(PathBuf::from);
        if let Some(v) = var(ROOT_ENV) {
            self.marker_root = v;
        }
        if let Some(v) = var(UDEVADM_ENV) {
            self.udevadm = v;
        }
        if let Some(v) = var(DMSETUP_ENV) {
            self.dmsetup = v;
        }
        if let Some(v) = var(LOG_FILE_ENV) {
            self.log_file = Some(v);
        }
    }

    pub fn hal_paths(&self) -> HalPaths {
        HalPaths {
            udevadm: self.udevadm.clone(),
            dmsetup: self.dmsetup.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_env;
    use tempfile::tempdir;

    const ALL_ENV: [&str; 5] = [CONFIG_ENV, ROOT_ENV, UDEVADM_ENV, DMSETUP_ENV, LOG_FILE_ENV];

    fn clear_env() {
        for key in ALL_ENV {
            env::remove_var(key);
        }
    }

    #[test]
    fn file_then_env_override_defaults() {
        let _guard = test_env::lock();
        clear_env();
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("xs_devs.toml");
        fs::write(
            &path,
            "marker_root = \"/tmp/markers\"\nudevadm = \"/bin/udevadm\"\n",
        )
        .unwrap();

        env::set_var(CONFIG_ENV, &path);
        env::set_var(UDEVADM_ENV, "/opt/udevadm");
        let config = Config::load().unwrap();
        clear_env();

        assert_eq!(config.marker_root, PathBuf::from("/tmp/markers"));
        assert_eq!(config.udevadm, PathBuf::from("/opt/udevadm"));
        assert_eq!(config.dmsetup, PathBuf::from("/usr/sbin/dmsetup"));
        assert_eq!(config.hal_paths().udevadm, PathBuf::from("/opt/udevadm"));
    }

    #[test]
    fn named_config_must_exist() {
        let _guard = test_env::lock();
        clear_env();
        env::set_var(CONFIG_ENV, "/nonexistent/xs_devs.toml");
        let res = Config::load();
        clear_env();
        assert!(res.is_err());
    }

    #[test]
    fn fallback_skips_the_file_but_keeps_env() {
        let _guard = test_env::lock();
        clear_env();
        env::set_var(CONFIG_ENV, "/nonexistent/xs_devs.toml");
        env::set_var(ROOT_ENV, "/tmp/xs-markers");
        let config = Config::fallback();
        clear_env();

        assert_eq!(config.marker_root, PathBuf::from("/tmp/xs-markers"));
        assert_eq!(config.udevadm, PathBuf::from("/usr/sbin/udevadm"));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let tmp = tempdir().unwrap();
        let path = tmp.path().join("bad.toml");
        fs::write(&path, "marker_rot = \"/tmp\"\n").unwrap();
        let mut config = Config::default();
        assert!(config.merge_file(&path).is_err());
    }
}
