use std::path::{Component, Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::common::{ConfigError, validation};
use crate::constants::{DEFAULT_BPF_FS_ROOT, DEFAULT_PIN_DIR};

/// Where the pinned maps live and how this process locks them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MapsConfig {
    #[serde(default = "default_bpf_fs")]
    pub bpf_fs: PathBuf,

    #[serde(default = "default_pin_dir")]
    pub pin_dir: String,

    /// Block on another writer's map lock instead of failing at once.
    #[serde(default)]
    pub wait_for_writer: bool,
}

impl Default for MapsConfig {
    fn default() -> Self {
        Self {
            bpf_fs: default_bpf_fs(),
            pin_dir: default_pin_dir(),
            wait_for_writer: false,
        }
    }
}

impl MapsConfig {
    /// Directory containing the pinned maps.
    pub fn pin_root(&self) -> PathBuf {
        self.bpf_fs.join(&self.pin_dir)
    }

    pub(super) fn validate(&self) -> Result<(), ConfigError> {
        if !self.bpf_fs.is_absolute() {
            return Err(validation(
                "maps.bpf_fs",
                format!("'{}' must be an absolute path", self.bpf_fs.display()),
            ));
        }
        let mut components = Path::new(&self.pin_dir).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(_)), None) => Ok(()),
            _ => Err(validation(
                "maps.pin_dir",
                format!("'{}' must be a single directory name", self.pin_dir),
            )),
        }
    }
}

fn default_bpf_fs() -> PathBuf {
    PathBuf::from(DEFAULT_BPF_FS_ROOT)
}

fn default_pin_dir() -> String {
    DEFAULT_PIN_DIR.to_string()
}
