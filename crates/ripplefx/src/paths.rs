use std::env;
use std::ffi::OsString;
use std::path::PathBuf;

use anyhow::{anyhow, Result};
use directories_next::ProjectDirs;

const QUALIFIER: &str = "org";
const ORGANISATION: &str = "ripplefx";
const APPLICATION: &str = "ripplefx";

const ENV_CONFIG_DIR: &str = "RIPPLEFX_CONFIG_DIR";
const CONFIG_FILE_NAME: &str = "effect.toml";

#[derive(Debug, Clone)]
pub struct AppPaths {
    config_dir: PathBuf,
}

impl AppPaths {
    pub fn discover() -> Result<Self> {
        let config_dir = match env_override(ENV_CONFIG_DIR) {
            Some(path) => PathBuf::from(path),
            None => ProjectDirs::from(QUALIFIER, ORGANISATION, APPLICATION)
                .map(|dirs| dirs.config_dir().to_path_buf())
                .ok_or_else(|| anyhow!("unable to resolve a config directory for ripplefx"))?,
        };
        Ok(Self { config_dir })
    }

    /// Location of the per-user effect config, whether or not it exists.
    pub fn effect_config(&self) -> PathBuf {
        self.config_dir.join(CONFIG_FILE_NAME)
    }
}

fn env_override(key: &str) -> Option<OsString> {
    env::var_os(key).filter(|value| !value.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effect_config_lives_in_config_dir() {
        let paths = AppPaths {
            config_dir: PathBuf::from("/tmp/ripplefx-test"),
        };
        assert_eq!(
            paths.effect_config(),
            PathBuf::from("/tmp/ripplefx-test/effect.toml")
        );
    }
}
