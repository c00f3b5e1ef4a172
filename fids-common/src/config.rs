//! Configuration loading and audio root folder resolution

use crate::{Error, Result};
use std::path::PathBuf;

/// Audio root folder resolution priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable
/// 3. TOML config file
/// 4. OS-dependent compiled default (fallback)
///
/// The audio root contains the announcement clip library; resolved clip
/// paths like `/mp3/DEP/...` are joined beneath it.
pub fn resolve_audio_root(
    cli_arg: Option<&str>,
    env_var_name: &str,
    config_file_key: Option<&str>,
) -> Result<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Ok(PathBuf::from(path));
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        return Ok(PathBuf::from(path));
    }

    // Priority 3: TOML config file
    if let Some(key) = config_file_key {
        if let Ok(config_path) = locate_config_file() {
            if let Ok(toml_content) = std::fs::read_to_string(&config_path) {
                if let Ok(config) = toml::from_str::<toml::Value>(&toml_content) {
                    if let Some(root) = config.get(key).and_then(|v| v.as_str()) {
                        return Ok(PathBuf::from(root));
                    }
                }
            }
        }
    }

    // Priority 4: OS-dependent compiled default
    Ok(default_audio_root())
}

/// Get default configuration file path for the platform
fn locate_config_file() -> Result<PathBuf> {
    if cfg!(target_os = "linux") {
        // Try ~/.config/fids/config.toml first, then /etc/fids/config.toml
        let user_config = dirs::config_dir().map(|d| d.join("fids").join("config.toml"));
        let system_config = PathBuf::from("/etc/fids/config.toml");

        if let Some(path) = user_config {
            if path.exists() {
                return Ok(path);
            }
        }
        if system_config.exists() {
            return Ok(system_config);
        }
        return Err(Error::Config("No config file found".to_string()));
    }

    let config_path = dirs::config_dir()
        .map(|d| d.join("fids").join("config.toml"))
        .ok_or_else(|| Error::Config("Could not determine config directory".to_string()))?;

    if config_path.exists() {
        Ok(config_path)
    } else {
        Err(Error::Config(format!(
            "Config file not found: {:?}",
            config_path
        )))
    }
}

/// Get OS-dependent default audio root path
fn default_audio_root() -> PathBuf {
    if cfg!(target_os = "linux") {
        dirs::data_local_dir()
            .map(|d| d.join("fids"))
            .unwrap_or_else(|| PathBuf::from("/var/lib/fids"))
    } else if cfg!(target_os = "macos") {
        dirs::data_dir()
            .map(|d| d.join("fids"))
            .unwrap_or_else(|| PathBuf::from("/Library/Application Support/fids"))
    } else if cfg!(target_os = "windows") {
        dirs::data_local_dir()
            .map(|d| d.join("fids"))
            .unwrap_or_else(|| PathBuf::from("C:\\ProgramData\\fids"))
    } else {
        PathBuf::from("./fids_data")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_argument_takes_priority() {
        let root = resolve_audio_root(
            Some("/srv/audio"),
            "FIDS_TEST_UNSET_VAR",
            Some("audio_root"),
        )
        .unwrap();
        assert_eq!(root, PathBuf::from("/srv/audio"));
    }

    #[test]
    fn environment_variable_used_when_no_cli_arg() {
        std::env::set_var("FIDS_TEST_AUDIO_ROOT", "/mnt/clips");
        let root = resolve_audio_root(None, "FIDS_TEST_AUDIO_ROOT", None).unwrap();
        std::env::remove_var("FIDS_TEST_AUDIO_ROOT");
        assert_eq!(root, PathBuf::from("/mnt/clips"));
    }

    #[test]
    fn falls_back_to_platform_default() {
        let root = resolve_audio_root(None, "FIDS_TEST_UNSET_VAR_2", None).unwrap();
        assert!(!root.as_os_str().is_empty());
    }
}
