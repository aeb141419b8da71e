//! Daemon configuration
//!
//! ```toml
//! commands = "panel.xml"
//!
//! [lutron]
//! host = "192.168.1.20"
//! username = "admin"
//! password = "secret"
//!
//! [amx]
//! host = "192.168.1.30"
//! ```

use std::path::{Path, PathBuf};

use anyhow::Context;
use hagw_amx::AmxConfig;
use hagw_lutron::LutronConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// XML command file, relative paths resolve against the config file
    pub commands: PathBuf,
    #[serde(default)]
    pub lutron: Option<LutronConfig>,
    #[serde(default)]
    pub amx: Option<AmxConfig>,
}

impl DaemonConfig {
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let mut config: DaemonConfig =
            toml::from_str(&content).with_context(|| format!("Invalid config {}", path.display()))?;
        if config.commands.is_relative() {
            if let Some(dir) = path.parent() {
                config.commands = dir.join(&config.commands);
            }
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_resolves_command_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hagwd.toml");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            r#"
commands = "panel.xml"

[amx]
host = "10.0.0.9"
"#
        )
        .unwrap();

        let config = DaemonConfig::load(&path).unwrap();
        assert_eq!(config.commands, dir.path().join("panel.xml"));
        assert!(config.lutron.is_none());
        let amx = config.amx.unwrap();
        assert_eq!(amx.host, "10.0.0.9");
        assert_eq!(amx.port, 50000);
    }

    #[test]
    fn test_missing_commands_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hagwd.toml");
        std::fs::write(&path, "[lutron]\nhost = \"x\"\n").unwrap();
        assert!(DaemonConfig::load(&path).is_err());
    }
}
