//! Engine configuration loaded from an optional TOML file.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

/// Sessions configuration (TOML).
///
/// Missing fields default to the layout every Entre Vetas project uses:
/// `scripts/sessions.sh`, no command timeout, `feat/` branches.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(default)]
pub struct SessionsConfig {
    pub script: ScriptConfig,

    /// Kill blocking commands that run longer than this. `0` waits forever.
    pub command_timeout_secs: u64,

    pub branch: BranchConfig,
}

/// Fixed relative path of the session script under the project root.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ScriptConfig {
    pub subfolder: String,
    pub name: String,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            subfolder: "scripts".to_string(),
            name: "sessions.sh".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct BranchConfig {
    /// Prefix for suggested issue branches (`<prefix>/<number>-<slug>`).
    pub prefix: String,
    pub slug_max_chars: usize,
}

impl Default for BranchConfig {
    fn default() -> Self {
        Self {
            prefix: "feat".to_string(),
            slug_max_chars: 30,
        }
    }
}

impl SessionsConfig {
    pub fn validate(&self) -> Result<()> {
        if self.script.subfolder.trim().is_empty() {
            return Err(anyhow!("script.subfolder must not be empty"));
        }
        if self.script.name.trim().is_empty() {
            return Err(anyhow!("script.name must not be empty"));
        }
        if self.script.name.contains(['/', '\\']) {
            return Err(anyhow!(
                "script.name must be a file name, not a path (got '{}')",
                self.script.name
            ));
        }
        if self.branch.prefix.trim().is_empty() {
            return Err(anyhow!("branch.prefix must not be empty"));
        }
        if self.branch.slug_max_chars == 0 {
            return Err(anyhow!("branch.slug_max_chars must be > 0"));
        }
        Ok(())
    }

    pub fn command_timeout(&self) -> Option<Duration> {
        (self.command_timeout_secs > 0).then(|| Duration::from_secs(self.command_timeout_secs))
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `SessionsConfig::default()`.
pub fn load_config(path: &Path) -> Result<SessionsConfig> {
    if !path.exists() {
        let cfg = SessionsConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: SessionsConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()?;
    Ok(cfg)
}
