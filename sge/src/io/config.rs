//! Environment configuration stored as TOML (`sge.toml` by default).

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use crate::games::GameKind;

/// Environment configuration (TOML).
///
/// Missing fields fall back to the defaults below; a missing file is the
/// same as an empty one.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EnvConfig {
    pub game: GameKind,

    /// Dataset name within the game's folder (`<prefix>_<graph_param>.json`).
    pub graph_param: String,

    /// Base episode length; each reset draws `uniform[0.8, 1.2) * game_len`.
    pub game_len: usize,

    /// Flat multiplier applied to every step's reward in the return.
    pub gamma: f64,

    /// Root directory holding `subtask_graph_*` dataset folders.
    pub data_dir: PathBuf,

    /// Seed for the environment RNG; entropy when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

impl Default for EnvConfig {
    fn default() -> Self {
        Self {
            game: GameKind::Mining,
            graph_param: "train_1".to_string(),
            game_len: 70,
            gamma: 0.99,
            data_dir: PathBuf::from("data"),
            seed: None,
        }
    }
}

impl EnvConfig {
    pub fn validate(&self) -> Result<()> {
        if self.game_len == 0 {
            return Err(anyhow!("game_len must be > 0"));
        }
        if !(self.gamma > 0.0 && self.gamma <= 1.0) {
            return Err(anyhow!("gamma must be in (0, 1], got {}", self.gamma));
        }
        if self.graph_param.trim().is_empty() {
            return Err(anyhow!("graph_param must be non-empty"));
        }
        Ok(())
    }

    /// Dataset file selected by this config.
    pub fn dataset_path(&self) -> PathBuf {
        crate::io::graph_store::dataset_path(&self.data_dir, self.game, &self.graph_param)
    }
}

/// Load config from a TOML file.
///
/// If the file is missing, returns `EnvConfig::default()`.
pub fn load_config(path: &Path) -> Result<EnvConfig> {
    if !path.exists() {
        let cfg = EnvConfig::default();
        cfg.validate()?;
        return Ok(cfg);
    }
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    let cfg: EnvConfig =
        toml::from_str(&contents).with_context(|| format!("parse {}", path.display()))?;
    cfg.validate()
        .with_context(|| format!("validate {}", path.display()))?;
    Ok(cfg)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn load_missing_returns_default() {
        let temp = tempfile::tempdir().expect("tempdir");
        let cfg = load_config(&temp.path().join("missing.toml")).expect("load");
        assert_eq!(cfg, EnvConfig::default());
    }

    #[test]
    fn serialized_config_loads_back() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("sge.toml");
        let cfg = EnvConfig {
            game: GameKind::Playground,
            graph_param: "eval".to_string(),
            seed: Some(42),
            ..EnvConfig::default()
        };
        fs::write(&path, toml::to_string(&cfg).expect("serialize")).expect("write");
        let loaded = load_config(&path).expect("load");
        assert_eq!(loaded, cfg);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("sge.toml");
        fs::write(&path, "game = \"playground\"\ngame_len = 40\n").expect("write");
        let cfg = load_config(&path).expect("load");
        assert_eq!(cfg.game, GameKind::Playground);
        assert_eq!(cfg.game_len, 40);
        assert_eq!(cfg.graph_param, "train_1");
        assert_eq!(cfg.seed, None);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("sge.toml");

        fs::write(&path, "gamma = 1.5\n").expect("write");
        let err = load_config(&path).expect_err("gamma");
        assert!(format!("{:#}", err).contains("gamma"));

        fs::write(&path, "game_len = 0\n").expect("write");
        assert!(load_config(&path).is_err());

        fs::write(&path, "game = \"chess\"\n").expect("write");
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn dataset_path_uses_game_folder_and_prefix() {
        let cfg = EnvConfig {
            data_dir: PathBuf::from("/tmp/sge"),
            ..EnvConfig::default()
        };
        assert_eq!(
            cfg.dataset_path(),
            PathBuf::from("/tmp/sge/subtask_graph_mining/mining_train_1.json")
        );
    }
}
