use std::path::PathBuf;

use thiserror::Error;

use crate::application::lending::SeedPolicy;

pub const DATA_DIR_VAR: &str = "LIBRARY_DATA_DIR";
pub const PORT_VAR: &str = "PORT";
pub const SEED_VAR: &str = "LIBRARY_SEED";

const DEFAULT_PORT: u16 = 3000;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} must be a port number, got `{value}`")]
    InvalidPort { var: &'static str, value: String },

    #[error("{var} must be `defaults` or `empty`, got `{value}`")]
    InvalidSeed { var: &'static str, value: String },
}

/// サーバー起動時の設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// CSVファイルを置くディレクトリ
    pub data_dir: PathBuf,
    pub port: u16,
    /// ファイルが存在しない場合の初期データ
    pub seed: SeedPolicy,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("."),
            port: DEFAULT_PORT,
            seed: SeedPolicy::Defaults,
        }
    }
}

impl AppConfig {
    /// 環境変数から設定を読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// 任意の変数ソースから設定を読み込む
    ///
    /// 未設定・空文字の変数は既定値になる。
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |var: &str| lookup(var).filter(|v| !v.trim().is_empty());
        let mut config = Self::default();

        if let Some(dir) = get(DATA_DIR_VAR) {
            config.data_dir = PathBuf::from(dir);
        }

        if let Some(value) = get(PORT_VAR) {
            config.port = value.trim().parse().map_err(|_| ConfigError::InvalidPort {
                var: PORT_VAR,
                value,
            })?;
        }

        if let Some(value) = get(SEED_VAR) {
            config.seed = value.trim().parse().map_err(|_| ConfigError::InvalidSeed {
                var: SEED_VAR,
                value,
            })?;
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |var: &str| vars.get(var).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let config = AppConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.port, 3000);
        assert_eq!(config.data_dir, PathBuf::from("."));
        assert_eq!(config.seed, SeedPolicy::Defaults);
    }

    #[test]
    fn test_reads_all_variables() {
        let config = AppConfig::from_lookup(lookup(&[
            (DATA_DIR_VAR, "/var/lib/library"),
            (PORT_VAR, "8080"),
            (SEED_VAR, "empty"),
        ]))
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/var/lib/library"));
        assert_eq!(config.port, 8080);
        assert_eq!(config.seed, SeedPolicy::Empty);
    }

    #[test]
    fn test_blank_values_fall_back_to_defaults() {
        let config = AppConfig::from_lookup(lookup(&[(PORT_VAR, " "), (DATA_DIR_VAR, "")])).unwrap();
        assert_eq!(config, AppConfig::default());
    }

    #[test]
    fn test_invalid_port() {
        let err = AppConfig::from_lookup(lookup(&[(PORT_VAR, "http")])).unwrap_err();
        assert_eq!(
            err,
            ConfigError::InvalidPort {
                var: PORT_VAR,
                value: "http".to_string()
            }
        );
    }

    #[test]
    fn test_invalid_seed() {
        let err = AppConfig::from_lookup(lookup(&[(SEED_VAR, "demo")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidSeed { .. }));
    }
}
