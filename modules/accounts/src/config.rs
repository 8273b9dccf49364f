use serde::{Deserialize, Serialize};

/// Configuration for the accounts module (`modules.accounts` in the app config).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AccountsConfig {
    #[serde(default = "default_min_password_length")]
    pub min_password_length: usize,
    #[serde(default = "default_max_name_length")]
    pub max_name_length: usize,
    #[serde(default)]
    pub hashing: HashingConfig,
}

/// Argon2id cost parameters used for new password hashes.
/// Existing hashes are verified with the parameters embedded in them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HashingConfig {
    #[serde(default = "default_memory_kib")]
    pub memory_kib: u32,
    #[serde(default = "default_iterations")]
    pub iterations: u32,
    #[serde(default = "default_parallelism")]
    pub parallelism: u32,
}

impl Default for AccountsConfig {
    fn default() -> Self {
        Self {
            min_password_length: default_min_password_length(),
            max_name_length: default_max_name_length(),
            hashing: HashingConfig::default(),
        }
    }
}

impl Default for HashingConfig {
    fn default() -> Self {
        Self {
            memory_kib: default_memory_kib(),
            iterations: default_iterations(),
            parallelism: default_parallelism(),
        }
    }
}

fn default_min_password_length() -> usize {
    6
}

fn default_max_name_length() -> usize {
    255
}

fn default_memory_kib() -> u32 {
    19 * 1024
}

fn default_iterations() -> u32 {
    2
}

fn default_parallelism() -> u32 {
    1
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_fills_defaults() {
        let cfg: AccountsConfig =
            serde_json::from_value(serde_json::json!({ "min_password_length": 10 })).unwrap();
        assert_eq!(cfg.min_password_length, 10);
        assert_eq!(cfg.max_name_length, 255);
        assert_eq!(cfg.hashing.iterations, 2);
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let res: Result<AccountsConfig, _> =
            serde_json::from_value(serde_json::json!({ "min_password": 10 }));
        assert!(res.is_err());
    }
}
