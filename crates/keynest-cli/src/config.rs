//! CLI configuration.
//!
//! Loaded from `KEYNEST_*` environment variables with defaults for
//! everything, so `keynest` works with no setup at all.

use std::path::PathBuf;

use keynest_core::crypto::{DEFAULT_KDF_ITERATIONS, KdfParams, MIN_KDF_ITERATIONS};

/// Where the plan flag and other local state are kept.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageKind {
    /// Process memory only.
    Memory,
    /// A redb file on disk.
    Redb { path: PathBuf },
}

/// Resolved CLI configuration.
#[derive(Debug, Clone)]
pub struct CliConfig {
    pub storage: StorageKind,
    /// Log filter used when `RUST_LOG` is not set.
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable ones.
    pub log_json: bool,
    /// PBKDF2 iteration count, never below [`MIN_KDF_ITERATIONS`].
    pub kdf_iterations: u32,
}

impl CliConfig {
    /// Load configuration from the process environment.
    ///
    /// - `KEYNEST_STORAGE` — `memory` or `redb` (default: `redb`)
    /// - `KEYNEST_STORAGE_PATH` — redb file (default: `~/.keynest/keynest.redb`)
    /// - `KEYNEST_LOG_LEVEL` — log filter (default: `warn`)
    /// - `KEYNEST_LOG_FORMAT` — `json` for structured logs (default: text)
    /// - `KEYNEST_KDF_ITERATIONS` — PBKDF2 rounds (default and minimum: `100000`)
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let storage = match lookup("KEYNEST_STORAGE")
            .unwrap_or_default()
            .to_lowercase()
            .as_str()
        {
            "memory" => StorageKind::Memory,
            _ => StorageKind::Redb {
                path: lookup("KEYNEST_STORAGE_PATH")
                    .map_or_else(|| default_storage_path(&lookup), PathBuf::from),
            },
        };

        let log_level = lookup("KEYNEST_LOG_LEVEL").unwrap_or_else(|| "warn".to_owned());

        let log_json = lookup("KEYNEST_LOG_FORMAT").is_some_and(|v| v.eq_ignore_ascii_case("json"));

        let kdf_iterations = lookup("KEYNEST_KDF_ITERATIONS")
            .and_then(|v| v.trim().parse::<u32>().ok())
            .unwrap_or(DEFAULT_KDF_ITERATIONS)
            .max(MIN_KDF_ITERATIONS);

        Self {
            storage,
            log_level,
            log_json,
            kdf_iterations,
        }
    }

    /// KDF parameters for the configured iteration count.
    #[must_use]
    pub fn kdf_params(&self) -> KdfParams {
        KdfParams::new(self.kdf_iterations).unwrap_or_default()
    }
}

fn default_storage_path(lookup: &impl Fn(&str) -> Option<String>) -> PathBuf {
    lookup("HOME")
        .or_else(|| lookup("USERPROFILE"))
        .map_or_else(
            || PathBuf::from("keynest.redb"),
            |home| PathBuf::from(home).join(".keynest").join("keynest.redb"),
        )
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(vars: &[(&str, &str)]) -> CliConfig {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        CliConfig::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn defaults() {
        let cfg = config(&[("HOME", "/home/dev")]);
        assert_eq!(
            cfg.storage,
            StorageKind::Redb {
                path: PathBuf::from("/home/dev/.keynest/keynest.redb")
            }
        );
        assert_eq!(cfg.log_level, "warn");
        assert!(!cfg.log_json);
        assert_eq!(cfg.kdf_iterations, 100_000);
    }

    #[test]
    fn no_home_falls_back_to_working_directory() {
        let cfg = config(&[]);
        assert_eq!(
            cfg.storage,
            StorageKind::Redb {
                path: PathBuf::from("keynest.redb")
            }
        );
    }

    #[test]
    fn explicit_storage_settings() {
        let cfg = config(&[("KEYNEST_STORAGE", "MEMORY")]);
        assert_eq!(cfg.storage, StorageKind::Memory);

        let cfg = config(&[("KEYNEST_STORAGE_PATH", "/tmp/kn.redb")]);
        assert_eq!(
            cfg.storage,
            StorageKind::Redb {
                path: PathBuf::from("/tmp/kn.redb")
            }
        );
    }

    #[test]
    fn weak_iteration_counts_are_raised_to_minimum() {
        assert_eq!(config(&[("KEYNEST_KDF_ITERATIONS", "1000")]).kdf_iterations, 100_000);
        assert_eq!(config(&[("KEYNEST_KDF_ITERATIONS", "junk")]).kdf_iterations, 100_000);

        let cfg = config(&[("KEYNEST_KDF_ITERATIONS", "600000")]);
        assert_eq!(cfg.kdf_iterations, 600_000);
        assert_eq!(cfg.kdf_params().iterations(), 600_000);
    }

    #[test]
    fn json_log_format() {
        assert!(config(&[("KEYNEST_LOG_FORMAT", "json")]).log_json);
        assert!(!config(&[("KEYNEST_LOG_FORMAT", "pretty")]).log_json);
    }
}
