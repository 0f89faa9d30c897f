//! Engine configuration shared by operators and the op-chain runtime.

use std::env;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{KestrelError, Result};

/// Engine-wide execution knobs.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Rows retained by a sort stage whose fetch is unspecified or non-positive.
    pub default_holder_capacity: usize,
    /// Upper bound on eager allocation for ranking queues and membership sets.
    pub max_initial_capacity: usize,
    /// Engine default for null handling; plan nodes may override it.
    pub null_handling_enabled: bool,
    /// Max op-chains polled concurrently by one scheduler.
    pub worker_slots: usize,
    /// Rows per block emitted by leaf value sources.
    pub batch_size_rows: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_holder_capacity: 10_000,
            max_initial_capacity: 10_000,
            null_handling_enabled: false,
            worker_slots: 2,
            batch_size_rows: 8192,
        }
    }
}

impl EngineConfig {
    /// Build a config from `KESTREL_*` environment variables, falling back to defaults.
    ///
    /// Recognized keys:
    /// - `KESTREL_DEFAULT_HOLDER_CAPACITY`
    /// - `KESTREL_MAX_INITIAL_CAPACITY`
    /// - `KESTREL_NULL_HANDLING_ENABLED`
    /// - `KESTREL_WORKER_SLOTS`
    /// - `KESTREL_BATCH_SIZE_ROWS`
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();
        let cfg = Self {
            default_holder_capacity: env_usize_or_default(
                "KESTREL_DEFAULT_HOLDER_CAPACITY",
                defaults.default_holder_capacity,
            )?,
            max_initial_capacity: env_usize_or_default(
                "KESTREL_MAX_INITIAL_CAPACITY",
                defaults.max_initial_capacity,
            )?,
            null_handling_enabled: env_bool_or_default(
                "KESTREL_NULL_HANDLING_ENABLED",
                defaults.null_handling_enabled,
            )?,
            worker_slots: env_usize_or_default("KESTREL_WORKER_SLOTS", defaults.worker_slots)?,
            batch_size_rows: env_usize_or_default(
                "KESTREL_BATCH_SIZE_ROWS",
                defaults.batch_size_rows,
            )?,
        };
        cfg.validate()?;
        debug!(?cfg, "loaded engine config from environment");
        Ok(cfg)
    }

    /// Reject values no operator can run with.
    pub fn validate(&self) -> Result<()> {
        let positive = [
            ("default_holder_capacity", self.default_holder_capacity),
            ("max_initial_capacity", self.max_initial_capacity),
            ("worker_slots", self.worker_slots),
            ("batch_size_rows", self.batch_size_rows),
        ];
        for (name, value) in positive {
            if value == 0 {
                return Err(KestrelError::InvalidConfig(format!(
                    "{name} must be greater than zero"
                )));
            }
        }
        Ok(())
    }
}

fn env_usize_or_default(key: &str, default: usize) -> Result<usize> {
    match env::var(key) {
        Ok(v) => v.trim().parse::<usize>().map_err(|e| {
            KestrelError::InvalidConfig(format!("{key}='{v}' is not a valid count: {e}"))
        }),
        Err(_) => Ok(default),
    }
}

fn env_bool_or_default(key: &str, default: bool) -> Result<bool> {
    match env::var(key) {
        Ok(v) => match v.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(KestrelError::InvalidConfig(format!(
                "{key}='{other}' is not a valid boolean"
            ))),
        },
        Err(_) => Ok(default),
    }
}
