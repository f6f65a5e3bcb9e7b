use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::engine::LedgerMode;

pub const DEFAULT_MAX_DEPTH: usize = 512;

/// Settings for applying patches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Deepest syntax tree a patch application will walk.
    pub max_depth: usize,
    pub ledger_mode: LedgerMode,
    /// Log filter applied by `logging::init_from_config` (e.g., "debug").
    pub log_level: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            max_depth: DEFAULT_MAX_DEPTH,
            ledger_mode: LedgerMode::default(),
            log_level: None,
        }
    }
}

impl EngineConfig {
    /// Parses a JSON configuration; absent keys keep their defaults.
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("Failed to parse engine configuration")
    }

    /// Builds the configuration from the environment or initialization options
    ///
    /// Checks in order:
    /// 1. Environment variable STRUCTPATCH_CONFIG (JSON)
    /// 2. Explicit initialization parameter (JSON)
    /// 3. Falls back to the defaults
    ///
    /// STRUCTPATCH_MAX_DEPTH and STRUCTPATCH_LEDGER_MODE then override single
    /// settings of whichever configuration was chosen.
    pub fn from_env_or_default(init_option: Option<&str>) -> Self {
        let json = std::env::var("STRUCTPATCH_CONFIG").ok();
        let mut config = match json.as_deref().or(init_option) {
            Some(json) => Self::from_json(json).unwrap_or_else(|e| {
                warn!("Ignoring engine configuration: {:#}", e);
                Self::default()
            }),
            None => Self::default(),
        };

        if let Ok(depth) = std::env::var("STRUCTPATCH_MAX_DEPTH") {
            match depth.trim().parse::<usize>() {
                Ok(depth) if depth > 0 => config.max_depth = depth,
                _ => warn!("Invalid STRUCTPATCH_MAX_DEPTH '{}', keeping {}", depth, config.max_depth),
            }
        }
        if let Ok(mode) = std::env::var("STRUCTPATCH_LEDGER_MODE") {
            config.ledger_mode = LedgerMode::parse(&mode);
        }

        config
    }
}
