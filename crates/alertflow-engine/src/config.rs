use serde::{Deserialize, Serialize};

/// Engine tuning knobs. All fields default to the reference behavior, so
/// `EngineConfig::default()` is a fully working configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Background evaluation tick interval.
    #[serde(default = "default_tick_secs")]
    pub tick_secs: u64,

    /// Recency window for merging duplicate alerts at ingestion.
    #[serde(default = "default_dedup_window_minutes")]
    pub dedup_window_minutes: i64,

    /// Priority assigned when the alert's type is not registered.
    #[serde(default = "default_unknown_type_priority")]
    pub unknown_type_priority: u8,

    /// Number of entries in the statistics "top alert types" breakdown.
    #[serde(default = "default_top_types_limit")]
    pub top_types_limit: usize,

    /// Register the built-in alert type definitions at construction.
    #[serde(default = "default_seed_builtin_types")]
    pub seed_builtin_types: bool,

    /// Snowflake machine identifier (0-31). Hosts running several engines
    /// must give each a distinct machine/node pair.
    #[serde(default = "default_snowflake_id")]
    pub machine_id: i32,

    /// Snowflake node identifier (0-31).
    #[serde(default = "default_snowflake_id")]
    pub node_id: i32,
}

fn default_tick_secs() -> u64 {
    5
}

fn default_dedup_window_minutes() -> i64 {
    30
}

fn default_unknown_type_priority() -> u8 {
    50
}

fn default_top_types_limit() -> usize {
    5
}

fn default_seed_builtin_types() -> bool {
    true
}

fn default_snowflake_id() -> i32 {
    1
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_secs: default_tick_secs(),
            dedup_window_minutes: default_dedup_window_minutes(),
            unknown_type_priority: default_unknown_type_priority(),
            top_types_limit: default_top_types_limit(),
            seed_builtin_types: default_seed_builtin_types(),
            machine_id: default_snowflake_id(),
            node_id: default_snowflake_id(),
        }
    }
}
