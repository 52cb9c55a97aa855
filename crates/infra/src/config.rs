//! Engine configuration.
//!
//! Values come from environment variables with defaults; an unparseable value
//! falls back to its default with a warning instead of failing startup.

use tracing::warn;

pub const DEFAULT_SYSTEM_ACTOR: &str = "system";
pub const DEFAULT_MAINTENANCE_LOOKAHEAD_DAYS: u32 = 7;
pub const DEFAULT_MOST_USED_LIMIT: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    /// Actor recorded on movements that name none (`KARDEX_SYSTEM_ACTOR`).
    pub system_actor: String,
    /// Days ahead the maintenance alert looks (`KARDEX_MAINTENANCE_LOOKAHEAD_DAYS`).
    pub maintenance_lookahead_days: u32,
    /// Default row count of the most-used ranking (`KARDEX_MOST_USED_LIMIT`).
    pub most_used_limit: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            system_actor: DEFAULT_SYSTEM_ACTOR.to_string(),
            maintenance_lookahead_days: DEFAULT_MAINTENANCE_LOOKAHEAD_DAYS,
            most_used_limit: DEFAULT_MOST_USED_LIMIT,
        }
    }
}

impl EngineConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        let system_actor = lookup("KARDEX_SYSTEM_ACTOR")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.system_actor);

        Self {
            system_actor,
            maintenance_lookahead_days: parsed(
                &lookup,
                "KARDEX_MAINTENANCE_LOOKAHEAD_DAYS",
                defaults.maintenance_lookahead_days,
            ),
            most_used_limit: parsed(&lookup, "KARDEX_MOST_USED_LIMIT", defaults.most_used_limit),
        }
    }
}

fn parsed<T>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> T
where
    T: std::str::FromStr + std::fmt::Display + Copy,
{
    match lookup(name) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!(variable = name, value = %raw, default = %default, "invalid value, using default");
            default
        }),
    }
}
