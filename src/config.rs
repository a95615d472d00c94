//! Process configuration, read from environment variables (and an optional `.env` file).

use crate::calculator::types::OperationTimings;

use anyhow::Result;
use std::env;
use std::net::SocketAddr;

/// Load .env file (silently ignores if missing).
pub fn load_dotenv() {
    dotenvy::dotenv().ok();
}

fn lookup_opt(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Positive integer or the default. Zero counts as unset.
fn lookup_positive(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: u64) -> u64 {
    lookup_opt(lookup, key)
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

// ── Orchestrator ──────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct OrchestratorConfig {
    pub port: u16,
    pub timings: OperationTimings,
    /// How long an agent may hold a task before it is handed out again. 0 = never.
    pub task_lease_ms: u64,
    pub stats_interval_secs: u64,
}

impl OrchestratorConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = OperationTimings::default();

        Self {
            port: lookup_opt(&lookup, "PORT")
                .and_then(|v| v.parse().ok())
                .unwrap_or(8080),
            timings: OperationTimings {
                addition_ms: lookup_positive(&lookup, "TIME_ADDITION_MS", defaults.addition_ms),
                subtraction_ms: lookup_positive(
                    &lookup,
                    "TIME_SUBTRACTION_MS",
                    defaults.subtraction_ms,
                ),
                multiplication_ms: lookup_positive(
                    &lookup,
                    "TIME_MULTIPLICATIONS_MS",
                    defaults.multiplication_ms,
                ),
                division_ms: lookup_positive(&lookup, "TIME_DIVISIONS_MS", defaults.division_ms),
            },
            // Zero is meaningful here: it turns leasing off.
            task_lease_ms: lookup_opt(&lookup, "TASK_LEASE_MS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(30_000),
            stats_interval_secs: lookup_positive(&lookup, "STATS_INTERVAL_SECS", 5),
        }
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

// ── Agent ─────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub orchestrator_url: String,
    pub computing_power: usize,
    /// Backoff after a failed fetch, in ms.
    pub poll_interval_ms: u64,
}

impl AgentConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let orchestrator_url = lookup_opt(&lookup, "ORCHESTRATOR_URL")
            .ok_or_else(|| anyhow::anyhow!("ORCHESTRATOR_URL is not set"))?;

        Ok(Self {
            orchestrator_url: orchestrator_url.trim_end_matches('/').to_string(),
            computing_power: lookup_positive(&lookup, "COMPUTING_POWER", 1) as usize,
            poll_interval_ms: lookup_positive(&lookup, "AGENT_POLL_INTERVAL_MS", 2000),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_orchestrator_defaults() {
        let config = OrchestratorConfig::from_lookup(lookup_from(&[]));

        assert_eq!(config.port, 8080);
        assert_eq!(config.timings, OperationTimings::default());
        assert_eq!(config.task_lease_ms, 30_000);
        assert_eq!(config.stats_interval_secs, 5);
        assert_eq!(config.bind_addr().port(), 8080);
    }

    #[test]
    fn test_orchestrator_overrides() {
        let config = OrchestratorConfig::from_lookup(lookup_from(&[
            ("PORT", "9090"),
            ("TIME_ADDITION_MS", "10"),
            ("TIME_SUBTRACTION_MS", "20"),
            ("TIME_MULTIPLICATIONS_MS", "30"),
            ("TIME_DIVISIONS_MS", "40"),
            ("TASK_LEASE_MS", "0"),
        ]));

        assert_eq!(config.port, 9090);
        assert_eq!(config.timings.addition_ms, 10);
        assert_eq!(config.timings.subtraction_ms, 20);
        assert_eq!(config.timings.multiplication_ms, 30);
        assert_eq!(config.timings.division_ms, 40);
        assert_eq!(config.task_lease_ms, 0);
    }

    #[test]
    fn test_orchestrator_falls_back_on_garbage_and_zero() {
        let config = OrchestratorConfig::from_lookup(lookup_from(&[
            ("PORT", "not-a-port"),
            ("TIME_ADDITION_MS", "0"),
            ("TIME_DIVISIONS_MS", "-5"),
            ("STATS_INTERVAL_SECS", ""),
        ]));

        assert_eq!(config.port, 8080);
        assert_eq!(config.timings.addition_ms, 1000);
        assert_eq!(config.timings.division_ms, 2000);
        assert_eq!(config.stats_interval_secs, 5);
    }

    #[test]
    fn test_agent_requires_orchestrator_url() {
        let err = AgentConfig::from_lookup(lookup_from(&[])).unwrap_err();
        assert!(err.to_string().contains("ORCHESTRATOR_URL"));
    }

    #[test]
    fn test_agent_config() {
        let config = AgentConfig::from_lookup(lookup_from(&[
            ("ORCHESTRATOR_URL", "http://localhost:8080/"),
            ("COMPUTING_POWER", "4"),
        ]))
        .unwrap();

        assert_eq!(config.orchestrator_url, "http://localhost:8080");
        assert_eq!(config.computing_power, 4);
        assert_eq!(config.poll_interval_ms, 2000);

        let config = AgentConfig::from_lookup(lookup_from(&[
            ("ORCHESTRATOR_URL", "http://localhost:8080"),
            ("COMPUTING_POWER", "zero"),
        ]))
        .unwrap();
        assert_eq!(config.computing_power, 1);
    }
}
