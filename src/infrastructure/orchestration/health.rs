//! Startup health reporting.

use crate::infrastructure::config::settings::Config;
use crate::infrastructure::config::sync::SYNC_SECRET_ENV;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    Healthy,
    Unhealthy(String),
}

#[derive(Debug, Clone)]
pub struct HealthCheck {
    name: &'static str,
    critical: bool,
    status: HealthStatus,
}

impl HealthCheck {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn critical(&self) -> bool {
        self.critical
    }

    pub fn status(&self) -> &HealthStatus {
        &self.status
    }

    pub fn is_healthy(&self) -> bool {
        matches!(self.status, HealthStatus::Healthy)
    }
}

#[derive(Debug, Clone)]
pub struct HealthReport {
    checks: Vec<HealthCheck>,
}

impl HealthReport {
    pub fn checks(&self) -> &[HealthCheck] {
        &self.checks
    }

    pub fn is_healthy(&self) -> bool {
        self.checks
            .iter()
            .filter(|check| check.critical())
            .all(HealthCheck::is_healthy)
    }
}

fn non_empty(value: &str, message: &str) -> HealthStatus {
    if value.trim().is_empty() {
        HealthStatus::Unhealthy(message.to_string())
    } else {
        HealthStatus::Healthy
    }
}

/// Static checks over a loaded configuration.
pub fn health_check(config: &Config) -> HealthReport {
    let mut checks = Vec::new();

    checks.push(HealthCheck {
        name: "pairs",
        critical: true,
        status: if config.pairs.is_empty() {
            HealthStatus::Unhealthy("no pairs configured".to_string())
        } else {
            HealthStatus::Healthy
        },
    });

    checks.push(HealthCheck {
        name: "spot_ws",
        critical: true,
        status: non_empty(&config.exchange.spot_ws_url, "spot_ws_url is empty"),
    });

    checks.push(HealthCheck {
        name: "futures_ws",
        critical: true,
        status: non_empty(&config.exchange.futures_ws_url, "futures_ws_url is empty"),
    });

    checks.push(HealthCheck {
        name: "store_url",
        critical: true,
        status: non_empty(&config.sync.url, "sync.url is empty"),
    });

    checks.push(HealthCheck {
        name: "store_secret",
        critical: true,
        status: match config.sync.secret {
            Some(_) => HealthStatus::Healthy,
            None => HealthStatus::Unhealthy(format!("{SYNC_SECRET_ENV} is not set")),
        },
    });

    let shards = config.pairs.len().div_ceil(config.feed.pairs_per_shard.max(1));
    checks.push(HealthCheck {
        name: "shard_capacity",
        critical: false,
        status: if shards > config.feed.max_shards_per_market {
            HealthStatus::Unhealthy(format!(
                "{} pairs need {shards} shards, last shard will hold the overflow",
                config.pairs.len()
            ))
        } else {
            HealthStatus::Healthy
        },
    });

    HealthReport { checks }
}

#[cfg(test)]
mod tests {
    use super::{health_check, HealthCheck, HealthReport, HealthStatus};
    use crate::infrastructure::config::settings::Config;
    use crate::testkit;

    fn find<'a>(report: &'a HealthReport, name: &str) -> &'a HealthCheck {
        report.checks().iter().find(|c| c.name() == name).unwrap()
    }

    #[test]
    fn health_report_is_healthy_when_all_critical_pass() {
        let report = HealthReport {
            checks: vec![
                HealthCheck {
                    name: "critical_pass",
                    critical: true,
                    status: HealthStatus::Healthy,
                },
                HealthCheck {
                    name: "non_critical_fail",
                    critical: false,
                    status: HealthStatus::Unhealthy("warning".to_string()),
                },
            ],
        };

        assert!(report.is_healthy());
    }

    #[test]
    fn valid_config_is_healthy() {
        let report = health_check(&testkit::config::config(&["BTCUSDT", "ETHUSDT"]));
        assert!(report.is_healthy());
        assert_eq!(report.checks().len(), 6);
    }

    #[test]
    fn default_config_fails_critical_checks() {
        let report = health_check(&Config::default());
        assert!(!report.is_healthy());
        assert!(!find(&report, "pairs").is_healthy());
        assert!(!find(&report, "spot_ws").is_healthy());
        assert!(!find(&report, "store_secret").is_healthy());
    }

    #[test]
    fn missing_secret_is_reported() {
        let mut config = testkit::config::config(&["BTCUSDT"]);
        config.sync.secret = None;

        let report = health_check(&config);
        let check = find(&report, "store_secret");
        assert!(check.critical());
        assert!(matches!(check.status(), HealthStatus::Unhealthy(m) if m.contains("SPREADWATCH_SYNC_SECRET")));
    }

    #[test]
    fn shard_overflow_is_a_warning() {
        let mut config = testkit::config::config(&["A", "B", "C"]);
        config.feed.pairs_per_shard = 1;
        config.feed.max_shards_per_market = 2;

        let report = health_check(&config);
        assert!(!find(&report, "shard_capacity").is_healthy());
        assert!(report.is_healthy());
    }
}
