//! Health reporting on top of the storage liveness probe.

use crate::context::RequestContext;
use crate::storage::StorageEngine;
use serde::Serialize;
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HealthStatus {
    #[serde(rename = "UP")]
    Up,
    #[serde(rename = "DOWN")]
    Down,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CheckResult {
    pub status: HealthStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthReport {
    pub status: HealthStatus,
    pub details: BTreeMap<String, CheckResult>,
}

impl HealthReport {
    pub fn is_up(&self) -> bool {
        self.status == HealthStatus::Up
    }
}

/// Probes the store and reports UP or DOWN.
#[derive(Clone)]
pub struct HealthChecker {
    storage: StorageEngine,
    timeout: Duration,
}

impl HealthChecker {
    pub fn new(storage: StorageEngine, timeout: Duration) -> Self {
        Self { storage, timeout }
    }

    pub async fn check(&self, ctx: &RequestContext) -> HealthReport {
        let probe_ctx = ctx
            .clone()
            .with_deadline(tokio::time::Instant::now() + self.timeout);
        let name = self.storage.name();

        let result = match self.storage.ping(&probe_ctx).await {
            Ok(()) => CheckResult {
                status: HealthStatus::Up,
                error: None,
            },
            Err(e) => {
                warn!(check = name, error = %e, "health check failed");
                CheckResult {
                    status: HealthStatus::Down,
                    error: Some(e.to_string()),
                }
            }
        };

        let status = result.status;
        let mut details = BTreeMap::new();
        details.insert(name.to_string(), result);
        HealthReport { status, details }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_up_and_down() {
        let storage = StorageEngine::open_memory("masterdata", 1).unwrap();
        let checker = HealthChecker::new(storage.clone(), Duration::from_secs(1));
        let ctx = RequestContext::background();

        let report = checker.check(&ctx).await;
        assert!(report.is_up());
        assert_eq!(report.details["memory"].status, HealthStatus::Up);

        if let StorageEngine::Memory(adapter) = &storage {
            adapter.set_offline(true);
        }
        let report = checker.check(&ctx).await;
        assert!(!report.is_up());
        assert!(report.details["memory"].error.is_some());
    }

    #[test]
    fn test_report_json() {
        let mut details = BTreeMap::new();
        details.insert(
            "cassandra".to_string(),
            CheckResult {
                status: HealthStatus::Up,
                error: None,
            },
        );
        let report = HealthReport {
            status: HealthStatus::Up,
            details,
        };
        let json = serde_json::to_string(&report).unwrap();
        assert_eq!(
            json,
            r#"{"status":"UP","details":{"cassandra":{"status":"UP"}}}"#
        );
    }
}
