//! Decision counters for policy engine observability

use crate::types::{Decision, DecisionReason};
use std::sync::atomic::{AtomicU64, Ordering};

/// Point-in-time copy of the engine counters
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineMetrics {
    /// Total number of evaluated contexts
    pub total_decisions: u64,

    /// Number of allowed decisions
    pub allowed_decisions: u64,

    /// Denied because no held role grants the permission
    pub denied_no_grant: u64,

    /// Denied because the gating feature flag is off
    pub denied_feature_disabled: u64,

    /// Number of whole-catalog replacements
    pub catalog_reloads: u64,
}

impl EngineMetrics {
    /// Denied decisions of any reason
    pub fn denied_decisions(&self) -> u64 {
        self.denied_no_grant + self.denied_feature_disabled
    }

    /// Calculate allow rate
    pub fn allow_rate(&self) -> f64 {
        if self.total_decisions == 0 {
            0.0
        } else {
            self.allowed_decisions as f64 / self.total_decisions as f64
        }
    }
}

/// Lock-free metrics collector
///
/// Counters are plain atomics so recording never blocks the decision path.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    total_decisions: AtomicU64,
    allowed_decisions: AtomicU64,
    denied_no_grant: AtomicU64,
    denied_feature_disabled: AtomicU64,
    catalog_reloads: AtomicU64,
}

impl MetricsCollector {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a policy decision
    pub fn record_decision(&self, decision: &Decision) {
        self.total_decisions.fetch_add(1, Ordering::Relaxed);

        let counter = match decision.reason {
            DecisionReason::Granted => &self.allowed_decisions,
            DecisionReason::NoRoleGrantsPermission => &self.denied_no_grant,
            DecisionReason::FeatureDisabled => &self.denied_feature_disabled,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a catalog replacement
    pub fn record_catalog_reload(&self) {
        self.catalog_reloads.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn get_metrics(&self) -> EngineMetrics {
        EngineMetrics {
            total_decisions: self.total_decisions.load(Ordering::Relaxed),
            allowed_decisions: self.allowed_decisions.load(Ordering::Relaxed),
            denied_no_grant: self.denied_no_grant.load(Ordering::Relaxed),
            denied_feature_disabled: self.denied_feature_disabled.load(Ordering::Relaxed),
            catalog_reloads: self.catalog_reloads.load(Ordering::Relaxed),
        }
    }

    /// Reset all metrics
    pub fn reset(&self) {
        for counter in [
            &self.total_decisions,
            &self.allowed_decisions,
            &self.denied_no_grant,
            &self.denied_feature_disabled,
            &self.catalog_reloads,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }

    /// Export metrics in Prometheus format
    pub fn export_prometheus(&self) -> String {
        let metrics = self.get_metrics();

        format!(
            r#"# HELP rolegate_decisions_total Total number of policy decisions
# TYPE rolegate_decisions_total counter
rolegate_decisions_total {}

# HELP rolegate_decisions_by_reason_total Policy decisions by reason
# TYPE rolegate_decisions_by_reason_total counter
rolegate_decisions_by_reason_total{{reason="granted"}} {}
rolegate_decisions_by_reason_total{{reason="no-role-grants-permission"}} {}
rolegate_decisions_by_reason_total{{reason="feature-disabled"}} {}

# HELP rolegate_catalog_reloads_total Whole-catalog replacements
# TYPE rolegate_catalog_reloads_total counter
rolegate_catalog_reloads_total {}
"#,
            metrics.total_decisions,
            metrics.allowed_decisions,
            metrics.denied_no_grant,
            metrics.denied_feature_disabled,
            metrics.catalog_reloads,
        )
    }
}
