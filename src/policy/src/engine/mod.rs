//! Policy engine façade
//!
//! Composes the role catalog, role hierarchy and feature flag store into a
//! single allow/deny [`Decision`] per [`PolicyContext`].
//!
//! # Pipeline
//!
//! ```text
//! PolicyContext → PermissionResolver (any held role grants?) → FeatureFlagStore (flag on?) → Decision
//!                        ↓                                             ↓
//!                   RoleCatalog                                   FlagSnapshot
//! ```
//!
//! The hierarchy is only consulted for "does this actor hold at least role X"
//! questions, never by [`PolicyEngine::evaluate`].

pub mod metrics;

pub use metrics::{EngineMetrics, MetricsCollector};

use crate::catalog::RoleCatalog;
use crate::error::Result;
use crate::flags::{FeatureFlagStore, FlagSnapshot};
use crate::hierarchy::RoleHierarchy;
use crate::resolver;
use crate::types::{Decision, DecisionReason, PolicyContext, RoleId};

use arc_swap::ArcSwap;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{debug, info};

/// Policy engine configuration
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Count every decision by reason
    #[serde(default = "default_true")]
    pub enable_metrics: bool,
}

fn default_true() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            enable_metrics: true,
        }
    }
}

/// Main policy engine
///
/// Holds its collaborators by reference; there is no global state. The
/// catalog can be replaced as a whole while readers keep evaluating against
/// whichever catalog they loaded.
///
/// # Example
///
/// ```
/// use rolegate_policy::{
///     FeatureFlagStore, PolicyContext, PolicyEngine, RoleCatalog, RoleHierarchy, RoleId,
///     DecisionReason,
/// };
/// use std::sync::Arc;
///
/// let catalog = RoleCatalog::from_strings(vec![
///     ("admin", vec!["viewAllData", "editAllData"]),
///     ("guest", vec!["viewData"]),
/// ])?;
/// let hierarchy = RoleHierarchy::from_strings(vec![("guest", 0), ("admin", 2)])?;
/// let flags = FeatureFlagStore::with_defaults([("newUI", false)]);
///
/// let engine = PolicyEngine::new(Arc::new(catalog), Arc::new(hierarchy), Arc::new(flags))?;
///
/// let ctx = PolicyContext::new(vec![RoleId::new("admin")?], "editAllData").with_flag("newUI");
/// assert_eq!(engine.evaluate(&ctx).reason, DecisionReason::FeatureDisabled);
///
/// engine.flags().set_override("newUI", true);
/// assert!(engine.evaluate(&ctx).allowed);
/// # Ok::<(), rolegate_policy::ConfigError>(())
/// ```
pub struct PolicyEngine {
    /// Currently published role catalog
    catalog: ArcSwap<RoleCatalog>,

    /// Role ranks, fixed for the engine's lifetime
    hierarchy: Arc<RoleHierarchy>,

    /// Flag defaults and runtime overrides
    flags: Arc<FeatureFlagStore>,

    /// Decision counters
    metrics: Option<Arc<MetricsCollector>>,

    /// Engine configuration
    config: EngineConfig,
}

impl PolicyEngine {
    /// Create an engine with the default configuration
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnknownRole`](crate::ConfigError::UnknownRole)
    /// when the hierarchy ranks a role the catalog does not define.
    pub fn new(
        catalog: Arc<RoleCatalog>,
        hierarchy: Arc<RoleHierarchy>,
        flags: Arc<FeatureFlagStore>,
    ) -> Result<Self> {
        Self::with_config(EngineConfig::default(), catalog, hierarchy, flags)
    }

    /// Create an engine with the given configuration
    pub fn with_config(
        config: EngineConfig,
        catalog: Arc<RoleCatalog>,
        hierarchy: Arc<RoleHierarchy>,
        flags: Arc<FeatureFlagStore>,
    ) -> Result<Self> {
        hierarchy.validate_against(&catalog)?;

        let metrics = if config.enable_metrics {
            Some(Arc::new(MetricsCollector::new()))
        } else {
            None
        };

        info!(
            "PolicyEngine initialized with {} roles, {} ranked, metrics={}",
            catalog.len(),
            hierarchy.len(),
            config.enable_metrics
        );

        Ok(Self {
            catalog: ArcSwap::new(catalog),
            hierarchy,
            flags,
            metrics,
            config,
        })
    }

    /// Decide whether the context is permitted, reading the live flag store
    ///
    /// 1. Without a resource, any held role must hold `permission` exactly.
    /// 2. With a resource, any held role must grant `permission` as an
    ///    action on that resource.
    /// 3. If a flag key is given and the check passed, the flag must be on.
    ///
    /// Unknown roles and flags are not errors: they resolve to "no grants"
    /// and "disabled".
    ///
    /// # Panics
    ///
    /// Panics if `ctx.roles` is empty. Hosts must reject such requests before
    /// they reach the engine.
    pub fn evaluate(&self, ctx: &PolicyContext) -> Decision {
        self.decide(ctx, |key| self.flags.is_enabled(key))
    }

    /// Decide against an explicit flag snapshot instead of the live store
    ///
    /// # Panics
    ///
    /// Panics if `ctx.roles` is empty.
    pub fn evaluate_with(&self, ctx: &PolicyContext, flags: &FlagSnapshot) -> Decision {
        self.decide(ctx, |key| flags.is_enabled(key))
    }

    fn decide(&self, ctx: &PolicyContext, flag_enabled: impl Fn(&str) -> bool) -> Decision {
        assert!(
            !ctx.roles.is_empty(),
            "policy evaluation requires at least one role"
        );

        let catalog = self.catalog.load();

        let permitted = match ctx.resource.as_deref() {
            None => ctx
                .roles
                .iter()
                .any(|role| resolver::has_permission(&catalog, role.as_str(), &ctx.permission)),
            Some(resource) => ctx.roles.iter().any(|role| {
                resolver::has_permission_for_resource(&catalog, role.as_str(), resource, &ctx.permission)
            }),
        };

        let decision = if !permitted {
            Decision::deny(DecisionReason::NoRoleGrantsPermission)
        } else {
            match ctx.flag_key.as_deref() {
                Some(key) if !flag_enabled(key) => Decision::deny(DecisionReason::FeatureDisabled),
                _ => Decision::granted(),
            }
        };

        debug!(
            "Decision: {} roles={:?} resource={:?} permission={} flag={:?}",
            decision, ctx.roles, ctx.resource, ctx.permission, ctx.flag_key
        );

        if let Some(metrics) = &self.metrics {
            metrics.record_decision(&decision);
        }

        decision
    }

    /// Replace the whole role catalog
    ///
    /// The new catalog must still define every ranked role. Evaluations in
    /// flight finish against the catalog they loaded.
    pub fn replace_catalog(&self, catalog: RoleCatalog) -> Result<()> {
        self.hierarchy.validate_against(&catalog)?;

        let roles = catalog.len();
        self.catalog.store(Arc::new(catalog));

        if let Some(metrics) = &self.metrics {
            metrics.record_catalog_reload();
        }

        info!("Role catalog replaced ({} roles)", roles);
        Ok(())
    }

    /// Currently published role catalog
    pub fn catalog(&self) -> Arc<RoleCatalog> {
        self.catalog.load_full()
    }

    pub fn hierarchy(&self) -> &RoleHierarchy {
        &self.hierarchy
    }

    pub fn flags(&self) -> &FeatureFlagStore {
        &self.flags
    }

    /// Most privileged of the actor's roles
    ///
    /// # Panics
    ///
    /// Panics if `roles` is empty.
    pub fn highest_role<'a>(&self, roles: &'a [RoleId]) -> &'a RoleId {
        self.hierarchy.highest_role(roles)
    }

    /// Whether the actor holds any of the required roles
    pub fn has_any_role(&self, actor_roles: &[RoleId], required: &[RoleId]) -> bool {
        RoleHierarchy::has_any_role(actor_roles, required)
    }

    /// Whether the actor holds at least `minimum` in the hierarchy
    pub fn has_role_at_least(&self, actor_roles: &[RoleId], minimum: &str) -> bool {
        self.hierarchy.has_role_at_least(actor_roles, minimum)
    }

    /// Get engine metrics
    pub fn get_metrics(&self) -> Option<EngineMetrics> {
        self.metrics.as_ref().map(|metrics| metrics.get_metrics())
    }

    /// Export metrics in Prometheus text format, if enabled
    pub fn export_prometheus(&self) -> Option<String> {
        self.metrics.as_ref().map(|metrics| metrics.export_prometheus())
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}
