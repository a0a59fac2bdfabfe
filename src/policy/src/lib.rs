//! # Rolegate Policy Engine
//!
//! Role/permission authorization decisions with a ranked role hierarchy,
//! resource-scoped permissions and runtime feature-flag overrides.
//!
//! ## Features
//!
//! - **Role catalog** mapping roles to `action` or `resource:action` permissions
//! - **Role hierarchy** with unique privilege ranks
//! - **Resource-scoped checks** that compare the bare action, never a substring
//! - **Feature flags** with immutable defaults and lock-free override snapshots
//! - **Deny by default**: unknown roles, permissions and flags are never errors
//! - **HTTP decision service** behind the `server` feature
//!
//! ## Example
//!
//! ```rust
//! use rolegate_policy::{PolicyConfig, PolicyContext, RoleId};
//!
//! let engine = PolicyConfig::from_toml_str(r#"
//!     [[roles]]
//!     name = "guest"
//!     rank = 0
//!     permissions = ["viewData"]
//!
//!     [[roles]]
//!     name = "admin"
//!     rank = 2
//!     permissions = ["viewAllData", "editAllData", "orders:delete"]
//! "#)?
//! .into_engine()?;
//!
//! let ctx = PolicyContext::new(vec![RoleId::new("admin")?], "delete").with_resource("orders");
//! let decision = engine.evaluate(&ctx);
//!
//! assert!(decision.allowed);
//! assert_eq!(decision.reason.as_str(), "granted");
//! # Ok::<(), rolegate_policy::ConfigError>(())
//! ```

pub mod types;
pub mod catalog;
pub mod hierarchy;
pub mod resolver;
pub mod flags;
pub mod engine;
pub mod config;
pub mod error;
#[cfg(feature = "server")]
pub mod server;

// Re-export commonly used types
pub use types::{Decision, DecisionReason, FlagKey, Permission, PolicyContext, RoleId};
pub use catalog::RoleCatalog;
pub use hierarchy::{Rank, RoleHierarchy};
pub use resolver::{
    has_permission, has_permission_for_resource, highest_permission_for_resource, resource_actions,
};
pub use flags::{merge, FeatureFlagStore, FlagSnapshot, FlagState};
pub use engine::{EngineConfig, EngineMetrics, MetricsCollector, PolicyEngine};
pub use config::{PolicyConfig, RoleDefinition};
pub use error::{ConfigError, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
