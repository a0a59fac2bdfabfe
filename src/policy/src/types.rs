//! Core policy types

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::borrow::Borrow;
use std::fmt;
use std::str::FromStr;

/// Flag key type
pub type FlagKey = String;

/// Validated role identifier (e.g., "admin", "standard", "guest")
///
/// Role identifiers are non-empty and contain neither whitespace nor `:`,
/// so they can never be confused with a resource-scoped permission.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RoleId(String);

impl RoleId {
    /// Create a role identifier, validating its format
    pub fn new(id: impl Into<String>) -> Result<Self> {
        let id = id.into();

        if id.is_empty() {
            return Err(ConfigError::InvalidRole {
                role: id,
                reason: "role identifier cannot be empty".to_string(),
            });
        }

        if id.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidRole {
                role: id,
                reason: "role identifier cannot contain whitespace".to_string(),
            });
        }

        if id.contains(':') {
            return Err(ConfigError::InvalidRole {
                role: id,
                reason: "role identifier cannot contain ':'".to_string(),
            });
        }

        Ok(Self(id))
    }

    /// Role identifier as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for RoleId {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for RoleId {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self> {
        Self::new(value)
    }
}

impl From<RoleId> for String {
    fn from(role: RoleId) -> Self {
        role.0
    }
}

impl Borrow<str> for RoleId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for RoleId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Permission token
///
/// Either unscoped (`"editAllData"`) or resource-scoped (`"orders:delete"`).
/// Scoped tokens split at the first colon into `<resource>:<action>`.
/// Beyond that convention the token is opaque.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Permission(String);

impl Permission {
    /// Parse a permission token, validating the `<resource>:<action>` convention
    pub fn parse(token: impl Into<String>) -> Result<Self> {
        let token = token.into();

        if token.is_empty() {
            return Err(ConfigError::InvalidPermission {
                permission: token,
                reason: "permission cannot be empty".to_string(),
            });
        }

        if token.chars().any(char::is_whitespace) {
            return Err(ConfigError::InvalidPermission {
                permission: token,
                reason: "permission cannot contain whitespace".to_string(),
            });
        }

        if let Some((resource, action)) = token.split_once(':') {
            if resource.is_empty() {
                return Err(ConfigError::InvalidPermission {
                    permission: token,
                    reason: "scoped permission has an empty resource".to_string(),
                });
            }
            if action.is_empty() {
                return Err(ConfigError::InvalidPermission {
                    permission: token,
                    reason: "scoped permission has an empty action".to_string(),
                });
            }
        }

        Ok(Self(token))
    }

    /// Full permission token
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Whether the token follows the `<resource>:<action>` form
    pub fn is_scoped(&self) -> bool {
        self.0.contains(':')
    }

    /// Resource part of a scoped token
    pub fn resource(&self) -> Option<&str> {
        self.0.split_once(':').map(|(resource, _)| resource)
    }

    /// Action part of a scoped token, or the whole token when unscoped
    pub fn action(&self) -> &str {
        match self.0.split_once(':') {
            Some((_, action)) => action,
            None => &self.0,
        }
    }

    /// Action granted on `resource`, if this token is scoped to exactly that resource
    ///
    /// `"orders:view"` yields `Some("view")` for `"orders"` and `None` for `"order"`.
    pub fn action_on(&self, resource: &str) -> Option<&str> {
        let (scope, action) = self.0.split_once(':')?;
        (scope == resource).then_some(action)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Permission {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for Permission {
    type Error = ConfigError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(value)
    }
}

impl From<Permission> for String {
    fn from(permission: Permission) -> Self {
        permission.0
    }
}

impl Borrow<str> for Permission {
    fn borrow(&self) -> &str {
        &self.0
    }
}

/// Input to a policy decision
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyContext {
    /// Actor's roles (must be non-empty)
    pub roles: Vec<RoleId>,

    /// Resource the action targets, for scoped checks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource: Option<String>,

    /// Required permission, or the bare action when `resource` is set
    pub permission: String,

    /// Feature flag that additionally gates the decision
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag_key: Option<FlagKey>,
}

impl PolicyContext {
    /// Create a context for an unscoped permission check
    pub fn new(roles: Vec<RoleId>, permission: impl Into<String>) -> Self {
        Self {
            roles,
            resource: None,
            permission: permission.into(),
            flag_key: None,
        }
    }

    /// Scope the check to a resource
    pub fn with_resource(mut self, resource: impl Into<String>) -> Self {
        self.resource = Some(resource.into());
        self
    }

    /// Gate the decision on a feature flag
    pub fn with_flag(mut self, flag_key: impl Into<String>) -> Self {
        self.flag_key = Some(flag_key.into());
        self
    }
}

/// Reason attached to every decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DecisionReason {
    /// A held role grants the permission and any gating flag is on
    Granted,

    /// None of the held roles grants the permission
    NoRoleGrantsPermission,

    /// Permission granted but the gating feature flag is off
    FeatureDisabled,
}

impl DecisionReason {
    /// Wire form of the reason
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionReason::Granted => "granted",
            DecisionReason::NoRoleGrantsPermission => "no-role-grants-permission",
            DecisionReason::FeatureDisabled => "feature-disabled",
        }
    }
}

impl fmt::Display for DecisionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Authorization decision
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// Whether the request is allowed
    pub allowed: bool,

    /// Reason for the decision
    pub reason: DecisionReason,
}

impl Decision {
    /// Allow decision
    pub fn granted() -> Self {
        Self {
            allowed: true,
            reason: DecisionReason::Granted,
        }
    }

    /// Deny decision with the given reason
    pub fn deny(reason: DecisionReason) -> Self {
        Self {
            allowed: false,
            reason,
        }
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.allowed {
            write!(f, "allowed: {}", self.reason)
        } else {
            write!(f, "not authorized: {}", self.reason)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_id_validation() {
        assert!(RoleId::new("admin").is_ok());
        assert!(matches!(RoleId::new(""), Err(ConfigError::InvalidRole { .. })));
        assert!(matches!(RoleId::new("super admin"), Err(ConfigError::InvalidRole { .. })));
        assert!(matches!(RoleId::new("orders:admin"), Err(ConfigError::InvalidRole { .. })));
    }

    #[test]
    fn test_permission_parsing() {
        let unscoped = Permission::parse("editAllData").unwrap();
        assert!(!unscoped.is_scoped());
        assert_eq!(unscoped.resource(), None);
        assert_eq!(unscoped.action(), "editAllData");

        let scoped = Permission::parse("orders:delete").unwrap();
        assert!(scoped.is_scoped());
        assert_eq!(scoped.resource(), Some("orders"));
        assert_eq!(scoped.action(), "delete");
    }

    #[test]
    fn test_permission_validation_errors() {
        for bad in ["", ":view", "orders:", "orders: view", "edit all"] {
            assert!(
                matches!(Permission::parse(bad), Err(ConfigError::InvalidPermission { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_action_on_requires_exact_resource() {
        let permission = Permission::parse("orders:view").unwrap();
        assert_eq!(permission.action_on("orders"), Some("view"));
        assert_eq!(permission.action_on("order"), None);
        assert_eq!(permission.action_on("orders:view"), None);

        // Only the first colon separates resource from action
        let nested = Permission::parse("orders:line:edit").unwrap();
        assert_eq!(nested.action_on("orders"), Some("line:edit"));
    }

    #[test]
    fn test_context_wire_format() {
        let json = r#"{"roles":["admin"],"resource":"orders","permission":"delete","flagKey":"newCheckout"}"#;
        let ctx: PolicyContext = serde_json::from_str(json).unwrap();

        assert_eq!(ctx.roles, vec![RoleId::new("admin").unwrap()]);
        assert_eq!(ctx.resource.as_deref(), Some("orders"));
        assert_eq!(ctx.permission, "delete");
        assert_eq!(ctx.flag_key.as_deref(), Some("newCheckout"));
    }

    #[test]
    fn test_context_rejects_malformed_role() {
        let json = r#"{"roles":["not a role"],"permission":"view"}"#;
        assert!(serde_json::from_str::<PolicyContext>(json).is_err());
    }

    #[test]
    fn test_decision_wire_format() {
        let granted = serde_json::to_string(&Decision::granted()).unwrap();
        assert_eq!(granted, r#"{"allowed":true,"reason":"granted"}"#);

        let denied = serde_json::to_value(Decision::deny(DecisionReason::NoRoleGrantsPermission)).unwrap();
        assert_eq!(denied["allowed"], false);
        assert_eq!(denied["reason"], "no-role-grants-permission");

        assert_eq!(DecisionReason::FeatureDisabled.to_string(), "feature-disabled");
    }

    #[test]
    fn test_decision_display() {
        let denied = Decision::deny(DecisionReason::FeatureDisabled);
        assert_eq!(denied.to_string(), "not authorized: feature-disabled");
    }
}
