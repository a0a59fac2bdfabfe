//! Permission resolution against a role catalog
//!
//! Two kinds of query are answered here:
//!
//! - **Unscoped**: is the exact token in the role's permission set?
//! - **Resource-scoped**: among the role's `<resource>:<action>` tokens for
//!   exactly `resource`, does one grant `action`?
//!
//! Scoped queries compare the bare action against the stripped suffix, so
//! `"orders:view"` never satisfies resource `"order"` with action `"s:view"`.

use crate::catalog::RoleCatalog;
use crate::types::Permission;

/// Whether `role` is granted exactly `permission`
pub fn has_permission(catalog: &RoleCatalog, role: &str, permission: &str) -> bool {
    catalog.grants(role, permission)
}

/// Whether `role` is granted `action` on `resource`
///
/// Only permissions whose resource part equals `resource` are considered,
/// and `action` is compared against their action part. Unscoped
/// permissions never satisfy a scoped query.
pub fn has_permission_for_resource(
    catalog: &RoleCatalog,
    role: &str,
    resource: &str,
    action: &str,
) -> bool {
    catalog
        .permissions_of(role)
        .filter_map(|permission| permission.action_on(resource))
        .any(|granted| granted == action)
}

/// Actions `role` may perform on `resource`, in lexical order
pub fn resource_actions<'a>(catalog: &'a RoleCatalog, role: &str, resource: &str) -> Vec<&'a str> {
    catalog
        .permissions_of(role)
        .filter_map(|permission| permission.action_on(resource))
        .collect()
}

/// Most privileged scoped permission `role` holds on `resource`
///
/// With `Some(priority)`, actions are ranked by their position in the list,
/// most privileged first; candidates whose action is not listed are
/// ignored, so the result is `None` when no candidate is listed.
///
/// With `None`, the lexically last candidate is returned. That tie-break is
/// deterministic but carries no meaning; pass a priority list when the
/// ordering matters.
pub fn highest_permission_for_resource<'a>(
    catalog: &'a RoleCatalog,
    role: &str,
    resource: &str,
    priority: Option<&[&str]>,
) -> Option<&'a Permission> {
    let candidates = catalog
        .permissions_of(role)
        .filter(|permission| permission.action_on(resource).is_some());

    match priority {
        Some(priority) => candidates
            .filter_map(|permission| {
                let action = permission.action();
                priority
                    .iter()
                    .position(|listed| *listed == action)
                    .map(|position| (position, permission))
            })
            .min_by_key(|(position, _)| *position)
            .map(|(_, permission)| permission),
        None => candidates.max(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> RoleCatalog {
        RoleCatalog::from_strings(vec![
            ("admin", vec!["viewAllData", "editAllData", "orders:view", "orders:edit", "orders:delete"]),
            ("standard", vec!["orders:view", "orders:edit"]),
            ("guest", vec!["viewData", "catalog:view"]),
        ])
        .unwrap()
    }

    #[test]
    fn test_has_permission() {
        let catalog = catalog();
        assert!(has_permission(&catalog, "admin", "editAllData"));
        assert!(!has_permission(&catalog, "guest", "editAllData"));
        assert!(!has_permission(&catalog, "nobody", "viewData"));
    }

    #[test]
    fn test_has_permission_requires_full_token() {
        let catalog = catalog();
        // Unscoped query never matches a scoped suffix
        assert!(!has_permission(&catalog, "standard", "view"));
        assert!(has_permission(&catalog, "standard", "orders:view"));
    }

    #[test]
    fn test_has_permission_for_resource() {
        let catalog = catalog();
        assert!(has_permission_for_resource(&catalog, "standard", "orders", "view"));
        assert!(!has_permission_for_resource(&catalog, "standard", "orders", "delete"));
        assert!(has_permission_for_resource(&catalog, "admin", "orders", "delete"));
    }

    #[test]
    fn test_scoped_check_rejects_prefix_tricks() {
        let catalog = catalog();
        assert!(!has_permission_for_resource(&catalog, "standard", "order", "s:view"));
        assert!(!has_permission_for_resource(&catalog, "standard", "orders", "orders:view"));
        assert!(!has_permission_for_resource(&catalog, "standard", "", "view"));
    }

    #[test]
    fn test_unscoped_permissions_never_satisfy_scoped_query() {
        let catalog = catalog();
        assert!(!has_permission_for_resource(&catalog, "guest", "viewData", "viewData"));
        assert!(!has_permission_for_resource(&catalog, "admin", "orders", "viewAllData"));
    }

    #[test]
    fn test_malformed_query_action_is_plain_action() {
        let catalog = catalog();
        // Action without a colon is just an action; one with a colon simply never matches
        assert!(has_permission_for_resource(&catalog, "guest", "catalog", "view"));
        assert!(!has_permission_for_resource(&catalog, "guest", "catalog", "catalog:view"));
    }

    #[test]
    fn test_resource_actions() {
        let catalog = catalog();
        assert_eq!(resource_actions(&catalog, "admin", "orders"), vec!["delete", "edit", "view"]);
        assert!(resource_actions(&catalog, "guest", "orders").is_empty());
    }

    #[test]
    fn test_highest_permission_with_priority() {
        let catalog = catalog();
        let priority = ["delete", "edit", "view"];

        let admin = highest_permission_for_resource(&catalog, "admin", "orders", Some(&priority[..]));
        assert_eq!(admin.map(Permission::as_str), Some("orders:delete"));

        let standard = highest_permission_for_resource(&catalog, "standard", "orders", Some(&priority[..]));
        assert_eq!(standard.map(Permission::as_str), Some("orders:edit"));
    }

    #[test]
    fn test_highest_permission_ignores_unlisted_actions() {
        let catalog = catalog();
        let priority = ["delete"];

        assert!(highest_permission_for_resource(&catalog, "standard", "orders", Some(&priority[..])).is_none());
    }

    #[test]
    fn test_highest_permission_lexical_fallback() {
        let catalog = catalog();
        let highest = highest_permission_for_resource(&catalog, "standard", "orders", None);
        assert_eq!(highest.map(Permission::as_str), Some("orders:view"));

        assert!(highest_permission_for_resource(&catalog, "guest", "orders", None).is_none());
        assert!(highest_permission_for_resource(&catalog, "nobody", "orders", None).is_none());
    }
}
