//! Role catalog: role → granted permission set

use crate::error::{ConfigError, Result};
use crate::types::{Permission, RoleId};
use std::collections::{BTreeSet, HashMap};
use tracing::{debug, info};

/// Immutable mapping from role to its granted permissions
///
/// Once loaded, entries never change. Replacing the whole catalog is done
/// by building a new one and handing it to
/// [`PolicyEngine::replace_catalog`](crate::PolicyEngine::replace_catalog).
#[derive(Debug, Clone)]
pub struct RoleCatalog {
    entries: HashMap<RoleId, BTreeSet<Permission>>,
}

impl RoleCatalog {
    /// Load a catalog from role entries
    ///
    /// Duplicate permissions within one role collapse into a set.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::EmptyCatalog`] when `entries` is empty
    /// - [`ConfigError::DuplicateRole`] when a role appears twice
    pub fn load<I>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (RoleId, Vec<Permission>)>,
    {
        let mut map = HashMap::new();

        for (role, permissions) in entries {
            if map.contains_key(&role) {
                return Err(ConfigError::DuplicateRole(role.to_string()));
            }
            map.insert(role, permissions.into_iter().collect::<BTreeSet<_>>());
        }

        if map.is_empty() {
            return Err(ConfigError::EmptyCatalog);
        }

        info!("Role catalog loaded with {} roles", map.len());

        Ok(Self { entries: map })
    }

    /// Load a catalog from raw strings, validating every role and permission
    pub fn from_strings<I, R, P>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = (R, Vec<P>)>,
        R: Into<String>,
        P: Into<String>,
    {
        let parsed = entries
            .into_iter()
            .map(|(role, permissions)| {
                let role = RoleId::new(role)?;
                let permissions = permissions
                    .into_iter()
                    .map(Permission::parse)
                    .collect::<Result<Vec<_>>>()?;
                Ok((role, permissions))
            })
            .collect::<Result<Vec<_>>>()?;

        Self::load(parsed)
    }

    /// Permissions granted to `role`
    ///
    /// An unknown role is a normal "no grants" case and yields an empty iterator.
    pub fn permissions_of<'a>(&'a self, role: &str) -> impl Iterator<Item = &'a Permission> + 'a {
        let permissions = self.entries.get(role);
        if permissions.is_none() {
            debug!("Unknown role '{}' has no grants", role);
        }
        permissions.into_iter().flat_map(|set| set.iter())
    }

    /// Whether `role` holds exactly `permission`
    pub fn grants(&self, role: &str, permission: &str) -> bool {
        self.entries
            .get(role)
            .is_some_and(|set| set.contains(permission))
    }

    /// Whether the role is defined in this catalog
    pub fn contains_role(&self, role: &str) -> bool {
        self.entries.contains_key(role)
    }

    /// All defined roles, in no particular order
    pub fn roles(&self) -> impl Iterator<Item = &RoleId> {
        self.entries.keys()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
