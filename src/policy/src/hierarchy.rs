//! Role hierarchy: total order over roles by privilege rank

use crate::catalog::RoleCatalog;
use crate::error::{ConfigError, Result};
use crate::types::RoleId;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};
use std::fmt;
use tracing::{debug, info};

/// Privilege rank of a role
///
/// Known roles carry a non-negative rank that increases with privilege.
/// Unknown roles resolve to [`Rank::UNRANKED`], which sorts below every real rank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Rank(Option<u32>);

impl Rank {
    /// Rank given to roles missing from the hierarchy
    pub const UNRANKED: Rank = Rank(None);

    pub fn new(rank: u32) -> Self {
        Rank(Some(rank))
    }

    /// Numeric rank, or `None` when unranked
    pub fn value(&self) -> Option<u32> {
        self.0
    }

    pub fn is_ranked(&self) -> bool {
        self.0.is_some()
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            Some(rank) => write!(f, "{}", rank),
            None => f.write_str("unranked"),
        }
    }
}

/// Total order over roles by privilege rank
///
/// # Examples
///
/// ```
/// use rolegate_policy::{RoleHierarchy, RoleId};
///
/// let hierarchy = RoleHierarchy::from_strings(vec![("guest", 0), ("standard", 1), ("admin", 2)])?;
/// let roles = vec![RoleId::new("guest")?, RoleId::new("admin")?];
///
/// assert_eq!(hierarchy.highest_role(&roles).as_str(), "admin");
/// # Ok::<(), rolegate_policy::ConfigError>(())
/// ```
#[derive(Debug, Clone)]
pub struct RoleHierarchy {
    ranks: HashMap<RoleId, u32>,
}

impl RoleHierarchy {
    /// Build a hierarchy from `(role, rank)` pairs
    ///
    /// # Errors
    ///
    /// - [`ConfigError::EmptyHierarchy`] when no roles are given
    /// - [`ConfigError::DuplicateRole`] when a role is ranked twice
    /// - [`ConfigError::DuplicateRank`] when two roles share a rank
    pub fn build<I>(ranked: I) -> Result<Self>
    where
        I: IntoIterator<Item = (RoleId, u32)>,
    {
        let mut ranks = HashMap::new();
        let mut by_rank: HashMap<u32, RoleId> = HashMap::new();

        for (role, rank) in ranked {
            if ranks.contains_key(&role) {
                return Err(ConfigError::DuplicateRole(role.to_string()));
            }
            if let Some(existing) = by_rank.get(&rank) {
                return Err(ConfigError::DuplicateRank {
                    rank,
                    first: existing.to_string(),
                    second: role.to_string(),
                });
            }
            by_rank.insert(rank, role.clone());
            ranks.insert(role, rank);
        }

        if ranks.is_empty() {
            return Err(ConfigError::EmptyHierarchy);
        }

        info!("Role hierarchy built with {} ranked roles", ranks.len());

        Ok(Self { ranks })
    }

    /// Build a hierarchy from raw role strings
    pub fn from_strings<I, R>(ranked: I) -> Result<Self>
    where
        I: IntoIterator<Item = (R, u32)>,
        R: Into<String>,
    {
        let parsed = ranked
            .into_iter()
            .map(|(role, rank)| Ok((RoleId::new(role)?, rank)))
            .collect::<Result<Vec<_>>>()?;

        Self::build(parsed)
    }

    /// Check that every ranked role is defined in `catalog`
    pub fn validate_against(&self, catalog: &RoleCatalog) -> Result<()> {
        let mut missing: Vec<&RoleId> = self
            .ranks
            .keys()
            .filter(|role| !catalog.contains_role(role.as_str()))
            .collect();

        if missing.is_empty() {
            return Ok(());
        }

        missing.sort();
        Err(ConfigError::UnknownRole(missing[0].to_string()))
    }

    /// Rank of `role`; unknown roles are least privileged
    pub fn rank(&self, role: &str) -> Rank {
        match self.ranks.get(role) {
            Some(rank) => Rank::new(*rank),
            None => {
                debug!("Role '{}' is not ranked, treating as least privileged", role);
                Rank::UNRANKED
            }
        }
    }

    /// Order two roles by rank
    pub fn compare(&self, a: &str, b: &str) -> Ordering {
        self.rank(a).cmp(&self.rank(b))
    }

    /// Most privileged role in `roles`
    ///
    /// Left fold seeded with the first element; a later role replaces the
    /// accumulator only when it ranks strictly higher, so among equally
    /// ranked (e.g. unknown) roles the first one wins.
    ///
    /// # Panics
    ///
    /// Panics if `roles` is empty. An empty role list is a caller bug, not a
    /// runtime condition; use [`try_highest_role`](Self::try_highest_role)
    /// when the input is not known to be non-empty.
    pub fn highest_role<'a>(&self, roles: &'a [RoleId]) -> &'a RoleId {
        match self.try_highest_role(roles) {
            Some(role) => role,
            None => panic!("highest_role requires at least one role"),
        }
    }

    /// Most privileged role in `roles`, or `None` for an empty slice
    pub fn try_highest_role<'a>(&self, roles: &'a [RoleId]) -> Option<&'a RoleId> {
        let (first, rest) = roles.split_first()?;

        Some(rest.iter().fold(first, |highest, role| {
            if self.compare(role.as_str(), highest.as_str()) == Ordering::Greater {
                role
            } else {
                highest
            }
        }))
    }

    /// Whether the actor's roles and the required roles intersect
    pub fn has_any_role(actor_roles: &[RoleId], required: &[RoleId]) -> bool {
        let held: HashSet<&RoleId> = actor_roles.iter().collect();
        required.iter().any(|role| held.contains(role))
    }

    /// Whether the actor's highest role ranks at least as high as `minimum`
    ///
    /// Always false when `minimum` itself is not ranked or the actor holds no role.
    pub fn has_role_at_least(&self, actor_roles: &[RoleId], minimum: &str) -> bool {
        let required = self.rank(minimum);
        if !required.is_ranked() {
            return false;
        }

        self.try_highest_role(actor_roles)
            .is_some_and(|highest| self.rank(highest.as_str()) >= required)
    }

    /// Ranked roles from least to most privileged
    pub fn ordered_roles(&self) -> Vec<&RoleId> {
        let mut roles: Vec<(&RoleId, u32)> = self.ranks.iter().map(|(r, k)| (r, *k)).collect();
        roles.sort_by_key(|(_, rank)| *rank);
        roles.into_iter().map(|(role, _)| role).collect()
    }

    pub fn len(&self) -> usize {
        self.ranks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ranks.is_empty()
    }
}
