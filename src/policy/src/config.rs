//! Policy document loading and validation
//!
//! A policy document describes roles (with rank and permissions), default
//! feature flags and engine settings. It can be written as TOML or JSON:
//!
//! ```toml
//! [engine]
//! enable_metrics = true
//!
//! [[roles]]
//! name = "guest"
//! rank = 0
//! permissions = ["viewData"]
//!
//! [[roles]]
//! name = "admin"
//! rank = 2
//! permissions = ["viewAllData", "editAllData"]
//!
//! [flags]
//! newUI = false
//! ```

use crate::catalog::RoleCatalog;
use crate::engine::{EngineConfig, PolicyEngine};
use crate::error::Result;
use crate::flags::FeatureFlagStore;
use crate::hierarchy::RoleHierarchy;
use crate::types::{FlagKey, Permission, RoleId};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Complete policy document
#[derive(Debug, Clone, Deserialize)]
pub struct PolicyConfig {
    #[serde(default)]
    pub engine: EngineConfig,

    pub roles: Vec<RoleDefinition>,

    /// Default feature flag values
    #[serde(default)]
    pub flags: HashMap<FlagKey, bool>,
}

/// One role entry in a policy document
#[derive(Debug, Clone, Deserialize)]
pub struct RoleDefinition {
    pub name: String,
    pub rank: u32,
    #[serde(default)]
    pub permissions: Vec<String>,
}

impl PolicyConfig {
    /// Parse a TOML policy document
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Parse a JSON policy document
    pub fn from_json_str(contents: &str) -> Result<Self> {
        Ok(serde_json::from_str(contents)?)
    }

    /// Load a policy document from disk; `.json` files are parsed as JSON, anything else as TOML
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)?;

        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&contents)?,
            _ => Self::from_toml_str(&contents)?,
        };

        info!("Loaded policy document {} ({} roles)", path.display(), config.roles.len());
        Ok(config)
    }

    /// Build the role catalog, validating role and permission formats
    pub fn build_catalog(&self) -> Result<RoleCatalog> {
        let entries = self
            .roles
            .iter()
            .map(|role| {
                let id = RoleId::new(role.name.clone())?;
                let permissions = role
                    .permissions
                    .iter()
                    .map(|p| Permission::parse(p.clone()))
                    .collect::<Result<Vec<_>>>()?;
                Ok((id, permissions))
            })
            .collect::<Result<Vec<_>>>()?;

        RoleCatalog::load(entries)
    }

    /// Build the role hierarchy from the declared ranks
    pub fn build_hierarchy(&self) -> Result<RoleHierarchy> {
        RoleHierarchy::from_strings(self.roles.iter().map(|role| (role.name.clone(), role.rank)))
    }

    /// Build a flag store seeded with the declared defaults
    pub fn build_flags(&self) -> FeatureFlagStore {
        FeatureFlagStore::new(self.flags.clone())
    }

    /// Validate the document and assemble a ready engine
    pub fn into_engine(self) -> Result<PolicyEngine> {
        let catalog = self.build_catalog()?;
        let hierarchy = self.build_hierarchy()?;
        let flags = self.build_flags();

        PolicyEngine::with_config(
            self.engine,
            Arc::new(catalog),
            Arc::new(hierarchy),
            Arc::new(flags),
        )
    }
}
