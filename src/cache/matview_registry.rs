use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::{debug, info};
use crate::catalog::{CatalogError, CatalogObject, ObjectKind};
use crate::metadata::QualifiedName;

/// Configuration for the materialized view registry
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// When disabled the registry caches nothing and every lookup misses
    pub enabled: bool,
    /// Re-read the catalog on each registry hit before handing a view to a consumer
    pub validate_on_hit: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            validate_on_hit: true,
        }
    }
}

impl RegistryConfig {
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(val) = std::env::var("MATVIEW_REGISTRY_ENABLED") {
            config.enabled = val == "1" || val.to_lowercase() == "true";
        }

        if let Ok(val) = std::env::var("MATVIEW_REGISTRY_VALIDATE_ON_HIT") {
            config.validate_on_hit = val == "1" || val.to_lowercase() == "true";
        }

        config
    }
}

/// Cached projection of a materialized view, carrying what rewrite matching needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MaterializedViewDescriptor {
    pub name: QualifiedName,
    pub view_text: String,
    pub source_tables: Vec<QualifiedName>,
    pub rewrite_enabled: bool,
    pub created_at: DateTime<Utc>,
}

impl TryFrom<&CatalogObject> for MaterializedViewDescriptor {
    type Error = CatalogError;

    fn try_from(object: &CatalogObject) -> Result<Self, Self::Error> {
        if object.kind != ObjectKind::MaterializedView {
            return Err(CatalogError::InvalidRecord(format!(
                "{} is {}, not a materialized view",
                object.name,
                object.kind.described()
            )));
        }
        let view_text = object.definition.view_text.clone().ok_or_else(|| {
            CatalogError::InvalidRecord(format!("materialized view {} has no definition", object.name))
        })?;

        Ok(Self {
            name: object.name.clone(),
            view_text,
            source_tables: object.definition.source_tables.clone(),
            rewrite_enabled: object.definition.rewrite_enabled,
            created_at: object.definition.created_at,
        })
    }
}

/// Process-wide registry of materialized views mirrored from the catalog.
///
/// Entries live in a sharded map so concurrent create, drop and lookup paths
/// only contend on the shard holding their key. The registry never talks to
/// the catalog itself; callers keep it in step after each catalog mutation.
pub struct MaterializedViewRegistry {
    config: RegistryConfig,
    views: DashMap<QualifiedName, Arc<MaterializedViewDescriptor>>,
    hits: AtomicU64,
    misses: AtomicU64,
    insertions: AtomicU64,
    evictions: AtomicU64,
}

/// Registry statistics
#[derive(Debug, Default, Clone, PartialEq)]
pub struct RegistryStats {
    pub size: usize,
    pub hits: u64,
    pub misses: u64,
    pub insertions: u64,
    pub evictions: u64,
}

impl RegistryStats {
    pub fn hit_rate(&self) -> f64 {
        if self.hits + self.misses == 0 {
            0.0
        } else {
            self.hits as f64 / (self.hits + self.misses) as f64
        }
    }
}

impl Default for MaterializedViewRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterializedViewRegistry {
    pub fn new() -> Self {
        Self::with_config(RegistryConfig::default())
    }

    pub fn with_config(config: RegistryConfig) -> Self {
        Self {
            config,
            views: DashMap::new(),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            insertions: AtomicU64::new(0),
            evictions: AtomicU64::new(0),
        }
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// Add or replace the descriptor for its name. Returns true if an entry was replaced.
    pub fn insert(&self, descriptor: MaterializedViewDescriptor) -> bool {
        if !self.config.enabled {
            return false;
        }
        let name = descriptor.name.clone();
        let replaced = self.views.insert(name.clone(), Arc::new(descriptor)).is_some();
        self.insertions.fetch_add(1, Ordering::Relaxed);
        debug!("Registered materialized view {} (replaced: {})", name, replaced);
        replaced
    }

    pub fn lookup(&self, name: &QualifiedName) -> Option<Arc<MaterializedViewDescriptor>> {
        match self.views.get(name) {
            Some(entry) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                Some(Arc::clone(entry.value()))
            }
            None => {
                self.misses.fetch_add(1, Ordering::Relaxed);
                None
            }
        }
    }

    /// Remove the entry for `name`. Removing an absent entry is a no-op.
    /// Returns true if an entry was removed.
    pub fn evict(&self, name: &QualifiedName) -> bool {
        let removed = self.views.remove(name).is_some();
        if removed {
            self.evictions.fetch_add(1, Ordering::Relaxed);
            debug!("Evicted materialized view {} from registry", name);
        }
        removed
    }

    /// Remove the entry for `name` only if it is still exactly `expected`.
    /// Used when the caller's view of the entry may have been superseded concurrently.
    pub fn evict_if_same(
        &self,
        name: &QualifiedName,
        expected: &Arc<MaterializedViewDescriptor>,
    ) -> bool {
        let removed = self
            .views
            .remove_if(name, |_, current| Arc::ptr_eq(current, expected))
            .is_some();
        if removed {
            self.evictions.fetch_add(1, Ordering::Relaxed);
            debug!("Evicted stale materialized view {} from registry", name);
        }
        removed
    }

    /// Swap in `descriptor` only if the entry for its name is still exactly `expected`.
    /// An entry evicted in the meantime stays evicted.
    pub fn replace_if_same(
        &self,
        expected: &Arc<MaterializedViewDescriptor>,
        descriptor: MaterializedViewDescriptor,
    ) -> Option<Arc<MaterializedViewDescriptor>> {
        let mut entry = self.views.get_mut(&descriptor.name)?;
        if !Arc::ptr_eq(entry.value(), expected) {
            return None;
        }
        let fresh = Arc::new(descriptor);
        *entry.value_mut() = Arc::clone(&fresh);
        self.insertions.fetch_add(1, Ordering::Relaxed);
        Some(fresh)
    }

    /// Rewrite-enabled materialized views of one database, ordered by name
    pub fn rewriting_candidates(&self, database: &str) -> Vec<Arc<MaterializedViewDescriptor>> {
        let database = database.to_ascii_lowercase();
        let mut candidates: Vec<Arc<MaterializedViewDescriptor>> = self
            .views
            .iter()
            .filter(|entry| entry.key().database() == database && entry.value().rewrite_enabled)
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        candidates.sort_by(|a, b| a.name.cmp(&b.name));
        candidates
    }

    pub fn len(&self) -> usize {
        self.views.len()
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty()
    }

    /// Drop every entry
    pub fn clear(&self) {
        let count = self.views.len();
        self.views.clear();
        self.evictions.fetch_add(count as u64, Ordering::Relaxed);
        info!("Cleared materialized view registry ({} entries)", count);
    }

    pub fn stats(&self) -> RegistryStats {
        RegistryStats {
            size: self.views.len(),
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            insertions: self.insertions.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
        }
    }
}
