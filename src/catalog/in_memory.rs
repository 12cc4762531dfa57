use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use parking_lot::RwLock;
use tracing::debug;
use crate::metadata::QualifiedName;
use super::{CatalogClient, CatalogError, CatalogObject, dependents_of};

/// Catalog held entirely in process memory.
///
/// Counts delete calls and can be switched into an unavailable state, which
/// makes it suitable for embedding and for exercising failure paths.
#[derive(Default)]
pub struct InMemoryCatalog {
    objects: RwLock<HashMap<QualifiedName, CatalogObject>>,
    unavailable: AtomicBool,
    delete_calls: AtomicU64,
}

impl InMemoryCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `object`, failing if its name is already taken
    pub fn create_object(&self, object: CatalogObject) -> Result<(), CatalogError> {
        self.check_available()?;
        let mut objects = self.objects.write();
        if objects.contains_key(&object.name) {
            return Err(CatalogError::AlreadyExists(object.name));
        }
        debug!("Created {} {} in memory catalog", object.kind, object.name);
        objects.insert(object.name.clone(), object);
        Ok(())
    }

    /// Make every subsequent call fail with `CatalogError::Unavailable`
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    /// Number of `delete` calls received, including failed ones
    pub fn delete_calls(&self) -> u64 {
        self.delete_calls.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.objects.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.read().is_empty()
    }

    fn check_available(&self) -> Result<(), CatalogError> {
        if self.unavailable.load(Ordering::SeqCst) {
            Err(CatalogError::Unavailable("in-memory catalog is offline".to_string()))
        } else {
            Ok(())
        }
    }
}

impl CatalogClient for InMemoryCatalog {
    fn lookup(&self, name: &QualifiedName) -> Result<Option<CatalogObject>, CatalogError> {
        self.check_available()?;
        Ok(self.objects.read().get(name).cloned())
    }

    fn delete(&self, name: &QualifiedName, cascade: bool) -> Result<(), CatalogError> {
        self.delete_calls.fetch_add(1, Ordering::SeqCst);
        self.check_available()?;

        let mut objects = self.objects.write();
        if cascade {
            let snapshot: Vec<CatalogObject> = objects.values().cloned().collect();
            for dependent in dependents_of(name, &snapshot) {
                debug!("Cascading delete of {} from {}", dependent, name);
                objects.remove(&dependent);
            }
        }
        objects.remove(name);
        Ok(())
    }

    fn list_materialized_views(&self) -> Result<Vec<CatalogObject>, CatalogError> {
        self.check_available()?;
        Ok(self
            .objects
            .read()
            .values()
            .filter(|object| object.is_materialized_view())
            .cloned()
            .collect())
    }
}
