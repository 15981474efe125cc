//! Class-keyed metadata storage.
//!
//! Metadata is stored in a [`MetadataRegistry`] under a `(meta key, class)`
//! pair. Three typed views read and write the same cells:
//!
//! - [`ValueReflector`]: one value per class, overwritten on `set`
//! - [`ArrayReflector`]: an append-only ordered list per class
//! - [`MapReflector`]: a key/value map per class, overwritten per key
//!
//! Reading a pair that was never written yields `None`. Callers treat that
//! as "not configured yet", never as an empty value.
//!
//! ```
//! use armature_query_core::reflect::{ArrayReflector, MetadataRegistry, ValueReflector};
//! use armature_query_core::ClassId;
//!
//! struct TodoItem;
//!
//! let registry = MetadataRegistry::new();
//! let names = ValueReflector::<String>::with_registry("example:name", &registry);
//! let tags = ArrayReflector::<&'static str>::with_registry("example:tags", &registry);
//! let class = ClassId::of::<TodoItem>();
//!
//! assert!(names.get(class).is_none());
//! names.set(class, "TodoItem".to_string());
//! tags.append(class, "a");
//! tags.append(class, "b");
//!
//! assert_eq!(names.get(class).as_deref(), Some("TodoItem"));
//! assert_eq!(tags.get(class), Some(vec!["a", "b"]));
//! ```

use crate::ClassId;
use once_cell::sync::Lazy;
use parking_lot::RwLock;
use std::any::Any;
use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::Hash;
use std::marker::PhantomData;
use std::sync::Arc;
use tracing::{debug, trace, warn};

type Cell = Box<dyn Any + Send + Sync>;

static GLOBAL_REGISTRY: Lazy<MetadataRegistry> = Lazy::new(MetadataRegistry::new);

/// Shared side table of metadata keyed by meta key and class identity
///
/// Cloning the registry clones the handle; all clones see the same cells.
#[derive(Clone, Default)]
pub struct MetadataRegistry {
    cells: Arc<RwLock<HashMap<String, HashMap<ClassId, Cell>>>>,
}

impl MetadataRegistry {
    pub fn new() -> Self {
        trace!("Creating metadata registry");
        Self::default()
    }

    /// Process-wide registry used by reflectors built with `new`
    pub fn global() -> &'static MetadataRegistry {
        &GLOBAL_REGISTRY
    }

    /// Store `data` under `(key, class)`, replacing any previous cell
    pub fn define<D: Send + Sync + 'static>(&self, key: &str, class: ClassId, data: D) {
        let mut cells = self.cells.write();
        cells
            .entry(key.to_owned())
            .or_default()
            .insert(class, Box::new(data));

        debug!(meta_key = key, class = class.type_name(), "Metadata defined");
    }

    /// Read the cell under `(key, class)` through `f`
    ///
    /// Returns `None` when nothing was written, or when the cell holds a
    /// different type than `D`. `f` runs while the registry is read-locked
    /// and must not write to the registry.
    pub fn read<D, R>(&self, key: &str, class: ClassId, f: impl FnOnce(&D) -> R) -> Option<R>
    where
        D: Send + Sync + 'static,
    {
        let cells = self.cells.read();
        let cell = cells.get(key)?.get(&class)?;

        match cell.downcast_ref::<D>() {
            Some(data) => Some(f(data)),
            None => {
                warn!(
                    meta_key = key,
                    class = class.type_name(),
                    expected = std::any::type_name::<D>(),
                    "Metadata cell holds a different type; treating as absent"
                );
                None
            }
        }
    }

    /// Mutate the cell under `(key, class)` in place
    ///
    /// A missing cell, or one holding a different type, is replaced by
    /// `init()` before `f` runs.
    pub fn update<D, R>(
        &self,
        key: &str,
        class: ClassId,
        init: impl FnOnce() -> D,
        f: impl FnOnce(&mut D) -> R,
    ) -> R
    where
        D: Send + Sync + 'static,
    {
        let mut cells = self.cells.write();
        let classes = cells.entry(key.to_owned()).or_default();

        if let Some(data) = classes
            .get_mut(&class)
            .and_then(|cell| cell.downcast_mut::<D>())
        {
            return f(data);
        }

        if classes.contains_key(&class) {
            warn!(
                meta_key = key,
                class = class.type_name(),
                expected = std::any::type_name::<D>(),
                "Replacing metadata cell of a different type"
            );
        }

        let mut data = init();
        let result = f(&mut data);
        classes.insert(class, Box::new(data));

        debug!(meta_key = key, class = class.type_name(), "Metadata cell created");
        result
    }

    /// Whether any cell exists under `(key, class)`
    pub fn has_metadata(&self, key: &str, class: ClassId) -> bool {
        self.cells
            .read()
            .get(key)
            .is_some_and(|classes| classes.contains_key(&class))
    }

    /// Classes that carry metadata under `key`
    pub fn classes(&self, key: &str) -> Vec<ClassId> {
        self.cells
            .read()
            .get(key)
            .map(|classes| classes.keys().copied().collect())
            .unwrap_or_default()
    }
}

impl std::fmt::Debug for MetadataRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cells = self.cells.read();
        f.debug_struct("MetadataRegistry")
            .field("keys", &cells.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Single value per class
pub struct ValueReflector<D> {
    meta_key: String,
    registry: MetadataRegistry,
    _data: PhantomData<fn() -> D>,
}

impl<D: Send + Sync + 'static> ValueReflector<D> {
    /// Reflector over the global registry
    pub fn new(meta_key: impl Into<String>) -> Self {
        Self::with_registry(meta_key, MetadataRegistry::global())
    }

    pub fn with_registry(meta_key: impl Into<String>, registry: &MetadataRegistry) -> Self {
        Self {
            meta_key: meta_key.into(),
            registry: registry.clone(),
            _data: PhantomData,
        }
    }

    pub fn meta_key(&self) -> &str {
        &self.meta_key
    }

    pub fn set(&self, class: ClassId, data: D) {
        self.registry.define(&self.meta_key, class, data);
    }

    pub fn is_defined(&self, class: ClassId) -> bool {
        self.registry
            .read::<D, _>(&self.meta_key, class, |_| ())
            .is_some()
    }
}

impl<D: Clone + Send + Sync + 'static> ValueReflector<D> {
    pub fn get(&self, class: ClassId) -> Option<D> {
        self.registry.read(&self.meta_key, class, D::clone)
    }

    /// Return the stored value, computing and storing it on first use
    ///
    /// `compute` runs outside the registry lock, so it may itself read or
    /// write metadata. Two threads racing on the first call can both
    /// compute; the later write wins.
    pub fn memoize(&self, class: ClassId, compute: impl FnOnce() -> D) -> D {
        if let Some(existing) = self.get(class) {
            return existing;
        }
        let result = compute();
        self.set(class, result.clone());
        result
    }
}

/// Append-only ordered list per class
pub struct ArrayReflector<D> {
    meta_key: String,
    registry: MetadataRegistry,
    _data: PhantomData<fn() -> D>,
}

impl<D: Send + Sync + 'static> ArrayReflector<D> {
    pub fn new(meta_key: impl Into<String>) -> Self {
        Self::with_registry(meta_key, MetadataRegistry::global())
    }

    pub fn with_registry(meta_key: impl Into<String>, registry: &MetadataRegistry) -> Self {
        Self {
            meta_key: meta_key.into(),
            registry: registry.clone(),
            _data: PhantomData,
        }
    }

    pub fn meta_key(&self) -> &str {
        &self.meta_key
    }

    pub fn append(&self, class: ClassId, data: D) {
        let len = self
            .registry
            .update(&self.meta_key, class, Vec::new, |list: &mut Vec<D>| {
                list.push(data);
                list.len()
            });
        trace!(meta_key = %self.meta_key, class = class.type_name(), len, "Metadata appended");
    }
}

impl<D: Clone + Send + Sync + 'static> ArrayReflector<D> {
    pub fn get(&self, class: ClassId) -> Option<Vec<D>> {
        self.registry
            .read(&self.meta_key, class, |list: &Vec<D>| list.clone())
    }
}

/// Key/value map per class
pub struct MapReflector<K, D> {
    meta_key: String,
    registry: MetadataRegistry,
    _data: PhantomData<fn() -> (K, D)>,
}

impl<K, D> MapReflector<K, D>
where
    K: Eq + Hash + Send + Sync + 'static,
    D: Send + Sync + 'static,
{
    pub fn new(meta_key: impl Into<String>) -> Self {
        Self::with_registry(meta_key, MetadataRegistry::global())
    }

    pub fn with_registry(meta_key: impl Into<String>, registry: &MetadataRegistry) -> Self {
        Self {
            meta_key: meta_key.into(),
            registry: registry.clone(),
            _data: PhantomData,
        }
    }

    pub fn meta_key(&self) -> &str {
        &self.meta_key
    }

    pub fn set(&self, class: ClassId, key: K, value: D) {
        self.registry
            .update(&self.meta_key, class, HashMap::new, |map: &mut HashMap<K, D>| {
                map.insert(key, value);
            });
    }

    pub fn has<Q>(&self, class: ClassId, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.registry
            .read(&self.meta_key, class, |map: &HashMap<K, D>| map.contains_key(key))
            .unwrap_or(false)
    }
}

impl<K, D> MapReflector<K, D>
where
    K: Eq + Hash + Send + Sync + 'static,
    D: Clone + Send + Sync + 'static,
{
    pub fn get<Q>(&self, class: ClassId, key: &Q) -> Option<D>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.registry
            .read(&self.meta_key, class, |map: &HashMap<K, D>| map.get(key).cloned())
            .flatten()
    }

    /// Same contract as [`ValueReflector::memoize`], scoped by `key`
    pub fn memoize(&self, class: ClassId, key: K, compute: impl FnOnce() -> D) -> D {
        if let Some(existing) = self.get(class, &key) {
            return existing;
        }
        let result = compute();
        self.set(class, key, result.clone());
        result
    }
}

/// Build a registration function that stores one value per class under `key`
/// in the global registry
pub fn class_metadata_decorator<D: Send + Sync + 'static>(
    key: impl Into<String>,
) -> impl Fn(ClassId, D) {
    let reflector = ValueReflector::<D>::new(key);
    move |class, data| reflector.set(class, data)
}

/// Read a value stored by [`class_metadata_decorator`]
pub fn get_class_metadata<D: Clone + Send + Sync + 'static>(class: ClassId, key: &str) -> Option<D> {
    MetadataRegistry::global().read(key, class, D::clone)
}
