// Class identity used as the lookup key for metadata

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Identity of a DTO type.
///
/// Two `ClassId`s are equal only when they were built from the same Rust
/// type. The type name is carried for diagnostics and never compared.
#[derive(Clone, Copy)]
pub struct ClassId {
    type_id: TypeId,
    type_name: &'static str,
}

impl ClassId {
    /// Identity of `T`
    ///
    /// # Example
    ///
    /// ```
    /// use armature_query_core::ClassId;
    ///
    /// struct TodoItem;
    /// struct SubTask;
    ///
    /// assert_eq!(ClassId::of::<TodoItem>(), ClassId::of::<TodoItem>());
    /// assert_ne!(ClassId::of::<TodoItem>(), ClassId::of::<SubTask>());
    /// assert_eq!(ClassId::of::<TodoItem>().short_name(), "TodoItem");
    /// ```
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<T>(),
            type_name: std::any::type_name::<T>(),
        }
    }

    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Fully qualified Rust type name
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Last path segment of the type name, without generic arguments
    pub fn short_name(&self) -> &'static str {
        let base = self
            .type_name
            .split('<')
            .next()
            .unwrap_or(self.type_name);
        base.rsplit("::").next().unwrap_or(base)
    }
}

impl PartialEq for ClassId {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ClassId {}

impl Hash for ClassId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
    }
}

impl fmt::Debug for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ClassId").field(&self.type_name).finish()
    }
}

impl fmt::Display for ClassId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.type_name)
    }
}
