use std::any::{Any, TypeId};
use std::collections::hash_map::DefaultHasher;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::domain::traits::PlanningId;

/// Type-erased identity of one object type.
///
/// A key hashes an object and compares two objects of the same type. Keys are
/// plain function pointers, so descriptors stay `Clone + Send + Sync`.
#[derive(Clone, Copy)]
pub struct LookUpKey {
    type_id: Option<TypeId>,
    hash: fn(&dyn Any) -> Option<u64>,
    matches: fn(&dyn Any, &dyn Any) -> bool,
}

impl LookUpKey {
    /// Identity by [`PlanningId::planning_id`].
    pub fn planning_id<E: PlanningId + 'static>() -> Self {
        Self {
            type_id: Some(TypeId::of::<E>()),
            hash: hash_planning_id::<E>,
            matches: planning_ids_match::<E>,
        }
    }

    /// Identity by `Eq + Hash` of the whole value.
    pub fn equality<E: Eq + Hash + 'static>() -> Self {
        Self {
            type_id: Some(TypeId::of::<E>()),
            hash: hash_value::<E>,
            matches: values_match::<E>,
        }
    }

    /// Identity by address; only references into the working solution match.
    pub fn reference() -> Self {
        Self {
            type_id: None,
            hash: hash_address,
            matches: addresses_match,
        }
    }

    /// Returns the object type this key was built for, `None` for any type.
    pub fn type_id(&self) -> Option<TypeId> {
        self.type_id
    }

    /// Hashes an object, `None` if it has another type.
    pub fn hash(&self, value: &dyn Any) -> Option<u64> {
        (self.hash)(value)
    }

    /// Returns true if both objects have the same identity.
    pub fn matches(&self, a: &dyn Any, b: &dyn Any) -> bool {
        (self.matches)(a, b)
    }
}

impl fmt::Debug for LookUpKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LookUpKey")
            .field("type_id", &self.type_id)
            .finish_non_exhaustive()
    }
}

fn finish<T: Hash + ?Sized>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

fn hash_planning_id<E: PlanningId + 'static>(value: &dyn Any) -> Option<u64> {
    value.downcast_ref::<E>().map(|v| finish(&v.planning_id()))
}

fn planning_ids_match<E: PlanningId + 'static>(a: &dyn Any, b: &dyn Any) -> bool {
    match (a.downcast_ref::<E>(), b.downcast_ref::<E>()) {
        (Some(a), Some(b)) => a.planning_id() == b.planning_id(),
        _ => false,
    }
}

fn hash_value<E: Eq + Hash + 'static>(value: &dyn Any) -> Option<u64> {
    value.downcast_ref::<E>().map(finish)
}

fn values_match<E: Eq + Hash + 'static>(a: &dyn Any, b: &dyn Any) -> bool {
    match (a.downcast_ref::<E>(), b.downcast_ref::<E>()) {
        (Some(a), Some(b)) => a == b,
        _ => false,
    }
}

fn hash_address(value: &dyn Any) -> Option<u64> {
    Some((value as *const dyn Any).cast::<()>() as usize as u64)
}

fn addresses_match(a: &dyn Any, b: &dyn Any) -> bool {
    std::ptr::addr_eq(a as *const dyn Any, b as *const dyn Any)
}
