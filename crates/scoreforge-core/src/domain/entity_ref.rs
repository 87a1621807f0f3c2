//! Type-erased access to the object collections of a solution.
//!
//! Score directors address entities and facts by `(descriptor_index, index)`
//! and reach the concrete values through these extractors without knowing
//! their types at compile time.

use std::any::{Any, TypeId};
use std::fmt::{self, Debug};

/// Position of one entity in the working solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityPosition {
    /// Index of the entity descriptor in the solution descriptor.
    pub descriptor_index: usize,
    /// Index of the entity in its collection.
    pub entity_index: usize,
}

impl EntityPosition {
    pub const fn new(descriptor_index: usize, entity_index: usize) -> Self {
        Self {
            descriptor_index,
            entity_index,
        }
    }
}

/// Boxed value of an entity or fact cloned out of a solution.
pub type BoxedObject = Box<dyn Any + Send + Sync>;

/// Trait for reaching one `Vec` collection of a planning solution.
///
/// Every method takes the solution as `dyn Any` and returns `None` (or
/// `false`) when the solution type or the index does not match.
pub trait EntityExtractor: Send + Sync {
    /// Returns the number of objects in the collection.
    fn count(&self, solution: &dyn Any) -> Option<usize>;

    /// Gets a reference to an object by index.
    fn get<'a>(&self, solution: &'a dyn Any, index: usize) -> Option<&'a dyn Any>;

    /// Gets a mutable reference to an object by index.
    fn get_mut<'a>(&self, solution: &'a mut dyn Any, index: usize) -> Option<&'a mut dyn Any>;

    /// Clone this extractor.
    fn clone_box(&self) -> Box<dyn EntityExtractor>;

    /// Clones an object out of the solution as an owned, type-erased value.
    fn clone_entity_boxed(&self, solution: &dyn Any, index: usize) -> Option<BoxedObject>;

    /// Clones a value previously produced by [`clone_entity_boxed`](Self::clone_entity_boxed).
    fn clone_boxed_value(&self, value: &dyn Any) -> Option<BoxedObject>;

    /// Inserts a boxed value so that it sits at `index` afterwards.
    ///
    /// Returns false if the value has the wrong type or `index > count`.
    fn insert_entity_boxed(&self, solution: &mut dyn Any, index: usize, value: BoxedObject) -> bool;

    /// Replaces the object at `index` with a boxed value.
    fn replace_entity_boxed(&self, solution: &mut dyn Any, index: usize, value: BoxedObject)
        -> bool;

    /// Removes the object at `index`, shifting later objects down by one.
    fn remove_entity(&self, solution: &mut dyn Any, index: usize) -> Option<BoxedObject>;

    /// Renders the object at `index` with its `Debug` implementation.
    fn debug_entity(&self, solution: &dyn Any, index: usize) -> Option<String>;

    /// Renders a boxed value with its `Debug` implementation.
    fn debug_value(&self, value: &dyn Any) -> Option<String>;

    /// Returns the TypeId of the object type.
    fn entity_type_id(&self) -> TypeId;
}

impl Clone for Box<dyn EntityExtractor> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// A concrete extractor for a `Vec<E>` field of solution `S`.
pub struct TypedEntityExtractor<S, E> {
    type_name: &'static str,
    collection_field: &'static str,
    get_collection: fn(&S) -> &Vec<E>,
    get_collection_mut: fn(&mut S) -> &mut Vec<E>,
}

impl<S, E> TypedEntityExtractor<S, E>
where
    S: 'static,
    E: 'static,
{
    /// Creates a new typed extractor.
    pub fn new(
        type_name: &'static str,
        collection_field: &'static str,
        get_collection: fn(&S) -> &Vec<E>,
        get_collection_mut: fn(&mut S) -> &mut Vec<E>,
    ) -> Self {
        Self {
            type_name,
            collection_field,
            get_collection,
            get_collection_mut,
        }
    }

    fn collection_mut<'a>(&self, solution: &'a mut dyn Any) -> Option<&'a mut Vec<E>> {
        let solution = solution.downcast_mut::<S>()?;
        Some((self.get_collection_mut)(solution))
    }
}

impl<S, E> EntityExtractor for TypedEntityExtractor<S, E>
where
    S: Send + Sync + 'static,
    E: Clone + Debug + Send + Sync + 'static,
{
    fn count(&self, solution: &dyn Any) -> Option<usize> {
        let solution = solution.downcast_ref::<S>()?;
        Some((self.get_collection)(solution).len())
    }

    fn get<'a>(&self, solution: &'a dyn Any, index: usize) -> Option<&'a dyn Any> {
        let solution = solution.downcast_ref::<S>()?;
        let collection = (self.get_collection)(solution);
        collection.get(index).map(|e| e as &dyn Any)
    }

    fn get_mut<'a>(&self, solution: &'a mut dyn Any, index: usize) -> Option<&'a mut dyn Any> {
        let collection = self.collection_mut(solution)?;
        collection.get_mut(index).map(|e| e as &mut dyn Any)
    }

    fn clone_box(&self) -> Box<dyn EntityExtractor> {
        Box::new(Self {
            type_name: self.type_name,
            collection_field: self.collection_field,
            get_collection: self.get_collection,
            get_collection_mut: self.get_collection_mut,
        })
    }

    fn clone_entity_boxed(&self, solution: &dyn Any, index: usize) -> Option<BoxedObject> {
        let entity = self.get(solution, index)?.downcast_ref::<E>()?;
        Some(Box::new(entity.clone()))
    }

    fn clone_boxed_value(&self, value: &dyn Any) -> Option<BoxedObject> {
        let value = value.downcast_ref::<E>()?;
        Some(Box::new(value.clone()))
    }

    fn insert_entity_boxed(&self, solution: &mut dyn Any, index: usize, value: BoxedObject) -> bool {
        let Ok(value) = value.downcast::<E>() else {
            return false;
        };
        match self.collection_mut(solution) {
            Some(collection) if index <= collection.len() => {
                collection.insert(index, *value);
                true
            }
            _ => false,
        }
    }

    fn replace_entity_boxed(
        &self,
        solution: &mut dyn Any,
        index: usize,
        value: BoxedObject,
    ) -> bool {
        let Ok(value) = value.downcast::<E>() else {
            return false;
        };
        match self.collection_mut(solution).and_then(|c| c.get_mut(index)) {
            Some(slot) => {
                *slot = *value;
                true
            }
            None => false,
        }
    }

    fn remove_entity(&self, solution: &mut dyn Any, index: usize) -> Option<BoxedObject> {
        let collection = self.collection_mut(solution)?;
        if index >= collection.len() {
            return None;
        }
        Some(Box::new(collection.remove(index)))
    }

    fn debug_entity(&self, solution: &dyn Any, index: usize) -> Option<String> {
        self.debug_value(self.get(solution, index)?)
    }

    fn debug_value(&self, value: &dyn Any) -> Option<String> {
        value.downcast_ref::<E>().map(|e| format!("{:?}", e))
    }

    fn entity_type_id(&self) -> TypeId {
        TypeId::of::<E>()
    }
}

impl<S, E> Debug for TypedEntityExtractor<S, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedEntityExtractor")
            .field("type_name", &self.type_name)
            .field("collection_field", &self.collection_field)
            .finish()
    }
}
