use crate::domain::entity_ref::EntityPosition;
use crate::error::ScoreForgeError;

/// Access given to a listener while its deferred notifications run.
pub trait ShadowContext<S> {
    /// Returns the working solution.
    fn working_solution(&self) -> &S;

    /// Changes a shadow variable of one entity.
    ///
    /// The score director notifies its backend and the other listeners
    /// before and after `change` runs, exactly as for a genuine variable.
    fn change_shadow(
        &mut self,
        entity: EntityPosition,
        variable_name: &str,
        change: &mut dyn FnMut(&mut S),
    ) -> Result<(), ScoreForgeError>;
}

/// A listener that is notified when one of its source variables changes.
///
/// # Implementation Notes
///
/// - Only modify the shadow variables this listener was registered for
/// - Never modify genuine variables or problem facts
/// - A single listener can update shadow variables on multiple entities
///   (changing one task's order may move the `next` shadow of its neighbors)
///
/// An `after_entity_removed` call receives the position the entity occupied;
/// that position now holds the entity that followed it, if any.
pub trait VariableListener<S>: Send {
    /// Called before an entity is inserted at `entity`.
    fn before_entity_added(&mut self, _solution: &S, _entity: EntityPosition) {}

    /// Called after an entity was inserted at `entity`.
    fn after_entity_added(
        &mut self,
        _ctx: &mut dyn ShadowContext<S>,
        _entity: EntityPosition,
    ) -> Result<(), ScoreForgeError> {
        Ok(())
    }

    /// Called before a source variable changes on the entity.
    ///
    /// Use this to capture any old state needed for shadow variable calculation.
    fn before_variable_changed(&mut self, _solution: &S, _entity: EntityPosition) {}

    /// Called after a source variable changed on the entity.
    fn after_variable_changed(
        &mut self,
        ctx: &mut dyn ShadowContext<S>,
        entity: EntityPosition,
    ) -> Result<(), ScoreForgeError>;

    /// Called before the entity at `entity` is removed.
    fn before_entity_removed(&mut self, _solution: &S, _entity: EntityPosition) {}

    /// Called after the entity that sat at `entity` was removed.
    fn after_entity_removed(
        &mut self,
        _ctx: &mut dyn ShadowContext<S>,
        _entity: EntityPosition,
    ) -> Result<(), ScoreForgeError> {
        Ok(())
    }

    /// Whether this listener requires unique entity events.
    ///
    /// When `true`, each deferred notification kind reaches the listener at
    /// most once per entity between two triggers.
    fn requires_unique_entity_events(&self) -> bool {
        false
    }

    /// Called when the working solution changes.
    fn reset_working_solution(&mut self, _solution: &S) {}

    /// Called when the score director is disposed.
    fn close(&mut self) {}
}

/// Kind of a deferred notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VariableNotification {
    /// Entity was added to the working solution.
    EntityAdded,
    /// A source variable on the entity changed.
    VariableChanged,
    /// Entity was removed from the working solution.
    EntityRemoved,
}
