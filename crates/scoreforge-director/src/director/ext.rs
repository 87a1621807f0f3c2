//! Typed helpers over any score director.

use std::any::{type_name, Any};

use scoreforge_core::domain::CollectionKind;
use scoreforge_core::{LookUpError, PlanningSolution};

use super::scope::{NotificationScope, ScopeKind};
use super::traits::ScoreDirector;
use crate::error::{Result, ScoreDirectorError};

/// Extension methods available on every [`ScoreDirector`].
pub trait ScoreDirectorExt<S: PlanningSolution>: ScoreDirector<S> {
    /// Returns the working instance equivalent to `external`, or `None` for `None`.
    fn look_up_working_object<E: Any>(&self, external: Option<&E>) -> Result<Option<&E>> {
        let Some(external) = external else {
            return Ok(None);
        };
        let working = self.look_up_erased(external, type_name::<E>())?;
        working.downcast_ref::<E>().map(Some).ok_or_else(|| {
            LookUpError::NotFound {
                type_name: type_name::<E>(),
            }
            .into()
        })
    }

    fn look_up_working_object_mut<E: Any>(&mut self, external: Option<&E>) -> Result<Option<&mut E>> {
        let Some(external) = external else {
            return Ok(None);
        };
        let working = self.look_up_erased_mut(external, type_name::<E>())?;
        working.downcast_mut::<E>().map(Some).ok_or_else(|| {
            LookUpError::NotFound {
                type_name: type_name::<E>(),
            }
            .into()
        })
    }

    /// Changes one variable of a typed entity, bracketed with notifications,
    /// then triggers the variable listeners.
    fn change_entity_variable<E: Any>(
        &mut self,
        descriptor_index: usize,
        entity_index: usize,
        variable_name: &str,
        change: impl FnOnce(&mut E),
    ) -> Result<()> {
        let descriptor = self.solution_descriptor();
        let type_name = descriptor.collection_type_name(CollectionKind::Entity, descriptor_index)?;
        let extractor = descriptor
            .extractor(CollectionKind::Entity, descriptor_index)?
            .clone_box();
        let is_typed = extractor
            .get(self.working_solution()? as &dyn Any, entity_index)
            .is_some_and(|entity| entity.is::<E>());
        if !is_typed {
            return Err(ScoreDirectorError::UnknownObject {
                type_name,
                index: entity_index,
            });
        }

        self.before_variable_changed(descriptor_index, entity_index, variable_name)?;
        let solution = self.working_solution_mut()?;
        if let Some(entity) = extractor
            .get_mut(solution as &mut dyn Any, entity_index)
            .and_then(|entity| entity.downcast_mut::<E>())
        {
            change(entity);
        }
        self.after_variable_changed(descriptor_index, entity_index, variable_name)?;
        self.trigger_variable_listeners()
    }

    fn entity_added_scope(
        &mut self,
        descriptor_index: usize,
        entity_index: usize,
    ) -> Result<NotificationScope<'_, S, Self>> {
        NotificationScope::begin(
            self,
            ScopeKind::EntityAdded {
                descriptor_index,
                entity_index,
            },
        )
    }

    fn entity_removed_scope(
        &mut self,
        descriptor_index: usize,
        entity_index: usize,
    ) -> Result<NotificationScope<'_, S, Self>> {
        NotificationScope::begin(
            self,
            ScopeKind::EntityRemoved {
                descriptor_index,
                entity_index,
            },
        )
    }

    fn variable_change_scope(
        &mut self,
        descriptor_index: usize,
        entity_index: usize,
        variable_name: &str,
    ) -> Result<NotificationScope<'_, S, Self>> {
        NotificationScope::begin(
            self,
            ScopeKind::VariableChanged {
                descriptor_index,
                entity_index,
                variable_name: variable_name.to_string(),
            },
        )
    }

    fn problem_fact_added_scope(
        &mut self,
        descriptor_index: usize,
        fact_index: usize,
    ) -> Result<NotificationScope<'_, S, Self>> {
        NotificationScope::begin(
            self,
            ScopeKind::ProblemFactAdded {
                descriptor_index,
                fact_index,
            },
        )
    }

    fn problem_fact_removed_scope(
        &mut self,
        descriptor_index: usize,
        fact_index: usize,
    ) -> Result<NotificationScope<'_, S, Self>> {
        NotificationScope::begin(
            self,
            ScopeKind::ProblemFactRemoved {
                descriptor_index,
                fact_index,
            },
        )
    }

    fn problem_property_change_scope(
        &mut self,
        descriptor_index: usize,
        fact_index: usize,
    ) -> Result<NotificationScope<'_, S, Self>> {
        NotificationScope::begin(
            self,
            ScopeKind::ProblemPropertyChanged {
                descriptor_index,
                fact_index,
            },
        )
    }
}

impl<S, D> ScoreDirectorExt<S> for D
where
    S: PlanningSolution,
    D: ScoreDirector<S> + ?Sized,
{
}
