//! Variable listener chain of a score director.

use std::any::Any;
use std::collections::{HashMap, HashSet, VecDeque};

use scoreforge_core::domain::{
    CollectionKind, EntityPosition, ShadowContext, SolutionDescriptor, VariableId,
    VariableListener, VariableNotification,
};
use scoreforge_core::{PlanningSolution, ScoreForgeError};
use smallvec::SmallVec;
use tracing::trace;

use crate::backend::ScoreBackend;

/// Variables a listener reads and the shadow variables it writes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListenerRegistration {
    pub sources: Vec<VariableId>,
    pub shadows: Vec<VariableId>,
}

impl ListenerRegistration {
    pub fn new(sources: Vec<VariableId>, shadows: Vec<VariableId>) -> Self {
        Self { sources, shadows }
    }

    /// Resolves variable names of one entity descriptor.
    pub fn by_name(
        descriptor: &SolutionDescriptor,
        descriptor_index: usize,
        sources: &[&str],
        shadows: &[&str],
    ) -> Result<Self, ScoreForgeError> {
        let resolve = |names: &[&str]| {
            names
                .iter()
                .map(|name| descriptor.variable_id(descriptor_index, name))
                .collect::<Result<Vec<_>, _>>()
        };
        Ok(Self::new(resolve(sources)?, resolve(shadows)?))
    }
}

/// Validates a registration against the descriptor and the earlier ones.
///
/// Sources must exist and shadows must be shadow variables. A registration
/// whose shadows feed, through earlier listeners, one of its own sources
/// closes a cycle and is rejected.
pub fn check_registration<'a>(
    descriptor: &SolutionDescriptor,
    existing: impl IntoIterator<Item = &'a ListenerRegistration>,
    registration: &ListenerRegistration,
) -> Result<(), ScoreForgeError> {
    if registration.sources.is_empty() {
        return Err(ScoreForgeError::DomainModel(
            "a variable listener needs at least one source variable".to_string(),
        ));
    }
    for &source in &registration.sources {
        descriptor.variable_descriptor(source)?;
    }
    for &shadow in &registration.shadows {
        let variable = descriptor.variable_descriptor(shadow)?;
        if !variable.variable_type.is_shadow() {
            return Err(ScoreForgeError::DomainModel(format!(
                "variable listener writes genuine variable {}",
                variable.name
            )));
        }
    }

    let mut edges: HashMap<VariableId, Vec<VariableId>> = HashMap::new();
    for earlier in existing {
        for &source in &earlier.sources {
            edges
                .entry(source)
                .or_default()
                .extend(earlier.shadows.iter().copied());
        }
    }

    let mut stack: Vec<VariableId> = registration.shadows.clone();
    let mut seen: HashSet<VariableId> = HashSet::new();
    while let Some(variable) = stack.pop() {
        if registration.sources.contains(&variable) {
            let name = descriptor
                .variable_descriptor(variable)
                .map(|v| v.name)
                .unwrap_or("?");
            return Err(ScoreForgeError::DomainModel(format!(
                "variable listener cycle through variable {}",
                name
            )));
        }
        if seen.insert(variable) {
            if let Some(next) = edges.get(&variable) {
                stack.extend(next.iter().copied());
            }
        }
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct QueuedNotification {
    kind: VariableNotification,
    entity: EntityPosition,
}

struct Notifiable<S> {
    listener: Option<Box<dyn VariableListener<S>>>,
    registration: ListenerRegistration,
    source_descriptors: SmallVec<[usize; 2]>,
    unique: bool,
    queue: VecDeque<QueuedNotification>,
}

impl<S> Notifiable<S> {
    fn enqueue(&mut self, kind: VariableNotification, entity: EntityPosition) {
        let item = QueuedNotification { kind, entity };
        if self.unique && self.queue.contains(&item) {
            return;
        }
        self.queue.push_back(item);
    }

    fn watches_descriptor(&self, descriptor_index: usize) -> bool {
        self.source_descriptors.contains(&descriptor_index)
    }
}

/// Ordered set of variable listeners with their deferred notifications.
///
/// "before" callbacks run immediately; "after" callbacks are queued per
/// listener and run by [`trigger`](Self::trigger) in registration order.
pub struct VariableListenerSupport<S> {
    notifiables: Vec<Notifiable<S>>,
    by_source: HashMap<VariableId, SmallVec<[usize; 2]>>,
}

impl<S> Default for VariableListenerSupport<S> {
    fn default() -> Self {
        Self {
            notifiables: Vec::new(),
            by_source: HashMap::new(),
        }
    }
}

impl<S: PlanningSolution> VariableListenerSupport<S> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a listener at the end of the chain.
    pub fn register(
        &mut self,
        descriptor: &SolutionDescriptor,
        registration: ListenerRegistration,
        listener: Box<dyn VariableListener<S>>,
    ) -> Result<(), ScoreForgeError> {
        check_registration(
            descriptor,
            self.notifiables.iter().map(|n| &n.registration),
            &registration,
        )?;
        let index = self.notifiables.len();
        let mut source_descriptors = SmallVec::new();
        for source in &registration.sources {
            let listeners = self.by_source.entry(*source).or_default();
            if !listeners.contains(&index) {
                listeners.push(index);
            }
            if !source_descriptors.contains(&source.descriptor_index) {
                source_descriptors.push(source.descriptor_index);
            }
        }
        self.notifiables.push(Notifiable {
            unique: listener.requires_unique_entity_events(),
            listener: Some(listener),
            registration,
            source_descriptors,
            queue: VecDeque::new(),
        });
        Ok(())
    }

    pub fn listener_count(&self) -> usize {
        self.notifiables.len()
    }

    /// Returns true if any deferred notification awaits a trigger.
    pub fn has_pending(&self) -> bool {
        self.notifiables.iter().any(|n| !n.queue.is_empty())
    }

    pub(crate) fn reset_working_solution(&mut self, solution: &S) {
        for notifiable in &mut self.notifiables {
            notifiable.queue.clear();
            if let Some(listener) = notifiable.listener.as_mut() {
                listener.reset_working_solution(solution);
            }
        }
    }

    pub(crate) fn close(&mut self) {
        for notifiable in &mut self.notifiables {
            notifiable.queue.clear();
            if let Some(listener) = notifiable.listener.as_mut() {
                listener.close();
            }
        }
    }

    pub(crate) fn before_entity_added(&mut self, solution: &S, entity: EntityPosition) {
        for notifiable in &mut self.notifiables {
            if notifiable.watches_descriptor(entity.descriptor_index) {
                if let Some(listener) = notifiable.listener.as_mut() {
                    listener.before_entity_added(solution, entity);
                }
            }
        }
    }

    pub(crate) fn after_entity_added(&mut self, entity: EntityPosition) {
        for notifiable in &mut self.notifiables {
            for queued in notifiable.queue.iter_mut() {
                if queued.entity.descriptor_index == entity.descriptor_index
                    && queued.entity.entity_index >= entity.entity_index
                {
                    queued.entity.entity_index += 1;
                }
            }
            if notifiable.watches_descriptor(entity.descriptor_index) {
                notifiable.enqueue(VariableNotification::EntityAdded, entity);
            }
        }
    }

    pub(crate) fn before_variable_changed(
        &mut self,
        solution: &S,
        variable: VariableId,
        entity_index: usize,
    ) {
        let Some(indexes) = self.by_source.get(&variable) else {
            return;
        };
        let entity = EntityPosition::new(variable.descriptor_index, entity_index);
        for &index in indexes {
            if let Some(listener) = self.notifiables[index].listener.as_mut() {
                listener.before_variable_changed(solution, entity);
            }
        }
    }

    pub(crate) fn after_variable_changed(&mut self, variable: VariableId, entity_index: usize) {
        let Some(indexes) = self.by_source.get(&variable) else {
            return;
        };
        let entity = EntityPosition::new(variable.descriptor_index, entity_index);
        for &index in indexes {
            self.notifiables[index].enqueue(VariableNotification::VariableChanged, entity);
        }
    }

    pub(crate) fn before_entity_removed(&mut self, solution: &S, entity: EntityPosition) {
        for notifiable in &mut self.notifiables {
            if notifiable.watches_descriptor(entity.descriptor_index) {
                if let Some(listener) = notifiable.listener.as_mut() {
                    listener.before_entity_removed(solution, entity);
                }
            }
        }
    }

    pub(crate) fn after_entity_removed(&mut self, entity: EntityPosition) {
        for notifiable in &mut self.notifiables {
            notifiable.queue.retain(|queued| queued.entity != entity);
            for queued in notifiable.queue.iter_mut() {
                if queued.entity.descriptor_index == entity.descriptor_index
                    && queued.entity.entity_index > entity.entity_index
                {
                    queued.entity.entity_index -= 1;
                }
            }
            if notifiable.watches_descriptor(entity.descriptor_index) {
                notifiable.enqueue(VariableNotification::EntityRemoved, entity);
            }
        }
    }

    /// Runs deferred notifications until every queue is empty.
    ///
    /// The first listener with queued notifications drains its queue, then
    /// the search restarts from the head of the chain. Returns true if any
    /// notification ran.
    pub(crate) fn trigger(
        &mut self,
        solution: &mut S,
        backend: &mut dyn ScoreBackend<S>,
        descriptor: &SolutionDescriptor,
    ) -> Result<bool, ScoreForgeError> {
        let mut fired = false;
        while let Some(index) = self.notifiables.iter().position(|n| !n.queue.is_empty()) {
            let queue = std::mem::take(&mut self.notifiables[index].queue);
            let Some(mut listener) = self.notifiables[index].listener.take() else {
                return Err(ScoreForgeError::DomainModel(format!(
                    "variable listener {} re-entered",
                    index
                )));
            };
            let allowed = self.notifiables[index].registration.shadows.clone();
            trace!(listener = index, notifications = queue.len(), "Triggering variable listener");

            let mut result = Ok(());
            for queued in queue {
                let mut ctx = ListenerContext {
                    solution: &mut *solution,
                    backend: &mut *backend,
                    descriptor,
                    support: &mut *self,
                    allowed: &allowed,
                };
                result = match queued.kind {
                    VariableNotification::EntityAdded => {
                        listener.after_entity_added(&mut ctx, queued.entity)
                    }
                    VariableNotification::VariableChanged => {
                        listener.after_variable_changed(&mut ctx, queued.entity)
                    }
                    VariableNotification::EntityRemoved => {
                        listener.after_entity_removed(&mut ctx, queued.entity)
                    }
                };
                if result.is_err() {
                    break;
                }
            }
            self.notifiables[index].listener = Some(listener);
            result?;
            fired = true;
        }
        Ok(fired)
    }
}

/// Context handed to a listener while it runs.
struct ListenerContext<'a, S: PlanningSolution> {
    solution: &'a mut S,
    backend: &'a mut dyn ScoreBackend<S>,
    descriptor: &'a SolutionDescriptor,
    support: &'a mut VariableListenerSupport<S>,
    allowed: &'a [VariableId],
}

impl<S: PlanningSolution> ShadowContext<S> for ListenerContext<'_, S> {
    fn working_solution(&self) -> &S {
        &*self.solution
    }

    fn change_shadow(
        &mut self,
        entity: EntityPosition,
        variable_name: &str,
        change: &mut dyn FnMut(&mut S),
    ) -> Result<(), ScoreForgeError> {
        let variable = self
            .descriptor
            .variable_id(entity.descriptor_index, variable_name)?;
        if !self.allowed.contains(&variable) {
            return Err(ScoreForgeError::DomainModel(format!(
                "variable listener changed {} without declaring it as a shadow",
                variable_name
            )));
        }
        let count = self
            .descriptor
            .object_count(
                &*self.solution as &dyn Any,
                CollectionKind::Entity,
                entity.descriptor_index,
            )
            .unwrap_or(0);
        if entity.entity_index >= count {
            return Err(ScoreForgeError::UnknownObject {
                type_name: self
                    .descriptor
                    .collection_type_name(CollectionKind::Entity, entity.descriptor_index)?,
                index: entity.entity_index,
            });
        }

        let index = entity.entity_index;
        self.backend.before_variable_changed(self.solution, variable, index);
        self.support.before_variable_changed(self.solution, variable, index);
        change(self.solution);
        self.backend.after_variable_changed(self.solution, variable, index);
        self.support.after_variable_changed(variable, index);
        Ok(())
    }
}
