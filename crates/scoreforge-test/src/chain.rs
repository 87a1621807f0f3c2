//! "Next in sequence" shadow variable fixtures.
//!
//! Each job has a genuine `order` and a shadow `next`: the id of the job
//! with the smallest greater order. [`NextJobListener`] keeps `next` up to
//! date and the score charges the squared order gap to the next job, so a
//! stale shadow shows up in the score.
//!
//! # Example
//!
//! ```
//! use scoreforge_test::chain::{expected_next, Job};
//!
//! let jobs = vec![Job::new(1, 10), Job::new(2, 30), Job::new(3, 20)];
//! assert_eq!(expected_next(&jobs), vec![Some(3), None, Some(2)]);
//! ```

use std::any::TypeId;

use scoreforge_core::domain::{
    EntityDescriptor, EntityPosition, PlanningEntity, PlanningId, PlanningSolution,
    ShadowContext, SolutionDescriptor, TypedEntityExtractor, VariableDescriptor, VariableId,
    VariableListener,
};
use scoreforge_core::{ScoreForgeError, SimpleScore};

/// Handle of [`Job::order`] in [`create_chain_descriptor`].
pub const ORDER_VARIABLE: VariableId = VariableId::new(0, 0);
/// Handle of [`Job::next`] in [`create_chain_descriptor`].
pub const NEXT_VARIABLE: VariableId = VariableId::new(0, 1);

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Job {
    pub id: usize,
    pub order: i64,
    /// Shadow: id of the job that follows this one.
    pub next: Option<usize>,
}

impl Job {
    pub fn new(id: usize, order: i64) -> Self {
        Self {
            id,
            order,
            next: None,
        }
    }
}

impl PlanningEntity for Job {}

impl PlanningId for Job {
    type Id = usize;

    fn planning_id(&self) -> usize {
        self.id
    }
}

#[derive(Clone, Debug)]
pub struct ChainSolution {
    pub jobs: Vec<Job>,
    pub score: Option<SimpleScore>,
}

impl ChainSolution {
    /// Creates jobs with ids `1..=orders.len()` and consistent shadows.
    pub fn with_orders(orders: &[i64]) -> Self {
        let mut jobs: Vec<Job> = orders
            .iter()
            .enumerate()
            .map(|(i, &order)| Job::new(i + 1, order))
            .collect();
        let next = expected_next(&jobs);
        for (job, next) in jobs.iter_mut().zip(next) {
            job.next = next;
        }
        Self { jobs, score: None }
    }

    /// Returns the `next` shadow of every job.
    pub fn next_ids(&self) -> Vec<Option<usize>> {
        self.jobs.iter().map(|j| j.next).collect()
    }

    pub fn job(&self, id: usize) -> Option<&Job> {
        self.jobs.iter().find(|j| j.id == id)
    }
}

impl PlanningSolution for ChainSolution {
    type Score = SimpleScore;

    fn score(&self) -> Option<Self::Score> {
        self.score
    }

    fn set_score(&mut self, score: Option<Self::Score>) {
        self.score = score;
    }
}

pub fn get_jobs(s: &ChainSolution) -> &Vec<Job> {
    &s.jobs
}

pub fn get_jobs_mut(s: &mut ChainSolution) -> &mut Vec<Job> {
    &mut s.jobs
}

/// Computes the `next` shadow of every job from the orders.
///
/// Ties between equal orders go to the job that comes first.
pub fn expected_next(jobs: &[Job]) -> Vec<Option<usize>> {
    jobs.iter()
        .map(|job| {
            jobs.iter()
                .filter(|other| other.order > job.order)
                .min_by_key(|other| other.order)
                .map(|other| other.id)
        })
        .collect()
}

/// Charges the squared order gap between each job and its `next` job.
pub fn calculate_gaps(solution: &ChainSolution) -> SimpleScore {
    let penalty: i64 = solution
        .jobs
        .iter()
        .filter_map(|job| {
            let next = solution.job(job.next?)?;
            let gap = next.order - job.order;
            Some(gap * gap)
        })
        .sum();
    SimpleScore::of(-penalty)
}

/// Keeps [`Job::next`] consistent with every job's `order`.
#[derive(Debug, Default)]
pub struct NextJobListener {
    /// Number of deferred notifications handled.
    pub notifications: usize,
}

impl NextJobListener {
    fn recompute(
        &mut self,
        ctx: &mut dyn ShadowContext<ChainSolution>,
    ) -> Result<(), ScoreForgeError> {
        self.notifications += 1;
        let expected = expected_next(&ctx.working_solution().jobs);
        for (index, next) in expected.into_iter().enumerate() {
            if ctx.working_solution().jobs[index].next == next {
                continue;
            }
            ctx.change_shadow(EntityPosition::new(0, index), "next", &mut |s: &mut ChainSolution| {
                if let Some(job) = s.jobs.get_mut(index) {
                    job.next = next;
                }
            })?;
        }
        Ok(())
    }
}

impl VariableListener<ChainSolution> for NextJobListener {
    fn after_entity_added(
        &mut self,
        ctx: &mut dyn ShadowContext<ChainSolution>,
        _entity: EntityPosition,
    ) -> Result<(), ScoreForgeError> {
        self.recompute(ctx)
    }

    fn after_variable_changed(
        &mut self,
        ctx: &mut dyn ShadowContext<ChainSolution>,
        _entity: EntityPosition,
    ) -> Result<(), ScoreForgeError> {
        self.recompute(ctx)
    }

    fn after_entity_removed(
        &mut self,
        ctx: &mut dyn ShadowContext<ChainSolution>,
        _entity: EntityPosition,
    ) -> Result<(), ScoreForgeError> {
        self.recompute(ctx)
    }

    fn requires_unique_entity_events(&self) -> bool {
        true
    }
}

/// Descriptor with jobs at entity index 0, looked up by planning id.
pub fn create_chain_descriptor() -> SolutionDescriptor {
    let jobs = EntityDescriptor::new("Job", TypeId::of::<Job>(), "jobs")
        .with_extractor(Box::new(TypedEntityExtractor::new(
            "Job",
            "jobs",
            get_jobs,
            get_jobs_mut,
        )))
        .with_variable(VariableDescriptor::genuine("order"))
        .with_variable(VariableDescriptor::shadow("next"))
        .with_planning_id::<Job>();

    SolutionDescriptor::new("ChainSolution", TypeId::of::<ChainSolution>()).with_entity(jobs)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_expected_next() {
        let solution = ChainSolution::with_orders(&[1, 2, 3]);
        assert_eq!(expected_next(&solution.jobs), vec![Some(2), Some(3), None]);
    }

    #[test]
    fn test_gaps_use_shadows() {
        let mut solution = ChainSolution::with_orders(&[1, 2, 4]);
        assert_eq!(solution.next_ids(), vec![Some(2), Some(3), None]);
        assert_eq!(calculate_gaps(&solution), SimpleScore::of(-5));

        for job in &mut solution.jobs {
            job.next = None;
        }
        assert_eq!(calculate_gaps(&solution), SimpleScore::of(0));
    }

    #[test]
    fn test_descriptor_variables() {
        let descriptor = create_chain_descriptor();
        assert_eq!(descriptor.variable_id(0, "order").ok(), Some(ORDER_VARIABLE));
        assert_eq!(descriptor.variable_id(0, "next").ok(), Some(NEXT_VARIABLE));
        assert_eq!(descriptor.shadow_variable_descriptors().len(), 1);
    }
}
