use super::*;
use crate::domain::EntityPosition;
use crate::error::ScoreForgeError;

#[derive(Debug, Default)]
struct Line {
    total: i64,
    parts: Vec<i64>,
}

struct MapContext<'a> {
    solution: &'a mut Line,
    writes: usize,
}

impl ShadowContext<Line> for MapContext<'_> {
    fn working_solution(&self) -> &Line {
        &*self.solution
    }

    fn change_shadow(
        &mut self,
        _entity: EntityPosition,
        variable_name: &str,
        change: &mut dyn FnMut(&mut Line),
    ) -> Result<(), ScoreForgeError> {
        if variable_name != "total" {
            return Err(ScoreForgeError::UnknownVariable {
                entity: "Line",
                variable: variable_name.to_string(),
            });
        }
        change(&mut *self.solution);
        self.writes += 1;
        Ok(())
    }
}

struct TotalListener {
    before_calls: usize,
}

impl VariableListener<Line> for TotalListener {
    fn before_variable_changed(&mut self, _solution: &Line, _entity: EntityPosition) {
        self.before_calls += 1;
    }

    fn after_variable_changed(
        &mut self,
        ctx: &mut dyn ShadowContext<Line>,
        entity: EntityPosition,
    ) -> Result<(), ScoreForgeError> {
        let total = ctx.working_solution().parts.iter().sum::<i64>();
        ctx.change_shadow(entity, "total", &mut |line| line.total = total)
    }
}

#[test]
fn test_listener_writes_through_context() {
    let mut line = Line {
        total: 0,
        parts: vec![1, 2, 3],
    };
    let mut listener = TotalListener { before_calls: 0 };
    let entity = EntityPosition::new(0, 0);

    listener.before_variable_changed(&line, entity);
    let mut ctx = MapContext {
        solution: &mut line,
        writes: 0,
    };
    listener.after_variable_changed(&mut ctx, entity).unwrap();

    assert_eq!(ctx.writes, 1);
    assert_eq!(listener.before_calls, 1);
    assert_eq!(line.total, 6);
}

#[test]
fn test_default_callbacks_are_no_ops() {
    let mut line = Line::default();
    let mut listener = TotalListener { before_calls: 0 };
    let entity = EntityPosition::new(0, 0);
    let mut ctx = MapContext {
        solution: &mut line,
        writes: 0,
    };

    listener.after_entity_added(&mut ctx, entity).unwrap();
    listener.after_entity_removed(&mut ctx, entity).unwrap();
    assert_eq!(ctx.writes, 0);
    assert!(!listener.requires_unique_entity_events());
}
