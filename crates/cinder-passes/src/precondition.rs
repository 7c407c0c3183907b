//! Precondition propagation
//!
//! Collects the facts a method relies on: every instance member reached
//! through a receiver needs that receiver to be non-null, and every call
//! inherits the callee's declared preconditions. Methods that cannot be
//! called from outside the assembly get the collected set attached as
//! implicit preconditions. For visible methods the set is only logged.
//!
//! Receivers are recorded in terms of what a caller can see: a temporary is
//! replaced by the value it was spilled from, and a fact that still depends
//! on a temporary with no known value is dropped.

use cinder_error::{InternalError, Result};
use cinder_ir::rewrite::walk_expression;
use cinder_ir::visit::{walk_member_binding, walk_method_call, walk_statement};
use cinder_ir::{
    Assignment, Body, BodyPass, Expression, ExpressionKind, LocalId, MemberBinding, MemberKind,
    MemberRef, MethodCall, Precondition, Rewriter, Statement, StatementKind, TypeUniverse,
    Visitor,
};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Insertion-ordered set of preconditions
#[derive(Debug, Clone, Default)]
pub struct PreconditionSet {
    items: Vec<Precondition>,
    seen: HashSet<String>,
}

impl PreconditionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when an equal precondition is already present
    pub fn insert(&mut self, precondition: Precondition) -> bool {
        if !self.seen.insert(precondition.to_string()) {
            return false;
        }
        self.items.push(precondition);
        true
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Precondition> {
        self.items.iter()
    }

    pub fn into_vec(self) -> Vec<Precondition> {
        self.items
    }
}

#[derive(Debug, Default)]
pub struct PreconditionPropagation {
    /// Collected for the method whose body was just walked
    current: PreconditionSet,
}

impl PreconditionPropagation {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BodyPass for PreconditionPropagation {
    fn name(&self) -> &'static str {
        "precondition-propagation"
    }

    fn rewrite_body(
        &mut self,
        universe: &TypeUniverse,
        _method: MemberRef,
        body: &mut Body,
    ) -> Result<()> {
        let mut collector = Collector {
            universe,
            preconditions: PreconditionSet::new(),
            spilled: HashMap::new(),
            failure: None,
        };
        collector.visit_block(&body.block);
        if let Some(err) = collector.failure {
            return Err(err);
        }
        self.current = collector.preconditions;
        Ok(())
    }

    fn finish_method(&mut self, universe: &mut TypeUniverse, method: MemberRef) -> Result<()> {
        let collected = std::mem::take(&mut self.current);
        if collected.is_empty() {
            return Ok(());
        }

        if universe.is_externally_visible(method)? {
            let name = universe.member(method)?.name.clone();
            warn!(
                method = %name,
                count = collected.len(),
                "visible method relies on unproven preconditions"
            );
            for precondition in collected.iter() {
                debug!(method = %name, %precondition, "unproven precondition");
            }
            return Ok(());
        }

        debug!(method = %method, count = collected.len(), "attaching implicit preconditions");
        universe.method_mut(method)?.implicit_preconditions = collected.into_vec();
        Ok(())
    }
}

struct Collector<'a> {
    universe: &'a TypeUniverse,
    preconditions: PreconditionSet,
    /// Temporaries and the caller-visible value each one holds
    spilled: HashMap<LocalId, Expression>,
    failure: Option<InternalError>,
}

impl Collector<'_> {
    fn record<T>(&mut self, result: Result<T>) -> Option<T> {
        match result {
            Ok(value) => Some(value),
            Err(err) => {
                self.failure.get_or_insert(err);
                None
            }
        }
    }

    /// `expression` with every temporary replaced by its spilled value
    fn unspill(&self, expression: &Expression) -> Option<Expression> {
        let mut rewriter = Unspill {
            spilled: &self.spilled,
            unknown: false,
        };
        let expression = rewriter.rewrite_expression(expression.clone())?;
        (!rewriter.unknown).then_some(expression)
    }

    fn spill(&mut self, assignment: &Assignment) {
        if let ExpressionKind::Local(id) = assignment.target.kind {
            match self.unspill(&assignment.source) {
                Some(value) => {
                    self.spilled.insert(id, value);
                }
                None => {
                    self.spilled.remove(&id);
                }
            }
        }
    }

    // TODO: retract facts about an assignment's target once the transfer rule
    // over assignments is settled
    fn transfer(&mut self, _assignment: &Assignment) {}
}

struct Unspill<'a> {
    spilled: &'a HashMap<LocalId, Expression>,
    unknown: bool,
}

impl Rewriter for Unspill<'_> {
    fn rewrite_expression(&mut self, expression: Expression) -> Option<Expression> {
        if let ExpressionKind::Local(id) = expression.kind {
            return match self.spilled.get(&id) {
                Some(value) => Some(value.clone()),
                None => {
                    self.unknown = true;
                    Some(expression)
                }
            };
        }
        walk_expression(self, expression)
    }
}

impl Visitor for Collector<'_> {
    fn visit_statement(&mut self, statement: &Statement) {
        if let StatementKind::Assignment(assignment) = &statement.kind {
            self.spill(assignment);
            self.transfer(assignment);
        }
        walk_statement(self, statement)
    }

    fn visit_member_binding(&mut self, binding: &MemberBinding) {
        if let Some(target) = &binding.target {
            let member = self.universe.member(binding.member).map(|m| m.is_static());
            if self.record(member) == Some(false) {
                if let Some(target) = self.unspill(target) {
                    self.preconditions.insert(Precondition::NonNull(target));
                }
            }
        }
        walk_member_binding(self, binding)
    }

    fn visit_method_call(&mut self, call: &MethodCall) {
        if let ExpressionKind::MemberBinding(binding) = &call.callee.kind {
            let universe = self.universe;
            if let Some(member) = self.record(universe.member(binding.member)) {
                if let MemberKind::Method(method) = &member.kind {
                    for precondition in &method.preconditions {
                        self.preconditions.insert(precondition.clone());
                    }
                }
            }
        }
        walk_method_call(self, call)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::Fixture;
    use cinder_ir::{rewrite_unit_bodies, Identifier, Idx, TypeRef};
    use pretty_assertions::assert_eq;

    fn propagate(fixture: &mut Fixture) {
        let mut pass = PreconditionPropagation::new();
        rewrite_unit_bodies(&mut pass, &fixture.unit, &mut fixture.universe).unwrap();
    }

    fn account(name: &str) -> Expression {
        Expression::identifier(Identifier::new(name))
    }

    fn implicit(fixture: &Fixture, method: MemberRef) -> Vec<String> {
        fixture
            .universe
            .method(method)
            .unwrap()
            .implicit_preconditions
            .iter()
            .map(ToString::to_string)
            .collect()
    }

    #[test]
    fn test_set_is_ordered_and_duplicate_free() {
        let mut set = PreconditionSet::new();
        assert!(set.insert(Precondition::NonNull(account("b"))));
        assert!(set.insert(Precondition::NonNull(account("a"))));
        assert!(!set.insert(Precondition::NonNull(account("b"))));
        let printed: Vec<_> = set.iter().map(ToString::to_string).collect();
        assert_eq!(printed, ["b != null", "a != null"]);
    }

    #[test]
    fn test_private_method_gets_implicit_preconditions() {
        let mut fixture = Fixture::new();
        let statements = vec![
            Statement::expression(fixture.read(Some(account("a")), fixture.balance)),
            Statement::expression(fixture.read(None, fixture.total)),
            Statement::expression(fixture.read(Some(account("a")), fixture.balance)),
            Statement::assignment(
                Expression::member(Some(account("b")), fixture.balance),
                Expression::identifier(Identifier::new("v")),
            ),
        ];
        fixture.set_body(fixture.helper, statements);
        propagate(&mut fixture);

        assert_eq!(implicit(&fixture, fixture.helper), ["a != null", "b != null"]);
    }

    #[test]
    fn test_callee_preconditions_are_inherited() {
        let mut fixture = Fixture::new();
        fixture
            .universe
            .method_mut(fixture.log)
            .unwrap()
            .preconditions
            .push(Precondition::NonNull(account("Journal")));
        let call = fixture.call(fixture.log, vec![account("message")]);
        fixture.set_body(fixture.helper, vec![Statement::expression(call)]);
        propagate(&mut fixture);

        assert_eq!(implicit(&fixture, fixture.helper), ["Journal != null"]);
    }

    #[test]
    fn test_temporaries_are_replaced_by_their_spilled_value() {
        let mut fixture = Fixture::new();
        let spilled = Expression::local(LocalId::new(0), TypeRef::INT32);
        let unknown = Expression::local(LocalId::new(1), TypeRef::INT32);
        let statements = vec![
            Statement::assignment(spilled.clone(), account("a")),
            Statement::expression(fixture.read(Some(spilled), fixture.balance)),
            Statement::expression(fixture.read(Some(unknown), fixture.balance)),
        ];
        fixture.set_body(fixture.helper, statements);
        propagate(&mut fixture);

        assert_eq!(implicit(&fixture, fixture.helper), ["a != null"]);
    }

    #[test]
    fn test_visible_method_is_left_alone() {
        let mut fixture = Fixture::new();
        let read = fixture.read(Some(account("a")), fixture.balance);
        fixture.set_body(fixture.run, vec![Statement::expression(read)]);
        propagate(&mut fixture);

        assert!(implicit(&fixture, fixture.run).is_empty());
    }

    #[test]
    fn test_sets_do_not_leak_between_methods() {
        let mut fixture = Fixture::new();
        let read = fixture.read(Some(account("a")), fixture.balance);
        fixture.set_body(fixture.run, vec![Statement::expression(read)]);
        fixture.set_body(fixture.helper, Vec::new());
        propagate(&mut fixture);

        assert!(implicit(&fixture, fixture.helper).is_empty());
    }
}
